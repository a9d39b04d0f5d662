//! Shopping cart state, persistence and display.
//!
//! - [`CartStore`] owns the current cart snapshot and performs every cart
//!   mutation against the commerce backend.
//! - [`CartIdStore`] implementations remember the cart id between page loads
//!   (session) or process runs (file).
//! - [`CartView`] is the formatted read model for routes and the CLI.

pub mod persistence;
pub mod store;
pub mod view;

pub use persistence::{
    CART_ID_SESSION_KEY, CART_ID_STORAGE_KEY, CartIdStore, FileCartIdStore, MemoryCartIdStore,
    SessionCartIdStore,
};
pub use store::{CartError, CartPhase, CartState, CartStore, PendingOp};
pub use view::{CartLineView, CartView, FreeShippingView};
