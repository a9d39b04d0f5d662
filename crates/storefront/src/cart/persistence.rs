//! Where the current cart id lives between page loads and process runs.

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use lumiere_core::CartId;
use mockall::automock;
use tower_sessions::Session;

use crate::storage::{JsonFileStorage, KeyValueStorage, PersistenceError};

/// Storage key for the cart id in file-backed storage.
pub const CART_ID_STORAGE_KEY: &str = "cartId";

/// Session key for the cart id.
pub const CART_ID_SESSION_KEY: &str = "cart_id";

/// Durable home of the current cart id.
#[automock]
#[async_trait]
pub trait CartIdStore: Send + Sync {
    /// The persisted cart id, if any.
    async fn load(&self) -> Result<Option<CartId>, PersistenceError>;

    /// Persist `id` as the current cart.
    async fn save(&self, id: &CartId) -> Result<(), PersistenceError>;

    /// Forget the current cart.
    async fn clear(&self) -> Result<(), PersistenceError>;
}

// =============================================================================
// MemoryCartIdStore
// =============================================================================

/// Cart id held in memory for the life of the process.
#[derive(Debug, Default)]
pub struct MemoryCartIdStore {
    id: Mutex<Option<CartId>>,
}

impl MemoryCartIdStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an id already persisted.
    #[must_use]
    pub fn with_id(id: CartId) -> Self {
        Self {
            id: Mutex::new(Some(id)),
        }
    }

    /// Peek at the stored id without going through the async trait.
    #[must_use]
    pub fn current(&self) -> Option<CartId> {
        self.id.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl CartIdStore for MemoryCartIdStore {
    async fn load(&self) -> Result<Option<CartId>, PersistenceError> {
        Ok(self.current())
    }

    async fn save(&self, id: &CartId) -> Result<(), PersistenceError> {
        *self.id.lock().unwrap_or_else(PoisonError::into_inner) = Some(id.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), PersistenceError> {
        *self.id.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

// =============================================================================
// FileCartIdStore
// =============================================================================

/// Cart id stored under [`CART_ID_STORAGE_KEY`] in a JSON storage file.
#[derive(Debug)]
pub struct FileCartIdStore {
    storage: JsonFileStorage,
}

impl FileCartIdStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            storage: JsonFileStorage::new(path),
        }
    }
}

#[async_trait]
impl CartIdStore for FileCartIdStore {
    async fn load(&self) -> Result<Option<CartId>, PersistenceError> {
        Ok(self
            .storage
            .get(CART_ID_STORAGE_KEY)?
            .filter(|id| !id.trim().is_empty())
            .map(CartId::new))
    }

    async fn save(&self, id: &CartId) -> Result<(), PersistenceError> {
        self.storage.set(CART_ID_STORAGE_KEY, id.as_str())
    }

    async fn clear(&self) -> Result<(), PersistenceError> {
        self.storage.remove(CART_ID_STORAGE_KEY)
    }
}

// =============================================================================
// SessionCartIdStore
// =============================================================================

/// Cart id stored in the visitor's tower-sessions session.
#[derive(Debug, Clone)]
pub struct SessionCartIdStore {
    session: Session,
}

impl SessionCartIdStore {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

#[async_trait]
impl CartIdStore for SessionCartIdStore {
    async fn load(&self) -> Result<Option<CartId>, PersistenceError> {
        Ok(self.session.get::<CartId>(CART_ID_SESSION_KEY).await?)
    }

    async fn save(&self, id: &CartId) -> Result<(), PersistenceError> {
        Ok(self.session.insert(CART_ID_SESSION_KEY, id).await?)
    }

    async fn clear(&self) -> Result<(), PersistenceError> {
        self.session.remove::<CartId>(CART_ID_SESSION_KEY).await?;
        Ok(())
    }
}
