//! Free-shipping progress shown in the cart drawer.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::price::{CurrencyCode, format_price};

/// Subtotal (in the cart currency) above which shipping is free.
pub const DEFAULT_FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(75, 0, 0, false, 0);

/// Progress towards the free-shipping threshold for a cart subtotal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeShippingProgress {
    /// Cart subtotal the progress was computed from.
    pub subtotal: Decimal,
    /// Threshold the subtotal is measured against.
    pub threshold: Decimal,
    /// `min(subtotal / threshold * 100, 100)`.
    pub progress_percent: Decimal,
    /// `threshold - subtotal`; zero or negative once qualified.
    pub remaining: Decimal,
}

impl FreeShippingProgress {
    /// Compute progress for `subtotal` against `threshold`.
    ///
    /// A non-positive threshold means every order ships free.
    #[must_use]
    pub fn new(subtotal: Decimal, threshold: Decimal) -> Self {
        let hundred = Decimal::ONE_HUNDRED;
        let progress_percent = if threshold <= Decimal::ZERO {
            hundred
        } else {
            (subtotal / threshold * hundred).clamp(Decimal::ZERO, hundred)
        };

        Self {
            subtotal,
            threshold,
            progress_percent,
            remaining: threshold - subtotal,
        }
    }

    /// Progress against the default $75 threshold.
    #[must_use]
    pub fn with_default_threshold(subtotal: Decimal) -> Self {
        Self::new(subtotal, DEFAULT_FREE_SHIPPING_THRESHOLD)
    }

    /// Whether the subtotal has reached the threshold.
    #[must_use]
    pub fn is_qualified(&self) -> bool {
        self.subtotal >= self.threshold
    }

    /// Whether the drawer should show the progress bar at all (non-empty cart).
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.subtotal > Decimal::ZERO
    }

    /// Amount still needed, clamped to zero for display.
    #[must_use]
    pub fn remaining_display(&self) -> Decimal {
        self.remaining.max(Decimal::ZERO)
    }

    /// Drawer message for the current progress.
    #[must_use]
    pub fn message(&self, currency_code: &CurrencyCode) -> String {
        if self.is_qualified() {
            "You've earned free shipping!".to_string()
        } else {
            format!(
                "You're {} away from free shipping",
                format_price(self.remaining_display(), currency_code)
            )
        }
    }
}
