//! Mount point for one subscription widget.

use std::sync::Arc;

use lumiere_core::VariantId;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cart::CartStore;

use super::{PlanSelection, SdkError, SubscriptionSdk, WidgetEvent, WidgetTarget, add_lines_and_open_cart};

struct Mounted {
    target: WidgetTarget,
    variant: Option<VariantId>,
    stop: oneshot::Sender<()>,
    forwarder: JoinHandle<()>,
}

/// Owns a widget's lifecycle and forwards its events into the cart.
pub struct WidgetHost {
    sdk: Arc<dyn SubscriptionSdk>,
    store: Arc<CartStore>,
    plans: Option<mpsc::UnboundedSender<PlanSelection>>,
    mounted: Option<Mounted>,
}

impl WidgetHost {
    #[must_use]
    pub fn new(sdk: Arc<dyn SubscriptionSdk>, store: Arc<CartStore>) -> Self {
        Self {
            sdk,
            store,
            plans: None,
            mounted: None,
        }
    }

    /// Receive plan selections on `listener`.
    #[must_use]
    pub fn with_plan_listener(mut self, listener: mpsc::UnboundedSender<PlanSelection>) -> Self {
        self.plans = Some(listener);
        self
    }

    #[must_use]
    pub fn target(&self) -> Option<&WidgetTarget> {
        self.mounted.as_ref().map(|m| &m.target)
    }

    /// Initialize the widget for `target` and start forwarding its events.
    /// A widget already mounted is unmounted first.
    ///
    /// # Errors
    ///
    /// Returns the SDK failure; nothing is left mounted.
    pub async fn mount(&mut self, target: WidgetTarget) -> Result<(), SdkError> {
        if self.mounted.is_some() {
            self.unmount().await?;
        }

        self.sdk.init(&target).await?;
        let events = self.sdk.subscribe();
        let (stop, stopped) = oneshot::channel();
        let forwarder = tokio::spawn(forward(
            events,
            stopped,
            Arc::clone(&self.store),
            self.plans.clone(),
        ));

        info!(target = ?target, "Subscription widget mounted");
        self.mounted = Some(Mounted {
            variant: target.initial_variant().cloned(),
            target,
            stop,
            forwarder,
        });
        Ok(())
    }

    /// Point the widget at `variant_id`. Returns `false`, without calling
    /// the SDK, when it already shows that variant.
    ///
    /// # Errors
    ///
    /// Returns `SdkError::NotMounted` or the SDK failure.
    pub async fn set_variant(&mut self, variant_id: VariantId) -> Result<bool, SdkError> {
        let mounted = self.mounted.as_mut().ok_or(SdkError::NotMounted)?;
        if mounted.variant.as_ref() == Some(&variant_id) {
            return Ok(false);
        }

        self.sdk.set_variant(&variant_id).await?;
        mounted.variant = Some(variant_id);
        Ok(true)
    }

    /// Stop forwarding, then destroy the widget. An event being handled
    /// when this is called finishes first.
    ///
    /// # Errors
    ///
    /// Returns the SDK failure from `destroy`.
    pub async fn unmount(&mut self) -> Result<(), SdkError> {
        let Some(mounted) = self.mounted.take() else {
            return Ok(());
        };

        let _ = mounted.stop.send(());
        if let Err(e) = mounted.forwarder.await {
            warn!(error = %e, "Widget event forwarder ended abnormally");
        }
        self.sdk.destroy().await?;
        info!(target = ?mounted.target, "Subscription widget unmounted");
        Ok(())
    }
}

impl Drop for WidgetHost {
    fn drop(&mut self) {
        if let Some(mounted) = self.mounted.take() {
            mounted.forwarder.abort();
        }
    }
}

async fn forward(
    mut events: mpsc::UnboundedReceiver<WidgetEvent>,
    mut stopped: oneshot::Receiver<()>,
    store: Arc<CartStore>,
    plans: Option<mpsc::UnboundedSender<PlanSelection>>,
) {
    loop {
        let event = tokio::select! {
            _ = &mut stopped => break,
            event = events.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        match event {
            WidgetEvent::AddToCart {
                lines,
                discount_codes,
            } => {
                if let Err(e) = add_lines_and_open_cart(&store, lines, discount_codes).await {
                    warn!(error = %e, "Subscription add-to-cart failed");
                }
            }
            WidgetEvent::PlanSelected(selection) => {
                debug!(selection = ?selection, "Plan selected");
                if let Some(plans) = &plans {
                    let _ = plans.send(selection);
                }
            }
        }
    }
}
