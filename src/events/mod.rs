use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Events emitted by the service layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Cart events
    CartItemAdded { owner_id: Uuid, item_id: Uuid },
    CartItemRemoved { owner_id: Uuid, item_id: Uuid },
    CartCleared { owner_id: Uuid },

    // Wishlist events
    WishlistItemAdded { owner_id: Uuid, item_id: Uuid },
    WishlistItemMovedToCart { owner_id: Uuid, item_id: Uuid },

    // Delivery events
    DeliveryDetailSaved(Uuid),
    DeliveryStatusChanged {
        delivery_id: Uuid,
        old_status: String,
        new_status: String,
    },

    // Order lifecycle events
    OrderCreated(Uuid),
    OrderCompleted(Uuid),
    OrderExpired(Uuid),
    PaymentFailed { order_number: String },

    // Bank slip events
    BankSlipUploaded(Uuid),
    BankSlipReviewed { slip_id: Uuid, status: String },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, returning an error if the channel is closed.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event; a full or closed channel is logged, never fatal.
    /// Event delivery is best-effort and must not fail the request.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.sender.send(event).await {
            warn!("Event dropped: {}", e);
        }
    }
}

/// Consumes events off the channel and logs them. Runs for the lifetime of
/// the process; exits when every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::OrderCompleted(order_id) => {
                info!(%order_id, "order completed");
            }
            Event::OrderExpired(order_id) => {
                info!(%order_id, "pending order expired");
            }
            Event::PaymentFailed { order_number } => {
                warn!(%order_number, "payment failed");
            }
            other => {
                info!("Received event: {:?}", other);
            }
        }
    }

    info!("Event processing loop stopped");
}
