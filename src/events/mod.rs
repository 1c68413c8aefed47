use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use crate::entities::asset::CheckoutTargetType;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

// Define the various events that can occur in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Asset lifecycle events
    AssetUpdated(Uuid),
    AssetDeleted(Uuid),
    AssetRestored(Uuid),

    // Assignment events
    AssetCheckedOut {
        asset_id: Uuid,
        target_type: CheckoutTargetType,
        target_id: Uuid,
    },
    AssetCheckedIn(Uuid),
}

// Function to process incoming events. Downstream consumers (notification
// fan-out, webhook delivery) hang off this loop.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        info!("Received event: {:?}", event);

        match event {
            Event::AssetUpdated(asset_id) => {
                info!("Asset updated: {}", asset_id);
            }
            Event::AssetDeleted(asset_id) => {
                info!("Asset deleted: {}", asset_id);
            }
            Event::AssetRestored(asset_id) => {
                info!("Asset restored: {}", asset_id);
            }
            Event::AssetCheckedOut {
                asset_id,
                target_type,
                target_id,
            } => {
                info!(
                    "Asset {} checked out to {} {}",
                    asset_id, target_type, target_id
                );
            }
            Event::AssetCheckedIn(asset_id) => {
                info!("Asset checked in: {}", asset_id);
            }
        }
    }

    info!("Event processing loop stopped");
}
