pub mod bulk_assets;

use crate::db::DbPool;
use crate::events::EventSender;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub bulk_assets: Arc<crate::services::bulk_assets::BulkAssetService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        let bulk_assets = Arc::new(crate::services::bulk_assets::BulkAssetService::new(
            db_pool,
            event_sender,
        ));
        Self { bulk_assets }
    }
}
