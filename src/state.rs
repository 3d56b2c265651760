use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::DatabaseManager;
use crate::storage::Uploader;

/// Handles shared by every request: opened in `main`, cloned per request
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseManager,
    pub uploader: Arc<dyn Uploader>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(db: DatabaseManager, uploader: Arc<dyn Uploader>, config: AppConfig) -> Self {
        Self {
            db,
            uploader,
            config: Arc::new(config),
        }
    }
}
