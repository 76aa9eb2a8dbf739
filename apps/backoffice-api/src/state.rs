//! Shared handler state.

use std::sync::Arc;
use tripdesk_db::Database;

use crate::config::ApiConfig;

/// State cloned into every handler.
///
/// `Database` wraps a pool and is cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        AppState {
            db,
            config: Arc::new(config),
        }
    }
}
