//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use testpool_core::config::AppConfig;
use testpool_store::IdentifierAllocator;

/// Application state passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Identifier pool
    pub allocator: Arc<dyn IdentifierAllocator>,
    /// When the server started
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Build state around an allocator.
    pub fn new(config: AppConfig, allocator: Arc<dyn IdentifierAllocator>) -> Self {
        Self {
            config: Arc::new(config),
            allocator,
            started_at: Utc::now(),
        }
    }
}
