use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::ml::RiskModel;

/// Shared application state for API handlers.
///
/// The model is loaded once at startup and shared read-only across requests;
/// inference never mutates it, so an `Arc` is all the coordination needed.
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<RiskModel>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(model: Arc<RiskModel>) -> Self {
        Self {
            model,
            started_at: Utc::now(),
        }
    }

    /// Get service uptime in seconds
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
