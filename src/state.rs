//! Application state management
//!
//! Contains shared state accessible across all handlers.

use crate::config::Settings;
use crate::report::ReportStore;
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Settings,

    /// Reports produced by compare and check requests
    pub reports: ReportStore,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let reports = ReportStore::with_capacity(settings.compliance.report_store_capacity);
        Self { settings, reports }
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;
