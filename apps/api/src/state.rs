use std::sync::Arc;

use crate::interview::engine::InterviewEngine;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Built once at startup around the AI gateway and conversation store handles.
    pub engine: Arc<InterviewEngine>,
}
