//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the long-lived
//! services every handler needs: the generation pipeline and the result cache.

use learnpath_core::{cache::ResultCache, pipeline::CoursePipeline};
use std::{sync::Arc, time::Duration};

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<CoursePipeline>,
    pub cache: Arc<ResultCache>,
    /// Pause between two chunks of a streamed response.
    pub stream_pacing: Duration,
}
