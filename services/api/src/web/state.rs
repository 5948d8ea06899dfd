//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use focuspoint_core::ports::{
    AccountRepository, ProfileRepository, ScheduleRecognitionService, TextGenerationService,
    VideoSummaryService, VideoTranscriptService,
};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<dyn AccountRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub text: Arc<dyn TextGenerationService>,
    pub vision: Arc<dyn ScheduleRecognitionService>,
    pub transcriber: Arc<dyn VideoTranscriptService>,
    pub summarizer: Arc<dyn VideoSummaryService>,
    pub config: Arc<Config>,
}
