//! crates/focuspoint_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the hosted auth/database service and the generative-AI API.

use crate::domain::{
    ChatTurn, ProfileRecord, RecognizedLesson, User, UserCredentials, VideoSource, VideoSummary,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    /// No credential configured, or the provider could not be reached.
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    /// The provider reported quota exhaustion.
    #[error("Rate limited: {0}")]
    RateLimited(String),
    /// The write clashes with an existing record, such as a taken email.
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Remote profile and session ports
//=========================================================================================

/// The remote mirror of a user's data: one record per user, replaced wholesale.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn load_profile(&self, user_id: Uuid) -> PortResult<Option<ProfileRecord>>;

    async fn upsert_profile(&self, user_id: Uuid, record: &ProfileRecord) -> PortResult<()>;
}

/// The client's view of its authenticated session.
#[async_trait]
pub trait SessionService: Send + Sync {
    async fn sign_out(&self) -> PortResult<()>;
}

/// Server-side account and cookie-session storage.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn create_user_with_email(&self, email: &str, hashed_password: &str) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;
}

//=========================================================================================
// AI ports
//=========================================================================================

#[async_trait]
pub trait TextGenerationService: Send + Sync {
    /// Sends `prompt` after the earlier `history` and returns the model's plain text.
    async fn generate_text(&self, prompt: &str, history: &[ChatTurn]) -> PortResult<String>;
}

#[async_trait]
pub trait ScheduleRecognitionService: Send + Sync {
    /// Reads a weekly timetable off an image. `group` narrows multi-class timetables.
    async fn recognize_schedule(
        &self,
        image: &[u8],
        mime_type: &str,
        group: &str,
    ) -> PortResult<Vec<RecognizedLesson>>;
}

#[async_trait]
pub trait SpeechToTextService: Send + Sync {
    /// Transcribes an audio or video file into text.
    async fn transcribe_audio(&self, audio_data: &[u8], file_name: &str) -> PortResult<String>;
}

/// Plain text of what is said in a video. Published captions are preferred
/// over recognizing the audio.
#[async_trait]
pub trait VideoTranscriptService: Send + Sync {
    async fn transcribe_video(&self, source: VideoSource) -> PortResult<String>;
}

#[async_trait]
pub trait VideoSummaryService: Send + Sync {
    async fn summarize_video(&self, source: VideoSource) -> PortResult<VideoSummary>;
}
