//! crates/focuspoint_core/src/error.rs
//!
//! Error kinds surfaced by the store and the plan cache.

use crate::ports::PortError;

/// Local durable write or read failed. Always fatal to the mutation.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures of the AI features, split so the UI can word each one differently.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("AI service unavailable: {0}")]
    Unavailable(String),
    #[error("AI quota exhausted: {0}")]
    RateLimited(String),
    #[error("malformed AI response: {0}")]
    MalformedResponse(String),
    #[error("AI provider error: {0}")]
    Provider(String),
}

impl AiError {
    /// Copy shown to the user for each kind.
    pub fn user_message(&self) -> &'static str {
        match self {
            AiError::Unavailable(_) => {
                "The AI assistant is not available right now. Check the connection or the API key."
            }
            AiError::RateLimited(_) => {
                "The AI request limit has been reached. Please wait a while before trying again."
            }
            AiError::MalformedResponse(_) => "The AI returned an unreadable plan. Please try again.",
            AiError::Provider(_) => "Something went wrong while talking to the AI.",
        }
    }
}

impl From<PortError> for AiError {
    fn from(e: PortError) -> Self {
        match e {
            PortError::Unavailable(msg) => AiError::Unavailable(msg),
            PortError::RateLimited(msg) => AiError::RateLimited(msg),
            PortError::Unauthorized => AiError::Unavailable("provider rejected the credential".into()),
            PortError::NotFound(msg) | PortError::Conflict(msg) | PortError::Unexpected(msg) => {
                AiError::Provider(msg)
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Persistence failure: {0}")]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Ai(#[from] AiError),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_errors_map_to_distinct_ai_kinds() {
        assert!(matches!(
            AiError::from(PortError::RateLimited("429".into())),
            AiError::RateLimited(_)
        ));
        assert!(matches!(
            AiError::from(PortError::Unavailable("no key".into())),
            AiError::Unavailable(_)
        ));
        assert!(matches!(
            AiError::from(PortError::Unexpected("boom".into())),
            AiError::Provider(_)
        ));
    }

    #[test]
    fn each_kind_has_its_own_message() {
        let unavailable = AiError::Unavailable(String::new()).user_message();
        let limited = AiError::RateLimited(String::new()).user_message();
        let malformed = AiError::MalformedResponse(String::new()).user_message();
        assert_ne!(unavailable, limited);
        assert_ne!(limited, malformed);
        assert_ne!(unavailable, malformed);
    }
}
