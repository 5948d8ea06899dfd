//! services/api/src/adapters/gemini.rs
//!
//! Text generation through Gemini's OpenAI-compatible endpoint. Implements the
//! `TextGenerationService` port. Models are tried in priority order; the next
//! model is only tried when the current one is missing or out of quota.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use focuspoint_core::domain::{ChatRole, ChatTurn};
use focuspoint_core::ports::{PortError, PortResult, TextGenerationService};
use tracing::{info, warn};

const SYSTEM_INSTRUCTIONS: &str = "You are FocusPoint, a friendly study assistant for school students. \
Help with homework, planning and understanding school topics. Answer concisely and in the language the student writes in.";

/// Builds a client pointed at the Gemini OpenAI-compatible base URL.
pub fn gemini_client(api_key: &str, base_url: &str) -> Client<OpenAIConfig> {
    Client::with_config(
        OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(base_url),
    )
}

//=========================================================================================
// Error classification
//=========================================================================================

/// Maps a provider error onto the port taxonomy.
pub fn classify_error(e: &OpenAIError) -> PortError {
    match e {
        OpenAIError::ApiError(api) => {
            let haystack = format!(
                "{} {} {}",
                api.message,
                api.code.as_deref().unwrap_or_default(),
                api.r#type.as_deref().unwrap_or_default()
            );
            classify_text(&haystack).unwrap_or_else(|| PortError::Unexpected(api.message.clone()))
        }
        OpenAIError::Reqwest(err) if err.is_connect() || err.is_timeout() => {
            PortError::Unavailable(format!("could not reach the AI provider: {err}"))
        }
        OpenAIError::Reqwest(err) => match err.status().map(|s| s.as_u16()) {
            Some(429) => PortError::RateLimited(err.to_string()),
            Some(404) => PortError::NotFound(err.to_string()),
            Some(401) | Some(403) => PortError::Unauthorized,
            _ => PortError::Unexpected(err.to_string()),
        },
        // Gemini sometimes wraps errors in a shape the client cannot deserialize.
        OpenAIError::JSONDeserialize(_, body) => {
            classify_text(body).unwrap_or_else(|| PortError::Unexpected(e.to_string()))
        }
        other => PortError::Unexpected(other.to_string()),
    }
}

fn classify_text(text: &str) -> Option<PortError> {
    let lower = text.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));
    if has(&["429", "quota", "resource_exhausted", "rate_limit", "rate limit"]) {
        Some(PortError::RateLimited(text.trim().to_string()))
    } else if has(&["404", "not_found", "not found"]) {
        Some(PortError::NotFound(text.trim().to_string()))
    } else if has(&["401", "403", "api key not valid", "permission_denied", "unauthenticated"]) {
        Some(PortError::Unauthorized)
    } else {
        None
    }
}

/// Whether the next model in the priority list should be tried.
fn try_next_model(e: &PortError) -> bool {
    matches!(e, PortError::NotFound(_) | PortError::RateLimited(_))
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone)]
pub struct GeminiTextAdapter {
    client: Client<OpenAIConfig>,
    models: Vec<String>,
}

impl GeminiTextAdapter {
    pub fn new(client: Client<OpenAIConfig>, models: Vec<String>) -> Self {
        Self { client, models }
    }

    fn build_messages(prompt: &str, history: &[ChatTurn]) -> PortResult<Vec<ChatCompletionRequestMessage>> {
        let to_port = |e: OpenAIError| PortError::Unexpected(e.to_string());
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(history.len() + 2);
        messages.push(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(to_port)?
                .into(),
        );
        for turn in history {
            let message: ChatCompletionRequestMessage = match turn.role {
                ChatRole::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(turn.text.as_str())
                    .build()
                    .map_err(to_port)?
                    .into(),
                ChatRole::Model => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(turn.text.as_str())
                    .build()
                    .map_err(to_port)?
                    .into(),
            };
            messages.push(message);
        }
        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(to_port)?
                .into(),
        );
        Ok(messages)
    }

    async fn complete_with(&self, model: &str, messages: Vec<ChatCompletionRequestMessage>) -> PortResult<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(messages)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| classify_error(&e))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| PortError::Unexpected("The model returned an empty reply".to_string()))
    }
}

//=========================================================================================
// `TextGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl TextGenerationService for GeminiTextAdapter {
    async fn generate_text(&self, prompt: &str, history: &[ChatTurn]) -> PortResult<String> {
        let messages = Self::build_messages(prompt, history)?;
        let mut last_error = None;
        for model in &self.models {
            match self.complete_with(model, messages.clone()).await {
                Ok(text) => {
                    info!(model = %model, "Gemini request succeeded");
                    return Ok(text);
                }
                Err(e) if try_next_model(&e) => {
                    warn!(model = %model, error = %e, "Gemini model unavailable, trying the next one");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_error.unwrap_or_else(|| PortError::Unavailable("no Gemini models configured".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_openai::error::ApiError;

    fn api_error(message: &str, code: Option<&str>) -> OpenAIError {
        OpenAIError::ApiError(ApiError {
            message: message.to_string(),
            r#type: None,
            param: None,
            code: code.map(String::from),
        })
    }

    #[test]
    fn quota_errors_are_rate_limits() {
        assert!(matches!(
            classify_error(&api_error("Resource has been exhausted (e.g. check quota).", Some("429"))),
            PortError::RateLimited(_)
        ));
        assert!(matches!(
            classify_error(&api_error("RESOURCE_EXHAUSTED", None)),
            PortError::RateLimited(_)
        ));
    }

    #[test]
    fn missing_models_are_not_found() {
        let e = classify_error(&api_error("models/gemini-1.5-flash is not found for API version v1beta", Some("404")));
        assert!(matches!(e, PortError::NotFound(_)));
        assert!(try_next_model(&e));
    }

    #[test]
    fn bad_keys_stop_the_fallback() {
        let e = classify_error(&api_error("API key not valid. Please pass a valid API key.", Some("400")));
        assert!(matches!(e, PortError::Unauthorized));
        assert!(!try_next_model(&e));

        let other = classify_error(&api_error("Internal error encountered.", Some("500")));
        assert!(matches!(other, PortError::Unexpected(_)));
        assert!(!try_next_model(&other));
    }

    #[test]
    fn undeserializable_error_bodies_are_inspected() {
        let body = r#"[{"error":{"code":429,"status":"RESOURCE_EXHAUSTED"}}]"#.to_string();
        let e = OpenAIError::JSONDeserialize(serde_json::from_str::<u8>("x").unwrap_err(), body);
        assert!(matches!(classify_error(&e), PortError::RateLimited(_)));
    }

    #[test]
    fn history_becomes_alternating_messages() {
        let history = vec![
            ChatTurn { role: ChatRole::User, text: "What is a vector?".into() },
            ChatTurn { role: ChatRole::Model, text: "A quantity with direction.".into() },
        ];
        let messages = GeminiTextAdapter::build_messages("Give an example", &history).unwrap();
        assert_eq!(messages.len(), 4);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(messages[2], ChatCompletionRequestMessage::Assistant(_)));
        assert!(matches!(messages[3], ChatCompletionRequestMessage::User(_)));
    }
}
