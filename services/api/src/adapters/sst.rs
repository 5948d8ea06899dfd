//! services/api/src/adapters/sst.rs
//!
//! This module contains the adapter for OpenAI's Speech-to-Text (Whisper) service.
//! It implements the `SpeechToTextService` port from the `core` crate.

use crate::adapters::gemini::classify_error;
use async_openai::{
    config::OpenAIConfig,
    types::audio::{AudioInput, CreateTranscriptionRequest},
    Client,
};
use async_trait::async_trait;
use focuspoint_core::ports::{PortError, PortResult, SpeechToTextService};
use tracing::info;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// Transcribes uploaded or downloaded media with the Whisper API. The file
/// name's extension tells the API which container it is reading.
#[derive(Clone)]
pub struct WhisperSstAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl WhisperSstAdapter {
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

//=========================================================================================
// `SpeechToTextService` Trait Implementation
//=========================================================================================

#[async_trait]
impl SpeechToTextService for WhisperSstAdapter {
    async fn transcribe_audio(&self, audio_data: &[u8], file_name: &str) -> PortResult<String> {
        if audio_data.is_empty() {
            return Err(PortError::Unexpected("The media file is empty".to_string()));
        }

        let request = CreateTranscriptionRequest {
            file: AudioInput::from_vec_u8(file_name.to_string(), audio_data.to_vec()),
            model: self.model.clone(),
            ..Default::default()
        };

        let response = self
            .client
            .audio()
            .transcription()
            .create(request)
            .await
            .map_err(|e| classify_error(&e))?;

        info!(file_name, chars = response.text.len(), "Transcription finished");
        Ok(response.text)
    }
}
