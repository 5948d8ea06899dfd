//! services/api/src/adapters/unavailable.rs
//!
//! Stand-in for every AI port when no provider key is configured, so the
//! server still starts and AI routes answer with the "unavailable" kind.

use async_trait::async_trait;
use focuspoint_core::domain::{ChatTurn, RecognizedLesson, VideoSource, VideoSummary};
use focuspoint_core::ports::{
    PortError, PortResult, ScheduleRecognitionService, SpeechToTextService, TextGenerationService,
    VideoSummaryService, VideoTranscriptService,
};

#[derive(Clone, Debug)]
pub struct UnavailableAi {
    reason: String,
}

impl UnavailableAi {
    /// `variable` names the missing environment variable.
    pub fn missing_key(variable: &str) -> Self {
        Self { reason: format!("{variable} is not configured") }
    }

    fn err(&self) -> PortError {
        PortError::Unavailable(self.reason.clone())
    }
}

#[async_trait]
impl TextGenerationService for UnavailableAi {
    async fn generate_text(&self, _prompt: &str, _history: &[ChatTurn]) -> PortResult<String> {
        Err(self.err())
    }
}

#[async_trait]
impl ScheduleRecognitionService for UnavailableAi {
    async fn recognize_schedule(&self, _image: &[u8], _mime_type: &str, _group: &str) -> PortResult<Vec<RecognizedLesson>> {
        Err(self.err())
    }
}

#[async_trait]
impl SpeechToTextService for UnavailableAi {
    async fn transcribe_audio(&self, _audio_data: &[u8], _file_name: &str) -> PortResult<String> {
        Err(self.err())
    }
}

#[async_trait]
impl VideoTranscriptService for UnavailableAi {
    async fn transcribe_video(&self, _source: VideoSource) -> PortResult<String> {
        Err(self.err())
    }
}

#[async_trait]
impl VideoSummaryService for UnavailableAi {
    async fn summarize_video(&self, _source: VideoSource) -> PortResult<VideoSummary> {
        Err(self.err())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use focuspoint_core::AiError;

    #[tokio::test]
    async fn every_port_reports_unavailable() {
        let ai = UnavailableAi::missing_key("GEMINI_API_KEY");
        let e = ai.generate_text("hi", &[]).await.unwrap_err();
        assert!(e.to_string().contains("GEMINI_API_KEY"));
        assert!(matches!(AiError::from(e), AiError::Unavailable(_)));
        assert!(matches!(
            ai.recognize_schedule(b"", "image/png", "").await,
            Err(PortError::Unavailable(_))
        ));
        assert!(matches!(
            ai.transcribe_audio(b"x", "a.mp3").await,
            Err(PortError::Unavailable(_))
        ));
        assert!(matches!(
            ai.transcribe_video(VideoSource::Url("https://youtu.be/dQw4w9WgXcQ".into())).await,
            Err(PortError::Unavailable(_))
        ));
    }
}
