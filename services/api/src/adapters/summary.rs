//! services/api/src/adapters/summary.rs
//!
//! Turns a video into study notes. A linked video's published captions are
//! used when it has any; otherwise its audio is downloaded and transcribed.
//! The cleaned transcript then goes to the text model for a markdown summary
//! and a short title. Implements the `VideoTranscriptService` and
//! `VideoSummaryService` ports.

use crate::adapters::media::{clean_transcript, DownloadedAudio, VideoMedia};
use async_trait::async_trait;
use focuspoint_core::domain::{VideoSource, VideoSummary};
use focuspoint_core::ports::{
    PortError, PortResult, SpeechToTextService, TextGenerationService, VideoSummaryService,
    VideoTranscriptService,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Transcripts longer than this are cut before prompting.
const MAX_TRANSCRIPT_CHARS: usize = 60_000;
const TITLE_PREVIEW_CHARS: usize = 1_000;
const FALLBACK_TITLE: &str = "Video notes";

pub struct TranscriptSummaryAdapter {
    media: Arc<dyn VideoMedia>,
    sst: Arc<dyn SpeechToTextService>,
    text: Arc<dyn TextGenerationService>,
}

impl TranscriptSummaryAdapter {
    pub fn new(
        media: Arc<dyn VideoMedia>,
        sst: Arc<dyn SpeechToTextService>,
        text: Arc<dyn TextGenerationService>,
    ) -> Self {
        Self { media, sst, text }
    }

    async fn transcript_of(&self, source: VideoSource) -> PortResult<String> {
        let DownloadedAudio { file_name, bytes } = match source {
            VideoSource::Url(url) => {
                match self.media.fetch_captions(&url).await {
                    Ok(Some(captions)) => {
                        info!(chars = captions.len(), "Using published captions");
                        return Ok(captions);
                    }
                    Ok(None) => debug!("No captions published, transcribing the audio"),
                    Err(e) => warn!(error = %e, "Caption lookup failed, transcribing the audio"),
                }
                self.media.download_audio(&url).await?
            }
            VideoSource::Upload { file_name, bytes } => DownloadedAudio { file_name, bytes },
        };
        let raw = self.sst.transcribe_audio(&bytes, &file_name).await?;
        let cleaned = clean_transcript(&raw);
        if cleaned.is_empty() {
            return Err(PortError::Unexpected("No speech was recognized in the video".to_string()));
        }
        Ok(cleaned)
    }

    async fn title_for(&self, summary: &str) -> String {
        let preview: String = summary.chars().take(TITLE_PREVIEW_CHARS).collect();
        match self.text.generate_text(&title_prompt(&preview), &[]).await {
            Ok(title) => tidy_title(&title).unwrap_or_else(|| fallback_title(summary)),
            Err(e) => {
                warn!(error = %e, "Title generation failed, using the summary heading");
                fallback_title(summary)
            }
        }
    }
}

fn summary_prompt(transcript: &str) -> String {
    let transcript: String = transcript.chars().take(MAX_TRANSCRIPT_CHARS).collect();
    format!(
        "Below is the transcript of an educational video. Write study notes for a school student in markdown: \
         a level-one heading with the topic, the key ideas as sections with bullet points, important terms in bold, \
         and a short recap at the end. Write in the language of the transcript.\n\nTranscript:\n{transcript}"
    )
}

fn title_prompt(preview: &str) -> String {
    format!(
        "Generate a short, descriptive title (maximum 6 words) for these notes. \
         Respond with ONLY the title, no quotes, no explanation.\n\n{preview}"
    )
}

fn tidy_title(raw: &str) -> Option<String> {
    let line = raw.lines().map(str::trim).find(|l| !l.is_empty())?;
    let title = line.trim_start_matches('#').trim().trim_matches(|c| c == '"' || c == '\'' || c == '*');
    (!title.is_empty()).then(|| title.to_string())
}

/// The first markdown heading, or a generic title.
fn fallback_title(summary: &str) -> String {
    summary
        .lines()
        .map(str::trim)
        .find(|l| l.starts_with('#'))
        .and_then(tidy_title)
        .unwrap_or_else(|| FALLBACK_TITLE.to_string())
}

#[async_trait]
impl VideoTranscriptService for TranscriptSummaryAdapter {
    async fn transcribe_video(&self, source: VideoSource) -> PortResult<String> {
        self.transcript_of(source).await
    }
}

#[async_trait]
impl VideoSummaryService for TranscriptSummaryAdapter {
    async fn summarize_video(&self, source: VideoSource) -> PortResult<VideoSummary> {
        let transcript = self.transcript_of(source).await?;
        info!(chars = transcript.len(), "Summarizing transcript");

        let summary = self.text.generate_text(&summary_prompt(&transcript), &[]).await?;
        let title = self.title_for(&summary).await;
        Ok(VideoSummary { summary, title })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use focuspoint_core::domain::ChatTurn;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct EchoSst {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SpeechToTextService for EchoSst {
        async fn transcribe_audio(&self, audio_data: &[u8], _file_name: &str) -> PortResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(String::from_utf8_lossy(audio_data).into_owned())
        }
    }

    /// A video with optional captions and a fixed audio track.
    struct FakeMedia {
        captions: PortResult<Option<String>>,
        audio: &'static str,
        downloads: AtomicUsize,
    }

    impl FakeMedia {
        fn new(captions: PortResult<Option<String>>, audio: &'static str) -> Self {
            Self { captions, audio, downloads: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl VideoMedia for FakeMedia {
        async fn fetch_captions(&self, _url: &str) -> PortResult<Option<String>> {
            match &self.captions {
                Ok(captions) => Ok(captions.clone()),
                Err(e) => Err(PortError::Unexpected(e.to_string())),
            }
        }

        async fn download_audio(&self, _url: &str) -> PortResult<DownloadedAudio> {
            self.downloads.fetch_add(1, Ordering::SeqCst);
            Ok(DownloadedAudio { file_name: "audio.m4a".into(), bytes: self.audio.as_bytes().to_vec() })
        }
    }

    struct Replies {
        replies: Mutex<Vec<PortResult<String>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl Replies {
        fn new(replies: Vec<PortResult<String>>) -> Self {
            Self { replies: Mutex::new(replies), prompts: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl TextGenerationService for Replies {
        async fn generate_text(&self, prompt: &str, _history: &[ChatTurn]) -> PortResult<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies.lock().unwrap().remove(0)
        }
    }

    fn adapter(text: Arc<Replies>) -> TranscriptSummaryAdapter {
        TranscriptSummaryAdapter::new(
            Arc::new(FakeMedia::new(Ok(None), "")),
            Arc::new(EchoSst::default()),
            text,
        )
    }

    const LINK: &str = "https://youtu.be/dQw4w9WgXcQ";

    #[tokio::test]
    async fn published_captions_skip_the_audio() {
        let media = Arc::new(FakeMedia::new(Ok(Some("Mitosis has four phases.".into())), "audio words"));
        let sst = Arc::new(EchoSst::default());
        let adapter = TranscriptSummaryAdapter::new(media.clone(), sst.clone(), Arc::new(Replies::new(vec![])));

        let text = adapter.transcribe_video(VideoSource::Url(LINK.into())).await.unwrap();
        assert_eq!(text, "Mitosis has four phases.");
        assert_eq!(media.downloads.load(Ordering::SeqCst), 0);
        assert_eq!(sst.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_or_failed_captions_fall_back_to_the_audio() {
        for captions in [Ok(None), Err(PortError::Unexpected("yt-dlp exited with 1".into()))] {
            let media = Arc::new(FakeMedia::new(captions, "[00:00.000 --> 00:01.000] Spoken  words"));
            let sst = Arc::new(EchoSst::default());
            let adapter =
                TranscriptSummaryAdapter::new(media.clone(), sst.clone(), Arc::new(Replies::new(vec![])));

            let text = adapter.transcribe_video(VideoSource::Url(LINK.into())).await.unwrap();
            assert_eq!(text, "Spoken words");
            assert_eq!(media.downloads.load(Ordering::SeqCst), 1);
            assert_eq!(sst.calls.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test]
    async fn uploads_never_look_for_captions() {
        let media = Arc::new(FakeMedia::new(Ok(Some("captions".into())), ""));
        let adapter = TranscriptSummaryAdapter::new(
            media.clone(),
            Arc::new(EchoSst::default()),
            Arc::new(Replies::new(vec![])),
        );
        let upload = VideoSource::Upload { file_name: "talk.mp4".into(), bytes: b"From the upload".to_vec() };
        assert_eq!(adapter.transcribe_video(upload).await.unwrap(), "From the upload");
        assert_eq!(media.downloads.load(Ordering::SeqCst), 0);
    }

    fn upload(text: &str) -> VideoSource {
        VideoSource::Upload { file_name: "lecture.mp4".into(), bytes: text.as_bytes().to_vec() }
    }

    #[tokio::test]
    async fn upload_is_transcribed_cleaned_and_summarized() {
        let text = Arc::new(Replies::new(vec![
            Ok("# Photosynthesis\n\n- light becomes sugar".into()),
            Ok("\"How Plants Eat\"".into()),
        ]));
        let result = adapter(text.clone())
            .summarize_video(upload("[00:00.000 --> 00:02.000]  Plants   use light."))
            .await
            .unwrap();

        assert_eq!(result.title, "How Plants Eat");
        assert!(result.summary.starts_with("# Photosynthesis"));
        let prompts = text.prompts.lock().unwrap();
        assert!(prompts[0].ends_with("Transcript:\nPlants use light."));
    }

    #[tokio::test]
    async fn failed_title_falls_back_to_the_heading() {
        let text = Arc::new(Replies::new(vec![
            Ok("# Newton's Laws\n\nForces.".into()),
            Err(PortError::RateLimited("429".into())),
        ]));
        let result = adapter(text).summarize_video(upload("Inertia and force.")).await.unwrap();
        assert_eq!(result.title, "Newton's Laws");
    }

    #[tokio::test]
    async fn silent_media_is_an_error() {
        let text = Arc::new(Replies::new(vec![]));
        let err = adapter(text).summarize_video(upload("  \n ")).await.unwrap_err();
        assert!(matches!(err, PortError::Unexpected(_)));
    }

    #[test]
    fn fallback_title_without_heading() {
        assert_eq!(fallback_title("just text"), FALLBACK_TITLE);
        assert_eq!(tidy_title("## **Cells**\nmore"), Some("Cells".to_string()));
    }
}
