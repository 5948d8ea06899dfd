//! services/api/src/adapters/vision.rs
//!
//! Reads a school timetable off a photo with a Gemini vision model. Implements
//! the `ScheduleRecognitionService` port.

use crate::adapters::gemini::classify_error;
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessageContentPartImage, ChatCompletionRequestMessageContentPartText,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
        ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequestArgs, ImageUrl,
    },
    Client,
};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use focuspoint_core::domain::RecognizedLesson;
use focuspoint_core::plan::parser::{extract_object, strip_code_fences, strip_trailing_commas};
use focuspoint_core::ports::{PortError, PortResult, ScheduleRecognitionService};
use focuspoint_core::time::ClockTime;
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Clone)]
pub struct GeminiScheduleAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl GeminiScheduleAdapter {
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

fn recognition_prompt(group: &str) -> String {
    let group_hint = if group.trim().is_empty() {
        "If the timetable covers several classes, use the first one.".to_string()
    } else {
        format!("The timetable may cover several classes; only take lessons of class \"{}\".", group.trim())
    };
    format!(
        "This image is a weekly school timetable. {group_hint} \
         List every lesson with its weekday, subject, start and end time (HH:mm) and room if shown. \
         Reply with JSON only, in exactly this shape: \
         {{\"lessons\":[{{\"day\":\"Monday\",\"title\":\"...\",\"start\":\"08:30\",\"end\":\"09:15\",\"room\":\"204\"}}]}}"
    )
}

#[derive(Deserialize)]
struct LessonsReply {
    #[serde(default)]
    lessons: Vec<RawLesson>,
}

#[derive(Deserialize)]
struct RawLesson {
    #[serde(default)]
    title: String,
    #[serde(default)]
    start: String,
    #[serde(default)]
    end: String,
    #[serde(default)]
    room: Option<serde_json::Value>,
    #[serde(default)]
    day: Option<serde_json::Value>,
}

fn value_to_text(value: Option<serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Turns the model reply into lessons, skipping entries without a title or
/// with unreadable times.
pub fn parse_lessons(raw: &str) -> PortResult<Vec<RecognizedLesson>> {
    let cleaned = strip_trailing_commas(&extract_object(&strip_code_fences(raw)));
    let reply: LessonsReply = serde_json::from_str(&cleaned)
        .map_err(|e| PortError::Unexpected(format!("Unreadable timetable reply: {e}")))?;

    let total = reply.lessons.len();
    let lessons: Vec<RecognizedLesson> = reply
        .lessons
        .into_iter()
        .filter_map(|l| {
            let title = l.title.trim().to_string();
            let start = l.start.parse::<ClockTime>().ok()?;
            let end = l.end.parse::<ClockTime>().ok()?;
            (!title.is_empty()).then(|| RecognizedLesson {
                title,
                start,
                end,
                room: value_to_text(l.room),
                day: value_to_text(l.day),
            })
        })
        .collect();
    if lessons.len() < total {
        warn!(skipped = total - lessons.len(), "Dropped unreadable timetable entries");
    }
    Ok(lessons)
}

#[async_trait]
impl ScheduleRecognitionService for GeminiScheduleAdapter {
    async fn recognize_schedule(&self, image: &[u8], mime_type: &str, group: &str) -> PortResult<Vec<RecognizedLesson>> {
        let data_url = format!("data:{};base64,{}", mime_type, B64.encode(image));
        let parts = vec![
            ChatCompletionRequestUserMessageContentPart::Text(ChatCompletionRequestMessageContentPartText {
                text: recognition_prompt(group),
            }),
            ChatCompletionRequestUserMessageContentPart::ImageUrl(ChatCompletionRequestMessageContentPartImage {
                image_url: ImageUrl { url: data_url, detail: None },
            }),
        ];
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(ChatCompletionRequestUserMessageContent::Array(parts))
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.as_str())
            .messages(vec![message.into()])
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| classify_error(&e))?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| PortError::Unexpected("The model returned no timetable".to_string()))?;

        let lessons = parse_lessons(&text)?;
        info!(count = lessons.len(), "Timetable recognized");
        Ok(lessons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_reply_with_numeric_days_and_rooms() {
        let raw = "```json\n{\"lessons\":[\
            {\"day\":1,\"title\":\"Алгебра\",\"start\":\"8:30\",\"end\":\"09:15\",\"room\":204},\
            {\"day\":\"Tuesday\",\"title\":\"History\",\"start\":\"09:25\",\"end\":\"10:10\"},\
            ]}\n```";
        let lessons = parse_lessons(raw).unwrap();
        assert_eq!(lessons.len(), 2);
        assert_eq!(lessons[0].day.as_deref(), Some("1"));
        assert_eq!(lessons[0].room.as_deref(), Some("204"));
        assert_eq!(lessons[0].start, ClockTime::hm(8, 30));
        assert_eq!(lessons[1].room, None);
    }

    #[test]
    fn unreadable_entries_are_skipped() {
        let raw = r#"{"lessons":[{"title":"","start":"08:00","end":"08:45"},{"title":"PE","start":"noon","end":"13:00"},{"title":"Art","start":"10:00","end":"10:45"}]}"#;
        let lessons = parse_lessons(raw).unwrap();
        assert_eq!(lessons.len(), 1);
        assert_eq!(lessons[0].title, "Art");
    }

    #[test]
    fn prose_is_an_error() {
        assert!(parse_lessons("I cannot read this image.").is_err());
    }

    #[test]
    fn prompt_names_the_group() {
        assert!(recognition_prompt("9Б").contains("class \"9Б\""));
        assert!(recognition_prompt("  ").contains("first one"));
    }
}
