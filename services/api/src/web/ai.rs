//! services/api/src/web/ai.rs
//!
//! Handlers for the AI features: chat, raw generation, day plans, timetable
//! recognition, video transcripts and video summaries. Every AI failure is answered with a JSON
//! body naming its kind, and each kind has its own status code.

use crate::adapters::media::extract_video_id;
use crate::web::state::AppState;
use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use focuspoint_core::domain::{
    ChatRole, ChatTurn, RecognizedLesson, ScheduleEvent, UserSettings, VideoSource,
};
use focuspoint_core::error::AiError;
use focuspoint_core::plan::parser::DraftItem;
use focuspoint_core::plan::{build_plan_prompt, parse_plan_response};
use focuspoint_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;

//=========================================================================================
// Error responses
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    /// `bad_request`, `unavailable`, `rate_limited`, `malformed_response` or `provider`.
    pub error: String,
    pub message: String,
}

#[derive(Debug)]
pub enum AiRouteError {
    BadRequest(String),
    Ai(AiError),
}

impl From<AiError> for AiRouteError {
    fn from(e: AiError) -> Self {
        AiRouteError::Ai(e)
    }
}

impl From<PortError> for AiRouteError {
    fn from(e: PortError) -> Self {
        AiRouteError::Ai(AiError::from(e))
    }
}

pub fn ai_status(e: &AiError) -> StatusCode {
    match e {
        AiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        AiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        AiError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
        AiError::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn ai_kind(e: &AiError) -> &'static str {
    match e {
        AiError::Unavailable(_) => "unavailable",
        AiError::RateLimited(_) => "rate_limited",
        AiError::MalformedResponse(_) => "malformed_response",
        AiError::Provider(_) => "provider",
    }
}

impl IntoResponse for AiRouteError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AiRouteError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorBody { error: "bad_request".to_string(), message },
            ),
            AiRouteError::Ai(e) => {
                warn!(error = %e, "AI request failed");
                (
                    ai_status(&e),
                    ErrorBody {
                        error: ai_kind(&e).to_string(),
                        message: e.user_message().to_string(),
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChatRoleDto {
    User,
    Model,
}

#[derive(Deserialize, ToSchema)]
pub struct ChatMessageDto {
    pub role: ChatRoleDto,
    pub text: String,
}

impl From<ChatMessageDto> for ChatTurn {
    fn from(m: ChatMessageDto) -> Self {
        let role = match m.role {
            ChatRoleDto::User => ChatRole::User,
            ChatRoleDto::Model => ChatRole::Model,
        };
        ChatTurn { role, text: m.text }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatMessageDto>,
}

#[derive(Serialize, ToSchema)]
pub struct ChatResponse {
    pub reply: String,
}

#[derive(Deserialize, ToSchema)]
pub struct GenerateRequest {
    pub text: String,
}

#[derive(Serialize, ToSchema)]
pub struct GenerateResponse {
    pub result: String,
}

#[derive(Deserialize, ToSchema)]
pub struct DayPlanRequest {
    pub date: NaiveDate,
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub schedule: Vec<ScheduleEvent>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub settings: UserSettings,
}

#[derive(Serialize, ToSchema)]
pub struct DayPlanResponse {
    pub date: NaiveDate,
    #[schema(value_type = Vec<Object>)]
    pub items: Vec<DraftItem>,
    pub analysis: String,
}

#[derive(Serialize, ToSchema)]
pub struct RecognizeResponse {
    #[schema(value_type = Vec<Object>)]
    pub lessons: Vec<RecognizedLesson>,
}

#[derive(Deserialize, ToSchema)]
pub struct SummarizeRequest {
    pub url: String,
}

#[derive(Serialize, ToSchema)]
pub struct SummarizeResponse {
    pub summary: String,
    pub title: String,
}

#[derive(Serialize, ToSchema)]
pub struct TranscribeResponse {
    /// Always `ok`; failures use [`ErrorBody`].
    pub status: String,
    pub transcription: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /ai/chat - Continue a conversation with the study assistant
#[utoipa::path(
    post,
    path = "/ai/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "The model's reply", body = ChatResponse),
        (status = 429, description = "Quota exhausted", body = ErrorBody),
        (status = 503, description = "AI not configured or unreachable", body = ErrorBody)
    )
)]
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AiRouteError> {
    if req.message.trim().is_empty() {
        return Err(AiRouteError::BadRequest("The message is empty".to_string()));
    }
    let history: Vec<ChatTurn> = req.history.into_iter().map(ChatTurn::from).collect();
    let reply = state.text.generate_text(&req.message, &history).await?;
    Ok(Json(ChatResponse { reply }))
}

/// POST /ai/generate - Send a raw prompt and return the plain text answer
#[utoipa::path(
    post,
    path = "/ai/generate",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Generated text", body = GenerateResponse),
        (status = 429, description = "Quota exhausted", body = ErrorBody),
        (status = 503, description = "AI not configured or unreachable", body = ErrorBody)
    )
)]
pub async fn generate_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AiRouteError> {
    if req.text.trim().is_empty() {
        return Err(AiRouteError::BadRequest("The prompt is empty".to_string()));
    }
    let result = state.text.generate_text(&req.text, &[]).await?;
    Ok(Json(GenerateResponse { result }))
}

/// POST /ai/day-plan - Generate a validated plan for one date
#[utoipa::path(
    post,
    path = "/ai/day-plan",
    request_body = DayPlanRequest,
    responses(
        (status = 200, description = "The parsed and validated plan", body = DayPlanResponse),
        (status = 429, description = "Quota exhausted", body = ErrorBody),
        (status = 502, description = "The model's answer could not be read as a plan", body = ErrorBody),
        (status = 503, description = "AI not configured or unreachable", body = ErrorBody)
    )
)]
pub async fn day_plan_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DayPlanRequest>,
) -> Result<Json<DayPlanResponse>, AiRouteError> {
    let prompt = build_plan_prompt(req.date, &req.schedule, &req.settings);
    let raw = state.text.generate_text(&prompt, &[]).await?;
    let parsed = parse_plan_response(&raw)?;
    info!(date = %req.date, items = parsed.items.len(), "Day plan generated");
    Ok(Json(DayPlanResponse {
        date: req.date,
        items: parsed.items,
        analysis: parsed.analysis,
    }))
}

fn image_mime(content_type: Option<&str>, file_name: Option<&str>) -> Option<String> {
    if let Some(ct) = content_type.filter(|ct| ct.starts_with("image/")) {
        return Some(ct.to_string());
    }
    let ext = file_name?.rsplit_once('.')?.1.to_lowercase();
    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "heic" => "image/heic",
        _ => return None,
    };
    Some(mime.to_string())
}

/// POST /ai/schedule/recognize - Read a timetable photo
///
/// Multipart fields: `image` (the photo) and optionally `group` (the class to keep).
#[utoipa::path(
    post,
    path = "/ai/schedule/recognize",
    request_body(content_type = "multipart/form-data", description = "`image` file and optional `group` text."),
    responses(
        (status = 200, description = "Recognized lessons", body = RecognizeResponse),
        (status = 400, description = "Missing or unsupported image", body = ErrorBody),
        (status = 503, description = "AI not configured or unreachable", body = ErrorBody)
    )
)]
pub async fn recognize_schedule_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<RecognizeResponse>, AiRouteError> {
    let bad = |e: axum::extract::multipart::MultipartError| AiRouteError::BadRequest(e.body_text());
    let mut image: Option<(Vec<u8>, String)> = None;
    let mut group = String::new();

    while let Some(field) = multipart.next_field().await.map_err(bad)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") | Some("file") => {
                let mime = image_mime(field.content_type(), field.file_name()).ok_or_else(|| {
                    AiRouteError::BadRequest("The upload is not a supported image".to_string())
                })?;
                let bytes = field.bytes().await.map_err(bad)?;
                image = Some((bytes.to_vec(), mime));
            }
            Some("group") => group = field.text().await.map_err(bad)?,
            _ => {}
        }
    }

    let (bytes, mime) =
        image.ok_or_else(|| AiRouteError::BadRequest("Multipart form must include an image".to_string()))?;
    let lessons = state.vision.recognize_schedule(&bytes, &mime, &group).await?;
    Ok(Json(RecognizeResponse { lessons }))
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"))
}

/// Reads the video from either a multipart upload (`file` or `video` field)
/// or a JSON `{ "url": "..." }` body holding a YouTube link.
async fn video_source(state: &Arc<AppState>, request: Request) -> Result<VideoSource, AiRouteError> {
    if is_multipart(request.headers()) {
        let mut multipart = Multipart::from_request(request, state)
            .await
            .map_err(|e| AiRouteError::BadRequest(e.body_text()))?;
        let mut upload = None;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AiRouteError::BadRequest(e.body_text()))?
        {
            if matches!(field.name(), Some("file") | Some("video")) {
                let file_name = field.file_name().unwrap_or("upload.mp4").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AiRouteError::BadRequest(e.body_text()))?;
                upload = Some(VideoSource::Upload { file_name, bytes: bytes.to_vec() });
            }
        }
        return upload.ok_or_else(|| AiRouteError::BadRequest("Multipart form must include a file".to_string()));
    }

    let Json(req) = Json::<SummarizeRequest>::from_request(request, state)
        .await
        .map_err(|e| AiRouteError::BadRequest(e.body_text()))?;
    let url = req.url.trim().to_string();
    let Some(video_id) = extract_video_id(&url) else {
        return Err(AiRouteError::BadRequest("Invalid YouTube URL".to_string()));
    };
    info!(%video_id, "Video requested");
    Ok(VideoSource::Url(url))
}

/// POST /ai/transcribe - Return what is said in a video as plain text
///
/// Accepts the same bodies as `/summarize`. Linked videos use their published
/// captions when they have any.
#[utoipa::path(
    post,
    path = "/ai/transcribe",
    request_body = SummarizeRequest,
    responses(
        (status = 200, description = "The cleaned transcript", body = TranscribeResponse),
        (status = 400, description = "Invalid URL or missing file", body = ErrorBody),
        (status = 429, description = "Quota exhausted", body = ErrorBody),
        (status = 503, description = "AI not configured or unreachable", body = ErrorBody)
    )
)]
pub async fn transcribe_handler(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<TranscribeResponse>, AiRouteError> {
    let source = video_source(&state, request).await?;
    let transcription = state.transcriber.transcribe_video(source).await?;
    Ok(Json(TranscribeResponse {
        status: "ok".to_string(),
        transcription,
    }))
}

/// POST /summarize - Turn a video into markdown study notes
///
/// Accepts either JSON `{ "url": "..." }` for a YouTube link or a multipart
/// upload with a `file` field.
#[utoipa::path(
    post,
    path = "/summarize",
    request_body = SummarizeRequest,
    responses(
        (status = 200, description = "Markdown summary and title", body = SummarizeResponse),
        (status = 400, description = "Invalid URL or missing file", body = ErrorBody),
        (status = 429, description = "Quota exhausted", body = ErrorBody),
        (status = 503, description = "AI not configured or unreachable", body = ErrorBody)
    )
)]
pub async fn summarize_handler(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<SummarizeResponse>, AiRouteError> {
    let source = video_source(&state, request).await?;
    let summary = state.summarizer.summarize_video(source).await?;
    Ok(Json(SummarizeResponse {
        summary: summary.summary,
        title: summary.title,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn each_ai_kind_has_its_own_status() {
        assert_eq!(ai_status(&AiError::Unavailable("no key".into())), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ai_status(&AiError::RateLimited("429".into())), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(ai_status(&AiError::MalformedResponse("x".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(ai_status(&AiError::Provider("x".into())), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn port_errors_become_route_errors() {
        let response = AiRouteError::from(PortError::RateLimited("quota".into())).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let response = AiRouteError::from(PortError::Unauthorized).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let response = AiRouteError::BadRequest("nope".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn image_type_from_header_or_extension() {
        assert_eq!(image_mime(Some("image/png"), None).as_deref(), Some("image/png"));
        assert_eq!(
            image_mime(Some("application/octet-stream"), Some("timetable.JPG")).as_deref(),
            Some("image/jpeg")
        );
        assert_eq!(image_mime(None, Some("notes.pdf")), None);
        assert_eq!(image_mime(None, None), None);
    }

    #[test]
    fn multipart_is_detected_from_content_type() {
        let mut headers = HeaderMap::new();
        assert!(!is_multipart(&headers));
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("multipart/form-data; boundary=xyz"),
        );
        assert!(is_multipart(&headers));
    }

    #[test]
    fn chat_history_roles_map_to_turns() {
        let dto: ChatMessageDto = serde_json::from_str(r#"{"role":"model","text":"Hi"}"#).unwrap();
        let turn = ChatTurn::from(dto);
        assert_eq!(turn.role, ChatRole::Model);
        assert_eq!(turn.text, "Hi");
    }

    #[test]
    fn day_plan_request_defaults_settings() {
        let req: DayPlanRequest = serde_json::from_str(r#"{"date":"2024-06-10"}"#).unwrap();
        assert!(req.schedule.is_empty());
        assert_eq!(req.settings, UserSettings::default());
    }
}
