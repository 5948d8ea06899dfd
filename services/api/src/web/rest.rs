//! services/api/src/web/rest.rs
//!
//! Contains the health check and the master definition for the OpenAPI
//! specification.

use crate::web::{ai, auth, profile};
use axum::response::Json;
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        profile::get_profile_handler,
        profile::put_profile_handler,
        ai::chat_handler,
        ai::generate_handler,
        ai::day_plan_handler,
        ai::recognize_schedule_handler,
        ai::transcribe_handler,
        ai::summarize_handler,
    ),
    components(
        schemas(
            HealthResponse,
            auth::SignupRequest,
            auth::LoginRequest,
            auth::AuthResponse,
            ai::ErrorBody,
            ai::ChatRoleDto,
            ai::ChatMessageDto,
            ai::ChatRequest,
            ai::ChatResponse,
            ai::GenerateRequest,
            ai::GenerateResponse,
            ai::DayPlanRequest,
            ai::DayPlanResponse,
            ai::RecognizeResponse,
            ai::SummarizeRequest,
            ai::SummarizeResponse,
            ai::TranscribeResponse,
        )
    ),
    tags(
        (name = "FocusPoint API", description = "Accounts, profile sync and AI helpers for the FocusPoint planner.")
    )
)]
pub struct ApiDoc;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: &'static str,
}

/// GET /health - Liveness check
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "The server is up", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

/// GET /api-docs/openapi.json
pub async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
