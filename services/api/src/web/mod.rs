pub mod ai;
pub mod auth;
pub mod middleware;
pub mod profile;
pub mod rest;
pub mod state;

pub use middleware::require_auth;
pub use state::AppState;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Every route of the service. Public routes need no session; the rest sit
/// behind [`require_auth`].
pub fn routes(app_state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        .route("/health", get(rest::health_handler))
        .route("/api-docs/openapi.json", get(rest::openapi_handler))
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler));

    let protected_routes = Router::new()
        .route("/profile", get(profile::get_profile_handler).put(profile::put_profile_handler))
        .route("/ai/chat", post(ai::chat_handler))
        .route("/ai/generate", post(ai::generate_handler))
        .route("/ai/day-plan", post(ai::day_plan_handler))
        .route("/ai/schedule/recognize", post(ai::recognize_schedule_handler))
        .route("/ai/transcribe", post(ai::transcribe_handler))
        .route("/summarize", post(ai::summarize_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(app_state)
}
