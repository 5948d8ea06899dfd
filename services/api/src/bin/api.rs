//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        gemini_client, DbAdapter, GeminiScheduleAdapter, GeminiTextAdapter, MediaFetcher,
        TranscriptSummaryAdapter, UnavailableAi, WhisperSstAdapter,
    },
    config::{Config, ConfigError},
    error::ApiError,
    web::{routes, AppState},
};
use async_openai::{config::OpenAIConfig, Client};
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::extract::DefaultBodyLimit;
use focuspoint_core::ports::{
    ScheduleRecognitionService, SpeechToTextService, TextGenerationService,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Whisper only accepts files up to 25 MB.
const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let (text, vision): (Arc<dyn TextGenerationService>, Arc<dyn ScheduleRecognitionService>) =
        match &config.gemini_api_key {
            Some(key) => {
                let client = gemini_client(key, &config.gemini_base_url);
                info!(models = ?config.gemini_models, "Gemini adapters ready");
                (
                    Arc::new(GeminiTextAdapter::new(client.clone(), config.gemini_models.clone())),
                    Arc::new(GeminiScheduleAdapter::new(client, config.vision_model.clone())),
                )
            }
            None => {
                warn!("GEMINI_API_KEY is not set; AI features will answer as unavailable");
                let stub = Arc::new(UnavailableAi::missing_key("GEMINI_API_KEY"));
                (stub.clone(), stub)
            }
        };

    let sst: Arc<dyn SpeechToTextService> = match &config.openai_api_key {
        Some(key) => Arc::new(WhisperSstAdapter::new(
            Client::with_config(OpenAIConfig::new().with_api_key(key)),
            config.sst_model.clone(),
        )),
        None => {
            warn!("OPENAI_API_KEY is not set; video summaries will answer as unavailable");
            Arc::new(UnavailableAi::missing_key("OPENAI_API_KEY"))
        }
    };

    let summarizer = Arc::new(TranscriptSummaryAdapter::new(
        Arc::new(MediaFetcher::new(config.ytdlp_path.clone(), config.media_dir.clone())),
        sst,
        text.clone(),
    ));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        accounts: db_adapter.clone(),
        profiles: db_adapter,
        text,
        vision,
        transcriber: summarizer.clone(),
        summarizer,
        config: config.clone(),
    });

    // --- 5. CORS ---
    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ConfigError::InvalidValue("CORS_ORIGIN".to_string(), e.to_string())
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 6. Create the Web Router ---
    let app = routes(app_state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors);

    // --- 7. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for the shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
