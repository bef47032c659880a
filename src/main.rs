//! Campaign Genius - conversational marketing campaign builder
//!
//! A Rust backend that guides a marketer from a customer segment name to an
//! approved campaign, driven by a per-session turn state machine.

mod api;
mod assistant;
mod campaign;
mod config;
mod llm;
mod runtime;
mod state_machine;
mod store;
mod webhook;

use api::{create_router, AppState};
use assistant::GeminiAssistant;
use config::AppConfig;
use llm::{GeminiService, LlmService, LoggingService};
use runtime::{HttpWorkflow, SessionManager};
use std::net::SocketAddr;
use std::sync::Arc;
use store::MemoryStore;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use webhook::WebhookClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campaign_genius=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = AppConfig::from_env();

    if config.api_key.is_none() && config.gateway.is_none() {
        tracing::warn!("No AI key configured. Set GEMINI_API_KEY or LLM_GATEWAY.");
    }

    // AI client
    let gemini = GeminiService::new(
        config.api_key.clone(),
        config.model,
        config.gateway.as_deref(),
        config.http_timeout,
    )?;
    let llm: Arc<dyn LlmService> = Arc::new(LoggingService::new(Arc::new(gemini)));
    let assistant = GeminiAssistant::new(llm);
    tracing::info!(
        model = %assistant.model_id(),
        merge_policy = ?config.merge_policy,
        "Assistant initialized"
    );

    // Workflow webhooks
    let workflow = HttpWorkflow::new(
        WebhookClient::new(config.http_timeout)?,
        config.generation_webhook.clone(),
        config.approval_webhook.clone(),
    );

    let sessions = SessionManager::new(
        MemoryStore::new(),
        Arc::new(assistant),
        Arc::new(workflow),
        config.merge_policy,
    );
    let state = AppState::new(sessions);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(cors)
        .layer(compression)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Campaign Genius server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
