mod config;
mod db;
mod errors;
mod interview;
mod llm_client;
mod models;
mod response;
mod routes;
mod state;
mod store;

use anyhow::Result;
use axum::http::{header, HeaderValue, Method};
use std::net::SocketAddr;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::db::{create_pool, ensure_schema};
use crate::interview::engine::InterviewEngine;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{ConversationStore, InMemoryConversationStore, PgConversationStore};

const LOCAL_FRONTEND: &str = "http://localhost:5173";

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Interviewer API v{}", env!("CARGO_PKG_VERSION"));

    // Conversation store: PostgreSQL when configured, otherwise process memory
    let store: Arc<dyn ConversationStore> = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            ensure_schema(&pool).await?;
            Arc::new(PgConversationStore::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set; sessions are kept in memory and lost on restart");
            Arc::new(InMemoryConversationStore::new())
        }
    };

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let engine = InterviewEngine::new(Arc::new(llm), store, config.store_timeout);
    info!(
        "Interview engine ready (store timeout: {}s)",
        config.store_timeout.as_secs()
    );

    let state = AppState {
        engine: Arc::new(engine),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config)?);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Permissive without FRONTEND_URL; otherwise only the configured frontend and the local dev server.
fn cors_layer(config: &Config) -> Result<CorsLayer> {
    let Some(frontend) = &config.frontend_url else {
        return Ok(CorsLayer::permissive());
    };

    let origins = [frontend.as_str(), LOCAL_FRONTEND]
        .into_iter()
        .map(HeaderValue::from_str)
        .collect::<Result<Vec<_>, _>>()?;
    info!("CORS restricted to {frontend} and {LOCAL_FRONTEND}");

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true))
}
