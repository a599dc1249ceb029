//! HTTP server implementation using Axum.

use asklyn_core::config::AskLynConfig;
use asklyn_core::error::{AskLynError, Result};
use asklyn_knowledge::{KnowledgeStore, ResponseComposer, Retriever};
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::response::Html;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared state for the gateway server.
pub struct AppState {
    pub config: AskLynConfig,
    /// Knowledge base. Chat holds the read lock for a whole retrieval,
    /// upload holds the write lock for a single append.
    pub knowledge: Arc<RwLock<KnowledgeStore>>,
    pub retriever: Retriever,
    pub composer: ResponseComposer,
    pub start_time: std::time::Instant,
}

impl AppState {
    /// State with a store seeded from `config.knowledge`.
    pub fn new(config: AskLynConfig) -> Self {
        let store = KnowledgeStore::from_config(&config.knowledge);
        Self::with_store(config, store)
    }

    pub fn with_store(config: AskLynConfig, store: KnowledgeStore) -> Self {
        Self {
            retriever: Retriever::from_config(&config.retrieval),
            composer: ResponseComposer::from_config(&config.identity),
            knowledge: Arc::new(RwLock::new(store)),
            start_time: std::time::Instant::now(),
            config,
        }
    }
}

/// Serve the chat page.
async fn dashboard_page() -> Html<&'static str> {
    Html(super::dashboard::dashboard_html())
}

/// Security headers middleware.
async fn security_headers(
    req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
    headers.insert("X-Frame-Options", HeaderValue::from_static("SAMEORIGIN"));
    headers.insert(
        "Referrer-Policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    response
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    if origins.is_empty() {
        // No allow-origin header: browsers keep requests same-origin.
        return cors;
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|s| match s.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {s}");
                None
            }
        })
        .collect();
    cors.allow_origin(allowed)
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    build_router_from_arc(Arc::new(state))
}

pub fn build_router_from_arc(shared: Arc<AppState>) -> Router {
    let body_limit = shared.config.gateway.max_upload_bytes;
    let cors = cors_layer(&shared.config.gateway.cors_origins);

    Router::new()
        .route("/", get(dashboard_page))
        .route("/health", get(super::routes::health_check))
        .route("/chat", post(super::routes::chat))
        .route("/upload", post(super::routes::upload))
        // Knowledge Base API
        .route(
            "/api/v1/knowledge/stats",
            get(super::routes::knowledge_stats),
        )
        .route(
            "/api/v1/knowledge/search",
            post(super::routes::knowledge_search),
        )
        .layer(axum::middleware::from_fn(security_headers))
        .layer(cors)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

/// Start the HTTP server and run until it fails.
pub async fn start(config: AskLynConfig) -> Result<()> {
    let addr = config.gateway.bind_addr();
    let state = AppState::new(config);
    {
        let kb = state.knowledge.read().await;
        tracing::info!("📚 Knowledge base seeded with {} document(s)", kb.len());
    }
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AskLynError::Gateway(format!("Bind error on {addr}: {e}")))?;

    tracing::info!("🌐 AskLyn gateway listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| AskLynError::Gateway(format!("Server error: {e}")))?;
    Ok(())
}
