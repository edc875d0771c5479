//! Picto Chat Gateway — chat UI plus `/api/chat` at the configured address (default 127.0.0.1:3000).
//! Ollama for text, Together for images; every chat turn answers 200 with a best-effort payload.

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{Html, Response},
    routing::{get, post},
    Json, Router,
};
use picto_chat_core::{
    ChatConfig, ChatOrchestrator, ChatRequest, ChatResponsePayload, OrchestratorError,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct AppState {
    orchestrator: ChatOrchestrator,
}

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[picto-chat] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match ChatConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("[picto-chat] config load failed: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        llm = %config.ollama_endpoint,
        model = %config.llm_model,
        image_key_available = config.has_image_key(),
        "[SYSTEM] Picto Chat gateway configured"
    );
    if !config.has_image_key() {
        tracing::warn!("[SYSTEM] TOGETHER_API_KEY not set; image requests will report failure");
    }

    let state = Arc::new(AppState {
        orchestrator: ChatOrchestrator::from_config(&config),
    });

    let addr = config.bind_addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("[picto-chat] bind {} failed: {}", addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("[SYSTEM] listening on http://{}", addr);

    if let Err(e) = axum::serve(
        listener,
        app(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        eprintln!("[picto-chat] server error: {}", e);
        std::process::exit(1);
    }
}

fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/", get(serve_chat_ui))
        .route("/api/chat", post(chat_handler))
        .with_state(state)
        .layer(axum::middleware::from_fn(log_traffic))
}

async fn log_traffic(request: Request<Body>, next: Next) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    tracing::info!(
        method = %request.method(),
        path = %request.uri().path(),
        peer = %peer,
        "[HTTP] request"
    );
    next.run(request).await
}

async fn health() -> &'static str {
    "OK"
}

/// Chat UI: keeps the conversation in the browser and posts it whole on each turn.
async fn serve_chat_ui() -> Html<&'static str> {
    const INDEX: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/static/index.html"));
    Html(INDEX)
}

/// POST /api/chat: always 200. Unreadable bodies and failed turns come back as an apology
/// with `error` set; callers check `error`, not the status.
async fn chat_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Json<ChatResponsePayload> {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let err = OrchestratorError::InvalidRequest(rejection.body_text());
            tracing::error!(error = %err, "/api/chat rejected body");
            return Json(ChatResponsePayload::apology(err.to_string()));
        }
    };

    tracing::info!(
        turns = request.conversation.len(),
        memory_key = ?request.memory_key,
        "/api/chat turn"
    );
    Json(state.orchestrator.reply(&request).await)
}
