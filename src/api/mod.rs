//! HTTP surface.
//!
//! - `POST /api/search` - run a search for `{ "query": "..." }`
//! - `GET /api/health` - liveness probe

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::models::{HealthStatus, SearchRequest};
use crate::search::{SearchOrchestrator, INTERNAL_FAILURE_MESSAGE};

/// Service name reported by the health endpoint
pub const SERVICE_NAME: &str = "citation-search";

/// Shared state handed to every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub orchestrator: Arc<SearchOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: SearchOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/search", post(search))
        .route("/api/health", get(health))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C
pub async fn serve(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_err() {
                warn!("failed to listen for shutdown signal");
            }
        })
        .await
}

async fn search(State(state): State<AppState>, Json(request): Json<SearchRequest>) -> Response {
    if let Err(err) = request.validate() {
        warn!(error = %err, "rejected search request");
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "success": false,
                "message": "请求参数验证失败",
                "errors": [err.to_string()],
            })),
        )
            .into_response();
    }

    let orchestrator = Arc::clone(&state.orchestrator);
    let query = request.query;
    let result = match tokio::spawn(async move { orchestrator.search(&query).await }).await {
        Ok(result) => result,
        Err(err) => {
            error!(error = %err, "search task failed");
            return internal_error();
        }
    };

    if result.is_internal_failure() {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(result)).into_response();
    }
    Json(result).into_response()
}

async fn health() -> Json<HealthStatus> {
    Json(HealthStatus::up(SERVICE_NAME))
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({
            "success": false,
            "message": INTERNAL_FAILURE_MESSAGE,
        })),
    )
        .into_response()
}
