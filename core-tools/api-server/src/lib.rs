//! API Server
//!
//! HTTP front door of the generation pipeline.
//!
//! # Endpoints
//!
//! - POST /api/generate - Generate, publish and record a project
//! - POST / - Alias of /api/generate
//! - GET /api/health - Liveness check
//!
//! Every response carries permissive CORS headers and any `OPTIONS` request
//! is answered as a preflight with 200.
//!
//! Error bodies only ever carry the error's user hint. Full detail, including
//! raw model output, goes to the log.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use codepin_engine::pipeline::{outcome_of, Pipeline};
use sdk::errors::{PipelineError, PipelineErrorExt};
use sdk::types::{GenerationRequest, PipelineOutcome};
use serde::Deserialize;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Inbound generation request body.
///
/// Fields are optional so a missing field becomes a validation error rather
/// than a decode failure. The body is decoded whatever its `Content-Type`,
/// since browser clients posting `JSON.stringify(..)` send `text/plain`.
#[derive(Debug, Deserialize)]
struct GenerateBody {
    wallet: Option<String>,
    foldername: Option<String>,
    prompt: Option<String>,
}

/// API server state shared across handlers
#[derive(Clone)]
struct ServerState {
    pipeline: Arc<Pipeline>,
}

/// Build the router around a shared pipeline
pub fn router(pipeline: Arc<Pipeline>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/", post(generate_handler))
        .route("/api/generate", post(generate_handler))
        .route("/api/health", get(health_handler))
        .with_state(ServerState { pipeline })
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Serve `app` on `listener` until `shutdown` resolves
pub async fn serve(
    listener: tokio::net::TcpListener,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!("API server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("API server shutting down gracefully");
        })
        .await?;

    Ok(())
}

/// Generation endpoint
async fn generate_handler(
    State(state): State<ServerState>,
    body: Bytes,
) -> Response {
    let body: GenerateBody = match serde_json::from_slice(&body) {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!("Rejected request body: {}", e);
            return error_response(&PipelineError::Validation("request body".to_string()));
        }
    };

    let request = match GenerationRequest::new(
        body.wallet.unwrap_or_default(),
        body.foldername.unwrap_or_default(),
        body.prompt.unwrap_or_default(),
    ) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!("{}", e);
            return error_response(&e);
        }
    };

    let result = state.pipeline.run(&request).await;
    match &result {
        Ok(_) => (StatusCode::OK, Json(outcome_of(&result))).into_response(),
        Err(e) => error_response(e),
    }
}

/// Health check endpoint
async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

fn error_response(error: &PipelineError) -> Response {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    (status, Json(PipelineOutcome::failed(error.user_hint()))).into_response()
}
