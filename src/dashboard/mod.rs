use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::discovery::{Discover, MediaItem, StaticCatalog};
use crate::error::Result;
use crate::scheduler::{Dispatcher, JobId, JobQueue, JobStatus};

#[derive(Clone)]
pub struct DashboardState {
    pub queue: Arc<JobQueue>,
    pub dispatcher: Arc<Dispatcher>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SummaryResponse {
    pub total: usize,
    pub queued: usize,
    pub processing: usize,
    pub done: usize,
    pub failed: usize,
    pub pending: usize,
}

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub items: Vec<MediaItem>,
    #[serde(default)]
    pub allow_missing_metadata: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendResponse {
    pub success: bool,
    pub accepted: usize,
    pub cleared: usize,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdateStatusRequest {
    status: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Build the dashboard routes over `state`.
pub fn router(state: DashboardState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/status", get(status_handler))
        .route("/api/summary", get(summary_handler))
        .route("/send", post(send_handler))
        .route("/jobs/{id}/status", put(update_status_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve the dashboard until `shutdown` is cancelled.
pub async fn run_dashboard(
    addr: SocketAddr,
    state: DashboardState,
    shutdown: CancellationToken,
) -> Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        tracing::error!(addr = %addr, error = %e, "Failed to bind dashboard server");
        e
    })?;
    tracing::info!(addr = %addr, "Starting dashboard server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;
    tracing::info!("Dashboard server stopped");
    Ok(())
}

async fn index_handler() -> Html<&'static str> {
    Html(include_str!("index.html"))
}

async fn status_handler(State(state): State<DashboardState>) -> impl IntoResponse {
    Json(state.queue.statuses())
}

async fn summary_handler(State(state): State<DashboardState>) -> impl IntoResponse {
    let counts = state.queue.counts();
    Json(SummaryResponse {
        total: counts.total,
        queued: counts.queued,
        processing: counts.processing,
        done: counts.done,
        failed: counts.failed,
        pending: state.queue.pending(),
    })
}

async fn send_handler(
    State(state): State<DashboardState>,
    Json(payload): Json<SendRequest>,
) -> impl IntoResponse {
    let catalog =
        StaticCatalog::new(payload.items).allow_missing_metadata(payload.allow_missing_metadata);

    let items = match catalog.discover().await {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected batch");
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(SendResponse {
                    success: false,
                    accepted: 0,
                    cleared: 0,
                    error: Some(e.to_string()),
                }),
            );
        }
    };

    let report = state.dispatcher.start_batch(items).await;

    (
        StatusCode::ACCEPTED,
        Json(SendResponse {
            success: true,
            accepted: report.accepted,
            cleared: report.cleared,
            error: None,
        }),
    )
}

async fn update_status_handler(
    State(state): State<DashboardState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Response {
    match payload.status.parse::<JobStatus>() {
        Ok(status) => {
            tracing::info!(job_id = %id, status = %status, "Status overridden");
            state.queue.update_status(JobId::new(id), status);
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}
