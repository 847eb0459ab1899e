use std::convert::Infallible;
use std::sync::Arc;

use agentic_core::{Event, RunAgentInput, abort_pair, encode_frame};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONNECTION};
use axum::response::sse::{self, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::errors::ApiError;
use crate::orchestrator::{RunContext, RunOrchestrator, RunOutcome};

/// Events buffered between the orchestrator task and the response body.
const EVENT_BUFFER: usize = 16;

#[derive(Clone)]
struct AppState {
    orchestrator: Arc<RunOrchestrator>,
}

/// `POST /agentic` (SSE run stream) and `GET /health`, with permissive CORS.
pub fn router(config: ServerConfig) -> Router {
    let state = AppState {
        orchestrator: Arc::new(RunOrchestrator::new(config.step_delay)),
    };
    Router::new()
        .route("/agentic", post(run_agent))
        .route("/health", get(health))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Validates the request, then streams the run as SSE frames.
///
/// The orchestrator runs in its own task. Dropping the response body (client
/// disconnect) drops the abort guard, which cancels the run.
async fn run_agent(
    State(state): State<AppState>,
    payload: Result<Json<RunAgentInput>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(input) = payload.map_err(|e| {
        warn!(error = %e, "rejected run request body");
        ApiError::InvalidBody(e.body_text())
    })?;
    let context = RunContext::from_input(&input).inspect_err(|e| {
        warn!(error = %e, "rejected run request history");
    })?;
    info!(thread_id = %context.thread_id, run_id = %context.run_id, "accepted run request");

    let (tx, mut rx) = mpsc::channel::<Event>(EVENT_BUFFER);
    let (abort, mut cancel) = abort_pair();
    let guard = abort.guard();
    let orchestrator = state.orchestrator.clone();
    let run_id = context.run_id.clone();
    tokio::spawn(async move {
        let mut sink = tx;
        match orchestrator.run(context, &mut sink, &mut cancel).await {
            Ok(RunOutcome::Finished) => {}
            Ok(RunOutcome::Cancelled { phase }) => {
                info!(%run_id, %phase, "run stopped by client disconnect");
            }
            Err(e) => warn!(%run_id, error = %e, "run aborted"),
        }
    });

    let stream = async_stream::stream! {
        let _guard = guard;
        while let Some(event) = rx.recv().await {
            let frame = encode_frame(&event);
            let Some(data) = frame.text() else {
                warn!(event_type = %event.event_type(), "dropping non-UTF-8 event payload");
                continue;
            };
            let mut sse_event = sse::Event::default().data(data);
            if let Some(name) = frame.event {
                sse_event = sse_event.event(name);
            }
            yield Ok::<_, Infallible>(sse_event);
        }
    };
    let headers = [(CACHE_CONTROL, "no-cache"), (CONNECTION, "keep-alive")];
    Ok((headers, Sse::new(stream).keep_alive(KeepAlive::default())).into_response())
}
