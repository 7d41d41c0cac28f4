use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tokio::task;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use common::{
    FetchTaskRequest, FetchTaskResponse, JobStatusResponse, SubmitTaskRequest,
    SubmitTaskResponse,
};

use crate::master::Master;

#[derive(Clone)]
pub struct AppState {
    pub master: Arc<Master>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/job", get(job_status))
        .route("/api/v1/tasks/fetch", post(fetch_task))
        .route("/api/v1/tasks/submit", post(submit_task))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/* ---------------- handlers HTTP ---------------- */

async fn health() -> &'static str {
    "ok"
}

// Un worker pide la próxima tarea. fetch_task se bloquea mientras haya
// tareas en vuelo pero ninguna Idle, así que va a un hilo de bloqueo y el
// request queda colgado hasta que haya algo que responder.
async fn fetch_task(
    State(state): State<AppState>,
    Json(_req): Json<FetchTaskRequest>,
) -> Result<Json<FetchTaskResponse>, StatusCode> {
    let master = state.master.clone();

    let resp = task::spawn_blocking(move || master.fetch_task())
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if resp.finished {
        info!("no queda trabajo, avisando finished al worker");
    }

    Ok(Json(resp))
}

// Un worker reporta el resultado de una tarea. Nunca es un error HTTP:
// un submit tardío o malformado se responde con ok=false y listo.
async fn submit_task(
    State(state): State<AppState>,
    Json(req): Json<SubmitTaskRequest>,
) -> Json<SubmitTaskResponse> {
    let ok = state.master.submit_task(&req);

    if ok {
        info!("tarea {:?} {} completada", req.phase, req.task_id);
    } else {
        warn!("submit rechazado para tarea {:?} {}", req.phase, req.task_id);
    }

    Json(SubmitTaskResponse { ok })
}

// Estado del job, para sondear desde afuera si ya terminó.
async fn job_status(State(state): State<AppState>) -> Json<JobStatusResponse> {
    Json(state.master.status())
}
