mod handlers;
mod manager;
mod master;
mod monitor;

use crate::handlers::AppState;
use crate::master::Master;
use std::{env, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber;

pub const DEFAULT_TASK_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_N_REDUCE: usize = 4;
pub const RECLAIM_SWEEP_INTERVAL_MS: u64 = 500;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("master=debug,axum=info,tower_http=info")
        .init();

    let input_glob =
        env::var("INPUT_GLOB").unwrap_or_else(|_| "/data/input/*.txt".to_string());

    let n_reduce: usize = env::var("N_REDUCE")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(DEFAULT_N_REDUCE);

    let timeout_secs: u64 = env::var("TASK_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_TASK_TIMEOUT_SECS);

    // una tarea map por archivo que matchee el glob
    let mut files: Vec<String> = Vec::new();
    for entry in glob::glob(&input_glob).expect("patrón INPUT_GLOB inválido") {
        if let Ok(path) = entry {
            if path.is_file() {
                files.push(path.to_string_lossy().to_string());
            }
        }
    }
    files.sort();

    info!(
        "job con {} archivos de entrada, R={} y timeout={}s",
        files.len(),
        n_reduce,
        timeout_secs
    );

    let master = Arc::new(Master::new(
        files,
        n_reduce,
        Duration::from_secs(timeout_secs),
    ));

    // detector de timeouts en segundo plano
    let monitor_master = master.clone();
    tokio::spawn(async move {
        monitor::run_reclaim_loop(monitor_master).await;
    });

    let app = handlers::build_router(AppState { master });

    let listener = TcpListener::bind("0.0.0.0:8080").await.unwrap();
    info!("master escuchando en {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
