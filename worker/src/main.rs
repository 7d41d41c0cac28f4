mod worker;

use anyhow::Result;
use common::wordcount;
use std::env;
use tracing::info;
use tracing_subscriber;

use crate::worker::WorkerConfig;

/// URL base del master.
/// - En Docker: MASTER_URL=http://master:8080
/// - Si no está definida, http://localhost:8080 (pruebas locales)
fn master_base_url() -> String {
    env::var("MASTER_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("worker=debug,reqwest=info")
        .init();

    let hostname_str = hostname::get()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();

    let config = WorkerConfig {
        base_url: master_base_url(),
        work_dir: env::var("MR_DIR").unwrap_or_else(|_| "/data/mr".to_string()),
    };

    info!(
        "worker arrancando en {} contra {}",
        hostname_str, config.base_url
    );

    worker::run(config, wordcount::map, wordcount::reduce).await
}
