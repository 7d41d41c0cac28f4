use anyhow::{Context, Result};
use common::{
    engine, FetchTaskRequest, FetchTaskResponse, MapFn, Phase, ReduceFn, SubmitTaskRequest,
    SubmitTaskResponse,
};
use reqwest::Client;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

pub struct WorkerConfig {
    /// URL base del master, ej: http://master:8080
    pub base_url: String,
    /// Directorio donde viven las particiones intermedias y la salida final.
    pub work_dir: String,
}

/// Loop principal del worker:
/// - pide una tarea al master (el fetch puede quedar colgado hasta que haya),
/// - ejecuta la función de usuario que corresponda a la fase,
/// - reporta el resultado,
/// - y repite hasta recibir finished.
///
/// Un error de I/O procesando una tarea mata al worker: la reasignación por
/// timeout en el master se encarga de que otro la termine.
pub async fn run(config: WorkerConfig, map_fn: MapFn, reduce_fn: ReduceFn) -> Result<()> {
    let client = Client::new();

    loop {
        let resp = fetch_task(&client, &config.base_url).await?;

        if resp.finished {
            info!("no queda trabajo, worker terminando");
            return Ok(());
        }

        let Some(task) = resp.task else {
            // ni tarea ni finished: esperamos un poco y volvemos a pedir
            sleep(Duration::from_secs(1)).await;
            continue;
        };

        info!(
            "tengo tarea {:?} {} (input={:?})",
            task.phase, task.task_id, task.input
        );

        let output = match task.phase {
            Phase::Map => {
                let task_id = task.task_id;
                let inputs = task.input.clone();
                let n_reduce = task.n_reduce;
                let dir = config.work_dir.clone();

                tokio::task::spawn_blocking(move || {
                    engine::run_map_task(map_fn, task_id, &inputs, n_reduce, &dir)
                })
                .await?
                .with_context(|| format!("no pude procesar la tarea map {}", task.task_id))?
            }
            Phase::Reduce => {
                let task_id = task.task_id;
                let inputs = task.input.clone();
                let dir = config.work_dir.clone();

                let out_path = tokio::task::spawn_blocking(move || {
                    engine::run_reduce_task(reduce_fn, task_id, &inputs, &dir)
                })
                .await?
                .with_context(|| format!("no pude procesar la tarea reduce {}", task.task_id))?;

                info!("salida final de reduce {} en {}", task.task_id, out_path);
                Vec::new()
            }
        };

        let ack = submit_task(&client, &config.base_url, &task.phase, task.task_id, output).await?;
        if !ack.ok {
            // la tarea ya fue reasignada y completada por otro; no pasa nada
            warn!(
                "el master rechazó el submit de {:?} {}, seguimos",
                task.phase, task.task_id
            );
        }

        sleep(Duration::from_secs(1)).await;
    }
}

async fn fetch_task(client: &Client, base_url: &str) -> Result<FetchTaskResponse> {
    let fetch_url = format!("{}/api/v1/tasks/fetch", base_url);
    let resp = client
        .post(&fetch_url)
        .json(&FetchTaskRequest {})
        .send()
        .await?;

    Ok(resp.json().await?)
}

async fn submit_task(
    client: &Client,
    base_url: &str,
    phase: &Phase,
    task_id: usize,
    output: Vec<String>,
) -> Result<SubmitTaskResponse> {
    let submit_url = format!("{}/api/v1/tasks/submit", base_url);
    let resp = client
        .post(&submit_url)
        .json(&SubmitTaskRequest {
            task_id,
            phase: *phase,
            output,
        })
        .send()
        .await?;

    Ok(resp.json().await?)
}
