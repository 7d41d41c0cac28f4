use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

use crate::master::Master;
use crate::RECLAIM_SWEEP_INTERVAL_MS;

/// Loop de tolerancia a fallos: cada pasada devuelve a Idle las tareas
/// InProgress cuyo deadline venció (worker caído o colgado), y los triggers
/// bloqueados se despiertan para reasignarlas.
pub async fn run_reclaim_loop(master: Arc<Master>) {
    loop {
        sleep(Duration::from_millis(RECLAIM_SWEEP_INTERVAL_MS)).await;

        let reclaimed = master.reclaim_expired();
        if reclaimed > 0 {
            warn!(
                "{} tareas vencidas por timeout, vuelven a estar asignables",
                reclaimed
            );
        }
    }
}
