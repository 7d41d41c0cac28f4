use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{info, warn};

use common::{
    FetchTaskResponse, JobStatusResponse, Phase, SubmitTaskRequest, TaskAssignment,
};

use crate::manager::TaskManager;

/// El coordinador del job: una fase map y una fase reduce, cada una con su
/// TaskManager, más el handoff de particiones entre fases.
pub struct Master {
    pub map_manager: TaskManager,
    pub reduce_manager: TaskManager,
    pub n_reduce: usize,
    pub submitted_at: DateTime<Utc>,
}

impl Master {
    /// Arma el job: una tarea map por archivo fuente y R tareas reduce que
    /// arrancan sin entradas (las van aportando los maps al completarse).
    pub fn new(files: Vec<String>, n_reduce: usize, timeout: Duration) -> Self {
        let map_inputs: Vec<Vec<String>> = files.into_iter().map(|f| vec![f]).collect();
        let reduce_inputs: Vec<Vec<String>> = vec![Vec::new(); n_reduce];

        Self {
            map_manager: TaskManager::new(map_inputs, timeout),
            reduce_manager: TaskManager::new(reduce_inputs, timeout),
            n_reduce,
            submitted_at: Utc::now(),
        }
    }

    /// Despacha la próxima tarea: primero map, después reduce.
    ///
    /// El orden alcanza para la precedencia de fases: mientras quede algún
    /// map en vuelo, map_manager.trigger() se bloquea en vez de devolver
    /// None, así que ninguna tarea reduce sale antes de drenar la fase map.
    /// None de los dos managers = job terminado.
    pub fn fetch_task(&self) -> FetchTaskResponse {
        if let Some(task) = self.map_manager.trigger() {
            info!("asignando tarea map {} (input={:?})", task.id, task.inputs);
            return FetchTaskResponse {
                task: Some(TaskAssignment {
                    task_id: task.id,
                    phase: Phase::Map,
                    input: task.inputs,
                    n_reduce: self.n_reduce,
                }),
                finished: false,
            };
        }

        if let Some(task) = self.reduce_manager.trigger() {
            info!("asignando tarea reduce {} (input={:?})", task.id, task.inputs);
            return FetchTaskResponse {
                task: Some(TaskAssignment {
                    task_id: task.id,
                    phase: Phase::Reduce,
                    input: task.inputs,
                    n_reduce: self.n_reduce,
                }),
                finished: false,
            };
        }

        FetchTaskResponse {
            task: None,
            finished: true,
        }
    }

    /// Registra el resultado de una tarea.
    ///
    /// Map: solo la primera completion aceptada propaga las particiones de
    /// salida a las entradas de las tareas reduce ("" = partición sin
    /// claves, no aporta nada). Así un straggler que termina después de la
    /// reasignación no mete entradas duplicadas.
    /// Reduce: fase terminal, no hay nada que propagar.
    pub fn submit_task(&self, req: &SubmitTaskRequest) -> bool {
        match req.phase {
            Phase::Map => {
                if req.output.len() != self.n_reduce {
                    warn!(
                        "submit malformado para map {}: {} salidas, esperaba {}",
                        req.task_id,
                        req.output.len(),
                        self.n_reduce
                    );
                    return false;
                }

                if !self.map_manager.complete(req.task_id) {
                    warn!("submit tardío o desconocido para map {}, ignorado", req.task_id);
                    return false;
                }

                for (r, path) in req.output.iter().enumerate() {
                    if !path.is_empty() {
                        self.reduce_manager
                            .update_task_inputs_by_id(r, std::slice::from_ref(path));
                    }
                }

                true
            }
            Phase::Reduce => {
                if !self.reduce_manager.complete(req.task_id) {
                    warn!(
                        "submit tardío o desconocido para reduce {}, ignorado",
                        req.task_id
                    );
                    return false;
                }
                true
            }
        }
    }

    /// El job termina exactamente cuando la fase reduce termina.
    pub fn is_job_done(&self) -> bool {
        self.reduce_manager.done()
    }

    /// Una pasada del detector de timeouts sobre las dos fases.
    pub fn reclaim_expired(&self) -> usize {
        self.map_manager.reclaim_expired() + self.reduce_manager.reclaim_expired()
    }

    pub fn status(&self) -> JobStatusResponse {
        JobStatusResponse {
            submitted_at: self.submitted_at,
            n_reduce: self.n_reduce,
            map_tasks_total: self.map_manager.len(),
            map_tasks_completed: self.map_manager.completed_count(),
            reduce_tasks_total: self.reduce_manager.len(),
            reduce_tasks_completed: self.reduce_manager.completed_count(),
            done: self.is_job_done(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    const LONG: Duration = Duration::from_secs(60);

    fn two_file_job() -> Master {
        Master::new(vec!["a.txt".to_string(), "b.txt".to_string()], 2, LONG)
    }

    fn submit(master: &Master, task_id: usize, phase: Phase, output: Vec<&str>) -> bool {
        master.submit_task(&SubmitTaskRequest {
            task_id,
            phase,
            output: output.into_iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Escenario A del diseño: 2 archivos, R=2, las particiones de cada map
    /// van a parar a la tarea reduce alineada por índice.
    #[test]
    fn map_outputs_flow_into_the_matching_reduce_inputs() {
        let master = two_file_job();

        let m0 = master.fetch_task().task.unwrap();
        let m1 = master.fetch_task().task.unwrap();
        assert_eq!((m0.task_id, m0.phase), (0, Phase::Map));
        assert_eq!((m1.task_id, m1.phase), (1, Phase::Map));
        assert_eq!(m0.input, vec!["a.txt".to_string()]);

        // map 0 solo emitió para la partición 0
        assert!(submit(&master, 0, Phase::Map, vec!["p0a", ""]));
        // map 1 solo emitió para la partición 1
        assert!(submit(&master, 1, Phase::Map, vec!["", "p1b"]));

        let r0 = master.fetch_task().task.unwrap();
        let r1 = master.fetch_task().task.unwrap();
        assert_eq!((r0.task_id, r0.phase), (0, Phase::Reduce));
        assert_eq!((r1.task_id, r1.phase), (1, Phase::Reduce));
        assert_eq!(r0.input, vec!["p0a".to_string()]);
        assert_eq!(r1.input, vec!["p1b".to_string()]);
        assert_eq!(r0.n_reduce, 2);
    }

    /// Escenario B: el submit tardío de un straggler no completa nada y no
    /// vuelve a propagar particiones.
    #[test]
    fn late_straggler_submit_is_rejected_without_propagation() {
        let master = Master::new(vec!["a.txt".to_string()], 1, Duration::from_millis(50));

        // primer worker se lleva map 0 y se cuelga
        let first = master.fetch_task().task.unwrap();
        assert_eq!(first.task_id, 0);

        thread::sleep(Duration::from_millis(80));
        assert_eq!(master.reclaim_expired(), 1);

        // segundo worker recibe map 0 reasignada y la completa
        let second = master.fetch_task().task.unwrap();
        assert_eq!(second.task_id, 0);
        assert!(submit(&master, 0, Phase::Map, vec!["px"]));

        // el straggler llega tarde: rechazado, sin cambios de estado
        assert!(!submit(&master, 0, Phase::Map, vec!["py"]));

        // la tarea reduce solo tiene la partición del submit aceptado
        let r0 = master.fetch_task().task.unwrap();
        assert_eq!(r0.phase, Phase::Reduce);
        assert_eq!(r0.input, vec!["px".to_string()]);
    }

    /// Escenario C: con todo completado, fetch devuelve finished y el job
    /// reporta done.
    #[test]
    fn fetch_reports_finished_when_both_phases_drain() {
        let master = two_file_job();

        for _ in 0..2 {
            let t = master.fetch_task().task.unwrap();
            assert!(submit(&master, t.task_id, Phase::Map, vec!["", ""]));
        }
        assert!(!master.is_job_done());

        for _ in 0..2 {
            let t = master.fetch_task().task.unwrap();
            assert_eq!(t.phase, Phase::Reduce);
            assert!(submit(&master, t.task_id, Phase::Reduce, vec![]));
        }

        let resp = master.fetch_task();
        assert!(resp.finished);
        assert!(resp.task.is_none());
        assert!(master.is_job_done());
    }

    /// Un submit map con la cantidad de salidas equivocada es malformado:
    /// rechazado sin completar la tarea.
    #[test]
    fn malformed_map_submit_leaves_state_unchanged() {
        let master = two_file_job();

        let m0 = master.fetch_task().task.unwrap();
        assert!(!submit(&master, m0.task_id, Phase::Map, vec!["solo-una"]));

        // la tarea sigue InProgress: completarla bien todavía funciona
        assert!(submit(&master, m0.task_id, Phase::Map, vec!["p", ""]));
    }

    /// Precedencia de fases: un fetch que llega con un map todavía en vuelo
    /// se bloquea y nunca recibe una tarea reduce antes de drenar la fase map.
    #[test]
    fn fetch_blocks_on_outstanding_map_tasks_then_moves_to_reduce() {
        let master = Arc::new(Master::new(vec!["a.txt".to_string()], 1, LONG));

        let m0 = master.fetch_task().task.unwrap();
        assert_eq!(m0.phase, Phase::Map);

        // este fetch se bloquea: no hay map Idle pero la fase no terminó
        let master2 = master.clone();
        let waiter = thread::spawn(move || master2.fetch_task());

        thread::sleep(Duration::from_millis(50));
        assert!(submit(&master, 0, Phase::Map, vec!["p0"]));

        let got = waiter.join().unwrap().task.unwrap();
        assert_eq!(got.phase, Phase::Reduce);
        assert_eq!(got.input, vec!["p0".to_string()]);
    }

    #[test]
    fn status_tracks_per_phase_progress() {
        let master = two_file_job();

        let s = master.status();
        assert_eq!(s.map_tasks_total, 2);
        assert_eq!(s.map_tasks_completed, 0);
        assert_eq!(s.reduce_tasks_total, 2);
        assert!(!s.done);

        let m0 = master.fetch_task().task.unwrap();
        submit(&master, m0.task_id, Phase::Map, vec!["", ""]);

        let s = master.status();
        assert_eq!(s.map_tasks_completed, 1);
    }
}
