use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identificador de tarea: índice dentro de su fase.
/// Para map también es el índice de partición de salida,
/// para reduce el índice del archivo final.
pub type TaskId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Map,
    Reduce,
}

/* --------- Estructuras del RPC worker <-> master --------- */

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchTaskRequest {}

/// Una tarea concreta asignada a un worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskAssignment {
    pub task_id: TaskId,
    pub phase: Phase,

    /// Archivos de entrada: el archivo fuente (map) o las
    /// particiones intermedias aportadas por los maps (reduce).
    pub input: Vec<String>,

    /// Cantidad de particiones reduce (R), para que el worker
    /// particione la salida de map de forma determinista.
    pub n_reduce: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchTaskResponse {
    pub task: Option<TaskAssignment>,

    /// true solo cuando no queda trabajo en ninguna fase;
    /// con finished=true el resto de campos no significa nada.
    pub finished: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitTaskRequest {
    pub task_id: TaskId,
    pub phase: Phase,

    /// Para map: R entradas alineadas por partición ("" = partición vacía).
    /// Para reduce: vacío.
    pub output: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitTaskResponse {
    /// false si el submit llegó tarde (tarea ya reasignada y completada),
    /// con id desconocido o malformado. El worker no tiene que reintentar.
    pub ok: bool,
}

/* --------- Estado del job (consulta, no RPC de workers) --------- */

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub submitted_at: DateTime<Utc>,
    pub n_reduce: usize,

    pub map_tasks_total: usize,
    pub map_tasks_completed: usize,
    pub reduce_tasks_total: usize,
    pub reduce_tasks_completed: usize,

    pub done: bool,
}
