use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Idle,
    InProgress,
    Completed,
}

/// Una tarea dentro del manager. El deadline existe solo mientras la tarea
/// está InProgress y se re-arma (no se recrea) en cada re-despacho.
#[derive(Debug)]
struct TaskSlot {
    id: usize,
    state: TaskState,
    inputs: Vec<String>,
    deadline: Option<Instant>,
}

/// Copia de una tarea despachada que se le entrega al caller.
/// Nunca sale una referencia a los internos del manager.
#[derive(Debug, Clone)]
pub struct TaskView {
    pub id: usize,
    pub inputs: Vec<String>,
}

/// Dueño de las tareas de una fase: reparte las Idle, bloquea cuando no hay
/// nada despachable pero la fase no terminó, y recupera por timeout las
/// InProgress que se quedaron colgadas.
pub struct TaskManager {
    tasks: Mutex<Vec<TaskSlot>>,
    cond: Condvar,
    timeout: Duration,
}

impl TaskManager {
    /// Crea un manager con una tarea por entrada de `inputs`.
    /// El tamaño queda fijo para siempre.
    pub fn new(inputs: Vec<Vec<String>>, timeout: Duration) -> Self {
        let tasks = inputs
            .into_iter()
            .enumerate()
            .map(|(id, inputs)| TaskSlot {
                id,
                state: TaskState::Idle,
                inputs,
                deadline: None,
            })
            .collect();

        Self {
            tasks: Mutex::new(tasks),
            cond: Condvar::new(),
            timeout,
        }
    }

    /// Despacha la próxima tarea Idle (la de menor índice) y la deja
    /// InProgress con su deadline armado.
    ///
    /// Si no hay ninguna Idle: devuelve None solo cuando TODAS están
    /// Completed (fase agotada); si quedan tareas en vuelo se bloquea en la
    /// condvar y vuelve a escanear al despertar (los despertares espurios se
    /// toleran justamente re-escaneando en loop).
    pub fn trigger(&self) -> Option<TaskView> {
        let mut tasks = self.tasks.lock().unwrap();

        loop {
            if let Some(slot) = tasks.iter_mut().find(|t| t.state == TaskState::Idle) {
                slot.state = TaskState::InProgress;
                slot.deadline = Some(Instant::now() + self.timeout);
                return Some(TaskView {
                    id: slot.id,
                    inputs: slot.inputs.clone(),
                });
            }

            if tasks.iter().all(|t| t.state == TaskState::Completed) {
                return None;
            }

            tasks = self.cond.wait(tasks).unwrap();
        }
    }

    /// Marca la tarea como Completed y desarma su deadline.
    ///
    /// Solo cuenta la primera completion mientras la tarea está InProgress:
    /// un submit tardío (tarea ya reasignada y completada por otro worker),
    /// una tarea Idle o un id desconocido devuelven false sin tocar nada.
    pub fn complete(&self, id: usize) -> bool {
        let mut tasks = self.tasks.lock().unwrap();

        match tasks
            .iter_mut()
            .find(|t| t.id == id && t.state == TaskState::InProgress)
        {
            Some(slot) => {
                slot.state = TaskState::Completed;
                slot.deadline = None;
                self.cond.notify_all();
                true
            }
            None => false,
        }
    }

    /// true si todas las tareas de la fase están Completed.
    pub fn done(&self) -> bool {
        let tasks = self.tasks.lock().unwrap();
        tasks.iter().all(|t| t.state == TaskState::Completed)
    }

    /// Agrega entradas a la tarea `id`. Solo se usa para el handoff entre
    /// fases: cada map completado aporta su partición a la tarea reduce.
    pub fn update_task_inputs_by_id(&self, id: usize, inputs: &[String]) -> bool {
        let mut tasks = self.tasks.lock().unwrap();

        match tasks.iter_mut().find(|t| t.id == id) {
            Some(slot) => {
                slot.inputs.extend_from_slice(inputs);
                true
            }
            None => false,
        }
    }

    /// Detector de fallos: toda tarea InProgress cuyo deadline ya pasó
    /// vuelve a Idle para que otro worker la agarre. Si la tarea se completó
    /// (o se re-despachó, deadline nuevo) antes de esta pasada, no se toca.
    /// Devuelve cuántas se recuperaron.
    pub fn reclaim_expired(&self) -> usize {
        let now = Instant::now();
        let mut tasks = self.tasks.lock().unwrap();

        let mut reclaimed = 0;
        for slot in tasks.iter_mut() {
            if slot.state != TaskState::InProgress {
                continue;
            }
            if let Some(deadline) = slot.deadline {
                if deadline <= now {
                    slot.state = TaskState::Idle;
                    slot.deadline = None;
                    reclaimed += 1;
                }
            }
        }

        if reclaimed > 0 {
            self.cond.notify_all();
        }

        reclaimed
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn completed_count(&self) -> usize {
        let tasks = self.tasks.lock().unwrap();
        tasks
            .iter()
            .filter(|t| t.state == TaskState::Completed)
            .count()
    }
}
