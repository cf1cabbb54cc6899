//! Lock-protected task table.
//!
//! Single shared structure between the API handlers and the per-task
//! workers. Every access takes the lock for the duration of the access
//! only; no network or file I/O ever happens while holding it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use reel_models::{Task, TaskId};

/// Why a cancellation request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelRejection {
    /// No task with that id.
    NotFound,
    /// Task is already terminal or already cancelling.
    Conflict,
}

/// Thread-safe in-memory task table.
///
/// The worker owns all mutation of a task record; readers only ever get
/// cloned snapshots.
#[derive(Clone, Default)]
pub struct TaskStore {
    inner: Arc<Mutex<HashMap<TaskId, Task>>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TaskId, Task>> {
        self.inner.lock().expect("task store lock poisoned")
    }

    /// Register a freshly submitted task.
    pub fn insert(&self, task: Task) {
        self.lock().insert(task.id.clone(), task);
    }

    /// Snapshot of one task.
    pub fn get(&self, id: &TaskId) -> Option<Task> {
        self.lock().get(id).cloned()
    }

    /// Snapshot of all tasks, newest first.
    pub fn list(&self) -> Vec<Task> {
        let mut tasks: Vec<Task> = self.lock().values().cloned().collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tasks
    }

    /// Mutate one task under the lock. Returns `None` for unknown ids.
    pub fn with_task<R>(&self, id: &TaskId, f: impl FnOnce(&mut Task) -> R) -> Option<R> {
        self.lock().get_mut(id).map(f)
    }

    /// Whether the cancellation flag is set for a task.
    pub fn is_cancel_requested(&self, id: &TaskId) -> bool {
        self.lock().get(id).map(|t| t.cancelled).unwrap_or(false)
    }

    /// Request cancellation. Only accepted while the task is queued or
    /// processing; the worker observes the flag at its next checkpoint.
    pub fn request_cancel(&self, id: &TaskId) -> Result<(), CancelRejection> {
        let mut tasks = self.lock();
        let task = tasks.get_mut(id).ok_or(CancelRejection::NotFound)?;
        if !task.status.is_cancellable() {
            return Err(CancelRejection::Conflict);
        }
        task.request_cancel();
        Ok(())
    }
}
