//! Background task bookkeeping for chunked resample runs.
//!
//! Every record is owned by the registry and shared with its runner; state
//! changes go through the record so pollers always observe a coherent
//! snapshot. Cancellation is a request flag the runner honors between
//! chunks, never a forced abort.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rand::Rng;

use barscale_types::{Bar, BarscaleError, ResampleKey};

/// Opaque identifier for a background resample task.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskId(String);

impl TaskId {
    fn generate() -> Self {
        Self(format!("{:016x}", rand::rng().random::<u64>()))
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lifecycle of a background task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Admitted but not yet picked up by the runner.
    Queued,
    /// Actively fetching and aggregating chunks.
    Running,
    /// Finished; the result is available until the record is reaped.
    Succeeded,
    /// Aborted with an error; no partial output is exposed.
    Failed,
    /// Stopped at a chunk boundary after a cancel request.
    Cancelled,
}

impl TaskState {
    /// Whether the task will never change state again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

/// Snapshot of a task as seen by pollers.
#[derive(Debug, Clone)]
pub struct TaskStatus {
    /// Current lifecycle state.
    pub state: TaskState,
    /// Chunk-granular progress, 0 through 100.
    pub progress: u8,
    /// Aggregated bars, present only once `Succeeded`.
    pub result: Option<Arc<Vec<Bar>>>,
    /// Failure cause, present only once `Failed`.
    pub error: Option<BarscaleError>,
}

pub(crate) struct TaskRecord {
    key: ResampleKey,
    status: Mutex<TaskStatus>,
    cancel_requested: AtomicBool,
    finished_at: Mutex<Option<Instant>>,
}

impl TaskRecord {
    fn new(key: ResampleKey) -> Self {
        Self {
            key,
            status: Mutex::new(TaskStatus {
                state: TaskState::Queued,
                progress: 0,
                result: None,
                error: None,
            }),
            cancel_requested: AtomicBool::new(false),
            finished_at: Mutex::new(None),
        }
    }

    pub(crate) fn key(&self) -> &ResampleKey {
        &self.key
    }

    pub(crate) fn snapshot(&self) -> TaskStatus {
        self.status.lock().expect("task status poisoned").clone()
    }

    pub(crate) fn cancel_requested(&self) -> bool {
        self.cancel_requested.load(Ordering::SeqCst)
    }

    pub(crate) fn request_cancel(&self) {
        self.cancel_requested.store(true, Ordering::SeqCst);
    }

    pub(crate) fn set_running(&self) {
        let mut status = self.status.lock().expect("task status poisoned");
        if status.state == TaskState::Queued {
            status.state = TaskState::Running;
        }
    }

    pub(crate) fn set_progress(&self, progress: u8) {
        let mut status = self.status.lock().expect("task status poisoned");
        // Progress never moves backwards, even across chunk-size oddities.
        if progress > status.progress {
            status.progress = progress;
        }
    }

    pub(crate) fn finish_success(&self, bars: Arc<Vec<Bar>>) {
        let mut status = self.status.lock().expect("task status poisoned");
        status.state = TaskState::Succeeded;
        status.progress = 100;
        status.result = Some(bars);
        *self.finished_at.lock().expect("finished_at poisoned") = Some(Instant::now());
    }

    pub(crate) fn finish_failed(&self, error: BarscaleError) {
        let mut status = self.status.lock().expect("task status poisoned");
        status.state = TaskState::Failed;
        status.error = Some(error);
        *self.finished_at.lock().expect("finished_at poisoned") = Some(Instant::now());
    }

    /// Progress is frozen at its last value so pollers can see how far the
    /// run got before it stopped.
    pub(crate) fn finish_cancelled(&self) {
        let mut status = self.status.lock().expect("task status poisoned");
        status.state = TaskState::Cancelled;
        *self.finished_at.lock().expect("finished_at poisoned") = Some(Instant::now());
    }

    fn reapable(&self, now: Instant, retention: Duration) -> bool {
        self.finished_at
            .lock()
            .expect("finished_at poisoned")
            .is_some_and(|t| now.duration_since(t) >= retention)
    }
}

/// Outcome of admitting a request key into the registry.
pub(crate) enum Admission {
    /// A live task already covers this key; join it.
    Existing(TaskId),
    /// A fresh record was created for this key.
    New(TaskId, Arc<TaskRecord>),
}

pub(crate) struct TaskRegistry {
    retention: Duration,
    inner: Mutex<RegistryInner>,
}

struct RegistryInner {
    tasks: HashMap<TaskId, Arc<TaskRecord>>,
    by_key: HashMap<ResampleKey, TaskId>,
}

impl TaskRegistry {
    pub(crate) fn new(retention: Duration) -> Self {
        Self {
            retention,
            inner: Mutex::new(RegistryInner {
                tasks: HashMap::new(),
                by_key: HashMap::new(),
            }),
        }
    }

    /// Coalesce on the request key: a second identical request while a task
    /// is live joins it instead of spawning a duplicate.
    pub(crate) fn admit(&self, key: ResampleKey) -> Admission {
        let mut inner = self.inner.lock().expect("task registry poisoned");
        Self::reap(&mut inner, self.retention);

        if let Some(id) = inner.by_key.get(&key) {
            let live = inner
                .tasks
                .get(id)
                .is_some_and(|rec| !rec.snapshot().state.is_terminal());
            if live {
                return Admission::Existing(id.clone());
            }
        }

        let id = TaskId::generate();
        let record = Arc::new(TaskRecord::new(key.clone()));
        inner.tasks.insert(id.clone(), Arc::clone(&record));
        inner.by_key.insert(key, id.clone());
        Admission::New(id, record)
    }

    pub(crate) fn status(&self, id: &TaskId) -> Result<TaskStatus, BarscaleError> {
        let mut inner = self.inner.lock().expect("task registry poisoned");
        Self::reap(&mut inner, self.retention);
        inner
            .tasks
            .get(id)
            .map(|rec| rec.snapshot())
            .ok_or_else(|| BarscaleError::unknown_task(id.as_str()))
    }

    /// Request cancellation. A no-op on already-terminal tasks; the caller
    /// can tell from the next status poll.
    pub(crate) fn request_cancel(&self, id: &TaskId) -> Result<(), BarscaleError> {
        let inner = self.inner.lock().expect("task registry poisoned");
        let record = inner
            .tasks
            .get(id)
            .ok_or_else(|| BarscaleError::unknown_task(id.as_str()))?;
        if !record.snapshot().state.is_terminal() {
            record.request_cancel();
        }
        Ok(())
    }

    fn reap(inner: &mut RegistryInner, retention: Duration) {
        let now = Instant::now();
        let doomed: Vec<TaskId> = inner
            .tasks
            .iter()
            .filter(|(_, rec)| rec.reapable(now, retention))
            .map(|(id, _)| id.clone())
            .collect();
        for id in doomed {
            if let Some(record) = inner.tasks.remove(&id) {
                if inner.by_key.get(record.key()) == Some(&id) {
                    inner.by_key.remove(record.key());
                }
            }
        }
    }
}
