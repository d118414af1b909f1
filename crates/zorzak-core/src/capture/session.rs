/// Capture sessions: one background task plus its captured console output.
///
/// [`CaptureSession::begin`] installs a console redirection and starts the
/// target on a dedicated thread. The initiating thread polls the captured
/// text with [`CaptureSession::read_output`] / [`CaptureSession::read_error`]
/// and closes the session with [`CaptureSession::finish`], which restores
/// the console before re-raising any failure of the target.
///
/// The worker is never cancelled. `finish` does not wait for it either:
/// a long-running target (e.g. a web server) keeps running after the
/// session is closed, and its later output goes to the real console. A
/// failure that happens after the session is closed can no longer be
/// re-raised, so the worker logs it at error level instead.
use super::buffer::CaptureBuffer;
use super::console::{self, RedirectGuard};
use parking_lot::Mutex;
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error};

/// How often [`CaptureSession::join`] re-checks the worker.
const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Positional and named arguments handed to a session's target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskArgs {
    pub positional: Vec<String>,
    pub named: BTreeMap<String, String>,
}

impl TaskArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    pub fn with_arg(mut self, value: impl Into<String>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Set a named argument, replacing any previous value.
    pub fn with_named(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.named.insert(key.into(), value.into());
        self
    }

    /// Look up a named argument.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.named.get(key).map(String::as_str)
    }
}

/// Errors surfaced when a session is closed.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to spawn worker thread for task '{task}': {source}")]
    Spawn {
        task: String,
        #[source]
        source: std::io::Error,
    },

    #[error("background task '{task}' failed: {source}")]
    TaskFailed {
        task: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("background task '{task}' panicked: {message}")]
    TaskPanicked { task: String, message: String },

    #[error("background task '{task}' did not finish within {timeout:?}")]
    JoinTimeout { task: String, timeout: Duration },
}

impl CaptureError {
    /// The error returned by the target itself, for downcasting.
    pub fn task_error(&self) -> Option<&anyhow::Error> {
        match self {
            Self::TaskFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// What went wrong inside the worker.
enum TaskFailure {
    Failed(anyhow::Error),
    Panicked(String),
}

/// State written by the worker and read by the session.
#[derive(Default)]
struct WorkerState {
    failure: Mutex<Option<TaskFailure>>,
    finished: AtomicBool,
    // Set once the session stops collecting failures.
    closed: AtomicBool,
}

/// An open capture session.
pub struct CaptureSession {
    name: String,
    stdout: CaptureBuffer,
    stderr: CaptureBuffer,
    worker: Arc<WorkerState>,
    redirect: Option<RedirectGuard>,
    thread: Option<JoinHandle<()>>,
    started: Instant,
}

impl CaptureSession {
    /// Redirect the console and run `target(args)` on a new thread.
    pub fn begin<F>(name: impl Into<String>, target: F, args: TaskArgs) -> Result<Self, CaptureError>
    where
        F: FnOnce(TaskArgs) -> anyhow::Result<()> + Send + 'static,
    {
        let name = name.into();
        debug!(task = %name, ?args, "Capture session starting");

        let stdout = CaptureBuffer::new();
        let stderr = CaptureBuffer::new();
        let redirect = console::redirect(stdout.clone(), stderr.clone());

        let worker = Arc::new(WorkerState::default());
        let worker_clone = worker.clone();
        let task_name = name.clone();

        let thread = thread::Builder::new()
            .name(format!("zorzak-task-{name}"))
            .spawn(move || run_target(&task_name, target, args, &worker_clone))
            .map_err(|source| CaptureError::Spawn {
                task: name.clone(),
                source,
            })?;

        Ok(Self {
            name,
            stdout,
            stderr,
            worker,
            redirect: Some(redirect),
            thread: Some(thread),
            started: Instant::now(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Captured stdout so far.
    pub fn read_output(&self) -> String {
        self.stdout.contents()
    }

    /// Captured stderr so far.
    pub fn read_error(&self) -> String {
        self.stderr.contents()
    }

    /// `true` once the target has returned or panicked.
    pub fn is_finished(&self) -> bool {
        self.worker.finished.load(Ordering::Acquire)
    }

    /// `true` if the target has already failed.
    pub fn has_failed(&self) -> bool {
        self.worker.failure.lock().is_some()
    }

    /// Time since the session began.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Restore the console, then re-raise any failure of the target.
    ///
    /// Does not wait for the worker.
    pub fn finish(mut self) -> Result<(), CaptureError> {
        self.restore();
        self.take_error().map_or(Ok(()), Err)
    }

    /// Wait up to `timeout` for the worker to complete, then [`finish`].
    ///
    /// On timeout the console is still restored and the worker keeps running.
    ///
    /// [`finish`]: CaptureSession::finish
    pub fn join(mut self, timeout: Duration) -> Result<(), CaptureError> {
        // `None` means the timeout is too large to represent: wait forever.
        let deadline = Instant::now().checked_add(timeout);
        while !self.is_finished() {
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                self.restore();
                return Err(CaptureError::JoinTimeout {
                    task: self.name.clone(),
                    timeout,
                });
            }
            thread::sleep(JOIN_POLL_INTERVAL);
        }
        if let Some(handle) = self.thread.take() {
            // Panics are caught inside the worker, so join cannot fail here.
            let _ = handle.join();
        }
        self.finish()
    }

    fn restore(&mut self) {
        self.worker.closed.store(true, Ordering::SeqCst);
        if self.redirect.take().is_some() {
            debug!(
                task = %self.name,
                elapsed_ms = self.started.elapsed().as_millis() as u64,
                "Capture session closed"
            );
        }
    }

    fn take_error(&self) -> Option<CaptureError> {
        let failure = self.worker.failure.lock().take()?;
        Some(match failure {
            TaskFailure::Failed(source) => CaptureError::TaskFailed {
                task: self.name.clone(),
                source,
            },
            TaskFailure::Panicked(message) => CaptureError::TaskPanicked {
                task: self.name.clone(),
                message,
            },
        })
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.restore();
        if let Some(err) = self.take_error() {
            error!("Capture session dropped without finish: {err}");
        }
    }
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("name", &self.name)
            .field("finished", &self.is_finished())
            .field("stdout_len", &self.stdout.len())
            .field("stderr_len", &self.stderr.len())
            .finish()
    }
}

/// Worker body: run the target and record how it ended.
fn run_target<F>(task: &str, target: F, args: TaskArgs, worker: &WorkerState)
where
    F: FnOnce(TaskArgs) -> anyhow::Result<()>,
{
    let outcome = panic::catch_unwind(AssertUnwindSafe(move || target(args)));
    let failure = match outcome {
        Ok(Ok(())) => {
            debug!(task, "Background task completed");
            None
        }
        Ok(Err(err)) => {
            debug!(task, "Background task failed: {err:#}");
            Some(TaskFailure::Failed(err))
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            debug!(task, "Background task panicked: {message}");
            Some(TaskFailure::Panicked(message))
        }
    };

    let failed = failure.is_some();
    if let Some(failure) = failure {
        // Record first, then check `closed`: a session closing concurrently
        // either collects the failure or is seen as closed here.
        *worker.failure.lock() = Some(failure);
    }

    if failed && worker.closed.load(Ordering::SeqCst) {
        if let Some(failure) = worker.failure.lock().take() {
            match failure {
                TaskFailure::Failed(err) => {
                    error!(task, "Background task failed after its session closed: {err:#}")
                }
                TaskFailure::Panicked(message) => {
                    error!(task, "Background task panicked after its session closed: {message}")
                }
            }
        }
    }
    worker.finished.store(true, Ordering::Release);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}
