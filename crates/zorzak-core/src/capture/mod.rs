/// Capture module: runs a task on a background thread while the
/// process-wide console streams are redirected into in-memory buffers.
///
/// - [`console`] owns the process-wide stdout/stderr writers and the
///   scoped [`RedirectGuard`].
/// - [`buffer`] is the append-only, thread-safe capture buffer.
/// - [`session`] ties the two together with a worker thread and failure
///   propagation.
///
/// Redirection is global: at most one session should be open at a time.
/// This is documented, not enforced.
pub mod buffer;
pub mod console;
pub mod session;

pub use buffer::CaptureBuffer;
pub use console::{is_redirected, redirect, ConsoleWriter, RedirectGuard, Stream};
pub use session::{CaptureError, CaptureSession, TaskArgs};

/// Serialises unit tests that open capture sessions, since they all share
/// the process-wide console.
#[cfg(test)]
pub(crate) fn serial_guard() -> parking_lot::MutexGuard<'static, ()> {
    static LOCK: parking_lot::Mutex<()> = parking_lot::const_mutex(());
    LOCK.lock()
}
