/// Process-wide console streams with scoped redirection.
///
/// Code whose output should be capturable writes through [`stdout()`] and
/// [`stderr()`] instead of `println!`. While a [`RedirectGuard`] is alive,
/// those writes land in its capture buffers; otherwise they go straight to
/// the real process streams.
///
/// Redirections form a stack. Dropping a guard removes exactly its own
/// entry, so the streams that were active before it are restored even when
/// guards are dropped out of order.
use super::buffer::CaptureBuffer;
use parking_lot::Mutex;
use std::io::{self, Write};
use tracing::{debug, warn};

/// Which console stream a writer targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

struct Redirection {
    id: u64,
    stdout: CaptureBuffer,
    stderr: CaptureBuffer,
}

struct Console {
    next_id: u64,
    stack: Vec<Redirection>,
}

static CONSOLE: Mutex<Console> = parking_lot::const_mutex(Console {
    next_id: 0,
    stack: Vec::new(),
});

/// Writer for the process-wide stdout.
pub fn stdout() -> ConsoleWriter {
    ConsoleWriter {
        stream: Stream::Stdout,
    }
}

/// Writer for the process-wide stderr.
pub fn stderr() -> ConsoleWriter {
    ConsoleWriter {
        stream: Stream::Stderr,
    }
}

/// `true` while at least one redirection is installed.
pub fn is_redirected() -> bool {
    !CONSOLE.lock().stack.is_empty()
}

/// Redirect the console streams into `stdout` / `stderr` until the returned
/// guard is dropped.
pub fn redirect(stdout: CaptureBuffer, stderr: CaptureBuffer) -> RedirectGuard {
    let mut console = CONSOLE.lock();
    let id = console.next_id;
    console.next_id += 1;
    if !console.stack.is_empty() {
        warn!(
            depth = console.stack.len(),
            "Console is already redirected; concurrent capture sessions will interleave"
        );
    }
    console.stack.push(Redirection { id, stdout, stderr });
    debug!(id, "Console redirected");
    RedirectGuard { id }
}

/// Restores the console streams when dropped.
#[must_use = "the redirection ends as soon as the guard is dropped"]
#[derive(Debug)]
pub struct RedirectGuard {
    id: u64,
}

impl Drop for RedirectGuard {
    fn drop(&mut self) {
        let mut console = CONSOLE.lock();
        console.stack.retain(|r| r.id != self.id);
        debug!(id = self.id, remaining = console.stack.len(), "Console restored");
    }
}

/// A handle that writes to whichever target the console stream currently
/// points at.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleWriter {
    stream: Stream,
}

impl ConsoleWriter {
    pub fn stream(&self) -> Stream {
        self.stream
    }

    /// The buffer this stream is redirected into, if any.
    fn target(&self) -> Option<CaptureBuffer> {
        let console = CONSOLE.lock();
        console.stack.last().map(|r| match self.stream {
            Stream::Stdout => r.stdout.clone(),
            Stream::Stderr => r.stderr.clone(),
        })
    }
}

impl Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.target() {
            Some(buffer) => {
                buffer.append(buf);
                Ok(buf.len())
            }
            None => match self.stream {
                Stream::Stdout => io::stdout().write(buf),
                Stream::Stderr => io::stderr().write(buf),
            },
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.target() {
            Some(_) => Ok(()),
            None => match self.stream {
                Stream::Stdout => io::stdout().flush(),
                Stream::Stderr => io::stderr().flush(),
            },
        }
    }
}
