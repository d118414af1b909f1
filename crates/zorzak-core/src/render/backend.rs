/// Running an external visualization backend as a capture-session target.
///
/// The child's stdout and stderr are forwarded line by line into the
/// process-wide console streams, so a capture session sees them as if the
/// backend had printed from inside this process. Once the session is closed
/// the same lines go to the real console.
use crate::capture::console::{self, ConsoleWriter};
use anyhow::{bail, Context};
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use tracing::{debug, info};

/// Substitute `{file}`, `{port}` and `{host}` in each argument template.
pub fn expand_args(templates: &[String], file: &Path, port: u16, host: &str) -> Vec<String> {
    let file = file.to_string_lossy();
    let port = port.to_string();
    templates
        .iter()
        .map(|t| {
            t.replace("{file}", &file)
                .replace("{port}", &port)
                .replace("{host}", host)
        })
        .collect()
}

/// Start `program` and forward its output until it exits.
///
/// Returns an error if the program cannot be started or exits
/// unsuccessfully. A backend that keeps serving simply never returns.
pub fn run_backend(program: &str, args: &[String]) -> anyhow::Result<()> {
    let mut child = Command::new(program)
        .args(args)
        // Python buffers stdout when it is not a terminal.
        .env("PYTHONUNBUFFERED", "1")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to start backend '{program}'"))?;

    info!(program, pid = child.id(), "Backend started");

    let stderr_pump = match child.stderr.take() {
        Some(pipe) => Some(
            thread::Builder::new()
                .name("zorzak-backend-stderr".into())
                .spawn(move || pump_lines(pipe, console::stderr()))
                .context("failed to spawn stderr forwarder")?,
        ),
        None => None,
    };

    if let Some(pipe) = child.stdout.take() {
        pump_lines(pipe, console::stdout());
    }

    let status = child
        .wait()
        .with_context(|| format!("failed to wait for backend '{program}'"))?;
    if let Some(handle) = stderr_pump {
        let _ = handle.join();
    }

    debug!(program, %status, "Backend exited");
    if !status.success() {
        bail!("backend '{program}' exited with {status}");
    }
    Ok(())
}

/// Copy `pipe` to `sink` one line at a time until EOF.
fn pump_lines<R: Read>(pipe: R, mut sink: ConsoleWriter) {
    let mut reader = BufReader::new(pipe);
    let mut line = Vec::new();
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line) {
            Ok(0) => break,
            Ok(_) => {
                if let Err(e) = sink.write_all(&line).and_then(|()| sink.flush()) {
                    debug!(stream = ?sink.stream(), "Console write failed: {e}");
                    break;
                }
            }
            Err(e) => {
                debug!(stream = ?sink.stream(), "Backend pipe read failed: {e}");
                break;
            }
        }
    }
}
