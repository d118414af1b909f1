/// Pattern-triggered launcher: start a long-running task and watch its
/// captured stdout until a regular expression matches.
///
/// Used to discover the URL a visualization backend picked before it can be
/// embedded. A timeout is a soft outcome (`None`), not an error; the caller
/// decides whether to escalate.
///
/// The launcher never joins the worker. Once a match is found (or the
/// timeout elapses) the session is closed and the task keeps running.
use crate::capture::{CaptureError, CaptureSession, TaskArgs};
use regex::Regex;
use std::ops::Range;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Default total wait for a match.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Default delay between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Timing knobs for [`launch_until_pattern`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Total wall-clock time to wait for a match.
    pub timeout: Duration,
    /// Delay between reads of the captured output.
    pub poll_interval: Duration,
}

impl LaunchOptions {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT, DEFAULT_POLL_INTERVAL)
    }
}

/// An owned regex match found in captured output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    text: String,
    range: Range<usize>,
    groups: Vec<Option<String>>,
}

impl PatternMatch {
    /// First match of `pattern` in `haystack`, copied out of the haystack.
    pub fn find(pattern: &Regex, haystack: &str) -> Option<Self> {
        let caps = pattern.captures(haystack)?;
        let whole = caps.get(0)?;
        Some(Self {
            text: whole.as_str().to_owned(),
            range: whole.range(),
            groups: caps
                .iter()
                .skip(1)
                .map(|m| m.map(|m| m.as_str().to_owned()))
                .collect(),
        })
    }

    /// The matched text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Byte range of the match within the captured output.
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    /// Capture group `index`; `0` is the whole match.
    pub fn group(&self, index: usize) -> Option<&str> {
        if index == 0 {
            return Some(&self.text);
        }
        self.groups.get(index - 1)?.as_deref()
    }
}

impl std::fmt::Display for PatternMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

impl CaptureSession {
    /// Poll captured stdout until `pattern` matches or `timeout` elapses.
    ///
    /// Every tick logs newly captured stdout (debug) and stderr (warn).
    /// Stops early when the task has already returned without producing a
    /// match, since no further output can arrive.
    pub fn wait_for_pattern(
        &self,
        pattern: &Regex,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Option<PatternMatch> {
        // `None` means the timeout is too large to represent: no deadline.
        let deadline = Instant::now().checked_add(timeout);
        let mut seen_out = 0usize;
        let mut seen_err = 0usize;

        loop {
            // Sample before reading so output written just before exit is seen.
            let finished = self.is_finished();
            let output = self.read_output();
            let errors = self.read_error();

            if output.len() > seen_out {
                debug!(task = self.name(), "{}", output[seen_out..].trim_end());
                seen_out = output.len();
            }
            if errors.len() > seen_err {
                warn!(task = self.name(), "{}", errors[seen_err..].trim_end());
                seen_err = errors.len();
            }

            if let Some(found) = PatternMatch::find(pattern, &output) {
                info!(
                    task = self.name(),
                    elapsed_ms = self.elapsed().as_millis() as u64,
                    "Pattern matched: {found}"
                );
                return Some(found);
            }

            if finished {
                debug!(task = self.name(), "Task returned before the pattern appeared");
                return None;
            }

            let nap = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        debug!(task = self.name(), ?timeout, "No match before timeout");
                        return None;
                    }
                    poll_interval.min(deadline - now)
                }
                None => poll_interval,
            };
            thread::sleep(nap);
        }
    }
}

/// Start `target(args)` in a capture session and wait for `pattern` in its
/// stdout.
///
/// Returns `Ok(None)` on timeout. A failure of the target observed by the
/// time the session closes is re-raised as a [`CaptureError`].
pub fn launch_until_pattern<F>(
    name: impl Into<String>,
    target: F,
    args: TaskArgs,
    pattern: &Regex,
    options: LaunchOptions,
) -> Result<Option<PatternMatch>, CaptureError>
where
    F: FnOnce(TaskArgs) -> anyhow::Result<()> + Send + 'static,
{
    let session = CaptureSession::begin(name, target, args)?;
    let found = session.wait_for_pattern(pattern, options.timeout, options.poll_interval);
    session.finish()?;
    Ok(found)
}
