//! Bounded invocation of external encoder, tagger, and catalog programs.
//!
//! # Design
//! - Arguments are templates; `{name}` placeholders are substituted per call in a
//!   single pass, so substituted values are never rescanned.
//! - The child is polled until it exits or the time budget elapses, then killed.
//! - With output capture enabled, stdout and stderr are drained by reader
//!   threads so a chatty child cannot block on a full pipe.

use std::collections::BTreeMap;
use std::io::Read;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::{PipelineError, PipelineResult};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Placeholder values substituted into tool arguments.
pub type ToolVars = BTreeMap<&'static str, String>;

/// Output of a successful tool run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Captured standard output; empty when capture is disabled.
    pub stdout: Vec<u8>,
}

/// An external program invoked with templated arguments and a time budget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExternalTool {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    capture_output: bool,
}

impl ExternalTool {
    /// Describe a tool invocation.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] for an empty program or a zero timeout.
    pub fn new(
        program: impl Into<String>,
        args: Vec<String>,
        timeout: Duration,
        capture_output: bool,
    ) -> PipelineResult<Self> {
        let program = program.into();
        if program.trim().is_empty() {
            return Err(PipelineError::InvalidConfig {
                field: "program",
                reason: "empty",
                value: None,
            });
        }
        if timeout.is_zero() {
            return Err(PipelineError::InvalidConfig {
                field: "timeout",
                reason: "must be positive",
                value: Some(program),
            });
        }
        Ok(Self {
            program,
            args,
            timeout,
            capture_output,
        })
    }

    /// Program name or path.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Configured time budget.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether stdout and stderr are captured.
    #[must_use]
    pub const fn captures_output(&self) -> bool {
        self.capture_output
    }

    /// Same tool with output capture forced on.
    #[must_use]
    pub fn capturing(mut self) -> Self {
        self.capture_output = true;
        self
    }

    /// Substitute `vars` into the argument templates.
    #[must_use]
    pub fn render(&self, vars: &ToolVars) -> Vec<String> {
        self.args.iter().map(|arg| render_arg(arg, vars)).collect()
    }

    /// Run the tool with rendered arguments plus `extra` trailing arguments.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ToolSpawn`] when the program cannot start,
    /// [`PipelineError::ToolTimeout`] when it outlives its budget, and
    /// [`PipelineError::ToolFailed`] for a non-zero exit.
    pub fn run(&self, vars: &ToolVars, extra: &[String]) -> PipelineResult<ToolOutput> {
        let mut args = self.render(vars);
        args.extend_from_slice(extra);

        let mut command = Command::new(&self.program);
        command.args(&args).stdin(Stdio::null());
        if self.capture_output {
            command.stdout(Stdio::piped()).stderr(Stdio::piped());
        } else {
            command.stdout(Stdio::null()).stderr(Stdio::null());
        }

        info!(program = %self.program, ?args, "external tool started");
        let mut child = command.spawn().map_err(|source| PipelineError::ToolSpawn {
            program: self.program.clone(),
            source,
        })?;
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let started = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if started.elapsed() >= self.timeout => {
                    let _ = child.kill();
                    let _ = child.wait();
                    warn!(program = %self.program, timeout = ?self.timeout, "external tool timed out");
                    return Err(PipelineError::ToolTimeout {
                        program: self.program.clone(),
                        timeout: self.timeout,
                    });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(source) => {
                    let _ = child.kill();
                    return Err(PipelineError::io("tool.wait", &self.program, source));
                }
            }
        };

        let stdout = collect(stdout);
        let stderr = String::from_utf8_lossy(&collect(stderr)).trim().to_string();
        if !stderr.is_empty() {
            debug!(program = %self.program, %stderr, "external tool stderr");
        }
        info!(
            program = %self.program,
            code = ?status.code(),
            elapsed = ?started.elapsed(),
            "external tool exited"
        );

        if !status.success() {
            return Err(PipelineError::ToolFailed {
                program: self.program.clone(),
                status: status.code(),
                stderr,
            });
        }
        Ok(ToolOutput { stdout })
    }
}

fn render_arg(template: &str, vars: &ToolVars) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        rendered.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        if let Some(close) = after.find('}')
            && let Some(value) = vars.get(&after[..close])
        {
            rendered.push_str(value);
            rest = &after[close + 1..];
            continue;
        }
        rendered.push('{');
        rest = after;
    }
    rendered.push_str(rest);
    rendered
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        buf
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}
