//! Local model invocation.
//!
//! Runs `<program> <subcommand> <model>` with the prompt on stdin and turns
//! whatever happens into text for the user. Nothing in here returns an
//! error: every failure becomes one of the fixed fallback messages.

use std::io;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::RunnerConfig;

/// Model exited cleanly but said nothing
pub const NO_RESPONSE_TEXT: &str = "I’m sorry, I don’t have a response at the moment.";

/// Model exited with a failure status
pub const MODEL_ERROR_TEXT: &str = "I’m sorry, I couldn’t generate a response because the local \
model encountered an error. Please contact your IT staff for assistance.";

/// Runner executable is not on PATH
pub const NOT_INSTALLED_TEXT: &str = "It appears the local language model is not installed. \
Please ask your IT administrator to install an Ollama‑compatible model. In the meantime, \
refer to internal troubleshooting guides or contact IT directly.";

/// Anything else went wrong
pub const UNEXPECTED_ERROR_TEXT: &str =
    "An unexpected error occurred while accessing the local model. Please contact IT support.";

/// How one invocation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationOutcome {
    /// Exit status 0, raw stdout
    Succeeded { stdout: String },
    /// Non-zero exit (`None` when killed by a signal)
    FailedNonzero { code: Option<i32> },
    /// Runner executable not found
    FailedMissing,
    /// Spawn, pipe, wait, timeout or decoding failure
    FailedUnexpected { reason: String },
}

impl InvocationOutcome {
    /// Collapse to the text shown to the user and stored in the ticket
    pub fn into_response(self, prompt: &str) -> String {
        match self {
            Self::Succeeded { stdout } => clean_output(&stdout, prompt),
            Self::FailedNonzero { .. } => MODEL_ERROR_TEXT.to_string(),
            Self::FailedMissing => NOT_INSTALLED_TEXT.to_string(),
            Self::FailedUnexpected { .. } => UNEXPECTED_ERROR_TEXT.to_string(),
        }
    }
}

/// Trim model output and drop an echoed prompt
pub fn clean_output(stdout: &str, prompt: &str) -> String {
    let trimmed = stdout.trim();
    let text = match trimmed.strip_prefix(prompt) {
        Some(rest) => rest.trim(),
        None => trimmed,
    };
    if text.is_empty() {
        NO_RESPONSE_TEXT.to_string()
    } else {
        text.to_string()
    }
}

/// External model process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRunner {
    program: String,
    subcommand: String,
    timeout: Option<Duration>,
}

impl Default for ModelRunner {
    fn default() -> Self {
        Self::from_config(&RunnerConfig::default())
    }
}

impl ModelRunner {
    /// Runner with the default subcommand and no timeout
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            subcommand: RunnerConfig::default().subcommand,
            timeout: None,
        }
    }

    pub fn from_config(config: &RunnerConfig) -> Self {
        let timeout = match config.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        Self {
            program: config.program.clone(),
            subcommand: config.subcommand.clone(),
            timeout,
        }
    }

    pub fn with_subcommand(mut self, subcommand: impl Into<String>) -> Self {
        self.subcommand = subcommand.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Ask the model and return user-facing text. Never fails.
    pub async fn query_model(&self, prompt: &str, model: &str) -> String {
        self.invoke(prompt, model).await.into_response(prompt)
    }

    /// Run the process once and report how it ended
    pub async fn invoke(&self, prompt: &str, model: &str) -> InvocationOutcome {
        debug!(
            "invoking {} {} {} ({} byte prompt)",
            self.program,
            self.subcommand,
            model,
            prompt.len()
        );

        let mut child = match Command::new(&self.program)
            .arg(&self.subcommand)
            .arg(model)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("{} not found on PATH", self.program);
                return InvocationOutcome::FailedMissing;
            }
            Err(e) => {
                warn!("failed to start {}: {}", self.program, e);
                return InvocationOutcome::FailedUnexpected {
                    reason: e.to_string(),
                };
            }
        };

        // Feed stdin concurrently so a child that writes before it reads
        // cannot fill its stdout pipe and stall.
        let writer = child.stdin.take().map(|mut stdin| {
            let input = prompt.to_owned();
            tokio::spawn(async move {
                stdin.write_all(input.as_bytes()).await?;
                stdin.shutdown().await
            })
        });

        let waited = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(waited) => waited,
                Err(_) => {
                    warn!("{} did not finish within {:?}", self.program, limit);
                    return InvocationOutcome::FailedUnexpected {
                        reason: format!("timed out after {:?}", limit),
                    };
                }
            },
            None => child.wait_with_output().await,
        };

        let output = match waited {
            Ok(output) => output,
            Err(e) => {
                warn!("failed waiting for {}: {}", self.program, e);
                return InvocationOutcome::FailedUnexpected {
                    reason: e.to_string(),
                };
            }
        };

        if let Some(writer) = writer {
            match writer.await {
                Ok(Ok(())) => {}
                // Child exited without reading everything; its status decides
                Ok(Err(e)) if e.kind() == io::ErrorKind::BrokenPipe => {
                    debug!("{} closed stdin early", self.program);
                }
                Ok(Err(e)) => {
                    warn!("failed writing prompt to {}: {}", self.program, e);
                    return InvocationOutcome::FailedUnexpected {
                        reason: e.to_string(),
                    };
                }
                Err(e) => {
                    warn!("prompt writer task failed: {}", e);
                    return InvocationOutcome::FailedUnexpected {
                        reason: e.to_string(),
                    };
                }
            }
        }

        if output.status.success() {
            match String::from_utf8(output.stdout) {
                Ok(stdout) => InvocationOutcome::Succeeded { stdout },
                Err(e) => {
                    warn!("{} produced output that is not UTF-8: {}", self.program, e);
                    InvocationOutcome::FailedUnexpected {
                        reason: e.to_string(),
                    }
                }
            }
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            );
            InvocationOutcome::FailedNonzero {
                code: output.status.code(),
            }
        }
    }
}

/// Ask the default runner (`ollama run <model>`)
pub async fn query_model(prompt: &str, model: &str) -> String {
    ModelRunner::default().query_model(prompt, model).await
}
