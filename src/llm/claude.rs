//! Claude CLI backend.

use std::env;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{ClaudeError, GenerationError};
use crate::llm::TextGenerator;

/// Default timeout for one Claude call (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Environment variable overriding the timeout, in seconds.
pub const TIMEOUT_ENV_VAR: &str = "EVOLOG_CLAUDE_TIMEOUT";

/// Read the timeout from `EVOLOG_CLAUDE_TIMEOUT`, falling back to 300s.
///
/// A set but unparsable value logs a warning.
fn get_timeout() -> Duration {
    match env::var(TIMEOUT_ENV_VAR) {
        Ok(v) if !v.is_empty() => match v.parse::<u64>() {
            Ok(secs) => Duration::from_secs(secs),
            Err(_) => {
                warn!(
                    "Invalid {} value '{}', using default {}s",
                    TIMEOUT_ENV_VAR, v, DEFAULT_TIMEOUT_SECS
                );
                Duration::from_secs(DEFAULT_TIMEOUT_SECS)
            }
        },
        _ => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
    }
}

/// Check that the `claude` binary is on PATH and answers `--version`.
pub async fn check_claude_installed() -> Result<(), ClaudeError> {
    if which::which("claude").is_err() {
        return Err(ClaudeError::NotInstalled);
    }

    let version_check = Command::new("claude")
        .arg("--version")
        .output()
        .await
        .map_err(ClaudeError::SpawnFailed)?;

    if !version_check.status.success() {
        return Err(ClaudeError::NotInstalled);
    }

    Ok(())
}

/// Envelope printed by `claude -p ... --output-format json`.
#[derive(Deserialize)]
struct ClaudeCliResponse {
    result: String,
    #[serde(default)]
    is_error: bool,
}

/// Unwrap the CLI envelope. Output that is not an envelope is returned as is.
fn parse_claude_response(stdout: &str) -> Result<String, ClaudeError> {
    match serde_json::from_str::<ClaudeCliResponse>(stdout) {
        Ok(envelope) if envelope.is_error => Err(ClaudeError::ExecutionFailed(envelope.result)),
        Ok(envelope) => Ok(envelope.result),
        Err(_) => Ok(stdout.to_string()),
    }
}

/// Runs `claude -p <prompt> --output-format json` once per call.
#[derive(Debug, Clone)]
pub struct ClaudeGenerator {
    program: String,
    timeout: Duration,
}

impl Default for ClaudeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaudeGenerator {
    pub fn new() -> Self {
        Self {
            program: "claude".to_string(),
            timeout: get_timeout(),
        }
    }

    /// Use a different executable with the same command-line contract.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(&self, prompt: &str) -> Result<String, ClaudeError> {
        let timeout_secs = self.timeout.as_secs();

        let output = timeout(
            self.timeout,
            Command::new(&self.program)
                .arg("-p")
                .arg(prompt)
                .arg("--output-format")
                .arg("json")
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| ClaudeError::Timeout(timeout_secs))?
        .map_err(ClaudeError::SpawnFailed)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            let code = output.status.code().unwrap_or(-1);
            return Err(ClaudeError::NonZeroExit { code, stderr });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_claude_response(&stdout)
    }
}

#[async_trait]
impl TextGenerator for ClaudeGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        debug!(program = %self.program, "Running Claude");
        Ok(self.run(prompt).await?)
    }
}
