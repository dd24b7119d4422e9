//! Codex CLI backend.

use std::env;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{CodexError, GenerationError};
use crate::llm::TextGenerator;

const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Environment variable overriding the timeout, in seconds.
pub const TIMEOUT_ENV_VAR: &str = "EVOLOG_CODEX_TIMEOUT";

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

/// Check that the `codex` binary is on PATH and answers `--version`.
pub async fn check_codex_installed() -> Result<(), CodexError> {
    if which::which("codex").is_err() {
        return Err(CodexError::NotInstalled);
    }

    let version_check = Command::new("codex")
        .arg("--version")
        .output()
        .await
        .map_err(CodexError::SpawnFailed)?;

    if !version_check.status.success() {
        return Err(CodexError::NotInstalled);
    }

    Ok(())
}

/// Runs `codex exec <prompt>` once per call and returns its stdout.
#[derive(Debug, Clone)]
pub struct CodexGenerator {
    program: String,
    timeout: Duration,
}

impl Default for CodexGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl CodexGenerator {
    pub fn new() -> Self {
        Self {
            program: "codex".to_string(),
            timeout: get_timeout(),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(&self, prompt: &str) -> Result<String, CodexError> {
        let timeout_secs = self.timeout.as_secs();

        let mut cmd = Command::new(&self.program);
        cmd.arg("exec")
            .arg(prompt)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| CodexError::Timeout(timeout_secs))?
            .map_err(CodexError::SpawnFailed)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            let code = output.status.code().unwrap_or(-1);
            return Err(CodexError::NonZeroExit { code, stderr });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

#[async_trait]
impl TextGenerator for CodexGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        debug!(program = %self.program, "Running Codex");
        Ok(self.run(prompt).await?)
    }
}
