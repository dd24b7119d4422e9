//! Error types for evolog modules using thiserror.

use std::path::PathBuf;

use thiserror::Error;

use crate::analysis::{Stage, Tier};

/// Errors from local git operations.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Failed to open repository: {0}")]
    OpenRepository(#[source] git2::Error),

    #[error("Failed to resolve HEAD: {0}")]
    HeadNotFound(#[source] git2::Error),

    #[error("Failed to parse commit: {0}")]
    ParseCommit(#[source] git2::Error),

    #[error("Failed to walk commit history: {0}")]
    RevwalkError(#[source] git2::Error),

    #[error("Failed to diff commit {hash}: {source}")]
    DiffFailed {
        hash: String,
        #[source]
        source: git2::Error,
    },
}

/// Errors from GitHub API operations.
#[derive(Error, Debug)]
pub enum GitHubError {
    #[error(
        "GitHub authentication failed: no valid auth found. Run 'gh auth login' or set GITHUB_TOKEN environment variable"
    )]
    AuthenticationFailed,

    #[error("Failed to fetch commits: {0}")]
    FetchCommits(#[source] Box<octocrab::Error>),

    #[error("Rate limited by GitHub API. Resets at: {reset_time}")]
    RateLimited { reset_time: String },

    #[error("Repository not found: {owner}/{repo}")]
    RepositoryNotFound { owner: String, repo: String },

    #[error("Failed to parse repository reference '{0}' (expected owner/repo or a GitHub URL)")]
    InvalidRepository(String),
}

/// Errors from Claude CLI operations.
#[derive(Error, Debug)]
pub enum ClaudeError {
    #[error("Claude Code CLI not found. Install with: npm install -g @anthropic-ai/claude-code")]
    NotInstalled,

    #[error("Claude Code CLI failed to execute: {0}")]
    ExecutionFailed(String),

    #[error("Failed to spawn Claude process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Claude process timed out after {0} seconds")]
    Timeout(u64),

    #[error("Claude CLI exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },
}

/// Errors from Codex CLI operations.
#[derive(Error, Debug)]
pub enum CodexError {
    #[error(
        "Codex CLI not found. Install with: npm install -g @openai/codex (then run `codex` or set CODEX_API_KEY)"
    )]
    NotInstalled,

    #[error("Failed to spawn Codex process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Codex process timed out after {0} seconds")]
    Timeout(u64),

    #[error("Codex CLI exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },
}

/// Errors from the Ollama HTTP API.
#[derive(Error, Debug)]
pub enum OllamaError {
    #[error("Ollama request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Ollama returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Ollama returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// A single text-completion call failed.
///
/// Never retried: one failure fails the whole analysis run.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error(transparent)]
    Claude(#[from] ClaudeError),

    #[error(transparent)]
    Codex(#[from] CodexError),

    #[error(transparent)]
    Ollama(#[from] OllamaError),

    #[error("Completion service unavailable: {0}")]
    Unavailable(String),
}

/// Errors from prompt template loading.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template '{id}' must contain exactly one {{input}} or {{commits}} placeholder, found {found}")]
    Placeholder { id: &'static str, found: usize },

    #[error("Failed to read template {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the summarization pipeline.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Summarization failed during {stage}: {source}")]
    Generation {
        stage: Stage,
        #[source]
        source: GenerationError,
    },

    #[error("Chunk plan for the {tier} tier has {chunks} chunks")]
    MalformedPlan { tier: Tier, chunks: usize },
}

impl AnalysisError {
    /// The pipeline stage whose completion call failed, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            AnalysisError::Generation { stage, .. } => Some(*stage),
            AnalysisError::MalformedPlan { .. } => None,
        }
    }
}
