//! evolog - Narrates how a repository evolved from its commit history.
//!
//! # Overview
//!
//! evolog collects commits from GitHub or a local git repository, scores the
//! history's complexity, and summarizes it hierarchically with an LLM: small
//! histories in one call, larger ones in chunks whose summaries are merged
//! into a single narrative.

pub mod analysis;
pub mod collect;
pub mod error;
pub mod llm;

// Re-export commonly used types
pub use analysis::{AnalysisOptions, Analyzer, RepoAnalysis, analyze};
pub use collect::Commit;
pub use error::{
    AnalysisError, ClaudeError, CodexError, GenerationError, GitError, GitHubError, OllamaError,
    TemplateError,
};
pub use llm::{Provider, TextGenerator};
