//! Commit collection from GitHub or a local repository.
//!
//! Both collectors produce the same [`Commit`] records, ordered oldest to
//! newest, which is the only input the analysis pipeline consumes.

pub mod auth;
pub mod github;
pub mod local;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use auth::get_github_token;
pub use github::{GitHubCollector, parse_github_repository};
pub use local::fetch_local_commits;

/// A single commit as seen by the analysis pipeline.
///
/// Has no identity beyond its position in the collected sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub timestamp: DateTime<Utc>,
    pub author: String,
    pub message: String,
    /// Unified diff text. Empty for root commits or when the diff was unavailable.
    pub diff: String,
    /// Web link to the commit, when the source has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Commit {
    pub fn new(
        timestamp: DateTime<Utc>,
        author: impl Into<String>,
        message: impl Into<String>,
        diff: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            author: author.into(),
            message: message.into(),
            diff: diff.into(),
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// First line of the commit message.
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

/// Keep only the newest `max` commits of an oldest-first sequence.
pub(crate) fn keep_newest(commits: &mut Vec<Commit>, max: Option<usize>) {
    if let Some(max) = max {
        if commits.len() > max {
            commits.drain(..commits.len() - max);
        }
    }
}
