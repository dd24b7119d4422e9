//! Complexity metrics derived from commit diffs.
//!
//! The score is an advisory signal used to size the narrative. It never
//! fails: unparsable diff lines are skipped and empty input scores 0.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::collect::Commit;

/// Prefix of the per-file header line in a unified git diff.
const DIFF_HEADER: &str = "diff --git ";

/// Upper bound of the complexity score.
pub const MAX_SCORE: u8 = 100;

/// Structured metrics computed from one commit set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexityMetrics {
    pub total_commits: usize,
    pub unique_contributors: BTreeSet<String>,
    pub files_modified: BTreeSet<String>,
    pub languages_used: BTreeSet<String>,
    pub max_directory_depth: usize,
    pub has_tests: bool,
}

impl ComplexityMetrics {
    /// Compute metrics for a commit sequence.
    pub fn from_commits(commits: &[Commit]) -> Self {
        let mut metrics = Self {
            total_commits: commits.len(),
            ..Default::default()
        };

        for commit in commits {
            metrics.unique_contributors.insert(commit.author.clone());
            for path in diff_file_paths(&commit.diff) {
                metrics.record_path(path);
            }
        }

        metrics
    }

    fn record_path(&mut self, path: &str) {
        let depth = path.split('/').count() - 1;
        self.max_directory_depth = self.max_directory_depth.max(depth);

        if let Some(ext) = file_extension(path) {
            self.languages_used.insert(ext);
        }

        if path.contains("test") || path.contains("spec") {
            self.has_tests = true;
        }

        self.files_modified.insert(path.to_string());
    }
}

/// Weights of the complexity score.
///
/// `Default` gives: commits/10 + contributors*5 + files/5 + languages*3 +
/// depth*2 + 10 when tests were touched, floored and capped at 100.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub commits_divisor: f64,
    pub per_contributor: f64,
    pub files_divisor: f64,
    pub per_language: f64,
    pub per_depth_level: f64,
    pub tests_bonus: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            commits_divisor: 10.0,
            per_contributor: 5.0,
            files_divisor: 5.0,
            per_language: 3.0,
            per_depth_level: 2.0,
            tests_bonus: 10.0,
        }
    }
}

impl ScoreWeights {
    /// Score metrics into `0..=100`.
    pub fn score(&self, metrics: &ComplexityMetrics) -> u8 {
        let raw = metrics.total_commits as f64 / self.commits_divisor
            + metrics.unique_contributors.len() as f64 * self.per_contributor
            + metrics.files_modified.len() as f64 / self.files_divisor
            + metrics.languages_used.len() as f64 * self.per_language
            + metrics.max_directory_depth as f64 * self.per_depth_level
            + if metrics.has_tests { self.tests_bonus } else { 0.0 };

        if raw.is_nan() || raw <= 0.0 {
            return 0;
        }
        raw.floor().min(MAX_SCORE as f64) as u8
    }
}

/// File paths named by the `diff --git` headers of a unified diff.
///
/// The path is the header's first path token with its `a/` prefix removed.
pub fn diff_file_paths(diff: &str) -> impl Iterator<Item = &str> {
    diff.lines()
        .filter_map(|line| line.strip_prefix(DIFF_HEADER))
        .filter_map(|rest| rest.split_whitespace().next())
        .map(|token| token.strip_prefix("a/").unwrap_or(token))
        .filter(|path| !path.is_empty())
}

/// Lowercased extension of the file name, if it has one.
fn file_extension(path: &str) -> Option<String> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let (_, ext) = file_name.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}
