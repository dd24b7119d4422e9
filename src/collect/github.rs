//! Commit and diff fetching via the GitHub REST API (octocrab).

use chrono::{DateTime, Utc};
use octocrab::Octocrab;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::analysis::plan::MAX_COMMITS;
use crate::collect::Commit;
use crate::error::GitHubError;

/// GitHub's maximum page size for the commits endpoint.
const PER_PAGE: u8 = 100;

/// Safety limit to prevent unbounded paging.
const MAX_PAGES: u32 = 100;

/// Author name used when GitHub has neither a login nor a git author name.
const UNKNOWN_AUTHOR: &str = "Unknown";

#[derive(Serialize)]
struct PageParams {
    per_page: u8,
    page: u32,
}

#[derive(Debug, Deserialize)]
struct ListedCommit {
    sha: String,
    #[serde(default)]
    html_url: Option<String>,
    commit: CommitDetails,
    #[serde(default)]
    author: Option<AccountRef>,
    #[serde(default)]
    parents: Vec<IgnoredAny>,
}

#[derive(Debug, Deserialize)]
struct CommitDetails {
    #[serde(default)]
    author: Option<GitSignature>,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct GitSignature {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct AccountRef {
    login: String,
}

#[derive(Debug, Deserialize)]
struct CommitWithFiles {
    #[serde(default)]
    files: Vec<ChangedFile>,
}

#[derive(Debug, Deserialize)]
struct ChangedFile {
    filename: String,
    #[serde(default)]
    patch: Option<String>,
}

/// Collects the commit history of a GitHub repository.
pub struct GitHubCollector {
    client: Octocrab,
    max_commits: Option<usize>,
    diff_limit: usize,
}

impl GitHubCollector {
    /// Build a collector authenticated with a personal access token.
    pub fn new(token: &str) -> Result<Self, GitHubError> {
        let client = Octocrab::builder()
            .personal_token(token.to_string())
            .build()
            .map_err(|e| GitHubError::FetchCommits(Box::new(e)))?;
        Ok(Self::with_client(client))
    }

    /// Use a pre-configured octocrab client.
    ///
    /// This allows dependency injection for testing with mock servers.
    pub fn with_client(client: Octocrab) -> Self {
        Self {
            client,
            max_commits: None,
            diff_limit: MAX_COMMITS,
        }
    }

    /// Only collect the newest `max` commits.
    pub fn with_max_commits(mut self, max: Option<usize>) -> Self {
        self.max_commits = max;
        self
    }

    /// Skip per-commit diff requests once the listing holds `limit` or more
    /// commits. Defaults to the size at which analysis is rejected.
    pub fn with_diff_limit(mut self, limit: usize) -> Self {
        self.diff_limit = limit;
        self
    }

    /// Fetch the repository's commits, oldest first, each with its diff.
    ///
    /// A failed diff fetch leaves that commit's diff empty; a failed listing
    /// aborts the collection. Histories at or above the diff limit are
    /// returned without diffs, and a rate limit stops further diff requests.
    pub async fn fetch_commits(&self, owner: &str, repo: &str) -> Result<Vec<Commit>, GitHubError> {
        let listed = self.list_commits(owner, repo).await?;
        debug!("Listed {} commits for {}/{}", listed.len(), owner, repo);

        let mut fetch_diffs = listed.len() < self.diff_limit;
        if !fetch_diffs {
            info!(
                "{}/{} has {} commits (limit {}), skipping diff requests",
                owner,
                repo,
                listed.len(),
                self.diff_limit
            );
        }

        let mut commits = Vec::with_capacity(listed.len());
        for entry in listed {
            let diff = if !fetch_diffs || entry.parents.is_empty() {
                String::new()
            } else {
                match self.fetch_diff(owner, repo, &entry.sha).await {
                    Ok(diff) => diff,
                    Err(e @ GitHubError::RateLimited { .. }) => {
                        warn!("{}; remaining commits are kept without diffs", e);
                        fetch_diffs = false;
                        String::new()
                    }
                    Err(e) => {
                        warn!("Failed to fetch diff for {}: {}", entry.sha, e);
                        String::new()
                    }
                }
            };
            commits.push(to_commit(entry, diff));
        }

        // GitHub lists newest first.
        commits.reverse();
        Ok(commits)
    }

    async fn list_commits(&self, owner: &str, repo: &str) -> Result<Vec<ListedCommit>, GitHubError> {
        let route = format!("/repos/{owner}/{repo}/commits");
        let mut all = Vec::new();
        let mut page = 1u32;

        loop {
            let params = PageParams {
                per_page: PER_PAGE,
                page,
            };
            let items: Vec<ListedCommit> = self
                .client
                .get(&route, Some(&params))
                .await
                .map_err(|e| classify_error(e, owner, repo))?;

            let count = items.len();
            all.extend(items);

            if let Some(max) = self.max_commits {
                if all.len() >= max {
                    all.truncate(max);
                    break;
                }
            }

            if count < PER_PAGE as usize {
                break;
            }

            page += 1;
            if page > MAX_PAGES {
                warn!(
                    "Reached {}-page safety limit while listing commits for {}/{}",
                    MAX_PAGES, owner, repo
                );
                break;
            }
        }

        Ok(all)
    }

    async fn fetch_diff(&self, owner: &str, repo: &str, sha: &str) -> Result<String, GitHubError> {
        let route = format!("/repos/{owner}/{repo}/commits/{sha}");
        let detail: CommitWithFiles = self
            .client
            .get(&route, None::<&()>)
            .await
            .map_err(|e| classify_error(e, owner, repo))?;
        Ok(render_patch_files(&detail.files))
    }
}

fn to_commit(entry: ListedCommit, diff: String) -> Commit {
    let (git_name, date) = match entry.commit.author {
        Some(sig) => (sig.name, sig.date),
        None => (None, None),
    };

    let author = entry
        .author
        .map(|a| a.login)
        .or(git_name)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());

    let mut commit = Commit::new(
        date.unwrap_or_default(),
        author,
        entry.commit.message,
        diff,
    );
    commit.url = entry.html_url;
    commit
}

/// Render GitHub's per-file patches as a unified diff with `diff --git` headers.
fn render_patch_files(files: &[ChangedFile]) -> String {
    let mut out = String::new();
    for file in files {
        let name = &file.filename;
        out.push_str(&format!("diff --git a/{name} b/{name}\n"));
        out.push_str(&format!("--- a/{name}\n"));
        out.push_str(&format!("+++ b/{name}\n"));
        match &file.patch {
            Some(patch) => {
                out.push_str(patch);
                if !patch.ends_with('\n') {
                    out.push('\n');
                }
            }
            None => out.push_str("(no patch available)\n"),
        }
        out.push('\n');
    }
    out
}

fn classify_error(e: octocrab::Error, owner: &str, repo: &str) -> GitHubError {
    // Check error content using both Display and Debug output
    // to handle different octocrab error formats
    let err_display = e.to_string();
    let err_debug = format!("{:?}", e);

    if err_display.to_lowercase().contains("rate limit")
        || err_debug.to_lowercase().contains("rate limit")
    {
        return GitHubError::RateLimited {
            reset_time: "unknown".to_string(),
        };
    }
    if err_display.contains("Not Found") || err_debug.contains("Not Found") {
        return GitHubError::RepositoryNotFound {
            owner: owner.to_string(),
            repo: repo.to_string(),
        };
    }
    GitHubError::FetchCommits(Box::new(e))
}

/// Extract owner and repo from `owner/repo`, an SSH remote, or an HTTPS URL.
pub fn parse_github_repository(target: &str) -> Result<(String, String), GitHubError> {
    let invalid = || GitHubError::InvalidRepository(target.to_string());
    let target = target.trim();

    let path = if let Some(path) = target.strip_prefix("git@github.com:") {
        path
    } else if target.contains("github.com/") {
        target.split("github.com/").nth(1).ok_or_else(invalid)?
    } else if target.contains("://") || target.contains('@') {
        return Err(invalid());
    } else {
        target
    };

    let path = path.trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let mut parts = path.split('/');

    match (parts.next(), parts.next()) {
        (Some(owner), Some(repo)) if !owner.is_empty() && !repo.is_empty() => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_owner_repo_shorthand() {
        let (owner, repo) = parse_github_repository("rust-lang/cargo").unwrap();
        assert_eq!(owner, "rust-lang");
        assert_eq!(repo, "cargo");
    }

    #[test]
    fn test_parse_ssh_url() {
        let (owner, repo) = parse_github_repository("git@github.com:owner/repo.git").unwrap();
        assert_eq!(owner, "owner");
        assert_eq!(repo, "repo");
    }

    #[test]
    fn test_parse_https_url() {
        let (owner, repo) = parse_github_repository("https://github.com/owner/repo.git").unwrap();
        assert_eq!(owner, "owner");
        assert_eq!(repo, "repo");
    }

    #[test]
    fn test_parse_https_url_with_trailing_path() {
        let (owner, repo) =
            parse_github_repository("https://github.com/owner/repo/tree/main").unwrap();
        assert_eq!(owner, "owner");
        assert_eq!(repo, "repo");
    }

    #[test]
    fn test_parse_invalid_targets() {
        assert!(parse_github_repository("https://gitlab.com/owner/repo").is_err());
        assert!(parse_github_repository("just-a-name").is_err());
        assert!(parse_github_repository("/repo").is_err());
    }

    #[test]
    fn test_render_patch_files_emits_git_headers() {
        let files = vec![
            ChangedFile {
                filename: "src/lib.rs".to_string(),
                patch: Some("@@ -1 +1 @@\n-a\n+b".to_string()),
            },
            ChangedFile {
                filename: "logo.png".to_string(),
                patch: None,
            },
        ];
        let diff = render_patch_files(&files);
        assert!(diff.starts_with("diff --git a/src/lib.rs b/src/lib.rs\n--- a/src/lib.rs\n+++ b/src/lib.rs\n@@ -1 +1 @@\n-a\n+b\n"));
        assert!(diff.contains("diff --git a/logo.png b/logo.png\n"));
        assert!(diff.contains("(no patch available)\n"));
    }

    #[test]
    fn test_to_commit_prefers_login_over_git_name() {
        let entry: ListedCommit = serde_json::from_value(serde_json::json!({
            "sha": "abc",
            "html_url": "https://github.com/o/r/commit/abc",
            "commit": {
                "author": {"name": "Jane Doe", "date": "2024-03-01T12:00:00Z"},
                "message": "feat: init"
            },
            "author": {"login": "jdoe"},
            "parents": []
        }))
        .unwrap();

        let commit = to_commit(entry, String::new());
        assert_eq!(commit.author, "jdoe");
        assert_eq!(commit.timestamp.to_rfc3339(), "2024-03-01T12:00:00+00:00");
        assert_eq!(commit.url.as_deref(), Some("https://github.com/o/r/commit/abc"));
    }

    #[test]
    fn test_to_commit_falls_back_to_unknown_author() {
        let entry: ListedCommit = serde_json::from_value(serde_json::json!({
            "sha": "abc",
            "commit": {"author": null, "message": "chore"},
            "author": null
        }))
        .unwrap();

        let commit = to_commit(entry, String::new());
        assert_eq!(commit.author, UNKNOWN_AUTHOR);
    }
}
