//! Commit collection from a local repository using git2.

use std::path::Path;

use chrono::{TimeZone, Utc};
use git2::{DiffFormat, ErrorCode, Repository, Sort};
use tracing::debug;

use crate::collect::{Commit, keep_newest};
use crate::error::GitError;

/// Open the repository containing `path`.
pub fn open_repository(path: &Path) -> Result<Repository, GitError> {
    Repository::discover(path).map_err(GitError::OpenRepository)
}

/// Fetch every commit reachable from HEAD, oldest first, each with its diff
/// against its first parent.
///
/// Root commits are diffed against the empty tree. A repository with no
/// commits yields an empty list.
pub fn fetch_local_commits(
    repo: &Repository,
    max_commits: Option<usize>,
) -> Result<Vec<Commit>, GitError> {
    let head = match repo.head() {
        Ok(head) => head,
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            return Ok(Vec::new());
        }
        Err(e) => return Err(GitError::HeadNotFound(e)),
    };
    let head_oid = head.target().ok_or_else(|| {
        GitError::HeadNotFound(git2::Error::from_str("HEAD is not a direct reference"))
    })?;

    let mut revwalk = repo.revwalk().map_err(GitError::RevwalkError)?;
    revwalk
        .set_sorting(Sort::TOPOLOGICAL | Sort::TIME | Sort::REVERSE)
        .map_err(GitError::RevwalkError)?;
    revwalk.push(head_oid).map_err(GitError::RevwalkError)?;

    let mut commits = Vec::new();
    for oid_result in revwalk {
        let oid = oid_result.map_err(GitError::RevwalkError)?;
        let commit = repo.find_commit(oid).map_err(GitError::ParseCommit)?;
        commits.push(to_commit(repo, &commit)?);
    }

    keep_newest(&mut commits, max_commits);
    debug!("Collected {} local commits", commits.len());
    Ok(commits)
}

fn to_commit(repo: &Repository, commit: &git2::Commit<'_>) -> Result<Commit, GitError> {
    let author = commit
        .author()
        .name()
        .filter(|name| !name.is_empty())
        .unwrap_or("Unknown")
        .to_string();
    let timestamp = Utc
        .timestamp_opt(commit.time().seconds(), 0)
        .single()
        .unwrap_or_default();
    let message = commit.message().unwrap_or("").to_string();
    let diff = commit_diff_text(repo, commit)?;

    Ok(Commit::new(timestamp, author, message, diff))
}

/// Render the commit's changes against its first parent as unified diff text.
fn commit_diff_text(repo: &Repository, commit: &git2::Commit<'_>) -> Result<String, GitError> {
    let diff_failed = |source: git2::Error| GitError::DiffFailed {
        hash: commit.id().to_string(),
        source,
    };

    let tree = commit.tree().map_err(diff_failed)?;
    let parent_tree = match commit.parent_count() {
        0 => None,
        _ => Some(
            commit
                .parent(0)
                .and_then(|p| p.tree())
                .map_err(diff_failed)?,
        ),
    };

    let diff = repo
        .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)
        .map_err(diff_failed)?;

    let mut text = String::new();
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        // Include the origin character for content lines
        let origin = line.origin();
        if origin == '+' || origin == '-' || origin == ' ' {
            text.push(origin);
        }
        text.push_str(&String::from_utf8_lossy(line.content()));
        true
    })
    .map_err(diff_failed)?;

    Ok(text)
}
