//! GitHub authentication detection.
//!
//! Auth order:
//! 1. Check `gh auth status` (gh CLI)
//! 2. Fall back to GITHUB_TOKEN env var
//! 3. Fall back to GH_TOKEN env var

use std::env;
use std::process::Command;

use crate::error::GitHubError;

/// Get a GitHub token using the configured auth strategy.
pub fn get_github_token() -> Result<String, GitHubError> {
    if let Some(token) = get_token_from_gh_cli() {
        return Ok(token);
    }

    get_token_from_env().ok_or(GitHubError::AuthenticationFailed)
}

/// Read a token from GITHUB_TOKEN, then GH_TOKEN. Empty values are ignored.
pub fn get_token_from_env() -> Option<String> {
    ["GITHUB_TOKEN", "GH_TOKEN"]
        .iter()
        .filter_map(|name| env::var(name).ok())
        .map(|token| token.trim().to_string())
        .find(|token| !token.is_empty())
}

/// Try to get a token from the gh CLI.
fn get_token_from_gh_cli() -> Option<String> {
    which::which("gh").ok()?;

    let status = Command::new("gh").args(["auth", "status"]).output().ok()?;
    if !status.status.success() {
        return None;
    }

    let output = Command::new("gh").args(["auth", "token"]).output().ok()?;
    if output.status.success() {
        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !token.is_empty() {
            return Some(token);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_github_token_takes_precedence() {
        temp_env::with_vars(
            [("GITHUB_TOKEN", Some("primary")), ("GH_TOKEN", Some("secondary"))],
            || {
                assert_eq!(get_token_from_env().as_deref(), Some("primary"));
            },
        );
    }

    #[test]
    fn test_gh_token_fallback() {
        temp_env::with_vars(
            [("GITHUB_TOKEN", None), ("GH_TOKEN", Some("secondary"))],
            || {
                assert_eq!(get_token_from_env().as_deref(), Some("secondary"));
            },
        );
    }

    #[test]
    fn test_empty_token_is_ignored() {
        temp_env::with_vars(
            [("GITHUB_TOKEN", Some("  ")), ("GH_TOKEN", None::<&str>)],
            || {
                assert_eq!(get_token_from_env(), None);
            },
        );
    }
}
