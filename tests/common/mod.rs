//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use git2::{Oid, Repository, Signature, Time};

use evolog::collect::Commit;
use evolog::error::GenerationError;
use evolog::llm::TextGenerator;

/// Build `n` commits one hour apart, messages `commit #0` .. `commit #{n-1}`.
pub fn make_commits(n: usize) -> Vec<Commit> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    (0..n)
        .map(|i| {
            Commit::new(
                start + Duration::hours(i as i64),
                format!("dev{}", i % 4),
                format!("commit #{i}\n\nBody of change {i}."),
                format!("diff --git a/src/file{i}.rs b/src/file{i}.rs\n+line\n"),
            )
        })
        .collect()
}

/// A generator that records every prompt and answers with a tagged echo.
///
/// Responses are `summary[<call index>]`. When `fail_on` is set, any prompt
/// containing it fails with `GenerationError::Unavailable`.
#[derive(Default)]
pub struct RecordingGenerator {
    prompts: Mutex<Vec<String>>,
    fail_on: Option<String>,
}

impl RecordingGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(needle: &str) -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            fail_on: Some(needle.to_string()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for RecordingGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let index = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            prompts.len() - 1
        };
        if let Some(needle) = &self.fail_on {
            if prompt.contains(needle.as_str()) {
                return Err(GenerationError::Unavailable(format!("refused call {index}")));
            }
        }
        Ok(format!("summary[{index}]"))
    }
}

/// A test git repository builder for integration tests.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a new empty git repository in a temp directory.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        Self { dir, repo }
    }

    /// Write `content` to `file` (relative path) and commit it as `author`
    /// at `seconds` since the epoch. Returns the commit OID.
    pub fn commit_file(&self, author: &str, seconds: i64, file: &str, content: &str, message: &str) -> Oid {
        let sig = Signature::new(author, "dev@example.com", &Time::new(seconds, 0))
            .expect("Failed to create signature");

        let full_path = self.dir.path().join(file);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create directories");
        }
        std::fs::write(&full_path, content).expect("Failed to write file");

        let mut index = self.repo.index().expect("Failed to get index");
        index.add_path(Path::new(file)).expect("Failed to add file");
        index.write().expect("Failed to write index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }
}
