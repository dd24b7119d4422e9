//! Integration tests for collecting commits from a local git repository.

mod common;

use common::{RecordingGenerator, TestRepo};
use evolog::analysis::analyze;
use evolog::collect::fetch_local_commits;
use evolog::collect::local::open_repository;

#[test]
fn test_history_is_collected_oldest_first_with_diffs() {
    let test_repo = TestRepo::new();
    test_repo.commit_file("alice", 1_000, "README.md", "# demo\n", "docs: add readme");
    test_repo.commit_file("bob", 2_000, "src/lib.rs", "pub fn f() {}\n", "feat: add lib");
    test_repo.commit_file("alice", 3_000, "tests/lib_test.rs", "#[test]\nfn t() {}\n", "test: cover lib");

    let commits = fetch_local_commits(&test_repo.repo, None).expect("Failed to fetch commits");

    assert_eq!(commits.len(), 3);
    assert_eq!(commits[0].subject(), "docs: add readme");
    assert_eq!(commits[2].subject(), "test: cover lib");
    assert_eq!(commits[1].author, "bob");
    assert_eq!(commits[0].timestamp.timestamp(), 1_000);

    assert!(commits[0].diff.contains("diff --git a/README.md b/README.md"));
    assert!(commits[1].diff.contains("diff --git a/src/lib.rs b/src/lib.rs"));
    assert!(!commits[1].diff.contains("README.md"), "diff must be against the parent only");
}

#[test]
fn test_open_repository_discovers_from_subdirectory() {
    let test_repo = TestRepo::new();
    test_repo.commit_file("alice", 1_000, "src/main.rs", "fn main() {}\n", "init");

    let repo = open_repository(&test_repo.dir.path().join("src")).expect("Failed to open repo");
    let commits = fetch_local_commits(&repo, None).unwrap();
    assert_eq!(commits.len(), 1);
}

#[test]
fn test_open_repository_outside_git_fails() {
    let dir = tempfile::tempdir().unwrap();
    // tempdir may itself live inside a git checkout; only assert when it doesn't.
    if git2::Repository::discover(dir.path()).is_err() {
        assert!(open_repository(dir.path()).is_err());
    }
}

#[tokio::test]
async fn test_local_history_feeds_analysis() {
    let test_repo = TestRepo::new();
    test_repo.commit_file("alice", 1_000, "src/app/main.rs", "fn main() {}\n", "feat: app");
    test_repo.commit_file("bob", 2_000, "web/index.ts", "export {}\n", "feat: web");
    test_repo.commit_file("carol", 3_000, "tests/app_test.rs", "\n", "test: app");

    let commits = fetch_local_commits(&test_repo.repo, None).unwrap();
    let generator = RecordingGenerator::new();
    let analysis = analyze(&generator, &commits).await.unwrap();

    assert_eq!(generator.calls(), 1);
    assert!(generator.prompts()[0].contains("Commit by carol"));

    let metrics = &analysis.metrics;
    assert_eq!(metrics.unique_contributors.len(), 3);
    assert_eq!(metrics.files_modified.len(), 3);
    assert!(metrics.languages_used.contains("rs"));
    assert!(metrics.languages_used.contains("ts"));
    assert_eq!(metrics.max_directory_depth, 2);
    assert!(metrics.has_tests);
    // 0.3 + 15 + 0.6 + 6 + 4 + 10
    assert_eq!(analysis.complexity_score, 35);
}
