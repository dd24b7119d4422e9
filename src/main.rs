//! evolog - CLI entry point.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use evolog::analysis::{AnalysisOptions, Analyzer, PromptTemplates, RepoAnalysis, Tier};
use evolog::collect::local::open_repository;
use evolog::collect::{
    Commit, GitHubCollector, fetch_local_commits, get_github_token, parse_github_repository,
};
use evolog::llm::{Provider, ollama::DEFAULT_MODEL};

/// Summarize how a repository evolved, from its commit history.
#[derive(Parser, Debug)]
#[command(name = "evolog")]
#[command(about = "Summarize how a repository evolved, from its commit history")]
#[command(version)]
struct Cli {
    /// GitHub repository (owner/repo or URL), or a path with --local
    target: Option<String>,

    /// Read commits from a local git repository instead of GitHub
    #[arg(long)]
    local: bool,

    /// Completion backend
    #[arg(long, value_enum, default_value_t = Provider::Claude)]
    provider: Provider,

    /// Model name (Ollama only)
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Only analyze the newest N commits
    #[arg(long)]
    max_commits: Option<usize>,

    /// Directory with prompt template overrides
    #[arg(long)]
    templates: Option<PathBuf>,

    /// Scale the requested narrative length with the complexity score
    #[arg(long)]
    scale_length: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Step 1: Check prerequisites
    cli.provider
        .check_available()
        .await
        .with_context(|| format!("{} is required", cli.provider))?;

    let generator = cli
        .provider
        .generator(&cli.model)
        .context("Failed to set up completion backend")?;

    let templates = match &cli.templates {
        Some(dir) => PromptTemplates::load_dir(dir)
            .with_context(|| format!("Failed to load templates from {}", dir.display()))?,
        None => PromptTemplates::default(),
    };

    // Step 2: Collect commits
    let commits = collect_commits(&cli).await?;
    status(&cli, &format!("Found {} commits", commits.len()));

    // Step 3: Analyze
    let tier = Tier::for_count(commits.len());
    if tier != Tier::Rejected && !commits.is_empty() {
        status(&cli, &format!("Summarizing with {} ({} plan)...", cli.provider, tier));
    }

    let analysis = Analyzer::new(generator.as_ref(), &templates)
        .with_options(AnalysisOptions {
            scale_length_by_complexity: cli.scale_length,
            ..Default::default()
        })
        .analyze(&commits)
        .await
        .context("Failed to summarize commit history")?;

    // Step 4: Output
    print_analysis(&analysis, cli.format)?;

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("evolog={default_level}"))),
        )
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Progress lines go to stdout only for text output, so JSON stays parseable.
fn status(cli: &Cli, message: &str) {
    if cli.format == OutputFormat::Text {
        println!("{message}");
    }
}

async fn collect_commits(cli: &Cli) -> Result<Vec<Commit>> {
    if cli.local {
        let path = PathBuf::from(cli.target.as_deref().unwrap_or("."));
        let repo = open_repository(&path).with_context(|| {
            format!("Not a git repository: {}", path.display())
        })?;
        status(cli, &format!("Reading commits from {}...", path.display()));
        return fetch_local_commits(&repo, cli.max_commits).context("Failed to read commits");
    }

    let target = cli
        .target
        .as_deref()
        .context("Missing repository. Pass owner/repo, a GitHub URL, or --local <path>.")?;
    let (owner, repo) = parse_github_repository(target)?;

    let token = get_github_token().context("GitHub authentication required")?;
    let collector = GitHubCollector::new(&token)?.with_max_commits(cli.max_commits);

    status(cli, &format!("Fetching commits from {}/{}...", owner, repo));
    collector
        .fetch_commits(&owner, &repo)
        .await
        .with_context(|| format!("Failed to fetch commits for {}/{}", owner, repo))
}

fn print_analysis(analysis: &RepoAnalysis, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(analysis)
                .context("Failed to serialize analysis")?;
            println!("{json}");
        }
        OutputFormat::Text => {
            println!("\n--- Evolution Narrative ---\n");
            println!("{}", analysis.narrative.trim_end());
            println!(
                "\nComplexity score: {}/100 ({} contributors, {} files, {} languages)",
                analysis.complexity_score,
                analysis.metrics.unique_contributors.len(),
                analysis.metrics.files_modified.len(),
                analysis.metrics.languages_used.len()
            );
        }
    }
    Ok(())
}
