//! Commit-history analysis: complexity scoring plus hierarchical
//! summarization into a narrative.

pub mod complexity;
pub mod engine;
pub mod plan;
pub mod reducer;
pub mod templates;

use serde::Serialize;
use tracing::info;

use crate::collect::Commit;
use crate::error::AnalysisError;
use crate::llm::TextGenerator;

pub use complexity::{ComplexityMetrics, ScoreWeights, diff_file_paths};
pub use engine::{PairLabels, SummaryEngine, SummaryInput, SummaryResult, WordTarget};
pub use plan::{ChunkPlan, Tier, Topology};
pub use reducer::{
    EMPTY_HISTORY_MESSAGE, HierarchicalReducer, LengthPolicy, Reduction, Stage, TOO_LARGE_MESSAGE,
};
pub use templates::{PromptTemplate, PromptTemplates, TemplateId};

/// Result of one analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoAnalysis {
    pub narrative: String,
    pub complexity_score: u8,
    pub metrics: ComplexityMetrics,
}

/// Knobs for [`Analyzer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalysisOptions {
    /// Widen the requested word range with the complexity score.
    pub scale_length_by_complexity: bool,
    pub weights: ScoreWeights,
}

/// Scores and summarizes commit sequences with one completion backend.
pub struct Analyzer<'a, G: ?Sized> {
    generator: &'a G,
    templates: &'a PromptTemplates,
    options: AnalysisOptions,
}

impl<'a, G: TextGenerator + ?Sized> Analyzer<'a, G> {
    pub fn new(generator: &'a G, templates: &'a PromptTemplates) -> Self {
        Self {
            generator,
            templates,
            options: AnalysisOptions::default(),
        }
    }

    pub fn with_options(mut self, options: AnalysisOptions) -> Self {
        self.options = options;
        self
    }

    /// Analyze `commits`, which must be in chronological order.
    pub async fn analyze(&self, commits: &[Commit]) -> Result<RepoAnalysis, AnalysisError> {
        let metrics = ComplexityMetrics::from_commits(commits);
        let complexity_score = self.options.weights.score(&metrics);
        info!(
            complexity_score,
            contributors = metrics.unique_contributors.len(),
            files = metrics.files_modified.len(),
            "Computed complexity"
        );

        let length = if self.options.scale_length_by_complexity {
            LengthPolicy::ScaledBy(complexity_score)
        } else {
            LengthPolicy::Fixed
        };

        let reduction = HierarchicalReducer::new(SummaryEngine::new(self.generator, self.templates))
            .with_length_policy(length)
            .reduce(commits)
            .await?;

        Ok(RepoAnalysis {
            narrative: reduction.narrative,
            complexity_score,
            metrics,
        })
    }
}

/// Analyze `commits` with the built-in templates and default options.
pub async fn analyze<G: TextGenerator + ?Sized>(
    generator: &G,
    commits: &[Commit],
) -> Result<RepoAnalysis, AnalysisError> {
    Analyzer::new(generator, PromptTemplates::builtin())
        .analyze(commits)
        .await
}
