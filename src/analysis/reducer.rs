//! Bottom-up execution of a chunk plan.
//!
//! Sibling calls with no data dependency run concurrently and are joined
//! with `try_join!`: the batch succeeds only if every call does, and the
//! first failure aborts the run.

use std::fmt;

use tracing::{debug, info};

use crate::analysis::engine::{PairLabels, SummaryEngine, SummaryResult, WordTarget};
use crate::analysis::plan::{ChunkPlan, Tier, Topology};
use crate::analysis::templates::TemplateId;
use crate::collect::Commit;
use crate::error::{AnalysisError, GenerationError};
use crate::llm::TextGenerator;

/// Narrative returned when the log is too large to summarize.
pub const TOO_LARGE_MESSAGE: &str =
    "Repository is too large for analysis. Please choose a smaller repository.";

/// Narrative returned when there are no commits.
pub const EMPTY_HISTORY_MESSAGE: &str =
    "No commits found. There is no history to summarize yet.";

/// A completion call site within the reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// The single call of the direct tier.
    Direct,
    /// Summary of chunk `n`.
    Chunk(usize),
    /// Merge of adjacent chunk pair `n` (chunks 2n and 2n+1).
    Pair(usize),
    /// Merge into the final narrative.
    Final,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Direct => f.write_str("direct summary"),
            Stage::Chunk(n) => write!(f, "chunk {} summary", n + 1),
            Stage::Pair(n) => write!(f, "pair {} combine", n + 1),
            Stage::Final => f.write_str("final summary"),
        }
    }
}

/// How the requested word range is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthPolicy {
    /// The tier's range as is.
    #[default]
    Fixed,
    /// Raise the upper bound by up to half, in proportion to a 0..=100 score.
    ScaledBy(u8),
}

impl LengthPolicy {
    pub fn apply(&self, target: WordTarget) -> WordTarget {
        match self {
            LengthPolicy::Fixed => target,
            LengthPolicy::ScaledBy(score) => {
                let score = u32::from((*score).min(100));
                WordTarget {
                    max: target.max + target.max * score / 200,
                    ..target
                }
            }
        }
    }
}

/// The word range requested from the final call of each tier.
pub fn tier_word_target(tier: Tier) -> Option<WordTarget> {
    match tier {
        Tier::Direct => Some(WordTarget::new("concise summary", 0, 200)),
        Tier::TwoWay => Some(WordTarget::new("comprehensive summary", 200, 400)),
        Tier::FourWay => Some(WordTarget::new("detailed analysis", 400, 600)),
        Tier::Rejected => None,
    }
}

/// The narrative plus every summary that led to it.
#[derive(Debug, Clone)]
pub struct Reduction {
    pub tier: Tier,
    pub narrative: String,
    /// Completion results in the order they were issued within each batch.
    pub trace: Vec<SummaryResult>,
}

impl Reduction {
    fn fixed(tier: Tier, message: &str) -> Self {
        Self {
            tier,
            narrative: message.to_string(),
            trace: Vec::new(),
        }
    }
}

/// Drives the summary engine over a chunk plan.
pub struct HierarchicalReducer<'a, G: ?Sized> {
    engine: SummaryEngine<'a, G>,
    length: LengthPolicy,
}

impl<'a, G: TextGenerator + ?Sized> HierarchicalReducer<'a, G> {
    pub fn new(engine: SummaryEngine<'a, G>) -> Self {
        Self {
            engine,
            length: LengthPolicy::Fixed,
        }
    }

    pub fn with_length_policy(mut self, length: LengthPolicy) -> Self {
        self.length = length;
        self
    }

    /// Summarize `commits` into one narrative.
    pub async fn reduce(&self, commits: &[Commit]) -> Result<Reduction, AnalysisError> {
        let plan = ChunkPlan::for_count(commits.len());
        info!(
            commits = commits.len(),
            tier = %plan.tier,
            chunks = ?plan.sizes(),
            "Planned summarization"
        );

        if commits.is_empty() {
            return Ok(Reduction::fixed(plan.tier, EMPTY_HISTORY_MESSAGE));
        }
        self.execute(&plan, commits).await
    }

    /// Run `plan` over `commits`, dispatching on its combine topology.
    pub(crate) async fn execute(
        &self,
        plan: &ChunkPlan,
        commits: &[Commit],
    ) -> Result<Reduction, AnalysisError> {
        let target = tier_word_target(plan.tier).map(|t| self.length.apply(t));
        let chunks = plan.split(commits);

        match (plan.topology(), chunks.as_slice()) {
            (None, _) => Ok(Reduction::fixed(plan.tier, TOO_LARGE_MESSAGE)),
            (Some(Topology::Single), &[all]) => self.direct(plan.tier, all, target).await,
            (Some(Topology::Pairwise), &[first, second]) => {
                self.two_way(plan.tier, first, second, target).await
            }
            (Some(Topology::Tree), &[c0, c1, c2, c3]) => {
                self.four_way(plan.tier, [c0, c1, c2, c3], target).await
            }
            (Some(_), _) => Err(AnalysisError::MalformedPlan {
                tier: plan.tier,
                chunks: chunks.len(),
            }),
        }
    }

    async fn direct(
        &self,
        tier: Tier,
        commits: &[Commit],
        target: Option<WordTarget>,
    ) -> Result<Reduction, AnalysisError> {
        let result = self
            .engine
            .summarize_commits(TemplateId::FinalSummary, commits, target)
            .await
            .map_err(at(Stage::Direct))?;

        Ok(Reduction {
            tier,
            narrative: result.text.clone(),
            trace: vec![result],
        })
    }

    async fn two_way(
        &self,
        tier: Tier,
        first: &[Commit],
        second: &[Commit],
        target: Option<WordTarget>,
    ) -> Result<Reduction, AnalysisError> {
        let (a, b) = tokio::try_join!(self.chunk(0, first), self.chunk(1, second))?;
        debug!("Both halves summarized");

        let merged = self
            .engine
            .combine(
                TemplateId::FinalSummary,
                PairLabels::Halves,
                &a.text,
                &b.text,
                target,
            )
            .await
            .map_err(at(Stage::Final))?;

        Ok(Reduction {
            tier,
            narrative: merged.text.clone(),
            trace: vec![a, b, merged],
        })
    }

    async fn four_way(
        &self,
        tier: Tier,
        chunks: [&[Commit]; 4],
        target: Option<WordTarget>,
    ) -> Result<Reduction, AnalysisError> {
        let (s0, s1, s2, s3) = tokio::try_join!(
            self.chunk(0, chunks[0]),
            self.chunk(1, chunks[1]),
            self.chunk(2, chunks[2]),
            self.chunk(3, chunks[3]),
        )?;
        debug!("All four chunks summarized");

        let (left, right) = tokio::try_join!(
            self.pair(0, &s0.text, &s1.text),
            self.pair(1, &s2.text, &s3.text),
        )?;
        debug!("Both pairs combined");

        let merged = self
            .engine
            .combine(
                TemplateId::FinalSummary,
                PairLabels::Halves,
                &left.text,
                &right.text,
                target,
            )
            .await
            .map_err(at(Stage::Final))?;

        Ok(Reduction {
            tier,
            narrative: merged.text.clone(),
            trace: vec![s0, s1, s2, s3, left, right, merged],
        })
    }

    async fn chunk(&self, index: usize, commits: &[Commit]) -> Result<SummaryResult, AnalysisError> {
        self.engine
            .summarize_commits(TemplateId::ChunkSummary, commits, None)
            .await
            .map_err(at(Stage::Chunk(index)))
    }

    async fn pair(
        &self,
        index: usize,
        first: &str,
        second: &str,
    ) -> Result<SummaryResult, AnalysisError> {
        self.engine
            .combine(
                TemplateId::ChunkCombine,
                PairLabels::Lettered,
                first,
                second,
                None,
            )
            .await
            .map_err(at(Stage::Pair(index)))
    }
}

fn at(stage: Stage) -> impl FnOnce(GenerationError) -> AnalysisError {
    move |source| AnalysisError::Generation { stage, source }
}
