//! Prompt rendering and single-shot completion calls.

use std::fmt;

use chrono::SecondsFormat;
use tracing::debug;

use crate::analysis::templates::{PromptTemplates, TemplateId};
use crate::collect::Commit;
use crate::error::GenerationError;
use crate::llm::TextGenerator;

/// Requested narrative length, embedded in the prompt as advice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordTarget {
    /// What to ask for, e.g. "concise summary".
    pub kind: &'static str,
    pub min: u32,
    pub max: u32,
}

impl WordTarget {
    pub const fn new(kind: &'static str, min: u32, max: u32) -> Self {
        Self { kind, min, max }
    }

    /// The sentence appended to the prompt.
    pub fn instruction(&self) -> String {
        format!(
            "Provide a {} in {}. Do not ask questions or seek elaboration.",
            self.kind, self
        )
    }
}

impl fmt::Display for WordTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{} words", self.min, self.max)
    }
}

/// Labels used when two summaries are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairLabels {
    /// "First Half" / "Second Half"
    Halves,
    /// "Summary A" / "Summary B"
    Lettered,
}

impl PairLabels {
    pub fn labels(&self) -> (&'static str, &'static str) {
        match self {
            PairLabels::Halves => ("First Half", "Second Half"),
            PairLabels::Lettered => ("Summary A", "Summary B"),
        }
    }
}

/// What a summary was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryInput {
    Commits { count: usize },
    Summaries { labels: PairLabels },
}

/// Output of one completion call, with what produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryResult {
    pub template: TemplateId,
    pub input: SummaryInput,
    pub prompt: String,
    pub text: String,
}

/// Renders prompts and issues exactly one completion call per request.
pub struct SummaryEngine<'a, G: ?Sized> {
    generator: &'a G,
    templates: &'a PromptTemplates,
}

impl<'a, G: TextGenerator + ?Sized> SummaryEngine<'a, G> {
    pub fn new(generator: &'a G, templates: &'a PromptTemplates) -> Self {
        Self {
            generator,
            templates,
        }
    }

    /// Summarize a run of commits with the given template.
    pub async fn summarize_commits(
        &self,
        template: TemplateId,
        commits: &[Commit],
        target: Option<WordTarget>,
    ) -> Result<SummaryResult, GenerationError> {
        let input = render_commits(commits);
        self.complete(
            template,
            &input,
            target,
            SummaryInput::Commits {
                count: commits.len(),
            },
        )
        .await
    }

    /// Merge two prior summaries with the given template.
    pub async fn combine(
        &self,
        template: TemplateId,
        labels: PairLabels,
        first: &str,
        second: &str,
        target: Option<WordTarget>,
    ) -> Result<SummaryResult, GenerationError> {
        let input = render_pair(labels, first, second);
        self.complete(template, &input, target, SummaryInput::Summaries { labels })
            .await
    }

    async fn complete(
        &self,
        template: TemplateId,
        input: &str,
        target: Option<WordTarget>,
        source: SummaryInput,
    ) -> Result<SummaryResult, GenerationError> {
        let prompt = build_prompt(self.templates, template, input, target);
        debug!(
            template = %template,
            prompt_chars = prompt.len(),
            "Sending prompt"
        );

        let text = self.generator.generate(&prompt).await?;
        debug!(template = %template, response_chars = text.len(), "Received summary");

        Ok(SummaryResult {
            template,
            input: source,
            prompt,
            text,
        })
    }
}

/// Render the template with `input`, appending the length instruction if any.
pub fn build_prompt(
    templates: &PromptTemplates,
    template: TemplateId,
    input: &str,
    target: Option<WordTarget>,
) -> String {
    let mut prompt = templates.get(template).render(input);
    if let Some(target) = target {
        prompt.push('\n');
        prompt.push_str(&target.instruction());
    }
    prompt
}

/// Flatten commits into one paragraph each, in order, separated by blank lines.
pub fn render_commits(commits: &[Commit]) -> String {
    commits
        .iter()
        .map(|c| {
            format!(
                "Commit by {} on {}:\n{}\n",
                c.author,
                c.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
                c.message
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Label two summaries for a combine step.
pub fn render_pair(labels: PairLabels, first: &str, second: &str) -> String {
    let (a, b) = labels.labels();
    format!("{a}: {first}\n{b}: {second}")
}
