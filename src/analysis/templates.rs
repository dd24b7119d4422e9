//! Prompt templates for the summarization stages.
//!
//! Each template holds exactly one placeholder, `{input}` or `{commits}`,
//! which is replaced by the rendered commit block or by labeled prior
//! summaries.

use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use tracing::debug;

use crate::error::TemplateError;

const PLACEHOLDERS: [&str; 2] = ["{input}", "{commits}"];

/// Identifies one of the three summarization templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateId {
    ChunkSummary,
    ChunkCombine,
    FinalSummary,
}

impl TemplateId {
    pub const ALL: [TemplateId; 3] = [
        TemplateId::ChunkSummary,
        TemplateId::ChunkCombine,
        TemplateId::FinalSummary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateId::ChunkSummary => "chunk-summary",
            TemplateId::ChunkCombine => "chunk-combine",
            TemplateId::FinalSummary => "final-summary",
        }
    }

    /// File name looked up by [`PromptTemplates::load_dir`].
    pub fn file_name(&self) -> String {
        format!("{}.md", self.as_str())
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated template with a single placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    id: TemplateId,
    text: String,
    placeholder: &'static str,
}

impl PromptTemplate {
    pub fn new(id: TemplateId, text: impl Into<String>) -> Result<Self, TemplateError> {
        let text = text.into();
        let found: Vec<&'static str> = PLACEHOLDERS
            .iter()
            .flat_map(|p| std::iter::repeat_n(*p, text.matches(p).count()))
            .collect();

        match found.as_slice() {
            [placeholder] => Ok(Self {
                id,
                text,
                placeholder: *placeholder,
            }),
            _ => Err(TemplateError::Placeholder {
                id: id.as_str(),
                found: found.len(),
            }),
        }
    }

    pub fn id(&self) -> TemplateId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Substitute the placeholder with `input`.
    pub fn render(&self, input: &str) -> String {
        self.text.replacen(self.placeholder, input, 1)
    }
}

/// The full template set, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplates {
    pub chunk_summary: PromptTemplate,
    pub chunk_combine: PromptTemplate,
    pub final_summary: PromptTemplate,
}

static BUILTIN: LazyLock<PromptTemplates> = LazyLock::new(|| PromptTemplates {
    chunk_summary: builtin(TemplateId::ChunkSummary, CHUNK_SUMMARY, "{commits}"),
    chunk_combine: builtin(TemplateId::ChunkCombine, CHUNK_COMBINE, "{input}"),
    final_summary: builtin(TemplateId::FinalSummary, FINAL_SUMMARY, "{input}"),
});

fn builtin(id: TemplateId, text: &str, placeholder: &'static str) -> PromptTemplate {
    PromptTemplate {
        id,
        text: text.to_string(),
        placeholder,
    }
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self::builtin().clone()
    }
}

impl PromptTemplates {
    /// The built-in templates, created once per process.
    pub fn builtin() -> &'static PromptTemplates {
        &BUILTIN
    }

    pub fn get(&self, id: TemplateId) -> &PromptTemplate {
        match id {
            TemplateId::ChunkSummary => &self.chunk_summary,
            TemplateId::ChunkCombine => &self.chunk_combine,
            TemplateId::FinalSummary => &self.final_summary,
        }
    }

    /// Load overrides from `dir`.
    ///
    /// Recognizes `chunk-summary.md`, `chunk-combine.md` and
    /// `final-summary.md`; missing files keep the built-in template.
    pub fn load_dir(dir: &Path) -> Result<Self, TemplateError> {
        let mut templates = Self::default();

        for id in TemplateId::ALL {
            let path = dir.join(id.file_name());
            if !path.is_file() {
                continue;
            }
            let text = std::fs::read_to_string(&path)
                .map_err(|source| TemplateError::ReadFailed { path: path.clone(), source })?;
            debug!("Loaded {} template from {}", id, path.display());

            let template = PromptTemplate::new(id, text)?;
            match id {
                TemplateId::ChunkSummary => templates.chunk_summary = template,
                TemplateId::ChunkCombine => templates.chunk_combine = template,
                TemplateId::FinalSummary => templates.final_summary = template,
            }
        }

        Ok(templates)
    }
}

const CHUNK_SUMMARY: &str = r#"Analyze the high-level evolution of this repository segment based on commit evidence.

Format output using Markdown:
- **Bold** for major project direction changes
- *Italics* for emerging priorities
- ### Headings for distinct phases
- Bullet points for related observations

Required Analysis Sections:

### Project Focus
Document with commit evidence:
- Primary development priorities
- Shifts in project scope or direction
- Feature priority changes
- User-facing vs. technical improvements

### Development Priorities
Identify with specific commits:
- Balance between new features and maintenance
- Focus areas (e.g., performance, user experience, stability)
- Technical investment decisions

### Project Evolution
Track with commit references:
- Changes in project goals
- Response to challenges or requirements
- Strategic technical decisions

Base all observations on commit evidence. Each insight must reference specific commits that demonstrate the pattern or change in direction.

### Commit History:
{commits}

### Strategic Analysis:
Provide a fact-based analysis of how this project segment evolved at a strategic level, supported by specific commit evidence.
"#;

const CHUNK_COMBINE: &str = r#"Synthesize two consecutive development periods into one account of project-level evolution.

Format Requirements:
- ### For distinct project phases
- **Bold** for strategic shifts
- *Italics* for emerging priorities
- Commit references for evidence

Analyze these aspects:

### Strategic Direction
Document with evidence:
- Evolution of project goals
- Changes in development priorities
- Major strategic decisions

### Project Priorities
Track with commit references:
- Quality vs. speed trade-offs
- Technical investment decisions
- User-facing vs. infrastructure focus

### Development Philosophy
Identify with specific commits:
- Changes in approach to problems
- Evolution of project standards
- Response to user needs

Connect observations to show how project priorities and focus evolved over time.

### Input:
{input}

### Strategic Analysis:
Present a fact-based analysis of how project goals and priorities evolved across these periods, supported by commit evidence.
"#;

const FINAL_SUMMARY: &str = r#"Provide a comprehensive analysis of this repository's strategic evolution based on its commit history.

Format Requirements:
- ### For major project phases
- **Bold** for strategic changes
- *Italics* for priority shifts
- Commit citations for evidence

Required Analysis Sections:

### Project Evolution Overview
Document with commit evidence:
- Initial project direction
- Major strategic shifts
- Changes in project scope

### Strategic Focus
Track with specific commits:
- Changes in project goals
- Evolution of quality standards

### Development Priorities
Identify with concrete examples:
- Balance of feature vs. maintenance work
- Technical investment decisions
- Quality and stability focus

### Project Direction
Document with evidence:
- Long-term strategy changes
- Shifts in development philosophy

ANALYSIS REQUIREMENTS:
- Cite specific commits for each strategic observation
- Document clear shifts in project direction
- Maintain factual, evidence-based analysis

### Input:
{input}

### Strategic Evolution Analysis:
Present a fact-based analysis of this project's high-level evolution, supported by specific commit references.
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_templates_are_valid() {
        for id in TemplateId::ALL {
            let template = PromptTemplates::builtin().get(id);
            assert_eq!(template.id(), id);
            let reparsed = PromptTemplate::new(id, template.text()).expect("builtin template is invalid");
            assert_eq!(&reparsed, template);
            assert!(template.text().contains("###"), "{id} lost its section headings");
        }
    }

    #[test]
    fn test_render_substitutes_placeholder() {
        let template = PromptTemplate::new(TemplateId::ChunkSummary, "Before\n{commits}\nAfter").unwrap();
        assert_eq!(template.render("X"), "Before\nX\nAfter");
    }

    #[test]
    fn test_missing_placeholder_is_rejected() {
        let err = PromptTemplate::new(TemplateId::ChunkCombine, "no slot").unwrap_err();
        assert!(matches!(err, TemplateError::Placeholder { found: 0, .. }));
    }

    #[test]
    fn test_two_placeholders_are_rejected() {
        let err = PromptTemplate::new(TemplateId::ChunkCombine, "{input} and {commits}").unwrap_err();
        assert!(matches!(err, TemplateError::Placeholder { found: 2, .. }));
    }

    #[test]
    fn test_load_dir_overrides_present_files_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("chunk-summary.md"), "Summarize:\n{commits}").unwrap();

        let templates = PromptTemplates::load_dir(dir.path()).unwrap();
        assert_eq!(templates.chunk_summary.render("abc"), "Summarize:\nabc");
        assert_eq!(templates.final_summary, PromptTemplates::builtin().final_summary);
    }

    #[test]
    fn test_load_dir_rejects_invalid_override() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("final-summary.md"), "nothing to fill").unwrap();

        assert!(PromptTemplates::load_dir(dir.path()).is_err());
    }
}
