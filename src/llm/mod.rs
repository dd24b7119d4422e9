//! Text-completion backends.

pub mod claude;
pub mod codex;
pub mod ollama;

use std::fmt;

use async_trait::async_trait;

use crate::error::GenerationError;

pub use claude::ClaudeGenerator;
pub use codex::CodexGenerator;
pub use ollama::OllamaGenerator;

/// A single-shot text-completion call.
///
/// Implementations make exactly one request per `generate` and return the
/// response text unchanged.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Supported completion backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Provider {
    #[default]
    Claude,
    Codex,
    Ollama,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Claude => "Claude",
            Provider::Codex => "Codex",
            Provider::Ollama => "Ollama",
        }
    }

    /// Build the backend for this provider.
    ///
    /// `model` only applies to Ollama.
    pub fn generator(&self, model: &str) -> Result<Box<dyn TextGenerator>, GenerationError> {
        Ok(match self {
            Provider::Claude => Box::new(ClaudeGenerator::new()),
            Provider::Codex => Box::new(CodexGenerator::new()),
            Provider::Ollama => Box::new(OllamaGenerator::from_env(model)?),
        })
    }

    /// Fail early when the backend cannot be reached.
    pub async fn check_available(&self) -> Result<(), GenerationError> {
        match self {
            Provider::Claude => claude::check_claude_installed().await?,
            Provider::Codex => codex::check_codex_installed().await?,
            Provider::Ollama => {}
        }
        Ok(())
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_default_is_claude() {
        assert_eq!(Provider::default(), Provider::Claude);
    }

    #[test]
    fn test_provider_display() {
        assert_eq!(Provider::Ollama.to_string(), "Ollama");
        assert_eq!(Provider::Codex.to_string(), "Codex");
    }

    #[test]
    fn test_ollama_generator_builds_without_network() {
        temp_env::with_var_unset(ollama::BASE_URL_ENV_VAR, || {
            assert!(Provider::Ollama.generator("gemma3:1b").is_ok());
        });
    }
}
