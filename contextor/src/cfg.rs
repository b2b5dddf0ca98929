//! Runtime configuration loaded from environment variables.

use std::str::FromStr;
use std::sync::Arc;

use ai_llm_service::LlmServiceProfiles;
use rag_store::RagConfig;

use crate::error::ContextorError;

/// What to do when retrieval yields no chunks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EmptyContextPolicy {
    /// Fail with [`ContextorError::EmptyContext`].
    #[default]
    Error,
    /// Call the model anyway with an explicit "no context" block.
    Proceed,
}

impl FromStr for EmptyContextPolicy {
    type Err = ContextorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "proceed" => Ok(Self::Proceed),
            other => Err(ContextorError::Config(format!(
                "EMPTY_CONTEXT_POLICY must be `error` or `proceed`, got `{other}`"
            ))),
        }
    }
}

/// Config bag for the answer pipeline.
#[derive(Clone, Debug)]
pub struct ContextorConfig {
    pub svc: Arc<LlmServiceProfiles>,
    pub rag: RagConfig,
    pub empty_context: EmptyContextPolicy,
}

impl ContextorConfig {
    pub fn new(svc: Arc<LlmServiceProfiles>, rag: RagConfig) -> Self {
        Self {
            svc,
            rag,
            empty_context: EmptyContextPolicy::default(),
        }
    }

    /// Build from environment variables with defaults.
    ///
    /// Reads the LLM profiles (`OPENAI_*`, `LLM_*`), the RAG settings
    /// (`CORPUS_*`, `RAG_*`, `EMBEDDING_*`) and `EMPTY_CONTEXT_POLICY`.
    ///
    /// # Errors
    /// Returns the first malformed variable as an error.
    pub fn from_env() -> Result<Self, ContextorError> {
        let svc = Arc::new(LlmServiceProfiles::from_env()?);
        let rag = RagConfig::from_env()?;
        let empty_context = match std::env::var("EMPTY_CONTEXT_POLICY") {
            Ok(v) if !v.trim().is_empty() => v.parse()?,
            _ => EmptyContextPolicy::default(),
        };
        Ok(Self {
            svc,
            rag,
            empty_context,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_parses() {
        assert_eq!("Proceed".parse::<EmptyContextPolicy>().unwrap(), EmptyContextPolicy::Proceed);
        assert_eq!("error".parse::<EmptyContextPolicy>().unwrap(), EmptyContextPolicy::Error);
        assert!("ignore".parse::<EmptyContextPolicy>().is_err());
    }
}
