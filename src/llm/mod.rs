//! LLM query capability for policy extraction.
//!
//! The pipeline treats the model as an external collaborator with the
//! contract "submit text plus instructions, receive text or an error".
//! [`PolicyModel`] is that seam; [`LlmClient`] is the production
//! implementation speaking the Ollama API.

mod client;

use async_trait::async_trait;
use thiserror::Error;

pub use client::{LlmClient, LlmConfig, LABEL_EXTRACTION_PROMPT, POLICY_EXTRACTION_PROMPT};

/// Sentinel the prompts instruct the model to return when a unit contains
/// no policies.
pub const NO_POLICY_SENTINEL: &str = "NONE";

/// Check a trimmed response against the no-policy sentinel
/// (case-insensitive exact match).
pub fn is_no_policy(response: &str) -> bool {
    response.trim().eq_ignore_ascii_case(NO_POLICY_SENTINEL)
}

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// External extraction capability invoked once per text unit.
#[async_trait]
pub trait PolicyModel: Send + Sync {
    /// Open-ended policy extraction over one unit's text.
    async fn extract_policies(&self, text: &str) -> Result<String, LlmError>;

    /// Label-guided extraction, embedding the labels discovered in the unit.
    async fn extract_labeled_policies(
        &self,
        text: &str,
        labels: &[String],
    ) -> Result<String, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_policy_sentinel() {
        assert!(is_no_policy("NONE"));
        assert!(is_no_policy("none"));
        assert!(is_no_policy("  None \n"));
        assert!(!is_no_policy("NONE."));
        assert!(!is_no_policy("No policies found"));
    }
}
