//! Ollama-backed implementation of the policy extraction capability.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{LlmError, PolicyModel};

/// Prompt for open-ended policy extraction over one text unit.
pub const POLICY_EXTRACTION_PROMPT: &str = r#"You are a city planning policy expert.
Extract policies related to wildfire resilience and/or mitigation from this text.
A policy can be a rule, guideline, goal, or program.
Make sure each policy is concise and clearly separated by a new line.
If the policy is preceded by a number or label, please include the label in the extracted policy.
Do not include explanations, summaries, or additional text. If there are no policies, respond with: NONE.

{text}"#;

/// Prompt for label-guided extraction, embedding the labels found on the
/// page.
pub const LABEL_EXTRACTION_PROMPT: &str = r#"You are a city planning policy expert.
The following page contains multiple policies. The policies are introduced
by labels as defined in this list:
{labels}

Please extract each policy preceded by these labels.
Return the label along with the corresponding policy text.
If no matching policies are found, output ONLY: NONE

Page: {text}"#;

/// Configuration for the LLM client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Ollama API endpoint (default: http://localhost:11434)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Model to use for extraction
    #[serde(default = "default_model")]
    pub model: String,
    /// Maximum tokens in response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Temperature for generation (0.0 - 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Custom open-extraction prompt ({text} placeholder)
    #[serde(default)]
    pub policy_prompt: Option<String>,
    /// Custom label-guided prompt ({labels} and {text} placeholders)
    #[serde(default)]
    pub label_prompt: Option<String>,
    /// Maximum characters of unit text to send to the model
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}
fn default_model() -> String {
    "llama3.2:instruct".to_string()
}
fn default_max_tokens() -> u32 {
    2048
}
fn default_temperature() -> f32 {
    0.3
}
fn default_max_content_chars() -> usize {
    12000
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            policy_prompt: None,
            label_prompt: None,
            max_content_chars: default_max_content_chars(),
        }
    }
}

impl LlmConfig {
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Get the open-extraction prompt, custom or default.
    pub fn get_policy_prompt(&self) -> &str {
        self.policy_prompt
            .as_deref()
            .unwrap_or(POLICY_EXTRACTION_PROMPT)
    }

    /// Get the label-guided prompt, custom or default.
    pub fn get_label_prompt(&self) -> &str {
        self.label_prompt
            .as_deref()
            .unwrap_or(LABEL_EXTRACTION_PROMPT)
    }
}

/// LLM client for policy extraction.
pub struct LlmClient {
    config: LlmConfig,
    client: Client,
}

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Ollama API response format.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
    #[allow(dead_code)]
    done: bool,
}

impl LlmClient {
    /// Create a new LLM client with the given configuration.
    pub fn new(config: LlmConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(300)) // 5 min timeout for slow models
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Check if the LLM service is reachable.
    pub async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.config.endpoint);
        match self.client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// Truncate content to configured maximum (UTF-8 safe).
    fn truncate_content<'a>(&self, text: &'a str) -> &'a str {
        if text.len() <= self.config.max_content_chars {
            return text;
        }
        let mut end = self.config.max_content_chars;
        while end > 0 && !text.is_char_boundary(end) {
            end -= 1;
        }
        &text[..end]
    }

    /// Call the Ollama generate API with a prompt.
    async fn call_ollama(&self, prompt: &str) -> Result<String, LlmError> {
        let request = OllamaRequest {
            model: self.config.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
                num_predict: self.config.max_tokens,
            },
        };

        let url = format!("{}/api/generate", self.config.endpoint);
        let resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
        }

        let ollama_resp: OllamaResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        Ok(ollama_resp.response)
    }
}

#[async_trait]
impl PolicyModel for LlmClient {
    async fn extract_policies(&self, text: &str) -> Result<String, LlmError> {
        let prompt = self
            .config
            .get_policy_prompt()
            .replace("{text}", self.truncate_content(text));

        debug!("Querying {} for open policy extraction", self.config.model);
        let response = self.call_ollama(&prompt).await?;
        Ok(response.trim().to_string())
    }

    async fn extract_labeled_policies(
        &self,
        text: &str,
        labels: &[String],
    ) -> Result<String, LlmError> {
        let label_list = labels
            .iter()
            .map(|l| format!("- {}", l))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = self
            .config
            .get_label_prompt()
            .replace("{labels}", &label_list)
            .replace("{text}", self.truncate_content(text));

        debug!(
            "Querying {} for {} label(s)",
            self.config.model,
            labels.len()
        );
        let response = self.call_ollama(&prompt).await?;
        Ok(response.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LlmConfig::default();
        assert!(config.policy_prompt.is_none());
        assert!(config.get_policy_prompt().contains("{text}"));
        assert!(config.get_label_prompt().contains("{labels}"));
        assert_eq!(config.endpoint, "http://localhost:11434");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let config = LlmConfig {
            max_content_chars: 5,
            ..Default::default()
        };
        let client = LlmClient::new(config);
        // 'é' is two bytes; a naive slice at 5 would split it.
        let truncated = client.truncate_content("abcdéf");
        assert!(truncated.len() <= 5);
        assert!("abcdéf".starts_with(truncated));
    }

    #[test]
    fn test_prompt_overrides() {
        let config = LlmConfig {
            policy_prompt: Some("Find policies in: {text}".to_string()),
            ..Default::default()
        };
        assert_eq!(config.get_policy_prompt(), "Find policies in: {text}");
    }
}
