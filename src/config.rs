//! Configuration for the extraction pipeline.
//!
//! All tunables carry serde defaults, so an empty (or absent) config file
//! yields the stock pipeline. Settings load from an optional TOML file;
//! the LLM endpoint can additionally come from `POLEX_LLM_ENDPOINT`.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::ChunkMode;
use crate::llm::LlmConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Tunables for segmentation and scheduling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Vertical gap (PDF layout units) that closes a paragraph.
    #[serde(default = "default_gap_threshold")]
    pub gap_threshold: f32,
    /// Seconds between consecutive external calls (15 queries/minute
    /// ceiling plus margin).
    #[serde(default = "default_query_delay_secs")]
    pub query_delay_secs: f64,
    /// Per-run unit ceiling in paragraph mode (daily-quota estimate).
    #[serde(default = "default_max_paragraph_units")]
    pub max_paragraph_units: usize,
    /// Per-run unit ceiling in page mode.
    #[serde(default = "default_max_page_units")]
    pub max_page_units: usize,
}

fn default_gap_threshold() -> f32 {
    20.0
}
fn default_query_delay_secs() -> f64 {
    4.1
}
fn default_max_paragraph_units() -> usize {
    1500
}
fn default_max_page_units() -> usize {
    1000
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            gap_threshold: default_gap_threshold(),
            query_delay_secs: default_query_delay_secs(),
            max_paragraph_units: default_max_paragraph_units(),
            max_page_units: default_max_page_units(),
        }
    }
}

impl ExtractorConfig {
    pub fn query_delay(&self) -> Duration {
        Duration::from_secs_f64(self.query_delay_secs)
    }

    /// The unit ceiling that applies to a chunking mode.
    pub fn unit_ceiling(&self, mode: ChunkMode) -> usize {
        match mode {
            ChunkMode::Paragraph => self.max_paragraph_units,
            ChunkMode::Page => self.max_page_units,
        }
    }
}

/// Top-level settings: segmentation/scheduling plus the LLM client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub llm: LlmConfig,
}

/// Load settings from a TOML file, or defaults when no path is given.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let mut settings = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => Settings::default(),
    };

    if let Ok(endpoint) = std::env::var("POLEX_LLM_ENDPOINT") {
        settings.llm.endpoint = endpoint;
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExtractorConfig::default();
        assert_eq!(config.gap_threshold, 20.0);
        assert_eq!(config.query_delay_secs, 4.1);
        assert_eq!(config.unit_ceiling(ChunkMode::Paragraph), 1500);
        assert_eq!(config.unit_ceiling(ChunkMode::Page), 1000);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [extractor]
            gap_threshold = 30.0

            [llm]
            model = "llama3.1:8b"
            "#,
        )
        .unwrap();

        assert_eq!(settings.extractor.gap_threshold, 30.0);
        assert_eq!(settings.extractor.max_paragraph_units, 1500);
        assert_eq!(settings.llm.model, "llama3.1:8b");
        assert_eq!(settings.llm.endpoint, "http://localhost:11434");
    }

    #[test]
    fn test_empty_toml_is_valid() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings.extractor.query_delay_secs, 4.1);
    }
}
