//! Extraction scheduling: the per-unit query loop.
//!
//! Drives one external LLM call per text unit, strictly sequentially (the
//! service's rate limit is global, so concurrency would only trip it),
//! isolates per-unit failures into the result rows, and enforces the
//! per-run unit ceiling before any call is issued.

mod pacer;

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::document::TextUnit;
use crate::labels::LabelMatcher;
use crate::llm::{is_no_policy, PolicyModel};

pub use pacer::QueryPacer;

/// Fatal pipeline errors. Per-unit call failures are not fatal; they are
/// recorded as [`ExtractionOutcome::Failed`] rows instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{units} text units exceed the per-run ceiling of {limit}; split the document")]
    QuotaExceeded { units: usize, limit: usize },
}

/// Outcome of one unit's extraction call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum ExtractionOutcome {
    /// The model returned policy text.
    Extracted(String),
    /// The model answered with the no-policy sentinel.
    NoPolicies,
    /// The call failed; the message is kept so "no policy present" and
    /// "extraction failed here" stay distinguishable in the output.
    Failed(String),
}

/// One processed unit's result row.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionRecord {
    pub position: usize,
    pub unit_text: String,
    pub outcome: ExtractionOutcome,
}

/// Ordered extraction results for one document run. Row order is processing
/// order is document order.
#[derive(Debug, Default, Serialize)]
pub struct ExtractionReport {
    pub records: Vec<ExtractionRecord>,
}

impl ExtractionReport {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Flatten extracted text into individual non-empty policy lines,
    /// dropping no-policy and failed rows.
    pub fn policy_lines(&self) -> Vec<&str> {
        self.records
            .iter()
            .filter_map(|r| match &r.outcome {
                ExtractionOutcome::Extracted(text) => Some(text),
                _ => None,
            })
            .flat_map(|text| text.lines())
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect()
    }
}

/// Progress sink notified after each unit (processed or skipped).
pub trait ProgressSink {
    fn on_unit(&self, processed: usize, total: usize);
}

/// Sink that discards progress updates.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_unit(&self, _processed: usize, _total: usize) {}
}

/// Estimated wall-clock time for a run, from the inter-call pacing alone.
pub fn estimated_duration(unit_count: usize, delay: Duration) -> Duration {
    delay * unit_count as u32
}

/// Sequentially queries the extraction model over a unit sequence.
pub struct Scheduler<'a> {
    model: &'a dyn PolicyModel,
    delay: Duration,
}

impl<'a> Scheduler<'a> {
    pub fn new(model: &'a dyn PolicyModel, delay: Duration) -> Self {
        Self { model, delay }
    }

    /// Run open-ended extraction over every unit. Every unit produces a
    /// record, including no-policy and failed ones.
    pub async fn run(
        &self,
        units: &[TextUnit],
        limit: usize,
        progress: &dyn ProgressSink,
    ) -> Result<ExtractionReport, PipelineError> {
        check_quota(units.len(), limit)?;

        let total = units.len();
        let mut pacer = QueryPacer::new(self.delay);
        let mut report = ExtractionReport::default();

        for (i, unit) in units.iter().enumerate() {
            pacer.acquire().await;
            let outcome = self.query(unit, None).await;
            report.records.push(ExtractionRecord {
                position: unit.position,
                unit_text: unit.text().to_string(),
                outcome,
            });
            progress.on_unit(i + 1, total);
        }

        Ok(report)
    }

    /// Run label-guided extraction. Units where the matcher finds no label
    /// are skipped entirely: no record, no external call, no pacing delay.
    pub async fn run_with_labels(
        &self,
        units: &[TextUnit],
        matcher: &LabelMatcher,
        limit: usize,
        progress: &dyn ProgressSink,
    ) -> Result<ExtractionReport, PipelineError> {
        check_quota(units.len(), limit)?;

        let total = units.len();
        let mut pacer = QueryPacer::new(self.delay);
        let mut report = ExtractionReport::default();

        for (i, unit) in units.iter().enumerate() {
            let labels = matcher.find_labels(unit.text());
            if labels.is_empty() {
                debug!("No policy labels found on unit {}", unit.position);
                progress.on_unit(i + 1, total);
                continue;
            }

            pacer.acquire().await;
            let outcome = self.query(unit, Some(&labels)).await;
            report.records.push(ExtractionRecord {
                position: unit.position,
                unit_text: unit.text().to_string(),
                outcome,
            });
            progress.on_unit(i + 1, total);
        }

        Ok(report)
    }

    async fn query(&self, unit: &TextUnit, labels: Option<&[String]>) -> ExtractionOutcome {
        let result = match labels {
            Some(labels) => {
                self.model
                    .extract_labeled_policies(unit.text(), labels)
                    .await
            }
            None => self.model.extract_policies(unit.text()).await,
        };

        match result {
            Ok(response) => {
                let response = response.trim();
                if is_no_policy(response) {
                    ExtractionOutcome::NoPolicies
                } else {
                    ExtractionOutcome::Extracted(response.to_string())
                }
            }
            Err(e) => {
                warn!("Extraction failed on unit {}: {}", unit.position, e);
                ExtractionOutcome::Failed(e.to_string())
            }
        }
    }
}

fn check_quota(units: usize, limit: usize) -> Result<(), PipelineError> {
    if units > limit {
        return Err(PipelineError::QuotaExceeded { units, limit });
    }
    Ok(())
}
