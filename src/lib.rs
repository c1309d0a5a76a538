//! policyextract - planning-document policy extraction pipeline.
//!
//! Segments municipal planning documents (PDF/DOCX/TXT) into text units,
//! optionally locates caller-supplied policy labels with fuzzy structural
//! matching, and drives a paced, strictly sequential per-unit query loop
//! against an external LLM, aggregating outcomes into an ordered tabular
//! report.

pub mod cli;
pub mod config;
pub mod document;
pub mod labels;
pub mod llm;
pub mod pipeline;
pub mod topics;
