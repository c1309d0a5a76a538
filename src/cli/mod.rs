//! CLI commands implementation.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::load_settings;
use crate::document::{self, ChunkMode};
use crate::labels::LabelMatcher;
use crate::llm::LlmClient;
use crate::pipeline::{
    estimated_duration, ExtractionOutcome, ExtractionReport, ProgressSink, Scheduler,
};
use crate::topics::tag_policy_topics;

#[derive(Parser)]
#[command(name = "polex")]
#[command(about = "Planning-document policy extraction pipeline")]
#[command(version)]
pub struct Cli {
    /// Config file path (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Extract policies from a planning document (PDF, DOCX, or TXT)
    Extract {
        /// Document to process
        file: PathBuf,
        /// Chunk PDFs by page instead of by paragraph
        #[arg(long)]
        pages: bool,
        /// Policy label examples for label-guided extraction (implies
        /// page chunking; repeatable)
        #[arg(short, long = "label")]
        labels: Vec<String>,
        /// Write the full report as JSON to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Annotate extracted policies with general-plan topic tags
        #[arg(long)]
        topics: bool,
    },

    /// Check if required external tools are installed
    Tools,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            file,
            pages,
            labels,
            output,
            topics,
        } => extract(cli.config.as_deref(), &file, pages, labels, output, topics).await,
        Commands::Tools => tools(),
    }
}

/// Progress sink backed by an indicatif bar.
struct BarProgress(ProgressBar);

impl ProgressSink for BarProgress {
    fn on_unit(&self, processed: usize, _total: usize) {
        self.0.set_position(processed as u64);
    }
}

async fn extract(
    config_path: Option<&std::path::Path>,
    file: &std::path::Path,
    pages: bool,
    labels: Vec<String>,
    output: Option<PathBuf>,
    topics: bool,
) -> anyhow::Result<()> {
    let settings = load_settings(config_path)?;
    let label_mode = !labels.is_empty();

    // Label-guided extraction works on whole pages, matching how labeled
    // policies span a page's layout.
    let mode = if pages || label_mode {
        ChunkMode::Page
    } else {
        ChunkMode::Paragraph
    };

    let units = document::extract_units(file, mode, settings.extractor.gap_threshold)?;
    if units.is_empty() {
        println!(
            "{}",
            style("No text units found in the document.").yellow()
        );
        return Ok(());
    }

    let delay = settings.extractor.query_delay();
    let estimate = estimated_duration(units.len(), delay);
    println!(
        "Reading {} {}. Estimated processing time: ~{:.1} minutes.",
        units.len(),
        match mode {
            ChunkMode::Paragraph => "paragraphs",
            ChunkMode::Page => "pages",
        },
        estimate.as_secs_f64() / 60.0
    );

    let client = LlmClient::new(settings.llm.clone());
    if !client.is_available().await {
        anyhow::bail!(
            "LLM endpoint {} is not reachable; is the model server running?",
            settings.llm.endpoint
        );
    }

    let progress = ProgressBar::new(units.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} units ({eta})")
            .expect("valid progress template")
            .progress_chars("=>-"),
    );

    let scheduler = Scheduler::new(&client, delay);
    let limit = settings.extractor.unit_ceiling(mode);
    let sink = BarProgress(progress.clone());

    let report = if label_mode {
        let matcher = LabelMatcher::compile(&labels)?;
        scheduler
            .run_with_labels(&units, &matcher, limit, &sink)
            .await?
    } else {
        scheduler.run(&units, limit, &sink).await?
    };

    progress.finish_and_clear();
    print_report(&report, topics);

    if let Some(path) = output {
        std::fs::write(&path, serde_json::to_string_pretty(&report)?)?;
        println!("Report written to {}", path.display());
    }

    Ok(())
}

fn print_report(report: &ExtractionReport, topics: bool) {
    if report.is_empty() {
        println!("{}", style("No policies found in the document.").yellow());
        return;
    }

    for record in &report.records {
        let header = style(format!("[unit {}]", record.position)).cyan();
        match &record.outcome {
            ExtractionOutcome::Extracted(text) => {
                println!("{}", header);
                for line in text.lines().filter(|l| !l.trim().is_empty()) {
                    if topics {
                        let tags = tag_policy_topics(line).join(", ");
                        println!("  {}  {}", line.trim(), style(format!("({})", tags)).dim());
                    } else {
                        println!("  {}", line.trim());
                    }
                }
            }
            ExtractionOutcome::NoPolicies => {
                println!("{} {}", header, style("no policies").dim());
            }
            ExtractionOutcome::Failed(message) => {
                println!("{} {}", header, style(format!("failed: {}", message)).red());
            }
        }
    }

    let extracted = report.policy_lines().len();
    let failed = report
        .records
        .iter()
        .filter(|r| matches!(r.outcome, ExtractionOutcome::Failed(_)))
        .count();

    println!();
    println!(
        "{} {} policy line(s) from {} unit(s){}",
        style("Extracted").green(),
        extracted,
        report.len(),
        if failed > 0 {
            format!(", {} unit(s) failed", failed)
        } else {
            String::new()
        }
    );
}

fn tools() -> anyhow::Result<()> {
    println!("External tool availability:");
    let mut all_found = true;
    for (tool, available) in document::check_tools() {
        let status = if available {
            style("found").green()
        } else {
            all_found = false;
            style("missing").red()
        };
        println!("  {:<12} {}", tool, status);
    }
    if !all_found {
        println!();
        println!("Install poppler-utils to enable PDF extraction.");
    }
    Ok(())
}
