//! PDF text extraction via poppler's CLI tools.
//!
//! Paragraph mode reads positioned text blocks from `pdftotext -bbox-layout`
//! and reconstructs paragraphs from vertical gaps between blocks. Page mode
//! extracts each page's text with `pdftotext -f N -l N` and runs it through
//! the page cleaner.

use std::path::Path;
use std::process::Command;

use scraper::{Html, Selector};

use super::cleaner::PageCleaner;
use super::{handle_cmd_output, DocumentError, TextUnit};

/// One positioned text block on a page, in layout units (PDF points).
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TextBlock {
    pub x0: f32,
    pub top: f32,
    pub bottom: f32,
    pub text: String,
}

/// Extract paragraph units from a PDF using layout-based block merging.
pub(crate) fn extract_paragraphs(
    path: &Path,
    gap_threshold: f32,
) -> Result<Vec<TextUnit>, DocumentError> {
    let markup = run_pdftotext_bbox(path)?;
    let pages = parse_bbox_pages(&markup);

    let mut units = Vec::new();
    for blocks in pages {
        for paragraph in merge_blocks(blocks, gap_threshold) {
            units.push(TextUnit::new(units.len() + 1, paragraph));
        }
    }
    Ok(units)
}

/// Extract one unit per page, cleaned of headers/footers and re-wrapped.
///
/// Positions are 1-based page numbers; pages whose cleaned text is empty are
/// skipped, so positions can have holes but always increase.
pub(crate) fn extract_pages(path: &Path) -> Result<Vec<TextUnit>, DocumentError> {
    let page_count = pdf_page_count(path).ok_or_else(|| {
        DocumentError::ExtractionFailed(format!(
            "could not determine page count for {}",
            path.display()
        ))
    })?;

    let cleaner = PageCleaner::new();
    let mut units = Vec::with_capacity(page_count as usize);

    for page_num in 1..=page_count {
        let raw = extract_page_text(path, page_num)?;
        let cleaned = cleaner.clean(&raw);
        if cleaned.is_empty() {
            tracing::debug!("Skipping empty page {} of {}", page_num, path.display());
            continue;
        }
        units.push(TextUnit::with_cleaned(page_num as usize, raw, cleaned));
    }

    Ok(units)
}

/// Merge a page's blocks into paragraphs.
///
/// Blocks are sorted by (top, x) reading order, then accumulated into a
/// running paragraph while the gap between a block's top and the previous
/// block's bottom stays within `gap_threshold`. A larger gap closes the
/// paragraph. Empty blocks are skipped.
pub(crate) fn merge_blocks(mut blocks: Vec<TextBlock>, gap_threshold: f32) -> Vec<String> {
    blocks.sort_by(|a, b| {
        (a.top, a.x0)
            .partial_cmp(&(b.top, b.x0))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut paragraphs = Vec::new();
    let mut paragraph = String::new();
    let mut last_bottom: Option<f32> = None;

    for block in &blocks {
        let text = block.text.trim();
        if text.is_empty() {
            continue;
        }

        match last_bottom {
            Some(bottom) if block.top - bottom > gap_threshold => {
                if !paragraph.is_empty() {
                    paragraphs.push(std::mem::take(&mut paragraph));
                }
                paragraph.push_str(text);
            }
            _ => {
                if !paragraph.is_empty() {
                    paragraph.push(' ');
                }
                paragraph.push_str(text);
            }
        }

        last_bottom = Some(block.bottom);
    }

    if !paragraph.is_empty() {
        paragraphs.push(paragraph);
    }

    paragraphs
}

/// Run `pdftotext -bbox-layout`, which emits XHTML with per-block bounding
/// boxes.
fn run_pdftotext_bbox(path: &Path) -> Result<String, DocumentError> {
    let output = Command::new("pdftotext")
        .args(["-bbox-layout", "-enc", "UTF-8"])
        .arg(path)
        .arg("-") // Output to stdout
        .output();

    handle_cmd_output(
        output,
        "pdftotext (install poppler-utils)",
        "pdftotext -bbox-layout failed",
    )
}

/// Run pdftotext on a single page of a PDF file.
fn extract_page_text(path: &Path, page: u32) -> Result<String, DocumentError> {
    let page_str = page.to_string();
    let output = Command::new("pdftotext")
        .args(["-layout", "-enc", "UTF-8", "-f", &page_str, "-l", &page_str])
        .arg(path)
        .arg("-") // Output to stdout
        .output();

    handle_cmd_output(
        output,
        "pdftotext (install poppler-utils)",
        &format!("pdftotext failed on page {}", page),
    )
}

/// Get the page count of a PDF via pdfinfo.
fn pdf_page_count(path: &Path) -> Option<u32> {
    let output = Command::new("pdfinfo").arg(path).output().ok()?;

    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    for line in stdout.lines() {
        if line.starts_with("Pages:") {
            return line.split_whitespace().nth(1).and_then(|s| s.parse().ok());
        }
    }
    None
}

/// Parse the `-bbox-layout` XHTML into per-page block lists.
///
/// The markup nests `page > flow > block > line > word`, with `xMin`/`yMin`/
/// `xMax`/`yMax` attributes (lowercased by the HTML parser). Words in a line
/// are joined with spaces, lines in a block with newlines.
fn parse_bbox_pages(markup: &str) -> Vec<Vec<TextBlock>> {
    let document = Html::parse_document(markup);
    let page_sel = Selector::parse("page").expect("static selector");
    let block_sel = Selector::parse("block").expect("static selector");
    let line_sel = Selector::parse("line").expect("static selector");
    let word_sel = Selector::parse("word").expect("static selector");

    let mut pages = Vec::new();
    for page in document.select(&page_sel) {
        let mut blocks = Vec::new();
        for block in page.select(&block_sel) {
            let (Some(x0), Some(top), Some(bottom)) = (
                attr_f32(&block, "xmin"),
                attr_f32(&block, "ymin"),
                attr_f32(&block, "ymax"),
            ) else {
                continue;
            };

            let text = block
                .select(&line_sel)
                .map(|line| {
                    line.select(&word_sel)
                        .map(|w| w.text().collect::<String>())
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .collect::<Vec<_>>()
                .join("\n");

            blocks.push(TextBlock {
                x0,
                top,
                bottom,
                text,
            });
        }
        pages.push(blocks);
    }
    pages
}

fn attr_f32(element: &scraper::ElementRef<'_>, name: &str) -> Option<f32> {
    element.value().attr(name).and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(top: f32, bottom: f32, text: &str) -> TextBlock {
        TextBlock {
            x0: 72.0,
            top,
            bottom,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_merge_within_gap() {
        let blocks = vec![
            block(100.0, 120.0, "The county shall"),
            block(125.0, 145.0, "maintain defensible space."),
        ];
        let paragraphs = merge_blocks(blocks, 20.0);
        assert_eq!(
            paragraphs,
            vec!["The county shall maintain defensible space."]
        );
    }

    #[test]
    fn test_gap_over_threshold_splits() {
        let blocks = vec![
            block(100.0, 120.0, "Policy 6.2: Reduce wildfire risk."),
            block(180.0, 200.0, "Policy 6.3: Require defensible space."),
        ];
        let paragraphs = merge_blocks(blocks, 20.0);
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[0], "Policy 6.2: Reduce wildfire risk.");
        assert_eq!(paragraphs[1], "Policy 6.3: Require defensible space.");
    }

    #[test]
    fn test_blocks_sorted_by_position_before_merge() {
        // Out of order input; sort is by (top, x).
        let blocks = vec![
            block(180.0, 200.0, "second"),
            block(100.0, 120.0, "first"),
        ];
        let paragraphs = merge_blocks(blocks, 20.0);
        assert_eq!(paragraphs, vec!["first", "second"]);
    }

    #[test]
    fn test_empty_blocks_skipped() {
        let blocks = vec![
            block(100.0, 120.0, "  "),
            block(125.0, 145.0, "text"),
        ];
        assert_eq!(merge_blocks(blocks, 20.0), vec!["text"]);
    }

    #[test]
    fn test_merge_is_idempotent_at_same_threshold() {
        // Re-merging each produced paragraph as a single block cannot split
        // it again at the same threshold.
        let blocks = vec![
            block(100.0, 120.0, "a"),
            block(125.0, 145.0, "b"),
            block(200.0, 220.0, "c"),
        ];
        let first = merge_blocks(blocks, 20.0);
        for (i, paragraph) in first.iter().enumerate() {
            let again = merge_blocks(
                vec![block(100.0, 120.0, paragraph)],
                20.0,
            );
            assert_eq!(again, vec![first[i].clone()]);
        }
    }

    #[test]
    fn test_parse_bbox_markup() {
        let markup = r#"<?xml version="1.0"?>
<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Strict//EN">
<html xmlns="http://www.w3.org/1999/xhtml">
<body>
<doc>
<page width="612" height="792">
  <flow>
    <block xMin="72.0" yMin="100.5" xMax="540.0" yMax="120.25">
      <line xMin="72.0" yMin="100.5" xMax="540.0" yMax="110.0">
        <word xMin="72.0" yMin="100.5" xMax="110.0" yMax="110.0">Policy</word>
        <word xMin="115.0" yMin="100.5" xMax="140.0" yMax="110.0">6.2:</word>
      </line>
      <line xMin="72.0" yMin="111.0" xMax="540.0" yMax="120.25">
        <word xMin="72.0" yMin="111.0" xMax="160.0" yMax="120.25">Reduce</word>
        <word xMin="165.0" yMin="111.0" xMax="200.0" yMax="120.25">risk.</word>
      </line>
    </block>
  </flow>
</page>
</doc>
</body>
</html>"#;

        let pages = parse_bbox_pages(markup);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].len(), 1);
        let block = &pages[0][0];
        assert_eq!(block.text, "Policy 6.2:\nReduce risk.");
        assert!((block.top - 100.5).abs() < f32::EPSILON);
        assert!((block.bottom - 120.25).abs() < f32::EPSILON);
    }
}
