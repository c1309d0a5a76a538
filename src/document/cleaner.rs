//! Page text cleanup for page-mode PDF extraction.
//!
//! Planning documents carry running headers, footers, and date lines that
//! would pollute per-page LLM queries, and hard line wraps that break
//! sentences mid-clause. The cleaner drops the former and re-joins the
//! latter.

use regex::Regex;

/// Cleans one page of raw PDF text.
pub struct PageCleaner {
    page_header: Regex,
    year_line: Regex,
    date_line: Regex,
    terminal_punct: Regex,
    horizontal_ws: Regex,
}

impl Default for PageCleaner {
    fn default() -> Self {
        Self::new()
    }
}

impl PageCleaner {
    pub fn new() -> Self {
        Self {
            // "Page 3", "Page II-28", "page A-4"
            page_header: Regex::new(r"(?i)^\s*Page\s+[A-Z]*-?\d+\s*$").expect("static regex"),
            // A lone year, e.g. "2002"
            year_line: Regex::new(r"^\s*\d{4}\s*$").expect("static regex"),
            // Long-form dates, e.g. "June 25, 2002"
            date_line: Regex::new(r"^\s*[A-Za-z]{3,9}\s+\d{1,2},\s*\d{4}\s*$")
                .expect("static regex"),
            terminal_punct: Regex::new(r"[.?!:]$").expect("static regex"),
            horizontal_ws: Regex::new(r"[ \t]+").expect("static regex"),
        }
    }

    /// Clean a single page's text.
    ///
    /// Header/footer/date-only and blank lines are discarded; a line ending
    /// in terminal punctuation keeps its line break, any other adjacent
    /// lines are joined with a space. Runs of horizontal whitespace collapse
    /// to single spaces. Idempotent on already-clean text.
    pub fn clean(&self, page_text: &str) -> String {
        let kept: Vec<&str> = page_text
            .lines()
            .map(str::trim)
            .filter(|line| {
                !line.is_empty()
                    && !self.page_header.is_match(line)
                    && !self.year_line.is_match(line)
                    && !self.date_line.is_match(line)
            })
            .collect();

        let mut merged = String::new();
        for (i, line) in kept.iter().enumerate() {
            merged.push_str(line);
            if i + 1 < kept.len() {
                if self.terminal_punct.is_match(line) {
                    merged.push('\n');
                } else {
                    merged.push(' ');
                }
            }
        }

        self.horizontal_ws
            .replace_all(&merged, " ")
            .trim()
            .to_string()
    }

    /// Clean every page and join them with blank-line separators into one
    /// logical document text.
    pub fn clean_pages<S: AsRef<str>>(&self, pages: &[S]) -> String {
        pages
            .iter()
            .map(|p| self.clean(p.as_ref()))
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
