//! Fuzzy structural matching of user-supplied policy labels.
//!
//! Planning documents introduce policies with document-specific labels like
//! "Policy 6.2:" or "Goal LOC 2.". A single example label is generalized
//! into a structural pattern: digits may vary, words may vary, but the
//! surrounding whitespace/punctuation skeleton must match exactly. One
//! example therefore finds the whole label family ("Policy 6.3:",
//! "Policy 7.1:", ...).

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use thiserror::Error;

/// Errors from compiling label literals into a matcher.
#[derive(Debug, Error)]
pub enum LabelError {
    #[error("no label patterns supplied")]
    Empty,

    #[error("label pattern failed to compile: {0}")]
    Pattern(#[from] regex::Error),
}

static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+|\s+|[^\w\s]+").unwrap());

/// Compile one label literal into a broad structural pattern.
///
/// Runs of whitespace become `\s+`, digit runs become `[\d.]+`, word runs
/// become `\w+`, and anything else is matched literally. The result always
/// matches the literal itself.
pub fn broad_pattern(label: &str) -> String {
    let mut pattern = String::new();
    for token in TOKEN.find_iter(label) {
        let token = token.as_str();
        if token.chars().all(char::is_whitespace) {
            pattern.push_str(r"\s+");
        } else if token.chars().all(|c| c.is_ascii_digit()) {
            pattern.push_str(r"[\d.]+");
        } else if token.chars().all(|c| c.is_alphanumeric() || c == '_') {
            pattern.push_str(r"\w+");
        } else {
            pattern.push_str(&regex::escape(token));
        }
    }
    pattern
}

/// A compiled, case-insensitive matcher over a set of label literals.
pub struct LabelMatcher {
    pattern: Regex,
}

impl LabelMatcher {
    /// Compile label literals into one alternated matcher.
    pub fn compile<S: AsRef<str>>(labels: &[S]) -> Result<Self, LabelError> {
        let parts: Vec<String> = labels
            .iter()
            .map(|l| l.as_ref().trim())
            .filter(|l| !l.is_empty())
            .map(broad_pattern)
            .collect();

        if parts.is_empty() {
            return Err(LabelError::Empty);
        }

        let pattern = RegexBuilder::new(&parts.join("|"))
            .case_insensitive(true)
            .build()?;

        Ok(Self { pattern })
    }

    /// Scan a text unit for all non-overlapping label occurrences and
    /// return the sorted set of distinct trimmed matches.
    pub fn find_labels(&self, text: &str) -> Vec<String> {
        let found: BTreeSet<String> = self
            .pattern
            .find_iter(text)
            .map(|m| m.as_str().trim().to_string())
            .collect();
        found.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_matches_its_own_literal() {
        for label in ["Policy 6.2:", "Goal LOC 2.", "Action W-1.4"] {
            let matcher = LabelMatcher::compile(&[label]).unwrap();
            assert!(
                !matcher.find_labels(label).is_empty(),
                "pattern from {:?} must match the literal",
                label
            );
        }
    }

    #[test]
    fn test_numeric_suffix_generalizes() {
        let matcher = LabelMatcher::compile(&["Policy 6.2:"]).unwrap();
        let found = matcher.find_labels("Policy 6.3: Require defensible space.");
        assert_eq!(found, vec!["Policy 6.3:"]);
    }

    #[test]
    fn test_word_slots_generalize() {
        let matcher = LabelMatcher::compile(&["Goal LOC 2."]).unwrap();
        let found = matcher.find_labels("See Goal HAZ 14.1 for details");
        assert!(!found.is_empty());
    }

    #[test]
    fn test_no_structural_variant_no_match() {
        let matcher = LabelMatcher::compile(&["Policy 6.2:"]).unwrap();
        // Missing the trailing colon skeleton.
        assert!(matcher
            .find_labels("The plan discusses wildfire mitigation broadly.")
            .is_empty());
    }

    #[test]
    fn test_distinct_sorted_labels() {
        let matcher = LabelMatcher::compile(&["Policy 6.2:"]).unwrap();
        let text = "Policy 6.3: one. Policy 6.2: two. Policy 6.3: again.";
        let found = matcher.find_labels(text);
        assert_eq!(found, vec!["Policy 6.2:", "Policy 6.3:"]);
    }

    #[test]
    fn test_case_insensitive() {
        let matcher = LabelMatcher::compile(&["Policy 6.2:"]).unwrap();
        assert_eq!(matcher.find_labels("POLICY 8.1: x"), vec!["POLICY 8.1:"]);
    }

    #[test]
    fn test_multiple_labels_alternate() {
        let matcher = LabelMatcher::compile(&["Policy 6.2:", "Goal 3."]).unwrap();
        let found = matcher.find_labels("Goal 4. and Policy 9.9: apply here");
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_empty_label_set_is_an_error() {
        let labels: Vec<&str> = vec!["", "   "];
        assert!(matches!(
            LabelMatcher::compile(&labels),
            Err(LabelError::Empty)
        ));
    }
}
