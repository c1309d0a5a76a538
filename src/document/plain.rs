//! Plain-text paragraph splitting.

use super::TextUnit;

/// Split UTF-8 text on blank-line separators into non-empty paragraph
/// units with sequential 1-based positions.
pub(crate) fn split_paragraphs(content: &str) -> Vec<TextUnit> {
    let normalized = content.replace("\r\n", "\n");
    normalized
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .enumerate()
        .map(|(i, p)| TextUnit::new(i + 1, p.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_on_blank_lines() {
        let units = split_paragraphs("Policy 6.2: Reduce wildfire risk.\n\nPolicy 6.3: Require defensible space.");
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].position, 1);
        assert_eq!(units[1].position, 2);
        assert_eq!(units[1].text(), "Policy 6.3: Require defensible space.");
    }

    #[test]
    fn test_non_whitespace_input_yields_units() {
        assert_eq!(split_paragraphs("x").len(), 1);
        assert!(split_paragraphs("  \n\n \n").is_empty());
    }

    #[test]
    fn test_crlf_and_extra_blank_lines() {
        let units = split_paragraphs("one\r\n\r\ntwo\n\n\n\nthree");
        let texts: Vec<_> = units.iter().map(|u| u.text()).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
    }
}
