//! DOCX paragraph extraction.
//!
//! A DOCX file is a ZIP package; the document body lives in
//! `word/document.xml` as WordprocessingML. We only need paragraph
//! boundaries (`<w:p>`) and their text runs (`<w:t>`), which are regular
//! enough to pull out without a full XML parser.

use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::{DocumentError, TextUnit};

static PARAGRAPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<w:p[ >].*?</w:p>").unwrap());
static TEXT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<w:t(?:\s[^>]*)?>(.*?)</w:t>").unwrap());

/// Extract one unit per non-empty paragraph element, in document order.
pub(crate) fn extract_paragraphs(path: &Path) -> Result<Vec<TextUnit>, DocumentError> {
    let file = std::fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| DocumentError::InvalidDocx(e.to_string()))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| DocumentError::InvalidDocx(format!("missing word/document.xml: {}", e)))?
        .read_to_string(&mut xml)?;

    Ok(paragraphs_from_xml(&xml))
}

fn paragraphs_from_xml(xml: &str) -> Vec<TextUnit> {
    let mut units = Vec::new();
    for paragraph in PARAGRAPH.find_iter(xml) {
        let mut text = String::new();
        for run in TEXT_RUN.captures_iter(paragraph.as_str()) {
            text.push_str(&unescape_xml(&run[1]));
        }
        let text = text.trim();
        if !text.is_empty() {
            units.push(TextUnit::new(units.len() + 1, text.to_string()));
        }
    }
    units
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraphs_in_document_order() {
        let xml = r#"<w:document><w:body>
            <w:p w:rsidR="00"><w:r><w:t>Policy 6.2: Reduce risk.</w:t></w:r></w:p>
            <w:p><w:r><w:t xml:space="preserve">Require </w:t></w:r><w:r><w:t>defensible space.</w:t></w:r></w:p>
        </w:body></w:document>"#;

        let units = paragraphs_from_xml(xml);
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].position, 1);
        assert_eq!(units[0].text(), "Policy 6.2: Reduce risk.");
        assert_eq!(units[1].text(), "Require defensible space.");
    }

    #[test]
    fn test_empty_paragraphs_dropped() {
        let xml = r#"<w:body>
            <w:p><w:pPr></w:pPr></w:p>
            <w:p><w:r><w:t>  </w:t></w:r></w:p>
            <w:p><w:r><w:t>kept</w:t></w:r></w:p>
        </w:body>"#;

        let units = paragraphs_from_xml(xml);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].text(), "kept");
        assert_eq!(units[0].position, 1);
    }

    #[test]
    fn test_entities_unescaped() {
        let xml = r#"<w:p><w:r><w:t>Smith &amp; Jones &lt;LLC&gt;</w:t></w:r></w:p>"#;
        let units = paragraphs_from_xml(xml);
        assert_eq!(units[0].text(), "Smith & Jones <LLC>");
    }
}
