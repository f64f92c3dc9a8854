//! Built-in decoder for plain-text and lightweight-markup flow documents.
//!
//! Paragraphs are separated by blank lines; `#`-prefixed lines become
//! headings, `---` lines become horizontal rules, and runs of `|`-prefixed
//! lines become tables. Enough structure to drive the pipeline end-to-end
//! without an external format library.

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use super::FlowDecoder;
use crate::error::{Error, Result};
use crate::model::{FlowDocument, Paragraph, Table, TableRow};

/// Decoder for `.txt` and `.md` flow documents.
pub struct TextDecoder {
    heading_re: Regex,
    rule_re: Regex,
    table_line_re: Regex,
}

impl TextDecoder {
    /// Create a new text decoder.
    pub fn new() -> Self {
        Self {
            heading_re: Regex::new(r"^(#{1,6})\s+(.*)$").unwrap(),
            rule_re: Regex::new(r"^\s*(-{3,}|\*{3,})\s*$").unwrap(),
            table_line_re: Regex::new(r"^\s*\|").unwrap(),
        }
    }

    fn parse_block(&self, chunk: &str, doc: &mut FlowDocument) {
        let trimmed = chunk.trim();
        if trimmed.is_empty() {
            return;
        }

        if self.rule_re.is_match(trimmed) {
            doc.add_block(crate::model::Block::HorizontalRule);
            return;
        }

        if let Some(caps) = self.heading_re.captures(trimmed) {
            let level = caps[1].len() as u8;
            doc.add_paragraph(Paragraph::heading(caps[2].trim(), level));
            return;
        }

        if trimmed.lines().all(|l| self.table_line_re.is_match(l)) {
            let mut table = Table::new();
            for line in trimmed.lines() {
                // Separator rows (| --- | --- |) mark the header boundary.
                let cells: Vec<&str> = line
                    .trim()
                    .trim_matches('|')
                    .split('|')
                    .map(str::trim)
                    .collect();
                if cells.iter().all(|c| c.chars().all(|ch| ch == '-' || ch == ':') && !c.is_empty())
                {
                    table.header_rows = table.rows.len() as u8;
                    continue;
                }
                table.add_row(TableRow::from_text(cells));
            }
            if !table.is_empty() {
                doc.add_table(table);
                return;
            }
        }

        // Body paragraph: single newlines inside a chunk are soft wraps.
        let text: String = trimmed
            .lines()
            .map(str::trim)
            .collect::<Vec<_>>()
            .join(" ")
            .nfc()
            .collect();
        doc.add_paragraph(Paragraph::with_text(text));
    }
}

impl Default for TextDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowDecoder for TextDecoder {
    fn supported_extensions(&self) -> &[&str] {
        &["txt", "md", "markdown"]
    }

    fn name(&self) -> &str {
        "text"
    }

    fn decode(&self, data: &[u8]) -> Result<FlowDocument> {
        let text = std::str::from_utf8(data)
            .map_err(|e| Error::Decode(format!("input is not valid UTF-8: {}", e)))?;

        let mut doc = FlowDocument::new();
        for chunk in text.split("\n\n") {
            self.parse_block(chunk, &mut doc);
        }

        Ok(doc)
    }
}
