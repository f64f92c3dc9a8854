//! Fixed page and placed elements.

use super::FontId;
use serde::{Deserialize, Serialize};

/// A single output page with absolutely positioned content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedPage {
    /// Page number (1-indexed)
    pub number: u32,

    /// Page width in points
    pub width: f32,

    /// Page height in points
    pub height: f32,

    /// Placed elements in paint order
    pub elements: Vec<PlacedElement>,
}

impl FixedPage {
    /// Create a new empty page.
    pub fn new(number: u32, width: f32, height: f32) -> Self {
        Self {
            number,
            width,
            height,
            elements: Vec::new(),
        }
    }

    /// Add an element to the page.
    pub fn push(&mut self, element: PlacedElement) {
        self.elements.push(element);
    }

    /// Check if the page has no content.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Plain text of the page in paint order.
    pub fn plain_text(&self) -> String {
        self.elements
            .iter()
            .filter_map(|e| match e {
                PlacedElement::Text(line) => Some(line.plain_text()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Ids of image resources referenced on this page, in paint order.
    pub fn image_ids(&self) -> Vec<&str> {
        self.elements
            .iter()
            .filter_map(|e| match e {
                PlacedElement::Image { resource_id, .. } => Some(resource_id.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// An absolutely positioned element on a page.
///
/// Coordinates use the PDF convention: origin at the bottom-left corner,
/// y increasing upward. Text positions are baselines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlacedElement {
    /// One line of text
    Text(TextLine),

    /// An image drawn from the document resource pool
    Image {
        resource_id: String,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },

    /// A horizontal rule
    Rule { x: f32, y: f32, width: f32 },
}

/// A single line of text at a fixed baseline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextLine {
    /// X position of the line start
    pub x: f32,

    /// Baseline y position
    pub y: f32,

    /// Styled segments painted left to right
    pub segments: Vec<TextSegment>,
}

impl TextLine {
    /// Plain text of the line.
    pub fn plain_text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }
}

/// A run of same-styled text within a line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextSegment {
    /// Font pool index
    pub font: FontId,

    /// Font size in points
    pub size: f32,

    /// Text content
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_plain_text() {
        let mut page = FixedPage::new(1, 595.0, 842.0);
        page.push(PlacedElement::Text(TextLine {
            x: 72.0,
            y: 770.0,
            segments: vec![
                TextSegment {
                    font: 0,
                    size: 12.0,
                    text: "Hello ".into(),
                },
                TextSegment {
                    font: 1,
                    size: 12.0,
                    text: "world".into(),
                },
            ],
        }));

        assert_eq!(page.plain_text(), "Hello world");
        assert!(!page.is_empty());
    }

    #[test]
    fn test_image_ids() {
        let mut page = FixedPage::new(1, 595.0, 842.0);
        page.push(PlacedElement::Image {
            resource_id: "img1".into(),
            x: 72.0,
            y: 300.0,
            width: 100.0,
            height: 80.0,
        });

        assert_eq!(page.image_ids(), vec!["img1"]);
    }
}
