//! Document-level types.

use super::{Paragraph, Resource, Table};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A decoded flow document: ordered content without page boundaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowDocument {
    /// Document metadata (title, author, etc.)
    pub metadata: Metadata,

    /// Content blocks in document order
    pub blocks: Vec<Block>,

    /// Shared resources (images, embedded fonts) keyed by id
    pub resources: BTreeMap<String, Resource>,
}

impl FlowDocument {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self {
            metadata: Metadata::default(),
            blocks: Vec::new(),
            resources: BTreeMap::new(),
        }
    }

    /// Add a block to the document.
    pub fn add_block(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Add a paragraph to the document.
    pub fn add_paragraph(&mut self, paragraph: Paragraph) {
        self.blocks.push(Block::Paragraph(paragraph));
    }

    /// Add a table to the document.
    pub fn add_table(&mut self, table: Table) {
        self.blocks.push(Block::Table(table));
    }

    /// Add a resource to the document.
    pub fn add_resource(&mut self, id: impl Into<String>, resource: Resource) {
        self.resources.insert(id.into(), resource);
    }

    /// Get a resource by id.
    pub fn get_resource(&self, id: &str) -> Option<&Resource> {
        self.resources.get(id)
    }

    /// Check if the document has any content blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Number of content blocks.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Get plain text content of the entire document.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                Block::Paragraph(p) => Some(p.plain_text()),
                Block::Table(t) => Some(t.plain_text()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl Default for FlowDocument {
    fn default() -> Self {
        Self::new()
    }
}

/// A content block in the flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// A paragraph of text
    Paragraph(Paragraph),

    /// A table
    Table(Table),

    /// An image reference
    Image {
        /// Resource id for the image data
        resource_id: String,
        /// Alternative text
        alt_text: Option<String>,
        /// Display width in points (natural size if absent)
        width: Option<f32>,
        /// Display height in points
        height: Option<f32>,
    },

    /// A horizontal rule / separator
    HorizontalRule,

    /// An explicit page break
    PageBreak,
}

impl Block {
    /// Create an image block.
    pub fn image(resource_id: impl Into<String>) -> Self {
        Block::Image {
            resource_id: resource_id.into(),
            alt_text: None,
            width: None,
            height: None,
        }
    }

    /// Create an image block with display dimensions.
    pub fn image_with_size(resource_id: impl Into<String>, width: f32, height: f32) -> Self {
        Block::Image {
            resource_id: resource_id.into(),
            alt_text: None,
            width: Some(width),
            height: Some(height),
        }
    }

    /// Check if this block is a paragraph.
    pub fn is_paragraph(&self) -> bool {
        matches!(self, Block::Paragraph(_))
    }

    /// Check if this block may be split across a page boundary.
    ///
    /// Tables and images carry over whole; paragraphs break at line
    /// granularity.
    pub fn is_breakable(&self) -> bool {
        matches!(self, Block::Paragraph(_))
    }
}

/// Document metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    pub title: Option<String>,

    /// Document author
    pub author: Option<String>,

    /// Document subject
    pub subject: Option<String>,

    /// Keywords
    pub keywords: Option<String>,

    /// Creator application
    pub creator: Option<String>,

    /// Creation date carried from the source document
    pub created: Option<DateTime<Utc>>,

    /// Last modification date carried from the source document
    pub modified: Option<DateTime<Utc>>,
}

impl Metadata {
    /// Check whether any field is set.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.subject.is_none()
            && self.keywords.is_none()
            && self.creator.is_none()
            && self.created.is_none()
            && self.modified.is_none()
    }
}
