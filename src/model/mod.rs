//! Flow-document model types.
//!
//! This module defines the reflowable input representation consumed by the
//! pagination engine: ordered content blocks without page boundaries, plus
//! shared resources (images, fonts) referenced by id. Decoders produce this
//! model; the pipeline treats it as read-only.

mod document;
mod paragraph;
mod resource;
mod table;

pub use document::{Block, FlowDocument, Metadata};
pub use paragraph::{
    Alignment, InlineContent, Paragraph, ParagraphStyle, TextRun, TextStyle,
};
pub use resource::{Resource, ResourceType};
pub use table::{Table, TableCell, TableRow};
