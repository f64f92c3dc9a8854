//! Fixed-layout document model.
//!
//! Output of the pagination engine: discrete pages with absolutely
//! positioned elements, plus document-level pools of fonts and binary
//! resources shared across pages.

mod document;
mod page;

pub use document::{FixedDocument, FontFamily, FontId, FontSpec};
pub use page::{FixedPage, PlacedElement, TextLine, TextSegment};
