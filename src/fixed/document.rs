//! Fixed document and shared resource pools.

use super::FixedPage;
use crate::layout::{Margins, PageGeometry};
use crate::model::{Metadata, Resource};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Index into the document font pool.
pub type FontId = usize;

/// Base font family for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FontFamily {
    /// Sans-serif (standard family, used for normalized output)
    Helvetica,
    /// Serif
    Times,
    /// Monospace
    Courier,
}

impl FontFamily {
    /// Map a source font name to the closest base family.
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.contains("times") || lower.contains("serif") || lower.contains("georgia") {
            FontFamily::Times
        } else if lower.contains("courier") || lower.contains("mono") || lower.contains("consolas")
        {
            FontFamily::Courier
        } else {
            FontFamily::Helvetica
        }
    }
}

/// A pooled font: base family plus weight and slant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FontSpec {
    pub family: FontFamily,
    pub bold: bool,
    pub italic: bool,
}

impl FontSpec {
    /// Regular weight of the standard family.
    pub fn regular() -> Self {
        Self {
            family: FontFamily::Helvetica,
            bold: false,
            italic: false,
        }
    }

    /// The PostScript name of the corresponding standard-14 font.
    pub fn postscript_name(&self) -> &'static str {
        match (self.family, self.bold, self.italic) {
            (FontFamily::Helvetica, false, false) => "Helvetica",
            (FontFamily::Helvetica, true, false) => "Helvetica-Bold",
            (FontFamily::Helvetica, false, true) => "Helvetica-Oblique",
            (FontFamily::Helvetica, true, true) => "Helvetica-BoldOblique",
            (FontFamily::Times, false, false) => "Times-Roman",
            (FontFamily::Times, true, false) => "Times-Bold",
            (FontFamily::Times, false, true) => "Times-Italic",
            (FontFamily::Times, true, true) => "Times-BoldItalic",
            (FontFamily::Courier, false, false) => "Courier",
            (FontFamily::Courier, true, false) => "Courier-Bold",
            (FontFamily::Courier, false, true) => "Courier-Oblique",
            (FontFamily::Courier, true, true) => "Courier-BoldOblique",
        }
    }
}

/// A paginated document: ordered pages plus pooled shared resources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedDocument {
    /// Source metadata carried through conversion
    pub metadata: Metadata,

    /// Page geometry every page was laid out against
    pub geometry: PageGeometry,

    /// Margins used during layout
    pub margins: Margins,

    /// Pages in order
    pub pages: Vec<FixedPage>,

    /// Font pool; placed text references fonts by index
    pub fonts: Vec<FontSpec>,

    /// Binary resources (images) referenced by placed elements, stored once
    pub resources: BTreeMap<String, Resource>,
}

impl FixedDocument {
    /// Create an empty fixed document for the given geometry.
    pub fn new(geometry: PageGeometry, margins: Margins) -> Self {
        Self {
            metadata: Metadata::default(),
            geometry,
            margins,
            pages: Vec::new(),
            fonts: Vec::new(),
            resources: BTreeMap::new(),
        }
    }

    /// Number of pages.
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Intern a font spec, returning its pool index.
    pub fn intern_font(&mut self, spec: FontSpec) -> FontId {
        if let Some(idx) = self.fonts.iter().position(|f| *f == spec) {
            return idx;
        }
        self.fonts.push(spec);
        self.fonts.len() - 1
    }

    /// Pool a resource under the given id (stored once per id).
    pub fn pool_resource(&mut self, id: impl Into<String>, resource: Resource) {
        self.resources.entry(id.into()).or_insert(resource);
    }

    /// Plain text of the whole document in page order.
    ///
    /// Used to check that transforms preserve visible content.
    pub fn plain_text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.plain_text())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
