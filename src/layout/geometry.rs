//! Page geometry resolution.
//!
//! Option strings map to concrete page dimensions through a table-driven
//! lookup with a documented permissive default: an unrecognized page size
//! becomes A4, an unrecognized orientation becomes Portrait. Matching is
//! case-insensitive and never fails.

use serde::{Deserialize, Serialize};

/// Supported page sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSize {
    /// ISO A4: 210 x 297 mm
    #[default]
    A4,
    /// US Letter: 8.5 x 11 in
    Letter,
    /// US Legal: 8.5 x 14 in
    Legal,
}

impl PageSize {
    /// Map a user-facing name to a page size.
    ///
    /// Case-insensitive; unknown names fall back to A4. This mirrors the
    /// permissive option handling of word-processor export dialogs and is
    /// deliberate policy, not missing validation.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "letter" => PageSize::Letter,
            "legal" => PageSize::Legal,
            _ => PageSize::A4,
        }
    }

    /// Portrait dimensions in points as (width, height).
    pub fn portrait_points(self) -> (f32, f32) {
        match self {
            PageSize::A4 => (595.0, 842.0),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
        }
    }
}

impl std::fmt::Display for PageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageSize::A4 => write!(f, "A4"),
            PageSize::Letter => write!(f, "Letter"),
            PageSize::Legal => write!(f, "Legal"),
        }
    }
}

/// Page orientation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    /// Height > width (default)
    #[default]
    Portrait,
    /// Width > height
    Landscape,
}

impl Orientation {
    /// Map a user-facing name to an orientation.
    ///
    /// Case-insensitive; unknown names fall back to Portrait.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "landscape" => Orientation::Landscape,
            _ => Orientation::Portrait,
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Orientation::Portrait => write!(f, "Portrait"),
            Orientation::Landscape => write!(f, "Landscape"),
        }
    }
}

/// Concrete page dimensions in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    /// Page width in points (1 point = 1/72 inch)
    pub width: f32,

    /// Page height in points
    pub height: f32,
}

impl PageGeometry {
    /// Derive geometry from a size and orientation.
    ///
    /// Landscape swaps the portrait pair; both dimensions stay positive.
    pub fn new(size: PageSize, orientation: Orientation) -> Self {
        let (w, h) = size.portrait_points();
        match orientation {
            Orientation::Portrait => Self {
                width: w,
                height: h,
            },
            Orientation::Landscape => Self {
                width: h,
                height: w,
            },
        }
    }

    /// Check if this geometry is landscape.
    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }

    /// Usable content width after margins.
    pub fn content_width(&self, margins: Margins) -> f32 {
        self.width - margins.left - margins.right
    }

    /// Usable content height after margins.
    pub fn content_height(&self, margins: Margins) -> f32 {
        self.height - margins.top - margins.bottom
    }
}

/// Page margins in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
}

impl Margins {
    /// Uniform margins.
    pub fn uniform(pt: f32) -> Self {
        Self {
            top: pt,
            bottom: pt,
            left: pt,
            right: pt,
        }
    }
}

impl Default for Margins {
    /// One inch all around.
    fn default() -> Self {
        Self::uniform(72.0)
    }
}

/// Resolve user-facing option strings into concrete page geometry.
///
/// Pure and total: any input pair yields a valid geometry.
pub fn resolve(page_size_name: &str, orientation_name: &str) -> PageGeometry {
    PageGeometry::new(
        PageSize::from_name(page_size_name),
        Orientation::from_name(orientation_name),
    )
}
