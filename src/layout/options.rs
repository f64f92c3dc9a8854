//! Conversion options.

use super::{Margins, Orientation, PageGeometry, PageSize};

/// Options for a conversion request.
///
/// Immutable once handed to the pipeline; built with the usual chained
/// setters.
#[derive(Debug, Clone)]
pub struct ConversionOptions {
    /// Target page size
    pub page_size: PageSize,

    /// Target page orientation
    pub orientation: Orientation,

    /// Page margins
    pub margins: Margins,

    /// Carry original style attributes through pagination unchanged.
    ///
    /// When false, the engine may normalize styles to a canonical subset
    /// (standard font family, collapsed whitespace) for robustness.
    pub preserve_formatting: bool,

    /// Run the object-graph optimizer on the produced document.
    pub optimize: bool,

    /// Treat an optimization failure as fatal instead of falling back to
    /// the non-optimized artifact.
    pub require_optimization: bool,
}

impl ConversionOptions {
    /// Create options with defaults (A4, Portrait, no optimization).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set page size.
    pub fn with_page_size(mut self, size: PageSize) -> Self {
        self.page_size = size;
        self
    }

    /// Set page size from a user-facing name (permissive, defaults to A4).
    pub fn with_page_size_name(mut self, name: &str) -> Self {
        self.page_size = PageSize::from_name(name);
        self
    }

    /// Set orientation.
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Set orientation from a user-facing name (permissive, defaults to
    /// Portrait).
    pub fn with_orientation_name(mut self, name: &str) -> Self {
        self.orientation = Orientation::from_name(name);
        self
    }

    /// Set page margins.
    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    /// Preserve original formatting through pagination.
    pub fn preserve_formatting(mut self, preserve: bool) -> Self {
        self.preserve_formatting = preserve;
        self
    }

    /// Enable the object-graph optimizer.
    pub fn optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }

    /// Fail the whole conversion if optimization fails.
    pub fn require_optimization(mut self, require: bool) -> Self {
        self.require_optimization = require;
        self
    }

    /// Resolve the concrete page geometry for these options.
    pub fn geometry(&self) -> PageGeometry {
        PageGeometry::new(self.page_size, self.orientation)
    }
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            orientation: Orientation::Portrait,
            margins: Margins::default(),
            preserve_formatting: false,
            optimize: false,
            require_optimization: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_builder() {
        let options = ConversionOptions::new()
            .with_page_size_name("letter")
            .with_orientation_name("landscape")
            .preserve_formatting(true)
            .optimize(true);

        assert_eq!(options.page_size, PageSize::Letter);
        assert_eq!(options.orientation, Orientation::Landscape);
        assert!(options.preserve_formatting);
        assert!(options.optimize);
        assert!(!options.require_optimization);
    }

    #[test]
    fn test_default_options() {
        let options = ConversionOptions::default();
        assert_eq!(options.page_size, PageSize::A4);
        assert_eq!(options.orientation, Orientation::Portrait);
        assert!(!options.optimize);
    }

    #[test]
    fn test_geometry_resolution() {
        let options = ConversionOptions::new()
            .with_page_size(PageSize::Legal)
            .with_orientation(Orientation::Landscape);
        let geom = options.geometry();
        assert_eq!((geom.width, geom.height), (1008.0, 612.0));
    }
}
