//! # topdf
//!
//! Flow-document to paginated PDF conversion for Rust.
//!
//! This library converts reflowable documents (paragraphs, tables, images)
//! into fixed-layout paginated PDF files with selectable page geometry,
//! and can rewrite the produced object graph to minimize file size through
//! structural deduplication and compressed containers.
//!
//! ## Quick Start
//!
//! ```no_run
//! use topdf::{convert_file, ConversionOptions};
//!
//! fn main() -> topdf::Result<()> {
//!     let options = ConversionOptions::new()
//!         .with_page_size_name("A4")
//!         .with_orientation_name("Portrait")
//!         .optimize(true);
//!
//!     let report = convert_file("notes.md", "notes.pdf", &options)?;
//!     println!("{} pages, {} bytes", report.page_count, report.output_bytes);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Permissive layout options**: unknown size/orientation names fall
//!   back to A4 Portrait instead of failing
//! - **Formatting preservation**: carry source styles through, or
//!   normalize to a canonical subset for robustness
//! - **Structural deduplication**: identical objects stored once
//! - **Compressed containers**: object streams and cross-reference streams
//! - **Atomic output**: the destination is only ever replaced by a
//!   complete artifact; staging files never survive
//! - **Deterministic output**: byte-identical results for identical inputs

pub mod decode;
pub mod detect;
pub mod error;
pub mod fixed;
pub mod graph;
pub mod layout;
pub mod model;
pub mod optimize;
pub mod paginate;
pub mod pipeline;
pub mod writer;

// Re-export commonly used types
pub use decode::{DecoderRegistry, FlowDecoder, TextDecoder};
pub use error::{Error, Result};
pub use fixed::{FixedDocument, FixedPage};
pub use graph::{build_graph, Object, ObjectGraph};
pub use layout::{resolve, ConversionOptions, Margins, Orientation, PageGeometry, PageSize};
pub use model::{
    Alignment, Block, FlowDocument, Metadata, Paragraph, Resource, ResourceType, Table, TextRun,
    TextStyle,
};
pub use optimize::OptimizeStats;
pub use pipeline::{ConvertReport, Pipeline, PipelineStep};
pub use writer::{write_graph, WriteOptions};

use std::path::Path;
use std::sync::Arc;

/// Convert a flow document file into a paginated PDF.
///
/// # Example
///
/// ```no_run
/// use topdf::{convert_file, ConversionOptions};
///
/// let report = convert_file("doc.txt", "doc.pdf", &ConversionOptions::new()).unwrap();
/// assert!(report.page_count >= 1);
/// ```
pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    options: &ConversionOptions,
) -> Result<ConvertReport> {
    Pipeline::new().convert(input.as_ref(), output.as_ref(), options)
}

/// Decode and paginate a file without writing any output.
///
/// Useful for page-count queries and previews.
pub fn paginate_file<P: AsRef<Path>>(
    input: P,
    options: &ConversionOptions,
) -> Result<FixedDocument> {
    let input = input.as_ref();
    if !input.is_file() {
        return Err(Error::InputNotFound(input.to_path_buf()));
    }
    let flow = DecoderRegistry::with_defaults().decode_file(input)?;
    paginate::paginate(
        &flow,
        options.geometry(),
        options.margins,
        options.preserve_formatting,
    )
}

/// Async wrapper around [`convert_file`].
///
/// The blocking pipeline runs on a worker thread so a responsive front end
/// is never stalled.
#[cfg(feature = "async")]
pub async fn convert_file_async<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    options: &ConversionOptions,
) -> Result<ConvertReport> {
    let input = input.as_ref().to_path_buf();
    let output = output.as_ref().to_path_buf();
    let options = options.clone();
    tokio::task::spawn_blocking(move || convert_file(input, output, &options))
        .await
        .map_err(|e| Error::Conversion(format!("worker task failed: {}", e)))?
}

/// Builder for configuring and running conversions.
///
/// # Example
///
/// ```no_run
/// use topdf::{PageSize, Topdf};
///
/// let report = Topdf::new()
///     .with_page_size(PageSize::Letter)
///     .landscape()
///     .preserve_formatting()
///     .optimize()
///     .convert("report.md", "report.pdf")?;
/// # Ok::<(), topdf::Error>(())
/// ```
pub struct Topdf {
    options: ConversionOptions,
    registry: DecoderRegistry,
}

impl Topdf {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self {
            options: ConversionOptions::default(),
            registry: DecoderRegistry::with_defaults(),
        }
    }

    /// Set the page size.
    pub fn with_page_size(mut self, size: PageSize) -> Self {
        self.options = self.options.with_page_size(size);
        self
    }

    /// Set the page size from a user-facing name (permissive).
    pub fn with_page_size_name(mut self, name: &str) -> Self {
        self.options = self.options.with_page_size_name(name);
        self
    }

    /// Use landscape orientation.
    pub fn landscape(mut self) -> Self {
        self.options = self.options.with_orientation(Orientation::Landscape);
        self
    }

    /// Set the orientation from a user-facing name (permissive).
    pub fn with_orientation_name(mut self, name: &str) -> Self {
        self.options = self.options.with_orientation_name(name);
        self
    }

    /// Set page margins.
    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.options = self.options.with_margins(margins);
        self
    }

    /// Carry original formatting through pagination unchanged.
    pub fn preserve_formatting(mut self) -> Self {
        self.options = self.options.preserve_formatting(true);
        self
    }

    /// Run the object-graph optimizer on the output.
    pub fn optimize(mut self) -> Self {
        self.options = self.options.optimize(true);
        self
    }

    /// Treat an optimization failure as fatal.
    pub fn require_optimization(mut self) -> Self {
        self.options = self.options.optimize(true).require_optimization(true);
        self
    }

    /// Register an additional input decoder.
    pub fn with_decoder(mut self, decoder: Arc<dyn FlowDecoder>) -> Self {
        self.registry.register(decoder);
        self
    }

    /// Run the conversion.
    pub fn convert<P: AsRef<Path>, Q: AsRef<Path>>(
        self,
        input: P,
        output: Q,
    ) -> Result<ConvertReport> {
        Pipeline::with_registry(self.registry).convert(
            input.as_ref(),
            output.as_ref(),
            &self.options,
        )
    }
}

impl Default for Topdf {
    fn default() -> Self {
        Self::new()
    }
}
