//! Flow-document decoding boundary.
//!
//! The pipeline consumes a [`FlowDocument`] produced by a decoder; the
//! byte-level details of each input format live behind the [`FlowDecoder`]
//! trait so real decoders (DOCX, ODT, ...) can be registered without the
//! core knowing about them. A registry maps file extensions to decoders.
//!
//! # Example
//!
//! ```
//! use topdf::decode::{DecoderRegistry, TextDecoder};
//! use std::sync::Arc;
//!
//! let mut registry = DecoderRegistry::new();
//! registry.register(Arc::new(TextDecoder::new()));
//! let doc = registry.decode_bytes(b"Hello world.", "txt").unwrap();
//! assert_eq!(doc.block_count(), 1);
//! ```

mod text;

pub use text::TextDecoder;

use crate::error::{Error, Result};
use crate::model::FlowDocument;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Trait for flow-document decoders.
///
/// Implement this trait to add support for a new input format.
pub trait FlowDecoder: Send + Sync {
    /// Supported file extensions, lowercase without the leading dot.
    fn supported_extensions(&self) -> &[&str];

    /// Name of this decoder.
    fn name(&self) -> &str;

    /// Decode raw bytes into a flow document.
    fn decode(&self, data: &[u8]) -> Result<FlowDocument>;

    /// Check if this decoder supports the given extension.
    fn supports_extension(&self, ext: &str) -> bool {
        let ext_lower = ext.to_lowercase();
        self.supported_extensions().iter().any(|e| *e == ext_lower)
    }
}

/// Registry for flow-document decoders.
pub struct DecoderRegistry {
    decoders: HashMap<String, Arc<dyn FlowDecoder>>,
}

impl DecoderRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// Create a registry with the built-in decoders (plain text, markdown).
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(TextDecoder::new()));
        registry
    }

    /// Register a decoder for all its supported extensions.
    pub fn register(&mut self, decoder: Arc<dyn FlowDecoder>) {
        for ext in decoder.supported_extensions() {
            self.decoders.insert(ext.to_lowercase(), decoder.clone());
        }
    }

    /// Get a decoder by file extension.
    pub fn get_by_extension(&self, ext: &str) -> Option<Arc<dyn FlowDecoder>> {
        self.decoders.get(&ext.to_lowercase()).cloned()
    }

    /// Check if an extension is supported.
    pub fn supports(&self, ext: &str) -> bool {
        self.decoders.contains_key(&ext.to_lowercase())
    }

    /// Get all supported extensions.
    pub fn supported_extensions(&self) -> Vec<&str> {
        self.decoders.keys().map(|s| s.as_str()).collect()
    }

    /// Decode a file using the decoder registered for its extension.
    pub fn decode_file(&self, path: &Path) -> Result<FlowDocument> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or(Error::UnknownFormat)?;

        let decoder = self.get_by_extension(ext).ok_or_else(|| {
            Error::Decode(format!("no decoder registered for extension: {}", ext))
        })?;

        let data = fs::read(path)?;
        decoder.decode(&data)
    }

    /// Decode bytes using the decoder registered for the given extension.
    pub fn decode_bytes(&self, data: &[u8], ext: &str) -> Result<FlowDocument> {
        let decoder = self.get_by_extension(ext).ok_or_else(|| {
            Error::Decode(format!("no decoder registered for extension: {}", ext))
        })?;

        decoder.decode(data)
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
