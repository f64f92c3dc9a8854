//! Input format detection for flow documents.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Detected flow-document container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowFormat {
    /// ZIP-based container (DOCX and friends).
    ZipPackage,
    /// UTF-8 plain text or lightweight markup.
    PlainText,
}

impl std::fmt::Display for FlowFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowFormat::ZipPackage => write!(f, "zip package"),
            FlowFormat::PlainText => write!(f, "plain text"),
        }
    }
}

/// ZIP local-file-header magic: PK\x03\x04
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Detect the flow-document format from a file path.
///
/// Reads the first bytes of the file; does not validate the whole document.
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<FlowFormat> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut header = [0u8; 16];
    let n = reader.read(&mut header)?;
    detect_format_from_bytes(&header[..n])
}

/// Detect the flow-document format from bytes.
///
/// # Returns
/// * `Ok(FlowFormat)` for a ZIP package or valid UTF-8 text
/// * `Err(Error::UnknownFormat)` for empty or binary input
pub fn detect_format_from_bytes(data: &[u8]) -> Result<FlowFormat> {
    if data.is_empty() {
        return Err(Error::UnknownFormat);
    }

    if data.starts_with(ZIP_MAGIC) {
        return Ok(FlowFormat::ZipPackage);
    }

    // Anything that decodes as text with no NUL bytes is treated as a
    // plain-text flow document; std::str handles partial trailing
    // sequences poorly on a truncated prefix, so only reject hard markers.
    if data.contains(&0) {
        return Err(Error::UnknownFormat);
    }

    Ok(FlowFormat::PlainText)
}

/// Check if a file looks like a supported flow document.
pub fn is_flow_document<P: AsRef<Path>>(path: P) -> bool {
    detect_format_from_path(path).is_ok()
}
