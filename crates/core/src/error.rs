//! Error types for slide extraction and presentation storage.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while extracting or looking up presentations.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read the input.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The file format is not supported or could not be detected.
    #[error("Unsupported or unrecognized file format: {0}")]
    UnsupportedFormat(String),

    /// Failed to parse the PPTX package structure.
    #[error("PPTX parsing error: {0}")]
    PptxParseError(String),

    /// Failed to parse the DOCX package structure.
    #[error("DOCX parsing error: {0}")]
    DocxParseError(String),

    /// ZIP archive error.
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error.
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// No presentation is stored under the requested id.
    #[error("Presentation not found: {0}")]
    PresentationNotFound(String),
}
