//! Error types for slide text extraction.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while parsing, extracting, or rendering a presentation.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or read the input file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The file format is not supported or could not be detected.
    #[error("Unsupported or unrecognized file format: {0}")]
    UnsupportedFormat(String),

    /// The package is readable but its structure is not a valid presentation.
    #[error("Presentation parsing error: {0}")]
    ParseError(String),

    /// ZIP archive error.
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error.
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// Extraction failed; carries the description of the underlying cause.
    #[error("Error processing PowerPoint file: {0}")]
    ExtractionError(String),

    /// The external renderer did not finish within its time budget.
    #[error("PDF conversion timed out after {0} seconds.")]
    RenderTimeout(u64),

    /// The external renderer failed or produced no output.
    #[error("PDF conversion failed: {0}")]
    RenderFailure(String),
}

impl Error {
    /// Wrap this error as an [`Error::ExtractionError`].
    ///
    /// An error that already is an extraction error is returned unchanged,
    /// so wrapping twice never nests the message.
    pub fn into_extraction(self) -> Self {
        match self {
            Self::ExtractionError(_) => self,
            other => Self::ExtractionError(other.to_string()),
        }
    }

    /// Whether this error means the input is not a readable presentation.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Self::ParseError(_) | Self::ZipError(_) | Self::XmlError(_) | Self::UnsupportedFormat(_)
        )
    }
}
