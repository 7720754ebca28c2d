//! Error types for relayout library.

use std::io;
use thiserror::Error;

use crate::model::RegionId;

/// Result type alias for relayout operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during analysis, editing and generation.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// Error rasterizing a page.
    #[error("Rendering error: {0}")]
    Render(String),

    /// Error decoding, cropping or encoding a bitmap.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// A page failed during analysis; the whole run is aborted.
    #[error("Page {page} failed: {source}")]
    Page {
        /// 1-indexed page number
        page: u32,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// OCR failed for a single region. Recovered during generation.
    #[error("OCR error: {0}")]
    Ocr(String),

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// No region exists at the given address.
    #[error("Region not found: {0}")]
    RegionNotFound(RegionId),

    /// A style edit was requested with nothing selected.
    #[error("No region is selected")]
    NoSelection,

    /// A style edit targeted a region that is not a text region.
    #[error("Region {0} is not a text region")]
    NotText(RegionId),

    /// The run was cancelled through its cancel token.
    #[error("Operation cancelled")]
    Cancelled,

    /// Error writing the output archive.
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wrap an error as the failure of a specific page.
    pub fn on_page(self, page: u32) -> Self {
        match self {
            Error::Page { .. } | Error::Cancelled => self,
            other => Error::Page {
                page,
                source: Box::new(other),
            },
        }
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            _ => Error::PdfParse(err.to_string()),
        }
    }
}
