//! Input validation: reject anything that is not a PDF before analysis.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Header information of an accepted PDF input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfHeader {
    /// PDF version (e.g., "1.7", "2.0")
    pub version: String,
}

impl std::fmt::Display for PdfHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PDF {}", self.version)
    }
}

const PDF_MAGIC: &[u8] = b"%PDF-";
const VERSION_LEN: usize = 3; // e.g., "1.7"

/// Inspect the leading bytes of an input and accept it only if it is a PDF.
///
/// Returns [`Error::UnknownFormat`] for anything without the `%PDF-` magic,
/// and [`Error::UnsupportedVersion`] when the version field is malformed.
pub fn check_pdf_bytes(data: &[u8]) -> Result<PdfHeader> {
    if data.len() < PDF_MAGIC.len() + VERSION_LEN || !data.starts_with(PDF_MAGIC) {
        return Err(Error::UnknownFormat);
    }

    let version_bytes = &data[PDF_MAGIC.len()..PDF_MAGIC.len() + VERSION_LEN];
    let version = String::from_utf8_lossy(version_bytes).to_string();

    let bytes = version.as_bytes();
    let well_formed = bytes.len() == VERSION_LEN
        && bytes[0].is_ascii_digit()
        && bytes[1] == b'.'
        && bytes[2].is_ascii_digit();
    if !well_formed {
        return Err(Error::UnsupportedVersion(version));
    }

    Ok(PdfHeader { version })
}

/// Same as [`check_pdf_bytes`], reading only the header of a file.
pub fn check_pdf_path<P: AsRef<Path>>(path: P) -> Result<PdfHeader> {
    let mut header = Vec::with_capacity(16);
    File::open(path)?.take(16).read_to_end(&mut header)?;
    check_pdf_bytes(&header)
}

/// Check if bytes start with a valid PDF header.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    check_pdf_bytes(data).is_ok()
}
