//! Page sources: where text fragments, viewports and page bitmaps come from.
//!
//! PDF decoding and rasterization are collaborators behind the [`PdfSource`]
//! and [`PageRasterizer`] traits. [`LopdfSource`] reads text placement from
//! the PDF content streams and delegates rendering to a rasterizer;
//! [`MemorySource`] serves pre-rendered pages held in memory.

mod memory;
mod pdf;
mod raster;

pub use memory::{MemoryPage, MemorySource};
pub use pdf::LopdfSource;
pub use raster::{RasterDir, WhiteCanvas};

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geometry::{Transform, Viewport};

/// A positioned run of text as placed by the PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    /// Decoded text
    pub text: String,
    /// Text rendering matrix in PDF user space; `(e, f)` is the baseline
    /// origin and `d` the vertical scale (font size)
    pub transform: Transform,
    /// Advance width in user space
    pub width: f32,
    /// Box height in user space; `|d|` when absent
    pub height: Option<f32>,
    /// PDF font name (e.g. "Times-Roman")
    pub font_name: String,
}

/// A source of analysable pages. Pages are addressed by 1-indexed number.
pub trait PdfSource {
    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// Viewport mapping user space to bitmap pixels at `scale`.
    fn viewport(&self, page: u32, scale: f32) -> Result<Viewport>;

    /// Positioned text fragments of a page.
    fn text_fragments(&self, page: u32) -> Result<Vec<TextFragment>>;

    /// Render a page to a bitmap matching `viewport`.
    fn render(&self, page: u32, viewport: &Viewport) -> Result<RgbaImage>;
}

/// Renders a page to a bitmap. Used by [`LopdfSource`], which reads text
/// placement itself but cannot rasterize.
pub trait PageRasterizer {
    /// Produce the page bitmap for `viewport`.
    fn rasterize(&self, page: u32, viewport: &Viewport) -> Result<RgbaImage>;
}
