//! In-memory page source for callers that already hold rendered pages.

use image::RgbaImage;

use super::{PdfSource, TextFragment};
use crate::error::{Error, Result};
use crate::geometry::Viewport;

/// One pre-rendered page.
#[derive(Debug, Clone)]
pub struct MemoryPage {
    /// User-space MediaBox `[x0, y0, x1, y1]`
    pub media_box: [f32; 4],
    /// Text fragments in user space
    pub fragments: Vec<TextFragment>,
    /// Page bitmap; resampled to the viewport on render if sizes differ
    pub bitmap: RgbaImage,
}

impl MemoryPage {
    /// A page whose bitmap was rendered at `scale`.
    pub fn new(bitmap: RgbaImage, scale: f32) -> Self {
        let (w, h) = bitmap.dimensions();
        Self {
            media_box: [0.0, 0.0, w as f32 / scale, h as f32 / scale],
            fragments: Vec::new(),
            bitmap,
        }
    }

    /// Attach text fragments.
    pub fn with_fragments(mut self, fragments: Vec<TextFragment>) -> Self {
        self.fragments = fragments;
        self
    }
}

/// A [`PdfSource`] over pages held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    pages: Vec<MemoryPage>,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a page.
    pub fn add_page(&mut self, page: MemoryPage) {
        self.pages.push(page);
    }

    /// Builder-style [`add_page`](Self::add_page).
    pub fn with_page(mut self, page: MemoryPage) -> Self {
        self.add_page(page);
        self
    }

    fn get(&self, page: u32) -> Result<&MemoryPage> {
        page.checked_sub(1)
            .and_then(|i| self.pages.get(i as usize))
            .ok_or(Error::PageOutOfRange(page, self.pages.len() as u32))
    }
}

impl PdfSource for MemorySource {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn viewport(&self, page: u32, scale: f32) -> Result<Viewport> {
        Ok(Viewport::from_media_box(self.get(page)?.media_box, scale))
    }

    fn text_fragments(&self, page: u32) -> Result<Vec<TextFragment>> {
        Ok(self.get(page)?.fragments.clone())
    }

    fn render(&self, page: u32, viewport: &Viewport) -> Result<RgbaImage> {
        let bitmap = &self.get(page)?.bitmap;
        let (width, height) = viewport.pixel_size();
        if bitmap.dimensions() == (width, height) {
            Ok(bitmap.clone())
        } else {
            Ok(image::imageops::resize(
                bitmap,
                width,
                height,
                image::imageops::FilterType::Triangle,
            ))
        }
    }
}
