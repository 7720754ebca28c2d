//! Rasterizers for [`LopdfSource`](super::LopdfSource).

use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use super::PageRasterizer;
use crate::error::{Error, Result};
use crate::geometry::Viewport;

/// Loads page bitmaps rendered ahead of time by an external renderer.
///
/// Page `N` is looked up as `page-N.png`, then with zero-padded numbers
/// (`page-01.png`, `page-001.png`, ...) as written by `pdftoppm -png`.
/// Bitmaps whose size differs from the viewport are resampled to fit.
#[derive(Debug, Clone)]
pub struct RasterDir {
    dir: PathBuf,
    prefix: String,
}

impl RasterDir {
    /// Use `dir` with the default `page` file prefix.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            prefix: "page".to_string(),
        }
    }

    /// Change the file prefix (`{prefix}-{N}.png`).
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Directory holding the page images.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn find(&self, page: u32) -> Option<PathBuf> {
        (1..=4)
            .map(|width| {
                self.dir
                    .join(format!("{}-{:0width$}.png", self.prefix, page, width = width))
            })
            .find(|p| p.is_file())
    }
}

impl PageRasterizer for RasterDir {
    fn rasterize(&self, page: u32, viewport: &Viewport) -> Result<RgbaImage> {
        let path = self.find(page).ok_or_else(|| {
            Error::Render(format!(
                "no image for page {} in {}",
                page,
                self.dir.display()
            ))
        })?;
        let bitmap = image::open(&path)?.to_rgba8();

        let (width, height) = viewport.pixel_size();
        if bitmap.dimensions() == (width, height) || width == 0 || height == 0 {
            return Ok(bitmap);
        }
        log::debug!(
            "Resampling {} from {:?} to {}x{}",
            path.display(),
            bitmap.dimensions(),
            width,
            height
        );
        Ok(imageops::resize(&bitmap, width, height, FilterType::Triangle))
    }
}

/// Renders every page as a blank white canvas of the viewport size.
///
/// With no real renderer available, text regions still come from the
/// content stream and the image detector simply finds nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhiteCanvas;

impl PageRasterizer for WhiteCanvas {
    fn rasterize(&self, _page: u32, viewport: &Viewport) -> Result<RgbaImage> {
        let (width, height) = viewport.pixel_size();
        Ok(RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255])))
    }
}
