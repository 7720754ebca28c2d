//! Page-level types.

use std::fmt;

use image::RgbaImage;
use serde::Serialize;

use super::{Region, RegionKind};
use crate::geometry::Viewport;

/// A single analysed page: its rendered bitmap plus the regions on it.
#[derive(Clone, Serialize)]
pub struct Page {
    /// Page number (1-indexed)
    pub number: u32,

    /// Rendered page bitmap
    #[serde(skip)]
    pub bitmap: RgbaImage,

    /// Mapping from PDF user space to bitmap pixels
    pub viewport: Viewport,

    /// Regions in detection order
    pub regions: Vec<Region>,
}

impl Page {
    /// Create a page with no regions.
    pub fn new(number: u32, bitmap: RgbaImage, viewport: Viewport) -> Self {
        Self {
            number,
            bitmap,
            viewport,
            regions: Vec::new(),
        }
    }

    /// Append a region, returning its index.
    pub fn add_region(&mut self, region: Region) -> usize {
        self.regions.push(region);
        self.regions.len() - 1
    }

    /// Bitmap dimensions as (width, height).
    pub fn dimensions(&self) -> (u32, u32) {
        self.bitmap.dimensions()
    }

    /// Active regions in reading order: `y` ascending, ties kept in
    /// detection order.
    pub fn reading_order(&self) -> Vec<&Region> {
        let mut active: Vec<&Region> = self.regions.iter().filter(|r| r.active).collect();
        active.sort_by(|a, b| a.rect.y.total_cmp(&b.rect.y));
        active
    }

    /// Number of regions of the given kind.
    pub fn count(&self, kind: RegionKind) -> usize {
        self.regions.iter().filter(|r| r.kind == kind).count()
    }

    /// Pairs of `(text index, image index)` whose rectangles intersect.
    ///
    /// Detection never reconciles these; front-ends use this to flag
    /// candidates for deactivation or reclassification.
    pub fn overlapping_regions(&self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for (ti, text) in self.regions.iter().enumerate().filter(|(_, r)| r.is_text()) {
            for (ii, img) in self.regions.iter().enumerate().filter(|(_, r)| r.is_image()) {
                if text.rect.intersects(&img.rect) {
                    pairs.push((ti, ii));
                }
            }
        }
        pairs
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (width, height) = self.bitmap.dimensions();
        f.debug_struct("Page")
            .field("number", &self.number)
            .field("bitmap", &format_args!("{}x{}", width, height))
            .field("viewport", &self.viewport)
            .field("regions", &self.regions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::model::TextStyle;

    fn blank_page() -> Page {
        let viewport = Viewport::from_media_box([0.0, 0.0, 100.0, 100.0], 1.0);
        Page::new(1, RgbaImage::new(100, 100), viewport)
    }

    #[test]
    fn test_reading_order_is_stable() {
        let mut page = blank_page();
        page.add_region(Region::text(Rect::new(0.0, 50.0, 10.0, 10.0), "b", TextStyle::default()));
        page.add_region(Region::text(Rect::new(0.0, 10.0, 10.0, 10.0), "a", TextStyle::default()));
        page.add_region(Region::text(Rect::new(40.0, 50.0, 10.0, 10.0), "c", TextStyle::default()));
        let mut hidden = Region::image(Rect::new(0.0, 0.0, 60.0, 60.0));
        hidden.active = false;
        page.add_region(hidden);

        let order: Vec<_> = page
            .reading_order()
            .iter()
            .map(|r| r.content.clone().unwrap_or_default())
            .collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_overlapping_regions() {
        let mut page = blank_page();
        page.add_region(Region::text(Rect::new(10.0, 10.0, 30.0, 10.0), "x", TextStyle::default()));
        page.add_region(Region::image(Rect::new(0.0, 0.0, 60.0, 60.0)));
        page.add_region(Region::image(Rect::new(70.0, 70.0, 20.0, 20.0)));
        assert_eq!(page.overlapping_regions(), vec![(0, 1)]);
        assert_eq!(page.count(RegionKind::Image), 2);
    }

    #[test]
    fn test_debug_shows_bitmap_size_only() {
        let debug = format!("{:?}", blank_page());
        assert!(debug.contains("bitmap: 100x100"));
        assert!(!debug.contains("ImageBuffer"));
    }
}
