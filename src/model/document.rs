//! Document-level types.

use serde::Serialize;

use super::{Page, Region, RegionId, RegionKind};
use crate::error::{Error, Result};

/// An analysed document: a display name and its pages in document order.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    /// Display name (usually the source file stem)
    pub name: String,

    /// Pages in document order
    pub pages: Vec<Page>,
}

impl Document {
    /// Create a new empty document.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pages: Vec::new(),
        }
    }

    /// Get the number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Check if the document has any pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Add a page to the document.
    pub fn add_page(&mut self, page: Page) {
        self.pages.push(page);
    }

    /// Get a page by number (1-indexed).
    pub fn page(&self, number: u32) -> Option<&Page> {
        self.pages.iter().find(|p| p.number == number)
    }

    /// Get a mutable page by number (1-indexed).
    pub fn page_mut(&mut self, number: u32) -> Option<&mut Page> {
        self.pages.iter_mut().find(|p| p.number == number)
    }

    /// Look up a region.
    pub fn region(&self, id: RegionId) -> Result<&Region> {
        self.page(id.page)
            .and_then(|p| p.regions.get(id.index))
            .ok_or(Error::RegionNotFound(id))
    }

    /// Look up a region for mutation.
    pub fn region_mut(&mut self, id: RegionId) -> Result<&mut Region> {
        self.page_mut(id.page)
            .and_then(|p| p.regions.get_mut(id.index))
            .ok_or(Error::RegionNotFound(id))
    }

    /// Iterate over every region with its address.
    pub fn regions(&self) -> impl Iterator<Item = (RegionId, &Region)> {
        self.pages.iter().flat_map(|page| {
            page.regions
                .iter()
                .enumerate()
                .map(move |(index, region)| (RegionId::new(page.number, index), region))
        })
    }

    /// Iterate mutably over every region on every page.
    pub fn regions_mut(&mut self) -> impl Iterator<Item = &mut Region> {
        self.pages.iter_mut().flat_map(|page| page.regions.iter_mut())
    }

    /// Total number of regions of a given kind across pages.
    pub fn count(&self, kind: RegionKind) -> usize {
        self.pages.iter().map(|p| p.count(kind)).sum()
    }

    /// Export the region model as JSON (bitmaps excluded).
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Rect, Viewport};
    use image::RgbaImage;

    fn sample() -> Document {
        let mut doc = Document::new("sample");
        for number in 1..=2 {
            let viewport = Viewport::from_media_box([0.0, 0.0, 50.0, 50.0], 1.0);
            let mut page = Page::new(number, RgbaImage::new(50, 50), viewport);
            page.add_region(Region::image(Rect::new(0.0, 0.0, 20.0, 20.0)));
            doc.add_page(page);
        }
        doc
    }

    #[test]
    fn test_document_new() {
        let doc = Document::new("empty");
        assert!(doc.is_empty());
        assert_eq!(doc.page_count(), 0);
    }

    #[test]
    fn test_region_lookup() {
        let mut doc = sample();
        assert!(doc.region(RegionId::new(2, 0)).is_ok());
        assert!(matches!(
            doc.region(RegionId::new(3, 0)),
            Err(Error::RegionNotFound(_))
        ));
        doc.region_mut(RegionId::new(1, 0)).unwrap().active = false;
        assert!(!doc.region(RegionId::new(1, 0)).unwrap().active);
        assert_eq!(doc.regions().count(), 2);
    }

    #[test]
    fn test_json_export_skips_bitmap() {
        let json = sample().to_json(false).unwrap();
        assert!(json.contains("\"name\":\"sample\""));
        assert!(json.contains("\"kind\":\"image\""));
        assert!(!json.contains("bitmap"));
    }
}
