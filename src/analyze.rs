//! Page-by-page analysis: render, build text regions, detect image regions.
//!
//! # Example
//!
//! ```no_run
//! use relayout::analyze::{AnalyzeOptions, Analyzer};
//! use relayout::source::{LopdfSource, RasterDir};
//!
//! fn main() -> relayout::Result<()> {
//!     let source = LopdfSource::open("report.pdf", Box::new(RasterDir::new("pages/")))?;
//!     let doc = Analyzer::new(AnalyzeOptions::default()).run(&source, "report")?;
//!     println!("{} pages", doc.page_count());
//!     Ok(())
//! }
//! ```

use std::ops::RangeInclusive;

use crossbeam_channel::Sender;

use crate::error::Result;
use crate::layout::{build_text_regions, detect_image_regions, LayoutOptions};
use crate::model::{Document, Page, RegionKind};
use crate::progress::{CancelToken, Progress, Reporter, Stage};
use crate::source::PdfSource;

/// Default user-space to pixel scale.
pub const DEFAULT_SCALE: f32 = 1.5;

/// Options for [`Analyzer`].
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    /// User-space to pixel scale used for rendering
    pub scale: f32,

    /// Detection thresholds
    pub layout: LayoutOptions,

    /// Pages to analyse
    pub pages: PageSelection,
}

impl AnalyzeOptions {
    /// Create analysis options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the render scale. Non-finite or tiny scales fall back to the minimum.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = if scale.is_finite() { scale.max(0.1) } else { DEFAULT_SCALE };
        self
    }

    /// Set detection thresholds.
    pub fn with_layout(mut self, layout: LayoutOptions) -> Self {
        self.layout = layout;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, selection: PageSelection) -> Self {
        self.pages = selection;
        self
    }
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            layout: LayoutOptions::default(),
            pages: PageSelection::All,
        }
    }
}

/// Page selection for analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// Analyse all pages
    #[default]
    All,
    /// Analyse a range of pages (inclusive, 1-indexed)
    Range(RangeInclusive<u32>),
    /// Analyse specific pages (1-indexed)
    Pages(Vec<u32>),
}

impl PageSelection {
    /// Check if a page number should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
        }
    }

    /// Parse a page selection string (e.g., "1-10", "1,3,5,7-10").
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        let s = s.trim();

        if s.is_empty() || s == "all" {
            return Ok(PageSelection::All);
        }

        if let Some((start, end)) = s.split_once('-') {
            if !start.contains(',') && !end.contains(',') {
                let start = parse_page(start)?;
                let end = parse_page(end)?;
                return Ok(PageSelection::Range(start..=end));
            }
        }

        let mut pages = Vec::new();
        for part in s.split(',') {
            match part.split_once('-') {
                Some((start, end)) => pages.extend(parse_page(start)?..=parse_page(end)?),
                None => pages.push(parse_page(part)?),
            }
        }
        pages.sort_unstable();
        pages.dedup();
        Ok(PageSelection::Pages(pages))
    }
}

fn parse_page(s: &str) -> std::result::Result<u32, String> {
    match s.trim().parse::<u32>() {
        Ok(0) => Err("Page numbers start at 1".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("Invalid page number: {:?}", s.trim())),
    }
}

/// Runs detection over the pages of a [`PdfSource`].
///
/// Pages are processed one at a time in document order. The first failing
/// page aborts the run with [`Error::Page`](crate::Error::Page); no partial
/// document is returned.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    options: AnalyzeOptions,
    reporter: Reporter,
    cancel: CancelToken,
}

impl Analyzer {
    /// Create an analyzer.
    pub fn new(options: AnalyzeOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Send progress events to `sender`.
    pub fn with_progress(mut self, sender: Sender<Progress>) -> Self {
        self.reporter = Reporter::new(Some(sender));
        self
    }

    /// Observe `token` between pages.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Options in effect.
    pub fn options(&self) -> &AnalyzeOptions {
        &self.options
    }

    /// Analyse the selected pages of `source` into a document called `name`.
    pub fn run<S: PdfSource + ?Sized>(
        &self,
        source: &S,
        name: impl Into<String>,
    ) -> Result<Document> {
        let selected: Vec<u32> = (1..=source.page_count())
            .filter(|&n| self.options.pages.includes(n))
            .collect();

        self.reporter.send(Progress::Started {
            stage: Stage::Analyze,
            total: selected.len() as u32,
        });

        let mut doc = Document::new(name);
        for number in selected {
            self.cancel.check()?;
            self.reporter.send(Progress::PageStarted {
                stage: Stage::Analyze,
                page: number,
            });

            let page = self
                .analyze_page(source, number)
                .map_err(|e| e.on_page(number))?;
            log::debug!(
                "Page {}: {} text regions, {} image regions",
                number,
                page.count(RegionKind::Text),
                page.count(RegionKind::Image)
            );
            doc.add_page(page);

            self.reporter.send(Progress::PageFinished {
                stage: Stage::Analyze,
                page: number,
            });
        }

        self.reporter.send(Progress::Finished {
            stage: Stage::Analyze,
        });
        Ok(doc)
    }

    /// Analyse a single page. Text regions come first in the region list,
    /// followed by image regions.
    pub fn analyze_page<S: PdfSource + ?Sized>(&self, source: &S, number: u32) -> Result<Page> {
        let layout = &self.options.layout;
        let viewport = source.viewport(number, self.options.scale)?;
        let bitmap = source.render(number, &viewport)?;
        let fragments = source.text_fragments(number)?;

        let mut page = Page::new(number, bitmap, viewport);
        for region in build_text_regions(&fragments, &viewport, layout) {
            page.add_region(region);
        }
        for region in detect_image_regions(&page.bitmap, layout) {
            page.add_region(region);
        }
        Ok(page)
    }
}
