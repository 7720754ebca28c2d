//! # relayout
//!
//! Layout reconstruction for PDF pages: turn rendered pages into editable
//! text and image regions, edit them, and emit portable HTML with cropped
//! image assets.
//!
//! ## Quick Start
//!
//! ```no_run
//! use relayout::{package::Package, Relayout};
//!
//! fn main() -> relayout::Result<()> {
//!     // Page bitmaps rendered beforehand, e.g. `pdftoppm -png -r 108 report.pdf pages/page`
//!     let doc = Relayout::new().with_raster_dir("pages/").analyze("report.pdf")?;
//!
//!     let result = relayout::generate::to_html(&doc)?;
//!     Package::new(&result, &doc.name).write_zip("report.zip")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! - **Analysis**: text fragments from the content stream are mapped into
//!   bitmap space and merged into line blocks; the page bitmap is quantized
//!   into an ink grid whose connected components become image regions.
//! - **Editing**: an [`EditorSession`] applies [`Command`]s (toggle,
//!   reclassify, resize, restyle) with undo/redo.
//! - **Generation**: active regions are serialized per page in reading
//!   order; text regions without content are recovered through OCR.
//! - **Packaging**: `index.html` plus `images/`, zipped or on disk.

pub mod analyze;
pub mod detect;
pub mod editor;
pub mod error;
pub mod generate;
pub mod geometry;
pub mod layout;
pub mod model;
pub mod package;
pub mod progress;
pub mod source;

pub use analyze::{AnalyzeOptions, Analyzer, PageSelection};
pub use detect::{check_pdf_bytes, check_pdf_path, is_pdf_bytes, PdfHeader};
pub use editor::{Command, EditorSession, Handle};
pub use error::{Error, Result};
pub use generate::{GenerateOptions, GenerationResult, HtmlGenerator, ImageAsset, NoOcr, OcrEngine};
pub use geometry::{Rect, Transform, Viewport};
pub use layout::LayoutOptions;
pub use model::{
    Document, FontFamily, Page, Region, RegionId, RegionKind, TextAlign, TextStyle,
};
pub use progress::{CancelToken, Progress, Stage};
pub use source::{LopdfSource, PageRasterizer, PdfSource, RasterDir, TextFragment, WhiteCanvas};

use std::path::{Path, PathBuf};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Analyse a PDF file using text placement only (pages render blank, so no
/// image regions are detected).
///
/// # Example
///
/// ```no_run
/// let doc = relayout::analyze_file("document.pdf").unwrap();
/// println!("Pages: {}", doc.page_count());
/// ```
pub fn analyze_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    Relayout::new().analyze(path)
}

/// Analyse a PDF file whose pages were rendered into `raster_dir`.
pub fn analyze_file_with_rasters<P: AsRef<Path>, D: Into<PathBuf>>(
    path: P,
    raster_dir: D,
) -> Result<Document> {
    Relayout::new().with_raster_dir(raster_dir).analyze(path)
}

/// Analyse a PDF file and generate HTML without OCR.
pub fn convert_file<P: AsRef<Path>>(path: P) -> Result<GenerationResult> {
    let doc = analyze_file(path)?;
    generate::to_html(&doc)
}

/// Builder for analysing PDF files.
///
/// # Example
///
/// ```no_run
/// use relayout::{PageSelection, Relayout};
///
/// let doc = Relayout::new()
///     .with_scale(2.0)
///     .with_pages(PageSelection::Range(1..=3))
///     .with_raster_dir("pages/")
///     .analyze("document.pdf")?;
/// # Ok::<(), relayout::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Relayout {
    options: AnalyzeOptions,
    raster_dir: Option<PathBuf>,
    cancel: CancelToken,
}

impl Relayout {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the render scale.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.options = self.options.with_scale(scale);
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.options = self.options.with_pages(pages);
        self
    }

    /// Set detection thresholds.
    pub fn with_layout(mut self, layout: LayoutOptions) -> Self {
        self.options = self.options.with_layout(layout);
        self
    }

    /// Load page bitmaps from a directory of pre-rendered PNGs.
    pub fn with_raster_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.raster_dir = Some(dir.into());
        self
    }

    /// Observe a cancel token.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Analyse a PDF file. The document is named after the file stem.
    pub fn analyze<P: AsRef<Path>>(&self, path: P) -> Result<Document> {
        let path = path.as_ref();
        let source = LopdfSource::open(path, self.rasterizer())?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        self.analyzer().run(&source, name)
    }

    /// Analyse a PDF held in memory.
    pub fn analyze_bytes(&self, data: &[u8], name: impl Into<String>) -> Result<Document> {
        let source = LopdfSource::from_bytes(data, self.rasterizer())?;
        self.analyzer().run(&source, name)
    }

    fn analyzer(&self) -> Analyzer {
        Analyzer::new(self.options.clone()).with_cancel(self.cancel.clone())
    }

    fn rasterizer(&self) -> Box<dyn PageRasterizer> {
        match &self.raster_dir {
            Some(dir) => Box::new(RasterDir::new(dir.clone())),
            None => Box::new(WhiteCanvas),
        }
    }
}
