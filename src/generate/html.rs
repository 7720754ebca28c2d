//! HTML generator.

use std::io::Cursor;

use image::{imageops, ImageFormat, RgbaImage};
use rayon::prelude::*;
use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

use crossbeam_channel::Sender;

use super::{NoOcr, OcrEngine};
use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::model::{Document, Page, Region, RegionKind, TextStyle};
use crate::progress::{CancelToken, Progress, Reporter, Stage};

/// Prefix of placeholder image references; packaging rewrites it.
pub const ASSET_SCHEME: &str = "asset://";

/// Options for [`HtmlGenerator`].
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Maximum number of OCR calls in flight
    pub ocr_workers: usize,
}

impl GenerateOptions {
    /// Create generation options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the OCR worker count (at least 1).
    pub fn with_ocr_workers(mut self, workers: usize) -> Self {
        self.ocr_workers = workers.max(1);
        self
    }
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self { ocr_workers: 1 }
    }
}

/// A cropped image region encoded as PNG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    /// File name, `image-{page}-{seq}.png`
    pub name: String,
    /// Page the image was cropped from
    pub page: u32,
    /// Crop width in pixels
    pub width: u32,
    /// Crop height in pixels
    pub height: u32,
    /// PNG bytes
    pub data: Vec<u8>,
}

/// Counters collected during generation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationStats {
    /// Pages emitted
    pub page_count: u32,
    /// Paragraphs emitted
    pub paragraph_count: u32,
    /// Image assets produced
    pub image_count: u32,
    /// Text regions sent to OCR
    pub ocr_count: u32,
    /// OCR calls that failed and produced empty text
    pub ocr_failures: u32,
    /// Active regions skipped because their crop was empty
    pub skipped_count: u32,
}

/// HTML fragment plus the image assets it references.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    /// Concatenated page containers
    pub html: String,
    /// Assets in emission order
    pub assets: Vec<ImageAsset>,
    /// Counters
    pub stats: GenerationStats,
}

/// Generate HTML without OCR.
pub fn to_html(doc: &Document) -> Result<GenerationResult> {
    HtmlGenerator::new(GenerateOptions::default(), &NoOcr).generate(doc)
}

/// One emitted item of a page, in reading order.
enum Item<'a> {
    Text { text: &'a str, style: TextStyle },
    Ocr { job: usize, style: TextStyle },
    Image { rect: Rect },
}

struct OcrJob {
    page: u32,
    crop: Option<RgbaImage>,
}

/// Serializes active regions into HTML and image assets.
pub struct HtmlGenerator<'a> {
    options: GenerateOptions,
    ocr: &'a dyn OcrEngine,
    reporter: Reporter,
    cancel: CancelToken,
}

impl<'a> HtmlGenerator<'a> {
    /// Create a generator using `ocr` for text regions without content.
    pub fn new(options: GenerateOptions, ocr: &'a dyn OcrEngine) -> Self {
        Self {
            options,
            ocr,
            reporter: Reporter::default(),
            cancel: CancelToken::default(),
        }
    }

    /// Send progress events to `sender`.
    pub fn with_progress(mut self, sender: Sender<Progress>) -> Self {
        self.reporter = Reporter::new(Some(sender));
        self
    }

    /// Observe `token` between pages and before each OCR call.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Generate HTML for every page of `doc`.
    ///
    /// OCR jobs are collected across the document first and run on at most
    /// `ocr_workers` threads; output is then assembled in page and reading
    /// order, so worker scheduling never affects the result.
    pub fn generate(&self, doc: &Document) -> Result<GenerationResult> {
        self.reporter.send(Progress::Started {
            stage: Stage::Generate,
            total: doc.page_count(),
        });

        let mut jobs = Vec::new();
        let plans: Vec<(&Page, Vec<Item<'_>>)> = doc
            .pages
            .iter()
            .map(|page| (page, plan_page(page, &mut jobs)))
            .collect();

        let ocr_results = self.run_ocr(&jobs)?;

        let mut stats = GenerationStats {
            ocr_count: jobs.len() as u32,
            ocr_failures: ocr_results.iter().filter(|r| r.is_none()).count() as u32,
            ..Default::default()
        };
        let mut html = String::new();
        let mut assets = Vec::new();

        for (page, items) in plans {
            self.cancel.check()?;
            self.reporter.send(Progress::PageStarted {
                stage: Stage::Generate,
                page: page.number,
            });

            html.push_str(&format!(
                "<div class=\"pdf-page\" id=\"page-{}\">\n",
                page.number
            ));
            let mut seq = 0;
            for item in items {
                match item {
                    Item::Text { text, style } => {
                        push_paragraph(&mut html, text, &style);
                        stats.paragraph_count += 1;
                    }
                    Item::Ocr { job, style } => match &ocr_results[job] {
                        Some(text) => {
                            for line in text.lines().filter(|l| !l.trim().is_empty()) {
                                push_paragraph(&mut html, line.trim(), &style);
                                stats.paragraph_count += 1;
                            }
                        }
                        None => {
                            push_paragraph(&mut html, "", &style);
                            stats.paragraph_count += 1;
                        }
                    },
                    Item::Image { rect } => match crop(&page.bitmap, &rect) {
                        Some(bitmap) => {
                            seq += 1;
                            let asset = encode_asset(page.number, seq, &bitmap)?;
                            let src = format!("{}{}", ASSET_SCHEME, asset.name);
                            html.push_str(&format!(
                                "<img src=\"{}\" alt=\"\" width=\"{}\" height=\"{}\">\n",
                                html_escape::encode_double_quoted_attribute(&src),
                                asset.width,
                                asset.height
                            ));
                            assets.push(asset);
                            stats.image_count += 1;
                        }
                        None => {
                            log::warn!(
                                "Page {}: image region {:?} lies outside the bitmap, skipped",
                                page.number,
                                rect
                            );
                            stats.skipped_count += 1;
                        }
                    },
                }
            }
            html.push_str("</div>\n");
            stats.page_count += 1;

            self.reporter.send(Progress::PageFinished {
                stage: Stage::Generate,
                page: page.number,
            });
        }

        self.reporter.send(Progress::Finished {
            stage: Stage::Generate,
        });
        log::debug!(
            "Generated {} paragraphs and {} images over {} pages",
            stats.paragraph_count,
            stats.image_count,
            stats.page_count
        );
        Ok(GenerationResult {
            html,
            assets,
            stats,
        })
    }

    /// Run every OCR job. `None` marks a failed or empty crop.
    fn run_ocr(&self, jobs: &[OcrJob]) -> Result<Vec<Option<String>>> {
        if jobs.is_empty() {
            return Ok(Vec::new());
        }
        log::debug!(
            "Running {} OCR jobs on {} workers",
            jobs.len(),
            self.options.ocr_workers
        );

        if self.options.ocr_workers <= 1 {
            return jobs.iter().map(|job| self.recognize(job)).collect();
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.ocr_workers)
            .build()
            .map_err(|e| Error::Other(format!("failed to start OCR workers: {}", e)))?;
        pool.install(|| jobs.par_iter().map(|job| self.recognize(job)).collect())
    }

    fn recognize(&self, job: &OcrJob) -> Result<Option<String>> {
        self.cancel.check()?;
        let Some(crop) = &job.crop else {
            log::warn!("Page {}: text region has an empty crop", job.page);
            return Ok(None);
        };
        match self.ocr.recognize(crop) {
            Ok(text) => Ok(Some(text)),
            Err(e) => {
                log::warn!("Page {}: {}", job.page, e);
                Ok(None)
            }
        }
    }
}

/// Active regions of a page in reading order; OCR crops are queued on `jobs`.
fn plan_page<'p>(page: &'p Page, jobs: &mut Vec<OcrJob>) -> Vec<Item<'p>> {
    page.reading_order()
        .into_iter()
        .map(|region: &'p Region| match region.kind {
            RegionKind::Image => Item::Image { rect: region.rect },
            RegionKind::Text => {
                let style = region.effective_style();
                match region.text_content() {
                    Some(text) => Item::Text { text, style },
                    None => {
                        jobs.push(OcrJob {
                            page: page.number,
                            crop: crop(&page.bitmap, &region.rect),
                        });
                        Item::Ocr {
                            job: jobs.len() - 1,
                            style,
                        }
                    }
                }
            }
        })
        .collect()
}

/// Crop `rect` out of `bitmap`, clamped to its bounds.
fn crop(bitmap: &RgbaImage, rect: &Rect) -> Option<RgbaImage> {
    let (x, y, w, h) = rect.pixel_window(bitmap.width(), bitmap.height())?;
    Some(imageops::crop_imm(bitmap, x, y, w, h).to_image())
}

fn encode_asset(page: u32, seq: u32, bitmap: &RgbaImage) -> Result<ImageAsset> {
    let mut data = Vec::new();
    bitmap.write_to(&mut Cursor::new(&mut data), ImageFormat::Png)?;
    Ok(ImageAsset {
        name: format!("image-{}-{}.png", page, seq),
        page,
        width: bitmap.width(),
        height: bitmap.height(),
        data,
    })
}

fn push_paragraph(html: &mut String, text: &str, style: &TextStyle) {
    let text: String = text.nfc().collect();
    html.push_str(&format!(
        "<p style=\"{}\">{}</p>\n",
        html_escape::encode_double_quoted_attribute(&style.to_css()),
        html_escape::encode_text(&text)
    ));
}
