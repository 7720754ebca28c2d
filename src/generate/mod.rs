//! HTML generation from an edited document.
//!
//! Generation is read-only over the [`Document`](crate::model::Document):
//! running it twice yields identical HTML and the same asset list, given a
//! deterministic OCR engine.

mod html;
mod ocr;

pub use html::{
    to_html, GenerateOptions, GenerationResult, GenerationStats, HtmlGenerator, ImageAsset,
    ASSET_SCHEME,
};
pub use ocr::{NoOcr, OcrEngine};

#[cfg(feature = "ocr")]
pub use ocr::{OcrModels, OcrsEngine};
