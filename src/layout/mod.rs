//! Region detection: text regions from positioned fragments, image regions
//! from the rendered bitmap.

mod image_detector;
mod options;
mod text_builder;

pub use image_detector::{detect_image_regions, InkGrid};
pub use options::LayoutOptions;
pub use text_builder::{build_text_regions, fragment_region, merge_text_regions};
