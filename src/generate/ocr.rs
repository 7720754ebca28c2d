//! OCR engines used to recover text for text regions that have none.

use image::RgbaImage;

use crate::error::{Error, Result};

/// Recognizes text in a cropped region bitmap.
///
/// Engines are shared across the generation worker pool.
pub trait OcrEngine: Send + Sync {
    /// Recognize text; lines are separated by `\n`.
    fn recognize(&self, image: &RgbaImage) -> Result<String>;
}

/// Engine used when no OCR is configured. Always fails, so regions that
/// need OCR are emitted with empty text.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOcr;

impl OcrEngine for NoOcr {
    fn recognize(&self, _image: &RgbaImage) -> Result<String> {
        Err(Error::Ocr("no OCR engine configured".to_string()))
    }
}

impl<F> OcrEngine for F
where
    F: Fn(&RgbaImage) -> Result<String> + Send + Sync,
{
    fn recognize(&self, image: &RgbaImage) -> Result<String> {
        self(image)
    }
}

#[cfg(feature = "ocr")]
pub use self::ocrs_engine::{OcrModels, OcrsEngine};

#[cfg(feature = "ocr")]
mod ocrs_engine {
    use std::path::{Path, PathBuf};

    use image::RgbaImage;
    use ocrs::{ImageSource, OcrEngineParams};
    use rten::Model;

    use crate::error::{Error, Result};

    const DETECTION_MODEL: &str = "text-detection.rten";
    const RECOGNITION_MODEL: &str = "text-recognition.rten";

    /// Locations of the ocrs detection and recognition models.
    #[derive(Debug, Clone)]
    pub struct OcrModels {
        /// Text detection model (`.rten`)
        pub detection: PathBuf,
        /// Text recognition model (`.rten`)
        pub recognition: PathBuf,
    }

    impl OcrModels {
        /// Expect `text-detection.rten` and `text-recognition.rten` in `dir`.
        pub fn from_dir(dir: impl AsRef<Path>) -> Self {
            let dir = dir.as_ref();
            Self {
                detection: dir.join(DETECTION_MODEL),
                recognition: dir.join(RECOGNITION_MODEL),
            }
        }

        /// The ocrs cache directory (`$XDG_CACHE_HOME/ocrs` or `~/.cache/ocrs`).
        pub fn default_dir() -> PathBuf {
            if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
                PathBuf::from(xdg).join("ocrs")
            } else if let Ok(home) = std::env::var("HOME") {
                PathBuf::from(home).join(".cache").join("ocrs")
            } else {
                PathBuf::from("ocrs-models")
            }
        }
    }

    impl Default for OcrModels {
        fn default() -> Self {
            Self::from_dir(Self::default_dir())
        }
    }

    /// [`OcrEngine`](super::OcrEngine) backed by the pure-Rust `ocrs` engine.
    pub struct OcrsEngine {
        engine: ocrs::OcrEngine,
    }

    impl OcrsEngine {
        /// Load both models. This is the expensive step; reuse the engine.
        pub fn new(models: &OcrModels) -> Result<Self> {
            let load = |path: &Path| {
                Model::load_file(path).map_err(|e| {
                    Error::Ocr(format!("failed to load model {}: {}", path.display(), e))
                })
            };
            log::info!("Loading OCR models from {}", models.detection.display());
            let engine = ocrs::OcrEngine::new(OcrEngineParams {
                detection_model: Some(load(&models.detection)?),
                recognition_model: Some(load(&models.recognition)?),
                ..Default::default()
            })
            .map_err(|e| Error::Ocr(format!("failed to initialise OCR engine: {}", e)))?;
            Ok(Self { engine })
        }
    }

    impl super::OcrEngine for OcrsEngine {
        fn recognize(&self, image: &RgbaImage) -> Result<String> {
            let rgb = image::DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            let source = ImageSource::from_bytes(rgb.as_raw(), rgb.dimensions())
                .map_err(|e| Error::Ocr(format!("bad OCR input: {}", e)))?;
            let input = self
                .engine
                .prepare_input(source)
                .map_err(|e| Error::Ocr(format!("OCR preprocessing failed: {}", e)))?;
            self.engine
                .get_text(&input)
                .map_err(|e| Error::Ocr(format!("OCR recognition failed: {}", e)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_ocr_fails() {
        assert!(matches!(NoOcr.recognize(&RgbaImage::new(4, 4)), Err(Error::Ocr(_))));
    }

    #[test]
    fn test_closure_engine() {
        let engine =
            |img: &RgbaImage| -> Result<String> { Ok(format!("{}x{}", img.width(), img.height())) };
        assert_eq!(engine.recognize(&RgbaImage::new(3, 2)).unwrap(), "3x2");
    }
}
