//! Layout detection options and thresholds.

/// Thresholds used by the text merge pass and the image detector.
#[derive(Debug, Clone)]
pub struct LayoutOptions {
    /// Image detector grid cell size in pixels
    pub grid_size: u32,

    /// A channel value below this marks a pixel as ink (0-255)
    pub ink_threshold: u8,

    /// Fraction of ink pixels a cell must exceed to count as an ink cell
    pub ink_fraction: f32,

    /// Image regions must be strictly wider and taller than this (pixels)
    pub min_image_size: f32,

    /// Max |Δy| in pixels for two text regions to count as the same line
    pub line_tolerance: f32,

    /// Max horizontal gap in pixels bridged by the text merge pass
    pub merge_gap: f32,

    /// Quantize grid rows on the rayon pool
    pub parallel: bool,
}

impl LayoutOptions {
    /// Create new layout options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the grid cell size. Zero is bumped to one.
    pub fn with_grid_size(mut self, size: u32) -> Self {
        self.grid_size = size.max(1);
        self
    }

    /// Set the ink channel threshold.
    pub fn with_ink_threshold(mut self, threshold: u8) -> Self {
        self.ink_threshold = threshold;
        self
    }

    /// Set the ink fraction needed for a cell.
    pub fn with_ink_fraction(mut self, fraction: f32) -> Self {
        self.ink_fraction = fraction.clamp(0.0, 1.0);
        self
    }

    /// Set the minimum image region size.
    pub fn with_min_image_size(mut self, size: f32) -> Self {
        self.min_image_size = size;
        self
    }

    /// Set the same-line tolerance and merge gap of the text merge pass.
    pub fn with_merge_thresholds(mut self, line_tolerance: f32, merge_gap: f32) -> Self {
        self.line_tolerance = line_tolerance;
        self.merge_gap = merge_gap;
        self
    }

    /// Disable parallel grid quantization.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            grid_size: 10,
            ink_threshold: 240,
            ink_fraction: 0.1,
            min_image_size: 50.0,
            line_tolerance: 10.0,
            merge_gap: 20.0,
            parallel: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_options_builder() {
        let options = LayoutOptions::new()
            .with_grid_size(0)
            .with_ink_fraction(2.0)
            .with_merge_thresholds(5.0, 8.0)
            .sequential();

        assert_eq!(options.grid_size, 1);
        assert_eq!(options.ink_fraction, 1.0);
        assert_eq!(options.line_tolerance, 5.0);
        assert_eq!(options.merge_gap, 8.0);
        assert!(!options.parallel);
    }

    #[test]
    fn test_default_options() {
        let options = LayoutOptions::default();
        assert_eq!(options.grid_size, 10);
        assert_eq!(options.ink_threshold, 240);
        assert_eq!(options.min_image_size, 50.0);
        assert!(options.parallel);
    }
}
