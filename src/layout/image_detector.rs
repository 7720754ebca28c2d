//! Image region detector.
//!
//! The bitmap is quantized into a coarse grid of ink cells; 4-connected
//! components of ink cells become candidate image regions.

use image::RgbaImage;
use rayon::prelude::*;

use crate::geometry::Rect;
use crate::model::Region;

use super::LayoutOptions;

/// Binary grid of ink cells covering a bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InkGrid {
    cols: usize,
    rows: usize,
    grid_size: u32,
    cells: Vec<bool>,
}

impl InkGrid {
    /// Quantize a bitmap. Partial cells at the right and bottom edges are
    /// judged on the pixels they actually contain.
    pub fn from_bitmap(bitmap: &RgbaImage, options: &LayoutOptions) -> Self {
        let g = options.grid_size.max(1);
        let (width, height) = bitmap.dimensions();
        let cols = width.div_ceil(g) as usize;
        let rows = height.div_ceil(g) as usize;

        let row_cells = |row: usize| -> Vec<bool> {
            (0..cols)
                .map(|col| cell_is_ink(bitmap, col as u32 * g, row as u32 * g, g, options))
                .collect()
        };

        let grid_rows: Vec<Vec<bool>> = if options.parallel {
            (0..rows).into_par_iter().map(row_cells).collect()
        } else {
            (0..rows).map(row_cells).collect()
        };

        Self {
            cols,
            rows,
            grid_size: g,
            cells: grid_rows.concat(),
        }
    }

    /// Build a grid directly from row-major cells.
    ///
    /// # Panics
    ///
    /// Panics if `cells.len() != cols * rows`.
    pub fn from_cells(cols: usize, rows: usize, grid_size: u32, cells: Vec<bool>) -> Self {
        assert_eq!(cells.len(), cols * rows, "cell count must equal cols * rows");
        Self {
            cols,
            rows,
            grid_size: grid_size.max(1),
            cells,
        }
    }

    /// Grid dimensions as (cols, rows).
    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Whether the cell at (col, row) is ink.
    pub fn is_ink(&self, col: usize, row: usize) -> bool {
        col < self.cols && row < self.rows && self.cells[row * self.cols + col]
    }

    /// Number of ink cells.
    pub fn ink_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Pixel bounding boxes of all 4-connected ink components, in the order
    /// their first cell appears in row-major scan.
    pub fn components(&self) -> Vec<Rect> {
        let mut visited = vec![false; self.cells.len()];
        let mut stack = Vec::new();
        let mut rects = Vec::new();

        for start in 0..self.cells.len() {
            if !self.cells[start] || visited[start] {
                continue;
            }

            let (mut min_c, mut min_r) = (usize::MAX, usize::MAX);
            let (mut max_c, mut max_r) = (0, 0);
            visited[start] = true;
            stack.push(start);

            while let Some(idx) = stack.pop() {
                let (col, row) = (idx % self.cols, idx / self.cols);
                min_c = min_c.min(col);
                max_c = max_c.max(col);
                min_r = min_r.min(row);
                max_r = max_r.max(row);

                for next in self.neighbours(idx).into_iter().flatten() {
                    if self.cells[next] && !visited[next] {
                        visited[next] = true;
                        stack.push(next);
                    }
                }
            }

            let g = self.grid_size as f32;
            rects.push(Rect::new(
                min_c as f32 * g,
                min_r as f32 * g,
                (max_c - min_c + 1) as f32 * g,
                (max_r - min_r + 1) as f32 * g,
            ));
        }

        rects
    }

    /// Up, down, left, right. Left/right never wrap across a row boundary.
    fn neighbours(&self, idx: usize) -> [Option<usize>; 4] {
        let col = idx % self.cols;
        [
            idx.checked_sub(self.cols),
            Some(idx + self.cols).filter(|&n| n < self.cells.len()),
            (col > 0).then(|| idx - 1),
            (col + 1 < self.cols).then(|| idx + 1),
        ]
    }
}

fn cell_is_ink(bitmap: &RgbaImage, x0: u32, y0: u32, cell: u32, options: &LayoutOptions) -> bool {
    let x1 = (x0 + cell).min(bitmap.width());
    let y1 = (y0 + cell).min(bitmap.height());
    let total = (x1 - x0) * (y1 - y0);
    if total == 0 {
        return false;
    }

    let t = options.ink_threshold;
    let mut ink = 0u32;
    for y in y0..y1 {
        for x in x0..x1 {
            let [r, g, b, a] = bitmap.get_pixel(x, y).0;
            if [r, g, b].into_iter().any(|c| over_white(c, a) < t) {
                ink += 1;
            }
        }
    }

    ink as f32 / total as f32 > options.ink_fraction
}

/// Channel value after compositing onto a white background.
fn over_white(channel: u8, alpha: u8) -> u8 {
    let (c, a) = (channel as u32, alpha as u32);
    ((c * a + 255 * (255 - a) + 127) / 255) as u8
}

/// Detect image regions on a rendered page.
///
/// Components at most `min_image_size` wide or tall are dropped as noise.
/// Text regions are not consulted; overlaps are left for the editor.
pub fn detect_image_regions(bitmap: &RgbaImage, options: &LayoutOptions) -> Vec<Region> {
    let grid = InkGrid::from_bitmap(bitmap, options);
    let components = grid.components();
    let component_count = components.len();

    let regions: Vec<Region> = components
        .into_iter()
        .filter(|r| r.width > options.min_image_size && r.height > options.min_image_size)
        .map(Region::image)
        .collect();

    log::debug!(
        "Image detector: {} ink cells, {} components, {} image regions",
        grid.ink_count(),
        component_count,
        regions.len()
    );
    regions
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn white(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]))
    }

    fn fill(img: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32) {
        for py in y..y + h {
            for px in x..x + w {
                img.put_pixel(px, py, Rgba([0, 0, 0, 255]));
            }
        }
    }

    #[test]
    fn test_all_white_page_has_no_regions() {
        let regions = detect_image_regions(&white(300, 300), &LayoutOptions::default());
        assert!(regions.is_empty());
    }

    #[test]
    fn test_single_aligned_block() {
        let mut img = white(300, 300);
        fill(&mut img, 100, 100, 60, 60);
        let regions = detect_image_regions(&img, &LayoutOptions::default());

        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].rect, Rect::new(100.0, 100.0, 60.0, 60.0));
        assert!(regions[0].is_image());
        assert!(regions[0].active);
        assert!(regions[0].style.is_none());
    }

    #[test]
    fn test_unaligned_block_rounds_to_grid() {
        let mut img = white(300, 300);
        fill(&mut img, 105, 105, 60, 60);
        let regions = detect_image_regions(&img, &LayoutOptions::default());

        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].rect, Rect::new(100.0, 100.0, 70.0, 70.0));
    }

    #[test]
    fn test_small_components_filtered() {
        let mut img = white(300, 300);
        fill(&mut img, 10, 10, 30, 30);
        fill(&mut img, 100, 100, 50, 200);
        let regions = detect_image_regions(&img, &LayoutOptions::default());
        assert!(regions.is_empty(), "50px wide is not strictly above 50");
    }

    #[test]
    fn test_sparse_cell_below_fraction_is_background() {
        let mut img = white(20, 20);
        // 10 dark pixels of 100 in the first cell: exactly 0.1, not above it.
        fill(&mut img, 0, 0, 10, 1);
        let grid = InkGrid::from_bitmap(&img, &LayoutOptions::default());
        assert!(!grid.is_ink(0, 0));

        fill(&mut img, 0, 1, 1, 1);
        let grid = InkGrid::from_bitmap(&img, &LayoutOptions::default());
        assert!(grid.is_ink(0, 0));
    }

    #[test]
    fn test_transparent_background_is_not_ink() {
        let mut img = RgbaImage::from_pixel(300, 300, Rgba([0, 0, 0, 0]));
        fill(&mut img, 100, 100, 60, 60);
        let regions = detect_image_regions(&img, &LayoutOptions::default());
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].rect, Rect::new(100.0, 100.0, 60.0, 60.0));

        // Faint black at ~2% opacity composites to near white.
        let faint = RgbaImage::from_pixel(100, 100, Rgba([0, 0, 0, 5]));
        let grid = InkGrid::from_bitmap(&faint, &LayoutOptions::default());
        assert_eq!(grid.ink_count(), 0);
    }

    #[test]
    fn test_one_cell_gap_separates_components() {
        let mut img = white(300, 200);
        fill(&mut img, 0, 0, 100, 100);
        fill(&mut img, 110, 0, 100, 100);
        let regions = detect_image_regions(&img, &LayoutOptions::default());
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].rect, Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(regions[1].rect, Rect::new(110.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn test_no_wraparound_between_rows() {
        // Last cell of row 0 and first cell of row 1 are adjacent in memory only.
        let grid = InkGrid::from_cells(3, 2, 10, vec![false, false, true, true, false, false]);
        let components = grid.components();
        assert_eq!(components.len(), 2);
        assert_eq!(components[0], Rect::new(20.0, 0.0, 10.0, 10.0));
        assert_eq!(components[1], Rect::new(0.0, 10.0, 10.0, 10.0));
    }

    #[test]
    fn test_diagonal_cells_are_separate() {
        let grid = InkGrid::from_cells(2, 2, 10, vec![true, false, false, true]);
        assert_eq!(grid.components().len(), 2);
    }

    #[test]
    fn test_l_shape_is_one_component() {
        #[rustfmt::skip]
        let cells = vec![
            true,  false, false,
            true,  false, false,
            true,  true,  true,
        ];
        let grid = InkGrid::from_cells(3, 3, 10, cells);
        assert_eq!(grid.components(), vec![Rect::new(0.0, 0.0, 30.0, 30.0)]);
    }

    #[test]
    fn test_regions_are_grid_multiples() {
        let mut img = white(401, 333);
        fill(&mut img, 13, 27, 77, 91);
        fill(&mut img, 200, 150, 123, 180);
        fill(&mut img, 330, 10, 71, 60);
        let options = LayoutOptions::default();
        for region in detect_image_regions(&img, &options) {
            let r = region.rect;
            for v in [r.x, r.y, r.width, r.height] {
                assert_eq!(v % options.grid_size as f32, 0.0);
            }
            assert!(r.width > 50.0 && r.height > 50.0);
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut img = white(257, 311);
        fill(&mut img, 3, 40, 120, 70);
        fill(&mut img, 150, 200, 90, 100);
        let parallel = InkGrid::from_bitmap(&img, &LayoutOptions::default());
        let sequential = InkGrid::from_bitmap(&img, &LayoutOptions::default().sequential());
        assert_eq!(parallel, sequential);
        assert_eq!(parallel.dimensions(), (26, 32));
    }

    #[test]
    fn test_large_component_does_not_overflow_stack() {
        let img = RgbaImage::from_pixel(2000, 2000, Rgba([0, 0, 0, 255]));
        let regions = detect_image_regions(&img, &LayoutOptions::default());
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].rect, Rect::new(0.0, 0.0, 2000.0, 2000.0));
    }
}
