//! Text region builder.
//!
//! Maps positioned text fragments into bitmap space, assigns a heuristic
//! style, then greedily merges fragments on the same line into blocks.

use crate::geometry::{Rect, Viewport};
use crate::model::{FontFamily, Region, TextAlign, TextStyle};
use crate::source::TextFragment;

use super::LayoutOptions;

/// Convert one fragment into a text region in bitmap pixels.
///
/// The baseline-anchored box `(e, f)..(e + width, f + height)` is pushed
/// through the viewport and the min/max of all four corners is taken, so
/// flipped axes still produce a well-formed rectangle. Blank fragments
/// yield `None`.
pub fn fragment_region(fragment: &TextFragment, viewport: &Viewport) -> Option<Region> {
    if fragment.text.trim().is_empty() {
        return None;
    }

    let e = fragment.transform.translate_x();
    let f = fragment.transform.translate_y();
    let height = fragment
        .height
        .unwrap_or_else(|| fragment.transform.vertical_scale().abs());

    let t = &viewport.transform;
    let corners = [
        t.apply(e, f),
        t.apply(e + fragment.width, f),
        t.apply(e, f + height),
        t.apply(e + fragment.width, f + height),
    ];
    let rect = Rect::bounding(&corners);

    let size = (fragment.transform.vertical_scale().abs() * viewport.scale).round();
    let font_size = if size > 0.0 {
        size as u32
    } else {
        TextStyle::DEFAULT_FONT_SIZE
    };
    let style = TextStyle::new(
        FontFamily::from_font_name(&fragment.font_name),
        font_size,
        TextAlign::Left,
    );

    Some(Region::text(rect, fragment.text.clone(), style))
}

/// Greedy single-pass merge of text regions into lines/blocks.
///
/// Regions are sorted by `(y, x)`. The running block absorbs the next region
/// when they sit on the same line (|Δy| below the line tolerance, or their
/// vertical spans overlap) and the next region starts before the block's
/// right edge plus the merge gap. The earlier region's style wins.
pub fn merge_text_regions(mut regions: Vec<Region>, options: &LayoutOptions) -> Vec<Region> {
    regions.sort_by(|a, b| {
        a.rect
            .y
            .total_cmp(&b.rect.y)
            .then_with(|| a.rect.x.total_cmp(&b.rect.x))
    });

    let mut merged = Vec::with_capacity(regions.len());
    let mut iter = regions.into_iter();
    let Some(mut current) = iter.next() else {
        return merged;
    };

    for next in iter {
        let same_line = (current.rect.y - next.rect.y).abs() < options.line_tolerance
            || current.rect.overlaps_vertically(&next.rect);
        let close = next.rect.x < current.rect.right() + options.merge_gap;

        if same_line && close {
            current.rect = current.rect.union(&next.rect);
            current.content = match (current.content.take(), next.content) {
                (Some(a), Some(b)) => Some(format!("{} {}", a, b)),
                (a, b) => a.or(b),
            };
        } else {
            merged.push(std::mem::replace(&mut current, next));
        }
    }
    merged.push(current);

    merged
}

/// Build merged text regions for a page from its fragments.
pub fn build_text_regions(
    fragments: &[TextFragment],
    viewport: &Viewport,
    options: &LayoutOptions,
) -> Vec<Region> {
    let regions: Vec<Region> = fragments
        .iter()
        .filter_map(|f| fragment_region(f, viewport))
        .collect();
    let fragment_count = regions.len();

    let merged = merge_text_regions(regions, options);
    log::debug!(
        "Merged {} text fragments into {} text regions",
        fragment_count,
        merged.len()
    );
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Transform;

    fn region(x: f32, y: f32, width: f32, text: &str) -> Region {
        Region::text(Rect::new(x, y, width, 12.0), text, TextStyle::default())
    }

    fn fragment(text: &str, transform: [f32; 6], width: f32, font: &str) -> TextFragment {
        TextFragment {
            text: text.to_string(),
            transform: Transform(transform),
            width,
            height: None,
            font_name: font.to_string(),
        }
    }

    #[test]
    fn test_merge_same_line_scenario() {
        let regions = vec![
            region(10.0, 100.0, 50.0, "Hello"),
            region(62.0, 102.0, 40.0, "world"),
            region(10.0, 200.0, 40.0, "Below"),
        ];
        let merged = merge_text_regions(regions, &LayoutOptions::default());

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].rect.x, 10.0);
        assert_eq!(merged[0].rect.right(), 102.0);
        assert_eq!(merged[0].rect.y, 100.0);
        assert_eq!(merged[0].rect.bottom(), 114.0);
        assert_eq!(merged[0].content.as_deref(), Some("Hello world"));
        assert_eq!(merged[1].content.as_deref(), Some("Below"));
    }

    #[test]
    fn test_merge_concatenates_in_sort_order() {
        let regions = vec![
            region(70.0, 50.0, 20.0, "c"),
            region(10.0, 50.0, 20.0, "a"),
            region(40.0, 50.0, 20.0, "b"),
        ];
        let merged = merge_text_regions(regions, &LayoutOptions::default());
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].content.as_deref(), Some("a b c"));
        assert_eq!(merged[0].rect, Rect::new(10.0, 50.0, 80.0, 12.0));
    }

    #[test]
    fn test_large_gap_breaks_line() {
        let regions = vec![region(10.0, 50.0, 20.0, "left"), region(60.0, 50.0, 20.0, "right")];
        let merged = merge_text_regions(regions, &LayoutOptions::default());
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_vertical_overlap_merges_beyond_tolerance() {
        let tall = Region::text(Rect::new(10.0, 100.0, 30.0, 40.0), "tall", TextStyle::default());
        let regions = vec![tall, region(45.0, 125.0, 20.0, "inside")];
        let merged = merge_text_regions(regions, &LayoutOptions::default());
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].content.as_deref(), Some("tall inside"));
    }

    #[test]
    fn test_earlier_style_retained() {
        let serif = TextStyle::new(FontFamily::Serif, 24, TextAlign::Left);
        let regions = vec![
            Region::text(Rect::new(10.0, 10.0, 20.0, 12.0), "a", serif),
            region(35.0, 11.0, 20.0, "b"),
        ];
        let merged = merge_text_regions(regions, &LayoutOptions::default());
        assert_eq!(merged[0].style, Some(serif));
    }

    #[test]
    fn test_merge_empty_input() {
        assert!(merge_text_regions(Vec::new(), &LayoutOptions::default()).is_empty());
    }

    #[test]
    fn test_fragment_region_maps_through_viewport() {
        let viewport = Viewport::from_media_box([0.0, 0.0, 612.0, 792.0], 1.5);
        let frag = fragment("Title", [12.0, 0.0, 0.0, 12.0, 100.0, 700.0], 40.0, "Times-Bold");
        let region = fragment_region(&frag, &viewport).unwrap();

        // Baseline at y=700 maps to 138px; the box extends 12pt upward.
        assert!((region.rect.x - 150.0).abs() < 1e-3);
        assert!((region.rect.y - 120.0).abs() < 1e-3);
        assert!((region.rect.width - 60.0).abs() < 1e-3);
        assert!((region.rect.height - 18.0).abs() < 1e-3);

        let style = region.style.unwrap();
        assert_eq!(style.font_family, FontFamily::Serif);
        assert_eq!(style.font_size, 18);
        assert_eq!(style.text_align, TextAlign::Left);
    }

    #[test]
    fn test_fragment_zero_scale_uses_default_size() {
        let viewport = Viewport::from_media_box([0.0, 0.0, 100.0, 100.0], 1.0);
        let frag = fragment("x", [1.0, 0.0, 0.0, 0.0, 10.0, 50.0], 5.0, "Courier");
        let region = fragment_region(&frag, &viewport).unwrap();
        let style = region.style.unwrap();
        assert_eq!(style.font_size, 16);
        assert_eq!(style.font_family, FontFamily::Monospace);
    }

    #[test]
    fn test_blank_fragments_skipped() {
        let viewport = Viewport::from_media_box([0.0, 0.0, 100.0, 100.0], 1.0);
        let frags = vec![
            fragment("  ", [10.0, 0.0, 0.0, 10.0, 0.0, 50.0], 5.0, "Helvetica"),
            fragment("A", [10.0, 0.0, 0.0, 10.0, 0.0, 50.0], 5.0, "Helvetica"),
        ];
        let regions = build_text_regions(&frags, &viewport, &LayoutOptions::default());
        assert_eq!(regions.len(), 1);
    }
}
