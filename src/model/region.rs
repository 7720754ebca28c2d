//! Region types.

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// Address of a region: 1-indexed page number plus position in that page's
/// region list. Stable for the life of a document because regions are
/// deactivated, never removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId {
    /// Page number (1-indexed)
    pub page: u32,
    /// Index into the page's regions
    pub index: usize,
}

impl RegionId {
    /// Create a region address.
    pub fn new(page: u32, index: usize) -> Self {
        Self { page, index }
    }
}

impl std::fmt::Display for RegionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "page {} region {}", self.page, self.index)
    }
}

/// Classification of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    /// Text, serialized as styled paragraphs
    Text,
    /// Image, serialized as a cropped bitmap asset
    Image,
}

impl RegionKind {
    /// The other kind.
    pub fn flipped(self) -> Self {
        match self {
            RegionKind::Text => RegionKind::Image,
            RegionKind::Image => RegionKind::Text,
        }
    }
}

impl std::fmt::Display for RegionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegionKind::Text => write!(f, "text"),
            RegionKind::Image => write!(f, "image"),
        }
    }
}

/// Generic font family of a text region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontFamily {
    /// Sans-serif stack
    #[default]
    Sans,
    /// Serif stack
    Serif,
    /// Monospace stack
    Monospace,
}

impl FontFamily {
    /// Guess the family from a PDF font name (e.g. "Times-Roman", "CourierNew").
    pub fn from_font_name(name: &str) -> Self {
        let name = name.to_lowercase();
        if name.contains("times") {
            FontFamily::Serif
        } else if name.contains("courier") {
            FontFamily::Monospace
        } else {
            FontFamily::Sans
        }
    }

    /// Concrete CSS font stack.
    pub fn css_stack(&self) -> &'static str {
        match self {
            FontFamily::Sans => "Arial, Helvetica, sans-serif",
            FontFamily::Serif => "'Times New Roman', Times, serif",
            FontFamily::Monospace => "'Courier New', Courier, monospace",
        }
    }
}

/// Horizontal alignment of a text region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Left aligned
    #[default]
    Left,
    /// Centered
    Center,
    /// Right aligned
    Right,
}

impl TextAlign {
    /// CSS `text-align` keyword.
    pub fn as_css(&self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        }
    }
}

/// Presentation of a text region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStyle {
    /// Font family
    pub font_family: FontFamily,
    /// Font size in pixels (always positive)
    pub font_size: u32,
    /// Horizontal alignment
    pub text_align: TextAlign,
}

impl TextStyle {
    /// Fallback font size used whenever no positive size is known.
    pub const DEFAULT_FONT_SIZE: u32 = 16;

    /// Create a style. A zero size falls back to the default size.
    pub fn new(font_family: FontFamily, font_size: u32, text_align: TextAlign) -> Self {
        let font_size = if font_size == 0 {
            Self::DEFAULT_FONT_SIZE
        } else {
            font_size
        };
        Self {
            font_family,
            font_size,
            text_align,
        }
    }

    /// Inline CSS declaration list for this style.
    pub fn to_css(&self) -> String {
        format!(
            "font-family: {}; font-size: {}px; text-align: {};",
            self.font_family.css_stack(),
            self.font_size,
            self.text_align.as_css()
        )
    }
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: FontFamily::Sans,
            font_size: Self::DEFAULT_FONT_SIZE,
            text_align: TextAlign::Left,
        }
    }
}

/// One rectangular area of a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Text or image
    pub kind: RegionKind,
    /// Geometry in bitmap pixels
    pub rect: Rect,
    /// Inactive regions stay editable but are skipped at generation
    pub active: bool,
    /// Extracted text; `None` (or blank) means OCR at generation time
    pub content: Option<String>,
    /// Text presentation. Kept across reclassification to image so that
    /// flipping back restores it.
    pub style: Option<TextStyle>,
}

impl Region {
    /// A text region with extracted content.
    pub fn text(rect: Rect, content: impl Into<String>, style: TextStyle) -> Self {
        Self {
            kind: RegionKind::Text,
            rect,
            active: true,
            content: Some(content.into()),
            style: Some(style),
        }
    }

    /// An image region.
    pub fn image(rect: Rect) -> Self {
        Self {
            kind: RegionKind::Image,
            rect,
            active: true,
            content: None,
            style: None,
        }
    }

    /// Whether this is a text region.
    pub fn is_text(&self) -> bool {
        self.kind == RegionKind::Text
    }

    /// Whether this is an image region.
    pub fn is_image(&self) -> bool {
        self.kind == RegionKind::Image
    }

    /// Extracted text, if any non-blank text is present.
    pub fn text_content(&self) -> Option<&str> {
        self.content.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Whether generation must run OCR to obtain this region's text.
    pub fn needs_ocr(&self) -> bool {
        self.is_text() && self.text_content().is_none()
    }

    /// Style used when serializing as text.
    pub fn effective_style(&self) -> TextStyle {
        self.style.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_family_from_name() {
        assert_eq!(FontFamily::from_font_name("Times-Roman"), FontFamily::Serif);
        assert_eq!(FontFamily::from_font_name("ABCDEF+TimesNewRomanPSMT"), FontFamily::Serif);
        assert_eq!(FontFamily::from_font_name("Courier-Bold"), FontFamily::Monospace);
        assert_eq!(FontFamily::from_font_name("Helvetica"), FontFamily::Sans);
        assert_eq!(FontFamily::from_font_name(""), FontFamily::Sans);
    }

    #[test]
    fn test_style_css() {
        let style = TextStyle::new(FontFamily::Serif, 20, TextAlign::Center);
        assert_eq!(
            style.to_css(),
            "font-family: 'Times New Roman', Times, serif; font-size: 20px; text-align: center;"
        );
        assert_eq!(TextStyle::new(FontFamily::Sans, 0, TextAlign::Left).font_size, 16);
    }

    #[test]
    fn test_needs_ocr() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(!Region::text(rect, "hello", TextStyle::default()).needs_ocr());
        assert!(Region::text(rect, "  ", TextStyle::default()).needs_ocr());
        assert!(!Region::image(rect).needs_ocr());
    }
}
