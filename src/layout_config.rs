//! Frozen intermediate representations.
//!
//! [`LayoutBox`] is a laid-out page region: absolute boxes with resolved
//! colors, pre-wrapped and pre-aligned text, and image references. It is what
//! the rasterizer paints.
//!
//! [`ExportDocument`] describes the finished export: physical page size and,
//! per page, the placed JPEG and the optional watermark. It is what the PDF
//! writer consumes, and it serializes to JSON for inspection.

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Region tree
// ---------------------------------------------------------------------------

/// A positioned rectangle with optional content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutBox {
    /// Position relative to the region's top-left, in layout units.
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,

    pub background_color: Option<[f32; 4]>,
    pub border: Option<BorderStyle>,

    pub text: Option<TextContent>,
    pub image: Option<ImageContent>,

    pub children: Vec<LayoutBox>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorderStyle {
    pub width: f32,
    pub color: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub lines: Vec<TextLine>,
    pub font_family: String,
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
    pub color: [f32; 4],
    /// Line advance in layout units.
    pub line_height: f32,
    pub align: Align,
    pub underline: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    pub text: String,
    /// Offset of the line's left edge from the box's left edge.
    pub x_offset: f32,
    /// Offset of the line's top from the box's top.
    pub y_offset: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageContent {
    pub src: String,
    pub width: f32,
    pub height: f32,
}

impl LayoutBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            background_color: None,
            border: None,
            text: None,
            image: None,
            children: Vec::new(),
        }
    }

    /// Visit this box and every descendant, depth first.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a LayoutBox)) {
        f(self);
        for child in &self.children {
            child.walk(f);
        }
    }
}

// ---------------------------------------------------------------------------
// Export document
// ---------------------------------------------------------------------------

/// A finished export, ready for PDF assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    #[serde(default = "ExportDocument::default_title")]
    pub title: String,
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub pages: Vec<ExportPage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportPage {
    pub page_index: usize,
    pub image: Option<PlacedImage>,
    pub watermark: Option<Watermark>,
}

/// A JPEG placed on the page, top-left origin, in millimetres.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedImage {
    pub x_mm: f32,
    pub y_mm: f32,
    pub width_mm: f32,
    pub height_mm: f32,
    pub px_width: u32,
    pub px_height: u32,
    #[serde(serialize_with = "to_base64", deserialize_with = "from_base64")]
    pub jpeg: Vec<u8>,
}

impl std::fmt::Debug for PlacedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlacedImage")
            .field("x_mm", &self.x_mm)
            .field("y_mm", &self.y_mm)
            .field("width_mm", &self.width_mm)
            .field("height_mm", &self.height_mm)
            .field("px_width", &self.px_width)
            .field("px_height", &self.px_height)
            .field("jpeg_len", &self.jpeg.len())
            .finish()
    }
}

/// Text stamped over the page. `x_mm` is the horizontal centre, `y_mm` the
/// baseline, both from the top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Watermark {
    pub text: String,
    pub x_mm: f32,
    pub y_mm: f32,
    pub font_size_pt: f32,
    pub color: [f32; 3],
}

impl Watermark {
    /// Bottom-centre of an A4 page, 8 pt light grey.
    pub fn bottom_centre(text: impl Into<String>, page_width_mm: f32, page_height_mm: f32) -> Self {
        Self {
            text: text.into(),
            x_mm: page_width_mm / 2.0,
            y_mm: page_height_mm - 7.0,
            font_size_pt: 8.0,
            color: [200.0 / 255.0; 3],
        }
    }
}

impl ExportDocument {
    /// Empty A4 document.
    pub fn a4(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            pages: Vec::new(),
        }
    }

    fn default_title() -> String {
        crate::model::DEFAULT_TITLE.to_string()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| e.to_string())
    }

    pub fn has_watermark(&self) -> bool {
        self.pages.iter().any(|p| p.watermark.is_some())
    }
}

fn to_base64<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&BASE64_STD.encode(bytes))
}

fn from_base64<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
    let encoded = String::deserialize(d)?;
    BASE64_STD
        .decode(encoded.as_bytes())
        .map_err(serde::de::Error::custom)
}
