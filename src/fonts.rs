//! Font loading, text measurement and shaping.
//!
//! Without loaded font bytes every measurement uses a fixed average advance
//! (0.5 × font size, 0.55 for bold), which keeps layout deterministic in
//! tests. With a TTF/OTF loaded, lines are shaped with `rustybuzz` so Arabic
//! joining forms and right-to-left runs measure and draw correctly.

use std::collections::HashMap;

use rustybuzz::{Direction, UnicodeBuffer};

/// A loaded font face with metrics.
#[derive(Clone)]
pub struct FontData {
    /// Raw font bytes; empty for the synthetic fallback.
    pub bytes: Vec<u8>,
    pub units_per_em: f32,
    pub ascender: f32,
    pub descender: f32,
    pub line_gap: f32,
}

/// Helvetica-like metrics used when nothing is registered under a key.
static SYNTHETIC: FontData = FontData {
    bytes: Vec::new(),
    units_per_em: 1000.0,
    ascender: 750.0,
    descender: -250.0,
    line_gap: 0.0,
};

pub struct FontManager {
    fonts: HashMap<FontKey, FontData>,
    default_key: FontKey,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FontKey {
    pub family: String,
    pub bold: bool,
    pub italic: bool,
}

impl FontKey {
    fn new(family: &str, bold: bool, italic: bool) -> Self {
        Self {
            family: family.to_string(),
            bold,
            italic,
        }
    }
}

/// One positioned glyph of a shaped line, in px relative to the line origin
/// (left edge, baseline).
#[derive(Debug, Clone, Copy)]
pub struct ShapedGlyph {
    pub glyph_id: u16,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone)]
pub struct ShapedLine {
    pub glyphs: Vec<ShapedGlyph>,
    pub width: f32,
}

impl FontManager {
    pub fn new() -> Self {
        Self {
            fonts: HashMap::new(),
            default_key: FontKey::new("Helvetica", false, false),
        }
    }

    /// Load a TTF/OTF font from bytes. The first font loaded becomes the
    /// fallback for every other style.
    pub fn load_font(
        &mut self,
        family: &str,
        bold: bool,
        italic: bool,
        bytes: Vec<u8>,
    ) -> Result<(), String> {
        let face = ttf_parser::Face::parse(&bytes, 0)
            .map_err(|e| format!("Failed to parse font: {e}"))?;

        let data = FontData {
            units_per_em: face.units_per_em() as f32,
            ascender: face.ascender() as f32,
            descender: face.descender() as f32,
            line_gap: face.line_gap() as f32,
            bytes,
        };

        let key = FontKey::new(family, bold, italic);
        if !self.has_real_fonts() {
            self.default_key = key.clone();
        }
        self.fonts.insert(key, data);
        Ok(())
    }

    /// Register synthetic Helvetica metrics when no font is loaded.
    pub fn ensure_default(&mut self) {
        if self.fonts.is_empty() {
            for bold in [false, true] {
                self.fonts
                    .insert(FontKey::new("Helvetica", bold, false), SYNTHETIC.clone());
            }
            self.default_key = FontKey::new("Helvetica", false, false);
        }
    }

    /// Font data for a key; falls back to the default face, then to the
    /// synthetic metrics.
    pub fn get(&self, key: &FontKey) -> &FontData {
        self.fonts
            .get(key)
            .filter(|d| !d.bytes.is_empty())
            .or_else(|| self.fonts.get(&self.default_key))
            .or_else(|| self.fonts.get(key))
            .unwrap_or(&SYNTHETIC)
    }

    fn data_for(&self, bold: bool, italic: bool, family: &str) -> &FontData {
        self.get(&FontKey::new(family, bold, italic))
    }

    /// Width of `text` in px at `font_size`.
    pub fn measure_text_width(
        &self,
        text: &str,
        font_size: f32,
        bold: bool,
        italic: bool,
        family: &str,
    ) -> f32 {
        match self.shape_line(text, font_size, bold, italic, family) {
            Some(line) => line.width,
            None => {
                let avg = if bold { 0.55 } else { 0.5 };
                text.chars().count() as f32 * font_size * avg
            }
        }
    }

    /// Shape one line into positioned glyphs in visual (left-to-right) order.
    /// `None` when no real font is available for the style.
    pub fn shape_line(
        &self,
        text: &str,
        font_size: f32,
        bold: bool,
        italic: bool,
        family: &str,
    ) -> Option<ShapedLine> {
        let data = self.data_for(bold, italic, family);
        if data.bytes.is_empty() {
            return None;
        }
        let face = rustybuzz::Face::from_slice(&data.bytes, 0)?;
        let scale = font_size / data.units_per_em;

        let mut runs = split_direction_runs(text);
        if runs.first().is_some_and(|r| r.rtl) {
            runs.reverse();
        }

        let mut glyphs = Vec::new();
        let mut pen_x = 0.0f32;
        for run in runs {
            let mut buffer = UnicodeBuffer::new();
            buffer.push_str(run.text);
            buffer.set_direction(if run.rtl {
                Direction::RightToLeft
            } else {
                Direction::LeftToRight
            });
            buffer.guess_segment_properties();
            let shaped = rustybuzz::shape(&face, &[], buffer);
            for (info, pos) in shaped.glyph_infos().iter().zip(shaped.glyph_positions()) {
                glyphs.push(ShapedGlyph {
                    glyph_id: info.glyph_id as u16,
                    x: pen_x + pos.x_offset as f32 * scale,
                    y: -(pos.y_offset as f32) * scale,
                });
                pen_x += pos.x_advance as f32 * scale;
            }
        }
        Some(ShapedLine {
            glyphs,
            width: pen_x,
        })
    }

    pub fn line_height_px(&self, font_size: f32, line_height_factor: f32) -> f32 {
        font_size * line_height_factor
    }

    pub fn ascender_px(&self, font_size: f32, bold: bool, italic: bool, family: &str) -> f32 {
        let data = self.data_for(bold, italic, family);
        data.ascender * font_size / data.units_per_em
    }

    /// Whether the default face has real outlines.
    pub fn has_real_fonts(&self) -> bool {
        self.fonts
            .get(&self.default_key)
            .map(|d| !d.bytes.is_empty())
            .unwrap_or(false)
    }

    /// Outline bytes for a style, after fallback; `None` for synthetic metrics.
    pub fn font_bytes(&self, bold: bool, italic: bool, family: &str) -> Option<&[u8]> {
        let data = self.data_for(bold, italic, family);
        if data.bytes.is_empty() {
            None
        } else {
            Some(data.bytes.as_slice())
        }
    }
}

impl Default for FontManager {
    fn default() -> Self {
        let mut mgr = Self::new();
        mgr.ensure_default();
        mgr
    }
}

struct DirectionRun<'a> {
    text: &'a str,
    rtl: bool,
}

fn is_rtl_char(c: char) -> bool {
    matches!(c as u32,
        0x0590..=0x08FF | 0xFB1D..=0xFDFF | 0xFE70..=0xFEFF)
}

fn is_strong_ltr(c: char) -> bool {
    c.is_alphabetic() && !is_rtl_char(c)
}

/// Split a line into runs of uniform direction. Neutral characters (digits,
/// spaces, punctuation) stay with the run they follow; leading neutrals join
/// the first strong run.
fn split_direction_runs(text: &str) -> Vec<DirectionRun<'_>> {
    let mut runs: Vec<DirectionRun<'_>> = Vec::new();
    let mut start = 0usize;
    let mut current: Option<bool> = None;
    for (i, c) in text.char_indices() {
        let dir = if is_rtl_char(c) {
            Some(true)
        } else if is_strong_ltr(c) {
            Some(false)
        } else {
            None
        };
        match (current, dir) {
            (None, Some(d)) => current = Some(d),
            (Some(cur), Some(d)) if cur != d => {
                runs.push(DirectionRun {
                    text: &text[start..i],
                    rtl: cur,
                });
                start = i;
                current = Some(d);
            }
            _ => {}
        }
    }
    if start < text.len() {
        runs.push(DirectionRun {
            text: &text[start..],
            rtl: current.unwrap_or(false),
        });
    }
    runs
}

/// Word-wrap text to fit within `max_width` px. Returns the lines.
pub fn wrap_text(
    text: &str,
    font_size: f32,
    bold: bool,
    italic: bool,
    family: &str,
    max_width: f32,
    fonts: &FontManager,
) -> Vec<String> {
    if max_width <= 0.0 || text.is_empty() {
        return vec![text.to_string()];
    }

    let mut lines: Vec<String> = Vec::new();
    for paragraph in text.split('\n') {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current_line = String::new();
        for word in &words {
            let candidate = if current_line.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current_line, word)
            };
            let w = fonts.measure_text_width(&candidate, font_size, bold, italic, family);
            if w > max_width && !current_line.is_empty() {
                lines.push(current_line);
                current_line = word.to_string();
            } else {
                current_line = candidate;
            }
        }
        if !current_line.is_empty() {
            lines.push(current_line);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristic_text_width() {
        let mgr = FontManager::default();
        let w = mgr.measure_text_width("Hello", 16.0, false, false, "Helvetica");
        // 5 chars × 16 × 0.5 = 40
        assert!((w - 40.0).abs() < 0.1);
        // Arabic counts characters too.
        let w = mgr.measure_text_width("مرحبا", 16.0, true, false, "Helvetica");
        assert!((w - 44.0).abs() < 0.1);
    }

    #[test]
    fn synthetic_fonts_do_not_shape() {
        let mgr = FontManager::default();
        assert!(mgr.shape_line("abc", 12.0, false, false, "Helvetica").is_none());
        assert!(mgr.font_bytes(false, false, "Helvetica").is_none());
        assert!(!mgr.has_real_fonts());
    }

    #[test]
    fn empty_manager_still_measures() {
        let mgr = FontManager::new();
        assert!(mgr.measure_text_width("ab", 10.0, false, false, "Other") > 0.0);
        assert!(mgr.ascender_px(10.0, false, false, "Other") > 0.0);
    }

    #[test]
    fn direction_runs_split_on_script_change() {
        let runs = split_direction_runs("مهندس Rust 2020");
        assert_eq!(runs.len(), 2);
        assert!(runs[0].rtl);
        assert_eq!(runs[0].text, "مهندس ");
        assert!(!runs[1].rtl);
        assert_eq!(runs[1].text, "Rust 2020");
    }

    #[test]
    fn garbage_font_bytes_are_rejected() {
        let mut mgr = FontManager::default();
        assert!(mgr.load_font("X", false, false, vec![1, 2, 3]).is_err());
    }

    #[test]
    fn word_wrap_basic() {
        let mgr = FontManager::default();
        let lines = wrap_text("Hello world foo bar", 16.0, false, false, "Helvetica", 60.0, &mgr);
        assert!(lines.len() >= 2, "Expected wrapping, got {:?}", lines);
    }
}
