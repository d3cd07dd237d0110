//! Rasterizer – paints a [`RenderedRegion`] onto an RGB canvas.
//!
//! The canvas is opaque white. Geometry is multiplied by the presentation
//! scale and the supersampling factor; whatever the presentation clips is
//! clipped here too, so a region captured at its preview presentation comes
//! out as small as it is on screen.
//!
//! Text is drawn from shaped glyph outlines when real font bytes are loaded.
//! With the synthetic metrics only, each word is drawn as a solid bar of its
//! measured width ("greeking"), which keeps layout and output deterministic.

use std::collections::HashMap;

use ab_glyph::{point, Font, FontRef, GlyphId, PxScale};
use image::{imageops, DynamicImage, Rgb, RgbImage};

use crate::fonts::FontManager;
use crate::layout_config::{LayoutBox, TextContent};
use crate::preview::Presentation;
use crate::region::RenderedRegion;

/// Upper bound on canvas pixels (about 24k × 24k).
pub const MAX_RASTER_PIXELS: u64 = 576_000_000;

/// Paint `region` as it appears under `presentation`, `supersample` times
/// denser than screen units. `images` maps `src` values to decoded images;
/// missing entries are left blank.
pub fn rasterize(
    region: &RenderedRegion,
    presentation: Presentation,
    supersample: f32,
    fonts: &FontManager,
    images: &HashMap<String, DynamicImage>,
) -> Result<RgbImage, String> {
    if !supersample.is_finite() || supersample <= 0.0 {
        return Err(format!("invalid supersampling factor {supersample}"));
    }
    let (vw, vh) = presentation.visible_extent(region.width, region.height);
    let px_w = (vw * supersample).ceil();
    let px_h = (vh * supersample).ceil();
    if px_w.is_nan() || px_h.is_nan() || px_w < 1.0 || px_h < 1.0 {
        return Err(format!(
            "region {} has no visible area ({vw} × {vh})",
            region.template_id
        ));
    }
    if px_w as u64 * px_h as u64 > MAX_RASTER_PIXELS {
        return Err(format!("raster of {px_w} × {px_h} px is too large"));
    }

    let mut painter = Painter {
        canvas: RgbImage::from_pixel(px_w as u32, px_h as u32, Rgb([255, 255, 255])),
        factor: presentation.scale * supersample,
        fonts,
        images,
    };
    painter.paint_box(&region.root);
    log::debug!(
        "rasterized {} at {}x{} px",
        region.template_id,
        painter.canvas.width(),
        painter.canvas.height()
    );
    Ok(painter.canvas)
}

struct Painter<'a> {
    canvas: RgbImage,
    /// Layout units → canvas pixels.
    factor: f32,
    fonts: &'a FontManager,
    images: &'a HashMap<String, DynamicImage>,
}

impl Painter<'_> {
    fn paint_box(&mut self, lbox: &LayoutBox) {
        if let Some(bg) = lbox.background_color {
            self.fill_rect(lbox.x, lbox.y, lbox.width, lbox.height, bg);
        }

        if let Some(border) = &lbox.border {
            let w = border.width;
            let c = border.color;
            self.fill_rect(lbox.x, lbox.y, lbox.width, w, c);
            self.fill_rect(lbox.x, lbox.y + lbox.height - w, lbox.width, w, c);
            self.fill_rect(lbox.x, lbox.y, w, lbox.height, c);
            self.fill_rect(lbox.x + lbox.width - w, lbox.y, w, lbox.height, c);
        }

        if let Some(img) = &lbox.image {
            match self.images.get(&img.src) {
                Some(decoded) => self.draw_image(lbox.x, lbox.y, img.width, img.height, decoded),
                None => log::debug!("no pixels for image at ({}, {})", lbox.x, lbox.y),
            }
        }

        if let Some(text) = &lbox.text {
            self.draw_text(lbox, text);
        }

        for child in &lbox.children {
            self.paint_box(child);
        }
    }

    /// Fill a rectangle given in layout units, blending by the colour's alpha.
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: [f32; 4]) {
        if color[3] <= 0.0 || w <= 0.0 || h <= 0.0 {
            return;
        }
        let f = self.factor;
        // Hairlines stay at least one pixel wide.
        let (x0, x1) = pixel_span(x * f, (x + w) * f, self.canvas.width());
        let (y0, y1) = pixel_span(y * f, (y + h) * f, self.canvas.height());
        for py in y0..y1 {
            for px in x0..x1 {
                blend(self.canvas.get_pixel_mut(px, py), color, 1.0);
            }
        }
    }

    fn draw_image(&mut self, x: f32, y: f32, w: f32, h: f32, img: &DynamicImage) {
        let f = self.factor;
        let tw = (w * f).round() as u32;
        let th = (h * f).round() as u32;
        if tw == 0 || th == 0 {
            return;
        }
        let scaled = imageops::resize(&img.to_rgba8(), tw, th, imageops::FilterType::Triangle);
        let ox = (x * f).round() as i64;
        let oy = (y * f).round() as i64;
        for (sx, sy, p) in scaled.enumerate_pixels() {
            let cx = ox + sx as i64;
            let cy = oy + sy as i64;
            if cx < 0 || cy < 0 || cx >= self.canvas.width() as i64 || cy >= self.canvas.height() as i64 {
                continue;
            }
            let [r, g, b, a] = p.0;
            let color = [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, a as f32 / 255.0];
            blend(self.canvas.get_pixel_mut(cx as u32, cy as u32), color, 1.0);
        }
    }

    fn draw_text(&mut self, lbox: &LayoutBox, text: &TextContent) {
        if text.color[3] <= 0.0 {
            return;
        }
        let fonts = self.fonts;
        let ascender = fonts.ascender_px(text.font_size, text.bold, text.italic, &text.font_family);
        let half_leading = (text.line_height - text.font_size).max(0.0) / 2.0;
        let outlines = fonts
            .font_bytes(text.bold, text.italic, &text.font_family)
            .and_then(|bytes| FontRef::try_from_slice(bytes).ok());

        for line in &text.lines {
            if line.text.trim().is_empty() {
                continue;
            }
            let left = lbox.x + line.x_offset;
            let top = lbox.y + line.y_offset;
            let baseline = top + half_leading + ascender;

            let drawn_width = match &outlines {
                Some(font) => self.draw_glyphs(font, text, &line.text, left, baseline),
                None => None,
            };
            let width = match drawn_width {
                Some(w) => w,
                None => self.draw_greeked(text, &line.text, left, top + half_leading),
            };

            if text.underline {
                let thickness = (text.font_size * 0.06).max(0.5);
                self.fill_rect(left, baseline + text.font_size * 0.1, width, thickness, text.color);
            }
        }
    }

    /// Draw a shaped line from real outlines. Returns the advance width, or
    /// `None` when the line could not be shaped.
    fn draw_glyphs(
        &mut self,
        font: &FontRef<'_>,
        text: &TextContent,
        line: &str,
        left: f32,
        baseline: f32,
    ) -> Option<f32> {
        let shaped =
            self.fonts
                .shape_line(line, text.font_size, text.bold, text.italic, &text.font_family)?;
        let f = self.factor;
        let size = text.font_size * f;
        let scale = font.pt_to_px_scale(size).unwrap_or(PxScale::from(size));

        for g in &shaped.glyphs {
            let glyph = GlyphId(g.glyph_id)
                .with_scale_and_position(scale, point((left + g.x) * f, (baseline + g.y) * f));
            let Some(outlined) = font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            let (cw, ch) = (self.canvas.width() as i64, self.canvas.height() as i64);
            let canvas = &mut self.canvas;
            outlined.draw(|gx, gy, coverage| {
                let px = bounds.min.x as i64 + gx as i64;
                let py = bounds.min.y as i64 + gy as i64;
                if px >= 0 && py >= 0 && px < cw && py < ch {
                    blend(canvas.get_pixel_mut(px as u32, py as u32), text.color, coverage);
                }
            });
        }
        Some(shaped.width)
    }

    /// One bar per word, middle half of the em box. Returns the line width.
    fn draw_greeked(&mut self, text: &TextContent, line: &str, left: f32, top: f32) -> f32 {
        let fonts = self.fonts;
        let measure = |s: &str| {
            fonts
                .measure_text_width(s, text.font_size, text.bold, text.italic, &text.font_family)
        };
        let space = measure(" ");
        let bar_top = top + text.font_size * 0.3;
        let bar_height = text.font_size * 0.45;

        let mut bars = Vec::new();
        let mut pen = left;
        for word in line.split(' ') {
            let w = measure(word);
            if w > 0.0 {
                bars.push((pen, w));
            }
            pen += w + space;
        }
        for (x, w) in bars {
            self.fill_rect(x, bar_top, w, bar_height, text.color);
        }
        (pen - space - left).max(0.0)
    }
}

/// Integer pixel range covering `[a, b)`, at least one pixel when non-empty,
/// clamped to `[0, limit)`.
fn pixel_span(a: f32, b: f32, limit: u32) -> (u32, u32) {
    let start = a.round().max(0.0);
    let mut end = b.round();
    if end <= start {
        end = start + 1.0;
    }
    let end = end.min(limit as f32).max(0.0);
    (start.min(limit as f32) as u32, end as u32)
}

fn blend(dst: &mut Rgb<u8>, color: [f32; 4], coverage: f32) {
    let a = (color[3] * coverage).clamp(0.0, 1.0);
    if a <= 0.0 {
        return;
    }
    for (channel, src) in dst.0.iter_mut().zip(color) {
        let mixed = src.clamp(0.0, 1.0) * 255.0 * a + *channel as f32 * (1.0 - a);
        *channel = mixed.round() as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout_config::{Align, ImageContent, TextLine};

    fn region(root: LayoutBox) -> RenderedRegion {
        RenderedRegion {
            template_id: "t".into(),
            width: root.width,
            height: root.height,
            root,
        }
    }

    fn no_images() -> HashMap<String, DynamicImage> {
        HashMap::new()
    }

    #[test]
    fn canvas_is_supersampled_and_white() {
        let r = region(LayoutBox::new(0.0, 0.0, 100.0, 50.0));
        let img = rasterize(&r, Presentation::NEUTRAL, 2.0, &FontManager::default(), &no_images())
            .unwrap();
        assert_eq!(img.dimensions(), (200, 100));
        assert_eq!(img.get_pixel(10, 10), &Rgb([255, 255, 255]));
    }

    #[test]
    fn backgrounds_are_painted() {
        let mut root = LayoutBox::new(0.0, 0.0, 100.0, 100.0);
        let mut header = LayoutBox::new(0.0, 0.0, 100.0, 20.0);
        header.background_color = Some([0.0, 0.0, 1.0, 1.0]);
        root.children.push(header);
        let img = rasterize(&region(root), Presentation::NEUTRAL, 2.0, &FontManager::default(), &no_images())
            .unwrap();
        assert_eq!(img.get_pixel(5, 5), &Rgb([0, 0, 255]));
        assert_eq!(img.get_pixel(5, 50), &Rgb([255, 255, 255]));
    }

    #[test]
    fn presentation_scales_and_clips() {
        let r = region(LayoutBox::new(0.0, 0.0, 100.0, 1000.0));
        let img = rasterize(
            &r,
            Presentation::preview(0.5, 200.0),
            1.0,
            &FontManager::default(),
            &no_images(),
        )
        .unwrap();
        assert_eq!(img.dimensions(), (50, 200));
    }

    #[test]
    fn greeked_text_leaves_ink() {
        let mut root = LayoutBox::new(0.0, 0.0, 200.0, 40.0);
        let mut t = LayoutBox::new(0.0, 0.0, 200.0, 20.0);
        t.text = Some(TextContent {
            lines: vec![TextLine {
                text: "Hello world".into(),
                x_offset: 0.0,
                y_offset: 0.0,
            }],
            font_family: "Helvetica".into(),
            font_size: 16.0,
            bold: false,
            italic: false,
            color: [0.0, 0.0, 0.0, 1.0],
            line_height: 20.0,
            align: Align::Left,
            underline: false,
        });
        root.children.push(t);
        let img = rasterize(&region(root), Presentation::NEUTRAL, 1.0, &FontManager::default(), &no_images())
            .unwrap();
        let dark = img.pixels().filter(|p| p.0[0] < 128).count();
        assert!(dark > 0);
        // Gap between the two words stays white: "Hello" is 40 wide.
        assert_eq!(img.get_pixel(42, 10), &Rgb([255, 255, 255]));
    }

    #[test]
    fn images_are_scaled_into_their_box() {
        let mut root = LayoutBox::new(0.0, 0.0, 20.0, 20.0);
        let mut b = LayoutBox::new(0.0, 0.0, 10.0, 10.0);
        b.image = Some(ImageContent {
            src: "red".into(),
            width: 10.0,
            height: 10.0,
        });
        root.children.push(b);
        let mut images = HashMap::new();
        images.insert(
            "red".to_string(),
            DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([255, 0, 0]))),
        );
        let img = rasterize(&region(root), Presentation::NEUTRAL, 2.0, &FontManager::default(), &images)
            .unwrap();
        assert_eq!(img.get_pixel(10, 10), &Rgb([255, 0, 0]));
        assert_eq!(img.get_pixel(30, 30), &Rgb([255, 255, 255]));
    }

    #[test]
    fn empty_region_is_an_error() {
        let r = region(LayoutBox::new(0.0, 0.0, 0.0, 0.0));
        assert!(rasterize(&r, Presentation::NEUTRAL, 2.0, &FontManager::default(), &no_images()).is_err());
        let r = region(LayoutBox::new(0.0, 0.0, 10.0, 10.0));
        assert!(rasterize(&r, Presentation::NEUTRAL, 0.0, &FontManager::default(), &no_images()).is_err());
    }
}
