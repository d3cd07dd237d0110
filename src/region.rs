//! Rendered regions – a template page run through parse, style and layout,
//! frozen into an absolute [`LayoutBox`] tree.

use serde::{Deserialize, Serialize};

use crate::dom::parse_html;
use crate::fonts::FontManager;
use crate::layout::{compute_layout, BoxContent, PositionedBox};
use crate::layout_config::{Align, BorderStyle, ImageContent, LayoutBox, TextContent, TextLine};
use crate::style::{self, build_styled_tree};
use crate::templates::{VisualPage, PAGE_HEIGHT_PT, PAGE_WIDTH_PT};

/// One laid-out page. `width` and `height` are the true content size, before
/// any on-screen scaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedRegion {
    pub template_id: String,
    pub width: f32,
    pub height: f32,
    pub root: LayoutBox,
}

impl RenderedRegion {
    /// Distinct image sources, in paint order.
    pub fn image_sources(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        self.root.walk(&mut |b| {
            if let Some(img) = &b.image {
                if !out.contains(&img.src.as_str()) {
                    out.push(img.src.as_str());
                }
            }
        });
        out
    }

    /// Every text line, in paint order.
    pub fn text_lines(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.root.walk(&mut |b| {
            if let Some(text) = &b.text {
                out.extend(text.lines.iter().map(|l| l.text.as_str()));
            }
        });
        out
    }
}

/// Lay out a template page at its natural size.
pub fn compose_region(page: &VisualPage, fonts: &FontManager) -> RenderedRegion {
    let dom = parse_html(&page.html);
    let styled = build_styled_tree(&dom, None);
    let boxes = compute_layout(&styled, PAGE_WIDTH_PT, 0.0, fonts);

    let mut root = LayoutBox::new(0.0, 0.0, PAGE_WIDTH_PT, 0.0);
    root.children = boxes.iter().map(|b| build_layout_box(b, fonts)).collect();
    let right = boxes.iter().map(|b| b.x + b.width).fold(0.0f32, f32::max);
    let bottom = boxes.iter().map(|b| b.y + b.height).fold(0.0f32, f32::max);
    root.width = right.max(1.0);
    root.height = if boxes.is_empty() { PAGE_HEIGHT_PT } else { bottom.max(1.0) };

    RenderedRegion {
        template_id: page.template_id.clone(),
        width: root.width,
        height: root.height,
        root,
    }
}

fn build_layout_box(pbox: &PositionedBox, fonts: &FontManager) -> LayoutBox {
    let mut lb = LayoutBox::new(pbox.x, pbox.y, pbox.width, pbox.height);

    if !pbox.style.background_color.is_transparent() {
        lb.background_color = Some(pbox.style.background_color.to_array());
    }

    if pbox.style.border_width > 0.0 {
        lb.border = Some(BorderStyle {
            width: pbox.style.border_width,
            color: pbox.style.border_color.to_array(),
        });
    }

    match &pbox.content {
        BoxContent::Text { lines, .. } => lb.text = Some(text_content(pbox, lines, fonts)),
        BoxContent::Image { src } => {
            lb.image = Some(ImageContent {
                src: src.clone(),
                width: pbox.width,
                height: pbox.height,
            });
        }
        BoxContent::None => {}
    }

    lb.children = pbox
        .children
        .iter()
        .map(|child| build_layout_box(child, fonts))
        .collect();
    lb
}

fn text_content(pbox: &PositionedBox, lines: &[String], fonts: &FontManager) -> TextContent {
    let s = &pbox.style;
    let bold = s.font_weight == style::FontWeight::Bold;
    let italic = s.font_style == style::FontStyle::Italic;
    let line_height = fonts.line_height_px(s.font_size, s.line_height);
    let inner_width = (pbox.width - s.padding.horizontal()).max(0.0);
    let align = match s.text_align {
        style::TextAlign::Left => Align::Left,
        style::TextAlign::Center => Align::Center,
        style::TextAlign::Right => Align::Right,
    };

    let text_lines = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let w = fonts.measure_text_width(line, s.font_size, bold, italic, &s.font_family);
            let slack = (inner_width - w).max(0.0);
            let x_offset = s.padding.left
                + match align {
                    Align::Left => 0.0,
                    Align::Center => slack / 2.0,
                    Align::Right => slack,
                };
            TextLine {
                text: line.clone(),
                x_offset,
                y_offset: s.padding.top + i as f32 * line_height,
            }
        })
        .collect();

    TextContent {
        lines: text_lines,
        font_family: s.font_family.clone(),
        font_size: s.font_size,
        bold,
        italic,
        color: s.color.to_array(),
        line_height,
        align,
        underline: s.text_decoration == style::TextDecoration::Underline,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::SectionKind;

    fn page(html: &str) -> VisualPage {
        VisualPage {
            template_id: "t".into(),
            html: html.into(),
            sections: Vec::<SectionKind>::new(),
        }
    }

    #[test]
    fn canvas_region_has_a4_size() {
        let p = page(&format!(
            r#"<div style="width: {PAGE_WIDTH_PT}px; min-height: {PAGE_HEIGHT_PT}px"><p>x</p></div>"#
        ));
        let region = compose_region(&p, &FontManager::default());
        assert!((region.width - PAGE_WIDTH_PT).abs() < 0.5);
        assert!((region.height - PAGE_HEIGHT_PT).abs() < 0.5);
    }

    #[test]
    fn right_aligned_lines_hug_the_right_edge() {
        let p = page(r#"<div class="text-right" style="width: 300px"><p>abcd</p></div>"#);
        let region = compose_region(&p, &FontManager::default());
        let mut found = None;
        region.root.walk(&mut |b| {
            if let Some(t) = &b.text {
                found = Some((b.x, b.width, t.lines[0].x_offset, t.align));
            }
        });
        let (_, width, x_offset, align) = found.unwrap();
        assert_eq!(align, Align::Right);
        // 4 chars × 16 × 0.5 = 32
        assert!((x_offset - (width - 32.0)).abs() < 0.5);
    }

    #[test]
    fn collects_text_and_images() {
        let p = page(
            r#"<div><img src="a.png" style="width: 10px; height: 10px" /><p>one</p><img src="a.png" style="width: 10px; height: 10px" /></div>"#,
        );
        let region = compose_region(&p, &FontManager::default());
        assert_eq!(region.image_sources(), vec!["a.png"]);
        assert_eq!(region.text_lines(), vec!["one"]);
    }
}
