//! Layout engine – uses Taffy to compute flexbox / grid layout from a styled
//! DOM tree, then converts the result into a tree of positioned boxes.

use std::collections::HashMap;
use taffy::prelude::*;

use crate::dom::Tag;
use crate::fonts::{wrap_text, FontManager};
use crate::images;
use crate::style::{
    self, ComputedStyle, Edges, FontStyle as CssFontStyle, FontWeight, StyledNode, TextAlign,
};

/// A positioned box in page coordinates.
#[derive(Debug, Clone)]
pub struct PositionedBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub style: ComputedStyle,
    pub content: BoxContent,
    pub children: Vec<PositionedBox>,
}

#[derive(Debug, Clone)]
pub enum BoxContent {
    None,
    Text { text: String, lines: Vec<String> },
    Image { src: String },
}

impl PositionedBox {
    /// Visit this box and every descendant, depth first.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a PositionedBox)) {
        f(self);
        for child in &self.children {
            child.walk(f);
        }
    }
}

// ---------------------------------------------------------------------------
// Build Taffy tree from styled nodes
// ---------------------------------------------------------------------------

struct LayoutBuilder<'a> {
    taffy: TaffyTree<()>,
    fonts: &'a FontManager,
    node_styles: HashMap<NodeId, ComputedStyle>,
    node_content: HashMap<NodeId, BoxContent>,
    available_width: f32,
}

impl<'a> LayoutBuilder<'a> {
    fn new(fonts: &'a FontManager, available_width: f32) -> Self {
        Self {
            taffy: TaffyTree::new(),
            fonts,
            node_styles: HashMap::new(),
            node_content: HashMap::new(),
            available_width,
        }
    }

    fn collect_inline_text(node: &StyledNode) -> String {
        match node {
            StyledNode::Text { text, .. } => text.clone(),
            StyledNode::Element { children, .. } => children
                .iter()
                .map(Self::collect_inline_text)
                .collect::<Vec<_>>()
                .join(""),
        }
    }

    /// True when every child is text or an inline element.
    fn all_inline(children: &[StyledNode]) -> bool {
        children.iter().all(|c| match c {
            StyledNode::Text { .. } => true,
            StyledNode::Element {
                style,
                children: gc,
                ..
            } => {
                matches!(
                    style.display,
                    style::Display::Inline | style::Display::InlineBlock
                ) && Self::all_inline(gc)
            }
        })
    }

    fn build_node(&mut self, styled: &StyledNode, parent_width: f32) -> NodeId {
        match styled {
            StyledNode::Text { text, style } => self.build_text_node(text, style, parent_width),
            StyledNode::Element {
                tag,
                style,
                children,
                attrs,
            } => self.build_element_node(tag, style, children, attrs, parent_width),
        }
    }

    /// Leaf holding pre-wrapped text. Margin and padding come from `style`, so
    /// a paragraph keeps its spacing; bare text nodes carry none.
    ///
    /// Left-aligned text is sized to its widest line. Centered and
    /// right-aligned text stretches to the container so the renderer can
    /// offset each line inside it.
    fn build_text_node(&mut self, text: &str, style: &ComputedStyle, parent_width: f32) -> NodeId {
        let bold = style.font_weight == FontWeight::Bold;
        let italic = style.font_style == CssFontStyle::Italic;
        let family = &style.font_family;
        let font_size = style.font_size;
        let line_height_px = self.fonts.line_height_px(font_size, style.line_height);

        let h_space = style.padding.horizontal();
        let h_outer = h_space + style.margin.horizontal();
        let max_w = if parent_width > 0.0 {
            (parent_width - h_outer).max(1.0)
        } else {
            self.available_width
        };
        let lines = wrap_text(
            text.trim(),
            font_size,
            bold,
            italic,
            family,
            max_w,
            self.fonts,
        );

        let text_width = lines
            .iter()
            .map(|l| {
                self.fonts
                    .measure_text_width(l, font_size, bold, italic, family)
            })
            .fold(0.0f32, f32::max);
        let box_width = text_width + h_space;
        let box_height =
            lines.len() as f32 * line_height_px + style.padding.vertical();

        let width = match style.text_align {
            TextAlign::Left => Dimension::Length(box_width),
            TextAlign::Center | TextAlign::Right => Dimension::Auto,
        };
        let taffy_style = Style {
            size: Size {
                width,
                height: Dimension::Length(box_height),
            },
            min_size: Size {
                width: Dimension::Length(box_width),
                height: Dimension::Auto,
            },
            flex_shrink: 0.0,
            margin: margin_rect(style.margin),
            padding: padding_rect(style.padding),
            ..Default::default()
        };

        let node = self.taffy.new_leaf(taffy_style).unwrap();
        self.node_styles.insert(node, style.clone());
        self.node_content.insert(
            node,
            BoxContent::Text {
                text: text.trim().to_string(),
                lines,
            },
        );
        node
    }

    /// Width each child should wrap its text to. Rows and grids split the
    /// space left after fixed-width children among the rest.
    fn child_wrap_width(style: &ComputedStyle, children: &[StyledNode], inner_width: f32) -> f32 {
        let columns = match style.display {
            style::Display::Flex if style.flex_direction == style::FlexDirection::Row => {
                let fixed: Vec<f32> = children
                    .iter()
                    .filter_map(|c| match c {
                        StyledNode::Element { style: cs, .. } => match cs.width {
                            style::Dimension::Px(w) => Some(w + cs.margin.horizontal()),
                            _ => None,
                        },
                        StyledNode::Text { .. } => None,
                    })
                    .collect();
                let elements = children
                    .iter()
                    .filter(|c| matches!(c, StyledNode::Element { .. }))
                    .count();
                let flexible = elements.saturating_sub(fixed.len()).max(1);
                let gap_total = style.gap * elements.saturating_sub(1) as f32;
                let free = inner_width - gap_total - fixed.iter().sum::<f32>();
                return (free / flexible as f32).max(1.0);
            }
            style::Display::Grid => style.grid_columns.max(1),
            _ => return inner_width,
        };
        let gap_total = style.gap * (columns - 1) as f32;
        ((inner_width - gap_total) / columns as f32).max(1.0)
    }

    fn build_element_node(
        &mut self,
        tag: &Tag,
        style: &ComputedStyle,
        children: &[StyledNode],
        attrs: &HashMap<String, String>,
        parent_width: f32,
    ) -> NodeId {
        // Headings and paragraphs with inline-only content become one text run.
        if tag.is_paragraph() && !children.is_empty() && Self::all_inline(children) {
            let raw: String = children.iter().map(Self::collect_inline_text).collect();
            let combined: String = raw.split_whitespace().collect::<Vec<_>>().join(" ");
            if !combined.is_empty() {
                return self.build_text_node(&combined, style, parent_width);
            }
        }

        let my_width = match style.width {
            style::Dimension::Px(w) => w,
            style::Dimension::Percent(p) => parent_width * p / 100.0,
            style::Dimension::Auto => parent_width - style.margin.horizontal(),
        };
        let inner_width = my_width - style.padding.horizontal() - 2.0 * style.border_width;
        let child_build_width = Self::child_wrap_width(style, children, inner_width);

        let child_nodes: Vec<NodeId> = children
            .iter()
            .map(|child| self.build_node(child, child_build_width))
            .collect();

        // An <img> without explicit size takes its intrinsic size from the
        // decoded data URI; otherwise it would collapse to 0×0.
        let style_override = if *tag == Tag::Img
            && (matches!(style.width, style::Dimension::Auto)
                || matches!(style.height, style::Dimension::Auto))
        {
            let src = attrs.get("src").map(|s| s.as_str()).unwrap_or("");
            resolve_img_auto_dimensions(src, style, parent_width)
        } else {
            None
        };

        let effective_style = style_override.as_ref().unwrap_or(style);
        let taffy_style = self.computed_to_taffy(effective_style);
        let node = self
            .taffy
            .new_with_children(taffy_style, &child_nodes)
            .unwrap();
        self.node_styles.insert(node, effective_style.clone());

        if *tag == Tag::Img {
            let src = attrs.get("src").cloned().unwrap_or_default();
            self.node_content.insert(node, BoxContent::Image { src });
        }

        node
    }

    fn computed_to_taffy(&self, s: &ComputedStyle) -> Style {
        let mut ts = Style::default();

        match s.display {
            style::Display::Flex => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = match s.flex_direction {
                    style::FlexDirection::Row => taffy::FlexDirection::Row,
                    style::FlexDirection::Column => taffy::FlexDirection::Column,
                };
                ts.flex_wrap = match s.flex_wrap {
                    style::FlexWrap::NoWrap => taffy::FlexWrap::NoWrap,
                    style::FlexWrap::Wrap => taffy::FlexWrap::Wrap,
                };
                ts.justify_content = Some(match s.justify_content {
                    style::JustifyContent::Start => taffy::JustifyContent::Start,
                    style::JustifyContent::End => taffy::JustifyContent::End,
                    style::JustifyContent::Center => taffy::JustifyContent::Center,
                    style::JustifyContent::SpaceBetween => taffy::JustifyContent::SpaceBetween,
                });
                ts.align_items = Some(match s.align_items {
                    style::AlignItems::Start => taffy::AlignItems::Start,
                    style::AlignItems::End => taffy::AlignItems::End,
                    style::AlignItems::Center => taffy::AlignItems::Center,
                    style::AlignItems::Stretch => taffy::AlignItems::Stretch,
                });
            }
            style::Display::Grid => {
                ts.display = taffy::Display::Grid;
                let cols = s.grid_columns.max(1);
                ts.grid_template_columns = vec![taffy::TrackSizingFunction::from_flex(1.0); cols];
            }
            style::Display::Block | style::Display::InlineBlock => {
                // Block-level elements stack vertically.
                ts.display = taffy::Display::Flex;
                ts.flex_direction = taffy::FlexDirection::Column;
            }
            style::Display::Inline => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = taffy::FlexDirection::Row;
                ts.flex_wrap = taffy::FlexWrap::Wrap;
            }
            style::Display::None => {
                ts.display = taffy::Display::None;
            }
        }

        ts.size = Size {
            width: self.dim_to_taffy(s.width),
            height: self.dim_to_taffy(s.height),
        };
        // Flex items may shrink below their content width.
        ts.min_size = Size {
            width: if s.flex_shrink > 0.0 || s.flex_grow > 0.0 {
                taffy::Dimension::Length(0.0)
            } else {
                taffy::Dimension::Auto
            },
            height: self.dim_to_taffy(s.min_height),
        };
        ts.max_size = Size {
            width: self.dim_to_taffy(s.max_width),
            height: taffy::Dimension::Auto,
        };

        ts.flex_grow = s.flex_grow;
        ts.flex_shrink = s.flex_shrink;
        // Fixed-size boxes (photos, bars) keep their size in crowded rows.
        if matches!(s.width, style::Dimension::Px(_)) {
            ts.flex_shrink = 0.0;
        }

        ts.margin = margin_rect(s.margin);
        ts.padding = padding_rect(s.padding);
        ts.border = padding_rect(Edges::uniform(s.border_width));
        ts.gap = Size {
            width: LengthPercentage::Length(s.gap),
            height: LengthPercentage::Length(s.gap),
        };

        ts
    }

    fn dim_to_taffy(&self, d: style::Dimension) -> taffy::Dimension {
        match d {
            style::Dimension::Auto => taffy::Dimension::Auto,
            style::Dimension::Px(v) => taffy::Dimension::Length(v),
            style::Dimension::Percent(v) => taffy::Dimension::Percent(v / 100.0),
        }
    }

    fn extract(&self, node: NodeId, offset_x: f32, offset_y: f32) -> PositionedBox {
        let layout = self.taffy.layout(node).unwrap();
        let style = self.node_styles.get(&node).cloned().unwrap_or_default();
        let content = self
            .node_content
            .get(&node)
            .cloned()
            .unwrap_or(BoxContent::None);

        let x = offset_x + layout.location.x;
        let y = offset_y + layout.location.y;

        let children: Vec<PositionedBox> = self
            .taffy
            .children(node)
            .unwrap_or_default()
            .iter()
            .map(|&child| self.extract(child, x, y))
            .collect();

        PositionedBox {
            x,
            y,
            width: layout.size.width,
            height: layout.size.height,
            style,
            content,
            children,
        }
    }
}

fn margin_rect(e: Edges) -> Rect<LengthPercentageAuto> {
    Rect {
        top: LengthPercentageAuto::Length(e.top),
        right: LengthPercentageAuto::Length(e.right),
        bottom: LengthPercentageAuto::Length(e.bottom),
        left: LengthPercentageAuto::Length(e.left),
    }
}

fn padding_rect(e: Edges) -> Rect<LengthPercentage> {
    Rect {
        top: LengthPercentage::Length(e.top),
        right: LengthPercentage::Length(e.right),
        bottom: LengthPercentage::Length(e.bottom),
        left: LengthPercentage::Length(e.left),
    }
}

/// Replace `Auto` width/height of an image with sizes derived from its
/// intrinsic pixel size. Only data URIs are inspected at layout time; `None`
/// means no change.
fn resolve_img_auto_dimensions(
    src: &str,
    style: &ComputedStyle,
    parent_width: f32,
) -> Option<ComputedStyle> {
    let bytes = images::decode_data_uri(src)?;
    let img = ::image::load_from_memory(&bytes).ok()?;
    let (px_w, px_h) = (img.width() as f32, img.height() as f32);
    if px_w == 0.0 || px_h == 0.0 {
        return None;
    }
    let aspect = px_w / px_h;

    let known_w = match style.width {
        style::Dimension::Px(v) => Some(v),
        style::Dimension::Percent(p) => Some(parent_width * p / 100.0),
        style::Dimension::Auto => None,
    };
    let known_h = match style.height {
        style::Dimension::Px(v) => Some(v),
        _ => None,
    };

    let mut s = style.clone();
    match (known_w, known_h) {
        (Some(w), None) => s.height = style::Dimension::Px((w / aspect).max(1.0)),
        (None, Some(h)) => s.width = style::Dimension::Px((h * aspect).max(1.0)),
        // 1 image pixel = 1 layout unit.
        (None, None) => {
            s.width = style::Dimension::Px(px_w);
            s.height = style::Dimension::Px(px_h);
        }
        (Some(_), Some(_)) => return None,
    }
    Some(s)
}

/// Compute layout for a styled tree, returning the top-level boxes positioned
/// in page coordinates. `page_margin` insets the content on the left and
/// right only.
pub fn compute_layout(
    styled_nodes: &[StyledNode],
    page_width: f32,
    page_margin: f32,
    fonts: &FontManager,
) -> Vec<PositionedBox> {
    let content_width = page_width - 2.0 * page_margin;
    let mut builder = LayoutBuilder::new(fonts, content_width);

    let child_ids: Vec<NodeId> = styled_nodes
        .iter()
        .map(|node| builder.build_node(node, content_width))
        .collect();

    let root_style = Style {
        display: taffy::Display::Flex,
        flex_direction: taffy::FlexDirection::Column,
        size: Size {
            width: taffy::Dimension::Length(content_width),
            height: taffy::Dimension::Auto,
        },
        ..Default::default()
    };

    let root = builder
        .taffy
        .new_with_children(root_style, &child_ids)
        .unwrap();

    builder
        .taffy
        .compute_layout(
            root,
            Size {
                width: AvailableSpace::Definite(content_width),
                height: AvailableSpace::MaxContent,
            },
        )
        .unwrap();

    let root_box = builder.extract(root, page_margin, 0.0);
    root_box.children
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;
    use crate::style::build_styled_tree;

    fn layout(html: &str) -> Vec<PositionedBox> {
        let styled = build_styled_tree(&parse_html(html), None);
        compute_layout(&styled, 595.0, 0.0, &FontManager::default())
    }

    fn text_boxes(root: &PositionedBox) -> Vec<&PositionedBox> {
        let mut out = Vec::new();
        root.walk(&mut |b| {
            if matches!(b.content, BoxContent::Text { .. }) {
                out.push(b);
            }
        });
        out
    }

    #[test]
    fn layout_simple_paragraph() {
        let boxes = layout("<p>Hello world</p>");
        assert!(!boxes.is_empty());
        assert!(boxes[0].width > 0.0);
        assert!(boxes[0].height > 0.0);
    }

    #[test]
    fn canvas_keeps_min_height_when_short() {
        let boxes = layout(r#"<div style="width: 595.28px; min-height: 841.89px"><p>x</p></div>"#);
        assert!((boxes[0].height - 841.89).abs() < 0.5);
        assert!((boxes[0].width - 595.28).abs() < 0.5);
    }

    #[test]
    fn right_aligned_text_spans_container() {
        let boxes = layout(r#"<div class="text-right" style="width: 400px"><p>abc</p></div>"#);
        let texts = text_boxes(&boxes[0]);
        assert_eq!(texts.len(), 1);
        assert!((texts[0].width - 400.0).abs() < 0.5);
    }

    #[test]
    fn grid_columns_wrap_text_to_column_width() {
        let words = "word ".repeat(40);
        let html = format!(
            r#"<div class="grid grid-cols-2 gap-8" style="width: 400px"><div><p>{words}</p></div><div><p>x</p></div></div>"#
        );
        let boxes = layout(&html);
        let texts = text_boxes(&boxes[0]);
        assert!(texts[0].width <= 190.0, "wrapped to {}", texts[0].width);
        assert!(texts[1].x >= 200.0);
    }

    #[test]
    fn fixed_width_photo_does_not_shrink() {
        let boxes = layout(
            r#"<div class="flex gap-4"><img src="x.png" style="width: 96px; height: 96px" /><div class="flex-1"><p>name</p></div></div>"#,
        );
        let img = &boxes[0].children[0];
        assert!(matches!(img.content, BoxContent::Image { .. }));
        assert!((img.width - 96.0).abs() < 0.5);
    }
}
