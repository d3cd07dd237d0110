//! Style resolver – maps inline `style` declarations and the utility classes
//! used by the CV templates to a flat [`ComputedStyle`] consumed by the layout
//! engine.
//!
//! One layout unit is one PDF point; `px` in declarations and the 4-unit
//! spacing step of the utility classes are read as points.

use std::collections::HashMap;

use crate::dom::{DomNode, ElementNode, Tag};

/// Step of the `p-*`, `m-*`, `gap-*`, `w-*` and `h-*` utilities.
const SPACING_UNIT: f32 = 4.0;

/// Fully resolved style for a single element.
#[derive(Debug, Clone)]
pub struct ComputedStyle {
    // Display / layout
    pub display: Display,
    pub flex_direction: FlexDirection,
    pub flex_wrap: FlexWrap,
    pub flex_grow: f32,
    pub flex_shrink: f32,
    pub justify_content: JustifyContent,
    pub align_items: AlignItems,
    pub gap: f32,
    /// Equal-width columns of a grid container.
    pub grid_columns: usize,

    // Sizing
    pub width: Dimension,
    pub height: Dimension,
    pub max_width: Dimension,
    /// The page canvas uses this to keep A4 height when content is short.
    pub min_height: Dimension,

    pub margin: Edges,
    pub padding: Edges,

    // Border
    pub border_width: f32,
    pub border_color: Color,

    // Typography
    pub font_size: f32,
    pub font_weight: FontWeight,
    pub font_family: String,
    pub color: Color,
    pub text_align: TextAlign,
    pub line_height: f32,
    pub text_decoration: TextDecoration,
    pub font_style: FontStyle,

    pub background_color: Color,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: Display::Block,
            flex_direction: FlexDirection::Row,
            flex_wrap: FlexWrap::NoWrap,
            flex_grow: 0.0,
            flex_shrink: 1.0,
            justify_content: JustifyContent::Start,
            align_items: AlignItems::Stretch,
            gap: 0.0,
            grid_columns: 1,
            width: Dimension::Auto,
            height: Dimension::Auto,
            max_width: Dimension::Auto,
            min_height: Dimension::Auto,
            margin: Edges::ZERO,
            padding: Edges::ZERO,
            border_width: 0.0,
            border_color: Color::BLACK,
            font_size: 16.0,
            font_weight: FontWeight::Normal,
            font_family: "Helvetica".to_string(),
            color: Color::BLACK,
            text_align: TextAlign::Left,
            line_height: 1.4,
            text_decoration: TextDecoration::None,
            font_style: FontStyle::Normal,
            background_color: Color::TRANSPARENT,
        }
    }
}

impl ComputedStyle {
    /// Copy of the inheritable text properties only, as a text run sees them.
    fn text_run(&self) -> Self {
        Self {
            font_size: self.font_size,
            font_weight: self.font_weight,
            font_family: self.font_family.clone(),
            color: self.color,
            text_align: self.text_align,
            line_height: self.line_height,
            text_decoration: self.text_decoration,
            font_style: self.font_style,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// Per-side lengths of a margin or padding box.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Edges {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Edges {
    pub const ZERO: Self = Self::uniform(0.0);

    pub const fn uniform(v: f32) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }

    /// Set the sides named by a utility suffix: `""` all, `x`, `y`, or one of
    /// `t r b l`. False for anything else.
    fn set_sides(&mut self, sides: &str, v: f32) -> bool {
        match sides {
            "" => *self = Self::uniform(v),
            "x" => {
                self.left = v;
                self.right = v;
            }
            "y" => {
                self.top = v;
                self.bottom = v;
            }
            "t" => self.top = v,
            "r" => self.right = v,
            "b" => self.bottom = v,
            "l" => self.left = v,
            _ => return false,
        }
        true
    }

    /// Set one side named the CSS way (`top`, `right`, …).
    fn set_side(&mut self, side: &str, v: f32) {
        match side {
            "top" => self.top = v,
            "right" => self.right = v,
            "bottom" => self.bottom = v,
            "left" => self.left = v,
            _ => {}
        }
    }

    /// CSS shorthand with one to four lengths.
    fn parse_shorthand(val: &str) -> Option<Self> {
        let v: Vec<f32> = val.split_whitespace().filter_map(parse_px).collect();
        let (top, right, bottom, left) = match v[..] {
            [a] => (a, a, a, a),
            [y, x] => (y, x, y, x),
            [t, x, b] => (t, x, b, x),
            [t, r, b, l] => (t, r, b, l),
            _ => return None,
        };
        Some(Self {
            top,
            right,
            bottom,
            left,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Block,
    Flex,
    Grid,
    Inline,
    InlineBlock,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexDirection {
    Row,
    Column,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexWrap {
    NoWrap,
    Wrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JustifyContent {
    Start,
    End,
    Center,
    SpaceBetween,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignItems {
    Start,
    End,
    Center,
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDecoration {
    None,
    Underline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimension {
    Auto,
    Px(f32),
    Percent(f32),
}

/// RGBA colour (0.0 – 1.0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub fn is_transparent(&self) -> bool {
        self.a < 0.001
    }

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: 1.0,
        }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// `#rrggbb` or `#rgb`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            6 => Some(Self::rgb(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => Some(Self::rgb(
                channel(&hex[0..1].repeat(2))?,
                channel(&hex[1..2].repeat(2))?,
                channel(&hex[2..3].repeat(2))?,
            )),
            _ => None,
        }
    }
}

/// Named shades accepted by the `text-*`, `bg-*` and `border-*` utilities.
/// Template accent colours are given inline as hex.
fn palette(name: &str) -> Option<Color> {
    let color = match name {
        "white" => Color::WHITE,
        "black" => Color::BLACK,
        "gray-100" => Color::rgb(0xf3, 0xf4, 0xf6),
        "gray-200" => Color::rgb(0xe5, 0xe7, 0xeb),
        "gray-300" => Color::rgb(0xd1, 0xd5, 0xdb),
        "gray-500" => Color::rgb(0x6b, 0x72, 0x80),
        "gray-700" => Color::rgb(0x37, 0x41, 0x51),
        "gray-900" => Color::rgb(0x11, 0x18, 0x27),
        _ => return None,
    };
    Some(color)
}

// ---------------------------------------------------------------------------
// Style resolution
// ---------------------------------------------------------------------------

/// Resolve the style for an element, inheriting text properties from its parent.
pub fn resolve_style(element: &ElementNode, parent: Option<&ComputedStyle>) -> ComputedStyle {
    let mut style = base_style_for_tag(&element.tag);

    if let Some(p) = parent {
        style.font_size = p.font_size;
        style.font_weight = p.font_weight;
        style.font_family = p.font_family.clone();
        style.color = p.color;
        style.text_align = p.text_align;
        style.line_height = p.line_height;
        style.font_style = p.font_style;
    }

    for class in element.classes() {
        apply_utility_class(&mut style, class);
    }
    if let Some(inline) = element.inline_style() {
        apply_inline_style(&mut style, inline);
    }
    style
}

/// Default styles based on tag semantics.
fn base_style_for_tag(tag: &Tag) -> ComputedStyle {
    let mut s = ComputedStyle::default();
    let heading = |s: &mut ComputedStyle, size: f32, above: f32, below: f32| {
        s.font_size = size;
        s.font_weight = FontWeight::Bold;
        s.margin.top = above;
        s.margin.bottom = below;
    };
    match tag {
        Tag::H1 => heading(&mut s, 32.0, 16.0, 12.0),
        Tag::H2 => heading(&mut s, 24.0, 14.0, 10.0),
        Tag::H3 => heading(&mut s, 20.0, 12.0, 8.0),
        Tag::P => s.margin.bottom = 10.0,
        Tag::Span => s.display = Display::Inline,
        Tag::Img => s.display = Display::InlineBlock,
        Tag::Div => {}
        Tag::Unknown(_) => s.display = Display::None,
    }
    s
}

/// Apply one utility class. Unknown classes are ignored.
fn apply_utility_class(s: &mut ComputedStyle, class: &str) {
    match class {
        "flex" => s.display = Display::Flex,
        "grid" => s.display = Display::Grid,
        "block" => s.display = Display::Block,
        "hidden" => s.display = Display::None,
        "flex-row" => s.flex_direction = FlexDirection::Row,
        "flex-col" => s.flex_direction = FlexDirection::Column,
        "flex-wrap" => s.flex_wrap = FlexWrap::Wrap,
        "flex-1" => {
            s.flex_grow = 1.0;
            s.flex_shrink = 1.0;
        }

        "justify-start" => s.justify_content = JustifyContent::Start,
        "justify-end" => s.justify_content = JustifyContent::End,
        "justify-center" => s.justify_content = JustifyContent::Center,
        "justify-between" => s.justify_content = JustifyContent::SpaceBetween,
        "items-start" => s.align_items = AlignItems::Start,
        "items-end" => s.align_items = AlignItems::End,
        "items-center" => s.align_items = AlignItems::Center,

        "font-bold" => s.font_weight = FontWeight::Bold,
        "font-normal" => s.font_weight = FontWeight::Normal,
        "italic" => s.font_style = FontStyle::Italic,
        "underline" => s.text_decoration = TextDecoration::Underline,
        "text-left" => s.text_align = TextAlign::Left,
        "text-center" => s.text_align = TextAlign::Center,
        "text-right" => s.text_align = TextAlign::Right,

        "text-xs" => s.font_size = 12.0,
        "text-sm" => s.font_size = 14.0,
        "text-base" => s.font_size = 16.0,
        "text-lg" => s.font_size = 18.0,
        "text-xl" => s.font_size = 20.0,
        "text-2xl" => s.font_size = 24.0,
        "text-3xl" => s.font_size = 30.0,
        "text-4xl" => s.font_size = 36.0,

        "w-full" => s.width = Dimension::Percent(100.0),
        "w-1/2" => s.width = Dimension::Percent(50.0),
        "border" => s.border_width = 1.0,
        "border-2" => s.border_width = 2.0,
        "border-4" => s.border_width = 4.0,

        _ => {
            let _ = apply_color_class(s, class)
                || apply_spacing_class(s, class)
                || apply_sized_class(s, class);
        }
    }
}

/// `text-{shade}`, `bg-{shade}`, `border-{shade}`.
fn apply_color_class(s: &mut ComputedStyle, class: &str) -> bool {
    let Some((target, shade)) = class.split_once('-') else {
        return false;
    };
    let Some(color) = palette(shade) else {
        return false;
    };
    match target {
        "text" => s.color = color,
        "bg" => s.background_color = color,
        "border" => s.border_color = color,
        _ => return false,
    }
    true
}

/// `p-4`, `px-10`, `mb-2`, … in spacing steps.
fn apply_spacing_class(s: &mut ComputedStyle, class: &str) -> bool {
    let Some((prefix, steps)) = class.split_once('-') else {
        return false;
    };
    let Ok(steps) = steps.parse::<f32>() else {
        return false;
    };
    let edges = match prefix.as_bytes().first() {
        Some(b'p') => &mut s.padding,
        Some(b'm') => &mut s.margin,
        _ => return false,
    };
    edges.set_sides(&prefix[1..], steps * SPACING_UNIT)
}

/// `gap-*`, `w-*`, `h-*`, `min-h-*` in spacing steps and `grid-cols-*`.
fn apply_sized_class(s: &mut ComputedStyle, class: &str) -> bool {
    let steps = |prefix: &str| {
        class
            .strip_prefix(prefix)
            .and_then(|rest| rest.parse::<f32>().ok())
            .map(|n| n * SPACING_UNIT)
    };
    if let Some(v) = steps("gap-") {
        s.gap = v;
    } else if let Some(v) = steps("min-h-") {
        s.min_height = Dimension::Px(v);
    } else if let Some(v) = steps("w-") {
        s.width = Dimension::Px(v);
    } else if let Some(v) = steps("h-") {
        s.height = Dimension::Px(v);
    } else if let Some(n) = class
        .strip_prefix("grid-cols-")
        .and_then(|rest| rest.parse::<usize>().ok())
    {
        s.grid_columns = n.max(1);
    } else {
        return false;
    }
    true
}

// ---------------------------------------------------------------------------
// Inline style parsing (limited subset)
// ---------------------------------------------------------------------------

fn apply_inline_style(s: &mut ComputedStyle, style_str: &str) {
    for decl in style_str.split(';') {
        if let Some((prop, val)) = decl.split_once(':') {
            apply_css_property(s, prop.trim(), val.trim());
        }
    }
}

fn apply_css_property(s: &mut ComputedStyle, prop: &str, val: &str) {
    match prop {
        "display" => {
            s.display = match val {
                "flex" => Display::Flex,
                "grid" => Display::Grid,
                "block" => Display::Block,
                "inline" => Display::Inline,
                "inline-block" => Display::InlineBlock,
                "none" => Display::None,
                _ => s.display,
            }
        }
        "flex-direction" => {
            s.flex_direction = match val {
                "column" => FlexDirection::Column,
                _ => FlexDirection::Row,
            }
        }
        "font-weight" => {
            s.font_weight = match val {
                "bold" | "600" | "700" | "800" | "900" => FontWeight::Bold,
                _ => FontWeight::Normal,
            }
        }
        "font-style" => {
            s.font_style = match val {
                "italic" => FontStyle::Italic,
                _ => FontStyle::Normal,
            }
        }
        "text-align" => {
            s.text_align = match val {
                "center" => TextAlign::Center,
                "right" => TextAlign::Right,
                _ => TextAlign::Left,
            }
        }
        "color" => set_color(&mut s.color, val),
        "background-color" | "background" => set_color(&mut s.background_color, val),
        "border-color" => set_color(&mut s.border_color, val),
        "font-size" => set_px(&mut s.font_size, val),
        "border-width" | "border" => set_px(&mut s.border_width, val),
        "gap" => set_px(&mut s.gap, val),
        "width" => s.width = parse_dimension(val),
        "height" => s.height = parse_dimension(val),
        "min-height" => s.min_height = parse_dimension(val),
        "max-width" => s.max_width = parse_dimension(val),
        "line-height" => {
            if let Ok(v) = val.parse::<f32>() {
                s.line_height = v;
            } else if let Some(px) = parse_px(val) {
                s.line_height = px / s.font_size;
            }
        }
        "margin" | "padding" => {
            if let Some(edges) = Edges::parse_shorthand(val) {
                *box_edges(s, prop) = edges;
            }
        }
        _ => {
            let side = prop
                .strip_prefix("margin-")
                .map(|side| ("margin", side))
                .or_else(|| prop.strip_prefix("padding-").map(|side| ("padding", side)));
            if let (Some((which, side)), Some(v)) = (side, parse_px(val)) {
                box_edges(s, which).set_side(side, v);
            }
        }
    }
}

fn box_edges<'a>(s: &'a mut ComputedStyle, which: &str) -> &'a mut Edges {
    if which == "margin" {
        &mut s.margin
    } else {
        &mut s.padding
    }
}

fn set_color(slot: &mut Color, val: &str) {
    if let Some(c) = Color::from_hex(val) {
        *slot = c;
    }
}

fn set_px(slot: &mut f32, val: &str) {
    if let Some(v) = parse_px(val) {
        *slot = v;
    }
}

fn parse_px(s: &str) -> Option<f32> {
    s.trim().trim_end_matches("px").parse().ok()
}

fn parse_dimension(s: &str) -> Dimension {
    let s = s.trim();
    if let Some(pct) = s.strip_suffix('%') {
        pct.parse().map(Dimension::Percent).unwrap_or(Dimension::Auto)
    } else {
        parse_px(s).map(Dimension::Px).unwrap_or(Dimension::Auto)
    }
}

// ---------------------------------------------------------------------------
// Styled DOM tree
// ---------------------------------------------------------------------------

/// A DOM node annotated with its computed style.
#[derive(Debug, Clone)]
pub enum StyledNode {
    Element {
        tag: Tag,
        style: ComputedStyle,
        children: Vec<StyledNode>,
        /// Original attributes (image `src`, …).
        attrs: HashMap<String, String>,
    },
    Text {
        text: String,
        style: ComputedStyle,
    },
}

/// Build a styled tree from a DOM tree, resolving styles top-down.
pub fn build_styled_tree(
    nodes: &[DomNode],
    parent_style: Option<&ComputedStyle>,
) -> Vec<StyledNode> {
    nodes
        .iter()
        .filter_map(|node| match node {
            DomNode::Element(e) => {
                let style = resolve_style(e, parent_style);
                let children = build_styled_tree(&e.children, Some(&style));
                Some(StyledNode::Element {
                    tag: e.tag.clone(),
                    style,
                    children,
                    attrs: e.attributes.clone(),
                })
            }
            // Text is inline: box properties stay on the parent.
            DomNode::Text(text) if !text.trim().is_empty() => Some(StyledNode::Text {
                text: text.clone(),
                style: parent_style.map(ComputedStyle::text_run).unwrap_or_default(),
            }),
            DomNode::Text(_) => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    fn styled_root(html: &str) -> ComputedStyle {
        let dom = parse_html(html);
        match &build_styled_tree(&dom, None)[0] {
            StyledNode::Element { style, .. } => style.clone(),
            StyledNode::Text { style, .. } => style.clone(),
        }
    }

    #[test]
    fn spacing_utilities_set_the_named_sides() {
        let s = styled_root(r#"<div class="px-10 pt-10 pb-6 mb-4"></div>"#);
        assert_eq!(s.padding, Edges { top: 40.0, right: 40.0, bottom: 24.0, left: 40.0 });
        assert_eq!(s.margin.bottom, 16.0);
        assert_eq!(s.margin.top, 0.0);
    }

    #[test]
    fn inline_style_font_size() {
        let mut s = ComputedStyle::default();
        apply_inline_style(&mut s, "font-size: 24px; color: #ff0000");
        assert_eq!(s.font_size, 24.0);
        assert!((s.color.r - 1.0).abs() < 0.01);
    }

    #[test]
    fn inline_margin_shorthand_and_sides() {
        let s = styled_root(r#"<div style="margin: 4px 8px; padding-left: 6px"></div>"#);
        assert_eq!(s.margin, Edges { top: 4.0, right: 8.0, bottom: 4.0, left: 8.0 });
        assert_eq!(s.padding.left, 6.0);
        assert_eq!(s.padding.horizontal(), 6.0);
    }

    #[test]
    fn canvas_declaration_sets_width_and_min_height() {
        let s = styled_root(r#"<div style="width: 595.28px; min-height: 841.89px"></div>"#);
        assert_eq!(s.width, Dimension::Px(595.28));
        assert_eq!(s.min_height, Dimension::Px(841.89));
    }

    #[test]
    fn text_align_is_inherited() {
        let dom = parse_html(r#"<div class="text-right"><p>نص</p></div>"#);
        let tree = build_styled_tree(&dom, None);
        let StyledNode::Element { children, .. } = &tree[0] else {
            panic!("Expected element");
        };
        let StyledNode::Element { style, .. } = &children[0] else {
            panic!("Expected paragraph");
        };
        assert_eq!(style.text_align, TextAlign::Right);
    }

    #[test]
    fn text_runs_drop_box_properties() {
        let dom = parse_html(r#"<div class="p-4 bg-gray-100 text-gray-700">x</div>"#);
        let tree = build_styled_tree(&dom, None);
        let StyledNode::Element { children, .. } = &tree[0] else {
            panic!("Expected element");
        };
        let StyledNode::Text { style, .. } = &children[0] else {
            panic!("Expected text");
        };
        assert_eq!(style.padding, Edges::ZERO);
        assert!(style.background_color.is_transparent());
        assert_eq!(style.color, Color::rgb(0x37, 0x41, 0x51));
    }

    #[test]
    fn unknown_tags_are_hidden() {
        assert_eq!(styled_root("<section>x</section>").display, Display::None);
    }

    #[test]
    fn border_classes_set_width_and_shade() {
        let s = styled_root(r#"<div class="border-2 border-gray-300"></div>"#);
        assert_eq!(s.border_width, 2.0);
        assert_eq!(s.border_color, Color::rgb(0xd1, 0xd5, 0xdb));
    }

    #[test]
    fn grid_and_bar_sizes() {
        let s = styled_root(r#"<div class="grid grid-cols-2 gap-8 w-16 h-1"></div>"#);
        assert_eq!(s.display, Display::Grid);
        assert_eq!(s.grid_columns, 2);
        assert_eq!(s.gap, 32.0);
        assert_eq!(s.width, Dimension::Px(64.0));
        assert_eq!(s.height, Dimension::Px(4.0));
    }

    #[test]
    fn color_from_hex() {
        let c = Color::from_hex("#ff8800").unwrap();
        assert!((c.r - 1.0).abs() < 0.01);
        assert!((c.g - 0.533).abs() < 0.01);
        assert_eq!(Color::from_hex("#f80"), Some(c));
        assert_eq!(Color::from_hex("#12345"), None);
    }
}
