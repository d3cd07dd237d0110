//! Markup parser – turns template markup into a small DOM tree.
//!
//! Templates only emit a controlled subset:
//! - Blocks: div, p, h1-h3
//! - Inline: span
//! - Void: img
//!
//! Styling travels in `class` and `style` attributes. Anything else parses
//! but is treated as hidden by the style resolver.

use std::collections::HashMap;

// ---------------------------------------------------------------------------
// DOM types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    Div,
    P,
    H1,
    H2,
    H3,
    Span,
    Img,
    Unknown(String),
}

impl Tag {
    pub fn from_name(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "div" => Tag::Div,
            "p" => Tag::P,
            "h1" => Tag::H1,
            "h2" => Tag::H2,
            "h3" => Tag::H3,
            "span" => Tag::Span,
            "img" => Tag::Img,
            _ => Tag::Unknown(s.to_string()),
        }
    }

    /// Paragraph-like blocks whose inline content is flowed as one text run.
    pub fn is_paragraph(&self) -> bool {
        matches!(self, Tag::P | Tag::H1 | Tag::H2 | Tag::H3)
    }

    fn is_void(&self) -> bool {
        matches!(self, Tag::Img)
    }
}

#[derive(Debug, Clone)]
pub enum DomNode {
    Element(ElementNode),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct ElementNode {
    pub tag: Tag,
    pub attributes: HashMap<String, String>,
    pub children: Vec<DomNode>,
}

impl ElementNode {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            attributes: HashMap::new(),
            children: Vec::new(),
        }
    }

    pub fn classes(&self) -> Vec<&str> {
        self.attributes
            .get("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn inline_style(&self) -> Option<&str> {
        self.attributes.get("style").map(|s| s.as_str())
    }

    pub fn src(&self) -> Option<&str> {
        self.attributes.get("src").map(|s| s.as_str())
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse markup into a list of top-level nodes. Malformed input never fails;
/// unclosed elements are closed at end of input.
pub fn parse_html(html: &str) -> Vec<DomNode> {
    let mut parser = Parser::new(html);
    parser.parse_nodes()
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn parse_nodes(&mut self) -> Vec<DomNode> {
        let mut nodes = Vec::new();
        loop {
            self.skip_blank_run();
            if self.eof() || self.starts_with("</") {
                break;
            }
            if let Some(node) = self.parse_node() {
                nodes.push(node);
            }
        }
        nodes
    }

    fn parse_node(&mut self) -> Option<DomNode> {
        if self.starts_with("<!--") {
            self.skip_past("-->");
            return None;
        }
        if self.starts_with("<!") || self.starts_with("<?") {
            self.skip_past(">");
            return None;
        }
        if self.starts_with("<") {
            Some(self.parse_element())
        } else {
            Some(self.parse_text())
        }
    }

    fn parse_text(&mut self) -> DomNode {
        let start = self.pos;
        match self.input[self.pos..].find('<') {
            Some(off) => self.pos += off,
            None => self.pos = self.input.len(),
        }
        DomNode::Text(decode_entities(&self.input[start..self.pos]))
    }

    fn parse_element(&mut self) -> DomNode {
        self.bump(); // '<'
        let tag = Tag::from_name(&self.parse_name());
        let mut elem = ElementNode::new(tag);

        loop {
            self.skip_whitespace();
            if self.eof() || self.starts_with(">") || self.starts_with("/>") {
                break;
            }
            let before = self.pos;
            let (key, value) = self.parse_attribute();
            if self.pos == before {
                // Stray character in the tag; drop it.
                self.bump();
                continue;
            }
            if !key.is_empty() {
                elem.attributes.insert(key, value);
            }
        }

        if self.starts_with("/>") {
            self.pos += 2;
            return DomNode::Element(elem);
        }
        if self.starts_with(">") {
            self.pos += 1;
        }
        if elem.tag.is_void() {
            return DomNode::Element(elem);
        }

        elem.children = self.parse_nodes();

        if self.starts_with("</") {
            self.pos += 2;
            self.parse_name();
            self.skip_past(">");
        }

        DomNode::Element(elem)
    }

    fn parse_name(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
        self.input[start..self.pos].to_string()
    }

    fn parse_attribute(&mut self) -> (String, String) {
        let key = self.parse_name();
        self.skip_whitespace();
        if !self.starts_with("=") {
            return (key, String::new());
        }
        self.bump();
        self.skip_whitespace();
        let value = self.parse_attr_value();
        (key, value)
    }

    fn parse_attr_value(&mut self) -> String {
        match self.peek() {
            Some(q @ ('"' | '\'')) => {
                self.bump();
                let start = self.pos;
                let end = self.input[start..]
                    .find(q)
                    .map(|off| start + off)
                    .unwrap_or(self.input.len());
                self.pos = end;
                let raw = &self.input[start..end];
                if !self.eof() {
                    self.bump();
                }
                decode_entities(raw)
            }
            _ => {
                let start = self.pos;
                while let Some(c) = self.peek() {
                    if c.is_whitespace() || c == '>' || c == '/' {
                        break;
                    }
                    self.bump();
                }
                decode_entities(&self.input[start..self.pos])
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    /// Whitespace between tags is insignificant; whitespace before text is
    /// kept as part of the text.
    fn skip_blank_run(&mut self) {
        let saved = self.pos;
        self.skip_whitespace();
        if !self.eof() && !self.starts_with("<") {
            self.pos = saved;
        }
    }

    fn skip_past(&mut self, needle: &str) {
        match self.input[self.pos..].find(needle) {
            Some(off) => self.pos += off + needle.len(),
            None => self.pos = self.input.len(),
        }
    }

    fn starts_with(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }
}

/// Decode the named and numeric entities produced by template escaping.
/// Single pass, so `&amp;lt;` decodes to the literal `&lt;`.
fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').and_then(|semi| {
            let entity = &rest[1..semi];
            let c = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{00A0}'),
                _ => entity
                    .strip_prefix('#')
                    .and_then(|n| match n.strip_prefix(['x', 'X']) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => n.parse().ok(),
                    })
                    .and_then(char::from_u32),
            };
            c.map(|c| (c, semi + 1))
        });
        match decoded {
            Some((c, len)) => {
                out.push(c);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_div() {
        let html = r#"<div class="flex p-4"><p>مرحبا</p></div>"#;
        let nodes = parse_html(html);
        assert_eq!(nodes.len(), 1);
        if let DomNode::Element(e) = &nodes[0] {
            assert_eq!(e.tag, Tag::Div);
            assert_eq!(e.classes(), vec!["flex", "p-4"]);
            assert_eq!(e.children.len(), 1);
        } else {
            panic!("Expected element");
        }
    }

    #[test]
    fn parse_void_img() {
        let html = r#"<div><img src="photo.png" style="width: 96px"><p>x</p></div>"#;
        let nodes = parse_html(html);
        let DomNode::Element(div) = &nodes[0] else {
            panic!("Expected div");
        };
        assert_eq!(div.children.len(), 2);
        let DomNode::Element(img) = &div.children[0] else {
            panic!("Expected img");
        };
        assert_eq!(img.src(), Some("photo.png"));
        assert!(img.children.is_empty());
    }

    #[test]
    fn entities_decode_once() {
        assert_eq!(decode_entities("a &amp;lt; b"), "a &lt; b");
        assert_eq!(decode_entities("&lt;b&gt; &#39;x&#39; &#x41;"), "<b> 'x' A");
        assert_eq!(decode_entities("R&D; & co"), "R&D; & co");
    }

    #[test]
    fn quoted_attribute_keeps_escaped_quotes() {
        let nodes = parse_html(r#"<img src="a&quot;b.png" />"#);
        let DomNode::Element(img) = &nodes[0] else {
            panic!("Expected img");
        };
        assert_eq!(img.src(), Some("a\"b.png"));
    }

    #[test]
    fn unknown_tags_parse_with_children() {
        let nodes = parse_html("<section><p>x</p></section>");
        let DomNode::Element(e) = &nodes[0] else {
            panic!("Expected element");
        };
        assert_eq!(e.tag, Tag::Unknown("section".into()));
        assert_eq!(e.children.len(), 1);
    }
}
