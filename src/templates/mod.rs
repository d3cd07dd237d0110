//! CV templates.
//!
//! Every template turns a [`CvDocument`] into a [`VisualPage`]: markup in the
//! controlled HTML subset understood by [`crate::dom`] and [`crate::style`],
//! sized to one A4 canvas. Templates differ only in styling; the data contract
//! and the section order are the same for all of them.

mod classic;
mod creative;
mod executive;
mod minimalist;
mod modern_arabic;

pub use classic::Classic;
pub use creative::Creative;
pub use executive::Executive;
pub use minimalist::Minimalist;
pub use modern_arabic::ModernArabic;

use serde::{Deserialize, Serialize};

use crate::labels::GPA_LABEL;
use crate::model::{CvDocument, PersonalInfo};

/// A4 canvas width in layout units (1 unit = 1 pt).
pub const PAGE_WIDTH_PT: f32 = 595.28;
/// A4 canvas height in layout units.
pub const PAGE_HEIGHT_PT: f32 = 841.89;

/// Render a CV to a page. Implementations must be pure: the same document
/// always produces the same page.
pub trait TemplateRenderer: Send + Sync {
    /// Catalog id this renderer is registered under.
    fn id(&self) -> &'static str;

    /// Section heading text this template prints.
    fn headings(&self) -> Headings {
        Headings::STANDARD
    }

    fn render(&self, cv: &CvDocument) -> VisualPage;
}

/// Output of a renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualPage {
    pub template_id: String,
    /// Page markup; the root element is the A4 canvas.
    pub html: String,
    /// Sections emitted, in page order.
    pub sections: Vec<SectionKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Summary,
    Experience,
    Education,
    Skills,
    Languages,
}

/// Sections that have content, in canonical page order.
pub fn present_sections(cv: &CvDocument) -> Vec<SectionKind> {
    let mut out = Vec::with_capacity(5);
    if !cv.summary.trim().is_empty() {
        out.push(SectionKind::Summary);
    }
    if !cv.experience.is_empty() {
        out.push(SectionKind::Experience);
    }
    if !cv.education.is_empty() {
        out.push(SectionKind::Education);
    }
    if !cv.skills.is_empty() {
        out.push(SectionKind::Skills);
    }
    if !cv.languages.is_empty() {
        out.push(SectionKind::Languages);
    }
    out
}

/// Heading text per section; templates may reword them.
#[derive(Debug, Clone, Copy)]
pub struct Headings {
    pub summary: &'static str,
    pub experience: &'static str,
    pub education: &'static str,
    pub skills: &'static str,
    pub languages: &'static str,
}

impl Headings {
    pub const STANDARD: Headings = Headings {
        summary: "نبذة شخصية",
        experience: "الخبرات المهنية",
        education: "التعليم",
        skills: "المهارات",
        languages: "اللغات",
    };

    pub fn get(&self, kind: SectionKind) -> &'static str {
        match kind {
            SectionKind::Summary => self.summary,
            SectionKind::Experience => self.experience,
            SectionKind::Education => self.education,
            SectionKind::Skills => self.skills,
            SectionKind::Languages => self.languages,
        }
    }
}

// ---------------------------------------------------------------------------
// Markup helpers
// ---------------------------------------------------------------------------

/// Accumulates page markup and the list of emitted sections.
pub(crate) struct PageBuilder {
    template_id: &'static str,
    html: String,
    sections: Vec<SectionKind>,
}

impl PageBuilder {
    /// Open the A4 canvas. `style` is appended to the canvas size declaration.
    pub(crate) fn new(template_id: &'static str, class: &str, style: &str) -> Self {
        let mut html = String::with_capacity(4096);
        html.push_str(&format!(
            r#"<div class="{class}" style="width: {PAGE_WIDTH_PT}px; min-height: {PAGE_HEIGHT_PT}px; background-color: #ffffff; {style}">"#
        ));
        Self {
            template_id,
            html,
            sections: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, markup: &str) {
        self.html.push_str(markup);
    }

    pub(crate) fn mark(&mut self, kind: SectionKind) {
        self.sections.push(kind);
    }

    pub(crate) fn finish(mut self) -> VisualPage {
        self.html.push_str("</div>");
        VisualPage {
            template_id: self.template_id.to_string(),
            html: self.html,
            sections: self.sections,
        }
    }
}

/// Escape text for element content and quoted attribute values.
pub(crate) fn esc(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// `<tag class style>text</tag>`, or nothing when `text` is blank.
pub(crate) fn text_el(tag: &str, class: &str, style: &str, text: &str) -> String {
    let t = text.trim();
    if t.is_empty() {
        return String::new();
    }
    format!(
        r#"<{tag} class="{class}" style="{style}">{}</{tag}>"#,
        esc(t)
    )
}

/// Non-blank contact values in display order.
pub(crate) fn contact_values(info: &PersonalInfo) -> Vec<&str> {
    [
        Some(info.email.as_str()),
        Some(info.phone.as_str()),
        Some(info.location.as_str()),
        info.linkedin.as_deref(),
        info.website.as_deref(),
    ]
    .into_iter()
    .flatten()
    .map(str::trim)
    .filter(|v| !v.is_empty())
    .collect()
}

/// Square photo element, or nothing when the CV has no photo.
pub(crate) fn photo(info: &PersonalInfo, size: u32, style: &str) -> String {
    match info.photo_url.as_deref().map(str::trim) {
        Some(src) if !src.is_empty() => format!(
            r#"<img src="{}" style="width: {size}px; height: {size}px; {style}" />"#,
            esc(src)
        ),
        _ => String::new(),
    }
}

/// "المعدل: 3.8", or nothing for a blank GPA.
pub(crate) fn format_gpa(gpa: &str) -> String {
    let gpa = gpa.trim();
    if gpa.is_empty() {
        String::new()
    } else {
        format!("{GPA_LABEL}: {gpa}")
    }
}

/// Emit the skills and languages blocks side by side, or the one that is
/// present at full width. Marks the sections in page order.
pub(crate) fn paired_row(
    page: &mut PageBuilder,
    plan: &[SectionKind],
    gap_class: &str,
    skills: impl FnOnce() -> String,
    languages: impl FnOnce() -> String,
) {
    let has_skills = plan.contains(&SectionKind::Skills);
    let has_languages = plan.contains(&SectionKind::Languages);
    match (has_skills, has_languages) {
        (false, false) => {}
        (true, true) => {
            page.mark(SectionKind::Skills);
            page.mark(SectionKind::Languages);
            page.push(&format!(r#"<div class="grid grid-cols-2 {gap_class}">"#));
            page.push(&format!("<div>{}</div>", skills()));
            page.push(&format!("<div>{}</div>", languages()));
            page.push("</div>");
        }
        (true, false) => {
            page.mark(SectionKind::Skills);
            page.push(&format!("<div>{}</div>", skills()));
        }
        (false, true) => {
            page.mark(SectionKind::Languages);
            page.push(&format!("<div>{}</div>", languages()));
        }
    }
}
