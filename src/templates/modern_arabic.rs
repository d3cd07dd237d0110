//! Free default template: blue header band, right-aligned body, skill bars.

use super::{
    contact_values, esc, format_gpa, paired_row, photo, present_sections, text_el, Headings,
    PageBuilder, SectionKind, TemplateRenderer, VisualPage,
};
use crate::labels::{date_range, language_level_label, skill_bar_width, skill_level_label};
use crate::model::CvDocument;

const ACCENT: &str = "#1e40af";
const ACCENT_LIGHT: &str = "#dbeafe";
const MUTED: &str = "#6b7280";

pub struct ModernArabic;

impl ModernArabic {
    fn header(cv: &CvDocument) -> String {
        let info = &cv.personal_info;
        let mut html = format!(r#"<div class="p-8" style="background-color: {ACCENT}; color: #ffffff">"#);
        html.push_str(r#"<div class="flex justify-between items-center gap-6">"#);
        html.push_str(&photo(info, 96, "border-width: 3px; border-color: #ffffff"));
        html.push_str(r#"<div class="flex-1 text-right">"#);
        html.push_str(&text_el("h1", "text-3xl font-bold mb-2", "margin-top: 0px", &info.full_name));
        html.push_str(&text_el("p", "text-xl", &format!("color: {ACCENT_LIGHT}"), &info.job_title));
        html.push_str("</div></div>");

        let contacts = contact_values(info);
        if !contacts.is_empty() {
            html.push_str(r#"<div class="flex flex-wrap justify-end gap-4 mt-4 text-sm">"#);
            for value in contacts {
                html.push_str(&format!("<div>{}</div>", esc(value)));
            }
            html.push_str("</div>");
        }
        html.push_str("</div>");
        html
    }

    fn heading(text: &str) -> String {
        format!(
            r#"<h2 class="text-xl font-bold mb-2" style="color: {ACCENT}; margin-top: 0px">{}</h2><div class="h-1 mb-4" style="background-color: {ACCENT_LIGHT}"></div>"#,
            esc(text)
        )
    }

    fn experience(cv: &CvDocument) -> String {
        let mut html = String::from(r#"<div class="flex flex-col gap-4">"#);
        for job in &cv.experience {
            html.push_str("<div>");
            html.push_str(r#"<div class="flex justify-between items-start gap-4">"#);
            html.push_str(&format!(r#"<div class="text-sm text-left" style="color: {MUTED}">"#));
            html.push_str(&text_el("p", "mb-1", "", &date_range(&job.start_date, &job.end_date, job.current)));
            html.push_str(&text_el("p", "", "", &job.location));
            html.push_str("</div>");
            html.push_str(r#"<div class="flex-1">"#);
            html.push_str(&text_el("h3", "text-lg font-bold mb-1", "margin-top: 0px", &job.position));
            html.push_str(&text_el("p", "font-bold mb-1", "color: #2563eb", &job.company));
            html.push_str("</div></div>");
            html.push_str(&text_el("p", "text-gray-700 text-sm", "", &job.description));
            html.push_str("</div>");
        }
        html.push_str("</div>");
        html
    }

    fn education(cv: &CvDocument) -> String {
        let mut html = String::from(r#"<div class="flex flex-col gap-4">"#);
        for edu in &cv.education {
            html.push_str("<div>");
            html.push_str(r#"<div class="flex justify-between items-start gap-4">"#);
            html.push_str(&format!(r#"<div class="text-sm text-left" style="color: {MUTED}">"#));
            html.push_str(&text_el("p", "mb-1", "", &date_range(&edu.start_date, &edu.end_date, false)));
            html.push_str(&text_el("p", "", "", &edu.location));
            html.push_str("</div>");
            html.push_str(r#"<div class="flex-1">"#);
            html.push_str(&text_el("h3", "text-lg font-bold mb-1", "margin-top: 0px", &edu.degree));
            html.push_str(&text_el("p", "font-bold mb-1", "color: #2563eb", &edu.institution));
            if let Some(gpa) = edu.gpa.as_deref() {
                html.push_str(&text_el("p", "text-sm", "", &format_gpa(gpa)));
            }
            html.push_str("</div></div>");
            if let Some(desc) = edu.description.as_deref() {
                html.push_str(&text_el("p", "text-gray-700 text-sm", "", desc));
            }
            html.push_str("</div>");
        }
        html.push_str("</div>");
        html
    }

    fn skills(cv: &CvDocument) -> String {
        let mut html = Self::heading(Headings::STANDARD.skills);
        html.push_str(r#"<div class="flex flex-col gap-3">"#);
        for skill in &cv.skills {
            html.push_str("<div>");
            html.push_str(r#"<div class="flex justify-between text-sm mb-1">"#);
            html.push_str(&format!(
                r#"<div style="color: {MUTED}">{}</div><div class="font-bold">{}</div>"#,
                skill_level_label(&skill.level),
                esc(&skill.name)
            ));
            html.push_str("</div>");
            html.push_str(&format!(
                r#"<div class="w-full h-2 bg-gray-200"><div class="{} h-2" style="background-color: #2563eb"></div></div>"#,
                skill_bar_width(&skill.level)
            ));
            html.push_str("</div>");
        }
        html.push_str("</div>");
        html
    }

    fn languages(cv: &CvDocument) -> String {
        let mut html = Self::heading(Headings::STANDARD.languages);
        html.push_str(r#"<div class="flex flex-col gap-2">"#);
        for lang in &cv.languages {
            html.push_str(&format!(
                r#"<div class="flex justify-between text-sm"><div class="px-2 py-1" style="background-color: {ACCENT_LIGHT}; color: {ACCENT}">{}</div><div class="font-bold">{}</div></div>"#,
                language_level_label(&lang.level),
                esc(&lang.name)
            ));
        }
        html.push_str("</div>");
        html
    }
}

impl TemplateRenderer for ModernArabic {
    fn id(&self) -> &'static str {
        "modern-arabic"
    }

    fn render(&self, cv: &CvDocument) -> VisualPage {
        let headings = Headings::STANDARD;
        let mut page = PageBuilder::new(self.id(), "text-right", "color: #1f2937");
        page.push(&Self::header(cv));
        page.push(r#"<div class="p-8 flex flex-col gap-6">"#);

        let plan = present_sections(cv);
        for kind in &plan {
            match kind {
                SectionKind::Summary => {
                    page.mark(*kind);
                    page.push("<div>");
                    page.push(&Self::heading(headings.summary));
                    page.push(&text_el("p", "text-gray-700", "line-height: 1.6", &cv.summary));
                    page.push("</div>");
                }
                SectionKind::Experience => {
                    page.mark(*kind);
                    page.push("<div>");
                    page.push(&Self::heading(headings.experience));
                    page.push(&Self::experience(cv));
                    page.push("</div>");
                }
                SectionKind::Education => {
                    page.mark(*kind);
                    page.push("<div>");
                    page.push(&Self::heading(headings.education));
                    page.push(&Self::education(cv));
                    page.push("</div>");
                }
                SectionKind::Skills | SectionKind::Languages => {}
            }
        }
        paired_row(&mut page, &plan, "gap-8", || Self::skills(cv), || Self::languages(cv));

        page.push("</div>");
        page.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Experience, PersonalInfo};

    #[test]
    fn header_omits_missing_contacts_and_photo() {
        let cv = CvDocument {
            personal_info: PersonalInfo {
                full_name: "سارة".into(),
                email: "sara@example.com".into(),
                ..Default::default()
            },
            ..Default::default()
        };
        let page = ModernArabic.render(&cv);
        assert!(page.html.contains("sara@example.com"));
        assert!(!page.html.contains("<img"));
        assert!(page.sections.is_empty());
    }

    #[test]
    fn current_job_shows_ongoing_label() {
        let cv = CvDocument {
            experience: vec![Experience {
                position: "مهندس".into(),
                start_date: "2020-01-01".into(),
                end_date: "2019-01-01".into(),
                current: true,
                ..Default::default()
            }],
            ..Default::default()
        };
        let page = ModernArabic.render(&cv);
        assert!(page.html.contains("حتى الآن"));
        assert!(!page.html.contains("2019"));
    }
}
