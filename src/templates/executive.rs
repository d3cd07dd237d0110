//! Executive premium: navy and gold, bordered header, reworded headings.

use super::{
    contact_values, esc, format_gpa, paired_row, photo, present_sections, text_el, Headings,
    PageBuilder, SectionKind, TemplateRenderer, VisualPage,
};
use crate::labels::{date_range, language_level_label, skill_level_label};
use crate::model::CvDocument;

const NAVY: &str = "#0f172a";
const GOLD: &str = "#b8860b";
const SLATE: &str = "#475569";

const HEADINGS: Headings = Headings {
    summary: "نبذة تنفيذية",
    skills: "المهارات الأساسية",
    ..Headings::STANDARD
};

pub struct Executive;

impl Executive {
    fn header(cv: &CvDocument) -> String {
        let info = &cv.personal_info;
        let mut html = format!(
            r#"<div class="px-10 pt-10 pb-6" style="background-color: {NAVY}; color: #ffffff"><div class="flex justify-between items-center gap-8">"#
        );
        html.push_str(&photo(info, 110, &format!("border-width: 3px; border-color: {GOLD}")));
        html.push_str(r#"<div class="flex-1">"#);
        html.push_str(&text_el("h1", "text-4xl font-bold mb-2", "margin-top: 0px", &info.full_name));
        html.push_str(&text_el("p", "text-xl mb-0", &format!("color: {GOLD}"), &info.job_title));
        html.push_str("</div></div>");

        let contacts = contact_values(info);
        if !contacts.is_empty() {
            html.push_str(&format!(
                r#"<div class="mt-6 mb-4" style="height: 1px; background-color: {GOLD}"></div><div class="grid grid-cols-2 gap-2 text-sm" style="color: #cbd5e1">"#
            ));
            for value in contacts {
                html.push_str(&format!("<div>{}</div>", esc(value)));
            }
            html.push_str("</div>");
        }
        html.push_str(&format!(
            r#"</div><div class="h-2" style="background-color: {GOLD}"></div>"#
        ));
        html
    }

    fn heading(text: &str) -> String {
        format!(
            r#"<div class="mb-4"><h2 class="text-xl font-bold mb-2" style="color: {NAVY}; margin-top: 0px">{}</h2><div class="flex justify-end"><div class="w-16 h-1" style="background-color: {GOLD}"></div></div></div>"#,
            esc(text)
        )
    }

    fn entry(title: &str, org: &str, dates: &str, place: &str, details: &[&str]) -> String {
        let mut html = String::from(r#"<div class="pb-4">"#);
        html.push_str(r#"<div class="flex justify-between items-start gap-4">"#);
        html.push_str(&format!(r#"<div class="text-sm text-left" style="color: {SLATE}">"#));
        html.push_str(&text_el("p", "font-bold mb-1", "", dates));
        html.push_str(&text_el("p", "", "margin-bottom: 0px", place));
        html.push_str("</div>");
        html.push_str(r#"<div class="flex-1">"#);
        html.push_str(&text_el("h3", "text-lg font-bold mb-1", &format!("margin-top: 0px; color: {NAVY}"), title));
        html.push_str(&text_el("p", "font-bold mb-2", &format!("color: {GOLD}"), org));
        html.push_str("</div></div>");
        for detail in details {
            html.push_str(&text_el("p", "text-sm", &format!("color: {SLATE}; line-height: 1.6"), detail));
        }
        html.push_str("</div>");
        html
    }

    fn skills(cv: &CvDocument) -> String {
        let mut html = Self::heading(HEADINGS.skills);
        html.push_str(r#"<div class="flex flex-col gap-2">"#);
        for skill in &cv.skills {
            html.push_str(&format!(
                r#"<div class="flex justify-between px-3 py-2 text-sm" style="background-color: #f8fafc; border-width: 1px; border-color: #e2e8f0"><div style="color: {GOLD}">{}</div><div class="font-bold">{}</div></div>"#,
                skill_level_label(&skill.level),
                esc(&skill.name)
            ));
        }
        html.push_str("</div>");
        html
    }

    fn languages(cv: &CvDocument) -> String {
        let mut html = Self::heading(HEADINGS.languages);
        html.push_str(r#"<div class="flex flex-col gap-2">"#);
        for lang in &cv.languages {
            html.push_str(&format!(
                r#"<div class="flex justify-between px-3 py-2 text-sm" style="background-color: #f8fafc; border-width: 1px; border-color: #e2e8f0"><div style="color: {GOLD}">{}</div><div class="font-bold">{}</div></div>"#,
                language_level_label(&lang.level),
                esc(&lang.name)
            ));
        }
        html.push_str("</div>");
        html
    }
}

impl TemplateRenderer for Executive {
    fn id(&self) -> &'static str {
        "executive-premium"
    }

    fn headings(&self) -> Headings {
        HEADINGS
    }

    fn render(&self, cv: &CvDocument) -> VisualPage {
        let mut page = PageBuilder::new(self.id(), "text-right", &format!("color: {NAVY}"));
        page.push(&Self::header(cv));
        page.push(r#"<div class="px-10 py-8 flex flex-col gap-6">"#);

        let plan = present_sections(cv);
        for kind in &plan {
            match kind {
                SectionKind::Summary => {
                    page.mark(*kind);
                    page.push("<div>");
                    page.push(&Self::heading(HEADINGS.summary));
                    page.push(&text_el(
                        "p",
                        "text-base",
                        &format!("color: {SLATE}; line-height: 1.7"),
                        &cv.summary,
                    ));
                    page.push("</div>");
                }
                SectionKind::Experience => {
                    page.mark(*kind);
                    page.push("<div>");
                    page.push(&Self::heading(HEADINGS.experience));
                    for job in &cv.experience {
                        page.push(&Self::entry(
                            &job.position,
                            &job.company,
                            &date_range(&job.start_date, &job.end_date, job.current),
                            &job.location,
                            &[job.description.as_str()],
                        ));
                    }
                    page.push("</div>");
                }
                SectionKind::Education => {
                    page.mark(*kind);
                    page.push("<div>");
                    page.push(&Self::heading(HEADINGS.education));
                    for edu in &cv.education {
                        let gpa = edu.gpa.as_deref().map(format_gpa).unwrap_or_default();
                        page.push(&Self::entry(
                            &edu.degree,
                            &edu.institution,
                            &date_range(&edu.start_date, &edu.end_date, false),
                            &edu.location,
                            &[gpa.as_str(), edu.description.as_deref().unwrap_or("")],
                        ));
                    }
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

    #[test]
    fn uses_executive_headings() {
        let cv = CvDocument {
            summary: "قائد فرق".into(),
            ..Default::default()
        };
        let html = Executive.render(&cv).html;
        assert!(html.contains("نبذة تنفيذية"));
        assert!(!html.contains("نبذة شخصية"));
    }
}
