//! Minimalist: generous whitespace, thin gray rules, no color accents.

use super::{
    contact_values, esc, format_gpa, paired_row, photo, present_sections, text_el, Headings,
    PageBuilder, SectionKind, TemplateRenderer, VisualPage,
};
use crate::labels::{date_range, language_level_label, skill_level_label};
use crate::model::CvDocument;

const FAINT: &str = "#9ca3af";
const HAIRLINE: &str = "#e5e7eb";

pub struct Minimalist;

fn heading(text: &str) -> String {
    format!(
        r#"<h2 class="text-sm font-bold mb-3" style="color: {FAINT}; margin-top: 0px">{}</h2>"#,
        esc(text)
    )
}

fn rule() -> String {
    format!(r#"<div class="my-6" style="height: 1px; background-color: {HAIRLINE}"></div>"#)
}

impl TemplateRenderer for Minimalist {
    fn id(&self) -> &'static str {
        "minimalist-clean"
    }

    fn render(&self, cv: &CvDocument) -> VisualPage {
        let info = &cv.personal_info;
        let headings = Headings::STANDARD;
        let mut page = PageBuilder::new(self.id(), "p-12 text-right", "color: #374151");

        page.push(r#"<div class="flex justify-between items-start gap-6">"#);
        page.push(&photo(info, 72, ""));
        page.push(r#"<div class="flex-1">"#);
        page.push(&text_el("h1", "text-3xl mb-1", "margin-top: 0px; font-weight: normal; color: #111827", &info.full_name));
        page.push(&text_el("p", "text-base mb-3", &format!("color: {FAINT}"), &info.job_title));
        let contacts = contact_values(info);
        if !contacts.is_empty() {
            page.push(r#"<div class="flex flex-wrap justify-end gap-3 text-xs text-gray-500">"#);
            for value in contacts {
                page.push(&format!("<div>{}</div>", esc(value)));
            }
            page.push("</div>");
        }
        page.push("</div></div>");

        let plan = present_sections(cv);
        for kind in &plan {
            match kind {
                SectionKind::Summary => {
                    page.mark(*kind);
                    page.push(&rule());
                    page.push(&heading(headings.summary));
                    page.push(&text_el("p", "text-sm", "line-height: 1.7", &cv.summary));
                }
                SectionKind::Experience => {
                    page.mark(*kind);
                    page.push(&rule());
                    page.push(&heading(headings.experience));
                    page.push(r#"<div class="flex flex-col gap-4">"#);
                    for job in &cv.experience {
                        page.push("<div>");
                        page.push(&text_el("p", "text-base font-bold mb-1", "color: #111827", &job.position));
                        let meta = [job.company.trim(), job.location.trim()]
                            .into_iter()
                            .filter(|s| !s.is_empty())
                            .collect::<Vec<_>>()
                            .join(" · ");
                        page.push(&text_el("p", "text-sm mb-1", "", &meta));
                        page.push(&text_el(
                            "p",
                            "text-xs mb-2",
                            &format!("color: {FAINT}"),
                            &date_range(&job.start_date, &job.end_date, job.current),
                        ));
                        page.push(&text_el("p", "text-sm", "line-height: 1.6", &job.description));
                        page.push("</div>");
                    }
                    page.push("</div>");
                }
                SectionKind::Education => {
                    page.mark(*kind);
                    page.push(&rule());
                    page.push(&heading(headings.education));
                    page.push(r#"<div class="flex flex-col gap-4">"#);
                    for edu in &cv.education {
                        page.push("<div>");
                        page.push(&text_el("p", "text-base font-bold mb-1", "color: #111827", &edu.degree));
                        page.push(&text_el("p", "text-sm mb-1", "", &edu.institution));
                        page.push(&text_el(
                            "p",
                            "text-xs mb-1",
                            &format!("color: {FAINT}"),
                            &date_range(&edu.start_date, &edu.end_date, false),
                        ));
                        if let Some(gpa) = edu.gpa.as_deref() {
                            page.push(&text_el("p", "text-xs mb-1", "", &format_gpa(gpa)));
                        }
                        if let Some(desc) = edu.description.as_deref() {
                            page.push(&text_el("p", "text-sm", "", desc));
                        }
                        page.push("</div>");
                    }
                    page.push("</div>");
                }
                SectionKind::Skills | SectionKind::Languages => {}
            }
        }

        if plan.contains(&SectionKind::Skills) || plan.contains(&SectionKind::Languages) {
            page.push(&rule());
        }
        paired_row(
            &mut page,
            &plan,
            "gap-12",
            || {
                let mut html = heading(headings.skills);
                for skill in &cv.skills {
                    html.push_str(&format!(
                        r#"<div class="flex justify-between text-sm mb-2"><div style="color: {FAINT}">{}</div><div>{}</div></div>"#,
                        skill_level_label(&skill.level),
                        esc(&skill.name)
                    ));
                }
                html
            },
            || {
                let mut html = heading(headings.languages);
                for lang in &cv.languages {
                    html.push_str(&format!(
                        r#"<div class="flex justify-between text-sm mb-2"><div style="color: {FAINT}">{}</div><div>{}</div></div>"#,
                        language_level_label(&lang.level),
                        esc(&lang.name)
                    ));
                }
                html
            },
        );

        page.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Language, LanguageLevel};

    #[test]
    fn languages_alone_fill_the_row() {
        let cv = CvDocument {
            languages: vec![Language {
                name: "English".into(),
                level: LanguageLevel::Fluent,
                ..Default::default()
            }],
            ..Default::default()
        };
        let page = Minimalist.render(&cv);
        assert_eq!(page.sections, vec![SectionKind::Languages]);
        assert!(!page.html.contains("grid-cols-2"));
        assert!(page.html.contains("طلاقة"));
    }
}
