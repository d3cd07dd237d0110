//! Classic professional: centered header, ruled section titles, text levels.

use super::{
    contact_values, esc, format_gpa, paired_row, photo, present_sections, text_el, Headings,
    PageBuilder, SectionKind, TemplateRenderer, VisualPage,
};
use crate::labels::{date_range, language_level_label, skill_level_label};
use crate::model::CvDocument;

const INK: &str = "#111827";
const RULE: &str = "#374151";

pub struct Classic;

impl Classic {
    fn header(cv: &CvDocument) -> String {
        let info = &cv.personal_info;
        let mut html = String::from(r#"<div class="flex flex-col items-center text-center pb-6 mb-6">"#);
        html.push_str(&photo(info, 88, "margin-bottom: 12px"));
        html.push_str(&text_el("h1", "text-3xl font-bold mb-1", "margin-top: 0px", &info.full_name));
        html.push_str(&text_el("p", "text-lg text-gray-700 mb-3", "", &info.job_title));
        let contacts = contact_values(info);
        if !contacts.is_empty() {
            let line = contacts.join(" | ");
            html.push_str(&text_el("p", "text-sm text-gray-500", "margin-bottom: 0px", &line));
        }
        html.push_str(&format!(
            r#"</div><div class="h-1 mb-6" style="background-color: {INK}"></div>"#
        ));
        html
    }

    fn heading(text: &str) -> String {
        format!(
            r#"<h2 class="text-lg font-bold mb-1" style="color: {INK}; margin-top: 0px">{}</h2><div class="mb-3" style="height: 1px; background-color: {RULE}"></div>"#,
            esc(text)
        )
    }

    fn dated_entry(title: &str, subtitle: &str, place: &str, dates: &str, body: &[String]) -> String {
        let mut html = String::from("<div>");
        html.push_str(r#"<div class="flex justify-between items-start gap-4">"#);
        html.push_str(&text_el("div", "text-sm text-gray-500 text-left", "", dates));
        html.push_str(r#"<div class="flex-1">"#);
        html.push_str(&text_el("h3", "text-base font-bold", "margin-top: 0px; margin-bottom: 2px", title));
        let sub = match (subtitle.trim().is_empty(), place.trim().is_empty()) {
            (false, false) => format!("{}، {}", subtitle.trim(), place.trim()),
            (false, true) => subtitle.trim().to_string(),
            (true, false) => place.trim().to_string(),
            (true, true) => String::new(),
        };
        html.push_str(&text_el("p", "text-sm italic text-gray-700 mb-1", "", &sub));
        html.push_str("</div></div>");
        for para in body {
            html.push_str(&text_el("p", "text-sm", "margin-bottom: 4px", para));
        }
        html.push_str("</div>");
        html
    }

    fn skills(cv: &CvDocument) -> String {
        let mut html = Self::heading(Headings::STANDARD.skills);
        for skill in &cv.skills {
            html.push_str(&format!(
                r#"<div class="flex justify-between text-sm mb-1"><div class="text-gray-500">{}</div><div>{}</div></div>"#,
                skill_level_label(&skill.level),
                esc(&skill.name)
            ));
        }
        html
    }

    fn languages(cv: &CvDocument) -> String {
        let mut html = Self::heading(Headings::STANDARD.languages);
        for lang in &cv.languages {
            html.push_str(&format!(
                r#"<div class="flex justify-between text-sm mb-1"><div class="text-gray-500">{}</div><div>{}</div></div>"#,
                language_level_label(&lang.level),
                esc(&lang.name)
            ));
        }
        html
    }
}

impl TemplateRenderer for Classic {
    fn id(&self) -> &'static str {
        "classic-professional"
    }

    fn render(&self, cv: &CvDocument) -> VisualPage {
        let headings = Headings::STANDARD;
        let mut page = PageBuilder::new(self.id(), "p-10 text-right", &format!("color: {INK}"));
        page.push(&Self::header(cv));
        page.push(r#"<div class="flex flex-col gap-5">"#);

        let plan = present_sections(cv);
        for kind in &plan {
            match kind {
                SectionKind::Summary => {
                    page.mark(*kind);
                    page.push("<div>");
                    page.push(&Self::heading(headings.summary));
                    page.push(&text_el("p", "text-sm", "line-height: 1.6", &cv.summary));
                    page.push("</div>");
                }
                SectionKind::Experience => {
                    page.mark(*kind);
                    page.push("<div>");
                    page.push(&Self::heading(headings.experience));
                    page.push(r#"<div class="flex flex-col gap-3">"#);
                    for job in &cv.experience {
                        page.push(&Self::dated_entry(
                            &job.position,
                            &job.company,
                            &job.location,
                            &date_range(&job.start_date, &job.end_date, job.current),
                            &[job.description.clone()],
                        ));
                    }
                    page.push("</div></div>");
                }
                SectionKind::Education => {
                    page.mark(*kind);
                    page.push("<div>");
                    page.push(&Self::heading(headings.education));
                    page.push(r#"<div class="flex flex-col gap-3">"#);
                    for edu in &cv.education {
                        let body = [
                            edu.gpa.as_deref().map(format_gpa).unwrap_or_default(),
                            edu.description.clone().unwrap_or_default(),
                        ];
                        page.push(&Self::dated_entry(
                            &edu.degree,
                            &edu.institution,
                            &edu.location,
                            &date_range(&edu.start_date, &edu.end_date, false),
                            &body,
                        ));
                    }
                    page.push("</div></div>");
                }
                SectionKind::Skills | SectionKind::Languages => {}
            }
        }
        paired_row(&mut page, &plan, "gap-10", || Self::skills(cv), || Self::languages(cv));

        page.push("</div>");
        page.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Education, PersonalInfo};

    #[test]
    fn contacts_join_on_one_line() {
        let cv = CvDocument {
            personal_info: PersonalInfo {
                email: "a@b.c".into(),
                phone: "0500".into(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(Classic.render(&cv).html.contains("a@b.c | 0500"));
    }

    #[test]
    fn blank_gpa_is_not_rendered() {
        let cv = CvDocument {
            education: vec![Education {
                degree: "بكالوريوس".into(),
                gpa: Some("  ".into()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let page = Classic.render(&cv);
        assert!(!page.html.contains("المعدل"));
        assert_eq!(page.sections, vec![SectionKind::Education]);
    }
}
