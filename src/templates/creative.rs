//! Creative colorful: purple banner, colored timeline markers, category chips.

use super::{
    contact_values, esc, format_gpa, paired_row, photo, present_sections, text_el, Headings,
    PageBuilder, SectionKind, TemplateRenderer, VisualPage,
};
use crate::labels::{date_range, language_level_label, skill_bar_width, skill_level_label};
use crate::model::{CvDocument, SkillCategory};

const PURPLE: &str = "#7c3aed";
const PINK: &str = "#db2777";
const TEAL: &str = "#0d9488";
const AMBER: &str = "#d97706";

pub struct Creative;

fn category_color(category: &SkillCategory) -> &'static str {
    match category {
        SkillCategory::Technical => PURPLE,
        SkillCategory::Soft => PINK,
        SkillCategory::Language => TEAL,
        SkillCategory::Other(_) => AMBER,
    }
}

fn heading(text: &str, color: &str) -> String {
    format!(
        r#"<div class="flex justify-end items-center gap-2 mb-3"><h2 class="text-xl font-bold" style="color: {color}; margin: 0px">{}</h2><div class="w-2 h-6" style="background-color: {color}"></div></div>"#,
        esc(text)
    )
}

/// Entry with a colored marker bar on the reading edge.
fn timeline_entry(color: &str, inner: &str) -> String {
    format!(
        r#"<div class="flex gap-3"><div class="flex-1">{inner}</div><div class="w-1" style="background-color: {color}"></div></div>"#
    )
}

impl Creative {
    fn header(cv: &CvDocument) -> String {
        let info = &cv.personal_info;
        let mut html = format!(
            r#"<div class="p-8" style="background-color: {PURPLE}; color: #ffffff"><div class="flex justify-between items-center gap-6">"#
        );
        html.push_str(&photo(info, 104, "border-width: 4px; border-color: #fbcfe8"));
        html.push_str(r#"<div class="flex-1">"#);
        html.push_str(&text_el("h1", "text-4xl font-bold mb-2", "margin-top: 0px", &info.full_name));
        if !info.job_title.trim().is_empty() {
            html.push_str(&format!(
                r#"<div class="flex justify-end"><div class="px-3 py-1 text-lg" style="background-color: {PINK}">{}</div></div>"#,
                esc(info.job_title.trim())
            ));
        }
        html.push_str("</div></div>");
        html.push_str("</div>");

        let contacts = contact_values(info);
        if !contacts.is_empty() {
            html.push_str(&format!(
                r#"<div class="flex flex-wrap justify-center gap-4 px-8 py-3 text-sm" style="background-color: #f5f3ff; color: {PURPLE}">"#
            ));
            for value in contacts {
                html.push_str(&format!("<div>{}</div>", esc(value)));
            }
            html.push_str("</div>");
        }
        html
    }

    fn skills(cv: &CvDocument) -> String {
        let mut html = heading(Headings::STANDARD.skills, TEAL);
        html.push_str(r#"<div class="flex flex-col gap-3">"#);
        for skill in &cv.skills {
            let color = category_color(&skill.category);
            html.push_str(&format!(
                r#"<div><div class="flex justify-between text-sm mb-1"><div class="text-gray-500">{}</div><div class="font-bold" style="color: {color}">{}</div></div><div class="w-full h-2 bg-gray-100"><div class="{} h-2" style="background-color: {color}"></div></div></div>"#,
                skill_level_label(&skill.level),
                esc(&skill.name),
                skill_bar_width(&skill.level),
            ));
        }
        html.push_str("</div>");
        html
    }

    fn languages(cv: &CvDocument) -> String {
        let mut html = heading(Headings::STANDARD.languages, AMBER);
        html.push_str(r#"<div class="flex flex-wrap justify-end gap-2">"#);
        for lang in &cv.languages {
            html.push_str(&format!(
                r#"<div class="px-3 py-1 text-sm" style="background-color: #fef3c7; color: #92400e">{} · {}</div>"#,
                esc(&lang.name),
                language_level_label(&lang.level)
            ));
        }
        html.push_str("</div>");
        html
    }
}

impl TemplateRenderer for Creative {
    fn id(&self) -> &'static str {
        "creative-colorful"
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
                    page.push(&format!(
                        r#"<div class="p-4" style="background-color: #fdf2f8">{}{}</div>"#,
                        heading(headings.summary, PINK),
                        text_el("p", "text-gray-700", "line-height: 1.6; margin-bottom: 0px", &cv.summary)
                    ));
                }
                SectionKind::Experience => {
                    page.mark(*kind);
                    page.push("<div>");
                    page.push(&heading(headings.experience, PURPLE));
                    page.push(r#"<div class="flex flex-col gap-4">"#);
                    for job in &cv.experience {
                        let mut inner = text_el("h3", "text-lg font-bold", "margin-top: 0px; margin-bottom: 2px", &job.position);
                        inner.push_str(&text_el("p", "font-bold mb-1", &format!("color: {PINK}"), &job.company));
                        let when_where = [
                            date_range(&job.start_date, &job.end_date, job.current),
                            job.location.trim().to_string(),
                        ]
                        .into_iter()
                        .filter(|s| !s.is_empty())
                        .collect::<Vec<_>>()
                        .join(" | ");
                        inner.push_str(&text_el("p", "text-xs text-gray-500 mb-2", "", &when_where));
                        inner.push_str(&text_el("p", "text-sm text-gray-700", "", &job.description));
                        page.push(&timeline_entry(PURPLE, &inner));
                    }
                    page.push("</div></div>");
                }
                SectionKind::Education => {
                    page.mark(*kind);
                    page.push("<div>");
                    page.push(&heading(headings.education, PINK));
                    page.push(r#"<div class="flex flex-col gap-4">"#);
                    for edu in &cv.education {
                        let mut inner = text_el("h3", "text-lg font-bold", "margin-top: 0px; margin-bottom: 2px", &edu.degree);
                        inner.push_str(&text_el("p", "font-bold mb-1", &format!("color: {PURPLE}"), &edu.institution));
                        inner.push_str(&text_el(
                            "p",
                            "text-xs text-gray-500 mb-1",
                            "",
                            &date_range(&edu.start_date, &edu.end_date, false),
                        ));
                        if let Some(gpa) = edu.gpa.as_deref() {
                            inner.push_str(&text_el("p", "text-sm mb-1", "", &format_gpa(gpa)));
                        }
                        if let Some(desc) = edu.description.as_deref() {
                            inner.push_str(&text_el("p", "text-sm text-gray-700", "", desc));
                        }
                        page.push(&timeline_entry(PINK, &inner));
                    }
                    page.push("</div></div>");
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
    use crate::model::Skill;

    #[test]
    fn skill_bars_take_category_color() {
        let cv = CvDocument {
            skills: vec![Skill {
                name: "Rust".into(),
                category: SkillCategory::Soft,
                ..Default::default()
            }],
            ..Default::default()
        };
        let html = Creative.render(&cv).html;
        assert!(html.contains(&format!("background-color: {PINK}")));
    }
}
