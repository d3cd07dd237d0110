//! Display text shared by all templates: proficiency labels, date ranges and
//! the fixed Arabic strings.

use chrono::{Datelike, NaiveDate};

use crate::model::{LanguageLevel, SkillLevel};

/// Shown in place of the end date while `current` is set.
pub const ONGOING_LABEL: &str = "حتى الآن";

/// Middle tier label used for any level outside the known tiers.
pub const FALLBACK_LEVEL_LABEL: &str = "متوسط";

pub const GPA_LABEL: &str = "المعدل";

const MONTHS_AR: [&str; 12] = [
    "يناير",
    "فبراير",
    "مارس",
    "أبريل",
    "مايو",
    "يونيو",
    "يوليو",
    "أغسطس",
    "سبتمبر",
    "أكتوبر",
    "نوفمبر",
    "ديسمبر",
];

pub fn skill_level_label(level: &SkillLevel) -> &'static str {
    match level {
        SkillLevel::Beginner => "مبتدئ",
        SkillLevel::Intermediate => "متوسط",
        SkillLevel::Advanced => "متقدم",
        SkillLevel::Expert => "خبير",
        SkillLevel::Other(_) => FALLBACK_LEVEL_LABEL,
    }
}

pub fn language_level_label(level: &LanguageLevel) -> &'static str {
    match level {
        LanguageLevel::Basic => "أساسي",
        LanguageLevel::Conversational => "محادثة",
        LanguageLevel::Fluent => "طلاقة",
        LanguageLevel::Native => "لغة أم",
        LanguageLevel::Other(_) => FALLBACK_LEVEL_LABEL,
    }
}

/// Width class for a proficiency bar.
pub fn skill_bar_width(level: &SkillLevel) -> &'static str {
    match level {
        SkillLevel::Beginner => "w-1/4",
        SkillLevel::Intermediate => "w-1/2",
        SkillLevel::Advanced => "w-3/4",
        SkillLevel::Expert => "w-full",
        SkillLevel::Other(_) => "w-1/2",
    }
}

/// Format a free-text date as "month year".
///
/// Blank input gives blank output. `YYYY-MM-DD` and `YYYY-MM` get the Arabic
/// month name; anything else is shown as typed.
pub fn format_date(raw: &str) -> String {
    let s = raw.trim();
    if s.is_empty() {
        return String::new();
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d").ok());
    match date {
        Some(d) => format!("{} {}", MONTHS_AR[d.month0() as usize], d.year()),
        // Bare years and free text pass through.
        None => s.to_string(),
    }
}

/// `"start – end"`, with the ongoing label standing in for `end` when
/// `current` is set. Blank halves are dropped.
pub fn date_range(start: &str, end: &str, current: bool) -> String {
    let start = format_date(start);
    let end = if current {
        ONGOING_LABEL.to_string()
    } else {
        format_date(end)
    };
    match (start.is_empty(), end.is_empty()) {
        (true, true) => String::new(),
        (false, true) => start,
        (true, false) => end,
        (false, false) => format!("{start} – {end}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_full_and_partial_dates() {
        assert_eq!(format_date("2020-01-01"), "يناير 2020");
        assert_eq!(format_date("2021-12"), "ديسمبر 2021");
        assert_eq!(format_date("2019"), "2019");
        assert_eq!(format_date("   "), "");
        assert_eq!(format_date("summer 2018"), "summer 2018");
    }

    #[test]
    fn current_overrides_stored_end_date() {
        let range = date_range("2020-01-01", "2019-01-01", true);
        assert_eq!(range, "يناير 2020 – حتى الآن");
        assert!(!range.contains("2019"));
    }

    #[test]
    fn blank_dates_collapse() {
        assert_eq!(date_range("", "", false), "");
        assert_eq!(date_range("", "", true), ONGOING_LABEL);
        assert_eq!(date_range("2020-03", "", false), "مارس 2020");
    }

    #[test]
    fn unknown_levels_fall_back_to_middle_label() {
        assert_eq!(skill_level_label(&SkillLevel::from("guru")), FALLBACK_LEVEL_LABEL);
        assert_eq!(language_level_label(&LanguageLevel::from("guru")), FALLBACK_LEVEL_LABEL);
        assert_eq!(skill_level_label(&SkillLevel::Expert), "خبير");
        assert_eq!(language_level_label(&LanguageLevel::Native), "لغة أم");
        assert_eq!(skill_bar_width(&SkillLevel::from("guru")), "w-1/2");
    }
}
