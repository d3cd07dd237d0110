//! Document model – the normalized, serializable CV consumed by every
//! renderer.
//!
//! The JSON shape matches what the form layer sends (`user_id`,
//! `personal_info`, `start_date`, ...). Entries inside the four collections are
//! joined on their `id` only; nothing in this crate addresses an entry by
//! position.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Title used when the producer does not name the document.
pub const DEFAULT_TITLE: &str = "السيرة الذاتية الجديدة";

/// File stem used when the CV has no full name.
pub const DEFAULT_FILE_STEM: &str = "السيرة الذاتية";

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid CV document JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// A complete CV as delivered by the form layer on every change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvDocument {
    /// Opaque id of the owning user; never dereferenced here.
    #[serde(rename = "user_id", default, skip_serializing_if = "Option::is_none")]
    pub owner_reference: Option<String>,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(default)]
    pub personal_info: PersonalInfo,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub languages: Vec<Language>,
    #[serde(default)]
    pub summary: String,
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

impl Default for CvDocument {
    fn default() -> Self {
        Self {
            owner_reference: None,
            title: default_title(),
            template_id: None,
            personal_info: PersonalInfo::default(),
            education: Vec::new(),
            experience: Vec::new(),
            skills: Vec::new(),
            languages: Vec::new(),
            summary: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalInfo {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// Data URL, local path or remote URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Education {
    pub id: String,
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpa: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    pub id: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    /// Still employed here; overrides whatever `end_date` holds.
    #[serde(default)]
    pub current: bool,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub level: SkillLevel,
    #[serde(default)]
    pub category: SkillCategory,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub level: LanguageLevel,
}

// ---------------------------------------------------------------------------
// Levels and categories
// ---------------------------------------------------------------------------

/// Skill proficiency. Values outside the four tiers are kept verbatim in
/// `Other` so they survive a round trip; renderers map them to a fallback
/// label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SkillLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
    Expert,
    Other(String),
}

impl From<String> for SkillLevel {
    fn from(s: String) -> Self {
        match s.as_str() {
            "beginner" => SkillLevel::Beginner,
            "intermediate" => SkillLevel::Intermediate,
            "advanced" => SkillLevel::Advanced,
            "expert" => SkillLevel::Expert,
            _ => SkillLevel::Other(s),
        }
    }
}

impl From<&str> for SkillLevel {
    fn from(s: &str) -> Self {
        SkillLevel::from(s.to_string())
    }
}

impl From<SkillLevel> for String {
    fn from(level: SkillLevel) -> Self {
        level.to_string()
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkillLevel::Beginner => f.write_str("beginner"),
            SkillLevel::Intermediate => f.write_str("intermediate"),
            SkillLevel::Advanced => f.write_str("advanced"),
            SkillLevel::Expert => f.write_str("expert"),
            SkillLevel::Other(s) => f.write_str(s),
        }
    }
}

/// Spoken-language proficiency; independent of [`SkillLevel`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LanguageLevel {
    Basic,
    #[default]
    Conversational,
    Fluent,
    Native,
    Other(String),
}

impl From<String> for LanguageLevel {
    fn from(s: String) -> Self {
        match s.as_str() {
            "basic" => LanguageLevel::Basic,
            "conversational" => LanguageLevel::Conversational,
            "fluent" => LanguageLevel::Fluent,
            "native" => LanguageLevel::Native,
            _ => LanguageLevel::Other(s),
        }
    }
}

impl From<&str> for LanguageLevel {
    fn from(s: &str) -> Self {
        LanguageLevel::from(s.to_string())
    }
}

impl From<LanguageLevel> for String {
    fn from(level: LanguageLevel) -> Self {
        level.to_string()
    }
}

impl fmt::Display for LanguageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LanguageLevel::Basic => f.write_str("basic"),
            LanguageLevel::Conversational => f.write_str("conversational"),
            LanguageLevel::Fluent => f.write_str("fluent"),
            LanguageLevel::Native => f.write_str("native"),
            LanguageLevel::Other(s) => f.write_str(s),
        }
    }
}

/// Skill grouping. `"other"` and any unrecognised category both land in
/// `Other`, keeping the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SkillCategory {
    #[default]
    Technical,
    Soft,
    Language,
    Other(String),
}

impl From<String> for SkillCategory {
    fn from(s: String) -> Self {
        match s.as_str() {
            "technical" => SkillCategory::Technical,
            "soft" => SkillCategory::Soft,
            "language" => SkillCategory::Language,
            _ => SkillCategory::Other(s),
        }
    }
}

impl From<&str> for SkillCategory {
    fn from(s: &str) -> Self {
        SkillCategory::from(s.to_string())
    }
}

impl From<SkillCategory> for String {
    fn from(category: SkillCategory) -> Self {
        category.to_string()
    }
}

impl fmt::Display for SkillCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkillCategory::Technical => f.write_str("technical"),
            SkillCategory::Soft => f.write_str("soft"),
            SkillCategory::Language => f.write_str("language"),
            SkillCategory::Other(s) => f.write_str(s),
        }
    }
}

// ---------------------------------------------------------------------------
// Id-keyed collection operations
// ---------------------------------------------------------------------------

/// An entry of one of the four CV collections.
pub trait Entry {
    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
}

macro_rules! impl_entry {
    ($($ty:ty),*) => {
        $(impl Entry for $ty {
            fn id(&self) -> &str {
                &self.id
            }
            fn set_id(&mut self, id: String) {
                self.id = id;
            }
        })*
    };
}

impl_entry!(Education, Experience, Skill, Language);

fn new_entry_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn push_blank<T: Entry + Default>(items: &mut Vec<T>) -> String {
    let id = new_entry_id();
    let mut entry = T::default();
    entry.set_id(id.clone());
    items.push(entry);
    id
}

/// Replace the entry whose id is `id`. The replacement inherits that id.
fn update_by_id<T: Entry>(items: &mut [T], id: &str, mut data: T) -> bool {
    match items.iter_mut().find(|e| e.id() == id) {
        Some(slot) => {
            data.set_id(id.to_string());
            *slot = data;
            true
        }
        None => false,
    }
}

fn remove_by_id<T: Entry>(items: &mut Vec<T>, id: &str) -> bool {
    let before = items.len();
    items.retain(|e| e.id() != id);
    items.len() != before
}

impl CvDocument {
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn add_education(&mut self) -> String {
        push_blank(&mut self.education)
    }

    pub fn add_experience(&mut self) -> String {
        push_blank(&mut self.experience)
    }

    pub fn add_skill(&mut self) -> String {
        push_blank(&mut self.skills)
    }

    pub fn add_language(&mut self) -> String {
        push_blank(&mut self.languages)
    }

    pub fn update_education(&mut self, id: &str, data: Education) -> bool {
        update_by_id(&mut self.education, id, data)
    }

    pub fn update_experience(&mut self, id: &str, data: Experience) -> bool {
        update_by_id(&mut self.experience, id, data)
    }

    pub fn update_skill(&mut self, id: &str, data: Skill) -> bool {
        update_by_id(&mut self.skills, id, data)
    }

    pub fn update_language(&mut self, id: &str, data: Language) -> bool {
        update_by_id(&mut self.languages, id, data)
    }

    pub fn remove_education(&mut self, id: &str) -> bool {
        remove_by_id(&mut self.education, id)
    }

    pub fn remove_experience(&mut self, id: &str) -> bool {
        remove_by_id(&mut self.experience, id)
    }

    pub fn remove_skill(&mut self, id: &str) -> bool {
        remove_by_id(&mut self.skills, id)
    }

    pub fn remove_language(&mut self, id: &str) -> bool {
        remove_by_id(&mut self.languages, id)
    }

    /// Ids that occur more than once across all collections.
    pub fn duplicate_ids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut dups = Vec::new();
        let ids = self
            .education
            .iter()
            .map(Entry::id)
            .chain(self.experience.iter().map(Entry::id))
            .chain(self.skills.iter().map(Entry::id))
            .chain(self.languages.iter().map(Entry::id));
        for id in ids {
            if !seen.insert(id) && !dups.iter().any(|d: &String| d == id) {
                dups.push(id.to_string());
            }
        }
        dups
    }

    /// Download name for this CV: `"{full_name}.pdf"`.
    pub fn export_filename(&self) -> String {
        let name = self.personal_info.full_name.trim();
        let stem = if name.is_empty() { DEFAULT_FILE_STEM } else { name };
        let safe: String = stem
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '\0' => '_',
                c => c,
            })
            .collect();
        format!("{safe}.pdf")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_json_gets_defaults() {
        let cv = CvDocument::from_json(r#"{"personal_info": {"full_name": "Sara"}}"#).unwrap();
        assert_eq!(cv.title, DEFAULT_TITLE);
        assert!(cv.template_id.is_none());
        assert!(cv.experience.is_empty());
        assert_eq!(cv.personal_info.full_name, "Sara");
    }

    #[test]
    fn unknown_levels_round_trip() {
        let json = r#"{
            "skills": [{"id": "s1", "name": "Rust", "level": "guru", "category": "technical"}],
            "languages": [{"id": "l1", "name": "English", "level": "fluent"}]
        }"#;
        let cv = CvDocument::from_json(json).unwrap();
        assert_eq!(cv.skills[0].level, SkillLevel::Other("guru".into()));
        assert_eq!(cv.languages[0].level, LanguageLevel::Fluent);

        let back = CvDocument::from_json(&cv.to_json().unwrap()).unwrap();
        assert_eq!(back.skills[0].level.to_string(), "guru");
    }

    #[test]
    fn unknown_skill_category_is_kept() {
        let json = r#"{"skills":[{"id":"s1","name":"Chess","level":"guru","category":"hobby"}]}"#;
        let cv = CvDocument::from_json(json).unwrap();
        assert_eq!(cv.skills[0].category, SkillCategory::Other("hobby".into()));
        assert_eq!(cv.skills[0].level, SkillLevel::Other("guru".into()));

        let back = CvDocument::from_json(&cv.to_json().unwrap()).unwrap();
        assert_eq!(back.skills[0].category.to_string(), "hobby");
        assert_eq!(SkillCategory::from("soft"), SkillCategory::Soft);
    }

    #[test]
    fn update_and_remove_join_on_id() {
        let mut cv = CvDocument::default();
        let a = cv.add_experience();
        let b = cv.add_experience();

        let edited = Experience {
            id: "ignored".into(),
            position: "Engineer".into(),
            ..Default::default()
        };
        assert!(cv.update_experience(&b, edited));
        assert_eq!(cv.experience[1].position, "Engineer");
        assert_eq!(cv.experience[1].id, b);
        assert_eq!(cv.experience[0].position, "");

        assert!(cv.remove_experience(&a));
        assert!(!cv.remove_experience(&a));
        assert_eq!(cv.experience.len(), 1);
        assert!(!cv.update_experience("missing", Experience::default()));
    }

    #[test]
    fn new_entries_get_distinct_ids() {
        let mut cv = CvDocument::default();
        let ids: Vec<String> = (0..4).map(|_| cv.add_skill()).collect();
        assert!(cv.duplicate_ids().is_empty());
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn duplicate_ids_are_reported_once() {
        let mut cv = CvDocument::default();
        cv.skills.push(Skill { id: "x".into(), ..Default::default() });
        cv.languages.push(Language { id: "x".into(), ..Default::default() });
        cv.languages.push(Language { id: "x".into(), ..Default::default() });
        assert_eq!(cv.duplicate_ids(), vec!["x".to_string()]);
    }

    #[test]
    fn export_filename_uses_name_or_default() {
        let mut cv = CvDocument::default();
        assert_eq!(cv.export_filename(), "السيرة الذاتية.pdf");
        cv.personal_info.full_name = "  Ali/Hassan ".into();
        assert_eq!(cv.export_filename(), "Ali_Hassan.pdf");
    }
}
