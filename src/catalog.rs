//! Template registry – the static catalog of CV templates and the mapping
//! from template id to renderer.

use serde::Serialize;

use crate::templates::{Classic, Creative, Executive, Minimalist, ModernArabic, TemplateRenderer};

/// Template used when a CV names no template or an unknown one.
pub const DEFAULT_TEMPLATE_ID: &str = "modern-arabic";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateCategory {
    Modern,
    Classic,
    Minimalist,
    Creative,
    Professional,
}

/// Catalog entry shown by template pickers.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateMeta {
    pub id: &'static str,
    pub name: &'static str,
    pub category: TemplateCategory,
    pub premium: bool,
    pub preview_url: &'static str,
    pub description: &'static str,
}

struct Registered {
    meta: TemplateMeta,
    renderer: Box<dyn TemplateRenderer>,
}

/// Immutable catalog built once at startup. Order of entries is the display
/// order.
pub struct TemplateRegistry {
    entries: Vec<Registered>,
    default_index: usize,
}

impl TemplateRegistry {
    /// The five built-in templates.
    pub fn standard() -> Self {
        let entries = vec![
            Registered {
                meta: TemplateMeta {
                    id: "modern-arabic",
                    name: "العصري العربي",
                    category: TemplateCategory::Modern,
                    premium: false,
                    preview_url: "/templates/modern-arabic-preview.jpg",
                    description: "تصميم عصري بألوان هادئة مناسب لجميع المجالات",
                },
                renderer: Box::new(ModernArabic),
            },
            Registered {
                meta: TemplateMeta {
                    id: "classic-professional",
                    name: "الكلاسيكي المهني",
                    category: TemplateCategory::Classic,
                    premium: true,
                    preview_url: "/templates/classic-professional-preview.jpg",
                    description: "تصميم كلاسيكي أنيق للوظائف الرسمية والإدارية",
                },
                renderer: Box::new(Classic),
            },
            Registered {
                meta: TemplateMeta {
                    id: "minimalist-clean",
                    name: "البسيط النظيف",
                    category: TemplateCategory::Minimalist,
                    premium: true,
                    preview_url: "/templates/minimalist-clean-preview.jpg",
                    description: "تصميم بسيط يركز على المحتوى بمساحات بيضاء واسعة",
                },
                renderer: Box::new(Minimalist),
            },
            Registered {
                meta: TemplateMeta {
                    id: "creative-colorful",
                    name: "الإبداعي الملون",
                    category: TemplateCategory::Creative,
                    premium: true,
                    preview_url: "/templates/creative-colorful-preview.jpg",
                    description: "تصميم إبداعي بألوان زاهية للمجالات الفنية والتسويقية",
                },
                renderer: Box::new(Creative),
            },
            Registered {
                meta: TemplateMeta {
                    id: "executive-premium",
                    name: "التنفيذي المميز",
                    category: TemplateCategory::Professional,
                    premium: true,
                    preview_url: "/templates/executive-premium-preview.jpg",
                    description: "تصميم فاخر للمناصب القيادية والتنفيذية",
                },
                renderer: Box::new(Executive),
            },
        ];
        let default_index = entries
            .iter()
            .position(|e| e.meta.id == DEFAULT_TEMPLATE_ID)
            .unwrap_or(0);
        Self {
            entries,
            default_index,
        }
    }

    fn find(&self, template_id: Option<&str>) -> Option<&Registered> {
        let id = template_id?;
        self.entries.iter().find(|e| e.meta.id == id)
    }

    fn find_or_default(&self, template_id: Option<&str>) -> &Registered {
        match self.find(template_id) {
            Some(entry) => entry,
            None => {
                log::debug!(
                    "template {:?} not in catalog, using {}",
                    template_id,
                    self.default_id()
                );
                &self.entries[self.default_index]
            }
        }
    }

    /// Renderer for `template_id`; unknown or absent ids get the default.
    pub fn resolve(&self, template_id: Option<&str>) -> &dyn TemplateRenderer {
        self.find_or_default(template_id).renderer.as_ref()
    }

    /// Whether the template is premium. Unknown ids report the default
    /// template's flag.
    pub fn is_premium(&self, template_id: Option<&str>) -> bool {
        self.find_or_default(template_id).meta.premium
    }

    pub fn get(&self, template_id: &str) -> Option<&TemplateMeta> {
        self.find(Some(template_id)).map(|e| &e.meta)
    }

    pub fn meta_or_default(&self, template_id: Option<&str>) -> &TemplateMeta {
        &self.find_or_default(template_id).meta
    }

    pub fn default_id(&self) -> &'static str {
        self.entries[self.default_index].meta.id
    }

    pub fn entries(&self) -> impl Iterator<Item = &TemplateMeta> {
        self.entries.iter().map(|e| &e.meta)
    }

    pub fn list_free(&self) -> Vec<&TemplateMeta> {
        self.entries().filter(|m| !m.premium).collect()
    }

    pub fn list_premium(&self) -> Vec<&TemplateMeta> {
        self.entries().filter(|m| m.premium).collect()
    }

    /// Catalog as a JSON array, for template pickers.
    pub fn to_json(&self) -> String {
        let metas: Vec<&TemplateMeta> = self.entries().collect();
        serde_json::to_string_pretty(&metas).unwrap_or_default()
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_five_templates_in_order() {
        let reg = TemplateRegistry::standard();
        let ids: Vec<_> = reg.entries().map(|m| m.id).collect();
        assert_eq!(
            ids,
            vec![
                "modern-arabic",
                "classic-professional",
                "minimalist-clean",
                "creative-colorful",
                "executive-premium"
            ]
        );
    }

    #[test]
    fn unknown_id_resolves_to_default() {
        let reg = TemplateRegistry::standard();
        assert_eq!(reg.resolve(Some("no-such-template")).id(), DEFAULT_TEMPLATE_ID);
        assert_eq!(reg.resolve(None).id(), DEFAULT_TEMPLATE_ID);
        assert!(!reg.is_premium(Some("no-such-template")));
    }

    #[test]
    fn every_entry_resolves_to_its_own_renderer() {
        let reg = TemplateRegistry::standard();
        for meta in reg.entries() {
            assert_eq!(reg.resolve(Some(meta.id)).id(), meta.id);
        }
    }

    #[test]
    fn free_and_premium_views_partition_catalog() {
        let reg = TemplateRegistry::standard();
        let free: Vec<_> = reg.list_free().iter().map(|m| m.id).collect();
        assert_eq!(free, vec!["modern-arabic"]);
        assert_eq!(reg.list_premium().len(), 4);
        assert!(reg.is_premium(Some("executive-premium")));
    }

    #[test]
    fn json_listing_uses_lowercase_categories() {
        let json = TemplateRegistry::standard().to_json();
        assert!(json.contains("\"professional\""));
        assert!(json.contains("\"premium\": true"));
    }
}
