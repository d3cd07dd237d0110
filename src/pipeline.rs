//! Pipeline – renders a CV document to PDF bytes in one call, without a
//! builder session: resolve template, gate, render, lay out, capture, export.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::TemplateRegistry;
use crate::export::{ExportError, ExportSettings, Exporter, MemorySink};
use crate::fonts::FontManager;
use crate::gate::{is_export_blocked, Plan, WatermarkPolicy, DEFAULT_WATERMARK_TEXT};
use crate::images::{ImageLoader, NoRemote};
use crate::layout_config::ExportDocument;
use crate::model::{CvDocument, ModelError, DEFAULT_TITLE};
use crate::preview::{Presentation, PreviewSurface, PREVIEW_REGION_ID};
use crate::region::{compose_region, RenderedRegion};

/// Configuration for rendering and export. Every field has a default, so a
/// partial JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Title embedded in the PDF metadata.
    pub title: String,
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    /// Capture density relative to layout units.
    pub supersample: f32,
    pub jpeg_quality: u8,
    /// Upper bound on a single remote image load.
    pub image_timeout_ms: u64,
    pub watermark_text: String,
    pub preview_scale: f32,
    pub preview_max_height: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            supersample: 2.0,
            jpeg_quality: 95,
            image_timeout_ms: 15_000,
            watermark_text: DEFAULT_WATERMARK_TEXT.to_string(),
            preview_scale: 0.75,
            preview_max_height: 800.0,
        }
    }
}

impl PipelineConfig {
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn export_settings(&self) -> ExportSettings {
        ExportSettings {
            title: self.title.clone(),
            page_width_mm: self.page_width_mm,
            page_height_mm: self.page_height_mm,
            supersample: self.supersample,
            jpeg_quality: self.jpeg_quality,
            watermark_text: self.watermark_text.clone(),
        }
    }

    pub fn presentation(&self) -> Presentation {
        Presentation::preview(self.preview_scale, self.preview_max_height)
    }

    /// Image loader with this config's timeout and no network access.
    pub fn image_loader(&self) -> ImageLoader {
        ImageLoader::new(Arc::new(NoRemote), Duration::from_millis(self.image_timeout_ms))
    }
}

/// Lay out `doc` with its chosen template (or the default).
pub fn compose_cv_region(
    doc: &CvDocument,
    registry: &TemplateRegistry,
    fonts: &FontManager,
) -> RenderedRegion {
    let page = registry.resolve(doc.template_id.as_deref()).render(doc);
    compose_region(&page, fonts)
}

/// Full pipeline: CV document → PDF bytes plus the export IR.
///
/// Premium templates on the free plan are refused with
/// [`ExportError::PremiumRequired`].
pub fn render_cv_pdf(
    doc: &CvDocument,
    registry: &TemplateRegistry,
    plan: Plan,
    config: &PipelineConfig,
    fonts: &FontManager,
) -> Result<(Vec<u8>, ExportDocument), ExportError> {
    render_cv_pdf_with(doc, registry, plan, config, fonts, &config.image_loader())
}

/// [`render_cv_pdf`] with a caller-supplied image loader.
pub fn render_cv_pdf_with(
    doc: &CvDocument,
    registry: &TemplateRegistry,
    plan: Plan,
    config: &PipelineConfig,
    fonts: &FontManager,
    images: &ImageLoader,
) -> Result<(Vec<u8>, ExportDocument), ExportError> {
    let template_id = doc.template_id.as_deref();
    if is_export_blocked(registry, template_id, plan) {
        return Err(ExportError::PremiumRequired {
            template_id: registry.meta_or_default(template_id).id.to_string(),
        });
    }

    let region = compose_cv_region(doc, registry, fonts);
    let mut surface = PreviewSurface::new();
    surface.mount(PREVIEW_REGION_ID, Arc::new(region), config.presentation());

    let settings = config.export_settings();
    let mut sink = MemorySink::default();
    let receipt = Exporter::new(fonts, images, &settings).export_to_document(
        &mut surface,
        PREVIEW_REGION_ID,
        &doc.export_filename(),
        WatermarkPolicy::for_plan(plan),
        &mut sink,
    )?;

    let bytes = sink
        .saved
        .pop()
        .map(|(_, bytes)| bytes)
        .unwrap_or_default();
    Ok((bytes, receipt.document))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CvDocument {
        let mut cv = CvDocument::default();
        cv.personal_info.full_name = "سارة أحمد".into();
        cv.summary = "مهندسة برمجيات".into();
        cv
    }

    #[test]
    fn pipeline_basic() {
        let (bytes, doc) = render_cv_pdf(
            &sample(),
            &TemplateRegistry::standard(),
            Plan::Free,
            &PipelineConfig::default(),
            &FontManager::default(),
        )
        .unwrap();
        assert_eq!(&bytes[0..5], b"%PDF-");
        assert_eq!(doc.pages.len(), 1);
        assert!(doc.has_watermark());
    }

    #[test]
    fn premium_template_needs_premium_plan() {
        let mut cv = sample();
        cv.template_id = Some("creative-colorful".into());
        let reg = TemplateRegistry::standard();
        let fonts = FontManager::default();
        let config = PipelineConfig::default();
        let err = render_cv_pdf(&cv, &reg, Plan::Free, &config, &fonts).unwrap_err();
        assert!(matches!(err, ExportError::PremiumRequired { .. }));
        let (_, doc) = render_cv_pdf(&cv, &reg, Plan::Premium, &config, &fonts).unwrap();
        assert!(!doc.has_watermark());
    }

    #[test]
    fn partial_config_json_keeps_defaults() {
        let config = PipelineConfig::from_json(r#"{"jpeg_quality": 80}"#).unwrap();
        assert_eq!(config.jpeg_quality, 80);
        assert_eq!(config.supersample, 2.0);
        assert_eq!(config.image_timeout_ms, 15_000);
        assert!(PipelineConfig::from_json("[").is_err());
    }
}
