//! Builder session: the document being edited, its live preview, the owner's
//! plan and the export button, in one place.

use std::sync::Arc;
use std::time::Instant;

use crate::catalog::TemplateRegistry;
use crate::draft::EditBuffer;
use crate::export::{
    DocumentSink, ExportController, ExportError, ExportOutcome, ExportReceipt, Exporter,
};
use crate::fonts::FontManager;
use crate::gate::{self, Plan, PlanSource, WatermarkPolicy, PREMIUM_REQUIRED_MESSAGE};
use crate::images::ImageLoader;
use crate::model::CvDocument;
use crate::pipeline::PipelineConfig;
use crate::preview::{PreviewComposer, PreviewFrame, PreviewSurface, PREVIEW_REGION_ID};

/// What pressing "export" did.
#[derive(Debug)]
pub enum ExportAttempt {
    /// Premium template on the free plan; the pipeline did not start.
    Blocked { message: &'static str },
    Saved(Box<ExportReceipt>),
    /// An export was already in flight; this trigger was ignored.
    AlreadyRunning,
}

pub struct BuilderSession {
    registry: Arc<TemplateRegistry>,
    fonts: FontManager,
    config: PipelineConfig,
    images: ImageLoader,
    composer: PreviewComposer,
    surface: PreviewSurface,
    controller: ExportController,
    plan: Plan,
    draft: EditBuffer<CvDocument>,
}

impl BuilderSession {
    pub fn new(doc: CvDocument, config: PipelineConfig, fonts: FontManager) -> Self {
        let registry = Arc::new(TemplateRegistry::standard());
        Self {
            composer: PreviewComposer::new(Arc::clone(&registry), config.presentation()),
            images: config.image_loader(),
            registry,
            fonts,
            config,
            surface: PreviewSurface::new(),
            controller: ExportController::new(),
            plan: Plan::Free,
            draft: EditBuffer::new(doc),
        }
    }

    pub fn with_image_loader(mut self, images: ImageLoader) -> Self {
        self.images = images;
        self
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    pub fn surface(&self) -> &PreviewSurface {
        &self.surface
    }

    /// Shared handle to the in-flight flag.
    pub fn controller(&self) -> ExportController {
        self.controller.clone()
    }

    pub fn draft(&self) -> &EditBuffer<CvDocument> {
        &self.draft
    }

    /// Last committed document.
    pub fn document(&self) -> Arc<CvDocument> {
        self.draft.snapshot()
    }

    /// Buffer a form edit.
    pub fn edit(&mut self, now: Instant, f: impl FnOnce(&mut CvDocument)) {
        self.draft.update(now, f);
    }

    /// Commit a quiet edit. True when the document changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        self.draft.poll(now).is_some()
    }

    /// Commit any pending edit (the field lost focus).
    pub fn commit_now(&mut self) -> bool {
        self.draft.commit_now().is_some()
    }

    /// Pick a template. Takes effect immediately.
    pub fn select_template(&mut self, template_id: &str) {
        let id = template_id.to_string();
        self.draft.update(Instant::now(), move |doc| doc.template_id = Some(id));
        self.draft.commit_now();
    }

    /// Compose the committed document and mount it on the surface.
    pub fn preview(&mut self) -> Arc<PreviewFrame> {
        let doc = self.draft.snapshot();
        let frame = self
            .composer
            .compose(doc.template_id.as_deref(), &doc, &self.fonts);
        self.composer.mount(&mut self.surface, &frame);
        frame
    }

    /// Take the preview off the surface and drop the cached frame. Returns
    /// false when nothing was mounted.
    pub fn close_preview(&mut self) -> bool {
        self.composer.invalidate();
        self.surface.unmount(PREVIEW_REGION_ID)
    }

    pub fn plan(&self) -> Plan {
        self.plan
    }

    pub fn set_plan(&mut self, plan: Plan) {
        if plan != self.plan {
            log::info!("plan changed to {plan}");
        }
        self.plan = plan;
    }

    /// Ask `source` for the owner's plan; lookup failures mean free.
    pub fn refresh_plan(&mut self, source: &dyn PlanSource) -> Plan {
        let doc = self.draft.snapshot();
        let owner = doc.owner_reference.as_deref().unwrap_or_default();
        let plan = gate::resolve_plan(source, owner);
        self.set_plan(plan);
        plan
    }

    /// Whether the export button is disabled right now.
    pub fn is_export_blocked(&self) -> bool {
        let doc = self.draft.snapshot();
        gate::is_export_blocked(&self.registry, doc.template_id.as_deref(), self.plan)
    }

    /// Export the current document through `sink`.
    pub fn export(&mut self, sink: &mut dyn DocumentSink) -> Result<ExportAttempt, ExportError> {
        if self.controller.is_running() {
            log::debug!("export already in flight; ignoring trigger");
            return Ok(ExportAttempt::AlreadyRunning);
        }

        self.draft.commit_now();
        if self.is_export_blocked() {
            return Ok(ExportAttempt::Blocked {
                message: PREMIUM_REQUIRED_MESSAGE,
            });
        }

        let frame = self.preview();
        log::debug!("exporting with {}", frame.template_id);
        let filename = self.draft.snapshot().export_filename();
        let policy = WatermarkPolicy::for_plan(self.plan);
        let settings = self.config.export_settings();
        let exporter = Exporter::new(&self.fonts, &self.images, &settings);
        let surface = &mut self.surface;

        match self.controller.run(|| {
            exporter.export_to_document(surface, PREVIEW_REGION_ID, &filename, policy, sink)
        }) {
            ExportOutcome::Finished(result) => result.map(|r| ExportAttempt::Saved(Box::new(r))),
            ExportOutcome::AlreadyRunning => Ok(ExportAttempt::AlreadyRunning),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::MemorySink;
    use crate::gate::FixedPlan;
    use crate::preview::Presentation;
    use std::time::Duration;

    fn session() -> BuilderSession {
        let mut doc = CvDocument::default();
        doc.owner_reference = Some("user-1".into());
        doc.personal_info.full_name = "Lina".into();
        BuilderSession::new(doc, PipelineConfig::default(), FontManager::default())
    }

    #[test]
    fn typing_reaches_the_preview_after_a_pause() {
        let mut s = session();
        let first = s.preview();
        let t0 = Instant::now();
        s.edit(t0, |d| d.summary = "x".into());
        assert!(!s.poll(t0 + Duration::from_millis(100)));
        assert!(Arc::ptr_eq(&first, &s.preview()));
        assert!(s.poll(t0 + Duration::from_millis(600)));
        assert!(!Arc::ptr_eq(&first, &s.preview()));
    }

    #[test]
    fn closing_the_preview_unmounts_and_forgets_the_frame() {
        let mut s = session();
        let first = s.preview();
        assert!(s.close_preview());
        assert!(s.surface().region(PREVIEW_REGION_ID).is_none());
        assert!(!s.close_preview());

        let reopened = s.preview();
        assert!(!Arc::ptr_eq(&first, &reopened));
        assert!(s.surface().region(PREVIEW_REGION_ID).is_some());

        s.close_preview();
        let mut sink = MemorySink::default();
        assert!(matches!(s.export(&mut sink).unwrap(), ExportAttempt::Saved(_)));
    }

    #[test]
    fn premium_template_blocks_free_export() {
        let mut s = session();
        s.select_template("executive-premium");
        let mut sink = MemorySink::default();
        match s.export(&mut sink).unwrap() {
            ExportAttempt::Blocked { message } => assert_eq!(message, PREMIUM_REQUIRED_MESSAGE),
            other => panic!("expected Blocked, got {other:?}"),
        }
        assert!(sink.saved.is_empty());

        s.refresh_plan(&FixedPlan(Plan::Premium));
        assert!(matches!(s.export(&mut sink).unwrap(), ExportAttempt::Saved(_)));
        assert_eq!(sink.saved[0].0, "Lina.pdf");
    }

    #[test]
    fn export_restores_the_preview_presentation() {
        let mut s = session();
        s.preview();
        let mut sink = MemorySink::default();
        let attempt = s.export(&mut sink).unwrap();
        let ExportAttempt::Saved(receipt) = attempt else {
            panic!("expected Saved");
        };
        assert!(receipt.watermarked);
        assert_eq!(
            s.surface().presentation(PREVIEW_REGION_ID),
            Some(Presentation::default())
        );
    }

    #[test]
    fn second_trigger_while_running_is_ignored() {
        let mut s = session();
        let ctl = s.controller();
        let mut sink = MemorySink::default();
        let inner = ctl.run(|| s.export(&mut sink));
        assert!(matches!(
            inner,
            ExportOutcome::Finished(Ok(ExportAttempt::AlreadyRunning))
        ));
        assert!(sink.saved.is_empty());
    }
}
