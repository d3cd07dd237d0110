//! Preview composition and the surface that hosts rendered regions.
//!
//! The composer resolves the active template, renders the current document
//! snapshot and lays it out, reusing the previous frame while neither the
//! snapshot (by `Arc` identity) nor the template id changed. The surface keeps
//! each mounted region together with its on-screen presentation: a scale
//! and an optional height clip with scrolling.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::catalog::TemplateRegistry;
use crate::fonts::FontManager;
use crate::model::CvDocument;
use crate::region::{compose_region, RenderedRegion};
use crate::templates::VisualPage;

/// Element id the builder mounts its preview under.
pub const PREVIEW_REGION_ID: &str = "cv-preview";

pub const DEFAULT_PREVIEW_SCALE: f32 = 0.75;
pub const DEFAULT_PREVIEW_MAX_HEIGHT: f32 = 800.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Overflow {
    Visible,
    /// Content taller than `max_height` (screen units) is clipped and
    /// scrolls.
    Clip { max_height: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Presentation {
    pub scale: f32,
    pub overflow: Overflow,
}

impl Presentation {
    /// Identity transform: full size, nothing clipped.
    pub const NEUTRAL: Presentation = Presentation {
        scale: 1.0,
        overflow: Overflow::Visible,
    };

    pub fn preview(scale: f32, max_height: f32) -> Self {
        Self {
            scale,
            overflow: Overflow::Clip { max_height },
        }
    }

    /// On-screen size of content measuring `width` × `height`.
    pub fn visible_extent(&self, width: f32, height: f32) -> (f32, f32) {
        let w = width * self.scale;
        let h = height * self.scale;
        match self.overflow {
            Overflow::Visible => (w, h),
            Overflow::Clip { max_height } => (w, h.min(max_height)),
        }
    }
}

impl Default for Presentation {
    fn default() -> Self {
        Self::preview(DEFAULT_PREVIEW_SCALE, DEFAULT_PREVIEW_MAX_HEIGHT)
    }
}

/// What the preview pane shows for a frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub presentation: Presentation,
    pub visible_width: f32,
    pub visible_height: f32,
    /// True when the scaled page is taller than the clip.
    pub scrollable: bool,
}

impl Viewport {
    fn for_region(region: &RenderedRegion, presentation: Presentation) -> Self {
        let (visible_width, visible_height) = presentation.visible_extent(region.width, region.height);
        Self {
            presentation,
            visible_width,
            visible_height,
            scrollable: visible_height + 0.01 < region.height * presentation.scale,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PreviewFrame {
    pub template_id: &'static str,
    pub template_name: &'static str,
    pub page: VisualPage,
    pub region: Arc<RenderedRegion>,
    pub viewport: Viewport,
}

struct Memo {
    template_key: Option<String>,
    doc: Arc<CvDocument>,
    frame: Arc<PreviewFrame>,
}

/// Memoizing preview renderer. Never mutates the document.
pub struct PreviewComposer {
    registry: Arc<TemplateRegistry>,
    presentation: Presentation,
    memo: Option<Memo>,
}

impl PreviewComposer {
    pub fn new(registry: Arc<TemplateRegistry>, presentation: Presentation) -> Self {
        Self {
            registry,
            presentation,
            memo: None,
        }
    }

    /// Frame for `doc` rendered with `template_id`; unknown ids use the
    /// default template.
    pub fn compose(
        &mut self,
        template_id: Option<&str>,
        doc: &Arc<CvDocument>,
        fonts: &FontManager,
    ) -> Arc<PreviewFrame> {
        if let Some(memo) = &self.memo {
            if Arc::ptr_eq(&memo.doc, doc) && memo.template_key.as_deref() == template_id {
                log::debug!("preview cache hit for {}", memo.frame.template_id);
                return Arc::clone(&memo.frame);
            }
        }

        let renderer = self.registry.resolve(template_id);
        let meta = self.registry.meta_or_default(template_id);
        log::debug!("preview render with {}", renderer.id());
        let page = renderer.render(doc);
        let region = Arc::new(compose_region(&page, fonts));
        let frame = Arc::new(PreviewFrame {
            template_id: meta.id,
            template_name: meta.name,
            viewport: Viewport::for_region(&region, self.presentation),
            page,
            region,
        });

        self.memo = Some(Memo {
            template_key: template_id.map(str::to_string),
            doc: Arc::clone(doc),
            frame: Arc::clone(&frame),
        });
        frame
    }

    /// Host `frame` on the surface under [`PREVIEW_REGION_ID`].
    pub fn mount(&self, surface: &mut PreviewSurface, frame: &PreviewFrame) {
        surface.mount(PREVIEW_REGION_ID, Arc::clone(&frame.region), self.presentation);
    }

    /// Forget the cached frame so the next `compose` renders afresh.
    pub fn invalidate(&mut self) {
        self.memo = None;
    }
}

struct Slot {
    region: Arc<RenderedRegion>,
    presentation: Presentation,
}

/// Regions currently on screen, keyed by element id.
#[derive(Default)]
pub struct PreviewSurface {
    slots: HashMap<String, Slot>,
}

impl PreviewSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mount(&mut self, id: &str, region: Arc<RenderedRegion>, presentation: Presentation) {
        self.slots.insert(
            id.to_string(),
            Slot {
                region,
                presentation,
            },
        );
    }

    pub fn unmount(&mut self, id: &str) -> bool {
        self.slots.remove(id).is_some()
    }

    pub fn region(&self, id: &str) -> Option<&Arc<RenderedRegion>> {
        self.slots.get(id).map(|s| &s.region)
    }

    pub fn presentation(&self, id: &str) -> Option<Presentation> {
        self.slots.get(id).map(|s| s.presentation)
    }

    pub fn set_presentation(&mut self, id: &str, presentation: Presentation) -> bool {
        match self.slots.get_mut(id) {
            Some(slot) => {
                slot.presentation = presentation;
                true
            }
            None => false,
        }
    }

    /// On-screen extent of a mounted region.
    pub fn visible_extent(&self, id: &str) -> Option<(f32, f32)> {
        self.slots
            .get(id)
            .map(|s| s.presentation.visible_extent(s.region.width, s.region.height))
    }

    /// Switch a region to the neutral presentation until the returned guard
    /// drops, which restores the previous one.
    pub fn neutralize(&mut self, id: &str) -> Option<PresentationGuard<'_>> {
        let slot = self.slots.get_mut(id)?;
        let saved = slot.presentation;
        slot.presentation = Presentation::NEUTRAL;
        Some(PresentationGuard {
            surface: self,
            id: id.to_string(),
            saved,
        })
    }
}

/// Holds a region in the neutral presentation; restores on drop.
pub struct PresentationGuard<'a> {
    surface: &'a mut PreviewSurface,
    id: String,
    saved: Presentation,
}

impl PresentationGuard<'_> {
    pub fn region(&self) -> Option<Arc<RenderedRegion>> {
        self.surface.region(&self.id).cloned()
    }

    pub fn presentation(&self) -> Presentation {
        self.surface
            .presentation(&self.id)
            .unwrap_or(Presentation::NEUTRAL)
    }
}

impl Drop for PresentationGuard<'_> {
    fn drop(&mut self) {
        self.surface.set_presentation(&self.id, self.saved);
    }
}
