//! # cv-forge – résumé builder core
//!
//! A CV document is rendered through one of several visual templates, laid
//! out, shown as a scaled preview, and exported as a one-page PDF whose body
//! is a rasterized, scale-to-fit capture of the rendered page. The stages are:
//!
//! 1. **Model** – the CV document and its entries ([`model`], [`labels`])
//! 2. **Template** – catalog lookup and rendering to markup ([`catalog`], [`templates`])
//! 3. **Layout** – parse, style and lay out with Taffy ([`dom`], [`style`], [`layout`], [`region`])
//! 4. **Preview** – memoized composition and on-screen presentation ([`preview`], [`draft`])
//! 5. **Export** – rasterize, fit to the page, encode, watermark, write the PDF
//!    ([`raster`], [`pagination`], [`render`], [`export`])
//!
//! Plan entitlement lives in [`gate`]; [`session`] wires everything into one
//! builder, [`pipeline`] does the same headless. A C-compatible FFI surface is
//! exposed via the [`ffi`] module.

pub mod catalog;
pub mod dom;
pub mod draft;
pub mod export;
pub mod ffi;
pub mod fonts;
pub mod gate;
pub mod images;
pub mod labels;
pub mod layout;
pub mod layout_config;
pub mod model;
pub mod pagination;
pub mod pipeline;
pub mod preview;
pub mod raster;
pub mod region;
pub mod render;
pub mod session;
pub mod style;
pub mod templates;

// Re-exports for convenience
pub use catalog::TemplateRegistry;
pub use export::{ExportError, ExportReceipt};
pub use gate::{Plan, WatermarkPolicy};
pub use model::CvDocument;
pub use pipeline::{render_cv_pdf, PipelineConfig};
pub use session::{BuilderSession, ExportAttempt};
