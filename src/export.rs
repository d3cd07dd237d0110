//! Export pipeline – captures a mounted region and saves it as a one-page PDF.
//!
//! The steps, in order: neutralize the region's on-screen presentation,
//! rasterize at the supersampling factor over white, restore the
//! presentation, fit the capture onto the page, encode JPEG, place it, stamp
//! the watermark when the policy asks for one, assemble the PDF and hand it
//! to a [`DocumentSink`]. Nothing reaches the sink unless every earlier step
//! succeeded.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use thiserror::Error;

use crate::fonts::FontManager;
use crate::gate::{WatermarkPolicy, DEFAULT_WATERMARK_TEXT, PREMIUM_REQUIRED_MESSAGE};
use crate::images::ImageLoader;
use crate::layout_config::{ExportDocument, ExportPage, PlacedImage, Watermark};
use crate::pagination::{fit_to_page, PageFit};
use crate::preview::PreviewSurface;
use crate::raster::rasterize;
use crate::render::render_export_pdf;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no rendered region is mounted as '{0}'")]
    RegionNotFound(String),
    #[error("capture failed: {0}")]
    Rasterize(String),
    #[error("JPEG encoding failed: {0}")]
    Encode(String),
    #[error("PDF assembly failed: {0}")]
    Assemble(String),
    #[error("cannot save {path}: {source}")]
    Save {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("{} ({template_id})", PREMIUM_REQUIRED_MESSAGE)]
    PremiumRequired { template_id: String },
}

/// Numeric knobs of one export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    pub title: String,
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub supersample: f32,
    pub jpeg_quality: u8,
    pub watermark_text: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            title: crate::model::DEFAULT_TITLE.to_string(),
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            supersample: 2.0,
            jpeg_quality: 95,
            watermark_text: DEFAULT_WATERMARK_TEXT.to_string(),
        }
    }
}

/// Where finished PDFs go.
pub trait DocumentSink {
    /// Store `bytes` under `filename` and report where they ended up.
    fn save(&mut self, filename: &str, bytes: &[u8]) -> io::Result<String>;
}

/// Writes into a directory. The file appears only once fully written.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DocumentSink for FileSink {
    fn save(&mut self, filename: &str, bytes: &[u8]) -> io::Result<String> {
        let target = self.dir.join(filename);
        let partial = self.dir.join(format!(".{filename}.part"));
        if let Err(e) = fs::write(&partial, bytes).and_then(|_| fs::rename(&partial, &target)) {
            let _ = fs::remove_file(&partial);
            return Err(e);
        }
        Ok(target.display().to_string())
    }
}

/// Keeps saved documents in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub saved: Vec<(String, Vec<u8>)>,
}

impl DocumentSink for MemorySink {
    fn save(&mut self, filename: &str, bytes: &[u8]) -> io::Result<String> {
        self.saved.push((filename.to_string(), bytes.to_vec()));
        Ok(format!("memory:{filename}"))
    }
}

/// What a successful export produced.
#[derive(Debug, Clone)]
pub struct ExportReceipt {
    pub filename: String,
    pub location: String,
    pub byte_len: usize,
    pub watermarked: bool,
    pub raster_px: (u32, u32),
    pub fit: PageFit,
    pub document: ExportDocument,
}

/// Force a `.pdf` extension onto a download name.
pub fn pdf_filename(filename: &str) -> String {
    let trimmed = filename.trim();
    if trimmed.to_ascii_lowercase().ends_with(".pdf") && trimmed.len() > 4 {
        return trimmed.to_string();
    }
    let stem = trimmed.trim_end_matches('.');
    let stem = if stem.is_empty() || stem.eq_ignore_ascii_case(".pdf") {
        crate::model::DEFAULT_FILE_STEM
    } else {
        stem
    };
    format!("{stem}.pdf")
}

pub struct Exporter<'a> {
    fonts: &'a FontManager,
    images: &'a ImageLoader,
    settings: &'a ExportSettings,
}

impl<'a> Exporter<'a> {
    pub fn new(fonts: &'a FontManager, images: &'a ImageLoader, settings: &'a ExportSettings) -> Self {
        Self {
            fonts,
            images,
            settings,
        }
    }

    /// Capture the region mounted as `region_id` and save it through `sink`.
    pub fn export_to_document(
        &self,
        surface: &mut PreviewSurface,
        region_id: &str,
        filename: &str,
        policy: WatermarkPolicy,
        sink: &mut dyn DocumentSink,
    ) -> Result<ExportReceipt, ExportError> {
        let result = self.run(surface, region_id, filename, policy, sink);
        match &result {
            Ok(receipt) => log::info!(
                "exported {} ({} bytes, watermark: {})",
                receipt.location,
                receipt.byte_len,
                receipt.watermarked
            ),
            Err(e) => log::error!("export of '{region_id}' failed: {e}"),
        }
        result
    }

    fn run(
        &self,
        surface: &mut PreviewSurface,
        region_id: &str,
        filename: &str,
        policy: WatermarkPolicy,
        sink: &mut dyn DocumentSink,
    ) -> Result<ExportReceipt, ExportError> {
        let raster = {
            let guard = surface
                .neutralize(region_id)
                .ok_or_else(|| ExportError::RegionNotFound(region_id.to_string()))?;
            let region = guard
                .region()
                .ok_or_else(|| ExportError::RegionNotFound(region_id.to_string()))?;
            let images = self.images.load_all(region.image_sources());
            rasterize(
                &region,
                guard.presentation(),
                self.settings.supersample,
                self.fonts,
                &images,
            )
            .map_err(ExportError::Rasterize)?
        };

        let s = self.settings;
        // Fit on the captured size in layout units, not supersampled pixels.
        let fit = fit_to_page(
            raster.width() as f32 / s.supersample,
            raster.height() as f32 / s.supersample,
            s.page_width_mm,
            s.page_height_mm,
        )
        .map_err(ExportError::Rasterize)?;

        let jpeg = encode_jpeg(&raster, s.jpeg_quality).map_err(ExportError::Encode)?;

        let mut document = ExportDocument::a4(s.title.clone());
        document.page_width_mm = s.page_width_mm;
        document.page_height_mm = s.page_height_mm;
        document.pages.push(ExportPage {
            page_index: 0,
            image: Some(PlacedImage {
                x_mm: fit.x_offset,
                y_mm: fit.y_offset,
                width_mm: fit.width,
                height_mm: fit.height,
                px_width: raster.width(),
                px_height: raster.height(),
                jpeg,
            }),
            watermark: None,
        });
        if policy.stamps() {
            for page in &mut document.pages {
                page.watermark = Some(Watermark::bottom_centre(
                    s.watermark_text.clone(),
                    s.page_width_mm,
                    s.page_height_mm,
                ));
            }
        }

        let pdf = render_export_pdf(&document).map_err(ExportError::Assemble)?;

        let name = pdf_filename(filename);
        let location = sink.save(&name, &pdf).map_err(|source| ExportError::Save {
            path: name.clone(),
            source,
        })?;

        Ok(ExportReceipt {
            filename: name,
            location,
            byte_len: pdf.len(),
            watermarked: document.has_watermark(),
            raster_px: raster.dimensions(),
            fit,
            document,
        })
    }
}

fn encode_jpeg(raster: &RgbImage, quality: u8) -> Result<Vec<u8>, String> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100))
        .encode_image(raster)
        .map_err(|e| e.to_string())?;
    Ok(buf)
}

/// Result of asking the controller to run an export.
#[derive(Debug)]
pub enum ExportOutcome<T> {
    Finished(T),
    /// Another export was still in flight; nothing was done.
    AlreadyRunning,
}

/// Admits one export at a time. Clones share the in-flight flag.
#[derive(Debug, Clone, Default)]
pub struct ExportController {
    in_flight: Arc<AtomicBool>,
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ExportController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run `job` unless an export is already in flight.
    pub fn run<T>(&self, job: impl FnOnce() -> T) -> ExportOutcome<T> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::debug!("export already in flight; ignoring trigger");
            return ExportOutcome::AlreadyRunning;
        }
        let _flag = InFlight(&self.in_flight);
        ExportOutcome::Finished(job())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout_config::LayoutBox;
    use crate::preview::Presentation;
    use crate::region::RenderedRegion;

    fn surface_with(width: f32, height: f32, presentation: Presentation) -> PreviewSurface {
        let mut root = LayoutBox::new(0.0, 0.0, width, height);
        root.background_color = Some([0.2, 0.3, 0.8, 1.0]);
        let region = RenderedRegion {
            template_id: "t".into(),
            width,
            height,
            root,
        };
        let mut s = PreviewSurface::new();
        s.mount("cv-preview", Arc::new(region), presentation);
        s
    }

    struct FailingSink;

    impl DocumentSink for FailingSink {
        fn save(&mut self, _filename: &str, _bytes: &[u8]) -> io::Result<String> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        }
    }

    fn export(
        surface: &mut PreviewSurface,
        policy: WatermarkPolicy,
        sink: &mut dyn DocumentSink,
    ) -> Result<ExportReceipt, ExportError> {
        let fonts = FontManager::default();
        let images = ImageLoader::default();
        let settings = ExportSettings::default();
        Exporter::new(&fonts, &images, &settings).export_to_document(
            surface,
            "cv-preview",
            "Sara",
            policy,
            sink,
        )
    }

    #[test]
    fn pdf_extension_is_forced() {
        assert_eq!(pdf_filename("cv"), "cv.pdf");
        assert_eq!(pdf_filename("cv.PDF"), "cv.PDF");
        assert_eq!(pdf_filename("Dr. A.B"), "Dr. A.B.pdf");
        assert_eq!(pdf_filename(".pdf"), "السيرة الذاتية.pdf");
        assert_eq!(pdf_filename(""), "السيرة الذاتية.pdf");
    }

    #[test]
    fn captures_full_size_despite_preview_presentation() {
        let mut surface = surface_with(100.0, 1000.0, Presentation::default());
        let mut sink = MemorySink::default();
        let receipt = export(&mut surface, WatermarkPolicy::Omit, &mut sink).unwrap();
        assert_eq!(receipt.raster_px, (200, 2000));
        assert_eq!(receipt.filename, "Sara.pdf");
        assert_eq!(sink.saved.len(), 1);
        assert!(!receipt.watermarked);
        // Restored afterwards.
        assert_eq!(
            surface.presentation("cv-preview"),
            Some(Presentation::default())
        );
    }

    #[test]
    fn scale_to_fit_is_exact_and_centred() {
        let mut surface = surface_with(100.0, 1000.0, Presentation::NEUTRAL);
        let receipt = export(&mut surface, WatermarkPolicy::Omit, &mut MemorySink::default()).unwrap();
        let img = receipt.document.pages[0].image.as_ref().unwrap();
        assert!((img.height_mm - 297.0).abs() < 1e-3);
        assert!((img.width_mm - 29.7).abs() < 1e-3);
        assert!((img.x_mm - (210.0 - 29.7) / 2.0).abs() < 1e-3);
        assert_eq!(img.y_mm, 0.0);
    }

    #[test]
    fn free_policy_stamps_every_page() {
        let mut surface = surface_with(100.0, 100.0, Presentation::NEUTRAL);
        let receipt = export(&mut surface, WatermarkPolicy::Stamp, &mut MemorySink::default()).unwrap();
        assert!(receipt.watermarked);
        let wm = receipt.document.pages[0].watermark.as_ref().unwrap();
        assert_eq!((wm.x_mm, wm.y_mm), (105.0, 290.0));
        assert_eq!(wm.text, DEFAULT_WATERMARK_TEXT);
    }

    #[test]
    fn missing_region_saves_nothing() {
        let mut surface = PreviewSurface::new();
        let mut sink = MemorySink::default();
        let err = export(&mut surface, WatermarkPolicy::Omit, &mut sink).unwrap_err();
        assert!(matches!(err, ExportError::RegionNotFound(_)));
        assert!(sink.saved.is_empty());
    }

    #[test]
    fn failure_after_capture_still_restores_presentation() {
        let mut surface = surface_with(100.0, 100.0, Presentation::default());
        let err = export(&mut surface, WatermarkPolicy::Omit, &mut FailingSink).unwrap_err();
        assert!(matches!(err, ExportError::Save { .. }));
        assert_eq!(
            surface.presentation("cv-preview"),
            Some(Presentation::default())
        );
    }

    #[test]
    fn zero_size_region_is_a_capture_error() {
        let mut surface = surface_with(0.0, 0.0, Presentation::NEUTRAL);
        let err = export(&mut surface, WatermarkPolicy::Omit, &mut MemorySink::default()).unwrap_err();
        assert!(matches!(err, ExportError::Rasterize(_)));
    }

    #[test]
    fn file_sink_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSink::new(dir.path());
        let location = sink.save("a.pdf", b"%PDF-1.7").unwrap();
        assert!(location.ends_with("a.pdf"));
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["a.pdf".to_string()]);

        let mut missing = FileSink::new(dir.path().join("nope"));
        assert!(missing.save("b.pdf", b"x").is_err());
    }

    #[test]
    fn controller_refuses_reentry() {
        let ctl = ExportController::new();
        let inner = ctl.clone();
        let outcome = ctl.run(|| matches!(inner.run(|| ()), ExportOutcome::AlreadyRunning));
        assert!(matches!(outcome, ExportOutcome::Finished(true)));
        assert!(!ctl.is_running());
    }
}
