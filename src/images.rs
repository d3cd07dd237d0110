//! Image sources for rasterization: base64 data URIs, local files and remote
//! URLs. Remote loads go through a [`RemoteFetcher`] on a helper thread and are
//! abandoned after a timeout, so a slow host never stalls an export.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use image::DynamicImage;

/// Default bound on a single remote image load.
pub const DEFAULT_IMAGE_TIMEOUT: Duration = Duration::from_secs(15);

/// Parse a `data:<mime>;base64,<data>` URI into raw bytes.
pub fn parse_data_uri(src: &str) -> Result<Vec<u8>, String> {
    let rest = src
        .strip_prefix("data:")
        .ok_or_else(|| "not a data URI".to_string())?;
    let comma_pos = rest
        .find(',')
        .ok_or_else(|| "invalid data URI: missing `,` after header".to_string())?;
    let header = &rest[..comma_pos];
    if !header.contains(";base64") {
        return Err("only base64 data URIs are supported".to_string());
    }
    BASE64_STD
        .decode(rest[comma_pos + 1..].trim())
        .map_err(|e| format!("base64 decode error: {e}"))
}

/// [`parse_data_uri`] for callers that only care whether it worked.
pub fn decode_data_uri(src: &str) -> Option<Vec<u8>> {
    parse_data_uri(src).ok()
}

fn is_remote(src: &str) -> bool {
    src.starts_with("http://") || src.starts_with("https://")
}

/// Fetches the bytes behind a remote image URL. Implementations may block;
/// the loader bounds them with a timeout.
pub trait RemoteFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, String>;
}

/// Fetcher used when no network access is configured: every remote image is
/// skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRemote;

impl RemoteFetcher for NoRemote {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, String> {
        Err(format!("remote images are disabled ({url})"))
    }
}

/// Resolves `<img src>` values to decoded images.
#[derive(Clone)]
pub struct ImageLoader {
    fetcher: Arc<dyn RemoteFetcher>,
    timeout: Duration,
}

impl Default for ImageLoader {
    fn default() -> Self {
        Self::new(Arc::new(NoRemote), DEFAULT_IMAGE_TIMEOUT)
    }
}

impl ImageLoader {
    pub fn new(fetcher: Arc<dyn RemoteFetcher>, timeout: Duration) -> Self {
        Self { fetcher, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn fetch_bounded(&self, url: &str) -> Result<Vec<u8>, String> {
        let (tx, rx) = mpsc::channel();
        let fetcher = Arc::clone(&self.fetcher);
        let owned = url.to_string();
        thread::spawn(move || {
            // The receiver may be gone after a timeout; nothing to report then.
            let _ = tx.send(fetcher.fetch(&owned));
        });
        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                Err(format!("timed out after {:?}", self.timeout))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err("fetch thread ended without a result".to_string())
            }
        }
    }

    /// Load one image source.
    pub fn load(&self, src: &str) -> Result<DynamicImage, String> {
        let src = src.trim();
        let bytes = if src.starts_with("data:") {
            parse_data_uri(src)?
        } else if is_remote(src) {
            self.fetch_bounded(src)?
        } else {
            let path = src.strip_prefix("file://").unwrap_or(src);
            std::fs::read(Path::new(path)).map_err(|e| format!("cannot read {path}: {e}"))?
        };
        image::load_from_memory(&bytes).map_err(|e| format!("decode error: {e}"))
    }

    /// Load every distinct source. Failures are logged and left out of the
    /// map; the caller draws nothing for them.
    pub fn load_all<'a>(
        &self,
        srcs: impl IntoIterator<Item = &'a str>,
    ) -> HashMap<String, DynamicImage> {
        let mut out = HashMap::new();
        for src in srcs {
            if src.trim().is_empty() || out.contains_key(src) {
                continue;
            }
            match self.load(src) {
                Ok(img) => {
                    out.insert(src.to_string(), img);
                }
                Err(e) => log::warn!("skipping image {}: {e}", preview(src)),
            }
        }
        out
    }
}

/// Short form of a source for log lines; data URIs can be megabytes long.
fn preview(src: &str) -> String {
    match src.char_indices().nth(60) {
        Some((idx, _)) => format!("{}…", &src[..idx]),
        None => src.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    /// A 2×1 PNG as a data URI.
    pub(crate) fn png_data_uri() -> String {
        let img = image::RgbImage::from_pixel(2, 1, image::Rgb([255, 0, 0]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        format!("data:image/png;base64,{}", BASE64_STD.encode(buf.into_inner()))
    }

    struct SlowFetcher(Duration);

    impl RemoteFetcher for SlowFetcher {
        fn fetch(&self, _url: &str) -> Result<Vec<u8>, String> {
            thread::sleep(self.0);
            Err("too late".into())
        }
    }

    struct CountingFetcher(AtomicUsize);

    impl RemoteFetcher for CountingFetcher {
        fn fetch(&self, _url: &str) -> Result<Vec<u8>, String> {
            self.0.fetch_add(1, Ordering::SeqCst);
            parse_data_uri(&png_data_uri())
        }
    }

    #[test]
    fn data_uri_round_trip() {
        let img = ImageLoader::default().load(&png_data_uri()).unwrap();
        assert_eq!((img.width(), img.height()), (2, 1));
    }

    #[test]
    fn data_uri_errors() {
        assert!(parse_data_uri("photo.png").is_err());
        assert!(parse_data_uri("data:image/png,abc").is_err());
        assert!(parse_data_uri("data:image/png;base64").is_err());
    }

    #[test]
    fn remote_images_are_skipped_by_default() {
        let loaded = ImageLoader::default().load_all(["https://example.com/a.png"]);
        assert!(loaded.is_empty());
    }

    #[test]
    fn slow_fetch_is_abandoned() {
        let loader = ImageLoader::new(
            Arc::new(SlowFetcher(Duration::from_secs(5))),
            Duration::from_millis(50),
        );
        let started = Instant::now();
        let err = loader.load("https://example.com/slow.png").unwrap_err();
        assert!(err.contains("timed out"));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn duplicate_sources_load_once() {
        let fetcher = Arc::new(CountingFetcher(AtomicUsize::new(0)));
        let loader = ImageLoader::new(fetcher.clone(), DEFAULT_IMAGE_TIMEOUT);
        let loaded = loader.load_all(["https://a/x.png", "https://a/x.png"]);
        assert_eq!(loaded.len(), 1);
        assert_eq!(fetcher.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn local_files_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.png");
        image::RgbImage::from_pixel(3, 3, image::Rgb([0, 0, 0]))
            .save(&path)
            .unwrap();
        let img = ImageLoader::default().load(path.to_str().unwrap()).unwrap();
        assert_eq!(img.width(), 3);
    }
}
