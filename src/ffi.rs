//! C-compatible FFI API for cross-language bindings.
//!
//! # ABI Contract
//!
//! All exported functions use `extern "C"` calling convention and `#[no_mangle]`
//! to ensure stable symbol names.
//!
//! ## Memory management
//! - Buffers returned by `cvforge_*` functions are allocated on the Rust heap.
//! - Callers **must** free them with `cvforge_free_buffer` / `cvforge_free_string`.
//! - Passing a null pointer to a free function is a no-op.
//!
//! ## Error handling
//! - Functions that can fail return a `c_int`, `0` on success:
//!   `1` null pointer, `2` invalid UTF-8, `3` invalid CV JSON,
//!   `4` premium template on the free plan, `5` export failed,
//!   `6` invalid render options (config JSON or font bytes).
//! - Error details can be retrieved via `cvforge_last_error`.
//!
//! ## Thread safety
//! - `cvforge_last_error` uses a thread-local, so it is safe to call from
//!   multiple threads.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::ptr;
use std::slice;

use crate::catalog::TemplateRegistry;
use crate::export::ExportError;
use crate::fonts::FontManager;
use crate::gate::Plan;
use crate::model::CvDocument;
use crate::pipeline::{compose_cv_region, render_cv_pdf, PipelineConfig};

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Entitlement of the CV owner.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CvforgePlan {
    /// Watermarked output, free templates only.
    Free = 0,
    Premium = 1,
}

impl From<CvforgePlan> for Plan {
    fn from(p: CvforgePlan) -> Self {
        match p {
            CvforgePlan::Free => Plan::Free,
            CvforgePlan::Premium => Plan::Premium,
        }
    }
}

/// Read a UTF-8 CV document from raw bytes, recording the error on failure.
///
/// # Safety
/// `ptr` must point to `len` valid bytes.
unsafe fn read_document(ptr: *const u8, len: u32) -> Result<CvDocument, c_int> {
    let bytes = slice::from_raw_parts(ptr, len as usize);
    let json = std::str::from_utf8(bytes).map_err(|e| {
        set_last_error(&format!("Invalid UTF-8: {e}"));
        2
    })?;
    CvDocument::from_json(json).map_err(|e| {
        set_last_error(&e.to_string());
        3
    })
}

/// Hand a byte vector to the caller.
///
/// # Safety
/// `out_buf` and `out_len` must be valid pointers.
unsafe fn give_buffer(bytes: Vec<u8>, out_buf: *mut *mut u8, out_len: *mut u32) {
    let len = bytes.len() as u32;
    let buf = bytes.into_boxed_slice();
    *out_buf = Box::into_raw(buf) as *mut u8;
    *out_len = len;
}

/// Hand a string to the caller.
///
/// # Safety
/// `out` must be a valid pointer.
unsafe fn give_string(s: String, out: *mut *mut c_char) -> c_int {
    match CString::new(s) {
        Ok(cs) => {
            *out = cs.into_raw();
            0
        }
        Err(_) => {
            set_last_error("JSON contained null byte");
            *out = ptr::null_mut();
            5
        }
    }
}

// ---------------------------------------------------------------------------
// Render options
// ---------------------------------------------------------------------------

/// Optional inputs for the `*_ex` entry points. Every pointer may be null,
/// in which case the corresponding default is used.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CvforgeRenderOptions {
    /// UTF-8 pipeline config JSON; missing keys keep their defaults.
    pub config_json: *const u8,
    pub config_len: u32,
    /// Regular face (TTF/OTF bytes). Without it text is greeked.
    pub font: *const u8,
    pub font_len: u32,
    /// Bold face; headings fall back to the regular face when null.
    pub bold_font: *const u8,
    pub bold_font_len: u32,
}

/// Convert `CvforgeRenderOptions` (FFI) into a config and a font set.
///
/// # Safety
/// Each non-null pointer in `opts` must point to its stated number of bytes.
unsafe fn options_from_c(
    opts: *const CvforgeRenderOptions,
) -> Result<(PipelineConfig, FontManager), c_int> {
    if opts.is_null() {
        return Ok((PipelineConfig::default(), FontManager::default()));
    }
    let opts = &*opts;

    let config = if opts.config_json.is_null() {
        PipelineConfig::default()
    } else {
        let bytes = slice::from_raw_parts(opts.config_json, opts.config_len as usize);
        let json = std::str::from_utf8(bytes).map_err(|e| {
            set_last_error(&format!("Invalid UTF-8 in config: {e}"));
            2
        })?;
        serde_json::from_str::<PipelineConfig>(json).map_err(|e| {
            set_last_error(&format!("invalid pipeline config: {e}"));
            6
        })?
    };

    let mut fonts = FontManager::new();
    for (bold, data, len) in [
        (false, opts.font, opts.font_len),
        (true, opts.bold_font, opts.bold_font_len),
    ] {
        if data.is_null() {
            continue;
        }
        let bytes = slice::from_raw_parts(data, len as usize).to_vec();
        fonts.load_font("Helvetica", bold, false, bytes).map_err(|e| {
            set_last_error(&e);
            6
        })?;
    }
    fonts.ensure_default();

    Ok((config, fonts))
}

// ---------------------------------------------------------------------------
// Core API
// ---------------------------------------------------------------------------

/// Render a CV document (JSON) to PDF with the default pipeline config.
///
/// # Parameters
/// - `json_ptr`, `json_len`: UTF-8 CV document JSON (not necessarily
///   null-terminated)
/// - `plan`: the owner's plan; free adds the watermark and refuses premium
///   templates
/// - `out_buf`, `out_len`: on success, the heap-allocated PDF bytes
///
/// # Returns
/// `0` on success, non-zero on error. On error, call `cvforge_last_error`.
///
/// # Safety
/// - `json_ptr` must point to `json_len` valid bytes.
/// - `out_buf` and `out_len` must be valid pointers.
/// - The caller must free `*out_buf` by calling `cvforge_free_buffer`.
#[no_mangle]
pub unsafe extern "C" fn cvforge_render_pdf(
    json_ptr: *const u8,
    json_len: u32,
    plan: CvforgePlan,
    out_buf: *mut *mut u8,
    out_len: *mut u32,
) -> c_int {
    if json_ptr.is_null() || out_buf.is_null() || out_len.is_null() {
        set_last_error("Null pointer argument");
        return 1;
    }

    cvforge_render_pdf_ex(json_ptr, json_len, plan, ptr::null(), out_buf, out_len)
}

/// Render a CV document (JSON) to PDF with caller-supplied
/// [`CvforgeRenderOptions`].
///
/// # Parameters
/// - `json_ptr`, `json_len`: UTF-8 CV document JSON
/// - `plan`: the owner's plan
/// - `opts`: optional pointer to a [`CvforgeRenderOptions`]; pass `NULL` for
///   the default config and no fonts
/// - `out_buf`, `out_len`: PDF output
///
/// # Returns
/// `0` on success, `6` when the config JSON or a font cannot be parsed.
///
/// # Safety
/// - `json_ptr` must point to `json_len` valid bytes.
/// - `opts`, if non-null, must point to a fully-initialised
///   [`CvforgeRenderOptions`] whose non-null pointers are valid for their
///   lengths.
/// - The caller must free `*out_buf` with `cvforge_free_buffer`.
#[no_mangle]
pub unsafe extern "C" fn cvforge_render_pdf_ex(
    json_ptr: *const u8,
    json_len: u32,
    plan: CvforgePlan,
    opts: *const CvforgeRenderOptions,
    out_buf: *mut *mut u8,
    out_len: *mut u32,
) -> c_int {
    if json_ptr.is_null() || out_buf.is_null() || out_len.is_null() {
        set_last_error("Null pointer argument");
        return 1;
    }

    let doc = match read_document(json_ptr, json_len) {
        Ok(d) => d,
        Err(rc) => return rc,
    };
    let (config, fonts) = match options_from_c(opts) {
        Ok(v) => v,
        Err(rc) => return rc,
    };

    let registry = TemplateRegistry::standard();
    match render_cv_pdf(&doc, &registry, plan.into(), &config, &fonts) {
        Ok((pdf_bytes, _export)) => {
            give_buffer(pdf_bytes, out_buf, out_len);
            0
        }
        Err(e @ ExportError::PremiumRequired { .. }) => {
            set_last_error(&e.to_string());
            4
        }
        Err(e) => {
            set_last_error(&e.to_string());
            5
        }
    }
}

/// Lay out a CV document and return the region tree as JSON.
///
/// # Safety
/// Same as `cvforge_render_pdf`. `*out_json_ptr` must be freed with
/// `cvforge_free_string`.
#[no_mangle]
pub unsafe extern "C" fn cvforge_compute_layout(
    json_ptr: *const u8,
    json_len: u32,
    out_json_ptr: *mut *mut c_char,
) -> c_int {
    cvforge_compute_layout_ex(json_ptr, json_len, ptr::null(), out_json_ptr)
}

/// Lay out a CV document with caller-supplied fonts and return the region
/// tree as JSON. Only the font fields of `opts` affect layout.
///
/// # Safety
/// Same as `cvforge_render_pdf_ex`. `*out_json_ptr` must be freed with
/// `cvforge_free_string`.
#[no_mangle]
pub unsafe extern "C" fn cvforge_compute_layout_ex(
    json_ptr: *const u8,
    json_len: u32,
    opts: *const CvforgeRenderOptions,
    out_json_ptr: *mut *mut c_char,
) -> c_int {
    if json_ptr.is_null() || out_json_ptr.is_null() {
        set_last_error("Null pointer argument");
        return 1;
    }

    let doc = match read_document(json_ptr, json_len) {
        Ok(d) => d,
        Err(rc) => return rc,
    };
    let (_config, fonts) = match options_from_c(opts) {
        Ok(v) => v,
        Err(rc) => return rc,
    };

    let region = compose_cv_region(&doc, &TemplateRegistry::standard(), &fonts);
    match serde_json::to_string(&region) {
        Ok(json) => give_string(json, out_json_ptr),
        Err(e) => {
            set_last_error(&e.to_string());
            5
        }
    }
}

/// Return the template catalog as a JSON array.
///
/// # Safety
/// `out_json_ptr` must be a valid pointer; free the result with
/// `cvforge_free_string`.
#[no_mangle]
pub unsafe extern "C" fn cvforge_list_templates(out_json_ptr: *mut *mut c_char) -> c_int {
    if out_json_ptr.is_null() {
        set_last_error("Null pointer argument");
        return 1;
    }
    give_string(TemplateRegistry::standard().to_json(), out_json_ptr)
}

// ---------------------------------------------------------------------------
// Memory and diagnostics
// ---------------------------------------------------------------------------

/// Free a buffer returned by `cvforge_render_pdf`.
///
/// # Safety
/// `buf` must have been returned by a previous `cvforge_*` call, and `len`
/// must be the corresponding length.
#[no_mangle]
pub unsafe extern "C" fn cvforge_free_buffer(buf: *mut u8, len: u32) {
    if !buf.is_null() {
        let _ = Box::from_raw(slice::from_raw_parts_mut(buf, len as usize));
    }
}

/// Free a string returned by a `cvforge_*` call.
///
/// # Safety
/// `s` must have been returned by Rust's `CString::into_raw`.
#[no_mangle]
pub unsafe extern "C" fn cvforge_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = CString::from_raw(s);
    }
}

/// Retrieve the last error message. Returns a null-terminated string.
///
/// The returned pointer is valid until the next `cvforge_*` call on the same
/// thread. The caller should **not** free this pointer – it is managed
/// internally.
///
/// Returns null if no error has occurred.
#[no_mangle]
pub extern "C" fn cvforge_last_error() -> *const c_char {
    LAST_ERROR.with(|e| {
        let borrow = e.borrow();
        match borrow.as_ref() {
            Some(cs) => cs.as_ptr(),
            None => ptr::null(),
        }
    })
}

/// Return the library version as a null-terminated string.
/// The caller must **not** free this pointer.
#[no_mangle]
pub extern "C" fn cvforge_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn last_error() -> String {
        let p = cvforge_last_error();
        assert!(!p.is_null());
        unsafe { CStr::from_ptr(p) }.to_string_lossy().into_owned()
    }

    #[test]
    fn ffi_render_pdf() {
        let json = br#"{"personal_info": {"full_name": "Omar"}, "summary": "Backend"}"#;
        let mut out_buf: *mut u8 = ptr::null_mut();
        let mut out_len: u32 = 0;

        let rc = unsafe {
            cvforge_render_pdf(
                json.as_ptr(),
                json.len() as u32,
                CvforgePlan::Free,
                &mut out_buf,
                &mut out_len,
            )
        };

        assert_eq!(rc, 0, "Expected success");
        assert!(!out_buf.is_null());
        let bytes = unsafe { slice::from_raw_parts(out_buf, out_len as usize) };
        assert_eq!(&bytes[0..5], b"%PDF-");

        unsafe { cvforge_free_buffer(out_buf, out_len) };
    }

    #[test]
    fn ffi_premium_template_on_free_plan() {
        let json = br#"{"template_id": "executive-premium"}"#;
        let mut out_buf: *mut u8 = ptr::null_mut();
        let mut out_len: u32 = 0;

        let rc = unsafe {
            cvforge_render_pdf(
                json.as_ptr(),
                json.len() as u32,
                CvforgePlan::Free,
                &mut out_buf,
                &mut out_len,
            )
        };
        assert_eq!(rc, 4);
        assert!(out_buf.is_null());
        assert!(last_error().contains("executive-premium"));
    }

    #[test]
    fn ffi_bad_json() {
        let json = b"{not json";
        let mut out_buf: *mut u8 = ptr::null_mut();
        let mut out_len: u32 = 0;
        let rc = unsafe {
            cvforge_render_pdf(json.as_ptr(), json.len() as u32, CvforgePlan::Free, &mut out_buf, &mut out_len)
        };
        assert_eq!(rc, 3);
        assert!(last_error().contains("invalid CV document JSON"));
    }

    #[test]
    fn ffi_null_input() {
        let mut out_buf: *mut u8 = ptr::null_mut();
        let mut out_len: u32 = 0;

        let rc = unsafe {
            cvforge_render_pdf(ptr::null(), 0, CvforgePlan::Free, &mut out_buf, &mut out_len)
        };

        assert_eq!(rc, 1, "Should fail on null input");
    }

    #[test]
    fn ffi_compute_layout() {
        let json = br#"{"summary": "Layout test"}"#;
        let mut json_ptr: *mut c_char = ptr::null_mut();

        let rc = unsafe { cvforge_compute_layout(json.as_ptr(), json.len() as u32, &mut json_ptr) };

        assert_eq!(rc, 0);
        let out = unsafe { CStr::from_ptr(json_ptr) }.to_str().unwrap();
        assert!(out.contains("\"template_id\":\"modern-arabic\""));
        assert!(out.contains("Layout test"));
        unsafe { cvforge_free_string(json_ptr) };
    }

    #[test]
    fn ffi_list_templates() {
        let mut json_ptr: *mut c_char = ptr::null_mut();
        let rc = unsafe { cvforge_list_templates(&mut json_ptr) };
        assert_eq!(rc, 0);
        let out = unsafe { CStr::from_ptr(json_ptr) }.to_str().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(out).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 5);
        unsafe { cvforge_free_string(json_ptr) };
    }

    fn options(config: &[u8], font: &[u8]) -> CvforgeRenderOptions {
        CvforgeRenderOptions {
            config_json: if config.is_empty() { ptr::null() } else { config.as_ptr() },
            config_len: config.len() as u32,
            font: if font.is_empty() { ptr::null() } else { font.as_ptr() },
            font_len: font.len() as u32,
            bold_font: ptr::null(),
            bold_font_len: 0,
        }
    }

    fn render_ex(json: &[u8], opts: &CvforgeRenderOptions) -> (c_int, Vec<u8>) {
        let mut out_buf: *mut u8 = ptr::null_mut();
        let mut out_len: u32 = 0;
        let rc = unsafe {
            cvforge_render_pdf_ex(
                json.as_ptr(),
                json.len() as u32,
                CvforgePlan::Premium,
                opts,
                &mut out_buf,
                &mut out_len,
            )
        };
        if rc != 0 {
            return (rc, Vec::new());
        }
        let bytes = unsafe { slice::from_raw_parts(out_buf, out_len as usize) }.to_vec();
        unsafe { cvforge_free_buffer(out_buf, out_len) };
        (rc, bytes)
    }

    fn layout_ex(json: &[u8], opts: *const CvforgeRenderOptions) -> String {
        let mut json_ptr: *mut c_char = ptr::null_mut();
        let rc = unsafe { cvforge_compute_layout_ex(json.as_ptr(), json.len() as u32, opts, &mut json_ptr) };
        assert_eq!(rc, 0);
        let out = unsafe { CStr::from_ptr(json_ptr) }.to_string_lossy().into_owned();
        unsafe { cvforge_free_string(json_ptr) };
        out
    }

    fn system_font() -> Option<Vec<u8>> {
        [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/usr/share/fonts/dejavu/DejaVuSans.ttf",
            "/Library/Fonts/Arial.ttf",
            "C:\\Windows\\Fonts\\arial.ttf",
        ]
        .iter()
        .find_map(|p| std::fs::read(p).ok())
    }

    #[test]
    fn ffi_render_pdf_ex_with_font() {
        let Some(font) = system_font() else {
            eprintln!("no system TTF found, skipping");
            return;
        };
        let json = br#"{"personal_info": {"full_name": "Omar"}, "summary": "Backend engineer"}"#;
        let opts = options(b"", &font);

        let (rc, pdf) = render_ex(json, &opts);
        assert_eq!(rc, 0, "{}", last_error());
        assert_eq!(&pdf[0..5], b"%PDF-");

        // Real glyph metrics move text boxes away from the heuristic widths.
        let shaped = layout_ex(json, &opts);
        let greeked = layout_ex(json, ptr::null());
        assert_ne!(shaped, greeked);
    }

    #[test]
    fn ffi_render_pdf_ex_applies_config() {
        let json = br#"{"summary": "Quality test"}"#;
        let (rc, high) = render_ex(json, &options(br#"{"jpeg_quality": 95}"#, b""));
        assert_eq!(rc, 0);
        let (rc, low) = render_ex(json, &options(br#"{"jpeg_quality": 10}"#, b""));
        assert_eq!(rc, 0);
        assert!(low.len() < high.len(), "{} >= {}", low.len(), high.len());
    }

    #[test]
    fn ffi_render_pdf_ex_rejects_bad_options() {
        let json = br#"{"summary": "x"}"#;
        let (rc, _) = render_ex(json, &options(br#"{"jpeg_quality": "high"}"#, b""));
        assert_eq!(rc, 6);
        assert!(last_error().contains("invalid pipeline config"));

        let (rc, _) = render_ex(json, &options(b"", &[0, 1, 2, 3]));
        assert_eq!(rc, 6);
        assert!(last_error().contains("Failed to parse font"));
    }

    #[test]
    fn ffi_version() {
        let v = cvforge_version();
        let version = unsafe { CStr::from_ptr(v) }.to_str().unwrap();
        assert_eq!(version, env!("CARGO_PKG_VERSION"));
    }
}
