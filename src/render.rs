//! PDF writer – turns an [`ExportDocument`] into PDF bytes with `printpdf`
//! (v0.8 ops-based API).
//!
//! Each page carries at most one JPEG, drawn as an image XObject, and an
//! optional watermark line in builtin Helvetica.

use printpdf::*;

use crate::layout_config::{ExportDocument, PlacedImage, Watermark};

const PT_PER_MM: f32 = 72.0 / 25.4;

/// Average Helvetica advance as a fraction of the font size.
const HELVETICA_AVG_ADVANCE: f32 = 0.5;

fn mm_to_pt(mm: f32) -> Pt {
    Pt(mm * PT_PER_MM)
}

/// Assemble the PDF. Fails when a page image cannot be embedded.
pub fn render_export_pdf(export: &ExportDocument) -> Result<Vec<u8>, String> {
    let page_w = Mm(export.page_width_mm);
    let page_h = Mm(export.page_height_mm);
    let page_h_pt = export.page_height_mm * PT_PER_MM;

    let mut doc = PdfDocument::new(&export.title);
    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    let mut pages = Vec::new();

    for page in &export.pages {
        let mut ops = Vec::new();

        if let Some(img) = &page.image {
            let raw = RawImage::decode_from_bytes(&img.jpeg, &mut warnings)
                .map_err(|e| format!("page {}: cannot embed image: {e}", page.page_index))?;
            let xobj_id = doc.add_image(&raw);
            ops.push(place_image(xobj_id, img, page_h_pt));
        }

        if let Some(wm) = &page.watermark {
            push_watermark(&mut ops, wm, page_h_pt);
        }

        pages.push(PdfPage::new(page_w, page_h, ops));
    }

    if pages.is_empty() {
        pages.push(PdfPage::new(page_w, page_h, Vec::new()));
    }
    if !warnings.is_empty() {
        log::debug!("printpdf reported {} image warnings", warnings.len());
    }

    doc.with_pages(pages);
    Ok(doc.save(&PdfSaveOptions::default(), &mut Vec::new()))
}

fn place_image(id: XObjectId, img: &PlacedImage, page_h_pt: f32) -> Op {
    // PDF origin is bottom-left; placement is top-left based.
    let bottom = page_h_pt - (img.y_mm + img.height_mm) * PT_PER_MM;

    // At dpi=72 one pixel is one point.
    let scale_x = if img.px_width > 0 {
        img.width_mm * PT_PER_MM / img.px_width as f32
    } else {
        1.0
    };
    let scale_y = if img.px_height > 0 {
        img.height_mm * PT_PER_MM / img.px_height as f32
    } else {
        1.0
    };

    Op::UseXobject {
        id,
        transform: XObjectTransform {
            translate_x: Some(mm_to_pt(img.x_mm)),
            translate_y: Some(Pt(bottom)),
            dpi: Some(72.0),
            scale_x: Some(scale_x),
            scale_y: Some(scale_y),
            rotate: None,
        },
    }
}

fn push_watermark(ops: &mut Vec<Op>, wm: &Watermark, page_h_pt: f32) {
    if wm.text.trim().is_empty() {
        return;
    }
    let font = BuiltinFont::Helvetica;
    let encoded = to_winlatin(&wm.text);
    let width = wm.text.chars().count() as f32 * wm.font_size_pt * HELVETICA_AVG_ADVANCE;
    let x = wm.x_mm * PT_PER_MM - width / 2.0;
    let y = page_h_pt - wm.y_mm * PT_PER_MM;

    ops.push(Op::StartTextSection);
    ops.push(Op::SetTextCursor {
        pos: Point { x: Pt(x), y: Pt(y) },
    });
    ops.push(Op::SetFontSizeBuiltinFont {
        size: Pt(wm.font_size_pt),
        font,
    });
    ops.push(Op::SetFillColor {
        col: Color::Rgb(Rgb {
            r: wm.color[0],
            g: wm.color[1],
            b: wm.color[2],
            icc_profile: None,
        }),
    });
    ops.push(Op::WriteTextBuiltinFont {
        items: vec![TextItem::Text(encoded)],
        font,
    });
    ops.push(Op::EndTextSection);
}

/// Convert a UTF-8 string to raw Windows-1252 bytes then wrap in a String so
/// printpdf writes the bytes unchanged into the PDF stream (builtin fonts use
/// WinAnsiEncoding, so each glyph is one byte 0x00–0xFF). Characters outside
/// the code page become `?`.
fn to_winlatin(s: &str) -> String {
    let bytes: Vec<u8> = s
        .chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{00A0}' => 0x20,
            c if (c as u32) < 256 => c as u8,
            _ => b'?',
        })
        .collect();
    // SAFETY: intentionally non-UTF-8 for 0x80-0x9F range; printpdf passes
    // these bytes straight to the PDF stream, decoded by WinAnsiEncoding.
    #[allow(unsafe_code)]
    unsafe {
        String::from_utf8_unchecked(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout_config::ExportPage;
    use ::image::{codecs::jpeg::JpegEncoder, Rgb, RgbImage};

    fn jpeg(w: u32, h: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(w, h, Rgb([10, 20, 30]));
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, 95)
            .encode_image(&img)
            .unwrap();
        buf
    }

    fn page(image: Option<PlacedImage>, watermark: Option<Watermark>) -> ExportPage {
        ExportPage {
            page_index: 0,
            image,
            watermark,
        }
    }

    #[test]
    fn empty_document_still_has_a_page() {
        let bytes = render_export_pdf(&ExportDocument::a4("cv")).unwrap();
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn image_page_embeds_the_jpeg() {
        let mut doc = ExportDocument::a4("cv");
        doc.pages.push(page(
            Some(PlacedImage {
                x_mm: 0.0,
                y_mm: 0.0,
                width_mm: 210.0,
                height_mm: 297.0,
                px_width: 40,
                px_height: 56,
                jpeg: jpeg(40, 56),
            }),
            Some(Watermark::bottom_centre("free", 210.0, 297.0)),
        ));
        let bytes = render_export_pdf(&doc).unwrap();
        assert_eq!(&bytes[0..5], b"%PDF-");
        assert!(bytes.len() > 200);
    }

    #[test]
    fn corrupt_image_fails_assembly() {
        let mut doc = ExportDocument::a4("cv");
        doc.pages.push(page(
            Some(PlacedImage {
                x_mm: 0.0,
                y_mm: 0.0,
                width_mm: 1.0,
                height_mm: 1.0,
                px_width: 1,
                px_height: 1,
                jpeg: vec![1, 2, 3],
            }),
            None,
        ));
        assert!(render_export_pdf(&doc).is_err());
    }

    #[test]
    fn winlatin_maps_typographic_dash() {
        assert_eq!(to_winlatin("a–b").as_bytes(), &[b'a', 0x96, b'b']);
        assert_eq!(to_winlatin("ب").as_bytes(), b"?");
    }
}
