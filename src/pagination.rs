//! Page placement – fits a captured raster onto a physical page.
//!
//! The content is scaled uniformly by the tighter of the two axis ratios so
//! it fits entirely on the page, then centred on both axes. Content never
//! crops and never splits across pages.

/// Where a raster lands on the page, in page units (millimetres for export).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageFit {
    pub scale: f32,
    pub width: f32,
    pub height: f32,
    pub x_offset: f32,
    pub y_offset: f32,
}

/// Fit `content_width` × `content_height` onto a `page_width` × `page_height`
/// page. The content size is the true, unscaled size of what was captured.
pub fn fit_to_page(
    content_width: f32,
    content_height: f32,
    page_width: f32,
    page_height: f32,
) -> Result<PageFit, String> {
    let dims = [content_width, content_height, page_width, page_height];
    if dims.iter().any(|d| !d.is_finite() || *d <= 0.0) {
        return Err(format!(
            "cannot fit {content_width} × {content_height} onto {page_width} × {page_height}"
        ));
    }

    let scale = (page_width / content_width).min(page_height / content_height);
    let width = content_width * scale;
    let height = content_height * scale;
    Ok(PageFit {
        scale,
        width,
        height,
        x_offset: (page_width - width) / 2.0,
        y_offset: (page_height - height) / 2.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_proportioned_content_fills_the_page() {
        let fit = fit_to_page(1190.56, 1683.78, 210.0, 297.0).unwrap();
        assert!((fit.width - 210.0).abs() < 0.01);
        assert!((fit.height - 297.0).abs() < 0.05);
        assert!(fit.x_offset.abs() < 0.01);
    }

    #[test]
    fn tall_content_is_bounded_by_height_and_centred_horizontally() {
        let fit = fit_to_page(800.0, 2000.0, 210.0, 297.0).unwrap();
        assert!((fit.scale - 297.0 / 2000.0).abs() < 1e-6);
        assert!((fit.height - 297.0).abs() < 1e-3);
        assert!((fit.width - 118.8).abs() < 1e-3);
        assert!((fit.x_offset - 45.6).abs() < 1e-3);
        assert_eq!(fit.y_offset, 0.0);
    }

    #[test]
    fn wide_content_is_bounded_by_width_and_centred_vertically() {
        let fit = fit_to_page(1000.0, 500.0, 210.0, 297.0).unwrap();
        assert!((fit.width - 210.0).abs() < 1e-3);
        assert!((fit.height - 105.0).abs() < 1e-3);
        assert!((fit.y_offset - 96.0).abs() < 1e-3);
    }

    #[test]
    fn small_content_is_scaled_up() {
        let fit = fit_to_page(105.0, 100.0, 210.0, 297.0).unwrap();
        assert_eq!(fit.scale, 2.0);
    }

    #[test]
    fn degenerate_sizes_are_rejected() {
        assert!(fit_to_page(0.0, 100.0, 210.0, 297.0).is_err());
        assert!(fit_to_page(100.0, f32::NAN, 210.0, 297.0).is_err());
    }
}
