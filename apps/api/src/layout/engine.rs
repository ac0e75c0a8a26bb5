//! Single-page payslip composition and PDF assembly.
//!
//! `compose` threads one `Cursor` through the regions in a fixed order;
//! `write_pdf` wraps the resulting content stream in a minimal PDF with the
//! standard-14 fonts and, when drawn, the logo XObject. No timestamps or random
//! IDs are written, so the same inputs always give the same bytes.

use pdf_writer::{Filter, Finish, Name, Pdf, Rect, Ref};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::currency::title_case;
use crate::errors::AppError;
use crate::layout::canvas::{mm_to_pt, Canvas, Cursor, RenderError, LOGO_RESOURCE};
use crate::layout::font_metrics::FontFace;
use crate::layout::regions;
use crate::layout::theme::{Theme, PAGE_HEIGHT_MM, PAGE_WIDTH_MM};
use crate::payroll::models::{EmployeeRecord, PayPeriod};

const CATALOG_ID: Ref = Ref::new(1);
const PAGE_TREE_ID: Ref = Ref::new(2);
const PAGE_ID: Ref = Ref::new(3);
const CONTENT_ID: Ref = Ref::new(4);
const LOGO_ID: Ref = Ref::new(5);
const LOGO_MASK_ID: Ref = Ref::new(6);
/// Font objects occupy consecutive ids from here, in `FontFace::ALL` order.
const FIRST_FONT_ID: i32 = 7;

/// One finished payslip plus the facts needed to describe it.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedDocument {
    pub row: usize,
    pub employee: String,
    pub basic_salary: Decimal,
    pub net: Decimal,
    pub file_name: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// Renders one record. Any region failure aborts this document only.
pub fn render_payslip(
    record: EmployeeRecord,
    period: &PayPeriod,
    theme: &Theme,
) -> Result<RenderedDocument, AppError> {
    let canvas = compose(&record, period, theme).map_err(|e| AppError::Render {
        employee: record.identifier(),
        reason: e.to_string(),
    })?;
    let bytes = write_pdf(&canvas, theme);
    let file_name = output_file_name(&record.name, &period.month);
    debug!(row = record.row, file_name = %file_name, size = bytes.len(), "Payslip rendered");

    Ok(RenderedDocument {
        row: record.row,
        employee: record.name,
        basic_salary: record.basic_salary,
        net: record.net,
        file_name,
        bytes,
    })
}

/// Draws header, title, summary, salary table, net pay callout and footer in order.
pub fn compose(
    record: &EmployeeRecord,
    period: &PayPeriod,
    theme: &Theme,
) -> Result<Canvas, RenderError> {
    let mut canvas = Canvas::new();
    let cursor = Cursor::top();
    let cursor = regions::header(&mut canvas, theme, cursor)?;
    let cursor = regions::title(&mut canvas, theme, cursor, period)?;
    let cursor = regions::employee_summary(&mut canvas, theme, cursor, record, period)?;
    let cursor = regions::salary_table(&mut canvas, theme, cursor, record)?;
    let cursor = regions::net_pay_callout(&mut canvas, theme, cursor, record)?;
    let cursor = regions::footer(&mut canvas, theme, cursor)?;

    if cursor.y() > PAGE_HEIGHT_MM {
        return Err(RenderError::OffPage {
            bottom_mm: cursor.y(),
        });
    }
    Ok(canvas)
}

/// Wraps a composed canvas into a one-page A4 PDF.
pub fn write_pdf(canvas: &Canvas, theme: &Theme) -> Vec<u8> {
    let mut pdf = Pdf::new();
    pdf.catalog(CATALOG_ID).pages(PAGE_TREE_ID);
    pdf.pages(PAGE_TREE_ID).kids([PAGE_ID]).count(1);

    let font_refs: Vec<(FontFace, Ref)> = FontFace::ALL
        .iter()
        .enumerate()
        .map(|(i, face)| (*face, Ref::new(FIRST_FONT_ID + i as i32)))
        .collect();
    for (face, id) in &font_refs {
        pdf.type1_font(*id)
            .base_font(Name(face.base_font().as_bytes()))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
    }

    let logo = theme.logo.as_deref().filter(|_| canvas.has_image());
    if let Some(logo) = logo {
        if let Some(alpha) = &logo.alpha_zlib {
            let mut mask = pdf.image_xobject(LOGO_MASK_ID, alpha);
            mask.filter(Filter::FlateDecode);
            mask.width(logo.width_px as i32);
            mask.height(logo.height_px as i32);
            mask.color_space().device_gray();
            mask.bits_per_component(8);
        }
        let mut image = pdf.image_xobject(LOGO_ID, &logo.rgb_zlib);
        image.filter(Filter::FlateDecode);
        image.width(logo.width_px as i32);
        image.height(logo.height_px as i32);
        image.color_space().device_rgb();
        image.bits_per_component(8);
        if logo.alpha_zlib.is_some() {
            image.s_mask(LOGO_MASK_ID);
        }
    }

    {
        let mut page = pdf.page(PAGE_ID);
        page.media_box(Rect::new(
            0.0,
            0.0,
            mm_to_pt(PAGE_WIDTH_MM),
            mm_to_pt(PAGE_HEIGHT_MM),
        ))
        .parent(PAGE_TREE_ID)
        .contents(CONTENT_ID);

        let mut resources = page.resources();
        {
            let mut fonts = resources.fonts();
            for (face, id) in &font_refs {
                fonts.pair(Name(face.resource_name().as_bytes()), *id);
            }
            fonts.finish();
        }
        if logo.is_some() {
            resources
                .x_objects()
                .pair(Name(LOGO_RESOURCE.as_bytes()), LOGO_ID);
        }
        resources.finish();
        page.finish();
    }

    pdf.stream(CONTENT_ID, &canvas.encode());
    pdf.finish()
}

/// `"  amit   kumar "` + `"December"` → `Amit_Kumar_December.pdf`.
///
/// Two records that normalise to the same name get the same file name.
pub fn output_file_name(name: &str, month: &str) -> String {
    let stem = name
        .split_whitespace()
        .map(|token| sanitize(&title_case(token)))
        .collect::<Vec<_>>()
        .join("_");
    let month = month
        .split_whitespace()
        .map(sanitize)
        .collect::<Vec<_>>()
        .join("_");
    format!("{stem}_{month}.pdf")
}

/// Keeps file names to a single path component.
fn sanitize(token: &str) -> String {
    token
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect::<String>()
        .replace("..", "-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThemeOptions;
    use crate::layout::theme::{LogoImage, Palette};
    use std::sync::Arc;

    fn theme() -> Theme {
        Theme::from_options(&ThemeOptions::default()).unwrap()
    }

    fn record(name: &str) -> EmployeeRecord {
        EmployeeRecord {
            row: 6,
            name: name.to_string(),
            phone: Some("9876543210".to_string()),
            basic_salary: Decimal::from(20000),
            advance: Decimal::from(3000),
            deduction: Decimal::from(2000),
            net: Decimal::from(15000),
        }
    }

    fn period() -> PayPeriod {
        PayPeriod::new("December", "2024", Some("31/12/2024".to_string()))
    }

    fn png_logo() -> LogoImage {
        let mut img = image::RgbaImage::new(4, 2);
        img.put_pixel(0, 0, image::Rgba([255, 0, 0, 128]));
        let mut bytes = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut bytes, image::ImageFormat::Png)
            .unwrap();
        LogoImage::from_bytes(bytes.get_ref()).unwrap()
    }

    // ── output_file_name ────────────────────────────────────────────────────

    #[test]
    fn test_output_file_name_normalises_whitespace_and_case() {
        assert_eq!(
            output_file_name("  amit   kumar ", "December"),
            "Amit_Kumar_December.pdf"
        );
    }

    #[test]
    fn test_output_file_name_collisions_are_not_deduplicated() {
        assert_eq!(
            output_file_name("AMIT KUMAR", "December"),
            output_file_name("amit kumar", "December")
        );
    }

    #[test]
    fn test_output_file_name_stays_one_path_component() {
        let name = output_file_name("../etc/passwd", "May");
        assert!(!name.contains('/'));
        assert!(!name.contains(".."));
    }

    // ── render_payslip ──────────────────────────────────────────────────────

    #[test]
    fn test_render_produces_pdf() {
        let doc = render_payslip(record("Amit Kumar"), &period(), &theme()).unwrap();
        assert!(doc.bytes.starts_with(b"%PDF-"));
        assert_eq!(doc.file_name, "Amit_Kumar_December.pdf");
        assert_eq!(doc.net, Decimal::from(15000));
        let text = String::from_utf8_lossy(&doc.bytes);
        assert!(text.contains("/Helvetica-Bold"));
        assert!(text.contains("/WinAnsiEncoding"));
        assert!(!text.contains("/XObject"));
    }

    #[test]
    fn test_render_is_deterministic() {
        for palette in Palette::ALL {
            let theme = theme().with_palette(palette);
            let a = render_payslip(record("Amit Kumar"), &period(), &theme).unwrap();
            let b = render_payslip(record("Amit Kumar"), &period(), &theme).unwrap();
            assert_eq!(a.bytes, b.bytes, "palette {palette:?}");
        }
    }

    #[test]
    fn test_palettes_change_output() {
        let mono = render_payslip(record("Amit Kumar"), &period(), &theme()).unwrap();
        let navy = render_payslip(
            record("Amit Kumar"),
            &period(),
            &theme().with_palette(Palette::Navy),
        )
        .unwrap();
        assert_ne!(mono.bytes, navy.bytes);
    }

    #[test]
    fn test_render_embeds_logo_with_soft_mask() {
        let mut theme = theme();
        theme.logo = Some(Arc::new(png_logo()));
        let doc = render_payslip(record("Amit Kumar"), &period(), &theme).unwrap();
        let text = String::from_utf8_lossy(&doc.bytes);
        assert!(text.contains("/Im1"));
        assert!(text.contains("/SMask"));
    }

    #[test]
    fn test_forty_character_names_render_in_every_palette() {
        for name in [
            "Venkata Subramanian Ramakrishnan Iyengar",
            "Mohammed Abdul Rahman Siddiqui Choudhury",
        ] {
            for palette in Palette::ALL {
                let theme = theme().with_palette(palette);
                let doc = render_payslip(record(name), &period(), &theme)
                    .unwrap_or_else(|e| panic!("{palette:?} rejected {name}: {e}"));
                assert!(doc.bytes.starts_with(b"%PDF-"));
            }
        }
    }

    #[test]
    fn test_very_long_name_is_truncated() {
        let canvas = compose(
            &record(&"Wolfeschlegelsteinhausen ".repeat(4)),
            &period(),
            &theme().with_palette(Palette::Crimson),
        )
        .unwrap();
        assert!(canvas
            .texts()
            .any(|t| t.starts_with("Wolfeschlegelsteinhausen") && t.ends_with("...")));
    }

    #[test]
    fn test_name_outside_win_ansi_is_render_error() {
        let err = render_payslip(
            record("\u{905}\u{92e}\u{93f}\u{924} \u{915}\u{941}\u{92e}\u{93e}\u{930}"),
            &period(),
            &theme(),
        )
        .unwrap_err();
        match err {
            AppError::Render { employee, reason } => {
                assert!(employee.starts_with("row 6"));
                assert!(reason.contains("cannot encode"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_composed_document_fits_one_page() {
        let theme = theme();
        let canvas = compose(&record("Amit Kumar"), &period(), &theme).unwrap();
        assert!(canvas.texts().any(|t| t == "Payslip for the Month: December 2024"));
        assert!(canvas.texts().any(|t| t == "31/12/2024"));
        assert_eq!(
            canvas.texts().last(),
            Some(theme.organization_name.as_str())
        );
    }
}
