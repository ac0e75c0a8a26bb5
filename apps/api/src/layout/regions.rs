//! The six payslip regions, drawn top to bottom.
//!
//! Every region reads the incoming cursor, draws at that offset, and returns the
//! cursor advanced by its fixed height plus the gap that follows it. No region
//! looks at what comes after it.

use rust_decimal::Decimal;

use crate::currency::{amount_in_words, format_amount_in};
use crate::layout::canvas::{Align, Canvas, Cursor, Frame, RenderError};
use crate::layout::theme::{
    FontRole, Theme, ADDRESS_LINE_MM, ADDRESS_TOP_MM, PAGE_HEIGHT_MM, PAGE_WIDTH_MM,
};
use crate::payroll::models::{EmployeeRecord, PayPeriod};

/// Left edge and width of boxed content.
const CONTENT_X: f32 = 10.0;
const CONTENT_W: f32 = 190.0;
const CONTENT_RIGHT: f32 = CONTENT_X + CONTENT_W;
/// Left edge of text inside boxes.
const TEXT_X: f32 = 15.0;

/// Logo anchor inside the header banner.
const LOGO_X: f32 = 17.0;
const LOGO_TOP: f32 = 11.0;
const LOGO_W: f32 = 18.0;
/// Organisation text starts right of the logo anchor.
const BRAND_X: f32 = 42.0;

/// Summary box columns: label, value, label, value.
const SUMMARY_COLUMNS: [(f32, f32); 4] =
    [(15.0, 27.0), (42.0, 55.0), (97.0, 22.0), (119.0, 76.0)];
const SUMMARY_ROW_H: f32 = 6.0;

/// Salary table: component column and right-aligned amount column.
const COMPONENT_W: f32 = 120.0;
const AMOUNT_X: f32 = TEXT_X + COMPONENT_W;
const AMOUNT_W: f32 = CONTENT_RIGHT - 5.0 - AMOUNT_X;

pub const NOT_AVAILABLE: &str = "N/A";

pub const BASIC_SALARY_LABEL: &str = "Basic Salary";
pub const ADVANCE_LABEL: &str = "Advance";
pub const DEDUCTION_LABEL: &str = "Deduction";
pub const TOTAL_LABEL: &str = "Net Pay (Total)";

// ────────────────────────────────────────────────────────────────────────────
// 1. Header
// ────────────────────────────────────────────────────────────────────────────

/// Page background, brand banner, optional logo, organisation name and address.
pub fn header(canvas: &mut Canvas, theme: &Theme, cursor: Cursor) -> Result<Cursor, RenderError> {
    let y = cursor.y();
    let colors = &theme.colors;
    let height = theme.heights.header;

    canvas.fill(
        Frame::new(0.0, 0.0, PAGE_WIDTH_MM, PAGE_HEIGHT_MM),
        colors.background,
    );
    canvas.fill(Frame::new(0.0, y, PAGE_WIDTH_MM, height), colors.accent);

    if let Some(logo) = &theme.logo {
        let aspect = logo.height_px as f32 / logo.width_px.max(1) as f32;
        let logo_h = (LOGO_W * aspect).min(height - LOGO_TOP - 2.0);
        canvas.image(Frame::new(LOGO_X, y + LOGO_TOP, LOGO_W, logo_h));
    }

    let text_w = CONTENT_RIGHT - BRAND_X;
    canvas.text(
        Frame::new(BRAND_X, y + 15.0, text_w, 8.0),
        &theme.organization_name,
        theme.fonts.get(FontRole::Brand),
        colors.text_primary,
        Align::Left,
    )?;
    for (i, line) in theme.address_lines.iter().enumerate() {
        canvas.text(
            Frame::new(
                BRAND_X,
                y + ADDRESS_TOP_MM + ADDRESS_LINE_MM * i as f32,
                text_w,
                ADDRESS_LINE_MM,
            ),
            line,
            theme.fonts.get(FontRole::Value),
            colors.text_primary,
            Align::Left,
        )?;
    }

    canvas.line(
        (CONTENT_X, y + height),
        (CONTENT_RIGHT, y + height),
        colors.border,
        0.8,
    );
    Ok(cursor.advance(height + theme.heights.header_gap))
}

// ────────────────────────────────────────────────────────────────────────────
// 2. Title band
// ────────────────────────────────────────────────────────────────────────────

pub fn title(
    canvas: &mut Canvas,
    theme: &Theme,
    cursor: Cursor,
    period: &PayPeriod,
) -> Result<Cursor, RenderError> {
    let y = cursor.y();
    let height = theme.heights.title;
    canvas.fill(Frame::new(CONTENT_X, y, CONTENT_W, height), theme.colors.primary);
    canvas.fit_text(
        Frame::new(CONTENT_X, y + 4.0, CONTENT_W, 7.0),
        &format!("Payslip for the Month: {}", period.label()),
        theme.fonts.get(FontRole::Title),
        theme.colors.text_primary,
        Align::Center,
    )?;
    Ok(cursor.advance(height + theme.heights.title_gap))
}

/// Shaded strip with a bold caption, shared by the summary and the salary table.
fn section_header(
    canvas: &mut Canvas,
    theme: &Theme,
    cursor: Cursor,
    caption: &str,
) -> Result<Cursor, RenderError> {
    let y = cursor.y();
    let height = theme.heights.section_header;
    canvas.fill(Frame::new(CONTENT_X, y, CONTENT_W, height), theme.colors.accent);
    canvas.text(
        Frame::new(TEXT_X - 1.0, y + 1.0, CONTENT_RIGHT - TEXT_X, height - 2.0),
        caption,
        theme.fonts.get(FontRole::SectionHeader),
        theme.colors.text_primary,
        Align::Left,
    )?;
    Ok(cursor.advance(height + theme.heights.section_gap))
}

// ────────────────────────────────────────────────────────────────────────────
// 3. Employee summary
// ────────────────────────────────────────────────────────────────────────────

/// Bordered box with name / phone / period / pay date. Missing values print `N/A`.
pub fn employee_summary(
    canvas: &mut Canvas,
    theme: &Theme,
    cursor: Cursor,
    record: &EmployeeRecord,
    period: &PayPeriod,
) -> Result<Cursor, RenderError> {
    let cursor = section_header(canvas, theme, cursor, "EMPLOYEE INFORMATION")?;
    let y = cursor.y();
    let height = theme.heights.summary_box;
    let frame = Frame::new(CONTENT_X, y, CONTENT_W, height);
    canvas.fill(frame, theme.colors.background);
    canvas.stroke(frame, theme.colors.border, 0.5);

    let phone = record.phone.as_deref().unwrap_or(NOT_AVAILABLE);
    let pay_date = period.pay_date.as_deref().unwrap_or(NOT_AVAILABLE);
    let period_label = period.label();
    let rows: [[&str; 4]; 2] = [
        ["Employee:", record.name.as_str(), "Phone no:", phone],
        ["Period:", period_label.as_str(), "Pay Date:", pay_date],
    ];

    for (r, cells) in rows.iter().enumerate() {
        let row_y = y + 3.0 + SUMMARY_ROW_H * r as f32;
        for (c, text) in cells.iter().enumerate() {
            let (x, w) = SUMMARY_COLUMNS[c];
            let cell = Frame::new(x, row_y, w, SUMMARY_ROW_H);
            let ink = theme.colors.text_primary;
            if c % 2 == 0 {
                canvas.text(cell, text, theme.fonts.get(FontRole::Label), ink, Align::Left)?;
            } else {
                canvas.fit_text(cell, text, theme.fonts.get(FontRole::Value), ink, Align::Left)?;
            }
        }
    }

    Ok(cursor.advance(height + theme.heights.summary_gap))
}

// ────────────────────────────────────────────────────────────────────────────
// 4. Salary table
// ────────────────────────────────────────────────────────────────────────────

/// Basic salary, then advance and deduction as negatives, in that order.
/// Zero-valued components still get a row.
pub fn salary_components(record: &EmployeeRecord) -> [(&'static str, Decimal); 3] {
    [
        (BASIC_SALARY_LABEL, record.basic_salary),
        (ADVANCE_LABEL, -record.advance),
        (DEDUCTION_LABEL, -record.deduction),
    ]
}

pub fn salary_table(
    canvas: &mut Canvas,
    theme: &Theme,
    cursor: Cursor,
    record: &EmployeeRecord,
) -> Result<Cursor, RenderError> {
    let cursor = section_header(canvas, theme, cursor, "SALARY AGGREGATION")?;
    let colors = &theme.colors;
    let heights = &theme.heights;
    let top = cursor.y();
    let mut y = top;

    canvas.fill(
        Frame::new(CONTENT_X, y, CONTENT_W, heights.table_header),
        colors.primary,
    );
    let header_font = theme.fonts.get(FontRole::SectionHeader);
    canvas.text(
        Frame::new(TEXT_X - 1.0, y, COMPONENT_W, heights.table_header),
        "COMPONENT",
        header_font,
        colors.text_primary,
        Align::Left,
    )?;
    canvas.text(
        Frame::new(AMOUNT_X, y, AMOUNT_W, heights.table_header),
        &format!("AMOUNT ({})", theme.currency.prefix),
        header_font,
        colors.text_primary,
        Align::Right,
    )?;
    y += heights.table_header;

    for (i, (label, amount)) in salary_components(record).into_iter().enumerate() {
        let shade = if i % 2 == 0 {
            colors.background
        } else {
            colors.accent
        };
        canvas.fill(Frame::new(CONTENT_X, y, CONTENT_W, heights.table_row), shade);
        canvas.line((CONTENT_X, y), (CONTENT_RIGHT, y), colors.border, 0.3);
        canvas.text(
            Frame::new(TEXT_X - 1.0, y, COMPONENT_W, heights.table_row),
            label,
            theme.fonts.get(FontRole::Value),
            colors.text_primary,
            Align::Left,
        )?;
        let ink = if amount < Decimal::ZERO {
            colors.error
        } else {
            colors.text_primary
        };
        canvas.fit_text(
            Frame::new(AMOUNT_X, y, AMOUNT_W, heights.table_row),
            &format_amount_in(amount, theme.currency),
            theme.fonts.get(FontRole::Label),
            ink,
            Align::Right,
        )?;
        y += heights.table_row;
    }

    canvas.line((CONTENT_X, y), (CONTENT_RIGHT, y), colors.text_secondary, 0.5);
    y += heights.rule_gap;

    let emphasis = theme.fonts.get(FontRole::Emphasis);
    canvas.fill(
        Frame::new(CONTENT_X, y, CONTENT_W, heights.totals_row),
        colors.accent,
    );
    canvas.text(
        Frame::new(TEXT_X - 1.0, y, COMPONENT_W, heights.totals_row),
        TOTAL_LABEL,
        emphasis,
        colors.text_primary,
        Align::Left,
    )?;
    canvas.fit_text(
        Frame::new(AMOUNT_X, y, AMOUNT_W, heights.totals_row),
        &format_amount_in(record.net, theme.currency),
        emphasis,
        colors.text_primary,
        Align::Right,
    )?;
    y += heights.totals_row + heights.totals_gap;

    Ok(cursor.advance(y - top))
}

// ────────────────────────────────────────────────────────────────────────────
// 5. Net pay callout
// ────────────────────────────────────────────────────────────────────────────

pub fn net_pay_callout(
    canvas: &mut Canvas,
    theme: &Theme,
    cursor: Cursor,
    record: &EmployeeRecord,
) -> Result<Cursor, RenderError> {
    let colors = &theme.colors;
    let heights = &theme.heights;
    let y = cursor.y();

    canvas.fill(
        Frame::new(CONTENT_X, y, CONTENT_W, heights.callout_box),
        colors.success,
    );
    let inner = Frame::new(
        CONTENT_X + 5.0,
        y + 3.0,
        CONTENT_W - 10.0,
        heights.callout_box - 7.0,
    );
    canvas.fill(inner, colors.background);
    canvas.stroke(inner, colors.success, 1.0);
    canvas.fit_text(
        inner,
        &format!(
            "NET SALARY: {}",
            format_amount_in(record.net, theme.currency)
        ),
        theme.fonts.get(FontRole::Title),
        colors.text_primary,
        Align::Center,
    )?;

    let cursor = cursor.advance(heights.callout_box + heights.callout_gap);
    let y = cursor.y();
    let band = Frame::new(CONTENT_X, y, CONTENT_W, heights.words_band);
    canvas.fill(band, colors.success);
    canvas.fit_text(
        band,
        &amount_in_words(record.net, theme.currency),
        theme.fonts.get(FontRole::Footnote),
        colors.text_secondary,
        Align::Center,
    )?;

    Ok(cursor.advance(heights.words_band + heights.words_gap))
}

// ────────────────────────────────────────────────────────────────────────────
// 6. Footer
// ────────────────────────────────────────────────────────────────────────────

/// Disclaimer and organisation name, placed at the running cursor rather than the
/// page bottom.
pub fn footer(canvas: &mut Canvas, theme: &Theme, cursor: Cursor) -> Result<Cursor, RenderError> {
    let colors = &theme.colors;
    let y = cursor.y();
    let height = theme.heights.footer;

    canvas.fill(Frame::new(0.0, y, PAGE_WIDTH_MM, height), colors.accent);
    canvas.line((CONTENT_X, y + 5.0), (CONTENT_RIGHT, y + 5.0), colors.border, 1.0);
    canvas.text(
        Frame::new(0.0, y + 6.0, PAGE_WIDTH_MM, 4.0),
        &theme.footer_text,
        theme.fonts.get(FontRole::Footnote),
        colors.text_secondary,
        Align::Center,
    )?;
    canvas.text(
        Frame::new(0.0, y + 10.0, PAGE_WIDTH_MM, 6.0),
        &theme.organization_name,
        theme.fonts.get(FontRole::SectionHeader),
        colors.text_primary,
        Align::Center,
    )?;

    Ok(cursor.advance(height))
}
