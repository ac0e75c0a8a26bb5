//! Drawing surface for one payslip.
//!
//! Regions record `DrawOp`s in top-left millimetre coordinates; `encode` turns the
//! display list into a PDF content stream (points, y flipped). The vertical
//! position is carried separately as a `Cursor` value that each region takes and
//! returns, so nothing about the write position lives inside the canvas.

use pdf_writer::{Content, Name, Str};
use thiserror::Error;

use crate::layout::font_metrics::{encode_win_ansi, get_metrics};
use crate::layout::theme::{FontSpec, Rgb, PAGE_HEIGHT_MM};

/// Resource name of the logo image XObject.
pub const LOGO_RESOURCE: &str = "Im1";

const PT_PER_MM: f32 = 72.0 / 25.4;

/// Horizontal padding inside a text frame, as in a table cell.
const CELL_PADDING_MM: f32 = 1.0;

/// `fit_text` shrinks in these steps down to the floor before it truncates.
const FIT_STEP_PT: f32 = 0.5;
const MIN_FIT_SIZE_PT: f32 = 6.0;
const ELLIPSIS: &str = "...";

/// Failure while laying out a region. Fatal for that document only.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("text '{text}' needs {needed_mm:.1}mm but its frame allows {available_mm:.1}mm")]
    Overflow {
        text: String,
        needed_mm: f32,
        available_mm: f32,
    },
    #[error("layout ends at {bottom_mm:.1}mm, past the bottom of the page")]
    OffPage { bottom_mm: f32 },
    #[error("text '{text}' has characters the built-in PDF fonts cannot encode")]
    Unencodable { text: String },
}

// ────────────────────────────────────────────────────────────────────────────
// Cursor
// ────────────────────────────────────────────────────────────────────────────

/// Running vertical offset from the top of the page, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    y: f32,
}

impl Cursor {
    pub fn top() -> Self {
        Self { y: 0.0 }
    }

    pub fn y(self) -> f32 {
        self.y
    }

    #[must_use]
    pub fn advance(self, by_mm: f32) -> Self {
        Self { y: self.y + by_mm }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Display list
// ────────────────────────────────────────────────────────────────────────────

/// Axis-aligned box in millimetres, origin at the top-left of the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Frame {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Fill {
        frame: Frame,
        color: Rgb,
    },
    Stroke {
        frame: Frame,
        color: Rgb,
        width_mm: f32,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        color: Rgb,
        width_mm: f32,
    },
    /// `x` is the resolved left edge of the text; `baseline` is measured from the top.
    Text {
        x: f32,
        baseline: f32,
        text: String,
        /// `text` in WinAnsi, checked when the op is recorded.
        bytes: Vec<u8>,
        font: FontSpec,
        color: Rgb,
    },
    Image {
        frame: Frame,
    },
}

#[derive(Debug, Default)]
pub struct Canvas {
    ops: Vec<DrawOp>,
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Text runs in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn has_image(&self) -> bool {
        self.ops.iter().any(|op| matches!(op, DrawOp::Image { .. }))
    }

    pub fn fill(&mut self, frame: Frame, color: Rgb) {
        self.ops.push(DrawOp::Fill { frame, color });
    }

    pub fn stroke(&mut self, frame: Frame, color: Rgb, width_mm: f32) {
        self.ops.push(DrawOp::Stroke {
            frame,
            color,
            width_mm,
        });
    }

    pub fn line(&mut self, from: (f32, f32), to: (f32, f32), color: Rgb, width_mm: f32) {
        self.ops.push(DrawOp::Line {
            from,
            to,
            color,
            width_mm,
        });
    }

    pub fn image(&mut self, frame: Frame) {
        self.ops.push(DrawOp::Image { frame });
    }

    /// Places one line of text inside `frame`, vertically centred like a table cell.
    ///
    /// Fails with `Overflow` if the text is wider than the padded frame, and with
    /// `Unencodable` if it has characters outside WinAnsi.
    pub fn text(
        &mut self,
        frame: Frame,
        text: &str,
        font: FontSpec,
        color: Rgb,
        align: Align,
    ) -> Result<(), RenderError> {
        let bytes = encode_win_ansi(text).ok_or_else(|| RenderError::Unencodable {
            text: text.to_string(),
        })?;
        let width = get_metrics(font.face).measure_pt(text, font.size_pt) / PT_PER_MM;
        let available = frame.w - 2.0 * CELL_PADDING_MM;
        if width > available {
            return Err(RenderError::Overflow {
                text: text.to_string(),
                needed_mm: width,
                available_mm: available,
            });
        }

        let x = match align {
            Align::Left => frame.x + CELL_PADDING_MM,
            Align::Center => frame.x + (frame.w - width) / 2.0,
            Align::Right => frame.x + frame.w - CELL_PADDING_MM - width,
        };
        let size_mm = font.size_pt / PT_PER_MM;
        let baseline = frame.y + frame.h / 2.0 + 0.3 * size_mm;

        self.ops.push(DrawOp::Text {
            x,
            baseline,
            text: text.to_string(),
            bytes,
            font,
            color,
        });
        Ok(())
    }

    /// Like `text`, for values that come from the data rather than the theme.
    ///
    /// Text that is too wide is set smaller, down to `MIN_FIT_SIZE_PT`; past that
    /// it is cut and ends in `...`. Unencodable text is still an error.
    pub fn fit_text(
        &mut self,
        frame: Frame,
        text: &str,
        font: FontSpec,
        color: Rgb,
        align: Align,
    ) -> Result<(), RenderError> {
        if encode_win_ansi(text).is_none() {
            return Err(RenderError::Unencodable {
                text: text.to_string(),
            });
        }
        let metrics = get_metrics(font.face);
        let available = frame.w - 2.0 * CELL_PADDING_MM;
        let fits = |s: &str, size_pt: f32| metrics.measure_pt(s, size_pt) / PT_PER_MM <= available;

        let floor = MIN_FIT_SIZE_PT.min(font.size_pt);
        let mut size_pt = font.size_pt;
        while size_pt > floor && !fits(text, size_pt) {
            size_pt = (size_pt - FIT_STEP_PT).max(floor);
        }
        let font = FontSpec { size_pt, ..font };
        if fits(text, size_pt) {
            return self.text(frame, text, font, color, align);
        }

        let mut kept = text.to_string();
        let shortened = loop {
            kept.pop();
            let candidate = format!("{}{}", kept.trim_end(), ELLIPSIS);
            if kept.is_empty() || fits(&candidate, size_pt) {
                break candidate;
            }
        };
        self.text(frame, &shortened, font, color, align)
    }

    /// Serialises the display list into a PDF content stream.
    pub fn encode(&self) -> Vec<u8> {
        let mut content = Content::new();
        for op in &self.ops {
            match op {
                DrawOp::Fill { frame, color } => {
                    let (r, g, b) = color.unit();
                    let (x, y, w, h) = to_pdf_rect(*frame);
                    content.set_fill_rgb(r, g, b);
                    content.rect(x, y, w, h);
                    content.fill_nonzero();
                }
                DrawOp::Stroke {
                    frame,
                    color,
                    width_mm,
                } => {
                    let (r, g, b) = color.unit();
                    let (x, y, w, h) = to_pdf_rect(*frame);
                    content.set_stroke_rgb(r, g, b);
                    content.set_line_width(width_mm * PT_PER_MM);
                    content.rect(x, y, w, h);
                    content.stroke();
                }
                DrawOp::Line {
                    from,
                    to,
                    color,
                    width_mm,
                } => {
                    let (r, g, b) = color.unit();
                    content.set_stroke_rgb(r, g, b);
                    content.set_line_width(width_mm * PT_PER_MM);
                    content.move_to(from.0 * PT_PER_MM, flip(from.1));
                    content.line_to(to.0 * PT_PER_MM, flip(to.1));
                    content.stroke();
                }
                DrawOp::Text {
                    x,
                    baseline,
                    bytes,
                    font,
                    color,
                    ..
                } => {
                    let (r, g, b) = color.unit();
                    content.set_fill_rgb(r, g, b);
                    content
                        .begin_text()
                        .set_font(Name(font.face.resource_name().as_bytes()), font.size_pt)
                        .next_line(x * PT_PER_MM, flip(*baseline))
                        .show(Str(bytes))
                        .end_text();
                }
                DrawOp::Image { frame } => {
                    let (x, y, w, h) = to_pdf_rect(*frame);
                    content.save_state();
                    content.transform([w, 0.0, 0.0, h, x, y]);
                    content.x_object(Name(LOGO_RESOURCE.as_bytes()));
                    content.restore_state();
                }
            }
        }
        content.finish()
    }
}

pub fn mm_to_pt(mm: f32) -> f32 {
    mm * PT_PER_MM
}

fn flip(y_mm: f32) -> f32 {
    (PAGE_HEIGHT_MM - y_mm) * PT_PER_MM
}

/// Top-left mm frame → PDF `(x, y_bottom, w, h)` in points.
fn to_pdf_rect(frame: Frame) -> (f32, f32, f32, f32) {
    (
        frame.x * PT_PER_MM,
        flip(frame.y + frame.h),
        frame.w * PT_PER_MM,
        frame.h * PT_PER_MM,
    )
}
