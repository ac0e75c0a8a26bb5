//! Static width tables for the PDF standard-14 faces used on payslips.
//!
//! Widths are the Adobe AFM advance widths in 1/1000 em. Oblique faces share the
//! upright widths. All tables cover ASCII 0x20..=0x7E (95 printable characters);
//! index = (char as usize) - 32. Other characters fall back to `average_width`.

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Faces
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontFamily {
    Helvetica,
    Courier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
}

/// A concrete standard-14 face. Every face is registered on every page, so the
/// resource name is fixed per face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FontFace {
    pub family: FontFamily,
    pub style: FontStyle,
}

impl FontFace {
    pub const fn new(family: FontFamily, style: FontStyle) -> Self {
        Self { family, style }
    }

    pub const ALL: [FontFace; 6] = [
        FontFace::new(FontFamily::Helvetica, FontStyle::Regular),
        FontFace::new(FontFamily::Helvetica, FontStyle::Bold),
        FontFace::new(FontFamily::Helvetica, FontStyle::Italic),
        FontFace::new(FontFamily::Courier, FontStyle::Regular),
        FontFace::new(FontFamily::Courier, FontStyle::Bold),
        FontFace::new(FontFamily::Courier, FontStyle::Italic),
    ];

    /// PostScript name written as the font's `/BaseFont`.
    pub fn base_font(&self) -> &'static str {
        match (self.family, self.style) {
            (FontFamily::Helvetica, FontStyle::Regular) => "Helvetica",
            (FontFamily::Helvetica, FontStyle::Bold) => "Helvetica-Bold",
            (FontFamily::Helvetica, FontStyle::Italic) => "Helvetica-Oblique",
            (FontFamily::Courier, FontStyle::Regular) => "Courier",
            (FontFamily::Courier, FontStyle::Bold) => "Courier-Bold",
            (FontFamily::Courier, FontStyle::Italic) => "Courier-Oblique",
        }
    }

    /// Page resource name (`/F1` … `/F6`).
    pub fn resource_name(&self) -> &'static str {
        match (self.family, self.style) {
            (FontFamily::Helvetica, FontStyle::Regular) => "F1",
            (FontFamily::Helvetica, FontStyle::Bold) => "F2",
            (FontFamily::Helvetica, FontStyle::Italic) => "F3",
            (FontFamily::Courier, FontStyle::Regular) => "F4",
            (FontFamily::Courier, FontStyle::Bold) => "F5",
            (FontFamily::Courier, FontStyle::Italic) => "F6",
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Metric table
// ────────────────────────────────────────────────────────────────────────────

/// Width array slot layout:
/// ```text
/// [0]=sp  [1]=!   [2]="   [3]=#   [4]=$   [5]=%   [6]=&   [7]='
/// [8]=(   [9]=)   [10]=*  [11]=+  [12]=,  [13]=-  [14]=.  [15]=/
/// [16..25]=0-9
/// [26]=:  [27]=;  [28]=<  [29]==  [30]=>  [31]=?  [32]=@
/// [33..58]=A-Z
/// [59]=[  [60]=\  [61]=]  [62]=^  [63]=_  [64]=`
/// [65..90]=a-z
/// [91]={  [92]=|  [93]=}  [94]=~
/// ```
pub struct FontMetricTable {
    widths: [u16; 95],
    pub average_width: u16,
}

impl FontMetricTable {
    /// Rendered width of `s` in points at `size_pt`.
    pub fn measure_pt(&self, s: &str, size_pt: f32) -> f32 {
        let units: u32 = s
            .chars()
            .map(|c| {
                let code = c as usize;
                if (32..=126).contains(&code) {
                    self.widths[code - 32] as u32
                } else {
                    self.average_width as u32
                }
            })
            .sum();
        units as f32 * size_pt / 1000.0
    }
}

pub fn get_metrics(face: FontFace) -> &'static FontMetricTable {
    match (face.family, face.style) {
        (FontFamily::Helvetica, FontStyle::Bold) => &HELVETICA_BOLD_TABLE,
        (FontFamily::Helvetica, _) => &HELVETICA_TABLE,
        (FontFamily::Courier, _) => &COURIER_TABLE,
    }
}

/// Maps text to WinAnsi bytes for the simple-font `show` operator.
///
/// Printable ASCII and Latin-1 (0xA0..=0xFF) map to themselves. Returns `None` if any
/// other character appears, since the standard-14 fonts have no glyph for it.
pub fn encode_win_ansi(s: &str) -> Option<Vec<u8>> {
    s.chars()
        .map(|c| match c as u32 {
            code @ (0x20..=0x7E | 0xA0..=0xFF) => Some(code as u8),
            _ => None,
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Static width tables  (95 ASCII printable characters each)
// ────────────────────────────────────────────────────────────────────────────

static HELVETICA_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        // sp   !    "    #    $    %    &    '    (    )    *    +    ,    -    .    /
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
        // 0    1    2    3    4    5    6    7    8    9
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        // :    ;    <    =    >    ?    @
        278, 278, 584, 584, 584, 556, 1015,
        // A    B    C    D    E    F    G    H    I    J    K    L    M
        667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
        // N    O    P    Q    R    S    T    U    V    W    X    Y    Z
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
        // [    \    ]    ^    _    `
        278, 278, 278, 469, 556, 333,
        // a    b    c    d    e    f    g    h    i    j    k    l    m
        556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
        // n    o    p    q    r    s    t    u    v    w    x    y    z
        556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
        // {    |    }    ~
        334, 260, 334, 584,
    ],
    average_width: 556,
};

static HELVETICA_BOLD_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        // sp   !    "    #    $    %    &    '    (    )    *    +    ,    -    .    /
        278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
        // 0    1    2    3    4    5    6    7    8    9
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        // :    ;    <    =    >    ?    @
        333, 333, 584, 584, 584, 611, 975,
        // A    B    C    D    E    F    G    H    I    J    K    L    M
        722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
        // N    O    P    Q    R    S    T    U    V    W    X    Y    Z
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
        // [    \    ]    ^    _    `
        333, 278, 333, 584, 556, 333,
        // a    b    c    d    e    f    g    h    i    j    k    l    m
        556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
        // n    o    p    q    r    s    t    u    v    w    x    y    z
        611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
        // {    |    }    ~
        389, 280, 389, 584,
    ],
    average_width: 584,
};

static COURIER_TABLE: FontMetricTable = FontMetricTable {
    widths: [600; 95],
    average_width: 600,
};
