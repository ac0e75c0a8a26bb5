//! Immutable visual configuration for one render call: palette, font roles,
//! region heights, organisation text and an optional logo.
//!
//! One layout engine serves every palette; palettes differ only in data here.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::ThemeOptions;
use crate::currency::{Currency, INR};
use crate::errors::AppError;
use crate::layout::canvas::{Canvas, Cursor};
use crate::layout::font_metrics::{FontFace, FontFamily, FontStyle};
use crate::layout::regions;

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;

/// Header address lines start here and advance by `ADDRESS_LINE_MM`.
pub const ADDRESS_TOP_MM: f32 = 25.0;
pub const ADDRESS_LINE_MM: f32 = 5.0;

// ────────────────────────────────────────────────────────────────────────────
// Colours
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn unit(self) -> (f32, f32, f32) {
        (
            self.0 as f32 / 255.0,
            self.1 as f32 / 255.0,
            self.2 as f32 / 255.0,
        )
    }
}

const WHITE: Rgb = Rgb(255, 255, 255);
const BLACK: Rgb = Rgb(0, 0, 0);

/// Named colour roles read by the regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorRoles {
    /// Title band and table header fill.
    pub primary: Rgb,
    /// Header banner, section headers, odd table rows, totals row, footer band.
    pub accent: Rgb,
    /// Net pay callout.
    pub success: Rgb,
    /// Negative amounts.
    pub error: Rgb,
    pub background: Rgb,
    pub text_primary: Rgb,
    pub text_secondary: Rgb,
    pub border: Rgb,
}

// ────────────────────────────────────────────────────────────────────────────
// Typography
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontRole {
    /// Organisation name in the header banner.
    Brand,
    Title,
    SectionHeader,
    Label,
    Value,
    /// Totals row and net pay figure.
    Emphasis,
    Footnote,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSpec {
    pub face: FontFace,
    pub size_pt: f32,
}

const fn spec(family: FontFamily, style: FontStyle, size_pt: f32) -> FontSpec {
    FontSpec {
        face: FontFace::new(family, style),
        size_pt,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontTable {
    pub brand: FontSpec,
    pub title: FontSpec,
    pub section_header: FontSpec,
    pub label: FontSpec,
    pub value: FontSpec,
    pub emphasis: FontSpec,
    pub footnote: FontSpec,
}

impl FontTable {
    pub fn get(&self, role: FontRole) -> FontSpec {
        match role {
            FontRole::Brand => self.brand,
            FontRole::Title => self.title,
            FontRole::SectionHeader => self.section_header,
            FontRole::Label => self.label,
            FontRole::Value => self.value,
            FontRole::Emphasis => self.emphasis,
            FontRole::Footnote => self.footnote,
        }
    }
}

const HELVETICA_FONTS: FontTable = FontTable {
    brand: spec(FontFamily::Helvetica, FontStyle::Bold, 18.0),
    title: spec(FontFamily::Helvetica, FontStyle::Bold, 14.0),
    section_header: spec(FontFamily::Helvetica, FontStyle::Bold, 10.0),
    label: spec(FontFamily::Helvetica, FontStyle::Bold, 9.0),
    value: spec(FontFamily::Helvetica, FontStyle::Regular, 9.0),
    emphasis: spec(FontFamily::Helvetica, FontStyle::Bold, 11.0),
    footnote: spec(FontFamily::Helvetica, FontStyle::Italic, 8.0),
};

const LEDGER_FONTS: FontTable = FontTable {
    label: spec(FontFamily::Courier, FontStyle::Bold, 9.0),
    value: spec(FontFamily::Courier, FontStyle::Regular, 9.0),
    ..HELVETICA_FONTS
};

// ────────────────────────────────────────────────────────────────────────────
// Region heights
// ────────────────────────────────────────────────────────────────────────────

/// Fixed region heights and the gaps after them, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionHeights {
    pub header: f32,
    pub header_gap: f32,
    pub title: f32,
    pub title_gap: f32,
    pub section_header: f32,
    pub section_gap: f32,
    pub summary_box: f32,
    pub summary_gap: f32,
    pub table_header: f32,
    pub table_row: f32,
    pub rule_gap: f32,
    pub totals_row: f32,
    pub totals_gap: f32,
    pub callout_box: f32,
    pub callout_gap: f32,
    pub words_band: f32,
    pub words_gap: f32,
    pub footer: f32,
}

/// The salary table always has exactly these three component rows.
pub const COMPONENT_ROWS: usize = 3;

impl RegionHeights {
    /// Vertical extent of the whole document, top of header to bottom of footer.
    pub const fn total(&self) -> f32 {
        self.header
            + self.header_gap
            + self.title
            + self.title_gap
            // summary: section header + box
            + self.section_header
            + self.section_gap
            + self.summary_box
            + self.summary_gap
            // salary table: section header + table
            + self.section_header
            + self.section_gap
            + self.table_header
            + self.table_row * COMPONENT_ROWS as f32
            + self.rule_gap
            + self.totals_row
            + self.totals_gap
            + self.callout_box
            + self.callout_gap
            + self.words_band
            + self.words_gap
            + self.footer
    }
}

pub const DEFAULT_HEIGHTS: RegionHeights = RegionHeights {
    header: 42.0,
    header_gap: 6.0,
    title: 15.0,
    title_gap: 1.0,
    section_header: 8.0,
    section_gap: 3.0,
    summary_box: 24.0,
    summary_gap: 6.0,
    table_header: 8.0,
    table_row: 8.0,
    rule_gap: 4.0,
    totals_row: 10.0,
    totals_gap: 1.0,
    callout_box: 18.0,
    callout_gap: 3.0,
    words_band: 8.0,
    words_gap: 8.0,
    footer: 18.0,
};

const _: () = assert!(DEFAULT_HEIGHTS.total() <= PAGE_HEIGHT_MM);

// ────────────────────────────────────────────────────────────────────────────
// Palettes
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Palette {
    /// Greyscale with a lime net-pay callout.
    #[default]
    Monochrome,
    Navy,
    Emerald,
    /// Warm tints with monospaced labels and values.
    Crimson,
}

impl Palette {
    pub const ALL: [Palette; 4] = [
        Palette::Monochrome,
        Palette::Navy,
        Palette::Emerald,
        Palette::Crimson,
    ];

    pub fn colors(self) -> ColorRoles {
        match self {
            Palette::Monochrome => ColorRoles {
                primary: Rgb(220, 220, 220),
                accent: Rgb(245, 245, 245),
                success: Rgb(144, 238, 144),
                error: Rgb(160, 0, 0),
                background: WHITE,
                text_primary: BLACK,
                text_secondary: Rgb(50, 50, 50),
                border: Rgb(220, 220, 220),
            },
            Palette::Navy => ColorRoles {
                primary: Rgb(189, 205, 230),
                accent: Rgb(237, 242, 250),
                success: Rgb(165, 214, 167),
                error: Rgb(183, 28, 28),
                background: WHITE,
                text_primary: Rgb(16, 32, 64),
                text_secondary: Rgb(70, 85, 110),
                border: Rgb(160, 180, 210),
            },
            Palette::Emerald => ColorRoles {
                primary: Rgb(200, 230, 201),
                accent: Rgb(241, 248, 241),
                success: Rgb(129, 199, 132),
                error: Rgb(198, 40, 40),
                background: WHITE,
                text_primary: Rgb(27, 54, 33),
                text_secondary: Rgb(62, 90, 66),
                border: Rgb(165, 214, 167),
            },
            Palette::Crimson => ColorRoles {
                primary: Rgb(244, 199, 195),
                accent: Rgb(252, 238, 236),
                success: Rgb(200, 230, 201),
                error: Rgb(183, 28, 28),
                background: WHITE,
                text_primary: Rgb(60, 20, 20),
                text_secondary: Rgb(100, 60, 60),
                border: Rgb(229, 170, 165),
            },
        }
    }

    pub fn fonts(self) -> FontTable {
        match self {
            Palette::Crimson => LEDGER_FONTS,
            _ => HELVETICA_FONTS,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Palette::Monochrome => "monochrome",
            Palette::Navy => "navy",
            Palette::Emerald => "emerald",
            Palette::Crimson => "crimson",
        }
    }
}

impl FromStr for Palette {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Palette::ALL
            .into_iter()
            .find(|p| p.name() == wanted)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "Unknown palette '{s}'; expected one of: {}",
                    Palette::ALL.map(Palette::name).join(", ")
                ))
            })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Logo
// ────────────────────────────────────────────────────────────────────────────

/// Decoded logo, already zlib-compressed for embedding as an image XObject.
#[derive(Debug, PartialEq, Eq)]
pub struct LogoImage {
    pub width_px: u32,
    pub height_px: u32,
    pub rgb_zlib: Vec<u8>,
    pub alpha_zlib: Option<Vec<u8>>,
}

impl LogoImage {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, image::ImageError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width_px, height_px) = rgba.dimensions();
        let rgb: Vec<u8> = rgba
            .pixels()
            .flat_map(|p| [p.0[0], p.0[1], p.0[2]])
            .collect();
        let alpha_zlib = rgba.pixels().any(|p| p.0[3] < 255).then(|| {
            let alpha: Vec<u8> = rgba.pixels().map(|p| p.0[3]).collect();
            miniz_oxide::deflate::compress_to_vec_zlib(&alpha, 6)
        });

        Ok(Self {
            width_px,
            height_px,
            rgb_zlib: miniz_oxide::deflate::compress_to_vec_zlib(&rgb, 6),
            alpha_zlib,
        })
    }

    /// Loads a logo if one is configured. A missing or undecodable file leaves the
    /// header anchor blank instead of failing.
    pub fn load(path: &Path) -> Option<Arc<Self>> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                info!(path = %path.display(), "Logo not available ({e}); header will have no logo");
                return None;
            }
        };
        match Self::from_bytes(&bytes) {
            Ok(logo) => Some(Arc::new(logo)),
            Err(e) => {
                warn!(path = %path.display(), "Logo could not be decoded: {e}");
                None
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Theme
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Theme {
    pub palette: Palette,
    pub colors: ColorRoles,
    pub fonts: FontTable,
    pub heights: RegionHeights,
    pub currency: Currency,
    pub organization_name: String,
    pub address_lines: Vec<String>,
    pub footer_text: String,
    pub logo: Option<Arc<LogoImage>>,
}

impl Theme {
    /// Builds and validates a theme from configuration, loading the logo once.
    pub fn from_options(options: &ThemeOptions) -> Result<Self, AppError> {
        let logo = options.logo_path.as_deref().and_then(LogoImage::load);
        let theme = Theme {
            palette: options.palette,
            colors: options.palette.colors(),
            fonts: options.palette.fonts(),
            heights: DEFAULT_HEIGHTS,
            currency: INR,
            organization_name: options.organization_name.clone(),
            address_lines: options.organization_address_lines.clone(),
            footer_text: options.footer_text.clone(),
            logo,
        };
        theme.validate()?;
        Ok(theme)
    }

    /// Same organisation and logo, different palette.
    pub fn with_palette(&self, palette: Palette) -> Self {
        Theme {
            palette,
            colors: palette.colors(),
            fonts: palette.fonts(),
            ..self.clone()
        }
    }

    /// Checks that every region fits one page, the header holds the address block,
    /// and the organisation text fits its frames under every palette.
    pub fn validate(&self) -> Result<(), AppError> {
        let total = self.heights.total();
        if total > PAGE_HEIGHT_MM {
            return Err(AppError::Validation(format!(
                "Region heights total {total:.1}mm, exceeding the {PAGE_HEIGHT_MM}mm page"
            )));
        }
        let address_bottom = ADDRESS_TOP_MM + ADDRESS_LINE_MM * self.address_lines.len() as f32;
        if address_bottom > self.heights.header {
            return Err(AppError::Validation(format!(
                "{} address lines do not fit the {}mm header",
                self.address_lines.len(),
                self.heights.header
            )));
        }
        if self.organization_name.trim().is_empty() {
            return Err(AppError::Validation(
                "Organization name must not be empty".to_string(),
            ));
        }

        // Requests may switch palette, so measure the configured text in all of them.
        for palette in Palette::ALL {
            let themed = self.with_palette(palette);
            let mut scratch = Canvas::new();
            regions::header(&mut scratch, &themed, Cursor::top())
                .and_then(|cursor| regions::footer(&mut scratch, &themed, cursor))
                .map_err(|e| {
                    AppError::Validation(format!(
                        "Organisation text does not fit the {} palette: {e}",
                        palette.name()
                    ))
                })?;
        }
        Ok(())
    }
}
