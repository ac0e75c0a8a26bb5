use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::layout::theme::Palette;
use crate::payroll::adapter::DEFAULT_HEADER_ROWS;
use crate::payroll::models::NetPolicy;

const DEFAULT_ORG_NAME: &str = "Helly Consultancy Services";
const DEFAULT_ORG_ADDRESS: &str =
    "No. 12, Second Floor, Industrial Estate|Chennai, Tamil Nadu 600032";
const DEFAULT_FOOTER: &str = "-- This is a system-generated document --";

/// Theme selection: palette, logo and organisation text.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThemeOptions {
    pub palette: Palette,
    pub logo_path: Option<PathBuf>,
    pub footer_text: String,
    pub organization_name: String,
    pub organization_address_lines: Vec<String>,
}

impl Default for ThemeOptions {
    fn default() -> Self {
        Self {
            palette: Palette::default(),
            logo_path: None,
            footer_text: DEFAULT_FOOTER.to_string(),
            organization_name: DEFAULT_ORG_NAME.to_string(),
            organization_address_lines: split_address(DEFAULT_ORG_ADDRESS),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Per-upload session directories are created under here.
    pub output_root: PathBuf,
    pub header_rows: usize,
    pub concurrency: usize,
    pub fail_fast: bool,
    pub net_policy: NetPolicy,
    pub max_upload_bytes: usize,
    /// Session directories older than this are swept. `None` keeps them forever.
    pub session_retention: Option<Duration>,
    pub theme: ThemeOptions,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let default_concurrency = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);

        let theme = ThemeOptions {
            palette: match optional_env("PAYSLIP_PALETTE") {
                Some(p) => p
                    .parse::<Palette>()
                    .map_err(|e| anyhow::anyhow!("PAYSLIP_PALETTE: {e}"))?,
                None => Palette::default(),
            },
            logo_path: optional_env("PAYSLIP_LOGO_PATH").map(PathBuf::from),
            footer_text: optional_env("PAYSLIP_FOOTER_TEXT")
                .unwrap_or_else(|| DEFAULT_FOOTER.to_string()),
            organization_name: optional_env("PAYSLIP_ORG_NAME")
                .unwrap_or_else(|| DEFAULT_ORG_NAME.to_string()),
            organization_address_lines: split_address(
                &optional_env("PAYSLIP_ORG_ADDRESS")
                    .unwrap_or_else(|| DEFAULT_ORG_ADDRESS.to_string()),
            ),
        };

        Ok(Config {
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            output_root: optional_env("PAYSLIP_OUTPUT_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join("payslips")),
            header_rows: parse_env("PAYSLIP_HEADER_ROWS", DEFAULT_HEADER_ROWS)?,
            concurrency: parse_env("PAYSLIP_CONCURRENCY", default_concurrency)?.max(1),
            fail_fast: parse_env("PAYSLIP_FAIL_FAST", false)?,
            net_policy: match optional_env("PAYSLIP_NET_POLICY").as_deref() {
                None => NetPolicy::default(),
                Some(p) => parse_net_policy(p)?,
            },
            max_upload_bytes: parse_env::<usize>("PAYSLIP_MAX_UPLOAD_MB", 10)? * 1024 * 1024,
            session_retention: retention_window(parse_env("PAYSLIP_RETENTION_HOURS", 24)?),
            theme,
        })
    }
}

/// Non-empty value of `key`, trimmed.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(v) => v
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{v}'")),
        None => Ok(default),
    }
}

fn parse_net_policy(value: &str) -> Result<NetPolicy> {
    match value.to_ascii_lowercase().as_str() {
        "trust" => Ok(NetPolicy::Trust),
        "verify" => Ok(NetPolicy::Verify),
        other => anyhow::bail!("PAYSLIP_NET_POLICY must be 'trust' or 'verify', got '{other}'"),
    }
}

/// Zero hours disables the sweep.
fn retention_window(hours: u64) -> Option<Duration> {
    (hours > 0).then(|| Duration::from_secs(hours * 60 * 60))
}

/// `"a | b||c"` → `["a", "b", "c"]`.
fn split_address(raw: &str) -> Vec<String> {
    raw.split('|')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
