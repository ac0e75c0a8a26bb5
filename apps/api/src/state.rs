use std::sync::Arc;

use crate::config::Config;
use crate::layout::Theme;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Default theme, built once at startup with the logo already decoded.
    /// A per-request palette override derives a new theme from this one.
    pub theme: Arc<Theme>,
}
