// Payslip layout engine: themes, cursor-driven regions, PDF assembly.
// Rendering is CPU-bound and must run inside tokio::task::spawn_blocking.

pub mod canvas;
pub mod engine;
pub mod font_metrics;
pub mod regions;
pub mod theme;

// Re-export the public API consumed by the batch orchestrator and handlers.
pub use engine::{render_payslip, RenderedDocument};
pub use theme::{Palette, Theme};
