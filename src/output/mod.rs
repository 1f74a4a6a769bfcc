//! Diagnostic-stream formatting.
//!
//! The sampler never writes to stdout; progress lines, warnings and the run
//! summary go to stderr through the formatters in this module.

mod terminal;

pub use terminal::{format_draw_failure, format_progress, format_run_summary};
