//! Shared utility functions.
//!
//! - `html`: escaping for the assistant page
//! - `format`: human-readable sizes and text previews

mod format;
mod html;

pub use format::{format_size, preview};
pub use html::html_escape;
