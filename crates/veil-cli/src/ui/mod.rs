//! UI primitives for the Veil CLI.
//!
//! This module provides:
//! - **Context**: Environment detection (TTY, width, color, unicode)
//! - **Mode**: Output mode resolution (json, plain, pretty)
//! - **Theme**: Badge tokens, color palette, symbols
//! - **Render**: Tables, headers, hints, error lines
//! - **Prompt**: Interactive secret selection
//! - **Terminal**: Raw-mode and alternate-screen guards

mod context;
mod mode;
pub mod prompt;
pub mod render;
pub mod terminal;
pub mod theme;

pub use context::UiContext;
pub use theme::Badge;

pub use render::{badge, header, hint, kv, print_error, simple_table, Column};
