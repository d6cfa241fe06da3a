//! UI module for eugene-chat.
//!
//! This module contains all UI rendering logic including:
//! - Main UI layout and rendering
//! - Menu overlay
//! - Gradient utilities
//! - HTML to terminal text conversion

mod gradient;
mod menu;
mod render;
pub mod text;

pub use gradient::gradient_color;
pub use render::{chat_lines, ui};
