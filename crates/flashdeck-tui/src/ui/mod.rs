//! Terminal UI module using ratatui.
//!
//! - `render`: frame layout, the card with its slide animation, footer buttons
//! - `input`: keyboard and mouse handling
//! - `styles`: colors and text styling

pub mod input;
pub mod render;
pub mod styles;
