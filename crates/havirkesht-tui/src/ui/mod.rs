//! Terminal UI module using ratatui.
//!
//! - `render`: Main frame rendering, layout and overlays
//! - `input`: Keyboard event handling
//! - `styles`: Color scheme and text styling
//! - `tabs`: Dashboard and resource list rendering

pub mod input;
pub mod render;
pub mod styles;
pub mod tabs;
