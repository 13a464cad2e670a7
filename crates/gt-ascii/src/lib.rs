//! Image to character-grid conversion for glyphtone.
//!
//! Samples pixel frames into luminance-indexed character grids and
//! resolves the draw color of every cell under a theme.

pub mod color_map;
pub mod sampler;

pub use color_map::{CellPaint, resolve_color};
pub use sampler::{SampleOptions, sample};
