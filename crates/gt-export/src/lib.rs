//! Glyph rendering and file output for glyphtone.
//!
//! Resolves fonts, lays character grids out on a raster canvas and writes
//! the results to disk atomically.

pub mod error;
pub mod face;
pub mod font;
pub mod output;
pub mod rasterizer;

pub use error::ExportError;
pub use face::{AbGlyphFace, GlyphFace};
pub use font::{FontDescriptor, resolve_font};
pub use rasterizer::{CompositeOptions, composite};
