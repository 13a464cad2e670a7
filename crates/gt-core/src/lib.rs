//! Configuration, types, and shared structures for glyphtone.
//!
//! This crate contains the theme table, the character alphabet, the
//! frame/grid types and the configuration logic shared by every other
//! crate of the workspace.

pub mod charset;
pub mod color;
pub mod config;
pub mod error;
pub mod frame;
pub mod theme;

pub use charset::Alphabet;
pub use color::Rgb;
pub use config::GlyphConfig;
pub use error::CoreError;
pub use frame::{Cell, CharGrid, FrameBuffer};
pub use theme::{Theme, ThemeTable};
