//! Image sources for glyphtone: decoding, input scanning, resizing and
//! pixel-level pre-processing.

pub mod filter;
pub mod image;
pub mod pixelate;
pub mod resize;
pub mod scan;
