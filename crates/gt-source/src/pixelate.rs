use anyhow::{Result, ensure};
use gt_core::frame::FrameBuffer;

use crate::resize::{ResizeFilter, resize_frame};

/// Pixelise une image : réduction nearest-neighbour par blocs puis
/// agrandissement à la taille d'origine.
///
/// The reduced size is `max(1, w / block) × max(1, h / block)`.
///
/// # Errors
/// Returns an error if `block` is zero or the frame is empty.
///
/// # Example
/// ```
/// use gt_core::frame::FrameBuffer;
/// use gt_source::pixelate::pixelate;
/// let src = FrameBuffer::filled(16, 8, (10, 20, 30));
/// let out = pixelate(&src, 4).unwrap();
/// assert_eq!((out.width, out.height), (16, 8));
/// ```
pub fn pixelate(frame: &FrameBuffer, block: u32) -> Result<FrameBuffer> {
    ensure!(block > 0, "La taille de bloc doit être > 0");
    ensure!(
        !frame.is_empty(),
        "Image vide : {}×{}",
        frame.width,
        frame.height
    );

    let small_w = (frame.width / block).max(1);
    let small_h = (frame.height / block).max(1);
    let small = resize_frame(frame, small_w, small_h, ResizeFilter::Nearest)?;
    resize_frame(&small, frame.width, frame.height, ResizeFilter::Nearest)
}
