use anyhow::Result;
use gt_core::config::PreFilter;
use gt_core::frame::FrameBuffer;
use imageproc::filter::{gaussian_blur_f32, median_filter};

use crate::image::{from_rgb_image, to_rgb_image};

/// Blur a source image before sampling.
///
/// # Errors
/// Returns an error for invalid filter parameters or an inconsistent frame;
/// callers fall back to the unfiltered image.
///
/// # Example
/// ```
/// use gt_core::config::PreFilter;
/// use gt_core::frame::FrameBuffer;
/// use gt_source::filter::apply_pre_filter;
/// let src = FrameBuffer::filled(8, 8, (50, 50, 50));
/// let out = apply_pre_filter(&src, PreFilter::Median { kernel_size: 3 }).unwrap();
/// assert_eq!(out, src);
/// ```
pub fn apply_pre_filter(frame: &FrameBuffer, filter: PreFilter) -> Result<FrameBuffer> {
    let filter = filter.validate()?;
    let img = to_rgb_image(frame)?;
    let out = match filter {
        PreFilter::Gaussian { sigma } => gaussian_blur_f32(&img, sigma),
        PreFilter::Median { kernel_size } => {
            let r = kernel_size / 2;
            median_filter(&img, r, r)
        }
    };
    Ok(from_rgb_image(out))
}
