use anyhow::{Context, Result, ensure};
use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use gt_core::frame::FrameBuffer;

/// Resampling kernel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResizeFilter {
    /// High-quality kernel for the final aspect rescale.
    Lanczos3,
    /// Area average, used to box-filter images down to grid size.
    Box,
    /// Nearest neighbour, for hard pixel edges.
    Nearest,
}

impl ResizeFilter {
    fn algorithm(self) -> ResizeAlg {
        match self {
            Self::Lanczos3 => ResizeAlg::Convolution(FilterType::Lanczos3),
            Self::Box => ResizeAlg::Convolution(FilterType::Box),
            Self::Nearest => ResizeAlg::Nearest,
        }
    }
}

/// Resize a raw RGB8 buffer.
///
/// # Errors
/// Returns an error if a dimension is zero or the buffer does not match
/// `src_width * src_height * 3`.
pub fn resize_rgb(
    data: Vec<u8>,
    src_width: u32,
    src_height: u32,
    width: u32,
    height: u32,
    filter: ResizeFilter,
) -> Result<Vec<u8>> {
    ensure!(
        src_width > 0 && src_height > 0 && width > 0 && height > 0,
        "Dimensions nulles : {src_width}×{src_height} → {width}×{height}"
    );
    if src_width == width && src_height == height {
        return Ok(data);
    }

    let src = Image::from_vec_u8(src_width, src_height, data, PixelType::U8x3)
        .context("Invalid source dimensions")?;
    let mut dst = Image::new(width, height, PixelType::U8x3);

    let options = ResizeOptions::new().resize_alg(filter.algorithm());
    Resizer::new()
        .resize(&src, &mut dst, Some(&options))
        .context("Resize failed")?;

    Ok(dst.into_vec())
}

/// Resize a frame to `width × height`.
///
/// # Errors
/// Returns an error if the resize operation fails.
///
/// # Example
/// ```
/// use gt_source::resize::{resize_frame, ResizeFilter};
/// use gt_core::frame::FrameBuffer;
/// let src = FrameBuffer::new(100, 100);
/// let dst = resize_frame(&src, 50, 25, ResizeFilter::Lanczos3).unwrap();
/// assert_eq!((dst.width, dst.height), (50, 25));
/// ```
pub fn resize_frame(
    src: &FrameBuffer,
    width: u32,
    height: u32,
    filter: ResizeFilter,
) -> Result<FrameBuffer> {
    let data = resize_rgb(src.data.clone(), src.width, src.height, width, height, filter)?;
    Ok(FrameBuffer::from_raw(width, height, data)?)
}
