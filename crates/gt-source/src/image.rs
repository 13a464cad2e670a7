use std::path::Path;

use anyhow::{Context, Result};
use gt_core::frame::FrameBuffer;
use image::RgbImage;

/// Décode une image depuis le disque en RGB 8 bits.
///
/// Alpha is dropped; paletted and 16-bit inputs are converted.
///
/// # Errors
/// Returns an error if the file cannot be opened or decoded.
///
/// # Example
/// ```no_run
/// use gt_source::image::load_image;
/// use std::path::Path;
/// let frame = load_image(Path::new("photo.png")).unwrap();
/// ```
pub fn load_image(path: &Path) -> Result<FrameBuffer> {
    let img = image::open(path)
        .with_context(|| format!("Impossible de charger {}", path.display()))?;
    Ok(from_rgb_image(img.to_rgb8()))
}

/// Take ownership of an `RgbImage` buffer.
#[must_use]
pub fn from_rgb_image(img: RgbImage) -> FrameBuffer {
    let (width, height) = img.dimensions();
    FrameBuffer {
        data: img.into_raw(),
        width,
        height,
    }
}

/// Copy a frame into an `RgbImage`.
///
/// # Errors
/// Returns an error if the frame's buffer does not match its dimensions.
pub fn to_rgb_image(frame: &FrameBuffer) -> Result<RgbImage> {
    RgbImage::from_raw(frame.width, frame.height, frame.data.clone()).with_context(|| {
        format!(
            "Buffer incohérent : {} octets pour {}×{}",
            frame.data.len(),
            frame.width,
            frame.height
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_png_and_drop_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("px.png");
        let mut img = image::RgbaImage::new(2, 1);
        img.put_pixel(0, 0, image::Rgba([10, 20, 30, 0]));
        img.put_pixel(1, 0, image::Rgba([200, 100, 50, 255]));
        img.save(&path).unwrap();

        let frame = load_image(&path).unwrap();
        assert_eq!((frame.width, frame.height), (2, 1));
        assert_eq!(frame.try_pixel(0, 0), Some((10, 20, 30)));
        assert_eq!(frame.try_pixel(1, 0), Some((200, 100, 50)));
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        assert!(load_image(&path).is_err());
        assert!(load_image(&dir.path().join("missing.png")).is_err());
    }

    #[test]
    fn rgb_image_conversion_preserves_pixels() {
        let frame = FrameBuffer::filled(3, 2, (7, 8, 9));
        let img = to_rgb_image(&frame).unwrap();
        assert_eq!(img.get_pixel(2, 1).0, [7, 8, 9]);
        assert_eq!(from_rgb_image(img), frame);
    }

    #[test]
    fn inconsistent_frame_is_rejected() {
        let frame = FrameBuffer {
            data: vec![0; 4],
            width: 2,
            height: 2,
        };
        assert!(to_rgb_image(&frame).is_err());
    }
}
