use std::io::{Cursor, Write};
use std::path::Path;

use image::{ImageFormat, RgbImage};
use tempfile::NamedTempFile;

use crate::error::ExportError;

/// Encode en PNG en mémoire puis écrit de façon atomique.
///
/// # Errors
/// Returns [`ExportError::Encode`] if encoding fails, [`ExportError::Write`]
/// if the file cannot be written.
pub fn write_png_atomic(img: &RgbImage, path: &Path) -> Result<(), ExportError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| ExportError::Encode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    write_bytes_atomic(&buf, path)
}

/// Write UTF-8 text atomically.
///
/// # Errors
/// Returns [`ExportError::Write`] if the file cannot be written.
pub fn write_text_atomic(text: &str, path: &Path) -> Result<(), ExportError> {
    write_bytes_atomic(text.as_bytes(), path)
}

/// Whole buffer to a temporary file in the target directory, then renamed
/// over `path`. Readers never observe a partial file.
///
/// # Errors
/// Returns [`ExportError::Write`] on any I/O failure.
pub fn write_bytes_atomic(bytes: &[u8], path: &Path) -> Result<(), ExportError> {
    let write_err = |source: std::io::Error| ExportError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let img = RgbImage::from_pixel(3, 2, image::Rgb([1, 2, 3]));
        write_png_atomic(&img, &path).unwrap();

        let back = image::open(&path).unwrap().to_rgb8();
        assert_eq!(back, img);
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn text_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.txt");
        std::fs::write(&path, "old").unwrap();
        write_text_atomic("@@\n..\n", &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "@@\n..\n");
    }

    #[test]
    fn missing_directory_is_a_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent").join("x.txt");
        assert!(matches!(
            write_text_atomic("x", &path),
            Err(ExportError::Write { .. })
        ));
    }
}
