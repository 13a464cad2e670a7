use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gt_core::error::CoreError;

/// Extensions image reconnues (comparaison insensible à la casse).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "tiff", "tif", "webp"];

/// Whether the batch came from a single file or a directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    File,
    Directory,
}

impl InputKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::File => "fichier",
            Self::Directory => "dossier",
        }
    }
}

/// Resolved batch input.
#[derive(Clone, Debug)]
pub struct ScannedInput {
    pub kind: InputKind,
    /// The path as given by the user.
    pub root: PathBuf,
    /// Images to process, sorted by path.
    pub images: Vec<PathBuf>,
}

/// True if the path has an allow-listed image extension.
///
/// # Example
/// ```
/// use gt_source::scan::is_supported;
/// use std::path::Path;
/// assert!(is_supported(Path::new("a/b/Photo.JPG")));
/// assert!(!is_supported(Path::new("notes.txt")));
/// assert!(!is_supported(Path::new("README")));
/// ```
#[must_use]
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            let e = e.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&e.as_str())
        })
}

/// Enumerate the images of a batch.
///
/// A file is a batch of one. A directory is scanned non-recursively and
/// its supported files are sorted by path.
///
/// # Errors
/// Fails if the path does not exist, a single file has an unsupported
/// extension, or the directory cannot be read.
pub fn scan_inputs(path: &Path) -> Result<ScannedInput> {
    if path.is_dir() {
        let mut images = Vec::new();
        for entry in fs::read_dir(path)
            .with_context(|| format!("Impossible de lire le dossier {}", path.display()))?
        {
            let entry = entry?;
            let p = entry.path();
            if p.is_file() && is_supported(&p) {
                images.push(p);
            } else {
                log::debug!("Ignoré : {}", p.display());
            }
        }
        images.sort();
        return Ok(ScannedInput {
            kind: InputKind::Directory,
            root: path.to_path_buf(),
            images,
        });
    }

    if path.is_file() {
        if !is_supported(path) {
            let format = path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or_default()
                .to_string();
            return Err(CoreError::UnsupportedFormat { format }.into());
        }
        return Ok(ScannedInput {
            kind: InputKind::File,
            root: path.to_path_buf(),
            images: vec![path.to_path_buf()],
        });
    }

    Err(CoreError::FileNotFound {
        path: path.display().to_string(),
    }
    .into())
}
