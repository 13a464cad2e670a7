//! Output tree naming.

use std::path::{Path, PathBuf};

use gt_core::config::PreFilter;
use gt_source::scan::{InputKind, ScannedInput};

/// Name of the resolved configuration written at the output root.
pub const RESOLVED_CONFIG_FILE: &str = "glyphtone.resolved.toml";
/// Name of the copied source configuration at the output root.
pub const SOURCE_CONFIG_FILE: &str = "glyphtone.source.toml";

/// File stem of an image, `"image"` if it has none.
#[must_use]
pub fn image_stem(path: &Path) -> String {
    path.file_stem()
        .map_or_else(|| "image".to_string(), |s| s.to_string_lossy().into_owned())
}

/// Root of an ASCII run.
///
/// Directory `D` → `<parent>/<D>_ascii_art_<W>`, file `F` →
/// `<dir>/<stem>_ascii_art_<W>w`.
#[must_use]
pub fn ascii_root(input: &ScannedInput, width: u32) -> PathBuf {
    match input.kind {
        InputKind::Directory => {
            let (parent, name) = split_dir(&input.root);
            parent.join(format!("{name}_ascii_art_{width}"))
        }
        InputKind::File => {
            file_dir(&input.root).join(format!("{}_ascii_art_{width}w", image_stem(&input.root)))
        }
    }
}

/// Root of a pixelate run: `<parent>/<D>_pixelated`, or the file's own directory.
#[must_use]
pub fn pixelate_root(input: &ScannedInput) -> PathBuf {
    match input.kind {
        InputKind::Directory => {
            let (parent, name) = split_dir(&input.root);
            parent.join(format!("{name}_pixelated"))
        }
        InputKind::File => file_dir(&input.root),
    }
}

/// `<stem>_ascii_<theme>_<W>w[_<tag>][_resized].png`
///
/// # Example
/// ```
/// use gt_app::layout::themed_file_name;
/// use gt_core::config::PreFilter;
/// let f = Some(PreFilter::Gaussian { sigma: 1.5 });
/// assert_eq!(themed_file_name("cat", "dark", 128, f.as_ref(), true), "cat_ascii_dark_128w_gauss1.5_resized.png");
/// assert_eq!(themed_file_name("cat", "light", 80, None, false), "cat_ascii_light_80w.png");
/// ```
#[must_use]
pub fn themed_file_name(stem: &str, theme: &str, width: u32, filter: Option<&PreFilter>, resized: bool) -> String {
    let mut name = format!("{stem}_ascii_{theme}_{width}w");
    if let Some(f) = filter {
        name.push('_');
        name.push_str(&f.tag());
    }
    if resized {
        name.push_str("_resized");
    }
    name.push_str(".png");
    name
}

#[must_use]
pub fn pixelated_file_name(stem: &str) -> String {
    format!("{stem}_pixelated.png")
}

fn file_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Parent and final component of a directory; `.` and trailing separators
/// are resolved against the working directory.
fn split_dir(dir: &Path) -> (PathBuf, String) {
    let absolute = std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf());
    let name = absolute
        .file_name()
        .map_or_else(|| "images".to_string(), |n| n.to_string_lossy().into_owned());
    let parent = absolute.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    (parent, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanned(kind: InputKind, root: &str) -> ScannedInput {
        ScannedInput {
            kind,
            root: PathBuf::from(root),
            images: Vec::new(),
        }
    }

    #[test]
    fn directory_root_sits_beside_the_directory() {
        let input = scanned(InputKind::Directory, "/data/photos");
        assert_eq!(ascii_root(&input, 128), PathBuf::from("/data/photos_ascii_art_128"));
        assert_eq!(pixelate_root(&input), PathBuf::from("/data/photos_pixelated"));
    }

    #[test]
    fn trailing_separator_is_ignored() {
        let input = scanned(InputKind::Directory, "/data/photos/");
        assert_eq!(ascii_root(&input, 64), PathBuf::from("/data/photos_ascii_art_64"));
    }

    #[test]
    fn file_root_is_next_to_the_file() {
        let input = scanned(InputKind::File, "/data/cat.jpg");
        assert_eq!(ascii_root(&input, 128), PathBuf::from("/data/cat_ascii_art_128w"));
        assert_eq!(pixelate_root(&input), PathBuf::from("/data"));

        let bare = scanned(InputKind::File, "cat.png");
        assert_eq!(ascii_root(&bare, 32), PathBuf::from("./cat_ascii_art_32w"));
    }

    #[test]
    fn median_tag_in_file_name() {
        let f = PreFilter::Median { kernel_size: 5 };
        assert_eq!(
            themed_file_name("a", "green_term", 100, Some(&f), false),
            "a_ascii_green_term_100w_median5.png"
        );
        assert_eq!(pixelated_file_name("a"), "a_pixelated.png");
        assert_eq!(image_stem(Path::new("/x/y/photo.final.webp")), "photo.final");
    }
}
