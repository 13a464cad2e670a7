use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ExportError;
use crate::face::AbGlyphFace;

/// Polices monospace courantes, essayées quand la police demandée est introuvable.
pub const FALLBACK_FONTS: &[&str] = &[
    "DejaVuSansMono.ttf",
    "LiberationMono-Regular.ttf",
    "NotoSansMono-Regular.ttf",
    "UbuntuMono-R.ttf",
    "FreeMono.otf",
    "FreeMono.ttf",
    "consola.ttf",
    "cour.ttf",
    "Menlo.ttc",
    "Courier New.ttf",
];

/// Maximum directory depth explored below each system font directory.
const MAX_SEARCH_DEPTH: usize = 4;

/// Serializable font handle: workers rebuild their own face from it.
#[derive(Clone, Debug, PartialEq)]
pub struct FontDescriptor {
    pub path: PathBuf,
    /// Pixel size.
    pub size: f32,
}

impl FontDescriptor {
    /// Read and parse the font file.
    ///
    /// # Errors
    /// Returns [`ExportError::FontParse`] if the file cannot be read or parsed.
    pub fn load(&self) -> Result<AbGlyphFace, ExportError> {
        let parse_error = |reason: String| ExportError::FontParse {
            path: self.path.clone(),
            reason,
        };
        let data = fs::read(&self.path).map_err(|e| parse_error(e.to_string()))?;
        AbGlyphFace::from_bytes(data, self.size).map_err(|e| parse_error(e.to_string()))
    }
}

/// One way of turning a configured font name into candidate paths.
#[derive(Clone, Debug, PartialEq)]
pub enum FontStrategy {
    /// The name as given, relative to the working directory or absolute.
    Direct,
    /// The name joined to a directory (config file or executable location).
    Beside(PathBuf),
    /// Recursive file-name search under system font directories.
    SystemDirectories(Vec<PathBuf>),
    /// Well-known monospace fonts searched under system font directories.
    Fallbacks(Vec<PathBuf>),
}

impl FontStrategy {
    /// Candidate paths for `filename`, in preference order.
    #[must_use]
    pub fn candidates(&self, filename: &str) -> Vec<PathBuf> {
        match self {
            Self::Direct => vec![PathBuf::from(filename)],
            Self::Beside(dir) => vec![dir.join(filename)],
            Self::SystemDirectories(dirs) => {
                let Some(name) = Path::new(filename).file_name() else {
                    return Vec::new();
                };
                let name = name.to_string_lossy().to_lowercase();
                dirs.iter()
                    .flat_map(|d| find_by_name(d, &name, MAX_SEARCH_DEPTH))
                    .collect()
            }
            Self::Fallbacks(dirs) => FALLBACK_FONTS
                .iter()
                .flat_map(|fallback| {
                    let name = fallback.to_lowercase();
                    dirs.iter()
                        .flat_map(move |d| find_by_name(d, &name, MAX_SEARCH_DEPTH))
                        .collect::<Vec<_>>()
                })
                .collect(),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Direct => "chemin direct",
            Self::Beside(_) => "dossier de configuration",
            Self::SystemDirectories(_) => "polices système",
            Self::Fallbacks(_) => "police de secours",
        }
    }
}

/// Répertoires de polices usuels de la plateforme courante.
#[must_use]
pub fn system_font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    let home = std::env::var_os("HOME").map(PathBuf::from);

    if cfg!(target_os = "windows") {
        let windir = std::env::var_os("WINDIR").map_or_else(|| PathBuf::from(r"C:\Windows"), PathBuf::from);
        dirs.push(windir.join("Fonts"));
        if let Some(local) = std::env::var_os("LOCALAPPDATA") {
            dirs.push(PathBuf::from(local).join(r"Microsoft\Windows\Fonts"));
        }
    } else if cfg!(target_os = "macos") {
        dirs.push(PathBuf::from("/System/Library/Fonts"));
        dirs.push(PathBuf::from("/Library/Fonts"));
        if let Some(h) = &home {
            dirs.push(h.join("Library/Fonts"));
        }
    } else {
        dirs.push(PathBuf::from("/usr/share/fonts"));
        dirs.push(PathBuf::from("/usr/local/share/fonts"));
        if let Some(h) = &home {
            dirs.push(h.join(".local/share/fonts"));
            dirs.push(h.join(".fonts"));
        }
    }
    dirs
}

/// Ordered strategies: direct path, beside each of `anchors`, system
/// directories, well-known fallbacks.
#[must_use]
pub fn default_strategies(anchors: &[PathBuf]) -> Vec<FontStrategy> {
    let system = system_font_dirs();
    let mut strategies = vec![FontStrategy::Direct];
    strategies.extend(anchors.iter().cloned().map(FontStrategy::Beside));
    strategies.push(FontStrategy::SystemDirectories(system.clone()));
    strategies.push(FontStrategy::Fallbacks(system));
    strategies
}

/// Résout la police : la première stratégie qui fournit un fichier lisible gagne.
///
/// # Errors
/// Returns [`ExportError::FontNotFound`] when every candidate is missing or
/// unparseable.
pub fn resolve_font(
    filename: &str,
    size: f32,
    strategies: &[FontStrategy],
) -> Result<FontDescriptor, ExportError> {
    let mut tried = 0usize;
    for strategy in strategies {
        for path in strategy.candidates(filename) {
            if !path.is_file() {
                continue;
            }
            tried += 1;
            let descriptor = FontDescriptor { path, size };
            match descriptor.load() {
                Ok(_) => {
                    if matches!(strategy, FontStrategy::Fallbacks(_)) {
                        log::warn!(
                            "Police {filename:?} introuvable, {} utilisée",
                            descriptor.path.display()
                        );
                    } else {
                        log::info!(
                            "Police chargée ({}) : {}",
                            strategy.label(),
                            descriptor.path.display()
                        );
                    }
                    return Ok(descriptor);
                }
                Err(e) => log::debug!("{e}"),
            }
        }
    }
    Err(ExportError::FontNotFound {
        requested: filename.to_string(),
        tried,
    })
}

/// Files named `name` (lowercase) below `dir`, depth-limited, sorted.
fn find_by_name(dir: &Path, name: &str, depth: usize) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let Ok(entries) = fs::read_dir(dir) else {
        return found;
    };
    let mut subdirs = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            subdirs.push(path);
        } else if path
            .file_name()
            .is_some_and(|f| f.to_string_lossy().to_lowercase() == name)
        {
            found.push(path);
        }
    }
    found.sort();
    if depth > 0 {
        subdirs.sort();
        for sub in subdirs {
            found.extend(find_by_name(&sub, name, depth - 1));
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beside_strategy_joins_directory() {
        let s = FontStrategy::Beside(PathBuf::from("/opt/glyph"));
        assert_eq!(s.candidates("Mono.ttf"), vec![PathBuf::from("/opt/glyph/Mono.ttf")]);
    }

    #[test]
    fn system_search_is_recursive_and_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("truetype").join("mono");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("Consolas.TTF"), b"x").unwrap();
        fs::write(dir.path().join("other.ttf"), b"x").unwrap();

        let s = FontStrategy::SystemDirectories(vec![dir.path().to_path_buf()]);
        let found = s.candidates("consolas.ttf");
        assert_eq!(found, vec![nested.join("Consolas.TTF")]);
    }

    #[test]
    fn unparseable_candidates_are_skipped_then_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Broken.ttf"), b"not a font").unwrap();
        let strategies = [
            FontStrategy::Beside(dir.path().to_path_buf()),
            FontStrategy::SystemDirectories(vec![dir.path().to_path_buf()]),
        ];
        match resolve_font("Broken.ttf", 15.0, &strategies) {
            Err(ExportError::FontNotFound { requested, tried }) => {
                assert_eq!(requested, "Broken.ttf");
                assert_eq!(tried, 2);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn missing_font_file_is_a_parse_error() {
        let descriptor = FontDescriptor {
            path: PathBuf::from("/definitely/not/here.ttf"),
            size: 12.0,
        };
        assert!(matches!(descriptor.load(), Err(ExportError::FontParse { .. })));
    }

    #[test]
    fn default_strategies_are_ordered() {
        let anchors = [PathBuf::from("/cfg")];
        let strategies = default_strategies(&anchors);
        assert_eq!(strategies[0], FontStrategy::Direct);
        assert_eq!(strategies[1], FontStrategy::Beside(PathBuf::from("/cfg")));
        assert!(matches!(strategies[2], FontStrategy::SystemDirectories(_)));
        assert!(matches!(strategies[3], FontStrategy::Fallbacks(_)));
    }
}
