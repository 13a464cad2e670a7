use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gt_core::config::{GlyphConfig, load_config};
use gt_export::output::{write_bytes_atomic, write_text_atomic};

use crate::layout::{RESOLVED_CONFIG_FILE, SOURCE_CONFIG_FILE};

/// Configuration in effect and the file it was read from, if any.
#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    pub config: GlyphConfig,
    pub source: Option<PathBuf>,
}

/// Charge la configuration, ou les valeurs par défaut si elle est absente ou invalide.
#[must_use]
pub fn resolve_config(path: &Path) -> ResolvedConfig {
    if !path.exists() {
        log::warn!(
            "Config introuvable ({}), valeurs par défaut utilisées",
            path.display()
        );
        return ResolvedConfig {
            config: GlyphConfig::default(),
            source: None,
        };
    }
    match load_config(path) {
        Ok(config) => {
            log::info!("Configuration chargée : {}", path.display());
            ResolvedConfig {
                config,
                source: Some(path.to_path_buf()),
            }
        }
        Err(e) => {
            log::error!("{e:#} ; valeurs par défaut utilisées");
            ResolvedConfig {
                config: GlyphConfig::default(),
                source: None,
            }
        }
    }
}

/// Write the resolved configuration, and a copy of its source file, at the
/// output root.
///
/// # Errors
/// Returns an error if serialization or any write fails.
pub fn write_provenance(root: &Path, config: &GlyphConfig, source: Option<&Path>) -> Result<()> {
    let resolved = config.to_toml_string()?;
    write_text_atomic(&resolved, &root.join(RESOLVED_CONFIG_FILE))?;

    if let Some(src) = source {
        let bytes = std::fs::read(src).with_context(|| format!("Impossible de lire {}", src.display()))?;
        write_bytes_atomic(&bytes, &root.join(SOURCE_CONFIG_FILE))?;
    }
    Ok(())
}
