use thiserror::Error;

/// Errors originating from the core module.
#[derive(Error, Debug, PartialEq)]
pub enum CoreError {
    /// Invalid configuration value or structure.
    #[error("Configuration invalide : {0}")]
    Config(String),

    /// Referenced file does not exist.
    #[error("Fichier introuvable : {path}")]
    FileNotFound {
        /// Path that was not found.
        path: String,
    },

    /// Unsupported file or data format.
    #[error("Format non supporté : {format}")]
    UnsupportedFormat {
        /// The format string that is unsupported.
        format: String,
    },

    /// Image or grid dimensions that make sampling meaningless.
    #[error("Image invalide : {width}×{height} échantillonnée sur {columns} colonnes")]
    InvalidImage {
        /// Width value.
        width: u32,
        /// Height value.
        height: u32,
        /// Requested grid width.
        columns: u32,
    },

    /// A color string that is neither a known name nor a hex triplet.
    #[error("Couleur inconnue : {0:?}")]
    UnknownColor(String),

    /// Alphabet without any glyph.
    #[error("L'alphabet doit contenir au moins un caractère")]
    EmptyAlphabet,
}
