use std::path::PathBuf;

use thiserror::Error;

/// Errors originating from font handling and output writing.
#[derive(Error, Debug)]
pub enum ExportError {
    /// No strategy produced a loadable font.
    #[error("Aucune police utilisable pour {requested:?} ({tried} chemins essayés)")]
    FontNotFound {
        /// Font file name as configured.
        requested: String,
        /// Number of candidate paths examined.
        tried: usize,
    },

    /// A font file exists but could not be parsed.
    #[error("Police invalide {path} : {reason}")]
    FontParse {
        path: PathBuf,
        reason: String,
    },

    /// The font has no glyph for a character.
    #[error("Glyphe absent : {0:?}")]
    MissingGlyph(char),

    /// Image encoding failed.
    #[error("Encodage impossible pour {path} : {reason}")]
    Encode {
        path: PathBuf,
        reason: String,
    },

    /// Filesystem error while writing an output.
    #[error("Écriture impossible vers {path} : {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
