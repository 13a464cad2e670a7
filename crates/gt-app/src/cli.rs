use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use gt_core::config::{DEFAULT_CONFIG_FILE, GlyphConfig};

/// glyphtone : rendu par lots d'images en ASCII art thématique.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Image ou dossier d'images. Demandé sur l'entrée standard si absent.
    pub input: Option<PathBuf>,

    /// Fichier de configuration TOML.
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Largeur de la grille en caractères.
    #[arg(long)]
    pub width: Option<u32>,

    /// Police TrueType/OpenType (nom ou chemin).
    #[arg(long)]
    pub font: Option<String>,

    /// Taille de police en pixels.
    #[arg(long)]
    pub font_size: Option<u32>,

    /// Thèmes à rendre, séparés par des virgules.
    #[arg(long, value_delimiter = ',')]
    pub themes: Option<Vec<String>>,

    /// Nombre de workers (0 = parallélisme disponible).
    #[arg(long)]
    pub workers: Option<usize>,

    /// Ne pas redimensionner la sortie au ratio de l'image source.
    #[arg(long, default_value_t = false)]
    pub no_resize: bool,

    /// Mode pixelisation : taille de bloc en pixels, aucun rendu ASCII.
    #[arg(long, value_name = "BLOCK")]
    pub pixelate: Option<u32>,

    /// Écrire aussi la grille en texte (.txt) à côté de chaque PNG.
    #[arg(long, default_value_t = false)]
    pub emit_text: bool,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    /// Apply command-line overrides on top of the file configuration, then
    /// re-sanitize so invalid flag values fall back like file values do.
    pub fn apply_overrides(&self, config: &mut GlyphConfig) {
        let s = &mut config.settings;
        if let Some(width) = self.width {
            s.output_width_chars = width;
        }
        if let Some(ref font) = self.font {
            s.font_filename.clone_from(font);
        }
        if let Some(size) = self.font_size {
            s.font_size = size;
        }
        if let Some(ref themes) = self.themes {
            s.themes.clone_from(themes);
        }
        if let Some(workers) = self.workers {
            s.workers = workers;
        }
        if self.no_resize {
            s.resize_output = false;
        }
        config.sanitize();
    }
}

/// Demande un chemin jusqu'à obtenir un chemin existant.
///
/// Surrounding whitespace and quotes (as left by drag-and-drop) are
/// stripped. Empty answers and nonexistent paths re-prompt. Returns
/// `Ok(None)` on end of input.
///
/// # Errors
/// Returns an error if reading `input` or writing `output` fails.
pub fn prompt_input<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> std::io::Result<Option<PathBuf>> {
    let mut line = String::new();
    loop {
        write!(output, "Chemin d'une image ou d'un dossier : ")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let answer = line.trim().trim_matches(|c| c == '\'' || c == '"');
        if answer.is_empty() {
            continue;
        }
        let path = PathBuf::from(answer);
        if path.exists() {
            return Ok(Some(path));
        }
        writeln!(output, "Introuvable : {}", path.display())?;
    }
}
