use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::charset::{Alphabet, AlphabetOrder, DEFAULT_ALPHABET};
use crate::error::CoreError;
use crate::theme::{DEFAULT_SELECTION, Theme, ThemeSpec, ThemeTable};

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "glyphtone.toml";

/// Configuration complète d'un lot de rendu.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut saine.
///
/// # Example
/// ```
/// use gt_core::config::GlyphConfig;
/// let config = GlyphConfig::default();
/// assert_eq!(config.settings.output_width_chars, 128);
/// assert_eq!(config.settings.font_filename, "Consolas.ttf");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct GlyphConfig {
    pub settings: Settings,
    pub filter: FilterSettings,
    /// Custom entries added to (or overriding) the built-in theme table.
    #[serde(default)]
    pub themes: BTreeMap<String, ThemeSpec>,
}

/// `[settings]` section.
#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    // === Grille ===
    /// Columns of the character grid.
    pub output_width_chars: u32,
    /// Glyph alphabet as configured.
    pub alphabet: String,
    /// Direction in which `alphabet` is written.
    pub alphabet_order: AlphabetOrder,
    /// Row compression applied to the grid height (glyphs are taller than wide).
    pub char_aspect_correction: f32,

    // === Échantillonnage ===
    pub sampling: SamplingPolicy,
    pub index_policy: IndexPolicy,
    pub luminance: LuminanceFormula,

    // === Police ===
    /// File name or path of the TrueType/OpenType font.
    pub font_filename: String,
    /// Pixel size of the font.
    pub font_size: u32,

    // === Sortie ===
    /// Themes rendered for every image, in order.
    pub themes: Vec<String>,
    /// Rescale each canvas to the source aspect ratio.
    pub resize_output: bool,

    // === Performance ===
    /// Worker threads. 0 = available parallelism.
    pub workers: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_width_chars: 128,
            alphabet: DEFAULT_ALPHABET.to_string(),
            alphabet_order: AlphabetOrder::DarkToLight,
            char_aspect_correction: 0.5,
            sampling: SamplingPolicy::PointSample,
            index_policy: IndexPolicy::BackgroundAware,
            luminance: LuminanceFormula::Average,
            font_filename: "Consolas.ttf".to_string(),
            font_size: 15,
            themes: DEFAULT_SELECTION.iter().map(ToString::to_string).collect(),
            resize_output: true,
            workers: 0,
        }
    }
}

/// Where a cell's luminance comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum SamplingPolicy {
    /// Luminance of the pixel at the cell center.
    #[default]
    PointSample,
    /// Luminance of a box-filtered downscale to grid size.
    AveragedResize,
}

/// How luminance is turned into an alphabet index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum IndexPolicy {
    /// Invert luminance on light backgrounds.
    #[default]
    BackgroundAware,
    /// Always luminance-ascending.
    Fixed,
}

/// Grayscale conversion formula.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum LuminanceFormula {
    /// (R + G + B) / 3
    #[default]
    Average,
    /// 0.299 R + 0.587 G + 0.114 B
    Rec601,
}

/// `[filter]` section.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct FilterSettings {
    pub enabled: bool,
    pub kind: FilterKind,
    /// Gaussian sigma.
    pub radius: f32,
    /// Median window side, odd.
    pub kernel_size: u32,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            kind: FilterKind::Gaussian,
            radius: 1.0,
            kernel_size: 3,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    #[default]
    Gaussian,
    Median,
}

/// Blur applied once per source image before sampling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PreFilter {
    Gaussian { sigma: f32 },
    Median { kernel_size: u32 },
}

impl PreFilter {
    /// Check the filter parameters.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] for a non-positive or non-finite sigma,
    /// or a kernel that is even or smaller than 3.
    pub fn validate(self) -> Result<Self, CoreError> {
        match self {
            Self::Gaussian { sigma } if !(sigma.is_finite() && sigma > 0.0) => Err(
                CoreError::Config(format!("sigma gaussien invalide : {sigma}")),
            ),
            Self::Median { kernel_size } if kernel_size < 3 || kernel_size % 2 == 0 => Err(
                CoreError::Config(format!("noyau médian invalide : {kernel_size}")),
            ),
            ok => Ok(ok),
        }
    }

    /// Suffix inserted in output file names, e.g. `gauss1.5` or `median3`.
    ///
    /// # Example
    /// ```
    /// use gt_core::config::PreFilter;
    /// assert_eq!(PreFilter::Gaussian { sigma: 1.5 }.tag(), "gauss1.5");
    /// assert_eq!(PreFilter::Median { kernel_size: 5 }.tag(), "median5");
    /// ```
    #[must_use]
    pub fn tag(&self) -> String {
        match self {
            Self::Gaussian { sigma } => format!("gauss{sigma}"),
            Self::Median { kernel_size } => format!("median{kernel_size}"),
        }
    }
}

impl GlyphConfig {
    /// Replace every invalid field by its default, with a warning.
    pub fn sanitize(&mut self) {
        let defaults = Settings::default();
        let s = &mut self.settings;

        if s.output_width_chars == 0 {
            log::warn!(
                "output_width_chars doit être > 0, valeur par défaut {}",
                defaults.output_width_chars
            );
            s.output_width_chars = defaults.output_width_chars;
        }
        if s.font_size == 0 {
            log::warn!("font_size doit être > 0, valeur par défaut {}", defaults.font_size);
            s.font_size = defaults.font_size;
        }
        if s.font_filename.trim().is_empty() {
            log::warn!("font_filename vide, valeur par défaut {}", defaults.font_filename);
            s.font_filename = defaults.font_filename;
        }
        if s.alphabet.is_empty() {
            log::warn!("alphabet vide, alphabet par défaut {DEFAULT_ALPHABET:?}");
            s.alphabet = defaults.alphabet;
        }
        if !(s.char_aspect_correction.is_finite() && s.char_aspect_correction > 0.0) {
            log::warn!(
                "char_aspect_correction {} invalide, valeur par défaut {}",
                s.char_aspect_correction,
                defaults.char_aspect_correction
            );
            s.char_aspect_correction = defaults.char_aspect_correction;
        }

        if self.filter.enabled
            && let Err(e) = self.filter.as_pre_filter().validate()
        {
            log::warn!("{e} ; filtre désactivé");
            self.filter.enabled = false;
        }
    }

    /// Alphabet in drawing order.
    ///
    /// # Errors
    /// Returns [`CoreError::EmptyAlphabet`] if the alphabet string is empty.
    pub fn alphabet(&self) -> Result<Alphabet, CoreError> {
        Alphabet::new(&self.settings.alphabet, self.settings.alphabet_order)
    }

    /// Built-in themes plus the `[themes.*]` entries of this config.
    ///
    /// Entries with unparseable colors are skipped with a warning.
    #[must_use]
    pub fn theme_table(&self) -> ThemeTable {
        let mut table = ThemeTable::builtin();
        for (name, spec) in &self.themes {
            match Theme::from_spec(name, spec) {
                Ok(theme) => table.insert(theme),
                Err(e) => log::warn!("Thème '{name}' ignoré : {e}"),
            }
        }
        table
    }

    /// Themes selected by `settings.themes`, unknown names dropped.
    #[must_use]
    pub fn selected_themes(&self) -> Vec<Theme> {
        self.theme_table().select(&self.settings.themes)
    }

    /// The active pre-filter, if enabled and valid.
    #[must_use]
    pub fn pre_filter(&self) -> Option<PreFilter> {
        if !self.filter.enabled {
            return None;
        }
        self.filter.as_pre_filter().validate().ok()
    }

    /// Serialize to TOML, used for the resolved-config provenance file.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Erreur de sérialisation TOML")
    }
}

impl FilterSettings {
    #[must_use]
    pub fn as_pre_filter(&self) -> PreFilter {
        match self.kind {
            FilterKind::Gaussian => PreFilter::Gaussian { sigma: self.radius },
            FilterKind::Median => PreFilter::Median {
                kernel_size: self.kernel_size,
            },
        }
    }
}

/// Structure TOML intermédiaire : chaque section reste une table brute,
/// convertie clé par clé pour qu'une valeur invalide n'invalide pas le reste.
#[derive(Deserialize)]
struct ConfigFile {
    settings: Option<toml::Table>,
    filter: Option<toml::Table>,
    themes: Option<toml::Table>,
}

/// Typed value of `section.key`, `None` if absent or of the wrong type.
fn field<T: DeserializeOwned>(table: &toml::Table, section: &str, key: &str) -> Option<T> {
    let value = table.get(key)?;
    let parsed: Result<T, toml::de::Error> = value.clone().try_into();
    match parsed {
        Ok(v) => Some(v),
        Err(e) => {
            log::warn!("[{section}] {key} = {value} invalide ({e}), valeur par défaut conservée");
            None
        }
    }
}

fn merge<T: DeserializeOwned>(slot: &mut T, table: &toml::Table, section: &str, key: &str) {
    if let Some(v) = field(table, section, key) {
        *slot = v;
    }
}

/// Parse TOML text and merge it over the defaults.
///
/// Values of the wrong type fall back to their default one by one, with a
/// warning; [`GlyphConfig::sanitize`] then checks ranges.
///
/// # Errors
/// Returns an error if the text is not valid TOML or a section is not a table.
pub fn parse_config(content: &str) -> Result<GlyphConfig> {
    let file: ConfigFile = toml::from_str(content).context("Erreur de parsing TOML")?;

    let mut config = GlyphConfig::default();

    if let Some(t) = file.settings {
        let c = &mut config.settings;
        let section = "settings";
        merge(&mut c.output_width_chars, &t, section, "output_width_chars");
        merge(&mut c.font_filename, &t, section, "font_filename");
        merge(&mut c.font_size, &t, section, "font_size");
        merge(&mut c.themes, &t, section, "themes");
        merge(&mut c.alphabet, &t, section, "alphabet");
        merge(&mut c.alphabet_order, &t, section, "alphabet_order");
        merge(&mut c.char_aspect_correction, &t, section, "char_aspect_correction");
        merge(&mut c.resize_output, &t, section, "resize_output");
        merge(&mut c.sampling, &t, section, "sampling");
        merge(&mut c.index_policy, &t, section, "index_policy");
        merge(&mut c.luminance, &t, section, "luminance");
        merge(&mut c.workers, &t, section, "workers");
    }

    if let Some(t) = file.filter {
        let c = &mut config.filter;
        merge(&mut c.enabled, &t, "filter", "enabled");
        merge(&mut c.kind, &t, "filter", "kind");
        merge(&mut c.radius, &t, "filter", "radius");
        merge(&mut c.kernel_size, &t, "filter", "kernel_size");
    }

    if let Some(t) = file.themes {
        for name in t.keys() {
            if let Some(spec) = field::<ThemeSpec>(&t, "themes", name) {
                config.themes.insert(name.clone(), spec);
            }
        }
    }

    config.sanitize();
    Ok(config)
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use gt_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("glyphtone.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<GlyphConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Configuration invalide dans {}", path.display()))
}
