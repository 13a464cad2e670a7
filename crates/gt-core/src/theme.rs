use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::color::{self, Rgb};
use crate::error::CoreError;

/// Background names that always count as light, whatever their RGB value.
pub const KNOWN_LIGHT_BACKGROUNDS: &[&str] = &[
    "white",
    "#ffffff",
    "#fff",
    "lightgrey",
    "#d3d3d3",
    "ivory",
    "#f0f0f0",
];

/// Themes rendered when the configuration selects none.
pub const DEFAULT_SELECTION: &[&str] = &["dark", "original_dark_bg", "original_light_bg", "light"];

/// A named rendering palette.
///
/// # Example
/// ```
/// use gt_core::theme::ThemeTable;
/// let table = ThemeTable::builtin();
/// let light = table.get("light").unwrap();
/// assert!(light.is_light());
/// assert_eq!(light.foreground, Some((0, 0, 0)));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Theme {
    /// Table key, also used in output file names.
    pub name: String,
    /// Canvas fill color.
    pub background: Rgb,
    /// Background as written in the theme definition.
    pub background_name: String,
    /// Fixed glyph color. Required unless `uses_source_color`.
    pub foreground: Option<Rgb>,
    /// Draw every glyph with the color sampled from the source image.
    pub uses_source_color: bool,
    /// Per-channel multiplier in (0, 1] applied to sampled colors.
    pub darken: Option<f64>,
}

impl Theme {
    /// Build a theme from its serialized form.
    ///
    /// An out-of-range `darken` is dropped with a warning; a theme with
    /// neither a foreground nor source colors is kept but reported.
    ///
    /// # Errors
    /// Returns [`CoreError::UnknownColor`] if a color cannot be parsed.
    pub fn from_spec(name: &str, spec: &ThemeSpec) -> Result<Self, CoreError> {
        let background = color::parse_color(&spec.background)?;
        let foreground = spec
            .foreground
            .as_deref()
            .map(color::parse_color)
            .transpose()?;

        let darken = match spec.darken {
            Some(d) if d.is_finite() && d > 0.0 && d <= 1.0 => Some(d),
            Some(d) => {
                log::warn!("Thème '{name}' : darken {d} hors de (0, 1], ignoré");
                None
            }
            None => None,
        };

        if !spec.uses_source_color && foreground.is_none() {
            log::warn!("Thème '{name}' : aucune couleur de premier plan, blanc utilisé au rendu");
        }

        Ok(Self {
            name: name.to_string(),
            background,
            background_name: spec.background.trim().to_ascii_lowercase(),
            foreground,
            uses_source_color: spec.uses_source_color,
            darken,
        })
    }

    /// Serializable form, used for the resolved-config provenance file.
    #[must_use]
    pub fn to_spec(&self) -> ThemeSpec {
        ThemeSpec {
            background: self.background_name.clone(),
            foreground: self.foreground.map(color::to_hex),
            uses_source_color: self.uses_source_color,
            darken: self.darken,
        }
    }

    /// Whether glyph luminance should be inverted on this background.
    ///
    /// True if the background was named from the known-light set, or if its
    /// channel average exceeds 127.5.
    #[must_use]
    pub fn is_light(&self) -> bool {
        KNOWN_LIGHT_BACKGROUNDS.contains(&self.background_name.as_str())
            || color::channel_average(self.background) > 127.5
    }
}

/// Theme entry as written in `[themes.<name>]`.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ThemeSpec {
    /// `#rgb`, `#rrggbb` or a color name.
    pub background: String,
    /// Optional fixed glyph color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground: Option<String>,
    #[serde(default)]
    pub uses_source_color: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub darken: Option<f64>,
}

/// Name → theme lookup, pre-populated with the built-in palettes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ThemeTable {
    themes: BTreeMap<String, Theme>,
}

impl ThemeTable {
    /// The six built-in themes.
    #[must_use]
    pub fn builtin() -> Self {
        let fixed = |bg: &str, fg: &str| ThemeSpec {
            background: bg.to_string(),
            foreground: Some(fg.to_string()),
            uses_source_color: false,
            darken: None,
        };
        let source = |bg: &str, darken: Option<f64>| ThemeSpec {
            background: bg.to_string(),
            foreground: None,
            uses_source_color: true,
            darken,
        };

        let specs = [
            ("dark", fixed("black", "white")),
            ("green_term", fixed("black", "lime")),
            ("light", fixed("#f0f0f0", "black")),
            ("amber_term", fixed("#1c1c1c", "#FFBF00")),
            ("original_dark_bg", source("black", None)),
            ("original_light_bg", source("#f0f0f0", Some(0.7))),
        ];

        let mut table = Self::default();
        for (name, spec) in &specs {
            // Built-in colors are all parseable.
            if let Ok(theme) = Theme::from_spec(name, spec) {
                table.insert(theme);
            }
        }
        table
    }

    /// Add a theme, replacing any entry with the same name.
    pub fn insert(&mut self, theme: Theme) {
        self.themes.insert(theme.name.clone(), theme);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Theme> {
        self.themes.get(name)
    }

    /// Theme names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.themes.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.themes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
    }

    /// Resolve a selection of names, dropping unknown ones with a warning.
    ///
    /// Duplicates are kept once, in first-seen order.
    ///
    /// # Example
    /// ```
    /// use gt_core::theme::ThemeTable;
    /// let table = ThemeTable::builtin();
    /// let picked = table.select(&["light".to_string(), "nope".to_string(), "dark".to_string()]);
    /// let names: Vec<_> = picked.iter().map(|t| t.name.as_str()).collect();
    /// assert_eq!(names, ["light", "dark"]);
    /// ```
    #[must_use]
    pub fn select(&self, names: &[String]) -> Vec<Theme> {
        let mut selected: Vec<Theme> = Vec::with_capacity(names.len());
        for name in names {
            let name = name.trim();
            if selected.iter().any(|t| t.name == name) {
                continue;
            }
            match self.get(name) {
                Some(theme) => selected.push(theme.clone()),
                None => log::warn!("Thème inconnu '{name}', ignoré"),
            }
        }
        selected
    }
}
