use gt_core::color::{self, Rgb, WHITE};
use gt_core::frame::Cell;
use gt_core::theme::Theme;

/// How a theme colors its glyphs, resolved once per canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CellPaint {
    /// Sampled color, optionally darkened.
    Source { darken: Option<f64> },
    /// One color for every glyph.
    Fixed(Rgb),
}

impl CellPaint {
    /// Resolve the paint of `theme`. A theme with neither source colors nor
    /// a foreground paints white, reported here once.
    #[must_use]
    pub fn for_theme(theme: &Theme) -> Self {
        if theme.uses_source_color {
            return Self::Source { darken: theme.darken };
        }
        match theme.foreground {
            Some(fg) => Self::Fixed(fg),
            None => {
                log::warn!("Thème '{}' sans couleur de premier plan, blanc utilisé", theme.name);
                Self::Fixed(WHITE)
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn color(self, cell: &Cell) -> Rgb {
        match self {
            Self::Source { darken: Some(factor) } => color::scale(cell.color, factor),
            Self::Source { darken: None } => cell.color,
            Self::Fixed(rgb) => rgb,
        }
    }
}

/// Couleur finale d'une cellule sous un thème.
///
/// Source-colored themes return the sampled color, darkened when the theme
/// has a factor. Other themes return their foreground, or white when it is
/// missing. Silent; loops should hoist [`CellPaint::for_theme`] instead.
///
/// # Example
/// ```
/// use gt_ascii::color_map::resolve_color;
/// use gt_core::frame::Cell;
/// use gt_core::theme::ThemeTable;
/// let table = ThemeTable::builtin();
/// let cell = Cell { ch: '#', color: (200, 100, 10) };
/// assert_eq!(resolve_color(&cell, table.get("green_term").unwrap()), (0, 255, 0));
/// assert_eq!(resolve_color(&cell, table.get("original_dark_bg").unwrap()), (200, 100, 10));
/// assert_eq!(resolve_color(&cell, table.get("original_light_bg").unwrap()), (140, 70, 7));
/// ```
#[inline]
#[must_use]
pub fn resolve_color(cell: &Cell, theme: &Theme) -> Rgb {
    if theme.uses_source_color {
        return CellPaint::Source { darken: theme.darken }.color(cell);
    }
    theme.foreground.unwrap_or(WHITE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gt_core::theme::ThemeSpec;

    fn cell(color: Rgb) -> Cell {
        Cell { ch: '@', color }
    }

    #[test]
    fn fixed_foreground_ignores_sample() {
        let theme = Theme::from_spec(
            "amber",
            &ThemeSpec {
                background: "#1c1c1c".into(),
                foreground: Some("#FFBF00".into()),
                uses_source_color: false,
                darken: None,
            },
        )
        .unwrap();
        assert_eq!(resolve_color(&cell((1, 2, 3)), &theme), (255, 191, 0));
        assert_eq!(resolve_color(&cell((250, 250, 250)), &theme), (255, 191, 0));
    }

    #[test]
    fn missing_foreground_falls_back_to_white() {
        let theme = Theme::from_spec(
            "bare",
            &ThemeSpec {
                background: "black".into(),
                foreground: None,
                uses_source_color: false,
                darken: None,
            },
        )
        .unwrap();
        assert_eq!(resolve_color(&cell((10, 10, 10)), &theme), WHITE);
        assert_eq!(CellPaint::for_theme(&theme), CellPaint::Fixed(WHITE));
    }

    #[test]
    fn paint_matches_per_cell_resolution() {
        let table = gt_core::theme::ThemeTable::builtin();
        for name in ["dark", "light", "original_dark_bg", "original_light_bg"] {
            let theme = table.get(name).unwrap();
            let paint = CellPaint::for_theme(theme);
            for rgb in [(0, 0, 0), (255, 255, 255), (200, 100, 10)] {
                assert_eq!(paint.color(&cell(rgb)), resolve_color(&cell(rgb), theme));
            }
        }
    }

    #[test]
    fn darken_is_applied_per_channel() {
        let theme = Theme::from_spec(
            "dim",
            &ThemeSpec {
                background: "#f0f0f0".into(),
                foreground: None,
                uses_source_color: true,
                darken: Some(0.5),
            },
        )
        .unwrap();
        assert_eq!(resolve_color(&cell((255, 100, 0)), &theme), (127, 50, 0));
    }

    #[test]
    fn source_color_wins_over_foreground() {
        let theme = Theme::from_spec(
            "both",
            &ThemeSpec {
                background: "black".into(),
                foreground: Some("red".into()),
                uses_source_color: true,
                darken: None,
            },
        )
        .unwrap();
        assert_eq!(resolve_color(&cell((9, 9, 9)), &theme), (9, 9, 9));
    }
}
