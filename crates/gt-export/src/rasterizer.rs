use std::collections::HashSet;

use gt_ascii::color_map::CellPaint;
use gt_core::color::Rgb;
use gt_core::frame::CharGrid;
use gt_core::theme::Theme;
use gt_source::resize::{ResizeFilter, resize_rgb};
use image::{Rgb as RgbPixel, RgbImage};

use crate::face::GlyphFace;

/// Texte de référence pour la hauteur de ligne (jambages haut et bas).
pub const LINE_HEIGHT_PROBE: &str = "|M_g(`";

/// Extra pixels between two text rows.
const LINE_GAP: f32 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompositeOptions {
    /// Rescale the canvas to the source aspect ratio, width fixed.
    pub resize_output: bool,
}

impl Default for CompositeOptions {
    fn default() -> Self {
        Self {
            resize_output: true,
        }
    }
}

/// Canvas geometry derived from the font and the grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Layout {
    pub line_height: f32,
    pub line_spacing: f32,
    pub text_width: f32,
    /// Uniform cell advance; exact for monospace faces only.
    pub char_width: f32,
    pub canvas_width: u32,
    pub canvas_height: u32,
}

/// Mesure la grille avec la police donnée.
///
/// Line height comes from [`LINE_HEIGHT_PROBE`]. Text width spans the first
/// grid row from the pen origin to the further of its last advance and its
/// ink, falling back to `font_size * columns`.
#[must_use]
pub fn measure_layout(grid: &CharGrid, face: &dyn GlyphFace) -> Layout {
    let font_size = face.font_size();
    let columns = grid.width.max(1);

    let line_height = face.ink_bounds(LINE_HEIGHT_PROBE).map_or(0.0, |b| b.height());
    let line_spacing = if line_height > 0.0 {
        line_height + LINE_GAP
    } else {
        font_size + LINE_GAP
    };

    // Blank cells have no ink but still occupy their advance.
    let first_row = grid.row_text(0);
    let advance = face.advance_width(&first_row);
    let mut text_width = match face.ink_bounds(&first_row) {
        Some(ink) => ink.max_x.max(advance) - ink.min_x.min(0.0),
        None => advance,
    };
    if text_width <= 0.0 {
        text_width = font_size * columns as f32;
    }

    let canvas_width = (text_width.ceil() as u32).max(1);
    let canvas_height = ((line_spacing * grid.height as f32).ceil() as u32).max(1);

    Layout {
        line_height,
        line_spacing,
        text_width,
        char_width: text_width / columns as f32,
        canvas_width,
        canvas_height,
    }
}

/// Dessine la grille sur un nouveau canevas, fond du thème.
///
/// Cells are drawn row-major at `(floor(col * char_width), row * line_spacing)`
/// with the theme's [`CellPaint`], resolved once per canvas. A glyph the
/// face cannot draw is skipped. When `options.resize_output` is set and
/// `original_size` is valid, the canvas is rescaled with Lanczos3 to
/// `(width, max(1, round(width * h / w)))`.
#[must_use]
pub fn composite(
    grid: &CharGrid,
    theme: &Theme,
    face: &dyn GlyphFace,
    original_size: Option<(u32, u32)>,
    options: &CompositeOptions,
) -> RgbImage {
    let layout = measure_layout(grid, face);
    let bg = theme.background;
    let mut canvas =
        RgbImage::from_pixel(layout.canvas_width, layout.canvas_height, RgbPixel([bg.0, bg.1, bg.2]));

    let paint = CellPaint::for_theme(theme);
    let mut reported: HashSet<char> = HashSet::new();
    for (row, cells) in grid.rows().enumerate() {
        let top = row as f32 * layout.line_spacing;
        for (col, cell) in cells.iter().enumerate() {
            let left = (col as f32 * layout.char_width).floor();
            let color = paint.color(cell);
            let drawn = face.draw_glyph(cell.ch, left, top, &mut |x, y, coverage| {
                blend(&mut canvas, x, y, color, coverage);
            });
            if let Err(e) = drawn
                && reported.insert(cell.ch)
            {
                log::warn!("{e} (ligne {row}, colonne {col}), ignoré");
            }
        }
    }

    if !options.resize_output {
        return canvas;
    }
    match original_size {
        Some((w, h)) if w > 0 && h > 0 => rescale_to_aspect(canvas, w, h),
        _ => {
            log::warn!("Taille d'origine invalide ou absente, redimensionnement ignoré");
            canvas
        }
    }
}

fn blend(canvas: &mut RgbImage, x: i32, y: i32, color: Rgb, coverage: f32) {
    let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
        return;
    };
    if x >= canvas.width() || y >= canvas.height() {
        return;
    }
    let a = coverage.clamp(0.0, 1.0);
    let px = canvas.get_pixel_mut(x, y);
    let mix = |under: u8, over: u8| (f32::from(over) * a + f32::from(under) * (1.0 - a)).round() as u8;
    px.0 = [
        mix(px.0[0], color.0),
        mix(px.0[1], color.1),
        mix(px.0[2], color.2),
    ];
}

fn rescale_to_aspect(canvas: RgbImage, orig_w: u32, orig_h: u32) -> RgbImage {
    let (width, height) = canvas.dimensions();
    let target_h = ((f64::from(width) * f64::from(orig_h) / f64::from(orig_w)).round() as u32).max(1);
    if target_h == height {
        return canvas;
    }
    match resize_rgb(
        canvas.as_raw().clone(),
        width,
        height,
        width,
        target_h,
        ResizeFilter::Lanczos3,
    )
    .and_then(|data| {
        RgbImage::from_raw(width, target_h, data)
            .ok_or_else(|| anyhow::anyhow!("buffer redimensionné incohérent"))
    }) {
        Ok(resized) => {
            log::debug!("Canevas {width}×{height} → {width}×{target_h}");
            resized
        }
        Err(e) => {
            log::warn!("Redimensionnement impossible ({e:#}), taille de rendu conservée");
            canvas
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::face::BlockFace;
    use gt_core::frame::Cell;
    use gt_core::theme::ThemeTable;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn face() -> BlockFace {
        BlockFace {
            cell_width: 4.0,
            cell_height: 6.0,
        }
    }

    fn theme(name: &str) -> Theme {
        ThemeTable::builtin().get(name).unwrap().clone()
    }

    fn grid(rows: &[&str]) -> CharGrid {
        let width = rows[0].chars().count() as u32;
        let mut g = CharGrid::new(width, rows.len() as u32);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                g.set(x as u32, y as u32, Cell { ch, color: (200, 40, 40) });
            }
        }
        g
    }

    #[test]
    fn layout_uses_probe_and_first_row() {
        let layout = measure_layout(&grid(&["@@@", "..."]), &face());
        assert!((layout.line_height - 6.0).abs() < f32::EPSILON);
        assert!((layout.line_spacing - 8.0).abs() < f32::EPSILON);
        assert!((layout.char_width - 4.0).abs() < f32::EPSILON);
        assert_eq!((layout.canvas_width, layout.canvas_height), (12, 16));
    }

    #[test]
    fn blank_edge_cells_keep_their_width() {
        let g = grid(&["  @@  ", "@@@@@@"]);
        let layout = measure_layout(&g, &face());
        assert_eq!(layout.canvas_width, 24);
        assert!((layout.char_width - 4.0).abs() < f32::EPSILON);

        let img = composite(
            &g,
            &theme("dark"),
            &face(),
            None,
            &CompositeOptions {
                resize_output: false,
            },
        );
        // Dernière colonne de la deuxième ligne, entièrement dessinée.
        assert_eq!(img.get_pixel(23, 9).0, [255, 255, 255]);
        assert_eq!(img.get_pixel(1, 1).0, [0, 0, 0]);
    }

    #[test]
    fn blank_first_row_falls_back_to_advances() {
        let layout = measure_layout(&grid(&["    ", "@@@@"]), &face());
        assert!((layout.text_width - 16.0).abs() < f32::EPSILON);
    }

    #[test]
    fn canvas_is_filled_with_background_and_glyph_color() {
        let img = composite(
            &grid(&["@#"]),
            &theme("green_term"),
            &face(),
            None,
            &CompositeOptions {
                resize_output: false,
            },
        );
        assert_eq!(img.dimensions(), (8, 8));
        assert_eq!(img.get_pixel(1, 1).0, [0, 255, 0]);
        assert_eq!(img.get_pixel(6, 5).0, [0, 255, 0]);
        // Interligne sous les glyphes.
        assert_eq!(img.get_pixel(1, 7).0, [0, 0, 0]);
        assert_eq!(img.get_pixel(5, 6).0, [0, 0, 0]);
    }

    #[test]
    fn source_color_theme_draws_sampled_color() {
        let img = composite(
            &grid(&["#"]),
            &theme("original_dark_bg"),
            &face(),
            None,
            &CompositeOptions {
                resize_output: false,
            },
        );
        assert_eq!(img.get_pixel(0, 0).0, [200, 40, 40]);
    }

    #[test]
    fn missing_glyph_is_skipped() {
        let img = composite(
            &grid(&["\u{fffd}@"]),
            &theme("dark"),
            &face(),
            None,
            &CompositeOptions {
                resize_output: false,
            },
        );
        assert_eq!(img.get_pixel(1, 1).0, [0, 0, 0]);
        assert_eq!(img.get_pixel(5, 1).0, [255, 255, 255]);
    }

    #[test]
    fn post_scale_matches_source_aspect() {
        let g = grid(&["@.@.@.@.@.", "..........", "@@@@@@@@@@"]);
        let img = composite(
            &g,
            &theme("light"),
            &face(),
            Some((300, 200)),
            &CompositeOptions::default(),
        );
        let (w, h) = img.dimensions();
        assert_eq!(w, 40);
        let expected = (f64::from(w) * 200.0 / 300.0).round() as i64;
        assert!((i64::from(h) - expected).abs() <= 1);
    }

    static FOREGROUND_WARNINGS: AtomicUsize = AtomicUsize::new(0);

    /// Counts warnings about the `fantome` theme only; other tests log freely.
    struct WarningCounter;

    impl log::Log for WarningCounter {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            metadata.level() <= log::Level::Warn
        }

        fn log(&self, record: &log::Record) {
            if record.level() == log::Level::Warn && record.args().to_string().contains("'fantome'") {
                FOREGROUND_WARNINGS.fetch_add(1, Ordering::SeqCst);
            }
        }

        fn flush(&self) {}
    }

    static COUNTER: WarningCounter = WarningCounter;

    #[test]
    fn missing_foreground_is_reported_once_per_canvas() {
        let _ = log::set_logger(&COUNTER);
        log::set_max_level(log::LevelFilter::Warn);

        let theme = Theme {
            name: "fantome".into(),
            background: (0, 0, 0),
            background_name: "black".into(),
            foreground: None,
            uses_source_color: false,
            darken: None,
        };
        let before = FOREGROUND_WARNINGS.load(Ordering::SeqCst);
        let img = composite(
            &grid(&["@@@@", "@@@@", "@@@@"]),
            &theme,
            &face(),
            None,
            &CompositeOptions {
                resize_output: false,
            },
        );
        assert_eq!(FOREGROUND_WARNINGS.load(Ordering::SeqCst) - before, 1);
        assert_eq!(img.get_pixel(1, 1).0, [255, 255, 255]);
    }

    #[test]
    fn invalid_original_size_keeps_canvas() {
        let img = composite(
            &grid(&["@@"]),
            &theme("dark"),
            &face(),
            Some((0, 50)),
            &CompositeOptions::default(),
        );
        assert_eq!(img.dimensions(), (8, 8));
        let img = composite(&grid(&["@@"]), &theme("dark"), &face(), None, &CompositeOptions::default());
        assert_eq!(img.dimensions(), (8, 8));
    }
}
