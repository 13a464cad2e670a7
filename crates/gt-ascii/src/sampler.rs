use gt_core::charset::Alphabet;
use gt_core::color::{BLACK, Rgb};
use gt_core::config::{IndexPolicy, LuminanceFormula, SamplingPolicy, Settings};
use gt_core::error::CoreError;
use gt_core::frame::{Cell, CharGrid, FrameBuffer};
use gt_core::theme::Theme;
use gt_source::resize::{ResizeFilter, resize_frame};
use rayon::prelude::*;

/// Knobs of the sampler, fixed for a whole batch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleOptions {
    /// Row compression (glyphs are taller than wide).
    pub char_aspect_correction: f32,
    pub sampling: SamplingPolicy,
    pub index_policy: IndexPolicy,
    pub luminance: LuminanceFormula,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            char_aspect_correction: 0.5,
            sampling: SamplingPolicy::PointSample,
            index_policy: IndexPolicy::BackgroundAware,
            luminance: LuminanceFormula::Average,
        }
    }
}

impl From<&Settings> for SampleOptions {
    fn from(s: &Settings) -> Self {
        Self {
            char_aspect_correction: s.char_aspect_correction,
            sampling: s.sampling,
            index_policy: s.index_policy,
            luminance: s.luminance,
        }
    }
}

/// Rows of the grid: `max(1, floor(columns * h / w * aspect))`.
///
/// # Example
/// ```
/// use gt_ascii::sampler::grid_height;
/// assert_eq!(grid_height(200, 100, 128, 0.5), 32);
/// assert_eq!(grid_height(1000, 1, 10, 0.5), 1);
/// ```
#[must_use]
pub fn grid_height(image_width: u32, image_height: u32, columns: u32, aspect: f32) -> u32 {
    let ratio = f64::from(image_height) / f64::from(image_width.max(1));
    let rows = (f64::from(columns) * ratio * f64::from(aspect)).floor();
    if rows.is_finite() && rows >= 1.0 {
        rows as u32
    } else {
        1
    }
}

/// Source pixel sampled for a grid cell: the cell center, clamped.
#[inline]
#[must_use]
pub fn sample_point(index: u32, cells: u32, pixels: u32) -> u32 {
    let pos = ((f64::from(index) + 0.5) * f64::from(pixels) / f64::from(cells.max(1))).floor();
    (pos as u32).min(pixels.saturating_sub(1))
}

/// Grayscale value of a color in [0.0, 255.0].
///
/// # Example
/// ```
/// use gt_ascii::sampler::luminance;
/// use gt_core::config::LuminanceFormula;
/// assert_eq!(luminance((255, 0, 0), LuminanceFormula::Average), 85.0);
/// assert!((luminance((255, 255, 255), LuminanceFormula::Rec601) - 255.0).abs() < 0.01);
/// ```
#[inline]
#[must_use]
pub fn luminance(rgb: Rgb, formula: LuminanceFormula) -> f32 {
    let (r, g, b) = (f32::from(rgb.0), f32::from(rgb.1), f32::from(rgb.2));
    let lum = match formula {
        LuminanceFormula::Average => (r + g + b) / 3.0,
        LuminanceFormula::Rec601 => 0.299 * r + 0.587 * g + 0.114 * b,
    };
    lum.clamp(0.0, 255.0)
}

/// Convertit une image en grille de caractères.
///
/// Every cell keeps the raw color of its sample point. Luminance comes from
/// the same point, or from a box-filtered reduction of the whole image to
/// grid size under [`SamplingPolicy::AveragedResize`]. On a light theme
/// background the luminance is inverted before indexing, unless the index
/// policy is [`IndexPolicy::Fixed`].
///
/// # Errors
/// Returns [`CoreError::InvalidImage`] if `columns` is zero or the image
/// is empty.
///
/// # Example
/// ```
/// use gt_ascii::sampler::{sample, SampleOptions};
/// use gt_core::{Alphabet, FrameBuffer, ThemeTable};
///
/// let frame = FrameBuffer::filled(64, 32, (255, 255, 255));
/// let table = ThemeTable::builtin();
/// let dark = table.get("dark").unwrap();
/// let grid = sample(&frame, 16, dark, &Alphabet::default(), &SampleOptions::default()).unwrap();
/// assert_eq!((grid.width, grid.height), (16, 4));
/// assert!(grid.cells.iter().all(|c| c.ch == ' '));
/// ```
pub fn sample(
    image: &FrameBuffer,
    columns: u32,
    theme: &Theme,
    alphabet: &Alphabet,
    options: &SampleOptions,
) -> Result<CharGrid, CoreError> {
    if columns == 0 || image.is_empty() {
        return Err(CoreError::InvalidImage {
            width: image.width,
            height: image.height,
            columns,
        });
    }

    let rows = grid_height(
        image.width,
        image.height,
        columns,
        options.char_aspect_correction,
    );
    let invert = options.index_policy == IndexPolicy::BackgroundAware && theme.is_light();

    let averaged = match options.sampling {
        SamplingPolicy::PointSample => None,
        SamplingPolicy::AveragedResize => {
            match resize_frame(image, columns, rows, ResizeFilter::Box) {
                Ok(small) => Some(small),
                Err(e) => {
                    log::warn!("Réduction moyennée impossible ({e:#}), échantillonnage ponctuel");
                    None
                }
            }
        }
    };

    let mut grid = CharGrid::new(columns, rows);
    grid.cells
        .par_chunks_mut(columns as usize)
        .enumerate()
        .for_each(|(row, cells)| {
            let row = row as u32;
            let py = sample_point(row, rows, image.height);
            for (col, cell) in cells.iter_mut().enumerate() {
                let col = col as u32;
                let px = sample_point(col, columns, image.width);
                let color = image.try_pixel(px, py).unwrap_or(BLACK);

                let lum_source = averaged
                    .as_ref()
                    .and_then(|small| small.try_pixel(col, row))
                    .unwrap_or(color);
                let mut lum = luminance(lum_source, options.luminance);
                if invert {
                    lum = 255.0 - lum;
                }

                *cell = Cell {
                    ch: alphabet.char_for(lum),
                    color,
                };
            }
        });

    Ok(grid)
}
