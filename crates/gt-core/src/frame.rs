use crate::color::Rgb;
use crate::error::CoreError;

/// Image source décodée, immuable une fois construite.
///
/// Stocke les pixels en RGB row-major, 3 bytes par pixel.
///
/// # Example
/// ```
/// use gt_core::frame::FrameBuffer;
/// let fb = FrameBuffer::new(10, 10);
/// assert_eq!(fb.data.len(), 300);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    /// Pixels RGB, row-major, 3 bytes par pixel.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameBuffer {
    /// Crée un buffer noir aux dimensions données.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0u8; width as usize * height as usize * 3],
            width,
            height,
        }
    }

    /// Wrap raw RGB bytes.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidImage`] if `data` is not `width * height * 3` bytes.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, CoreError> {
        if data.len() != width as usize * height as usize * 3 {
            return Err(CoreError::InvalidImage {
                width,
                height,
                columns: 0,
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Buffer filled with a single color.
    ///
    /// # Example
    /// ```
    /// use gt_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::filled(2, 2, (9, 8, 7));
    /// assert_eq!(fb.try_pixel(1, 1), Some((9, 8, 7)));
    /// ```
    #[must_use]
    pub fn filled(width: u32, height: u32, rgb: Rgb) -> Self {
        let data = [rgb.0, rgb.1, rgb.2].repeat(width as usize * height as usize);
        Self {
            data,
            width,
            height,
        }
    }

    /// Accès au pixel (x, y), `None` hors limites.
    #[inline]
    #[must_use]
    pub fn try_pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        let px = self.data.get(idx..idx + 3)?;
        Some((px[0], px[1], px[2]))
    }

    /// Écrit un pixel; ignoré hors limites.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, rgb: Rgb) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        if let Some(px) = self.data.get_mut(idx..idx + 3) {
            px.copy_from_slice(&[rgb.0, rgb.1, rgb.2]);
        }
    }

    /// True when either dimension is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Single cell of a character grid.
///
/// # Example
/// ```
/// use gt_core::frame::Cell;
/// let cell = Cell::default();
/// assert_eq!(cell.ch, ' ');
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    /// Caractère choisi pour la luminance de la cellule.
    pub ch: char,
    /// Couleur brute échantillonnée dans la source.
    pub color: Rgb,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            color: (0, 0, 0),
        }
    }
}

/// Grille de caractères produite par l'échantillonneur, row-major.
///
/// # Example
/// ```
/// use gt_core::frame::{CharGrid, Cell};
/// let mut grid = CharGrid::new(4, 2);
/// grid.set(3, 1, Cell { ch: '@', color: (255, 0, 0) });
/// assert_eq!(grid.get(3, 1).map(|c| c.ch), Some('@'));
/// assert_eq!(grid.row_text(1), "   @");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharGrid {
    /// Flat array of cells, row-major.
    pub cells: Vec<Cell>,
    /// Width in characters.
    pub width: u32,
    /// Height in characters.
    pub height: u32,
}

impl CharGrid {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            cells: vec![Cell::default(); width as usize * height as usize],
            width,
            height,
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<&Cell> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get(y as usize * self.width as usize + x as usize)
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, cell: Cell) {
        if x >= self.width || y >= self.height {
            return;
        }
        if let Some(slot) = self.cells.get_mut(y as usize * self.width as usize + x as usize) {
            *slot = cell;
        }
    }

    /// Rows in top-to-bottom order.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.width.max(1) as usize)
    }

    /// Characters of one row as a string (empty if out of range).
    #[must_use]
    pub fn row_text(&self, y: u32) -> String {
        self.rows()
            .nth(y as usize)
            .map(|row| row.iter().map(|c| c.ch).collect())
            .unwrap_or_default()
    }

    /// Whole grid as text, one line per row, `\n`-terminated.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity(self.cells.len() + self.height as usize);
        for row in self.rows() {
            out.extend(row.iter().map(|c| c.ch));
            out.push('\n');
        }
        out
    }
}
