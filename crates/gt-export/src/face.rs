use ab_glyph::{Font, FontVec, Glyph, PxScale, ScaleFont, point};

use crate::error::ExportError;

/// Ink extents of laid-out text, in pixels, origin at the top-left anchor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InkBounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl InkBounds {
    #[must_use]
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    #[must_use]
    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    fn union(self, other: Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }
}

/// Font metrics and coverage rasterization needed by the compositor.
///
/// Text is anchored left/top: the baseline sits `ascent()` pixels below the
/// anchor point.
pub trait GlyphFace {
    /// Nominal pixel size.
    fn font_size(&self) -> f32;

    /// Distance from the top anchor to the baseline.
    fn ascent(&self) -> f32;

    /// Ink extents of `text` drawn at (0, 0), `None` if nothing is inked.
    fn ink_bounds(&self, text: &str) -> Option<InkBounds>;

    /// Sum of horizontal advances of `text`.
    fn advance_width(&self, text: &str) -> f32;

    /// Rasterize one glyph anchored at (`left`, `top`), calling `plot` with
    /// canvas coordinates and a coverage in [0, 1].
    ///
    /// # Errors
    /// Returns [`ExportError::MissingGlyph`] if the face cannot draw `ch`.
    fn draw_glyph(
        &self,
        ch: char,
        left: f32,
        top: f32,
        plot: &mut dyn FnMut(i32, i32, f32),
    ) -> Result<(), ExportError>;
}

/// [`GlyphFace`] backed by an owned ab_glyph font.
pub struct AbGlyphFace {
    font: FontVec,
    scale: PxScale,
    size: f32,
}

impl AbGlyphFace {
    /// Parse font bytes and size them so that one em is `size` pixels.
    ///
    /// # Errors
    /// Returns an error if the bytes are not a supported font.
    pub fn from_bytes(data: Vec<u8>, size: f32) -> Result<Self, ab_glyph::InvalidFont> {
        let font = FontVec::try_from_vec(data)?;
        let upem = font.units_per_em().unwrap_or(1000.0);
        let scale = PxScale::from(size * font.height_unscaled() / upem);
        Ok(Self { font, scale, size })
    }

    fn positioned(&self, ch: char, x: f32, baseline: f32) -> Option<Glyph> {
        let id = self.font.glyph_id(ch);
        if id.0 == 0 {
            return None;
        }
        Some(id.with_scale_and_position(self.scale, point(x, baseline)))
    }
}

impl GlyphFace for AbGlyphFace {
    fn font_size(&self) -> f32 {
        self.size
    }

    fn ascent(&self) -> f32 {
        self.font.as_scaled(self.scale).ascent()
    }

    fn ink_bounds(&self, text: &str) -> Option<InkBounds> {
        let scaled = self.font.as_scaled(self.scale);
        let baseline = scaled.ascent();
        let mut caret = 0.0f32;
        let mut prev = None;
        let mut bounds: Option<InkBounds> = None;

        for ch in text.chars() {
            let id = self.font.glyph_id(ch);
            if let Some(p) = prev {
                caret += scaled.kern(p, id);
            }
            if let Some(outline) = self
                .positioned(ch, caret, baseline)
                .and_then(|g| self.font.outline_glyph(g))
            {
                let r = outline.px_bounds();
                let b = InkBounds {
                    min_x: r.min.x,
                    min_y: r.min.y,
                    max_x: r.max.x,
                    max_y: r.max.y,
                };
                bounds = Some(bounds.map_or(b, |acc| acc.union(b)));
            }
            caret += scaled.h_advance(id);
            prev = Some(id);
        }
        bounds
    }

    fn advance_width(&self, text: &str) -> f32 {
        let scaled = self.font.as_scaled(self.scale);
        text.chars()
            .map(|ch| scaled.h_advance(self.font.glyph_id(ch)))
            .sum()
    }

    fn draw_glyph(
        &self,
        ch: char,
        left: f32,
        top: f32,
        plot: &mut dyn FnMut(i32, i32, f32),
    ) -> Result<(), ExportError> {
        let baseline = top + self.ascent();
        let glyph = self
            .positioned(ch, left, baseline)
            .ok_or(ExportError::MissingGlyph(ch))?;

        // Whitespace has no outline.
        if let Some(outline) = self.font.outline_glyph(glyph) {
            let bounds = outline.px_bounds();
            let (ox, oy) = (bounds.min.x as i32, bounds.min.y as i32);
            outline.draw(|x, y, coverage| {
                plot(ox + x as i32, oy + y as i32, coverage);
            });
        }
        Ok(())
    }
}

/// Deterministic face for tests: every visible glyph is a solid block.
#[cfg(test)]
pub(crate) struct BlockFace {
    pub cell_width: f32,
    pub cell_height: f32,
}

#[cfg(test)]
impl GlyphFace for BlockFace {
    fn font_size(&self) -> f32 {
        self.cell_height
    }

    fn ascent(&self) -> f32 {
        self.cell_height
    }

    fn ink_bounds(&self, text: &str) -> Option<InkBounds> {
        let mut bounds: Option<InkBounds> = None;
        for (i, ch) in text.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            let left = i as f32 * self.cell_width;
            let b = InkBounds {
                min_x: left,
                min_y: 0.0,
                max_x: left + self.cell_width,
                max_y: self.cell_height,
            };
            bounds = Some(bounds.map_or(b, |acc| acc.union(b)));
        }
        bounds
    }

    fn advance_width(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.cell_width
    }

    fn draw_glyph(
        &self,
        ch: char,
        left: f32,
        top: f32,
        plot: &mut dyn FnMut(i32, i32, f32),
    ) -> Result<(), ExportError> {
        if ch == '\u{fffd}' {
            return Err(ExportError::MissingGlyph(ch));
        }
        if ch.is_whitespace() {
            return Ok(());
        }
        for y in 0..self.cell_height as i32 {
            for x in 0..self.cell_width as i32 {
                plot(left as i32 + x, top as i32 + y, 1.0);
            }
        }
        Ok(())
    }
}
