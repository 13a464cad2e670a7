use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// 10 caractères, du plus dense au plus clair. Alphabet par défaut.
pub const DEFAULT_ALPHABET: &str = "@%#*+=-:. ";

/// Direction in which a configured alphabet string is written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum AlphabetOrder {
    /// First character is the densest glyph.
    #[default]
    DarkToLight,
    /// First character is the sparsest glyph; reversed before use.
    LightToDark,
}

/// Ordered glyph sequence, densest first.
///
/// Index 0 is drawn for the darkest luminance, the last index for the
/// brightest.
///
/// # Example
/// ```
/// use gt_core::charset::{Alphabet, AlphabetOrder};
/// let alphabet = Alphabet::new("@%#*+=-:. ", AlphabetOrder::DarkToLight).unwrap();
/// assert_eq!(alphabet.char_for(0.0), '@');
/// assert_eq!(alphabet.char_for(255.0), ' ');
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alphabet {
    chars: Vec<char>,
}

impl Alphabet {
    /// Build an alphabet from a configured string.
    ///
    /// # Errors
    /// Returns [`CoreError::EmptyAlphabet`] if `glyphs` has no character.
    pub fn new(glyphs: &str, order: AlphabetOrder) -> Result<Self, CoreError> {
        let mut chars: Vec<char> = glyphs.chars().collect();
        if chars.is_empty() {
            return Err(CoreError::EmptyAlphabet);
        }
        if order == AlphabetOrder::LightToDark {
            chars.reverse();
        }
        Ok(Self { chars })
    }

    /// Number of glyphs (always ≥ 1).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Always false; kept for API symmetry with `len`.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Glyphs in drawing order, densest first.
    #[must_use]
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Index for a luminance in [0.0, 255.0]: `floor(lum / 256 * N)`, clamped.
    ///
    /// # Example
    /// ```
    /// use gt_core::charset::{Alphabet, AlphabetOrder};
    /// let alphabet = Alphabet::new("ab", AlphabetOrder::DarkToLight).unwrap();
    /// assert_eq!(alphabet.index_for(127.0), 0);
    /// assert_eq!(alphabet.index_for(128.0), 1);
    /// ```
    #[inline]
    #[must_use]
    pub fn index_for(&self, luminance: f32) -> usize {
        let n = self.chars.len();
        let scaled = (luminance / 256.0 * n as f32).floor();
        if scaled.is_nan() || scaled <= 0.0 {
            return 0;
        }
        (scaled as usize).min(n - 1)
    }

    /// Glyph for a luminance in [0.0, 255.0].
    #[inline]
    #[must_use]
    pub fn char_for(&self, luminance: f32) -> char {
        self.chars[self.index_for(luminance)]
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self {
            chars: DEFAULT_ALPHABET.chars().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_alphabet_maps_extremes() {
        let alphabet = Alphabet::default();
        assert_eq!(alphabet.len(), 10);
        assert_eq!(alphabet.char_for(0.0), '@');
        assert_eq!(alphabet.char_for(255.0), ' ');
    }

    #[test]
    fn index_is_monotonic() {
        let alphabet = Alphabet::default();
        let mut prev = 0usize;
        for lum in 0..=255u8 {
            let idx = alphabet.index_for(f32::from(lum));
            assert!(idx >= prev, "index non monotone à luminance {lum}");
            prev = idx;
        }
    }

    #[test]
    fn out_of_range_luminance_is_clamped() {
        let alphabet = Alphabet::default();
        assert_eq!(alphabet.index_for(-12.0), 0);
        assert_eq!(alphabet.index_for(1000.0), 9);
        assert_eq!(alphabet.index_for(f32::NAN), 0);
    }

    #[test]
    fn light_to_dark_is_reversed() {
        let alphabet = Alphabet::new(" .:#@", AlphabetOrder::LightToDark).unwrap();
        assert_eq!(alphabet.chars(), &['@', '#', ':', '.', ' ']);
    }

    #[test]
    fn single_glyph_alphabet() {
        let alphabet = Alphabet::new("#", AlphabetOrder::DarkToLight).unwrap();
        assert_eq!(alphabet.char_for(0.0), '#');
        assert_eq!(alphabet.char_for(255.0), '#');
    }

    #[test]
    fn empty_alphabet_rejected() {
        assert_eq!(
            Alphabet::new("", AlphabetOrder::DarkToLight),
            Err(CoreError::EmptyAlphabet)
        );
    }
}
