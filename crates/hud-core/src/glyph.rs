//! Glyph descriptors and character sets.
//!
//! A [`Charset`] maps a contiguous range of character codes onto glyph
//! rectangles inside a source image. Index `i` of the glyph table always
//! describes character `low + i`.

use crate::error::{FontError, Result};

/// Sub-rectangle of a source bitmap plus the pen advance after drawing it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Glyph {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub advance: u32,
}

impl Glyph {
    pub const fn new(x: u32, y: u32, width: u32, height: u32, advance: u32) -> Self {
        Self { x, y, width, height, advance }
    }

    /// Multiply every field by `factor`, failing on overflow.
    fn scaled(&self, factor: u32) -> Option<Self> {
        Some(Self {
            x: self.x.checked_mul(factor)?,
            y: self.y.checked_mul(factor)?,
            width: self.width.checked_mul(factor)?,
            height: self.height.checked_mul(factor)?,
            advance: self.advance.checked_mul(factor)?,
        })
    }
}

/// Direction the pen moves in after each glyph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    #[default]
    LeftToRight,
    RightToLeft,
    TopToBottom,
}

/// Ordered glyph table over the inclusive code range `[low, high]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Charset {
    low: u32,
    high: u32,
    direction: Direction,
    glyphs: Vec<Glyph>,
}

impl Charset {
    /// Build a charset, checking that the table has exactly one glyph per code.
    pub fn new(low: u32, high: u32, direction: Direction, glyphs: Vec<Glyph>) -> Result<Self> {
        let len = range_len(low, high)?;
        if glyphs.len() != len {
            return Err(FontError::InvalidCharset(format!(
                "range U+{low:04X}..=U+{high:04X} needs {len} glyphs, got {}",
                glyphs.len()
            )));
        }
        Ok(Self { low, high, direction, glyphs })
    }

    /// Charset with zeroed glyph descriptors, filled in later by a loader.
    pub(crate) fn blank(low: u32, high: u32, direction: Direction) -> Result<Self> {
        let len = range_len(low, high)?;
        Ok(Self { low, high, direction, glyphs: vec![Glyph::default(); len] })
    }

    pub fn low(&self) -> u32 { self.low }
    pub fn high(&self) -> u32 { self.high }
    pub fn direction(&self) -> Direction { self.direction }
    pub fn glyphs(&self) -> &[Glyph] { &self.glyphs }

    /// Number of glyphs, always `high - low + 1`.
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn contains(&self, code: u32) -> bool {
        code >= self.low && code <= self.high
    }

    /// Table index for `code`, if it lies in the range.
    pub fn index_of(&self, code: u32) -> Option<usize> {
        self.contains(code).then(|| (code - self.low) as usize)
    }

    pub fn glyph(&self, code: u32) -> Option<&Glyph> {
        self.index_of(code).map(|i| &self.glyphs[i])
    }

    pub(crate) fn set_glyph(&mut self, index: usize, glyph: Glyph) {
        self.glyphs[index] = glyph;
    }

    /// Character codes covered by this charset, in table order.
    pub fn codes(&self) -> impl Iterator<Item = u32> + '_ {
        self.low..=self.high
    }

    /// Multiply every glyph's offset, size and advance by `factor` in place.
    ///
    /// A zero factor or an overflowing product is rejected and leaves the
    /// charset untouched.
    pub fn scale(&mut self, factor: u32) -> Result<()> {
        if factor == 0 {
            return Err(FontError::InvalidScale("charset scale factor must be positive".into()));
        }
        let scaled = self
            .glyphs
            .iter()
            .map(|g| g.scaled(factor))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| FontError::InvalidScale(format!("scaling charset by {factor} overflows")))?;
        self.glyphs = scaled;
        Ok(())
    }

    /// Tallest glyph in the table; used as the line height of bitmap fonts.
    pub fn max_height(&self) -> u32 {
        self.glyphs.iter().map(|g| g.height).max().unwrap_or(0)
    }
}

fn range_len(low: u32, high: u32) -> Result<usize> {
    if low > high {
        return Err(FontError::InvalidCharset(format!(
            "low bound U+{low:04X} is above high bound U+{high:04X}"
        )));
    }
    Ok((high - low) as usize + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Charset {
        let glyphs = (0..4).map(|i| Glyph::new(i * 3, 1, 3, 5, 4)).collect();
        Charset::new(10, 13, Direction::LeftToRight, glyphs).unwrap()
    }

    #[test]
    fn len_matches_range() {
        let cs = sample();
        assert_eq!(cs.len(), 4);
        assert_eq!(cs.len() as u32, cs.high() - cs.low() + 1);
    }

    #[test]
    fn rejects_mismatched_table() {
        let err = Charset::new(0, 9, Direction::LeftToRight, vec![Glyph::default(); 3]);
        assert!(matches!(err, Err(FontError::InvalidCharset(_))));
    }

    #[test]
    fn rejects_inverted_range() {
        assert!(Charset::blank(5, 4, Direction::LeftToRight).is_err());
    }

    #[test]
    fn index_follows_low_bound() {
        let cs = sample();
        assert_eq!(cs.index_of(10), Some(0));
        assert_eq!(cs.index_of(13), Some(3));
        assert_eq!(cs.index_of(9), None);
        assert_eq!(cs.index_of(14), None);
        assert_eq!(cs.glyph(12).map(|g| g.x), Some(6));
    }

    #[test]
    fn scale_multiplies_every_field() {
        for k in 1..6 {
            let mut cs = sample();
            cs.scale(k).unwrap();
            for (scaled, orig) in cs.glyphs().iter().zip(sample().glyphs()) {
                assert_eq!(scaled.x, orig.x * k);
                assert_eq!(scaled.y, orig.y * k);
                assert_eq!(scaled.width, orig.width * k);
                assert_eq!(scaled.height, orig.height * k);
                assert_eq!(scaled.advance, orig.advance * k);
            }
        }
    }

    #[test]
    fn scale_rejects_zero_and_overflow() {
        let mut cs = sample();
        assert!(matches!(cs.scale(0), Err(FontError::InvalidScale(_))));
        assert!(matches!(cs.scale(u32::MAX), Err(FontError::InvalidScale(_))));
        assert_eq!(cs, sample());
    }
}
