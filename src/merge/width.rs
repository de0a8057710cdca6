//! Advance width normalization
//!
//! Puts every glyph on a fixed-width grid: Latin glyphs take one cell, the
//! width of the Latin font's capital M, and Hangul glyphs take
//! `round(cell * ratio)`.

use super::glyph_set::GlyphSet;
use super::ranges::is_hangul;
use crate::font_source::GlyphSource;

/// Hangul glyphs span two Latin cells
pub const DEFAULT_WIDTH_RATIO: f64 = 2.0;

/// Cell width used when the Latin font has no usable capital M
pub const FALLBACK_LATIN_WIDTH: f64 = 600.0;

/// Character whose advance defines the Latin cell
pub const REFERENCE_CHAR: char = 'M';

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WidthNormalizer {
    latin_width: f64,
    ratio: f64,
}

impl WidthNormalizer {
    pub fn new(latin_width: f64, ratio: f64) -> Self {
        Self { latin_width, ratio }
    }

    /// Measure the cell from the Latin font's reference character
    pub fn from_reference(latin: &dyn GlyphSource, ratio: f64) -> Self {
        let measured = latin
            .glyph_index(u32::from(REFERENCE_CHAR))
            .filter(|glyph_id| *glyph_id != 0)
            .and_then(|glyph_id| latin.glyph(glyph_id))
            .map(|glyph| glyph.advance_width)
            .filter(|width| *width > 0.0);

        let latin_width = measured.unwrap_or_else(|| {
            tracing::warn!(
                "Latin font has no '{}' glyph, using {} as cell width",
                REFERENCE_CHAR,
                FALLBACK_LATIN_WIDTH
            );
            FALLBACK_LATIN_WIDTH
        });
        Self::new(latin_width, ratio)
    }

    pub fn latin_width(&self) -> f64 {
        self.latin_width
    }

    pub fn korean_width(&self) -> f64 {
        (self.latin_width * self.ratio).round()
    }

    /// Target advance for a glyph; notdef gets the Latin cell
    pub fn width_for(&self, codepoint: Option<u32>) -> f64 {
        match codepoint {
            Some(codepoint) if is_hangul(codepoint) => self.korean_width(),
            _ => self.latin_width,
        }
    }

    /// Rewrite every advance width in the set
    pub fn apply(&self, glyphs: &mut GlyphSet) {
        for glyph in glyphs.iter_mut() {
            glyph.advance_width = self.width_for(glyph.codepoint);
        }
        tracing::debug!(
            "Normalized widths: latin {} / hangul {}",
            self.latin_width,
            self.korean_width()
        );
    }
}
