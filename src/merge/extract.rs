//! Glyph extraction
//!
//! Walks a Unicode range against one source font and keeps the code points
//! that resolve to a real glyph. Unmapped code points, code points mapped to
//! notdef, and glyphs that neither draw nor advance are skipped silently;
//! most ranges are sparse in any given font.

use super::glyph_set::GlyphRecord;
use super::ranges::UnicodeRange;
use crate::font_source::{FontOrigin, GlyphSource, NOTDEF_GLYPH_ID};

/// Code points per block when scanning clustered ranges
pub const SCAN_CHUNK_SIZE: u32 = 256;

/// A block yielding fewer glyphs than this ends a clustered scan
pub const MIN_CHUNK_YIELD: usize = 5;

/// Glyphs found in one range, plus how many code points were passed over
#[derive(Debug, Default)]
pub struct Extraction {
    pub glyphs: Vec<GlyphRecord>,
    pub excluded: usize,
}

/// Collect every real glyph the font has for the code points in `range`
pub fn extract(font: &dyn GlyphSource, range: &UnicodeRange, origin: FontOrigin) -> Extraction {
    let mut extraction = Extraction::default();
    scan(font, range.start, range.end, origin, &mut extraction);
    log_extraction(range, &extraction);
    extraction
}

/// Like [`extract`], but stop after a block that yields almost nothing
///
/// Icon fonts place Private Use Area glyphs in clusters, so once a block of
/// [`SCAN_CHUNK_SIZE`] code points produces fewer than [`MIN_CHUNK_YIELD`]
/// glyphs the rest of the range is unlikely to hold any.
pub fn extract_clustered(
    font: &dyn GlyphSource,
    range: &UnicodeRange,
    origin: FontOrigin,
) -> Extraction {
    let mut extraction = Extraction::default();
    let mut chunk_start = range.start;

    while chunk_start <= range.end {
        let chunk_end = chunk_start
            .saturating_add(SCAN_CHUNK_SIZE - 1)
            .min(range.end);
        let before = extraction.glyphs.len();
        scan(font, chunk_start, chunk_end, origin, &mut extraction);

        if extraction.glyphs.len() - before < MIN_CHUNK_YIELD && chunk_end < range.end {
            tracing::debug!(
                "{}: stopping scan at U+{:04X}, block yielded {} glyphs",
                range.label,
                chunk_end,
                extraction.glyphs.len() - before
            );
            break;
        }
        chunk_start = chunk_end + 1;
    }

    log_extraction(range, &extraction);
    extraction
}

fn scan(
    font: &dyn GlyphSource,
    start: u32,
    end: u32,
    origin: FontOrigin,
    extraction: &mut Extraction,
) {
    let mut mapped = Vec::new();
    for codepoint in start..=end {
        match font.glyph_index(codepoint) {
            Some(glyph_id) if glyph_id != NOTDEF_GLYPH_ID => mapped.push((codepoint, glyph_id)),
            _ => extraction.excluded += 1,
        }
    }

    let glyph_ids: Vec<u32> = mapped.iter().map(|(_, glyph_id)| *glyph_id).collect();
    for ((codepoint, _), glyph) in mapped.into_iter().zip(font.glyphs(&glyph_ids)) {
        match glyph.filter(|glyph| glyph.is_renderable()) {
            Some(glyph) => extraction
                .glyphs
                .push(GlyphRecord::from_source(codepoint, glyph, origin)),
            None => extraction.excluded += 1,
        }
    }
}

fn log_extraction(range: &UnicodeRange, extraction: &Extraction) {
    tracing::debug!(
        "{}: {} glyphs extracted, {} code points excluded",
        range.label,
        extraction.glyphs.len(),
        extraction.excluded
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font_source::{GlyphSource, MemoryFont, SourceGlyph};

    const LETTERS: UnicodeRange = UnicodeRange::new(0x41, 0x5A, "Uppercase");

    #[test]
    fn keeps_only_mapped_real_glyphs() {
        let font = MemoryFont::new(1000)
            .with_box_glyphs(0x41, 0x45, 600.0)
            .with_unmapped(0x46)
            .with_glyph(0x47, SourceGlyph::blank(0.0))
            .with_glyph(0x48, SourceGlyph::blank(600.0));

        let extraction = extract(&font, &LETTERS, FontOrigin::English);
        let codepoints: Vec<u32> = extraction
            .glyphs
            .iter()
            .filter_map(|g| g.codepoint)
            .collect();

        assert_eq!(codepoints, vec![0x41, 0x42, 0x43, 0x44, 0x45, 0x48]);
        assert_eq!(extraction.excluded, 26 - 6);
        assert!(extraction
            .glyphs
            .iter()
            .all(|g| g.origin == FontOrigin::English));
    }

    #[test]
    fn extraction_does_not_touch_the_font() {
        let font = MemoryFont::new(1000).with_box_glyphs(0x41, 0x5A, 600.0);
        let before = font.glyph_count();
        extract(&font, &LETTERS, FontOrigin::English);
        extract(&font, &LETTERS, FontOrigin::English);
        assert_eq!(font.glyph_count(), before);
        assert_eq!(extract(&font, &LETTERS, FontOrigin::English).glyphs.len(), 26);
    }

    #[test]
    fn clustered_scan_stops_after_sparse_block() {
        let range = UnicodeRange::new(0xF000, 0xF2E0, "Icons");
        let font = MemoryFont::new(1000)
            // dense first block
            .with_box_glyphs(0xF000, 0xF0FF, 1000.0)
            // sparse second block
            .with_box_glyphs(0xF100, 0xF102, 1000.0)
            // never reached
            .with_box_glyphs(0xF200, 0xF2E0, 1000.0);

        let clustered = extract_clustered(&font, &range, FontOrigin::English);
        assert_eq!(clustered.glyphs.len(), 256 + 3);

        let full = extract(&font, &range, FontOrigin::English);
        assert_eq!(full.glyphs.len(), 256 + 3 + 0xE1);
    }

    #[test]
    fn clustered_scan_covers_dense_ranges_completely() {
        let range = UnicodeRange::new(0xE700, 0xE7C5, "Icons 2");
        let font = MemoryFont::new(1000).with_box_glyphs(0xE700, 0xE7C5, 1000.0);
        let clustered = extract_clustered(&font, &range, FontOrigin::English);
        assert_eq!(clustered.glyphs.len(), range.len() as usize);
    }
}
