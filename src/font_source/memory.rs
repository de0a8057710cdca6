//! Fonts assembled in memory
//!
//! A `MemoryFont` is a glyph source built programmatically rather than
//! parsed. It is handy for synthesizing fonts and for exercising the merge
//! pipeline without font files.

use super::metrics::{NamingInfo, VerticalMetrics};
use super::{GlyphSource, SourceGlyph, NOTDEF_GLYPH_ID};
use std::collections::{BTreeMap, HashMap};

#[derive(Clone, Debug)]
pub struct MemoryFont {
    metrics: VerticalMetrics,
    naming: NamingInfo,
    glyphs: BTreeMap<u32, SourceGlyph>,
    charmap: HashMap<u32, u32>,
    tables: HashMap<[u8; 4], Vec<u8>>,
    next_glyph_id: u32,
}

impl MemoryFont {
    /// An empty font holding only a rectangular notdef glyph
    pub fn new(units_per_em: u16) -> Self {
        let metrics = VerticalMetrics::with_defaults(units_per_em);
        let upm = f64::from(metrics.units_per_em);
        let mut glyphs = BTreeMap::new();
        glyphs.insert(
            NOTDEF_GLYPH_ID,
            SourceGlyph::rectangle((upm * 0.5).round(), (upm * 0.7).round()),
        );
        Self {
            metrics,
            naming: NamingInfo::default(),
            glyphs,
            charmap: HashMap::new(),
            tables: HashMap::new(),
            next_glyph_id: 1,
        }
    }

    /// Drop the notdef glyph, leaving index 0 unoccupied
    pub fn without_notdef(mut self) -> Self {
        self.glyphs.remove(&NOTDEF_GLYPH_ID);
        self
    }

    pub fn with_naming(mut self, naming: NamingInfo) -> Self {
        self.naming = naming;
        self
    }

    /// Add a glyph at the next free index and map a code point to it
    pub fn with_glyph(mut self, codepoint: u32, glyph: SourceGlyph) -> Self {
        let glyph_id = self.next_glyph_id;
        self.next_glyph_id += 1;
        self.glyphs.insert(glyph_id, glyph);
        self.charmap.insert(codepoint, glyph_id);
        self
    }

    /// Add rectangle glyphs for every code point in `start..=end`
    pub fn with_box_glyphs(mut self, start: u32, end: u32, advance_width: f64) -> Self {
        let height = (self.metrics.ascender * 0.9).round();
        for codepoint in start..=end {
            self = self.with_glyph(codepoint, SourceGlyph::rectangle(advance_width, height));
        }
        self
    }

    /// Map a code point straight to the notdef glyph
    pub fn with_unmapped(mut self, codepoint: u32) -> Self {
        self.charmap.insert(codepoint, NOTDEF_GLYPH_ID);
        self
    }

    /// Attach a raw table
    pub fn with_table(mut self, tag: [u8; 4], data: Vec<u8>) -> Self {
        self.tables.insert(tag, data);
        self
    }
}

impl GlyphSource for MemoryFont {
    fn metrics(&self) -> VerticalMetrics {
        self.metrics
    }

    fn naming(&self) -> NamingInfo {
        self.naming.clone()
    }

    fn glyph_count(&self) -> u32 {
        self.next_glyph_id
    }

    fn glyph_index(&self, codepoint: u32) -> Option<u32> {
        self.charmap.get(&codepoint).copied()
    }

    fn glyph(&self, glyph_id: u32) -> Option<SourceGlyph> {
        self.glyphs.get(&glyph_id).cloned()
    }

    fn table_data(&self, tag: [u8; 4]) -> Option<Vec<u8>> {
        self.tables.get(&tag).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_glyphs_get_sequential_ids() {
        let font = MemoryFont::new(1000).with_box_glyphs(0x41, 0x43, 600.0);
        assert_eq!(font.glyph_index(0x41), Some(1));
        assert_eq!(font.glyph_index(0x43), Some(3));
        assert_eq!(font.glyph_index(0x44), None);
        assert_eq!(font.glyph_count(), 4);
        assert_eq!(font.glyph(2).map(|g| g.advance_width), Some(600.0));
    }

    #[test]
    fn notdef_can_be_removed() {
        let font = MemoryFont::new(1000);
        assert!(font.notdef().is_some());
        assert!(font.without_notdef().notdef().is_none());
    }
}
