//! Glyph records and the ordered, deduplicated glyph set
//!
//! The set is rebuilt for every merge. Position in the set is the final
//! glyph ID, and position 0 always holds the notdef glyph.

use crate::data::outline;
use crate::font_source::{FontOrigin, GlyphSource, SourceGlyph};
use kurbo::BezPath;
use std::collections::HashSet;

/// Name of the placeholder glyph
pub const NOTDEF_NAME: &str = ".notdef";

/// One glyph copied out of a source font
#[derive(Clone, Debug, PartialEq)]
pub struct GlyphRecord {
    /// `None` only for notdef
    pub codepoint: Option<u32>,
    pub name: String,
    pub advance_width: f64,
    pub left_side_bearing: f64,
    pub outline: BezPath,
    pub origin: FontOrigin,
}

impl GlyphRecord {
    pub fn from_source(codepoint: u32, glyph: SourceGlyph, origin: FontOrigin) -> Self {
        Self {
            codepoint: Some(codepoint),
            name: glyph_name(codepoint),
            advance_width: glyph.advance_width,
            left_side_bearing: glyph.left_side_bearing,
            outline: glyph.outline,
            origin,
        }
    }

    pub fn notdef(glyph: SourceGlyph, origin: FontOrigin) -> Self {
        Self {
            codepoint: None,
            name: NOTDEF_NAME.to_string(),
            advance_width: glyph.advance_width,
            left_side_bearing: glyph.left_side_bearing,
            outline: glyph.outline,
            origin,
        }
    }

    pub fn is_notdef(&self) -> bool {
        self.codepoint.is_none()
    }

    /// Bring the glyph into another em size
    pub fn scaled(mut self, factor: f64) -> Self {
        if factor != 1.0 {
            self.outline = outline::scale_path(&self.outline, factor);
            self.advance_width = (self.advance_width * factor).round();
            self.left_side_bearing = (self.left_side_bearing * factor).round();
        }
        self
    }
}

/// Production glyph name for a code point (`uniAC00`, `u1F600`)
pub fn glyph_name(codepoint: u32) -> String {
    if codepoint <= 0xFFFF {
        format!("uni{codepoint:04X}")
    } else {
        format!("u{codepoint:05X}")
    }
}

/// Ordered glyphs of a merged font; index is the glyph ID
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GlyphSet {
    glyphs: Vec<GlyphRecord>,
}

impl GlyphSet {
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GlyphRecord> {
        self.glyphs.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, GlyphRecord> {
        self.glyphs.iter_mut()
    }

    pub fn get(&self, glyph_id: usize) -> Option<&GlyphRecord> {
        self.glyphs.get(glyph_id)
    }

    /// Code points of all mapped glyphs, in glyph order
    pub fn codepoints(&self) -> impl Iterator<Item = u32> + '_ {
        self.glyphs.iter().filter_map(|glyph| glyph.codepoint)
    }

    /// Character map entries: (code point, glyph ID)
    pub fn mappings(&self) -> impl Iterator<Item = (u32, usize)> + '_ {
        self.glyphs
            .iter()
            .enumerate()
            .filter_map(|(glyph_id, glyph)| glyph.codepoint.map(|cp| (cp, glyph_id)))
    }

    pub fn count_from(&self, origin: FontOrigin) -> usize {
        self.glyphs
            .iter()
            .filter(|glyph| !glyph.is_notdef() && glyph.origin == origin)
            .count()
    }
}

impl<'a> IntoIterator for &'a GlyphSet {
    type Item = &'a GlyphRecord;
    type IntoIter = std::slice::Iter<'a, GlyphRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.glyphs.iter()
    }
}

/// Accumulates extracted glyphs in category order
///
/// The first glyph to claim a code point keeps it; later duplicates are
/// counted and dropped.
#[derive(Debug)]
pub struct GlyphSetBuilder {
    glyphs: Vec<GlyphRecord>,
    claimed: HashSet<u32>,
    duplicates: usize,
}

impl GlyphSetBuilder {
    pub fn new(notdef: GlyphRecord) -> Self {
        Self {
            glyphs: vec![notdef],
            claimed: HashSet::new(),
            duplicates: 0,
        }
    }

    /// Start a set with the notdef of the Korean font, else the Latin font
    ///
    /// Glyphs are scaled into the Latin font's units. When neither font has
    /// a notdef, an empty one half an em wide is used.
    pub fn with_notdef_from(korean: &dyn GlyphSource, english: &dyn GlyphSource) -> Self {
        let target = english.metrics();
        let notdef = korean
            .notdef()
            .map(|glyph| {
                GlyphRecord::notdef(glyph, FontOrigin::Korean)
                    .scaled(korean.metrics().scale_to(&target))
            })
            .or_else(|| {
                english
                    .notdef()
                    .map(|glyph| GlyphRecord::notdef(glyph, FontOrigin::English))
            })
            .unwrap_or_else(|| {
                tracing::warn!("Neither source font has a notdef glyph, using an empty one");
                let advance = (f64::from(target.units_per_em) * 0.5).round();
                GlyphRecord::notdef(SourceGlyph::blank(advance), FontOrigin::English)
            });
        Self::new(notdef)
    }

    /// Append records whose code points are still unclaimed
    ///
    /// Returns how many were added.
    pub fn extend(&mut self, records: impl IntoIterator<Item = GlyphRecord>) -> usize {
        let mut added = 0;
        for record in records {
            let Some(codepoint) = record.codepoint else {
                continue;
            };
            if self.claimed.insert(codepoint) {
                self.glyphs.push(record);
                added += 1;
            } else {
                self.duplicates += 1;
            }
        }
        added
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Freeze the set, making sure notdef sits at index 0
    pub fn finish(mut self) -> GlyphSet {
        match self.glyphs.iter().position(GlyphRecord::is_notdef) {
            Some(0) => {}
            Some(position) => {
                tracing::warn!("notdef found at index {}, moving it to 0", position);
                let notdef = self.glyphs.remove(position);
                self.glyphs.insert(0, notdef);
            }
            None => {
                tracing::warn!("Glyph set has no notdef, inserting an empty one");
                self.glyphs.insert(
                    0,
                    GlyphRecord::notdef(SourceGlyph::blank(0.0), FontOrigin::English),
                );
            }
        }
        if self.duplicates > 0 {
            tracing::debug!("Skipped {} already claimed code points", self.duplicates);
        }
        GlyphSet {
            glyphs: self.glyphs,
        }
    }
}
