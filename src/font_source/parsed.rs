//! Fonts parsed from TrueType/OpenType bytes
//!
//! Backed by skrifa. The character map, vertical metrics and naming strings
//! are read once at load; outlines are drawn on demand, a batch at a time.

use super::metrics::{NamingInfo, VerticalMetrics};
use super::{GlyphSource, SourceGlyph};
use crate::data::outline::BezPathPen;
use skrifa::instance::{LocationRef, Size};
use skrifa::metrics::GlyphMetrics;
use skrifa::outline::{DrawSettings, OutlineGlyphCollection};
use skrifa::raw::{ReadError, TableProvider};
use skrifa::string::StringId;
use skrifa::{FontRef, GlyphId, MetadataProvider, Tag};
use std::collections::HashMap;

/// A source font that owns its file bytes
pub struct ParsedFont {
    data: Vec<u8>,
    charmap: HashMap<u32, u32>,
    metrics: VerticalMetrics,
    naming: NamingInfo,
    glyph_count: u32,
}

impl ParsedFont {
    /// Parse a font file held in memory
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, ReadError> {
        let font = FontRef::new(&data)?;

        let charmap: HashMap<u32, u32> = font
            .charmap()
            .mappings()
            .map(|(codepoint, gid)| (codepoint, gid.to_u32()))
            .collect();

        let raw = font.metrics(Size::unscaled(), LocationRef::default());
        let metrics = VerticalMetrics {
            units_per_em: raw.units_per_em,
            ascender: f64::from(raw.ascent),
            descender: f64::from(raw.descent),
            line_gap: f64::from(raw.leading),
            x_height: raw.x_height.map(f64::from),
            cap_height: raw.cap_height.map(f64::from),
        }
        .or_defaults();

        let naming = NamingInfo {
            family: localized(&font, StringId::FAMILY_NAME),
            subfamily: localized(&font, StringId::SUBFAMILY_NAME),
            full_name: localized(&font, StringId::FULL_NAME),
            version: localized(&font, StringId::VERSION_STRING),
            description: localized(&font, StringId::DESCRIPTION),
            manufacturer: localized(&font, StringId::MANUFACTURER),
            license: localized(&font, StringId::LICENSE_DESCRIPTION),
            copyright: localized(&font, StringId::COPYRIGHT_NOTICE),
        };
        let glyph_count = u32::from(raw.glyph_count);

        tracing::debug!(
            "Parsed font '{}': {} glyphs, {} mapped code points, {} upm",
            naming.display_name(),
            glyph_count,
            charmap.len(),
            metrics.units_per_em
        );

        Ok(Self {
            data,
            charmap,
            metrics,
            naming,
            glyph_count,
        })
    }

    fn font(&self) -> Option<FontRef<'_>> {
        // validated in from_bytes
        FontRef::new(&self.data).ok()
    }

    fn reader(&self) -> Option<GlyphReader<'_>> {
        let font = self.font()?;
        Some(GlyphReader {
            metrics: font.glyph_metrics(Size::unscaled(), LocationRef::default()),
            outlines: font.outline_glyphs(),
            glyph_count: self.glyph_count,
        })
    }
}

/// Outline and metric tables of one font, parsed once for many lookups
struct GlyphReader<'a> {
    metrics: GlyphMetrics<'a>,
    outlines: OutlineGlyphCollection<'a>,
    glyph_count: u32,
}

impl GlyphReader<'_> {
    fn read(&self, glyph_id: u32) -> Option<SourceGlyph> {
        if glyph_id >= self.glyph_count {
            return None;
        }
        let gid = GlyphId::new(glyph_id);
        let advance_width = self.metrics.advance_width(gid).unwrap_or(0.0);
        let left_side_bearing = self.metrics.left_side_bearing(gid).unwrap_or(0.0);

        let mut pen = BezPathPen::default();
        if let Some(outline) = self.outlines.get(gid) {
            let settings = DrawSettings::unhinted(Size::unscaled(), LocationRef::default());
            if let Err(error) = outline.draw(settings, &mut pen) {
                tracing::debug!("Skipping glyph {}: {:?}", glyph_id, error);
                return None;
            }
        }

        Some(SourceGlyph {
            advance_width: f64::from(advance_width),
            left_side_bearing: f64::from(left_side_bearing),
            outline: pen.into_path(),
        })
    }
}

fn localized(font: &FontRef<'_>, id: StringId) -> Option<String> {
    font.localized_strings(id)
        .english_or_first()
        .map(|s| s.chars().collect::<String>())
        .filter(|s| !s.trim().is_empty())
}

impl GlyphSource for ParsedFont {
    fn metrics(&self) -> VerticalMetrics {
        self.metrics
    }

    fn naming(&self) -> NamingInfo {
        self.naming.clone()
    }

    fn glyph_count(&self) -> u32 {
        self.glyph_count
    }

    fn glyph_index(&self, codepoint: u32) -> Option<u32> {
        self.charmap.get(&codepoint).copied()
    }

    fn glyph(&self, glyph_id: u32) -> Option<SourceGlyph> {
        self.reader()?.read(glyph_id)
    }

    fn glyphs(&self, glyph_ids: &[u32]) -> Vec<Option<SourceGlyph>> {
        match self.reader() {
            Some(reader) => glyph_ids.iter().map(|id| reader.read(*id)).collect(),
            None => vec![None; glyph_ids.len()],
        }
    }

    fn table_data(&self, tag: [u8; 4]) -> Option<Vec<u8>> {
        let font = self.font()?;
        font.table_data(Tag::new(&tag))
            .map(|data| data.as_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::assembler::FontAssembler;
    use crate::build::serializer::{FontSerializer, TtfSerializer};
    use crate::font_source::{FontOrigin, NOTDEF_GLYPH_ID};
    use crate::merge::glyph_set::{GlyphRecord, GlyphSetBuilder};
    use chrono::{TimeZone, Utc};

    fn encoded() -> Vec<u8> {
        let mut builder = GlyphSetBuilder::new(GlyphRecord::notdef(
            SourceGlyph::rectangle(500.0, 700.0),
            FontOrigin::English,
        ));
        builder.extend((0x41..=0x43).map(|cp| {
            GlyphRecord::from_source(cp, SourceGlyph::rectangle(600.0, 700.0), FontOrigin::English)
        }));
        let spec = FontAssembler::new(
            "Parsed",
            VerticalMetrics::with_defaults(1000),
            NamingInfo::default(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        )
        .assemble(builder.finish());
        TtfSerializer.serialize(&spec).unwrap()
    }

    #[test]
    fn batch_reads_match_single_reads() {
        let font = ParsedFont::from_bytes(encoded()).unwrap();
        assert_eq!(font.glyph_count(), 4);
        assert_eq!(font.naming().family.as_deref(), Some("Parsed"));

        let ids = [NOTDEF_GLYPH_ID, 1, 2, 3, 4, 99];
        let batch = font.glyphs(&ids);
        assert_eq!(batch.len(), ids.len());
        for (id, glyph) in ids.iter().zip(&batch) {
            assert_eq!(*glyph, font.glyph(*id), "glyph {id}");
        }
        assert!(batch[4].is_none() && batch[5].is_none());

        let a = batch[1].as_ref().unwrap();
        assert_eq!(a.advance_width, 600.0);
        assert_eq!(a.left_side_bearing, 60.0);
        assert!(a.is_renderable());
    }

    #[test]
    fn charmap_and_tables_are_read() {
        let font = ParsedFont::from_bytes(encoded()).unwrap();
        assert_eq!(font.glyph_index(0x41), Some(1));
        assert_eq!(font.glyph_index(0x44), None);
        assert!(font.table_data(*b"head").is_some());
        assert!(font.table_data(*b"GSUB").is_none());
    }
}
