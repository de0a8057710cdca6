//! TrueType encoding of merged font specs
//!
//! [`TtfSerializer`] writes `glyf`-flavoured fonts with write-fonts. It
//! generates every required table from the spec and copies inherited tables
//! verbatim when it can prove they stay valid.

use super::assembler::{BuildMode, MergedFontSpec, TableOverride};
use crate::core::errors::SerializeError;
use crate::data::outline::{self, QUADRATIC_ACCURACY};
use write_fonts::tables::cmap::Cmap;
use write_fonts::tables::glyf::{GlyfLocaBuilder, Glyph, SimpleGlyph};
use write_fonts::tables::head::Head;
use write_fonts::tables::hhea::Hhea;
use write_fonts::tables::hmtx::{Hmtx, LongMetric};
use write_fonts::tables::loca::LocaFormat;
use write_fonts::tables::maxp::Maxp;
use write_fonts::tables::name::{Name, NameRecord};
use write_fonts::tables::os2::{Os2, SelectionFlags};
use write_fonts::tables::post::Post;
use write_fonts::types::{FWord, Fixed, GlyphId, LongDateTime, NameId, Tag, UfWord, Version16Dot16};
use write_fonts::FontBuilder;

/// Seconds between the OpenType epoch (1904-01-01) and the Unix epoch
const MAC_EPOCH_OFFSET: i64 = 2_082_844_800;

/// Tables this serializer always generates itself
pub const GENERATED_TABLES: [[u8; 4]; 10] = [
    *b"cmap", *b"glyf", *b"head", *b"hhea", *b"hmtx", *b"loca", *b"maxp", *b"name", *b"OS/2",
    *b"post",
];

/// Tables that address glyphs by ID and break when glyphs are renumbered
pub const GLYPH_BOUND_TABLES: [[u8; 4]; 14] = [
    *b"GSUB", *b"GPOS", *b"GDEF", *b"BASE", *b"JSTF", *b"MATH", *b"kern", *b"morx", *b"COLR",
    *b"CPAL", *b"SVG ", *b"sbix", *b"CBDT", *b"CBLC",
];

/// Turns a spec into font file bytes
pub trait FontSerializer: Send + Sync {
    fn serialize(&self, spec: &MergedFontSpec) -> Result<Vec<u8>, SerializeError>;
}

/// TrueType serializer backed by write-fonts
#[derive(Clone, Copy, Debug, Default)]
pub struct TtfSerializer;

/// Running totals gathered while encoding outlines
#[derive(Debug, Default)]
struct OutlineStats {
    x_min: i16,
    y_min: i16,
    x_max: i16,
    y_max: i16,
    max_points: u16,
    max_contours: u16,
    min_left_side_bearing: i16,
    min_right_side_bearing: i16,
    x_max_extent: i16,
    any_drawn: bool,
}

impl OutlineStats {
    fn add(&mut self, advance: u16, glyph: &SimpleGlyph, contours: usize, points: usize) {
        let bbox = &glyph.bbox;
        let lsb = bbox.x_min;
        let rsb = advance as i32 - bbox.x_max as i32;
        let extent = lsb as i32 + (bbox.x_max as i32 - bbox.x_min as i32);
        let rsb = rsb.clamp(i16::MIN as i32, i16::MAX as i32) as i16;
        let extent = extent.clamp(i16::MIN as i32, i16::MAX as i32) as i16;

        if self.any_drawn {
            self.x_min = self.x_min.min(bbox.x_min);
            self.y_min = self.y_min.min(bbox.y_min);
            self.x_max = self.x_max.max(bbox.x_max);
            self.y_max = self.y_max.max(bbox.y_max);
            self.min_left_side_bearing = self.min_left_side_bearing.min(lsb);
            self.min_right_side_bearing = self.min_right_side_bearing.min(rsb);
            self.x_max_extent = self.x_max_extent.max(extent);
        } else {
            self.x_min = bbox.x_min;
            self.y_min = bbox.y_min;
            self.x_max = bbox.x_max;
            self.y_max = bbox.y_max;
            self.min_left_side_bearing = lsb;
            self.min_right_side_bearing = rsb;
            self.x_max_extent = extent;
            self.any_drawn = true;
        }
        self.max_contours = self.max_contours.max(saturate(contours));
        self.max_points = self.max_points.max(saturate(points));
    }
}

fn saturate(value: usize) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

fn to_i16(value: f64) -> i16 {
    value.round().clamp(i16::MIN as f64, i16::MAX as f64) as i16
}

fn to_u16(value: f64) -> u16 {
    value.round().clamp(0.0, u16::MAX as f64) as u16
}

impl TtfSerializer {
    /// Reject inherited tables that cannot be copied as-is
    fn check_overrides(overrides: &[TableOverride]) -> Result<(), SerializeError> {
        for table in overrides {
            if GLYPH_BOUND_TABLES.contains(&table.tag) {
                return Err(SerializeError::unsupported(
                    table.tag_str(),
                    "references glyph IDs of the source font",
                ));
            }
            if GENERATED_TABLES.contains(&table.tag) {
                return Err(SerializeError::unsupported(
                    table.tag_str(),
                    "collides with a generated table",
                ));
            }
        }
        Ok(())
    }

    fn encode(&self, spec: &MergedFontSpec) -> Result<Vec<u8>, SerializeError> {
        let glyph_count = spec.glyphs.len();
        let num_glyphs = u16::try_from(glyph_count)
            .map_err(|_| SerializeError::TooManyGlyphs { count: glyph_count })?;
        Self::check_overrides(&spec.table_overrides)?;

        let upm = f64::from(spec.units_per_em);
        let mut glyf_builder = GlyfLocaBuilder::new();
        let mut metrics = Vec::with_capacity(glyph_count);
        let mut stats = OutlineStats::default();
        let mut advance_sum = 0u64;
        let mut advance_count = 0u64;
        let mut advance_max = 0u16;

        for record in &spec.glyphs {
            let advance = to_u16(record.advance_width);
            let path = outline::to_quadratic(&record.outline, QUADRATIC_ACCURACY);

            let (glyph, lsb) = if outline::is_empty(&path) {
                (Glyph::Empty, 0)
            } else {
                let glyf_path = outline::to_glyf_path(&path);
                let simple = SimpleGlyph::from_bezpath(&glyf_path).map_err(|e| {
                    SerializeError::Outline {
                        glyph: record.name.clone(),
                        reason: format!("{e:?}"),
                    }
                })?;
                let (contours, points) = outline::contour_stats(&path);
                stats.add(advance, &simple, contours, points);
                let lsb = simple.bbox.x_min;
                (Glyph::Simple(simple), lsb)
            };

            glyf_builder
                .add_glyph(&glyph)
                .map_err(|e| SerializeError::invalid("glyf", format!("{e:?}")))?;
            metrics.push(LongMetric::new(advance, lsb));

            if advance > 0 {
                advance_sum += u64::from(advance);
                advance_count += 1;
            }
            advance_max = advance_max.max(advance);
        }
        let (glyf, loca, loca_format) = glyf_builder.build();

        let mappings: Vec<(char, GlyphId)> = spec
            .glyphs
            .mappings()
            .filter_map(|(codepoint, glyph_id)| {
                char::from_u32(codepoint).map(|ch| (ch, GlyphId::new(glyph_id as _)))
            })
            .collect();
        let cmap = Cmap::from_mappings(mappings.iter().copied())
            .map_err(|e| SerializeError::invalid("cmap", format!("{e:?}")))?;

        let created = LongDateTime::new(spec.timestamp.timestamp() + MAC_EPOCH_OFFSET);
        let head = Head {
            font_revision: Fixed::from_f64(1.0),
            units_per_em: spec.units_per_em,
            created,
            modified: created,
            x_min: stats.x_min,
            y_min: stats.y_min,
            x_max: stats.x_max,
            y_max: stats.y_max,
            lowest_rec_ppem: 8,
            font_direction_hint: 2,
            index_to_loc_format: match loca_format {
                LocaFormat::Short => 0,
                LocaFormat::Long => 1,
            },
            ..Default::default()
        };

        let hhea = Hhea {
            ascender: FWord::new(to_i16(spec.ascender)),
            descender: FWord::new(to_i16(spec.descender)),
            line_gap: FWord::new(to_i16(spec.line_gap)),
            advance_width_max: UfWord::new(advance_max),
            min_left_side_bearing: FWord::new(stats.min_left_side_bearing),
            min_right_side_bearing: FWord::new(stats.min_right_side_bearing),
            x_max_extent: FWord::new(stats.x_max_extent),
            caret_slope_rise: 1,
            caret_slope_run: 0,
            caret_offset: 0,
            number_of_h_metrics: num_glyphs,
            ..Default::default()
        };
        let hmtx = Hmtx::new(metrics, Vec::new());

        let maxp = Maxp {
            num_glyphs,
            max_points: Some(stats.max_points),
            max_contours: Some(stats.max_contours),
            max_composite_points: Some(0),
            max_composite_contours: Some(0),
            max_zones: Some(2),
            max_twilight_points: Some(0),
            max_storage: Some(0),
            max_function_defs: Some(0),
            max_instruction_defs: Some(0),
            max_stack_elements: Some(0),
            max_size_of_instructions: Some(0),
            max_component_elements: Some(0),
            max_component_depth: Some(0),
            ..Default::default()
        };

        let name = Name::new(
            spec.naming
                .iter()
                .map(|(id, value)| {
                    NameRecord::new(3, 1, 0x409, NameId::new(id), value.to_string().into())
                })
                .collect(),
        );

        let average_width = if advance_count == 0 {
            0
        } else {
            (advance_sum / advance_count) as i16
        };
        let first_char = spec.glyphs.codepoints().min().unwrap_or(0);
        let last_char = spec.glyphs.codepoints().max().unwrap_or(0);
        let win_ascent = to_u16(spec.ascender.max(f64::from(stats.y_max)));
        let win_descent = to_u16((-spec.descender).max(-f64::from(stats.y_min)));

        let mut os2 = Os2 {
            x_avg_char_width: average_width,
            us_weight_class: 400,
            us_width_class: 5,
            fs_selection: SelectionFlags::REGULAR,
            us_first_char_index: first_char.min(0xFFFF) as u16,
            us_last_char_index: last_char.min(0xFFFF) as u16,
            s_typo_ascender: to_i16(spec.ascender),
            s_typo_descender: to_i16(spec.descender),
            s_typo_line_gap: to_i16(spec.line_gap),
            us_win_ascent: win_ascent,
            us_win_descent: win_descent,
            ul_code_page_range_1: Some(0),
            ul_code_page_range_2: Some(0),
            sx_height: Some(to_i16(spec.x_height.unwrap_or(upm * 0.5))),
            s_cap_height: Some(to_i16(spec.cap_height.unwrap_or(spec.ascender))),
            us_default_char: Some(0),
            us_break_char: Some(0x20),
            us_max_context: Some(0),
            ..Default::default()
        };
        if let Some(class) = &spec.classification {
            os2.us_weight_class = class.weight_class;
            os2.us_width_class = class.width_class;
            os2.panose_10 = class.panose;
            os2.ul_unicode_range_1 = class.unicode_ranges[0];
            os2.ul_unicode_range_2 = class.unicode_ranges[1];
            os2.ul_unicode_range_3 = class.unicode_ranges[2];
            os2.ul_unicode_range_4 = class.unicode_ranges[3];
            os2.ul_code_page_range_1 = Some(class.code_pages[0]);
            os2.ul_code_page_range_2 = Some(class.code_pages[1]);
        }

        let mut post = match spec.mode {
            BuildMode::Full => Post::new_v2(spec.glyphs.iter().map(|g| g.name.as_str())),
            BuildMode::Minimal => Post {
                version: Version16Dot16::VERSION_3_0,
                ..Default::default()
            },
        };
        post.underline_position = FWord::new(to_i16(-upm * 0.1));
        post.underline_thickness = FWord::new(to_i16(upm * 0.05));
        post.is_fixed_pitch = u32::from(spec.fixed_pitch);

        let mut builder = FontBuilder::new();
        builder
            .add_table(&head)
            .map_err(|e| SerializeError::invalid("head", e))?;
        builder
            .add_table(&hhea)
            .map_err(|e| SerializeError::invalid("hhea", e))?;
        builder
            .add_table(&maxp)
            .map_err(|e| SerializeError::invalid("maxp", e))?;
        builder
            .add_table(&os2)
            .map_err(|e| SerializeError::invalid("OS/2", e))?;
        builder
            .add_table(&hmtx)
            .map_err(|e| SerializeError::invalid("hmtx", e))?;
        builder
            .add_table(&cmap)
            .map_err(|e| SerializeError::invalid("cmap", e))?;
        builder
            .add_table(&loca)
            .map_err(|e| SerializeError::invalid("loca", e))?;
        builder
            .add_table(&glyf)
            .map_err(|e| SerializeError::invalid("glyf", e))?;
        builder
            .add_table(&name)
            .map_err(|e| SerializeError::invalid("name", e))?;
        builder
            .add_table(&post)
            .map_err(|e| SerializeError::invalid("post", e))?;
        for table in &spec.table_overrides {
            builder.add_raw(Tag::new(&table.tag), table.data.clone());
        }
        Ok(builder.build())
    }
}

impl FontSerializer for TtfSerializer {
    fn serialize(&self, spec: &MergedFontSpec) -> Result<Vec<u8>, SerializeError> {
        let bytes = self.encode(spec)?;
        tracing::debug!(
            "Encoded {} glyphs into {} bytes ({} build)",
            spec.glyphs.len(),
            bytes.len(),
            spec.mode
        );
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::assembler::FontAssembler;
    use crate::font_source::{FontOrigin, NamingInfo, SourceGlyph, VerticalMetrics};
    use crate::merge::glyph_set::{GlyphRecord, GlyphSetBuilder};
    use chrono::{TimeZone, Utc};
    use skrifa::raw::TableProvider;
    use skrifa::{FontRef, MetadataProvider};

    fn spec(codepoints: &[u32]) -> MergedFontSpec {
        let mut builder = GlyphSetBuilder::new(GlyphRecord::notdef(
            SourceGlyph::rectangle(500.0, 700.0),
            FontOrigin::English,
        ));
        builder.extend(codepoints.iter().map(|cp| {
            GlyphRecord::from_source(*cp, SourceGlyph::rectangle(600.0, 700.0), FontOrigin::English)
        }));
        FontAssembler::new(
            "Test Mono",
            VerticalMetrics::with_defaults(1000),
            NamingInfo::default(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        )
        .assemble(builder.finish())
    }

    #[test]
    fn output_parses_back() {
        let bytes = TtfSerializer.serialize(&spec(&[0x41, 0x42, 0xAC00])).unwrap();
        let font = FontRef::new(&bytes).unwrap();

        assert_eq!(font.maxp().unwrap().num_glyphs(), 4);
        assert_eq!(font.head().unwrap().units_per_em(), 1000);
        let charmap = font.charmap();
        assert_eq!(charmap.map('A').map(|g| g.to_u32()), Some(1));
        assert_eq!(charmap.map('가').map(|g| g.to_u32()), Some(3));
        assert_eq!(charmap.map('C'), None);
    }

    #[test]
    fn glyph_bound_tables_are_unsupported() {
        let mut spec = spec(&[0x41]);
        spec.table_overrides.push(TableOverride {
            tag: *b"GSUB",
            data: vec![0, 1, 0, 0],
        });
        let err = TtfSerializer.serialize(&spec).unwrap_err();
        assert!(matches!(err, SerializeError::UnsupportedTable { ref tag, .. } if tag == "GSUB"));
        assert!(err.is_recoverable());
        assert!(TtfSerializer.serialize(&spec.to_minimal()).is_ok());
    }

    #[test]
    fn passthrough_tables_are_copied() {
        let mut spec = spec(&[0x41]);
        let gasp = vec![0, 1, 0, 1, 0xFF, 0xFF, 0, 0x0F];
        spec.table_overrides.push(TableOverride {
            tag: *b"gasp",
            data: gasp.clone(),
        });
        let bytes = TtfSerializer.serialize(&spec).unwrap();
        let font = FontRef::new(&bytes).unwrap();
        let data = font.table_data(skrifa::Tag::new(b"gasp")).unwrap();
        assert_eq!(data.as_bytes(), gasp.as_slice());
    }

    #[test]
    fn generated_tables_cannot_be_overridden() {
        let mut spec = spec(&[0x41]);
        spec.table_overrides.push(TableOverride {
            tag: *b"cmap",
            data: vec![0; 4],
        });
        assert!(matches!(
            TtfSerializer.serialize(&spec),
            Err(SerializeError::UnsupportedTable { .. })
        ));
    }

    #[test]
    fn cubic_outlines_are_encoded() {
        let mut spec = spec(&[]);
        let mut path = kurbo::BezPath::new();
        path.move_to((50.0, 0.0));
        path.curve_to((50.0, 400.0), (450.0, 400.0), (450.0, 0.0));
        path.close_path();
        let mut builder = GlyphSetBuilder::new(spec.glyphs.get(0).unwrap().clone());
        builder.extend([GlyphRecord::from_source(
            0x6F,
            SourceGlyph {
                advance_width: 500.0,
                left_side_bearing: 50.0,
                outline: path,
            },
            FontOrigin::English,
        )]);
        spec.glyphs = builder.finish();

        let bytes = TtfSerializer.serialize(&spec).unwrap();
        let font = FontRef::new(&bytes).unwrap();
        let hmtx = font.hmtx().unwrap();
        assert_eq!(hmtx.advance(skrifa::GlyphId::new(1)), Some(500));
        assert_eq!(hmtx.side_bearing(skrifa::GlyphId::new(1)), Some(50));
    }
}
