//! Font assembly
//!
//! Turns a normalized [`GlyphSet`] into a [`MergedFontSpec`]: the complete,
//! typed description of the output font. Serializers only ever see a spec,
//! never the source fonts.

use crate::font_source::{GlyphSource, NamingInfo, VerticalMetrics};
use crate::merge::glyph_set::GlyphSet;
use crate::merge::naming::{postscript_name, REGULAR_STYLE};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Layout tables that can follow ligature and icon glyphs out of the Latin font
pub const LAYOUT_TABLES: [[u8; 4]; 3] = [*b"GSUB", *b"GPOS", *b"GDEF"];

/// Tables copied byte for byte whenever the Latin font has them
pub const PASSTHROUGH_TABLES: [[u8; 4]; 1] = [*b"gasp"];

const DEFAULT_VERSION: &str = "Version 1.000";
const DEFAULT_DESCRIPTION: &str = "Hangul and Latin glyphs merged for fixed-width editing";
const DEFAULT_MANUFACTURER: &str = "hangeul-merge";
const DEFAULT_LICENSE: &str = "Use is subject to the licenses of the source fonts";

/// OpenType name IDs used by merged fonts
pub mod name_id {
    pub const COPYRIGHT: u16 = 0;
    pub const FAMILY: u16 = 1;
    pub const SUBFAMILY: u16 = 2;
    pub const UNIQUE_ID: u16 = 3;
    pub const FULL_NAME: u16 = 4;
    pub const VERSION: u16 = 5;
    pub const POSTSCRIPT_NAME: u16 = 6;
    pub const MANUFACTURER: u16 = 8;
    pub const DESCRIPTION: u16 = 10;
    pub const LICENSE: u16 = 13;

    /// Records kept by a minimal build
    pub const ESSENTIAL: [u16; 4] = [FAMILY, SUBFAMILY, FULL_NAME, POSTSCRIPT_NAME];
}

/// Which table set a spec asks for
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Every table, including inherited ones
    #[default]
    Full,
    /// Glyphs, basic metrics and essential names only
    Minimal,
}

impl std::fmt::Display for BuildMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildMode::Full => f.write_str("full"),
            BuildMode::Minimal => f.write_str("minimal"),
        }
    }
}

/// Naming table records keyed by name ID
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NameTable {
    records: BTreeMap<u16, String>,
}

impl NameTable {
    pub fn set(&mut self, name_id: u16, value: impl Into<String>) {
        self.records.insert(name_id, value.into());
    }

    pub fn get(&self, name_id: u16) -> Option<&str> {
        self.records.get(&name_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in name ID order
    pub fn iter(&self) -> impl Iterator<Item = (u16, &str)> {
        self.records.iter().map(|(id, value)| (*id, value.as_str()))
    }

    fn essential(&self) -> Self {
        Self {
            records: self
                .records
                .iter()
                .filter(|(id, _)| name_id::ESSENTIAL.contains(*id))
                .map(|(id, value)| (*id, value.clone()))
                .collect(),
        }
    }
}

/// OS/2 classification of a merged font
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Classification {
    pub weight_class: u16,
    pub width_class: u16,
    pub panose: [u8; 10],
    /// `ulUnicodeRange1..4`
    pub unicode_ranges: [u32; 4],
    /// `ulCodePageRange1..2`
    pub code_pages: [u32; 2],
}

impl Classification {
    /// Regular weight, normal width, monospaced Latin text
    pub fn monospace_regular(glyphs: &GlyphSet) -> Self {
        let mut unicode_ranges = [0u32; 4];
        let mut code_pages = [0u32; 2];
        for codepoint in glyphs.codepoints() {
            if let Some(bit) = unicode_range_bit(codepoint) {
                unicode_ranges[bit / 32] |= 1 << (bit % 32);
            }
            match codepoint {
                0x41..=0x5A | 0x61..=0x7A => code_pages[0] |= 1 << 0,
                0xAC00..=0xD7AF => code_pages[0] |= 1 << 19,
                _ => {}
            }
        }
        Self {
            weight_class: 400,
            width_class: 5,
            // Latin text, any serif, book weight, monospaced
            panose: [2, 0, 5, 9, 0, 0, 0, 0, 0, 0],
            unicode_ranges,
            code_pages,
        }
    }
}

/// OS/2 Unicode range bit for the blocks merged fonts can contain
fn unicode_range_bit(codepoint: u32) -> Option<usize> {
    match codepoint {
        0x0000..=0x007F => Some(0),
        0x0080..=0x00FF => Some(1),
        0x1100..=0x11FF | 0xA960..=0xA97F | 0xD7B0..=0xD7FF => Some(28),
        0x2000..=0x206F => Some(31),
        0x3130..=0x318F => Some(52),
        0xAC00..=0xD7AF => Some(56),
        0xE000..=0xF8FF => Some(60),
        0xFB00..=0xFB4F => Some(62),
        _ => None,
    }
}

/// A table carried into the output unchanged
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableOverride {
    pub tag: [u8; 4],
    pub data: Vec<u8>,
}

impl TableOverride {
    pub fn tag_str(&self) -> String {
        String::from_utf8_lossy(&self.tag).into_owned()
    }
}

/// Everything needed to encode a merged font
#[derive(Clone, Debug, PartialEq)]
pub struct MergedFontSpec {
    pub family_name: String,
    pub style_name: String,
    pub postscript_name: String,
    pub units_per_em: u16,
    pub ascender: f64,
    pub descender: f64,
    pub line_gap: f64,
    pub x_height: Option<f64>,
    pub cap_height: Option<f64>,
    pub naming: NameTable,
    /// `None` in minimal builds
    pub classification: Option<Classification>,
    pub glyphs: GlyphSet,
    pub table_overrides: Vec<TableOverride>,
    pub fixed_pitch: bool,
    pub timestamp: DateTime<Utc>,
    pub mode: BuildMode,
}

impl MergedFontSpec {
    /// The reduced spec used when a full build cannot be encoded
    pub fn to_minimal(&self) -> Self {
        Self {
            naming: self.naming.essential(),
            classification: None,
            table_overrides: Vec::new(),
            x_height: None,
            cap_height: None,
            mode: BuildMode::Minimal,
            ..self.clone()
        }
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }
}

/// Builds a [`MergedFontSpec`] around a glyph set
///
/// Metrics and naming come from the font that defines the output's unit
/// space, which is the Latin font for merges.
#[derive(Clone, Debug)]
pub struct FontAssembler {
    family_name: String,
    style_name: String,
    metrics: VerticalMetrics,
    source_naming: NamingInfo,
    timestamp: DateTime<Utc>,
    inherited: Vec<TableOverride>,
}

impl FontAssembler {
    pub fn new(
        family_name: impl Into<String>,
        metrics: VerticalMetrics,
        source_naming: NamingInfo,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            family_name: family_name.into(),
            style_name: REGULAR_STYLE.to_string(),
            metrics: metrics.or_defaults(),
            source_naming,
            timestamp,
            inherited: Vec::new(),
        }
    }

    pub fn with_style(mut self, style_name: impl Into<String>) -> Self {
        self.style_name = style_name.into();
        self
    }

    /// Carry the listed tables over from `source`, skipping absent ones
    pub fn inherit_tables(mut self, source: &dyn GlyphSource, tags: &[[u8; 4]]) -> Self {
        for tag in tags {
            if let Some(data) = source.table_data(*tag) {
                let table = TableOverride { tag: *tag, data };
                tracing::debug!("Inheriting '{}' ({} bytes)", table.tag_str(), table.data.len());
                self.inherited.push(table);
            }
        }
        self
    }

    pub fn assemble(self, glyphs: GlyphSet) -> MergedFontSpec {
        let postscript_name = postscript_name(&self.family_name, &self.style_name);
        let naming = self.name_table(&postscript_name);
        let classification = Classification::monospace_regular(&glyphs);

        tracing::debug!(
            "Assembled '{}' with {} glyphs and {} inherited tables",
            postscript_name,
            glyphs.len(),
            self.inherited.len()
        );

        MergedFontSpec {
            family_name: self.family_name,
            style_name: self.style_name,
            postscript_name,
            units_per_em: self.metrics.units_per_em,
            ascender: self.metrics.ascender,
            descender: self.metrics.descender,
            line_gap: self.metrics.line_gap,
            x_height: self.metrics.x_height,
            cap_height: self.metrics.cap_height,
            naming,
            classification: Some(classification),
            glyphs,
            table_overrides: self.inherited,
            fixed_pitch: true,
            timestamp: self.timestamp,
            mode: BuildMode::Full,
        }
    }

    fn name_table(&self, postscript_name: &str) -> NameTable {
        let source = &self.source_naming;
        let inherited = |value: &Option<String>, default: &str| {
            value
                .as_deref()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(default)
                .to_string()
        };

        let mut table = NameTable::default();
        table.set(name_id::FAMILY, self.family_name.as_str());
        table.set(name_id::SUBFAMILY, self.style_name.as_str());
        table.set(
            name_id::UNIQUE_ID,
            format!("{}-{}", postscript_name, self.timestamp.timestamp()),
        );
        table.set(
            name_id::FULL_NAME,
            format!("{} {}", self.family_name, self.style_name),
        );
        table.set(name_id::VERSION, inherited(&source.version, DEFAULT_VERSION));
        table.set(name_id::POSTSCRIPT_NAME, postscript_name);
        table.set(
            name_id::MANUFACTURER,
            inherited(&source.manufacturer, DEFAULT_MANUFACTURER),
        );
        table.set(
            name_id::DESCRIPTION,
            inherited(&source.description, DEFAULT_DESCRIPTION),
        );
        table.set(name_id::LICENSE, inherited(&source.license, DEFAULT_LICENSE));
        if let Some(copyright) = source.copyright.as_deref().filter(|c| !c.is_empty()) {
            table.set(name_id::COPYRIGHT, copyright);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font_source::{FontOrigin, MemoryFont, SourceGlyph};
    use crate::merge::glyph_set::{GlyphRecord, GlyphSetBuilder};
    use chrono::TimeZone;

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn glyphs(codepoints: &[u32]) -> GlyphSet {
        let mut builder = GlyphSetBuilder::new(GlyphRecord::notdef(
            SourceGlyph::blank(500.0),
            FontOrigin::English,
        ));
        builder.extend(codepoints.iter().map(|cp| {
            GlyphRecord::from_source(*cp, SourceGlyph::rectangle(600.0, 700.0), FontOrigin::English)
        }));
        builder.finish()
    }

    fn assembler(naming: NamingInfo) -> FontAssembler {
        FontAssembler::new(
            "My Font!! 2024",
            VerticalMetrics::with_defaults(1000),
            naming,
            timestamp(),
        )
    }

    #[test]
    fn names_derive_from_display_name() {
        let spec = assembler(NamingInfo::default()).assemble(glyphs(&[0x41]));
        assert_eq!(spec.postscript_name, "MyFont2024-Regular");
        assert_eq!(spec.naming.get(name_id::FAMILY), Some("My Font!! 2024"));
        assert_eq!(spec.naming.get(name_id::SUBFAMILY), Some("Regular"));
        assert_eq!(spec.naming.get(name_id::FULL_NAME), Some("My Font!! 2024 Regular"));
        assert_eq!(
            spec.naming.get(name_id::UNIQUE_ID),
            Some(format!("MyFont2024-Regular-{}", timestamp().timestamp()).as_str())
        );
        assert_eq!(spec.naming.get(name_id::VERSION), Some(DEFAULT_VERSION));
        assert_eq!(spec.naming.get(name_id::COPYRIGHT), None);
    }

    #[test]
    fn latin_naming_is_inherited() {
        let naming = NamingInfo {
            version: Some("Version 2.304".to_string()),
            manufacturer: Some("JetBrains".to_string()),
            license: Some("OFL".to_string()),
            copyright: Some("Copyright 2020".to_string()),
            description: Some("  ".to_string()),
            ..NamingInfo::default()
        };
        let spec = assembler(naming).assemble(glyphs(&[0x41]));
        assert_eq!(spec.naming.get(name_id::VERSION), Some("Version 2.304"));
        assert_eq!(spec.naming.get(name_id::MANUFACTURER), Some("JetBrains"));
        assert_eq!(spec.naming.get(name_id::LICENSE), Some("OFL"));
        assert_eq!(spec.naming.get(name_id::COPYRIGHT), Some("Copyright 2020"));
        assert_eq!(spec.naming.get(name_id::DESCRIPTION), Some(DEFAULT_DESCRIPTION));
    }

    #[test]
    fn classification_marks_monospace_regular() {
        let spec = assembler(NamingInfo::default()).assemble(glyphs(&[0x41, 0xAC00, 0xF000]));
        let class = spec.classification.unwrap();
        assert_eq!(class.weight_class, 400);
        assert_eq!(class.width_class, 5);
        assert_eq!(class.panose[3], 9);
        assert_eq!(class.unicode_ranges[0], 1);
        // Hangul syllables and private use sit in the second word
        assert_eq!(class.unicode_ranges[1], (1 << (56 - 32)) | (1 << (60 - 32)));
        assert_eq!(class.code_pages[0], 1 | (1 << 19));
    }

    #[test]
    fn inherits_only_present_tables() {
        let latin = MemoryFont::new(1000)
            .with_table(*b"GSUB", vec![0, 1, 0, 0])
            .with_table(*b"gasp", vec![0, 1, 0, 0]);
        let spec = assembler(NamingInfo::default())
            .inherit_tables(&latin, &LAYOUT_TABLES)
            .inherit_tables(&latin, &PASSTHROUGH_TABLES)
            .assemble(glyphs(&[]));
        let tags: Vec<String> = spec.table_overrides.iter().map(TableOverride::tag_str).collect();
        assert_eq!(tags, vec!["GSUB", "gasp"]);
    }

    #[test]
    fn minimal_spec_keeps_glyphs_and_metrics() {
        let latin = MemoryFont::new(1000).with_table(*b"GSUB", vec![0; 8]);
        let full = assembler(NamingInfo::default())
            .inherit_tables(&latin, &LAYOUT_TABLES)
            .assemble(glyphs(&[0x41, 0x42]));
        let minimal = full.to_minimal();

        assert_eq!(minimal.mode, BuildMode::Minimal);
        assert_eq!(minimal.glyphs, full.glyphs);
        assert_eq!(minimal.units_per_em, full.units_per_em);
        assert_eq!(minimal.ascender, full.ascender);
        assert!(minimal.table_overrides.is_empty());
        assert!(minimal.classification.is_none());
        assert_eq!(minimal.naming.len(), name_id::ESSENTIAL.len());
        assert_eq!(minimal.naming.get(name_id::POSTSCRIPT_NAME), Some("MyFont2024-Regular"));
    }
}
