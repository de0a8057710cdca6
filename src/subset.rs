//! Text subsetting
//!
//! Builds a font holding only the glyphs needed to render a piece of text,
//! through the same assembly and two-phase build as a merge.

use crate::build::assembler::{BuildMode, FontAssembler};
use crate::build::guard::SerializationGuard;
use crate::build::serializer::{FontSerializer, TtfSerializer};
use crate::core::errors::{EngineResult, MergeError};
use crate::font_source::{format_file_size, SourceFontAsset, NOTDEF_GLYPH_ID};
use crate::merge::glyph_set::{GlyphRecord, GlyphSetBuilder};
use crate::merge::MergeConfig;
use chrono::Utc;
use std::collections::BTreeSet;

const DEFAULT_FAMILY: &str = "SubsetFont";
const DEFAULT_STYLE: &str = "Regular";

/// A font cut down to one text
#[derive(Clone, Debug)]
pub struct SubsetResult {
    pub font: Vec<u8>,
    /// `<source stem>_subset.ttf`
    pub file_name: String,
    pub family_name: String,
    pub postscript_name: String,
    /// Including notdef
    pub glyph_count: usize,
    /// Characters of the text the source font cannot render
    pub missing: Vec<char>,
    pub build_mode: BuildMode,
}

/// Subset `source` to the unique characters of `text`
pub fn subset_font(
    source: &SourceFontAsset,
    text: &str,
    config: &MergeConfig,
) -> EngineResult<SubsetResult> {
    subset_font_with(&TtfSerializer, source, text, config)
}

pub fn subset_font_with(
    serializer: &dyn FontSerializer,
    source: &SourceFontAsset,
    text: &str,
    config: &MergeConfig,
) -> EngineResult<SubsetResult> {
    let chars: BTreeSet<char> = text.chars().collect();
    if chars.is_empty() {
        return Err(MergeError::validation("Enter the text to keep in the subset"));
    }

    let font = source.font();
    let naming = font.naming();
    let family_name = naming
        .family
        .clone()
        .filter(|family| !family.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FAMILY.to_string());
    let style_name = naming
        .subfamily
        .clone()
        .filter(|style| !style.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_STYLE.to_string());

    let notdef = font
        .notdef()
        .unwrap_or_else(|| crate::font_source::SourceGlyph::blank(0.0));
    let mut builder = GlyphSetBuilder::new(GlyphRecord::notdef(notdef, source.origin()));
    let mut missing = Vec::new();

    for ch in &chars {
        let codepoint = u32::from(*ch);
        let glyph = font
            .glyph_index(codepoint)
            .filter(|glyph_id| *glyph_id != NOTDEF_GLYPH_ID)
            .and_then(|glyph_id| font.glyph(glyph_id))
            .filter(|glyph| glyph.is_renderable());
        match glyph {
            Some(glyph) => {
                builder.extend([GlyphRecord::from_source(codepoint, glyph, source.origin())]);
            }
            None => missing.push(*ch),
        }
    }
    if !missing.is_empty() {
        tracing::warn!(
            "{} of {} characters are not in {}",
            missing.len(),
            chars.len(),
            source.display_name()
        );
    }

    let spec = FontAssembler::new(
        family_name.as_str(),
        font.metrics(),
        naming,
        config.timestamp.unwrap_or_else(Utc::now),
    )
    .with_style(style_name)
    .assemble(builder.finish());

    let built = SerializationGuard::new(config.min_output_bytes).build(serializer, &spec)?;
    let result = SubsetResult {
        file_name: format!("{}_subset.ttf", source.stem()),
        family_name,
        postscript_name: spec.postscript_name.clone(),
        glyph_count: spec.glyph_count(),
        missing,
        build_mode: built.mode,
        font: built.bytes,
    };
    tracing::info!(
        "Subset {} to {} glyphs ({})",
        source.display_name(),
        result.glyph_count,
        format_file_size(result.font.len())
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font_source::{FontOrigin, MemoryFont, NamingInfo};
    use skrifa::{FontRef, MetadataProvider};

    fn source(naming: NamingInfo) -> SourceFontAsset {
        SourceFontAsset::new(
            MemoryFont::new(1000)
                .with_box_glyphs(0x41, 0x5A, 600.0)
                .with_box_glyphs(0xAC00, 0xAC10, 1000.0)
                .with_naming(naming),
            FontOrigin::English,
            "Sample.otf",
            100,
        )
    }

    #[test]
    fn keeps_unique_characters_only() {
        let result = subset_font(&source(NamingInfo::default()), "ABBA 가가", &MergeConfig::default())
            .unwrap();
        // notdef, A, B, 가; the space is missing from the source
        assert_eq!(result.glyph_count, 4);
        assert_eq!(result.missing, vec![' ']);
        assert_eq!(result.file_name, "Sample_subset.ttf");

        let font = FontRef::new(&result.font).unwrap();
        assert!(font.charmap().map('가').is_some());
        assert!(font.charmap().map('C').is_none());
    }

    #[test]
    fn names_fall_back_to_defaults() {
        let result =
            subset_font(&source(NamingInfo::default()), "A", &MergeConfig::default()).unwrap();
        assert_eq!(result.family_name, "SubsetFont");
        assert_eq!(result.postscript_name, "SubsetFont-Regular");
    }

    #[test]
    fn names_follow_source_family() {
        let naming = NamingInfo {
            family: Some("Nanum Gothic".to_string()),
            subfamily: Some("Bold".to_string()),
            ..NamingInfo::default()
        };
        let result = subset_font(&source(naming), "A", &MergeConfig::default()).unwrap();
        assert_eq!(result.family_name, "Nanum Gothic");
        assert_eq!(result.postscript_name, "NanumGothic-Bold");
    }

    #[test]
    fn empty_text_is_rejected() {
        let err = subset_font(&source(NamingInfo::default()), "", &MergeConfig::default())
            .unwrap_err();
        assert!(matches!(err, MergeError::Validation(_)));
    }
}
