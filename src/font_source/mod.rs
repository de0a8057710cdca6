//! Font source data structures
//!
//! This module contains everything related to the two fonts being merged,
//! as opposed to the merged output. Source fonts are reached through the
//! [`GlyphSource`] trait so the engine never depends on how a font was
//! obtained: parsed from a file ([`ParsedFont`]) or assembled in memory
//! ([`MemoryFont`]).

pub mod memory;
pub mod metrics;
pub mod parsed;

use crate::core::errors::{EngineResult, MergeError};
use crate::data::outline;
use kurbo::BezPath;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use memory::MemoryFont;
pub use metrics::{NamingInfo, VerticalMetrics};
pub use parsed::ParsedFont;

/// Glyph index of the required placeholder glyph
pub const NOTDEF_GLYPH_ID: u32 = 0;

/// Which role a source font plays in a merge
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontOrigin {
    /// Provides Hangul coverage
    Korean,
    /// Provides Latin, digit, symbol and icon coverage
    English,
}

impl FontOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            FontOrigin::Korean => "korean",
            FontOrigin::English => "english",
        }
    }
}

impl std::fmt::Display for FontOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outline and horizontal metrics of one glyph, in its font's units
#[derive(Clone, Debug, PartialEq)]
pub struct SourceGlyph {
    pub advance_width: f64,
    pub left_side_bearing: f64,
    pub outline: BezPath,
}

impl SourceGlyph {
    /// A glyph that occupies space but draws nothing (e.g. U+0020)
    pub fn blank(advance_width: f64) -> Self {
        Self {
            advance_width,
            left_side_bearing: 0.0,
            outline: BezPath::new(),
        }
    }

    /// A filled rectangle inset from the advance box
    pub fn rectangle(advance_width: f64, height: f64) -> Self {
        let inset = (advance_width * 0.1).round();
        let mut path = BezPath::new();
        path.move_to((inset, 0.0));
        path.line_to((inset, height));
        path.line_to((advance_width - inset, height));
        path.line_to((advance_width - inset, 0.0));
        path.close_path();
        Self {
            advance_width,
            left_side_bearing: inset,
            outline: path,
        }
    }

    /// Whether this glyph is a real glyph worth copying
    ///
    /// A glyph counts when it draws something or at least advances the pen.
    pub fn is_renderable(&self) -> bool {
        !outline::is_empty(&self.outline) || self.advance_width > 0.0
    }
}

/// Read-only access to a parsed font's glyphs and metadata
///
/// Implementations must not change observable state on lookup; the engine
/// may query the same source from several merges.
pub trait GlyphSource: Send + Sync {
    /// Units per em and vertical metrics
    fn metrics(&self) -> VerticalMetrics;

    /// Naming table strings
    fn naming(&self) -> NamingInfo;

    /// Number of glyphs in the font
    fn glyph_count(&self) -> u32;

    /// Nominal glyph for a code point, via the character map
    fn glyph_index(&self, codepoint: u32) -> Option<u32>;

    /// Outline and metrics of a glyph
    fn glyph(&self, glyph_id: u32) -> Option<SourceGlyph>;

    /// Several glyphs at once, in the order of `glyph_ids`
    ///
    /// Sources that parse tables per lookup override this to parse once.
    fn glyphs(&self, glyph_ids: &[u32]) -> Vec<Option<SourceGlyph>> {
        glyph_ids.iter().map(|glyph_id| self.glyph(*glyph_id)).collect()
    }

    /// Raw bytes of a table, for tables carried through unchanged
    fn table_data(&self, _tag: [u8; 4]) -> Option<Vec<u8>> {
        None
    }

    /// The placeholder glyph at index 0
    fn notdef(&self) -> Option<SourceGlyph> {
        self.glyph(NOTDEF_GLYPH_ID)
    }
}

/// A loaded source font plus what the user knows it by
///
/// Assets are owned by the caller and only borrowed by a merge, so the same
/// pair can be merged again with different options without reloading.
pub struct SourceFontAsset {
    font: Box<dyn GlyphSource>,
    origin: FontOrigin,
    display_name: String,
    byte_size: usize,
}

impl std::fmt::Debug for SourceFontAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceFontAsset")
            .field("origin", &self.origin)
            .field("display_name", &self.display_name)
            .field("byte_size", &self.byte_size)
            .finish()
    }
}

impl SourceFontAsset {
    /// Wrap an already parsed font
    pub fn new(
        font: impl GlyphSource + 'static,
        origin: FontOrigin,
        display_name: impl Into<String>,
        byte_size: usize,
    ) -> Self {
        Self {
            font: Box::new(font),
            origin,
            display_name: display_name.into(),
            byte_size,
        }
    }

    /// Parse font bytes
    pub fn from_bytes(
        data: Vec<u8>,
        origin: FontOrigin,
        display_name: impl Into<String>,
    ) -> EngineResult<Self> {
        let display_name = display_name.into();
        let byte_size = data.len();
        let font = ParsedFont::from_bytes(data).map_err(|e| MergeError::FontLoad {
            name: display_name.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self::new(font, origin, display_name, byte_size))
    }

    /// Read and parse a font file
    ///
    /// The display name is the file name, as shown to the user after upload.
    pub fn load(path: impl AsRef<Path>, origin: FontOrigin) -> EngineResult<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| MergeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let display_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let asset = Self::from_bytes(data, origin, display_name)?;
        tracing::info!(
            "Loaded {} font {} ({})",
            origin,
            asset.display_name,
            format_file_size(asset.byte_size)
        );
        Ok(asset)
    }

    pub fn font(&self) -> &dyn GlyphSource {
        self.font.as_ref()
    }

    pub fn origin(&self) -> FontOrigin {
        self.origin
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Display name without its file extension
    pub fn stem(&self) -> &str {
        Path::new(&self.display_name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(&self.display_name)
    }

    pub fn byte_size(&self) -> usize {
        self.byte_size
    }

    /// One-line description for listings, e.g. `D2Coding.ttf (4.1 MB)`
    pub fn describe(&self) -> String {
        format!("{} ({})", self.display_name, format_file_size(self.byte_size))
    }
}

/// Format a byte count the way file sizes are shown to users
pub fn format_file_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    let size = bytes as f64;
    if size < KB {
        format!("{bytes} B")
    } else if size < KB * KB {
        format!("{:.1} KB", size / KB)
    } else {
        format!("{:.1} MB", size / (KB * KB))
    }
}
