//! Hangeul Merge
//!
//! Combines the Hangul glyphs of one font with the Latin, symbol and icon
//! glyphs of another into a single fixed-width TrueType font for code
//! editors.

pub mod build;
pub mod core;
pub mod data;
pub mod font_source;
pub mod logging;
pub mod merge;
pub mod subset;

pub use core::errors::{EngineResult, MergeError, SerializeError};
pub use font_source::{FontOrigin, GlyphSource, SourceFontAsset};
pub use merge::{FontMerger, MergeConfig, MergeRequest, MergeResult, MergeSession, SelectionOptions};
