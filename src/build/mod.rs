//! Output font construction
//!
//! Assembly turns a glyph set into a [`MergedFontSpec`], the serializer
//! encodes specs, and the guard runs the full-then-minimal build.

pub mod assembler;
pub mod guard;
pub mod serializer;

pub use assembler::{BuildMode, FontAssembler, MergedFontSpec};
pub use guard::{BuiltFont, SerializationGuard};
pub use serializer::{FontSerializer, TtfSerializer};
