//! Two-phase build
//!
//! Serialize the full spec first. When the serializer rejects a table, build
//! the minimal spec once instead. Either way, refuse output too small to be
//! a real font.

use super::assembler::{BuildMode, MergedFontSpec};
use super::serializer::FontSerializer;
use crate::core::errors::SerializeError;

/// Smallest accepted font; a notdef-only TrueType font is a few hundred bytes
pub const DEFAULT_MIN_OUTPUT_BYTES: usize = 256;

/// Encoded font bytes and how they were produced
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuiltFont {
    pub bytes: Vec<u8>,
    pub mode: BuildMode,
    /// The full-build error that triggered the minimal build
    pub fallback_reason: Option<SerializeError>,
}

#[derive(Clone, Copy, Debug)]
pub struct SerializationGuard {
    min_output_bytes: usize,
}

impl Default for SerializationGuard {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_OUTPUT_BYTES)
    }
}

impl SerializationGuard {
    pub fn new(min_output_bytes: usize) -> Self {
        Self { min_output_bytes }
    }

    pub fn build(
        &self,
        serializer: &dyn FontSerializer,
        spec: &MergedFontSpec,
    ) -> Result<BuiltFont, SerializeError> {
        match serializer.serialize(spec) {
            Ok(bytes) => self.accept(bytes, spec.mode, None),
            Err(error) if error.is_recoverable() && spec.mode == BuildMode::Full => {
                tracing::warn!("Full build failed ({}), retrying with minimal tables", error);
                let minimal = spec.to_minimal();
                let bytes = serializer.serialize(&minimal)?;
                self.accept(bytes, minimal.mode, Some(error))
            }
            Err(error) => Err(error),
        }
    }

    fn accept(
        &self,
        bytes: Vec<u8>,
        mode: BuildMode,
        fallback_reason: Option<SerializeError>,
    ) -> Result<BuiltFont, SerializeError> {
        if bytes.len() < self.min_output_bytes {
            return Err(SerializeError::TooSmall {
                size: bytes.len(),
                minimum: self.min_output_bytes,
            });
        }
        Ok(BuiltFont {
            bytes,
            mode,
            fallback_reason,
        })
    }
}
