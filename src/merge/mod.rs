//! The merge engine
//!
//! A merge walks every enabled range in catalog order, pulls real glyphs out
//! of whichever source font governs that range, normalizes advance widths
//! and hands the result to the two-phase build. Each run starts from a fresh
//! glyph set; the only state that outlives a run is the caller's loaded
//! source fonts.

pub mod extract;
pub mod glyph_set;
pub mod naming;
pub mod progress;
pub mod ranges;
pub mod width;

use crate::build::assembler::{
    BuildMode, FontAssembler, MergedFontSpec, LAYOUT_TABLES, PASSTHROUGH_TABLES,
};
use crate::build::guard::{SerializationGuard, DEFAULT_MIN_OUTPUT_BYTES};
use crate::build::serializer::{FontSerializer, TtfSerializer};
use crate::core::errors::{EngineResult, MergeError, SerializeError};
use crate::font_source::{format_file_size, FontOrigin, SourceFontAsset, VerticalMetrics};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use glyph_set::GlyphSetBuilder;
use progress::{MergeProgress, ProgressReporter};
use ranges::{Category, UnicodeRange};
use width::{WidthNormalizer, DEFAULT_WIDTH_RATIO};

pub use ranges::SelectionOptions;

/// Engine tuning
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MergeConfig {
    /// Hangul advance as a multiple of the Latin cell
    pub width_ratio: f64,
    /// Stop Private Use Area scans after a sparse block
    pub fast_icon_scan: bool,
    /// Builds below this size are rejected
    pub min_output_bytes: usize,
    /// Creation time and unique ID stamp; the current time when `None`
    pub timestamp: Option<DateTime<Utc>>,
}

impl MergeConfig {
    /// Reject settings that would break the fixed-width grid
    pub fn validate(&self) -> EngineResult<()> {
        if !self.width_ratio.is_finite() || self.width_ratio <= 0.0 {
            return Err(MergeError::validation(format!(
                "Width ratio must be a positive number, got {}",
                self.width_ratio
            )));
        }
        Ok(())
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            width_ratio: DEFAULT_WIDTH_RATIO,
            fast_icon_scan: false,
            min_output_bytes: DEFAULT_MIN_OUTPUT_BYTES,
            timestamp: None,
        }
    }
}

/// Inputs of one merge run
#[derive(Clone, Debug)]
pub struct MergeRequest<'a> {
    pub korean: Option<&'a SourceFontAsset>,
    pub english: Option<&'a SourceFontAsset>,
    pub options: SelectionOptions,
    /// Free text; an empty name falls back to the English font's file stem
    pub display_name: String,
}

impl<'a> MergeRequest<'a> {
    pub fn new(
        korean: &'a SourceFontAsset,
        english: &'a SourceFontAsset,
        options: SelectionOptions,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            korean: Some(korean),
            english: Some(english),
            options,
            display_name: display_name.into(),
        }
    }
}

/// A finished merge
#[derive(Clone, Debug)]
pub struct MergeResult {
    /// The encoded TrueType font
    pub font: Vec<u8>,
    /// Sanitized download name, e.g. `MyFont2024.ttf`
    pub file_name: String,
    pub display_name: String,
    pub postscript_name: String,
    pub glyph_count: usize,
    pub korean_glyphs: usize,
    pub english_glyphs: usize,
    pub build_mode: BuildMode,
    /// Why the full build was abandoned, for minimal builds
    pub fallback_reason: Option<SerializeError>,
    /// What was encoded, kept for source export
    pub spec: MergedFontSpec,
}

impl MergeResult {
    pub fn size(&self) -> usize {
        self.font.len()
    }

    /// Write the font into `dir` under its sanitized file name
    pub fn write_to(&self, dir: impl AsRef<Path>) -> EngineResult<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|source| MergeError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.font).map_err(|source| MergeError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::info!("Saved {} ({})", path.display(), format_file_size(self.size()));
        Ok(path)
    }
}

/// Clears the busy flag when a run ends, however it ends
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs merges, one at a time
pub struct FontMerger<S = TtfSerializer> {
    serializer: S,
    config: MergeConfig,
    busy: AtomicBool,
}

impl FontMerger<TtfSerializer> {
    pub fn new(config: MergeConfig) -> Self {
        Self::with_serializer(TtfSerializer, config)
    }
}

impl Default for FontMerger<TtfSerializer> {
    fn default() -> Self {
        Self::new(MergeConfig::default())
    }
}

impl<S: FontSerializer> FontMerger<S> {
    pub fn with_serializer(serializer: S, config: MergeConfig) -> Self {
        Self {
            serializer,
            config,
            busy: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn acquire(&self) -> EngineResult<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| BusyGuard(&self.busy))
            .map_err(|_| MergeError::Busy)
    }

    /// Merge on the calling thread, reporting percentages to `progress`
    pub fn merge(
        &self,
        request: &MergeRequest<'_>,
        progress: impl FnMut(f64),
    ) -> EngineResult<MergeResult> {
        let mut job = MergeJob::new(request, &self.config)?;
        let _busy = self.acquire()?;
        let mut reporter = ProgressReporter::new(job.progress(), progress);

        while job.step() {
            reporter.step();
        }
        self.finish(job, &mut reporter)
    }

    /// Like [`merge`](Self::merge), yielding to the runtime between ranges
    pub async fn merge_async(
        &self,
        request: &MergeRequest<'_>,
        progress: impl FnMut(f64),
    ) -> EngineResult<MergeResult> {
        let mut job = MergeJob::new(request, &self.config)?;
        let _busy = self.acquire()?;
        let mut reporter = ProgressReporter::new(job.progress(), progress);

        while job.step() {
            reporter.step();
            tokio::task::yield_now().await;
        }
        self.finish(job, &mut reporter)
    }

    fn finish<F: FnMut(f64)>(
        &self,
        job: MergeJob<'_>,
        reporter: &mut ProgressReporter<F>,
    ) -> EngineResult<MergeResult> {
        match job.build(&self.serializer, &self.config) {
            Ok(result) => {
                reporter.complete();
                Ok(result)
            }
            Err(error) => {
                tracing::error!("Merge failed: {}", error);
                reporter.fail();
                Err(error)
            }
        }
    }
}

/// State of one run: the plan, a cursor into it and the growing glyph set
struct MergeJob<'a> {
    korean: &'a SourceFontAsset,
    english: &'a SourceFontAsset,
    options: SelectionOptions,
    display_name: String,
    plan: Vec<(Category, &'static UnicodeRange)>,
    next: usize,
    target: VerticalMetrics,
    fast_icon_scan: bool,
    builder: GlyphSetBuilder,
}

impl<'a> MergeJob<'a> {
    fn new(request: &MergeRequest<'a>, config: &MergeConfig) -> EngineResult<Self> {
        let (korean, english) = match (request.korean, request.english) {
            (Some(korean), Some(english)) => (korean, english),
            (None, Some(_)) => return Err(MergeError::validation("Korean font is not loaded")),
            (Some(_), None) => return Err(MergeError::validation("English font is not loaded")),
            (None, None) => {
                return Err(MergeError::validation(
                    "Load a Korean and an English font before merging",
                ))
            }
        };

        config.validate()?;

        let display_name = match request.display_name.trim() {
            "" => english.stem().to_string(),
            name => name.to_string(),
        };
        let plan = request.options.plan();
        tracing::info!(
            "Merging {} + {} as '{}' ({} ranges)",
            korean.display_name(),
            english.display_name(),
            display_name,
            plan.len()
        );

        Ok(Self {
            korean,
            english,
            options: request.options,
            display_name,
            plan,
            next: 0,
            target: english.font().metrics().or_defaults(),
            fast_icon_scan: config.fast_icon_scan,
            builder: GlyphSetBuilder::with_notdef_from(korean.font(), english.font()),
        })
    }

    fn progress(&self) -> MergeProgress {
        MergeProgress::for_options(&self.options)
    }

    fn source(&self, origin: FontOrigin) -> &'a SourceFontAsset {
        match origin {
            FontOrigin::Korean => self.korean,
            FontOrigin::English => self.english,
        }
    }

    /// Process the next range; false once the plan is exhausted
    fn step(&mut self) -> bool {
        let Some(&(category, range)) = self.plan.get(self.next) else {
            return false;
        };
        self.next += 1;

        let origin = category.origin();
        let font = self.source(origin).font();
        let extraction = if self.fast_icon_scan && range.is_private_use() {
            extract::extract_clustered(font, range, origin)
        } else {
            extract::extract(font, range, origin)
        };

        let factor = font.metrics().or_defaults().scale_to(&self.target);
        let added = self
            .builder
            .extend(extraction.glyphs.into_iter().map(|glyph| glyph.scaled(factor)));
        tracing::debug!("{}: {} glyphs added", range.label, added);
        true
    }

    fn build(self, serializer: &dyn FontSerializer, config: &MergeConfig) -> EngineResult<MergeResult> {
        let mut glyphs = self.builder.finish();
        WidthNormalizer::from_reference(self.english.font(), config.width_ratio).apply(&mut glyphs);

        let english = self.english.font();
        let mut assembler = FontAssembler::new(
            self.display_name.as_str(),
            self.target,
            english.naming(),
            config.timestamp.unwrap_or_else(Utc::now),
        );
        if self.options.carries_layout() {
            assembler = assembler.inherit_tables(english, &LAYOUT_TABLES);
        }
        let spec = assembler
            .inherit_tables(english, &PASSTHROUGH_TABLES)
            .assemble(glyphs);

        let built = SerializationGuard::new(config.min_output_bytes).build(serializer, &spec)?;
        let result = MergeResult {
            file_name: naming::output_file_name(&self.display_name),
            display_name: self.display_name,
            postscript_name: spec.postscript_name.clone(),
            glyph_count: spec.glyph_count(),
            korean_glyphs: spec.glyphs.count_from(FontOrigin::Korean),
            english_glyphs: spec.glyphs.count_from(FontOrigin::English),
            build_mode: built.mode,
            fallback_reason: built.fallback_reason,
            font: built.bytes,
            spec,
        };
        tracing::info!(
            "Merged {} glyphs ({} Korean, {} English) into {} ({}, {} build)",
            result.glyph_count,
            result.korean_glyphs,
            result.english_glyphs,
            result.file_name,
            format_file_size(result.size()),
            result.build_mode
        );
        Ok(result)
    }
}

/// Two loaded fonts and the last merge made from them
///
/// Fonts stay loaded across merges so the same pair can be merged again
/// with different options or names.
pub struct MergeSession<S = TtfSerializer> {
    merger: FontMerger<S>,
    korean: Option<SourceFontAsset>,
    english: Option<SourceFontAsset>,
    last_result: Option<MergeResult>,
}

impl MergeSession<TtfSerializer> {
    pub fn new(config: MergeConfig) -> Self {
        Self::with_merger(FontMerger::new(config))
    }
}

impl<S: FontSerializer> MergeSession<S> {
    pub fn with_merger(merger: FontMerger<S>) -> Self {
        Self {
            merger,
            korean: None,
            english: None,
            last_result: None,
        }
    }

    pub fn load_korean(&mut self, path: impl AsRef<Path>) -> EngineResult<&SourceFontAsset> {
        let asset = SourceFontAsset::load(path, FontOrigin::Korean)?;
        Ok(self.korean.insert(asset))
    }

    pub fn load_english(&mut self, path: impl AsRef<Path>) -> EngineResult<&SourceFontAsset> {
        let asset = SourceFontAsset::load(path, FontOrigin::English)?;
        Ok(self.english.insert(asset))
    }

    pub fn set_korean(&mut self, asset: SourceFontAsset) {
        self.korean = Some(asset);
    }

    pub fn set_english(&mut self, asset: SourceFontAsset) {
        self.english = Some(asset);
    }

    pub fn korean(&self) -> Option<&SourceFontAsset> {
        self.korean.as_ref()
    }

    pub fn english(&self) -> Option<&SourceFontAsset> {
        self.english.as_ref()
    }

    pub fn last_result(&self) -> Option<&MergeResult> {
        self.last_result.as_ref()
    }

    /// Merge the loaded fonts; a failed run clears the previous result
    pub fn merge(
        &mut self,
        options: SelectionOptions,
        display_name: &str,
        progress: impl FnMut(f64),
    ) -> EngineResult<&MergeResult> {
        self.last_result = None;
        let request = MergeRequest {
            korean: self.korean.as_ref(),
            english: self.english.as_ref(),
            options,
            display_name: display_name.to_string(),
        };
        let result = self.merger.merge(&request, progress)?;
        Ok(self.last_result.insert(result))
    }

    /// Write the last result into `dir`
    pub fn save_to(&self, dir: impl AsRef<Path>) -> EngineResult<PathBuf> {
        self.last_result
            .as_ref()
            .ok_or_else(|| MergeError::validation("There is no merged font to save"))?
            .write_to(dir)
    }

    /// Drop both fonts and the last result
    pub fn reset(&mut self) {
        self.korean = None;
        self.english = None;
        self.last_result = None;
        tracing::debug!("Merge session reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font_source::{MemoryFont, SourceGlyph};
    use chrono::TimeZone;

    fn korean() -> SourceFontAsset {
        SourceFontAsset::new(
            MemoryFont::new(1000).with_box_glyphs(0xAC00, 0xAC09, 1000.0),
            FontOrigin::Korean,
            "Hangul.ttf",
            4096,
        )
    }

    fn english() -> SourceFontAsset {
        SourceFontAsset::new(
            MemoryFont::new(1000)
                .with_box_glyphs(0x41, 0x5A, 600.0)
                .with_box_glyphs(0x61, 0x7A, 600.0)
                .with_box_glyphs(0x30, 0x39, 600.0),
            FontOrigin::English,
            "Latin Mono.ttf",
            2048,
        )
    }

    fn config() -> MergeConfig {
        MergeConfig {
            timestamp: Some(Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()),
            ..MergeConfig::default()
        }
    }

    #[test]
    fn busy_merger_rejects_second_run() {
        let merger = FontMerger::new(config());
        let (k, e) = (korean(), english());
        let request = MergeRequest::new(&k, &e, SelectionOptions::default(), "Busy");

        let guard = merger.acquire().unwrap();
        assert!(merger.is_busy());
        assert!(matches!(merger.merge(&request, |_| {}), Err(MergeError::Busy)));
        drop(guard);

        assert!(!merger.is_busy());
        assert!(merger.merge(&request, |_| {}).is_ok());
        assert!(!merger.is_busy());
    }

    #[test]
    fn blank_display_name_uses_english_stem() {
        let merger = FontMerger::new(config());
        let (k, e) = (korean(), english());
        let request = MergeRequest::new(&k, &e, SelectionOptions::default(), "   ");
        let result = merger.merge(&request, |_| {}).unwrap();
        assert_eq!(result.display_name, "Latin Mono");
        assert_eq!(result.file_name, "LatinMono.ttf");
    }

    #[test]
    fn glyphs_are_scaled_into_latin_units() {
        let k = SourceFontAsset::new(
            MemoryFont::new(2048).with_glyph(0x3131, SourceGlyph::rectangle(2048.0, 1400.0)),
            FontOrigin::Korean,
            "Big.ttf",
            1,
        );
        let e = english();
        let options = SelectionOptions::from_categories([Category::KoreanJamo]);
        let mut job = MergeJob::new(&MergeRequest::new(&k, &e, options, "Scaled"), &config()).unwrap();
        while job.step() {}
        let glyphs = job.builder.finish();
        let jamo = glyphs.iter().find(|g| g.codepoint == Some(0x3131)).unwrap();
        let bounds = crate::data::outline::bounds(&jamo.outline).unwrap();
        assert!((bounds.height() - 1400.0 * 1000.0 / 2048.0).abs() < 1e-6);
        assert_eq!(jamo.advance_width, 1000.0);
    }

    #[test]
    fn session_keeps_fonts_until_reset() {
        let mut session = MergeSession::new(config());
        session.set_korean(korean());
        session.set_english(english());

        let letters = SelectionOptions::from_categories([Category::EnglishLetters]);
        assert_eq!(session.merge(letters, "One", |_| {}).unwrap().glyph_count, 53);
        let digits = SelectionOptions::from_categories([Category::EnglishNumbers]);
        assert_eq!(session.merge(digits, "Two", |_| {}).unwrap().glyph_count, 11);
        assert_eq!(session.last_result().unwrap().file_name, "Two.ttf");

        session.reset();
        assert!(session.korean().is_none() && session.last_result().is_none());
        assert!(matches!(
            session.merge(digits, "Three", |_| {}),
            Err(MergeError::Validation(_))
        ));
        assert!(matches!(session.save_to("."), Err(MergeError::Validation(_))));
    }

    #[test]
    fn session_saves_last_result() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = MergeSession::new(config());
        session.set_korean(korean());
        session.set_english(english());
        session
            .merge(SelectionOptions::recommended(), "Saved Font", |_| {})
            .unwrap();

        let path = session.save_to(dir.path().join("out")).unwrap();
        assert_eq!(path.file_name().unwrap(), "SavedFont.ttf");
        let written = std::fs::read(&path).unwrap();
        assert_eq!(written, session.last_result().unwrap().font);
    }

    #[test]
    fn bad_width_ratio_is_rejected_before_any_progress() {
        let (k, e) = (korean(), english());
        let options =
            SelectionOptions::from_categories([Category::KoreanHangul, Category::EnglishLetters]);
        let request = MergeRequest::new(&k, &e, options, "Ratio");

        for ratio in [-1.0, 0.0, f64::NAN, f64::INFINITY] {
            let merger = FontMerger::new(MergeConfig {
                width_ratio: ratio,
                ..config()
            });
            let mut seen = Vec::new();
            let err = merger.merge(&request, |p| seen.push(p)).unwrap_err();
            assert!(matches!(err, MergeError::Validation(_)), "{ratio}");
            assert!(seen.is_empty());
            assert!(!merger.is_busy());
        }
        assert!(MergeConfig {
            width_ratio: 1.5,
            ..config()
        }
        .validate()
        .is_ok());
    }

    /// Rejects every build with an error the guard retries
    struct AlwaysUnsupported;

    impl FontSerializer for AlwaysUnsupported {
        fn serialize(&self, _spec: &MergedFontSpec) -> Result<Vec<u8>, SerializeError> {
            Err(SerializeError::unsupported("glyf", "cannot encode"))
        }
    }

    #[test]
    fn failed_build_resets_progress_and_frees_merger() {
        let merger = FontMerger::with_serializer(AlwaysUnsupported, config());
        let (k, e) = (korean(), english());
        let request = MergeRequest::new(&k, &e, SelectionOptions::recommended(), "Broken");

        let mut seen = Vec::new();
        let err = merger.merge(&request, |p| seen.push(p)).unwrap_err();
        assert!(matches!(
            err,
            MergeError::FontBuild(SerializeError::UnsupportedTable { .. })
        ));
        assert_eq!(seen.last(), Some(&0.0));
        assert!(!merger.is_busy());

        let mut session = MergeSession::with_merger(merger);
        session.set_korean(korean());
        session.set_english(english());
        assert!(session
            .merge(SelectionOptions::recommended(), "Broken", |_| {})
            .is_err());
        assert!(session.last_result().is_none());
    }

    #[test]
    fn session_loads_font_files() {
        let dir = tempfile::tempdir().unwrap();
        let (k, e) = (korean(), english());
        let built = FontMerger::new(config())
            .merge(
                &MergeRequest::new(&k, &e, SelectionOptions::recommended(), "On Disk"),
                |_| {},
            )
            .unwrap();
        let path = built.write_to(dir.path()).unwrap();

        let mut session = MergeSession::new(config());
        assert_eq!(session.load_korean(&path).unwrap().display_name(), "OnDisk.ttf");
        let english = session.load_english(&path).unwrap();
        assert_eq!(english.origin(), FontOrigin::English);
        assert_eq!(english.byte_size(), built.size());

        let result = session
            .merge(SelectionOptions::recommended(), "Reloaded", |_| {})
            .unwrap();
        assert_eq!(result.glyph_count, built.glyph_count);

        let missing = dir.path().join("missing.ttf");
        assert!(matches!(
            session.load_korean(&missing),
            Err(MergeError::Io { ref path, .. }) if *path == missing
        ));
        assert!(session.korean().is_some());
    }
}
