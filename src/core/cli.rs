//! Command line interface for hangeul-merge
//!
//! Handles parsing command line arguments and resolving them against the
//! user's settings file. Options that are not given on the command line fall
//! back to settings.json, then to built-in defaults.

use crate::core::config_file::ConfigFile;
use crate::merge::ranges::{Category, SelectionOptions};
use crate::merge::MergeConfig;
use clap::Parser;
use std::path::PathBuf;

/// hangeul-merge CLI arguments
///
/// Examples:
///   hangeul-merge -k D2Coding.ttf -e JetBrainsMono.ttf          # Recommended categories
///   hangeul-merge -k D2Coding.ttf -e Hack.ttf -n "Hack Hangul"   # Custom family name
///   hangeul-merge -k D2Coding.ttf -e Hack.ttf --exclude english-icons
///   hangeul-merge -k D2Coding.ttf -e Hack.ttf --include korean-hangul english-letters
///   hangeul-merge --subset-font D2Coding.ttf --subset-text "안녕하세요"
///   hangeul-merge --list-categories
#[derive(Parser, Debug, Clone, Default)]
#[clap(
    name = "hangeul-merge",
    version,
    about = "Merge a Hangul font and a Latin coding font into one fixed-width font",
    long_about = "hangeul-merge copies the Hangul glyphs of one font and the Latin, digit, symbol and icon glyphs of another into a single TrueType font. Advance widths are normalized so Latin glyphs fill one cell and Hangul glyphs a whole number of cells, which keeps the result aligned in code editors."
)]
pub struct CliArgs {
    /// Font providing the Hangul glyphs
    #[clap(
        long = "korean",
        short = 'k',
        help = "Font providing Hangul glyphs (TTF/OTF)",
        long_help = "Path to the font that supplies Hangul syllables and jamo. Its notdef glyph is also used for the merged font when present."
    )]
    pub korean: Option<PathBuf>,

    /// Font providing Latin, digit, symbol and icon glyphs
    #[clap(
        long = "english",
        short = 'e',
        help = "Font providing Latin glyphs (TTF/OTF)",
        long_help = "Path to the font that supplies Latin letters, digits, symbols, ligatures and icons. Its metrics and naming information define the merged font, and its capital M sets the cell width."
    )]
    pub english: Option<PathBuf>,

    /// Display name of the merged font
    #[clap(
        long = "name",
        short = 'n',
        help = "Family name of the merged font",
        long_help = "Family name of the merged font. Spaces and Unicode are kept in the name table; the file name and PostScript name keep only A-Z, a-z, 0-9 and hyphens. Defaults to the configured name, then to the English font's file name."
    )]
    pub name: Option<String>,

    #[clap(
        long = "output-dir",
        short = 'o',
        help = "Directory for the merged font",
        long_help = "Directory the merged font is written to. Created if missing. Defaults to the configured directory, then to the current directory."
    )]
    pub output_dir: Option<PathBuf>,

    /// Categories to merge, replacing the default selection
    #[clap(
        long = "include",
        value_enum,
        num_args = 1..,
        help = "Only merge these categories",
        long_help = "Merge exactly these categories instead of the configured or recommended selection. Run --list-categories to see them all."
    )]
    pub include: Vec<Category>,

    /// Categories to drop from the selection
    #[clap(
        long = "exclude",
        value_enum,
        num_args = 1..,
        help = "Skip these categories"
    )]
    pub exclude: Vec<Category>,

    #[clap(long = "all", help = "Merge every category", conflicts_with = "include")]
    pub all: bool,

    /// Hangul advance width as a multiple of the Latin cell width
    #[clap(
        long = "width-ratio",
        help = "Hangul width in Latin cells (default 2.0)",
        long_help = "Hangul glyphs are set to round(latin_width * ratio), where latin_width is the advance of the English font's capital M. A whole number keeps Hangul aligned to the Latin grid."
    )]
    pub width_ratio: Option<f64>,

    #[clap(
        long = "fast-icon-scan",
        help = "Stop icon range scans after a sparse block",
        long_help = "Scan Private Use Area icon ranges in blocks of 256 code points and stop once a block yields fewer than 5 glyphs. Much faster on large icon ranges, but may miss icons placed after a gap."
    )]
    pub fast_icon_scan: bool,

    /// Also export the merged font as a UFO source
    #[clap(
        long = "ufo",
        help = "Also write a UFO source to this path",
        long_help = "Write the merged font as a UFO source directory as well, for further editing in a font editor."
    )]
    pub ufo: Option<PathBuf>,

    /// Text to subset a font to
    #[clap(
        long = "subset-text",
        requires = "subset_font",
        help = "Build a subset holding only the glyphs of this text"
    )]
    pub subset_text: Option<String>,

    #[clap(
        long = "subset-font",
        requires = "subset_text",
        help = "Font to subset with --subset-text"
    )]
    pub subset_font: Option<PathBuf>,

    #[clap(long = "list-categories", help = "List selectable categories and exit")]
    pub list_categories: bool,

    /// Initialize user configuration directory with settings
    ///
    /// This creates the ~/.config/hangeul-merge directory with:
    /// - settings.json: default name, output directory and selection
    /// - logs/: daily log files
    #[clap(
        long = "new-config",
        help = "Initialize user config directory with settings",
        long_help = "Initialize the ~/.config/hangeul-merge directory with a settings.json file and a logs directory. Settings apply whenever the matching command line option is not given."
    )]
    pub new_config: bool,

    #[clap(
        long = "log-file",
        help = "Always write a log file",
        long_help = "Write logs to ~/.config/hangeul-merge/logs even if that directory does not exist yet. Without this flag, file logging only happens once the directory exists."
    )]
    pub log_file: bool,

    #[clap(long = "verbose", short = 'v', help = "Show debug logs")]
    pub verbose: bool,
}

impl CliArgs {
    /// Validate the CLI arguments after parsing
    ///
    /// Ensures input fonts exist before any work starts.
    pub fn validate(&self) -> Result<(), String> {
        for path in [&self.korean, &self.english, &self.subset_font]
            .into_iter()
            .flatten()
        {
            if !path.is_file() {
                return Err(format!(
                    "Font file does not exist: {}\nMake sure the path is correct and the file exists.",
                    path.display()
                ));
            }
        }

        if let Some(ratio) = self.width_ratio {
            if !ratio.is_finite() || ratio <= 0.0 {
                return Err(format!("Width ratio must be a positive number, got {ratio}"));
            }
        }

        Ok(())
    }

    /// Get the category selection from CLI args, config file, or default
    ///
    /// Priority order:
    /// 1. CLI arguments (--all, --include)
    /// 2. Config file setting (~/.config/hangeul-merge/settings.json)
    /// 3. Built-in default (recommended categories)
    ///
    /// `--exclude` is applied last, whichever selection won.
    pub fn selection(&self, config: &ConfigFile) -> SelectionOptions {
        let mut options = if self.all {
            SelectionOptions::all()
        } else if !self.include.is_empty() {
            SelectionOptions::from_categories(self.include.iter().copied())
        } else if let Some(options) = config.options {
            options
        } else {
            SelectionOptions::recommended()
        };
        for category in &self.exclude {
            options.set(*category, false);
        }
        options
    }

    /// Engine settings, with the same priority as [`selection`](Self::selection)
    pub fn merge_config(&self, config: &ConfigFile) -> MergeConfig {
        let defaults = MergeConfig::default();
        MergeConfig {
            width_ratio: self
                .width_ratio
                .or(config.width_ratio)
                .unwrap_or(defaults.width_ratio),
            fast_icon_scan: self.fast_icon_scan || config.fast_icon_scan.unwrap_or(false),
            min_output_bytes: config.min_output_bytes.unwrap_or(defaults.min_output_bytes),
            timestamp: None,
        }
    }

    /// Display name; an empty result lets the engine use the English file stem
    pub fn display_name(&self, config: &ConfigFile) -> String {
        self.name
            .clone()
            .or_else(|| config.default_font_name.clone())
            .unwrap_or_default()
    }

    pub fn output_dir(&self, config: &ConfigFile) -> PathBuf {
        self.output_dir
            .clone()
            .or_else(|| config.output_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::parse_from(std::iter::once("hangeul-merge").chain(args.iter().copied()))
    }

    #[test]
    fn recommended_selection_by_default() {
        let cli = parse(&["-k", "a.ttf", "-e", "b.ttf"]);
        assert_eq!(cli.selection(&ConfigFile::default()), SelectionOptions::recommended());
    }

    #[test]
    fn include_replaces_and_exclude_trims() {
        let cli = parse(&[
            "--include",
            "korean-hangul",
            "english-letters",
            "english-icons",
            "--exclude",
            "english-icons",
        ]);
        let options = cli.selection(&ConfigFile::default());
        assert_eq!(
            options,
            SelectionOptions::from_categories([Category::KoreanHangul, Category::EnglishLetters])
        );
    }

    #[test]
    fn config_selection_beats_default_but_not_cli() {
        let config = ConfigFile {
            options: Some(SelectionOptions::from_categories([Category::EnglishNumbers])),
            width_ratio: Some(1.5),
            ..ConfigFile::default()
        };
        assert_eq!(
            parse(&[]).selection(&config),
            SelectionOptions::from_categories([Category::EnglishNumbers])
        );
        assert_eq!(parse(&["--all"]).selection(&config), SelectionOptions::all());

        assert_eq!(parse(&[]).merge_config(&config).width_ratio, 1.5);
        assert_eq!(
            parse(&["--width-ratio", "2"]).merge_config(&config).width_ratio,
            2.0
        );
        assert_eq!(parse(&[]).merge_config(&ConfigFile::default()).width_ratio, 2.0);
    }

    #[test]
    fn name_and_output_dir_fall_back() {
        let config = ConfigFile {
            default_font_name: Some("Configured".to_string()),
            ..ConfigFile::default()
        };
        assert_eq!(parse(&[]).display_name(&config), "Configured");
        assert_eq!(parse(&["-n", "Given"]).display_name(&config), "Given");
        assert_eq!(parse(&[]).display_name(&ConfigFile::default()), "");
        assert_eq!(parse(&[]).output_dir(&config), PathBuf::from("."));
    }

    #[test]
    fn rejects_bad_width_ratio() {
        assert!(parse(&["--width-ratio", "0"]).validate().is_err());
        assert!(parse(&["-k", "/definitely/missing.ttf"]).validate().is_err());
        assert!(parse(&[]).validate().is_ok());
    }
}
