//! Application runner logic
//!
//! Handles the different ways to run hangeul-merge: initializing the config
//! directory, listing categories, subsetting and merging.

use crate::core::cli::CliArgs;
use crate::core::config_file::ConfigFile;
use crate::data::ufo;
use crate::font_source::{format_file_size, FontOrigin, SourceFontAsset};
use crate::merge::ranges::Category;
use crate::merge::{FontMerger, MergeRequest, MergeResult};
use crate::subset;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Run the application with the given CLI arguments.
/// Handles special CLI flags and delegates to the merge or subset runner.
pub fn run_app(cli_args: CliArgs) -> Result<()> {
    if cli_args.new_config {
        return ConfigFile::initialize_config_directory()
            .context("Failed to initialize config directory");
    }

    if cli_args.list_categories {
        print!("{}", category_listing());
        return Ok(());
    }

    let _log_guard = crate::logging::init(cli_args.verbose, cli_args.log_file);
    let config = ConfigFile::load().unwrap_or_default();

    if let (Some(text), Some(font)) = (&cli_args.subset_text, &cli_args.subset_font) {
        return run_subset(&cli_args, &config, font, text);
    }
    run_merge(&cli_args, &config)
}

/// One line per category: CLI name, settings key, ranges and description
pub fn category_listing() -> String {
    use clap::ValueEnum;
    let recommended = crate::merge::SelectionOptions::recommended();
    let mut out = String::new();
    for category in Category::ALL {
        let name = category
            .to_possible_value()
            .map(|value| value.get_name().to_string())
            .unwrap_or_default();
        let ranges: Vec<String> = category
            .ranges()
            .iter()
            .map(|r| format!("U+{:04X}-{:04X}", r.start, r.end))
            .collect();
        let marker = if recommended.is_enabled(category) { "*" } else { " " };
        out.push_str(&format!(
            "{marker} {name:<22} {key:<20} {source:<8} {ranges}\n      {description}\n",
            key = category.key(),
            source = category.origin().as_str(),
            ranges = ranges.join(", "),
            description = category.description(),
        ));
    }
    out.push_str("\n* merged by default\n");
    out
}

fn load_optional(path: Option<&PathBuf>, origin: FontOrigin) -> Result<Option<SourceFontAsset>> {
    path.map(|path| {
        SourceFontAsset::load(path, origin)
            .with_context(|| format!("Failed to load {} font", origin))
    })
    .transpose()
}

fn run_merge(cli_args: &CliArgs, config: &ConfigFile) -> Result<()> {
    let korean = load_optional(cli_args.korean.as_ref(), FontOrigin::Korean)?;
    let english = load_optional(cli_args.english.as_ref(), FontOrigin::English)?;

    let request = MergeRequest {
        korean: korean.as_ref(),
        english: english.as_ref(),
        options: cli_args.selection(config),
        display_name: cli_args.display_name(config),
    };
    let merger = FontMerger::new(cli_args.merge_config(config));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let result = runtime.block_on(merger.merge_async(&request, render_progress));
    eprintln!();
    let result = result.context("Merge failed")?;

    let output_dir = cli_args.output_dir(config);
    let path = result
        .write_to(&output_dir)
        .context("Failed to write merged font")?;

    if let Some(ufo_path) = &cli_args.ufo {
        ufo::write_ufo(&result.spec, ufo_path)?;
    }

    print_summary(&result, &path);
    Ok(())
}

fn run_subset(cli_args: &CliArgs, config: &ConfigFile, font: &Path, text: &str) -> Result<()> {
    let source = SourceFontAsset::load(font, FontOrigin::English)
        .with_context(|| format!("Failed to load {}", font.display()))?;
    let result = subset::subset_font(&source, text, &cli_args.merge_config(config))
        .context("Subset failed")?;

    let output_dir = cli_args.output_dir(config);
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    let path = output_dir.join(&result.file_name);
    std::fs::write(&path, &result.font)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Subset font:      {}", path.display());
    println!("Family:           {}", result.family_name);
    println!("PostScript name:  {}", result.postscript_name);
    println!(
        "Glyphs:           {} ({})",
        result.glyph_count,
        format_file_size(result.font.len())
    );
    if !result.missing.is_empty() {
        let missing: String = result.missing.iter().collect();
        println!("Not in font:      {missing}");
    }
    Ok(())
}

fn render_progress(percent: f64) {
    let mut stderr = std::io::stderr();
    let _ = write!(stderr, "\rmerging… {:>3.0}%", percent);
    let _ = stderr.flush();
}

fn print_summary(result: &MergeResult, path: &Path) {
    println!("Merged font:      {}", path.display());
    println!("Display name:     {}", result.display_name);
    println!("PostScript name:  {}", result.postscript_name);
    println!(
        "Glyphs:           {} ({} Korean, {} English)",
        result.glyph_count, result.korean_glyphs, result.english_glyphs
    );
    println!("Size:             {}", format_file_size(result.size()));
    println!("Build:            {}", result.build_mode);
    if let Some(reason) = &result.fallback_reason {
        println!("                  (full build skipped: {reason})");
    }
}
