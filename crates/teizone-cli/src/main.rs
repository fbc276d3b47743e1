//! teizone CLI - TEI facsimile composition from image annotations
//!
//! Builds one TEI document per manuscript from a JSON list of items, imports
//! existing TEI facsimiles back into items, and re-sorts hand-edited
//! documents.

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use config::Config;
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use teizone_core::{normalize_facsimile, FsDocumentStore, Item, ItemComposer, TeiItemImporter};
use teizone_xml::Document;

/// Verbosity level for output control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Verbosity {
    /// Suppress all output except errors
    Quiet,
    /// Normal output (default)
    Normal,
    /// Verbose output with extra details
    Verbose,
}

impl Verbosity {
    /// Create from CLI flags
    const fn from_flags(quiet: bool, verbose: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if verbose {
            Self::Verbose
        } else {
            Self::Normal
        }
    }

    /// Check if output should be shown (not quiet)
    const fn should_show_output(self) -> bool {
        !matches!(self, Self::Quiet)
    }

    /// Default log filter; `RUST_LOG` overrides it
    const fn log_filter(self) -> &'static str {
        match self {
            Self::Quiet => "warn",
            Self::Normal => "info",
            Self::Verbose => "debug",
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "teizone",
    about = "Compose TEI facsimiles from image annotations",
    long_about = "Compose TEI documents from annotated page images.\n\
                  \n\
                  Each group (manuscript) becomes one TEI file with a facsimile surface\n\
                  per page, a zone per annotated region, and a body entry per entity.",
    version
)]
struct Args {
    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Show detailed processing information
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Read settings from this file on top of ~/.teizone.toml and ./.teizone.toml
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compose items into one TEI document per group
    #[command(long_about = "Compose items into one TEI document per group.\n\
                      \n\
                      Documents already present in the output directory are updated in place.\n\
                      \n\
                      Examples:\n\
                        teizone build items.json -o tei\n\
                        teizone build items.json -g ccc-ms029 --continue-on-error")]
    Build {
        /// JSON file with an array of items
        #[arg(value_name = "ITEMS_JSON")]
        items: PathBuf,

        /// Output directory (default: tei)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Only compose items of this group
        #[arg(short, long, value_name = "GROUP")]
        group: Option<String>,

        /// Skip failing items instead of stopping
        #[arg(long)]
        continue_on_error: bool,
    },

    /// Import TEI facsimiles into an items file
    #[command(long_about = "Import TEI facsimiles into an items file.\n\
                      \n\
                      Each matching file is one group, named after the file stem. New items\n\
                      are appended; items whose title is already present are skipped.\n\
                      \n\
                      Examples:\n\
                        teizone import 'tei/*.xml' items.json\n\
                        teizone import 'tei/*.xml' items.json -p '^https?://[^/]+/(.*)$'")]
    Import {
        /// Glob pattern of TEI files
        #[arg(value_name = "MASK")]
        mask: String,

        /// JSON items file to append to (created if missing)
        #[arg(value_name = "ITEMS_JSON")]
        items: PathBuf,

        /// Regex whose first group shortens source URIs in descriptions
        #[arg(short, long, value_name = "REGEX")]
        pattern: Option<String>,
    },

    /// Re-sort surfaces and zones of TEI files by page number
    Normalize {
        /// TEI files to rewrite
        #[arg(value_name = "TEI_FILE", required = true)]
        files: Vec<PathBuf>,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Display the current effective configuration
    Show {
        /// Output as JSON instead of TOML
        #[arg(long)]
        json: bool,
    },

    /// Show the path(s) to configuration file(s)
    Path,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let verbosity = Verbosity::from_flags(args.quiet, args.verbose);

    let env = env_logger::Env::default().default_filter_or(verbosity.log_filter());
    env_logger::Builder::from_env(env)
        .target(env_logger::Target::Stderr)
        .init();

    let config = Config::discover(args.config.as_deref())?;

    match args.command {
        Commands::Build {
            items,
            output,
            group,
            continue_on_error,
        } => build_command(
            &items,
            config.resolve_output_dir(output),
            group.as_deref(),
            config.resolve_continue_on_error(continue_on_error),
            &config,
            verbosity,
        ),
        Commands::Import {
            mask,
            items,
            pattern,
        } => import_command(
            &mask,
            &items,
            config.resolve_uri_shortener(pattern),
            verbosity,
        ),
        Commands::Normalize { files } => normalize_command(&files, verbosity),
        Commands::Config { action } => match action {
            ConfigAction::Show { json } => config_show(&config, json),
            ConfigAction::Path => config_path(args.config.as_deref()),
        },
    }
}

fn load_items(path: &Path) -> Result<Vec<Item>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read items file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse items file: {}", path.display()))
}

fn build_command(
    items_path: &Path,
    output_dir: PathBuf,
    group: Option<&str>,
    continue_on_error: bool,
    config: &Config,
    verbosity: Verbosity,
) -> Result<()> {
    let mut items = load_items(items_path)?;
    if let Some(group) = group {
        items.retain(|item| item.group_id == group);
    }
    if items.is_empty() {
        log::warn!("No items to compose in {}", items_path.display());
        return Ok(());
    }
    // stable: page order within a group is kept
    items.sort_by(|a, b| a.group_id.cmp(&b.group_id));

    let groups: BTreeSet<&str> = items.iter().map(|i| i.group_id.as_str()).collect();
    log::info!(
        "Composing {} item(s) in {} group(s) into {}",
        items.len(),
        groups.len(),
        output_dir.display()
    );

    let progress = if verbosity.should_show_output() {
        let pb = ProgressBar::new(items.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .context("Invalid progress bar template")?
                .progress_chars("█▓▒░  "),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let store = FsDocumentStore::new(&output_dir, config.header());
    let mut composer = ItemComposer::new(store);
    let mut failed = 0usize;
    let start_time = std::time::Instant::now();

    for item in &items {
        progress.set_message(item.id.clone());
        if let Err(e) = composer.compose(item) {
            if !continue_on_error {
                progress.abandon();
                return Err(e).with_context(|| format!("Failed to compose item {}", item.id));
            }
            failed += 1;
            log::warn!("Skipping item {}: {e}", item.id);
        }
        progress.inc(1);
    }
    composer.close().context("Failed to save TEI document")?;
    progress.finish_and_clear();

    if verbosity.should_show_output() {
        let report = composer.report();
        let elapsed = start_time.elapsed();
        eprintln!("\n{}", "=== Composition Summary ===".bold());
        eprintln!("{:<16} {}", "Items:", items.len().to_string().cyan());
        eprintln!("{:<16} {}", "Composed:", report.items.to_string().green());
        eprintln!("{:<16} {}", "Skipped:", report.skipped.to_string().yellow());
        eprintln!(
            "{:<16} {}",
            "Failed:",
            if failed > 0 {
                failed.to_string().red()
            } else {
                failed.to_string().normal()
            }
        );
        eprintln!(
            "{:<16} {} added, {} updated",
            "Zones:", report.zones_added, report.zones_updated
        );
        eprintln!(
            "{:<16} {} added, {} updated, {} merged",
            "Entries:", report.entries_added, report.entries_updated, report.entries_merged
        );
        if report.unrecognized > 0 {
            eprintln!(
                "{:<16} {}",
                "Unrecognized:",
                report.unrecognized.to_string().yellow()
            );
        }
        eprintln!("{:<16} {:.2}s", "Total time:", elapsed.as_secs_f64());
        for group in &groups {
            println!(
                "{} {}",
                "✓".green().bold(),
                composer.store().path_for(group).display()
            );
        }
    }
    Ok(())
}

fn import_command(
    mask: &str,
    items_path: &Path,
    uri_shortener: Option<String>,
    verbosity: Verbosity,
) -> Result<()> {
    let shortener = uri_shortener
        .map(|pattern| {
            Regex::new(&pattern).with_context(|| format!("Invalid URI shortener: {pattern}"))
        })
        .transpose()?;
    let importer = TeiItemImporter::new(shortener);

    // existing entries are kept verbatim
    let mut entries: Vec<serde_json::Value> = if items_path.exists() {
        let content = fs::read_to_string(items_path)
            .with_context(|| format!("Failed to read items file: {}", items_path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse items file: {}", items_path.display()))?
    } else {
        Vec::new()
    };
    let mut titles: HashSet<String> = entries
        .iter()
        .filter_map(|e| e.get("title").and_then(serde_json::Value::as_str))
        .map(str::to_string)
        .collect();

    let mut paths = glob::glob(mask)
        .with_context(|| format!("Invalid glob pattern: {mask}"))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to read glob match")?;
    paths.sort();
    if paths.is_empty() {
        log::warn!("No files match {mask}");
    }

    let mut added = 0usize;
    for path in &paths {
        let group_id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .with_context(|| format!("Invalid file name: {}", path.display()))?;
        let doc = Document::load(path)
            .with_context(|| format!("Failed to load TEI file: {}", path.display()))?;
        let items = importer
            .import(group_id, &doc, &titles)
            .with_context(|| format!("Failed to import {}", path.display()))?;
        for item in items {
            titles.insert(item.title.clone());
            entries.push(serde_json::to_value(&item)?);
            added += 1;
        }
    }

    let json = serde_json::to_string_pretty(&entries)?;
    fs::write(items_path, json)
        .with_context(|| format!("Failed to write items file: {}", items_path.display()))?;

    if verbosity.should_show_output() {
        println!(
            "{} Imported {} item(s) from {} file(s) into {}",
            "✓".green().bold(),
            added,
            paths.len(),
            items_path.display()
        );
    }
    Ok(())
}

fn normalize_command(files: &[PathBuf], verbosity: Verbosity) -> Result<()> {
    for path in files {
        let mut doc = Document::load(path)
            .with_context(|| format!("Failed to load TEI file: {}", path.display()))?;
        let count = normalize_facsimile(&mut doc)
            .with_context(|| format!("Failed to normalize {}", path.display()))?;
        if count > 0 {
            doc.save(path)
                .with_context(|| format!("Failed to write TEI file: {}", path.display()))?;
        }
        if verbosity.should_show_output() {
            if count > 0 {
                println!(
                    "{} {} ({count} re-sorted)",
                    "✓".green().bold(),
                    path.display()
                );
            } else {
                println!("{} {} (already sorted)", "-".bright_black(), path.display());
            }
        }
    }
    Ok(())
}

fn config_show(config: &Config, json_output: bool) -> Result<()> {
    let effective = config.effective();
    if json_output {
        println!("{}", serde_json::to_string_pretty(&effective)?);
    } else {
        println!("{}", toml::to_string_pretty(&effective)?);
    }
    Ok(())
}

#[allow(clippy::unnecessary_wraps)] // consistent return type for CLI commands
fn config_path(explicit: Option<&Path>) -> Result<()> {
    println!("{}", "Configuration file paths:".bold());
    let status = |path: &Path| {
        if path.exists() {
            "exists".green()
        } else {
            "not found".yellow()
        }
    };
    if let Some(home) = Config::user_path() {
        println!(
            "  {} {} ({})",
            "User:".bright_black(),
            home.display(),
            status(&home)
        );
    }
    let project = Config::project_path();
    println!(
        "  {} {} ({})",
        "Project:".bright_black(),
        project.display(),
        status(&project)
    );
    if let Some(path) = explicit {
        println!(
            "  {} {} ({})",
            "Explicit:".bright_black(),
            path.display(),
            status(path)
        );
    }
    Ok(())
}
