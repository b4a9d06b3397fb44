//! # CLI Module
//!
//! ## Usage
//! ```bash
//! # Index a directory, storing the index in it
//! deduplicater --index ~/Photos index --dir ~/Photos
//!
//! # List duplicates by checksum
//! deduplicater --index ~/Photos find
//!
//! # Use image hashes and move the copies away
//! deduplicater --index ~/Photos --image-hash find --move-to /tmp/dupes
//!
//! # JSON output
//! deduplicater --index ~/Photos find --output json
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use deduplicater::core::finder::DuplicateCluster;
use deduplicater::core::indexer::IndexSummary;
use deduplicater::core::resolver::Resolver;
use deduplicater::core::strategy::{Strategy, StrategySet};
use deduplicater::error::Result;
use deduplicater::events::{Event, EventChannel, IndexEvent};
use deduplicater::{init_tracing, is_dir_exist, Deduper};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

/// deduplicater - Find and manage duplicate files
#[derive(Parser, Debug)]
#[command(name = "deduplicater")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the index file
    #[arg(short, long, global = true, default_value = ".")]
    index: PathBuf,

    /// Use md5 checksums (default when no hash is chosen)
    #[arg(short, long, global = true)]
    md5: bool,

    /// Use perceptual image hashes
    #[arg(long, global = true)]
    image_hash: bool,

    /// Hashing threads (0 = one per CPU)
    #[arg(short, long, global = true, default_value = "0")]
    workers: usize,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn strategies(&self) -> StrategySet {
        if !self.md5 && !self.image_hash {
            return StrategySet::new().with(Strategy::Content);
        }
        StrategySet::from_flags(self.md5, self.image_hash)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Index all files under a directory
    Index {
        /// Directory of files to index
        #[arg(short, long)]
        dir: PathBuf,
    },
    /// Find duplicates in a saved index
    Find {
        /// Move all but one file of each group into this directory
        #[arg(long)]
        move_to: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (duplicate paths only)
    Minimal,
}

/// Run the CLI
pub fn run() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let deduper = Deduper::builder()
        .index_dir(&cli.index)
        .strategies(cli.strategies())
        .workers(cli.workers)
        .progress_interval(Duration::from_millis(200))
        .build()?;

    match cli.command {
        Commands::Index { dir } => run_index(&deduper, &dir),
        Commands::Find { move_to, output } => run_find(&deduper, move_to.as_deref(), output),
    }
}

fn run_index(deduper: &Deduper, dir: &Path) -> Result<()> {
    let term = Term::stderr();
    is_dir_exist(dir)?;

    term.write_line(&format!(
        "{} {} to {}",
        style("Indexing").bold().cyan(),
        display_path(dir),
        display_path(deduper.index_file())
    ))
    .ok();

    let progress = ProgressBar::new(0);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░"),
    );

    let (sender, receiver) = EventChannel::new();
    let progress_clone = progress.clone();

    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            match event {
                Event::Index(IndexEvent::Progress(p)) => {
                    progress_clone.set_length(p.discovered as u64);
                    progress_clone.set_position(p.indexed as u64);
                }
                Event::Index(IndexEvent::Completed(_)) | Event::Index(IndexEvent::Failed { .. }) => {
                    progress_clone.finish_and_clear();
                }
                _ => {}
            }
        }
    });

    let result = deduper.create_with_events(dir, &sender);

    drop(sender);
    event_thread.join().ok();
    progress.finish_and_clear();

    let summary = result?;
    print_index_summary(&term, &summary);
    Ok(())
}

fn print_index_summary(term: &Term, summary: &IndexSummary) {
    term.write_line(&format!("{} Index saved", style("✓").green().bold()))
        .ok();
    term.write_line(&format!(
        "  {} files indexed in {:.1}s",
        style(summary.files).cyan(),
        summary.duration.as_secs_f64()
    ))
    .ok();
    term.write_line(&format!(
        "  {} records in the index",
        style(summary.records).cyan()
    ))
    .ok();
    if summary.skipped > 0 {
        term.write_line(&format!(
            "  {} files were not images",
            style(summary.skipped).dim()
        ))
        .ok();
    }
}

fn run_find(deduper: &Deduper, move_to: Option<&Path>, output: OutputFormat) -> Result<()> {
    let term = Term::stderr();

    if let Some(target) = move_to {
        is_dir_exist(target)?;
    }

    let records = deduper.load()?;
    let clusters = deduper.find()?;

    match output {
        OutputFormat::Pretty => print_pretty_results(&term, records, &clusters),
        OutputFormat::Json => print_json_results(records, &clusters),
        OutputFormat::Minimal => print_minimal_results(&clusters),
    }

    if let Some(target) = move_to {
        if clusters.is_empty() {
            return Ok(());
        }
        let summary = deduper.move_duplicates(&clusters, target)?;
        term.write_line(&format!(
            "{} Moved {} duplicates to {} ({} directories created)",
            style("✓").green().bold(),
            style(summary.moved).cyan(),
            display_path(target),
            summary.directories_created
        ))
        .ok();
    }

    Ok(())
}

fn print_pretty_results(term: &Term, records: usize, clusters: &[DuplicateCluster]) {
    term.write_line(&format!(
        "  {} records loaded",
        style(records).cyan()
    ))
    .ok();

    if clusters.is_empty() {
        term.write_line("  No duplicates found").ok();
        return;
    }

    term.write_line(&format!(
        "  {} duplicate groups found",
        style(clusters.len()).cyan()
    ))
    .ok();
    term.write_line("").ok();

    for (i, cluster) in clusters.iter().enumerate() {
        term.write_line(&format!(
            "  {} {} {} ({} files)",
            style(format!("Group {}:", i + 1)).bold(),
            style(cluster.strategy).yellow(),
            style(&cluster.signature).dim(),
            cluster.paths.len()
        ))
        .ok();

        for (idx, path) in Resolver::keep_order(&cluster.paths).iter().enumerate() {
            let marker = if idx == 0 {
                style("★").green().to_string()
            } else {
                style("○").dim().to_string()
            };
            term.write_line(&format!("    {} {}", marker, display_path(path)))
                .ok();
        }
        term.write_line("").ok();
    }

    term.write_line(&format!(
        "{}",
        style("Starred files are kept when moving duplicates.").dim()
    ))
    .ok();
}

fn print_json_results(records: usize, clusters: &[DuplicateCluster]) {
    let output = serde_json::json!({
        "records": records,
        "duplicate_groups": clusters.len(),
        "duplicate_count": clusters.iter().map(DuplicateCluster::duplicate_count).sum::<usize>(),
        "groups": clusters.iter().map(|c| {
            let ordered = Resolver::keep_order(&c.paths);
            serde_json::json!({
                "strategy": c.strategy,
                "signature": c.signature,
                "paths": c.paths,
                "keep": ordered.first(),
            })
        }).collect::<Vec<_>>()
    });

    println!("{:#}", output);
}

fn print_minimal_results(clusters: &[DuplicateCluster]) {
    for cluster in clusters {
        for path in Resolver::keep_order(&cluster.paths).iter().skip(1) {
            println!("{}", path.display());
        }
    }
}

fn display_path(path: &Path) -> String {
    match dirs::home_dir() {
        Some(home) => match path.strip_prefix(&home) {
            Ok(relative) => format!("~/{}", relative.display()),
            Err(_) => path.display().to_string(),
        },
        None => path.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn md5_is_the_default_strategy() {
        let cli = Cli::parse_from(["deduplicater", "find"]);
        assert_eq!(cli.strategies(), StrategySet::from_flags(true, false));
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::parse_from([
            "deduplicater",
            "index",
            "--dir",
            "/photos",
            "--image-hash",
            "--index",
            "/tmp",
        ]);
        assert_eq!(cli.strategies(), StrategySet::from_flags(false, true));
        assert_eq!(cli.index, PathBuf::from("/tmp"));
        assert!(matches!(cli.command, Commands::Index { dir } if dir == PathBuf::from("/photos")));
    }

    #[test]
    fn home_paths_are_shortened() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(display_path(&home.join("a.txt")), "~/a.txt");
        }
    }
}
