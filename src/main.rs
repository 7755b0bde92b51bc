//! # People Index CLI (`pidx`)
//!
//! Builds the per-person evidence index consumed by the website, and
//! maintains it afterwards.
//!
//! ## Usage
//!
//! ```bash
//! pidx --config ./config/pidx.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `pidx index` | Scan every source for every curated name and write the index |
//! | `pidx sources` | List configured document sources and their health |
//! | `pidx patch <file>` | Apply a TOML patch set to the exported index |
//! | `pidx stats` | Summarize an exported index |
//!
//! ## Examples
//!
//! ```bash
//! # Full rebuild into [output].path
//! pidx index --config ./config/pidx.toml
//!
//! # Print the index instead, with JSON progress on stderr
//! pidx index --stdout --progress json
//!
//! # Rebuild and save computed hashes back to the manifests
//! pidx index --write-manifest
//!
//! # Correct an entity id, checking the old value first
//! pidx patch patches/2024-11-20-woody-allen.toml
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use people_index::config;
use people_index::index_cmd::{self, IndexTarget};
use people_index::patch;
use people_index::progress::ProgressMode;
use people_index::sources;
use people_index::stats;

/// People Index: find curated names in document text and build a
/// deduplicated per-person evidence index.
#[derive(Parser)]
#[command(
    name = "pidx",
    about = "People Index: build a deduplicated per-person evidence index from document text",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/pidx.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the people index from every configured source.
    ///
    /// Loads person definitions, extracts page text from all sources,
    /// matches every name variant, collapses same-row duplicates, and
    /// writes the index JSON.
    Index {
        /// Write here instead of `[output].path`.
        #[arg(long, conflicts_with = "stdout")]
        output: Option<PathBuf>,

        /// Print the index JSON on stdout (summary moves to stderr).
        #[arg(long)]
        stdout: bool,

        /// Run everything but write nothing.
        #[arg(long, conflicts_with_all = ["output", "stdout"])]
        dry_run: bool,

        /// Progress on stderr. Defaults to `human` on a TTY, otherwise `off`.
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,

        /// Also write `<manifest>_updated.json` next to each manifest, with
        /// computed SHA-256 hashes filled in.
        #[arg(long, conflicts_with = "dry_run")]
        write_manifest: bool,
    },

    /// List configured document sources and whether they look loadable.
    Sources,

    /// Apply a patch set to the exported index.
    ///
    /// Every edit's `expect` value is checked first; nothing is written
    /// unless all edits apply. Replaying a set is a no-op.
    Patch {
        /// Patch set file (TOML, `[[patch]]` entries).
        file: PathBuf,

        /// Index to patch. Defaults to `[output].path`.
        #[arg(long)]
        index: Option<PathBuf>,

        /// Check the edits without writing.
        #[arg(long)]
        dry_run: bool,
    },

    /// Summarize an exported index.
    Stats {
        /// Index to read. Defaults to `[output].path`.
        #[arg(long)]
        index: Option<PathBuf>,

        /// How many of the most-mentioned people to show.
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Index {
            output,
            stdout,
            dry_run,
            progress,
            write_manifest,
        } => {
            let mode = progress.unwrap_or_else(ProgressMode::default_for_tty);
            let reporter = mode.reporter();
            let path = output.unwrap_or_else(|| cfg.output.path.clone());
            let target = if dry_run {
                IndexTarget::DryRun
            } else if stdout {
                IndexTarget::Stdout
            } else {
                IndexTarget::File(&path)
            };
            index_cmd::run_index(&cfg, target, write_manifest, reporter.as_ref()).await?;
        }
        Commands::Sources => {
            sources::list_sources(&cfg)?;
        }
        Commands::Patch {
            file,
            index,
            dry_run,
        } => {
            let index = index.unwrap_or_else(|| cfg.output.path.clone());
            patch::run_patch(&index, &file, dry_run)?;
        }
        Commands::Stats { index, top } => {
            let index = index.unwrap_or_else(|| cfg.output.path.clone());
            stats::run_stats(&index, top)?;
        }
    }

    Ok(())
}
