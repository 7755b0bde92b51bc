//! The `pidx index` pipeline.
//!
//! Coordinates a full run: person definitions → sources → indexer →
//! export. Every run rebuilds the evidence from the full document set;
//! curated fields from the previous export are carried over.

use anyhow::{bail, Result};
use chrono::Utc;
use std::path::Path;

use crate::config::Config;
use crate::export::{build_people_index, carry_curated_fields, read_index, write_index};
use crate::indexer::build_index;
use crate::models::PeopleIndex;
use crate::names::load_names;
use crate::progress::ProgressReporter;
use crate::source::SourceRegistry;
use crate::source_manifest::write_updated_manifest;

/// Where the finished index goes.
#[derive(Debug, Clone, Copy)]
pub enum IndexTarget<'a> {
    /// `[output].path` from the config, or an override.
    File(&'a Path),
    Stdout,
    /// Count only; nothing is written.
    DryRun,
}

/// Previous export to take curated fields from, if one exists.
fn previous_index(config: &Config, target: IndexTarget<'_>) -> Result<Option<PeopleIndex>> {
    let path = match target {
        IndexTarget::File(path) => path,
        IndexTarget::Stdout | IndexTarget::DryRun => config.output.path.as_path(),
    };
    if !path.is_file() {
        return Ok(None);
    }
    read_index(path).map(Some)
}

pub async fn run_index(
    config: &Config,
    target: IndexTarget<'_>,
    write_manifest: bool,
    progress: &dyn ProgressReporter,
) -> Result<()> {
    let names = load_names(&config.names.path)?;
    tracing::info!(
        people = names.people.len(),
        version = names.version.as_deref().unwrap_or("unversioned"),
        "loaded person definitions"
    );

    // Read before any work so a corrupt previous export fails fast.
    let previous = previous_index(config, target)?;

    let registry = SourceRegistry::from_config(config);
    if registry.is_empty() {
        bail!("No sources configured. Add [sources.manifest.<name>] or [sources.filesystem.<name>] to the config.");
    }
    tracing::info!(sources = registry.len(), "loading documents");

    let loaded = registry.load_all(progress).await?;
    let documents = loaded.documents;
    let total_documents = documents.len();

    let mut run = build_index(&names.people, &documents, &config.indexer.options(), progress)?;
    let mut warnings = loaded.warnings;
    warnings.append(&mut run.warnings);
    run.warnings = warnings;

    // Summary goes to stderr when the index itself is on stdout.
    let summary = format!(
        "index\n  people: {}\n  documents loaded: {}\n  documents indexed: {}\n  found: {}\n  not found: {}\n  total matches: {}\n  warnings: {}",
        run.records.len(),
        total_documents,
        run.documents_indexed,
        run.found_count(),
        run.records.len() - run.found_count(),
        run.total_matches(),
        run.warnings.len(),
    );
    let summary_to_stderr = matches!(target, IndexTarget::Stdout);
    let emit = |line: &str| {
        if summary_to_stderr {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    };
    emit(&summary);
    for w in &run.warnings {
        emit(&format!("  warning: {}", w));
    }

    if matches!(target, IndexTarget::DryRun) {
        emit("  (dry-run, index not written)");
    } else {
        let mut index = build_people_index(run, &config.output, total_documents, Utc::now());
        if let Some(previous) = &previous {
            let carried = carry_curated_fields(&mut index, previous);
            emit(&format!("  curated fields kept: {}", carried));
        }
        match target {
            IndexTarget::File(path) => {
                write_index(&index, Some(path))?;
                emit(&format!("  output: {}", path.display()));
            }
            _ => write_index(&index, None)?,
        }

        if write_manifest {
            for manifest in config.sources.manifest.values() {
                let (path, filled) = write_updated_manifest(manifest, &documents)?;
                emit(&format!("  manifest: {} ({} hashes filled)", path.display(), filled));
            }
        }
    }
    if !summary_to_stderr {
        println!("ok");
    }

    Ok(())
}
