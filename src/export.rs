//! Export the people index as JSON for the website.
//!
//! Produces `people_index.json`: a `_metadata` header followed by one
//! record per person in definition order. Only `_metadata.generated`
//! varies between runs over the same input.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::HashMap;
use std::path::Path;

use crate::config::OutputConfig;
use crate::indexer::IndexRun;
use crate::models::{IndexMetadata, PeopleIndex};

/// Assemble the exported index from a finished run.
pub fn build_people_index(
    run: IndexRun,
    output: &OutputConfig,
    total_documents: usize,
    generated: DateTime<Utc>,
) -> PeopleIndex {
    PeopleIndex {
        metadata: IndexMetadata {
            version: output.version.clone(),
            generated: generated.to_rfc3339_opts(SecondsFormat::Secs, true),
            description: output.description.clone(),
            total_names: run.records.len(),
            total_documents,
            verification_note: output.verification_note.clone(),
            extra: Default::default(),
        },
        people: run.records,
    }
}

/// Copy curated fields from a previous export into a fresh one.
///
/// Person fields are matched by slug; people no longer defined are
/// dropped. Everything the indexer computes comes from the fresh run.
/// Returns how many people had fields carried over.
pub fn carry_curated_fields(index: &mut PeopleIndex, previous: &PeopleIndex) -> usize {
    index.metadata.extra = previous.metadata.extra.clone();

    let curated: HashMap<&str, _> = previous
        .people
        .iter()
        .filter(|p| !p.extra.is_empty())
        .map(|p| (p.slug.as_str(), &p.extra))
        .collect();

    let mut carried = 0;
    for record in &mut index.people {
        if let Some(extra) = curated.get(record.slug.as_str()) {
            record.extra = (*extra).clone();
            carried += 1;
        }
    }
    carried
}

/// Pretty JSON with a trailing newline.
pub fn to_json(index: &PeopleIndex) -> Result<String> {
    let mut json = serde_json::to_string_pretty(index)?;
    json.push('\n');
    Ok(json)
}

/// Write the index to `output`, or to stdout for piping when `None`.
pub fn write_index(index: &PeopleIndex, output: Option<&Path>) -> Result<()> {
    let json = to_json(index)?;
    match output {
        Some(path) => {
            write_atomically(path, json.as_bytes())?;
            tracing::info!(
                path = %path.display(),
                people = index.people.len(),
                "index written"
            );
        }
        None => print!("{}", json),
    }
    Ok(())
}

/// Read a previously exported index.
pub fn read_index(path: &Path) -> Result<PeopleIndex> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read index: {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse index: {}", path.display()))
}

/// Write through a sibling temp file so readers never see a partial index.
pub(crate) fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    std::fs::write(&tmp, bytes)
        .with_context(|| format!("Failed to write {}", Path::new(&tmp).display()))?;
    std::fs::rename(&tmp, path).with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}
