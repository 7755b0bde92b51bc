//! Auditable corrections to an exported index.
//!
//! A patch set is a TOML file of field edits, each asserting the value it
//! expects to replace:
//!
//! ```toml
//! [[patch]]
//! slug = "woody-allen"
//! field = "pinpoint_entity_id"
//! expect = "/m/0wrong"
//! value = "/m/081lh"
//! note = "entity id pointed at a different person"
//!
//! [[patch]]
//! slug = "prince-andrew"
//! field = "custom_content.one_liner"
//! value = "Duke of York"
//! ```
//!
//! Applying a set is all-or-nothing: every edit is checked before the
//! index file is rewritten. An edit whose target already holds `value` is a
//! no-op, so replaying a set is always safe. Evidence fields computed by
//! the indexer cannot be patched.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;
use thiserror::Error;

use crate::export::write_atomically;

/// Fields owned by the indexer; a rebuild would silently undo edits to them.
const COMPUTED_FIELDS: &[&str] = &["documents", "found_in_documents", "total_matches"];

#[derive(Debug, Deserialize, Clone)]
pub struct PatchSet {
    #[serde(default, rename = "patch")]
    pub patches: Vec<Patch>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Patch {
    pub slug: String,
    pub field: String,
    #[serde(default)]
    pub expect: Option<toml::Value>,
    pub value: toml::Value,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum PatchError {
    #[error("index is malformed: {0}")]
    MalformedIndex(String),
    #[error("no person with slug '{0}'")]
    UnknownPerson(String),
    #[error("invalid field path '{field}': {reason}")]
    InvalidField { field: String, reason: String },
    #[error("field '{0}' is computed by the indexer and cannot be patched")]
    ComputedField(String),
    #[error("{slug}.{field}: expected {expected}, found {found}")]
    Conflict {
        slug: String,
        field: String,
        expected: Value,
        found: Value,
    },
}

/// What happened to each edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    Applied,
    Unchanged,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PatchReport {
    pub applied: usize,
    pub unchanged: usize,
}

pub fn load_patch_set(path: &Path) -> Result<PatchSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read patch set: {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse patch set: {}", path.display()))
}

/// Apply every edit to `index`. On error `index` is left untouched.
pub fn apply_patch_set(index: &mut Value, set: &PatchSet) -> Result<PatchReport, PatchError> {
    let mut working = index.clone();
    let mut report = PatchReport::default();

    for patch in &set.patches {
        match apply_patch(&mut working, patch)? {
            PatchOutcome::Applied => report.applied += 1,
            PatchOutcome::Unchanged => report.unchanged += 1,
        }
    }

    *index = working;
    Ok(report)
}

fn apply_patch(index: &mut Value, patch: &Patch) -> Result<PatchOutcome, PatchError> {
    let segments = parse_field(&patch.field)?;
    let value = to_json(&patch.value, &patch.field)?;
    let expect = patch
        .expect
        .as_ref()
        .map(|e| to_json(e, &patch.field))
        .transpose()?;

    let person = find_person(index, &patch.slug)?;
    let current = lookup(person, &segments).cloned().unwrap_or(Value::Null);

    if current == value {
        return Ok(PatchOutcome::Unchanged);
    }
    if let Some(expected) = expect {
        if current != expected {
            return Err(PatchError::Conflict {
                slug: patch.slug.clone(),
                field: patch.field.clone(),
                expected,
                found: current,
            });
        }
    }

    set_path(person, &segments, value, &patch.field)?;
    tracing::debug!(slug = %patch.slug, field = %patch.field, note = ?patch.note, "patched");
    Ok(PatchOutcome::Applied)
}

fn parse_field(field: &str) -> Result<Vec<&str>, PatchError> {
    let segments: Vec<&str> = field.split('.').collect();
    if segments.iter().any(|s| s.trim().is_empty()) {
        return Err(PatchError::InvalidField {
            field: field.to_string(),
            reason: "empty path segment".to_string(),
        });
    }
    if COMPUTED_FIELDS.contains(&segments[0]) {
        return Err(PatchError::ComputedField(field.to_string()));
    }
    Ok(segments)
}

fn to_json(value: &toml::Value, field: &str) -> Result<Value, PatchError> {
    serde_json::to_value(value).map_err(|e| PatchError::InvalidField {
        field: field.to_string(),
        reason: e.to_string(),
    })
}

fn find_person<'a>(index: &'a mut Value, slug: &str) -> Result<&'a mut Map<String, Value>, PatchError> {
    let people = index
        .get_mut("people")
        .and_then(Value::as_array_mut)
        .ok_or_else(|| PatchError::MalformedIndex("missing 'people' array".to_string()))?;

    people
        .iter_mut()
        .filter_map(Value::as_object_mut)
        .find(|p| p.get("slug").and_then(Value::as_str) == Some(slug))
        .ok_or_else(|| PatchError::UnknownPerson(slug.to_string()))
}

fn lookup<'a>(object: &'a Map<String, Value>, segments: &[&str]) -> Option<&'a Value> {
    let (first, rest) = segments.split_first()?;
    let value = object.get(*first)?;
    if rest.is_empty() {
        Some(value)
    } else {
        lookup(value.as_object()?, rest)
    }
}

/// Set a dotted path, creating intermediate objects (null counts as absent).
fn set_path(
    object: &mut Map<String, Value>,
    segments: &[&str],
    value: Value,
    field: &str,
) -> Result<(), PatchError> {
    let Some((first, rest)) = segments.split_first() else {
        return Ok(());
    };
    if rest.is_empty() {
        object.insert(first.to_string(), value);
        return Ok(());
    }

    let child = object
        .entry(first.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if child.is_null() {
        *child = Value::Object(Map::new());
    }
    match child.as_object_mut() {
        Some(next) => set_path(next, rest, value, field),
        None => Err(PatchError::InvalidField {
            field: field.to_string(),
            reason: format!("'{}' is not an object", first),
        }),
    }
}

/// Apply a patch set file to an index file in place.
pub fn run_patch(index_path: &Path, patch_path: &Path, dry_run: bool) -> Result<PatchReport> {
    let set = load_patch_set(patch_path)?;
    let content = std::fs::read_to_string(index_path)
        .with_context(|| format!("Failed to read index: {}", index_path.display()))?;
    let mut index: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse index: {}", index_path.display()))?;

    let report = apply_patch_set(&mut index, &set)
        .with_context(|| format!("Patch set {} rejected", patch_path.display()))?;

    println!("patch {}", patch_path.display());
    println!("  edits: {}", set.patches.len());
    println!("  applied: {}", report.applied);
    println!("  unchanged: {}", report.unchanged);

    if dry_run {
        println!("  (dry-run, index not written)");
    } else if report.applied > 0 {
        let mut json = serde_json::to_string_pretty(&index)?;
        json.push('\n');
        write_atomically(index_path, json.as_bytes())?;
    }
    println!("ok");

    Ok(report)
}
