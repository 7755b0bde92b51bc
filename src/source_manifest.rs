//! Manifest-driven source.
//!
//! A manifest lists source files together with their provenance:
//!
//! ```json
//! {
//!   "files": [
//!     {
//!       "filename": "EPSTEIN FLIGHT LOGS UNREDACTED.pdf",
//!       "local_path": "pdfs/flight_logs.pdf",
//!       "classification": "Flight Log",
//!       "source_url": "https://example.org/flight_logs.pdf",
//!       "source_attribution": "House Oversight Committee",
//!       "sha256": null,
//!       "verification_status": "UNVERIFIED",
//!       "priority": "P0"
//!     }
//!   ]
//! }
//! ```
//!
//! Relative `local_path`s resolve against the manifest's directory. A
//! missing `sha256` is computed from the file bytes; `pidx index
//! --write-manifest` saves those hashes to `<manifest>_updated.json`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use rayon::prelude::*;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::ManifestSourceConfig;
use crate::export::write_atomically;
use crate::models::{Document, DocumentMeta};
use crate::source::{load_file_document, DocumentSource};

#[derive(Debug, Deserialize)]
struct Manifest {
    files: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ManifestEntry {
    pub filename: String,
    pub local_path: PathBuf,
    #[serde(default)]
    pub classification: String,
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub source_attribution: String,
    #[serde(default)]
    pub sha256: Option<String>,
    #[serde(default)]
    pub verification_status: String,
    #[serde(default)]
    pub priority: String,
}

impl ManifestEntry {
    fn meta(&self) -> DocumentMeta {
        DocumentMeta {
            classification: self.classification.clone(),
            source_url: self.source_url.clone(),
            source_attribution: self.source_attribution.clone(),
            sha256: self.sha256.clone().unwrap_or_default(),
            verification_status: self.verification_status.clone(),
        }
    }
}

pub struct ManifestSource {
    name: String,
    config: ManifestSourceConfig,
}

impl ManifestSource {
    pub fn new(name: String, config: ManifestSourceConfig) -> Self {
        Self { name, config }
    }
}

#[async_trait]
impl DocumentSource for ManifestSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn source_type(&self) -> &str {
        "manifest"
    }

    fn location(&self) -> String {
        if self.config.priorities.is_empty() {
            self.config.path.display().to_string()
        } else {
            format!(
                "{} [{}]",
                self.config.path.display(),
                self.config.priorities.join(", ")
            )
        }
    }

    fn is_healthy(&self) -> bool {
        self.config.path.is_file()
    }

    async fn load(&self) -> Result<Vec<Document>> {
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || load_manifest(&config)).await?
    }
}

/// Entries selected by the priority filter, in manifest order.
pub fn read_manifest(config: &ManifestSourceConfig) -> Result<Vec<ManifestEntry>> {
    let content = std::fs::read_to_string(&config.path)
        .with_context(|| format!("Failed to read manifest: {}", config.path.display()))?;
    let manifest: Manifest = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse manifest: {}", config.path.display()))?;

    Ok(manifest
        .files
        .into_iter()
        .filter(|f| config.priorities.is_empty() || config.priorities.contains(&f.priority))
        .collect())
}

pub fn load_manifest(config: &ManifestSourceConfig) -> Result<Vec<Document>> {
    let entries = read_manifest(config)?;
    let base = config.path.parent().unwrap_or_else(|| Path::new("."));

    let documents = entries
        .par_iter()
        .map(|entry| {
            let path = if entry.local_path.is_relative() {
                base.join(&entry.local_path)
            } else {
                entry.local_path.clone()
            };
            load_file_document(&path, entry.filename.clone(), entry.meta())
        })
        .collect();

    Ok(documents)
}

/// Path of the updated copy: `source_manifest.json` → `source_manifest_updated.json`.
pub fn updated_manifest_path(manifest: &Path) -> PathBuf {
    let stem = manifest
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "manifest".to_string());
    manifest.with_file_name(format!("{}_updated.json", stem))
}

/// Write a copy of the manifest with every missing `sha256` filled in from
/// `documents` (matched by filename). Entries outside the priority filter
/// and unknown keys are kept as they are. Returns the path written and the
/// number of hashes filled.
pub fn write_updated_manifest(
    config: &ManifestSourceConfig,
    documents: &[Document],
) -> Result<(PathBuf, usize)> {
    let content = std::fs::read_to_string(&config.path)
        .with_context(|| format!("Failed to read manifest: {}", config.path.display()))?;
    let mut manifest: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse manifest: {}", config.path.display()))?;

    let hashes: HashMap<&str, &str> = documents
        .iter()
        .filter(|d| !d.meta.sha256.is_empty())
        .map(|d| (d.id.as_str(), d.meta.sha256.as_str()))
        .collect();

    let mut filled = 0;
    let entries = manifest
        .get_mut("files")
        .and_then(Value::as_array_mut)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object_mut);
    for entry in entries {
        let missing = match entry.get("sha256") {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(_) => false,
        };
        let hash = entry
            .get("filename")
            .and_then(Value::as_str)
            .and_then(|f| hashes.get(f));
        if let (true, Some(hash)) = (missing, hash) {
            entry.insert("sha256".to_string(), Value::String(hash.to_string()));
            filled += 1;
        }
    }

    let path = updated_manifest_path(&config.path);
    let mut json = serde_json::to_string_pretty(&manifest)?;
    json.push('\n');
    write_atomically(&path, json.as_bytes())?;
    tracing::info!(path = %path.display(), filled, "updated manifest written");
    Ok((path, filled))
}
