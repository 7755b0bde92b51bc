//! TOML configuration.
//!
//! A single file (default `./config/pidx.toml`) names the person
//! definitions, the output path, the matching parameters, and any number
//! of named document sources:
//!
//! ```toml
//! [names]
//! path = "data/curated_names.json"
//!
//! [output]
//! path = "output/people_index.json"
//!
//! [indexer]
//! proximity_threshold = 200
//!
//! [sources.manifest.priority]
//! path = "data/source_manifest.json"
//! priorities = ["P0"]
//!
//! [sources.filesystem.extra]
//! root = "data/text"
//! include_globs = ["**/*.txt", "**/*.pdf"]
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::dedup::DEFAULT_PROXIMITY_THRESHOLD;
use crate::indexer::IndexOptions;
use crate::matcher::DEFAULT_MIN_VARIANT_LEN;
use crate::snippet::DEFAULT_SNIPPET_CHARS;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub names: NamesConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub indexer: IndexerConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NamesConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    pub path: PathBuf,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default = "default_verification_note")]
    pub verification_note: String,
}

fn default_version() -> String {
    "1.0".to_string()
}
fn default_description() -> String {
    "Curated names searched across indexed documents".to_string()
}
fn default_verification_note() -> String {
    "SHA-256 hashes computed but marked UNVERIFIED pending official verification".to_string()
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct IndexerConfig {
    #[serde(default = "default_min_variant_len")]
    pub min_variant_len: usize,
    #[serde(default = "default_proximity_threshold")]
    pub proximity_threshold: usize,
    #[serde(default = "default_snippet_chars")]
    pub snippet_chars: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            min_variant_len: DEFAULT_MIN_VARIANT_LEN,
            proximity_threshold: DEFAULT_PROXIMITY_THRESHOLD,
            snippet_chars: DEFAULT_SNIPPET_CHARS,
        }
    }
}

fn default_min_variant_len() -> usize {
    DEFAULT_MIN_VARIANT_LEN
}
fn default_proximity_threshold() -> usize {
    DEFAULT_PROXIMITY_THRESHOLD
}
fn default_snippet_chars() -> usize {
    DEFAULT_SNIPPET_CHARS
}

impl IndexerConfig {
    pub fn options(&self) -> IndexOptions {
        IndexOptions {
            min_variant_len: self.min_variant_len,
            proximity_threshold: self.proximity_threshold,
            snippet_chars: self.snippet_chars,
        }
    }
}

/// Named source instances, keyed by type then name.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SourcesConfig {
    #[serde(default)]
    pub filesystem: BTreeMap<String, FilesystemSourceConfig>,
    #[serde(default)]
    pub manifest: BTreeMap<String, ManifestSourceConfig>,
}

impl SourcesConfig {
    pub fn is_empty(&self) -> bool {
        self.filesystem.is_empty() && self.manifest.is_empty()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FilesystemSourceConfig {
    pub root: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
    /// Classification stamped on every document from this source.
    #[serde(default)]
    pub classification: String,
    #[serde(default)]
    pub source_attribution: String,
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.txt".to_string(), "**/*.pdf".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct ManifestSourceConfig {
    pub path: PathBuf,
    /// Only entries whose priority is listed are loaded; empty loads all.
    #[serde(default)]
    pub priorities: Vec<String>,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Relative paths are relative to the config file, not the shell.
    if let Some(base) = path.parent() {
        config.resolve_paths(base);
    }

    config.validate()?;
    Ok(config)
}

impl Config {
    fn resolve_paths(&mut self, base: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        join(&mut self.names.path);
        join(&mut self.output.path);
        for fs in self.sources.filesystem.values_mut() {
            join(&mut fs.root);
        }
        for m in self.sources.manifest.values_mut() {
            join(&mut m.path);
        }
    }

    fn validate(&self) -> Result<()> {
        if self.indexer.min_variant_len == 0 {
            anyhow::bail!("indexer.min_variant_len must be > 0");
        }
        if self.indexer.snippet_chars == 0 {
            anyhow::bail!("indexer.snippet_chars must be > 0");
        }
        if self.output.path.as_os_str().is_empty() {
            anyhow::bail!("output.path must not be empty");
        }
        if self.output.version.trim().is_empty() {
            anyhow::bail!("output.version must not be empty");
        }
        Ok(())
    }
}
