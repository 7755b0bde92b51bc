use anyhow::{bail, Result};
use async_trait::async_trait;
use globset::{Glob, GlobSet, GlobSetBuilder};
use rayon::prelude::*;
use std::path::PathBuf;
use walkdir::WalkDir;

use crate::config::FilesystemSourceConfig;
use crate::models::{Document, DocumentMeta};
use crate::source::{load_file_document, DocumentSource};

/// Every matching file under a directory root, one document per file.
pub struct FilesystemSource {
    name: String,
    config: FilesystemSourceConfig,
}

impl FilesystemSource {
    pub fn new(name: String, config: FilesystemSourceConfig) -> Self {
        Self { name, config }
    }
}

#[async_trait]
impl DocumentSource for FilesystemSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn source_type(&self) -> &str {
        "filesystem"
    }

    fn location(&self) -> String {
        self.config.root.display().to_string()
    }

    fn is_healthy(&self) -> bool {
        self.config.root.is_dir()
    }

    async fn load(&self) -> Result<Vec<Document>> {
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || scan_filesystem(&config)).await?
    }
}

pub fn scan_filesystem(config: &FilesystemSourceConfig) -> Result<Vec<Document>> {
    let root = &config.root;
    if !root.exists() {
        bail!("Filesystem source root does not exist: {}", root.display());
    }

    let include_set = build_globset(&config.include_globs)?;

    let mut default_excludes = vec![
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/node_modules/**".to_string(),
    ];
    default_excludes.extend(config.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut files: Vec<(String, PathBuf)> = Vec::new();

    let walker = WalkDir::new(root).follow_links(config.follow_symlinks);
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().replace('\\', "/");

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }

        files.push((rel_str, path.to_path_buf()));
    }

    // Sort for deterministic ordering
    files.sort_by(|a, b| a.0.cmp(&b.0));

    let meta = DocumentMeta {
        classification: config.classification.clone(),
        source_attribution: config.source_attribution.clone(),
        ..Default::default()
    };

    // par_iter keeps input order on collect
    let documents = files
        .par_iter()
        .map(|(id, path)| {
            let mut file_meta = meta.clone();
            file_meta.source_url = format!("file://{}", path.display());
            load_file_document(path, id.clone(), file_meta)
        })
        .collect();

    Ok(documents)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
