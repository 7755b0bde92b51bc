//! Document sources.
//!
//! The indexer never depends on how page text was obtained. Anything that
//! can produce [`Document`] records implements [`DocumentSource`] and is
//! collected in a [`SourceRegistry`].
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │             SourceRegistry               │
//! │  ┌──────────┐ ┌──────────┐ ┌──────────┐  │
//! │  │ manifest │ │filesystem│ │  custom  │  │
//! │  └──────────┘ └──────────┘ └──────────┘  │
//! └──────────────┬───────────────────────────┘
//!                ▼
//!         load_all() → build_index()
//! ```

use anyhow::Result;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::Path;

use crate::config::Config;
use crate::extract::{content_type_for_path, extract_pages};
use crate::models::{Document, DocumentMeta};
use crate::progress::{IndexProgressEvent, ProgressReporter};

/// A provider of documents for an index run.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use anyhow::Result;
/// use people_index::models::{Document, DocumentMeta};
/// use people_index::source::DocumentSource;
///
/// pub struct Transcripts;
///
/// #[async_trait]
/// impl DocumentSource for Transcripts {
///     fn name(&self) -> &str { "transcripts" }
///     fn location(&self) -> String { "inline".to_string() }
///
///     async fn load(&self) -> Result<Vec<Document>> {
///         Ok(vec![Document::from_pages(
///             "deposition.txt",
///             DocumentMeta::default(),
///             ["Q. Did you fly with Mr. Epstein?"],
///         )])
///     }
/// }
/// ```
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Instance name from the config (e.g. `"priority"`).
    fn name(&self) -> &str;

    /// Source type (`"filesystem"`, `"manifest"`, `"custom"`).
    fn source_type(&self) -> &str {
        "custom"
    }

    /// `"{type}:{name}"`, used in logs and progress output.
    fn source_label(&self) -> String {
        format!("{}:{}", self.source_type(), self.name())
    }

    /// Where documents come from, for `pidx sources`.
    fn location(&self) -> String;

    /// Whether the source looks loadable before a run.
    fn is_healthy(&self) -> bool {
        true
    }

    /// Produce every document. Unreadable files come back with no pages
    /// rather than as an error, so one bad file never aborts a run.
    async fn load(&self) -> Result<Vec<Document>>;
}

/// In-memory documents, for embedding the indexer in other programs.
pub struct MemorySource {
    name: String,
    documents: Vec<Document>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, documents: Vec<Document>) -> Self {
        Self {
            name: name.into(),
            documents,
        }
    }
}

#[async_trait]
impl DocumentSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn source_type(&self) -> &str {
        "memory"
    }

    fn location(&self) -> String {
        format!("{} documents in memory", self.documents.len())
    }

    async fn load(&self) -> Result<Vec<Document>> {
        Ok(self.documents.clone())
    }
}

/// Documents from every source, plus problems that did not stop the load.
#[derive(Debug, Default)]
pub struct LoadedDocuments {
    pub documents: Vec<Document>,
    pub warnings: Vec<String>,
}

/// Ordered collection of sources.
pub struct SourceRegistry {
    sources: Vec<Box<dyn DocumentSource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// All configured sources: manifests first, then filesystem roots,
    /// each in name order.
    pub fn from_config(config: &Config) -> Self {
        use crate::source_fs::FilesystemSource;
        use crate::source_manifest::ManifestSource;

        let mut registry = Self::new();
        for (name, cfg) in &config.sources.manifest {
            registry.register(Box::new(ManifestSource::new(name.clone(), cfg.clone())));
        }
        for (name, cfg) in &config.sources.filesystem {
            registry.register(Box::new(FilesystemSource::new(name.clone(), cfg.clone())));
        }
        registry
    }

    pub fn register(&mut self, source: Box<dyn DocumentSource>) {
        self.sources.push(source);
    }

    pub fn sources(&self) -> &[Box<dyn DocumentSource>] {
        &self.sources
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Load every source in registration order.
    ///
    /// A document id seen in an earlier source wins; later duplicates are
    /// dropped with a warning so nothing is counted twice.
    pub async fn load_all(&self, progress: &dyn ProgressReporter) -> Result<LoadedDocuments> {
        let mut seen = HashSet::new();
        let mut loaded_all = LoadedDocuments::default();

        for source in &self.sources {
            let label = source.source_label();
            progress.report(IndexProgressEvent::Loading {
                source: label.clone(),
            });

            let loaded = source.load().await?;
            tracing::info!(source = %label, documents = loaded.len(), "loaded");

            for doc in loaded {
                if seen.insert(doc.id.clone()) {
                    loaded_all.documents.push(doc);
                } else {
                    tracing::warn!(source = %label, document = %doc.id, "duplicate document id, ignored");
                    loaded_all
                        .warnings
                        .push(format!("{}: duplicate document id from {}, ignored", doc.id, label));
                }
            }
        }

        Ok(loaded_all)
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Read and extract one file. Never fails: problems are logged and the
/// document is returned without pages, carrying the reason.
pub(crate) fn load_file_document(path: &Path, id: String, mut meta: DocumentMeta) -> Document {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!(document = %id, path = %path.display(), error = %e, "cannot read file");
            let reason = if e.kind() == std::io::ErrorKind::NotFound {
                format!("file not found: {}", path.display())
            } else {
                format!("cannot read file: {}", e)
            };
            return Document::unreadable(id, meta, reason);
        }
    };

    if meta.sha256.is_empty() {
        meta.sha256 = sha256_hex(&bytes);
    }

    match content_type_for_path(path) {
        Some(ct) => match extract_pages(&bytes, ct) {
            Ok(pages) => Document::from_pages(id, meta, pages),
            Err(e) => {
                tracing::warn!(document = %id, error = %e, "text extraction failed");
                Document::unreadable(id, meta, format!("could not extract text: {}", e))
            }
        },
        None => {
            tracing::warn!(document = %id, "unsupported file type");
            Document::unreadable(id, meta, "unsupported file type")
        }
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
