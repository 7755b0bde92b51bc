//! Core data models used throughout the indexer.
//!
//! These types represent the persons, documents, matches, and evidence
//! records that flow through the indexing pipeline, plus the serialized
//! shape of the exported people index.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A curated person whose mentions are searched for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Person {
    pub display_name: String,
    pub slug: String,
    pub search_variants: Vec<String>,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub category: String,
}

/// Provenance metadata attached to a document and copied into every
/// evidence group built from it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentMeta {
    #[serde(default)]
    pub classification: String,
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub source_attribution: String,
    #[serde(default)]
    pub sha256: String,
    #[serde(default)]
    pub verification_status: String,
}

/// A document as produced by a [`DocumentSource`](crate::source::DocumentSource).
///
/// Pages are keyed by 1-indexed page number. An empty page map means text
/// extraction failed; the indexer skips such documents with a warning.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub id: String,
    pub meta: DocumentMeta,
    pub pages: BTreeMap<u32, String>,
    /// Why the document has no pages, when the source knows.
    pub skip_reason: Option<String>,
}

impl Document {
    /// Build a document from page texts in reading order (page 1 first).
    pub fn from_pages<I, S>(id: impl Into<String>, meta: DocumentMeta, pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pages = pages
            .into_iter()
            .enumerate()
            .map(|(i, text)| (i as u32 + 1, text.into()))
            .collect();
        Self {
            id: id.into(),
            meta,
            pages,
            skip_reason: None,
        }
    }

    /// A document that could not be read, with the reason for the run report.
    pub fn unreadable(id: impl Into<String>, meta: DocumentMeta, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            meta,
            pages: BTreeMap::new(),
            skip_reason: Some(reason.into()),
        }
    }

    /// True when extraction produced no usable page.
    pub fn is_unreadable(&self) -> bool {
        self.pages.is_empty()
    }
}

/// One occurrence of one variant inside one page.
///
/// `start` and `end` are character offsets (not byte offsets) into the
/// page text; `end` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMatch {
    pub variant: String,
    pub start: usize,
    pub end: usize,
    pub matched_text: String,
}

impl RawMatch {
    /// Length of the variant in characters, used for cluster selection.
    pub fn variant_len(&self) -> usize {
        self.variant.chars().count()
    }
}

/// The raw match chosen to stand for a proximity cluster.
pub type DeduplicatedMatch = RawMatch;

/// A deduplicated match with its location and readable context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Evidence {
    pub page: u32,
    pub matched_variant: String,
    pub snippet: String,
}

/// All evidence for one person found in one document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentEvidence {
    pub filename: String,
    #[serde(flatten)]
    pub meta: DocumentMeta,
    pub match_count: usize,
    pub matches: Vec<Evidence>,
}

/// The indexed result for one person.
///
/// Fields the indexer does not produce (`custom_content`,
/// `pinpoint_entity_id`, ...) land in `extra`. They are curated by patch
/// sets and carried over when the index is rebuilt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersonRecord {
    pub display_name: String,
    pub slug: String,
    pub priority: String,
    pub category: String,
    pub found_in_documents: bool,
    pub total_matches: usize,
    pub documents: Vec<DocumentEvidence>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PersonRecord {
    /// An empty, not-found record for `person`.
    pub fn empty(person: &Person) -> Self {
        Self {
            display_name: person.display_name.clone(),
            slug: person.slug.clone(),
            priority: person.priority.clone(),
            category: person.category.clone(),
            found_in_documents: false,
            total_matches: 0,
            documents: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Append a document's evidence, keeping the flag and total in sync.
    pub fn push_document(&mut self, group: DocumentEvidence) {
        self.total_matches += group.matches.len();
        self.found_in_documents = self.total_matches > 0;
        self.documents.push(group);
    }
}

/// Header block written alongside the people list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexMetadata {
    pub version: String,
    pub generated: String,
    pub description: String,
    pub total_names: usize,
    pub total_documents: usize,
    pub verification_note: String,
    /// Curated header fields (`has_custom_content`, `last_manual_update`).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The exported index consumed by the website.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PeopleIndex {
    #[serde(rename = "_metadata")]
    pub metadata: IndexMetadata,
    pub people: Vec<PersonRecord>,
}
