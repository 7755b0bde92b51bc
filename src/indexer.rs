//! Indexing orchestration.
//!
//! Runs every person against every page of every document:
//! match → deduplicate → snippet → accumulate. The computation is pure and
//! single-threaded; identical inputs always produce identical, identically
//! ordered records. Documents that failed text extraction are skipped with
//! a warning and never abort the run.

use anyhow::{Context, Result};

use crate::dedup::{deduplicate_matches, DEFAULT_PROXIMITY_THRESHOLD};
use crate::matcher::{VariantSet, DEFAULT_MIN_VARIANT_LEN};
use crate::models::{Document, DocumentEvidence, Evidence, Person, PersonRecord};
use crate::progress::{IndexProgressEvent, ProgressReporter};
use crate::snippet::{extract_snippet, DEFAULT_SNIPPET_CHARS};

/// Tuning knobs for one index run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOptions {
    pub min_variant_len: usize,
    pub proximity_threshold: usize,
    pub snippet_chars: usize,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            min_variant_len: DEFAULT_MIN_VARIANT_LEN,
            proximity_threshold: DEFAULT_PROXIMITY_THRESHOLD,
            snippet_chars: DEFAULT_SNIPPET_CHARS,
        }
    }
}

/// Output of [`build_index`]: one record per person plus run warnings.
#[derive(Debug, Clone, Default)]
pub struct IndexRun {
    pub records: Vec<PersonRecord>,
    /// Documents that were readable and scanned.
    pub documents_indexed: usize,
    pub warnings: Vec<String>,
}

impl IndexRun {
    pub fn found_count(&self) -> usize {
        self.records.iter().filter(|r| r.found_in_documents).count()
    }

    pub fn total_matches(&self) -> usize {
        self.records.iter().map(|r| r.total_matches).sum()
    }
}

/// Build a record for every person over the full document set.
pub fn build_index(
    people: &[Person],
    documents: &[Document],
    options: &IndexOptions,
    progress: &dyn ProgressReporter,
) -> Result<IndexRun> {
    let mut run = IndexRun::default();

    let mut readable = Vec::with_capacity(documents.len());
    for doc in documents {
        if doc.is_unreadable() {
            let reason = doc.skip_reason.as_deref().unwrap_or("no extractable text");
            tracing::warn!(document = %doc.id, reason, "skipping unreadable document");
            run.warnings.push(format!("{}: {}, skipped", doc.id, reason));
        } else {
            readable.push(doc);
        }
    }
    run.documents_indexed = readable.len();

    let total = people.len() as u64;
    for (i, person) in people.iter().enumerate() {
        let variants = VariantSet::new(&person.search_variants, options.min_variant_len)
            .with_context(|| format!("Failed to compile variants for '{}'", person.slug))?;

        if variants.is_empty() {
            tracing::debug!(person = %person.slug, "no usable variants");
        } else {
            tracing::debug!(person = %person.slug, variants = variants.len(), "compiled variants");
        }

        let record = index_person(person, &variants, &readable, options);
        tracing::debug!(
            person = %person.slug,
            documents = record.documents.len(),
            matches = record.total_matches,
            "indexed"
        );
        progress.report(IndexProgressEvent::Indexing {
            person: person.display_name.clone(),
            n: i as u64 + 1,
            total,
            matches: record.total_matches as u64,
        });
        run.records.push(record);
    }

    Ok(run)
}

/// Scan one person across readable documents.
pub fn index_person(
    person: &Person,
    variants: &VariantSet,
    documents: &[&Document],
    options: &IndexOptions,
) -> PersonRecord {
    let mut record = PersonRecord::empty(person);
    if variants.is_empty() {
        return record;
    }

    for doc in documents {
        let mut matches = Vec::new();
        for (&page, text) in &doc.pages {
            matches.extend(index_page(variants, page, text, options));
        }

        if !matches.is_empty() {
            record.push_document(DocumentEvidence {
                filename: doc.id.clone(),
                meta: doc.meta.clone(),
                match_count: matches.len(),
                matches,
            });
        }
    }

    record
}

/// Deduplicated evidence for one page, in page order.
pub fn index_page(
    variants: &VariantSet,
    page: u32,
    text: &str,
    options: &IndexOptions,
) -> Vec<Evidence> {
    let raw = variants.find_matches(text);
    deduplicate_matches(raw, options.proximity_threshold)
        .into_iter()
        .map(|m| Evidence {
            page,
            snippet: extract_snippet(text, m.start, m.end, options.snippet_chars),
            matched_variant: m.variant,
        })
        .collect()
}
