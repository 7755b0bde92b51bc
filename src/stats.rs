//! Index statistics overview.
//!
//! Provides a quick summary of an exported index: how many people were
//! found, total evidence, the most-mentioned people, and which documents
//! carry the most distinct people. Used by `pidx stats` to sanity-check a
//! run before publishing it.

use anyhow::Result;
use std::collections::BTreeMap;
use std::path::Path;

use crate::export::read_index;
use crate::models::PeopleIndex;
use crate::progress::format_number;

/// Per-document breakdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentStats {
    pub filename: String,
    pub people: usize,
    pub matches: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStats {
    pub total_names: usize,
    pub found: usize,
    pub total_matches: usize,
    /// (display name, matches), most matches first.
    pub top_people: Vec<(String, usize)>,
    /// Documents ordered by distinct people, then matches, then name.
    pub documents: Vec<DocumentStats>,
}

pub fn compute_stats(index: &PeopleIndex, top: usize) -> IndexStats {
    let found = index.people.iter().filter(|p| p.found_in_documents).count();
    let total_matches = index.people.iter().map(|p| p.total_matches).sum();

    let mut ranked: Vec<(String, usize)> = index
        .people
        .iter()
        .filter(|p| p.total_matches > 0)
        .map(|p| (p.display_name.clone(), p.total_matches))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(top);

    let mut per_doc: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for person in &index.people {
        for doc in &person.documents {
            let entry = per_doc.entry(doc.filename.as_str()).or_default();
            entry.0 += 1;
            entry.1 += doc.matches.len();
        }
    }
    let mut documents: Vec<DocumentStats> = per_doc
        .into_iter()
        .map(|(filename, (people, matches))| DocumentStats {
            filename: filename.to_string(),
            people,
            matches,
        })
        .collect();
    documents.sort_by(|a, b| {
        b.people
            .cmp(&a.people)
            .then_with(|| b.matches.cmp(&a.matches))
            .then_with(|| a.filename.cmp(&b.filename))
    });

    IndexStats {
        total_names: index.people.len(),
        found,
        total_matches,
        top_people: ranked,
        documents,
    }
}

/// Run the stats command: read the index and print a summary.
pub fn run_stats(index_path: &Path, top: usize) -> Result<()> {
    let index = read_index(index_path)?;
    let stats = compute_stats(&index, top);

    println!("People Index — Stats");
    println!("====================");
    println!();
    println!("  Index:       {}", index_path.display());
    println!("  Version:     {}", index.metadata.version);
    println!("  Generated:   {}", index.metadata.generated);
    println!();
    println!("  Names:       {}", stats.total_names);
    println!("  Found:       {}", stats.found);
    println!("  Not found:   {}", stats.total_names - stats.found);
    println!("  Matches:     {}", format_number(stats.total_matches as u64));

    if !stats.top_people.is_empty() {
        println!();
        println!("  Top people:");
        println!("  {:<32} {:>8}", "NAME", "MATCHES");
        println!("  {}", "-".repeat(41));
        for (name, matches) in &stats.top_people {
            println!("  {:<32} {:>8}", name, matches);
        }
    }

    if !stats.documents.is_empty() {
        println!();
        println!("  By document:");
        println!("  {:<40} {:>7} {:>8}", "DOCUMENT", "PEOPLE", "MATCHES");
        println!("  {}", "-".repeat(57));
        for d in &stats.documents {
            println!("  {:<40} {:>7} {:>8}", d.filename, d.people, d.matches);
        }
    }

    println!();
    Ok(())
}
