//! Proximity-based match deduplication.
//!
//! Tabular documents (flight manifests, contact lists) often repeat one
//! person in several columns of the same row: full name, "Last, First",
//! nickname, initials. Each column matches a different variant, so a raw
//! count would report one physical mention several times over.
//!
//! [`deduplicate_matches`] groups matches into clusters where every match
//! starts within `proximity_threshold` characters of the end of the
//! previous match in the cluster, and keeps a single representative per
//! cluster: the longest variant, with the earliest start breaking ties.

use crate::models::{DeduplicatedMatch, RawMatch};

/// Default maximum gap, in characters, between matches of one mention.
pub const DEFAULT_PROXIMITY_THRESHOLD: usize = 200;

/// Collapse matches that belong to the same logical mention.
///
/// The result holds exactly one match per cluster, ordered by position.
pub fn deduplicate_matches(
    mut matches: Vec<RawMatch>,
    proximity_threshold: usize,
) -> Vec<DeduplicatedMatch> {
    if matches.len() < 2 {
        return matches;
    }

    // Stable: equal starts keep variant order from the matcher.
    matches.sort_by_key(|m| m.start);

    let mut deduplicated = Vec::new();
    let mut cluster: Vec<RawMatch> = Vec::new();

    for m in matches {
        if let Some(last) = cluster.last() {
            if m.start > last.end.saturating_add(proximity_threshold) {
                deduplicated.extend(select_best_match(std::mem::take(&mut cluster)));
            }
        }
        cluster.push(m);
    }
    deduplicated.extend(select_best_match(cluster));

    deduplicated
}

/// Pick the representative of a cluster; `None` only for an empty one.
fn select_best_match(cluster: Vec<RawMatch>) -> Option<RawMatch> {
    cluster.into_iter().reduce(|best, m| {
        let (len, best_len) = (m.variant_len(), best.variant_len());
        if len > best_len || (len == best_len && m.start < best.start) {
            m
        } else {
            best
        }
    })
}
