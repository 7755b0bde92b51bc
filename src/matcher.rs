//! Whole-word, case-insensitive variant matching.
//!
//! A [`VariantSet`] compiles a person's search variants once and then scans
//! any number of pages. Variants shorter than the configured floor are
//! dropped at compile time, so they can never produce a [`RawMatch`].
//!
//! Offsets in the returned matches are character offsets, which keeps the
//! proximity threshold and snippet widths independent of UTF-8 encoding.

use regex::{Regex, RegexBuilder};

use crate::models::RawMatch;

/// Variants shorter than this many characters are ignored by default.
pub const DEFAULT_MIN_VARIANT_LEN: usize = 3;

/// A person's variants, compiled for repeated scanning.
#[derive(Debug, Clone)]
pub struct VariantSet {
    patterns: Vec<(String, Regex)>,
}

impl VariantSet {
    /// Compile `variants`, skipping any shorter than `min_len` characters.
    pub fn new<S: AsRef<str>>(variants: &[S], min_len: usize) -> Result<Self, regex::Error> {
        let mut patterns = Vec::with_capacity(variants.len());
        for variant in variants {
            let variant = variant.as_ref().trim();
            if variant.chars().count() < min_len {
                continue;
            }
            let re = RegexBuilder::new(&format!(r"\b{}\b", regex::escape(variant)))
                .case_insensitive(true)
                .build()?;
            patterns.push((variant.to_string(), re));
        }
        Ok(Self { patterns })
    }

    /// True when every variant was filtered out.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Number of usable variants.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Every non-overlapping occurrence of every variant in `text`.
    ///
    /// Matches are grouped by variant (in variant order) and ascending
    /// within a variant. Overlaps between different variants are all kept.
    pub fn find_matches(&self, text: &str) -> Vec<RawMatch> {
        if self.patterns.is_empty() || text.is_empty() {
            return Vec::new();
        }

        let offsets = CharOffsets::new(text);
        let mut matches = Vec::new();
        for (variant, re) in &self.patterns {
            for m in re.find_iter(text) {
                matches.push(RawMatch {
                    variant: variant.clone(),
                    start: offsets.char_at(m.start()),
                    end: offsets.char_at(m.end()),
                    matched_text: m.as_str().to_string(),
                });
            }
        }
        matches
    }
}

/// Find all matches of `variants` in `text` without keeping the compiled set.
pub fn find_name_matches<S: AsRef<str>>(
    text: &str,
    variants: &[S],
    min_len: usize,
) -> Result<Vec<RawMatch>, regex::Error> {
    Ok(VariantSet::new(variants, min_len)?.find_matches(text))
}

/// Byte offset → character offset translation for one text.
enum CharOffsets {
    Ascii,
    Boundaries(Vec<usize>),
}

impl CharOffsets {
    fn new(text: &str) -> Self {
        if text.is_ascii() {
            CharOffsets::Ascii
        } else {
            let mut bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
            bounds.push(text.len());
            CharOffsets::Boundaries(bounds)
        }
    }

    /// `byte` must lie on a char boundary, which regex match bounds always do.
    fn char_at(&self, byte: usize) -> usize {
        match self {
            CharOffsets::Ascii => byte,
            CharOffsets::Boundaries(bounds) => match bounds.binary_search(&byte) {
                Ok(i) => i,
                Err(i) => i,
            },
        }
    }
}
