//! Person definitions loaded from a versioned data file.
//!
//! ```json
//! {
//!   "version": "2024-11-19",
//!   "names": [
//!     {
//!       "display_name": "Bill Clinton",
//!       "slug": "bill-clinton",
//!       "search_variants": ["Bill Clinton", "Clinton, Bill", "William Clinton"],
//!       "priority": "P0",
//!       "category": "politics"
//!     }
//!   ]
//! }
//! ```
//!
//! `slug` may be omitted and is then derived from `display_name`.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::models::Person;

#[derive(Debug, Deserialize)]
struct NamesFile {
    #[serde(default)]
    version: Option<String>,
    names: Vec<NameEntry>,
}

#[derive(Debug, Deserialize)]
struct NameEntry {
    display_name: String,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    search_variants: Vec<String>,
    #[serde(default)]
    priority: String,
    #[serde(default)]
    category: String,
}

/// Validated person definitions for one run.
#[derive(Debug, Clone)]
pub struct NameSet {
    pub version: Option<String>,
    pub people: Vec<Person>,
}

pub fn load_names(path: &Path) -> Result<NameSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read names file: {}", path.display()))?;
    parse_names(&content).with_context(|| format!("Invalid names file: {}", path.display()))
}

pub fn parse_names(json: &str) -> Result<NameSet> {
    let file: NamesFile = serde_json::from_str(json)?;

    let mut seen = HashSet::new();
    let mut people = Vec::with_capacity(file.names.len());
    for (i, entry) in file.names.into_iter().enumerate() {
        let display_name = entry.display_name.trim().to_string();
        if display_name.is_empty() {
            bail!("names[{}]: display_name must not be empty", i);
        }

        let slug = match entry.slug {
            Some(s) if !s.trim().is_empty() => s.trim().to_string(),
            _ => slugify(&display_name),
        };
        if slug.is_empty() {
            bail!("names[{}]: cannot derive a slug from '{}'", i, display_name);
        }
        if !seen.insert(slug.clone()) {
            bail!("names[{}]: duplicate slug '{}'", i, slug);
        }

        people.push(Person {
            display_name,
            slug,
            search_variants: entry.search_variants,
            priority: entry.priority,
            category: entry.category,
        });
    }

    Ok(NameSet {
        version: file.version,
        people,
    })
}

/// Lowercase, ASCII alphanumerics and single dashes only.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else if c.is_whitespace() || c == '-' {
            pending_dash = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_matches_site_urls() {
        assert_eq!(slugify("Bill Clinton"), "bill-clinton");
        assert_eq!(slugify("  Prince   Andrew "), "prince-andrew");
        assert_eq!(slugify("George W. Bush"), "george-w-bush");
        assert_eq!(slugify("Jean-Luc Brunel"), "jean-luc-brunel");
        assert_eq!(slugify("O'Brien -- Jr."), "obrien-jr");
    }

    #[test]
    fn derives_missing_slugs() {
        let set = parse_names(
            r#"{"version": "v1", "names": [
                {"display_name": "Les Wexner", "search_variants": ["Les Wexner", "Wexner"]},
                {"display_name": "Ghislaine Maxwell", "slug": "gm", "search_variants": []}
            ]}"#,
        )
        .unwrap();
        assert_eq!(set.version.as_deref(), Some("v1"));
        assert_eq!(set.people[0].slug, "les-wexner");
        assert_eq!(set.people[1].slug, "gm");
        assert!(set.people[1].search_variants.is_empty());
    }

    #[test]
    fn rejects_duplicate_slugs() {
        let err = parse_names(
            r#"{"names": [
                {"display_name": "Bill Clinton"},
                {"display_name": "bill clinton"}
            ]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate slug"));
    }

    #[test]
    fn rejects_blank_display_name() {
        assert!(parse_names(r#"{"names": [{"display_name": "  "}]}"#).is_err());
    }
}
