use anyhow::Result;
use serde::Serialize;

use crate::config::Config;
use crate::source::SourceRegistry;

/// Health summary of one configured source.
#[derive(Debug, Clone, Serialize)]
pub struct SourceStatus {
    pub name: String,
    pub source_type: String,
    pub location: String,
    pub healthy: bool,
}

pub fn get_sources(config: &Config) -> Vec<SourceStatus> {
    SourceRegistry::from_config(config)
        .sources()
        .iter()
        .map(|s| SourceStatus {
            name: s.name().to_string(),
            source_type: s.source_type().to_string(),
            location: s.location(),
            healthy: s.is_healthy(),
        })
        .collect()
}

pub fn list_sources(config: &Config) -> Result<()> {
    let sources = get_sources(config);

    if sources.is_empty() {
        println!("No sources configured. Add [sources.manifest.<name>] or [sources.filesystem.<name>].");
        return Ok(());
    }

    println!("{:<24} {:<12} {:<8} LOCATION", "SOURCE", "TYPE", "HEALTHY");
    for s in &sources {
        println!(
            "{:<24} {:<12} {:<8} {}",
            s.name, s.source_type, s.healthy, s.location
        );
    }

    Ok(())
}
