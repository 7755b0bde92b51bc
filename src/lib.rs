//! # People Index
//!
//! Finds mentions of curated people in document page text and builds a
//! per-person evidence index for a static website.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────────────────────┐   ┌──────────┐
//! │   Sources   │──▶│           Indexer            │──▶│  Export  │
//! │ manifest/fs │   │ match → dedup → snippet      │   │   JSON   │
//! └─────────────┘   └──────────────────────────────┘   └────┬─────┘
//!                                                           │
//!                                          ┌────────────────┤
//!                                          ▼                ▼
//!                                     ┌─────────┐      ┌─────────┐
//!                                     │  patch  │      │  stats  │
//!                                     └─────────┘      └─────────┘
//! ```
//!
//! The indexer core ([`matcher`], [`dedup`], [`snippet`], [`indexer`]) is
//! pure and synchronous. Sources may do I/O and load files in parallel.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`names`] | Person definitions file |
//! | [`matcher`] | Whole-word variant matching |
//! | [`dedup`] | Proximity deduplication |
//! | [`snippet`] | Context snippets |
//! | [`indexer`] | Run orchestration |
//! | [`source`] | Document source trait and registry |
//! | [`source_fs`] | Filesystem source |
//! | [`source_manifest`] | Manifest source |
//! | [`extract`] | Per-page text extraction |
//! | [`export`] | Index JSON output |
//! | [`patch`] | Patch sets over the exported index |
//! | [`stats`] | Index summary |

pub mod config;
pub mod dedup;
pub mod export;
pub mod extract;
pub mod index_cmd;
pub mod indexer;
pub mod matcher;
pub mod models;
pub mod names;
pub mod patch;
pub mod progress;
pub mod snippet;
pub mod source;
pub mod source_fs;
pub mod source_manifest;
pub mod sources;
pub mod stats;
