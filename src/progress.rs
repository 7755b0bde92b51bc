//! Index run progress reporting.
//!
//! Reports observable progress during `pidx index` so users see which
//! source is loading and how many people are left to scan. Progress is
//! emitted on **stderr** so stdout remains parseable when the index is
//! written there.

use std::io::Write;

/// A single progress event for an index run.
#[derive(Clone, Debug)]
pub enum IndexProgressEvent {
    /// A document source is loading (total unknown).
    Loading { source: String },
    /// Person `n` of `total` has been scanned across every document.
    Indexing {
        person: String,
        n: u64,
        total: u64,
        matches: u64,
    },
}

/// Reports index progress. Implementations write to stderr (human or JSON).
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: IndexProgressEvent);
}

/// Human-friendly progress on stderr: "index  1,234 / 5,000 people  (Bill Clinton: 12 matches)".
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, event: IndexProgressEvent) {
        let line = match &event {
            IndexProgressEvent::Loading { source } => {
                format!("load {}  reading documents...\n", source)
            }
            IndexProgressEvent::Indexing {
                person,
                n,
                total,
                matches,
            } => format!(
                "index  {} / {} people  ({}: {} matches)\n",
                format_number(*n),
                format_number(*total),
                person,
                format_number(*matches)
            ),
        };
        let mut err = std::io::stderr().lock();
        let _ = err.write_all(line.as_bytes());
        let _ = err.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ProgressReporter for JsonProgress {
    fn report(&self, event: IndexProgressEvent) {
        let obj = match &event {
            IndexProgressEvent::Loading { source } => serde_json::json!({
                "event": "progress",
                "phase": "loading",
                "source": source
            }),
            IndexProgressEvent::Indexing {
                person,
                n,
                total,
                matches,
            } => serde_json::json!({
                "event": "progress",
                "phase": "indexing",
                "person": person,
                "n": n,
                "total": total,
                "matches": matches
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut err = std::io::stderr().lock();
            let _ = writeln!(err, "{}", line);
            let _ = err.flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: IndexProgressEvent) {}
}

pub(crate) fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
