//! Implementation of the `hd diff` command.
//!
//! Loads and normalizes both snapshot files, reconciles regenerated
//! identifiers, and hands the aligned pair to the reporter. Everything
//! fatal aborts before the first report line reaches stdout.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use hd_core::{Event, RawEvent, normalize, reconcile};

use crate::Config;
use crate::report::{self, Summary};

/// Loads one snapshot file and normalizes it.
fn load_snapshot(path: &Path) -> Result<Vec<Event>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let raw: Vec<RawEvent> = serde_json::from_str(&data)
        .with_context(|| format!("invalid event JSON in {}", path.display()))?;
    normalize(raw).with_context(|| format!("invalid snapshot {}", path.display()))
}

/// Compares two snapshot files and writes the change report to `writer`.
pub fn run<W: Write>(
    writer: &mut W,
    before_path: &Path,
    after_path: &Path,
    config: &Config,
) -> Result<Summary> {
    let before = load_snapshot(before_path)?;
    let after = load_snapshot(after_path)?;

    let alignment = reconcile(&before, &after)?;
    for warning in &alignment.warnings {
        tracing::warn!(
            id = %warning.id,
            candidates = ?warning.candidates,
            "multiple similar events matched; kept the first"
        );
    }
    tracing::debug!(rewrites = alignment.len(), "snapshots reconciled");
    let after = alignment.apply(after);

    report::render(writer, &before, &after, config)
}
