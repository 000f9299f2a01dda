//! Implementation of the `hd groupe-profs` command.
//!
//! Answers "which instructor teaches which group" over one snapshot: each
//! event associates its single instructor with every group attending it.
//! Events that don't fit that shape, and conflicting assignments, go to the
//! diagnostic stream and are skipped.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};

use hd_core::RawEvent;

/// Runs the groupe-profs command over a snapshot file.
pub fn run<W: Write>(writer: &mut W, path: &Path, ue: Option<&str>) -> Result<()> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let events: Vec<RawEvent> = serde_json::from_str(&data)
        .with_context(|| format!("invalid event JSON in {}", path.display()))?;

    let filter = ue
        .map(|pattern| RegexBuilder::new(pattern).case_insensitive(true).build())
        .transpose()
        .context("invalid course filter regex")?;

    for (groupe, prof) in group_assignments(&events, filter.as_ref()) {
        writeln!(writer, "{groupe}: {prof}")?;
    }
    Ok(())
}

/// Builds the group → instructor map. The first assignment for a group
/// wins; later conflicting ones are reported and ignored.
fn group_assignments(
    events: &[RawEvent],
    filter: Option<&Regex>,
) -> BTreeMap<String, String> {
    let mut assignments = BTreeMap::new();

    for event in events {
        let Some(course) = event.cours.as_ref().and_then(|c| c.first()) else {
            tracing::warn!(id = %event.id, "event carries no course");
            continue;
        };
        if filter.is_some_and(|re| !re.is_match(&course.code)) {
            continue;
        }

        let profs = event.profs.as_deref().unwrap_or_default();
        let [prof] = profs else {
            tracing::warn!(
                id = %event.id,
                count = profs.len(),
                "expected exactly one instructor"
            );
            continue;
        };

        for groupe in event.groupes.as_deref().unwrap_or_default() {
            match assignments.get(&groupe.code) {
                Some(existing) if *existing != prof.code => {
                    tracing::warn!(
                        groupe = %groupe.code,
                        kept = %existing,
                        conflicting = %prof.code,
                        "group has multiple instructors"
                    );
                }
                Some(_) => {}
                None => {
                    assignments.insert(groupe.code.clone(), prof.code.clone());
                }
            }
        }
    }

    assignments
}
