//! Snapshot normalization.
//!
//! Reduces exported events to the fields the similarity model and the
//! structural diff are allowed to see, and rejects snapshots whose
//! identifiers are not unique.

use std::collections::HashSet;

use thiserror::Error;

use crate::event::{Event, RawEvent, Resource};

/// Errors raised while normalizing a snapshot.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// Two or more records in one snapshot share an identifier. Matching
    /// over such a snapshot would be meaningless, so this aborts the run
    /// before any comparison happens.
    #[error("events with duplicate ids found ({total} elements but {distinct} ids)")]
    DuplicateIds { total: usize, distinct: usize },
}

fn codes(resources: Option<Vec<Resource>>) -> Option<Vec<String>> {
    resources.map(|list| list.into_iter().map(|r| r.code).collect())
}

/// Normalizes one snapshot.
///
/// Each resource list is replaced by the list of its codes, the volatile
/// `description` and `location` fields are dropped, and record order is
/// preserved. Fails if any identifier appears more than once.
pub fn normalize(events: Vec<RawEvent>) -> Result<Vec<Event>, NormalizeError> {
    let total = events.len();
    let distinct = events
        .iter()
        .map(|e| e.id.as_str())
        .collect::<HashSet<_>>()
        .len();
    if distinct != total {
        return Err(NormalizeError::DuplicateIds { total, distinct });
    }

    Ok(events
        .into_iter()
        .map(|raw| Event {
            id: raw.id,
            start: raw.start,
            end: raw.end,
            cours: codes(raw.cours),
            salles: codes(raw.salles),
            profs: codes(raw.profs),
            groupes: codes(raw.groupes),
        })
        .collect())
}
