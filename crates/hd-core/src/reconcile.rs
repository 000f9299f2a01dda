//! Cross-snapshot event reconciliation.
//!
//! Calendar re-exports regenerate event identifiers, so an unchanged or
//! lightly edited occurrence comes back with a fresh id and a naive id-keyed
//! diff would report it as a removal plus an unrelated addition.
//! Reconciliation re-aligns the two snapshots by content before the
//! structural diff runs: events whose id already appears on both sides are
//! left alone, and the remaining "after" events are matched greedily against
//! the remaining "before" events, first on identical content, then on
//! content differing in at most one comparable field.
//!
//! Matching is greedy and order-dependent on purpose: earlier "after" events
//! claim candidates first and a consumed candidate is never reused. There is
//! no optimal-assignment search; snapshots are small and the downstream
//! report is written against first-fit semantics.

use std::collections::{BTreeMap, HashSet};

use thiserror::Error;

use crate::event::Event;
use crate::similarity::{identical, similar};
use crate::types::EventId;

/// Errors raised while matching candidate events.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// Two or more "before" events are content-identical to one "after"
    /// candidate. There is no defensible way to pick one, so the run aborts
    /// rather than guess.
    #[error("multiple events identical to added event {id} (candidates: {})",
        candidate_list(.candidates))]
    AmbiguousIdentical {
        /// The "after" candidate with more than one identical match.
        id: EventId,
        /// Ids of every identical "before" event, in pool order.
        candidates: Vec<EventId>,
    },
}

fn candidate_list(candidates: &[EventId]) -> String {
    let ids: Vec<&str> = candidates.iter().map(EventId::as_str).collect();
    ids.join(", ")
}

/// A non-fatal ambiguity: several "before" events were similar to one
/// "after" candidate and the first in pool order was chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbiguousSimilarity {
    /// The "after" candidate that matched more than once.
    pub id: EventId,
    /// Ids of every similar "before" event, in pool order; the first one is
    /// the match that was kept.
    pub candidates: Vec<EventId>,
}

/// The computed alignment between two snapshots.
///
/// Maps an "after"-side identifier to the identifier of the "before" event
/// it was matched with. "Before" identifiers are authoritative and never
/// rewritten; applying the alignment only touches the "after" side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Alignment {
    rewrites: BTreeMap<EventId, EventId>,
    /// Similarity matches that had more than one candidate.
    pub warnings: Vec<AmbiguousSimilarity>,
}

impl Alignment {
    /// Canonical ("before") id for an "after" event, if it was matched.
    pub fn canonical_id(&self, id: &EventId) -> Option<&EventId> {
        self.rewrites.get(id)
    }

    /// Iterates over `(after id, canonical id)` pairs.
    pub fn rewrites(&self) -> impl Iterator<Item = (&EventId, &EventId)> {
        self.rewrites.iter()
    }

    /// Number of id rewrites the alignment carries.
    pub fn len(&self) -> usize {
        self.rewrites.len()
    }

    /// Whether the alignment rewrites nothing.
    pub fn is_empty(&self) -> bool {
        self.rewrites.is_empty()
    }

    /// Rewrites "after"-side ids to their canonical "before" ids.
    ///
    /// Unmatched events and record order are preserved untouched. After this
    /// step the two collections can be diffed keyed by id.
    #[must_use]
    pub fn apply(&self, mut after: Vec<Event>) -> Vec<Event> {
        for event in &mut after {
            if let Some(canonical) = self.rewrites.get(&event.id) {
                event.id = canonical.clone();
            }
        }
        after
    }
}

/// Computes the alignment between a "before" and an "after" snapshot.
///
/// Both snapshots must already be normalized and duplicate-free. The
/// returned [`Alignment`] records every id rewrite the "after" side needs
/// plus any similarity ambiguities encountered; the input collections are
/// not modified.
pub fn reconcile(before: &[Event], after: &[Event]) -> Result<Alignment, ReconcileError> {
    let before_ids: HashSet<&EventId> = before.iter().map(|e| &e.id).collect();
    let after_ids: HashSet<&EventId> = after.iter().map(|e| &e.id).collect();

    // Events whose id survived the re-export are already aligned.
    let mut removed: Vec<&Event> = before
        .iter()
        .filter(|e| !after_ids.contains(&e.id))
        .collect();
    let added: Vec<&Event> = after
        .iter()
        .filter(|e| !before_ids.contains(&e.id))
        .collect();

    tracing::debug!(
        removed_candidates = removed.len(),
        added_candidates = added.len(),
        "matching residual pools"
    );

    let mut alignment = Alignment::default();
    let mut remaining: Vec<&Event> = Vec::new();

    // Exact pass: only an unambiguous identical match is acceptable.
    for event in added {
        let matches: Vec<usize> = removed
            .iter()
            .enumerate()
            .filter(|&(_, other)| identical(event, other))
            .map(|(idx, _)| idx)
            .collect();
        match matches.as_slice() {
            [] => remaining.push(event),
            [idx] => {
                let other = removed.remove(*idx);
                alignment.rewrites.insert(event.id.clone(), other.id.clone());
            }
            _ => {
                return Err(ReconcileError::AmbiguousIdentical {
                    id: event.id.clone(),
                    candidates: matches.iter().map(|&i| removed[i].id.clone()).collect(),
                });
            }
        }
    }

    // Similarity pass over whatever the exact pass left in the pool. A
    // multiple match is tolerated here: a plausible match beats no match,
    // but the choice is surfaced for operator review.
    for event in remaining {
        let matches: Vec<usize> = removed
            .iter()
            .enumerate()
            .filter(|&(_, other)| similar(event, other))
            .map(|(idx, _)| idx)
            .collect();
        let Some(&first) = matches.first() else {
            continue; // genuine addition
        };
        if matches.len() > 1 {
            alignment.warnings.push(AmbiguousSimilarity {
                id: event.id.clone(),
                candidates: matches.iter().map(|&i| removed[i].id.clone()).collect(),
            });
        }
        let other = removed.remove(first);
        alignment.rewrites.insert(event.id.clone(), other.id.clone());
    }

    Ok(alignment)
}
