//! Content similarity between normalized events.
//!
//! Two events are compared on five fields: the four resource code lists
//! (as sets, order ignored) and the start/end pair (any inequality in
//! either endpoint counts as one difference). Identifiers never participate;
//! similarity is what lets the reconciler match events whose ids were
//! regenerated between exports.

use crate::event::Event;

/// Maximum number of differing comparable fields for two events to still be
/// treated as the same occurrence. A real-world edit touches one dimension
/// at a time (the room moved, or the slot moved, or the instructor was
/// swapped); two or more simultaneous differences are read as unrelated
/// events.
pub const SIMILAR_MAX_DIFFERENCES: usize = 1;

/// Set equality over optional code lists: same length and every element of
/// one present in the other. An absent list only equals another absent list.
fn eq_as_sets(xs: Option<&[String]>, ys: Option<&[String]>) -> bool {
    match (xs, ys) {
        (None, None) => true,
        (Some(xs), Some(ys)) => xs.len() == ys.len() && xs.iter().all(|x| ys.contains(x)),
        _ => false,
    }
}

/// Number of comparable fields on which `a` and `b` disagree, in `[0, 5]`.
#[must_use]
pub fn difference_count(a: &Event, b: &Event) -> usize {
    let mut count = 0;
    if !eq_as_sets(a.cours.as_deref(), b.cours.as_deref()) {
        count += 1;
    }
    if !eq_as_sets(a.salles.as_deref(), b.salles.as_deref()) {
        count += 1;
    }
    if !eq_as_sets(a.profs.as_deref(), b.profs.as_deref()) {
        count += 1;
    }
    if !eq_as_sets(a.groupes.as_deref(), b.groupes.as_deref()) {
        count += 1;
    }
    // start+end count as one field: a moved occurrence is one change.
    if a.start != b.start || a.end != b.end {
        count += 1;
    }
    count
}

/// Whether `a` and `b` agree on every comparable field.
#[must_use]
pub fn identical(a: &Event, b: &Event) -> bool {
    difference_count(a, b) == 0
}

/// Whether `a` and `b` differ on at most [`SIMILAR_MAX_DIFFERENCES`]
/// comparable fields.
#[must_use]
pub fn similar(a: &Event, b: &Event) -> bool {
    difference_count(a, b) <= SIMILAR_MAX_DIFFERENCES
}
