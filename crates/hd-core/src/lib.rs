//! Core domain logic for the schedule diff tool.
//!
//! This crate contains the fundamental types and logic for:
//! - Normalization: reducing exported events to their comparable fields
//! - Similarity: counting differing comparable fields between two events
//! - Reconciliation: re-aligning event identifiers across two snapshots

pub mod event;
mod normalize;
mod reconcile;
mod similarity;
pub mod types;

pub use event::{Event, RawEvent, Resource};
pub use normalize::{NormalizeError, normalize};
pub use reconcile::{Alignment, AmbiguousSimilarity, ReconcileError, reconcile};
pub use similarity::{SIMILAR_MAX_DIFFERENCES, difference_count, identical, similar};
pub use types::{EventId, ValidationError};
