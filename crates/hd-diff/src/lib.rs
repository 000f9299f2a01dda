//! Id-keyed structural diff over JSON collections.
//!
//! Compares two arrays of JSON objects aligned by a configurable key field
//! and produces typed change entries: elements added, removed, or updated,
//! with per-field change descriptors for updates. Composite (array-valued)
//! field changes can be flattened into leaf-level old/new pairs via
//! [`FieldChange::atomize`].
//!
//! The engine is domain-agnostic: it knows nothing about what the objects
//! mean, only that the key field identifies an element across both sides.
//!
//! # Determinism
//!
//! Entry order is stable: removals and updates follow the order of the old
//! collection, additions the order of the new one. Field changes within an
//! update follow lexicographic field order (`serde_json` objects iterate
//! sorted).
//!
//! # Limits
//!
//! Array-valued fields are compared positionally; object-valued fields are
//! compared atomically (one `Updated` descriptor for the whole value).
//! Elements must be objects carrying a string value under the key field.

use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised while aligning collections on the key field.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DiffError {
    /// An element is not a JSON object.
    #[error("element {index} is not an object")]
    NotAnObject { index: usize },
    /// An element has no value under the key field.
    #[error("element {index} has no \"{key}\" field")]
    MissingKey { index: usize, key: String },
    /// An element's key field is not a string.
    #[error("element {index} has a non-string \"{key}\" field")]
    NonStringKey { index: usize, key: String },
}

/// One element-level entry in a change-set.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// An element present only in the new collection.
    Add {
        /// The element's key value.
        key: String,
        /// The full added element.
        value: Value,
    },
    /// An element present only in the old collection.
    Remove {
        /// The element's key value.
        key: String,
        /// The full removed element.
        value: Value,
    },
    /// An element present in both collections with differing content.
    Update {
        /// The element's key value.
        key: String,
        /// One descriptor per changed field.
        changes: Vec<FieldChange>,
    },
}

/// A field-level change inside an [`Change::Update`] entry.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldChange {
    /// The field appeared.
    Added { field: String, value: Value },
    /// The field disappeared.
    Removed { field: String, value: Value },
    /// The field changed value (scalar, or composite compared atomically).
    Updated { field: String, old: Value, new: Value },
    /// An array-valued field changed; per-element changes nested inside.
    Nested {
        field: String,
        changes: Vec<ElementChange>,
    },
}

/// A positional change to one element of an array-valued field.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementChange {
    /// An element appeared at `index`.
    Added { index: usize, value: Value },
    /// The element at `index` disappeared.
    Removed { index: usize, value: Value },
    /// The element at `index` changed value.
    Updated { index: usize, old: Value, new: Value },
}

/// A leaf-level old/new pair extracted from a field change.
#[derive(Debug, Clone, PartialEq)]
pub enum AtomicChange {
    /// A value appeared.
    Added { value: Value },
    /// A value disappeared.
    Removed { value: Value },
    /// A value was replaced.
    Updated { old: Value, new: Value },
}

impl FieldChange {
    /// Name of the changed field.
    pub fn field(&self) -> &str {
        match self {
            Self::Added { field, .. }
            | Self::Removed { field, .. }
            | Self::Updated { field, .. }
            | Self::Nested { field, .. } => field,
        }
    }

    /// Flattens this change into leaf-level old/new pairs.
    ///
    /// A scalar change yields exactly one atom; a nested composite change
    /// yields one atom per changed element. An empty `Nested` descriptor
    /// yields nothing (the caller decides how to report that).
    pub fn atomize(&self) -> Vec<AtomicChange> {
        match self {
            Self::Added { value, .. } => vec![AtomicChange::Added {
                value: value.clone(),
            }],
            Self::Removed { value, .. } => vec![AtomicChange::Removed {
                value: value.clone(),
            }],
            Self::Updated { old, new, .. } => vec![AtomicChange::Updated {
                old: old.clone(),
                new: new.clone(),
            }],
            Self::Nested { changes, .. } => changes
                .iter()
                .map(|change| match change {
                    ElementChange::Added { value, .. } => AtomicChange::Added {
                        value: value.clone(),
                    },
                    ElementChange::Removed { value, .. } => AtomicChange::Removed {
                        value: value.clone(),
                    },
                    ElementChange::Updated { old, new, .. } => AtomicChange::Updated {
                        old: old.clone(),
                        new: new.clone(),
                    },
                })
                .collect(),
        }
    }
}

/// All changes between one pair of collections.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSet {
    /// Element-level entries, in deterministic order.
    pub changes: Vec<Change>,
}

/// Ordered key/object pairs extracted from one collection.
struct Indexed<'a> {
    entries: Vec<(&'a str, &'a Map<String, Value>)>,
}

impl<'a> Indexed<'a> {
    fn get(&self, key: &str) -> Option<&'a Map<String, Value>> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, obj)| *obj)
    }

    fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| *k == key)
    }
}

fn index_by_key<'a>(collection: &'a [Value], key: &str) -> Result<Indexed<'a>, DiffError> {
    let mut entries = Vec::with_capacity(collection.len());
    for (index, value) in collection.iter().enumerate() {
        let object = value.as_object().ok_or(DiffError::NotAnObject { index })?;
        let key_value = object.get(key).ok_or_else(|| DiffError::MissingKey {
            index,
            key: key.to_string(),
        })?;
        let key_str = key_value.as_str().ok_or_else(|| DiffError::NonStringKey {
            index,
            key: key.to_string(),
        })?;
        entries.push((key_str, object));
    }
    Ok(Indexed { entries })
}

/// Positional diff of two array values.
fn diff_elements(old: &[Value], new: &[Value]) -> Vec<ElementChange> {
    let mut changes = Vec::new();
    for index in 0..old.len().max(new.len()) {
        match (old.get(index), new.get(index)) {
            (Some(old_elem), Some(new_elem)) if old_elem != new_elem => {
                changes.push(ElementChange::Updated {
                    index,
                    old: old_elem.clone(),
                    new: new_elem.clone(),
                });
            }
            (Some(_), Some(_)) => {}
            (Some(old_elem), None) => changes.push(ElementChange::Removed {
                index,
                value: old_elem.clone(),
            }),
            (None, Some(new_elem)) => changes.push(ElementChange::Added {
                index,
                value: new_elem.clone(),
            }),
            (None, None) => unreachable!("index bounded by max length"),
        }
    }
    changes
}

/// Field-by-field diff of two objects already known to differ.
fn diff_fields(old: &Map<String, Value>, new: &Map<String, Value>) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    let fields: std::collections::BTreeSet<&String> = old.keys().chain(new.keys()).collect();
    for field in fields {
        match (old.get(field.as_str()), new.get(field.as_str())) {
            (Some(old_value), Some(new_value)) if old_value != new_value => {
                match (old_value.as_array(), new_value.as_array()) {
                    (Some(old_items), Some(new_items)) => changes.push(FieldChange::Nested {
                        field: field.clone(),
                        changes: diff_elements(old_items, new_items),
                    }),
                    _ => changes.push(FieldChange::Updated {
                        field: field.clone(),
                        old: old_value.clone(),
                        new: new_value.clone(),
                    }),
                }
            }
            (Some(_), Some(_)) => {}
            (Some(old_value), None) => changes.push(FieldChange::Removed {
                field: field.clone(),
                value: old_value.clone(),
            }),
            (None, Some(new_value)) => changes.push(FieldChange::Added {
                field: field.clone(),
                value: new_value.clone(),
            }),
            (None, None) => unreachable!("field drawn from the union of both objects"),
        }
    }
    changes
}

/// Diffs two collections of objects aligned on `key`.
///
/// Returns no change-set when the collections are equal, otherwise a single
/// change-set covering every element-level difference. Key values are
/// expected to be unique within each collection; callers enforce that.
pub fn diff_by_key(
    old: &[Value],
    new: &[Value],
    key: &str,
) -> Result<Vec<ChangeSet>, DiffError> {
    let old_indexed = index_by_key(old, key)?;
    let new_indexed = index_by_key(new, key)?;

    let mut changes = Vec::new();

    for &(k, old_object) in &old_indexed.entries {
        match new_indexed.get(k) {
            None => changes.push(Change::Remove {
                key: k.to_string(),
                value: Value::Object(old_object.clone()),
            }),
            Some(new_object) if old_object != new_object => changes.push(Change::Update {
                key: k.to_string(),
                changes: diff_fields(old_object, new_object),
            }),
            Some(_) => {}
        }
    }

    for &(k, new_object) in &new_indexed.entries {
        if !old_indexed.contains(k) {
            changes.push(Change::Add {
                key: k.to_string(),
                value: Value::Object(new_object.clone()),
            });
        }
    }

    if changes.is_empty() {
        Ok(Vec::new())
    } else {
        Ok(vec![ChangeSet { changes }])
    }
}
