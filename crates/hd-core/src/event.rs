//! Schedule event records, before and after normalization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::EventId;

/// A resource reference as exported by the calendar source.
///
/// Codes are short identifiers ("A101", "DUPONT", "B1-Q1"); the display
/// name is optional and dropped during normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Short resource code.
    pub code: String,
    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Resource {
    /// Convenience constructor for a resource without a display name.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: None,
        }
    }
}

/// An event as exported by the calendar source, prior to normalization.
///
/// Resource lists are optional: the exporter omits a category entirely when
/// it has no data for it, which is distinct from an empty list. The free-text
/// `description` and `location` are volatile across re-exports and never
/// participate in comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Unique identifier within one snapshot.
    pub id: EventId,
    /// Start of the occurrence.
    pub start: DateTime<Utc>,
    /// End of the occurrence.
    pub end: DateTime<Utc>,
    /// Free-text description the resource lists were parsed from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Free-text location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Courses taught during the occurrence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cours: Option<Vec<Resource>>,
    /// Rooms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salles: Option<Vec<Resource>>,
    /// Instructors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profs: Option<Vec<Resource>>,
    /// Student groups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groupes: Option<Vec<Resource>>,
}

/// A normalized event: resource lists reduced to their codes, volatile
/// fields removed. This is the unit of reconciliation and diffing.
///
/// The four resource lists and the start/end pair are the five comparable
/// fields of the similarity model. Lists are compared as sets; `None` means
/// the category was absent from the export and only compares equal to
/// another `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier within one snapshot; the join key once
    /// reconciliation completes.
    pub id: EventId,
    /// Start of the occurrence.
    pub start: DateTime<Utc>,
    /// End of the occurrence.
    pub end: DateTime<Utc>,
    /// Course codes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cours: Option<Vec<String>>,
    /// Room codes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salles: Option<Vec<String>>,
    /// Instructor codes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profs: Option<Vec<String>>,
    /// Group codes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groupes: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_event_deserializes_exporter_shape() {
        let json = r#"{
            "id": "evt-1",
            "start": "2025-09-08T06:30:00.000Z",
            "end": "2025-09-08T08:30:00.000Z",
            "description": "ALG3\nA101\nDUPONT",
            "cours": [{"code": "ALG3", "name": "ALG3 - Algorithmique"}],
            "salles": [{"code": "A101"}],
            "profs": [{"code": "DUPONT"}]
        }"#;
        let event: RawEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.id.as_str(), "evt-1");
        assert_eq!(
            event.cours.as_deref(),
            Some(&[Resource {
                code: "ALG3".into(),
                name: Some("ALG3 - Algorithmique".into()),
            }][..])
        );
        assert_eq!(event.groupes, None);
    }

    #[test]
    fn normalized_event_omits_absent_lists() {
        let json = r#"{
            "id": "evt-1",
            "start": "2025-09-08T06:30:00Z",
            "end": "2025-09-08T08:30:00Z",
            "salles": ["A101"]
        }"#;
        let event: Event = serde_json::from_str(json).unwrap();
        let back = serde_json::to_value(&event).unwrap();
        assert!(back.get("cours").is_none());
        assert_eq!(back["salles"], serde_json::json!(["A101"]));
    }

    #[test]
    fn event_rejects_empty_id() {
        let json = r#"{
            "id": "",
            "start": "2025-09-08T06:30:00Z",
            "end": "2025-09-08T08:30:00Z"
        }"#;
        let result: Result<Event, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
