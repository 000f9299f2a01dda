//! Change classification and report rendering.
//!
//! Walks the change-set the structural diff produced over the reconciled
//! snapshot pair, renders one line per change, and accumulates the summary
//! counts. Composite field changes are atomized so a moved room shows up as
//! `salles : "A101" → "A102"`, not as "the array changed".

use std::fmt;
use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::{Local, TimeZone};

use hd_core::Event;
use hd_diff::{AtomicChange, Change, FieldChange};

use crate::Config;

/// Aggregate change counts for one comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Events present only in the "after" snapshot.
    pub added: usize,
    /// Events present only in the "before" snapshot.
    pub removed: usize,
    /// Events present in both with differing content.
    pub updated: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} added, {} removed, {} updated",
            self.added, self.removed, self.updated
        )
    }
}

/// Renders the full report for a reconciled snapshot pair.
///
/// `after` must already carry canonical ids (see
/// [`hd_core::Alignment::apply`]). One line is written per change, then the
/// summary line. Times are rendered in the process's local zone.
pub fn render<W: Write>(
    writer: &mut W,
    before: &[Event],
    after: &[Event],
    config: &Config,
) -> Result<Summary> {
    render_in_zone(writer, before, after, &Local, &config.time_format)
}

fn render_in_zone<W, Tz>(
    writer: &mut W,
    before: &[Event],
    after: &[Event],
    zone: &Tz,
    time_format: &str,
) -> Result<Summary>
where
    W: Write,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let old = to_values(before)?;
    let new = to_values(after)?;

    let change_sets = hd_diff::diff_by_key(&old, &new, "id")?;
    // One snapshot pair must yield at most one change-set; anything else
    // means the diff engine and this reporter disagree about the input
    // shape, and a partial report would be misleading.
    if change_sets.len() > 1 {
        bail!(
            "diff engine produced {} change-sets for one snapshot pair",
            change_sets.len()
        );
    }

    let mut summary = Summary::default();
    if let Some(change_set) = change_sets.into_iter().next() {
        for change in &change_set.changes {
            match change {
                Change::Add { key, .. } => {
                    let line = event_line(after, key, zone, time_format);
                    writeln!(writer, "NEW event: {line}")?;
                    summary.added += 1;
                }
                Change::Remove { key, .. } => {
                    let line = event_line(before, key, zone, time_format);
                    writeln!(writer, "REMOVED event: {line}")?;
                    summary.removed += 1;
                }
                Change::Update { key, changes } => {
                    let modifications = render_field_changes(changes);
                    let line = event_line(after, key, zone, time_format);
                    writeln!(writer, "UPDATED: {modifications} (event: {line})")?;
                    summary.updated += 1;
                }
            }
        }
    }

    writeln!(writer, "Changes: {summary}")?;
    Ok(summary)
}

fn to_values(events: &[Event]) -> Result<Vec<serde_json::Value>> {
    events
        .iter()
        .map(|event| serde_json::to_value(event).context("failed to serialize event"))
        .collect()
}

/// Renders the event carrying `key`, or the bare key if the change entry
/// references an event missing from the collection.
fn event_line<Tz>(events: &[Event], key: &str, zone: &Tz, time_format: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    events.iter().find(|e| e.id.as_str() == key).map_or_else(
        || {
            tracing::warn!(id = key, "change entry references an unknown event");
            key.to_string()
        },
        |event| render_event(event, zone, time_format),
    )
}

/// One-line rendering of an event: time range, then the four resource lists.
fn render_event<Tz>(event: &Event, zone: &Tz, time_format: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let start = event.start.with_timezone(zone).format(time_format);
    let end = event.end.with_timezone(zone).format(time_format);
    format!(
        "{start} - {end} - {} - {} - {} - {}",
        resources(event.cours.as_deref()),
        resources(event.salles.as_deref()),
        resources(event.profs.as_deref()),
        resources(event.groupes.as_deref()),
    )
}

fn resources(codes: Option<&[String]>) -> String {
    codes.map_or_else(|| "(missing)".to_string(), |codes| codes.join(" "))
}

/// Renders every atomized modification of one updated event, comma-joined.
///
/// Atoms are labeled with the top-level field they belong to: a change deep
/// in `salles` reads `salles : "A101" → "A102"` regardless of its position
/// in the list.
fn render_field_changes(changes: &[FieldChange]) -> String {
    let mut parts = Vec::new();
    for change in changes {
        let atoms = change.atomize();
        if atoms.is_empty() {
            // A composite descriptor with no leaf atoms is unexpected; skip
            // it without counting rather than abort the whole report.
            tracing::warn!(field = change.field(), "change atomized to nothing");
            continue;
        }
        let field = change.field();
        for atom in atoms {
            parts.push(match atom {
                AtomicChange::Updated { old, new } => format!("{field} : {old} → {new}"),
                AtomicChange::Added { value } => format!("{field} += {value}"),
                AtomicChange::Removed { value } => format!("{field} -= {value}"),
            });
        }
    }
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{TimeZone, Utc};
    use hd_core::types::EventId;
    use hd_core::{normalize, reconcile};
    use insta::assert_snapshot;

    const FORMAT: &str = "%d/%m/%y %H:%M";

    fn event(id: &str, salle: &str) -> Event {
        Event {
            id: EventId::new(id).unwrap(),
            start: Utc.with_ymd_and_hms(2025, 9, 8, 6, 30, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 9, 8, 8, 30, 0).unwrap(),
            cours: Some(vec!["ALG3".into()]),
            salles: Some(vec![salle.into()]),
            profs: Some(vec!["DUPONT".into()]),
            groupes: Some(vec!["B1-Q1".into()]),
        }
    }

    fn render_to_string(before: &[Event], after: &[Event]) -> (String, Summary) {
        let mut out = Vec::new();
        let summary = render_in_zone(&mut out, before, after, &Utc, FORMAT).unwrap();
        (String::from_utf8(out).unwrap(), summary)
    }

    #[test]
    fn identical_snapshots_render_only_the_summary() {
        let before = vec![event("a", "A101")];
        let (text, summary) = render_to_string(&before, &before.clone());
        assert_eq!(summary, Summary::default());
        assert_snapshot!(text.trim_end(), @"Changes: 0 added, 0 removed, 0 updated");
    }

    #[test]
    fn room_change_is_one_update_with_one_atom() {
        let before = vec![event("a", "A101")];
        let after = vec![event("a", "A102")];
        let (text, summary) = render_to_string(&before, &after);
        assert_eq!(
            summary,
            Summary {
                updated: 1,
                ..Summary::default()
            }
        );
        let first = text.lines().next().unwrap();
        assert_snapshot!(first, @r#"UPDATED: salles : "A101" → "A102" (event: 08/09/25 06:30 - 08/09/25 08:30 - ALG3 - A102 - DUPONT - B1-Q1)"#);
    }

    #[test]
    fn additions_and_removals_render_full_events() {
        let before = vec![event("gone", "A101")];
        let after = vec![event("fresh", "B201")];
        // No reconciliation here: contents differ in one field, but this
        // test feeds the reporter directly with unaligned ids.
        let (text, summary) = render_to_string(&before, &after);
        assert_eq!(
            summary,
            Summary {
                added: 1,
                removed: 1,
                updated: 0,
            }
        );
        let lines: Vec<&str> = text.lines().collect();
        assert_snapshot!(lines[0], @"REMOVED event: 08/09/25 06:30 - 08/09/25 08:30 - ALG3 - A101 - DUPONT - B1-Q1");
        assert_snapshot!(lines[1], @"NEW event: 08/09/25 06:30 - 08/09/25 08:30 - ALG3 - B201 - DUPONT - B1-Q1");
        assert_snapshot!(lines[2], @"Changes: 1 added, 1 removed, 0 updated");
    }

    #[test]
    fn absent_resource_list_renders_placeholder() {
        let mut before = vec![event("a", "A101")];
        before[0].profs = None;
        let after = vec![Event {
            id: EventId::new("a").unwrap(),
            ..before[0].clone()
        }];
        let mut changed = after;
        changed[0].salles = Some(vec!["A102".into()]);
        let (text, _) = render_to_string(&before, &changed);
        assert!(text.contains("- (missing) -"), "got: {text}");
    }

    #[test]
    fn group_list_growth_renders_an_added_atom() {
        let before = vec![event("a", "A101")];
        let mut after = vec![event("a", "A101")];
        after[0].groupes = Some(vec!["B1-Q1".into(), "B1-Q2".into()]);
        let (text, summary) = render_to_string(&before, &after);
        assert_eq!(summary.updated, 1);
        let first = text.lines().next().unwrap();
        assert_snapshot!(first, @r#"UPDATED: groupes += "B1-Q2" (event: 08/09/25 06:30 - 08/09/25 08:30 - ALG3 - A101 - DUPONT - B1-Q1 B1-Q2)"#);
    }

    // Full pipeline checks: normalize → reconcile → apply → render.

    fn raw_json(events: &serde_json::Value) -> Vec<hd_core::RawEvent> {
        serde_json::from_value(events.clone()).unwrap()
    }

    #[test]
    fn regenerated_id_with_room_change_reports_one_update() {
        let before_raw = raw_json(&serde_json::json!([{
            "id": "export-1",
            "start": "2025-09-08T06:30:00Z",
            "end": "2025-09-08T08:30:00Z",
            "cours": [{"code": "ALG3"}],
            "salles": [{"code": "A101"}],
        }]));
        let after_raw = raw_json(&serde_json::json!([{
            "id": "export-2",
            "start": "2025-09-08T06:30:00Z",
            "end": "2025-09-08T08:30:00Z",
            "cours": [{"code": "ALG3"}],
            "salles": [{"code": "A102"}],
        }]));

        let before = normalize(before_raw).unwrap();
        let after = normalize(after_raw).unwrap();
        let alignment = reconcile(&before, &after).unwrap();
        let after = alignment.apply(after);

        let (text, summary) = render_to_string(&before, &after);
        assert_eq!(
            summary,
            Summary {
                updated: 1,
                ..Summary::default()
            }
        );
        assert!(
            text.starts_with("UPDATED: salles : \"A101\" → \"A102\""),
            "got: {text}"
        );
    }

    #[test]
    fn regenerated_id_with_identical_content_reports_nothing() {
        let before = vec![event("export-1", "A101")];
        let after = vec![event("export-2", "A101")];

        let alignment = reconcile(&before, &after).unwrap();
        let after = alignment.apply(after);

        let (text, summary) = render_to_string(&before, &after);
        assert_eq!(summary, Summary::default());
        assert_snapshot!(text.trim_end(), @"Changes: 0 added, 0 removed, 0 updated");
    }

    #[test]
    fn two_field_change_reports_removal_plus_addition() {
        let before = vec![event("export-1", "A101")];
        let mut moved = event("export-2", "A102");
        moved.profs = Some(vec!["MARTIN".into()]);
        let after = vec![moved];

        let alignment = reconcile(&before, &after).unwrap();
        assert!(alignment.is_empty());
        let after = alignment.apply(after);

        let (_, summary) = render_to_string(&before, &after);
        assert_eq!(
            summary,
            Summary {
                added: 1,
                removed: 1,
                updated: 0,
            }
        );
    }
}
