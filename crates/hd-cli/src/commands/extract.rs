//! Implementation of the `hd extract` command.
//!
//! Parses a directory of .ics exports into the raw event array `hd diff`
//! consumes. The schedule tool exports one calendar per course, so the
//! course code and display name are derived from the file name
//! ("ALG3 Algorithmique 1.ics" → code "ALG3"); the calendar body itself
//! does not carry them in structured form. Room, instructor, and group
//! lists live in the free-text description and are left for the upstream
//! parser; extraction passes the description through verbatim.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Duration, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use hd_core::types::EventId;
use hd_core::{RawEvent, Resource};

/// Runs the extract command: parse every `.ics` file under `dir` and print
/// the combined event array as JSON.
pub fn run<W: Write>(writer: &mut W, dir: &Path) -> Result<()> {
    let mut events = Vec::new();
    for path in ics_files(dir)? {
        let parsed = parse_course_file(&path)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        events.extend(parsed);
    }

    // Holiday placeholders appear in every course calendar; drop them.
    events.retain(|event: &RawEvent| !is_holiday(event));

    tracing::debug!(count = events.len(), "events extracted");
    serde_json::to_writer(&mut *writer, &events).context("failed to serialize events")?;
    writeln!(writer)?;
    Ok(())
}

fn is_holiday(event: &RawEvent) -> bool {
    let id = event.id.as_str();
    id.starts_with("Ferie") || id.starts_with("Férié")
}

/// Lists the `.ics` files in `dir`, sorted for deterministic output.
fn ics_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read directory {}", dir.display()))?;
    let mut files: Vec<PathBuf> = entries
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("failed to list {}", dir.display()))?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("ics"))
        })
        .collect();
    if files.is_empty() {
        bail!("no .ics files found in dir: {}", dir.display());
    }
    files.sort();
    Ok(files)
}

fn parse_course_file(path: &Path) -> Result<Vec<RawEvent>> {
    let content = fs::read_to_string(path)?;
    let course = course_from_filename(path);
    parse_calendar(&content, &course)
}

/// Splits "ALG3 Algorithmique 1.ics" into the course code and a display
/// name. A file name without a space is all code, and the name repeats it.
fn course_from_filename(path: &Path) -> Resource {
    let stem = path
        .file_stem()
        .map_or_else(String::new, |s| s.to_string_lossy().into_owned());
    match stem.split_once(' ') {
        Some((code, name)) => Resource {
            code: code.to_string(),
            name: Some(format!("{code} - {name}")),
        },
        None => Resource {
            code: stem.clone(),
            name: Some(stem),
        },
    }
}

/// One VEVENT's properties, collected during the scan.
#[derive(Default)]
struct VeventProps {
    uid: Option<String>,
    start: Option<String>,
    end: Option<String>,
    description: Option<String>,
    location: Option<String>,
}

impl VeventProps {
    fn into_event(self, course: &Resource) -> Result<RawEvent> {
        let uid = self.uid.context("VEVENT without UID")?;
        let start = self.start.context("VEVENT without DTSTART")?;
        let end = self.end.context("VEVENT without DTEND")?;
        Ok(RawEvent {
            id: EventId::new(uid)?,
            start: parse_ics_timestamp(&start)?,
            end: parse_ics_timestamp(&end)?,
            description: self.description,
            location: self.location,
            cours: Some(vec![course.clone()]),
            salles: None,
            profs: None,
            groupes: None,
        })
    }
}

/// Parses the VEVENT blocks out of one calendar body.
fn parse_calendar(content: &str, course: &Resource) -> Result<Vec<RawEvent>> {
    let mut events = Vec::new();
    let mut current: Option<VeventProps> = None;

    for line in unfold(content) {
        if line == "BEGIN:VEVENT" {
            current = Some(VeventProps::default());
            continue;
        }
        if line == "END:VEVENT" {
            if let Some(props) = current.take() {
                events.push(props.into_event(course)?);
            }
            continue;
        }
        let Some(props) = current.as_mut() else {
            continue;
        };
        let Some((name, value)) = split_property(&line) else {
            continue;
        };
        match name {
            "UID" => props.uid = Some(value.to_string()),
            "DTSTART" => props.start = Some(value.to_string()),
            "DTEND" => props.end = Some(value.to_string()),
            "DESCRIPTION" => props.description = Some(unescape(value)),
            "LOCATION" => props.location = Some(unescape(value)),
            _ => {}
        }
    }

    Ok(events)
}

/// RFC 5545 line unfolding: a line starting with a space or tab continues
/// the previous one.
fn unfold(content: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in content.lines() {
        if let Some(rest) = raw.strip_prefix(' ').or_else(|| raw.strip_prefix('\t')) {
            if let Some(last) = lines.last_mut() {
                last.push_str(rest);
                continue;
            }
        }
        lines.push(raw.to_string());
    }
    lines
}

/// Splits a content line into property name and value, dropping parameters
/// ("DTSTART;TZID=Europe/Brussels:20250908T083000" → ("DTSTART", …)).
fn split_property(line: &str) -> Option<(&str, &str)> {
    let (head, value) = line.split_once(':')?;
    let name = head.split(';').next().unwrap_or(head);
    Some((name, value))
}

/// Undoes RFC 5545 text escaping.
fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => out.push('\n'),
            Some(escaped) => out.push(escaped),
            None => out.push('\\'),
        }
    }
    out
}

/// Parses the timestamp forms the exporter produces: UTC ("…Z"), floating
/// local time, and all-day dates.
fn parse_ics_timestamp(value: &str) -> Result<DateTime<Utc>> {
    if let Some(utc) = value.strip_suffix('Z') {
        let naive = NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S")
            .with_context(|| format!("invalid UTC timestamp: {value}"))?;
        return Ok(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S") {
        return Ok(local_to_utc(naive));
    }
    let date = NaiveDate::parse_from_str(value, "%Y%m%d")
        .with_context(|| format!("invalid timestamp: {value}"))?;
    Ok(local_to_utc(date.and_time(NaiveTime::MIN)))
}

/// Resolves a floating local time to UTC. DST ambiguity picks the earlier
/// time; a nonexistent time (spring-forward gap) slides forward one hour.
fn local_to_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        LocalResult::None => match Local.from_local_datetime(&(naive + Duration::hours(1))) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
            LocalResult::None => Utc.from_utc_datetime(&naive),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
BEGIN:VEVENT\r\n\
UID:ADE60b9f4@ade.example\r\n\
DTSTART:20250908T063000Z\r\n\
DTEND:20250908T083000Z\r\n\
DESCRIPTION:ALG3\\nA101\\nDUPONT\r\n\
LOCATION:A101\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:Ferie2025-12-25\r\n\
DTSTART:20251225\r\n\
DTEND:20251226\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

    #[test]
    fn parses_vevent_blocks() {
        let course = Resource {
            code: "ALG3".into(),
            name: Some("ALG3 - Algorithmique 1".into()),
        };
        let events = parse_calendar(SAMPLE, &course).unwrap();
        assert_eq!(events.len(), 2);

        let event = &events[0];
        assert_eq!(event.id.as_str(), "ADE60b9f4@ade.example");
        assert_eq!(
            event.start,
            Utc.with_ymd_and_hms(2025, 9, 8, 6, 30, 0).unwrap()
        );
        assert_eq!(event.description.as_deref(), Some("ALG3\nA101\nDUPONT"));
        assert_eq!(event.location.as_deref(), Some("A101"));
        assert_eq!(event.cours.as_deref(), Some(&[course][..]));
        assert_eq!(event.salles, None);
    }

    #[test]
    fn holiday_uids_are_flagged() {
        let course = Resource::new("ALG3");
        let events = parse_calendar(SAMPLE, &course).unwrap();
        assert!(!is_holiday(&events[0]));
        assert!(is_holiday(&events[1]));
    }

    #[test]
    fn unfolds_continuation_lines() {
        let folded = "DESCRIPTION:first part\r\n  and the rest\r\nUID:x\r\n";
        let lines = unfold(folded);
        assert_eq!(lines, ["DESCRIPTION:first part and the rest", "UID:x"]);
    }

    #[test]
    fn property_parameters_are_dropped() {
        let (name, value) =
            split_property("DTSTART;TZID=Europe/Brussels:20250908T083000").unwrap();
        assert_eq!(name, "DTSTART");
        assert_eq!(value, "20250908T083000");
    }

    #[test]
    fn course_name_comes_from_the_filename() {
        let course = course_from_filename(Path::new("/tmp/ALG3 Algorithmique 1.ics"));
        assert_eq!(course.code, "ALG3");
        assert_eq!(course.name.as_deref(), Some("ALG3 - Algorithmique 1"));

        let bare = course_from_filename(Path::new("/tmp/ALG3.ics"));
        assert_eq!(bare.code, "ALG3");
        assert_eq!(bare.name.as_deref(), Some("ALG3"));
    }

    #[test]
    fn utc_timestamps_parse_exactly() {
        assert_eq!(
            parse_ics_timestamp("20250908T063000Z").unwrap(),
            Utc.with_ymd_and_hms(2025, 9, 8, 6, 30, 0).unwrap()
        );
        assert!(parse_ics_timestamp("not-a-date").is_err());
    }

    #[test]
    fn missing_uid_is_an_error() {
        let body = "BEGIN:VEVENT\r\nDTSTART:20250908T063000Z\r\nDTEND:20250908T083000Z\r\nEND:VEVENT\r\n";
        let err = parse_calendar(body, &Resource::new("X")).unwrap_err();
        assert!(err.to_string().contains("UID"));
    }

    #[test]
    fn empty_directory_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let err = ics_files(temp.path()).unwrap_err();
        assert!(err.to_string().contains("no .ics files"));
    }
}
