//! Record normalization: raw header triples in, validated stat records out.
//!
//! Every drop has a reason ([`Skip`]) so the pipeline can count what it
//! threw away instead of absorbing failures silently.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use crate::model::{RawHeaders, StatRecord};

/// Inclusive calendar-day window outside which records are discarded.
///
/// A crude outlier filter for misdated mail, nothing more; both bounds are
/// configuration, not policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateBounds {
    pub min: NaiveDate,
    pub max: NaiveDate,
}

impl DateBounds {
    pub fn new(min: NaiveDate, max: NaiveDate) -> Self {
        Self { min, max }
    }

    fn contains(&self, day: NaiveDate) -> bool {
        self.min <= day && day <= self.max
    }
}

/// Why a triple produced no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skip {
    /// One of the three fields was absent; partial records are not kept.
    MissingHeader(&'static str),
    /// The date field defeated the permissive parser.
    BadDate(String),
    /// Parsed fine, but the day falls outside the plausible window.
    OutOfRange(NaiveDate),
}

impl std::fmt::Display for Skip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Skip::MissingHeader(name) => write!(f, "missing {name} header"),
            Skip::BadDate(raw) => write!(f, "unparseable date '{raw}'"),
            Skip::OutOfRange(day) => write!(f, "date {day} outside plausible range"),
        }
    }
}

/// Validate and normalize one raw triple.
///
/// The emitted record has a `<...>`-wrapped id, a day-granularity date in
/// the header's own wall-clock reading (timezones are deliberately not
/// normalized), and the subject's character count.
pub fn normalize(raw: &RawHeaders, bounds: &DateBounds) -> Result<StatRecord, Skip> {
    let id = raw
        .message_id
        .as_deref()
        .ok_or(Skip::MissingHeader("message-id"))?;
    let subject = raw.subject.as_deref().ok_or(Skip::MissingHeader("subject"))?;
    let date_raw = raw.date.as_deref().ok_or(Skip::MissingHeader("date"))?;

    let parsed = parse_date(date_raw).ok_or_else(|| Skip::BadDate(date_raw.to_string()))?;
    let day = parsed.date();
    if !bounds.contains(day) {
        return Err(Skip::OutOfRange(day));
    }

    Ok(StatRecord {
        id: wrap_message_id(id),
        date: day,
        subject_chars: subject.chars().count() as i64,
    })
}

/// Normalize identifier storage to `<mailid@example.com>`.
fn wrap_message_id(id: &str) -> String {
    if id.starts_with('<') {
        id.to_string()
    } else {
        format!("<{id}>")
    }
}

/// Parse an email date string in the common formats real mail uses.
///
/// RFC 2822 first, then ISO 8601, then a table of broken-but-frequent
/// variants with the weekday stripped and named timezones substituted.
/// The result keeps the header's local wall-clock value; offsets are
/// parsed but not applied.
pub fn parse_date(date_str: &str) -> Option<NaiveDateTime> {
    let trimmed = date_str.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_local());
    }

    let no_dow = strip_day_of_week(trimmed);

    let formats = [
        "%d %b %Y %H:%M:%S %z",
        "%d %b %Y %H:%M:%S",
        "%d %b %Y %H:%M %z",
        "%d %b %Y %H:%M",
        "%Y-%m-%d %H:%M:%S %z",
        "%Y-%m-%d %H:%M:%S",
    ];

    let tz_replaced = replace_named_tz(&no_dow);
    for candidate in [no_dow.as_str(), tz_replaced.as_str()] {
        for fmt in &formats {
            if let Ok(dt) = DateTime::parse_from_str(candidate, fmt) {
                return Some(dt.naive_local());
            }
            if let Ok(ndt) = NaiveDateTime::parse_from_str(candidate, fmt) {
                return Some(ndt);
            }
        }
    }

    // Date-only headers ("5 Jan 1975") get midnight.
    for fmt in ["%d %b %Y", "%Y-%m-%d"] {
        if let Ok(day) = NaiveDate::parse_from_str(&no_dow, fmt) {
            return Some(day.and_time(NaiveTime::MIN));
        }
    }

    None
}

/// Strip a leading day-of-week prefix (e.g. "Thu, " or "Thu ").
fn strip_day_of_week(s: &str) -> String {
    let days = [
        "Mon,", "Tue,", "Wed,", "Thu,", "Fri,", "Sat,", "Sun,", "Mon ", "Tue ", "Wed ", "Thu ",
        "Fri ", "Sat ", "Sun ",
    ];
    for day in &days {
        if let Some(rest) = s.strip_prefix(day) {
            return rest.trim().to_string();
        }
    }
    s.to_string()
}

/// Replace a trailing well-known timezone abbreviation with its offset.
fn replace_named_tz(s: &str) -> String {
    let tzs = [
        ("EST", "-0500"),
        ("EDT", "-0400"),
        ("CST", "-0600"),
        ("CDT", "-0500"),
        ("MST", "-0700"),
        ("MDT", "-0600"),
        ("PST", "-0800"),
        ("PDT", "-0700"),
        ("GMT", "+0000"),
        ("UT", "+0000"),
        ("UTC", "+0000"),
        ("CET", "+0100"),
        ("CEST", "+0200"),
        ("JST", "+0900"),
    ];
    let mut result = s.to_string();
    for (name, offset) in &tzs {
        if result.ends_with(name) {
            let pos = result.len() - name.len();
            result.replace_range(pos.., offset);
            return result;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> DateBounds {
        DateBounds::new(
            NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        )
    }

    fn raw(id: &str, subject: &str, date: &str) -> RawHeaders {
        RawHeaders::new(Some(id.into()), Some(subject.into()), Some(date.into()))
    }

    #[test]
    fn test_reference_message_normalizes_exactly() {
        let rec = normalize(
            &raw("abc@x", "Hi", "Mon, 5 Jan 2004 10:00:00 +0000"),
            &bounds(),
        )
        .unwrap();
        assert_eq!(rec.id, "<abc@x>");
        assert_eq!(rec.date_string(), "2004-01-05");
        assert_eq!(rec.subject_chars, 2);
    }

    #[test]
    fn test_any_absent_field_skips() {
        let b = bounds();
        let full = raw("a@x", "s", "Mon, 5 Jan 2004 10:00:00 +0000");

        let mut no_id = full.clone();
        no_id.message_id = None;
        assert_eq!(
            normalize(&no_id, &b),
            Err(Skip::MissingHeader("message-id"))
        );

        let mut no_subject = full.clone();
        no_subject.subject = None;
        assert_eq!(normalize(&no_subject, &b), Err(Skip::MissingHeader("subject")));

        let mut no_date = full;
        no_date.date = None;
        assert_eq!(normalize(&no_date, &b), Err(Skip::MissingHeader("date")));
    }

    #[test]
    fn test_unwrapped_id_gains_brackets_wrapped_id_unchanged() {
        let b = bounds();
        let date = "Mon, 5 Jan 2004 10:00:00 +0000";

        let rec = normalize(&raw("plain@host", "s", date), &b).unwrap();
        assert_eq!(rec.id, "<plain@host>");

        let rec = normalize(&raw("<already@host>", "s", date), &b).unwrap();
        assert_eq!(rec.id, "<already@host>");
    }

    #[test]
    fn test_unparseable_date_skips() {
        assert_eq!(
            normalize(&raw("a@x", "s", "not a date at all"), &bounds()),
            Err(Skip::BadDate("not a date at all".into()))
        );
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let b = bounds();
        let on_min = normalize(&raw("a@x", "s", "Mon, 1 Jan 1990 08:00:00 +0000"), &b);
        assert!(on_min.is_ok());
        assert_eq!(on_min.unwrap().date_string(), "1990-01-01");

        let on_max = normalize(&raw("b@x", "s", "Wed, 1 Jan 2020 23:59:59 +0000"), &b);
        assert!(on_max.is_ok());

        let below = normalize(&raw("c@x", "s", "Sun, 31 Dec 1989 23:59:59 +0000"), &b);
        assert!(matches!(below, Err(Skip::OutOfRange(_))));

        let above = normalize(&raw("d@x", "s", "Thu, 2 Jan 2020 00:00:00 +0000"), &b);
        assert!(matches!(above, Err(Skip::OutOfRange(_))));
    }

    #[test]
    fn test_date_only_header_out_of_range() {
        // "5 Jan 1975" parses (midnight) and then fails the range check.
        let result = normalize(&raw("a@x", "s", "5 Jan 1975"), &bounds());
        assert_eq!(
            result,
            Err(Skip::OutOfRange(
                NaiveDate::from_ymd_opt(1975, 1, 5).unwrap()
            ))
        );
    }

    #[test]
    fn test_subject_length_counts_characters_not_bytes() {
        let b = bounds();
        let date = "Mon, 5 Jan 2004 10:00:00 +0000";

        let rec = normalize(&raw("a@x", "Héllo wörld", date), &b).unwrap();
        assert_eq!(rec.subject_chars, 11);

        let rec = normalize(&raw("b@x", "", date), &b).unwrap();
        assert_eq!(rec.subject_chars, 0);

        // No trimming: surrounding whitespace counts.
        let rec = normalize(&raw("c@x", " padded ", date), &b).unwrap();
        assert_eq!(rec.subject_chars, 8);
    }

    #[test]
    fn test_truncation_keeps_wall_clock_day() {
        // 23:30 local on Jan 5th, offset -0800. UTC would be Jan 6th; the
        // header's own wall clock must win.
        let rec = normalize(
            &raw("a@x", "s", "Mon, 5 Jan 2004 23:30:00 -0800"),
            &bounds(),
        )
        .unwrap();
        assert_eq!(rec.date_string(), "2004-01-05");
    }

    #[test]
    fn test_parse_date_variants() {
        assert!(parse_date("Thu, 04 Jan 2024 10:00:00 +0000").is_some());
        assert!(parse_date("04 Jan 2024 10:00:00 +0000").is_some());
        assert!(parse_date("2024-01-04T10:00:00Z").is_some());
        assert!(parse_date("2024-01-04 10:00:00").is_some());
        assert!(parse_date("Thu, 04 Jan 2024 10:00:00 EST").is_some());
        assert!(parse_date("5 Jan 1975").is_some());
        assert!(parse_date("").is_none());
        assert!(parse_date("yesterday-ish").is_none());
    }

    #[test]
    fn test_parse_date_is_naive_local() {
        let dt = parse_date("Mon, 5 Jan 2004 10:00:00 +0800").unwrap();
        assert_eq!(dt.to_string(), "2004-01-05 10:00:00");
    }
}
