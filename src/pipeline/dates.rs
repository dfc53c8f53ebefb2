//! Timestamp extraction from header strings and message bodies.
//!
//! Export dates are zone-less English in a handful of client formats, and
//! quoted reply chains bury additional `Date:` / `On <date>, at <time>`
//! headers inside bodies. Everything here is heuristic: unparsable input
//! yields `None`, never an error.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;

/// Narrow no-break space. Some mail clients substitute it for the space
/// before AM/PM when exporting dates.
const NARROW_NBSP: char = '\u{202f}';

/// Datetime formats tried in order by `parse_one`.
const DATETIME_FORMATS: &[&str] = &[
    // Verbose client format: "Thursday, December 18, 2025 at 12:45:49 PM"
    "%A, %B %d, %Y at %I:%M:%S %p",
    "%A, %B %d, %Y at %H:%M:%S",
    "%B %d, %Y at %I:%M:%S %p",
    "%B %d, %Y at %I:%M %p",
    // Reply-header capture: "Dec 18, 2025, at 12:45 PM"
    "%b %d, %Y, at %I:%M %p",
    "%b %d, %Y, %I:%M %p",
    "%Y-%m-%d %H:%M:%S",
];

/// Date-only formats, resolved to midnight. Slash dates are excluded here
/// so two-digit years reach the pivot fallback instead of parsing as year
/// 0025-style values.
const DATE_FORMATS: &[&str] = &["%B %d, %Y", "%b %d, %Y"];

/// Quote-header idioms scanned by `find_all_in_body`. Group 1 is the date
/// fragment handed to `parse_one`.
static QUOTE_HEADER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        // Verbose quoted header: "Date: Thursday, December 18, 2025 at 12:45:49 PM"
        Regex::new(r"(?i)Date:\s+([A-Za-z]+,\s+[A-Za-z]+\s+\d+,\s+\d+\s+at\s+\d+:\d+:\d+\s+[APM]+)")
            .unwrap(),
        // Inline reply header: "On Dec 18, 2025, at 12:45 PM"
        Regex::new(r"(?i)On\s+([A-Za-z]+\s+\d+,\s+\d+,\s+at\s+\d+:\d+\s+[APM]+)").unwrap(),
        // Any remaining "Date:" line, short form included.
        Regex::new(r"(?im)^Date:\s+(.*)$").unwrap(),
    ]
});

/// Parse a single date string into a timestamp.
///
/// Tolerates the narrow no-break-space artifact, then walks the format
/// tables. Returns `None` on anything unparsable.
pub fn parse_one(text: &str) -> Option<DateTime<Utc>> {
    let cleaned = text.replace(NARROW_NBSP, " ");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(cleaned, fmt) {
            return Some(dt.and_utc());
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(cleaned) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(cleaned, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }

    parse_slash_date(cleaned)
}

/// Manual M/D/Y fallback for dates the format tables reject.
///
/// Two-digit years pivot at 50: `<50` resolves to the 2000s, the rest to
/// the 1900s. This is the only path where the pivot applies.
fn parse_slash_date(text: &str) -> Option<DateTime<Utc>> {
    let parts: Vec<&str> = text.split('/').collect();
    if parts.len() != 3 {
        return None;
    }
    let month: u32 = parts[0].trim().parse().ok()?;
    let day: u32 = parts[1].trim().parse().ok()?;
    let mut year: i32 = parts[2].trim().parse().ok()?;
    if year < 100 {
        year += if year < 50 { 2000 } else { 1900 };
    }
    NaiveDate::from_ymd_opt(year, month, day)?
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
}

/// Scan free text for dates buried in quoted reply headers.
///
/// A forwarded or replied body often embeds several quoted headers, so
/// zero, one, or many timestamps can come back. Fragments that fail to
/// parse are silently dropped.
pub fn find_all_in_body(text: &str) -> Vec<DateTime<Utc>> {
    let mut found = Vec::new();
    for pattern in QUOTE_HEADER_PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            if let Some(fragment) = caps.get(1) {
                if let Some(ts) = parse_one(fragment.as_str()) {
                    found.push(ts);
                }
            }
        }
    }
    found
}

/// Latest timestamp buried in the text, or `None` when there is none.
///
/// Explicitly the maximum found, not the first found: quoted chains are
/// not guaranteed to be in document order.
pub fn latest_of(text: &str) -> Option<DateTime<Utc>> {
    find_all_in_body(text).into_iter().max()
}

/// Human-readable date line prepended to the system prompt so generated
/// replies are date-aware.
pub fn current_date_context(now: DateTime<Utc>) -> String {
    format!("Today's date is {}.", now.format("%A, %B %d, %Y"))
}
