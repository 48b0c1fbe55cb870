//! 口语日期/时间规范化
//!
//! Callers say "tomorrow", "June 5th" or "7 pm"; storage wants
//! `YYYY-MM-DD` and `HH:MM`.

use std::sync::LazyLock;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%B %d, %Y",
    "%B %d %Y",
    "%b %d, %Y",
    "%b %d %Y",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%Y/%m/%d",
];

const TIME_FORMATS: &[&str] = &["%H:%M", "%I:%M %p", "%H:%M:%S", "%I %p", "%I:%M%p", "%I%p"];

static ORDINAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,2})(st|nd|rd|th)\b").expect("ordinal pattern"));

/// Parse a date as spoken or typed; `today` anchors relative words
///
/// A month and day without a year that has already passed this year rolls
/// over to next year.
pub fn parse_flexible_date(text: &str, today: NaiveDate) -> Option<String> {
    let cleaned = clean(text);
    match cleaned.to_ascii_lowercase().as_str() {
        "" => return None,
        "today" | "tonight" => return Some(fmt_date(today)),
        "tomorrow" | "tomorrow night" => return Some(fmt_date(today + Duration::days(1))),
        _ => {}
    }

    if let Some((date, _)) = split_iso(&cleaned) {
        return Some(date);
    }

    for format in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(&cleaned, format) {
            return Some(fmt_date(d));
        }
    }

    // "June 5" / "Jun 5"
    for format in ["%B %d %Y", "%b %d %Y"] {
        let with_year = format!("{cleaned} {}", today.year());
        if let Ok(d) = NaiveDate::parse_from_str(&with_year, format) {
            let d = if d < today {
                d.with_year(today.year() + 1).unwrap_or(d)
            } else {
                d
            };
            return Some(fmt_date(d));
        }
    }
    None
}

/// Parse a time of day into `HH:MM`
pub fn parse_flexible_time(text: &str) -> Option<String> {
    let cleaned = clean(text)
        .to_ascii_uppercase()
        .replace("A.M.", "AM")
        .replace("P.M.", "PM");
    if cleaned.is_empty() {
        return None;
    }
    if let Some((_, time)) = split_iso(&cleaned) {
        return Some(time);
    }
    for format in TIME_FORMATS {
        if let Ok(t) = NaiveTime::parse_from_str(&cleaned, format) {
            return Some(t.format("%H:%M").to_string());
        }
    }
    // chrono 需要分钟才能解析 "7PM"
    let compact = cleaned.replace(' ', "");
    for suffix in ["AM", "PM"] {
        if let Some(hour) = compact.strip_suffix(suffix) {
            let candidate = format!("{hour}:00 {suffix}");
            if let Ok(t) = NaiveTime::parse_from_str(&candidate, "%I:%M %p") {
                return Some(t.format("%H:%M").to_string());
            }
        }
    }
    None
}

/// `2030-06-01T19:00[:00]` → (`2030-06-01`, `19:00`)
pub fn split_iso(text: &str) -> Option<(String, String)> {
    if !text.contains('T') {
        return None;
    }
    let trimmed = text.trim().trim_end_matches('Z');
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some((
                fmt_date(dt.date()),
                dt.time().format("%H:%M").to_string(),
            ));
        }
    }
    None
}

fn clean(text: &str) -> String {
    let trimmed = text.trim();
    ORDINAL
        .replace_all(trimmed, "$1")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn fmt_date(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}
