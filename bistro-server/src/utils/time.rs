//! 时间工具函数 (餐厅本地时区)
//!
//! Reservation dates and times are stored as local `YYYY-MM-DD` / `HH:MM`
//! strings. Timestamps (`created_at`, `payment_date`) are Unix millis.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use super::{AppError, AppResult};

/// Current restaurant-local time
pub fn now_local(tz: Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(&tz)
}

/// Today in the restaurant timezone
pub fn today(tz: Tz) -> NaiveDate {
    now_local(tz).date_naive()
}

/// Today formatted as `YYYY-MM-DD`
pub fn today_string(tz: Tz) -> String {
    today(tz).format("%Y-%m-%d").to_string()
}

/// Combine validated date + time strings
pub fn parse_local(date: &str, time: &str) -> AppResult<NaiveDateTime> {
    let d = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date format: {date}")))?;
    let t = NaiveTime::parse_from_str(time, "%H:%M")
        .map_err(|_| AppError::validation(format!("Invalid time format: {time}")))?;
    Ok(d.and_time(t))
}

/// Whether a local date/time is already behind the restaurant clock
///
/// DST gap: 不存在的本地时间按 UTC 解释。
pub fn is_in_past(at: NaiveDateTime, tz: Tz) -> bool {
    let millis = at
        .and_local_timezone(tz)
        .latest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| at.and_utc().timestamp_millis());
    millis < Utc::now().timestamp_millis()
}

/// `19:00` → `7:00 PM`. Unparseable input is returned unchanged.
pub fn format_12h(time: &str) -> String {
    NaiveTime::parse_from_str(time, "%H:%M")
        .map(|t| t.format("%-I:%M %p").to_string())
        .unwrap_or_else(|_| time.to_string())
}

/// `2030-06-01` → `Saturday, June 01, 2030`
pub fn format_spoken_date(date: &str) -> String {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| d.format("%A, %B %d, %Y").to_string())
        .unwrap_or_else(|_| date.to_string())
}

/// Unix millis → `MM/DD/YYYY HH:MM AM` in the restaurant timezone
pub fn format_millis_local(millis: i64, tz: Tz) -> String {
    tz.timestamp_millis_opt(millis)
        .single()
        .map(|dt| dt.format("%m/%d/%Y %I:%M %p").to_string())
        .unwrap_or_default()
}

/// ISO local datetime (`YYYY-MM-DDTHH:MM:00`) `hours` after `date time`
pub fn iso_local(date: &str, time: &str, hours: i64) -> AppResult<String> {
    let at = parse_local(date, time)? + Duration::hours(hours);
    Ok(at.format("%Y-%m-%dT%H:%M:00").to_string())
}

/// Local `(date, time)` `minutes` from now, used as the default order target
pub fn ready_at(tz: Tz, minutes: i64) -> (String, String) {
    let at = now_local(tz) + Duration::minutes(minutes);
    (
        at.format("%Y-%m-%d").to_string(),
        at.format("%H:%M").to_string(),
    )
}

/// `1 person`, `4 people`
pub fn people(n: i32) -> String {
    if n == 1 {
        "1 person".to_string()
    } else {
        format!("{n} people")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_12h() {
        assert_eq!(format_12h("19:00"), "7:00 PM");
        assert_eq!(format_12h("09:30"), "9:30 AM");
        assert_eq!(format_12h("00:15"), "12:15 AM");
        assert_eq!(format_12h("noon"), "noon");
    }

    #[test]
    fn test_iso_local_adds_hours() {
        assert_eq!(
            iso_local("2030-01-01", "19:00", 0).unwrap(),
            "2030-01-01T19:00:00"
        );
        assert_eq!(
            iso_local("2030-01-01", "23:00", 2).unwrap(),
            "2030-01-02T01:00:00"
        );
        assert!(iso_local("2030-13-01", "19:00", 2).is_err());
    }

    #[test]
    fn test_is_in_past() {
        let tz = chrono_tz::America::New_York;
        assert!(is_in_past(parse_local("2000-01-01", "12:00").unwrap(), tz));
        assert!(!is_in_past(parse_local("2999-01-01", "12:00").unwrap(), tz));
    }

    #[test]
    fn test_format_millis_local() {
        // 2024-01-15 17:30 UTC = 12:30 PM New York
        let millis = 1_705_339_800_000;
        assert_eq!(
            format_millis_local(millis, chrono_tz::America::New_York),
            "01/15/2024 12:30 PM"
        );
    }

    #[test]
    fn test_people() {
        assert_eq!(people(1), "1 person");
        assert_eq!(people(4), "4 people");
    }

    #[test]
    fn test_spoken_date() {
        assert_eq!(format_spoken_date("2030-06-01"), "Saturday, June 01, 2030");
    }
}
