//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! SQLite TEXT has no built-in length enforcement.

use chrono::{NaiveDate, NaiveTime};

use crate::utils::{AppError, AppResult, ErrorCode};

// ── Text length limits ──────────────────────────────────────────────

/// Customer names, menu item names, party member names
pub const MAX_NAME_LEN: usize = 200;

/// Notes, special requests, special instructions
pub const MAX_NOTE_LEN: usize = 500;

/// Short identifiers: phone, category, reservation number
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Delivery addresses
pub const MAX_ADDRESS_LEN: usize = 500;

// ── Domain limits ───────────────────────────────────────────────────

pub const MIN_PARTY_SIZE: i32 = 1;
pub const MAX_PARTY_SIZE: i32 = 20;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty"))
            .with_detail("field", field));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        ))
        .with_detail("field", field));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> AppResult<()> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        ))
        .with_detail("field", field));
    }
    Ok(())
}

pub fn validate_party_size(party_size: i32) -> AppResult<()> {
    if !(MIN_PARTY_SIZE..=MAX_PARTY_SIZE).contains(&party_size) {
        return Err(AppError::with_message(
            ErrorCode::PartySizeInvalid,
            format!("Party size must be between {MIN_PARTY_SIZE} and {MAX_PARTY_SIZE}, got {party_size}"),
        )
        .with_detail("field", "party_size"));
    }
    Ok(())
}

/// Strict `YYYY-MM-DD`
pub fn validate_date(date: &str) -> AppResult<NaiveDate> {
    if date.len() != 10 {
        return Err(invalid_date(date));
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| invalid_date(date))
}

/// Strict 24h `HH:MM`
pub fn validate_time(time: &str) -> AppResult<NaiveTime> {
    if time.len() != 5 {
        return Err(invalid_time(time));
    }
    NaiveTime::parse_from_str(time, "%H:%M").map_err(|_| invalid_time(time))
}

fn invalid_date(date: &str) -> AppError {
    AppError::with_message(
        ErrorCode::InvalidFormat,
        format!("Invalid date '{date}', expected YYYY-MM-DD"),
    )
    .with_detail("field", "date")
}

fn invalid_time(time: &str) -> AppError {
    AppError::with_message(
        ErrorCode::InvalidFormat,
        format!("Invalid time '{time}', expected HH:MM (24-hour)"),
    )
    .with_detail("field", "time")
}
