//! 电话号码工具: E.164 规范化与口语数字提取
//!
//! Voice transcripts arrive as `"five five five one two three ..."`, web forms
//! as `(555) 123-4567`. Both end up as `+15551234567`.

use std::sync::LazyLock;

use regex::Regex;

use super::{AppError, AppResult};

const DIGIT_WORDS: [(&str, &str); 11] = [
    ("zero", "0"),
    ("oh", "0"),
    ("one", "1"),
    ("two", "2"),
    ("three", "3"),
    ("four", "4"),
    ("five", "5"),
    ("six", "6"),
    ("seven", "7"),
    ("eight", "8"),
    ("nine", "9"),
];

static DIGIT_WORD_RE: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    DIGIT_WORDS
        .iter()
        .filter_map(|(word, digit)| {
            Regex::new(&format!(r"(?i)\b{word}\b"))
                .ok()
                .map(|re| (re, *digit))
        })
        .collect()
});

/// Replace spoken digit words with digits (word boundaries only, so
/// "someone" keeps its "one").
pub fn words_to_digits(text: &str) -> String {
    DIGIT_WORD_RE
        .iter()
        .fold(text.to_string(), |acc, (re, digit)| {
            re.replace_all(&acc, *digit).into_owned()
        })
}

/// All ASCII digits in `text`, after spoken-word conversion
pub fn extract_digits(text: &str) -> String {
    words_to_digits(text)
        .chars()
        .filter(char::is_ascii_digit)
        .collect()
}

/// First `len` digits of a spoken or typed reference number
/// (`"one two three four five six"` → `"123456"`)
///
/// Returns `None` when fewer than `len` digits were said.
pub fn extract_number(text: &str, len: usize) -> Option<String> {
    let digits = extract_digits(text);
    (digits.len() >= len).then(|| digits[..len].to_string())
}

/// Phone number spoken in free text: at least 7 digits, first 10 kept
pub fn extract_spoken_phone(text: &str) -> Option<String> {
    let digits = extract_digits(text);
    if digits.len() < 7 {
        return None;
    }
    let head = &digits[..digits.len().min(10)];
    normalize_phone(Some(head), None)
}

/// Normalize to E.164
///
/// | Input | Result |
/// |-------|--------|
/// | `+1` + 10 digits | kept |
/// | 10 digits | `+1XXXXXXXXXX` |
/// | 11 digits starting with 1 | `+1XXXXXXXXXX` |
/// | 7 digits | `+1555XXXXXXX` |
/// | `+` with 8..=15 digits | kept (digits only) |
///
/// Empty input falls back to `caller_id`. Anything else is `None`.
pub fn normalize_phone(input: Option<&str>, caller_id: Option<&str>) -> Option<String> {
    let raw = input
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| caller_id.map(str::trim).filter(|s| !s.is_empty()))?;

    let digits = extract_digits(raw);

    if raw.starts_with('+') {
        if raw.starts_with("+1") && digits.len() == 11 {
            return Some(format!("+{digits}"));
        }
        if (8..=15).contains(&digits.len()) {
            return Some(format!("+{digits}"));
        }
        return None;
    }

    match digits.len() {
        10 => Some(format!("+1{digits}")),
        11 if digits.starts_with('1') => Some(format!("+{digits}")),
        7 => Some(format!("+1555{digits}")),
        _ => None,
    }
}

/// Normalize or fail with a validation error naming the field
pub fn require_phone(input: &str, field: &str) -> AppResult<String> {
    normalize_phone(Some(input), None).ok_or_else(|| {
        AppError::validation(format!("Invalid phone number: {input}")).with_detail("field", field)
    })
}

/// Last four digits, for log lines and spoken confirmations
pub fn mask_phone(phone: &str) -> String {
    let digits: Vec<char> = phone.chars().filter(char::is_ascii_digit).collect();
    let tail: String = digits[digits.len().saturating_sub(4)..].iter().collect();
    format!("***{tail}")
}
