//! MM:SS formatting, validation and lenient parsing

use crate::error::ValidationError;

pub const MAX_MINUTES: i64 = 59;
pub const MAX_SECONDS: i64 = 59;

/// Format seconds as a zero-padded `MM:SS` string, flooring both fields
pub fn format_time(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Check a minutes/seconds pair against the timer input rules and return the
/// total duration in seconds.
pub fn validate_parts(minutes: i64, seconds: i64) -> Result<u32, ValidationError> {
    if !(0..=MAX_MINUTES).contains(&minutes) {
        return Err(ValidationError::MinutesOutOfRange(minutes));
    }
    if !(0..=MAX_SECONDS).contains(&seconds) {
        return Err(ValidationError::SecondsOutOfRange(seconds));
    }
    let total = minutes * 60 + seconds;
    if total == 0 {
        return Err(ValidationError::ZeroDuration);
    }
    // Bounded by 59 * 60 + 59.
    Ok(total as u32)
}

/// Validate a strict `MM:SS` string: two digits, a colon, two digits, both
/// fields in range and a non-zero total. Surrounding whitespace is ignored.
pub fn parse_mmss(input: &str) -> Result<u32, ValidationError> {
    let malformed = || ValidationError::MalformedTime(input.to_string());

    let (mm, ss) = input.trim().split_once(':').ok_or_else(malformed)?;
    let two_digits = |s: &str| s.len() == 2 && s.bytes().all(|b| b.is_ascii_digit());
    if !two_digits(mm) || !two_digits(ss) {
        return Err(malformed());
    }

    let minutes: i64 = mm.parse().map_err(|_| malformed())?;
    let seconds: i64 = ss.parse().map_err(|_| malformed())?;
    validate_parts(minutes, seconds).map_err(|_| malformed())
}

/// Parse the leading run of ASCII digits, treating anything non-numeric as 0
pub fn parse_lenient(input: &str) -> u32 {
    let digits: String = input
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

/// Keep only digits and cap the result at two characters
pub fn sanitize_field(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).take(2).collect()
}
