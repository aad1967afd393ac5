//! Input validation utilities

use once_cell::sync::Lazy;
use regex::Regex;

/// Regex for ISO 4217 currency codes
static CURRENCY_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{3}$").unwrap());

/// Regex for phone numbers (digits, spaces, separators, optional leading +)
static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 ().-]{4,24}$").unwrap());

/// Regex for segment identifiers
static SEGMENT_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_-]*$").unwrap());

/// Validate a currency code
pub fn validate_currency(code: &str) -> bool {
    CURRENCY_REGEX.is_match(code)
}

/// Validate a phone number
pub fn validate_phone(phone: &str) -> bool {
    PHONE_REGEX.is_match(phone)
}

/// Validate a market segment identifier
pub fn validate_segment(segment: &str) -> bool {
    !segment.is_empty() && segment.len() <= 50 && SEGMENT_REGEX.is_match(segment)
}

/// Check a budget range for consistency (min must not exceed max)
pub fn validate_budget_range(min: Option<i64>, max: Option<i64>) -> bool {
    match (min, max) {
        (Some(min), Some(max)) => min >= 0 && max >= min,
        (Some(min), None) => min >= 0,
        (None, Some(max)) => max >= 0,
        (None, None) => true,
    }
}
