//! # Validation Module
//!
//! Field-level input validation for TripDesk payloads.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Web UI forms                                                 │
//! │  └── Immediate feedback (required fields, formats)                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Rust (THIS MODULE + pricing/installments)                    │
//! │  ├── Field formats and ranges                                          │
//! │  └── Booking rules (ratio, overpayment, companions)                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                       │
//! │  ├── UNIQUE (emails, trip codes, one commission per booking)           │
//! │  └── Foreign keys                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tripdesk_core::validation::{validate_trip_code, validate_payment_amount};
//!
//! validate_trip_code("ISTANBUL-2026-05").unwrap();
//! validate_payment_amount(510_000).unwrap();
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::{DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};

pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a person, trip or place name.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 200 characters
pub fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates an email address.
///
/// Only a shape check: one `@`, a non-empty local part, and a dot in the
/// domain. Deliverability is the mail system's problem.
pub fn validate_email(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.len() > 254 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 254,
        });
    }

    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::invalid(field, "must be a valid email address"));
    }

    Ok(())
}

/// Same as [`validate_email`] but `None` and blank strings are accepted.
pub fn validate_optional_email(field: &str, value: Option<&str>) -> ValidationResult<()> {
    match value {
        Some(v) if !v.trim().is_empty() => validate_email(field, v),
        _ => Ok(()),
    }
}

/// Validates a trip catalog code.
///
/// ## Rules
/// - 1 to 50 characters
/// - Letters, digits, hyphens and underscores only
///
/// ```rust
/// use tripdesk_core::validation::validate_trip_code;
///
/// assert!(validate_trip_code("CAPPADOCIA-26").is_ok());
/// assert!(validate_trip_code("has space").is_err());
/// ```
pub fn validate_trip_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::required("code"));
    }

    if code.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: 50,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::invalid(
            "code",
            "must contain only letters, numbers, hyphens, and underscores",
        ));
    }

    Ok(())
}

/// Trims a free-text search and caps its length.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Rejects negative amounts and counts (extras, discount, capacity, rates).
pub fn validate_non_negative(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// A payment must move money.
pub fn validate_payment_amount(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }
    Ok(())
}

/// Clamps a requested page size into `1..=MAX_LIST_LIMIT`.
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)
}

// =============================================================================
// Dates
// =============================================================================

/// A trip cannot return before it departs. Same-day trips are fine.
pub fn validate_date_range(departure: NaiveDate, return_date: NaiveDate) -> ValidationResult<()> {
    if return_date < departure {
        return Err(ValidationError::invalid(
            "return_date",
            "must not be before departure_date",
        ));
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Black Sea Coast Tour").is_ok());
        assert!(validate_name("name", "   ").is_err());
        assert!(validate_name("name", &"x".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("email", "ops@agency.example").is_ok());
        assert!(validate_email("email", "").is_err());
        assert!(validate_email("email", "no-at-sign").is_err());
        assert!(validate_email("email", "@agency.example").is_err());
        assert!(validate_email("email", "a@b@c.com").is_err());
        assert!(validate_email("email", "a@localhost").is_err());
        assert!(validate_email("email", "a b@agency.example").is_err());
    }

    #[test]
    fn test_validate_optional_email() {
        assert!(validate_optional_email("email", None).is_ok());
        assert!(validate_optional_email("email", Some("  ")).is_ok());
        assert!(validate_optional_email("email", Some("bad")).is_err());
    }

    #[test]
    fn test_validate_trip_code() {
        assert!(validate_trip_code("ISTANBUL-2026-05").is_ok());
        assert!(validate_trip_code("trip_1").is_ok());
        assert!(validate_trip_code("").is_err());
        assert!(validate_trip_code("has space").is_err());
        assert!(validate_trip_code(&"A".repeat(51)).is_err());
    }

    #[test]
    fn test_numeric_validators() {
        assert!(validate_non_negative("bag_extra", 0).is_ok());
        assert!(validate_non_negative("bag_extra", -1).is_err());
        assert!(validate_payment_amount(1).is_ok());
        assert!(validate_payment_amount(0).is_err());
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), DEFAULT_LIST_LIMIT);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(10_000)), MAX_LIST_LIMIT);
    }

    #[test]
    fn test_validate_date_range() {
        let d = |day| NaiveDate::from_ymd_opt(2026, 6, day).unwrap();
        assert!(validate_date_range(d(1), d(8)).is_ok());
        assert!(validate_date_range(d(1), d(1)).is_ok());
        assert!(validate_date_range(d(8), d(1)).is_err());
    }
}
