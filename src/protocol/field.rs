//! Typed conversion of raw field strings.
//!
//! Every strict and tolerant accessor on [`ParsedResponse`] funnels through
//! [`FieldValue`], so the numeric grammar is the same everywhere: Rust's
//! locale-independent `FromStr` implementations.
//!
//! [`ParsedResponse`]: super::ParsedResponse

// ============================================================================
// Imports
// ============================================================================

use std::str::FromStr;

use rust_decimal::Decimal;

// ============================================================================
// Constants
// ============================================================================

/// Case-insensitive spellings accepted as `true`.
const TRUE_ALIASES: [&str; 5] = ["true", "1", "yes", "on", "enabled"];

/// Case-insensitive spellings accepted as `false`.
const FALSE_ALIASES: [&str; 5] = ["false", "0", "no", "off", "disabled"];

// ============================================================================
// FieldValue
// ============================================================================

/// A type that can be read out of a raw response field.
pub trait FieldValue: Sized {
    /// Type name used in format error messages.
    const TYPE_NAME: &'static str;

    /// Converts a trimmed raw value, returning `None` when it is malformed.
    fn parse_field(raw: &str) -> Option<Self>;
}

impl FieldValue for i32 {
    const TYPE_NAME: &'static str = "int";

    #[inline]
    fn parse_field(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }
}

impl FieldValue for i64 {
    const TYPE_NAME: &'static str = "long";

    #[inline]
    fn parse_field(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }
}

impl FieldValue for f32 {
    const TYPE_NAME: &'static str = "float";

    #[inline]
    fn parse_field(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }
}

impl FieldValue for f64 {
    const TYPE_NAME: &'static str = "double";

    #[inline]
    fn parse_field(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }
}

impl FieldValue for Decimal {
    const TYPE_NAME: &'static str = "decimal";

    fn parse_field(raw: &str) -> Option<Self> {
        Decimal::from_str(raw)
            .or_else(|_| Decimal::from_scientific(raw))
            .ok()
    }
}

impl FieldValue for bool {
    const TYPE_NAME: &'static str = "bool";

    fn parse_field(raw: &str) -> Option<Self> {
        if TRUE_ALIASES.iter().any(|alias| raw.eq_ignore_ascii_case(alias)) {
            Some(true)
        } else if FALSE_ALIASES.iter().any(|alias| raw.eq_ignore_ascii_case(alias)) {
            Some(false)
        } else {
            None
        }
    }
}

impl FieldValue for String {
    const TYPE_NAME: &'static str = "string";

    #[inline]
    fn parse_field(raw: &str) -> Option<Self> {
        Some(raw.to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================
