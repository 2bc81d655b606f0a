//! Parsed response with typed accessors.
//!
//! A [`ParsedResponse`] is immutable once built. Keys are matched
//! case-insensitively and each key is either a scalar or an array; a later
//! assignment during parsing replaces an earlier one, even across roles.
//!
//! # Accessor Families
//!
//! | Family | Missing key | Malformed value |
//! |--------|-------------|-----------------|
//! | `get_*` | [`Error::KeyNotFound`] | [`Error::Format`] |
//! | `get_*_array` | [`Error::KeyNotFound`] | [`Error::Format`] with index |
//! | `try_get_*` | `None` | `None` |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};

use super::field::FieldValue;
use super::parser::{Separators, parse_response};

// ============================================================================
// Field
// ============================================================================

/// Raw value stored under a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Field {
    /// Single value.
    Scalar(String),
    /// Ordered elements of a bracketed literal.
    Array(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    /// Key as first written by the remote.
    key: String,
    field: Field,
}

// ============================================================================
// ParsedResponse
// ============================================================================

/// Typed, queryable view over one response string.
///
/// # Example
///
/// ```
/// use vision_link::ParsedResponse;
///
/// let response = ParsedResponse::parse("Count:3,Boxes:[10,20,30]").unwrap();
/// assert_eq!(response.get_int("count").unwrap(), 3);
/// assert_eq!(response.get_int_array("BOXES").unwrap(), vec![10, 20, 30]);
/// assert_eq!(response.to_string(), "Count:3,Boxes:[10,20,30]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    raw: String,
    /// Entries by case-folded key.
    entries: FxHashMap<String, Entry>,
    /// Case-folded keys in first-seen order.
    order: Vec<String>,
}

// ============================================================================
// ParsedResponse - Construction
// ============================================================================

impl ParsedResponse {
    /// Parses a response using the default `,` and `:` separators.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Remote`] if the response contains the error sentinel.
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        Self::parse_with(raw, &Separators::default())
    }

    /// Parses a response using custom separators.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Remote`] if the response contains the error sentinel.
    pub fn parse_with(raw: impl Into<String>, separators: &Separators) -> Result<Self> {
        let raw = raw.into();
        parse_response(&raw, separators)
    }

    pub(crate) fn empty(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            entries: FxHashMap::default(),
            order: Vec::new(),
        }
    }

    /// Stores a field, replacing any earlier value for the same key.
    pub(crate) fn insert(&mut self, key: &str, field: Field) {
        let folded = fold_key(key);
        if let Some(entry) = self.entries.get_mut(&folded) {
            entry.field = field;
            return;
        }

        self.order.push(folded.clone());
        self.entries.insert(
            folded,
            Entry {
                key: key.to_string(),
                field,
            },
        );
    }

    fn scalar(&self, key: &str) -> Option<&str> {
        match self.entries.get(&fold_key(key)) {
            Some(Entry {
                field: Field::Scalar(value),
                ..
            }) => Some(value.as_str()),
            _ => None,
        }
    }

    fn array(&self, key: &str) -> Option<&[String]> {
        match self.entries.get(&fold_key(key)) {
            Some(Entry {
                field: Field::Array(items),
                ..
            }) => Some(items.as_slice()),
            _ => None,
        }
    }

    fn entries_in_order(&self) -> impl Iterator<Item = &Entry> {
        self.order.iter().filter_map(|key| self.entries.get(key))
    }
}

impl FromStr for ParsedResponse {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        Self::parse(raw)
    }
}

impl fmt::Display for ParsedResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn fold_key(key: &str) -> String {
    key.to_lowercase()
}

// ============================================================================
// ParsedResponse - Generic Accessors
// ============================================================================

impl ParsedResponse {
    /// Reads a scalar as `T`.
    ///
    /// # Errors
    ///
    /// - [`Error::KeyNotFound`] if `key` is not a scalar
    /// - [`Error::Format`] if the value does not parse as `T`
    pub fn get<T: FieldValue>(&self, key: &str) -> Result<T> {
        let raw = self.scalar(key).ok_or_else(|| Error::key_not_found(key))?;
        T::parse_field(raw).ok_or_else(|| Error::format(key, raw, T::TYPE_NAME))
    }

    /// Reads a scalar as `T`, collapsing every failure into `None`.
    #[must_use]
    pub fn try_get<T: FieldValue>(&self, key: &str) -> Option<T> {
        self.scalar(key).and_then(T::parse_field)
    }

    /// Reads an array with every element converted to `T`.
    ///
    /// # Errors
    ///
    /// - [`Error::KeyNotFound`] if `key` is not an array
    /// - [`Error::Format`] naming the first element that does not parse
    pub fn get_array<T: FieldValue>(&self, key: &str) -> Result<Vec<T>> {
        let items = self.array(key).ok_or_else(|| Error::key_not_found(key))?;
        items
            .iter()
            .enumerate()
            .map(|(index, raw)| {
                T::parse_field(raw)
                    .ok_or_else(|| Error::element_format(key, index, raw, T::TYPE_NAME))
            })
            .collect()
    }

    /// Reads an array as `Vec<T>`, collapsing every failure into `None`.
    #[must_use]
    pub fn try_get_array<T: FieldValue>(&self, key: &str) -> Option<Vec<T>> {
        self.array(key)?
            .iter()
            .map(String::as_str)
            .map(T::parse_field)
            .collect()
    }
}

// ============================================================================
// ParsedResponse - Scalar Accessors
// ============================================================================

impl ParsedResponse {
    /// Reads a scalar as `i32`.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] or [`Error::Format`].
    pub fn get_int(&self, key: &str) -> Result<i32> {
        self.get(key)
    }

    /// Reads a scalar as `i64`.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] or [`Error::Format`].
    pub fn get_long(&self, key: &str) -> Result<i64> {
        self.get(key)
    }

    /// Reads a scalar as `f32`.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] or [`Error::Format`].
    pub fn get_float(&self, key: &str) -> Result<f32> {
        self.get(key)
    }

    /// Reads a scalar as `f64`.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] or [`Error::Format`].
    pub fn get_double(&self, key: &str) -> Result<f64> {
        self.get(key)
    }

    /// Reads a scalar as a [`Decimal`].
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] or [`Error::Format`].
    pub fn get_decimal(&self, key: &str) -> Result<Decimal> {
        self.get(key)
    }

    /// Reads a scalar exactly as received (trimmed).
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] if `key` is not a scalar.
    pub fn get_string(&self, key: &str) -> Result<&str> {
        self.scalar(key).ok_or_else(|| Error::key_not_found(key))
    }

    /// Reads a scalar as a boolean.
    ///
    /// Accepts `true/1/yes/on/enabled` and `false/0/no/off/disabled` in any
    /// case.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] or [`Error::Format`].
    pub fn get_bool(&self, key: &str) -> Result<bool> {
        self.get(key)
    }

    /// Tolerant form of [`get_int`](Self::get_int).
    #[must_use]
    pub fn try_get_int(&self, key: &str) -> Option<i32> {
        self.try_get(key)
    }

    /// Tolerant form of [`get_long`](Self::get_long).
    #[must_use]
    pub fn try_get_long(&self, key: &str) -> Option<i64> {
        self.try_get(key)
    }

    /// Tolerant form of [`get_float`](Self::get_float).
    #[must_use]
    pub fn try_get_float(&self, key: &str) -> Option<f32> {
        self.try_get(key)
    }

    /// Tolerant form of [`get_double`](Self::get_double).
    #[must_use]
    pub fn try_get_double(&self, key: &str) -> Option<f64> {
        self.try_get(key)
    }

    /// Tolerant form of [`get_decimal`](Self::get_decimal).
    #[must_use]
    pub fn try_get_decimal(&self, key: &str) -> Option<Decimal> {
        self.try_get(key)
    }

    /// Tolerant form of [`get_string`](Self::get_string).
    #[must_use]
    pub fn try_get_string(&self, key: &str) -> Option<&str> {
        self.scalar(key)
    }

    /// Tolerant form of [`get_bool`](Self::get_bool).
    #[must_use]
    pub fn try_get_bool(&self, key: &str) -> Option<bool> {
        self.try_get(key)
    }
}

// ============================================================================
// ParsedResponse - Array Accessors
// ============================================================================

impl ParsedResponse {
    /// Reads an array of `i32`.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] or [`Error::Format`] with the element index.
    pub fn get_int_array(&self, key: &str) -> Result<Vec<i32>> {
        self.get_array(key)
    }

    /// Reads an array of `i64`.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] or [`Error::Format`] with the element index.
    pub fn get_long_array(&self, key: &str) -> Result<Vec<i64>> {
        self.get_array(key)
    }

    /// Reads an array of `f32`.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] or [`Error::Format`] with the element index.
    pub fn get_float_array(&self, key: &str) -> Result<Vec<f32>> {
        self.get_array(key)
    }

    /// Reads an array of `f64`.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] or [`Error::Format`] with the element index.
    pub fn get_double_array(&self, key: &str) -> Result<Vec<f64>> {
        self.get_array(key)
    }

    /// Reads an array of [`Decimal`].
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] or [`Error::Format`] with the element index.
    pub fn get_decimal_array(&self, key: &str) -> Result<Vec<Decimal>> {
        self.get_array(key)
    }

    /// Returns an owned copy of an array's raw elements.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] if `key` is not an array.
    pub fn get_string_array(&self, key: &str) -> Result<Vec<String>> {
        self.array(key)
            .map(<[String]>::to_vec)
            .ok_or_else(|| Error::key_not_found(key))
    }

    /// Tolerant form of [`get_int_array`](Self::get_int_array).
    #[must_use]
    pub fn try_get_int_array(&self, key: &str) -> Option<Vec<i32>> {
        self.try_get_array(key)
    }

    /// Tolerant form of [`get_long_array`](Self::get_long_array).
    #[must_use]
    pub fn try_get_long_array(&self, key: &str) -> Option<Vec<i64>> {
        self.try_get_array(key)
    }

    /// Tolerant form of [`get_float_array`](Self::get_float_array).
    #[must_use]
    pub fn try_get_float_array(&self, key: &str) -> Option<Vec<f32>> {
        self.try_get_array(key)
    }

    /// Tolerant form of [`get_double_array`](Self::get_double_array).
    #[must_use]
    pub fn try_get_double_array(&self, key: &str) -> Option<Vec<f64>> {
        self.try_get_array(key)
    }

    /// Tolerant form of [`get_decimal_array`](Self::get_decimal_array).
    #[must_use]
    pub fn try_get_decimal_array(&self, key: &str) -> Option<Vec<Decimal>> {
        self.try_get_array(key)
    }

    /// Tolerant form of [`get_string_array`](Self::get_string_array).
    #[must_use]
    pub fn try_get_string_array(&self, key: &str) -> Option<Vec<String>> {
        self.array(key).map(<[String]>::to_vec)
    }
}

// ============================================================================
// ParsedResponse - Introspection
// ============================================================================

impl ParsedResponse {
    /// Returns the response exactly as received.
    #[inline]
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns `true` if `key` holds a scalar.
    #[must_use]
    pub fn has_key(&self, key: &str) -> bool {
        self.scalar(key).is_some()
    }

    /// Returns `true` if `key` holds an array.
    #[must_use]
    pub fn has_array_key(&self, key: &str) -> bool {
        self.array(key).is_some()
    }

    /// Scalar keys in first-seen order.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.entries_in_order()
            .filter(|entry| matches!(entry.field, Field::Scalar(_)))
            .map(|entry| entry.key.as_str())
            .collect()
    }

    /// Array keys in first-seen order.
    #[must_use]
    pub fn array_keys(&self) -> Vec<&str> {
        self.entries_in_order()
            .filter(|entry| matches!(entry.field, Field::Array(_)))
            .map(|entry| entry.key.as_str())
            .collect()
    }

    /// Scalar keys followed by array keys.
    #[must_use]
    pub fn all_keys(&self) -> Vec<&str> {
        let mut keys = self.keys();
        keys.extend(self.array_keys());
        keys
    }

    /// Number of scalar values.
    #[must_use]
    pub fn scalar_count(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| matches!(entry.field, Field::Scalar(_)))
            .count()
    }

    /// Number of arrays.
    #[must_use]
    pub fn array_count(&self) -> usize {
        self.entries.len() - self.scalar_count()
    }

    /// Total number of keys.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no keys were parsed.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copies every scalar into a new map keyed by the received key.
    #[must_use]
    pub fn scalars(&self) -> FxHashMap<String, String> {
        self.entries_in_order()
            .filter_map(|entry| match &entry.field {
                Field::Scalar(value) => Some((entry.key.clone(), value.clone())),
                Field::Array(_) => None,
            })
            .collect()
    }

    /// Copies every array into a new map keyed by the received key.
    #[must_use]
    pub fn arrays(&self) -> FxHashMap<String, Vec<String>> {
        self.entries_in_order()
            .filter_map(|entry| match &entry.field {
                Field::Array(items) => Some((entry.key.clone(), items.clone())),
                Field::Scalar(_) => None,
            })
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
