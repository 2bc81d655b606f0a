//! Response protocol: delimited text with embedded arrays.
//!
//! # Format
//!
//! ```text
//! key1<kv-sep>value1<pair-sep>key2<kv-sep>[e1,e2,...]
//! ```
//!
//! Defaults are `,` between pairs and `:` between key and value. Array
//! elements are always separated by `,`. A response containing `error`
//! (any case) is a failure report from the remote service.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `field` | Typed conversion of raw values |
//! | `parser` | Bracket-aware splitting and separators |
//! | `response` | [`ParsedResponse`] and its accessors |

// ============================================================================
// Submodules
// ============================================================================

/// Typed conversion of raw values.
pub mod field;

/// Bracket-aware response parser.
pub mod parser;

/// Parsed response and accessors.
pub mod response;

// ============================================================================
// Re-exports
// ============================================================================

pub use field::FieldValue;
pub use parser::{DEFAULT_KEY_VALUE_SEPARATOR, DEFAULT_PAIR_SEPARATOR, Separators, parse_response};
pub use response::ParsedResponse;
