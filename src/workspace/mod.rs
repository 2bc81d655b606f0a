//! Filesystem helpers for vision deployments.
//!
//! A deployment usually wires a [`ConnectionManager`] next to a place where
//! input images are read from and results are written to. This module covers
//! that side; the connection manager does not depend on it.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `paths` | [`PathProvider`] trait and the [`Workspace`] directory layout |
//! | `images` | Image encoding and saving |
//!
//! [`ConnectionManager`]: crate::ConnectionManager

// ============================================================================
// Submodules
// ============================================================================

/// Image saving helpers.
pub mod images;

/// Input/output directory layout.
pub mod paths;

// ============================================================================
// Re-exports
// ============================================================================

pub use images::{ImageFormat, save_base64_image, save_image};
pub use paths::{PathProvider, Workspace};
