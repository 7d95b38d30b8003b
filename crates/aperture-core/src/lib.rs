//! Aperture core: runtime-free flow control contracts, error types, and labels.
//!
//! This crate defines the wire messages exchanged with the flow control
//! service, the error surface shared by the client and its callers, the span
//! attribute vocabulary, and label resolution. It intentionally carries no
//! transport or runtime dependencies so it can be reused in multiple contexts.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `ApertureError`/`Result` so a protected
//! feature is never taken down by the SDK that guards it.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod attributes;
pub mod code;
pub mod error;
pub mod labels;
pub mod protocol;

/// Shared result type.
pub use error::{ApertureError, ErrorKind, Result};

pub use code::Code;
pub use labels::resolve_labels;
