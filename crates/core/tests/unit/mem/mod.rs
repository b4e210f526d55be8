//! Memory-side unit tests.

/// Backing-store tests.
pub mod backing;
