//! Common types and helpers shared across the cache model.
//!
//! This module provides the building blocks used by every other component:
//! 1. **Address Helpers:** Block-address and block-tag arithmetic.
//! 2. **Error Handling:** Configuration and trace-parsing error types.

/// Block-address arithmetic helpers.
pub mod addr;

/// Error types for configuration and trace parsing.
pub mod error;

pub use addr::{block_addr, block_tag, is_block_aligned};
pub use error::{ConfigError, TraceError};
