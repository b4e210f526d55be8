//! Error types for construction-time and input-parsing failures.
//!
//! This module defines the recoverable error surface of the crate:
//! 1. **Configuration Faults:** Out-of-range or inconsistent parameters,
//!    reported at construction before any simulation state exists.
//! 2. **Trace Errors:** I/O and parse failures while loading address traces.
//!
//! Cache misses are control flow, not errors, and never appear here.
//! Invariant violations inside the model are programming errors and panic
//! with a diagnostic instead of being surfaced through these types.

use std::fmt;
use std::io;

/// A fatal configuration fault detected while validating cache parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The block size is not a power of two, or too small to hold a
    /// translation table (the fan-out is half the block size, so the
    /// block size must be at least 4).
    BadBlockSize(u64),

    /// The cache size is not a whole number of blocks.
    SizeNotBlockMultiple {
        /// Configured cache size in bytes.
        size: u64,
        /// Configured block size in bytes.
        block_size: u64,
    },

    /// The cache holds fewer blocks than there are translation levels;
    /// a single resident chain would not fit.
    CapacityTooSmall {
        /// Number of blocks the cache holds.
        capacity: u64,
        /// Number of translation levels, including the leaf level.
        levels: u8,
    },

    /// The number of translation levels is zero.
    NoLevels,

    /// The span covered by one root-table slot overflows or exceeds the
    /// modeled memory size.
    BadRootSpan {
        /// Span in bytes of one root-table slot, if it was representable.
        span: Option<u64>,
        /// Modeled memory size in bytes.
        mem_size: u64,
    },

    /// The translation-cache capacity is zero.
    NoTlbCapacity,

    /// The maximum number of victim-scan attempts is zero.
    NoScanAttempts,

    /// The modeled memory size is zero.
    NoMemory,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::BadBlockSize(b) => {
                write!(f, "block size {} must be a power of two and at least 4", b)
            }
            ConfigError::SizeNotBlockMultiple { size, block_size } => {
                write!(
                    f,
                    "cache size {} is not a multiple of the block size {}",
                    size, block_size
                )
            }
            ConfigError::CapacityTooSmall { capacity, levels } => {
                write!(
                    f,
                    "cache holds {} blocks but needs at least {} for one translation chain",
                    capacity, levels
                )
            }
            ConfigError::NoLevels => write!(f, "number of translation levels must be at least 1"),
            ConfigError::BadRootSpan { span, mem_size } => match span {
                Some(span) => write!(
                    f,
                    "root-slot span {} exceeds the modeled memory size {}",
                    span, mem_size
                ),
                None => write!(f, "root-slot span overflows a 64-bit address"),
            },
            ConfigError::NoTlbCapacity => write!(f, "translation-cache capacity must be at least 1"),
            ConfigError::NoScanAttempts => {
                write!(f, "maximum victim-scan attempts must be at least 1")
            }
            ConfigError::NoMemory => write!(f, "modeled memory size must be non-zero"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// An error while loading or parsing an address trace.
#[derive(Debug)]
pub enum TraceError {
    /// The trace file could not be read.
    Io(io::Error),

    /// A line of the trace did not parse as an access.
    BadLine {
        /// 1-based line number within the trace file.
        line: usize,
        /// The offending line content.
        content: String,
    },
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceError::Io(e) => write!(f, "trace read failed: {}", e),
            TraceError::BadLine { line, content } => {
                write!(f, "trace line {} is not an access: {:?}", line, content)
            }
        }
    }
}

impl std::error::Error for TraceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TraceError::Io(e) => Some(e),
            TraceError::BadLine { .. } => None,
        }
    }
}

impl From<io::Error> for TraceError {
    fn from(e: io::Error) -> Self {
        TraceError::Io(e)
    }
}
