//! Memory-side definitions: packets and the backing store.
//!
//! This module provides:
//! 1. **Packets:** The request/response unit exchanged between the CPU side,
//!    the cache, and the backing store.
//! 2. **Backing Store:** The trait contract the cache's memory side talks
//!    to, plus a fixed-latency main-memory implementation.

/// Packet and command definitions.
pub mod packet;

/// Backing-store trait and main-memory implementation.
pub mod backing;

pub use backing::{BackingStore, MainMemory};
pub use packet::{MemCmd, Packet};
