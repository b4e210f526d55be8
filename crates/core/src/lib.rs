//! Dynamic Block Relocation Cache (DBRC) timing model.
//!
//! This crate implements a fully-associative, multi-level indirect-mapped
//! memory-side cache for cycle-level simulation. It provides:
//! 1. **Cache core:** Block arena, root translation table, translation walker,
//!    bounded-LRU translation cache, rotating victim selector, and the
//!    insertion engine that builds translation chains on demand.
//! 2. **Pipeline:** A blocking request front end with a single outstanding
//!    miss, delayed access events, and sub-block-to-line upgrade handling.
//! 3. **Ports:** CPU-side and memory-side flow control (deferred packet slot
//!    plus retry signalling).
//! 4. **Memory:** A byte-addressable backing store behind a trait seam, with
//!    a fixed-latency main-memory implementation.
//! 5. **Simulation:** A discrete-event queue, a `System` harness wiring the
//!    pieces together, and an address-trace replayer.
//! 6. **Configuration and statistics:** serde-backed configuration with
//!    validation, and hit/miss/latency statistics collection.

/// Common types and helpers (addresses, errors).
pub mod common;
/// Cache configuration (defaults, validation, derived geometry).
pub mod config;
/// Packet definitions and backing-store implementations.
pub mod mem;
/// The cache core (arena, walker, translation cache, victim selection,
/// insertion engine, blocking pipeline).
pub mod cache;
/// Port flow-control state for the CPU and memory sides.
pub mod port;
/// Discrete-event harness (event queue, system wiring, trace replay).
pub mod sim;
/// Statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `DbrcConfig::default()` or deserialize from JSON.
pub use crate::config::DbrcConfig;
/// The cache core; construct with `DbrcCache::new`.
pub use crate::cache::DbrcCache;
/// Top-level harness (cache, backing store, event queue); construct with `System::new`.
pub use crate::sim::System;
