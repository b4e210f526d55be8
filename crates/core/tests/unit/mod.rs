//! Unit tests for the cache-model components.

/// Cache core: translation cache, victim selection, walker, insertion.
pub mod cache;


/// Packets and backing stores.
pub mod mem;


/// Event queue and trace replay.
pub mod sim;
