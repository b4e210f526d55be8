//! Discrete-event simulation harness.
//!
//! This module drives the cache model:
//! 1. **Event Queue:** Monotonic timeline with ordered event dispatch.
//! 2. **System:** Wires the cache, the backing store, and the CPU-side
//!    mailboxes together and routes every event.
//! 3. **Trace:** Address-trace loading and replay.

/// Event queue and event definitions.
pub mod event;

/// Top-level system wiring and event dispatch.
pub mod system;

/// Trace-file parsing and replay.
pub mod trace;

pub use event::{EventQueue, SimEvent};
pub use system::System;
pub use trace::{load_trace, TraceCmd, TraceOp};
