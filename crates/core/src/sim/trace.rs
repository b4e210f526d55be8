//! Address-trace loading and replay.
//!
//! A trace is a text file with one access per line: a hex address,
//! optionally prefixed with `r` or `w` for the access kind (reads are the
//! default). Blank lines and `#` comments are skipped. Replay drives every
//! access through the full timing path, one byte per access.

use std::fs;
use std::path::Path;

use crate::common::error::TraceError;
use crate::mem::packet::Packet;
use crate::sim::system::System;

/// Kind of a traced access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceCmd {
    /// A load.
    Read,
    /// A store.
    Write,
}

/// One access of a trace.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceOp {
    /// Access kind.
    pub cmd: TraceCmd,
    /// Byte address.
    pub addr: u64,
}

/// Loads a trace file.
///
/// # Returns
///
/// The parsed accesses in file order, or the first I/O or parse error.
pub fn load_trace(path: &Path) -> Result<Vec<TraceOp>, TraceError> {
    let content = fs::read_to_string(path)?;
    parse_trace(&content)
}

/// Parses trace text; see the module docs for the format.
pub fn parse_trace(content: &str) -> Result<Vec<TraceOp>, TraceError> {
    let mut ops = Vec::new();
    for (i, raw) in content.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let bad = || TraceError::BadLine {
            line: i + 1,
            content: raw.to_string(),
        };
        let mut parts = line.split_whitespace();
        let first = parts.next().ok_or_else(bad)?;
        let (cmd, addr_str) = match first {
            "r" | "R" => (TraceCmd::Read, parts.next().ok_or_else(bad)?),
            "w" | "W" => (TraceCmd::Write, parts.next().ok_or_else(bad)?),
            other => (TraceCmd::Read, other),
        };
        if parts.next().is_some() {
            return Err(bad());
        }
        let digits = addr_str
            .strip_prefix("0x")
            .or_else(|| addr_str.strip_prefix("0X"))
            .unwrap_or(addr_str);
        let addr = u64::from_str_radix(digits, 16).map_err(|_| bad())?;
        ops.push(TraceOp { cmd, addr });
    }
    Ok(ops)
}

/// Replays a trace through the system, one byte-sized access at a time,
/// waiting for each response before issuing the next.
///
/// Stores write the low byte of their own address, which keeps replay
/// deterministic without a data column in the trace format.
pub fn replay(system: &mut System, ops: &[TraceOp]) {
    for op in ops {
        let pkt = match op.cmd {
            TraceCmd::Read => Packet::read_req(op.addr, 1),
            TraceCmd::Write => Packet::write_req(op.addr, vec![op.addr as u8]),
        };
        system.perform(0, pkt);
        system.run_until_idle();
    }
}
