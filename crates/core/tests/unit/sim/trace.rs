//! Trace Parsing and Replay Tests.
//!
//! Verifies the trace format (bare hex, `0x` prefix, `r`/`w` markers,
//! comments and blank lines), error reporting with line numbers, and
//! replay through the timing path.

use std::io::Write;

use tempfile::NamedTempFile;

use dbrc_core::common::error::TraceError;
use dbrc_core::mem::packet::Packet;
use dbrc_core::sim::system::System;
use dbrc_core::sim::trace::{load_trace, parse_trace, replay, TraceCmd, TraceOp};

use crate::common::three_level_config;

// ══════════════════════════════════════════════════════════
// 1. Parsing
// ══════════════════════════════════════════════════════════

#[test]
fn bare_hex_lines_parse_as_reads() {
    let ops = parse_trace("100\n2a0\n").unwrap();
    assert_eq!(
        ops,
        vec![
            TraceOp { cmd: TraceCmd::Read, addr: 0x100 },
            TraceOp { cmd: TraceCmd::Read, addr: 0x2a0 },
        ]
    );
}

#[test]
fn prefixes_select_the_access_kind() {
    let ops = parse_trace("r 0x10\nw 0x20\nR 30\nW 0X40\n").unwrap();
    assert_eq!(ops[0], TraceOp { cmd: TraceCmd::Read, addr: 0x10 });
    assert_eq!(ops[1], TraceOp { cmd: TraceCmd::Write, addr: 0x20 });
    assert_eq!(ops[2], TraceOp { cmd: TraceCmd::Read, addr: 0x30 });
    assert_eq!(ops[3], TraceOp { cmd: TraceCmd::Write, addr: 0x40 });
}

#[test]
fn comments_and_blank_lines_are_skipped() {
    let ops = parse_trace("# header\n\n100 # trailing note\n   \n").unwrap();
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].addr, 0x100);
}

#[test]
fn bad_lines_report_their_line_number() {
    let err = parse_trace("100\nnot-hex\n").unwrap_err();
    match err {
        TraceError::BadLine { line, content } => {
            assert_eq!(line, 2);
            assert_eq!(content, "not-hex");
        }
        other => panic!("expected BadLine, got {:?}", other),
    }
}

#[test]
fn extra_tokens_are_rejected() {
    assert!(parse_trace("r 0x10 0x20\n").is_err());
}

#[test]
fn load_trace_reads_a_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "# trace\nr 0x10\nw 0x18").unwrap();
    let ops = load_trace(file.path()).unwrap();
    assert_eq!(ops.len(), 2);
    assert_eq!(ops[1], TraceOp { cmd: TraceCmd::Write, addr: 0x18 });
}

#[test]
fn missing_file_is_an_io_error() {
    let err = load_trace(std::path::Path::new("/nonexistent/trace.txt")).unwrap_err();
    assert!(matches!(err, TraceError::Io(_)));
}

// ══════════════════════════════════════════════════════════
// 2. Replay
// ══════════════════════════════════════════════════════════

/// Replaying a trace with capacity to spare misses once per distinct
/// line and hits everywhere else.
#[test]
fn replay_misses_once_per_distinct_line() {
    let mut system = System::new(&three_level_config(), 1).unwrap();
    let ops = parse_trace("0x10\n0x11\n0x30\n0x10\n0x31\n0x90\n0x35\n").unwrap();
    replay(&mut system, &ops);
    // Distinct lines: 0x10, 0x30, 0x90.
    assert_eq!(system.stats().misses, 3);
    assert_eq!(system.stats().hits, 4);
    system.cache().audit().unwrap();
}

/// Traced writes store the low byte of their address; a read-back sees it.
#[test]
fn replayed_writes_are_observable() {
    let mut system = System::new(&three_level_config(), 1).unwrap();
    let ops = parse_trace("w 0x25\n").unwrap();
    replay(&mut system, &ops);

    let resp = system.perform(0, Packet::read_req(0x25, 1));
    assert_eq!(resp.data(), &[0x25]);
}
