//! Trace parsing and per-core trace file tests.

use std::fs;
use std::io::Cursor;

use l1sim_core::common::SimError;
use l1sim_core::sim::trace::{open_traces, AccessKind, TraceStream};

use crate::common::init_logging;

fn stream(text: &str) -> TraceStream {
    init_logging();
    TraceStream::from_reader(Cursor::new(text.to_owned()), "trace-test")
}

#[test]
fn parses_reads_and_writes() {
    let mut trace = stream("R 0x10\nW 0x20\n");
    let first = trace.next_record().unwrap();
    assert_eq!(first.kind, AccessKind::Read);
    assert_eq!(first.address, 0x10);
    let second = trace.next_record().unwrap();
    assert_eq!(second.kind, AccessKind::Write);
    assert_eq!(second.address, 0x20);
    assert!(trace.next_record().is_none());
}

#[test]
fn opcode_is_case_insensitive() {
    let mut trace = stream("r 1000\nw 0X2000\n");
    assert_eq!(trace.next_record().unwrap().kind, AccessKind::Read);
    let write = trace.next_record().unwrap();
    assert_eq!(write.kind, AccessKind::Write);
    assert_eq!(write.address, 0x2000);
}

#[test]
fn blank_line_ends_the_trace() {
    let mut trace = stream("R 0x10\n\nR 0x20\n");
    assert!(trace.next_record().is_some());
    assert!(trace.next_record().is_none());
    assert!(!trace.has_more());
}

#[test]
fn malformed_lines_are_skipped_not_terminal() {
    let mut trace = stream("R 0x10\nX 0x20\nW zz\nW 0x30\n");
    assert_eq!(trace.next_record().unwrap().address, 0x10);
    // The two malformed lines are warned about and skipped.
    let last = trace.next_record().unwrap();
    assert_eq!(last.kind, AccessKind::Write);
    assert_eq!(last.address, 0x30);
    assert!(trace.next_record().is_none());
}

#[test]
fn missing_operand_is_malformed() {
    let mut trace = stream("R\nW 0x40\n");
    assert_eq!(trace.next_record().unwrap().address, 0x40);
}

#[test]
fn has_more_is_idempotent() {
    let mut trace = stream("R 0x10\n");
    assert!(trace.has_more());
    assert!(trace.has_more());
    assert!(trace.next_record().is_some());
    assert!(!trace.has_more());
}

#[test]
fn opens_one_file_per_core() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    for core in 0..4 {
        let path = dir.path().join(format!("app_proc{}.trace", core));
        fs::write(path, format!("R 0x{:x}\n", core * 0x10)).unwrap();
    }
    let prefix = dir.path().join("app");
    let mut traces = open_traces(prefix.to_str().unwrap(), 4).unwrap();
    assert_eq!(traces.len(), 4);
    for (core, trace) in traces.iter_mut().enumerate() {
        assert_eq!(trace.next_record().unwrap().address, core as u32 * 0x10);
    }
}

#[test]
fn missing_trace_file_is_fatal() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    // Only three of the four files exist.
    for core in 0..3 {
        fs::write(dir.path().join(format!("app_proc{}.trace", core)), "").unwrap();
    }
    let prefix = dir.path().join("app");
    let err = open_traces(prefix.to_str().unwrap(), 4).unwrap_err();
    assert!(matches!(err, SimError::TraceOpen { .. }));
}
