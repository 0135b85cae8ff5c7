//! Cycle-accurate four-core MESI cache coherence simulator.
//!
//! This crate implements a shared-memory multiprocessor model with the following:
//! 1. **Caches:** Per-core set-associative L1 caches with LRU replacement and a
//!    MESI invalidation-based coherence controller.
//! 2. **Bus:** A single serialized bus carrying the five coherence transactions,
//!    with snoop fan-out, latency stamping, and traffic accounting.
//! 3. **Memory:** A sparse block-addressed main memory.
//! 4. **Scheduler:** A deterministic cycle loop feeding one memory-reference
//!    trace per core and stalling cores on outstanding misses.
//! 5. **Statistics:** Per-core and global counters with a textual report.

/// Shared bus: arbitration, snooping, traffic and invalidation accounting.
pub mod bus;
/// Per-core L1 cache: lines, sets, and the MESI controller.
pub mod cache;
/// Common types (address decomposition, errors).
pub mod common;
/// Simulator configuration (defaults, geometry, timing, limits).
pub mod config;
/// Sparse block-addressed main memory.
pub mod memory;
/// Processor front-ends consuming the per-core traces.
pub mod processor;
/// Trace reading and the cycle-level scheduler.
pub mod sim;
/// Statistics collection and report formatting.
pub mod stats;

/// Root configuration type; build from CLI flags or deserialize from JSON.
pub use crate::config::Config;
/// Simulator error type.
pub use crate::common::SimError;
/// Top-level system; construct with `Simulator::open` and drive with `run`.
pub use crate::sim::simulator::Simulator;
/// Per-core trace readers.
pub use crate::sim::trace::{open_traces, TraceStream};
/// Final statistics of one run.
pub use crate::stats::SimReport;
