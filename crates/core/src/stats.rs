//! Simulation statistics collection and reporting.
//!
//! This module defines the counters gathered over one run. It provides:
//! 1. **Per-core counters:** Reads, writes, execute/idle cycles, miss rate,
//!    evictions, and writebacks.
//! 2. **Global counters:** Bus invalidations, bus traffic in bytes, memory
//!    block accesses, and the maximum finish cycle over all cores.
//! 3. **Reporting:** A deterministic textual report written to any
//!    `io::Write` sink (stdout or the `-o` file).

use std::io::{self, Write};

/// Final statistics of one core.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CoreStats {
    /// Read instructions issued.
    pub reads: u64,
    /// Write instructions issued.
    pub writes: u64,
    /// Instructions executed (completed plus resolved-miss records).
    pub instructions: u64,
    /// Cycles the core spent executing (total cycles minus idle cycles).
    pub execute_cycles: u64,
    /// Cycles the core spent blocked on misses.
    pub idle_cycles: u64,
    /// Miss rate over all accesses, in [0, 1].
    pub miss_rate: f64,
    /// Valid lines replaced in this core's cache.
    pub evictions: u64,
    /// Dirty lines written back on replacement.
    pub writebacks: u64,
    /// Cycle at which this core completed its final instruction (0 for an
    /// empty trace; the run's last cycle if the safeguard cut it off).
    pub finish_cycle: u64,
}

/// Final statistics of one simulation run.
#[derive(Clone, Debug, PartialEq)]
pub struct SimReport {
    /// Number of cache sets per core (`2^s`).
    pub num_sets: usize,
    /// Lines per set (E).
    pub associativity: usize,
    /// Block size in bytes (`2^b`).
    pub block_size: usize,
    /// Per-core statistics, in core order.
    pub cores: Vec<CoreStats>,
    /// Cycles the whole simulation ran for.
    pub total_cycles: u64,
    /// Invalidations observed on the bus.
    pub bus_invalidations: u64,
    /// Data moved across the bus, in bytes.
    pub bus_traffic_bytes: u64,
    /// Maximum finish cycle over all cores.
    pub max_finish_cycle: u64,
    /// Memory block reads served.
    pub memory_reads: u64,
    /// Memory block writes accepted.
    pub memory_writes: u64,
    /// True when the run hit its safeguard cycle bound.
    pub safeguard_tripped: bool,
}

impl SimReport {
    /// Writes the textual report.
    ///
    /// The layout and counter order are fixed so identical runs produce
    /// byte-identical reports.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "===== Cache Simulation Results =====")?;
        writeln!(
            out,
            "Cache parameters: {} sets, {}-way, {} bytes per block",
            self.num_sets, self.associativity, self.block_size
        )?;
        if self.safeguard_tripped {
            writeln!(
                out,
                "Warning: safeguard cycle bound reached; statistics are partial"
            )?;
        }
        writeln!(out)?;

        for (core, stats) in self.cores.iter().enumerate() {
            writeln!(out, "Core {} Statistics:", core)?;
            writeln!(out, "  Read Instructions: {}", stats.reads)?;
            writeln!(out, "  Write Instructions: {}", stats.writes)?;
            writeln!(out, "  Total Instructions: {}", stats.instructions)?;
            writeln!(out, "  Total Execution Cycles: {}", stats.execute_cycles)?;
            writeln!(out, "  Idle Cycles: {}", stats.idle_cycles)?;
            writeln!(out, "  Cache Miss Rate: {:.4}%", stats.miss_rate * 100.0)?;
            writeln!(out, "  Cache Evictions: {}", stats.evictions)?;
            writeln!(out, "  Cache Writebacks: {}", stats.writebacks)?;
            writeln!(out, "  Finish Cycle: {}", stats.finish_cycle)?;
            writeln!(out)?;
        }

        writeln!(out, "Bus Statistics:")?;
        writeln!(out, "  Number of Invalidations: {}", self.bus_invalidations)?;
        writeln!(out, "  Data Traffic on Bus: {} bytes", self.bus_traffic_bytes)?;
        writeln!(out)?;

        writeln!(out, "Memory Statistics:")?;
        writeln!(out, "  Block Reads: {}", self.memory_reads)?;
        writeln!(out, "  Block Writes: {}", self.memory_writes)?;
        writeln!(out)?;

        writeln!(out, "Total Cycles: {}", self.total_cycles)?;
        writeln!(
            out,
            "Maximum Execution Time: {} cycles",
            self.max_finish_cycle
        )?;
        Ok(())
    }
}
