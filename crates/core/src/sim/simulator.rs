//! Simulator: the cycle-level scheduler over cores, caches, bus, and memory.
//!
//! One cycle advances in a fixed order: the cycle counter is pushed into
//! every component, each unblocked core issues at most one reference in core
//! order, and finally any cache whose pending miss has resolved unblocks its
//! core. All cross-cache effects inside a cycle are totally ordered by core
//! order, snoop order, and the bus timeline, so runs are deterministic.

use log::error;

use crate::bus::Bus;
use crate::cache::{AccessStatus, Cache};
use crate::common::{Address, SimError};
use crate::config::Config;
use crate::memory::MainMemory;
use crate::processor::Processor;
use crate::sim::trace::{open_traces, AccessKind, TraceStream};
use crate::stats::{CoreStats, SimReport};

/// The coupled four-core system and its scheduler.
pub struct Simulator {
    config: Config,
    caches: Vec<Cache>,
    processors: Vec<Processor>,
    bus: Bus,
    memory: MainMemory,
    cycle: u64,
    safeguard_tripped: bool,
}

impl Simulator {
    /// Builds a system with one cache and one front-end per trace stream.
    pub fn new(config: Config, traces: Vec<TraceStream>) -> Self {
        let block_size = config.cache.block_size();
        let caches = (0..traces.len())
            .map(|core| Cache::new(core, &config.cache))
            .collect();
        let mut processors: Vec<Processor> = traces
            .into_iter()
            .enumerate()
            .map(|(core, trace)| Processor::new(core, trace))
            .collect();
        // A core whose trace is empty from the start finishes at cycle 0.
        for proc in &mut processors {
            if !proc.has_more() {
                proc.mark_finished(0);
            }
        }
        Self {
            bus: Bus::new(block_size, config.timing.clone()),
            memory: MainMemory::new(block_size),
            caches,
            processors,
            config,
            cycle: 0,
            safeguard_tripped: false,
        }
    }

    /// Validates the configuration and opens the per-core trace files.
    pub fn open(config: Config, trace_prefix: &str) -> Result<Self, SimError> {
        config.validate()?;
        let traces = open_traces(trace_prefix, config.sim.num_cores)?;
        Ok(Self::new(config, traces))
    }

    /// Advances the system by one cycle.
    pub fn step(&mut self) {
        self.cycle += 1;
        for cache in &mut self.caches {
            cache.set_cycle(self.cycle);
        }
        self.bus.set_cycle(self.cycle);

        for core in 0..self.processors.len() {
            if self.processors[core].is_blocked() {
                self.processors[core].tick_idle();
                continue;
            }
            let Some(record) = self.processors[core].next_record() else {
                continue;
            };
            let addr = Address::new(
                record.address,
                self.config.cache.set_bits,
                self.config.cache.block_bits,
            );
            let (cache, mut peers) = split_requester(&mut self.caches, core);
            let status = match record.kind {
                AccessKind::Read => cache.read(&addr, &mut self.bus, &mut peers, &mut self.memory),
                AccessKind::Write => {
                    cache.write(&addr, &mut self.bus, &mut peers, &mut self.memory)
                }
            };
            match status {
                AccessStatus::Completed => {
                    self.processors[core].retire();
                    if !self.processors[core].has_more() {
                        self.processors[core].mark_finished(self.cycle);
                    }
                }
                AccessStatus::Blocked => self.processors[core].block(),
            }
        }

        for core in 0..self.caches.len() {
            if self.caches[core].check_miss_resolved() {
                self.processors[core].resume();
                if !self.processors[core].has_more() {
                    self.processors[core].mark_finished(self.cycle);
                }
            }
        }
    }

    /// Runs until every trace is exhausted and no core is blocked.
    ///
    /// The run ends in the cycle the last core completes its final
    /// instruction. Trips the safeguard cycle bound instead of spinning
    /// forever; the statistics gathered so far stay valid either way.
    pub fn run(&mut self) -> Result<(), SimError> {
        while !self.is_finished() {
            if self.cycle >= self.config.sim.max_cycles {
                self.safeguard_tripped = true;
                let err = SimError::SafeguardTripped { cycle: self.cycle };
                error!("{}", err);
                return Err(err);
            }
            self.step();
        }
        Ok(())
    }

    /// True once all traces are exhausted and no core is blocked.
    pub fn is_finished(&mut self) -> bool {
        self.processors
            .iter_mut()
            .all(|proc| !proc.is_blocked() && !proc.has_more())
    }

    /// Snapshot of all statistics in report form.
    pub fn report(&self) -> SimReport {
        let total_cycles = self.cycle;
        let cores: Vec<CoreStats> = self
            .caches
            .iter()
            .zip(&self.processors)
            .map(|(cache, proc)| {
                let stats = cache.stats();
                CoreStats {
                    reads: stats.reads,
                    writes: stats.writes,
                    instructions: proc.instructions_executed(),
                    execute_cycles: total_cycles.saturating_sub(proc.idle_cycles()),
                    idle_cycles: proc.idle_cycles(),
                    miss_rate: cache.miss_rate(),
                    evictions: stats.evictions,
                    writebacks: stats.writebacks,
                    finish_cycle: proc.finish_cycle().unwrap_or(total_cycles),
                }
            })
            .collect();
        let max_finish_cycle = cores.iter().map(|core| core.finish_cycle).max().unwrap_or(0);
        SimReport {
            num_sets: self.config.cache.num_sets(),
            associativity: self.config.cache.associativity,
            block_size: self.config.cache.block_size(),
            cores,
            total_cycles,
            bus_invalidations: self.bus.invalidations(),
            bus_traffic_bytes: self.bus.traffic_bytes(),
            max_finish_cycle,
            memory_reads: self.memory.read_count(),
            memory_writes: self.memory.write_count(),
            safeguard_tripped: self.safeguard_tripped,
        }
    }

    /// Current cycle count.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// The per-core caches, in core order.
    pub fn caches(&self) -> &[Cache] {
        &self.caches
    }

    /// The shared bus.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Main memory.
    pub fn memory(&self) -> &MainMemory {
        &self.memory
    }

    /// The per-core front-ends, in core order.
    pub fn processors(&self) -> &[Processor] {
        &self.processors
    }
}

/// Splits the cache vector into the requester and its peers.
///
/// The peer slice keeps ascending core order with the requester removed,
/// which is exactly the snoop order the bus requires.
fn split_requester(caches: &mut [Cache], core: usize) -> (&mut Cache, Vec<&mut Cache>) {
    let (before, rest) = caches.split_at_mut(core);
    let (requester, after) = rest
        .split_first_mut()
        .expect("core index within cache vector");
    let peers = before.iter_mut().chain(after.iter_mut()).collect();
    (requester, peers)
}
