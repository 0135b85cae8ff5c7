//! Per-core L1 cache and MESI coherence controller.
//!
//! This module implements the private data cache of one core. It provides:
//! 1. **Local Accesses:** Read and write flows with hit/miss detection, LRU
//!    victim selection, write-allocate/write-back policy, and the MESI state
//!    transitions each flow requires.
//! 2. **Snooping:** The peer-side reaction to every bus transaction, including
//!    cache-to-cache supply and snoop-driven writebacks.
//! 3. **Miss Bookkeeping:** A pending miss blocks the owning core until the
//!    accumulated writeback and fill latencies have elapsed.
//!
//! Decisions are made in the cycle an access is issued; only their completion
//! is deferred, through the miss-resolve time. The controller never talks to
//! its peers directly: all cross-cache effects travel through [`Bus::transact`].
//!
//! [`Bus::transact`]: crate::bus::Bus::transact

pub mod line;
pub mod set;

pub use line::{CacheLine, MesiState};
pub use set::CacheSet;

use log::warn;

use crate::bus::{Bus, BusTransaction, SnoopOutcome};
use crate::common::{Address, SimError};
use crate::config::CacheParams;
use crate::memory::MainMemory;

/// Outcome of one local access, as seen by the processor front-end.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessStatus {
    /// The access hit and retired this cycle.
    Completed,
    /// The access missed; the core stalls until the miss resolves.
    Blocked,
}

/// Running counters of one cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Total accesses serviced (hits + misses).
    pub accesses: u64,
    /// Accesses that hit.
    pub hits: u64,
    /// Accesses that missed.
    pub misses: u64,
    /// Read accesses.
    pub reads: u64,
    /// Write accesses.
    pub writes: u64,
    /// Coherence transactions issued on the bus by this cache.
    pub coherence: u64,
    /// Valid lines replaced.
    pub evictions: u64,
    /// Dirty lines written back on replacement.
    pub writebacks: u64,
}

/// An outstanding miss: the core is blocked until `resolve_at`.
#[derive(Clone, Copy, Debug)]
pub struct PendingMiss {
    /// First cycle at which the miss counts as resolved.
    pub resolve_at: u64,
    /// Peer that supplied the block cache-to-cache, if any.
    pub source: Option<usize>,
}

/// A peer cache's reaction to a snooped transaction.
#[derive(Debug, Default)]
pub struct SnoopReply {
    /// This cache supplied the block to the requester.
    pub provided: bool,
    /// This cache invalidated a copy it held.
    pub invalidated: bool,
    /// This cache wrote a dirty block back to memory during the snoop.
    pub wrote_back: bool,
    /// The supplied block, when `provided` is set.
    pub data: Option<Vec<u8>>,
}

/// One core's private L1 cache.
pub struct Cache {
    core_id: usize,
    sets: Vec<CacheSet>,
    set_bits: u32,
    block_bits: u32,
    current_cycle: u64,
    pending: Option<PendingMiss>,
    stats: CacheStats,
}

impl Cache {
    /// Creates an empty cache for `core_id` with the given geometry.
    pub fn new(core_id: usize, params: &CacheParams) -> Self {
        let block_size = params.block_size();
        Self {
            core_id,
            sets: (0..params.num_sets())
                .map(|_| CacheSet::new(params.associativity, block_size))
                .collect(),
            set_bits: params.set_bits,
            block_bits: params.block_bits,
            current_cycle: 0,
            pending: None,
            stats: CacheStats::default(),
        }
    }

    /// Services a processor read.
    ///
    /// Hits retire in the issuing cycle. A miss selects a victim, writes it
    /// back if dirty, issues `BUS_RD`, installs the block as Shared when a
    /// peer supplied it and Exclusive otherwise, and blocks the core until
    /// the accumulated latency has elapsed.
    pub fn read(
        &mut self,
        addr: &Address,
        bus: &mut Bus,
        peers: &mut [&mut Cache],
        memory: &mut MainMemory,
    ) -> AccessStatus {
        if self.pending.is_some() {
            return AccessStatus::Blocked;
        }
        self.stats.accesses += 1;
        self.stats.reads += 1;

        let index = addr.index();
        if index >= self.sets.len() {
            return self.refuse(index);
        }
        let tag = addr.tag();

        if let Some(way) = self.sets[index].lookup(tag) {
            self.stats.hits += 1;
            self.sets[index].touch(way);
            return AccessStatus::Completed;
        }

        self.stats.misses += 1;
        let mut resolve_at = self.current_cycle;

        let victim_way = self.sets[index].victim_way();
        resolve_at += self.evict(index, victim_way, bus, peers, memory);

        let outcome = self.issue(BusTransaction::BusRd, addr, bus, peers, memory);
        resolve_at += outcome.latency;
        let state = if outcome.provided {
            MesiState::Shared
        } else {
            MesiState::Exclusive
        };
        let data = match outcome.data {
            Some(block) => block,
            None => memory.read_block(addr.block_address()),
        };

        let set = &mut self.sets[index];
        set.way_mut(victim_way).fill(tag, data, state);
        set.touch(victim_way);

        self.pending = Some(PendingMiss {
            resolve_at,
            source: outcome.source,
        });
        AccessStatus::Blocked
    }

    /// Services a processor write (write-allocate, write-back).
    ///
    /// Hits retire in the issuing cycle: Modified lines absorb the write,
    /// Exclusive lines upgrade silently, and Shared lines issue `BUS_UPGR`
    /// to invalidate the other sharers first. A miss issues `BUS_RDX` and
    /// installs the block as Modified.
    pub fn write(
        &mut self,
        addr: &Address,
        bus: &mut Bus,
        peers: &mut [&mut Cache],
        memory: &mut MainMemory,
    ) -> AccessStatus {
        if self.pending.is_some() {
            return AccessStatus::Blocked;
        }
        self.stats.accesses += 1;
        self.stats.writes += 1;

        let index = addr.index();
        if index >= self.sets.len() {
            return self.refuse(index);
        }
        let tag = addr.tag();

        if let Some(way) = self.sets[index].lookup(tag) {
            self.stats.hits += 1;
            match self.sets[index].lines()[way].state() {
                MesiState::Modified => {}
                // Sole owner: upgrade without bus traffic.
                MesiState::Exclusive => {
                    self.sets[index].way_mut(way).set_state(MesiState::Modified);
                }
                MesiState::Shared => {
                    self.issue(BusTransaction::BusUpgr, addr, bus, peers, memory);
                    self.sets[index].way_mut(way).set_state(MesiState::Modified);
                }
                // lookup never returns Invalid lines
                MesiState::Invalid => {}
            }
            let set = &mut self.sets[index];
            set.way_mut(way).write_word(addr.word_offset(), addr.raw());
            set.touch(way);
            return AccessStatus::Completed;
        }

        self.stats.misses += 1;
        let mut resolve_at = self.current_cycle;

        let victim_way = self.sets[index].victim_way();
        resolve_at += self.evict(index, victim_way, bus, peers, memory);

        let outcome = self.issue(BusTransaction::BusRdX, addr, bus, peers, memory);
        resolve_at += outcome.latency;
        let data = match outcome.data {
            Some(block) => block,
            None => memory.read_block(addr.block_address()),
        };

        let set = &mut self.sets[index];
        set.way_mut(victim_way).fill(tag, data, MesiState::Modified);
        set.way_mut(victim_way)
            .write_word(addr.word_offset(), addr.raw());
        set.touch(victim_way);

        self.pending = Some(PendingMiss {
            resolve_at,
            source: outcome.source,
        });
        AccessStatus::Blocked
    }

    /// Reacts to a transaction another core put on the bus.
    ///
    /// State transitions follow the MESI snoop table; a Modified holder
    /// writes its block back to memory before downgrading. LRU state is
    /// never touched by snoops.
    pub fn snoop(
        &mut self,
        kind: BusTransaction,
        addr: &Address,
        memory: &mut MainMemory,
    ) -> SnoopReply {
        let mut reply = SnoopReply::default();
        let index = addr.index();
        if index >= self.sets.len() {
            return reply;
        }
        let tag = addr.tag();
        let Some(way) = self.sets[index].lookup(tag) else {
            return reply;
        };
        let block_addr = addr.block_address();
        let state = self.sets[index].lines()[way].state();

        match kind {
            BusTransaction::BusRd => match state {
                MesiState::Modified => {
                    reply.data = Some(self.write_back(index, way, block_addr, memory));
                    reply.wrote_back = true;
                    reply.provided = true;
                    self.sets[index].downgrade_to_shared(tag);
                }
                MesiState::Exclusive => {
                    reply.data = Some(self.sets[index].lines()[way].data().to_vec());
                    reply.provided = true;
                    self.sets[index].downgrade_to_shared(tag);
                }
                MesiState::Shared => {
                    reply.data = Some(self.sets[index].lines()[way].data().to_vec());
                    reply.provided = true;
                }
                MesiState::Invalid => {}
            },
            BusTransaction::BusRdX => match state {
                MesiState::Modified => {
                    reply.data = Some(self.write_back(index, way, block_addr, memory));
                    reply.wrote_back = true;
                    reply.provided = true;
                    reply.invalidated = self.sets[index].invalidate(tag);
                }
                MesiState::Exclusive | MesiState::Shared => {
                    reply.invalidated = self.sets[index].invalidate(tag);
                }
                MesiState::Invalid => {}
            },
            BusTransaction::BusUpgr => {
                // The issuer held the block Shared, so a peer copy can only
                // be Shared as well.
                if state == MesiState::Shared {
                    reply.invalidated = self.sets[index].invalidate(tag);
                }
            }
            BusTransaction::Invalidate => match state {
                MesiState::Modified => {
                    self.write_back(index, way, block_addr, memory);
                    reply.wrote_back = true;
                    reply.invalidated = self.sets[index].invalidate(tag);
                }
                MesiState::Exclusive | MesiState::Shared => {
                    reply.invalidated = self.sets[index].invalidate(tag);
                }
                MesiState::Invalid => {}
            },
            BusTransaction::Flush => {}
        }
        reply
    }

    /// Clears the pending miss once the current cycle has reached its
    /// resolve time. Returns true exactly once per resolved miss.
    pub fn check_miss_resolved(&mut self) -> bool {
        match self.pending {
            Some(miss) if self.current_cycle >= miss.resolve_at => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    /// Pushes the scheduler's cycle counter into the cache.
    pub fn set_cycle(&mut self, cycle: u64) {
        self.current_cycle = cycle;
    }

    /// MESI state this cache holds the given address in.
    pub fn state_of(&self, addr: &Address) -> MesiState {
        self.sets
            .get(addr.index())
            .and_then(|set| set.line(addr.tag()))
            .map(|line| line.state())
            .unwrap_or(MesiState::Invalid)
    }

    /// The core this cache belongs to.
    #[inline]
    pub fn core_id(&self) -> usize {
        self.core_id
    }

    /// Running counters.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Miss rate over all accesses so far, in [0, 1].
    pub fn miss_rate(&self) -> f64 {
        if self.stats.accesses == 0 {
            0.0
        } else {
            self.stats.misses as f64 / self.stats.accesses as f64
        }
    }

    /// The outstanding miss, if the core is blocked on one.
    pub fn pending_miss(&self) -> Option<PendingMiss> {
        self.pending
    }

    /// The cache sets, in index order.
    pub fn sets(&self) -> &[CacheSet] {
        &self.sets
    }

    /// Replaces the victim way if needed and returns the writeback penalty.
    ///
    /// A valid victim counts as an eviction; a dirty one additionally goes
    /// out as a `FLUSH` transaction and a memory write, and its latency is
    /// charged onto the requester's miss-resolve time.
    fn evict(
        &mut self,
        index: usize,
        way: usize,
        bus: &mut Bus,
        peers: &mut [&mut Cache],
        memory: &mut MainMemory,
    ) -> u64 {
        let (valid, dirty, victim_tag) = {
            let line = &self.sets[index].lines()[way];
            (line.is_valid(), line.is_dirty(), line.tag())
        };
        if !valid {
            return 0;
        }
        self.stats.evictions += 1;
        if !dirty {
            return 0;
        }
        self.stats.writebacks += 1;

        let victim_addr = Address::from_parts(victim_tag, index, self.set_bits, self.block_bits);
        let outcome = self.issue(BusTransaction::Flush, &victim_addr, bus, peers, memory);
        let data = self.sets[index].lines()[way].data().to_vec();
        if let Err(err) = memory.write_block(victim_addr.block_address(), &data) {
            warn!("core {}: dropped writeback: {}", self.core_id, err);
        }
        outcome.latency
    }

    /// Puts one transaction on the bus on behalf of this cache.
    fn issue(
        &mut self,
        kind: BusTransaction,
        addr: &Address,
        bus: &mut Bus,
        peers: &mut [&mut Cache],
        memory: &mut MainMemory,
    ) -> SnoopOutcome {
        self.stats.coherence += 1;
        bus.transact(kind, addr, self.core_id, peers, memory)
    }

    /// Writes the line's block back to memory and returns a copy of it.
    fn write_back(
        &mut self,
        index: usize,
        way: usize,
        block_addr: u32,
        memory: &mut MainMemory,
    ) -> Vec<u8> {
        let data = self.sets[index].lines()[way].data().to_vec();
        if let Err(err) = memory.write_block(block_addr, &data) {
            warn!("core {}: dropped snoop writeback: {}", self.core_id, err);
        }
        data
    }

    /// Refuses an access whose set index fell outside the cache.
    ///
    /// Invariant backstop: `Address::index` masks to `s` bits, so an address
    /// decoded under this cache's own geometry can never land here; only an
    /// address decoded under a wider geometry could. The core stalls for one
    /// cycle instead of being serviced; the record is still retired when the
    /// stall clears so instruction accounting stays consistent.
    fn refuse(&mut self, index: usize) -> AccessStatus {
        warn!(
            "core {}: {}",
            self.core_id,
            SimError::SetIndexOutOfRange {
                index,
                sets: self.sets.len(),
            }
        );
        self.pending = Some(PendingMiss {
            resolve_at: self.current_cycle + 1,
            source: None,
        });
        AccessStatus::Blocked
    }
}
