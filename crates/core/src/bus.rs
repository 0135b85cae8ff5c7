//! Shared bus: transaction serialization, snooping, and traffic accounting.
//!
//! This module models the single shared bus between the four L1 caches and
//! main memory. It provides:
//! 1. **Arbitration:** One transaction at a time; a transaction starts at
//!    `max(currentCycle, busBusyUntil)` and holds the bus for its length.
//! 2. **Snoop Fabric:** Every peer cache observes the transaction in ascending
//!    core order; the first peer that can supply the block becomes the data source.
//! 3. **Accounting:** Data traffic in bytes and invalidation counts.
//!
//! The bus never blocks the requester itself; the requesting cache's
//! miss-resolve time is the authoritative stall endpoint. Peer caches are
//! borrowed only for the duration of one transaction; the simulator keeps
//! ownership.

use log::debug;

use crate::cache::Cache;
use crate::common::Address;
use crate::config::TimingConfig;
use crate::memory::MainMemory;

/// The five coherence transactions carried on the bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusTransaction {
    /// Read request for a block (miss fill, no intent to modify).
    BusRd,
    /// Read-for-ownership: fill plus invalidation of all other copies.
    BusRdX,
    /// Upgrade of a Shared copy to Modified; invalidates the other sharers.
    BusUpgr,
    /// Standalone invalidation packet.
    Invalidate,
    /// Writeback of a dirty block to main memory.
    Flush,
}

/// What the snooped peers contributed to one transaction.
#[derive(Debug, Default)]
pub struct SnoopOutcome {
    /// Cycle at which the transaction won the bus.
    pub start: u64,
    /// True when some peer supplied the block cache-to-cache.
    pub provided: bool,
    /// Core id of the first peer (in snoop order) that supplied the block.
    pub source: Option<usize>,
    /// The supplied block, when `provided` is set.
    pub data: Option<Vec<u8>>,
    /// Cycles the requester must charge onto its miss-resolve time.
    pub latency: u64,
}

/// The shared bus and its running statistics.
pub struct Bus {
    cycle: u64,
    busy_until: u64,
    invalidations: u64,
    traffic_bytes: u64,
    block_size: usize,
    timing: TimingConfig,
}

impl Bus {
    /// Creates an idle bus for blocks of `block_size` bytes.
    pub fn new(block_size: usize, timing: TimingConfig) -> Self {
        Self {
            cycle: 0,
            busy_until: 0,
            invalidations: 0,
            traffic_bytes: 0,
            block_size,
            timing,
        }
    }

    /// Advances the bus's notion of the current cycle.
    pub fn set_cycle(&mut self, cycle: u64) {
        self.cycle = cycle;
    }

    /// Cycles to move one block across the bus cache-to-cache.
    #[inline]
    pub fn block_transfer_cycles(&self) -> u64 {
        self.timing.word_transfer_latency * (self.block_size as u64 / 4)
    }

    /// Cycles for a main-memory block fetch or writeback.
    #[inline]
    pub fn memory_latency(&self) -> u64 {
        self.timing.mem_latency
    }

    /// Issues one transaction: snoops every peer, reserves the bus, and
    /// accounts traffic and invalidations.
    ///
    /// `peers` must be the other caches in ascending core order with the
    /// requester excluded; the first peer whose snoop supplies data wins as
    /// the block source. A peer that had the block in Modified writes it back
    /// to memory during its snoop; that writeback is charged inline on the
    /// bus timeline before the transfer hold, but costs no extra bus bytes.
    pub fn transact(
        &mut self,
        kind: BusTransaction,
        addr: &Address,
        requester: usize,
        peers: &mut [&mut Cache],
        memory: &mut MainMemory,
    ) -> SnoopOutcome {
        let mut outcome = SnoopOutcome::default();
        let mut copies_killed = 0u64;
        let mut peer_wrote_back = false;

        for peer in peers.iter_mut() {
            let reply = peer.snoop(kind, addr, memory);
            peer_wrote_back |= reply.wrote_back;
            if reply.invalidated {
                copies_killed += 1;
            }
            if reply.provided && !outcome.provided {
                outcome.provided = true;
                outcome.source = Some(peer.core_id());
                outcome.data = reply.data;
            }
        }

        // Serialize: the transaction starts once the bus frees up. A snooped
        // writeback extends the hold before the transfer begins.
        let start = self.cycle.max(self.busy_until);
        let mut hold = self.hold_cycles(kind);
        if peer_wrote_back {
            hold += self.timing.mem_latency;
        }
        self.busy_until = start + hold;
        outcome.start = start;

        match kind {
            BusTransaction::BusRd | BusTransaction::BusRdX | BusTransaction::Flush => {
                self.traffic_bytes += self.block_size as u64;
            }
            BusTransaction::BusUpgr | BusTransaction::Invalidate => {}
        }

        match kind {
            // One invalidation per copy the read-exclusive killed.
            BusTransaction::BusRdX => self.invalidations += copies_killed,
            // An upgrade/invalidate packet counts once even with no sharers.
            BusTransaction::BusUpgr | BusTransaction::Invalidate => self.invalidations += 1,
            _ => {}
        }

        outcome.latency = match kind {
            BusTransaction::BusRd | BusTransaction::BusRdX => {
                if outcome.provided {
                    self.block_transfer_cycles()
                } else {
                    self.timing.mem_latency
                }
            }
            BusTransaction::Flush => self.timing.mem_latency,
            BusTransaction::BusUpgr | BusTransaction::Invalidate => 0,
        };

        debug!(
            "bus: core {} {:?} {} start={} hold={} provided={:?}",
            requester, kind, addr, start, hold, outcome.source
        );

        outcome
    }

    fn hold_cycles(&self, kind: BusTransaction) -> u64 {
        match kind {
            BusTransaction::BusRd | BusTransaction::BusRdX => self.block_transfer_cycles(),
            BusTransaction::BusUpgr | BusTransaction::Invalidate => self.timing.control_latency,
            BusTransaction::Flush => self.timing.mem_latency,
        }
    }

    /// Total invalidations observed on the bus.
    pub fn invalidations(&self) -> u64 {
        self.invalidations
    }

    /// Total data moved across the bus, in bytes.
    pub fn traffic_bytes(&self) -> u64 {
        self.traffic_bytes
    }

    /// Earliest cycle at which the bus is free again.
    pub fn busy_until(&self) -> u64 {
        self.busy_until
    }
}
