//! Bus arbitration and accounting tests.
//!
//! Geometry: 16-byte blocks, so a block transfer holds the bus for
//! `2 * 16 / 4 = 8` cycles; memory costs 100 and control packets 2.

use l1sim_core::bus::{Bus, BusTransaction};
use l1sim_core::cache::{Cache, MesiState};
use l1sim_core::common::Address;
use l1sim_core::config::{CacheParams, TimingConfig};
use l1sim_core::memory::MainMemory;

use crate::common::init_logging;

fn bus() -> Bus {
    init_logging();
    Bus::new(16, TimingConfig::default())
}

fn params() -> CacheParams {
    CacheParams {
        set_bits: 2,
        associativity: 2,
        block_bits: 4,
    }
}

fn addr(raw: u32) -> Address {
    Address::new(raw, 2, 4)
}

/// Builds a cache holding `raw`'s block in the Shared state.
fn cache_with_shared(core: usize, raw: u32, memory: &mut MainMemory) -> Cache {
    let mut cache = Cache::new(core, &params());
    let mut bus = bus();
    let mut no_peers: Vec<&mut Cache> = Vec::new();
    cache.set_cycle(1);
    cache.write(&addr(raw), &mut bus, &mut no_peers, memory);
    cache.set_cycle(200);
    assert!(cache.check_miss_resolved());
    // A snooped read downgrades the Modified line to Shared.
    cache.snoop(BusTransaction::BusRd, &addr(raw), memory);
    assert_eq!(cache.state_of(&addr(raw)), MesiState::Shared);
    cache
}

#[test]
fn read_holds_bus_for_block_transfer() {
    let mut bus = bus();
    let mut memory = MainMemory::new(16);
    let mut peers: Vec<&mut Cache> = Vec::new();

    bus.set_cycle(5);
    let outcome = bus.transact(BusTransaction::BusRd, &addr(0x40), 0, &mut peers, &mut memory);

    assert_eq!(outcome.start, 5);
    assert_eq!(bus.busy_until(), 13);
    assert!(!outcome.provided);
    // No peer supplied the block, so the requester pays memory latency.
    assert_eq!(outcome.latency, 100);
    assert_eq!(bus.traffic_bytes(), 16);
    assert_eq!(bus.invalidations(), 0);
}

#[test]
fn transactions_serialize_back_to_back() {
    let mut bus = bus();
    let mut memory = MainMemory::new(16);
    let mut peers: Vec<&mut Cache> = Vec::new();

    bus.set_cycle(5);
    bus.transact(BusTransaction::BusRd, &addr(0x40), 0, &mut peers, &mut memory);
    let second = bus.transact(BusTransaction::BusRd, &addr(0x80), 1, &mut peers, &mut memory);

    // The second transaction waits for the bus to free up.
    assert_eq!(second.start, 13);
    assert_eq!(bus.busy_until(), 21);
}

#[test]
fn upgrade_counts_one_invalidation_even_without_sharers() {
    let mut bus = bus();
    let mut memory = MainMemory::new(16);
    let mut peers: Vec<&mut Cache> = Vec::new();

    bus.set_cycle(1);
    let outcome = bus.transact(BusTransaction::BusUpgr, &addr(0x40), 0, &mut peers, &mut memory);

    assert_eq!(bus.invalidations(), 1);
    assert_eq!(bus.traffic_bytes(), 0);
    assert_eq!(bus.busy_until(), 3);
    assert_eq!(outcome.latency, 0);
}

#[test]
fn invalidate_packet_accounting() {
    let mut bus = bus();
    let mut memory = MainMemory::new(16);
    let mut peers: Vec<&mut Cache> = Vec::new();

    bus.set_cycle(1);
    bus.transact(
        BusTransaction::Invalidate,
        &addr(0x40),
        0,
        &mut peers,
        &mut memory,
    );

    assert_eq!(bus.invalidations(), 1);
    assert_eq!(bus.traffic_bytes(), 0);
    assert_eq!(bus.busy_until(), 3);
}

#[test]
fn flush_moves_a_block_at_memory_latency() {
    let mut bus = bus();
    let mut memory = MainMemory::new(16);
    let mut peers: Vec<&mut Cache> = Vec::new();

    bus.set_cycle(1);
    let outcome = bus.transact(BusTransaction::Flush, &addr(0x40), 0, &mut peers, &mut memory);

    assert_eq!(bus.traffic_bytes(), 16);
    assert_eq!(bus.busy_until(), 101);
    assert_eq!(outcome.latency, 100);
}

#[test]
fn read_exclusive_counts_every_copy_it_kills() {
    let mut memory = MainMemory::new(16);
    let mut first = cache_with_shared(1, 0x40, &mut memory);
    let mut second = cache_with_shared(2, 0x40, &mut memory);
    let mut bus = bus();

    bus.set_cycle(1);
    let mut peers: Vec<&mut Cache> = vec![&mut first, &mut second];
    let outcome = bus.transact(BusTransaction::BusRdX, &addr(0x40), 0, &mut peers, &mut memory);

    // Shared copies are killed but do not supply data on a read-exclusive.
    assert!(!outcome.provided);
    assert_eq!(bus.invalidations(), 2);
    assert_eq!(first.state_of(&addr(0x40)), MesiState::Invalid);
    assert_eq!(second.state_of(&addr(0x40)), MesiState::Invalid);
}

#[test]
fn first_provider_in_core_order_wins() {
    let mut memory = MainMemory::new(16);
    let mut first = cache_with_shared(1, 0x40, &mut memory);
    let mut second = cache_with_shared(2, 0x40, &mut memory);
    let mut bus = bus();

    bus.set_cycle(1);
    let mut peers: Vec<&mut Cache> = vec![&mut first, &mut second];
    let outcome = bus.transact(BusTransaction::BusRd, &addr(0x40), 0, &mut peers, &mut memory);

    assert!(outcome.provided);
    assert_eq!(outcome.source, Some(1));
    assert_eq!(outcome.latency, 8);
}

#[test]
fn snooped_writeback_extends_the_hold() {
    let mut memory = MainMemory::new(16);
    let mut holder = Cache::new(1, &params());
    {
        let mut bus = bus();
        let mut no_peers: Vec<&mut Cache> = Vec::new();
        holder.set_cycle(1);
        holder.write(&addr(0x40), &mut bus, &mut no_peers, &mut memory);
        holder.set_cycle(200);
        assert!(holder.check_miss_resolved());
    }

    let mut bus = bus();
    bus.set_cycle(1);
    let writes_before = memory.write_count();
    let mut peers: Vec<&mut Cache> = vec![&mut holder];
    let outcome = bus.transact(BusTransaction::BusRd, &addr(0x40), 0, &mut peers, &mut memory);

    // The Modified holder flushed inline: 100 cycles ahead of the 8-cycle
    // transfer, charged to the bus timeline but not to the requester.
    assert_eq!(bus.busy_until(), 1 + 100 + 8);
    assert_eq!(outcome.latency, 8);
    assert_eq!(memory.write_count(), writes_before + 1);
}
