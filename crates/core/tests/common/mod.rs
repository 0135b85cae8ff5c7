//! Shared test infrastructure.
//!
//! Builds simulators from in-memory trace text (via `Cursor`) or from real
//! trace files in a temp directory (via `tempfile`), so tests can exercise
//! both the engine and the file-facing entry point.

use std::fs;
use std::io::Cursor;

use l1sim_core::common::Address;
use l1sim_core::config::{CacheParams, Config};
use l1sim_core::sim::trace::TraceStream;
use l1sim_core::Simulator;
use tempfile::TempDir;

/// Initializes test logging once; later calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A config with the given geometry and default timing.
pub fn config(set_bits: u32, associativity: usize, block_bits: u32) -> Config {
    Config {
        cache: CacheParams {
            set_bits,
            associativity,
            block_bits,
        },
        ..Config::default()
    }
}

/// The standard small test geometry: 4 sets, 2-way, 16-byte blocks.
///
/// With these parameters a block transfer holds the bus for
/// `2 * 16 / 4 = 8` cycles and a memory fetch costs 100.
pub fn small_config() -> Config {
    config(2, 2, 4)
}

/// Wraps trace text as a core's trace stream.
pub fn stream(text: &str) -> TraceStream {
    TraceStream::from_reader(Cursor::new(text.to_owned()), "test")
}

/// Builds a simulator over one in-memory trace per core.
pub fn sim(config: Config, traces: &[&str]) -> Simulator {
    init_logging();
    Simulator::new(config, traces.iter().map(|text| stream(text)).collect())
}

/// Writes real trace files and opens the simulator through `Simulator::open`.
///
/// The returned `TempDir` keeps the files alive for the simulator's lifetime.
pub fn sim_from_files(config: Config, app: &str, traces: &[&str]) -> (TempDir, Simulator) {
    init_logging();
    let dir = tempfile::tempdir().expect("create temp dir");
    for (core, text) in traces.iter().enumerate() {
        let path = dir.path().join(format!("{}_proc{}.trace", app, core));
        fs::write(path, text).expect("write trace file");
    }
    let prefix = dir.path().join(app);
    let sim = Simulator::open(config, prefix.to_str().expect("utf-8 path"))
        .expect("open simulator from trace files");
    (dir, sim)
}

/// Runs a simulation that is expected to drain its traces.
pub fn run(sim: &mut Simulator) {
    sim.run().expect("simulation should finish before the safeguard bound");
}

/// Decodes `raw` under the config's geometry.
pub fn addr(raw: u32, config: &Config) -> Address {
    Address::new(raw, config.cache.set_bits, config.cache.block_bits)
}
