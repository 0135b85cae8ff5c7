//! Configuration system for the cache coherence simulator.
//!
//! This module defines all configuration structures used to parameterize the
//! simulator. It provides:
//! 1. **Defaults:** Baseline hardware constants (geometry, latencies, safeguard bound).
//! 2. **Structures:** Hierarchical config for cache geometry, bus/memory timing,
//!    and scheduler limits.
//! 3. **Validation:** Geometry checks (`s + b` must fit a 32-bit address).
//!
//! Configuration is normally built by the CLI from its flags; the structures also
//! deserialize from JSON for scripted parameter sweeps.

use serde::Deserialize;

use crate::common::SimError;

/// Default configuration constants for the simulator.
mod defaults {
    /// Number of processor cores (and trace files) in the system.
    pub const NUM_CORES: usize = 4;

    /// Default number of set-index bits (64 sets).
    pub const SET_BITS: u32 = 6;

    /// Default associativity (2-way).
    pub const ASSOCIATIVITY: usize = 2;

    /// Default number of block-offset bits (32-byte blocks).
    pub const BLOCK_BITS: u32 = 5;

    /// Latency of a main-memory block fetch or writeback, in cycles.
    pub const MEM_LATENCY: u64 = 100;

    /// Bus transfer latency per 4-byte word, in cycles.
    ///
    /// A full block transfer holds the bus for `2 * blockSize / 4` cycles.
    pub const WORD_TRANSFER_LATENCY: u64 = 2;

    /// Bus hold time of an upgrade or invalidate packet, in cycles.
    pub const CONTROL_LATENCY: u64 = 2;

    /// Safeguard bound on simulated cycles.
    ///
    /// A run that has not drained its traces by this cycle is aborted with
    /// partial statistics instead of spinning forever.
    pub const MAX_CYCLES: u64 = 10_000_000;
}

/// Root configuration for one simulation run.
///
/// # Examples
///
/// Creating a default configuration:
///
/// ```
/// use l1sim_core::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.cache.num_sets(), 64);
/// assert_eq!(config.cache.block_size(), 32);
/// ```
///
/// Deserializing from JSON (parameter-sweep usage):
///
/// ```
/// use l1sim_core::config::Config;
///
/// let json = r#"{
///     "cache": { "set_bits": 2, "associativity": 2, "block_bits": 4 },
///     "timing": { "mem_latency": 100 },
///     "sim": { "max_cycles": 50000 }
/// }"#;
///
/// let config: Config = serde_json::from_str(json).unwrap();
/// assert_eq!(config.cache.num_sets(), 4);
/// assert_eq!(config.cache.block_size(), 16);
/// assert_eq!(config.timing.mem_latency, 100);
/// assert_eq!(config.sim.num_cores, 4);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Per-core L1 cache geometry.
    #[serde(default)]
    pub cache: CacheParams,
    /// Bus and memory latency model.
    #[serde(default)]
    pub timing: TimingConfig,
    /// Scheduler parameters.
    #[serde(default)]
    pub sim: SimParams,
}

impl Config {
    /// Checks that the configuration describes a usable system.
    ///
    /// All three geometry parameters must be positive and the tag field must
    /// not underflow: `s + b` may not exceed the 32-bit address width.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.cache.set_bits == 0 {
            return Err(SimError::InvalidConfig(
                "set-index bits (-s) must be positive".into(),
            ));
        }
        if self.cache.associativity == 0 {
            return Err(SimError::InvalidConfig(
                "associativity (-E) must be positive".into(),
            ));
        }
        if self.cache.block_bits == 0 {
            return Err(SimError::InvalidConfig(
                "block bits (-b) must be positive".into(),
            ));
        }
        if self.cache.set_bits + self.cache.block_bits > 32 {
            return Err(SimError::InvalidConfig(format!(
                "s + b = {} exceeds the 32-bit address width",
                self.cache.set_bits + self.cache.block_bits
            )));
        }
        if self.sim.num_cores == 0 {
            return Err(SimError::InvalidConfig("core count must be positive".into()));
        }
        Ok(())
    }
}

/// L1 cache geometry: `2^s` sets of `E` lines of `2^b` bytes.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheParams {
    /// Number of set-index bits (s).
    #[serde(default = "CacheParams::default_set_bits")]
    pub set_bits: u32,

    /// Number of lines per set (E).
    #[serde(default = "CacheParams::default_associativity")]
    pub associativity: usize,

    /// Number of block-offset bits (b).
    #[serde(default = "CacheParams::default_block_bits")]
    pub block_bits: u32,
}

impl CacheParams {
    /// Number of sets in the cache (`2^s`).
    #[inline]
    pub fn num_sets(&self) -> usize {
        1usize << self.set_bits
    }

    /// Block size in bytes (`2^b`).
    #[inline]
    pub fn block_size(&self) -> usize {
        1usize << self.block_bits
    }

    fn default_set_bits() -> u32 {
        defaults::SET_BITS
    }

    fn default_associativity() -> usize {
        defaults::ASSOCIATIVITY
    }

    fn default_block_bits() -> u32 {
        defaults::BLOCK_BITS
    }
}

impl Default for CacheParams {
    fn default() -> Self {
        Self {
            set_bits: defaults::SET_BITS,
            associativity: defaults::ASSOCIATIVITY,
            block_bits: defaults::BLOCK_BITS,
        }
    }
}

/// Bus and memory latency parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct TimingConfig {
    /// Main-memory fetch/writeback latency in cycles.
    #[serde(default = "TimingConfig::default_mem_latency")]
    pub mem_latency: u64,

    /// Bus transfer latency per 4-byte word, in cycles.
    #[serde(default = "TimingConfig::default_word_transfer")]
    pub word_transfer_latency: u64,

    /// Bus hold time of an upgrade/invalidate packet, in cycles.
    #[serde(default = "TimingConfig::default_control_latency")]
    pub control_latency: u64,
}

impl TimingConfig {
    fn default_mem_latency() -> u64 {
        defaults::MEM_LATENCY
    }

    fn default_word_transfer() -> u64 {
        defaults::WORD_TRANSFER_LATENCY
    }

    fn default_control_latency() -> u64 {
        defaults::CONTROL_LATENCY
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            mem_latency: defaults::MEM_LATENCY,
            word_transfer_latency: defaults::WORD_TRANSFER_LATENCY,
            control_latency: defaults::CONTROL_LATENCY,
        }
    }
}

/// Scheduler parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct SimParams {
    /// Number of cores; each core consumes `<app>_procN.trace`.
    #[serde(default = "SimParams::default_num_cores")]
    pub num_cores: usize,

    /// Safeguard bound on simulated cycles.
    #[serde(default = "SimParams::default_max_cycles")]
    pub max_cycles: u64,
}

impl SimParams {
    fn default_num_cores() -> usize {
        defaults::NUM_CORES
    }

    fn default_max_cycles() -> u64 {
        defaults::MAX_CYCLES
    }
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            num_cores: defaults::NUM_CORES,
            max_cycles: defaults::MAX_CYCLES,
        }
    }
}
