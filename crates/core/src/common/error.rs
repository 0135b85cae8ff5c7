//! Simulator error definitions.
//!
//! This module defines the error type reported by the library. It provides:
//! 1. **Fatal Errors:** Invalid configuration and unopenable trace files abort the run.
//! 2. **Recoverable Conditions:** Block-size and set-index violations are logged by
//!    their call sites and the offending operation is skipped.
//! 3. **Integration:** Standard `Display` and `Error` impls for system-level reporting.

use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors surfaced by the simulation engine.
#[derive(Debug)]
pub enum SimError {
    /// The cache geometry or simulation parameters are unusable.
    ///
    /// Raised for non-positive `s`/`E`/`b`, a missing trace prefix, or a
    /// geometry where `s + b` exceeds the 32-bit address width.
    InvalidConfig(String),

    /// A per-core trace file could not be opened.
    TraceOpen {
        /// Path of the trace file that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A memory write supplied a block of the wrong size.
    ///
    /// Internal invariant violation; the write is dropped.
    InvalidBlockSize {
        /// Block size the memory was configured with.
        expected: usize,
        /// Size of the buffer the caller supplied.
        actual: usize,
    },

    /// An access decoded to a set index beyond the cache.
    ///
    /// Internal invariant violation; the access is refused.
    SetIndexOutOfRange {
        /// The offending set index.
        index: usize,
        /// Number of sets in the cache.
        sets: usize,
    },

    /// The scheduler hit its safeguard cycle bound before the traces drained.
    SafeguardTripped {
        /// Cycle at which the bound was hit.
        cycle: u64,
    },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::InvalidConfig(reason) => write!(f, "invalid configuration: {}", reason),
            SimError::TraceOpen { path, source } => {
                write!(f, "cannot open trace file {}: {}", path.display(), source)
            }
            SimError::InvalidBlockSize { expected, actual } => write!(
                f,
                "memory write of {} bytes does not match the {}-byte block size",
                actual, expected
            ),
            SimError::SetIndexOutOfRange { index, sets } => {
                write!(f, "set index {} out of range (cache has {} sets)", index, sets)
            }
            SimError::SafeguardTripped { cycle } => write!(
                f,
                "safeguard cycle bound reached at cycle {}; reporting partial statistics",
                cycle
            ),
        }
    }
}

impl Error for SimError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SimError::TraceOpen { source, .. } => Some(source),
            _ => None,
        }
    }
}
