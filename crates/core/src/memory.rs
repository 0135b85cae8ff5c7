//! Sparse main memory: a block-addressed byte store.
//!
//! Only blocks that have been written are stored; reads of untouched blocks
//! return zero-filled data. Latency is not modeled here; the bus and the
//! cache timing model own all cycle accounting.

use std::collections::HashMap;

use crate::common::SimError;

/// Block-addressed main memory with read/write counters.
pub struct MainMemory {
    blocks: HashMap<u32, Vec<u8>>,
    block_size: usize,
    reads: u64,
    writes: u64,
}

impl MainMemory {
    /// Creates an empty memory serving blocks of `block_size` bytes.
    pub fn new(block_size: usize) -> Self {
        Self {
            blocks: HashMap::new(),
            block_size,
            reads: 0,
            writes: 0,
        }
    }

    /// Reads the block at `block_addr` (which must be block-aligned).
    ///
    /// Untouched blocks read as zeroes.
    pub fn read_block(&mut self, block_addr: u32) -> Vec<u8> {
        self.reads += 1;
        self.blocks
            .get(&block_addr)
            .cloned()
            .unwrap_or_else(|| vec![0; self.block_size])
    }

    /// Stores a block at `block_addr`, replacing any previous contents.
    ///
    /// Rejects buffers that do not match the configured block size.
    pub fn write_block(&mut self, block_addr: u32, data: &[u8]) -> Result<(), SimError> {
        if data.len() != self.block_size {
            return Err(SimError::InvalidBlockSize {
                expected: self.block_size,
                actual: data.len(),
            });
        }
        self.writes += 1;
        self.blocks.insert(block_addr, data.to_vec());
        Ok(())
    }

    /// Number of block reads served.
    pub fn read_count(&self) -> u64 {
        self.reads
    }

    /// Number of block writes accepted.
    pub fn write_count(&self) -> u64 {
        self.writes
    }
}
