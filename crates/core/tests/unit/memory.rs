//! Sparse main memory tests.

use l1sim_core::common::SimError;
use l1sim_core::memory::MainMemory;

#[test]
fn untouched_blocks_read_as_zeroes() {
    let mut memory = MainMemory::new(16);
    let block = memory.read_block(0x1000);
    assert_eq!(block, vec![0u8; 16]);
    assert_eq!(memory.read_count(), 1);
    assert_eq!(memory.write_count(), 0);
}

#[test]
fn written_blocks_read_back() {
    let mut memory = MainMemory::new(16);
    let data: Vec<u8> = (0..16).collect();
    memory.write_block(0x2000, &data).expect("block-sized write");
    assert_eq!(memory.read_block(0x2000), data);
    assert_eq!(memory.write_count(), 1);
}

#[test]
fn overwrites_replace_contents() {
    let mut memory = MainMemory::new(4);
    memory.write_block(0, &[1, 2, 3, 4]).unwrap();
    memory.write_block(0, &[5, 6, 7, 8]).unwrap();
    assert_eq!(memory.read_block(0), vec![5, 6, 7, 8]);
}

#[test]
fn rejects_mismatched_block_size() {
    let mut memory = MainMemory::new(16);
    let err = memory.write_block(0x3000, &[0u8; 3]).unwrap_err();
    assert!(matches!(
        err,
        SimError::InvalidBlockSize {
            expected: 16,
            actual: 3
        }
    ));
    // The rejected write is not counted and not stored.
    assert_eq!(memory.write_count(), 0);
    assert_eq!(memory.read_block(0x3000), vec![0u8; 16]);
}
