//! Address decomposition tests.
//!
//! Geometry used throughout: s = 2 set bits, b = 4 block bits, so
//! tag = addr >> 6, index = (addr >> 4) & 3, offset = addr & 15.

use l1sim_core::common::addr::{parse_hex, Address};

#[test]
fn splits_tag_index_offset() {
    let addr = Address::new(0x0000_1234, 2, 4);
    assert_eq!(addr.tag(), 0x1234 >> 6);
    assert_eq!(addr.index(), ((0x1234 >> 4) & 3) as usize);
    assert_eq!(addr.offset(), 0x4);
    assert_eq!(addr.block_address(), 0x1230);
}

#[test]
fn spec_example_tag() {
    // 0x1000 under (s=2, b=4): set 0, tag 0x40.
    let addr = Address::new(0x0000_1000, 2, 4);
    assert_eq!(addr.index(), 0);
    assert_eq!(addr.tag(), 0x40);
}

#[test]
fn word_offset_aligns_down() {
    let addr = Address::new(0x0000_100e, 2, 4);
    assert_eq!(addr.offset(), 0xe);
    assert_eq!(addr.word_offset(), 0xc);
}

#[test]
fn full_width_geometry_has_empty_tag() {
    // s + b == 32 is allowed; every address decodes to tag 0.
    let addr = Address::new(0xffff_ffff, 28, 4);
    assert_eq!(addr.tag(), 0);
    assert_eq!(addr.index(), 0x0fff_ffff);
}

#[test]
fn from_parts_reconstructs_block_address() {
    let addr = Address::new(0x0000_2340, 2, 4);
    let rebuilt = Address::from_parts(addr.tag(), addr.index(), 2, 4);
    assert_eq!(rebuilt.block_address(), addr.block_address());
    assert_eq!(rebuilt.offset(), 0);
}

#[test]
fn displays_as_padded_hex() {
    let addr = Address::new(0x1a2b, 2, 4);
    assert_eq!(addr.to_string(), "0x00001a2b");
}

#[test]
fn parse_hex_accepts_optional_prefix() {
    assert_eq!(parse_hex("1000"), Ok(0x1000));
    assert_eq!(parse_hex("0x1000"), Ok(0x1000));
    assert_eq!(parse_hex("0X1000"), Ok(0x1000));
    assert_eq!(parse_hex("0xDeadBeef"), Ok(0xdead_beef));
}

#[test]
fn parse_hex_rejects_garbage() {
    assert!(parse_hex("").is_err());
    assert!(parse_hex("0x").is_err());
    assert!(parse_hex("xyz").is_err());
    assert!(parse_hex("0x1_0").is_err());
    // Larger than 32 bits.
    assert!(parse_hex("1_0000_0000").is_err());
    assert!(parse_hex("100000000").is_err());
}
