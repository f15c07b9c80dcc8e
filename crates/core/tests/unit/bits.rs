//! Bit-utility unit tests.

use rvlab_core::common::bits::{extract, floor_pow2, is_pow2, log2, pack};

#[test]
fn extract_pulls_right_aligned_field() {
    assert_eq!(extract(0b101110, 1, 3), 0b111);
    assert_eq!(extract(0xDEADBEEF, 0, 8), 0xEF);
    assert_eq!(extract(0xDEADBEEF, 28, 4), 0xD);
}

#[test]
fn extract_full_width_is_identity() {
    assert_eq!(extract(0xFFFF_FFFF, 0, 32), 0xFFFF_FFFF);
}

#[test]
fn pack_places_field_and_discards_high_bits() {
    assert_eq!(pack(0b101, 4, 3), 0b1010000);
    assert_eq!(pack(0xFF, 0, 4), 0x0F);
    assert_eq!(pack(1, 31, 1), 0x8000_0000);
}

#[test]
fn pack_then_extract_round_trips() {
    for start in [0u32, 7, 12, 20, 25] {
        let packed = pack(0b10110, start, 5);
        assert_eq!(extract(packed, start, 5), 0b10110);
    }
}

#[test]
fn log2_of_powers_of_two() {
    assert_eq!(log2(1), 0);
    assert_eq!(log2(16), 4);
    assert_eq!(log2(64), 6);
    assert_eq!(log2(1 << 20), 20);
}

#[test]
fn floor_pow2_rounds_down() {
    assert_eq!(floor_pow2(0), 0);
    assert_eq!(floor_pow2(1), 1);
    assert_eq!(floor_pow2(16), 16);
    assert_eq!(floor_pow2(17), 16);
    assert_eq!(floor_pow2(32168), 16384);
}

#[test]
fn is_pow2_accepts_only_positive_powers() {
    assert!(is_pow2(1));
    assert!(is_pow2(4096));
    assert!(!is_pow2(0));
    assert!(!is_pow2(6));
    assert!(!is_pow2(32168));
}
