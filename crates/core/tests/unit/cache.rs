//! Cache unit tests.
//!
//! The standard fixture is a 64-byte cache with 16-byte blocks, 2-way
//! set-associative (2 sets):
//!   - set index = (addr >> 4) & 1
//!   - tag       = addr >> 5
//! Addresses 0x00, 0x40, 0x80 therefore all map to set 0 with tags 0, 2, 4.

use rvlab_core::config::{ReplacementPolicy, WritePolicy};
use rvlab_core::{Cache, MemSize, Memory};

use crate::common::{cache_config, two_set_two_way, SharedBuf};

// ══════════════════════════════════════════════════════════
// 1. Hit/miss basics
// ══════════════════════════════════════════════════════════

#[test]
fn first_access_misses_second_hits() {
    let mut mem = Memory::new();
    let mut cache = Cache::new(two_set_two_way(ReplacementPolicy::Lru, WritePolicy::WriteBack));

    cache.read(&mut mem, 0x00, MemSize::Word, false);
    cache.read(&mut mem, 0x00, MemSize::Word, false);

    let stats = cache.stats();
    assert_eq!((stats.accesses, stats.hits, stats.misses), (2, 1, 1));
}

#[test]
fn same_block_different_offset_hits() {
    let mut mem = Memory::new();
    let mut cache = Cache::new(two_set_two_way(ReplacementPolicy::Lru, WritePolicy::WriteBack));

    cache.read(&mut mem, 0x00, MemSize::Byte, false);
    cache.read(&mut mem, 0x0C, MemSize::Word, false);

    assert_eq!(cache.stats().hits, 1);
}

#[test]
fn reads_see_memory_contents_after_allocation() {
    let mut mem = Memory::new();
    mem.write(0x20, MemSize::Word, 0x1234_5678);

    let mut cache = Cache::new(two_set_two_way(ReplacementPolicy::Lru, WritePolicy::WriteBack));
    assert_eq!(cache.read(&mut mem, 0x20, MemSize::Word, false), 0x1234_5678);
    // Served from the cache this time.
    assert_eq!(cache.read(&mut mem, 0x20, MemSize::Word, false), 0x1234_5678);
    assert_eq!(cache.stats().hits, 1);
}

#[test]
fn sub_word_reads_sign_extend_through_the_cache() {
    let mut mem = Memory::new();
    mem.write(0x10, MemSize::Byte, 0x80);

    let mut cache = Cache::new(two_set_two_way(ReplacementPolicy::Lru, WritePolicy::WriteBack));
    assert_eq!(cache.read(&mut mem, 0x10, MemSize::Byte, false), -128);
    assert_eq!(cache.read(&mut mem, 0x10, MemSize::Byte, true), 128);
}

// ══════════════════════════════════════════════════════════
// 2. Write-back eviction (spec scenario)
// ══════════════════════════════════════════════════════════

/// W 0x00, W 0x40, W 0x80 all land in set 0 of a 2-way cache: the third
/// write evicts the dirty first block, which must be written back.
#[test]
fn dirty_victim_is_written_back_under_wb() {
    let mut mem = Memory::new();
    let mut cache = Cache::new(two_set_two_way(ReplacementPolicy::Lru, WritePolicy::WriteBack));

    cache.write(&mut mem, 0x00, MemSize::Byte, 1);
    cache.write(&mut mem, 0x40, MemSize::Byte, 2);
    cache.write(&mut mem, 0x80, MemSize::Byte, 3);

    let stats = cache.stats();
    assert_eq!((stats.accesses, stats.hits, stats.misses), (3, 0, 3));

    // The first block was dirty and LRU; its data reached memory.
    assert_eq!(mem.byte_at(0x00), 1);
    // The second write is still only in the cache.
    assert_eq!(mem.byte_at(0x40), 0);

    assert!(!cache.contains(0x00));
    assert!(cache.contains(0x40));
    assert!(cache.contains(0x80));
}

#[test]
fn clean_victim_is_not_written_back() {
    let mut mem = Memory::new();
    mem.write(0x00, MemSize::Byte, 9);
    let mut cache = Cache::new(two_set_two_way(ReplacementPolicy::Lru, WritePolicy::WriteBack));

    cache.read(&mut mem, 0x00, MemSize::Byte, false);
    cache.read(&mut mem, 0x40, MemSize::Byte, false);
    cache.read(&mut mem, 0x80, MemSize::Byte, false);

    // Eviction of the clean block must not disturb memory.
    assert_eq!(mem.byte_at(0x00), 9);
    assert!(!cache.contains(0x00));
}

#[test]
fn written_back_data_is_visible_to_later_reads() {
    let mut mem = Memory::new();
    let mut cache = Cache::new(two_set_two_way(ReplacementPolicy::Lru, WritePolicy::WriteBack));

    cache.write(&mut mem, 0x00, MemSize::Word, 0xAABB_CCDD);
    cache.write(&mut mem, 0x40, MemSize::Byte, 2);
    cache.write(&mut mem, 0x80, MemSize::Byte, 3); // evicts 0x00

    // Reading 0x00 again re-allocates from memory, which now holds the
    // written-back word.
    assert_eq!(cache.read(&mut mem, 0x00, MemSize::Word, false) as u32, 0xAABB_CCDD);
}

// ══════════════════════════════════════════════════════════
// 3. Write-through (spec scenario)
// ══════════════════════════════════════════════════════════

/// WT write miss does not allocate; the following read miss does.
#[test]
fn wt_write_miss_does_not_allocate() {
    let mut mem = Memory::new();
    let mut cache = Cache::new(two_set_two_way(ReplacementPolicy::Lru, WritePolicy::WriteThrough));

    cache.write(&mut mem, 0x00, MemSize::Byte, 1);
    assert_eq!(mem.byte_at(0x00), 1);
    assert!(!cache.contains(0x00));

    assert_eq!(cache.read(&mut mem, 0x00, MemSize::Byte, false), 1);
    assert!(cache.contains(0x00));

    let stats = cache.stats();
    assert_eq!((stats.hits, stats.misses), (0, 2));

    // The allocated block is clean under WT.
    let mut dump = Vec::new();
    cache.dump(&mut dump).unwrap();
    let dump = String::from_utf8(dump).unwrap();
    assert!(dump.contains("Clean"), "dump: {}", dump);
    assert!(!dump.contains("Dirty"), "dump: {}", dump);
}

#[test]
fn wt_write_hit_updates_block_and_memory() {
    let mut mem = Memory::new();
    let mut cache = Cache::new(two_set_two_way(ReplacementPolicy::Lru, WritePolicy::WriteThrough));

    cache.read(&mut mem, 0x00, MemSize::Word, false); // allocate
    cache.write(&mut mem, 0x00, MemSize::Word, 0x5555_AAAA); // write hit

    assert_eq!(mem.read(0x00, MemSize::Word, false) as u32, 0x5555_AAAA);
    assert_eq!(cache.read(&mut mem, 0x00, MemSize::Word, false) as u32, 0x5555_AAAA);
    assert_eq!(cache.stats().hits, 2);
}

#[test]
fn wb_write_hit_defers_memory_update() {
    let mut mem = Memory::new();
    let mut cache = Cache::new(two_set_two_way(ReplacementPolicy::Lru, WritePolicy::WriteBack));

    cache.read(&mut mem, 0x00, MemSize::Word, false);
    cache.write(&mut mem, 0x00, MemSize::Word, 0x5555_AAAA);

    // Memory still holds the old (zero) contents.
    assert_eq!(mem.read(0x00, MemSize::Word, false), 0);
    // The cache serves the new value.
    assert_eq!(cache.read(&mut mem, 0x00, MemSize::Word, false) as u32, 0x5555_AAAA);
}

// ══════════════════════════════════════════════════════════
// 4. Replacement policies
// ══════════════════════════════════════════════════════════

#[test]
fn lru_evicts_least_recently_used() {
    let mut mem = Memory::new();
    let mut cache = Cache::new(two_set_two_way(ReplacementPolicy::Lru, WritePolicy::WriteBack));

    cache.read(&mut mem, 0x00, MemSize::Byte, false);
    cache.read(&mut mem, 0x40, MemSize::Byte, false);
    cache.read(&mut mem, 0x00, MemSize::Byte, false); // refresh 0x00
    cache.read(&mut mem, 0x80, MemSize::Byte, false); // evicts 0x40

    assert!(cache.contains(0x00));
    assert!(!cache.contains(0x40));
    assert!(cache.contains(0x80));
}

#[test]
fn fifo_evicts_oldest_insertion_despite_recent_use() {
    let mut mem = Memory::new();
    let mut cache = Cache::new(two_set_two_way(ReplacementPolicy::Fifo, WritePolicy::WriteBack));

    cache.read(&mut mem, 0x00, MemSize::Byte, false);
    cache.read(&mut mem, 0x40, MemSize::Byte, false);
    cache.read(&mut mem, 0x00, MemSize::Byte, false); // hit, but FIFO ignores use
    cache.read(&mut mem, 0x80, MemSize::Byte, false); // evicts 0x00

    assert!(!cache.contains(0x00));
    assert!(cache.contains(0x40));
    assert!(cache.contains(0x80));
}

#[test]
fn random_replacement_is_reproducible_with_a_seed() {
    let run = |seed: u64| {
        let mut mem = Memory::new();
        let mut cache =
            Cache::new(two_set_two_way(ReplacementPolicy::Random, WritePolicy::WriteBack));
        cache.set_seed(seed);
        cache.read(&mut mem, 0x00, MemSize::Byte, false);
        cache.read(&mut mem, 0x40, MemSize::Byte, false);
        cache.read(&mut mem, 0x80, MemSize::Byte, false);
        (cache.contains(0x00), cache.contains(0x40), cache.contains(0x80))
    };

    assert_eq!(run(7), run(7));
    // Exactly one of the first two survives, and the newcomer is resident.
    let (a, b, c) = run(7);
    assert!(a ^ b);
    assert!(c);
}

// ══════════════════════════════════════════════════════════
// 5. Invalidate and statistics invariants
// ══════════════════════════════════════════════════════════

#[test]
fn invalidate_clears_blocks_and_statistics() {
    let mut mem = Memory::new();
    let mut cache = Cache::new(two_set_two_way(ReplacementPolicy::Lru, WritePolicy::WriteBack));

    cache.write(&mut mem, 0x00, MemSize::Word, 1);
    cache.read(&mut mem, 0x40, MemSize::Word, false);
    cache.invalidate();

    let stats = cache.stats();
    assert_eq!((stats.accesses, stats.hits, stats.misses), (0, 0, 0));
    assert!(!cache.contains(0x00));
    assert!(!cache.contains(0x40));

    let mut dump = Vec::new();
    cache.dump(&mut dump).unwrap();
    assert!(dump.is_empty(), "no valid blocks should remain");
}

#[test]
fn accesses_always_equal_hits_plus_misses() {
    let mut mem = Memory::new();
    let mut cache = Cache::new(two_set_two_way(ReplacementPolicy::Lru, WritePolicy::WriteBack));

    let addrs = [0x00u32, 0x10, 0x40, 0x00, 0x80, 0x10, 0x40, 0xC0, 0x00];
    for (i, &addr) in addrs.iter().enumerate() {
        if i % 2 == 0 {
            cache.read(&mut mem, addr, MemSize::Byte, false);
        } else {
            cache.write(&mut mem, addr, MemSize::Byte, i as u32);
        }
        let stats = cache.stats();
        assert_eq!(stats.accesses, stats.hits + stats.misses);
    }
}

#[test]
fn fully_associative_cache_uses_a_single_set() {
    let mut mem = Memory::new();
    let config = cache_config(64, 16, 0, ReplacementPolicy::Lru, WritePolicy::WriteBack);
    let mut cache = Cache::new(config);

    // Four blocks fit regardless of address bits that would index a set.
    for addr in [0x00u32, 0x10, 0x20, 0x30] {
        cache.read(&mut mem, addr, MemSize::Byte, false);
    }
    for addr in [0x00u32, 0x10, 0x20, 0x30] {
        assert!(cache.contains(addr));
    }

    // A fifth block forces an eviction of the LRU entry.
    cache.read(&mut mem, 0x40, MemSize::Byte, false);
    assert!(!cache.contains(0x00));
    assert!(cache.contains(0x40));
}

// ══════════════════════════════════════════════════════════
// 6. Trace log
// ══════════════════════════════════════════════════════════

#[test]
fn trace_log_records_each_access() {
    let buf = SharedBuf::new();
    let mut mem = Memory::new();
    let mut cache = Cache::new(two_set_two_way(ReplacementPolicy::Lru, WritePolicy::WriteBack));
    cache.set_log_sink(Box::new(buf.clone()));

    cache.write(&mut mem, 0x00, MemSize::Byte, 1); // miss, allocate, dirty
    cache.read(&mut mem, 0x00, MemSize::Byte, false); // hit
    cache.write(&mut mem, 0x40, MemSize::Byte, 2); // miss, same set
    cache.write(&mut mem, 0x80, MemSize::Byte, 3); // evicts dirty 0x00

    let log = buf.contents();
    assert!(log.contains("W: Address: 0x0, Set: 0x0, Tag: 0x0, Dirty, Miss, Replacing block in set using INVALID_BLOCK"), "log:\n{}", log);
    assert!(log.contains("W: Address: 0x0, Set: 0x0, Tag: 0x0, Dirty, Miss, WB Write-back with Allocation"), "log:\n{}", log);
    assert!(log.contains("R: Address: 0x0, Set: 0x0, Tag: 0x0, Dirty, Hit"), "log:\n{}", log);
    assert!(log.contains("Evicting dirty block (WB)"), "log:\n{}", log);
    assert!(log.contains("Miss, Replacing block in set using LRU"), "log:\n{}", log);
}

#[test]
fn wt_trace_logs_the_decoded_tag_on_write_miss() {
    let buf = SharedBuf::new();
    let mut mem = Memory::new();
    let mut cache = Cache::new(two_set_two_way(ReplacementPolicy::Lru, WritePolicy::WriteThrough));
    cache.set_log_sink(Box::new(buf.clone()));

    cache.write(&mut mem, 0x40, MemSize::Byte, 2); // tag 2, set 0

    let log = buf.contents();
    assert!(
        log.contains("W: Address: 0x40, Set: 0x0, Tag: 0x2, Clean, Miss, WT Write-through (No Allocation)"),
        "log:\n{}",
        log
    );
}

#[test]
fn dump_lists_only_valid_blocks_with_set_headers() {
    let mut mem = Memory::new();
    let mut cache = Cache::new(two_set_two_way(ReplacementPolicy::Lru, WritePolicy::WriteBack));

    cache.write(&mut mem, 0x10, MemSize::Byte, 0xAB); // set 1

    let mut out = Vec::new();
    cache.dump(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.starts_with("Set[1]:\n"), "dump:\n{}", text);
    assert!(text.contains("Dirty"), "dump:\n{}", text);
    assert!(text.contains("ab"), "dump:\n{}", text);
    assert!(!text.contains("Set[0]"), "dump:\n{}", text);
}
