//! Set-associative data-cache model.
//!
//! This module implements the configurable cache that sits between the
//! interpreter's load/store stream and memory. It provides:
//! 1. **Lookup:** Tag match within the set selected by the address decoder.
//! 2. **Replacement:** LRU, FIFO, or seedable-RANDOM victim selection.
//! 3. **Write policies:** Write-back with write-allocate, or write-through
//!    with no-allocate on write misses.
//! 4. **Tracing:** One line per access to an injected sink, plus running
//!    hit/miss statistics.
//!
//! The cache never owns the memory behind it; every access borrows it, so
//! ordering is by construction: write-backs land before the evicting fill
//! reads, and write-through stores land before the access returns.

/// Address field decoding.
pub mod addr;
/// Per-line state.
pub mod block;

use std::fmt;
use std::io::{self, Write};

use crate::config::{CacheConfig, ReplacementPolicy, WritePolicy};
use crate::mem::{MemSize, Memory};

pub use addr::AddressDecoder;
pub use block::CacheBlock;

/// Running access statistics. `accesses == hits + misses` at all times.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Total accesses (reads and writes).
    pub accesses: u64,
    /// Accesses satisfied by a resident block.
    pub hits: u64,
    /// Accesses that went to memory.
    pub misses: u64,
}

impl CacheStats {
    /// Hit rate as a percentage, or `None` before the first access.
    pub fn hit_rate(&self) -> Option<f64> {
        if self.accesses == 0 {
            None
        } else {
            Some(self.hits as f64 / self.accesses as f64 * 100.0)
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "D-cache statistics:   Accesses: {}   Hits: {}   Misses: {}",
            self.accesses, self.hits, self.misses
        )?;
        if let Some(rate) = self.hit_rate() {
            write!(f, "   Hit Rate: {:.2}%", rate)?;
        }
        Ok(())
    }
}

/// Seed value meaning "not seeded"; the default stream is still
/// deterministic, tests override it with [`Cache::set_seed`].
const DEFAULT_RNG_STATE: u64 = 0x9E37_79B9_7F4A_7C15;

/// The set-associative cache.
///
/// Owns its sets and statistics; memory is borrowed per access, with its
/// lifetime guaranteed by the caller (the interpreter owns both).
pub struct Cache {
    config: CacheConfig,
    decoder: AddressDecoder,
    sets: Vec<Vec<CacheBlock>>,
    stats: CacheStats,
    rng_state: u64,
    log: Option<Box<dyn Write>>,
}

impl Cache {
    /// Builds a cache from a validated configuration. All blocks start
    /// invalid.
    pub fn new(config: CacheConfig) -> Self {
        let num_sets = config.num_sets() as usize;
        let ways = config.ways() as usize;
        Self {
            decoder: AddressDecoder::new(&config),
            config,
            sets: vec![vec![CacheBlock::new(); ways]; num_sets],
            stats: CacheStats::default(),
            rng_state: DEFAULT_RNG_STATE,
            log: None,
        }
    }

    /// The configuration this cache was built from.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Current statistics.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Installs the per-access trace sink.
    pub fn set_log_sink(&mut self, sink: Box<dyn Write>) {
        self.log = Some(sink);
    }

    /// Seeds the RANDOM-replacement generator for reproducible runs.
    pub fn set_seed(&mut self, seed: u64) {
        // A zero state would lock the xorshift stream at zero.
        self.rng_state = if seed == 0 { DEFAULT_RNG_STATE } else { seed };
    }

    /// Reads through the cache.
    pub fn read(&mut self, mem: &mut Memory, addr: u32, size: MemSize, unsigned: bool) -> i32 {
        self.access(mem, addr, size, unsigned, false, 0)
    }

    /// Writes through the cache.
    pub fn write(&mut self, mem: &mut Memory, addr: u32, size: MemSize, value: u32) {
        self.access(mem, addr, size, false, true, value);
    }

    /// Performs one access against the cache.
    ///
    /// # Arguments
    ///
    /// * `mem` - The memory behind the cache.
    /// * `addr` - Byte address.
    /// * `size` - Access width.
    /// * `unsigned` - Suppress sign extension on sub-word reads.
    /// * `is_write` - Write access; `value` carries the data.
    /// * `value` - Data for writes, ignored for reads.
    ///
    /// # Returns
    ///
    /// The value read; writes return the address, which callers ignore.
    pub fn access(
        &mut self,
        mem: &mut Memory,
        addr: u32,
        size: MemSize,
        unsigned: bool,
        is_write: bool,
        value: u32,
    ) -> i32 {
        let set_idx = self.decoder.index(addr) as usize;
        let tag = self.decoder.tag(addr);
        self.stats.accesses += 1;

        let hit_way = self.sets[set_idx]
            .iter()
            .position(|b| b.valid && b.tag == tag);

        match hit_way {
            Some(way) => {
                self.stats.hits += 1;
                self.sets[set_idx][way].last_used = self.stats.accesses;
                if is_write {
                    self.write_hit(mem, set_idx, way, addr, size, value)
                } else {
                    let block = &self.sets[set_idx][way];
                    let dirty = block.dirty;
                    let val = block.read(addr, size, unsigned, self.config.block_size);
                    self.log_access('R', addr, set_idx, tag, dirty, "Hit");
                    val
                }
            }
            None => {
                self.stats.misses += 1;
                self.handle_miss(mem, set_idx, tag, addr, size, unsigned, is_write, value)
            }
        }
    }

    /// Write hit: update the block, then either mark dirty (WB) or write
    /// through and stay clean (WT).
    fn write_hit(
        &mut self,
        mem: &mut Memory,
        set_idx: usize,
        way: usize,
        addr: u32,
        size: MemSize,
        value: u32,
    ) -> i32 {
        let block_size = self.config.block_size;
        let write_back = self.config.write == WritePolicy::WriteBack;

        let block = &mut self.sets[set_idx][way];
        block.write(addr, size, value, block_size);
        block.dirty = write_back;
        let (tag, dirty) = (block.tag, block.dirty);

        if !write_back {
            mem.write(addr, size, value);
        }

        let outcome = if write_back { "Hit, WB" } else { "Hit, WT" };
        self.log_access('W', addr, set_idx, tag, dirty, outcome);
        addr as i32
    }

    /// Miss handling: WT write misses bypass the cache entirely; everything
    /// else allocates, then the access completes against the fresh block.
    #[allow(clippy::too_many_arguments)]
    fn handle_miss(
        &mut self,
        mem: &mut Memory,
        set_idx: usize,
        tag: u32,
        addr: u32,
        size: MemSize,
        unsigned: bool,
        is_write: bool,
        value: u32,
    ) -> i32 {
        if is_write && self.config.write == WritePolicy::WriteThrough {
            // No-allocate: the write goes straight to memory.
            mem.write(addr, size, value);
            self.log_access(
                'W',
                addr,
                set_idx,
                tag,
                false,
                "Miss, WT Write-through (No Allocation)",
            );
            return addr as i32;
        }

        let way = self.replace_block(mem, set_idx, tag, addr, is_write);
        let block_size = self.config.block_size;

        if is_write {
            let block = &mut self.sets[set_idx][way];
            block.write(addr, size, value, block_size);
            block.dirty = true;
            self.log_access(
                'W',
                addr,
                set_idx,
                tag,
                true,
                "Miss, WB Write-back with Allocation",
            );
            addr as i32
        } else {
            let block = &self.sets[set_idx][way];
            let dirty = block.dirty;
            let val = block.read(addr, size, unsigned, block_size);
            self.log_access(
                'R',
                addr,
                set_idx,
                tag,
                dirty,
                "Miss, Read Allocated Block (WB or WT)",
            );
            val
        }
    }

    /// Selects and refills a block for `addr`.
    ///
    /// Prefers an invalid block; otherwise evicts by policy, writing a dirty
    /// victim back (WB) before it is lost. The chosen block is then reset
    /// and filled by block-size successive byte reads from the block-aligned
    /// base address.
    fn replace_block(
        &mut self,
        mem: &mut Memory,
        set_idx: usize,
        tag: u32,
        addr: u32,
        is_write: bool,
    ) -> usize {
        let mut policy_name = "INVALID_BLOCK";
        let invalid = self.sets[set_idx].iter().position(|b| !b.valid);

        let way = match invalid {
            Some(way) => way,
            None => {
                let (way, name) = self.select_victim(set_idx);
                policy_name = name;

                let write_back = self.config.write == WritePolicy::WriteBack;
                let (victim_valid, victim_dirty, victim_tag) = {
                    let v = &self.sets[set_idx][way];
                    (v.valid, v.dirty, v.tag)
                };

                if victim_dirty && write_back {
                    let base = self.sets[set_idx][way]
                        .block_address(self.config.index_bits(), self.config.offset_bits());
                    for (i, &byte) in self.sets[set_idx][way].data.iter().enumerate() {
                        mem.write(base.wrapping_add(i as u32), MemSize::Byte, byte as u32);
                    }
                    self.log_access(
                        'W',
                        addr,
                        set_idx,
                        victim_tag,
                        true,
                        "Evicting dirty block (WB)",
                    );
                } else if victim_valid {
                    self.log_access('W', addr, set_idx, victim_tag, false, "Evicting clean block");
                }
                way
            }
        };

        let counter = self.stats.accesses;
        let block_size = self.config.block_size;
        let dirty = is_write && self.config.write == WritePolicy::WriteBack;
        let base = addr & !(block_size - 1);

        {
            let block = &mut self.sets[set_idx][way];
            block.valid = true;
            block.dirty = dirty;
            block.tag = tag;
            block.set_index = set_idx as u32;
            block.last_used = counter;
            block.inserted = counter;
            block.data.clear();
            block.data.resize(block_size as usize, 0);
        }
        for i in 0..block_size {
            let byte = mem.byte_at(base.wrapping_add(i));
            self.sets[set_idx][way].data[i as usize] = byte;
        }

        let op = if is_write { 'W' } else { 'R' };
        let outcome = format!("Miss, Replacing block in set using {}", policy_name);
        self.log_access(op, addr, set_idx, tag, dirty, &outcome);
        way
    }

    /// Picks a victim way from a full set by the configured policy.
    fn select_victim(&mut self, set_idx: usize) -> (usize, &'static str) {
        let set = &self.sets[set_idx];
        match self.config.replacement {
            ReplacementPolicy::Lru => {
                let way = set
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, b)| b.last_used)
                    .map(|(i, _)| i)
                    .unwrap_or(0);
                (way, "LRU")
            }
            ReplacementPolicy::Fifo => {
                let way = set
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, b)| b.inserted)
                    .map(|(i, _)| i)
                    .unwrap_or(0);
                (way, "FIFO")
            }
            ReplacementPolicy::Random => {
                let ways = set.len();
                (self.next_random() as usize % ways, "RANDOM")
            }
        }
    }

    /// Advances the cache-local xorshift64 stream.
    fn next_random(&mut self) -> u64 {
        let mut x = self.rng_state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.rng_state = x;
        x
    }

    /// Writes one trace line: operation, address, set, tag, dirtiness, and
    /// the human-readable outcome.
    fn log_access(&mut self, op: char, addr: u32, set_idx: usize, tag: u32, dirty: bool, outcome: &str) {
        if let Some(sink) = self.log.as_mut() {
            let _ = writeln!(
                sink,
                "{}: Address: {:#x}, Set: {:#x}, Tag: {:#x}, {}, {}",
                op,
                addr,
                set_idx,
                tag,
                if dirty { "Dirty" } else { "Clean" },
                outcome
            );
        }
    }

    /// Invalidates every block and zeroes the statistics; the configuration
    /// is retained.
    pub fn invalidate(&mut self) {
        for set in &mut self.sets {
            for b in set {
                b.invalidate();
            }
        }
        self.stats = CacheStats::default();
    }

    /// Dumps every set that holds at least one valid block.
    pub fn dump<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for (i, set) in self.sets.iter().enumerate() {
            if set.iter().any(|b| b.valid) {
                writeln!(out, "Set[{}]:", i)?;
                for b in set.iter().filter(|b| b.valid) {
                    writeln!(out, "  {}", b)?;
                }
            }
        }
        Ok(())
    }

    /// Returns whether the cache currently holds `addr`.
    pub fn contains(&self, addr: u32) -> bool {
        let set_idx = self.decoder.index(addr) as usize;
        let tag = self.decoder.tag(addr);
        self.sets[set_idx].iter().any(|b| b.valid && b.tag == tag)
    }
}
