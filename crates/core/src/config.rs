//! Configuration types for the simulator.
//!
//! This module defines the user-facing configuration surface. It provides:
//! 1. **Cache configuration:** Size, block size, associativity, replacement, and write policy, with the 5-token config-file parser.
//! 2. **ISA mode:** The admitted instruction subset (RV32I, RV32IM, RV64I, RV64IM).
//! 3. **Defaults:** Baseline constants used when a field is not overridden.
//!
//! Config structs derive `serde::Deserialize` so embedders can supply them
//! from JSON; the canonical external format is the plain 5-token file.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use log::warn;
use serde::Deserialize;

use crate::common::bits;
use crate::common::error::ConfigError;

/// Default configuration constants.
mod defaults {
    /// Default cache size in bytes (4 KiB).
    pub const CACHE_SIZE: u32 = 4096;

    /// Default cache block size in bytes.
    pub const BLOCK_SIZE: u32 = 64;

    /// Default associativity (1 = direct-mapped).
    pub const ASSOCIATIVITY: u32 = 1;

    /// Largest accepted cache size (1 MiB).
    pub const MAX_CACHE_SIZE: u32 = 1024 * 1024;

    /// Largest accepted associativity.
    pub const MAX_ASSOCIATIVITY: u32 = 16;
}

/// Cache replacement policy.
///
/// Decides which block to evict when a set is full and a new block must be
/// brought in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum ReplacementPolicy {
    /// Evict the block that entered the set earliest.
    Fifo,
    /// Evict the block used least recently.
    #[default]
    Lru,
    /// Evict a uniformly random block (seedable per cache).
    Random,
}

impl FromStr for ReplacementPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FIFO" => Ok(Self::Fifo),
            "LRU" => Ok(Self::Lru),
            "RANDOM" => Ok(Self::Random),
            other => Err(ConfigError::UnknownReplacementPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for ReplacementPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fifo => "FIFO",
            Self::Lru => "LRU",
            Self::Random => "RANDOM",
        })
    }
}

/// Cache write policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum WritePolicy {
    /// Write-back: memory is updated only when a dirty block is evicted.
    #[default]
    WriteBack,
    /// Write-through: memory is updated on every cache write.
    WriteThrough,
}

impl FromStr for WritePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WB" => Ok(Self::WriteBack),
            "WT" => Ok(Self::WriteThrough),
            other => Err(ConfigError::UnknownWritePolicy(other.to_string())),
        }
    }
}

impl fmt::Display for WritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::WriteBack => "WB",
            Self::WriteThrough => "WT",
        })
    }
}

/// Admitted instruction subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum IsaMode {
    /// Base 32-bit integer instructions.
    #[default]
    Rv32i,
    /// RV32I plus the multiply/divide extension.
    Rv32im,
    /// 64-bit base integer set (includes M, as the original table does).
    Rv64i,
    /// RV64I plus the 64-bit multiply/divide word operations.
    Rv64im,
}

impl IsaMode {
    /// Returns whether this mode admits the multiply/divide extension.
    pub fn has_muldiv(self) -> bool {
        !matches!(self, Self::Rv32i)
    }

    /// Returns whether this mode admits the 64-bit word operations.
    pub fn is_rv64(self) -> bool {
        matches!(self, Self::Rv64i | Self::Rv64im)
    }
}

impl FromStr for IsaMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RV32I" => Ok(Self::Rv32i),
            "RV32IM" => Ok(Self::Rv32im),
            "RV64I" => Ok(Self::Rv64i),
            "RV64IM" => Ok(Self::Rv64im),
            other => Err(ConfigError::UnknownIsaMode(other.to_string())),
        }
    }
}

impl fmt::Display for IsaMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Rv32i => "RV32I",
            Self::Rv32im => "RV32IM",
            Self::Rv64i => "RV64I",
            Self::Rv64im => "RV64IM",
        })
    }
}

/// Cache geometry and policy configuration.
///
/// Invariant once validated: `num_sets() * ways() * block_size == cache_size`,
/// and the offset/index bit widths sum to at most 32.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CacheConfig {
    /// Total cache size in bytes (power of two, at most 1 MiB).
    pub cache_size: u32,
    /// Block (line) size in bytes (power of two).
    pub block_size: u32,
    /// Ways per set: 0 = fully associative, 1 = direct-mapped,
    /// otherwise a power of two <= 16 dividing the block count.
    pub associativity: u32,
    /// Replacement policy for full sets.
    pub replacement: ReplacementPolicy,
    /// Write-hit/write-miss policy.
    pub write: WritePolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_size: defaults::CACHE_SIZE,
            block_size: defaults::BLOCK_SIZE,
            associativity: defaults::ASSOCIATIVITY,
            replacement: ReplacementPolicy::default(),
            write: WritePolicy::default(),
        }
    }
}

impl CacheConfig {
    /// Validates a configuration, normalising the cache size.
    ///
    /// A non-power-of-two cache size is rounded down to the nearest power of
    /// two with a warning; every other violation is an error.
    ///
    /// # Arguments
    ///
    /// * `cache_size` - Total size in bytes.
    /// * `block_size` - Block size in bytes.
    /// * `associativity` - Ways per set (0 = fully associative).
    /// * `replacement` - Replacement policy.
    /// * `write` - Write policy.
    ///
    /// # Returns
    ///
    /// The validated configuration, or the first constraint violation.
    pub fn validated(
        cache_size: u32,
        block_size: u32,
        associativity: u32,
        replacement: ReplacementPolicy,
        write: WritePolicy,
    ) -> Result<Self, ConfigError> {
        if cache_size == 0 || cache_size > defaults::MAX_CACHE_SIZE {
            return Err(ConfigError::SizeOutOfRange(cache_size));
        }

        let cache_size = if bits::is_pow2(cache_size) {
            cache_size
        } else {
            let rounded = bits::floor_pow2(cache_size);
            warn!(
                "cache size {} is not a power of two, using {} instead",
                cache_size, rounded
            );
            rounded
        };

        if block_size == 0 || !bits::is_pow2(block_size) || block_size > cache_size {
            return Err(ConfigError::BadBlockSize(block_size));
        }

        let num_blocks = cache_size / block_size;
        let assoc_ok = match associativity {
            0 | 1 => true,
            a => {
                bits::is_pow2(a) && a <= defaults::MAX_ASSOCIATIVITY && num_blocks % a == 0
            }
        };
        if !assoc_ok {
            return Err(ConfigError::BadAssociativity(associativity));
        }

        Ok(Self {
            cache_size,
            block_size,
            associativity,
            replacement,
            write,
        })
    }

    /// Parses the 5-token whitespace-separated config format.
    ///
    /// Token order: cache size, block size, associativity, replacement policy
    /// (`FIFO|LRU|RANDOM`), write policy (`WB|WT`).
    pub fn from_tokens(text: &str) -> Result<Self, ConfigError> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.len() != 5 {
            return Err(ConfigError::FieldCount(tokens.len()));
        }

        let number = |tok: &str| -> Result<u32, ConfigError> {
            tok.parse().map_err(|_| ConfigError::BadNumber(tok.to_string()))
        };

        Self::validated(
            number(tokens[0])?,
            number(tokens[1])?,
            number(tokens[2])?,
            tokens[3].parse()?,
            tokens[4].parse()?,
        )
    }

    /// Reads and parses a config file in the 5-token format.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_tokens(&text)
    }

    /// Total number of blocks in the cache.
    pub fn num_blocks(&self) -> u32 {
        self.cache_size / self.block_size
    }

    /// Number of sets implied by the associativity.
    pub fn num_sets(&self) -> u32 {
        match self.associativity {
            0 => 1,
            1 => self.num_blocks(),
            a => self.num_blocks() / a,
        }
    }

    /// Ways per set implied by the associativity.
    pub fn ways(&self) -> u32 {
        match self.associativity {
            0 => self.num_blocks(),
            a => a,
        }
    }

    /// Width of the block-offset field of an address, in bits.
    pub fn offset_bits(&self) -> u32 {
        bits::log2(self.block_size)
    }

    /// Width of the set-index field of an address, in bits (0 when fully
    /// associative).
    pub fn index_bits(&self) -> u32 {
        if self.associativity == 0 {
            0
        } else {
            bits::log2(self.num_sets())
        }
    }
}

impl fmt::Display for CacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cache Size: {}", self.cache_size)?;
        writeln!(f, "Block Size: {}", self.block_size)?;
        writeln!(f, "Associativity: {}", self.associativity)?;
        writeln!(f, "Replacement Policy: {}", self.replacement)?;
        writeln!(f, "Write Back Policy: {}", self.write)
    }
}
