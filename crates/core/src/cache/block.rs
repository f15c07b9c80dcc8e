//! Cache block (line) state.
//!
//! A block carries its validity and dirtiness, the tag it currently holds,
//! the timestamps the replacement policies key on, and the block data
//! itself. Invariants: a valid block's data vector is exactly one block
//! long, and only valid blocks can be dirty.

use std::fmt;

use crate::mem::MemSize;

/// One cache line.
#[derive(Debug, Default, Clone)]
pub struct CacheBlock {
    /// Whether the block holds live data.
    pub valid: bool,
    /// Whether the block has been written but not yet written back.
    pub dirty: bool,
    /// Tag of the held address range.
    pub tag: u32,
    /// Access-counter value at last use (LRU key).
    pub last_used: u64,
    /// Access-counter value at installation (FIFO key).
    pub inserted: u64,
    /// Set index, kept to reconstruct the block's base address.
    pub set_index: u32,
    /// Block data, `block_size` bytes when valid.
    pub data: Vec<u8>,
}

impl CacheBlock {
    /// Creates an invalid, empty block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a value of the given width from within this block.
    ///
    /// The offset is the address reduced modulo the block size. Bytes beyond
    /// the data vector read as zero; signed sub-word reads sign-extend.
    pub fn read(&self, addr: u32, size: MemSize, unsigned: bool, block_size: u32) -> i32 {
        let offset = (addr % block_size) as usize;
        let mut val: u64 = 0;
        for i in 0..size.bytes() as usize {
            if let Some(&byte) = self.data.get(offset + i) {
                val |= (byte as u64) << (8 * i);
            }
        }

        if !unsigned {
            match size {
                MemSize::Half => return val as u16 as i16 as i32,
                MemSize::Byte => return val as u8 as i8 as i32,
                _ => {}
            }
        }
        val as u32 as i32
    }

    /// Writes the low `size` bytes of `value` within this block and marks
    /// it valid. Out-of-range writes are ignored.
    pub fn write(&mut self, addr: u32, size: MemSize, value: u32, block_size: u32) {
        let offset = (addr % block_size) as usize;
        let size = size.bytes() as usize;
        if offset + size > self.data.len() {
            return;
        }
        for i in 0..size {
            self.data[offset + i] = (value >> (8 * i)) as u8;
        }
        self.valid = true;
    }

    /// Reconstructs the base address of the range this block holds.
    pub fn block_address(&self, index_bits: u32, offset_bits: u32) -> u32 {
        ((self.tag << index_bits) | self.set_index) << offset_bits
    }

    /// Returns the block to the invalid state.
    pub fn invalidate(&mut self) {
        self.valid = false;
        self.dirty = false;
        self.tag = 0;
        self.last_used = 0;
        self.inserted = 0;
    }
}

impl fmt::Display for CacheBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.valid {
            return f.write_str("[Invalid Block]");
        }
        write!(
            f,
            "Index: {:#04x} | Tag: {:#010x} | {} | Data: [",
            self.set_index,
            self.tag,
            if self.dirty { "Dirty" } else { "Clean" }
        )?;
        for (i, byte) in self.data.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02x}", byte)?;
        }
        f.write_str("]")
    }
}
