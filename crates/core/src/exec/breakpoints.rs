//! Breakpoint table.
//!
//! A bounded mapping from program counter to the source line that produced
//! the instruction there. Capacity is fixed at five; a sixth set attempt is
//! refused without evicting anything.

use std::collections::HashMap;

use crate::common::error::BreakpointError;

/// Maximum number of simultaneous breakpoints.
pub const MAX_BREAKPOINTS: usize = 5;

/// PC-keyed breakpoint storage.
#[derive(Debug, Default, Clone)]
pub struct BreakpointTable {
    by_pc: HashMap<u32, usize>,
}

impl BreakpointTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a breakpoint.
    ///
    /// # Arguments
    ///
    /// * `pc` - Program counter to trap at.
    /// * `line` - Source line shown when the breakpoint fires.
    ///
    /// # Returns
    ///
    /// `Ok` on success; refuses duplicates and a sixth entry.
    pub fn insert(&mut self, pc: u32, line: usize) -> Result<(), BreakpointError> {
        if self.by_pc.contains_key(&pc) {
            return Err(BreakpointError::AlreadySet(line));
        }
        if self.by_pc.len() >= MAX_BREAKPOINTS {
            return Err(BreakpointError::LimitReached(MAX_BREAKPOINTS));
        }
        self.by_pc.insert(pc, line);
        Ok(())
    }

    /// Removes the breakpoint registered for a source line, returning
    /// whether one existed.
    pub fn remove_line(&mut self, line: usize) -> bool {
        let pc = self
            .by_pc
            .iter()
            .find(|&(_, &l)| l == line)
            .map(|(&pc, _)| pc);
        match pc {
            Some(pc) => {
                self.by_pc.remove(&pc);
                true
            }
            None => false,
        }
    }

    /// Returns the source line of a breakpoint at `pc`, if one is set.
    pub fn line_at(&self, pc: u32) -> Option<usize> {
        self.by_pc.get(&pc).copied()
    }

    /// Returns whether any breakpoint is registered for a source line.
    pub fn has_line(&self, line: usize) -> bool {
        self.by_pc.values().any(|&l| l == line)
    }

    /// Number of breakpoints currently set.
    pub fn len(&self) -> usize {
        self.by_pc.len()
    }

    /// Returns whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.by_pc.is_empty()
    }

    /// Iterates over (pc, line) pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, usize)> + '_ {
        self.by_pc.iter().map(|(&pc, &line)| (pc, line))
    }

    /// Removes every breakpoint.
    pub fn clear(&mut self) {
        self.by_pc.clear();
    }
}
