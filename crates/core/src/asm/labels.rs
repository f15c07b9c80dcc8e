//! The label table.
//!
//! Bidirectional mapping between program counters and label names, with a
//! per-PC flag distinguishing label definitions (`L:` appeared in source)
//! from mere references. The assembler owns the table it builds; the
//! disassembler and interpreter receive read-only views or clones.

use std::collections::{HashMap, HashSet};

/// Bidirectional PC ⇄ label mapping.
#[derive(Debug, Default, Clone)]
pub struct LabelTable {
    by_name: HashMap<String, u32>,
    by_pc: HashMap<u32, String>,
    definitions: HashSet<u32>,
}

impl LabelTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a label at a PC.
    ///
    /// # Arguments
    ///
    /// * `pc` - Program counter the label refers to.
    /// * `name` - Label identifier.
    /// * `definition` - Whether this came from a `name:` line in source.
    pub fn insert(&mut self, pc: u32, name: &str, definition: bool) {
        self.by_name.insert(name.to_string(), pc);
        self.by_pc.insert(pc, name.to_string());
        if definition {
            self.definitions.insert(pc);
        }
    }

    /// Returns the label at a PC, definition or reference.
    pub fn name_at(&self, pc: u32) -> Option<&str> {
        self.by_pc.get(&pc).map(String::as_str)
    }

    /// Returns the label at a PC only if it is a definition.
    pub fn definition_at(&self, pc: u32) -> Option<&str> {
        if self.definitions.contains(&pc) {
            self.name_at(pc)
        } else {
            None
        }
    }

    /// Returns the PC a label resolves to.
    pub fn pc_of(&self, name: &str) -> Option<u32> {
        self.by_name.get(name).copied()
    }

    /// Returns whether a label with this name exists.
    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Returns whether any label maps to this PC.
    pub fn contains_pc(&self, pc: u32) -> bool {
        self.by_pc.contains_key(&pc)
    }

    /// Iterates over all (pc, name) entries in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.by_pc.iter().map(|(&pc, name)| (pc, name.as_str()))
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.by_name.clear();
        self.by_pc.clear();
        self.definitions.clear();
    }
}
