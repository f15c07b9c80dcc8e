//! Hazard records and stall statistics.

use std::fmt;

use crate::isa::instr::DecodedInstr;

/// Hazard categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HazardKind {
    /// Read-after-write data dependency.
    Raw,
    /// Write-after-write on the same register.
    Waw,
    /// Write-after-read on the same register.
    War,
    /// Branch or indirect-jump redirect penalty.
    Control,
    /// Two instructions contending for one functional unit.
    Structural,
    /// Estimated memory penalty for a load/store under a cache.
    CacheMiss,
}

impl fmt::Display for HazardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Raw => "RAW",
            Self::Waw => "WAW",
            Self::War => "WAR",
            Self::Control => "Control",
            Self::Structural => "Structural",
            Self::CacheMiss => "Cache Miss",
        })
    }
}

/// A hazard's view of one program instruction: its PC and source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HazardSite {
    /// Byte address of the instruction.
    pub pc: u32,
    /// Original source text.
    pub text: String,
}

impl From<&DecodedInstr> for HazardSite {
    fn from(inst: &DecodedInstr) -> Self {
        Self {
            pc: inst.pc,
            text: inst.text.clone(),
        }
    }
}

/// One detected hazard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hazard {
    /// Category.
    pub kind: HazardKind,
    /// The earlier instruction (the writer for RAW/WAW, the reader for WAR).
    pub producer: HazardSite,
    /// The later instruction, where the hazard involves a pair.
    pub consumer: Option<HazardSite>,
    /// Register in conflict, for the data-hazard kinds.
    pub register: Option<u32>,
    /// Estimated memory address, for cache hazards.
    pub memory_address: Option<u32>,
    /// Stall cycles this hazard charges.
    pub stall_cycles: u32,
    /// Human-readable statement of the hazard.
    pub description: String,
    /// Suggested mitigation.
    pub solution: String,
}

impl fmt::Display for Hazard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.consumer {
            Some(consumer) => {
                writeln!(f, "   Instruction: {} at PC={:#x}", consumer.text, consumer.pc)?;
                writeln!(f, "   Depends on: {} (PC={:#x})", self.producer.text, self.producer.pc)?;
                let distance = consumer.pc.abs_diff(self.producer.pc) / 4;
                writeln!(
                    f,
                    "   Distance: {} instruction{}",
                    distance,
                    if distance == 1 { "" } else { "s" }
                )?;
            }
            None => {
                writeln!(f, "   Instruction: {} at PC={:#x}", self.producer.text, self.producer.pc)?;
            }
        }

        if matches!(self.kind, HazardKind::Raw | HazardKind::Waw | HazardKind::War) {
            if let Some(reg) = self.register {
                write!(f, "   Register: x{}", reg)?;
            }
        }

        writeln!(f, "   Stall cycles: {}", self.stall_cycles)?;
        if self.stall_cycles == 0 {
            if self.kind == HazardKind::Waw {
                writeln!(f, "   Note: WAW hazard resolved by instruction separation or writeback timing")?;
            } else {
                writeln!(f, "   Note: Hazard resolved by separation or forwarding")?;
            }
        }
        if self.kind == HazardKind::CacheMiss {
            if let Some(addr) = self.memory_address {
                writeln!(f, "  Memory Address: {:#x}", addr)?;
            }
        }
        writeln!(f, "   Description: {}", self.description)?;
        writeln!(f, "   Solution: {}", self.solution)
    }
}

/// Aggregate stall statistics for one analysis run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StallStats {
    /// Sum of every category below.
    pub total_stalls: u32,
    /// Stalls charged to RAW hazards.
    pub raw_stalls: u32,
    /// Stalls charged to WAW hazards (always 0 in-order).
    pub waw_stalls: u32,
    /// Stalls charged to WAR hazards (always 0 in-order).
    pub war_stalls: u32,
    /// Stalls charged to control hazards.
    pub control_stalls: u32,
    /// Stalls charged to structural conflicts.
    pub structural_stalls: u32,
    /// Stalls charged to estimated cache misses.
    pub cache_stalls: u32,
    /// Instructions in the analyzed program.
    pub total_instructions: u32,
    /// Instructions plus total stalls (ideal CPI is 1).
    pub total_cycles: u32,
}

impl StallStats {
    /// Zeroes every counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Effective cycles per instruction, or `None` for an empty program.
    pub fn cpi(&self) -> Option<f64> {
        if self.total_instructions == 0 {
            None
        } else {
            Some(self.total_cycles as f64 / self.total_instructions as f64)
        }
    }
}
