//! The static hazard analyzer.
//!
//! Scans a decoded program pairwise, emitting hazard records and charging
//! stall cycles by pipeline depth and forwarding configuration. The scan is
//! purely static: no instruction is executed, and cache penalties are fixed
//! per-depth estimates.

use std::io::{self, Write};

use crate::isa::instr::{DecodedInstr, InstrKind};
use crate::pipeline::hazard::{Hazard, HazardKind, HazardSite, StallStats};
use crate::pipeline::PipelineKind;

/// Hazard scanner for one pipeline configuration.
pub struct HazardAnalyzer {
    pipeline: PipelineKind,
    forwarding: bool,
    cache_enabled: bool,
    hazards: Vec<Hazard>,
    stats: StallStats,
}

impl HazardAnalyzer {
    /// Creates an analyzer.
    ///
    /// # Arguments
    ///
    /// * `pipeline` - Modeled pipeline depth.
    /// * `forwarding` - Whether operand forwarding is available.
    /// * `cache_enabled` - Whether loads/stores charge cache-miss estimates.
    pub fn new(pipeline: PipelineKind, forwarding: bool, cache_enabled: bool) -> Self {
        Self {
            pipeline,
            forwarding,
            cache_enabled,
            hazards: Vec::new(),
            stats: StallStats::default(),
        }
    }

    /// The configured pipeline depth.
    pub fn pipeline(&self) -> PipelineKind {
        self.pipeline
    }

    /// Whether operand forwarding is modeled.
    pub fn forwarding(&self) -> bool {
        self.forwarding
    }

    /// Hazards from the most recent analysis.
    pub fn hazards(&self) -> &[Hazard] {
        &self.hazards
    }

    /// Statistics from the most recent analysis.
    pub fn stats(&self) -> &StallStats {
        &self.stats
    }

    /// Scans the program, rebuilding the hazard list and statistics.
    ///
    /// For every instruction the scan emits its control and cache hazards,
    /// then walks all later instructions for RAW/WAW/WAR conflicts and
    /// functional-unit contention.
    pub fn analyze(&mut self, program: &[DecodedInstr]) -> &[Hazard] {
        self.hazards.clear();
        self.stats.reset();
        self.stats.total_instructions = program.len() as u32;

        for (i, inst1) in program.iter().enumerate() {
            let k1 = inst1.instr.kind;

            if k1.is_branch() || k1.is_jump() {
                let stall = self.control_stall(inst1);
                let reason = if k1 == InstrKind::Jalr {
                    "Function return: "
                } else {
                    "Branch instruction: "
                };
                self.push_hazard(Hazard {
                    kind: HazardKind::Control,
                    producer: HazardSite::from(inst1),
                    consumer: None,
                    register: None,
                    memory_address: None,
                    stall_cycles: stall,
                    description: format!("Control hazard from {}{}", reason, inst1.instr.mnemonic),
                    solution: format!(
                        "Use branch prediction or delayed branching ({} cycles)",
                        stall
                    ),
                });
            }

            if self.cache_enabled && (k1.is_load() || k1.is_store()) {
                let stall = self.cache_stall();
                // No execution happens here, so the accessed address is
                // unknown; report the placeholder 0.
                let address = 0u32;
                self.push_hazard(Hazard {
                    kind: HazardKind::CacheMiss,
                    producer: HazardSite::from(inst1),
                    consumer: None,
                    register: None,
                    memory_address: Some(address),
                    stall_cycles: stall,
                    description: format!("Cache miss at address {:#x}", address),
                    solution: "Wait for memory access or prefetch cache lines".to_string(),
                });
            }

            for (j, inst2) in program.iter().enumerate().skip(i + 1) {
                let distance = (j - i) as u32;
                let k2 = inst2.instr.kind;

                // RAW: inst2 reads a register inst1 names as destination
                // (jal/jalr link writes count too).
                if inst1.rd != 0 && (inst2.rs1 == inst1.rd || inst2.rs2 == inst1.rd) {
                    let stall = self.raw_stall(k1.is_load(), distance);
                    self.push_hazard(Hazard {
                        kind: HazardKind::Raw,
                        producer: HazardSite::from(inst1),
                        consumer: Some(HazardSite::from(inst2)),
                        register: Some(inst1.rd),
                        memory_address: None,
                        stall_cycles: stall,
                        description: format!("RAW Hazard: Read-after-Write on x{}", inst1.rd),
                        solution: self.raw_solution(stall),
                    });
                }

                // WAW: both write the same register.
                if inst1.rd != 0 && inst1.rd == inst2.rd {
                    self.push_hazard(Hazard {
                        kind: HazardKind::Waw,
                        producer: HazardSite::from(inst1),
                        consumer: Some(HazardSite::from(inst2)),
                        register: Some(inst1.rd),
                        memory_address: None,
                        stall_cycles: 0,
                        description: format!("WAW Hazard: Write-after-Write on x{}", inst1.rd),
                        solution: "Reorder writes or stall to avoid overwriting".to_string(),
                    });
                }

                // WAR: inst2 writes a register inst1 reads.
                if inst2.rd != 0 && (inst1.rs1 == inst2.rd || inst1.rs2 == inst2.rd) {
                    self.push_hazard(Hazard {
                        kind: HazardKind::War,
                        producer: HazardSite::from(inst1),
                        consumer: Some(HazardSite::from(inst2)),
                        register: Some(inst2.rd),
                        memory_address: None,
                        stall_cycles: 0,
                        description: format!("WAR Hazard: Write-after-Read on x{}", inst2.rd),
                        solution: "No stall needed (no conflict or handled by reordering)"
                            .to_string(),
                    });
                }

                let struct_stall = self.structural_stall(k1, k2, distance);
                if struct_stall > 0 {
                    let unit = if k1.is_muldiv() {
                        "Mul/Div Unit"
                    } else if k1.is_alu() {
                        "ALU"
                    } else if k1.is_load() || k1.is_store() {
                        "Memory Access Unit"
                    } else {
                        "Functional unit"
                    };
                    self.push_hazard(Hazard {
                        kind: HazardKind::Structural,
                        producer: HazardSite::from(inst1),
                        consumer: Some(HazardSite::from(inst2)),
                        register: None,
                        memory_address: None,
                        stall_cycles: struct_stall,
                        description: format!("Structural hazard: both instructions use {}", unit),
                        solution: format!("Stall pipeline until {} is available", unit),
                    });
                }
            }
        }

        self.stats.total_cycles = self.stats.total_instructions + self.stats.total_stalls;
        &self.hazards
    }

    /// Records a hazard and charges its stall to the right counter.
    fn push_hazard(&mut self, hazard: Hazard) {
        let stall = hazard.stall_cycles;
        match hazard.kind {
            HazardKind::Raw => self.stats.raw_stalls += stall,
            HazardKind::Waw => self.stats.waw_stalls += stall,
            HazardKind::War => self.stats.war_stalls += stall,
            HazardKind::Control => self.stats.control_stalls += stall,
            HazardKind::Structural => self.stats.structural_stalls += stall,
            HazardKind::CacheMiss => self.stats.cache_stalls += stall,
        }
        self.stats.total_stalls += stall;
        self.hazards.push(hazard);
    }

    /// RAW stall cycles for a producer at `distance` instructions before
    /// the consumer.
    fn raw_stall(&self, load: bool, distance: u32) -> u32 {
        match self.pipeline {
            // Only adjacent instructions overlap at all.
            PipelineKind::ThreeStage => u32::from(distance == 1),
            PipelineKind::FiveStage => {
                if self.forwarding {
                    if load {
                        if distance == 1 {
                            1
                        } else {
                            2u32.saturating_sub(distance)
                        }
                    } else {
                        1u32.saturating_sub(distance)
                    }
                } else if load && distance == 1 {
                    2
                } else if distance <= 2 {
                    3u32.saturating_sub(distance)
                } else {
                    0
                }
            }
            PipelineKind::SevenStage => {
                if self.forwarding {
                    if load {
                        2u32.saturating_sub(distance)
                    } else {
                        3u32.saturating_sub(distance)
                    }
                } else if load && distance <= 2 {
                    3u32.saturating_sub(distance)
                } else if distance <= 3 {
                    4u32.saturating_sub(distance)
                } else {
                    0
                }
            }
        }
    }

    /// Mitigation text for a RAW hazard.
    fn raw_solution(&self, stall: u32) -> String {
        match stall {
            0 if self.forwarding => "No stall needed (forwarding available)".to_string(),
            0 => "No stall needed".to_string(),
            1 if self.forwarding => "1 cycle stall or forwarding".to_string(),
            1 => "1 cycle stall required".to_string(),
            n => format!("{} cycle stall required", n),
        }
    }

    /// Redirect penalty for the configured pipeline depth.
    fn mispredict_penalty(&self) -> u32 {
        match self.pipeline {
            PipelineKind::ThreeStage => 1,
            PipelineKind::FiveStage => 2,
            PipelineKind::SevenStage => 3,
        }
    }

    /// Control stall cycles for a branch or jump.
    ///
    /// `jal` resolves in decode and is free. `jalr` always pays the
    /// redirect penalty. Conditional branches model always-taken
    /// prediction: a backward branch (loop) mispredicts once per static
    /// instruction, a forward branch always mispredicts.
    fn control_stall(&self, inst: &DecodedInstr) -> u32 {
        let kind = inst.instr.kind;
        if kind == InstrKind::Jal {
            return 0;
        }
        if kind == InstrKind::Jalr {
            return self.mispredict_penalty();
        }
        if kind.is_branch() {
            let backward = inst.imm < 0;
            if backward {
                let already_reported = self.hazards.iter().any(|h| {
                    h.kind == HazardKind::Control && h.producer.pc == inst.pc
                });
                if already_reported {
                    return 0;
                }
            }
            return self.mispredict_penalty();
        }
        0
    }

    /// Structural stall cycles for a pair of instructions `distance` apart.
    fn structural_stall(&self, k1: InstrKind, k2: InstrKind, distance: u32) -> u32 {
        match self.pipeline {
            PipelineKind::ThreeStage => {
                // A single shared execute stage: back-to-back same-cycle use
                // of the ALU or load unit.
                if k1.is_alu() && k2.is_alu() && distance == 0 {
                    1
                } else if k1.is_load() && k2.is_load() && distance == 0 {
                    1
                } else {
                    0
                }
            }
            PipelineKind::FiveStage | PipelineKind::SevenStage => {
                if k1.is_alu() && k2.is_alu() && distance == 0 {
                    1
                } else if (k1.is_load() || k1.is_store())
                    && (k2.is_load() || k2.is_store())
                    && distance < 2
                {
                    1
                } else if k1.is_muldiv() && k2.is_muldiv() && distance < 2 {
                    2
                } else {
                    0
                }
            }
        }
    }

    /// Fixed cache-miss penalty estimate per pipeline depth.
    fn cache_stall(&self) -> u32 {
        match self.pipeline {
            PipelineKind::ThreeStage => 5,
            PipelineKind::FiveStage => 10,
            PipelineKind::SevenStage => 12,
        }
    }

    /// Writes the detected hazards, critical (stalling) ones first.
    pub fn write_hazards<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if self.hazards.is_empty() {
            writeln!(out, "No hazards detected in current instruction window")?;
            return Ok(());
        }

        writeln!(out, "\n=== Critical Hazards (Stalls > 0) ===")?;
        let mut any = false;
        for hazard in self.hazards.iter().filter(|h| h.stall_cycles > 0) {
            writeln!(out, "{}", hazard)?;
            any = true;
        }
        if !any {
            writeln!(out, "None")?;
        }

        writeln!(out, "\n=== Resolved / Non-Critical Hazards ===")?;
        let mut any = false;
        for hazard in self.hazards.iter().filter(|h| h.stall_cycles == 0) {
            writeln!(out, "{}", hazard)?;
            any = true;
        }
        if !any {
            writeln!(out, "None")?;
        }
        Ok(())
    }

    /// Writes the per-category stall totals and CPI estimate.
    pub fn write_stats<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let s = &self.stats;
        writeln!(out, "Pipeline Stall Statistics:")?;
        writeln!(out, "  Total Stalls: {}", s.total_stalls)?;
        if s.raw_stalls > 0 {
            writeln!(out, "  RAW Hazards: {}", s.raw_stalls)?;
        }
        if s.waw_stalls > 0 {
            writeln!(out, "  WAW Hazards: {}", s.waw_stalls)?;
        }
        if s.war_stalls > 0 {
            writeln!(out, "  WAR Hazards: {}", s.war_stalls)?;
        }
        if s.control_stalls > 0 {
            writeln!(out, "  Control Hazards: {}", s.control_stalls)?;
        }
        if s.structural_stalls > 0 {
            writeln!(out, "  Structural Hazards: {}", s.structural_stalls)?;
        }
        if s.cache_stalls > 0 {
            writeln!(out, "  Cache Misses: {}", s.cache_stalls)?;
        }
        writeln!(out, "  Total Instructions: {}", s.total_instructions)?;
        writeln!(out, "  Total Cycles: {}", s.total_cycles)?;
        if let Some(cpi) = s.cpi() {
            writeln!(out, "  CPI: {}", cpi)?;
        }
        Ok(())
    }

    /// Runs the full analysis and writes the performance summary.
    pub fn performance_analysis<W: Write>(
        &mut self,
        program: &[DecodedInstr],
        out: &mut W,
    ) -> io::Result<()> {
        writeln!(out, "\n=== PERFORMANCE ANALYSIS ===")?;
        self.analyze(program);

        writeln!(out, "Program instructions: {}", program.len())?;
        writeln!(out, "Total hazards detected: {}", self.hazards.len())?;
        writeln!(out, "Total stall cycles: {}", self.stats.total_stalls)?;

        match self.stats.cpi() {
            None => {
                writeln!(out, "No instructions in program, cannot calculate CPI.")?;
                return Ok(());
            }
            Some(cpi) => {
                writeln!(out, "Estimated CPI (without hazards): 1.0")?;
                writeln!(out, "Estimated CPI (with hazards): {}", cpi)?;
            }
        }
        if self.cache_enabled {
            writeln!(out, "Cache simulation: ENABLED")?;
        }
        writeln!(out, "===========================\n")?;
        Ok(())
    }
}
