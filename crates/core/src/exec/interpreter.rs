//! The functional interpreter.
//!
//! This module executes decoded programs. It provides:
//! 1. **State:** The 32-entry 64-bit register file (x0 hardwired to zero),
//!    sparse memory, optional data cache, breakpoints, and the shadow call
//!    stack, all owned exclusively by the interpreter.
//! 2. **Stepping:** `step` executes one instruction; `run` steps until the
//!    program ends, a breakpoint fires, EBREAK pauses, or ECALL exits.
//! 3. **Trace output:** One `Executed: ...` line per step to an injected
//!    sink, plus the halt/pause/breakpoint messages.
//!
//! Execution is cycle-free: every instruction completes before the next
//! begins, and `step` unconditionally advances the PC by 4 afterward, so
//! taken control transfers pre-subtract 4 from their target.

use std::collections::BTreeMap;
use std::io::{self, Write};

use crate::asm::{LabelTable, Program};
use crate::cache::Cache;
use crate::common::error::BreakpointError;
use crate::config::CacheConfig;
use crate::exec::breakpoints::BreakpointTable;
use crate::exec::callstack::ShadowCallStack;
use crate::isa::instr::{DecodedInstr, InstrKind};
use crate::mem::{MemSize, Memory};

/// Why `run` stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Execution ran past the last instruction.
    Completed,
    /// A breakpoint at this source line fired.
    Breakpoint(usize),
    /// EBREAK requested a pause.
    Paused,
    /// ECALL halted the program; carries the exit code from `a0`.
    Exited(i64),
}

/// The simulator's execution engine.
pub struct Interpreter {
    program: Vec<DecodedInstr>,
    labels: LabelTable,
    line_to_pc: BTreeMap<usize, u32>,

    regs: [i64; 32],
    pc: i64,
    mem: Memory,
    cache: Option<Cache>,
    stack: ShadowCallStack,
    breakpoints: BreakpointTable,

    resumed_from_breakpoint: bool,
    pause_requested: bool,
    exit_code: Option<i64>,
    trace: Option<Box<dyn Write>>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates an interpreter with no program loaded.
    pub fn new() -> Self {
        Self {
            program: Vec::new(),
            labels: LabelTable::new(),
            line_to_pc: BTreeMap::new(),
            regs: [0; 32],
            pc: 0,
            mem: Memory::new(),
            cache: None,
            stack: ShadowCallStack::new(),
            breakpoints: BreakpointTable::new(),
            resumed_from_breakpoint: false,
            pause_requested: false,
            exit_code: None,
            trace: None,
        }
    }

    /// Loads a program, resetting all execution state including breakpoints
    /// (old line numbers are meaningless against new code).
    pub fn load(&mut self, program: &Program) {
        self.reset(false);
        self.program = program.code.clone();
        self.labels = program.labels.clone();
        self.line_to_pc = program.line_to_pc.clone();
    }

    /// Resets PC, registers, memory, the shadow stack, and the cache
    /// contents; the loaded program is retained.
    ///
    /// # Arguments
    ///
    /// * `keep_breakpoints` - Retain the breakpoint table across the reset.
    pub fn reset(&mut self, keep_breakpoints: bool) {
        self.pc = 0;
        self.regs = [0; 32];
        self.mem.clear();
        self.stack.reset();
        if let Some(cache) = &mut self.cache {
            cache.invalidate();
        }
        if !keep_breakpoints {
            self.breakpoints.clear();
        }
        self.resumed_from_breakpoint = false;
        self.pause_requested = false;
        self.exit_code = None;
    }

    /// Installs a sink for the per-step trace and halt messages.
    pub fn set_trace_sink(&mut self, sink: Box<dyn Write>) {
        self.trace = Some(sink);
    }

    /// Routes loads and stores through a cache built from `config`.
    pub fn enable_cache(&mut self, config: CacheConfig) {
        self.cache = Some(Cache::new(config));
    }

    /// Removes the cache; accesses go straight to memory again.
    pub fn disable_cache(&mut self) {
        self.cache = None;
    }

    /// The cache, when enabled.
    pub fn cache(&self) -> Option<&Cache> {
        self.cache.as_ref()
    }

    /// Mutable access to the cache (trace sink, seeding, invalidation).
    pub fn cache_mut(&mut self) -> Option<&mut Cache> {
        self.cache.as_mut()
    }

    /// The register file.
    pub fn registers(&self) -> &[i64; 32] {
        &self.regs
    }

    /// Reads one register.
    pub fn reg(&self, idx: u32) -> i64 {
        self.regs[idx as usize]
    }

    /// Writes one register. Writes to x0 are silently dropped.
    pub fn set_reg(&mut self, idx: u32, value: i64) {
        if idx != 0 {
            self.regs[idx as usize] = value;
        }
    }

    /// Current program counter.
    pub fn pc(&self) -> u32 {
        self.pc as u32
    }

    /// The memory image.
    pub fn memory(&self) -> &Memory {
        &self.mem
    }

    /// Mutable access to the memory image.
    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.mem
    }

    /// The shadow call stack.
    pub fn stack(&self) -> &ShadowCallStack {
        &self.stack
    }

    /// The loaded program.
    pub fn program(&self) -> &[DecodedInstr] {
        &self.program
    }

    /// Returns whether the PC currently points at a loaded instruction.
    pub fn is_program_loaded(&self) -> bool {
        !self.program.is_empty() && self.pc >= 0 && (self.pc / 4) < self.program.len() as i64
    }

    /// Sets a breakpoint at a source line.
    ///
    /// Fails if the line produced no instruction, a breakpoint is already
    /// set there, or all five slots are in use.
    pub fn set_breakpoint(&mut self, line: usize) -> Result<(), BreakpointError> {
        let pc = self
            .line_to_pc
            .get(&line)
            .copied()
            .ok_or(BreakpointError::NoSuchLine(line))?;
        if self.breakpoints.has_line(line) {
            return Err(BreakpointError::AlreadySet(line));
        }
        self.breakpoints.insert(pc, line)
    }

    /// Removes the breakpoint at a source line.
    pub fn remove_breakpoint(&mut self, line: usize) -> Result<(), BreakpointError> {
        if !self.line_to_pc.contains_key(&line) {
            return Err(BreakpointError::NoSuchLine(line));
        }
        if !self.breakpoints.remove_line(line) {
            return Err(BreakpointError::NotSet(line));
        }
        Ok(())
    }

    /// The breakpoint table.
    pub fn breakpoints(&self) -> &BreakpointTable {
        &self.breakpoints
    }

    /// Runs until the program completes, a breakpoint fires, EBREAK pauses,
    /// or ECALL exits.
    ///
    /// A breakpoint is sticky-resumed: immediately after a hit, the next
    /// `run` steps over that PC once instead of re-triggering.
    pub fn run(&mut self) -> StopReason {
        let end = 4 * self.program.len() as i64;
        while self.pc >= 0 && self.pc < end {
            if let Some(line) = self.breakpoints.line_at(self.pc as u32) {
                if !self.resumed_from_breakpoint {
                    self.emit(&format!("Execution stopped at breakpoint at line: {}", line));
                    self.resumed_from_breakpoint = true;
                    return StopReason::Breakpoint(line);
                }
            }
            self.resumed_from_breakpoint = false;

            self.step();

            if let Some(code) = self.exit_code.take() {
                return StopReason::Exited(code);
            }
            if self.pause_requested {
                self.pause_requested = false;
                self.emit("Execution paused due to ebreak.");
                return StopReason::Paused;
            }
        }

        self.emit("Program completed (possibly reached end of program).");
        StopReason::Completed
    }

    /// Executes the instruction at `pc / 4`.
    ///
    /// # Returns
    ///
    /// The source line of the next instruction to execute, or 0 at the end
    /// of the program.
    pub fn step(&mut self) -> usize {
        let len = self.program.len() as i64;
        if len == 0 || self.pc < 0 || self.pc / 4 >= len {
            self.emit("Nothing to step: reached end of the program");
            return 0;
        }
        let idx = (self.pc / 4) as usize;
        let source_line = self.source_line_of(self.pc as u32);
        let old_pc = self.pc;

        if self.pc == 0 {
            self.push_frame_at(0);
        } else {
            self.stack
                .update_top_line(if source_line == 0 { None } else { Some(source_line) });
        }

        let inst = self.program[idx].clone();
        self.execute(&inst);

        self.emit(&format!(
            "Executed: {} (line: {}) ; PC = hex: 0x{:06x}",
            inst.text, source_line, old_pc
        ));

        if self.pc <= 4 * len - 4 {
            self.pc += 4;
        }
        self.stack.update_top_return(self.pc as u32);
        self.source_line_of(self.pc as u32)
    }

    /// Dumps the register file, 16 entries per line, values in hex.
    pub fn dump_registers<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for (i, value) in self.regs.iter().enumerate() {
            write!(out, "x{}: {:x}", i, value)?;
            out.write_all(if (i + 1) % 16 == 0 { b"\n" } else { b"\t" })?;
        }
        Ok(())
    }

    /// Executes one decoded instruction, updating registers, memory, and PC.
    fn execute(&mut self, inst: &DecodedInstr) {
        use InstrKind::*;

        match inst.instr.kind {
            Ecall => {
                let code = self.regs[10];
                self.emit(&format!("Program exited with code: {}", code));
                self.pc = self.program.len() as i64 * 4;
                self.exit_code = Some(code);
                return;
            }
            Ebreak => {
                self.pause_requested = true;
                return;
            }
            _ => {}
        }

        let rs1 = self.regs[inst.rs1 as usize];
        let rs2 = self.regs[inst.rs2 as usize];
        let imm = inst.imm as i64;
        let sh_reg = (rs2 & 0x1F) as u32;
        let sh_imm = (inst.imm & 0x1F) as u32;
        let addr = rs1.wrapping_add(imm) as u32;

        let mut rd_val = self.regs[inst.rd as usize];

        match inst.instr.kind {
            // R-type integer
            Add => rd_val = rs1.wrapping_add(rs2),
            Sub => rd_val = rs1.wrapping_sub(rs2),
            And => rd_val = rs1 & rs2,
            Or => rd_val = rs1 | rs2,
            Xor => rd_val = rs1 ^ rs2,
            Sll => rd_val = rs1.wrapping_shl(sh_reg),
            Srl => rd_val = rs1 >> sh_reg,
            Sra => rd_val = ((rs1 as i32) >> sh_reg) as i64,

            // Multiply/divide
            Mul => rd_val = (rs1 as i32).wrapping_mul(rs2 as i32) as i64,
            Mulh => rd_val = (((rs1 as i128) * (rs2 as i128)) >> 64) as i64,
            Mulhsu => rd_val = (((rs1 as i128) * ((rs2 as u64) as i128)) >> 64) as i64,
            Mulhu => rd_val = ((((rs1 as u64) as u128) * ((rs2 as u64) as u128)) >> 64) as i64,
            Div => {
                rd_val = if rs2 == 0 {
                    -1
                } else if rs1 == i64::MIN && rs2 == -1 {
                    i64::MIN
                } else {
                    rs1 / rs2
                };
            }
            Divu => {
                rd_val = if rs2 == 0 {
                    u64::MAX as i64
                } else {
                    ((rs1 as u64) / (rs2 as u64)) as i64
                };
            }
            Rem => {
                rd_val = if rs2 == 0 {
                    rs1
                } else if rs1 == i64::MIN && rs2 == -1 {
                    0
                } else {
                    rs1 % rs2
                };
            }
            Remu => {
                rd_val = if rs2 == 0 {
                    rs1
                } else {
                    ((rs1 as u64) % (rs2 as u64)) as i64
                };
            }

            // RV64 word forms
            Addw => rd_val = rs1.wrapping_add(rs2) as i32 as i64,
            Subw => rd_val = rs1.wrapping_sub(rs2) as i32 as i64,
            Sllw => rd_val = rs1.wrapping_shl(sh_reg) as i32 as i64,
            Srlw => rd_val = ((rs1 as u32) >> sh_reg) as i32 as i64,
            Sraw => rd_val = ((rs1 as i32) >> sh_reg) as i64,
            Mulw => rd_val = rs1.wrapping_mul(rs2) as i32 as i64,
            Divw => {
                let (dividend, divisor) = (rs1 as i32, rs2 as i32);
                rd_val = if divisor == 0 {
                    -1
                } else if dividend == i32::MIN && divisor == -1 {
                    i32::MIN as i64
                } else {
                    (dividend / divisor) as i64
                };
            }
            Divuw => {
                let (dividend, divisor) = (rs1 as u32, rs2 as u32);
                rd_val = if divisor == 0 {
                    -1
                } else {
                    (dividend / divisor) as i32 as i64
                };
            }
            Remw => {
                let (dividend, divisor) = (rs1 as i32, rs2 as i32);
                rd_val = if divisor == 0 {
                    dividend as i64
                } else if dividend == i32::MIN && divisor == -1 {
                    0
                } else {
                    (dividend % divisor) as i64
                };
            }
            Remuw => {
                let (dividend, divisor) = (rs1 as u32, rs2 as u32);
                rd_val = if divisor == 0 {
                    dividend as i32 as i64
                } else {
                    (dividend % divisor) as i32 as i64
                };
            }

            // I-type arithmetic
            Addi => rd_val = rs1.wrapping_add(imm),
            Andi => rd_val = rs1 & imm,
            Ori => rd_val = rs1 | imm,
            Xori => rd_val = rs1 ^ imm,
            Slli => rd_val = rs1.wrapping_shl((inst.imm & 0x3F) as u32),
            Srli => rd_val = ((rs1 as u32) >> sh_imm) as i64,
            Srai => rd_val = ((rs1 as i32) >> sh_imm) as i64,
            Addiw => rd_val = rs1.wrapping_add(imm) as i32 as i64,
            Slliw => rd_val = ((rs1 as u32) << sh_imm) as i32 as i64,
            Srliw => rd_val = ((rs1 as u32) >> sh_imm) as i32 as i64,
            Sraiw => rd_val = ((rs1 as i32) >> sh_imm) as i64,

            // Loads
            Lw => rd_val = self.read_mem(addr, MemSize::Word, false) as i64,
            Lh => rd_val = self.read_mem(addr, MemSize::Half, false) as i64,
            Lb => rd_val = self.read_mem(addr, MemSize::Byte, false) as i64,
            Lhu => rd_val = self.read_mem(addr, MemSize::Half, true) as i64,
            Lbu => rd_val = self.read_mem(addr, MemSize::Byte, true) as i64,
            Lwu => rd_val = self.read_mem(addr, MemSize::Word, true) as u32 as i64,
            Ld => rd_val = self.read_mem(addr, MemSize::Double, false) as i64,

            // Stores
            Sw => self.write_mem(addr, MemSize::Word, rs2 as u32),
            Sh => self.write_mem(addr, MemSize::Half, rs2 as u32),
            Sb => self.write_mem(addr, MemSize::Byte, rs2 as u32),
            Sd => self.write_mem(addr, MemSize::Double, rs2 as u32),

            // Branches: the taken target pre-subtracts the unconditional
            // +4 applied by step().
            Beq => {
                if rs1 == rs2 {
                    self.pc += imm - 4;
                }
            }
            Bne => {
                if rs1 != rs2 {
                    self.pc += imm - 4;
                }
            }
            Blt => {
                if (rs1 as i32) < (rs2 as i32) {
                    self.pc += imm - 4;
                }
            }
            Bge => {
                if (rs1 as i32) >= (rs2 as i32) {
                    self.pc += imm - 4;
                }
            }
            Bltu => {
                if (rs1 as u32) < (rs2 as u32) {
                    self.pc += imm - 4;
                }
            }
            Bgeu => {
                if (rs1 as u32) >= (rs2 as u32) {
                    self.pc += imm - 4;
                }
            }

            // Jumps
            Jal => {
                let next = self.pc + 4;
                self.pc += imm;
                // A linkless jal (rd = x0) is a plain jump: no link write,
                // no call frame.
                if inst.rd != 0 {
                    self.set_reg(inst.rd, next);
                    // The caller resumes at the link address; record it so a
                    // conventional return reconciles cleanly.
                    self.stack.update_top_return(next as u32);
                    self.push_frame_at(self.pc as u32);
                }
                self.pc -= 4;
            }
            Jalr => {
                let target = rs1.wrapping_add(imm) & !1;
                self.pc = target;
                if inst.rd == 0 {
                    // Conventional return: reconcile against the shadow
                    // stack.
                    self.stack.pop_on_return(target as u32);
                }
                self.pc -= 4;
            }

            // Upper immediates
            Lui => rd_val = imm << 12,
            Auipc => rd_val = self.pc.wrapping_add(imm << 12),

            Ecall | Ebreak => unreachable!("handled before operand fetch"),
        }

        if inst.instr.kind.writes_register() && inst.rd != 0 {
            self.regs[inst.rd as usize] = rd_val;
        }
    }

    /// Loads through the cache when enabled, else straight from memory.
    fn read_mem(&mut self, addr: u32, size: MemSize, unsigned: bool) -> i32 {
        match &mut self.cache {
            Some(cache) => cache.read(&mut self.mem, addr, size, unsigned),
            None => self.mem.read(addr, size, unsigned),
        }
    }

    /// Stores through the cache when enabled, else straight to memory.
    fn write_mem(&mut self, addr: u32, size: MemSize, value: u32) {
        match &mut self.cache {
            Some(cache) => cache.write(&mut self.mem, addr, size, value),
            None => self.mem.write(addr, size, value),
        }
    }

    /// Pushes a call frame for the code at `pc`, naming it from the label
    /// table (the synthetic bottom frame is `* main *`).
    fn push_frame_at(&mut self, pc: u32) {
        let mut name = self
            .labels
            .definition_at(pc)
            .unwrap_or_default()
            .to_string();
        if pc == 0 && name.is_empty() {
            name = "* main *".to_string();
        }
        let line = self.source_line_of(pc);
        self.stack
            .push_frame(name, if line == 0 { None } else { Some(line) }, pc);
    }

    /// Source line of the instruction at `pc`, or 0 if none maps there.
    fn source_line_of(&self, pc: u32) -> usize {
        self.line_to_pc
            .iter()
            .find(|&(_, &mapped)| mapped == pc)
            .map(|(&line, _)| line)
            .unwrap_or(0)
    }

    /// Writes one message line to the trace sink, if installed.
    fn emit(&mut self, msg: &str) {
        if let Some(sink) = self.trace.as_mut() {
            let _ = writeln!(sink, "{}", msg);
        }
    }
}
