//! The per-ISA-mode instruction registry.
//!
//! Builds the list of admitted instructions for a given [`IsaMode`] and
//! provides the two lookups everything else is built on: by mnemonic (used
//! by the assembler) and by encoded 32-bit word (used by the disassembler).

use std::collections::HashMap;

use crate::common::bits::extract;
use crate::config::IsaMode;
use crate::isa::instr::{InstrFormat, InstrKind, Instruction};
use crate::isa::{funct3, funct7, opcodes};

use InstrFormat::{B, I, J, R, S, U};
use InstrKind::*;

/// Base RV32I instructions.
static RV32I_BASE: &[Instruction] = &[
    // R-type
    Instruction::new("add", Add, R, opcodes::OP_REG, funct3::ADD_SUB, funct7::BASE),
    Instruction::new("sub", Sub, R, opcodes::OP_REG, funct3::ADD_SUB, funct7::ALT),
    Instruction::new("and", And, R, opcodes::OP_REG, funct3::AND, funct7::BASE),
    Instruction::new("or", Or, R, opcodes::OP_REG, funct3::OR, funct7::BASE),
    Instruction::new("xor", Xor, R, opcodes::OP_REG, funct3::XOR, funct7::BASE),
    Instruction::new("sll", Sll, R, opcodes::OP_REG, funct3::SLL, funct7::BASE),
    Instruction::new("srl", Srl, R, opcodes::OP_REG, funct3::SRL_SRA, funct7::BASE),
    Instruction::new("sra", Sra, R, opcodes::OP_REG, funct3::SRL_SRA, funct7::ALT),
    // I-type arithmetic
    Instruction::new("addi", Addi, I, opcodes::OP_IMM, funct3::ADD_SUB, 0),
    Instruction::new("andi", Andi, I, opcodes::OP_IMM, funct3::AND, 0),
    Instruction::new("ori", Ori, I, opcodes::OP_IMM, funct3::OR, 0),
    Instruction::new("xori", Xori, I, opcodes::OP_IMM, funct3::XOR, 0),
    Instruction::new("slli", Slli, I, opcodes::OP_IMM, funct3::SLL, funct7::BASE),
    Instruction::new("srai", Srai, I, opcodes::OP_IMM, funct3::SRL_SRA, funct7::ALT),
    Instruction::new("srli", Srli, I, opcodes::OP_IMM, funct3::SRL_SRA, funct7::BASE),
    // I-type loads
    Instruction::new("ld", Ld, I, opcodes::OP_LOAD, funct3::LD, 0),
    Instruction::new("lw", Lw, I, opcodes::OP_LOAD, funct3::LW, 0),
    Instruction::new("lh", Lh, I, opcodes::OP_LOAD, funct3::LH, 0),
    Instruction::new("lb", Lb, I, opcodes::OP_LOAD, funct3::LB, 0),
    Instruction::new("lhu", Lhu, I, opcodes::OP_LOAD, funct3::LHU, 0),
    Instruction::new("lbu", Lbu, I, opcodes::OP_LOAD, funct3::LBU, 0),
    // I-type jump
    Instruction::new("jalr", Jalr, I, opcodes::OP_JALR, 0b000, 0),
    // I-type system; the encoded immediate (0 or 1) discriminates the two.
    Instruction::new("ecall", Ecall, I, opcodes::OP_SYSTEM, 0b000, 0x000),
    Instruction::new("ebreak", Ebreak, I, opcodes::OP_SYSTEM, 0b000, 0x001),
    // S-type
    Instruction::new("sb", Sb, S, opcodes::OP_STORE, funct3::SB, 0),
    Instruction::new("sh", Sh, S, opcodes::OP_STORE, funct3::SH, 0),
    Instruction::new("sw", Sw, S, opcodes::OP_STORE, funct3::SW, 0),
    // B-type
    Instruction::new("beq", Beq, B, opcodes::OP_BRANCH, funct3::BEQ, 0),
    Instruction::new("bne", Bne, B, opcodes::OP_BRANCH, funct3::BNE, 0),
    Instruction::new("blt", Blt, B, opcodes::OP_BRANCH, funct3::BLT, 0),
    Instruction::new("bge", Bge, B, opcodes::OP_BRANCH, funct3::BGE, 0),
    Instruction::new("bltu", Bltu, B, opcodes::OP_BRANCH, funct3::BLTU, 0),
    Instruction::new("bgeu", Bgeu, B, opcodes::OP_BRANCH, funct3::BGEU, 0),
    // U-type
    Instruction::new("lui", Lui, U, opcodes::OP_LUI, 0, 0),
    Instruction::new("auipc", Auipc, U, opcodes::OP_AUIPC, 0, 0),
    // J-type
    Instruction::new("jal", Jal, J, opcodes::OP_JAL, 0, 0),
];

/// Multiply/divide extension (RV32M).
static MULDIV: &[Instruction] = &[
    Instruction::new("mul", Mul, R, opcodes::OP_REG, funct3::MUL, funct7::MULDIV),
    Instruction::new("mulh", Mulh, R, opcodes::OP_REG, funct3::MULH, funct7::MULDIV),
    Instruction::new("mulhsu", Mulhsu, R, opcodes::OP_REG, funct3::MULHSU, funct7::MULDIV),
    Instruction::new("mulhu", Mulhu, R, opcodes::OP_REG, funct3::MULHU, funct7::MULDIV),
    Instruction::new("div", Div, R, opcodes::OP_REG, funct3::DIV, funct7::MULDIV),
    Instruction::new("divu", Divu, R, opcodes::OP_REG, funct3::DIVU, funct7::MULDIV),
    Instruction::new("rem", Rem, R, opcodes::OP_REG, funct3::REM, funct7::MULDIV),
    Instruction::new("remu", Remu, R, opcodes::OP_REG, funct3::REMU, funct7::MULDIV),
];

/// 64-bit word operations (RV64I).
static RV64_BASE: &[Instruction] = &[
    Instruction::new("addw", Addw, R, opcodes::OP_REG_32, funct3::ADD_SUB, funct7::BASE),
    Instruction::new("subw", Subw, R, opcodes::OP_REG_32, funct3::ADD_SUB, funct7::ALT),
    Instruction::new("sllw", Sllw, R, opcodes::OP_REG_32, funct3::SLL, funct7::BASE),
    Instruction::new("srlw", Srlw, R, opcodes::OP_REG_32, funct3::SRL_SRA, funct7::BASE),
    Instruction::new("sraw", Sraw, R, opcodes::OP_REG_32, funct3::SRL_SRA, funct7::ALT),
    Instruction::new("addiw", Addiw, I, opcodes::OP_IMM_32, funct3::ADD_SUB, 0),
    Instruction::new("slliw", Slliw, I, opcodes::OP_IMM_32, funct3::SLL, funct7::BASE),
    Instruction::new("srliw", Srliw, I, opcodes::OP_IMM_32, funct3::SRL_SRA, funct7::BASE),
    Instruction::new("sraiw", Sraiw, I, opcodes::OP_IMM_32, funct3::SRL_SRA, funct7::ALT),
    Instruction::new("sd", Sd, S, opcodes::OP_STORE, funct3::SD, 0),
    Instruction::new("lwu", Lwu, I, opcodes::OP_LOAD, funct3::LWU, 0),
];

/// 64-bit multiply/divide word operations (RV64M).
static RV64_MULDIV: &[Instruction] = &[
    Instruction::new("mulw", Mulw, R, opcodes::OP_REG_32, funct3::MUL, funct7::MULDIV),
    Instruction::new("divw", Divw, R, opcodes::OP_REG_32, funct3::DIV, funct7::MULDIV),
    Instruction::new("divuw", Divuw, R, opcodes::OP_REG_32, funct3::DIVU, funct7::MULDIV),
    Instruction::new("remw", Remw, R, opcodes::OP_REG_32, funct3::REM, funct7::MULDIV),
    Instruction::new("remuw", Remuw, R, opcodes::OP_REG_32, funct3::REMU, funct7::MULDIV),
];

/// Instruction registry for one ISA mode.
///
/// Owns the admitted instruction list and a mnemonic index. Lookup by
/// encoded word walks the list matching opcode, then funct3 where the format
/// uses one, then funct7 for R-type and shift-immediate instructions.
pub struct InstructionSet {
    mode: IsaMode,
    list: Vec<Instruction>,
    by_mnemonic: HashMap<&'static str, usize>,
}

impl InstructionSet {
    /// Builds the registry for an ISA mode.
    ///
    /// RV32I admits the base list; every other mode adds the M extension;
    /// the RV64 modes add the word operations; RV64IM adds the 64-bit
    /// multiply/divide word operations.
    pub fn new(mode: IsaMode) -> Self {
        let mut list: Vec<Instruction> = RV32I_BASE.to_vec();
        if mode.has_muldiv() {
            list.extend_from_slice(MULDIV);
        }
        if mode.is_rv64() {
            list.extend_from_slice(RV64_BASE);
        }
        if mode == IsaMode::Rv64im {
            list.extend_from_slice(RV64_MULDIV);
        }

        let mut by_mnemonic = HashMap::with_capacity(list.len());
        for (idx, instr) in list.iter().enumerate() {
            by_mnemonic.entry(instr.mnemonic).or_insert(idx);
        }

        Self {
            mode,
            list,
            by_mnemonic,
        }
    }

    /// The mode this registry was built for.
    pub fn mode(&self) -> IsaMode {
        self.mode
    }

    /// Looks up an instruction record by mnemonic.
    pub fn by_mnemonic(&self, name: &str) -> Option<&Instruction> {
        self.by_mnemonic.get(name).map(|&idx| &self.list[idx])
    }

    /// Looks up an instruction record by its encoded 32-bit word.
    ///
    /// ECALL and EBREAK share opcode and funct3; this returns the first
    /// match (`ecall`), and the caller disambiguates with the decoded
    /// immediate.
    ///
    /// # Arguments
    ///
    /// * `code` - The raw machine-code word.
    ///
    /// # Returns
    ///
    /// The matching record, or `None` for an unknown encoding.
    pub fn by_encoded(&self, code: u32) -> Option<&Instruction> {
        let opcode = extract(code, 0, 7);
        let f3 = extract(code, 12, 3);
        let f7 = extract(code, 25, 7);

        self.list.iter().find(|instr| {
            if instr.opcode != opcode {
                return false;
            }
            match instr.format {
                InstrFormat::R => instr.funct3 == f3 && instr.funct7 == f7,
                InstrFormat::I => {
                    if instr.funct3 != f3 {
                        return false;
                    }
                    // Shift immediates reuse funct3 slots and are told apart
                    // by funct7 (SRLI vs SRAI).
                    if instr.kind.is_shift() {
                        instr.funct7 == f7
                    } else {
                        true
                    }
                }
                InstrFormat::S | InstrFormat::B => instr.funct3 == f3,
                InstrFormat::U | InstrFormat::J => true,
            }
        })
    }
}
