//! Instruction set definitions.
//!
//! This module defines the RV32I/M and RV64I/M instruction surface. It provides:
//! 1. **Encoding constants:** Opcode and function-code values for every admitted instruction.
//! 2. **Records:** The static instruction table and per-mode registry with mnemonic and encoded-word lookup.
//! 3. **Codec:** Bit-exact operand encoding and decoding per R/I/S/B/U/J format.
//! 4. **ABI:** Register-name parsing (`x0`-`x31` plus ABI aliases).

/// Register-name parsing and display.
pub mod abi;
/// Operand encode/decode per instruction format.
pub mod codec;
/// Instruction records, kinds, and category predicates.
pub mod instr;
/// The per-ISA-mode instruction registry.
pub mod table;

pub use codec::Operands;
pub use instr::{DecodedInstr, InstrFormat, InstrKind, Instruction};
pub use table::InstructionSet;

/// Major opcodes for the admitted instruction formats.
pub mod opcodes {
    pub const OP_LOAD: u32 = 0b0000011;
    pub const OP_IMM: u32 = 0b0010011;
    pub const OP_AUIPC: u32 = 0b0010111;
    pub const OP_IMM_32: u32 = 0b0011011;
    pub const OP_STORE: u32 = 0b0100011;
    pub const OP_REG: u32 = 0b0110011;
    pub const OP_LUI: u32 = 0b0110111;
    pub const OP_REG_32: u32 = 0b0111011;
    pub const OP_BRANCH: u32 = 0b1100011;
    pub const OP_JALR: u32 = 0b1100111;
    pub const OP_JAL: u32 = 0b1101111;
    pub const OP_SYSTEM: u32 = 0b1110011;
}

/// Funct3 values, grouped by opcode family.
pub mod funct3 {
    pub const ADD_SUB: u32 = 0b000;
    pub const SLL: u32 = 0b001;
    pub const XOR: u32 = 0b100;
    pub const SRL_SRA: u32 = 0b101;
    pub const OR: u32 = 0b110;
    pub const AND: u32 = 0b111;

    pub const LB: u32 = 0b000;
    pub const LH: u32 = 0b001;
    pub const LW: u32 = 0b010;
    pub const LD: u32 = 0b011;
    pub const LBU: u32 = 0b100;
    pub const LHU: u32 = 0b101;
    pub const LWU: u32 = 0b110;

    pub const SB: u32 = 0b000;
    pub const SH: u32 = 0b001;
    pub const SW: u32 = 0b010;
    pub const SD: u32 = 0b011;

    pub const BEQ: u32 = 0b000;
    pub const BNE: u32 = 0b001;
    pub const BLT: u32 = 0b100;
    pub const BGE: u32 = 0b101;
    pub const BLTU: u32 = 0b110;
    pub const BGEU: u32 = 0b111;

    pub const MUL: u32 = 0b000;
    pub const MULH: u32 = 0b001;
    pub const MULHSU: u32 = 0b010;
    pub const MULHU: u32 = 0b011;
    pub const DIV: u32 = 0b100;
    pub const DIVU: u32 = 0b101;
    pub const REM: u32 = 0b110;
    pub const REMU: u32 = 0b111;
}

/// Funct7 values.
pub mod funct7 {
    /// Base encoding (ADD, SRL, ...).
    pub const BASE: u32 = 0b0000000;
    /// Alternate encoding (SUB, SRA, ...).
    pub const ALT: u32 = 0b0100000;
    /// Multiply/divide extension encoding.
    pub const MULDIV: u32 = 0b0000001;
}
