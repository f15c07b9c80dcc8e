//! Library error definitions.
//!
//! This module defines the error types surfaced to callers. It provides:
//! 1. **Assembly errors:** Lexical, syntactic, and semantic failures, each tagged with a source line.
//! 2. **Configuration errors:** Invalid cache parameters or an unreadable config file.
//! 3. **Breakpoint errors:** Failed set/remove requests on the interpreter.
//!
//! Runtime execution itself has no error type: division by zero, unmapped
//! loads, and shadow-stack mismatches all recover locally.

use thiserror::Error;

/// Errors reported by the assembler and disassembler.
///
/// The `line` fields are 1-based source line numbers. Assembly halts at the
/// first error; artifacts produced before the failure remain readable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AsmError {
    /// The mnemonic is not part of the selected ISA mode.
    #[error("[line {line}] unknown instruction: {mnemonic}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    /// The operand count does not match the instruction format.
    #[error("[line {line}] expected {expected} operands for {mnemonic}, got {got}")]
    OperandCount {
        line: usize,
        mnemonic: String,
        expected: &'static str,
        got: usize,
    },

    /// A register token is neither `x0`-`x31` nor a known ABI name.
    #[error("[line {line}] invalid register: {token}")]
    InvalidRegister { token: String, line: usize },

    /// An immediate token parses as neither a number nor a known label.
    #[error("[line {line}] invalid immediate: {token}")]
    InvalidImmediate { token: String, line: usize },

    /// A label reference with no matching definition.
    #[error("[line {line}] undefined label: {token}")]
    UndefinedLabel { token: String, line: usize },

    /// A memory operand not of the form `imm(reg)`.
    #[error("[line {line}] invalid memory operand: {token}")]
    InvalidMemoryOperand { token: String, line: usize },

    /// A machine word that matches no instruction encoding (disassembler).
    #[error("unknown machine code {code:#010x} at pc {pc:#x}")]
    UnknownMachineCode { pc: u32, code: u32 },

    /// A machine-code file line that is not an 8-digit hex word.
    #[error("[line {line}] invalid machine code: {token}")]
    BadMachineCode { token: String, line: usize },
}

/// Errors produced while validating a cache configuration or ISA mode tag.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// The config text did not contain exactly five tokens.
    #[error("cache config: expected 5 fields, got {0}")]
    FieldCount(usize),

    /// A numeric field failed to parse.
    #[error("cache config: invalid number: {0}")]
    BadNumber(String),

    /// Cache size outside (0, 1 MiB].
    #[error("cache size must be > 0 and <= 1 MiB, got {0}")]
    SizeOutOfRange(u32),

    /// Block size that is zero, not a power of two, or larger than the cache.
    #[error("block size must be a positive power of two no larger than the cache, got {0}")]
    BadBlockSize(u32),

    /// Associativity outside {0, 1, powers of two <= 16 dividing the block count}.
    #[error("associativity must be 0 (fully associative) or a power of two <= 16 dividing the block count, got {0}")]
    BadAssociativity(u32),

    /// Unrecognised replacement policy token.
    #[error("unknown replacement policy: {0}")]
    UnknownReplacementPolicy(String),

    /// Unrecognised write policy token.
    #[error("unknown write policy: {0}")]
    UnknownWritePolicy(String),

    /// Unrecognised ISA mode tag.
    #[error("unknown ISA mode: {0}")]
    UnknownIsaMode(String),
}

/// Errors reported when setting or removing a breakpoint.
///
/// These are negative acknowledgements, not faults: the interpreter state is
/// unchanged when any of them is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BreakpointError {
    /// The source line produced no instruction.
    #[error("no instruction at line {0}")]
    NoSuchLine(usize),

    /// A breakpoint is already set at this line.
    #[error("breakpoint already set at line {0}")]
    AlreadySet(usize),

    /// The breakpoint table is full.
    #[error("breakpoint limit ({0}) reached")]
    LimitReached(usize),

    /// No breakpoint exists at this line to remove.
    #[error("no breakpoint set at line {0}")]
    NotSet(usize),
}
