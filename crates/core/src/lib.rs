//! Educational RISC-V simulator library.
//!
//! This crate implements a teaching simulator for RV32I/M and RV64I/M with the following:
//! 1. **Codec:** Bit-exact assembly ⇄ machine-code translation for the R/I/S/B/U/J formats.
//! 2. **Assembler/Disassembler:** Two-pass translation with label resolution and the label-aware inverse.
//! 3. **Interpreter:** Cycle-free execution over a 64-bit register file and sparse memory, with breakpoints and a shadow call stack.
//! 4. **Cache:** A set-associative data-cache model with LRU/FIFO/RANDOM replacement, WB/WT write policies, and a per-access trace.
//! 5. **Hazard analysis:** A static RAW/WAW/WAR/control/structural/cache scan with stall-cycle estimates.

/// Assembler, disassembler, and label table.
pub mod asm;
/// Set-associative data-cache model.
pub mod cache;
/// Bit utilities and error types.
pub mod common;
/// Cache configuration and ISA mode selection.
pub mod config;
/// Interpreter, breakpoints, and shadow call stack.
pub mod exec;
/// Instruction table, codec, and register names.
pub mod isa;
/// Sparse byte-addressable memory.
pub mod mem;
/// Static pipeline hazard analysis.
pub mod pipeline;

/// Two-pass assembler; produces machine code, decoded instructions, labels, and the line map.
pub use crate::asm::{Assembler, Disassembler, Program};
/// The data-cache model; construct from a validated [`CacheConfig`].
pub use crate::cache::Cache;
/// Cache geometry/policy configuration and the ISA mode tag.
pub use crate::config::{CacheConfig, IsaMode};
/// The execution engine; drives a [`Program`] to completion or a stop.
pub use crate::exec::{Interpreter, StopReason};
/// Sparse memory and the access-width selector.
pub use crate::mem::{MemSize, Memory};
/// The static hazard analyzer and its pipeline-depth selector.
pub use crate::pipeline::{HazardAnalyzer, PipelineKind};
