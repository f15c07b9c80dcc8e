//! Program execution.
//!
//! This module hosts the functional interpreter and its diagnostic
//! companions. It provides:
//! 1. **Interpreter:** Cycle-free execution of a decoded program against the
//!    register file and memory, with single-step and run-to-stop semantics.
//! 2. **Breakpoints:** A bounded PC ↔ source-line table.
//! 3. **Shadow call stack:** Call/return tracking for diagnostics.

/// Bounded breakpoint table.
pub mod breakpoints;
/// Call-frame tracking.
pub mod callstack;
/// The functional interpreter.
pub mod interpreter;

pub use breakpoints::{BreakpointTable, MAX_BREAKPOINTS};
pub use callstack::{CallFrame, ShadowCallStack};
pub use interpreter::{Interpreter, StopReason};
