//! Common types shared across the simulator.
//!
//! This module provides:
//! 1. **Bit utilities:** Field extraction/packing and power-of-two helpers used by the codec and cache.
//! 2. **Errors:** The library error enums surfaced by the assembler, configuration, and breakpoint layers.

/// Bitfield extraction, packing, and power-of-two helpers.
pub mod bits;
/// Error enums for assembly, configuration, and breakpoint management.
pub mod error;

pub use error::{AsmError, BreakpointError, ConfigError};
