//! Static pipeline hazard analysis.
//!
//! This module inspects a decoded program without executing it. It provides:
//! 1. **Hazard records:** RAW/WAW/WAR data hazards, control hazards,
//!    structural conflicts, and estimated cache-miss penalties.
//! 2. **The analyzer:** A pairwise scan with stall formulas parameterized by
//!    pipeline depth and operand forwarding.
//! 3. **Statistics:** Per-category stall totals and the effective-CPI
//!    estimate.

/// The pairwise scan and stall formulas.
pub mod analyzer;
/// Hazard record and statistics types.
pub mod hazard;

pub use analyzer::HazardAnalyzer;
pub use hazard::{Hazard, HazardKind, HazardSite, StallStats};

use std::fmt;

/// Modeled pipeline organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineKind {
    /// Fetch, Decode/Execute, Writeback.
    ThreeStage,
    /// Fetch, Decode, Execute, Memory, Writeback.
    #[default]
    FiveStage,
    /// Fetch, Decode, Rename, Issue, Execute, Memory, Writeback.
    SevenStage,
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ThreeStage => "3-Stage",
            Self::FiveStage => "5-Stage",
            Self::SevenStage => "7-Stage",
        })
    }
}
