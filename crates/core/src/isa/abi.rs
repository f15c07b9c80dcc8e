//! Register names.
//!
//! Parsing of `x0`-`x31` and the standard ABI aliases, plus display names
//! used by the disassembler and register dumps.

/// ABI register names for x0-x31.
pub const REG_NAMES: [&str; 32] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

/// Returns the ABI name for a register index.
#[inline]
pub fn reg_name(idx: u32) -> &'static str {
    REG_NAMES.get(idx as usize).copied().unwrap_or("x??")
}

/// Parses a register token.
///
/// Accepts the numeric form `x0`-`x31` and every standard ABI alias
/// (including `fp` for `x8`).
///
/// # Arguments
///
/// * `token` - The operand token, already trimmed.
///
/// # Returns
///
/// The register index, or `None` for an unrecognised token.
pub fn parse_register(token: &str) -> Option<u32> {
    if let Some(rest) = token.strip_prefix('x') {
        if let Ok(n) = rest.parse::<u32>() {
            // Reject forms like "x07" so register tokens stay canonical.
            if n < 32 && rest == n.to_string() {
                return Some(n);
            }
        }
        return None;
    }

    if token == "fp" {
        return Some(8);
    }
    REG_NAMES
        .iter()
        .position(|&name| name == token)
        .map(|idx| idx as u32)
}
