//! Source-line tokenizing helpers.
//!
//! Comment stripping, trimming, and operand splitting for the assembler.
//! Comments start at `#` or `;` and run to end of line.

/// Strips comments and surrounding whitespace from a source line.
///
/// May return an empty string for blank or comment-only lines.
pub fn clean_line(line: &str) -> &str {
    let uncommented = match line.find(['#', ';']) {
        Some(pos) => &line[..pos],
        None => line,
    };
    uncommented.trim()
}

/// Splits the operand portion of a line on commas, trimming each token.
///
/// An all-whitespace input yields no tokens; interior empty tokens (as in
/// `x1,,x2`) are preserved so operand-count checks can reject them.
pub fn split_operands(rest: &str) -> Vec<&str> {
    if rest.trim().is_empty() {
        return Vec::new();
    }
    rest.split(',').map(str::trim).collect()
}

/// Splits a cleaned instruction line into mnemonic and operand text.
pub fn split_mnemonic(line: &str) -> (&str, &str) {
    match line.find(char::is_whitespace) {
        Some(pos) => (&line[..pos], &line[pos + 1..]),
        None => (line, ""),
    }
}

/// Parses a signed integer with auto-detected base.
///
/// `0x`/`0X` prefixes select hexadecimal, a leading `0` selects octal, and
/// anything else is decimal; a single leading `-` negates.
pub fn parse_int(token: &str) -> Option<i64> {
    let (negative, body) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    if body.is_empty() {
        return None;
    }

    let value = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else if body.len() > 1 && body.starts_with('0') {
        i64::from_str_radix(&body[1..], 8).ok()?
    } else {
        body.parse::<i64>().ok()?
    };

    Some(if negative { -value } else { value })
}
