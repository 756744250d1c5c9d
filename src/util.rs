/// Coerce raw range-field text into a range bound.
///
/// Parsing is lenient: leading whitespace and an optional sign are accepted and
/// trailing garbage after the leading digits is ignored. Anything that does not
/// yield a positive number becomes 1. Digit runs too large for `u64` saturate.
pub fn coerce_range_value(raw: &str) -> u64 {
    let trimmed = raw.trim_start();
    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let digits_end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    let digits = &unsigned[..digits_end];

    if negative || digits.is_empty() {
        return 1;
    }

    digits.parse::<u64>().unwrap_or(u64::MAX).max(1)
}

/// Parse a typed answer. Empty input and a bare minus sign are not answers yet.
pub fn parse_answer(raw: &str) -> Option<u128> {
    match raw.trim() {
        "" | "-" => None,
        trimmed => trimmed.parse::<u128>().ok(),
    }
}

/// Format a second count as `m:ss`
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
