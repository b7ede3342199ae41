//! Helpers for Ethereum hex quantities (`0x`-prefixed, no leading zeros).

use std::num::ParseIntError;

/// Parse a hex quantity (with or without `0x`) to `u64`.
pub fn parse_u64(s: &str) -> Result<u64, ParseIntError> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u64::from_str_radix(digits, 16)
}

/// Encode `n` as a lowercase hex quantity, e.g. `31337` → `"0x7a69"`.
pub fn quantity(n: u64) -> String {
    format!("0x{n:x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prefixed_and_bare() {
        assert_eq!(parse_u64("0x7a69").unwrap(), 31337);
        assert_eq!(parse_u64("0XFF").unwrap(), 255);
        assert_eq!(parse_u64("1234").unwrap(), 0x1234);
        assert!(parse_u64("0xzz").is_err());
        assert!(parse_u64("").is_err());
    }

    #[test]
    fn quantity_has_no_leading_zeros() {
        assert_eq!(quantity(0), "0x0");
        assert_eq!(quantity(1), "0x1");
        assert_eq!(quantity(31337), "0x7a69");
    }
}
