//! `%a`/`%A` hexadecimal floating point.
//!
//! The significand is normalised so the digit before the point is `1`
//! (binary32/64/80/128 alike). Rounding to an explicit precision happens on
//! the binary significand and can carry into the leading digit, giving `2`.

use super::decimal::FloatParts;
use crate::config::RoundingMode;

/// Fraction nibbles available from a `u128` significand.
const MAX_DIGITS: usize = 32;

/// Hex digits of `mantissa * 2^exp2` (`mantissa` may be zero).
#[must_use]
pub fn format_hex(
    mantissa: u128,
    exp2: i32,
    precision: Option<usize>,
    negative: bool,
    mode: RoundingMode,
    upper: bool,
) -> FloatParts {
    if mantissa == 0 {
        return FloatParts {
            int_part: String::from("0"),
            frac: String::new(),
            frac_zeros: precision.unwrap_or(0),
            exp: Some(0),
        };
    }

    let lz = mantissa.leading_zeros();
    let exponent = exp2 + (127 - lz) as i32;
    // Bits below the leading 1, left-aligned.
    let frac = (mantissa << lz) << 1;
    let minimal = if frac == 0 {
        0
    } else {
        (128 - frac.trailing_zeros() as usize).div_ceil(4)
    };

    let mut lead = 1u8;
    let (frac, digits) = match precision {
        Some(p) if p < minimal => {
            let kept = if p == 0 { 0 } else { frac >> (128 - 4 * p) };
            let rest = frac << (4 * p);
            let half = 1u128 << 127;
            let last_odd = p == 0 || kept & 1 == 1;
            let mut rounded = kept;
            if mode.rounds_up(negative, rest > half, rest == half, last_odd) {
                rounded += 1;
                if p == 0 || rounded == 1u128 << (4 * p) {
                    lead = 2;
                    rounded = 0;
                }
            }
            let aligned = if p == 0 { 0 } else { rounded << (128 - 4 * p) };
            (aligned, p)
        }
        Some(p) => (frac, p),
        None => (frac, minimal),
    };

    let stored = digits.min(MAX_DIGITS);
    let mut text = String::with_capacity(stored);
    for i in 0..stored {
        let nibble = ((frac >> (124 - 4 * i)) & 0xF) as u32;
        let c = char::from_digit(nibble, 16).unwrap_or('0');
        text.push(if upper { c.to_ascii_uppercase() } else { c });
    }

    FloatParts {
        int_part: char::from(b'0' + lead).to_string(),
        frac: text,
        frac_zeros: digits - stored,
        exp: Some(exponent),
    }
}
