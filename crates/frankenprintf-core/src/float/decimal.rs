//! Exact decimal expansion and the `%f`/`%e`/`%g` digit generators.

use crate::bignum::BigUint;
use crate::config::RoundingMode;

/// Exact decimal value `0.d0 d1 d2 ... * 10^(exp10 + 1)`, i.e. `d0` has place
/// value `10^exp10`. Digits are `0..=9` with no trailing zeros; zero has no
/// digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decimal {
    pub digits: Vec<u8>,
    pub exp10: i32,
}

/// Digit strings of a formatted float, before sign, locale and exponent
/// decoration. The fraction is `frac` followed by `frac_zeros` zeros.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloatParts {
    pub int_part: String,
    pub frac: String,
    pub frac_zeros: usize,
    pub exp: Option<i32>,
}

impl FloatParts {
    /// Total fraction digits.
    #[must_use]
    pub fn frac_len(&self) -> usize {
        self.frac.len().saturating_add(self.frac_zeros)
    }
}

/// Digits past this many places below the point are exact for every
/// supported format (binary128 subnormals end near 10^-16494).
const MAX_EXACT_PLACES: usize = 1 << 15;

impl Decimal {
    #[must_use]
    pub fn zero() -> Self {
        Self {
            digits: Vec::new(),
            exp10: 0,
        }
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.digits.is_empty()
    }

    /// Expand `mantissa * 2^exp2` exactly.
    #[must_use]
    pub fn exact(mantissa: u128, exp2: i32) -> Self {
        if mantissa == 0 {
            return Self::zero();
        }
        let tz = mantissa.trailing_zeros();
        let mantissa = mantissa >> tz;
        let exp2 = exp2 + tz as i32;

        let mut big = BigUint::from_u128(mantissa);
        let scale = if exp2 >= 0 {
            big.shl(exp2.unsigned_abs());
            0
        } else {
            big.mul_pow5(exp2.unsigned_abs());
            exp2
        };
        let mut digits = big.to_decimal();
        let exp10 = digits.len() as i32 - 1 + scale;
        while digits.last() == Some(&0) {
            digits.pop();
        }
        Self { digits, exp10 }
    }

    /// Digit at place value `10^place`.
    #[must_use]
    pub fn digit_at(&self, place: i32) -> u8 {
        let index = i64::from(self.exp10) - i64::from(place);
        usize::try_from(index)
            .ok()
            .and_then(|i| self.digits.get(i).copied())
            .unwrap_or(0)
    }

    /// Place value of the last non-zero digit.
    fn last_place(&self) -> i32 {
        self.exp10 - (self.digits.len() as i32 - 1)
    }

    /// Round to a multiple of `10^keep_exp` in the given mode.
    #[must_use]
    pub fn round_at(&self, keep_exp: i32, negative: bool, mode: RoundingMode) -> Self {
        if self.is_zero() {
            return self.clone();
        }
        let keep = i64::from(self.exp10) - i64::from(keep_exp) + 1;
        if keep >= self.digits.len() as i64 {
            return self.clone();
        }

        let (kept, first, rest_nonzero) = if keep < 0 {
            // The first discarded digit sits above every stored digit.
            (&self.digits[..0], 0, true)
        } else {
            let keep = keep as usize;
            (
                &self.digits[..keep],
                self.digits[keep],
                self.digits[keep + 1..].iter().any(|&d| d != 0),
            )
        };
        let above_half = first > 5 || (first == 5 && rest_nonzero);
        let tie = first == 5 && !rest_nonzero;
        let last_odd = kept.last().is_some_and(|d| d % 2 == 1);

        let mut digits = kept.to_vec();
        if mode.rounds_up(negative, above_half, tie, last_odd) {
            match digits.iter().rposition(|&d| d != 9) {
                Some(pos) => {
                    digits.truncate(pos + 1);
                    digits[pos] += 1;
                    Self {
                        digits,
                        exp10: self.exp10,
                    }
                }
                None => Self {
                    digits: vec![1],
                    exp10: keep_exp + digits.len() as i32,
                },
            }
        } else {
            while digits.last() == Some(&0) {
                digits.pop();
            }
            if digits.is_empty() {
                Self::zero()
            } else {
                Self {
                    digits,
                    exp10: self.exp10,
                }
            }
        }
    }

    fn digit_run(&self, from: i32, count: usize) -> String {
        (0..count)
            .map(|i| char::from(b'0' + self.digit_at(from - i as i32)))
            .collect()
    }
}

fn clamp_places(precision: usize) -> i32 {
    precision.min(MAX_EXACT_PLACES) as i32
}

/// `%f`: `precision` digits after the point.
#[must_use]
pub fn format_fixed(
    value: &Decimal,
    precision: usize,
    negative: bool,
    mode: RoundingMode,
) -> FloatParts {
    let rounded = value.round_at(-clamp_places(precision), negative, mode);
    fixed_parts(&rounded, precision)
}

fn fixed_parts(rounded: &Decimal, precision: usize) -> FloatParts {
    let int_part = if rounded.is_zero() || rounded.exp10 < 0 {
        String::from("0")
    } else {
        rounded.digit_run(rounded.exp10, rounded.exp10 as usize + 1)
    };
    let (frac, frac_zeros) = fraction_digits(rounded, precision);
    FloatParts {
        int_part,
        frac,
        frac_zeros,
        exp: None,
    }
}

/// Stored fraction digits and the count of zeros that follow them.
fn fraction_digits(rounded: &Decimal, precision: usize) -> (String, usize) {
    let generated = precision.min(significant_fraction(rounded));
    (rounded.digit_run(-1, generated), precision - generated)
}

/// `%e`: one digit before the point, `precision` after.
#[must_use]
pub fn format_exponent(
    value: &Decimal,
    precision: usize,
    negative: bool,
    mode: RoundingMode,
) -> FloatParts {
    let rounded = value.round_at(value.exp10 - clamp_places(precision), negative, mode);
    exponent_parts(&rounded, precision)
}

fn exponent_parts(rounded: &Decimal, precision: usize) -> FloatParts {
    if rounded.is_zero() {
        return FloatParts {
            int_part: String::from("0"),
            frac: String::new(),
            frac_zeros: precision,
            exp: Some(0),
        };
    }
    let available = rounded.digits.len() - 1;
    let generated = precision.min(available);
    FloatParts {
        int_part: rounded.digit_run(rounded.exp10, 1),
        frac: rounded.digit_run(rounded.exp10 - 1, generated),
        frac_zeros: precision - generated,
        exp: Some(rounded.exp10),
    }
}

/// `%g`: `precision` significant digits, style chosen by the C99 rule.
/// Without `alt`, trailing fractional zeros and a bare point are removed.
#[must_use]
pub fn format_general(
    value: &Decimal,
    precision: usize,
    alt: bool,
    negative: bool,
    mode: RoundingMode,
) -> FloatParts {
    let p = precision.max(1);
    let places = clamp_places(p);
    let rounded = value.round_at(value.exp10 - places + 1, negative, mode);
    let x = if rounded.is_zero() { 0 } else { rounded.exp10 };

    let mut parts = if places > x && x >= -4 {
        // Rounding again at the same place is exact.
        let frac_digits = (i64::from(places) - 1 - i64::from(x)) as usize;
        let frac_digits = if alt {
            frac_digits
        } else {
            frac_digits.min(significant_fraction(&rounded))
        };
        fixed_parts(&rounded, frac_digits)
    } else {
        let frac_digits = if alt {
            p - 1
        } else {
            (p - 1).min(rounded.digits.len().saturating_sub(1))
        };
        exponent_parts(&rounded, frac_digits)
    };

    if !alt {
        let trimmed = parts.frac.trim_end_matches('0').len();
        parts.frac.truncate(trimmed);
        parts.frac_zeros = 0;
    }
    parts
}

fn significant_fraction(rounded: &Decimal) -> usize {
    if rounded.is_zero() {
        0
    } else {
        usize::try_from(-i64::from(rounded.last_place())).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::float::ieee::{FloatClass, decode_f64};

    fn dec(v: f64) -> Decimal {
        match decode_f64(v).class {
            FloatClass::Zero => Decimal::zero(),
            FloatClass::Finite { mantissa, exp2 } => Decimal::exact(mantissa, exp2),
            other => panic!("not finite: {other:?}"),
        }
    }

    fn text(p: &FloatParts) -> String {
        let mut s = p.int_part.clone();
        if p.frac_len() > 0 {
            s.push('.');
            s.push_str(&p.frac);
            s.extend(std::iter::repeat_n('0', p.frac_zeros));
        }
        if let Some(e) = p.exp {
            s.push_str(&format!("e{e}"));
        }
        s
    }

    fn fixed(v: f64, p: usize) -> String {
        text(&format_fixed(&dec(v), p, v.is_sign_negative(), RoundingMode::NearestEven))
    }

    fn general(v: f64, p: usize) -> String {
        text(&format_general(&dec(v), p, false, v.is_sign_negative(), RoundingMode::NearestEven))
    }

    #[test]
    fn exact_expansion() {
        let d = dec(0.1);
        assert_eq!(d.exp10, -1);
        assert_eq!(d.digits.len(), 55);
        let one = dec(1.0);
        assert_eq!((one.digits.clone(), one.exp10), (vec![1], 0));
        let big = dec(1e22);
        assert_eq!((big.digits.clone(), big.exp10), (vec![1], 22));
    }

    #[test]
    fn fixed_rounding_is_exact() {
        assert_eq!(fixed(0.125, 2), "0.12");
        assert_eq!(fixed(0.375, 2), "0.38");
        assert_eq!(fixed(2.5, 0), "2");
        assert_eq!(fixed(3.5, 0), "4");
        // 0.15 is really 0.1499999999999999944...
        assert_eq!(fixed(0.15, 1), "0.1");
        assert_eq!(fixed(9.999, 2), "10.00");
        assert_eq!(fixed(0.0004, 2), "0.00");
        assert_eq!(fixed(1e21, 0), "1000000000000000000000");
        assert_eq!(fixed(0.0, 3), "0.000");
    }

    #[test]
    fn fixed_keeps_exact_digits_at_high_precision() {
        assert_eq!(
            fixed(0.1, 60),
            "0.100000000000000005551115123125782702118158340454101562500000"
        );
    }

    #[test]
    fn directed_rounding_modes() {
        let d = dec(0.1);
        let up = format_fixed(&d, 0, false, RoundingMode::Upward);
        assert_eq!(up.int_part, "1");
        let down = format_fixed(&d, 0, true, RoundingMode::Downward);
        assert_eq!(down.int_part, "1");
        let trunc = format_fixed(&dec(0.99), 1, false, RoundingMode::TowardZero);
        assert_eq!(text(&trunc), "0.9");
        let tiny_up = format_fixed(&dec(1e-300), 3, false, RoundingMode::Upward);
        assert_eq!(text(&tiny_up), "0.001");
    }

    #[test]
    fn exponent_style() {
        let e = |v: f64, p| text(&format_exponent(&dec(v), p, false, RoundingMode::NearestEven));
        assert_eq!(e(12345.678, 2), "1.23e4");
        assert_eq!(e(9.96, 1), "1.0e1");
        assert_eq!(e(0.0, 2), "0.00e0");
        assert_eq!(e(1e-300, 0), "1e-300");
        assert_eq!(e(5e-324, 3), "4.941e-324");
    }

    #[test]
    fn general_style_follows_c99_x_rule() {
        assert_eq!(general(100000.0, 6), "100000");
        assert_eq!(general(1000000.0, 6), "1e6");
        assert_eq!(general(0.0001, 6), "0.0001");
        assert_eq!(general(0.00001, 6), "1e-5");
        assert_eq!(general(123456789.0, 6), "1.23457e8");
        assert_eq!(general(999999.5, 6), "1e6");
        assert_eq!(general(0.5, 0), "0.5");
        assert_eq!(general(1.5, 0), "2");
        assert_eq!(general(0.0, 6), "0");
        assert_eq!(general(3.14159, 3), "3.14");
    }

    #[test]
    fn general_alt_keeps_zeros() {
        let p = format_general(&dec(1.0), 6, true, false, RoundingMode::NearestEven);
        assert_eq!(text(&p), "1.00000");
        let z = format_general(&Decimal::zero(), 3, true, false, RoundingMode::NearestEven);
        assert_eq!(text(&z), "0.00");
    }

    #[test]
    fn trailing_zeros_are_counted_not_stored() {
        let huge = usize::MAX / 2;
        let f = format_fixed(&dec(1.5), huge, false, RoundingMode::NearestEven);
        assert_eq!((f.int_part.as_str(), f.frac.as_str()), ("1", "5"));
        assert_eq!(f.frac_zeros, huge - 1);

        let e = format_exponent(&dec(0.0), huge, false, RoundingMode::NearestEven);
        assert_eq!((e.frac.as_str(), e.frac_zeros), ("", huge));

        let g = format_general(&dec(0.25), huge, true, false, RoundingMode::NearestEven);
        assert_eq!(g.frac, "25");
        assert!(g.frac_zeros > 0);

        // 2^-1074 has exactly 1074 fraction digits.
        let tiny = format_fixed(&dec(f64::from_bits(1)), 40_000, false, RoundingMode::NearestEven);
        assert_eq!(tiny.frac_len(), 40_000);
        assert_eq!(tiny.frac.len(), 1074);
    }

    #[test]
    fn huge_general_precision_does_not_materialize_zeros() {
        let p = format_general(&dec(0.5), usize::MAX / 2, false, false, RoundingMode::NearestEven);
        assert_eq!(text(&p), "0.5");
    }
}
