//! `%a` and `%.17g` outputs read back to the exact value; specials print
//! as words.

use frankenprintf_core::{
    Arg, Binary128, LongDouble, RenderConfig, X87Extended, printf_args, render_to_new_buffer_with,
};

fn sprintf(format: &str, args: &[Arg<'_>]) -> String {
    let out = render_to_new_buffer_with(&RenderConfig::default(), format.as_bytes(), args).unwrap();
    String::from_utf8(out).unwrap()
}

/// Parse `[-]0xH[.HHH]p[+-]D` into an f64. Exact for every value `%a` prints
/// for a binary64 input.
fn parse_hex_float(text: &str) -> Option<f64> {
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let rest = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X"))?;
    let (mantissa, exponent) = rest.split_once(['p', 'P'])?;
    let exponent: i32 = exponent.parse().ok()?;
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));

    let mut bits: u128 = 0;
    for c in int_part.chars().chain(frac_part.chars()) {
        bits = bits.checked_mul(16)? + u128::from(c.to_digit(16)?);
    }
    let scale = exponent - 4 * i32::try_from(frac_part.len()).ok()?;
    // At most 53 significant bits, so the conversion to f64 is exact.
    let mut value = bits as f64;
    let mut e = scale;
    while e > 0 {
        let step = e.min(1000);
        value *= 2f64.powi(step);
        e -= step;
    }
    while e < 0 {
        let step = (-e).min(1000);
        value /= 2f64.powi(step);
        e += step;
    }
    Some(if negative { -value } else { value })
}

fn is_nan_text(s: &str) -> bool {
    let body = s.trim().trim_start_matches(['+', '-', ' ']);
    body.eq_ignore_ascii_case("nan") || body.to_ascii_lowercase().starts_with("nan(")
}

fn is_inf_text(s: &str) -> bool {
    s.trim()
        .trim_start_matches(['+', '-', ' '])
        .eq_ignore_ascii_case("inf")
}

fn samples() -> Vec<f64> {
    let mut values = vec![
        0.1,
        -0.1,
        1.0,
        1.5,
        2.0 / 3.0,
        std::f64::consts::PI,
        -std::f64::consts::E,
        1e-300,
        123456789.0,
        f64::MAX,
        f64::MIN_POSITIVE,
        f64::from_bits(1),
        f64::from_bits(0x000F_FFFF_FFFF_FFFF),
        f64::EPSILON,
    ];
    let mut state = 0x9E37_79B9_7F4A_7C15u64;
    for _ in 0..64 {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let v = f64::from_bits(state);
        if v.is_finite() {
            values.push(v);
        }
    }
    values
}

#[test]
fn hex_float_output_round_trips() {
    for v in samples() {
        let text = sprintf("%a", &printf_args![v]);
        let back = parse_hex_float(&text).unwrap_or_else(|| panic!("unparseable {text}"));
        assert_eq!(back.to_bits(), v.to_bits(), "{v:e} printed as {text}");

        let upper = sprintf("%A", &printf_args![v]);
        assert_eq!(upper, text.to_ascii_uppercase());
    }
}

#[test]
fn seventeen_significant_digits_round_trip() {
    for v in samples() {
        let text = sprintf("%.17g", &printf_args![v]);
        let back: f64 = text.parse().unwrap();
        assert_eq!(back.to_bits(), v.to_bits(), "{v:e} printed as {text}");
    }
}

#[test]
fn hex_float_leading_digit_is_one() {
    for v in samples() {
        if v == 0.0 {
            continue;
        }
        let text = sprintf("%a", &printf_args![v.abs()]);
        assert!(text.starts_with("0x1"), "{text}");
    }
    assert_eq!(sprintf("%a", &printf_args![-0.0]), "-0x0p+0");
}

#[test]
fn specials_print_as_words() {
    for conv in ["f", "F", "e", "E", "g", "G", "a", "A"] {
        let fmt = format!("%{conv}|%+{conv}|%08{conv}|%-5{conv}|");
        let inf = sprintf(&fmt, &printf_args![f64::INFINITY, f64::INFINITY, f64::INFINITY, f64::INFINITY]);
        let fields: Vec<&str> = inf.split('|').filter(|f| !f.is_empty()).collect();
        assert_eq!(fields.len(), 4);
        assert!(fields.iter().all(|f| is_inf_text(f)), "{inf}");
        assert!(!inf.contains('0'), "zero flag must not pad specials: {inf}");

        let nan = sprintf(&fmt, &printf_args![f64::NAN, f64::NAN, -f64::NAN, f64::NAN]);
        assert!(nan.split('|').filter(|f| !f.is_empty()).all(is_nan_text), "{nan}");
        let upper = conv.chars().all(|c| c.is_ascii_uppercase());
        assert_eq!(nan.contains("NAN"), upper);
    }
    assert_eq!(sprintf("%f %f", &printf_args![f64::NEG_INFINITY, -f64::NAN]), "-inf -nan");
}

#[test]
fn test_side_parser_sanity() {
    assert_eq!(parse_hex_float("0x1p+0"), Some(1.0));
    assert_eq!(parse_hex_float("-0x1.8p+1"), Some(-3.0));
    assert_eq!(parse_hex_float("0x1p-1074"), Some(f64::from_bits(1)));
    assert_eq!(parse_hex_float("1.0"), None);
}

fn x87(sign_exponent: u16, significand: u64) -> [Arg<'static>; 1] {
    [Arg::LongDouble(LongDouble::X87(X87Extended::from_parts(sign_exponent, significand)))]
}

#[test]
fn x87_keeps_all_sixty_four_bits() {
    let one_plus_ulp = x87(0x3FFF, (1 << 63) | 1);
    assert_eq!(sprintf("%La", &one_plus_ulp), "0x1.0000000000000002p+0");
    assert_eq!(sprintf("%.25Lf", &one_plus_ulp), "1.0000000000000000001084202");
    assert_eq!(sprintf("%.20Lf", &x87(0x3FFF, 1 << 63)), "1.00000000000000000000");
}

#[test]
fn x87_extremes_print_with_four_digit_exponents() {
    assert_eq!(sprintf("%Lg", &x87(0x7FFE, u64::MAX)), "1.18973e+4932");
    assert_eq!(sprintf("%Le", &x87(0x8001, 1 << 63)), "-3.362103e-4932");
}

#[test]
fn binary128_keeps_all_one_hundred_twelve_bits() {
    let one_plus_ulp = [Arg::LongDouble(LongDouble::Quad(Binary128::from_bits(
        (0x3FFF << 112) | 1,
    )))];
    assert_eq!(sprintf("%La", &one_plus_ulp), "0x1.0000000000000000000000000001p+0");
    assert_eq!(sprintf("%LA", &one_plus_ulp), "0X1.0000000000000000000000000001P+0");
}
