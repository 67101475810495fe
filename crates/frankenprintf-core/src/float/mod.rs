//! Floating-point conversions: `%f %F %e %E %g %G %a %A`.
//!
//! Values are decomposed exactly ([`ieee`]), expanded to decimal with big
//! integers ([`decimal`]) or printed from the binary significand ([`hex`]),
//! then rounded once in the configured [`RoundingMode`](crate::config::RoundingMode).

pub mod decimal;
pub mod hex;
pub mod ieee;

use crate::args::Arg;
use crate::config::RenderConfig;
use crate::directive::{ConversionKind, FlagSet};
use crate::layout::NumericText;

use self::decimal::{Decimal, FloatParts};
use self::ieee::{Decoded, FloatClass};

/// Default precision for `f e g` when none is given.
pub const DEFAULT_PRECISION: usize = 6;

/// Decode a floating-point argument; `None` for other argument kinds.
#[must_use]
pub fn decode_arg(value: &Arg<'_>) -> Option<Decoded> {
    match *value {
        Arg::Float(v) => Some(ieee::decode_f32(v)),
        Arg::Double(v) => Some(ieee::decode_f64(v)),
        Arg::LongDouble(v) => Some(v.decode()),
        _ => None,
    }
}

fn sign_of(negative: bool, flags: FlagSet) -> Option<u8> {
    if negative {
        Some(b'-')
    } else if flags.contains(FlagSet::PLUS) {
        Some(b'+')
    } else if flags.contains(FlagSet::SPACE) {
        Some(b' ')
    } else {
        None
    }
}

/// Format one float directive.
#[must_use]
pub fn format_float(
    conversion: ConversionKind,
    flags: FlagSet,
    precision: Option<usize>,
    value: Decoded,
    config: &RenderConfig,
) -> NumericText {
    let upper = conversion.is_uppercase();
    let sign = sign_of(value.negative, flags);

    let (mantissa, exp2) = match value.class {
        FloatClass::Zero => (0, 0),
        FloatClass::Finite { mantissa, exp2 } => (mantissa, exp2),
        FloatClass::Infinite => return special(sign, "inf", upper),
        FloatClass::Nan { payload } => {
            let text = if config.nan_payload && payload != 0 {
                format!("nan(0x{payload:x})")
            } else {
                String::from("nan")
            };
            return special(sign, &text, upper);
        }
    };

    let alt = flags.contains(FlagSet::ALT);
    let mode = config.rounding;
    let negative = value.negative;
    let (parts, prefix) = match conversion {
        ConversionKind::HexFloatLower | ConversionKind::HexFloatUpper => (
            hex::format_hex(mantissa, exp2, precision, negative, mode, upper),
            if upper { "0X" } else { "0x" },
        ),
        _ => {
            let dec = Decimal::exact(mantissa, exp2);
            let p = precision.unwrap_or(DEFAULT_PRECISION);
            let parts = match conversion {
                ConversionKind::ExponentLower | ConversionKind::ExponentUpper => {
                    decimal::format_exponent(&dec, p, negative, mode)
                }
                ConversionKind::GeneralLower | ConversionKind::GeneralUpper => {
                    decimal::format_general(&dec, p, alt, negative, mode)
                }
                _ => decimal::format_fixed(&dec, p, negative, mode),
            };
            (parts, "")
        }
    };

    let (body, zeros_at) = assemble(&parts, conversion, flags, config);
    NumericText::new(sign, prefix, body).with_zeros(parts.frac_zeros, zeros_at)
}

fn special(sign: Option<u8>, text: &str, upper: bool) -> NumericText {
    let body = if upper {
        text.to_ascii_uppercase()
    } else {
        text.to_string()
    };
    let mut out = NumericText::new(sign, "", body);
    out.is_special = true;
    out.zero_pad_ok = false;
    out
}

/// Join the digit strings with the locale decimal point, grouping and the
/// exponent suffix. Also returns where the deferred fraction zeros go.
fn assemble(
    parts: &FloatParts,
    conversion: ConversionKind,
    flags: FlagSet,
    config: &RenderConfig,
) -> (String, usize) {
    let locale = &config.locale;
    let hex = matches!(
        conversion,
        ConversionKind::HexFloatLower | ConversionKind::HexFloatUpper
    );
    let mut body = if flags.contains(FlagSet::GROUP) && !hex && parts.exp.is_none() {
        locale.group_digits(&parts.int_part)
    } else {
        parts.int_part.clone()
    };
    if parts.frac_len() > 0 || flags.contains(FlagSet::ALT) {
        body.push_str(&locale.decimal_point);
        body.push_str(&parts.frac);
    }
    let zeros_at = body.len();
    if let Some(exp) = parts.exp {
        let letter = match (hex, conversion.is_uppercase()) {
            (true, false) => 'p',
            (true, true) => 'P',
            (false, false) => 'e',
            (false, true) => 'E',
        };
        body.push(letter);
        body.push(if exp < 0 { '-' } else { '+' });
        let digits = exp.unsigned_abs();
        if hex {
            body.push_str(&digits.to_string());
        } else {
            body.push_str(&format!("{digits:02}"));
        }
    }
    (body, zeros_at)
}
