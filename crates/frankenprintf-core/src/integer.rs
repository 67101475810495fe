//! Integer conversions: `%d %i %o %u %x %X %b %B` and `%p`.
//!
//! Reference: ISO C23 7.23.6.1 (incl. `%b`), POSIX.1-2024 fprintf.

use crate::directive::{ConversionKind, FlagSet, LengthModifier};
use crate::error::FormatError;
use crate::layout::NumericText;
use crate::locale::LocaleConv;

/// Base and digit case of an integer conversion.
fn int_base(conversion: ConversionKind) -> (u64, bool) {
    match conversion {
        ConversionKind::Octal => (8, false),
        ConversionKind::HexLower => (16, false),
        ConversionKind::HexUpper => (16, true),
        ConversionKind::BinaryLower | ConversionKind::BinaryUpper => (2, false),
        _ => (10, false),
    }
}

/// Digits of `value` in `base`, most significant first. Zero gives `"0"`.
fn render_digits(mut value: u64, base: u64, uppercase: bool) -> Vec<u8> {
    let table: &[u8; 16] = if uppercase {
        b"0123456789ABCDEF"
    } else {
        b"0123456789abcdef"
    };
    let mut digits = Vec::with_capacity(64);
    loop {
        digits.push(table[(value % base) as usize]);
        value /= base;
        if value == 0 {
            break;
        }
    }
    digits.reverse();
    digits
}

/// Reinterpret `raw` at the argument width the length modifier selects:
/// sign-extended for signed conversions, zero-extended otherwise.
#[must_use]
pub fn apply_length(raw: u64, length: LengthModifier, signed: bool) -> (bool, u64) {
    let bits = length.integer_bits();
    let shift = 64 - bits;
    if signed {
        let value = ((raw << shift) as i64) >> shift;
        (value < 0, value.unsigned_abs())
    } else {
        (false, (raw << shift) >> shift)
    }
}

fn alt_prefix(conversion: ConversionKind) -> &'static str {
    match conversion {
        ConversionKind::HexLower => "0x",
        ConversionKind::HexUpper => "0X",
        ConversionKind::BinaryLower => "0b",
        ConversionKind::BinaryUpper => "0B",
        _ => "",
    }
}

/// Format an integer directive from the argument's raw bits.
///
/// Precision zeros stay a count in the returned text unless `'` grouping
/// has to interleave separators with them.
///
/// # Errors
///
/// [`FormatError::AllocationFailure`] when grouped precision zeros cannot
/// be allocated.
pub fn format_integer(
    conversion: ConversionKind,
    flags: FlagSet,
    precision: Option<usize>,
    length: LengthModifier,
    raw: u64,
    locale: &LocaleConv,
) -> Result<NumericText, FormatError> {
    let signed = conversion.is_signed();
    let (negative, magnitude) = apply_length(raw, length, signed);
    let (base, uppercase) = int_base(conversion);

    let digits = if magnitude == 0 && precision == Some(0) {
        Vec::new()
    } else {
        render_digits(magnitude, base, uppercase)
    };
    let mut zeros = precision.map_or(0, |p| p.saturating_sub(digits.len()));

    let mut prefix = "";
    if flags.contains(FlagSet::ALT) {
        if conversion == ConversionKind::Octal {
            if zeros == 0 && digits.first() != Some(&b'0') {
                zeros = 1;
            }
        } else if magnitude != 0 {
            prefix = alt_prefix(conversion);
        }
    }

    // Digits are ASCII.
    let digits: String = digits.into_iter().map(char::from).collect();
    let grouped = matches!(
        conversion,
        ConversionKind::SignedDecimal
            | ConversionKind::SignedInteger
            | ConversionKind::UnsignedDecimal
    ) && flags.contains(FlagSet::GROUP)
        && locale.groups_digits();

    let sign = if !signed {
        None
    } else if negative {
        Some(b'-')
    } else if flags.contains(FlagSet::PLUS) {
        Some(b'+')
    } else if flags.contains(FlagSet::SPACE) {
        Some(b' ')
    } else {
        None
    };

    let mut text = if grouped {
        let body = locale.try_group_digits(zeros, &digits)?;
        NumericText::new(sign, prefix, body)
    } else {
        NumericText::new(sign, prefix, digits).with_zeros(zeros, 0)
    };
    text.zero_pad_ok = precision.is_none();
    Ok(text)
}

/// `%p`: `0x` + lowercase hex, or `(nil)` for a null pointer.
#[must_use]
pub fn format_pointer(address: u64, precision: Option<usize>) -> NumericText {
    if address == 0 {
        let mut text = NumericText::new(None, "", String::from("(nil)"));
        text.zero_pad_ok = false;
        return text;
    }
    let digits: String = render_digits(address, 16, false)
        .into_iter()
        .map(char::from)
        .collect();
    let zeros = precision.map_or(0, |p| p.saturating_sub(digits.len()));
    let mut text = NumericText::new(None, "0x", digits).with_zeros(zeros, 0);
    text.zero_pad_ok = precision.is_none();
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::c_locale_conv;

    use ConversionKind as C;
    use LengthModifier as L;

    fn int(conversion: C, flags: FlagSet, precision: Option<usize>, length: L, value: i64) -> String {
        let t = format_integer(conversion, flags, precision, length, value as u64, &c_locale_conv())
            .unwrap();
        let mut s = String::new();
        if let Some(sign) = t.sign {
            s.push(char::from(sign));
        }
        s.push_str(t.prefix);
        s.push_str(&t.expanded_body());
        s
    }

    fn plain(conversion: C, value: i64) -> String {
        int(conversion, FlagSet::empty(), None, L::None, value)
    }

    #[test]
    fn test_format_signed_basic() {
        assert_eq!(plain(C::SignedDecimal, 42), "42");
        assert_eq!(plain(C::SignedDecimal, -42), "-42");
        assert_eq!(plain(C::SignedInteger, 0), "0");
        assert_eq!(int(C::SignedDecimal, FlagSet::PLUS, None, L::None, 5), "+5");
        assert_eq!(int(C::SignedDecimal, FlagSet::SPACE, None, L::None, 5), " 5");
        assert_eq!(
            int(C::SignedDecimal, FlagSet::SPACE | FlagSet::PLUS, None, L::None, 5),
            "+5"
        );
    }

    #[test]
    fn unsigned_conversions_ignore_sign_flags() {
        assert_eq!(int(C::UnsignedDecimal, FlagSet::PLUS, None, L::None, 5), "5");
        assert_eq!(int(C::HexLower, FlagSet::SPACE, None, L::None, 255), "ff");
    }

    #[test]
    fn test_format_unsigned_bases() {
        assert_eq!(plain(C::Octal, 8), "10");
        assert_eq!(plain(C::HexLower, 255), "ff");
        assert_eq!(plain(C::HexUpper, 255), "FF");
        assert_eq!(plain(C::BinaryLower, 5), "101");
        assert_eq!(plain(C::BinaryUpper, 0), "0");
    }

    #[test]
    fn length_modifiers_truncate_and_sign_extend() {
        assert_eq!(plain(C::UnsignedDecimal, -1), "4294967295");
        assert_eq!(int(C::UnsignedDecimal, FlagSet::empty(), None, L::L, -1), "18446744073709551615");
        assert_eq!(int(C::SignedDecimal, FlagSet::empty(), None, L::Hh, 255), "-1");
        assert_eq!(int(C::SignedDecimal, FlagSet::empty(), None, L::H, 40000), "-25536");
        assert_eq!(int(C::HexLower, FlagSet::empty(), None, L::Hh, 0x1234), "34");
        assert_eq!(int(C::SignedDecimal, FlagSet::empty(), None, L::W(16), 65535), "-1");
        assert_eq!(int(C::SignedDecimal, FlagSet::empty(), None, L::None, i64::MIN), "0");
        assert_eq!(
            int(C::SignedDecimal, FlagSet::empty(), None, L::Ll, i64::MIN),
            "-9223372036854775808"
        );
    }

    #[test]
    fn precision_zero_with_zero_value_prints_nothing() {
        assert_eq!(int(C::SignedDecimal, FlagSet::empty(), Some(0), L::None, 0), "");
        assert_eq!(int(C::HexLower, FlagSet::ALT, Some(0), L::None, 0), "");
        assert_eq!(int(C::SignedDecimal, FlagSet::PLUS, Some(0), L::None, 0), "+");
    }

    #[test]
    fn precision_pads_digits() {
        assert_eq!(int(C::SignedDecimal, FlagSet::empty(), Some(5), L::None, -42), "-00042");
        assert_eq!(int(C::HexLower, FlagSet::empty(), Some(10), L::None, 12348), "000000303c");
        let t = format_integer(C::SignedDecimal, FlagSet::ZERO, Some(3), L::None, 1, &c_locale_conv())
            .unwrap();
        assert!(!t.zero_pad_ok);
    }

    #[test]
    fn long_precision_is_not_bounded() {
        let s = int(C::SignedDecimal, FlagSet::empty(), Some(4000), L::None, 7);
        assert_eq!(s.len(), 4000);
        assert!(s.ends_with('7'));
    }

    #[test]
    fn precision_zeros_are_kept_as_a_count() {
        let huge = usize::MAX / 2;
        let t = format_integer(C::SignedDecimal, FlagSet::empty(), Some(huge), L::None, 42, &c_locale_conv())
            .unwrap();
        assert_eq!((t.body.as_str(), t.zeros, t.zeros_at), ("42", huge - 2, 0));
        let p = format_pointer(0xff, Some(huge));
        assert_eq!((p.body.as_str(), p.zeros), ("ff", huge - 2));
    }

    #[test]
    fn grouped_precision_zeros_fail_cleanly() {
        let locale = LocaleConv::new(".", ",", vec![3]);
        let err = format_integer(
            C::SignedDecimal,
            FlagSet::GROUP,
            Some(isize::MAX as usize / 2),
            L::None,
            1,
            &locale,
        )
        .unwrap_err();
        assert!(matches!(err, FormatError::AllocationFailure));

        let plain = format_integer(
            C::SignedDecimal,
            FlagSet::GROUP,
            Some(isize::MAX as usize / 2),
            L::None,
            1,
            &c_locale_conv(),
        )
        .unwrap();
        assert_eq!((plain.body.as_str(), plain.zeros), ("1", isize::MAX as usize / 2 - 1));
    }

    #[test]
    fn alternate_forms() {
        assert_eq!(int(C::Octal, FlagSet::ALT, None, L::None, 8), "010");
        assert_eq!(int(C::Octal, FlagSet::ALT, None, L::None, 0), "0");
        assert_eq!(int(C::Octal, FlagSet::ALT, Some(0), L::None, 0), "0");
        assert_eq!(int(C::Octal, FlagSet::ALT, Some(4), L::None, 8), "0010");
        assert_eq!(int(C::HexLower, FlagSet::ALT, None, L::None, 255), "0xff");
        assert_eq!(int(C::HexUpper, FlagSet::ALT, None, L::None, 255), "0XFF");
        assert_eq!(int(C::HexLower, FlagSet::ALT, None, L::None, 0), "0");
        assert_eq!(int(C::BinaryLower, FlagSet::ALT, None, L::None, 5), "0b101");
        assert_eq!(int(C::BinaryUpper, FlagSet::ALT, None, L::None, 5), "0B101");
    }

    #[test]
    fn grouping_covers_precision_zeros() {
        let locale = LocaleConv::new(".", ",", vec![3]);
        let t = format_integer(C::SignedDecimal, FlagSet::GROUP, Some(7), L::None, 1234, &locale)
            .unwrap();
        assert_eq!(t.body, "0,001,234");
        assert_eq!(t.zeros, 0);
        let hex = format_integer(C::HexLower, FlagSet::GROUP, None, L::None, 0x123456, &locale)
            .unwrap();
        assert_eq!(hex.body, "123456");
    }

    #[test]
    fn pointers() {
        assert_eq!(format_pointer(0, None).body, "(nil)");
        assert_eq!(format_pointer(0x1f, Some(4)).expanded_body(), "001f");
        assert!(!format_pointer(0, None).zero_pad_ok);
        let p = format_pointer(0xdead_beef, None);
        assert_eq!((p.prefix, p.body.as_str()), ("0x", "deadbeef"));
    }
}
