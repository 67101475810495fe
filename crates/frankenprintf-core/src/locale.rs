//! Locale data consumed by the engine.
//!
//! Locale databases are not loaded here. Callers describe the numeric
//! conventions (`LC_NUMERIC`) and the multibyte codeset (`LC_CTYPE`) they want
//! through [`LocaleConv`]; the "C" locale is the default.

use crate::error::FormatError;

/// POSIX `CHAR_MAX`: a grouping element with this value stops grouping.
const CHAR_MAX: u8 = 127;

/// Multibyte encoding of narrow strings in the execution locale.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Charset {
    /// UTF-8 (`C.UTF-8`, `en_US.UTF-8`, ...).
    #[default]
    Utf8,
    /// ISO-8859-1: every byte is the code point of the same value.
    Latin1,
    /// 7-bit ASCII, the strict reading of the "C" locale.
    Ascii,
}

impl Charset {
    /// Parse a codeset name as returned by `nl_langinfo(CODESET)`.
    #[must_use]
    pub fn from_codeset(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "utf8" => Some(Self::Utf8),
            "iso88591" | "latin1" | "l1" => Some(Self::Latin1),
            "ascii" | "usascii" | "ansix341968" => Some(Self::Ascii),
            _ => None,
        }
    }

    /// Largest code point representable in one narrow character, if bounded.
    #[must_use]
    pub const fn max_code_point(self) -> u32 {
        match self {
            Self::Utf8 => char::MAX as u32,
            Self::Latin1 => 0xFF,
            Self::Ascii => 0x7F,
        }
    }
}

/// Numeric formatting conventions (the `LC_NUMERIC` part of `struct lconv`)
/// plus the codeset used for multibyte conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleConv {
    /// Decimal-point string.
    pub decimal_point: String,
    /// Thousands separator; empty disables the `'` flag.
    pub thousands_sep: String,
    /// Grouping specification, one group size per element (POSIX encoding).
    pub grouping: Vec<u8>,
    /// Narrow-string codeset.
    pub charset: Charset,
}

impl Default for LocaleConv {
    fn default() -> Self {
        c_locale_conv()
    }
}

impl LocaleConv {
    /// Conventions with the given separators and grouping, in UTF-8.
    #[must_use]
    pub fn new(
        decimal_point: impl Into<String>,
        thousands_sep: impl Into<String>,
        grouping: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            decimal_point: decimal_point.into(),
            thousands_sep: thousands_sep.into(),
            grouping: grouping.into(),
            charset: Charset::Utf8,
        }
    }

    /// Replace the codeset.
    #[must_use]
    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    /// Whether `'` changes anything: a separator and at least one group.
    #[must_use]
    pub fn groups_digits(&self) -> bool {
        !self.thousands_sep.is_empty()
            && self.grouping.first().is_some_and(|&g| g != 0 && g < CHAR_MAX)
    }

    /// Insert the thousands separator into a run of ASCII digits.
    ///
    /// Groups are counted from the right. The last grouping element repeats;
    /// `CHAR_MAX` ends grouping and leaves the remaining digits in one group.
    #[must_use]
    pub fn group_digits(&self, digits: &str) -> String {
        let grouping = Grouping::new(&self.grouping);
        let mut out = String::with_capacity(digits.len());
        self.write_grouped(&grouping, 0, digits, &mut out);
        out
    }

    /// Group `zeros` leading zeros followed by `digits`, allocating the
    /// result fallibly.
    ///
    /// # Errors
    ///
    /// [`FormatError::AllocationFailure`] when the grouped text does not fit
    /// in memory.
    pub fn try_group_digits(&self, zeros: usize, digits: &str) -> Result<String, FormatError> {
        let grouping = Grouping::new(&self.grouping);
        let len = zeros
            .checked_add(digits.len())
            .ok_or(FormatError::AllocationFailure)?;
        let separators = if self.thousands_sep.is_empty() {
            0
        } else {
            grouping.count(len)
        };
        let total = separators
            .checked_mul(self.thousands_sep.len())
            .and_then(|extra| extra.checked_add(len))
            .ok_or(FormatError::AllocationFailure)?;
        let mut out = String::new();
        out.try_reserve_exact(total)
            .map_err(|_| FormatError::AllocationFailure)?;
        self.write_grouped(&grouping, zeros, digits, &mut out);
        Ok(out)
    }

    fn write_grouped(&self, grouping: &Grouping, zeros: usize, digits: &str, out: &mut String) {
        let len = zeros + digits.len();
        let all = std::iter::repeat_n('0', zeros).chain(digits.chars());
        for (i, c) in all.enumerate() {
            if i > 0 && !self.thousands_sep.is_empty() && grouping.splits_at(len - i) {
                out.push_str(&self.thousands_sep);
            }
            out.push(c);
        }
    }
}

/// Separator positions described by a POSIX grouping string, as distances
/// from the right end of the digit run.
#[derive(Debug)]
struct Grouping {
    /// Positions given by the explicit elements, ascending.
    fixed: Vec<usize>,
    /// Size that repeats after the last explicit element; 0 stops grouping.
    repeat: usize,
}

impl Grouping {
    fn new(elements: &[u8]) -> Self {
        let mut fixed = Vec::new();
        let mut offset = 0usize;
        let mut repeat = 0usize;
        for &g in elements {
            if g == 0 {
                break;
            }
            if g >= CHAR_MAX {
                repeat = 0;
                return Self { fixed, repeat };
            }
            offset += usize::from(g);
            fixed.push(offset);
            repeat = usize::from(g);
        }
        Self { fixed, repeat }
    }

    fn last_fixed(&self) -> usize {
        self.fixed.last().copied().unwrap_or(0)
    }

    /// Whether a separator goes `from_right` digits from the right end.
    fn splits_at(&self, from_right: usize) -> bool {
        let last = self.last_fixed();
        if from_right <= last {
            self.fixed.contains(&from_right)
        } else {
            self.repeat > 0 && (from_right - last) % self.repeat == 0
        }
    }

    /// Separators inside a run of `len` digits.
    fn count(&self, len: usize) -> usize {
        let Some(inner) = len.checked_sub(1) else {
            return 0;
        };
        let fixed = self.fixed.iter().filter(|&&d| d <= inner).count();
        let last = self.last_fixed();
        let repeated = if self.repeat > 0 && inner > last {
            (inner - last) / self.repeat
        } else {
            0
        };
        fixed + repeated
    }
}

/// Returns the conventions of the POSIX "C" locale: `.` decimal point, no
/// grouping, UTF-8 codeset for multibyte conversion.
#[must_use]
pub fn c_locale_conv() -> LocaleConv {
    LocaleConv {
        decimal_point: String::from("."),
        thousands_sep: String::new(),
        grouping: Vec::new(),
        charset: Charset::Utf8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn en_us() -> LocaleConv {
        LocaleConv::new(".", ",", vec![3])
    }

    #[test]
    fn c_locale_conv_decimal_point_is_dot() {
        let lc = c_locale_conv();
        assert_eq!(lc.decimal_point, ".");
        assert!(lc.thousands_sep.is_empty());
        assert!(lc.grouping.is_empty());
    }

    #[test]
    fn c_locale_does_not_group() {
        assert_eq!(c_locale_conv().group_digits("1234567"), "1234567");
    }

    #[test]
    fn repeating_group_of_three() {
        let lc = en_us();
        assert_eq!(lc.group_digits("1"), "1");
        assert_eq!(lc.group_digits("123"), "123");
        assert_eq!(lc.group_digits("1234"), "1,234");
        assert_eq!(lc.group_digits("1234567"), "1,234,567");
    }

    #[test]
    fn indian_style_grouping() {
        let lc = LocaleConv::new(".", ",", vec![3, 2]);
        assert_eq!(lc.group_digits("1234567"), "12,34,567");
    }

    #[test]
    fn char_max_stops_grouping() {
        let lc = LocaleConv::new(".", ".", vec![3, CHAR_MAX]);
        assert_eq!(lc.group_digits("123456789"), "123456.789");
    }

    #[test]
    fn multibyte_separator_is_kept_whole() {
        let lc = LocaleConv::new(",", "\u{202f}", vec![3]);
        assert_eq!(lc.group_digits("1000000"), "1\u{202f}000\u{202f}000");
    }

    #[test]
    fn codeset_names_parse_loosely() {
        assert_eq!(Charset::from_codeset("UTF-8"), Some(Charset::Utf8));
        assert_eq!(Charset::from_codeset("ISO-8859-1"), Some(Charset::Latin1));
        assert_eq!(
            Charset::from_codeset("ANSI_X3.4-1968"),
            Some(Charset::Ascii)
        );
        assert_eq!(Charset::from_codeset("KOI8-R"), None);
    }

    #[test]
    fn leading_zeros_are_grouped_with_the_digits() {
        let lc = en_us();
        assert_eq!(lc.try_group_digits(3, "1234").unwrap(), "0,001,234");
        assert_eq!(lc.try_group_digits(0, "").unwrap(), "");
        assert_eq!(
            LocaleConv::new(".", ",", vec![3, 2]).try_group_digits(2, "34567").unwrap(),
            "00,34,567"
        );
    }

    #[test]
    fn separator_count_matches_output() {
        for groups in [vec![3], vec![3, 2], vec![1, CHAR_MAX], vec![2, 3, 0], vec![]] {
            let lc = LocaleConv::new(".", "'", groups.clone());
            let grouping = Grouping::new(&groups);
            for len in 0..20 {
                let digits = "7".repeat(len);
                let out = lc.group_digits(&digits);
                assert_eq!(out.len() - len, grouping.count(len), "{groups:?} {len}");
            }
        }
    }

    #[test]
    fn unallocatable_group_run_is_an_error() {
        let err = en_us().try_group_digits(usize::MAX - 1, "12").unwrap_err();
        assert!(matches!(err, FormatError::AllocationFailure));
        let err = en_us().try_group_digits(isize::MAX as usize / 2, "1").unwrap_err();
        assert!(matches!(err, FormatError::AllocationFailure));
    }

    #[test]
    fn grouping_needs_a_separator_and_a_group() {
        assert!(en_us().groups_digits());
        assert!(!c_locale_conv().groups_digits());
        assert!(!LocaleConv::new(".", "", vec![3]).groups_digits());
        assert!(!LocaleConv::new(".", ",", vec![CHAR_MAX]).groups_digits());
    }
}
