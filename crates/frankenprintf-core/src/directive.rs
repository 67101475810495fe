//! Format string lexer.
//!
//! Splits a printf format into literal runs and conversion directives
//! following the grammar
//!
//! ```text
//! %[argnum$][flags][width][.precision][length]conversion
//! ```
//!
//! Reference: POSIX.1-2024 fprintf, ISO C23 7.23.6.1, glibc/gnulib extensions
//! (`'` flag, `%b`/`%B`, `%U`, `q`, `wN`/`wfN`).
//!
//! The lexer never touches arguments: `*` widths and precisions stay symbolic
//! ([`ArgRef`]) until the resolver runs.

use std::fmt;

use bitflags::bitflags;

use crate::error::{DirectiveError, FormatError};

bitflags! {
    /// Flags parsed from a directive.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct FlagSet: u8 {
        /// `-`: left-justify within the field.
        const LEFT = 0b0000_0001;
        /// `+`: always print a sign for signed conversions.
        const PLUS = 0b0000_0010;
        /// ` `: print a space where a `+` sign would go.
        const SPACE = 0b0000_0100;
        /// `#`: alternate form.
        const ALT = 0b0000_1000;
        /// `0`: pad numeric conversions with zeros.
        const ZERO = 0b0001_0000;
        /// `'`: group integer digits with the locale thousands separator.
        const GROUP = 0b0010_0000;
    }
}

/// Where a `*` width or precision takes its value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgRef {
    /// `*`: the next sequential argument.
    Next,
    /// `*n$`: argument `n` (1-based).
    Position(usize),
}

/// Width specification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum WidthSpec {
    #[default]
    None,
    Literal(usize),
    FromArg(ArgRef),
}

/// Precision specification. `None` (omitted) and `Literal(0)` are different:
/// only the latter makes `%.0d` of zero print no digits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PrecisionSpec {
    #[default]
    None,
    Literal(usize),
    FromArg(ArgRef),
}

/// Length modifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LengthModifier {
    #[default]
    None,
    Hh,
    H,
    L,
    Ll,
    /// `L`: long double.
    BigL,
    J,
    Z,
    T,
    /// `q`: BSD quad, same as `ll`.
    Q,
    /// `wN`: exact-width `intN_t`.
    W(u8),
    /// `wfN`: `int_fastN_t`.
    Wf(u8),
}

impl fmt::Display for LengthModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => Ok(()),
            Self::Hh => f.write_str("hh"),
            Self::H => f.write_str("h"),
            Self::L => f.write_str("l"),
            Self::Ll => f.write_str("ll"),
            Self::BigL => f.write_str("L"),
            Self::J => f.write_str("j"),
            Self::Z => f.write_str("z"),
            Self::T => f.write_str("t"),
            Self::Q => f.write_str("q"),
            Self::W(bits) => write!(f, "w{bits}"),
            Self::Wf(bits) => write!(f, "wf{bits}"),
        }
    }
}

impl LengthModifier {
    /// Bit width an integer conversion reads the argument at.
    ///
    /// Follows the LP64 data model of glibc on x86_64/aarch64: `int` is 32
    /// bits, `long`, `size_t`, `ptrdiff_t` and `intmax_t` are 64, and the
    /// fast types are 8 bits for `int_fast8_t` and 64 bits otherwise.
    #[must_use]
    pub const fn integer_bits(self) -> u32 {
        match self {
            Self::Hh => 8,
            Self::H => 16,
            Self::None | Self::BigL => 32,
            Self::L | Self::Ll | Self::Q | Self::J | Self::Z | Self::T => 64,
            Self::W(bits) => bits as u32,
            Self::Wf(8) => 8,
            Self::Wf(_) => 64,
        }
    }
}

/// The conversion character of a directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionKind {
    /// `d`
    SignedDecimal,
    /// `i`
    SignedInteger,
    /// `o`
    Octal,
    /// `u`
    UnsignedDecimal,
    /// `x`
    HexLower,
    /// `X`
    HexUpper,
    /// `b`
    BinaryLower,
    /// `B`
    BinaryUpper,
    /// `f`
    FixedLower,
    /// `F`
    FixedUpper,
    /// `e`
    ExponentLower,
    /// `E`
    ExponentUpper,
    /// `g`
    GeneralLower,
    /// `G`
    GeneralUpper,
    /// `a`
    HexFloatLower,
    /// `A`
    HexFloatUpper,
    /// `c`
    Char,
    /// `lc` or `C`
    WideChar,
    /// `s`
    Str,
    /// `ls` or `S`
    WideStr,
    /// `U`, `lU`, `llU`: UTF-8/16/32 string
    UnicodeStr,
    /// `p`
    Pointer,
    /// `n`
    Count,
    /// `%` reached through a directive with flags or width, e.g. `%5%`
    Percent,
}

impl ConversionKind {
    /// Map a conversion byte to its kind, before length modifiers are applied.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            b'd' => Self::SignedDecimal,
            b'i' => Self::SignedInteger,
            b'o' => Self::Octal,
            b'u' => Self::UnsignedDecimal,
            b'x' => Self::HexLower,
            b'X' => Self::HexUpper,
            b'b' => Self::BinaryLower,
            b'B' => Self::BinaryUpper,
            b'f' => Self::FixedLower,
            b'F' => Self::FixedUpper,
            b'e' => Self::ExponentLower,
            b'E' => Self::ExponentUpper,
            b'g' => Self::GeneralLower,
            b'G' => Self::GeneralUpper,
            b'a' => Self::HexFloatLower,
            b'A' => Self::HexFloatUpper,
            b'c' => Self::Char,
            b'C' => Self::WideChar,
            b's' => Self::Str,
            b'S' => Self::WideStr,
            b'U' => Self::UnicodeStr,
            b'p' => Self::Pointer,
            b'n' => Self::Count,
            b'%' => Self::Percent,
            _ => return None,
        })
    }

    /// The conversion character.
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::SignedDecimal => 'd',
            Self::SignedInteger => 'i',
            Self::Octal => 'o',
            Self::UnsignedDecimal => 'u',
            Self::HexLower => 'x',
            Self::HexUpper => 'X',
            Self::BinaryLower => 'b',
            Self::BinaryUpper => 'B',
            Self::FixedLower => 'f',
            Self::FixedUpper => 'F',
            Self::ExponentLower => 'e',
            Self::ExponentUpper => 'E',
            Self::GeneralLower => 'g',
            Self::GeneralUpper => 'G',
            Self::HexFloatLower => 'a',
            Self::HexFloatUpper => 'A',
            Self::Char => 'c',
            Self::WideChar => 'C',
            Self::Str => 's',
            Self::WideStr => 'S',
            Self::UnicodeStr => 'U',
            Self::Pointer => 'p',
            Self::Count => 'n',
            Self::Percent => '%',
        }
    }

    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            Self::SignedDecimal
                | Self::SignedInteger
                | Self::Octal
                | Self::UnsignedDecimal
                | Self::HexLower
                | Self::HexUpper
                | Self::BinaryLower
                | Self::BinaryUpper
        )
    }

    #[must_use]
    pub const fn is_signed(self) -> bool {
        matches!(self, Self::SignedDecimal | Self::SignedInteger)
    }

    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(
            self,
            Self::FixedLower
                | Self::FixedUpper
                | Self::ExponentLower
                | Self::ExponentUpper
                | Self::GeneralLower
                | Self::GeneralUpper
                | Self::HexFloatLower
                | Self::HexFloatUpper
        )
    }

    #[must_use]
    pub const fn is_uppercase(self) -> bool {
        matches!(
            self,
            Self::HexUpper
                | Self::BinaryUpper
                | Self::FixedUpper
                | Self::ExponentUpper
                | Self::GeneralUpper
                | Self::HexFloatUpper
        )
    }

    /// Whether this conversion consumes a value argument.
    #[must_use]
    pub const fn takes_argument(self) -> bool {
        !matches!(self, Self::Percent)
    }

    /// Whether `length` is meaningful with this conversion.
    #[must_use]
    pub const fn accepts_length(self, length: LengthModifier) -> bool {
        use LengthModifier as L;
        if self.is_integer() || matches!(self, Self::Count) {
            return !matches!(length, L::BigL);
        }
        if self.is_float() {
            return matches!(length, L::None | L::L | L::BigL);
        }
        match self {
            Self::Char | Self::Str => matches!(length, L::None | L::L),
            Self::UnicodeStr => matches!(length, L::None | L::L | L::Ll),
            _ => matches!(length, L::None),
        }
    }
}

impl fmt::Display for ConversionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// A parsed conversion directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirectiveSpec {
    /// Byte offset of the `%` in the format string.
    pub offset: usize,
    /// `n` of a leading `n$`, 1-based.
    pub arg_index: Option<usize>,
    pub flags: FlagSet,
    pub width: WidthSpec,
    pub precision: PrecisionSpec,
    pub length: LengthModifier,
    pub conversion: ConversionKind,
}

impl DirectiveSpec {
    /// A directive with no flags, width, precision or length.
    #[must_use]
    pub const fn plain(conversion: ConversionKind) -> Self {
        Self {
            offset: 0,
            arg_index: None,
            flags: FlagSet::empty(),
            width: WidthSpec::None,
            precision: PrecisionSpec::None,
            length: LengthModifier::None,
            conversion,
        }
    }

    /// True when the directive uses any `n$` form.
    #[must_use]
    pub fn uses_positions(&self) -> bool {
        self.arg_index.is_some()
            || matches!(self.width, WidthSpec::FromArg(ArgRef::Position(_)))
            || matches!(self.precision, PrecisionSpec::FromArg(ArgRef::Position(_)))
    }

    /// True when the directive consumes sequential arguments.
    #[must_use]
    pub fn uses_sequence(&self) -> bool {
        (self.arg_index.is_none() && self.conversion.takes_argument())
            || matches!(self.width, WidthSpec::FromArg(ArgRef::Next))
            || matches!(self.precision, PrecisionSpec::FromArg(ArgRef::Next))
    }
}

/// One piece of a format string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Literal bytes to emit verbatim (`%%` contributes a one-byte `%` run).
    Literal(&'a [u8]),
    /// A conversion directive.
    Directive(DirectiveSpec),
}

/// Lazy iterator over the segments of a format string.
///
/// Stops after the first error.
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    fmt: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> Segments<'a> {
    #[must_use]
    pub fn new(fmt: &'a [u8]) -> Self {
        Self {
            fmt,
            pos: 0,
            failed: false,
        }
    }

    /// Byte offset of the next unread position.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = Result<Segment<'a>, DirectiveError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.fmt.len() {
            return None;
        }
        let fmt = self.fmt;
        let start = self.pos;

        if fmt[start] != b'%' {
            let end = fmt[start..]
                .iter()
                .position(|&b| b == b'%')
                .map_or(fmt.len(), |n| start + n);
            self.pos = end;
            return Some(Ok(Segment::Literal(&fmt[start..end])));
        }

        if fmt.get(start + 1) == Some(&b'%') {
            self.pos = start + 2;
            return Some(Ok(Segment::Literal(&fmt[start + 1..start + 2])));
        }

        match parse_directive(fmt, start) {
            Ok((spec, end)) => {
                self.pos = end;
                Some(Ok(Segment::Directive(spec)))
            }
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

/// Parse a whole format string into segments.
///
/// # Errors
///
/// Returns [`FormatError::MalformedDirective`] for the first directive that
/// does not follow the grammar.
pub fn parse(fmt: &[u8]) -> Result<Vec<Segment<'_>>, FormatError> {
    Segments::new(fmt)
        .collect::<Result<Vec<_>, _>>()
        .map_err(FormatError::from)
}

/// Parse the directive whose `%` is at `fmt[offset]`.
///
/// Returns the parsed directive and the offset just past the conversion character.
///
/// # Errors
///
/// See [`DirectiveError`].
pub fn parse_directive(fmt: &[u8], offset: usize) -> Result<(DirectiveSpec, usize), DirectiveError> {
    let len = fmt.len();
    let unterminated = DirectiveError::Unterminated { offset };
    let mut pos = offset + 1;

    // --- argnum$ ---
    let mut arg_index = None;
    if let Some((n, after)) = scan_decimal(fmt, pos)
        && fmt.get(after) == Some(&b'$')
    {
        if n == 0 {
            return Err(DirectiveError::ZeroPosition { offset });
        }
        arg_index = Some(n);
        pos = after + 1;
    }

    // --- flags ---
    let mut flags = FlagSet::empty();
    while pos < len {
        let flag = match fmt[pos] {
            b'-' => FlagSet::LEFT,
            b'+' => FlagSet::PLUS,
            b' ' => FlagSet::SPACE,
            b'#' => FlagSet::ALT,
            b'0' => FlagSet::ZERO,
            b'\'' => FlagSet::GROUP,
            _ => break,
        };
        flags |= flag;
        pos += 1;
    }

    // --- width ---
    let width = if fmt.get(pos) == Some(&b'*') {
        let (arg, after) = parse_star(fmt, pos + 1, offset)?;
        pos = after;
        WidthSpec::FromArg(arg)
    } else if let Some((n, after)) = scan_decimal(fmt, pos) {
        pos = after;
        WidthSpec::Literal(n)
    } else {
        WidthSpec::None
    };

    // --- precision ---
    let precision = if fmt.get(pos) == Some(&b'.') {
        pos += 1;
        if fmt.get(pos) == Some(&b'*') {
            let (arg, after) = parse_star(fmt, pos + 1, offset)?;
            pos = after;
            PrecisionSpec::FromArg(arg)
        } else if let Some((n, after)) = scan_decimal(fmt, pos) {
            pos = after;
            PrecisionSpec::Literal(n)
        } else {
            PrecisionSpec::Literal(0)
        }
    } else {
        PrecisionSpec::None
    };

    // --- length modifier ---
    let (length, after) = parse_length(fmt, pos, offset)?;
    pos = after;

    // --- conversion ---
    let Some(&byte) = fmt.get(pos) else {
        return Err(unterminated);
    };
    pos += 1;
    let Some(mut conversion) = ConversionKind::from_byte(byte) else {
        return Err(DirectiveError::UnknownConversion { offset, byte });
    };
    if !conversion.accepts_length(length) {
        return Err(DirectiveError::InvalidLength {
            offset,
            length,
            conversion,
        });
    }
    if length == LengthModifier::L {
        conversion = match conversion {
            ConversionKind::Char => ConversionKind::WideChar,
            ConversionKind::Str => ConversionKind::WideStr,
            other => other,
        };
    }

    Ok((
        DirectiveSpec {
            offset,
            arg_index,
            flags,
            width,
            precision,
            length,
            conversion,
        },
        pos,
    ))
}

/// Parse what follows a `*`: either `n$` or nothing.
fn parse_star(fmt: &[u8], pos: usize, offset: usize) -> Result<(ArgRef, usize), DirectiveError> {
    if let Some((n, after)) = scan_decimal(fmt, pos)
        && fmt.get(after) == Some(&b'$')
    {
        if n == 0 {
            return Err(DirectiveError::ZeroPosition { offset });
        }
        return Ok((ArgRef::Position(n), after + 1));
    }
    Ok((ArgRef::Next, pos))
}

fn parse_length(
    fmt: &[u8],
    pos: usize,
    offset: usize,
) -> Result<(LengthModifier, usize), DirectiveError> {
    let at = |i: usize| fmt.get(i).copied();
    Ok(match at(pos) {
        Some(b'h') if at(pos + 1) == Some(b'h') => (LengthModifier::Hh, pos + 2),
        Some(b'h') => (LengthModifier::H, pos + 1),
        Some(b'l') if at(pos + 1) == Some(b'l') => (LengthModifier::Ll, pos + 2),
        Some(b'l') => (LengthModifier::L, pos + 1),
        Some(b'L') => (LengthModifier::BigL, pos + 1),
        Some(b'q') => (LengthModifier::Q, pos + 1),
        Some(b'j') => (LengthModifier::J, pos + 1),
        Some(b'z') => (LengthModifier::Z, pos + 1),
        Some(b't') => (LengthModifier::T, pos + 1),
        Some(b'w') => {
            let fast = at(pos + 1) == Some(b'f');
            let digits_at = if fast { pos + 2 } else { pos + 1 };
            let Some((bits, after)) = scan_decimal(fmt, digits_at) else {
                return Err(if digits_at >= fmt.len() {
                    DirectiveError::Unterminated { offset }
                } else {
                    DirectiveError::UnsupportedBitWidth { offset }
                });
            };
            let bits = match bits {
                8 => 8u8,
                16 => 16,
                32 => 32,
                64 => 64,
                _ => return Err(DirectiveError::UnsupportedBitWidth { offset }),
            };
            let length = if fast {
                LengthModifier::Wf(bits)
            } else {
                LengthModifier::W(bits)
            };
            (length, after)
        }
        _ => (LengthModifier::None, pos),
    })
}

/// Scan a run of ASCII digits at `pos`. Returns `None` when there is none.
/// Values that do not fit saturate at `usize::MAX`.
fn scan_decimal(fmt: &[u8], pos: usize) -> Option<(usize, usize)> {
    let digits = fmt
        .get(pos..)?
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits == 0 {
        return None;
    }
    let value = fmt[pos..pos + digits].iter().fold(0usize, |acc, &d| {
        acc.saturating_mul(10).saturating_add(usize::from(d - b'0'))
    });
    Some((value, pos + digits))
}
