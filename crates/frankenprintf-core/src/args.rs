//! Type-tagged arguments and the resolver that binds them to directives.
//!
//! Resolution happens for the whole format before anything is written, so
//! every positional, type and opt-in error is reported with no output.

use std::cell::Cell;
use std::ffi::CStr;

use crate::config::{LongDoubleFormat, RenderConfig};
use crate::directive::{
    ArgRef, ConversionKind, DirectiveSpec, FlagSet, LengthModifier, PrecisionSpec, Segment,
    WidthSpec,
};
use crate::error::FormatError;
use crate::float::ieee::{Binary128, LongDouble, X87Extended};

/// One logical printf argument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arg<'a> {
    Signed(i64),
    Unsigned(u64),
    Float(f32),
    Double(f64),
    LongDouble(LongDouble),
    Pointer(usize),
    /// Multibyte string in the locale charset (`char *`).
    Str(&'a [u8]),
    /// `wchar_t *`.
    WideStr(&'a [u32]),
    Utf8Str(&'a [u8]),
    Utf16Str(&'a [u16]),
    Utf32Str(&'a [u32]),
    /// `char` (promoted `int` in C).
    Char(u8),
    /// `wint_t`.
    WideChar(u32),
    /// `%n` target.
    Count(&'a Cell<i64>),
}

impl<'a> Arg<'a> {
    /// Human-readable category for error messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Signed(_) => "signed integer",
            Self::Unsigned(_) => "unsigned integer",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::LongDouble(_) => "long double",
            Self::Pointer(_) => "pointer",
            Self::Str(_) => "string",
            Self::WideStr(_) => "wide string",
            Self::Utf8Str(_) => "UTF-8 string",
            Self::Utf16Str(_) => "UTF-16 string",
            Self::Utf32Str(_) => "UTF-32 string",
            Self::Char(_) => "char",
            Self::WideChar(_) => "wide char",
            Self::Count(_) => "count cell",
        }
    }

    /// `long double` holding `value`, in the target's native layout.
    #[must_use]
    pub fn long_double(value: f64) -> Self {
        match LongDoubleFormat::native() {
            LongDoubleFormat::X87 => Self::LongDouble(LongDouble::X87(X87Extended::from_f64(value))),
            LongDoubleFormat::Binary128 => {
                Self::LongDouble(LongDouble::Quad(Binary128::from_f64(value)))
            }
            LongDoubleFormat::Binary64 => Self::Double(value),
        }
    }

    #[must_use]
    pub fn utf8(text: &'a str) -> Self {
        Self::Utf8Str(text.as_bytes())
    }

    #[must_use]
    pub fn utf16(units: &'a [u16]) -> Self {
        Self::Utf16Str(units)
    }

    #[must_use]
    pub fn utf32(units: &'a [u32]) -> Self {
        Self::Utf32Str(units)
    }

    #[must_use]
    pub fn wide(units: &'a [u32]) -> Self {
        Self::WideStr(units)
    }

    fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::Signed(_) | Self::Unsigned(_) | Self::Char(_) | Self::WideChar(_)
        )
    }

    /// Raw 64-bit pattern of an integer argument.
    #[must_use]
    pub fn integer_bits(&self) -> Option<u64> {
        match *self {
            Self::Signed(v) => Some(v as u64),
            Self::Unsigned(v) => Some(v),
            Self::Char(v) => Some(u64::from(v)),
            Self::WideChar(v) => Some(u64::from(v)),
            _ => None,
        }
    }
}

macro_rules! from_signed {
    ($($t:ty),*) => {$(
        impl From<$t> for Arg<'_> {
            fn from(v: $t) -> Self {
                Arg::Signed(v as i64)
            }
        }
    )*};
}

macro_rules! from_unsigned {
    ($($t:ty),*) => {$(
        impl From<$t> for Arg<'_> {
            fn from(v: $t) -> Self {
                Arg::Unsigned(v as u64)
            }
        }
    )*};
}

from_signed!(i8, i16, i32, i64, isize);
from_unsigned!(u8, u16, u32, u64, usize);

impl From<f32> for Arg<'_> {
    fn from(v: f32) -> Self {
        Arg::Float(v)
    }
}

impl From<f64> for Arg<'_> {
    fn from(v: f64) -> Self {
        Arg::Double(v)
    }
}

impl From<char> for Arg<'_> {
    fn from(c: char) -> Self {
        Arg::WideChar(u32::from(c))
    }
}

impl<'a> From<&'a str> for Arg<'a> {
    fn from(s: &'a str) -> Self {
        Arg::Str(s.as_bytes())
    }
}

impl<'a> From<&'a String> for Arg<'a> {
    fn from(s: &'a String) -> Self {
        Arg::Str(s.as_bytes())
    }
}

impl<'a> From<&'a [u8]> for Arg<'a> {
    fn from(s: &'a [u8]) -> Self {
        Arg::Str(s)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Arg<'a> {
    fn from(s: &'a [u8; N]) -> Self {
        Arg::Str(s)
    }
}

impl<'a> From<&'a CStr> for Arg<'a> {
    fn from(s: &'a CStr) -> Self {
        Arg::Str(s.to_bytes())
    }
}

impl<'a> From<&'a [u32]> for Arg<'a> {
    fn from(s: &'a [u32]) -> Self {
        Arg::WideStr(s)
    }
}

impl<'a> From<&'a [u16]> for Arg<'a> {
    fn from(s: &'a [u16]) -> Self {
        Arg::Utf16Str(s)
    }
}

impl<'a> From<&'a Cell<i64>> for Arg<'a> {
    fn from(cell: &'a Cell<i64>) -> Self {
        Arg::Count(cell)
    }
}

impl<T> From<*const T> for Arg<'_> {
    fn from(ptr: *const T) -> Self {
        Arg::Pointer(ptr.addr())
    }
}

impl<T> From<*mut T> for Arg<'_> {
    fn from(ptr: *mut T) -> Self {
        Arg::Pointer(ptr.addr())
    }
}

impl From<LongDouble> for Arg<'_> {
    fn from(v: LongDouble) -> Self {
        Arg::LongDouble(v)
    }
}

/// Build an argument array: `printf_args![42, "str", 1.5]`.
#[macro_export]
macro_rules! printf_args {
    ($($arg:expr),* $(,)?) => {
        [$($crate::Arg::from($arg)),*]
    };
}

/// A directive with width, precision and value bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedDirective<'a> {
    pub spec: DirectiveSpec,
    /// Parsed flags, plus `-` when the width argument was negative.
    pub flags: FlagSet,
    pub width: usize,
    /// `None` when omitted or given as a negative argument.
    pub precision: Option<usize>,
    /// 1-based index of the value argument; 0 for `%%`-like directives.
    pub index: usize,
    pub value: Option<Arg<'a>>,
}

/// Bind every directive in `segments` to its arguments.
///
/// # Errors
///
/// `InconsistentPositions`, `MissingArgument`, `TypeMismatch` and
/// `CountDirectiveDisabled`.
pub fn resolve<'a>(
    segments: &[Segment<'_>],
    args: &[Arg<'a>],
    config: &RenderConfig,
) -> Result<Vec<ResolvedDirective<'a>>, FormatError> {
    let directives = segments.iter().filter_map(|s| match s {
        Segment::Directive(spec) => Some(spec),
        Segment::Literal(_) => None,
    });

    let mut positional = false;
    let mut sequential = false;
    for spec in directives.clone() {
        positional |= spec.uses_positions();
        sequential |= spec.uses_sequence();
    }
    if positional && sequential {
        return Err(FormatError::InconsistentPositions);
    }

    let mut next = 1usize;
    let mut take = |r: Option<ArgRef>| -> usize {
        match r {
            Some(ArgRef::Position(n)) => n,
            Some(ArgRef::Next) | None => {
                let n = next;
                next += 1;
                n
            }
        }
    };

    let mut out = Vec::new();
    for spec in directives {
        let mut flags = spec.flags;

        let width = match spec.width {
            WidthSpec::None => 0,
            WidthSpec::Literal(n) => n,
            WidthSpec::FromArg(r) => {
                let index = take(Some(r));
                let w = int_arg(args, index)?;
                if w < 0 {
                    flags |= FlagSet::LEFT;
                }
                usize::try_from(w.unsigned_abs()).unwrap_or(usize::MAX)
            }
        };

        let precision = match spec.precision {
            PrecisionSpec::None => None,
            PrecisionSpec::Literal(n) => Some(n),
            PrecisionSpec::FromArg(r) => {
                let index = take(Some(r));
                let p = int_arg(args, index)?;
                (p >= 0).then(|| usize::try_from(p).unwrap_or(usize::MAX))
            }
        };

        let (index, value) = if spec.conversion.takes_argument() {
            let index = take(spec.arg_index.map(ArgRef::Position));
            let value = fetch(args, index)?;
            check_compatible(spec, index, &value, config)?;
            (index, Some(value))
        } else {
            (0, None)
        };

        out.push(ResolvedDirective {
            spec: *spec,
            flags,
            width,
            precision,
            index,
            value,
        });
    }
    Ok(out)
}

fn fetch<'a>(args: &[Arg<'a>], index: usize) -> Result<Arg<'a>, FormatError> {
    index
        .checked_sub(1)
        .and_then(|i| args.get(i))
        .copied()
        .ok_or(FormatError::MissingArgument { index })
}

/// `*` width/precision argument, read as a signed value.
fn int_arg(args: &[Arg<'_>], index: usize) -> Result<i64, FormatError> {
    match fetch(args, index)? {
        Arg::Signed(v) => Ok(v),
        Arg::Unsigned(v) => Ok(i64::try_from(v).unwrap_or(i64::MAX)),
        other => Err(FormatError::TypeMismatch {
            index,
            expected: "integer",
            found: other.kind_name(),
        }),
    }
}

fn check_compatible(
    spec: &DirectiveSpec,
    index: usize,
    value: &Arg<'_>,
    config: &RenderConfig,
) -> Result<(), FormatError> {
    use ConversionKind as C;

    if spec.conversion == C::Count && !config.allow_count_directive {
        return Err(FormatError::CountDirectiveDisabled);
    }

    let (ok, expected) = match spec.conversion {
        c if c.is_integer() => (value.is_integer(), "integer"),
        c if c.is_float() => {
            if spec.length == LengthModifier::BigL {
                (
                    matches!(value, Arg::Float(_) | Arg::Double(_) | Arg::LongDouble(_)),
                    "floating-point value",
                )
            } else {
                (matches!(value, Arg::Float(_) | Arg::Double(_)), "float or double")
            }
        }
        C::Char => (
            matches!(value, Arg::Signed(_) | Arg::Unsigned(_) | Arg::Char(_)),
            "integer or char",
        ),
        C::WideChar => (value.is_integer(), "wide char"),
        C::Str => (matches!(value, Arg::Str(_) | Arg::Utf8Str(_)), "string"),
        C::WideStr => (
            matches!(value, Arg::WideStr(_) | Arg::Utf32Str(_)),
            "wide string",
        ),
        C::UnicodeStr => match spec.length {
            LengthModifier::L => (matches!(value, Arg::Utf16Str(_)), "UTF-16 string"),
            LengthModifier::Ll => (
                matches!(value, Arg::Utf32Str(_) | Arg::WideStr(_)),
                "UTF-32 string",
            ),
            _ => (matches!(value, Arg::Utf8Str(_) | Arg::Str(_)), "UTF-8 string"),
        },
        C::Pointer => (
            matches!(value, Arg::Pointer(_) | Arg::Signed(_) | Arg::Unsigned(_)),
            "pointer",
        ),
        C::Count => (matches!(value, Arg::Count(_)), "count cell"),
        _ => (true, ""),
    };

    if ok {
        Ok(())
    } else {
        Err(FormatError::TypeMismatch {
            index,
            expected,
            found: value.kind_name(),
        })
    }
}
