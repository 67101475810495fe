//! The render loop shared by every entry point.
//!
//! A call runs in two phases. First the whole format is parsed, every
//! argument resolved and type-checked, literal text validated for the
//! output encoding and every field formatted. Only then does the second
//! phase write to the sink, so format, type and encoding errors never leave
//! partial output behind. Errors during the second phase are limited to the
//! length limit, allocation and I/O.

use std::borrow::Cow;
use std::cell::Cell;

use crate::args::{Arg, ResolvedDirective, resolve};
use crate::config::RenderConfig;
use crate::directive::{ConversionKind, FlagSet, LengthModifier, Segment, parse};
use crate::error::FormatError;
use crate::float;
use crate::integer;
use crate::layout::{Emitter, RenderedField, emit_field};
use crate::sink::Sink;
use crate::wide::{self, CodeUnit, IllegalSequence};

/// One unit of work for the output phase.
enum Piece<'f, 'a, U: CodeUnit> {
    Literal(Cow<'f, [U]>),
    Field {
        field: RenderedField<U>,
        width: usize,
        flags: FlagSet,
    },
    Count {
        cell: &'a Cell<i64>,
        length: LengthModifier,
    },
}

/// Render `format` with `args` into `sink`.
///
/// Returns the number of code units produced, which for bounded sinks
/// includes the units that did not fit.
///
/// # Errors
///
/// Any [`FormatError`]. Variants for which
/// [`FormatError::is_format_error`] is true, and `IllegalSequence`, are
/// reported before the first unit reaches the sink.
///
/// # Memory
///
/// Every field is converted before the sink sees its first unit, so the
/// converted text of the whole call is held in memory at once, even when
/// the sink is a stream. Precision zeros and width padding are kept as
/// counts and written in chunks; everything else costs memory in
/// proportion to its length.
pub fn render<U, S>(
    sink: &mut S,
    format: &[u8],
    args: &[Arg<'_>],
    config: &RenderConfig,
) -> Result<usize, FormatError>
where
    U: CodeUnit,
    S: Sink<U> + ?Sized,
{
    let pieces = prepare::<U>(format, args, config)?;

    let mut out = Emitter::new(sink, config.length_limit);
    for piece in &pieces {
        match piece {
            Piece::Literal(units) => out.write(units)?,
            Piece::Field {
                field,
                width,
                flags,
            } => emit_field(&mut out, field, *width, *flags)?,
            Piece::Count { cell, length } => cell.set(count_value(out.written(), *length)),
        }
    }
    out.finish()
}

/// Phase one: everything that can fail without I/O.
fn prepare<'f, 'a, U: CodeUnit>(
    format: &'f [u8],
    args: &[Arg<'a>],
    config: &RenderConfig,
) -> Result<Vec<Piece<'f, 'a, U>>, FormatError> {
    let segments = parse(format)?;
    let resolved = resolve(&segments, args, config)?;
    let charset = config.locale.charset;

    let mut pieces = Vec::with_capacity(segments.len());
    let mut directives = resolved.into_iter();
    for segment in &segments {
        match *segment {
            Segment::Literal(bytes) => {
                let units = U::decode_literal(bytes, charset).map_err(|bad| {
                    FormatError::IllegalFormatText {
                        offset: offset_in(format, bytes) + bad,
                    }
                })?;
                pieces.push(Piece::Literal(units));
            }
            Segment::Directive(_) => {
                let Some(directive) = directives.next() else {
                    continue;
                };
                if directive.width > config.length_limit {
                    return Err(FormatError::LengthOverflow {
                        limit: config.length_limit,
                    });
                }
                pieces.push(format_directive(&directive, config)?);
            }
        }
    }
    Ok(pieces)
}

/// Byte offset of a literal run inside the format it was cut from.
fn offset_in(format: &[u8], run: &[u8]) -> usize {
    run.as_ptr().addr().saturating_sub(format.as_ptr().addr())
}

/// Value stored by `%n`: the count, converted to the pointee type.
fn count_value(written: usize, length: LengthModifier) -> i64 {
    let shift = 64 - length.integer_bits();
    ((written as u64 as i64) << shift) >> shift
}

fn format_directive<'f, 'a, U: CodeUnit>(
    d: &ResolvedDirective<'a>,
    config: &RenderConfig,
) -> Result<Piece<'f, 'a, U>, FormatError> {
    let spec = &d.spec;
    let conversion = spec.conversion;
    let charset = config.locale.charset;
    let illegal = |_: IllegalSequence| FormatError::IllegalSequence { index: d.index };
    let too_long = FormatError::LengthOverflow {
        limit: config.length_limit,
    };

    let Some(value) = d.value else {
        // `%%` written with flags or width: a plain percent sign.
        return Ok(Piece::Literal(Cow::Owned(vec![U::from_ascii(b'%')])));
    };

    let field = match conversion {
        c if c.is_integer() => {
            if d.precision.is_some_and(|p| p > config.length_limit) {
                return Err(too_long);
            }
            let raw = value.integer_bits().unwrap_or(0);
            RenderedField::from_numeric(integer::format_integer(
                conversion,
                d.flags,
                d.precision,
                spec.length,
                raw,
                &config.locale,
            )?)?
        }
        c if c.is_float() => {
            let general = matches!(
                c,
                ConversionKind::GeneralLower | ConversionKind::GeneralUpper
            );
            let padded = !general || d.flags.contains(FlagSet::ALT);
            if padded && d.precision.is_some_and(|p| p > config.length_limit) {
                return Err(too_long);
            }
            let Some(decoded) = float::decode_arg(&value) else {
                return Err(mismatch(d, "floating-point value", &value));
            };
            RenderedField::from_numeric(float::format_float(
                conversion,
                d.flags,
                d.precision,
                decoded,
                config,
            ))?
        }
        ConversionKind::Pointer => {
            let address = match value {
                Arg::Pointer(p) => p as u64,
                other => other.integer_bits().unwrap_or(0),
            };
            RenderedField::from_numeric(integer::format_pointer(address, d.precision))?
        }
        ConversionKind::Char => {
            let byte = value.integer_bits().unwrap_or(0) as u8;
            wide::render_char(byte, charset).map_err(illegal)?
        }
        ConversionKind::WideChar => {
            let cp = value.integer_bits().unwrap_or(0) as u32;
            wide::render_wide_char(cp, charset).map_err(illegal)?
        }
        ConversionKind::Str => match value {
            Arg::Str(s) | Arg::Utf8Str(s) => {
                wide::render_narrow_str(s, d.precision, charset).map_err(illegal)?
            }
            other => return Err(mismatch(d, "string", &other)),
        },
        ConversionKind::WideStr => match value {
            Arg::WideStr(s) | Arg::Utf32Str(s) => {
                wide::render_wide_str(s, d.precision, charset, false).map_err(illegal)?
            }
            other => return Err(mismatch(d, "wide string", &other)),
        },
        ConversionKind::UnicodeStr => match value {
            Arg::Utf8Str(s) | Arg::Str(s) => {
                wide::render_utf8_str(s, d.precision, charset).map_err(illegal)?
            }
            Arg::Utf16Str(s) => wide::render_utf16_str(s, d.precision, charset).map_err(illegal)?,
            Arg::Utf32Str(s) | Arg::WideStr(s) => {
                wide::render_wide_str(s, d.precision, charset, true).map_err(illegal)?
            }
            other => return Err(mismatch(d, "Unicode string", &other)),
        },
        ConversionKind::Count => match value {
            Arg::Count(cell) => {
                return Ok(Piece::Count {
                    cell,
                    length: spec.length,
                });
            }
            other => return Err(mismatch(d, "count cell", &other)),
        },
        _ => return Err(mismatch(d, "argument", &value)),
    };

    Ok(Piece::Field {
        field,
        width: d.width,
        flags: d.flags,
    })
}

fn mismatch(d: &ResolvedDirective<'_>, expected: &'static str, found: &Arg<'_>) -> FormatError {
    FormatError::TypeMismatch {
        index: d.index,
        expected,
        found: found.kind_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printf_args;
    use crate::sink::{BoundedSink, GrowableSink};

    fn render_str(fmt: &str, args: &[Arg<'_>]) -> Result<String, FormatError> {
        render_cfg(fmt, args, &RenderConfig::default())
    }

    fn render_cfg(fmt: &str, args: &[Arg<'_>], config: &RenderConfig) -> Result<String, FormatError> {
        let mut sink = GrowableSink::<u8>::new();
        let n = render(&mut sink, fmt.as_bytes(), args, config)?;
        let out = sink.into_vec();
        assert_eq!(n, out.len());
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_render_mixed_format() {
        let args = printf_args![42, "world", 3.5];
        assert_eq!(
            render_str("n=%d s=%-7s| f=%.2f %%", &args).unwrap(),
            "n=42 s=world  | f=3.50 %"
        );
    }

    #[test]
    fn percent_with_width_prints_bare_percent() {
        assert_eq!(render_str("[%5%]", &[]).unwrap(), "[%]");
    }

    #[test]
    fn count_directive_stores_running_total() {
        let cell = Cell::new(-1);
        let small = Cell::new(-1);
        let args = printf_args!["abc", &cell, &small];
        let config = RenderConfig::default().with_count_directive(true);
        assert_eq!(render_cfg("%s%n!%hhn", &args, &config).unwrap(), "abc!");
        assert_eq!(cell.get(), 3);
        assert_eq!(small.get(), 4);
    }

    #[test]
    fn count_value_truncates_to_pointee() {
        assert_eq!(count_value(300, LengthModifier::Hh), 44);
        assert_eq!(count_value(200, LengthModifier::Hh), -56);
        assert_eq!(count_value(70000, LengthModifier::None), 70000);
    }

    #[test]
    fn errors_leave_no_partial_output() {
        let mut buf = [0x55u8; 16];
        let mut sink = BoundedSink::new(&mut buf);
        let args = printf_args![1, "x"];
        let err = render(&mut sink, b"ok %d %d", &args, &RenderConfig::default()).unwrap_err();
        assert!(matches!(err, FormatError::TypeMismatch { index: 2, .. }));
        assert_eq!(sink.total(), 0);
        assert_eq!(buf, [0x55; 16]);
    }

    #[test]
    fn illegal_sequences_are_caught_before_output() {
        let text: [u32; 2] = [0x20AC, 0];
        let args = [Arg::wide(&text)];
        let config = RenderConfig::default()
            .with_locale(crate::locale::c_locale_conv().with_charset(crate::locale::Charset::Ascii));
        let mut sink = GrowableSink::<u8>::new();
        let err = render(&mut sink, b"before %ls", &args, &config).unwrap_err();
        assert!(matches!(err, FormatError::IllegalSequence { index: 1 }));
        assert!(sink.is_empty());
    }

    #[test]
    fn wide_literals_must_decode() {
        let mut sink = GrowableSink::<u32>::new();
        let err = render(&mut sink, b"ab\xFFc", &[], &RenderConfig::default()).unwrap_err();
        assert!(matches!(err, FormatError::IllegalFormatText { offset: 2 }));
        let err = render(&mut sink, b"%d\xFF", &printf_args![1], &RenderConfig::default())
            .unwrap_err();
        assert!(matches!(err, FormatError::IllegalFormatText { offset: 2 }));
    }

    #[test]
    fn length_limit_is_enforced() {
        let config = RenderConfig::default().with_length_limit(8);
        assert!(matches!(
            render_cfg("%20d", &printf_args![1], &config),
            Err(FormatError::LengthOverflow { limit: 8 })
        ));
        assert!(matches!(
            render_cfg("%.9d", &printf_args![1], &config),
            Err(FormatError::LengthOverflow { limit: 8 })
        ));
        assert!(matches!(
            render_cfg("12345%s", &printf_args!["6789"], &config),
            Err(FormatError::LengthOverflow { limit: 8 })
        ));
        assert_eq!(render_cfg("%8d", &printf_args![1], &config).unwrap(), "       1");
    }

    #[test]
    fn wide_output_of_every_conversion_kind() {
        let mut sink = GrowableSink::<u32>::new();
        let utf16: Vec<u16> = "ü".encode_utf16().collect();
        let args = [
            Arg::from(-5),
            Arg::from(2.5),
            Arg::from("ab"),
            Arg::from('€'),
            Arg::utf16(&utf16),
        ];
        render(&mut sink, b"%d|%.1f|%s|%lc|%lU", &args, &RenderConfig::default()).unwrap();
        let text: String = sink
            .into_vec()
            .into_iter()
            .map(|u| char::from_u32(u).unwrap())
            .collect();
        assert_eq!(text, "-5|2.5|ab|€|ü");
    }
}
