//! Output code units and the narrow/wide/Unicode conversions between them.
//!
//! - `u8`: multibyte text in the locale [`Charset`].
//! - `u16`: UTF-16.
//! - `u32`: UTF-32 / `wchar_t`. Wide string arguments pass through
//!   unchanged, like glibc `wcs*`.
//!
//! Precision on string conversions counts output units and never cuts a
//! character in half, except narrow `%s` into narrow output, which copies
//! bytes as C does. Field width is measured in display columns.

use std::borrow::Cow;
use std::fmt;

use unicode_width::UnicodeWidthChar;

use crate::layout::RenderedField;
use crate::locale::Charset;

/// A character that cannot be represented in the target encoding, or
/// input that is not valid in its source encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IllegalSequence;

/// Output code unit.
pub trait CodeUnit: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    const NUL: Self;

    fn from_ascii(byte: u8) -> Self;

    /// Append `cp` encoded in this unit type. Returns `false` when the
    /// code point has no encoding.
    fn push_code_point(cp: u32, charset: Charset, out: &mut Vec<Self>) -> bool;

    /// Append locale-supplied text (decimal point, separators, digits).
    fn push_str(text: &str, out: &mut Vec<Self>);

    /// Convert literal format bytes, which are multibyte text in `charset`.
    /// On failure returns the offset of the first bad byte.
    fn decode_literal(bytes: &[u8], charset: Charset) -> Result<Cow<'_, [Self]>, usize> {
        let cps = decode_multibyte(bytes, charset)?;
        let mut out = Vec::with_capacity(cps.len());
        for (i, &cp) in cps.iter().enumerate() {
            if !Self::push_code_point(cp, charset, &mut out) {
                return Err(i);
            }
        }
        Ok(Cow::Owned(out))
    }

    /// Append a narrow `%s` argument. Returns the display columns written.
    fn push_narrow(
        bytes: &[u8],
        charset: Charset,
        precision: Option<usize>,
        out: &mut Vec<Self>,
    ) -> Result<usize, IllegalSequence> {
        let cps = decode_multibyte(bytes, charset).map_err(|_| IllegalSequence)?;
        push_code_points(cps, charset, precision, out)
    }

    /// Append a single narrow `%c` byte.
    fn push_narrow_byte(byte: u8, charset: Charset, out: &mut Vec<Self>) -> Result<usize, IllegalSequence> {
        let cps = decode_multibyte(&[byte], charset).map_err(|_| IllegalSequence)?;
        push_code_points(cps, charset, None, out)
    }
}

impl CodeUnit for u8 {
    const NUL: Self = 0;

    fn from_ascii(byte: u8) -> Self {
        byte
    }

    fn push_code_point(cp: u32, charset: Charset, out: &mut Vec<Self>) -> bool {
        if cp > charset.max_code_point() {
            return false;
        }
        match charset {
            Charset::Utf8 => match char::from_u32(cp) {
                Some(c) => {
                    let mut buf = [0u8; 4];
                    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                    true
                }
                None => false,
            },
            Charset::Latin1 | Charset::Ascii => {
                out.push(cp as u8);
                true
            }
        }
    }

    fn push_str(text: &str, out: &mut Vec<Self>) {
        out.extend_from_slice(text.as_bytes());
    }

    fn decode_literal(bytes: &[u8], _charset: Charset) -> Result<Cow<'_, [Self]>, usize> {
        Ok(Cow::Borrowed(bytes))
    }

    fn push_narrow(
        bytes: &[u8],
        charset: Charset,
        precision: Option<usize>,
        out: &mut Vec<Self>,
    ) -> Result<usize, IllegalSequence> {
        let take = precision.map_or(bytes.len(), |p| p.min(bytes.len()));
        let bytes = &bytes[..take];
        out.extend_from_slice(bytes);
        Ok(narrow_columns(bytes, charset))
    }

    fn push_narrow_byte(byte: u8, charset: Charset, out: &mut Vec<Self>) -> Result<usize, IllegalSequence> {
        out.push(byte);
        Ok(narrow_columns(&[byte], charset).max(1))
    }
}

impl CodeUnit for u16 {
    const NUL: Self = 0;

    fn from_ascii(byte: u8) -> Self {
        u16::from(byte)
    }

    fn push_code_point(cp: u32, _charset: Charset, out: &mut Vec<Self>) -> bool {
        match char::from_u32(cp) {
            Some(c) => {
                let mut buf = [0u16; 2];
                out.extend_from_slice(c.encode_utf16(&mut buf));
                true
            }
            None => false,
        }
    }

    fn push_str(text: &str, out: &mut Vec<Self>) {
        out.extend(text.encode_utf16());
    }
}

impl CodeUnit for u32 {
    const NUL: Self = 0;

    fn from_ascii(byte: u8) -> Self {
        u32::from(byte)
    }

    fn push_code_point(cp: u32, _charset: Charset, out: &mut Vec<Self>) -> bool {
        out.push(cp);
        true
    }

    fn push_str(text: &str, out: &mut Vec<Self>) {
        out.extend(text.chars().map(u32::from));
    }
}

/// Decode multibyte text into code points. On failure returns the offset of
/// the first byte that does not decode.
pub fn decode_multibyte(bytes: &[u8], charset: Charset) -> Result<Vec<u32>, usize> {
    match charset {
        Charset::Utf8 => std::str::from_utf8(bytes)
            .map(|s| s.chars().map(u32::from).collect())
            .map_err(|e| e.valid_up_to()),
        Charset::Latin1 => Ok(bytes.iter().map(|&b| u32::from(b)).collect()),
        Charset::Ascii => match bytes.iter().position(|&b| b >= 0x80) {
            Some(bad) => Err(bad),
            None => Ok(bytes.iter().map(|&b| u32::from(b)).collect()),
        },
    }
}

fn char_columns(cp: u32) -> usize {
    char::from_u32(cp).and_then(UnicodeWidthChar::width).unwrap_or(1)
}

/// Display columns of narrow bytes; undecodable bytes count one each.
#[must_use]
pub fn narrow_columns(bytes: &[u8], charset: Charset) -> usize {
    match charset {
        Charset::Utf8 => bytes
            .utf8_chunks()
            .map(|chunk| {
                chunk.valid().chars().map(|c| char_columns(u32::from(c))).sum::<usize>()
                    + chunk.invalid().len()
            })
            .sum(),
        Charset::Latin1 => bytes.iter().map(|&b| char_columns(u32::from(b))).sum(),
        Charset::Ascii => bytes.len(),
    }
}

/// Encode code points, stopping before the unit count would pass
/// `precision`. Returns the display columns written.
pub fn push_code_points<U, I>(
    cps: I,
    charset: Charset,
    precision: Option<usize>,
    out: &mut Vec<U>,
) -> Result<usize, IllegalSequence>
where
    U: CodeUnit,
    I: IntoIterator<Item = u32>,
{
    let limit = precision.unwrap_or(usize::MAX);
    let start = out.len();
    let mut columns = 0;
    for cp in cps {
        let used = out.len() - start;
        if used >= limit {
            break;
        }
        let before = out.len();
        if !U::push_code_point(cp, charset, out) {
            return Err(IllegalSequence);
        }
        if out.len() - start > limit {
            out.truncate(before);
            break;
        }
        columns += char_columns(cp);
    }
    Ok(columns)
}

/// Slice up to (not including) the first NUL.
#[must_use]
pub fn until_nul<T: Copy + PartialEq + Default>(units: &[T]) -> &[T] {
    let nul = T::default();
    let end = units.iter().position(|&u| u == nul).unwrap_or(units.len());
    &units[..end]
}

/// `%c`.
pub fn render_char<U: CodeUnit>(byte: u8, charset: Charset) -> Result<RenderedField<U>, IllegalSequence> {
    let mut body = Vec::with_capacity(4);
    let columns = U::push_narrow_byte(byte, charset, &mut body)?;
    Ok(RenderedField::from_text(body, columns))
}

/// `%lc` / `%C`.
pub fn render_wide_char<U: CodeUnit>(cp: u32, charset: Charset) -> Result<RenderedField<U>, IllegalSequence> {
    let mut body = Vec::with_capacity(4);
    if !U::push_code_point(cp, charset, &mut body) {
        return Err(IllegalSequence);
    }
    let columns = if cp == 0 { 1 } else { char_columns(cp) };
    Ok(RenderedField::from_text(body, columns))
}

/// `%s` with a multibyte string.
pub fn render_narrow_str<U: CodeUnit>(
    bytes: &[u8],
    precision: Option<usize>,
    charset: Charset,
) -> Result<RenderedField<U>, IllegalSequence> {
    let bytes = until_nul(bytes);
    let mut body = Vec::with_capacity(precision.map_or(bytes.len(), |p| p.min(bytes.len())));
    let columns = U::push_narrow(bytes, charset, precision, &mut body)?;
    Ok(RenderedField::from_text(body, columns))
}

/// `%ls` / `%S` / `%llU`: UTF-32 code points. `strict` rejects values that
/// are not Unicode scalar values even for UTF-32 output.
pub fn render_wide_str<U: CodeUnit>(
    units: &[u32],
    precision: Option<usize>,
    charset: Charset,
    strict: bool,
) -> Result<RenderedField<U>, IllegalSequence> {
    let units = until_nul(units);
    if strict && units.iter().any(|&cp| char::from_u32(cp).is_none()) {
        return Err(IllegalSequence);
    }
    let mut body = Vec::with_capacity(units.len());
    let columns = push_code_points(units.iter().copied(), charset, precision, &mut body)?;
    Ok(RenderedField::from_text(body, columns))
}

/// `%U`: strict UTF-8.
pub fn render_utf8_str<U: CodeUnit>(
    bytes: &[u8],
    precision: Option<usize>,
    charset: Charset,
) -> Result<RenderedField<U>, IllegalSequence> {
    let bytes = until_nul(bytes);
    let text = std::str::from_utf8(bytes).map_err(|_| IllegalSequence)?;
    let mut body = Vec::with_capacity(bytes.len());
    let columns = push_code_points(text.chars().map(u32::from), charset, precision, &mut body)?;
    Ok(RenderedField::from_text(body, columns))
}

/// `%lU`: UTF-16, surrogate pairs combined, lone surrogates rejected.
pub fn render_utf16_str<U: CodeUnit>(
    units: &[u16],
    precision: Option<usize>,
    charset: Charset,
) -> Result<RenderedField<U>, IllegalSequence> {
    let units = until_nul(units);
    let cps = char::decode_utf16(units.iter().copied())
        .map(|r| r.map(u32::from))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| IllegalSequence)?;
    let mut body = Vec::with_capacity(cps.len());
    let columns = push_code_points(cps, charset, precision, &mut body)?;
    Ok(RenderedField::from_text(body, columns))
}
