//! Field layout: sign, prefix, zero/space padding and justification.
//!
//! Every unit that reaches a sink goes through [`Emitter`], which keeps the
//! running count and refuses to pass the configured length limit.

use std::marker::PhantomData;

use crate::directive::FlagSet;
use crate::error::FormatError;
use crate::sink::Sink;
use crate::wide::CodeUnit;

/// Formatted numeric text before encoding into output units.
///
/// `body` may contain locale text (decimal point, thousands separator);
/// everything else is ASCII. Precision zeros are not stored: `zeros` of them
/// belong at byte offset `zeros_at` of `body`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericText {
    pub sign: Option<u8>,
    pub prefix: &'static str,
    pub body: String,
    pub zeros: usize,
    pub zeros_at: usize,
    /// False when a precision was given for an integer, or for non-numeric text.
    pub zero_pad_ok: bool,
    /// NaN or infinity: never zero padded.
    pub is_special: bool,
}

impl NumericText {
    #[must_use]
    pub fn new(sign: Option<u8>, prefix: &'static str, body: String) -> Self {
        Self {
            sign,
            prefix,
            body,
            zeros: 0,
            zeros_at: 0,
            zero_pad_ok: true,
            is_special: false,
        }
    }

    /// Defer a run of `count` zeros to byte offset `at` of the body.
    #[must_use]
    pub fn with_zeros(mut self, count: usize, at: usize) -> Self {
        self.zeros = count;
        self.zeros_at = at;
        self
    }

    /// Body with the deferred zeros written out.
    #[cfg(test)]
    pub(crate) fn expanded_body(&self) -> String {
        let mut out = self.body[..self.zeros_at].to_string();
        out.extend(std::iter::repeat_n('0', self.zeros));
        out.push_str(&self.body[self.zeros_at..]);
        out
    }
}

/// One formatted directive, ready for layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedField<U> {
    pub sign: Option<u8>,
    pub prefix: &'static str,
    pub body: Vec<U>,
    /// `'0'` units emitted before `body[zeros_at]`.
    pub zeros: usize,
    pub zeros_at: usize,
    /// Width consumed by sign + prefix + zeros + body, in the unit the
    /// field width is measured in.
    pub columns: usize,
    pub zero_pad_ok: bool,
    pub is_special: bool,
}

impl<U: CodeUnit> RenderedField<U> {
    /// Encode numeric text. Width is measured in output units.
    ///
    /// # Errors
    ///
    /// [`FormatError::AllocationFailure`] when the encoded body cannot be
    /// allocated.
    pub fn from_numeric(text: NumericText) -> Result<Self, FormatError> {
        let mut body = Vec::new();
        body.try_reserve(text.body.len())
            .map_err(|_| FormatError::AllocationFailure)?;
        let (head, tail) = text.body.split_at(text.zeros_at);
        U::push_str(head, &mut body);
        let zeros_at = body.len();
        U::push_str(tail, &mut body);
        let columns = (usize::from(text.sign.is_some()) + text.prefix.len() + body.len())
            .saturating_add(text.zeros);
        Ok(Self {
            sign: text.sign,
            prefix: text.prefix,
            body,
            zeros: text.zeros,
            zeros_at,
            columns,
            zero_pad_ok: text.zero_pad_ok && !text.is_special,
            is_special: text.is_special,
        })
    }

    /// Character or string output occupying `columns` display columns.
    #[must_use]
    pub fn from_text(body: Vec<U>, columns: usize) -> Self {
        Self {
            sign: None,
            prefix: "",
            body,
            zeros: 0,
            zeros_at: 0,
            columns,
            zero_pad_ok: false,
            is_special: false,
        }
    }
}

/// Counting front of a sink.
pub struct Emitter<'s, U, S: ?Sized> {
    sink: &'s mut S,
    written: usize,
    limit: usize,
    _unit: PhantomData<fn(U)>,
}

impl<'s, U: CodeUnit, S: Sink<U> + ?Sized> Emitter<'s, U, S> {
    pub fn new(sink: &'s mut S, limit: usize) -> Self {
        Self {
            sink,
            written: 0,
            limit,
            _unit: PhantomData,
        }
    }

    /// Units emitted so far.
    #[must_use]
    pub fn written(&self) -> usize {
        self.written
    }

    fn reserve(&self, count: usize) -> Result<usize, FormatError> {
        self.written
            .checked_add(count)
            .filter(|&total| total <= self.limit)
            .ok_or(FormatError::LengthOverflow { limit: self.limit })
    }

    pub fn write(&mut self, units: &[U]) -> Result<(), FormatError> {
        if units.is_empty() {
            return Ok(());
        }
        let total = self.reserve(units.len())?;
        self.sink.write(units)?;
        self.written = total;
        Ok(())
    }

    fn write_ascii(&mut self, text: &[u8]) -> Result<(), FormatError> {
        for &byte in text {
            self.write(&[U::from_ascii(byte)])?;
        }
        Ok(())
    }

    /// Emit `count` copies of `unit`.
    pub fn pad(&mut self, unit: U, count: usize) -> Result<(), FormatError> {
        if count == 0 {
            return Ok(());
        }
        let total = self.reserve(count)?;
        self.sink.fill(unit, count)?;
        self.written = total;
        Ok(())
    }

    /// Flush the sink and return the total count.
    pub fn finish(self) -> Result<usize, FormatError> {
        self.sink.finish()?;
        Ok(self.written)
    }
}

/// Lay out one field.
///
/// Right-justified: spaces, sign, prefix, zeros, body. Left-justified:
/// sign, prefix, body, spaces. `-` overrides `0`. Precision zeros held in
/// the field are written in place inside the body.
pub fn emit_field<U, S>(
    out: &mut Emitter<'_, U, S>,
    field: &RenderedField<U>,
    width: usize,
    flags: FlagSet,
) -> Result<(), FormatError>
where
    U: CodeUnit,
    S: Sink<U> + ?Sized,
{
    let padding = width.saturating_sub(field.columns);
    let left = flags.contains(FlagSet::LEFT);
    let zero = flags.contains(FlagSet::ZERO) && !left && field.zero_pad_ok;

    if !left && !zero {
        out.pad(U::from_ascii(b' '), padding)?;
    }
    if let Some(sign) = field.sign {
        out.write_ascii(&[sign])?;
    }
    out.write_ascii(field.prefix.as_bytes())?;
    if zero {
        out.pad(U::from_ascii(b'0'), padding)?;
    }
    let (head, tail) = field.body.split_at(field.zeros_at);
    out.write(head)?;
    out.pad(U::from_ascii(b'0'), field.zeros)?;
    out.write(tail)?;
    if left {
        out.pad(U::from_ascii(b' '), padding)?;
    }
    Ok(())
}
