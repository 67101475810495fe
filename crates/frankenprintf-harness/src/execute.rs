//! Executes one fixture case against the engine.
//!
//! Outputs are normalized to a string so every family compares the same way:
//! - growable narrow/unicode functions: the rendered text (lossy UTF-8/16).
//! - bounded functions: `<stored>|<returned length>`.
//! - wide functions: the text decoded from `wchar_t` units.
//! - any `%n` targets: `|n=<v1>,<v2>` appended.
//! - errors: `error:<ERRNO>`.

use std::cell::Cell;

use frankenprintf_core::errno::errno_name;
use frankenprintf_core::{
    Arg, Charset, FormatError, LocaleConv, Obstack, RenderConfig, RoundingMode, printf,
};

use crate::error::HarnessError;
use crate::fixtures::{ArgValue, FixtureCase, PrintfInputs};

/// Functions the harness knows how to drive.
pub const SUPPORTED_FUNCTIONS: &[&str] = &[
    "asprintf",
    "asnprintf",
    "snprintf",
    "fprintf",
    "obstack_printf",
    "vaswprintf",
    "swprintf",
    "u8_asprintf",
    "u16_asprintf",
    "u32_asprintf",
    "u16_snprintf",
];

/// Result of running one case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseRun {
    pub output: String,
    pub errno: i32,
}

/// Argument storage the borrowed [`Arg`]s point into.
enum OwnedArg {
    Value(Arg<'static>),
    Bytes(Vec<u8>),
    Utf8(String),
    Wide(Vec<u32>),
    Utf16(Vec<u16>),
    Count(Cell<i64>),
}

impl OwnedArg {
    fn from_value(value: &ArgValue) -> Self {
        match value {
            ArgValue::Int(v) => Self::Value(Arg::Signed(*v)),
            ArgValue::Uint(v) => Self::Value(Arg::Unsigned(*v)),
            ArgValue::Double(v) => Self::Value(Arg::Double(*v)),
            ArgValue::DoubleBits(bits) => Self::Value(Arg::Double(f64::from_bits(*bits))),
            ArgValue::Float(v) => Self::Value(Arg::Float(*v)),
            ArgValue::LongDouble(v) => Self::Value(Arg::long_double(*v)),
            ArgValue::Char(c) => Self::Value(Arg::Char(*c)),
            ArgValue::WideChar(c) => Self::Value(Arg::WideChar(u32::from(*c))),
            ArgValue::Str(s) => Self::Bytes(s.as_bytes().to_vec()),
            ArgValue::Bytes(b) => Self::Bytes(b.clone()),
            ArgValue::Wide(s) => Self::Wide(s.chars().map(u32::from).collect()),
            ArgValue::Utf8(s) => Self::Utf8(s.clone()),
            ArgValue::Utf16(s) => Self::Utf16(s.encode_utf16().collect()),
            ArgValue::Pointer(p) => Self::Value(Arg::Pointer(*p as usize)),
            ArgValue::Count => Self::Count(Cell::new(-1)),
        }
    }

    fn as_arg(&self) -> Arg<'_> {
        match self {
            Self::Value(arg) => *arg,
            Self::Bytes(b) => Arg::Str(b),
            Self::Utf8(s) => Arg::utf8(s),
            Self::Wide(w) => Arg::wide(w),
            Self::Utf16(u) => Arg::utf16(u),
            Self::Count(cell) => Arg::Count(cell),
        }
    }
}

/// Parse a fixture mode name.
pub fn parse_mode(mode: &str) -> Result<RoundingMode, HarnessError> {
    RoundingMode::from_str_loose(mode).ok_or_else(|| HarnessError::UnknownMode(mode.to_string()))
}

/// Build the render configuration a case asks for.
pub fn build_config(inputs: &PrintfInputs, mode: RoundingMode) -> Result<RenderConfig, HarnessError> {
    let charset = match &inputs.charset {
        Some(name) => {
            Charset::from_codeset(name).ok_or_else(|| HarnessError::UnknownCharset(name.clone()))?
        }
        None => Charset::Utf8,
    };
    let locale = match &inputs.locale {
        Some(l) => LocaleConv::new(
            l.decimal_point.clone(),
            l.thousands_sep.clone(),
            l.grouping.clone(),
        ),
        None => LocaleConv::default(),
    }
    .with_charset(charset);

    let mut config = RenderConfig::default()
        .with_rounding(mode)
        .with_locale(locale)
        .with_count_directive(inputs.allow_count)
        .with_nan_payload(inputs.nan_payload);
    if let Some(limit) = inputs.length_limit {
        config = config.with_length_limit(limit);
    }
    Ok(config)
}

fn narrow(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn wide(units: &[u32]) -> String {
    units
        .iter()
        .map(|&u| char::from_u32(u).unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

fn stored<T: Copy + PartialEq + Default>(buf: &[T]) -> &[T] {
    let end = buf.iter().position(|&u| u == T::default()).unwrap_or(buf.len());
    &buf[..end]
}

/// Run `case` under `mode`.
pub fn execute_fixture_case(case: &FixtureCase, mode: RoundingMode) -> Result<CaseRun, HarnessError> {
    let inputs = PrintfInputs::from_case(case)?;
    let config = build_config(&inputs, mode)?;
    let owned: Vec<OwnedArg> = inputs.args.iter().map(OwnedArg::from_value).collect();
    let args: Vec<Arg<'_>> = owned.iter().map(OwnedArg::as_arg).collect();
    let format = inputs.format.as_bytes();
    let size = inputs.size.unwrap_or(0);

    let result: Result<String, FormatError> = match case.function.as_str() {
        "asprintf" | "u8_asprintf" => {
            printf::render_to_new_buffer_with(&config, format, &args).map(|v| narrow(&v))
        }
        "asnprintf" => {
            printf::asnprintf_with(&config, Vec::with_capacity(size), format, &args).map(|v| narrow(&v))
        }
        "snprintf" => {
            let mut buf = vec![0u8; size];
            printf::render_to_bounded_buffer_with(&config, &mut buf, format, &args)
                .map(|n| format!("{}|{n}", narrow(stored(&buf))))
        }
        "fprintf" => {
            let mut out = Vec::new();
            printf::render_to_stream_with(&config, &mut out, format, &args).map(|_| narrow(&out))
        }
        "obstack_printf" => {
            let mut obstack = Obstack::new();
            printf::render_to_arena_with(&config, &mut obstack, format, &args)
                .map(|_| narrow(obstack.current()))
        }
        "vaswprintf" | "u32_asprintf" => {
            printf::render_wide_to_new_buffer_with(&config, format, &args).map(|v| wide(&v))
        }
        "swprintf" => {
            let mut buf = vec![0u32; size];
            printf::render_wide_to_bounded_buffer_with(&config, &mut buf, format, &args)
                .map(|n| format!("{}|{n}", wide(stored(&buf))))
        }
        "u16_asprintf" => {
            printf::u16_asprintf_with(&config, format, &args).map(|v| String::from_utf16_lossy(&v))
        }
        "u16_snprintf" => {
            let mut buf = vec![0u16; size];
            printf::u16_snprintf_with(&config, &mut buf, format, &args)
                .map(|n| format!("{}|{n}", String::from_utf16_lossy(stored(&buf))))
        }
        other => return Err(HarnessError::UnknownFunction(other.to_string())),
    };

    Ok(match result {
        Ok(mut output) => {
            let counts: Vec<String> = owned
                .iter()
                .filter_map(|arg| match arg {
                    OwnedArg::Count(cell) => Some(cell.get().to_string()),
                    _ => None,
                })
                .collect();
            if !counts.is_empty() {
                output.push_str("|n=");
                output.push_str(&counts.join(","));
            }
            CaseRun { output, errno: 0 }
        }
        Err(err) => {
            let errno = err.errno();
            CaseRun {
                output: format!("error:{}", errno_name(errno)),
                errno,
            }
        }
    })
}
