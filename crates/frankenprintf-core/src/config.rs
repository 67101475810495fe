//! Render configuration and the one-time capability probe.
//!
//! Host facts the engine consumes (rounding mode, `long double` layout,
//! codeset, `%n` policy) are probed once per process and cached in
//! [`Capabilities::probe`]. The probe reads these environment variables:
//! - `FRANKENPRINTF_ROUNDING`: `nearest` (default), `upward`, `downward`, `towardzero`.
//! - `FRANKENPRINTF_ALLOW_PERCENT_N`: `1`/`true` enables `%n`.
//! - `FRANKENPRINTF_NAN_PAYLOAD`: `1`/`true` prints `nan(0x...)` payloads.
//! - `FRANKENPRINTF_CHARSET`: codeset name for narrow strings (default UTF-8).
//!
//! Every entry point also accepts an explicit [`RenderConfig`], so nothing in
//! the engine depends on the environment after the probe.

use std::sync::OnceLock;

use crate::locale::{Charset, LocaleConv, c_locale_conv};

/// Floating-point rounding direction (C `FE_*` modes).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoundingMode {
    /// `FE_TONEAREST`: ties go to the even digit.
    #[default]
    NearestEven,
    /// `FE_UPWARD`: toward +infinity.
    Upward,
    /// `FE_DOWNWARD`: toward -infinity.
    Downward,
    /// `FE_TOWARDZERO`: truncation.
    TowardZero,
}

impl RoundingMode {
    /// Parse from string (case-insensitive). Unknown names yield `None`.
    #[must_use]
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nearest" | "tonearest" | "fe_tonearest" | "even" => Some(Self::NearestEven),
            "upward" | "up" | "fe_upward" => Some(Self::Upward),
            "downward" | "down" | "fe_downward" => Some(Self::Downward),
            "towardzero" | "zero" | "truncate" | "fe_towardzero" => Some(Self::TowardZero),
            _ => None,
        }
    }

    /// Decide whether a magnitude with a non-zero discarded part rounds away
    /// from zero. `tie`/`above_half` describe the discarded part relative to
    /// half a unit; `last_odd` is the parity of the last kept digit.
    #[must_use]
    pub(crate) fn rounds_up(
        self,
        negative: bool,
        above_half: bool,
        tie: bool,
        last_odd: bool,
    ) -> bool {
        match self {
            Self::NearestEven => above_half || (tie && last_odd),
            Self::Upward => !negative,
            Self::Downward => negative,
            Self::TowardZero => false,
        }
    }
}

/// In-memory layout of the C `long double` on the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LongDoubleFormat {
    /// x87 80-bit extended precision (x86, x86_64).
    X87,
    /// IEEE binary128 (aarch64 and riscv64 Linux, s390x).
    Binary128,
    /// `long double` is plain `double` (arm, Windows, Apple targets).
    Binary64,
}

impl LongDoubleFormat {
    /// Layout used by the compilation target.
    #[must_use]
    pub const fn native() -> Self {
        if cfg!(any(target_arch = "x86", target_arch = "x86_64")) && !cfg!(target_os = "windows")
        {
            Self::X87
        } else if cfg!(all(
            any(
                target_arch = "aarch64",
                target_arch = "riscv64",
                target_arch = "s390x"
            ),
            target_os = "linux"
        )) {
            Self::Binary128
        } else {
            Self::Binary64
        }
    }
}

/// Host facts probed once per process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    pub rounding: RoundingMode,
    pub allow_count_directive: bool,
    pub nan_payload: bool,
    pub charset: Charset,
    pub long_double: LongDoubleFormat,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            rounding: RoundingMode::NearestEven,
            allow_count_directive: false,
            nan_payload: false,
            charset: Charset::Utf8,
            long_double: LongDoubleFormat::native(),
        }
    }
}

static PROBED: OnceLock<Capabilities> = OnceLock::new();

fn parse_bool_env(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl Capabilities {
    /// Process-wide capabilities (reads the environment on first call).
    pub fn probe() -> &'static Capabilities {
        PROBED.get_or_init(|| Self::from_lookup(|key| std::env::var(key).ok()))
    }

    /// Build capabilities from an arbitrary key lookup. Unparseable values
    /// fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            rounding: lookup("FRANKENPRINTF_ROUNDING")
                .and_then(|v| RoundingMode::from_str_loose(&v))
                .unwrap_or(defaults.rounding),
            allow_count_directive: lookup("FRANKENPRINTF_ALLOW_PERCENT_N")
                .is_some_and(|v| parse_bool_env(&v)),
            nan_payload: lookup("FRANKENPRINTF_NAN_PAYLOAD").is_some_and(|v| parse_bool_env(&v)),
            charset: lookup("FRANKENPRINTF_CHARSET")
                .and_then(|v| Charset::from_codeset(&v))
                .unwrap_or(defaults.charset),
            long_double: defaults.long_double,
        }
    }
}

/// Largest length an `int`-returning printf can report.
pub const INT_LENGTH_LIMIT: usize = i32::MAX as usize;
/// Largest length a `size_t`-returning printf (`asnprintf`) can report.
pub const SIZE_LENGTH_LIMIT: usize = isize::MAX as usize;

/// Everything one render call needs to know about its environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    pub rounding: RoundingMode,
    pub locale: LocaleConv,
    pub allow_count_directive: bool,
    pub nan_payload: bool,
    /// Output longer than this many units fails with `LengthOverflow`.
    pub length_limit: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            rounding: RoundingMode::NearestEven,
            locale: c_locale_conv(),
            allow_count_directive: false,
            nan_payload: false,
            length_limit: INT_LENGTH_LIMIT,
        }
    }
}

impl RenderConfig {
    /// Configuration derived from the process capability probe.
    #[must_use]
    pub fn from_probe() -> Self {
        Self::from_capabilities(Capabilities::probe())
    }

    /// Configuration derived from explicit capabilities, "C" numeric locale.
    #[must_use]
    pub fn from_capabilities(caps: &Capabilities) -> Self {
        Self {
            rounding: caps.rounding,
            locale: c_locale_conv().with_charset(caps.charset),
            allow_count_directive: caps.allow_count_directive,
            nan_payload: caps.nan_payload,
            length_limit: INT_LENGTH_LIMIT,
        }
    }

    #[must_use]
    pub fn with_rounding(mut self, rounding: RoundingMode) -> Self {
        self.rounding = rounding;
        self
    }

    #[must_use]
    pub fn with_locale(mut self, locale: LocaleConv) -> Self {
        self.locale = locale;
        self
    }

    /// Opt in to `%n`, which stores the running output count in an argument.
    #[must_use]
    pub fn with_count_directive(mut self, allow: bool) -> Self {
        self.allow_count_directive = allow;
        self
    }

    #[must_use]
    pub fn with_nan_payload(mut self, show: bool) -> Self {
        self.nan_payload = show;
        self
    }

    #[must_use]
    pub fn with_length_limit(mut self, limit: usize) -> Self {
        self.length_limit = limit;
        self
    }
}
