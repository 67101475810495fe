//! Shared workloads for the printf benchmarks.
//!
//! Each workload is a format plus arguments that both the engine and the
//! host `snprintf` can render, so the two can be timed side by side.

use frankenprintf_core::Arg;

/// A benchmark argument, convertible to an engine [`Arg`] and passable to C.
#[derive(Debug, Clone, Copy)]
pub enum BenchArg {
    Int(i32),
    Long(i64),
    Double(f64),
    Str(&'static str),
}

impl BenchArg {
    #[must_use]
    pub fn to_arg(self) -> Arg<'static> {
        match self {
            Self::Int(v) => Arg::from(v),
            Self::Long(v) => Arg::from(v),
            Self::Double(v) => Arg::from(v),
            Self::Str(s) => Arg::from(s),
        }
    }
}

/// Named format workload. Formats are NUL-terminated for the C side.
#[derive(Debug, Clone, Copy)]
pub struct Workload {
    pub name: &'static str,
    pub format: &'static str,
    pub args: &'static [BenchArg],
}

impl Workload {
    /// Format bytes without the trailing NUL.
    #[must_use]
    pub fn format_bytes(&self) -> &'static [u8] {
        let bytes = self.format.as_bytes();
        bytes.strip_suffix(b"\0").unwrap_or(bytes)
    }

    #[must_use]
    pub fn engine_args(&self) -> Vec<Arg<'static>> {
        self.args.iter().map(|a| a.to_arg()).collect()
    }
}

pub const WORKLOADS: &[Workload] = &[
    Workload {
        name: "literal",
        format: "plain text with no directives at all\0",
        args: &[],
    },
    Workload {
        name: "int",
        format: "%d %5d %-8x|%08o\0",
        args: &[
            BenchArg::Int(42),
            BenchArg::Int(-7),
            BenchArg::Int(0xBEEF),
            BenchArg::Int(511),
        ],
    },
    Workload {
        name: "long",
        format: "%ld %lx\0",
        args: &[BenchArg::Long(i64::MIN), BenchArg::Long(i64::MAX)],
    },
    Workload {
        name: "string",
        format: "[%s] [%-12s] [%.3s]\0",
        args: &[
            BenchArg::Str("hello"),
            BenchArg::Str("world"),
            BenchArg::Str("truncate"),
        ],
    },
    Workload {
        name: "fixed",
        format: "%f %.2f %10.4f\0",
        args: &[
            BenchArg::Double(3.14159),
            BenchArg::Double(-2.5),
            BenchArg::Double(1234.5678),
        ],
    },
    Workload {
        name: "exponent",
        format: "%e %.10e\0",
        args: &[BenchArg::Double(6.02214076e23), BenchArg::Double(1.602e-19)],
    },
    Workload {
        name: "general",
        format: "%g %.17g\0",
        args: &[BenchArg::Double(0.0001234), BenchArg::Double(0.1)],
    },
    Workload {
        name: "hex_float",
        format: "%a %A\0",
        args: &[BenchArg::Double(0.1), BenchArg::Double(-1e300)],
    },
    Workload {
        name: "huge_fixed",
        format: "%.0f\0",
        args: &[BenchArg::Double(1e300)],
    },
];
