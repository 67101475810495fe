//! # frankenprintf-core
//!
//! A printf rendering engine in safe Rust: ISO C99/C23, POSIX positional
//! arguments and the GNU extensions, with exact float conversion
//! in every IEEE rounding mode.
//!
//! Rendering is two-phase. A format is parsed and every argument resolved
//! and formatted before the first output unit is written, so malformed
//! formats, type mismatches and encoding errors never leave partial output
//! in a sink. Output is produced in `u8`, `u16` or `u32` units through the
//! [`Sink`] trait.
//!
//! ```
//! use frankenprintf_core::{printf_args, render_to_new_buffer_with, RenderConfig};
//!
//! let out = render_to_new_buffer_with(
//!     &RenderConfig::default(),
//!     b"%-6s|%+.3e|%#x",
//!     &printf_args!["id", 1234.5, 255],
//! )
//! .unwrap();
//! assert_eq!(out, b"id    |+1.234e+03|0xff");
//! ```

#![deny(unsafe_code)]

pub mod args;
pub mod bignum;
pub mod config;
pub mod directive;
pub mod engine;
pub mod errno;
pub mod error;
pub mod float;
pub mod integer;
pub mod layout;
pub mod locale;
pub mod printf;
pub mod sink;
pub mod wide;

pub use args::{Arg, ResolvedDirective, resolve};
pub use config::{Capabilities, LongDoubleFormat, RenderConfig, RoundingMode};
pub use directive::{ConversionKind, DirectiveSpec, FlagSet, LengthModifier, Segment, Segments, parse};
pub use engine::render;
pub use error::{DirectiveError, FormatError, SinkError};
pub use float::ieee::{Binary128, LongDouble, X87Extended};
pub use locale::{Charset, LocaleConv};
pub use printf::*;
pub use sink::{ArenaSink, BoundedSink, GrowableSink, Obstack, Sink, StreamSink};
pub use wide::CodeUnit;
