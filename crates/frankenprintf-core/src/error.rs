//! Error taxonomy for the rendering engine and its sinks.

use thiserror::Error;

use crate::directive::{ConversionKind, LengthModifier};
use crate::errno;

/// A directive that does not follow the printf grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DirectiveError {
    #[error("unknown conversion character {byte:#04x} at offset {offset}")]
    UnknownConversion { offset: usize, byte: u8 },
    #[error("length modifier `{length}` cannot be used with `%{conversion}` (offset {offset})")]
    InvalidLength {
        offset: usize,
        length: LengthModifier,
        conversion: ConversionKind,
    },
    #[error("unsupported `w`/`wf` bit width at offset {offset}")]
    UnsupportedBitWidth { offset: usize },
    #[error("format ends inside the directive starting at offset {offset}")]
    Unterminated { offset: usize },
    #[error("argument position 0 at offset {offset} (positions start at 1)")]
    ZeroPosition { offset: usize },
}

impl DirectiveError {
    /// Byte offset of the `%` that starts the offending directive.
    #[must_use]
    pub fn offset(&self) -> usize {
        match *self {
            Self::UnknownConversion { offset, .. }
            | Self::InvalidLength { offset, .. }
            | Self::UnsupportedBitWidth { offset }
            | Self::Unterminated { offset }
            | Self::ZeroPosition { offset } => offset,
        }
    }
}

/// Failure reported by an output sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The underlying stream or descriptor failed; the OS error is kept as-is.
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("out of memory")]
    OutOfMemory,
    #[error("output would exceed {limit} units")]
    Overflow { limit: usize },
}

/// Any failure of a render call.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("malformed directive: {0}")]
    MalformedDirective(#[from] DirectiveError),
    #[error("format mixes positional (`%n$`) and sequential directives")]
    InconsistentPositions,
    #[error("argument {index}: conversion expects {expected}, got {found}")]
    TypeMismatch {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },
    #[error("argument {index} is referenced but was not supplied")]
    MissingArgument { index: usize },
    #[error("`%n` is disabled; enable it with RenderConfig::with_count_directive")]
    CountDirectiveDisabled,
    #[error("out of memory")]
    AllocationFailure,
    #[error("output length exceeds the representable limit of {limit} units")]
    LengthOverflow { limit: usize },
    #[error("argument {index} cannot be represented in the output encoding")]
    IllegalSequence { index: usize },
    #[error("format text at offset {offset} is not valid in the locale charset")]
    IllegalFormatText { offset: usize },
    #[error(transparent)]
    Sink(std::io::Error),
}

impl From<SinkError> for FormatError {
    fn from(err: SinkError) -> Self {
        match err {
            SinkError::Io(io) => Self::Sink(io),
            SinkError::OutOfMemory => Self::AllocationFailure,
            SinkError::Overflow { limit } => Self::LengthOverflow { limit },
        }
    }
}

impl FormatError {
    /// The `errno` value a C printf would leave behind for this failure.
    #[must_use]
    pub fn errno(&self) -> i32 {
        match self {
            Self::MalformedDirective(_)
            | Self::InconsistentPositions
            | Self::TypeMismatch { .. }
            | Self::MissingArgument { .. }
            | Self::CountDirectiveDisabled => errno::EINVAL,
            Self::AllocationFailure => errno::ENOMEM,
            Self::LengthOverflow { .. } => errno::EOVERFLOW,
            Self::IllegalSequence { .. } | Self::IllegalFormatText { .. } => errno::EILSEQ,
            Self::Sink(io) => io.raw_os_error().unwrap_or(errno::EIO),
        }
    }

    /// True for errors detected while validating the format, before any output.
    #[must_use]
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedDirective(_)
                | Self::InconsistentPositions
                | Self::TypeMismatch { .. }
                | Self::MissingArgument { .. }
                | Self::CountDirectiveDisabled
                | Self::IllegalFormatText { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_errors_map_onto_the_taxonomy() {
        assert!(matches!(
            FormatError::from(SinkError::OutOfMemory),
            FormatError::AllocationFailure
        ));
        assert!(matches!(
            FormatError::from(SinkError::Overflow { limit: 7 }),
            FormatError::LengthOverflow { limit: 7 }
        ));
        let io = std::io::Error::from_raw_os_error(28);
        let err = FormatError::from(SinkError::Io(io));
        assert_eq!(err.errno(), 28);
    }

    #[test]
    fn errno_values_follow_c_conventions() {
        assert_eq!(FormatError::InconsistentPositions.errno(), errno::EINVAL);
        assert_eq!(FormatError::AllocationFailure.errno(), errno::ENOMEM);
        assert_eq!(
            FormatError::LengthOverflow { limit: 1 }.errno(),
            errno::EOVERFLOW
        );
        assert_eq!(FormatError::IllegalSequence { index: 1 }.errno(), errno::EILSEQ);
        let custom = FormatError::Sink(std::io::Error::other("boom"));
        assert_eq!(custom.errno(), errno::EIO);
    }

    #[test]
    fn directive_error_reports_its_offset() {
        let err = DirectiveError::Unterminated { offset: 3 };
        assert_eq!(err.offset(), 3);
        assert!(FormatError::from(err).is_format_error());
        assert!(!FormatError::AllocationFailure.is_format_error());
    }
}
