//! Error number definitions.
//!
//! Linux values of the `<errno.h>` constants the printf family reports.

pub const EINTR: i32 = 4;
pub const EIO: i32 = 5;
pub const ENOMEM: i32 = 12;
pub const EINVAL: i32 = 22;
pub const EOVERFLOW: i32 = 75;
pub const EILSEQ: i32 = 84;

/// Symbolic name for one of the constants above, for reports and logs.
#[must_use]
pub fn errno_name(value: i32) -> &'static str {
    match value {
        0 => "0",
        EINTR => "EINTR",
        EIO => "EIO",
        ENOMEM => "ENOMEM",
        EINVAL => "EINVAL",
        EOVERFLOW => "EOVERFLOW",
        EILSEQ => "EILSEQ",
        _ => "E?",
    }
}
