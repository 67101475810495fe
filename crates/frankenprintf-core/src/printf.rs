//! printf-family entry points.
//!
//! Every function has a `_with` form taking an explicit [`RenderConfig`];
//! the short names use [`RenderConfig::from_probe`]. Formats are always
//! narrow bytes; the output unit type varies by family.
//!
//! | C function | here |
//! |---|---|
//! | `asprintf` | [`render_to_new_buffer`] |
//! | `asnprintf` | [`asnprintf`] |
//! | `snprintf` | [`render_to_bounded_buffer`] |
//! | `fprintf` | [`render_to_stream`] |
//! | `dprintf` | [`render_to_descriptor`] |
//! | `obstack_printf` | [`render_to_arena`] |
//! | `vaswprintf` / `swprintf` | [`render_wide_to_new_buffer`] / [`render_wide_to_bounded_buffer`] |
//! | `u8_asprintf` ... `u32_snprintf` | [`u8_asprintf`] ... [`u32_snprintf`] |

use std::io::Write;

use parking_lot::Mutex;

use crate::args::Arg;
use crate::config::{RenderConfig, SIZE_LENGTH_LIMIT};
use crate::engine::render;
use crate::error::FormatError;
use crate::sink::{ArenaSink, BoundedSink, GrowableSink, Obstack, SharedStreamSink, StreamSink};
use crate::wide::CodeUnit;

fn probe_config() -> RenderConfig {
    RenderConfig::from_probe()
}

fn render_growable<U: CodeUnit>(
    sink: GrowableSink<U>,
    format: &[u8],
    args: &[Arg<'_>],
    config: &RenderConfig,
) -> Result<Vec<U>, FormatError> {
    let mut sink = sink;
    render(&mut sink, format, args, config)?;
    Ok(sink.into_vec())
}

fn render_bounded<U: CodeUnit>(
    buf: &mut [U],
    format: &[u8],
    args: &[Arg<'_>],
    config: &RenderConfig,
) -> Result<usize, FormatError> {
    let mut sink = BoundedSink::new(buf);
    render(&mut sink, format, args, config)
}

/// `asprintf`: render into a fresh buffer (no trailing NUL).
pub fn render_to_new_buffer(format: &[u8], args: &[Arg<'_>]) -> Result<Vec<u8>, FormatError> {
    render_to_new_buffer_with(&probe_config(), format, args)
}

pub fn render_to_new_buffer_with(
    config: &RenderConfig,
    format: &[u8],
    args: &[Arg<'_>],
) -> Result<Vec<u8>, FormatError> {
    render_growable(GrowableSink::new(), format, args, config)
}

/// `asnprintf`: like `asprintf`, but reuses `resultbuf`'s allocation when the
/// output fits, and reports lengths up to `isize::MAX`.
pub fn asnprintf(
    resultbuf: Vec<u8>,
    format: &[u8],
    args: &[Arg<'_>],
) -> Result<Vec<u8>, FormatError> {
    asnprintf_with(&probe_config(), resultbuf, format, args)
}

pub fn asnprintf_with(
    config: &RenderConfig,
    resultbuf: Vec<u8>,
    format: &[u8],
    args: &[Arg<'_>],
) -> Result<Vec<u8>, FormatError> {
    let config = config.clone().with_length_limit(SIZE_LENGTH_LIMIT);
    render_growable(GrowableSink::with_initial(resultbuf), format, args, &config)
}

/// `snprintf`: store at most `buf.len() - 1` bytes plus NUL; returns the
/// untruncated length.
pub fn render_to_bounded_buffer(
    buf: &mut [u8],
    format: &[u8],
    args: &[Arg<'_>],
) -> Result<usize, FormatError> {
    render_to_bounded_buffer_with(&probe_config(), buf, format, args)
}

pub fn render_to_bounded_buffer_with(
    config: &RenderConfig,
    buf: &mut [u8],
    format: &[u8],
    args: &[Arg<'_>],
) -> Result<usize, FormatError> {
    render_bounded(buf, format, args, config)
}

/// `fprintf`.
pub fn render_to_stream<W: Write>(
    stream: &mut W,
    format: &[u8],
    args: &[Arg<'_>],
) -> Result<usize, FormatError> {
    render_to_stream_with(&probe_config(), stream, format, args)
}

pub fn render_to_stream_with<W: Write>(
    config: &RenderConfig,
    stream: &mut W,
    format: &[u8],
    args: &[Arg<'_>],
) -> Result<usize, FormatError> {
    let mut sink = StreamSink::new(stream);
    render(&mut sink, format, args, config)
}

/// `fprintf` on a stream shared between threads: the whole call holds the
/// stream lock.
pub fn render_to_shared_stream<W: Write>(
    stream: &Mutex<W>,
    format: &[u8],
    args: &[Arg<'_>],
) -> Result<usize, FormatError> {
    render_to_shared_stream_with(&probe_config(), stream, format, args)
}

pub fn render_to_shared_stream_with<W: Write>(
    config: &RenderConfig,
    stream: &Mutex<W>,
    format: &[u8],
    args: &[Arg<'_>],
) -> Result<usize, FormatError> {
    let mut sink = SharedStreamSink::lock(stream);
    render(&mut sink, format, args, config)
}

/// `dprintf`.
#[cfg(unix)]
pub fn render_to_descriptor(
    fd: std::os::fd::BorrowedFd<'_>,
    format: &[u8],
    args: &[Arg<'_>],
) -> Result<usize, FormatError> {
    render_to_descriptor_with(&probe_config(), fd, format, args)
}

#[cfg(unix)]
pub fn render_to_descriptor_with(
    config: &RenderConfig,
    fd: std::os::fd::BorrowedFd<'_>,
    format: &[u8],
    args: &[Arg<'_>],
) -> Result<usize, FormatError> {
    let mut sink = crate::sink::DescriptorSink::new(fd).map_err(FormatError::Sink)?;
    render(&mut sink, format, args, config)
}

/// `obstack_printf`: append to the growing object. On failure the object
/// is restored to its previous size.
pub fn render_to_arena(
    obstack: &mut Obstack<u8>,
    format: &[u8],
    args: &[Arg<'_>],
) -> Result<usize, FormatError> {
    render_to_arena_with(&probe_config(), obstack, format, args)
}

pub fn render_to_arena_with(
    config: &RenderConfig,
    obstack: &mut Obstack<u8>,
    format: &[u8],
    args: &[Arg<'_>],
) -> Result<usize, FormatError> {
    let before = obstack.object_size();
    let result = {
        let mut sink = ArenaSink::new(obstack);
        render(&mut sink, format, args, config)
    };
    if result.is_err() {
        obstack.shrink_object(before);
    }
    result
}

/// `vaswprintf`: `wchar_t` output into a fresh buffer.
pub fn render_wide_to_new_buffer(format: &[u8], args: &[Arg<'_>]) -> Result<Vec<u32>, FormatError> {
    render_wide_to_new_buffer_with(&probe_config(), format, args)
}

pub fn render_wide_to_new_buffer_with(
    config: &RenderConfig,
    format: &[u8],
    args: &[Arg<'_>],
) -> Result<Vec<u32>, FormatError> {
    render_growable(GrowableSink::new(), format, args, config)
}

/// `swprintf`: `wchar_t` output into `buf`, NUL-terminated when non-empty.
/// Returns the untruncated length; callers detect truncation by comparing
/// it with `buf.len()`.
pub fn render_wide_to_bounded_buffer(
    buf: &mut [u32],
    format: &[u8],
    args: &[Arg<'_>],
) -> Result<usize, FormatError> {
    render_wide_to_bounded_buffer_with(&probe_config(), buf, format, args)
}

pub fn render_wide_to_bounded_buffer_with(
    config: &RenderConfig,
    buf: &mut [u32],
    format: &[u8],
    args: &[Arg<'_>],
) -> Result<usize, FormatError> {
    render_bounded(buf, format, args, config)
}

macro_rules! unicode_front_ends {
    ($($unit:ty => $asprintf:ident, $asprintf_with:ident, $snprintf:ident, $snprintf_with:ident;)*) => {$(
        #[doc = concat!("libunistring `", stringify!($asprintf), "`: output as `", stringify!($unit), "` units.")]
        pub fn $asprintf(format: &[u8], args: &[Arg<'_>]) -> Result<Vec<$unit>, FormatError> {
            $asprintf_with(&probe_config(), format, args)
        }

        pub fn $asprintf_with(
            config: &RenderConfig,
            format: &[u8],
            args: &[Arg<'_>],
        ) -> Result<Vec<$unit>, FormatError> {
            render_growable(GrowableSink::new(), format, args, config)
        }

        #[doc = concat!("libunistring `", stringify!($snprintf), "`: bounded `", stringify!($unit), "` output.")]
        pub fn $snprintf(
            buf: &mut [$unit],
            format: &[u8],
            args: &[Arg<'_>],
        ) -> Result<usize, FormatError> {
            $snprintf_with(&probe_config(), buf, format, args)
        }

        pub fn $snprintf_with(
            config: &RenderConfig,
            buf: &mut [$unit],
            format: &[u8],
            args: &[Arg<'_>],
        ) -> Result<usize, FormatError> {
            render_bounded(buf, format, args, config)
        }
    )*};
}

unicode_front_ends! {
    u8 => u8_asprintf, u8_asprintf_with, u8_snprintf, u8_snprintf_with;
    u16 => u16_asprintf, u16_asprintf_with, u16_snprintf, u16_snprintf_with;
    u32 => u32_asprintf, u32_asprintf_with, u32_snprintf, u32_snprintf_with;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printf_args;

    fn c() -> RenderConfig {
        RenderConfig::default()
    }

    #[test]
    fn snprintf_truncates_and_reports_full_length() {
        let mut buf = [0xFFu8; 3];
        let n = render_to_bounded_buffer_with(&c(), &mut buf, b"%d", &printf_args![12345]).unwrap();
        assert_eq!(n, 5);
        assert_eq!(&buf, b"12\0");
    }

    #[test]
    fn snprintf_with_empty_buffer_only_counts() {
        let mut buf: [u8; 0] = [];
        let n = render_to_bounded_buffer_with(&c(), &mut buf, b"hello", &[]).unwrap();
        assert_eq!(n, 5);
    }

    #[test]
    fn asnprintf_reuses_the_result_buffer() {
        let resultbuf = Vec::with_capacity(64);
        let ptr = resultbuf.as_ptr();
        let out = asnprintf_with(&c(), resultbuf, b"%s-%d", &printf_args!["id", 7]).unwrap();
        assert_eq!(out, b"id-7");
        assert_eq!(out.as_ptr(), ptr);
    }

    #[test]
    fn fprintf_to_a_writer() {
        let mut out = Vec::new();
        let n = render_to_stream_with(&c(), &mut out, b"[%5.1f]", &printf_args![2.25]).unwrap();
        assert_eq!(out, b"[  2.2]");
        assert_eq!(n, 7);
    }

    #[test]
    fn shared_stream_calls_do_not_interleave() {
        let stream = Mutex::new(Vec::new());
        std::thread::scope(|scope| {
            for t in 0..4 {
                let stream = &stream;
                scope.spawn(move || {
                    for _ in 0..50 {
                        render_to_shared_stream_with(&c(), stream, b"<%d%d%d>", &printf_args![t, t, t])
                            .unwrap();
                    }
                });
            }
        });
        let text = String::from_utf8(stream.into_inner()).unwrap();
        for chunk in text.split_inclusive('>') {
            let digits = &chunk[1..4];
            assert!(digits.chars().all(|c| c == digits.chars().next().unwrap()), "{chunk}");
        }
        assert_eq!(text.len(), 4 * 50 * 5);
    }

    #[test]
    fn arena_appends_and_rolls_back() {
        let mut ob = Obstack::new();
        render_to_arena_with(&c(), &mut ob, b"x=%d;", &printf_args![1]).unwrap();
        render_to_arena_with(&c(), &mut ob, b"y=%d;", &printf_args![2]).unwrap();
        let limited = c().with_length_limit(3);
        assert!(render_to_arena_with(&limited, &mut ob, b"toolong", &[]).is_err());
        let id = ob.finish();
        assert_eq!(ob.object(id), Some(&b"x=1;y=2;"[..]));
    }

    #[test]
    fn swprintf_counts_untruncated_length() {
        let mut buf = [0u32; 4];
        let n = render_wide_to_bounded_buffer_with(&c(), &mut buf, b"%ls", &[Arg::wide(&[0x3B1, 0x3B2, 0x3B3, 0x3B4, 0])])
            .unwrap();
        assert_eq!(n, 4);
        assert_eq!(buf, [0x3B1, 0x3B2, 0x3B3, 0]);
    }

    #[test]
    fn unicode_front_ends() {
        let args = [Arg::utf8("日本")];
        let u16s = u16_asprintf_with(&c(), b"%U!", &args).unwrap();
        assert_eq!(String::from_utf16(&u16s).unwrap(), "日本!");
        let u32s = u32_asprintf_with(&c(), b"%5U", &args).unwrap();
        assert_eq!(u32s.len(), 3);
        let mut small = [0u8; 4];
        let n = u8_snprintf_with(&c(), &mut small, b"%U", &args).unwrap();
        assert_eq!(n, 6);
        assert_eq!(&small, &[0xE6, 0x97, 0xA5, 0]);
    }

    #[test]
    fn wide_new_buffer() {
        let out = render_wide_to_new_buffer_with(&c(), b"%d%%", &printf_args![50]).unwrap();
        assert_eq!(out, vec![u32::from(b'5'), u32::from(b'0'), u32::from(b'%')]);
    }

    #[cfg(unix)]
    #[test]
    fn dprintf_to_a_descriptor() {
        use std::io::{Read, Seek};
        use std::os::fd::AsFd;

        let path = std::env::temp_dir().join(format!("frankenprintf-dprintf-{}", std::process::id()));
        let mut file = std::fs::File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .unwrap();
        let n = render_to_descriptor_with(&c(), file.as_fd(), b"fd %s\n", &printf_args!["ok"]).unwrap();
        assert_eq!(n, 6);
        file.rewind().unwrap();
        let mut back = String::new();
        file.read_to_string(&mut back).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(back, "fd ok\n");
    }
}
