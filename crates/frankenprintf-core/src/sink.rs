//! Output sinks.
//!
//! The engine writes through [`Sink`] only. Adapters:
//! - [`GrowableSink`]: heap buffer (`asprintf`, `asnprintf`, `vaswprintf`).
//! - [`BoundedSink`]: caller slice with truncation (`snprintf`, `swprintf`).
//! - [`StreamSink`], [`DescriptorSink`], [`SharedStreamSink`]: I/O (`fprintf`, `dprintf`).
//! - [`ArenaSink`]: growing object of an [`Obstack`] (`obstack_printf`).
//!
//! Reference: POSIX.1-2024 fprintf/snprintf/dprintf, glibc obstack(3),
//! gnulib vasnprintf.

use std::io::{self, Write};

use parking_lot::{Mutex, MutexGuard};

use crate::error::SinkError;
use crate::wide::CodeUnit;

/// Default buffer size for descriptor output (POSIX BUFSIZ).
pub const BUFSIZ: usize = 8192;

/// Smallest capacity a growable buffer starts with.
const MIN_GROW: usize = 64;

/// Units per write when a sink repeats one unit without a bulk path.
const FILL_CHUNK: usize = 256;

/// Destination of rendered code units.
pub trait Sink<U: CodeUnit = u8> {
    /// Append `units`. Partial writes are retried internally.
    fn write(&mut self, units: &[U]) -> Result<(), SinkError>;

    /// Append `count` copies of `unit`. Padding and precision zeros arrive
    /// here, so `count` can be far larger than anything worth buffering.
    fn fill(&mut self, unit: U, count: usize) -> Result<(), SinkError> {
        let chunk = [unit; FILL_CHUNK];
        let mut remaining = count;
        while remaining > 0 {
            let n = remaining.min(FILL_CHUNK);
            self.write(&chunk[..n])?;
            remaining -= n;
        }
        Ok(())
    }

    /// Called once after the last write of a successful render.
    fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl<U: CodeUnit, S: Sink<U> + ?Sized> Sink<U> for &mut S {
    fn write(&mut self, units: &[U]) -> Result<(), SinkError> {
        (**self).write(units)
    }

    fn fill(&mut self, unit: U, count: usize) -> Result<(), SinkError> {
        (**self).fill(unit, count)
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        (**self).finish()
    }
}

/// Heap buffer that grows geometrically.
#[derive(Debug, Clone, Default)]
pub struct GrowableSink<U> {
    buf: Vec<U>,
    limit: Option<usize>,
}

impl<U: CodeUnit> GrowableSink<U> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            limit: None,
        }
    }

    /// Reuse `initial`: output goes into its existing allocation as long as
    /// it fits (`asnprintf(resultbuf, ...)`). The vector is cleared first.
    #[must_use]
    pub fn with_initial(mut initial: Vec<U>) -> Self {
        initial.clear();
        Self {
            buf: initial,
            limit: None,
        }
    }

    /// Fail with [`SinkError::Overflow`] past `limit` units.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn as_slice(&self) -> &[U] {
        &self.buf
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<U> {
        self.buf
    }

    /// Make room for `additional` more units without aborting on failure.
    fn grow_for(&mut self, additional: usize) -> Result<(), SinkError> {
        let needed = self
            .buf
            .len()
            .checked_add(additional)
            .ok_or(SinkError::Overflow { limit: usize::MAX })?;
        if let Some(limit) = self.limit
            && needed > limit
        {
            return Err(SinkError::Overflow { limit });
        }
        if needed > self.buf.capacity() {
            let target = self
                .buf
                .capacity()
                .saturating_mul(2)
                .max(needed)
                .max(MIN_GROW);
            let target = self.limit.map_or(target, |limit| target.min(limit.max(needed)));
            self.buf
                .try_reserve_exact(target - self.buf.len())
                .or_else(|_| self.buf.try_reserve_exact(needed - self.buf.len()))
                .map_err(|_| SinkError::OutOfMemory)?;
        }
        Ok(())
    }
}

impl<U: CodeUnit> Sink<U> for GrowableSink<U> {
    fn write(&mut self, units: &[U]) -> Result<(), SinkError> {
        self.grow_for(units.len())?;
        self.buf.extend_from_slice(units);
        Ok(())
    }

    fn fill(&mut self, unit: U, count: usize) -> Result<(), SinkError> {
        self.grow_for(count)?;
        self.buf.resize(self.buf.len() + count, unit);
        Ok(())
    }
}

/// Fixed caller buffer of `n` units: keeps at most `n - 1` units plus a
/// terminating NUL and counts everything offered.
#[derive(Debug)]
pub struct BoundedSink<'b, U> {
    buf: &'b mut [U],
    stored: usize,
    total: usize,
}

impl<'b, U: CodeUnit> BoundedSink<'b, U> {
    pub fn new(buf: &'b mut [U]) -> Self {
        Self {
            buf,
            stored: 0,
            total: 0,
        }
    }

    /// Units actually stored (excluding the NUL).
    #[must_use]
    pub fn stored(&self) -> usize {
        self.stored
    }

    /// Units offered, including truncated ones.
    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn truncated(&self) -> bool {
        self.total > self.stored
    }
}

impl<U: CodeUnit> Sink<U> for BoundedSink<'_, U> {
    fn write(&mut self, units: &[U]) -> Result<(), SinkError> {
        let capacity = self.buf.len().saturating_sub(1);
        let room = capacity - self.stored;
        let take = room.min(units.len());
        self.buf[self.stored..self.stored + take].copy_from_slice(&units[..take]);
        self.stored += take;
        self.total = self.total.saturating_add(units.len());
        Ok(())
    }

    fn fill(&mut self, unit: U, count: usize) -> Result<(), SinkError> {
        let capacity = self.buf.len().saturating_sub(1);
        let take = (capacity - self.stored).min(count);
        self.buf[self.stored..self.stored + take].fill(unit);
        self.stored += take;
        self.total = self.total.saturating_add(count);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        if let Some(slot) = self.buf.get_mut(self.stored) {
            *slot = U::NUL;
        }
        Ok(())
    }
}

/// Any [`io::Write`]; the writer's own buffering applies.
#[derive(Debug)]
pub struct StreamSink<W> {
    inner: W,
}

impl<W: Write> StreamSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Write everything, retrying short writes and `EINTR`.
fn write_fully<W: Write + ?Sized>(w: &mut W, mut bytes: &[u8]) -> Result<(), SinkError> {
    while !bytes.is_empty() {
        match w.write(bytes) {
            Ok(0) => return Err(io::Error::from(io::ErrorKind::WriteZero).into()),
            Ok(n) => bytes = &bytes[n..],
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn flush_retrying<W: Write + ?Sized>(w: &mut W) -> Result<(), SinkError> {
    loop {
        match w.flush() {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            other => return other.map_err(SinkError::from),
        }
    }
}

impl<W: Write> Sink<u8> for StreamSink<W> {
    fn write(&mut self, units: &[u8]) -> Result<(), SinkError> {
        write_fully(&mut self.inner, units)
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        flush_retrying(&mut self.inner)
    }
}

/// Raw file descriptor output (`dprintf`), buffered for one call.
#[cfg(unix)]
#[derive(Debug)]
pub struct DescriptorSink {
    inner: io::BufWriter<std::fs::File>,
}

#[cfg(unix)]
impl DescriptorSink {
    /// Duplicate `fd` so the caller keeps ownership of the original.
    pub fn new(fd: std::os::fd::BorrowedFd<'_>) -> io::Result<Self> {
        let owned = fd.try_clone_to_owned()?;
        Ok(Self {
            inner: io::BufWriter::with_capacity(BUFSIZ, std::fs::File::from(owned)),
        })
    }
}

#[cfg(unix)]
impl Sink<u8> for DescriptorSink {
    fn write(&mut self, units: &[u8]) -> Result<(), SinkError> {
        write_fully(&mut self.inner, units)
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        flush_retrying(&mut self.inner)
    }
}

/// Stream shared between threads; the lock is held for the whole render so
/// concurrent calls never interleave (POSIX `flockfile` semantics).
pub struct SharedStreamSink<'m, W> {
    guard: MutexGuard<'m, W>,
}

impl<'m, W: Write> SharedStreamSink<'m, W> {
    pub fn lock(stream: &'m Mutex<W>) -> Self {
        Self {
            guard: stream.lock(),
        }
    }
}

impl<W: Write> Sink<u8> for SharedStreamSink<'_, W> {
    fn write(&mut self, units: &[u8]) -> Result<(), SinkError> {
        write_fully(&mut *self.guard, units)
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        flush_retrying(&mut *self.guard)
    }
}

/// Handle to a finished obstack object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(usize);

/// Stack-disciplined arena in the style of glibc obstacks.
///
/// Units are appended to a growing object with [`Obstack::grow`];
/// [`Obstack::finish`] closes it. Freeing an object frees every object
/// allocated after it too.
#[derive(Debug, Clone, Default)]
pub struct Obstack<U> {
    storage: Vec<U>,
    object_start: usize,
    objects: Vec<(usize, usize)>,
}

impl<U: CodeUnit> Obstack<U> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            storage: Vec::new(),
            object_start: 0,
            objects: Vec::new(),
        }
    }

    /// Append to the growing object.
    pub fn grow(&mut self, units: &[U]) -> Result<(), SinkError> {
        self.storage
            .try_reserve(units.len())
            .map_err(|_| SinkError::OutOfMemory)?;
        self.storage.extend_from_slice(units);
        Ok(())
    }

    /// Append `count` copies of `unit` to the growing object.
    pub fn grow_fill(&mut self, unit: U, count: usize) -> Result<(), SinkError> {
        self.storage
            .try_reserve(count)
            .map_err(|_| SinkError::OutOfMemory)?;
        self.storage.resize(self.storage.len() + count, unit);
        Ok(())
    }

    /// Size of the growing object.
    #[must_use]
    pub fn object_size(&self) -> usize {
        self.storage.len() - self.object_start
    }

    /// The growing object so far.
    #[must_use]
    pub fn current(&self) -> &[U] {
        &self.storage[self.object_start..]
    }

    /// Drop the growing object's tail back to `size` units.
    pub fn shrink_object(&mut self, size: usize) {
        if size < self.object_size() {
            self.storage.truncate(self.object_start + size);
        }
    }

    /// Close the growing object.
    pub fn finish(&mut self) -> ObjectId {
        let id = ObjectId(self.objects.len());
        self.objects.push((self.object_start, self.storage.len()));
        self.object_start = self.storage.len();
        id
    }

    #[must_use]
    pub fn object(&self, id: ObjectId) -> Option<&[U]> {
        self.objects
            .get(id.0)
            .map(|&(start, end)| &self.storage[start..end])
    }

    /// Free `id` and everything allocated after it, including the growing object.
    pub fn free(&mut self, id: ObjectId) {
        if let Some(&(start, _)) = self.objects.get(id.0) {
            self.objects.truncate(id.0);
            self.storage.truncate(start);
            self.object_start = start;
        }
    }

    /// Number of finished objects still allocated.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }
}

/// Appends to an obstack's growing object.
#[derive(Debug)]
pub struct ArenaSink<'o, U> {
    obstack: &'o mut Obstack<U>,
}

impl<'o, U: CodeUnit> ArenaSink<'o, U> {
    pub fn new(obstack: &'o mut Obstack<U>) -> Self {
        Self { obstack }
    }
}

impl<U: CodeUnit> Sink<U> for ArenaSink<'_, U> {
    fn write(&mut self, units: &[U]) -> Result<(), SinkError> {
        self.obstack.grow(units)
    }

    fn fill(&mut self, unit: U, count: usize) -> Result<(), SinkError> {
        self.obstack.grow_fill(unit, count)
    }
}
