// Copyright 2024 - Strixpyrr
// SPDX-License-Identifier: Apache-2.0

use std::fmt::{self, Debug, Formatter};
use std::io::Write;
use std::sync::Arc;
use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use tracing::{debug, trace};
use crate::{Error, ReaderConfig, Result, Source};

/// The largest chunk [`BufferedReader::read_to_end`] reads at once.
const MAX_READ_CHUNK: usize = 64 * 1024;

/// A buffering reader over a [`Source`], supporting mark and reset.
///
/// Small reads are served from an internal buffer which is refilled with larger
/// reads from the source. [`mark`] saves the current position; as long as no
/// more than the mark's read limit is consumed afterward, [`reset`] rewinds to
/// it. The buffer grows as needed to keep marked bytes, up to the configured
/// maximum capacity.
///
/// All operations lock the reader, except [`close`], which may be called from
/// any thread while another is blocked reading from the source. Once closed,
/// every operation except [`mark`] and [`close`] fails with [`Error::Closed`].
///
/// ```
/// use buffered_source::{BufferedReader, MemorySource};
///
/// let reader = BufferedReader::with_capacity(4, MemorySource::new([1, 2, 3, 4, 5, 6]))?;
/// for expected in 1..=4 {
///     assert_eq!(reader.read_byte()?, Some(expected));
/// }
/// reader.mark(10);
/// assert_eq!(reader.read_byte()?, Some(5));
/// reader.reset()?;
/// assert_eq!(reader.read_byte()?, Some(5));
/// # Ok::<(), buffered_source::Error>(())
/// ```
///
/// [`mark`]: Self::mark
/// [`reset`]: Self::reset
/// [`close`]: Self::close
pub struct BufferedReader<S> {
	state: Mutex<State>,
	/// The source, taken exactly once by `close`.
	source: ArcSwapOption<S>,
	max_capacity: usize,
}

struct State {
	buf: Vec<u8>,
	/// The next byte to read.
	pos: usize,
	/// The end of the valid bytes in `buf`.
	count: usize,
	mark: Option<usize>,
	mark_limit: usize,
}

impl State {
	fn new(capacity: usize) -> Self {
		Self {
			buf: vec![0; capacity],
			pos: 0,
			count: 0,
			mark: None,
			mark_limit: 0,
		}
	}

	fn capacity(&self) -> usize { self.buf.len() }

	fn remaining(&self) -> usize { self.count - self.pos }

	fn check(&self) {
		debug_assert!(self.pos <= self.count, "position {} past count {}", self.pos, self.count);
		debug_assert!(self.count <= self.buf.len(), "count {} past capacity {}", self.count, self.buf.len());
		debug_assert!(self.mark.map_or(true, |mark| mark <= self.pos), "mark {:?} past position {}", self.mark, self.pos);
	}

	fn release(&mut self) {
		self.buf = Vec::new();
		self.pos = 0;
		self.count = 0;
		self.mark = None;
	}
}

impl<S: Source> BufferedReader<S> {
	/// Creates a reader with the default capacity, 8KiB.
	pub fn new(source: S) -> Self {
		let config = ReaderConfig::default();
		Self::create(source, config)
	}

	/// Creates a reader with an initial buffer `capacity`.
	///
	/// # Errors
	///
	/// Returns [`Error::InvalidArgument`] if `capacity` is zero.
	pub fn with_capacity(capacity: usize, source: S) -> Result<Self> {
		Ok(Self::create(source, ReaderConfig::new(capacity)?))
	}

	/// Creates a reader from a [`ReaderConfig`].
	///
	/// # Errors
	///
	/// Returns [`Error::InvalidArgument`] if the configuration is invalid.
	pub fn with_config(source: S, config: ReaderConfig) -> Result<Self> {
		config.validate()?;
		Ok(Self::create(source, config))
	}

	fn create(source: S, config: ReaderConfig) -> Self {
		Self {
			state: Mutex::new(State::new(config.capacity())),
			source: ArcSwapOption::from_pointee(source),
			max_capacity: config.max_capacity(),
		}
	}

	/// Reads one byte, returning `None` at end-of-stream.
	///
	/// # Errors
	///
	/// Returns [`Error::Closed`] if the reader is closed, or any error from the
	/// source.
	pub fn read_byte(&self) -> Result<Option<u8>> {
		let mut state = self.state.lock();
		let source = self.open(&mut state)?;
		if state.pos >= state.count {
			self.fill(&mut state, &source)?;
			self.ensure_open(&mut state)?;
			if state.pos >= state.count {
				return Ok(None)
			}
		}

		let byte = state.buf[state.pos];
		state.pos += 1;
		Ok(Some(byte))
	}

	/// Reads bytes into `buf`, returning the number of bytes read or `None` at
	/// end-of-stream. See [`read_into`](Self::read_into).
	///
	/// # Errors
	///
	/// Returns [`Error::Closed`] if the reader is closed, or any error from the
	/// source.
	pub fn read(&self, buf: &mut [u8]) -> Result<Option<usize>> {
		let len = buf.len();
		self.read_into(buf, 0, len)
	}

	/// Reads up to `len` bytes into `buf` starting at `offset`, returning the
	/// number of bytes read or `None` at end-of-stream.
	///
	/// Reading continues until `len` bytes are read, the stream ends, or the
	/// source reports no more bytes available without blocking. A fill making no
	/// bytes available is end-of-stream; only a read passed straight to the
	/// source can return `Some(0)`, when it has nothing available.
	///
	/// # Errors
	///
	/// Returns [`Error::OutOfBounds`] if `offset..offset + len` is not within
	/// `buf`, [`Error::Closed`] if the reader is closed, or any error from the
	/// source.
	pub fn read_into(&self, buf: &mut [u8], offset: usize, len: usize) -> Result<Option<usize>> {
		let mut state = self.state.lock();
		let source = self.open(&mut state)?;
		let end = offset.checked_add(len)
						.filter(|&end| end <= buf.len())
						.ok_or_else(|| Error::out_of_bounds(offset, len, buf.len()))?;
		if len == 0 {
			return Ok(Some(0))
		}

		let buf = &mut buf[offset..end];
		let mut filled = 0;
		loop {
			let read = self.read_once(&mut state, &source, &mut buf[filled..])?;
			match read {
				Some(count) if count > 0 => filled += count,
				_ => return Ok(if filled == 0 { read } else { Some(filled) })
			}

			if filled >= len {
				return Ok(Some(filled))
			}

			self.ensure_open(&mut state)?;
			if source.available()? == 0 {
				return Ok(Some(filled))
			}
		}
	}

	/// Fills `buf` completely, or consumes nothing if the stream ends first. The
	/// caller's mark is kept; it's used to hold the read bytes when set, so its
	/// limit is raised for the duration of the read.
	pub(crate) fn read_exact_or_rewind(&self, buf: &mut [u8]) -> Result {
		let len = buf.len();
		let mut state = self.state.lock();
		let source = self.open(&mut state)?;
		let (saved_mark, saved_limit) = (state.mark, state.mark_limit);
		let start = saved_mark.unwrap_or(state.pos);
		let offset = state.pos - start;
		state.mark = Some(start);
		state.mark_limit = match saved_mark {
			Some(_) => saved_limit.max(offset.saturating_add(len)),
			None => len
		};

		let mut filled = 0;
		let mut result = Ok(());
		while filled < len {
			match self.read_once(&mut state, &source, &mut buf[filled..]) {
				Ok(Some(count)) if count > 0 => filled += count,
				Ok(_) => {
					result = Err(Error::end(len));
					break
				}
				Err(error) => {
					result = Err(error);
					break
				}
			}
		}

		// Released by a close while reading.
		if let Some(mark) = state.mark {
			if result.is_err() {
				state.pos = mark + offset;
			}
			state.mark = saved_mark.map(|_| mark);
			state.mark_limit = saved_limit;
		}
		result
	}

	/// Reads into `buf` from the buffer, filling it from the source at most once.
	fn read_once(&self, state: &mut State, source: &S, buf: &mut [u8]) -> Result<Option<usize>> {
		let mut avail = state.remaining();
		if avail == 0 {
			// A large read without a mark gains nothing from a copy through the
			// buffer.
			if buf.len() >= state.capacity() && state.mark.is_none() {
				trace!(len = buf.len(), "reading directly from source");
				let read = source.read(buf)?;
				assert!(read.map_or(true, |count| count <= buf.len()), "source read past the end of its buffer");
				self.ensure_open(state)?;
				return Ok(read)
			}

			self.fill(state, source)?;
			self.ensure_open(state)?;
			avail = state.remaining();
			if avail == 0 {
				return Ok(None)
			}
		}

		let count = avail.min(buf.len());
		let pos = state.pos;
		buf[..count].copy_from_slice(&state.buf[pos..pos + count]);
		state.pos += count;
		Ok(Some(count))
	}

	/// Makes room in the buffer, then reads from the source into it once,
	/// returning the source's result.
	fn fill(&self, state: &mut State, source: &S) -> Result<Option<usize>> {
		let capacity = state.capacity();
		let mark = state.mark;
		match mark {
			None => state.pos = 0,
			Some(_) if state.pos < capacity => { }
			Some(mark) if mark > 0 => {
				state.buf.copy_within(mark..state.pos, 0);
				state.pos -= mark;
				state.mark = Some(0);
				trace!(discarded = mark, kept = state.pos, "compacted buffer");
			}
			Some(_) if capacity >= state.mark_limit => {
				debug!(capacity, mark_limit = state.mark_limit, "read limit exceeded, invalidating mark");
				state.mark = None;
				state.pos = 0;
			}
			Some(_) if capacity >= self.max_capacity => {
				return Err(Error::resource_exhausted(capacity))
			}
			Some(_) => self.grow(state)?
		}

		let pos = state.pos;
		state.count = pos;
		let read = source.read(&mut state.buf[pos..])?;
		if let Some(count) = read {
			assert!(count <= state.capacity() - pos, "source read past the end of its buffer");
			state.count = pos + count;
		}
		trace!(pos, count = state.count, capacity = state.capacity(), "filled buffer");
		state.check();
		Ok(read)
	}

	/// Doubles the buffer, bounded by the maximum capacity and the mark limit.
	/// The buffer must be full.
	fn grow(&self, state: &mut State) -> Result {
		let capacity = state.capacity();
		let pos = state.pos;
		let new_capacity = pos.saturating_mul(2)
							  .min(self.max_capacity)
							  .min(state.mark_limit);
		let mut buf = Vec::new();
		buf.try_reserve_exact(new_capacity)?;
		buf.extend_from_slice(&state.buf[..pos]);
		buf.resize(new_capacity, 0);

		// A concurrent close must not see the buffer come back.
		if self.is_closed() {
			state.release();
			return Err(Error::Closed)
		}

		state.buf = buf;
		debug!(from = capacity, to = new_capacity, "grew buffer to keep mark");
		Ok(())
	}

	/// Skips up to `count` bytes, returning the number of bytes skipped.
	///
	/// With no buffered bytes and no mark, the skip is passed to the source.
	/// Otherwise, at most the buffered bytes are skipped, filling the buffer first
	/// if it's empty so a reset can return to them.
	///
	/// # Errors
	///
	/// Returns [`Error::Closed`] if the reader is closed, or any error from the
	/// source.
	pub fn skip(&self, count: u64) -> Result<u64> {
		let mut state = self.state.lock();
		let source = self.open(&mut state)?;
		if count == 0 {
			return Ok(0)
		}

		let mut avail = state.remaining();
		if avail == 0 {
			if state.mark.is_none() {
				let skipped = source.skip(count)?;
				self.ensure_open(&mut state)?;
				return Ok(skipped)
			}

			self.fill(&mut state, &source)?;
			self.ensure_open(&mut state)?;
			avail = state.remaining();
			if avail == 0 {
				return Ok(0)
			}
		}

		let skipped = count.min(avail as u64) as usize;
		state.pos += skipped;
		Ok(skipped as u64)
	}

	/// Returns an estimate of the bytes readable without blocking: the buffered
	/// bytes plus the source's estimate, saturating at [`usize::MAX`].
	///
	/// # Errors
	///
	/// Returns [`Error::Closed`] if the reader is closed, or any error from the
	/// source.
	pub fn available(&self) -> Result<usize> {
		let mut state = self.state.lock();
		let source = self.open(&mut state)?;
		Ok(state.remaining().saturating_add(source.available()?))
	}

	/// Marks the current position. A later [`reset`](Self::reset) returns to it,
	/// unless more than `read_limit` bytes were read in between. Replaces any
	/// previous mark.
	pub fn mark(&self, read_limit: usize) {
		let mut state = self.state.lock();
		state.mark_limit = read_limit;
		state.mark = Some(state.pos);
	}

	/// Returns to the last marked position.
	///
	/// # Errors
	///
	/// Returns [`Error::InvalidMark`] if no mark was set, or if the mark was
	/// invalidated by reading past its limit. Returns [`Error::Closed`] if the
	/// reader is closed.
	pub fn reset(&self) -> Result {
		let mut state = self.state.lock();
		self.open(&mut state)?;
		let mark = state.mark.ok_or(Error::InvalidMark)?;
		if state.pos - mark > state.mark_limit {
			state.mark = None;
			return Err(Error::InvalidMark)
		}
		state.pos = mark;
		Ok(())
	}

	/// Returns `true`; mark and reset are always supported.
	pub const fn mark_supported(&self) -> bool { true }

	/// Closes the reader and its source. Safe to call from any thread, including
	/// while another is blocked reading, and safe to call more than once; the
	/// source is closed only by the first call.
	///
	/// Closing never waits on the reader's lock, but it does wait on
	/// [`Source::close`]. A blocked read is only interrupted if the source's
	/// `close` can wake it; [`IoSource`](crate::IoSource) can't, so closing one
	/// waits for its in-flight read to return.
	///
	/// # Errors
	///
	/// Returns any error from closing the source.
	pub fn close(&self) -> Result {
		let Some(source) = self.source.swap(None) else {
			return Ok(())
		};

		// A reader holding the lock releases the buffer when it sees the close.
		if let Some(mut state) = self.state.try_lock() {
			state.release();
		}

		debug!("closing source");
		source.close()
	}

	/// Returns `true` if the reader was closed.
	pub fn is_closed(&self) -> bool {
		self.source.load().is_none()
	}

	/// Returns the current capacity of the internal buffer.
	///
	/// # Errors
	///
	/// Returns [`Error::Closed`] if the reader is closed.
	pub fn capacity(&self) -> Result<usize> {
		let mut state = self.state.lock();
		self.open(&mut state)?;
		Ok(state.capacity())
	}

	/// Returns the number of buffered bytes not yet read.
	///
	/// # Errors
	///
	/// Returns [`Error::Closed`] if the reader is closed.
	pub fn buffered(&self) -> Result<usize> {
		let mut state = self.state.lock();
		self.open(&mut state)?;
		Ok(state.remaining())
	}

	fn open(&self, state: &mut State) -> Result<Arc<S>> {
		if let Some(source) = self.source.load_full() {
			Ok(source)
		} else {
			state.release();
			Err(Error::Closed)
		}
	}

	fn ensure_open(&self, state: &mut State) -> Result {
		self.open(state).map(drop)
	}
}

impl<S: Source> BufferedReader<S> {
	/// Fills `buf` completely.
	///
	/// # Errors
	///
	/// Returns [`Error::End`] if the stream ends, or has no bytes available,
	/// before `buf` is filled. The bytes read before that are left in `buf`.
	pub fn read_exact(&self, buf: &mut [u8]) -> Result {
		let mut filled = 0;
		while filled < buf.len() {
			match self.read(&mut buf[filled..])? {
				Some(count) if count > 0 => filled += count,
				_ => return Err(Error::end(buf.len()))
			}
		}
		Ok(())
	}

	/// Reads until end-of-stream, appending the bytes to `buf`. Returns the number
	/// of bytes read.
	///
	/// # Errors
	///
	/// Returns [`Error::Closed`] if the reader is closed, [`Error::Allocation`] if
	/// `buf` can't grow, or any error from the source.
	pub fn read_to_end(&self, buf: &mut Vec<u8>) -> Result<usize> {
		self.read_limited(buf, usize::MAX)
	}

	/// Reads up to `count` bytes, returning fewer only at end-of-stream or when
	/// the source has no bytes available.
	///
	/// # Errors
	///
	/// Returns [`Error::Closed`] if the reader is closed, [`Error::Allocation`] if
	/// the bytes can't be allocated, or any error from the source.
	pub fn read_n(&self, count: usize) -> Result<Vec<u8>> {
		let mut buf = Vec::new();
		self.read_limited(&mut buf, count)?;
		Ok(buf)
	}

	fn read_limited(&self, buf: &mut Vec<u8>, limit: usize) -> Result<usize> {
		let start = buf.len();
		let mut chunk_size = self.capacity()?;
		let mut remaining = limit;
		while remaining > 0 {
			let len = buf.len();
			let size = chunk_size.min(remaining);
			buf.try_reserve(size)?;
			buf.resize(len + size, 0);
			let read = match self.read(&mut buf[len..]) {
				Ok(read) => read,
				Err(error) => {
					buf.truncate(len);
					return Err(error)
				}
			};

			let count = read.unwrap_or_default();
			buf.truncate(len + count);
			if count == 0 {
				break
			}

			remaining -= count;
			// The chunk was filled completely; read more at once next time.
			if count == size {
				chunk_size = chunk_size.saturating_mul(2).min(MAX_READ_CHUNK).max(chunk_size);
			}
		}
		Ok(buf.len() - start)
	}

	/// Skips exactly `count` bytes.
	///
	/// # Errors
	///
	/// Returns [`Error::End`] if the stream ends before `count` bytes are skipped,
	/// [`Error::Closed`] if the reader is closed, or any error from the source.
	pub fn skip_exact(&self, count: u64) -> Result {
		let mut remaining = count;
		while remaining > 0 {
			let skipped = self.skip(remaining)?;
			if skipped > 0 {
				remaining -= skipped.min(remaining);
			} else if self.read_byte()?.is_some() {
				// Skip made no progress, but the stream hasn't ended.
				remaining -= 1;
			} else {
				return Err(Error::end(usize::try_from(count).unwrap_or(usize::MAX)))
			}
		}
		Ok(())
	}

	/// Reads until end-of-stream, writing all bytes to `sink`. Returns the number
	/// of bytes transferred.
	///
	/// # Errors
	///
	/// Returns [`Error::Closed`] if the reader is closed, or any error from the
	/// source or sink.
	pub fn transfer_to<W: Write + ?Sized>(&self, sink: &mut W) -> Result<u64> {
		let mut chunk = vec![0; self.capacity()?];
		let mut transferred = 0;
		while let Some(count) = self.read(&mut chunk)? {
			if count == 0 {
				break
			}

			sink.write_all(&chunk[..count])?;
			transferred += count as u64;
		}
		Ok(transferred)
	}
}

impl<S> Debug for BufferedReader<S> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let mut debug = f.debug_struct("BufferedReader");
		if let Some(state) = self.state.try_lock() {
			debug.field("capacity", &state.capacity())
				 .field("pos", &state.pos)
				 .field("count", &state.count)
				 .field("mark", &state.mark)
				 .field("mark_limit", &state.mark_limit);
		}
		debug.field("closed", &self.source.load().is_none())
			 .field("max_capacity", &self.max_capacity)
			 .finish_non_exhaustive()
	}
}
