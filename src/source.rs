// Copyright 2024 - Strixpyrr
// SPDX-License-Identifier: Apache-2.0

use crate::Result;

/// The largest scratch buffer used by the default [`Source::skip`].
const MAX_SKIP_BUFFER_SIZE: usize = 2048;

/// An underlying producer of bytes, wrapped by a [`BufferedReader`].
///
/// Methods take `&self` so the source can be closed from one thread while a read
/// is blocked on another. Implementations needing mutable state should keep it
/// behind a lock or atomics.
///
/// [`BufferedReader`]: crate::BufferedReader
pub trait Source: Send + Sync {
	/// Reads bytes into `buf`, returning `Some` with the number of bytes read, or
	/// `None` at end-of-stream. `Some(0)` means no bytes are available right now,
	/// not that the stream has ended. May block.
	fn read(&self, buf: &mut [u8]) -> Result<Option<usize>>;

	/// Skips up to `count` bytes, returning the number of bytes skipped.
	///
	/// The default implementation reads and discards bytes, stopping early at
	/// end-of-stream or when no bytes are available.
	fn skip(&self, count: u64) -> Result<u64> {
		if count == 0 {
			return Ok(0)
		}

		let size = count.min(MAX_SKIP_BUFFER_SIZE as u64) as usize;
		let mut scratch = vec![0; size];
		let mut remaining = count;
		while remaining > 0 {
			let len = remaining.min(size as u64) as usize;
			match self.read(&mut scratch[..len])? {
				None | Some(0) => break,
				Some(read) => remaining -= read as u64,
			}
		}
		Ok(count - remaining)
	}

	/// Returns an estimate of the number of bytes that can be read without
	/// blocking. Must not block.
	fn available(&self) -> Result<usize> { Ok(0) }

	/// Closes the source. A [`BufferedReader`] calls this at most once.
	///
	/// [`BufferedReader`]: crate::BufferedReader
	fn close(&self) -> Result { Ok(()) }
}
