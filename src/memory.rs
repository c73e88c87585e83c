// Copyright 2024 - Strixpyrr
// SPDX-License-Identifier: Apache-2.0

use std::sync::atomic::{AtomicBool, Ordering};
use parking_lot::Mutex;
use crate::{Error, Result, Source};

/// A [`Source`] over bytes held in memory. Reads never block and never return
/// `Some(0)`; once the bytes run out, reads return end-of-stream.
#[derive(Debug, Default)]
pub struct MemorySource {
	bytes: Box<[u8]>,
	pos: Mutex<usize>,
	closed: AtomicBool,
}

impl MemorySource {
	/// Creates a source reading `bytes`.
	pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
		Self {
			bytes: bytes.into().into_boxed_slice(),
			..Self::default()
		}
	}

	/// Returns the bytes not yet read.
	pub fn remaining(&self) -> usize {
		self.bytes.len() - *self.pos.lock()
	}

	/// Returns `true` if the source was closed.
	pub fn is_closed(&self) -> bool {
		self.closed.load(Ordering::Acquire)
	}

	fn ensure_open(&self) -> Result {
		if self.is_closed() {
			Err(Error::Closed)
		} else {
			Ok(())
		}
	}
}

impl Source for MemorySource {
	fn read(&self, buf: &mut [u8]) -> Result<Option<usize>> {
		self.ensure_open()?;
		let mut pos = self.pos.lock();
		let unread = &self.bytes[*pos..];
		if unread.is_empty() {
			return Ok(None)
		}

		let count = unread.len().min(buf.len());
		buf[..count].copy_from_slice(&unread[..count]);
		*pos += count;
		Ok(Some(count))
	}

	fn skip(&self, count: u64) -> Result<u64> {
		self.ensure_open()?;
		let mut pos = self.pos.lock();
		let skipped = count.min((self.bytes.len() - *pos) as u64) as usize;
		*pos += skipped;
		Ok(skipped as u64)
	}

	fn available(&self) -> Result<usize> {
		self.ensure_open()?;
		Ok(self.remaining())
	}

	fn close(&self) -> Result {
		self.closed.store(true, Ordering::Release);
		Ok(())
	}
}
