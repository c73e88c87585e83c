// SPDX-License-Identifier: Apache-2.0

use std::io::{self, ErrorKind, Read};
use parking_lot::Mutex;
use crate::{BufferedReader, Error, Result, Source};

/// A [`Source`] over a [`std::io::Read`]er.
///
/// The reader is held behind a lock, so closing waits for an in-progress read to
/// return before dropping the reader. A read of zero bytes into a non-empty
/// buffer is end-of-stream.
#[derive(Debug)]
pub struct IoSource<R> {
	reader: Mutex<Option<R>>,
}

impl<R: Read + Send> IoSource<R> {
	/// Creates a source reading from `reader`.
	pub fn new(reader: R) -> Self {
		Self { reader: Mutex::new(Some(reader)) }
	}

	/// Returns the reader, or `None` if the source was closed.
	pub fn into_inner(self) -> Option<R> {
		self.reader.into_inner()
	}
}

impl<R: Read + Send> Source for IoSource<R> {
	fn read(&self, buf: &mut [u8]) -> Result<Option<usize>> {
		let mut reader = self.reader.lock();
		let reader = reader.as_mut().ok_or(Error::Closed)?;
		loop {
			match reader.read(buf) {
				Ok(0) if !buf.is_empty() => break Ok(None),
				Ok(count) => break Ok(Some(count)),
				Err(err) if err.kind() == ErrorKind::Interrupted => { }
				Err(err) => break Err(err.into())
			}
		}
	}

	fn close(&self) -> Result {
		self.reader.lock().take();
		Ok(())
	}
}

impl<S: Source> Read for BufferedReader<S> {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		Read::read(&mut &*self, buf)
	}
}

impl<S: Source> Read for &BufferedReader<S> {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		// A read making no progress before end-of-stream is reported as zero
		// bytes, which std readers take as the end.
		Ok(BufferedReader::read(*self, buf)?.unwrap_or_default())
	}
}
