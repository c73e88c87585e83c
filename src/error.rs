// Copyright 2024 - Strixpyrr
// SPDX-License-Identifier: Apache-2.0

use std::collections::TryReserveError;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io;

/// A stream error.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
	/// An error raised by the underlying source, passed through unchanged.
	Io(io::Error),
	/// The stream was closed.
	Closed,
	/// An argument was rejected, such as a zero buffer capacity.
	InvalidArgument {
		/// What was wrong with the argument.
		message: &'static str
	},
	/// An offset and length pair does not fit within the destination buffer.
	OutOfBounds {
		/// The requested start offset.
		offset: usize,
		/// The requested length.
		len: usize,
		/// The length of the destination buffer.
		buf_len: usize,
	},
	/// A reset was attempted without a mark, or after the mark was invalidated
	/// by reading past its limit.
	InvalidMark,
	/// The buffer would have to grow past its maximum capacity to keep a mark.
	ResourceExhausted {
		/// The buffer capacity at the time growth was required.
		capacity: usize
	},
	/// Error while attempting to reserve capacity.
	Allocation(TryReserveError),
	/// Premature end-of-stream.
	End {
		/// The total required byte count.
		required_count: usize
	},
}

impl Error {
	/// Creates an invalid argument error.
	#[inline]
	pub const fn invalid_argument(message: &'static str) -> Self {
		Self::InvalidArgument { message }
	}
	/// Creates an out-of-bounds error.
	#[inline]
	pub const fn out_of_bounds(offset: usize, len: usize, buf_len: usize) -> Self {
		Self::OutOfBounds { offset, len, buf_len }
	}
	/// Creates a resource exhaustion error.
	#[inline]
	pub const fn resource_exhausted(capacity: usize) -> Self {
		Self::ResourceExhausted { capacity }
	}
	/// Creates an end-of-stream error.
	#[inline]
	pub const fn end(required_count: usize) -> Self {
		Self::End { required_count }
	}

	/// Returns `true` if the error was caused by a closed stream.
	#[inline]
	pub const fn is_closed(&self) -> bool {
		matches!(self, Self::Closed)
	}
}

impl std::error::Error for Error {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::Io(error) => Some(error),
			Self::Allocation(error) => Some(error),
			Self::Closed |
			Self::InvalidArgument { .. } |
			Self::OutOfBounds { .. } |
			Self::InvalidMark |
			Self::ResourceExhausted { .. } |
			Self::End { .. } => None,
		}
	}
}

impl Display for Error {
	fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
		match self {
			Self::Io(error) => Display::fmt(error, f),
			Self::Allocation(error) => Display::fmt(error, f),
			Self::Closed => write!(f, "stream closed"),
			Self::InvalidArgument { message } => write!(f, "invalid argument: {message}"),
			Self::OutOfBounds {
				offset, len, buf_len
			} => write!(f, "range of {len} bytes at offset {offset} is out of bounds for a buffer of {buf_len} bytes"),
			Self::InvalidMark => write!(f, "resetting to invalid mark"),
			Self::ResourceExhausted { capacity } => write!(f, "cannot grow buffer of {capacity} bytes past its maximum capacity"),
			Self::End { required_count } => write!(f, "premature end-of-stream when reading {required_count} bytes"),
		}
	}
}

impl From<io::Error> for Error {
	#[inline]
	fn from(value: io::Error) -> Self {
		Self::Io(value)
	}
}

impl From<TryReserveError> for Error {
	#[inline]
	fn from(value: TryReserveError) -> Self {
		Self::Allocation(value)
	}
}

impl From<Error> for io::Error {
	fn from(value: Error) -> Self {
		use io::ErrorKind;

		let kind = match &value {
			Error::Io(_) => ErrorKind::Other,
			Error::Closed => ErrorKind::BrokenPipe,
			Error::InvalidArgument { .. } |
			Error::OutOfBounds { .. } => ErrorKind::InvalidInput,
			Error::End { .. } => ErrorKind::UnexpectedEof,
			Error::Allocation(_) => ErrorKind::OutOfMemory,
			Error::InvalidMark |
			Error::ResourceExhausted { .. } => ErrorKind::Other,
		};
		match value {
			Error::Io(error) => error,
			error => Self::new(kind, error)
		}
	}
}

#[cfg(test)]
mod tests {
	use std::io;
	use super::Error;

	#[test]
	fn io_round_trip_keeps_original() {
		let error: Error = io::Error::new(io::ErrorKind::NotFound, "gone").into();
		let error: io::Error = error.into();
		assert_eq!(error.kind(), io::ErrorKind::NotFound);
		assert_eq!(error.to_string(), "gone");
	}

	#[test]
	fn io_kinds() {
		let kind = |e: Error| io::Error::from(e).kind();
		assert_eq!(kind(Error::Closed), io::ErrorKind::BrokenPipe);
		assert_eq!(kind(Error::end(4)), io::ErrorKind::UnexpectedEof);
		assert_eq!(kind(Error::out_of_bounds(3, 9, 4)), io::ErrorKind::InvalidInput);
		assert_eq!(kind(Error::InvalidMark), io::ErrorKind::Other);
	}

	#[test]
	fn display() {
		assert_eq!(Error::Closed.to_string(), "stream closed");
		assert_eq!(Error::InvalidMark.to_string(), "resetting to invalid mark");
		assert!(Error::resource_exhausted(16).to_string().contains("16 bytes"));
	}
}
