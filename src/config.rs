// Copyright 2024 - Strixpyrr
// SPDX-License-Identifier: Apache-2.0

//! Buffer sizing for [`BufferedReader`](crate::BufferedReader).
//!
//! ```
//! use buffered_source::ReaderConfig;
//!
//! let config = ReaderConfig::new(4096)?.with_max_capacity(1 << 20);
//! config.validate()?;
//! # Ok::<(), buffered_source::Error>(())
//! ```

use crate::{Error, Result};

/// The default buffer capacity, 8KiB.
pub const DEFAULT_CAPACITY: usize = 8 * 1024;

/// The largest capacity the buffer may grow to while holding a mark, unless
/// configured otherwise.
pub const MAX_CAPACITY: usize = isize::MAX as usize - 8;

/// Capacity limits of a [`BufferedReader`](crate::BufferedReader).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ReaderConfig {
	capacity: usize,
	max_capacity: usize,
}

impl ReaderConfig {
	/// Creates a configuration with an initial buffer `capacity`.
	///
	/// # Errors
	///
	/// Returns [`Error::InvalidArgument`] if `capacity` is zero.
	pub fn new(capacity: usize) -> Result<Self> {
		let config = Self { capacity, ..Self::default() };
		config.validate()?;
		Ok(config)
	}

	/// Sets the largest capacity the buffer may grow to when a mark must be kept.
	/// Growing past it fails with [`Error::ResourceExhausted`].
	#[must_use]
	pub const fn with_max_capacity(mut self, max_capacity: usize) -> Self {
		self.max_capacity = max_capacity;
		self
	}

	/// Returns the initial buffer capacity.
	pub const fn capacity(&self) -> usize { self.capacity }

	/// Returns the maximum buffer capacity.
	pub const fn max_capacity(&self) -> usize { self.max_capacity }

	/// Checks the configuration.
	///
	/// # Errors
	///
	/// Returns [`Error::InvalidArgument`] if the capacity is zero, or if the
	/// maximum capacity is smaller than the capacity.
	pub fn validate(&self) -> Result {
		if self.capacity == 0 {
			return Err(Error::invalid_argument("buffer capacity must be non-zero"))
		}

		if self.max_capacity < self.capacity {
			return Err(Error::invalid_argument("max capacity cannot be less than capacity"))
		}

		Ok(())
	}
}

impl Default for ReaderConfig {
	fn default() -> Self {
		Self {
			capacity: DEFAULT_CAPACITY,
			max_capacity: MAX_CAPACITY,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn zero_capacity() {
		assert!(matches!(ReaderConfig::new(0), Err(Error::InvalidArgument { .. })));
	}

	#[test]
	fn max_below_capacity() {
		let config = ReaderConfig::new(64).unwrap().with_max_capacity(32);
		assert!(matches!(config.validate(), Err(Error::InvalidArgument { .. })));
	}

	#[test]
	fn defaults() {
		let config = ReaderConfig::default();
		assert_eq!(config.capacity(), DEFAULT_CAPACITY);
		assert_eq!(config.max_capacity(), MAX_CAPACITY);
		assert!(config.validate().is_ok());
	}
}
