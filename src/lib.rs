// Copyright 2024 - Strixpyrr
// SPDX-License-Identifier: Apache-2.0

//! This crate provides [`BufferedReader`], a buffering reader over a byte [`Source`]
//! which supports rewinding with mark and reset, and which can be closed from any
//! thread, even while another thread is blocked reading.
//!
//! Small reads are served from an internal buffer, refilled by larger reads from
//! the source. Large reads skip the buffer when nothing needs to be kept for a
//! reset. [`DataSource`] reads typed data, such as big or little-endian integers,
//! on top of the buffered bytes.
//!
//! Sources are provided for in-memory bytes ([`MemorySource`]) and `std::io`
//! readers ([`IoSource`]), but it's easy to write your own:
//!
//! ```no_run
//! # use buffered_source::{BufferedReader, Result, Source};
//! use std::sync::atomic::{AtomicBool, Ordering};
//!
//! struct Zeros {
//!     closed: AtomicBool,
//! }
//!
//! impl Source for Zeros {
//!     fn read(&self, buf: &mut [u8]) -> Result<Option<usize>> {
//!         if self.closed.load(Ordering::Acquire) {
//!             return Ok(None)
//!         }
//!         buf.fill(0);
//!         Ok(Some(buf.len()))
//!     }
//!
//!     fn close(&self) -> Result {
//!         self.closed.store(true, Ordering::Release);
//!         Ok(())
//!     }
//! }
//!
//! let reader = BufferedReader::new(Zeros { closed: AtomicBool::new(false) });
//! reader.mark(16);
//! let mut buf = [1; 16];
//! reader.read_exact(&mut buf)?;
//! reader.reset()?;
//! reader.close()?;
//! # Ok::<(), buffered_source::Error>(())
//! ```

#![deny(clippy::pedantic)]
#![allow(
	clippy::cast_sign_loss, // I know
	clippy::cast_possible_truncation, // Yes, and?
	clippy::module_name_repetitions,
	clippy::must_use_candidate,
)]

mod buffered;
mod config;
mod data;
mod error;
mod memory;
mod source;
mod std_io;
mod wrappers;

pub use buffered::BufferedReader;
pub use config::{ReaderConfig, DEFAULT_CAPACITY, MAX_CAPACITY};
pub use data::DataSource;
pub use error::Error;
pub use memory::MemorySource;
pub use source::Source;
pub use std_io::IoSource;

pub type Result<T = (), E = Error> = core::result::Result<T, E>;
