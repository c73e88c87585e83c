// Copyright 2024 - Strixpyrr
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use parking_lot::Mutex;
use proptest::prelude::*;
use proptest::sample::Index;
use buffered_source::{BufferedReader, Error, MemorySource, Result, Source};

/// Returns at most `chunk` bytes per read, always reporting the remaining bytes
/// as available.
struct Trickle {
	data: Vec<u8>,
	pos: Mutex<usize>,
	chunk: usize,
}

impl Source for Trickle {
	fn read(&self, buf: &mut [u8]) -> Result<Option<usize>> {
		let mut pos = self.pos.lock();
		let unread = &self.data[*pos..];
		if unread.is_empty() {
			return Ok(None)
		}

		let count = unread.len().min(buf.len()).min(self.chunk);
		buf[..count].copy_from_slice(&unread[..count]);
		*pos += count;
		Ok(Some(count))
	}

	fn available(&self) -> Result<usize> {
		Ok(self.data.len() - *self.pos.lock())
	}
}

/// Records the address and length of every buffer passed to `read`. Never runs
/// out of bytes.
#[derive(Default)]
struct Recording {
	reads: Mutex<Vec<(usize, usize)>>,
}

impl Source for Recording {
	fn read(&self, buf: &mut [u8]) -> Result<Option<usize>> {
		self.reads.lock().push((buf.as_ptr() as usize, buf.len()));
		buf.fill(0x5A);
		Ok(Some(buf.len()))
	}

	fn available(&self) -> Result<usize> {
		Ok(usize::MAX)
	}
}

#[test]
fn scenario() -> Result {
	let reader = BufferedReader::with_capacity(4, MemorySource::new([1, 2, 3, 4, 5, 6]))?;
	for expected in 1..=4 {
		assert_eq!(reader.read_byte()?, Some(expected));
	}
	reader.mark(10);
	assert_eq!(reader.read_byte()?, Some(5));
	assert_eq!(reader.read_byte()?, Some(6));
	reader.reset()?;
	assert_eq!(reader.read_byte()?, Some(5));
	assert_eq!(reader.read_byte()?, Some(6));
	assert_eq!(reader.read_byte()?, None);
	assert_eq!(reader.read_byte()?, None);
	Ok(())
}

#[test]
fn large_read_goes_straight_to_destination() -> Result {
	let source = Arc::new(Recording::default());
	let reader = BufferedReader::with_capacity(8, Arc::clone(&source))?;
	let mut buf = [0; 32];
	assert_eq!(reader.read_into(&mut buf, 8, 16)?, Some(16));
	assert_eq!(buf[8..24], [0x5A; 16]);
	assert_eq!(buf[..8], [0; 8]);
	assert_eq!(*source.reads.lock(), [(buf[8..].as_ptr() as usize, 16)]);
	Ok(())
}

#[test]
fn small_read_goes_through_buffer() -> Result {
	let source = Arc::new(Recording::default());
	let reader = BufferedReader::with_capacity(8, Arc::clone(&source))?;
	let mut buf = [0; 4];
	assert_eq!(reader.read(&mut buf)?, Some(4));
	let reads = source.reads.lock();
	assert_eq!(reads.len(), 1);
	assert_ne!(reads[0].0, buf.as_ptr() as usize);
	assert_eq!(reads[0].1, 8);
	assert_eq!(reader.buffered()?, 4);
	Ok(())
}

#[test]
fn large_read_with_mark_goes_through_buffer() -> Result {
	let source = Arc::new(Recording::default());
	let reader = BufferedReader::with_capacity(8, Arc::clone(&source))?;
	reader.mark(64);
	let mut buf = [0; 16];
	assert_eq!(reader.read(&mut buf)?, Some(16));
	let start = buf.as_ptr() as usize;
	let reads = source.reads.lock();
	assert!(reads.iter().all(|&(ptr, _)| ptr < start || ptr >= start + buf.len()));
	drop(reads);
	reader.reset()?;
	assert_eq!(reader.buffered()?, 16);
	Ok(())
}

#[derive(Clone, Debug)]
enum Op {
	ReadByte,
	Read(usize),
	Skip(u64),
	Mark(usize),
	Reset,
}

fn op() -> impl Strategy<Value = Op> {
	prop_oneof![
		3 => Just(Op::ReadByte),
		3 => (0..48usize).prop_map(Op::Read),
		1 => (0..24u64).prop_map(Op::Skip),
		1 => (0..64usize).prop_map(Op::Mark),
		1 => Just(Op::Reset),
	]
}

proptest! {
	#[test]
	fn mark_reset_round_trip(
		data in prop::collection::vec(any::<u8>(), 0..512),
		capacity in 1..64usize,
		before in any::<Index>(),
		limit in 0..256usize,
		after in any::<Index>(),
	) {
		let before = before.index(data.len() + 1);
		let after = after.index((data.len() - before).min(limit) + 1);
		let reader = BufferedReader::with_capacity(capacity, MemorySource::new(data.clone()))?;

		reader.read_exact(&mut vec![0; before])?;
		reader.mark(limit);
		let mut first = vec![0; after];
		reader.read_exact(&mut first)?;
		reader.reset()?;
		let mut second = vec![0; after];
		reader.read_exact(&mut second)?;

		prop_assert_eq!(&first, &second);
		prop_assert_eq!(&first[..], &data[before..before + after]);
	}

	#[test]
	fn short_reads_are_completed(
		data in prop::collection::vec(any::<u8>(), 1..512),
		capacity in 1..64usize,
		chunk in 1..16usize,
		len in any::<Index>(),
		offset in 0..8usize,
	) {
		let len = len.index(data.len()) + 1;
		let source = Trickle { data: data.clone(), pos: Mutex::new(0), chunk };
		let reader = BufferedReader::with_capacity(capacity, source)?;
		let mut buf = vec![0; offset + len];
		prop_assert_eq!(reader.read_into(&mut buf, offset, len)?, Some(len));
		prop_assert_eq!(&buf[offset..], &data[..len]);
	}

	#[test]
	fn operations_agree_with_model(
		data in prop::collection::vec(any::<u8>(), 0..200),
		capacity in 1..16usize,
		ops in prop::collection::vec(op(), 0..64),
	) {
		let reader = BufferedReader::with_capacity(capacity, MemorySource::new(data.clone()))?;
		let mut pos = 0;
		// Position and read limit of the current mark.
		let mut mark: Option<(usize, usize)> = None;

		for op in ops {
			match op {
				Op::ReadByte => {
					let byte = reader.read_byte()?;
					prop_assert_eq!(byte, data.get(pos).copied());
					pos += usize::from(byte.is_some());
				}
				Op::Read(len) => {
					let mut buf = vec![0; len];
					let expected = len.min(data.len() - pos);
					match reader.read(&mut buf)? {
						None => prop_assert!(len > 0 && expected == 0),
						Some(count) => {
							prop_assert_eq!(count, expected);
							prop_assert_eq!(&buf[..count], &data[pos..pos + count]);
							pos += count;
						}
					}
				}
				Op::Skip(count) => {
					let skipped = reader.skip(count)? as usize;
					let possible = (count as usize).min(data.len() - pos);
					prop_assert!(skipped <= possible);
					prop_assert_eq!(skipped == 0, possible == 0);
					pos += skipped;
				}
				Op::Mark(limit) => {
					reader.mark(limit);
					mark = Some((pos, limit));
				}
				Op::Reset => {
					let result = reader.reset();
					match mark {
						Some((mark_pos, limit)) if pos - mark_pos < limit => {
							prop_assert!(result.is_ok());
							pos = mark_pos;
						}
						Some((mark_pos, limit)) if pos - mark_pos == limit => {
							if result.is_ok() {
								pos = mark_pos;
							} else {
								mark = None;
							}
						}
						_ => {
							prop_assert!(matches!(result, Err(Error::InvalidMark)));
							mark = None;
						}
					}
				}
			}
		}

		let mut rest = Vec::new();
		reader.read_to_end(&mut rest)?;
		prop_assert_eq!(&rest[..], &data[pos..]);
	}
}
