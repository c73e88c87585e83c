// Copyright 2024 - Strixpyrr
// SPDX-License-Identifier: Apache-2.0

use bytemuck::{bytes_of_mut, Pod};
use num_traits::PrimInt;
use crate::{BufferedReader, Error, Result, Source};

/// Reads typed data from a byte stream.
pub trait DataSource {
	/// Returns the number of bytes readable without blocking. This does not
	/// necessarily mean more data isn't available, just that *at least* this
	/// count may be read.
	fn available_bytes(&mut self) -> Result<usize>;
	/// Consumes up to `count` bytes in the stream, returning the number of bytes
	/// consumed if successful.
	fn skip_bytes(&mut self, count: usize) -> Result<usize>;
	/// Reads bytes into a slice until it's full or the stream has no more bytes,
	/// returning the bytes read.
	fn read_bytes<'a>(&mut self, buf: &'a mut [u8]) -> Result<&'a [u8]>;
	/// Reads the exact length of bytes into a slice, returning the bytes read if
	/// successful, or an end-of-stream error if not.
	fn read_exact_bytes<'a>(&mut self, buf: &'a mut [u8]) -> Result<&'a [u8]> {
		let len = buf.len();
		let bytes = self.read_bytes(buf)?;
		if bytes.len() < len {
			return Err(Error::end(len))
		}
		Ok(bytes)
	}
	/// Reads an array with a size of `N` bytes.
	fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> where Self: Sized {
		let mut array = [0; N];
		self.read_exact_bytes(&mut array)?;
		Ok(array)
	}

	/// Reads a [`bool`], where any non-zero byte is `true`.
	fn read_bool(&mut self) -> Result<bool> { Ok(self.read_u8()? != 0) }
	/// Reads a [`u8`].
	fn read_u8(&mut self) -> Result<u8> { self.read_be_int() }
	/// Reads an [`i8`].
	fn read_i8(&mut self) -> Result<i8> { self.read_be_int() }
	/// Reads a big-endian [`u16`].
	fn read_u16(&mut self) -> Result<u16> { self.read_be_int() }
	/// Reads a big-endian [`i16`].
	fn read_i16(&mut self) -> Result<i16> { self.read_be_int() }
	/// Reads a little-endian [`u16`].
	fn read_u16_le(&mut self) -> Result<u16> { self.read_le_int() }
	/// Reads a little-endian [`i16`].
	fn read_i16_le(&mut self) -> Result<i16> { self.read_le_int() }
	/// Reads a big-endian [`u32`].
	fn read_u32(&mut self) -> Result<u32> { self.read_be_int() }
	/// Reads a big-endian [`i32`].
	fn read_i32(&mut self) -> Result<i32> { self.read_be_int() }
	/// Reads a little-endian [`u32`].
	fn read_u32_le(&mut self) -> Result<u32> { self.read_le_int() }
	/// Reads a little-endian [`i32`].
	fn read_i32_le(&mut self) -> Result<i32> { self.read_le_int() }
	/// Reads a big-endian [`u64`].
	fn read_u64(&mut self) -> Result<u64> { self.read_be_int() }
	/// Reads a big-endian [`i64`].
	fn read_i64(&mut self) -> Result<i64> { self.read_be_int() }
	/// Reads a little-endian [`u64`].
	fn read_u64_le(&mut self) -> Result<u64> { self.read_le_int() }
	/// Reads a little-endian [`i64`].
	fn read_i64_le(&mut self) -> Result<i64> { self.read_le_int() }
	/// Reads a big-endian [`u128`].
	fn read_u128(&mut self) -> Result<u128> { self.read_be_int() }
	/// Reads a big-endian [`i128`].
	fn read_i128(&mut self) -> Result<i128> { self.read_be_int() }
	/// Reads a little-endian [`u128`].
	fn read_u128_le(&mut self) -> Result<u128> { self.read_le_int() }
	/// Reads a little-endian [`i128`].
	fn read_i128_le(&mut self) -> Result<i128> { self.read_le_int() }
	/// Reads a big-endian [`f32`].
	fn read_f32(&mut self) -> Result<f32> { self.read_u32().map(f32::from_bits) }
	/// Reads a big-endian [`f64`].
	fn read_f64(&mut self) -> Result<f64> { self.read_u64().map(f64::from_bits) }

	/// Reads a big-endian integer.
	fn read_int<T: PrimInt + Pod>(&mut self) -> Result<T> where Self: Sized {
		self.read_be_int()
	}
	/// Reads a little-endian integer.
	fn read_int_le<T: PrimInt + Pod>(&mut self) -> Result<T> where Self: Sized {
		self.read_le_int()
	}

	/// Reads a value of generic type `T` supporting an arbitrary bit pattern. See
	/// [`Pod`].
	fn read_data<T: Pod>(&mut self) -> Result<T> where Self: Sized {
		self.read_pod()
	}
}

/// Helper extension trait for reading generic data from an unsized source.
trait ReadPod<T: Pod>: DataSource {
	fn read_be_int(&mut self) -> Result<T> where T: PrimInt {
		self.read_pod().map(T::from_be)
	}
	fn read_le_int(&mut self) -> Result<T> where T: PrimInt {
		self.read_pod().map(T::from_le)
	}
	fn read_pod(&mut self) -> Result<T> {
		let mut value = T::zeroed();
		self.read_exact_bytes(bytes_of_mut(&mut value))?;
		Ok(value)
	}
}

impl<S: DataSource + ?Sized, T: Pod> ReadPod<T> for S { }

impl<S: Source> DataSource for &BufferedReader<S> {
	fn available_bytes(&mut self) -> Result<usize> {
		self.available()
	}

	fn skip_bytes(&mut self, count: usize) -> Result<usize> {
		let mut skipped = 0;
		while skipped < count {
			match self.skip((count - skipped) as u64)? {
				0 => break,
				cur => skipped += cur as usize
			}
		}
		Ok(skipped)
	}

	fn read_bytes<'a>(&mut self, buf: &'a mut [u8]) -> Result<&'a [u8]> {
		let mut filled = 0;
		while filled < buf.len() {
			match self.read(&mut buf[filled..])? {
				Some(count) if count > 0 => filled += count,
				_ => break
			}
		}
		Ok(&buf[..filled])
	}

	/// Reads the exact length of bytes into a slice. If the stream ends first, the
	/// bytes read are returned to the stream. Any mark is left in place.
	fn read_exact_bytes<'a>(&mut self, buf: &'a mut [u8]) -> Result<&'a [u8]> {
		self.read_exact_or_rewind(buf)?;
		Ok(buf)
	}
}

impl<S: Source> DataSource for BufferedReader<S> {
	fn available_bytes(&mut self) -> Result<usize> {
		(&*self).available_bytes()
	}

	fn skip_bytes(&mut self, count: usize) -> Result<usize> {
		(&*self).skip_bytes(count)
	}

	fn read_bytes<'a>(&mut self, buf: &'a mut [u8]) -> Result<&'a [u8]> {
		(&*self).read_bytes(buf)
	}

	fn read_exact_bytes<'a>(&mut self, buf: &'a mut [u8]) -> Result<&'a [u8]> {
		(&*self).read_exact_bytes(buf)
	}
}

#[cfg(test)]
mod tests {
	use crate::{BufferedReader, DataSource, Error, MemorySource, Result};

	#[test]
	fn integers() -> Result {
		let mut reader = BufferedReader::with_capacity(4, MemorySource::new([
			0x01,
			0x02, 0x03,
			0x04, 0x03,
			0x00, 0x00, 0x00, 0x2A,
			0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
			0x01,
		]))?;
		assert_eq!(reader.read_u8()?, 1);
		assert_eq!(reader.read_u16()?, 0x0203);
		assert_eq!(reader.read_u16_le()?, 0x0304);
		assert_eq!(reader.read_int::<u32>()?, 42);
		assert_eq!(reader.read_i64()?, -2);
		assert!(reader.read_bool()?);
		Ok(())
	}

	#[test]
	fn floats() -> Result {
		let mut bytes = 1.5f32.to_be_bytes().to_vec();
		bytes.extend_from_slice(&(-0.25f64).to_be_bytes());
		let mut reader = BufferedReader::new(MemorySource::new(bytes));
		assert_eq!(reader.read_f32()?.to_bits(), 1.5f32.to_bits());
		assert_eq!(reader.read_f64()?.to_bits(), (-0.25f64).to_bits());
		Ok(())
	}

	#[test]
	fn premature_end_consumes_nothing() -> Result {
		let mut reader = BufferedReader::with_capacity(2, MemorySource::new([1, 2, 3]))?;
		assert!(matches!(reader.read_u32(), Err(Error::End { required_count: 4 })));
		assert_eq!(reader.read_u16()?, 0x0102);
		assert_eq!(reader.read_u8()?, 3);
		Ok(())
	}

	#[test]
	fn typed_reads_keep_mark() -> Result {
		let mut reader = BufferedReader::with_capacity(4, MemorySource::new([1, 2, 3]))?;
		reader.mark(100);
		assert_eq!(reader.read_u8()?, 1);
		assert_eq!(reader.read_u8()?, 2);
		reader.reset()?;
		assert_eq!(reader.read_byte()?, Some(1));
		Ok(())
	}

	#[test]
	fn premature_end_keeps_mark() -> Result {
		let mut reader = BufferedReader::with_capacity(2, MemorySource::new([1, 2, 3, 4, 5]))?;
		reader.read_u8()?;
		reader.mark(8);
		assert_eq!(reader.read_u16()?, 0x0203);
		assert!(matches!(reader.read_u32(), Err(Error::End { required_count: 4 })));
		assert_eq!(reader.read_u16()?, 0x0405);
		reader.reset()?;
		assert_eq!(reader.read_byte()?, Some(2));
		Ok(())
	}

	#[test]
	fn typed_reads_leave_no_mark() -> Result {
		let mut reader = BufferedReader::with_capacity(2, MemorySource::new([1, 2, 3]))?;
		assert_eq!(reader.read_u16()?, 0x0102);
		assert!(matches!(reader.reset(), Err(Error::InvalidMark)));
		Ok(())
	}

	#[test]
	fn skip_bytes() -> Result {
		let mut reader = BufferedReader::with_capacity(4, MemorySource::new([0; 10]))?;
		assert_eq!(reader.skip_bytes(6)?, 6);
		assert_eq!(reader.available_bytes()?, 4);
		assert_eq!(reader.skip_bytes(6)?, 4);
		Ok(())
	}
}
