//! Binary decoding primitives (spec §4.1)

use crate::config::Config;
use crate::Error;
use std::io::Read;

/// A cursor over an Avro binary encoding, reading primitives per spec §4.1
///
/// Once any read fails, the reader is poisoned: every subsequent call
/// returns an error immediately without touching the underlying stream
/// again, so a caller can't observe a value decoded from a stream that's
/// already out of sync with its schema.
pub struct Reader<'r, R> {
	inner: &'r mut R,
	config: &'r Config,
	poisoned: bool,
}

impl<'r, R: Read> Reader<'r, R> {
	/// Wrap `inner`, reading primitives under `config`'s limits.
	pub fn new(inner: &'r mut R, config: &'r Config) -> Self {
		Self {
			inner,
			config,
			poisoned: false,
		}
	}

	fn check_poisoned(&self) -> crate::Result<()> {
		if self.poisoned {
			Err(Error::overflow("reader is poisoned by a previous error"))
		} else {
			Ok(())
		}
	}

	fn fail<T>(&mut self, err: Error) -> crate::Result<T> {
		self.poisoned = true;
		Err(err)
	}

	/// `boolean`: a single byte, `0` for false, any other value for true
	pub fn read_bool(&mut self) -> crate::Result<bool> {
		self.check_poisoned()?;
		let mut buf = [0u8; 1];
		if let Err(e) = self.inner.read_exact(&mut buf) {
			return self.fail(e.into());
		}
		Ok(buf[0] != 0)
	}

	/// `int`: a zig-zag encoded variable-length 32-bit integer
	pub fn read_int(&mut self) -> crate::Result<i32> {
		self.check_poisoned()?;
		let zigzag = self.read_varint_u64(5)?;
		Ok(((zigzag >> 1) as i32) ^ -((zigzag & 1) as i32))
	}

	/// `long`: a zig-zag encoded variable-length 64-bit integer
	pub fn read_long(&mut self) -> crate::Result<i64> {
		self.check_poisoned()?;
		let zigzag = self.read_varint_u64(10)?;
		Ok(((zigzag >> 1) as i64) ^ -((zigzag & 1) as i64))
	}

	/// Decode the unsigned base-128 little-endian varint that underlies
	/// every zig-zag `int`/`long` (spec §4.1), reading at most `max_bytes`
	/// continuation groups (`⌈bits/7⌉`, per spec).
	///
	/// Per spec §7, hitting end-of-stream while a trailing integer is still
	/// mid-decode is *not* an error: the value accumulated from the bytes
	/// read so far is returned as-is, on the assumption that a reader racing
	/// a writer's flush may simply not have seen the rest yet.
	fn read_varint_u64(&mut self, max_bytes: usize) -> crate::Result<u64> {
		let mut result: u64 = 0;
		let mut shift: u32 = 0;
		for _ in 0..max_bytes {
			let mut byte = [0u8; 1];
			match self.inner.read(&mut byte) {
				Ok(0) => return Ok(result),
				Ok(_) => {}
				Err(e) => return self.fail(e.into()),
			}
			result |= ((byte[0] & 0x7f) as u64) << shift;
			if byte[0] & 0x80 == 0 {
				return Ok(result);
			}
			shift += 7;
		}
		self.fail(Error::overflow("varint has too many continuation bytes"))
	}

	/// `float`: 4 bytes, little-endian IEEE-754 single precision
	pub fn read_float(&mut self) -> crate::Result<f32> {
		self.check_poisoned()?;
		let mut buf = [0u8; 4];
		if let Err(e) = self.inner.read_exact(&mut buf) {
			return self.fail(e.into());
		}
		Ok(f32::from_le_bytes(buf))
	}

	/// `double`: 8 bytes, little-endian IEEE-754 double precision
	pub fn read_double(&mut self) -> crate::Result<f64> {
		self.check_poisoned()?;
		let mut buf = [0u8; 8];
		if let Err(e) = self.inner.read_exact(&mut buf) {
			return self.fail(e.into());
		}
		Ok(f64::from_le_bytes(buf))
	}

	/// `bytes`: a `long` length followed by that many raw bytes
	///
	/// The length is checked against `Config::max_byte_slice_size` before
	/// any allocation is attempted.
	pub fn read_bytes(&mut self) -> crate::Result<Vec<u8>> {
		self.check_poisoned()?;
		let len = self.read_long()?;
		if len < 0 {
			return self.fail(Error::overflow("negative byte-slice length"));
		}
		if let Some(limit) = self.config.max_byte_slice_size_checked() {
			if len as u64 > limit {
				return self.fail(Error::SizeLimit {
					requested: len as u64,
					limit,
				});
			}
		}
		let mut buf = vec![0u8; len as usize];
		if let Err(e) = self.inner.read_exact(&mut buf) {
			return self.fail(e.into());
		}
		Ok(buf)
	}

	/// `string`: a `bytes` value interpreted as UTF-8
	pub fn read_string(&mut self) -> crate::Result<String> {
		let bytes = self.read_bytes()?;
		String::from_utf8(bytes).map_err(|e| Error::type_mismatch(format_args!("string is not valid UTF-8: {e}")))
	}

	/// `fixed`: exactly `size` raw bytes, no length prefix
	pub fn read_fixed(&mut self, size: usize) -> crate::Result<Vec<u8>> {
		self.check_poisoned()?;
		let mut buf = vec![0u8; size];
		if let Err(e) = self.inner.read_exact(&mut buf) {
			return self.fail(e.into());
		}
		Ok(buf)
	}

	/// The header of one block of an `array` or `map`: the number of items
	/// in the block (`0` means the end of the array/map), and, when the
	/// writer chose to emit one, the byte size of the block (used to skip
	/// blocks of an unrecognized item schema).
	pub fn read_block_header(&mut self) -> crate::Result<(u64, Option<u64>)> {
		let count = self.read_long()?;
		if count == 0 {
			return Ok((0, None));
		}
		if count < 0 {
			let byte_size = self.read_long()?;
			if byte_size < 0 {
				return self.fail(Error::overflow("negative block byte size"));
			}
			Ok(((-count) as u64, Some(byte_size as u64)))
		} else {
			Ok((count as u64, None))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn reader(bytes: &[u8]) -> (Vec<u8>, Config) {
		(bytes.to_vec(), Config::new())
	}

	#[test]
	fn decodes_long_27() {
		let (mut buf, config) = reader(&[54]);
		let mut cursor = std::io::Cursor::new(&mut buf);
		let mut r = Reader::new(&mut cursor, &config);
		assert_eq!(r.read_long().unwrap(), 27);
	}

	#[test]
	fn decodes_negative_long() {
		let (mut buf, config) = reader(&[3]);
		let mut cursor = std::io::Cursor::new(&mut buf);
		let mut r = Reader::new(&mut cursor, &config);
		assert_eq!(r.read_long().unwrap(), -2);
	}

	#[test]
	fn poisons_after_error() {
		// A fixed-size primitive (not a trailing integer) still errors on
		// end-of-stream, and poisons the reader for good (spec §4.1).
		let (mut buf, config) = reader(&[]);
		let mut cursor = std::io::Cursor::new(&mut buf);
		let mut r = Reader::new(&mut cursor, &config);
		assert!(r.read_bool().is_err());
		assert!(r.read_bool().is_err());
	}

	#[test]
	fn end_of_stream_mid_varint_is_not_an_error() {
		// Spec §7: hitting EOF while reading a trailing integer returns the
		// accumulated value instead of erroring.
		let (mut buf, config) = reader(&[]);
		let mut cursor = std::io::Cursor::new(&mut buf);
		let mut r = Reader::new(&mut cursor, &config);
		assert_eq!(r.read_long().unwrap(), 0);
	}

	#[test]
	fn varint_with_too_many_continuation_bytes_overflows() {
		// ⌈64/7⌉ = 10 groups; an 11th continuation byte is one too many.
		let (mut buf, config) = reader(&[0x80; 11]);
		let mut cursor = std::io::Cursor::new(&mut buf);
		let mut r = Reader::new(&mut cursor, &config);
		assert!(matches!(r.read_long(), Err(Error::Overflow(_))));
	}

	#[test]
	fn rejects_byte_slice_over_limit() {
		let mut config = Config::new();
		config.max_byte_slice_size = 2;
		let mut buf = vec![6u8]; // length 3, zigzag(3) = 6
		buf.extend_from_slice(b"abc");
		let mut cursor = std::io::Cursor::new(&mut buf);
		let mut r = Reader::new(&mut cursor, &config);
		assert!(matches!(r.read_bytes(), Err(Error::SizeLimit { .. })));
	}
}
