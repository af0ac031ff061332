//! Binary encoding primitives (spec §4.1)

use crate::config::Config;
use crate::Error;
use integer_encoding::VarIntWriter;
use std::io::Write;

/// A sink for an Avro binary encoding, writing primitives per spec §4.1
///
/// Like [`Reader`](super::read::Reader), a writer is poisoned by its first
/// error: every subsequent call is a no-op that returns the same kind of
/// error, so a caller can't accidentally flush a partially written value.
pub struct Writer<'w, W> {
	inner: &'w mut W,
	config: &'w Config,
	poisoned: bool,
}

impl<'w, W: Write> Writer<'w, W> {
	/// Wrap `inner`, writing primitives under `config`'s limits.
	pub fn new(inner: &'w mut W, config: &'w Config) -> Self {
		Self {
			inner,
			config,
			poisoned: false,
		}
	}

	fn check_poisoned(&self) -> crate::Result<()> {
		if self.poisoned {
			Err(Error::overflow("writer is poisoned by a previous error"))
		} else {
			Ok(())
		}
	}

	fn fail<T>(&mut self, err: Error) -> crate::Result<T> {
		self.poisoned = true;
		Err(err)
	}

	/// `boolean`
	pub fn write_bool(&mut self, v: bool) -> crate::Result<()> {
		self.check_poisoned()?;
		if let Err(e) = self.inner.write_all(&[v as u8]) {
			return self.fail(e.into());
		}
		Ok(())
	}

	/// `int`
	pub fn write_int(&mut self, v: i32) -> crate::Result<()> {
		self.check_poisoned()?;
		if let Err(e) = self.inner.write_varint(v) {
			return self.fail(e.into());
		}
		Ok(())
	}

	/// `long`
	pub fn write_long(&mut self, v: i64) -> crate::Result<()> {
		self.check_poisoned()?;
		if let Err(e) = self.inner.write_varint(v) {
			return self.fail(e.into());
		}
		Ok(())
	}

	/// `float`
	pub fn write_float(&mut self, v: f32) -> crate::Result<()> {
		self.check_poisoned()?;
		if let Err(e) = self.inner.write_all(&v.to_le_bytes()) {
			return self.fail(e.into());
		}
		Ok(())
	}

	/// `double`
	pub fn write_double(&mut self, v: f64) -> crate::Result<()> {
		self.check_poisoned()?;
		if let Err(e) = self.inner.write_all(&v.to_le_bytes()) {
			return self.fail(e.into());
		}
		Ok(())
	}

	/// `bytes`: a `long` length followed by the raw bytes
	pub fn write_bytes(&mut self, v: &[u8]) -> crate::Result<()> {
		self.check_poisoned()?;
		if let Some(limit) = self.config.max_byte_slice_size_checked() {
			if v.len() as u64 > limit {
				return self.fail(Error::SizeLimit {
					requested: v.len() as u64,
					limit,
				});
			}
		}
		if let Err(e) = self.inner.write_varint(v.len() as i64) {
			return self.fail(e.into());
		}
		if let Err(e) = self.inner.write_all(v) {
			return self.fail(e.into());
		}
		Ok(())
	}

	/// `string`: a `bytes` value of the UTF-8 representation
	pub fn write_string(&mut self, v: &str) -> crate::Result<()> {
		self.write_bytes(v.as_bytes())
	}

	/// `fixed`: exactly `v.len()` raw bytes, no length prefix
	pub fn write_fixed(&mut self, v: &[u8]) -> crate::Result<()> {
		self.check_poisoned()?;
		if let Err(e) = self.inner.write_all(v) {
			return self.fail(e.into());
		}
		Ok(())
	}

	/// Write one non-empty block header for an `array`/`map` of `count`
	/// items, then the caller writes each item.
	pub fn write_block_header(&mut self, count: u64) -> crate::Result<()> {
		self.write_long(count as i64)
	}

	/// Write the terminating zero-length block of an `array`/`map`
	pub fn write_block_terminator(&mut self) -> crate::Result<()> {
		self.write_long(0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn encodes_long_27() {
		let config = Config::new();
		let mut buf = Vec::new();
		let mut w = Writer::new(&mut buf, &config);
		w.write_long(27).unwrap();
		assert_eq!(buf, vec![54]);
	}

	#[test]
	fn encodes_negative_long() {
		let config = Config::new();
		let mut buf = Vec::new();
		let mut w = Writer::new(&mut buf, &config);
		w.write_long(-2).unwrap();
		assert_eq!(buf, vec![3]);
	}

	#[test]
	fn encodes_string() {
		let config = Config::new();
		let mut buf = Vec::new();
		let mut w = Writer::new(&mut buf, &config);
		w.write_string("foo").unwrap();
		assert_eq!(buf, vec![6, b'f', b'o', b'o']);
	}

	#[test]
	fn rejects_bytes_over_limit() {
		let mut config = Config::new();
		config.max_byte_slice_size = 2;
		let mut buf = Vec::new();
		let mut w = Writer::new(&mut buf, &config);
		assert!(matches!(w.write_bytes(b"abc"), Err(Error::SizeLimit { .. })));
	}
}
