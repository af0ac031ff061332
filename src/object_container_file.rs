//! The external-collaborator interface for Avro's
//! [object container file](https://avro.apache.org/docs/current/specification/#object-container-files)
//! block compression codecs.
//!
//! This crate scopes the container file *format* itself out (header
//! framing, sync markers, block splitting): that belongs to a downstream
//! crate that wants to write `.avro` files on disk. What it does define is
//! the seam such a crate plugs into, so it doesn't need to depend on this
//! crate's internals to do so.

/// A block compression codec for object container file blocks (`null`,
/// `deflate`, `snappy`, ...).
///
/// Implementations are expected to be stateless and safe to share across
/// threads; a container file writer may compress many blocks concurrently.
pub trait BlockCodec: Send + Sync {
	/// The name this codec is registered under in a container file header's
	/// `avro.codec` metadata (e.g. `"deflate"`).
	fn name(&self) -> &str;

	/// Compress one block's raw bytes.
	fn compress(&self, block: &[u8]) -> crate::Result<Vec<u8>>;

	/// Decompress one block's bytes back to their original raw form.
	fn decompress(&self, block: &[u8]) -> crate::Result<Vec<u8>>;
}

/// The `null` codec: every block is left exactly as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCodec;

impl BlockCodec for NullCodec {
	fn name(&self) -> &str {
		"null"
	}

	fn compress(&self, block: &[u8]) -> crate::Result<Vec<u8>> {
		Ok(block.to_vec())
	}

	fn decompress(&self, block: &[u8]) -> crate::Result<Vec<u8>> {
		Ok(block.to_vec())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn null_codec_is_a_no_op() {
		let codec = NullCodec;
		let block = b"some bytes".to_vec();
		assert_eq!(codec.compress(&block).unwrap(), block);
		assert_eq!(codec.decompress(&block).unwrap(), block);
	}
}
