//! Avro [single object encoding](https://avro.apache.org/docs/current/specification/#single-object-encoding):
//! a datum prefixed with a 2-byte magic marker and the writer schema's Rabin
//! fingerprint, so a reader can identify which schema produced it without an
//! out-of-band channel.

use crate::{Error, Result, Schema, Value};

const MAGIC: [u8; 2] = [0xC3, 0x01];
const HEADER_LEN: usize = MAGIC.len() + 8;

/// Encode `value` as a single-object-encoded datum against `schema`: the
/// magic bytes, the schema's little-endian Rabin fingerprint, then the
/// datum itself.
pub fn to_single_object(schema: &Schema, value: &Value) -> Result<Vec<u8>> {
	let mut out = Vec::with_capacity(HEADER_LEN);
	out.extend_from_slice(&MAGIC);
	out.extend_from_slice(&schema.rabin_fingerprint().to_le_bytes());
	crate::codec::encode_into(schema, value, &mut out)?;
	Ok(out)
}

/// Decode a single-object-encoded datum, checking that its fingerprint
/// header matches `schema`'s.
pub fn from_single_object_slice(schema: &Schema, slice: &[u8]) -> Result<Value> {
	let header: &[u8; HEADER_LEN] = slice
		.get(0..HEADER_LEN)
		.ok_or_else(|| Error::schema_parse("slice is too short for a single-object-encoding header"))?
		.try_into()
		.unwrap();
	check_header(header, schema)?;
	crate::unmarshal(schema, &slice[HEADER_LEN..])
}

fn check_header(header: &[u8; HEADER_LEN], schema: &Schema) -> Result<()> {
	if header[0..2] != MAGIC {
		return Err(Error::schema_parse("single-object slice does not start with the C3 01 magic bytes"));
	}
	let fingerprint = u64::from_le_bytes(header[2..10].try_into().unwrap());
	if fingerprint != schema.rabin_fingerprint() {
		return Err(Error::schema_incompatible(
			"single-object encoding fingerprint header does not match the schema's Rabin fingerprint",
		));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn round_trips_a_datum() {
		let schema = Schema::parse_str(r#""int""#).unwrap();
		let bytes = to_single_object(&schema, &Value::Int(3)).unwrap();
		assert_eq!(&bytes[0..2], &MAGIC);
		assert_eq!(from_single_object_slice(&schema, &bytes).unwrap(), Value::Int(3));
	}

	#[test]
	fn rejects_a_mismatched_fingerprint() {
		let schema = Schema::parse_str(r#""int""#).unwrap();
		let other = Schema::parse_str(r#""long""#).unwrap();
		let bytes = to_single_object(&schema, &Value::Int(3)).unwrap();
		assert!(from_single_object_slice(&other, &bytes).is_err());
	}
}
