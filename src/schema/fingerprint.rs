//! Schema fingerprinting (spec §5.2, §5.3)

use super::safe::{canonical_form, SchemaMut};
use md5::Md5;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;

/// A 64-bit CRC-64-AVRO ("Rabin") fingerprint of a schema's canonical form
pub type Rabin = u64;

/// The 256 bits of a SHA-256 fingerprint
pub type Sha256Fingerprint = [u8; 32];

/// The 128 bits of an MD5 fingerprint
pub type Md5Fingerprint = [u8; 16];

/// Compute the [Rabin fingerprint](https://avro.apache.org/docs/current/specification/#schema-fingerprints)
/// of `schema`'s canonical form.
pub fn rabin(schema: &SchemaMut) -> Rabin {
	let mut pcf = String::new();
	canonical_form::write_canonical_form(schema, &mut pcf).expect("writing to a String can't fail");
	rabin_of_bytes(pcf.as_bytes())
}

/// Compute the SHA-256 fingerprint of `schema`'s canonical form.
pub fn sha256(schema: &SchemaMut) -> Sha256Fingerprint {
	let mut pcf = String::new();
	canonical_form::write_canonical_form(schema, &mut pcf).expect("writing to a String can't fail");
	Sha256::digest(pcf.as_bytes()).into()
}

/// Compute the MD5 fingerprint of `schema`'s canonical form.
pub fn md5(schema: &SchemaMut) -> Md5Fingerprint {
	let mut pcf = String::new();
	canonical_form::write_canonical_form(schema, &mut pcf).expect("writing to a String can't fail");
	Md5::digest(pcf.as_bytes()).into()
}

/// Render `schema`'s [`Parsing Canonical Form`](canonical_form) as a string,
/// for display or for feeding to an external fingerprint algorithm.
pub fn canonical_form_string(schema: &SchemaMut) -> String {
	let mut pcf = String::new();
	canonical_form::write_canonical_form(schema, &mut pcf).expect("writing to a String can't fail");
	pcf
}

const EMPTY: u64 = 0xc15d213aa4d7a795;

fn rabin_table() -> &'static [u64; 256] {
	static TABLE: std::sync::OnceLock<[u64; 256]> = std::sync::OnceLock::new();
	TABLE.get_or_init(|| {
		let mut table = [0u64; 256];
		for (i, entry) in table.iter_mut().enumerate() {
			let mut fp = i as u64;
			for _ in 0..8 {
				fp = if fp & 1 == 1 { (fp >> 1) ^ EMPTY } else { fp >> 1 };
			}
			*entry = fp;
		}
		table
	})
}

/// The raw CRC-64-AVRO algorithm over a byte slice, per the reference
/// implementation in the Avro specification appendix.
///
/// ```
/// assert_eq!(avro_core::schema::fingerprint::rabin_of_bytes(b"hello"), 0xdf2d94cd68b2d27c);
/// ```
pub fn rabin_of_bytes(buf: &[u8]) -> u64 {
	let table = rabin_table();
	let mut fp = EMPTY;
	for &byte in buf {
		fp = (fp >> 8) ^ table[((fp ^ u64::from(byte)) & 0xff) as usize];
	}
	fp
}

/// A fingerprint used as a cache key (spec GLOSSARY, "cache-fingerprint"):
/// folds in the writer schema's Rabin fingerprint together with every
/// record field's default value, since two schemas that are
/// canonical-form-identical can still require different codec behavior if
/// resolved against readers with different field defaults.
pub fn cache_fingerprint(writer: &SchemaMut) -> [u8; 32] {
	let mut hasher = Sha256::new();
	hasher.update(rabin(writer).to_le_bytes());
	let mut defaults = String::new();
	for node in writer.nodes() {
		if let super::safe::RegularType::Record(record) = &node.type_ {
			for field in &record.fields {
				if let Some(default) = &field.default {
					let _ = write!(defaults, "{}={}", field.name, default);
				}
			}
		}
	}
	hasher.update(defaults.as_bytes());
	hasher.finalize().into()
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::str::FromStr;

	#[test]
	fn rabin_of_empty_string_matches_reference_vector() {
		assert_eq!(rabin_of_bytes(b""), EMPTY);
	}

	#[test]
	fn rabin_of_null_schema_matches_reference_vector() {
		let schema = SchemaMut::from_str(r#""null""#).unwrap();
		assert_eq!(rabin(&schema), 0x63dd24e7cc258f8a);
	}

	#[test]
	fn sha256_of_null_schema_matches_reference_vector() {
		let schema = SchemaMut::from_str(r#""null""#).unwrap();
		let digest = sha256(&schema);
		let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
		assert_eq!(hex, "f072cbec3bf8841871d4284230c5e983dc211a56837aed862487148f947d1a1f");
	}

	#[test]
	fn sha256_is_stable_across_equivalent_spellings() {
		let a = SchemaMut::from_str(r#""null""#).unwrap();
		let b = SchemaMut::from_str(r#"{"type": "null"}"#).unwrap();
		assert_eq!(sha256(&a), sha256(&b));
	}
}
