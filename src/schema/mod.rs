//! Schema parsing, the editable arena representation, canonicalization,
//! fingerprinting and resolution

pub mod builder;
pub(crate) mod default_value;
pub mod fingerprint;
pub mod name;
pub mod name_resolver;
pub mod resolution;
pub mod safe;
pub(crate) mod union_key;

use safe::{SchemaMut, SchemaNode};
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

/// An immutable, cheaply cloneable, shareable Avro schema
///
/// Wraps a [`SchemaMut`] arena together with memoized fingerprints: every
/// fingerprint is computed at most once per `Schema`, the first time it's
/// asked for, and shared by every clone (spec §5.2, "memoized").
#[derive(Clone, Debug)]
pub struct Schema {
	inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
	schema: SchemaMut,
	sanitized_json: Option<String>,
	rabin: OnceLock<fingerprint::Rabin>,
	sha256: OnceLock<fingerprint::Sha256Fingerprint>,
	md5: OnceLock<fingerprint::Md5Fingerprint>,
	cache_fingerprint: OnceLock<[u8; 32]>,
}

impl Schema {
	/// Parse a JSON schema document.
	pub fn parse_str(json: &str) -> crate::Result<Self> {
		Self::from_parsed(SchemaMut::from_str(json)?, json)
	}

	/// Wrap an already-built arena into a [`Schema`], attaching `json` as its
	/// sanitized source text. Shared by [`Schema::parse_str`] and
	/// [`crate::parse_files`], which builds the arena itself against a
	/// cache shared across files.
	pub(crate) fn from_parsed(schema: SchemaMut, json: &str) -> crate::Result<Self> {
		let mut schema: Schema = schema.freeze()?;
		Arc::get_mut(&mut schema.inner).expect("just built, uniquely owned").sanitized_json = Some(sanitize_json(json)?);
		Ok(schema)
	}

	/// The schema's source JSON, sanitized (whitespace stripped, ordering
	/// untouched) the same way the original document was validated -- every
	/// key, alias, doc and property the canonical form drops is preserved
	/// here. `None` for a [`Schema`] built any other way than
	/// [`Schema::parse_str`] (e.g. through [`SchemaBuilder`](builder::SchemaBuilder)).
	pub fn json(&self) -> Option<&str> {
		self.inner.sanitized_json.as_deref()
	}

	/// The underlying editable arena, for callers that want to inspect or
	/// further transform the schema graph.
	pub fn as_schema_mut(&self) -> &SchemaMut {
		&self.inner.schema
	}

	/// The root node of the schema
	pub fn root(&self) -> &SchemaNode {
		self.inner.schema.root()
	}

	/// The 64-bit CRC-64-AVRO ("Rabin") fingerprint of this schema's
	/// canonical form, computed once and cached (spec §5.2)
	pub fn rabin_fingerprint(&self) -> fingerprint::Rabin {
		*self.inner.rabin.get_or_init(|| fingerprint::rabin(&self.inner.schema))
	}

	/// The SHA-256 fingerprint of this schema's canonical form
	pub fn sha256_fingerprint(&self) -> fingerprint::Sha256Fingerprint {
		*self.inner.sha256.get_or_init(|| fingerprint::sha256(&self.inner.schema))
	}

	/// The MD5 fingerprint of this schema's canonical form
	pub fn md5_fingerprint(&self) -> fingerprint::Md5Fingerprint {
		*self.inner.md5.get_or_init(|| fingerprint::md5(&self.inner.schema))
	}

	/// The cache-fingerprint used to key compiled codecs (spec GLOSSARY):
	/// folds the writer's Rabin fingerprint together with every record
	/// field's default value.
	pub(crate) fn cache_fingerprint(&self) -> [u8; 32] {
		*self
			.inner
			.cache_fingerprint
			.get_or_init(|| fingerprint::cache_fingerprint(&self.inner.schema))
	}

	/// Render this schema's Parsing Canonical Form (spec §5.1)
	pub fn canonical_form(&self) -> String {
		fingerprint::canonical_form_string(&self.inner.schema)
	}
}

impl TryFrom<SchemaMut> for Schema {
	type Error = crate::Error;
	fn try_from(schema: SchemaMut) -> crate::Result<Self> {
		Ok(Schema {
			inner: Arc::new(Inner {
				schema,
				sanitized_json: None,
				rabin: OnceLock::new(),
				sha256: OnceLock::new(),
				md5: OnceLock::new(),
				cache_fingerprint: OnceLock::new(),
			}),
		})
	}
}

/// Re-serialize `json` through `serde_json`, stripping insignificant
/// whitespace while preserving every key (aliases, docs, free-form
/// properties) that the parsing canonical form intentionally drops.
fn sanitize_json(json: &str) -> crate::Result<String> {
	let mut out = Vec::new();
	let mut serializer = serde_json::Serializer::new(&mut out);
	serde_transcode::transcode(&mut serde_json::Deserializer::from_str(json), &mut serializer)
		.map_err(|e| crate::Error::schema_parse(format_args!("invalid JSON: {e}")))?;
	String::from_utf8(out).map_err(|e| crate::Error::schema_parse(format_args!("schema JSON is not valid UTF-8: {e}")))
}

impl FromStr for Schema {
	type Err = crate::Error;
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Schema::parse_str(s)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fingerprints_are_memoized_and_stable() {
		let schema = Schema::parse_str(r#""null""#).unwrap();
		let a = schema.rabin_fingerprint();
		let b = schema.rabin_fingerprint();
		assert_eq!(a, b);
		assert_eq!(schema.clone().rabin_fingerprint(), a);
	}

	#[test]
	fn json_is_sanitized_but_keeps_keys_the_canonical_form_drops() {
		let schema = Schema::parse_str(
			r#"{"type":"record","name":"R","aliases":["Old"],"doc":"hi","fields":[{"name":"a","type":"long"}]}"#,
		)
		.unwrap();
		let json = schema.json().unwrap();
		assert!(json.contains("\"aliases\""));
		assert!(json.contains("\"doc\""));
		assert!(!json.contains('\n'));
	}
}
