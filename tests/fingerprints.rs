//! Canonical form and fingerprint properties: stability across equivalent
//! spellings, and that fingerprints actually distinguish different schemas.

use {avro_core::parse_schema, pretty_assertions::assert_eq};

#[test]
fn canonical_form_strips_doc_default_and_order() {
	let schema = parse_schema(
		r#"{
			"type": "record",
			"name": "Foo",
			"doc": "a record",
			"fields": [
				{"name": "a", "type": "int", "default": 0, "doc": "a field", "order": "ignore"}
			]
		}"#,
	)
	.unwrap();
	assert_eq!(
		schema.canonical_form(),
		r#"{"name":"Foo","type":"record","fields":[{"name":"a","type":"int"}]}"#
	);
}

#[test]
fn fingerprints_agree_across_equivalent_spellings() {
	let a = parse_schema(r#""int""#).unwrap();
	let b = parse_schema(r#"{"type": "int"}"#).unwrap();
	assert_eq!(a.rabin_fingerprint(), b.rabin_fingerprint());
	assert_eq!(a.sha256_fingerprint(), b.sha256_fingerprint());
	assert_eq!(a.md5_fingerprint(), b.md5_fingerprint());
}

#[test]
fn fingerprints_differ_for_different_schemas() {
	let a = parse_schema(r#""int""#).unwrap();
	let b = parse_schema(r#""long""#).unwrap();
	assert_ne!(a.rabin_fingerprint(), b.rabin_fingerprint());
	assert_ne!(a.sha256_fingerprint(), b.sha256_fingerprint());
}

#[test]
fn rabin_fingerprint_of_null_schema_matches_the_spec_appendix_vector() {
	let schema = parse_schema(r#""null""#).unwrap();
	assert_eq!(schema.rabin_fingerprint(), 0x63dd24e7cc258f8a);
}

#[test]
fn namespace_is_folded_into_canonical_form() {
	let a = parse_schema(r#"{"type":"fixed","name":"Md5","namespace":"com.example","size":16}"#).unwrap();
	let b = parse_schema(r#"{"type":"fixed","name":"com.example.Md5","size":16}"#).unwrap();
	assert_eq!(a.canonical_form(), b.canonical_form());
	assert_eq!(a.rabin_fingerprint(), b.rabin_fingerprint());
}
