//! Boundary properties: size limits, malformed schemas, and cyclic schemas

use {
	avro_core::{marshal, parse_schema, unmarshal, Config, Decoder, Encoder, Error, Value},
	pretty_assertions::assert_eq,
};

#[test]
fn byte_slice_over_the_configured_limit_is_rejected_on_decode() {
	let schema = parse_schema(r#""bytes""#).unwrap();
	let bytes = marshal(&schema, &Value::Bytes(vec![0; 10])).unwrap();
	let mut config = Config::new();
	config.max_byte_slice_size = 4;
	let mut decoder = Decoder::with_config(
		schema,
		bytes.as_slice(),
		config,
		avro_core::codec::converter::ConverterRegistry::with_defaults(),
	);
	assert!(matches!(decoder.decode(), Err(Error::SizeLimit { .. })));
}

#[test]
fn byte_slice_over_the_configured_limit_is_rejected_on_encode() {
	let schema = parse_schema(r#""bytes""#).unwrap();
	let mut config = Config::new();
	config.max_byte_slice_size = 4;
	let mut encoder = Encoder::with_config(
		schema,
		Vec::new(),
		config,
		avro_core::codec::converter::ConverterRegistry::with_defaults(),
	);
	assert!(matches!(encoder.encode(&Value::Bytes(vec![0; 10])), Err(Error::SizeLimit { .. })));
}

#[test]
fn truncated_varint_does_not_panic_and_is_not_an_error() {
	// Spec §7: EOF while reading a trailing integer returns the accumulated
	// value rather than erroring.
	let schema = parse_schema(r#""long""#).unwrap();
	assert_eq!(unmarshal(&schema, &[]).unwrap(), Value::Long(0));
}

#[test]
fn varint_overflow_is_rejected() {
	let schema = parse_schema(r#""long""#).unwrap();
	assert!(matches!(unmarshal(&schema, &[0x80; 11]), Err(Error::Overflow(_))));
}

#[test]
fn negative_byte_slice_length_is_rejected() {
	let schema = parse_schema(r#""bytes""#).unwrap();
	// zigzag(-1) = 1: a negative length is nonsensical for a byte slice
	assert!(unmarshal(&schema, &[1]).is_err());
}

#[test]
fn union_with_two_branches_of_the_same_primitive_type_is_rejected() {
	let err = parse_schema(r#"["string", "string"]"#);
	assert!(err.is_err());
}

#[test]
fn union_with_two_array_branches_is_rejected() {
	let err = parse_schema(r#"[{"type":"array","items":"int"}, {"type":"array","items":"string"}]"#);
	assert!(err.is_err());
}

#[test]
fn union_directly_containing_another_union_is_rejected() {
	let err = parse_schema(r#"["null", ["int", "string"]]"#);
	assert!(err.is_err());
}

#[test]
fn unconditional_record_self_reference_is_rejected() {
	let err = parse_schema(r#"{"type":"record","name":"Node","fields":[{"name":"next","type":"Node"}]}"#);
	assert!(err.is_err());
}

#[test]
fn record_self_reference_through_a_union_is_accepted() {
	let schema = parse_schema(
		r#"{"type":"record","name":"Node","fields":[{"name":"next","type":["null","Node"]}]}"#,
	);
	assert!(schema.is_ok());
}

#[test]
fn indirect_record_cycle_without_a_union_or_collection_is_rejected() {
	let err = parse_schema(
		r#"{
			"type": "record",
			"name": "A",
			"fields": [
				{"name": "b", "type": {
					"type": "record",
					"name": "B",
					"fields": [{"name": "a", "type": "A"}]
				}}
			]
		}"#,
	);
	assert!(err.is_err());
}

#[test]
fn duplicate_enum_symbol_is_rejected() {
	let err = parse_schema(r#"{"type":"enum","name":"E","symbols":["A","A"]}"#);
	assert!(err.is_err());
}

#[test]
fn invalid_identifier_is_rejected() {
	let err = parse_schema(r#"{"type":"record","name":"1Bad","fields":[]}"#);
	assert!(err.is_err());
}
