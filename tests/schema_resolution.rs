//! Writer/reader schema resolution scenarios (numeric promotion, field
//! add/remove/rename via alias, enum symbol fallback, missing-field defaults)

use {
	avro_core::{codec::CodecCache, marshal, parse_schema, Decoder, Value},
	pretty_assertions::assert_eq,
};

fn resolve_and_decode(writer_json: &str, reader_json: &str, writer_value: Value) -> Value {
	let writer = parse_schema(writer_json).unwrap();
	let reader = parse_schema(reader_json).unwrap();
	let bytes = marshal(&writer, &writer_value).unwrap();
	let cache = CodecCache::new();
	let mut decoder = Decoder::for_writer_reader(writer, reader, bytes.as_slice(), &cache).unwrap();
	decoder.decode().unwrap()
}

#[test]
fn int_promotes_to_long_float_and_double() {
	assert_eq!(resolve_and_decode(r#""int""#, r#""long""#, Value::Int(7)), Value::Long(7));
	assert_eq!(resolve_and_decode(r#""int""#, r#""float""#, Value::Int(7)), Value::Float(7.0));
	assert_eq!(resolve_and_decode(r#""int""#, r#""double""#, Value::Int(7)), Value::Double(7.0));
}

#[test]
fn string_promotes_to_bytes_and_back() {
	assert_eq!(
		resolve_and_decode(r#""string""#, r#""bytes""#, Value::String("hi".to_owned())),
		Value::Bytes(b"hi".to_vec())
	);
	assert_eq!(
		resolve_and_decode(r#""bytes""#, r#""string""#, Value::Bytes(b"hi".to_vec())),
		Value::String("hi".to_owned())
	);
}

#[test]
fn added_reader_field_falls_back_to_its_default() {
	let writer_json = r#"{"type":"record","name":"R","fields":[{"name":"a","type":"int"}]}"#;
	let reader_json =
		r#"{"type":"record","name":"R","fields":[{"name":"a","type":"int"},{"name":"b","type":"string","default":"hi"}]}"#;
	let value = resolve_and_decode(writer_json, reader_json, Value::Map(vec![("a".to_owned(), Value::Int(3))]));
	assert_eq!(
		value,
		Value::Map(vec![("a".to_owned(), Value::Int(3)), ("b".to_owned(), Value::String("hi".to_owned()))])
	);
}

#[test]
fn removed_writer_field_is_dropped() {
	let writer_json = r#"{"type":"record","name":"R","fields":[{"name":"a","type":"int"},{"name":"b","type":"int"}]}"#;
	let reader_json = r#"{"type":"record","name":"R","fields":[{"name":"a","type":"int"}]}"#;
	let value = resolve_and_decode(
		writer_json,
		reader_json,
		Value::Map(vec![("a".to_owned(), Value::Int(1)), ("b".to_owned(), Value::Int(2))]),
	);
	assert_eq!(value, Value::Map(vec![("a".to_owned(), Value::Int(1))]));
}

#[test]
fn renamed_reader_field_is_matched_via_alias() {
	let writer_json = r#"{"type":"record","name":"R","fields":[{"name":"old_name","type":"int"}]}"#;
	let reader_json =
		r#"{"type":"record","name":"R","fields":[{"name":"new_name","type":"int","aliases":["old_name"]}]}"#;
	let value = resolve_and_decode(writer_json, reader_json, Value::Map(vec![("old_name".to_owned(), Value::Int(9))]));
	assert_eq!(value, Value::Map(vec![("new_name".to_owned(), Value::Int(9))]));
}

#[test]
fn enum_symbol_unknown_to_the_reader_falls_back_to_its_default() {
	let writer_json = r#"{"type":"enum","name":"E","symbols":["A","B"]}"#;
	let reader_json = r#"{"type":"enum","name":"E","symbols":["A"],"default":"A"}"#;
	assert_eq!(
		resolve_and_decode(writer_json, reader_json, Value::Enum("B".to_owned())),
		Value::Enum("A".to_owned())
	);
}

#[test]
fn reader_field_without_default_makes_schemas_incompatible() {
	let writer = parse_schema(r#"{"type":"record","name":"R","fields":[{"name":"a","type":"int"}]}"#).unwrap();
	let reader = parse_schema(
		r#"{"type":"record","name":"R","fields":[{"name":"a","type":"int"},{"name":"b","type":"int"}]}"#,
	)
	.unwrap();
	let cache = CodecCache::new();
	let bytes = marshal(&writer, &Value::Map(vec![("a".to_owned(), Value::Int(1))])).unwrap();
	assert!(Decoder::for_writer_reader(writer, reader, bytes.as_slice(), &cache).is_err());
}

#[test]
fn writer_union_resolves_against_a_concrete_reader_type() {
	let writer_json = r#"["null", "long"]"#;
	let reader_json = r#""long""#;
	assert_eq!(
		resolve_and_decode(writer_json, reader_json, Value::union("long", Value::Long(5))),
		Value::Long(5)
	);
}

#[test]
fn concrete_writer_type_resolves_against_a_reader_union() {
	let writer_json = r#""long""#;
	let reader_json = r#"["null", "long"]"#;
	assert_eq!(
		resolve_and_decode(writer_json, reader_json, Value::Long(5)),
		Value::union("long", Value::Long(5))
	);
}

#[test]
fn codec_cache_is_reused_across_decoders() {
	let writer = parse_schema(r#""int""#).unwrap();
	let reader = parse_schema(r#""long""#).unwrap();
	let cache = CodecCache::new();
	let bytes = marshal(&writer, &Value::Int(1)).unwrap();
	for _ in 0..3 {
		let mut decoder = Decoder::for_writer_reader(writer.clone(), reader.clone(), bytes.as_slice(), &cache).unwrap();
		assert_eq!(decoder.decode().unwrap(), Value::Long(1));
	}
}
