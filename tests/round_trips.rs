//! Round-trip laws: marshal then unmarshal always reproduces the original
//! value, for every schema shape this crate understands.

use {
	avro_core::{marshal, parse_schema, unmarshal, Value},
	pretty_assertions::assert_eq,
};

fn round_trip(schema_json: &str, value: Value) {
	let schema = parse_schema(schema_json).unwrap();
	let bytes = marshal(&schema, &value).unwrap();
	assert_eq!(unmarshal(&schema, &bytes).unwrap(), value);
}

/// One schema/value pair per primitive shape, round-tripped by the
/// `primitive_round_trip_tests!` table below.
static PRIMITIVES_TO_ROUND_TRIP: &[(&str, fn() -> Value)] = &[
	(r#""null""#, || Value::Null),
	(r#""boolean""#, || Value::Boolean(true)),
	(r#""boolean""#, || Value::Boolean(false)),
	(r#""int""#, || Value::Int(-123)),
	(r#""long""#, || Value::Long(i64::MIN)),
	(r#""float""#, || Value::Float(1.5)),
	(r#""double""#, || Value::Double(std::f64::consts::PI)),
	(r#""bytes""#, || Value::Bytes(vec![0, 1, 2, 255])),
	(r#""string""#, || Value::String("héllo".to_owned())),
];

macro_rules! primitive_round_trip_tests {
	($($idx: expr)+) => {
		paste::paste! {
			$(
				#[test]
				fn [<primitive_ $idx _round_trips>]() {
					let (schema_json, value) = PRIMITIVES_TO_ROUND_TRIP[$idx];
					round_trip(schema_json, value());
				}
			)*
		}

		#[test]
		fn every_primitive_in_the_table_is_covered() {
			let mut tested = vec![$($idx,)*];
			tested.sort_unstable();
			tested.dedup();
			assert_eq!(tested, (0..PRIMITIVES_TO_ROUND_TRIP.len()).collect::<Vec<_>>());
		}
	};
}
primitive_round_trip_tests! { 0 1 2 3 4 5 6 7 8 }

#[test]
fn empty_array_and_map_round_trip() {
	round_trip(r#"{"type":"array","items":"int"}"#, Value::Array(vec![]));
	round_trip(r#"{"type":"map","values":"int"}"#, Value::Map(vec![]));
}

#[test]
fn array_round_trips_across_several_blocks() {
	let schema = parse_schema(r#"{"type":"array","items":"int"}"#).unwrap();
	let mut config = avro_core::Config::new();
	config.block_length_hint = 2;
	let value = Value::Array((0..10).map(Value::Int).collect());
	let mut encoder = avro_core::Encoder::with_config(
		schema.clone(),
		Vec::new(),
		config,
		avro_core::codec::converter::ConverterRegistry::with_defaults(),
	);
	encoder.encode(&value).unwrap();
	let bytes = encoder.into_inner();
	assert_eq!(unmarshal(&schema, &bytes).unwrap(), value);
}

#[test]
fn map_round_trips() {
	round_trip(
		r#"{"type":"map","values":"string"}"#,
		Value::Map(vec![
			("a".to_owned(), Value::String("x".to_owned())),
			("b".to_owned(), Value::String("y".to_owned())),
		]),
	);
}

#[test]
fn fixed_round_trips() {
	round_trip(
		r#"{"type":"fixed","name":"Md5","size":4}"#,
		Value::Bytes(vec![1, 2, 3, 4]),
	);
}

#[test]
fn enum_round_trips() {
	round_trip(
		r#"{"type":"enum","name":"Suit","symbols":["CLUBS","DIAMONDS","HEARTS","SPADES"]}"#,
		Value::Enum("HEARTS".to_owned()),
	);
}

#[test]
fn nested_record_round_trips() {
	round_trip(
		r#"{
			"type": "record",
			"name": "Outer",
			"fields": [
				{"name": "id", "type": "long"},
				{
					"name": "inner",
					"type": {
						"type": "record",
						"name": "Inner",
						"fields": [{"name": "label", "type": "string"}]
					}
				}
			]
		}"#,
		Value::Map(vec![
			("id".to_owned(), Value::Long(42)),
			(
				"inner".to_owned(),
				Value::Map(vec![("label".to_owned(), Value::String("hi".to_owned()))]),
			),
		]),
	);
}

#[test]
fn union_round_trips_both_branches() {
	let schema_json = r#"["null", "long"]"#;
	round_trip(schema_json, Value::union("null", Value::Null));
	round_trip(schema_json, Value::union("long", Value::Long(7)));
}

#[test]
fn self_referential_record_round_trips() {
	round_trip(
		r#"{
			"type": "record",
			"name": "LinkedList",
			"fields": [
				{"name": "value", "type": "long"},
				{"name": "next", "type": ["null", "LinkedList"]}
			]
		}"#,
		Value::Map(vec![
			("value".to_owned(), Value::Long(1)),
			(
				"next".to_owned(),
				Value::union(
					"LinkedList",
					Value::Map(vec![
						("value".to_owned(), Value::Long(2)),
						("next".to_owned(), Value::union("null", Value::Null)),
					]),
				),
			),
		]),
	);
}

#[test]
fn decimal_on_bytes_round_trips_through_the_converter() {
	round_trip(
		r#"{"type":"bytes","logicalType":"decimal","precision":9,"scale":2}"#,
		Value::String("123.45".to_owned()),
	);
}

#[test]
fn unmarshal_of_empty_input_against_a_record_fails_on_its_first_fixed_size_field() {
	// A trailing long tolerates EOF (spec §7), but a record with no fields
	// written at all still needs *something* off the wire once it reaches a
	// fixed-size primitive.
	let schema = parse_schema(r#""boolean""#).unwrap();
	assert!(unmarshal(&schema, &[]).is_err());
}
