//! Encoder dispatch: walks a schema alongside a [`Value`], writing its
//! binary encoding (spec §4.1, §4.7)

use super::converter::{ConverterRegistry, RegularTypeTag};
use super::write::Writer;
use crate::config::Config;
use crate::schema::safe::{RegularType, SchemaKey, SchemaMut, SchemaNode};
use crate::{Error, Value};
use std::io::Write as _;

fn tag_of(type_: &RegularType) -> RegularTypeTag {
	match type_ {
		RegularType::Null => RegularTypeTag::Null,
		RegularType::Boolean => RegularTypeTag::Boolean,
		RegularType::Int => RegularTypeTag::Int,
		RegularType::Long => RegularTypeTag::Long,
		RegularType::Float => RegularTypeTag::Float,
		RegularType::Double => RegularTypeTag::Double,
		RegularType::Bytes => RegularTypeTag::Bytes,
		RegularType::String => RegularTypeTag::String,
		RegularType::Array(_) => RegularTypeTag::Array,
		RegularType::Map(_) => RegularTypeTag::Map,
		RegularType::Union(_) => RegularTypeTag::Union,
		RegularType::Record(_) => RegularTypeTag::Record,
		RegularType::Enum(_) => RegularTypeTag::Enum,
		RegularType::Fixed(_) => RegularTypeTag::Fixed,
	}
}

/// Encode `value` against the schema node at `key`, writing to `out`.
pub(crate) fn encode<W: std::io::Write>(
	schema: &SchemaMut,
	key: SchemaKey,
	value: &Value,
	out: &mut W,
	config: &Config,
	converters: &ConverterRegistry,
) -> crate::Result<()> {
	let node: &SchemaNode = &schema[key];

	let converted;
	let value = if let Some(logical_type) = &node.logical_type {
		if let Some(hook) = converters.get(tag_of(&node.type_), Some(logical_type.as_str())) {
			converted = hook.encode(value, Some(logical_type))?;
			&converted
		} else {
			value
		}
	} else {
		value
	};

	let mut w = Writer::new(out, config);
	match &node.type_ {
		RegularType::Null => match value {
			Value::Null => Ok(()),
			other => Err(mismatch("null", other)),
		},
		RegularType::Boolean => match value {
			Value::Boolean(b) => w.write_bool(*b),
			other => Err(mismatch("boolean", other)),
		},
		RegularType::Int => match value {
			Value::Int(v) => w.write_int(*v),
			other => Err(mismatch("int", other)),
		},
		RegularType::Long => match value {
			Value::Long(v) => w.write_long(*v),
			Value::Int(v) => w.write_long(i64::from(*v)),
			other => Err(mismatch("long", other)),
		},
		RegularType::Float => match value {
			Value::Float(v) => w.write_float(*v),
			Value::Int(v) => w.write_float(*v as f32),
			Value::Long(v) => w.write_float(*v as f32),
			other => Err(mismatch("float", other)),
		},
		RegularType::Double => match value {
			Value::Double(v) => w.write_double(*v),
			Value::Float(v) => w.write_double(f64::from(*v)),
			Value::Int(v) => w.write_double(f64::from(*v)),
			Value::Long(v) => w.write_double(*v as f64),
			other => Err(mismatch("double", other)),
		},
		RegularType::Bytes => match value {
			Value::Bytes(v) => w.write_bytes(v),
			other => Err(mismatch("bytes", other)),
		},
		RegularType::String => match value {
			Value::String(v) => w.write_string(v),
			other => Err(mismatch("string", other)),
		},
		RegularType::Fixed(fixed) => match value {
			Value::Bytes(v) if v.len() == fixed.size => w.write_fixed(v),
			Value::Bytes(v) => Err(Error::type_mismatch(format_args!(
				"fixed {} expects {} bytes, got {}",
				fixed.name,
				fixed.size,
				v.len()
			))),
			other => Err(mismatch("fixed (as bytes)", other)),
		},
		RegularType::Array(array) => match value {
			Value::Array(items) => {
				drop(w);
				encode_array(schema, array.items, items, out, config, converters)
			}
			other => Err(mismatch("array", other)),
		},
		RegularType::Map(map) => match value {
			Value::Map(entries) => {
				drop(w);
				encode_map(schema, map.values, entries, out, config, converters)
			}
			other => Err(mismatch("map", other)),
		},
		RegularType::Enum(enum_) => match value {
			Value::Enum(symbol) => {
				let index = enum_
					.symbols
					.iter()
					.position(|s| s == symbol)
					.ok_or_else(|| Error::unknown_enum_symbol(format_args!("{symbol:?} in enum {}", enum_.name)))?;
				w.write_int(index as i32)
			}
			other => Err(mismatch("enum symbol", other)),
		},
		RegularType::Record(record) => match value {
			Value::Map(fields) => {
				drop(w);
				for field in &record.fields {
					let field_value = fields
						.iter()
						.find(|(name, _)| name == &field.name)
						.map(|(_, v)| v)
						.ok_or_else(|| {
							Error::type_mismatch(format_args!(
								"record {} is missing field {:?}",
								record.name, field.name
							))
						})?;
					encode(schema, field.type_, field_value, out, config, converters)?;
				}
				Ok(())
			}
			other => Err(mismatch("record", other)),
		},
		RegularType::Union(union) => {
			drop(w);
			let (index, inner_key, inner_value) = select_union_branch(schema, union, value)?;
			let mut w = Writer::new(out, config);
			w.write_long(index as i64)?;
			drop(w);
			encode(schema, inner_key, inner_value, out, config, converters)
		}
	}
}

fn select_union_branch<'v>(
	schema: &SchemaMut,
	union: &crate::schema::safe::Union,
	value: &'v Value,
) -> crate::Result<(usize, SchemaKey, &'v Value)> {
	if let Value::Union(u) = value {
		let index = union
			.variants
			.iter()
			.position(|&v| schema[v].type_.union_key() == u.key)
			.ok_or_else(|| Error::union_ambiguous(format_args!("no branch with key {:?}", u.key)))?;
		return Ok((index, union.variants[index], &u.value));
	}
	// An untyped map with exactly one entry is treated as a tagged union
	// value keyed by that entry's name, the same convention Avro's JSON
	// encoding uses for unions -- this lets a caller select a branch
	// without going through `Value::union` when the map shape isn't
	// itself ambiguous with a record branch.
	if let Value::Map(entries) = value {
		if let [(key, inner)] = entries.as_slice() {
			if let Some(index) = union.variants.iter().position(|&v| schema[v].type_.union_key() == key.as_str()) {
				return Ok((index, union.variants[index], inner));
			}
		}
	}
	// Shape-based fallback: find every branch whose base type could
	// possibly hold `value`'s shape; require exactly one candidate.
	let mut candidates = union
		.variants
		.iter()
		.enumerate()
		.filter(|(_, &key)| value_matches_shape(&schema[key].type_, value));
	let Some((index, &key)) = candidates.next() else {
		return Err(Error::union_ambiguous("value does not match any union branch"));
	};
	if candidates.next().is_some() {
		return Err(Error::union_ambiguous(
			"value matches more than one union branch; wrap it in Value::union(key, ..) to disambiguate",
		));
	}
	Ok((index, key, value))
}

fn value_matches_shape(type_: &RegularType, value: &Value) -> bool {
	matches!(
		(type_, value),
		(RegularType::Null, Value::Null)
			| (RegularType::Boolean, Value::Boolean(_))
			| (RegularType::Int, Value::Int(_))
			| (RegularType::Long, Value::Long(_))
			| (RegularType::Float, Value::Float(_))
			| (RegularType::Double, Value::Double(_))
			| (RegularType::Bytes, Value::Bytes(_))
			| (RegularType::String, Value::String(_))
			| (RegularType::Array(_), Value::Array(_))
			| (RegularType::Map(_), Value::Map(_))
			| (RegularType::Enum(_), Value::Enum(_))
			| (RegularType::Fixed(_), Value::Bytes(_))
			| (RegularType::Record(_), Value::Map(_))
	)
}

fn encode_array<W: std::io::Write>(
	schema: &SchemaMut,
	items_key: SchemaKey,
	items: &[Value],
	out: &mut W,
	config: &Config,
	converters: &ConverterRegistry,
) -> crate::Result<()> {
	let chunk_size = (config.block_length_hint.max(1)) as usize;
	for chunk in items.chunks(chunk_size.max(1)) {
		let mut w = Writer::new(out, config);
		w.write_block_header(chunk.len() as u64)?;
		drop(w);
		for item in chunk {
			encode(schema, items_key, item, out, config, converters)?;
		}
	}
	let mut w = Writer::new(out, config);
	w.write_block_terminator()
}

fn encode_map<W: std::io::Write>(
	schema: &SchemaMut,
	values_key: SchemaKey,
	entries: &[(String, Value)],
	out: &mut W,
	config: &Config,
	converters: &ConverterRegistry,
) -> crate::Result<()> {
	let chunk_size = (config.block_length_hint.max(1)) as usize;
	for chunk in entries.chunks(chunk_size.max(1)) {
		let mut w = Writer::new(out, config);
		w.write_block_header(chunk.len() as u64)?;
		drop(w);
		for (key, value) in chunk {
			let mut w = Writer::new(out, config);
			w.write_string(key)?;
			drop(w);
			encode(schema, values_key, value, out, config, converters)?;
		}
	}
	let mut w = Writer::new(out, config);
	w.write_block_terminator()
}

fn mismatch(expected: &str, got: &Value) -> Error {
	Error::type_mismatch(format_args!("expected a value encodable as {expected}, got {got:?}"))
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::str::FromStr;

	fn encode_to_vec(schema_json: &str, value: Value) -> Vec<u8> {
		let schema = SchemaMut::from_str(schema_json).unwrap();
		let config = Config::new();
		let converters = ConverterRegistry::with_defaults();
		let mut out = Vec::new();
		encode(&schema, SchemaKey::root(), &value, &mut out, &config, &converters).unwrap();
		out
	}

	#[test]
	fn encodes_long_27() {
		assert_eq!(encode_to_vec(r#""long""#, Value::Long(27)), vec![54]);
	}

	#[test]
	fn encodes_array_of_int() {
		let out = encode_to_vec(
			r#"{"type":"array","items":"int"}"#,
			Value::Array(vec![Value::Int(3), Value::Int(27)]),
		);
		// block header (count=2) then zigzag(3)=6, zigzag(27)=54, then terminator 0
		assert_eq!(out, vec![4, 6, 54, 0]);
	}

	#[test]
	fn encodes_union_with_null() {
		let out = encode_to_vec(r#"["null", "string"]"#, Value::union("null", Value::Null));
		assert_eq!(out, vec![0]);
	}

	#[test]
	fn untyped_single_key_map_selects_union_branch_by_key() {
		// Spec §4.7: an untyped map with exactly one key is treated as a
		// tagged union value, the key naming the branch.
		let out = encode_to_vec(
			r#"["null", "long"]"#,
			Value::Map(vec![("long".to_owned(), Value::Long(7))]),
		);
		assert_eq!(out, encode_to_vec(r#"["null", "long"]"#, Value::union("long", Value::Long(7))));
	}

	#[test]
	fn ambiguous_union_without_explicit_tag_is_rejected() {
		let schema = SchemaMut::from_str(
			r#"["bytes", {"type": "fixed", "name": "Three", "size": 3}]"#,
		)
		.unwrap();
		let config = Config::new();
		let converters = ConverterRegistry::with_defaults();
		let mut out = Vec::new();
		let err = encode(
			&schema,
			SchemaKey::root(),
			&Value::Bytes(vec![1, 2, 3]),
			&mut out,
			&config,
			&converters,
		);
		assert!(err.is_err());
	}
}
