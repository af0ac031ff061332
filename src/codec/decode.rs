//! Decoder dispatch: walks a schema (and, when reading with a different
//! reader schema, a [`Resolution`] tree alongside it) producing a generic
//! [`Value`] (spec §4.1, §4.6)

use super::converter::{ConverterRegistry, RegularTypeTag};
use super::read::Reader;
use crate::config::Config;
use crate::schema::resolution::{Promotion, Resolution};
use crate::schema::safe::{LogicalType, RegularType, SchemaKey, SchemaMut, SchemaNode};
use crate::{Error, Value};

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

/// Decode the node at `key`, with no schema resolution: the generic "any"
/// decode path (spec §6.1), producing a [`Value`] shaped exactly like
/// `schema`.
pub(crate) fn decode_any<R: std::io::Read>(
	schema: &SchemaMut,
	key: SchemaKey,
	r: &mut R,
	config: &Config,
	converters: &ConverterRegistry,
) -> crate::Result<Value> {
	let node: &SchemaNode = &schema[key];
	let base = decode_base(schema, node, r, config, converters)?;
	apply_converter_decode(node, base, converters)
}

fn decode_base<R: std::io::Read>(
	schema: &SchemaMut,
	node: &SchemaNode,
	r: &mut R,
	config: &Config,
	converters: &ConverterRegistry,
) -> crate::Result<Value> {
	let mut reader = Reader::new(r, config);
	match &node.type_ {
		RegularType::Null => Ok(Value::Null),
		RegularType::Boolean => reader.read_bool().map(Value::Boolean),
		RegularType::Int => reader.read_int().map(Value::Int),
		RegularType::Long => reader.read_long().map(Value::Long),
		RegularType::Float => reader.read_float().map(Value::Float),
		RegularType::Double => reader.read_double().map(Value::Double),
		RegularType::Bytes => reader.read_bytes().map(Value::Bytes),
		RegularType::String => reader.read_string().map(Value::String),
		RegularType::Fixed(fixed) => reader.read_fixed(fixed.size).map(Value::Bytes),
		RegularType::Enum(enum_) => {
			let index = reader.read_int()?;
			let symbol = enum_
				.symbols
				.get(index as usize)
				.ok_or_else(|| Error::unknown_enum_symbol(format_args!("index {index} in enum {}", enum_.name)))?;
			Ok(Value::Enum(symbol.clone()))
		}
		RegularType::Array(array) => {
			drop(reader);
			let mut items = Vec::new();
			loop {
				let (count, _byte_size) = Reader::new(r, config).read_block_header()?;
				if count == 0 {
					break;
				}
				for _ in 0..count {
					items.push(decode_any(schema, array.items, r, config, converters)?);
				}
			}
			Ok(Value::Array(items))
		}
		RegularType::Map(map) => {
			drop(reader);
			let mut entries = Vec::new();
			loop {
				let (count, _byte_size) = Reader::new(r, config).read_block_header()?;
				if count == 0 {
					break;
				}
				for _ in 0..count {
					let key_str = Reader::new(r, config).read_string()?;
					let value = decode_any(schema, map.values, r, config, converters)?;
					entries.push((key_str, value));
				}
			}
			Ok(Value::Map(entries))
		}
		RegularType::Record(record) => {
			drop(reader);
			let mut fields = Vec::with_capacity(record.fields.len());
			for field in &record.fields {
				fields.push((field.name.clone(), decode_any(schema, field.type_, r, config, converters)?));
			}
			Ok(Value::Map(fields))
		}
		RegularType::Union(union) => {
			let index = reader.read_long()?;
			let &variant = union
				.variants
				.get(index as usize)
				.ok_or_else(|| Error::type_mismatch(format_args!("union branch index {index} out of range")))?;
			drop(reader);
			let key_str = schema[variant].type_.union_key().to_owned();
			let value = decode_any(schema, variant, r, config, converters)?;
			Ok(Value::union(key_str, value))
		}
	}
}

fn apply_converter_decode(node: &SchemaNode, base: Value, converters: &ConverterRegistry) -> crate::Result<Value> {
	match &node.logical_type {
		Some(logical_type) => match converters.get(tag_of(&node.type_), Some(logical_type.as_str())) {
			Some(hook) => hook.decode(base, Some(logical_type)),
			None => Ok(base),
		},
		None => Ok(base),
	}
}

/// Decode the writer node at `writer_key`, following `resolution`, producing
/// a [`Value`] shaped like `reader` (spec §4.6).
pub(crate) fn decode_resolved<R: std::io::Read>(
	writer: &SchemaMut,
	writer_key: SchemaKey,
	reader: &SchemaMut,
	resolution: &Resolution,
	r: &mut R,
	config: &Config,
	converters: &ConverterRegistry,
) -> crate::Result<Value> {
	match resolution {
		Resolution::Same | Resolution::Fixed => decode_any(writer, writer_key, r, config, converters),
		Resolution::Promoted(promotion) => {
			let base = decode_any(writer, writer_key, r, config, converters)?;
			Ok(promote(base, *promotion))
		}
		Resolution::Array(inner) => {
			let items_key = match &writer[writer_key].type_ {
				RegularType::Array(a) => a.items,
				_ => unreachable!("Resolution::Array only produced for an array writer node"),
			};
			let mut items = Vec::new();
			loop {
				let (count, _) = Reader::new(r, config).read_block_header()?;
				if count == 0 {
					break;
				}
				for _ in 0..count {
					items.push(decode_resolved(writer, items_key, reader, inner, r, config, converters)?);
				}
			}
			Ok(Value::Array(items))
		}
		Resolution::Map(inner) => {
			let values_key = match &writer[writer_key].type_ {
				RegularType::Map(m) => m.values,
				_ => unreachable!("Resolution::Map only produced for a map writer node"),
			};
			let mut entries = Vec::new();
			loop {
				let (count, _) = Reader::new(r, config).read_block_header()?;
				if count == 0 {
					break;
				}
				for _ in 0..count {
					let key_str = Reader::new(r, config).read_string()?;
					let value = decode_resolved(writer, values_key, reader, inner, r, config, converters)?;
					entries.push((key_str, value));
				}
			}
			Ok(Value::Map(entries))
		}
		Resolution::Record(record_resolution) => {
			let writer_record = match &writer[writer_key].type_ {
				RegularType::Record(r) => r,
				_ => unreachable!("Resolution::Record only produced for a record writer node"),
			};
			let reader_record = match &reader[record_resolution.reader_key].type_ {
				RegularType::Record(r) => r,
				_ => unreachable!("Resolution::Record always holds a reader record key"),
			};
			let mut slots: Vec<Option<(String, Value)>> = vec![None; reader_record.fields.len()];
			for wf in &record_resolution.writer_fields {
				let field_type = writer_record.fields[wf.writer_index].type_;
				match &wf.target {
					crate::schema::resolution::WriterFieldTarget::Keep { reader_index, resolution } => {
						let value = decode_resolved(writer, field_type, reader, resolution, r, config, converters)?;
						let name = reader_record.fields[*reader_index].name.clone();
						slots[*reader_index] = Some((name, value));
					}
					crate::schema::resolution::WriterFieldTarget::Drop => {
						decode_any(writer, field_type, r, config, converters)?;
					}
				}
			}
			for reader_only in &record_resolution.reader_only_defaults {
				let field = &reader_record.fields[reader_only.reader_index];
				let default_json = field
					.default
					.as_ref()
					.expect("resolve() only produces a ReaderOnlyField when the field has a default");
				let value = default_to_value(reader, field.type_, default_json)?;
				slots[reader_only.reader_index] = Some((field.name.clone(), value));
			}
			let fields = slots
				.into_iter()
				.map(|s| s.expect("every reader field is either matched by a writer field or has a default"))
				.collect();
			Ok(Value::Map(fields))
		}
		Resolution::Enum(enum_resolution) => {
			let writer_enum = match &writer[writer_key].type_ {
				RegularType::Enum(e) => e,
				_ => unreachable!("Resolution::Enum only produced for an enum writer node"),
			};
			let reader_enum = match &reader[enum_resolution.reader_key].type_ {
				RegularType::Enum(e) => e,
				_ => unreachable!("Resolution::Enum always holds a reader enum key"),
			};
			let mut inner_reader = Reader::new(r, config);
			let index = inner_reader.read_int()? as usize;
			drop(inner_reader);
			if writer_enum.symbols.get(index).is_none() {
				return Err(Error::unknown_enum_symbol(format_args!(
					"index {index} in enum {}",
					writer_enum.name
				)));
			}
			match enum_resolution.writer_symbol_to_reader.get(index).copied().flatten() {
				Some(reader_index) => Ok(Value::Enum(reader_enum.symbols[reader_index].clone())),
				None => {
					let default = reader_enum
						.default
						.clone()
						.expect("resolve() only leaves a symbol unmapped when the reader has a default");
					Ok(Value::Enum(default))
				}
			}
		}
		Resolution::WriterUnion(union_resolution) => {
			let writer_union = match &writer[writer_key].type_ {
				RegularType::Union(u) => u,
				_ => unreachable!("Resolution::WriterUnion only produced for a union writer node"),
			};
			let mut inner_reader = Reader::new(r, config);
			let index = inner_reader.read_long()? as usize;
			drop(inner_reader);
			let variant_key = *writer_union
				.variants
				.get(index)
				.ok_or_else(|| Error::type_mismatch(format_args!("union branch index {index} out of range")))?;
			let branch_resolution = union_resolution
				.writer_branches
				.get(index)
				.ok_or_else(|| Error::type_mismatch("writer union branch has no matching resolution"))?;
			decode_resolved(writer, variant_key, reader, branch_resolution, r, config, converters)
		}
		Resolution::ReaderUnion(reader_union) => {
			let value = decode_resolved(writer, writer_key, reader, &reader_union.resolution, r, config, converters)?;
			Ok(Value::union(reader_union.branch_key.clone(), value))
		}
	}
}

fn promote(value: Value, promotion: Promotion) -> Value {
	match (promotion, value) {
		(Promotion::IntToLong, Value::Int(v)) => Value::Long(i64::from(v)),
		(Promotion::IntToFloat, Value::Int(v)) => Value::Float(v as f32),
		(Promotion::IntToDouble, Value::Int(v)) => Value::Double(f64::from(v)),
		(Promotion::LongToFloat, Value::Long(v)) => Value::Float(v as f32),
		(Promotion::LongToDouble, Value::Long(v)) => Value::Double(v as f64),
		(Promotion::FloatToDouble, Value::Float(v)) => Value::Double(f64::from(v)),
		(Promotion::StringToBytes, Value::String(v)) => Value::Bytes(v.into_bytes()),
		(Promotion::BytesToString, Value::Bytes(v)) => Value::String(String::from_utf8_lossy(&v).into_owned()),
		(_, other) => other,
	}
}

/// Convert a field's raw JSON default value into a [`Value`] matching
/// `key`'s schema, for injecting a reader-only field's default during
/// resolved decode.
pub(crate) fn default_to_value(schema: &SchemaMut, key: SchemaKey, json: &serde_json::Value) -> crate::Result<Value> {
	use serde_json::Value as J;
	let node = &schema[key];
	match (&node.type_, json) {
		(RegularType::Null, J::Null) => Ok(Value::Null),
		(RegularType::Boolean, J::Bool(b)) => Ok(Value::Boolean(*b)),
		(RegularType::Int, J::Number(n)) => Ok(Value::Int(n.as_i64().unwrap_or_default() as i32)),
		(RegularType::Long, J::Number(n)) => Ok(Value::Long(n.as_i64().unwrap_or_default())),
		(RegularType::Float, J::Number(n)) => Ok(Value::Float(n.as_f64().unwrap_or_default() as f32)),
		(RegularType::Double, J::Number(n)) => Ok(Value::Double(n.as_f64().unwrap_or_default())),
		(RegularType::Bytes, J::String(s)) => Ok(Value::Bytes(s.chars().map(|c| c as u8).collect())),
		(RegularType::String, J::String(s)) => Ok(Value::String(s.clone())),
		(RegularType::Fixed(_), J::String(s)) => Ok(Value::Bytes(s.chars().map(|c| c as u8).collect())),
		(RegularType::Enum(_), J::String(s)) => Ok(Value::Enum(s.clone())),
		(RegularType::Array(array), J::Array(items)) => Ok(Value::Array(
			items
				.iter()
				.map(|i| default_to_value(schema, array.items, i))
				.collect::<crate::Result<Vec<_>>>()?,
		)),
		(RegularType::Map(map), J::Object(entries)) => Ok(Value::Map(
			entries
				.iter()
				.map(|(k, v)| Ok((k.clone(), default_to_value(schema, map.values, v)?)))
				.collect::<crate::Result<Vec<_>>>()?,
		)),
		(RegularType::Record(record), J::Object(entries)) => {
			let mut fields = Vec::with_capacity(record.fields.len());
			for field in &record.fields {
				let field_json = entries.get(&field.name).or(field.default.as_ref()).ok_or_else(|| {
					Error::schema_parse(format_args!("default is missing field {:?}", field.name))
				})?;
				fields.push((field.name.clone(), default_to_value(schema, field.type_, field_json)?));
			}
			Ok(Value::Map(fields))
		}
		(RegularType::Union(union), _) => match union.variants.first() {
			Some(&first) => default_to_value(schema, first, json),
			None => Err(Error::schema_parse("union has no variants")),
		},
		_ => Err(Error::type_mismatch(format_args!("default value {json} does not match its schema"))),
	}
}
