//! Validation of default values against their declared schema (spec §4.3)

use super::safe::{RegularType, SchemaMut, SchemaNode};
use crate::Error;

/// Validate that `value` is a legal default for `node`, recursing into
/// composite types.
///
/// Per the documented resolution of the union-default Open Question (spec
/// §9), a default for a `union`-typed field is validated against the
/// union's *first* variant only, regardless of which branch the value would
/// actually decode as at read time.
pub(crate) fn validate(schema: &SchemaMut, node: &SchemaNode, value: &serde_json::Value) -> crate::Result<()> {
	use serde_json::Value as J;
	match &node.type_ {
		RegularType::Null => match value {
			J::Null => Ok(()),
			_ => Err(mismatch("null", value)),
		},
		RegularType::Boolean => match value {
			J::Bool(_) => Ok(()),
			_ => Err(mismatch("boolean", value)),
		},
		RegularType::Int | RegularType::Long => match value {
			J::Number(n) if n.is_i64() || n.is_u64() => Ok(()),
			_ => Err(mismatch("integer", value)),
		},
		RegularType::Float | RegularType::Double => match value {
			J::Number(_) => Ok(()),
			_ => Err(mismatch("number", value)),
		},
		RegularType::Bytes => match value {
			J::String(_) => Ok(()),
			_ => Err(mismatch("bytes (as a JSON string)", value)),
		},
		RegularType::String => match value {
			J::String(_) => Ok(()),
			_ => Err(mismatch("string", value)),
		},
		RegularType::Fixed(fixed) => match value {
			J::String(s) if s.chars().count() == fixed.size => Ok(()),
			J::String(s) => Err(Error::schema_parse(format_args!(
				"default for fixed({}) has wrong length {}",
				fixed.size,
				s.chars().count()
			))),
			_ => Err(mismatch("fixed (as a JSON string)", value)),
		},
		RegularType::Enum(enum_) => match value {
			J::String(s) if enum_.symbols.iter().any(|sym| sym == s) => Ok(()),
			J::String(s) => Err(Error::schema_parse(format_args!(
				"default symbol {s:?} is not a symbol of enum {}",
				enum_.name
			))),
			_ => Err(mismatch("enum symbol (as a JSON string)", value)),
		},
		RegularType::Array(array) => match value {
			J::Array(items) => {
				for item in items {
					validate(schema, &schema[array.items], item)?;
				}
				Ok(())
			}
			_ => Err(mismatch("array", value)),
		},
		RegularType::Map(map) => match value {
			J::Object(entries) => {
				for v in entries.values() {
					validate(schema, &schema[map.values], v)?;
				}
				Ok(())
			}
			_ => Err(mismatch("map", value)),
		},
		RegularType::Union(union) => {
			let Some(&first) = union.variants.first() else {
				return Err(Error::schema_parse("union has no variants"));
			};
			validate(schema, &schema[first], value)
		}
		RegularType::Record(record) => match value {
			J::Object(entries) => {
				for field in &record.fields {
					let field_value = entries.get(&field.name).or(field.default.as_ref()).ok_or_else(|| {
						Error::schema_parse(format_args!(
							"default for record {} is missing field {:?}",
							record.name, field.name
						))
					})?;
					validate(schema, &schema[field.type_], field_value)?;
				}
				Ok(())
			}
			_ => Err(mismatch("record", value)),
		},
	}
}

fn mismatch(expected: &str, got: &serde_json::Value) -> Error {
	Error::schema_parse(format_args!("expected a default value for {expected}, got {got}"))
}
