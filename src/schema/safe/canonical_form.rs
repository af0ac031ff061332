//! Avro Parsing Canonical Form (spec §5.1)
//!
//! Strips documentation, aliases, defaults and order, fully qualifies every
//! name, and re-serializes using a fixed attribute order. This is generic
//! over any [`std::fmt::Write`] sink so it can feed both a plain `String`
//! (for human-readable canonical form) and a hasher's `Write` impl (for
//! fingerprinting, spec §5.2) without allocating an intermediate buffer
//! twice.

use super::{RegularType, SchemaKey, SchemaMut, SchemaNode};
use hashbrown::HashSet;
use std::fmt::Write;

/// Render `schema`'s Parsing Canonical Form into `out`.
pub(crate) fn write_canonical_form(schema: &SchemaMut, out: &mut impl Write) -> std::fmt::Result {
	let mut seen = HashSet::new();
	write_node(schema, SchemaKey::root(), out, &mut seen)
}

fn write_node(
	schema: &SchemaMut,
	key: SchemaKey,
	out: &mut impl Write,
	seen: &mut HashSet<String>,
) -> std::fmt::Result {
	let node: &SchemaNode = &schema[key];
	match &node.type_ {
		RegularType::Null => out.write_str("\"null\""),
		RegularType::Boolean => out.write_str("\"boolean\""),
		RegularType::Int => out.write_str("\"int\""),
		RegularType::Long => out.write_str("\"long\""),
		RegularType::Float => out.write_str("\"float\""),
		RegularType::Double => out.write_str("\"double\""),
		RegularType::Bytes => out.write_str("\"bytes\""),
		RegularType::String => out.write_str("\"string\""),
		RegularType::Array(array) => {
			out.write_str("{\"type\":\"array\",\"items\":")?;
			write_node(schema, array.items, out, seen)?;
			out.write_char('}')
		}
		RegularType::Map(map) => {
			out.write_str("{\"type\":\"map\",\"values\":")?;
			write_node(schema, map.values, out, seen)?;
			out.write_char('}')
		}
		RegularType::Union(union) => {
			out.write_char('[')?;
			for (i, &variant) in union.variants.iter().enumerate() {
				if i != 0 {
					out.write_char(',')?;
				}
				write_node(schema, variant, out, seen)?;
			}
			out.write_char(']')
		}
		RegularType::Record(record) => {
			let fqn = record.name.fully_qualified_name();
			if !seen.insert(fqn.to_owned()) {
				return write_json_string(fqn, out);
			}
			out.write_str("{\"name\":")?;
			write_json_string(fqn, out)?;
			out.write_str(",\"type\":\"record\",\"fields\":[")?;
			for (i, field) in record.fields.iter().enumerate() {
				if i != 0 {
					out.write_char(',')?;
				}
				out.write_str("{\"name\":")?;
				write_json_string(&field.name, out)?;
				out.write_str(",\"type\":")?;
				write_node(schema, field.type_, out, seen)?;
				out.write_char('}')?;
			}
			out.write_str("]}")
		}
		RegularType::Enum(enum_) => {
			let fqn = enum_.name.fully_qualified_name();
			if !seen.insert(fqn.to_owned()) {
				return write_json_string(fqn, out);
			}
			out.write_str("{\"name\":")?;
			write_json_string(fqn, out)?;
			out.write_str(",\"type\":\"enum\",\"symbols\":[")?;
			for (i, symbol) in enum_.symbols.iter().enumerate() {
				if i != 0 {
					out.write_char(',')?;
				}
				write_json_string(symbol, out)?;
			}
			out.write_str("]}")
		}
		RegularType::Fixed(fixed) => {
			let fqn = fixed.name.fully_qualified_name();
			if !seen.insert(fqn.to_owned()) {
				return write_json_string(fqn, out);
			}
			write!(
				out,
				"{{\"name\":{},\"type\":\"fixed\",\"size\":{}}}",
				JsonStr(fqn),
				fixed.size
			)
		}
	}
}

/// Minimal JSON string escaping: PCF names/symbols never need anything
/// beyond quote/backslash/control-character escaping since Avro identifiers
/// are restricted to `[A-Za-z0-9_.]`, but enum symbols have the same
/// restriction while record/field names can't contain arbitrary text either
/// -- so a conservative escaper is used regardless, matching
/// `serde_json`'s own escaping rules for displayed output.
fn write_json_string(s: &str, out: &mut impl Write) -> std::fmt::Result {
	out.write_char('"')?;
	for c in s.chars() {
		match c {
			'"' => out.write_str("\\\"")?,
			'\\' => out.write_str("\\\\")?,
			c if (c as u32) < 0x20 => write!(out, "\\u{:04x}", c as u32)?,
			c => out.write_char(c)?,
		}
	}
	out.write_char('"')
}

struct JsonStr<'a>(&'a str);
impl std::fmt::Display for JsonStr<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write_json_string(self.0, f)
	}
}
