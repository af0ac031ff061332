//! Schema JSON parsing: turns a JSON document into a [`SchemaMut`] arena
//!
//! The central trick: a named type's arena slot is reserved (and registered
//! under its fully qualified name) *before* its children are built, so a
//! record field can reference its own enclosing record without any
//! second pass or patch-up step.

use super::super::default_value;
use super::super::name::Name;
use super::super::union_key;
use super::{
	Array, Decimal, Enum, Fixed, LogicalType, Map, RegularType, Record, RecordField, SchemaKey, SchemaMut,
	SchemaNode, Union, UnknownLogicalType,
};
use crate::Error;
use hashbrown::HashMap;
use serde_json::Value as J;

/// A cache of named schemas parsed so far, carried across successive
/// [`parse_with_cache`] calls so a later document can reference a named
/// type an earlier one defined (spec §6.3, §4.2: "a shared cache of
/// previously parsed named schemas, for multi-file parses"). Keyed by fully
/// qualified name, each entry holds that type's own JSON definition,
/// normalized so it can be rebuilt identically regardless of which
/// namespace happens to be enclosing it at the reference site.
#[derive(Default)]
pub(crate) struct NameCache {
	definitions: HashMap<String, J>,
}

impl NameCache {
	pub(crate) fn new() -> Self {
		Self::default()
	}
}

pub(crate) fn parse(s: &str) -> crate::Result<SchemaMut> {
	parse_with_cache(s, &mut NameCache::new())
}

pub(crate) fn parse_with_cache(s: &str, cache: &mut NameCache) -> crate::Result<SchemaMut> {
	let value: J = serde_json::from_str(s).map_err(|e| Error::schema_parse(format_args!("invalid JSON: {e}")))?;
	let mut builder = Builder {
		nodes: Vec::new(),
		names: HashMap::new(),
		cache,
	};
	builder.build(&value, None)?;
	let schema = SchemaMut::from_nodes(builder.nodes);

	super::check_cycles::check_for_unconditional_cycles(schema.nodes())
		.map_err(|e| Error::schema_parse(e.to_string()))?;
	for node in schema.nodes() {
		if let RegularType::Union(union) = &node.type_ {
			union_key::check_unique_keys(&schema, union)?;
		}
	}
	for node in schema.nodes() {
		validate_defaults(&schema, node)?;
	}
	Ok(schema)
}

fn validate_defaults(schema: &SchemaMut, node: &SchemaNode) -> crate::Result<()> {
	if let RegularType::Record(record) = &node.type_ {
		for field in &record.fields {
			if let Some(default) = &field.default {
				default_value::validate(schema, &schema[field.type_], default)?;
			}
		}
	}
	if let RegularType::Enum(enum_) = &node.type_ {
		if let Some(default) = &enum_.default {
			if !enum_.symbols.iter().any(|s| s == default) {
				return Err(Error::schema_parse(format_args!(
					"default symbol {default:?} is not declared by enum {}",
					enum_.name
				)));
			}
		}
	}
	Ok(())
}

struct Builder<'c> {
	nodes: Vec<SchemaNode>,
	names: HashMap<String, usize>,
	cache: &'c mut NameCache,
}

const RESERVED_TOP: &[&str] = &["type"];
const RESERVED_ARRAY: &[&str] = &["type", "items"];
const RESERVED_MAP: &[&str] = &["type", "values"];
const RESERVED_NAMED: &[&str] = &["type", "name", "namespace", "aliases", "doc"];
const RESERVED_RECORD: &[&str] = &["type", "name", "namespace", "aliases", "doc", "fields"];
const RESERVED_ENUM: &[&str] = &["type", "name", "namespace", "aliases", "doc", "symbols", "default"];
const RESERVED_FIXED: &[&str] = &["type", "name", "namespace", "aliases", "doc", "size", "logicalType"];
const RESERVED_LOGICAL: &[&str] = &["type", "logicalType", "precision", "scale"];
const RESERVED_FIELD: &[&str] = &["name", "type", "default", "doc", "aliases", "order"];

impl Builder<'_> {
	fn push(&mut self, node: SchemaNode) -> SchemaKey {
		let idx = self.nodes.len();
		self.nodes.push(node);
		SchemaKey::from_idx(idx)
	}

	/// Reserve a slot with a throwaway placeholder, so a node that recurses
	/// into children before it can build itself (array/map/union, same
	/// need `register_name` has for named types) still lands at the arena
	/// index it was entered at -- critical for the root node, which must
	/// stay at index 0 regardless of how deep its first child's subtree is.
	fn reserve(&mut self) -> usize {
		let idx = self.nodes.len();
		self.nodes.push(SchemaNode::from(RegularType::Null));
		idx
	}

	fn build(&mut self, value: &J, namespace: Option<&str>) -> crate::Result<SchemaKey> {
		match value {
			J::String(s) => self.build_ref_or_primitive(s, namespace),
			J::Array(variants) => {
				let idx = self.reserve();
				let mut keys = Vec::with_capacity(variants.len());
				for variant in variants {
					keys.push(self.build(variant, namespace)?);
				}
				self.nodes[idx] = SchemaNode::from(RegularType::Union(Union { variants: keys }));
				Ok(SchemaKey::from_idx(idx))
			}
			J::Object(obj) => match obj.get("type") {
				None => Err(Error::schema_parse("schema object is missing a \"type\" field")),
				Some(J::String(type_name)) => self.build_object(type_name, obj, namespace),
				Some(other) => self.build(other, namespace),
			},
			other => Err(Error::schema_parse(format_args!("invalid schema: {other}"))),
		}
	}

	fn build_ref_or_primitive(&mut self, s: &str, namespace: Option<&str>) -> crate::Result<SchemaKey> {
		if let Some(prim) = primitive(s) {
			return Ok(self.push(SchemaNode::from(prim)));
		}
		let fqn = Name::resolve(s, namespace);
		if let Some(&idx) = self.names.get(fqn.fully_qualified_name()) {
			return Ok(SchemaKey::from_idx(idx));
		}
		// Not defined yet in this document -- maybe an earlier file in the
		// same `parse_files` call already defined it (spec §6.3).
		if let Some(cached) = self.cache.definitions.get(fqn.fully_qualified_name()).cloned() {
			self.build(&cached, None)?;
			if let Some(&idx) = self.names.get(fqn.fully_qualified_name()) {
				return Ok(SchemaKey::from_idx(idx));
			}
		}
		Err(Error::schema_parse(format_args!(
			"unresolvable reference to type {:?}",
			fqn.fully_qualified_name()
		)))
	}

	fn build_object(
		&mut self,
		type_name: &str,
		obj: &serde_json::Map<String, J>,
		namespace: Option<&str>,
	) -> crate::Result<SchemaKey> {
		match type_name {
			"array" => {
				let items = obj
					.get("items")
					.ok_or_else(|| Error::schema_parse("array schema is missing \"items\""))?;
				let idx = self.reserve();
				let items = self.build(items, namespace)?;
				let mut node = SchemaNode::from(RegularType::Array(Array { items }));
				node.properties = leftover_properties(obj, RESERVED_ARRAY);
				node.doc = string_field(obj, "doc");
				self.nodes[idx] = node;
				Ok(SchemaKey::from_idx(idx))
			}
			"map" => {
				let values = obj
					.get("values")
					.ok_or_else(|| Error::schema_parse("map schema is missing \"values\""))?;
				let idx = self.reserve();
				let values = self.build(values, namespace)?;
				let mut node = SchemaNode::from(RegularType::Map(Map { values }));
				node.properties = leftover_properties(obj, RESERVED_MAP);
				node.doc = string_field(obj, "doc");
				self.nodes[idx] = node;
				Ok(SchemaKey::from_idx(idx))
			}
			"fixed" => {
				let (name, _child_namespace) = self.register_name(obj, namespace)?;
				let idx = self.names[name.fully_qualified_name()];
				let size = obj
					.get("size")
					.and_then(J::as_u64)
					.ok_or_else(|| Error::schema_parse(format_args!("fixed {name} is missing a valid \"size\"")))?;
				let aliases = self.resolve_aliases(obj, namespace, idx, &name)?;
				let mut node = SchemaNode::from(RegularType::Fixed(Fixed {
					name,
					aliases,
					size: size as usize,
				}));
				node.doc = string_field(obj, "doc");
				attach_logical_type(&mut node, obj)?;
				node.properties.extend(leftover_properties(obj, RESERVED_FIXED));
				self.nodes[idx] = node;
				Ok(SchemaKey::from_idx(idx))
			}
			"enum" => {
				let (name, _child_namespace) = self.register_name(obj, namespace)?;
				let idx = self.names[name.fully_qualified_name()];
				let symbols_val = obj
					.get("symbols")
					.and_then(J::as_array)
					.ok_or_else(|| Error::schema_parse(format_args!("enum {name} is missing \"symbols\"")))?;
				let mut symbols = Vec::with_capacity(symbols_val.len());
				for s in symbols_val {
					let s = s
						.as_str()
						.ok_or_else(|| Error::schema_parse("enum symbol must be a string"))?;
					Name::validate_identifier(s)?;
					if symbols.iter().any(|sym| sym == s) {
						return Err(Error::schema_parse(format_args!(
							"enum {name} declares duplicate symbol {s:?}"
						)));
					}
					symbols.push(s.to_owned());
				}
				let default = string_field(obj, "default");
				let aliases = self.resolve_aliases(obj, namespace, idx, &name)?;
				let mut node = SchemaNode::from(RegularType::Enum(Enum {
					name,
					aliases,
					symbols,
					default,
				}));
				node.doc = string_field(obj, "doc");
				node.properties = leftover_properties(obj, RESERVED_ENUM);
				self.nodes[idx] = node;
				Ok(SchemaKey::from_idx(idx))
			}
			"record" | "error" => {
				let (name, child_namespace) = self.register_name(obj, namespace)?;
				let idx = self.names[name.fully_qualified_name()];
				let fields_val = obj
					.get("fields")
					.and_then(J::as_array)
					.ok_or_else(|| Error::schema_parse(format_args!("record {name} is missing \"fields\"")))?;
				let mut fields = Vec::with_capacity(fields_val.len());
				for field_val in fields_val {
					fields.push(self.build_field(field_val, child_namespace.as_deref(), &name)?);
				}
				let aliases = self.resolve_aliases(obj, namespace, idx, &name)?;
				let mut node = SchemaNode::from(RegularType::Record(Record {
					name,
					aliases,
					fields,
					is_error: type_name == "error",
				}));
				node.doc = string_field(obj, "doc");
				node.properties = leftover_properties(obj, RESERVED_RECORD);
				self.nodes[idx] = node;
				Ok(SchemaKey::from_idx(idx))
			}
			other => {
				if let Some(prim) = primitive(other) {
					let mut node = SchemaNode::from(prim);
					attach_logical_type(&mut node, obj)?;
					node.properties.extend(leftover_properties(obj, RESERVED_LOGICAL));
					Ok(self.push(node))
				} else {
					Err(Error::schema_parse(format_args!("unknown schema type {other:?}")))
				}
			}
		}
	}

	/// Register a named type's fully qualified name up front (reserving its
	/// arena slot with a throwaway placeholder), so self-referential field
	/// types resolve. Returns the resolved [`Name`] and the namespace that
	/// this type's own children (fields, nested anonymous types) should be
	/// built under.
	fn register_name(
		&mut self,
		obj: &serde_json::Map<String, J>,
		enclosing_namespace: Option<&str>,
	) -> crate::Result<(Name, Option<String>)> {
		let name_str = obj
			.get("name")
			.and_then(J::as_str)
			.ok_or_else(|| Error::schema_parse("named type is missing \"name\""))?;
		let explicit_namespace = obj.get("namespace").and_then(J::as_str);
		let name = Name::resolve(name_str, explicit_namespace.or(enclosing_namespace));
		Name::validate_identifier(name.fully_qualified_name())?;
		if self.names.contains_key(name.fully_qualified_name()) {
			return Err(Error::schema_parse(format_args!(
				"duplicate type name {:?}",
				name.fully_qualified_name()
			)));
		}
		let child_namespace = name.namespace().map(str::to_owned);
		let idx = self.push(SchemaNode::from(RegularType::Null)).idx();
		self.names.insert(name.fully_qualified_name().to_owned(), idx);
		self.cache
			.definitions
			.insert(name.fully_qualified_name().to_owned(), normalize_namespace(obj, &name));
		Ok((name, child_namespace))
	}

	/// Resolve a named type's `"aliases"` array to fully qualified names,
	/// registering each one in the same namespace as the type's own name
	/// (spec §3.2.1: "Aliases also register in the same namespace and must
	/// not collide"). `idx` is the arena slot the aliases resolve to --
	/// the same slot `register_name` reserved for the type's primary name.
	fn resolve_aliases(
		&mut self,
		obj: &serde_json::Map<String, J>,
		namespace: Option<&str>,
		idx: usize,
		primary_name: &Name,
	) -> crate::Result<Vec<String>> {
		let Some(aliases) = obj.get("aliases").and_then(J::as_array) else {
			return Ok(Vec::new());
		};
		// An alias resolves to the same slot as the primary name, so it's
		// cached under the primary's own definition too -- a reference to
		// the alias from a later file should rebuild the same type.
		let primary_definition = self
			.cache
			.definitions
			.get(primary_name.fully_qualified_name())
			.cloned()
			.unwrap_or_else(|| normalize_namespace(obj, primary_name));
		let mut resolved = Vec::with_capacity(aliases.len());
		for a in aliases {
			let a = a
				.as_str()
				.ok_or_else(|| Error::schema_parse("alias must be a string"))?;
			let name = Name::resolve(a, namespace);
			Name::validate_identifier(name.fully_qualified_name())?;
			let fqn = name.fully_qualified_name().to_owned();
			if let Some(existing) = self.names.insert(fqn.clone(), idx) {
				if existing != idx {
					return Err(Error::schema_parse(format_args!("alias {fqn:?} collides with an existing type name")));
				}
			}
			self.cache.definitions.insert(fqn.clone(), primary_definition.clone());
			resolved.push(fqn);
		}
		Ok(resolved)
	}

	fn build_field(&mut self, value: &J, namespace: Option<&str>, record_name: &Name) -> crate::Result<RecordField> {
		let obj = value
			.as_object()
			.ok_or_else(|| Error::schema_parse(format_args!("field of record {record_name} must be an object")))?;
		let name = obj
			.get("name")
			.and_then(J::as_str)
			.ok_or_else(|| Error::schema_parse(format_args!("field of record {record_name} is missing \"name\"")))?;
		Name::validate_identifier(name)?;
		let type_val = obj.get("type").ok_or_else(|| {
			Error::schema_parse(format_args!(
				"field {name:?} of record {record_name} is missing \"type\""
			))
		})?;
		let type_ = self.build(type_val, namespace)?;
		let default = obj.get("default").cloned();
		let aliases = match obj.get("aliases").and_then(J::as_array) {
			None => Vec::new(),
			Some(aliases) => aliases
				.iter()
				.map(|a| {
					a.as_str()
						.map(str::to_owned)
						.ok_or_else(|| Error::schema_parse("field alias must be a string"))
				})
				.collect::<crate::Result<Vec<_>>>()?,
		};
		Ok(RecordField {
			name: name.to_owned(),
			aliases,
			type_,
			default,
			doc: string_field(obj, "doc"),
			properties: leftover_properties(obj, RESERVED_FIELD),
		})
	}
}

/// Clone `obj` with its `"name"`/`"namespace"` rewritten to `name`'s own
/// already-resolved simple name and namespace, so the clone can be rebuilt
/// from scratch (via [`NameCache`]) under a different enclosing namespace
/// and still resolve to the exact same fully qualified name.
fn normalize_namespace(obj: &serde_json::Map<String, J>, name: &Name) -> J {
	let mut obj = obj.clone();
	obj.insert("name".to_owned(), J::String(name.name().to_owned()));
	match name.namespace() {
		Some(ns) => {
			obj.insert("namespace".to_owned(), J::String(ns.to_owned()));
		}
		None => {
			obj.remove("namespace");
		}
	}
	J::Object(obj)
}

fn primitive(s: &str) -> Option<RegularType> {
	Some(match s {
		"null" => RegularType::Null,
		"boolean" => RegularType::Boolean,
		"int" => RegularType::Int,
		"long" => RegularType::Long,
		"float" => RegularType::Float,
		"double" => RegularType::Double,
		"bytes" => RegularType::Bytes,
		"string" => RegularType::String,
		_ => return None,
	})
}

fn string_field(obj: &serde_json::Map<String, J>, key: &str) -> Option<String> {
	obj.get(key).and_then(J::as_str).map(str::to_owned)
}

fn leftover_properties(obj: &serde_json::Map<String, J>, reserved: &[&str]) -> Vec<(String, J)> {
	obj.iter()
		.filter(|(k, _)| !reserved.contains(&k.as_str()) && *k != "doc")
		.map(|(k, v)| (k.clone(), v.clone()))
		.collect()
}

/// Attach (or gracefully drop, per spec §4.2 step 7) a `logicalType`
/// annotation found on `obj` onto `node`.
fn attach_logical_type(node: &mut SchemaNode, obj: &serde_json::Map<String, J>) -> crate::Result<()> {
	let Some(logical_type) = obj.get("logicalType").and_then(J::as_str) else {
		return Ok(());
	};
	let drop_with_properties = |node: &mut SchemaNode| {
		node.properties.push(("logicalType".to_owned(), J::String(logical_type.to_owned())));
		if let Some(p) = obj.get("precision") {
			node.properties.push(("precision".to_owned(), p.clone()));
		}
		if let Some(s) = obj.get("scale") {
			node.properties.push(("scale".to_owned(), s.clone()));
		}
	};
	match logical_type {
		"decimal" => {
			let base_fixed_size = match &node.type_ {
				RegularType::Fixed(f) => Some(f.size),
				RegularType::Bytes => None,
				_ => {
					drop_with_properties(node);
					return Ok(());
				}
			};
			let precision = obj.get("precision").and_then(J::as_u64);
			let scale = obj.get("scale").and_then(J::as_u64).unwrap_or(0);
			match precision {
				Some(precision) if precision > 0 && scale <= precision => {
					if let Some(size) = base_fixed_size {
						// A fixed of `size` bytes can hold at most
						// floor(log10(2^(8*size-1) - 1)) decimal digits.
						let max_precision = ((8.0 * size as f64 - 1.0) * std::f64::consts::LOG10_2).floor() as u64;
						if precision > max_precision {
							drop_with_properties(node);
							return Ok(());
						}
					}
					node.logical_type = Some(LogicalType::Decimal(Decimal {
						precision: precision as usize,
						scale: scale as u32,
					}));
				}
				_ => drop_with_properties(node),
			}
		}
		"uuid" => match &node.type_ {
			RegularType::String => node.logical_type = Some(LogicalType::Uuid),
			_ => drop_with_properties(node),
		},
		"date" => match &node.type_ {
			RegularType::Int => node.logical_type = Some(LogicalType::Date),
			_ => drop_with_properties(node),
		},
		"time-millis" => match &node.type_ {
			RegularType::Int => node.logical_type = Some(LogicalType::TimeMillis),
			_ => drop_with_properties(node),
		},
		"time-micros" => match &node.type_ {
			RegularType::Long => node.logical_type = Some(LogicalType::TimeMicros),
			_ => drop_with_properties(node),
		},
		"timestamp-millis" => match &node.type_ {
			RegularType::Long => node.logical_type = Some(LogicalType::TimestampMillis),
			_ => drop_with_properties(node),
		},
		"timestamp-micros" => match &node.type_ {
			RegularType::Long => node.logical_type = Some(LogicalType::TimestampMicros),
			_ => drop_with_properties(node),
		},
		"local-timestamp-millis" => match &node.type_ {
			RegularType::Long => node.logical_type = Some(LogicalType::LocalTimestampMillis),
			_ => drop_with_properties(node),
		},
		"local-timestamp-micros" => match &node.type_ {
			RegularType::Long => node.logical_type = Some(LogicalType::LocalTimestampMicros),
			_ => drop_with_properties(node),
		},
		"duration" => match &node.type_ {
			RegularType::Fixed(f) if f.size == 12 => node.logical_type = Some(LogicalType::Duration),
			_ => drop_with_properties(node),
		},
		other => node.logical_type = Some(LogicalType::Unknown(UnknownLogicalType::new(other))),
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_primitive_shorthand() {
		let schema = parse(r#""string""#).unwrap();
		assert!(matches!(schema.root().type_, RegularType::String));
	}

	#[test]
	fn self_referential_record_resolves() {
		let schema = parse(
			r#"{
				"type": "record",
				"name": "LinkedList",
				"fields": [
					{"name": "value", "type": "long"},
					{"name": "next", "type": ["null", "LinkedList"]}
				]
			}"#,
		)
		.unwrap();
		match &schema.root().type_ {
			RegularType::Record(r) => assert_eq!(r.fields.len(), 2),
			_ => panic!("expected record"),
		}
	}

	#[test]
	fn top_level_array_lands_at_root() {
		let schema = parse(r#"{"type":"array","items":"int"}"#).unwrap();
		assert!(matches!(schema.root().type_, RegularType::Array(_)));
	}

	#[test]
	fn top_level_map_lands_at_root() {
		let schema = parse(r#"{"type":"map","values":"int"}"#).unwrap();
		assert!(matches!(schema.root().type_, RegularType::Map(_)));
	}

	#[test]
	fn top_level_union_lands_at_root() {
		let schema = parse(r#"["null", "string"]"#).unwrap();
		assert!(matches!(schema.root().type_, RegularType::Union(_)));
	}

	#[test]
	fn nested_union_inside_array_items_does_not_shift_the_root() {
		// Regression case for the bug the above three tests lock in directly:
		// the root must stay at index 0 even when building it requires
		// recursing through an arbitrarily deep subtree first.
		let schema = parse(r#"{"type":"array","items":["null","long"]}"#).unwrap();
		match &schema.root().type_ {
			RegularType::Array(a) => assert!(matches!(schema[a.items].type_, RegularType::Union(_))),
			other => panic!("expected array at root, got {other:?}"),
		}
	}

	#[test]
	fn rejects_duplicate_name() {
		let err = parse(
			r#"{
				"type": "record",
				"name": "Dup",
				"fields": [
					{"name": "a", "type": {"type": "record", "name": "Dup", "fields": []}}
				]
			}"#,
		);
		assert!(err.is_err());
	}

	#[test]
	fn decimal_on_bytes_is_attached() {
		let schema = parse(r#"{"type": "bytes", "logicalType": "decimal", "precision": 9, "scale": 2}"#).unwrap();
		match &schema.root().logical_type {
			Some(LogicalType::Decimal(d)) => {
				assert_eq!(d.precision, 9);
				assert_eq!(d.scale, 2);
			}
			other => panic!("expected decimal, got {other:?}"),
		}
	}

	#[test]
	fn invalid_logical_type_is_dropped_not_rejected() {
		let schema = parse(r#"{"type": "string", "logicalType": "decimal", "precision": 9}"#).unwrap();
		assert!(schema.root().logical_type.is_none());
		assert!(schema.root().properties.iter().any(|(k, _)| k == "logicalType"));
	}

	#[test]
	fn namespace_resolution_prefers_explicit_namespace_field() {
		let schema = parse(r#"{"type": "fixed", "name": "Md5", "namespace": "com.example", "size": 16}"#).unwrap();
		match &schema.root().type_ {
			RegularType::Fixed(f) => assert_eq!(f.name.fully_qualified_name(), "com.example.Md5"),
			_ => panic!("expected fixed"),
		}
	}
}
