//! A programmatic, non-derive schema builder
//!
//! Schema text is unwieldy to hand-write for anything beyond a handful of
//! fields. [`SchemaBuilder`] assembles the same JSON document the string
//! parser consumes, so it gets every validation rule (name syntax, union
//! key uniqueness, default value checking, cycle detection) for free --
//! building a [`serde_json::Value`] and handing it to [`SchemaMut::from_str`]
//! has identical behavior to handwriting the equivalent JSON.

use super::safe::SchemaMut;
use serde_json::{json, Value};
use std::str::FromStr;

/// A schema under construction. See the module docs.
#[derive(Debug, Clone)]
pub struct SchemaBuilder(Value);

impl SchemaBuilder {
	/// A bare primitive type: one of `null`, `boolean`, `int`, `long`,
	/// `float`, `double`, `bytes`, `string`.
	pub fn primitive(name: &str) -> Self {
		Self(Value::String(name.to_owned()))
	}

	/// A reference to a named type declared elsewhere in the same schema
	/// (e.g. a record field referencing an enum defined as a sibling
	/// field's type).
	pub fn reference(fully_qualified_name: impl Into<String>) -> Self {
		Self(Value::String(fully_qualified_name.into()))
	}

	/// `array` of `items`
	pub fn array(items: SchemaBuilder) -> Self {
		Self(json!({ "type": "array", "items": items.0 }))
	}

	/// `map` of `values`
	pub fn map(values: SchemaBuilder) -> Self {
		Self(json!({ "type": "map", "values": values.0 }))
	}

	/// `union` of `variants`, in order
	pub fn union(variants: impl IntoIterator<Item = SchemaBuilder>) -> Self {
		Self(Value::Array(variants.into_iter().map(|b| b.0).collect()))
	}

	/// `fixed` named type of `size` bytes
	pub fn fixed(name: impl Into<String>, size: usize) -> Self {
		Self(json!({ "type": "fixed", "name": name.into(), "size": size }))
	}

	/// `enum` named type with the given symbols, in order
	pub fn enum_(name: impl Into<String>, symbols: impl IntoIterator<Item = impl Into<String>>) -> Self {
		Self(json!({
			"type": "enum",
			"name": name.into(),
			"symbols": symbols.into_iter().map(Into::into).collect::<Vec<String>>(),
		}))
	}

	/// `record` named type with the given fields, in order
	pub fn record(name: impl Into<String>, fields: impl IntoIterator<Item = FieldBuilder>) -> Self {
		Self(json!({
			"type": "record",
			"name": name.into(),
			"fields": fields.into_iter().map(|f| f.0).collect::<Vec<Value>>(),
		}))
	}

	/// Set an explicit namespace on this (named) type
	pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
		if let Value::Object(obj) = &mut self.0 {
			obj.insert("namespace".into(), Value::String(namespace.into()));
		}
		self
	}

	/// Declare alternate names this type may also be matched against during
	/// schema resolution (spec §4.6)
	pub fn aliases(mut self, aliases: impl IntoIterator<Item = impl Into<String>>) -> Self {
		if let Value::Object(obj) = &mut self.0 {
			obj.insert(
				"aliases".into(),
				Value::Array(aliases.into_iter().map(|a| Value::String(a.into())).collect()),
			);
		}
		self
	}

	/// Overlay a logical type (and its attributes) on this node
	pub fn logical_type(mut self, logical_type: impl Into<String>, attrs: impl IntoIterator<Item = (String, Value)>) -> Self {
		let obj = match &mut self.0 {
			Value::Object(obj) => obj,
			other => {
				let wrapped = json!({ "type": std::mem::take(other) });
				*other = wrapped;
				other.as_object_mut().unwrap()
			}
		};
		obj.insert("logicalType".into(), Value::String(logical_type.into()));
		for (k, v) in attrs {
			obj.insert(k, v);
		}
		self
	}

	/// Parse the assembled document into a [`SchemaMut`], applying every
	/// validation the string parser would.
	pub fn build(self) -> crate::Result<SchemaMut> {
		SchemaMut::from_str(&self.0.to_string())
	}
}

/// A single field of a [`SchemaBuilder::record`]
#[derive(Debug, Clone)]
pub struct FieldBuilder(Value);

impl FieldBuilder {
	/// A required field with no default value
	pub fn new(name: impl Into<String>, type_: SchemaBuilder) -> Self {
		Self(json!({ "name": name.into(), "type": type_.0 }))
	}

	/// Attach a default value, used when a writer that didn't declare this
	/// field is resolved against a reader that does
	pub fn default(mut self, default: Value) -> Self {
		if let Value::Object(obj) = &mut self.0 {
			obj.insert("default".into(), default);
		}
		self
	}

	/// Declare alternate names this field may be matched against when
	/// resolving a renamed writer field
	pub fn aliases(mut self, aliases: impl IntoIterator<Item = impl Into<String>>) -> Self {
		if let Value::Object(obj) = &mut self.0 {
			obj.insert(
				"aliases".into(),
				Value::Array(aliases.into_iter().map(|a| Value::String(a.into())).collect()),
			);
		}
		self
	}
}
