//! Name Resolver: a pluggable lookup from a fully qualified type name to the
//! schema node it identifies
//!
//! [`SchemaMut`] itself doesn't retain a persistent name index after parsing
//! (the builder's registry is scratch data, thrown away once every
//! reference has been resolved to a [`SchemaKey`]). Anything that needs to
//! look a type up by name *after* parsing -- schema resolution matching a
//! reader's named type against a writer's (spec §4.6), or a union branch
//! picked by name at encode time -- goes through a [`NameResolver`] built on
//! demand instead.

use super::safe::{RegularType, SchemaMut, SchemaNode};
use hashbrown::HashMap;

/// A lookup from a fully qualified name (or alias) to the node that
/// declares it.
pub trait NameResolver {
	/// Resolve a fully qualified name to the node that declares it, if any.
	fn resolve(&self, fully_qualified_name: &str) -> Option<&SchemaNode>;
}

/// The default [`NameResolver`]: a flat table built once by scanning every
/// named node in a schema, indexing both its primary name and all of its
/// aliases.
pub struct FlatNameResolver<'schema> {
	schema: &'schema SchemaMut,
	by_name: HashMap<&'schema str, usize>,
}

impl<'schema> FlatNameResolver<'schema> {
	/// Build a resolver over every named type declared in `schema`.
	pub fn build(schema: &'schema SchemaMut) -> Self {
		let mut by_name = HashMap::new();
		for (idx, node) in schema.nodes().iter().enumerate() {
			let aliases: &[String] = match &node.type_ {
				RegularType::Record(r) => &r.aliases,
				RegularType::Enum(e) => &e.aliases,
				RegularType::Fixed(f) => &f.aliases,
				_ => continue,
			};
			if let Some(name) = node.type_.name() {
				by_name.insert(name.fully_qualified_name(), idx);
			}
			for alias in aliases {
				by_name.entry(alias.as_str()).or_insert(idx);
			}
		}
		Self { schema, by_name }
	}
}

impl NameResolver for FlatNameResolver<'_> {
	fn resolve(&self, fully_qualified_name: &str) -> Option<&SchemaNode> {
		self.by_name.get(fully_qualified_name).map(|&idx| &self.schema.nodes()[idx])
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::str::FromStr;

	#[test]
	fn resolves_by_primary_name_and_alias() {
		let schema = SchemaMut::from_str(
			r#"{
				"type": "record",
				"name": "Event",
				"aliases": ["OldEvent"],
				"fields": []
			}"#,
		)
		.unwrap();
		let resolver = FlatNameResolver::build(&schema);
		assert!(resolver.resolve("Event").is_some());
		assert!(resolver.resolve("OldEvent").is_some());
		assert!(resolver.resolve("Nope").is_none());
	}
}
