//! Union key computation and uniqueness enforcement (spec §3.2.3, §4.2 step 6)

use super::safe::{RegularType, SchemaMut, Union};
use crate::Error;

/// Check that every variant of `union` has a distinct union key: the
/// primitive type name for primitives, the fully qualified name for named
/// types, and the bare keyword (`array`/`map`) for those -- notably a union
/// may not contain two `array`s, two `map`s, or two branches of the same
/// named type (spec §3.2.3), nor two anonymous unions (unions may not
/// directly contain another union at all, handled separately at parse
/// time).
pub(crate) fn check_unique_keys(schema: &SchemaMut, union: &Union) -> crate::Result<()> {
	let mut seen: Vec<&str> = Vec::with_capacity(union.variants.len());
	for &variant in &union.variants {
		let node = &schema[variant];
		if let RegularType::Union(_) = &node.type_ {
			return Err(Error::schema_parse("unions may not immediately contain other unions"));
		}
		let key = node.type_.union_key();
		if seen.contains(&key) {
			return Err(Error::schema_parse(format_args!(
				"union contains more than one branch with key {key:?}"
			)));
		}
		seen.push(key);
	}
	Ok(())
}
