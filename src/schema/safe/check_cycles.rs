//! Detection of "unconditional" cycles in a schema graph (spec §4.2 step 8)
//!
//! Avro schemas are allowed to be cyclic (a record referencing itself through
//! a `union` or as the `items`/`values` of an `array`/`map`, since those
//! always have a runtime base case: zero items, or a different union
//! branch). What's *not* allowed is a record whose field is, directly or
//! through a chain of other records, its own type with no intervening
//! array/map/union: encoding such a value would never terminate, since there
//! would be no way to end the recursion.

use super::{RegularType, SchemaKey, SchemaNode};

/// A record participates in a field-type cycle that never passes through an
/// `array`, `map`, or `union`, and so could never terminate at encode time.
#[derive(Debug, Clone)]
pub struct UnconditionalCycle {
	/// The chain of schema nodes (by arena index) that make up the cycle,
	/// starting and ending at the same node.
	pub cycle: Vec<SchemaKey>,
}

impl std::fmt::Display for UnconditionalCycle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "unconditional cycle through nodes ")?;
		for (i, key) in self.cycle.iter().enumerate() {
			if i != 0 {
				write!(f, " -> ")?;
			}
			write!(f, "{}", key.idx())?;
		}
		write!(
			f,
			" (a record field type cycle must pass through an array, map or union)"
		)
	}
}
impl std::error::Error for UnconditionalCycle {}

/// Walk every node of `nodes` looking for an unconditional cycle, per the
/// module doc.
pub(crate) fn check_for_unconditional_cycles(nodes: &[SchemaNode]) -> Result<(), UnconditionalCycle> {
	let mut globally_done = vec![false; nodes.len()];
	for start in 0..nodes.len() {
		if !globally_done[start] {
			let mut stack = Vec::new();
			visit(start, nodes, &mut globally_done, &mut stack)?;
		}
	}
	Ok(())
}

fn visit(
	idx: usize,
	nodes: &[SchemaNode],
	globally_done: &mut [bool],
	stack: &mut Vec<usize>,
) -> Result<(), UnconditionalCycle> {
	if let Some(pos) = stack.iter().position(|&k| k == idx) {
		let mut cycle: Vec<SchemaKey> = stack[pos..].iter().map(|&i| SchemaKey::from_idx(i)).collect();
		cycle.push(SchemaKey::from_idx(idx));
		return Err(UnconditionalCycle { cycle });
	}
	if globally_done[idx] {
		return Ok(());
	}
	match &nodes[idx].type_ {
		RegularType::Record(record) => {
			stack.push(idx);
			for field in &record.fields {
				visit(field.type_.idx(), nodes, globally_done, stack)?;
			}
			stack.pop();
		}
		RegularType::Array(array) => {
			visit(array.items.idx(), nodes, globally_done, &mut Vec::new())?;
		}
		RegularType::Map(map) => {
			visit(map.values.idx(), nodes, globally_done, &mut Vec::new())?;
		}
		RegularType::Union(union) => {
			for &variant in &union.variants {
				visit(variant.idx(), nodes, globally_done, &mut Vec::new())?;
			}
		}
		RegularType::Null
		| RegularType::Boolean
		| RegularType::Int
		| RegularType::Long
		| RegularType::Float
		| RegularType::Double
		| RegularType::Bytes
		| RegularType::String
		| RegularType::Enum(_)
		| RegularType::Fixed(_) => {}
	}
	globally_done[idx] = true;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::schema::safe::{Array, Record, RecordField, Union};

	fn field(name: &str, type_: SchemaKey) -> RecordField {
		RecordField {
			name: name.to_owned(),
			aliases: Vec::new(),
			type_,
			default: None,
			doc: None,
			properties: Vec::new(),
		}
	}

	#[test]
	fn direct_self_reference_is_rejected() {
		// record Node { Node next; }
		let nodes = vec![SchemaNode::from(RegularType::Record(Record {
			name: crate::schema::name::Name::from_fully_qualified_name("Node"),
			aliases: Vec::new(),
			fields: vec![field("next", SchemaKey::from_idx(0))],
			is_error: false,
		}))];
		assert!(check_for_unconditional_cycles(&nodes).is_err());
	}

	#[test]
	fn self_reference_through_union_is_allowed() {
		// record Node { union { null, Node } next; }
		let nodes = vec![
			SchemaNode::from(RegularType::Record(Record {
				name: crate::schema::name::Name::from_fully_qualified_name("Node"),
				aliases: Vec::new(),
				fields: vec![field("next", SchemaKey::from_idx(1))],
				is_error: false,
			})),
			SchemaNode::from(RegularType::Union(Union {
				variants: vec![SchemaKey::from_idx(2), SchemaKey::from_idx(0)],
			})),
			SchemaNode::from(RegularType::Null),
		];
		assert!(check_for_unconditional_cycles(&nodes).is_ok());
	}

	#[test]
	fn self_reference_through_array_is_allowed() {
		// record Node { array<Node> children; }
		let nodes = vec![
			SchemaNode::from(RegularType::Record(Record {
				name: crate::schema::name::Name::from_fully_qualified_name("Node"),
				aliases: Vec::new(),
				fields: vec![field("children", SchemaKey::from_idx(1))],
				is_error: false,
			})),
			SchemaNode::from(RegularType::Array(Array {
				items: SchemaKey::from_idx(0),
			})),
		];
		assert!(check_for_unconditional_cycles(&nodes).is_ok());
	}

	#[test]
	fn indirect_record_chain_is_rejected() {
		// record A { B b; }  record B { A a; }
		let nodes = vec![
			SchemaNode::from(RegularType::Record(Record {
				name: crate::schema::name::Name::from_fully_qualified_name("A"),
				aliases: Vec::new(),
				fields: vec![field("b", SchemaKey::from_idx(1))],
				is_error: false,
			})),
			SchemaNode::from(RegularType::Record(Record {
				name: crate::schema::name::Name::from_fully_qualified_name("B"),
				aliases: Vec::new(),
				fields: vec![field("a", SchemaKey::from_idx(0))],
				is_error: false,
			})),
		];
		assert!(check_for_unconditional_cycles(&nodes).is_err());
	}
}
