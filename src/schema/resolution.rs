//! Schema resolution: reconciling a writer schema against a reader schema
//! (spec §4.6)
//!
//! Decoding always walks the *writer* schema -- that's what actually
//! describes the bytes on the wire -- but the shape the caller wants back is
//! described by the *reader* schema. [`resolve`] compares the two once,
//! up front, and produces a [`Resolution`] tree that mirrors the writer's
//! structure, annotated with everything the decoder needs to also produce
//! reader-shaped output: promotions, field remaps (by name or alias),
//! injected reader-side defaults, and enum/union fallbacks.

use super::safe::{RegularType, SchemaKey, SchemaMut};
use crate::Error;

/// The result of resolving a writer node against a reader node.
#[derive(Debug, Clone)]
pub enum Resolution {
	/// Writer and reader agree on the underlying type exactly; no
	/// conversion needed.
	Same,
	/// The writer's type is promotable to the reader's wider type (spec
	/// §4.6, "Numeric promotion").
	Promoted(Promotion),
	/// `array`: resolve the writer's item schema against the reader's item
	/// schema.
	Array(Box<Resolution>),
	/// `map`: resolve the writer's value schema against the reader's value
	/// schema.
	Map(Box<Resolution>),
	/// `record`: see [`RecordResolution`].
	Record(RecordResolution),
	/// `enum`: see [`EnumResolution`].
	Enum(EnumResolution),
	/// `fixed`: matched by name and size, no further resolution needed.
	Fixed,
	/// The writer wrote one of several possible types; see
	/// [`UnionResolution`].
	WriterUnion(UnionResolution),
	/// The writer wrote a concrete (non-union) type, but the reader
	/// declares a union; holds the resolution against whichever reader
	/// branch matched first.
	ReaderUnion(ReaderUnionResolution),
}

/// Component of [`Resolution::ReaderUnion`]
#[derive(Debug, Clone)]
pub struct ReaderUnionResolution {
	/// The union key (spec GLOSSARY) of the reader branch that matched
	pub branch_key: String,
	/// The resolution of the writer's concrete type against that branch
	pub resolution: Box<Resolution>,
}

/// A numeric or string/bytes promotion applied while decoding (spec §4.6)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Promotion {
	/// `int` -> `long`
	IntToLong,
	/// `int` -> `float`
	IntToFloat,
	/// `int` -> `double`
	IntToDouble,
	/// `long` -> `float`
	LongToFloat,
	/// `long` -> `double`
	LongToDouble,
	/// `float` -> `double`
	FloatToDouble,
	/// `string` -> `bytes`
	StringToBytes,
	/// `bytes` -> `string`
	BytesToString,
}

/// Per-field resolution plan for a `record` (spec §4.6, field add/remove/rename)
#[derive(Debug, Clone)]
pub struct RecordResolution {
	/// The reader record node this was resolved against, so the decoder can
	/// look up reader field names/types/defaults without re-walking the
	/// reader schema itself.
	pub reader_key: SchemaKey,
	/// One entry per writer field, in writer-declared order: how to handle
	/// the value the decoder just read off the wire for that field.
	pub writer_fields: Vec<WriterFieldResolution>,
	/// Reader fields that the writer never wrote at all, and so must be
	/// populated from the reader's own declared default.
	pub reader_only_defaults: Vec<ReaderOnlyField>,
}

/// Component of [`RecordResolution`]
#[derive(Debug, Clone)]
pub struct WriterFieldResolution {
	/// Index into the writer record's `fields`
	pub writer_index: usize,
	/// Where (if anywhere) this writer field's value should land in the
	/// reader's shape.
	pub target: WriterFieldTarget,
}

/// Component of [`WriterFieldResolution`]
#[derive(Debug, Clone)]
pub enum WriterFieldTarget {
	/// The reader declares a field (possibly under a different name, via
	/// alias) matching this writer field; resolve its value and keep it,
	/// under the reader's field name.
	Keep {
		/// Index into the reader record's `fields`
		reader_index: usize,
		/// How to resolve the field's value itself
		resolution: Box<Resolution>,
	},
	/// The reader does not declare this field (or an alias matching it);
	/// its value must still be read off the wire to stay in sync with the
	/// byte stream, then discarded.
	Drop,
}

/// Component of [`RecordResolution`]: a reader field the writer never wrote
#[derive(Debug, Clone)]
pub struct ReaderOnlyField {
	/// Index into the reader record's `fields`
	pub reader_index: usize,
}

/// Per-symbol resolution plan for an `enum` (spec §4.6)
#[derive(Debug, Clone)]
pub struct EnumResolution {
	/// The reader enum node this was resolved against, so the decoder can
	/// fetch its declared symbols/default without re-walking the reader
	/// schema.
	pub reader_key: SchemaKey,
	/// Indexed by writer symbol index: the corresponding reader symbol
	/// index, or `None` if the writer's symbol isn't declared by the
	/// reader (in which case the reader's own declared default symbol is
	/// substituted at decode time; it is a [`Error::SchemaIncompatible`]
	/// for this to happen if the reader has no default).
	pub writer_symbol_to_reader: Vec<Option<usize>>,
}

/// Resolution plan for a `union` written by the writer (spec §4.6)
#[derive(Debug, Clone)]
pub struct UnionResolution {
	/// Indexed by writer branch index: the resolution to use if the
	/// decoder reads that branch's tag off the wire.
	pub writer_branches: Vec<Resolution>,
}

/// Resolve `writer` against `reader`, producing a tree the decoder can walk
/// alongside the bytes it reads.
pub fn resolve(writer: &SchemaMut, reader: &SchemaMut) -> crate::Result<Resolution> {
	resolve_keys(writer, SchemaKey::root(), reader, SchemaKey::root())
}

fn resolve_keys(
	writer: &SchemaMut,
	writer_key: SchemaKey,
	reader: &SchemaMut,
	reader_key: SchemaKey,
) -> crate::Result<Resolution> {
	let writer_type = &writer[writer_key].type_;

	// A writer union resolves each of its branches independently against
	// the (possibly non-union) reader.
	if let RegularType::Union(union) = writer_type {
		let mut branches = Vec::with_capacity(union.variants.len());
		for &variant in &union.variants {
			branches.push(resolve_keys(writer, variant, reader, reader_key)?);
		}
		return Ok(Resolution::WriterUnion(UnionResolution {
			writer_branches: branches,
		}));
	}

	// A reader union wraps a concrete writer type: find the first reader
	// branch the writer's type resolves against.
	if let RegularType::Union(union) = &reader[reader_key].type_ {
		for &variant in &union.variants {
			if let Ok(resolution) = resolve_keys(writer, writer_key, reader, variant) {
				return Ok(Resolution::ReaderUnion(ReaderUnionResolution {
					branch_key: reader[variant].type_.union_key().to_owned(),
					resolution: Box::new(resolution),
				}));
			}
		}
		return Err(Error::schema_incompatible(
			"writer type does not resolve against any branch of the reader union",
		));
	}

	match (writer_type, &reader[reader_key].type_) {
		(RegularType::Null, RegularType::Null) => Ok(Resolution::Same),
		(RegularType::Boolean, RegularType::Boolean) => Ok(Resolution::Same),
		(RegularType::Int, RegularType::Int) => Ok(Resolution::Same),
		(RegularType::Int, RegularType::Long) => Ok(Resolution::Promoted(Promotion::IntToLong)),
		(RegularType::Int, RegularType::Float) => Ok(Resolution::Promoted(Promotion::IntToFloat)),
		(RegularType::Int, RegularType::Double) => Ok(Resolution::Promoted(Promotion::IntToDouble)),
		(RegularType::Long, RegularType::Long) => Ok(Resolution::Same),
		(RegularType::Long, RegularType::Float) => Ok(Resolution::Promoted(Promotion::LongToFloat)),
		(RegularType::Long, RegularType::Double) => Ok(Resolution::Promoted(Promotion::LongToDouble)),
		(RegularType::Float, RegularType::Float) => Ok(Resolution::Same),
		(RegularType::Float, RegularType::Double) => Ok(Resolution::Promoted(Promotion::FloatToDouble)),
		(RegularType::Double, RegularType::Double) => Ok(Resolution::Same),
		(RegularType::Bytes, RegularType::Bytes) => Ok(Resolution::Same),
		(RegularType::String, RegularType::String) => Ok(Resolution::Same),
		(RegularType::String, RegularType::Bytes) => Ok(Resolution::Promoted(Promotion::StringToBytes)),
		(RegularType::Bytes, RegularType::String) => Ok(Resolution::Promoted(Promotion::BytesToString)),
		(RegularType::Array(w), RegularType::Array(r)) => Ok(Resolution::Array(Box::new(resolve_keys(
			writer, w.items, reader, r.items,
		)?))),
		(RegularType::Map(w), RegularType::Map(r)) => Ok(Resolution::Map(Box::new(resolve_keys(
			writer, w.values, reader, r.values,
		)?))),
		(RegularType::Fixed(w), RegularType::Fixed(r)) => {
			if w.size == r.size && names_match(w.name.fully_qualified_name(), &w.aliases, r.name.fully_qualified_name())
			{
				Ok(Resolution::Fixed)
			} else {
				Err(Error::schema_incompatible(format_args!(
					"fixed {} (size {}) does not resolve against fixed {} (size {})",
					w.name, w.size, r.name, r.size
				)))
			}
		}
		(RegularType::Enum(w), RegularType::Enum(r)) => {
			if !names_match(w.name.fully_qualified_name(), &w.aliases, r.name.fully_qualified_name()) {
				return Err(Error::schema_incompatible(format_args!(
					"enum {} does not resolve against enum {}",
					w.name, r.name
				)));
			}
			let mut writer_symbol_to_reader = Vec::with_capacity(w.symbols.len());
			for symbol in &w.symbols {
				let reader_index = r.symbols.iter().position(|s| s == symbol);
				if reader_index.is_none() {
					if r.default.is_none() {
						return Err(Error::schema_incompatible(format_args!(
							"writer symbol {symbol:?} is not declared by reader enum {} and it has no default",
							r.name
						)));
					}
					tracing::debug!(
						symbol = %symbol,
						reader_enum = %r.name,
						"writer enum symbol not declared by reader, will fall back to reader default at decode time"
					);
				}
				writer_symbol_to_reader.push(reader_index);
			}
			Ok(Resolution::Enum(EnumResolution {
				reader_key,
				writer_symbol_to_reader,
			}))
		}
		(RegularType::Record(w), RegularType::Record(r)) => {
			if !names_match(w.name.fully_qualified_name(), &w.aliases, r.name.fully_qualified_name()) {
				return Err(Error::schema_incompatible(format_args!(
					"record {} does not resolve against record {}",
					w.name, r.name
				)));
			}
			let mut writer_fields = Vec::with_capacity(w.fields.len());
			let mut matched_reader_fields = vec![false; r.fields.len()];
			for (writer_index, wf) in w.fields.iter().enumerate() {
				let reader_index = r
					.fields
					.iter()
					.position(|rf| rf.name == wf.name || rf.aliases.iter().any(|a| a == &wf.name));
				let target = match reader_index {
					Some(reader_index) => {
						matched_reader_fields[reader_index] = true;
						let resolution = resolve_keys(writer, wf.type_, reader, r.fields[reader_index].type_)?;
						WriterFieldTarget::Keep {
							reader_index,
							resolution: Box::new(resolution),
						}
					}
					None => WriterFieldTarget::Drop,
				};
				writer_fields.push(WriterFieldResolution { writer_index, target });
			}
			let mut reader_only_defaults = Vec::new();
			for (reader_index, matched) in matched_reader_fields.iter().enumerate() {
				if !matched {
					if r.fields[reader_index].default.is_none() {
						return Err(Error::schema_incompatible(format_args!(
							"reader field {:?} of record {} has no default and was not written",
							r.fields[reader_index].name, r.name
						)));
					}
					reader_only_defaults.push(ReaderOnlyField { reader_index });
				}
			}
			Ok(Resolution::Record(RecordResolution {
				reader_key,
				writer_fields,
				reader_only_defaults,
			}))
		}
		(w, r) => Err(Error::schema_incompatible(format_args!(
			"writer type {:?} does not resolve against reader type {:?}",
			w.union_key(),
			r.union_key()
		))),
	}
}

fn names_match(writer_name: &str, writer_aliases: &[String], reader_name: &str) -> bool {
	writer_name == reader_name || writer_aliases.iter().any(|a| a == reader_name)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::str::FromStr;

	#[test]
	fn int_promotes_to_long() {
		let w = SchemaMut::from_str(r#""int""#).unwrap();
		let r = SchemaMut::from_str(r#""long""#).unwrap();
		assert!(matches!(
			resolve(&w, &r).unwrap(),
			Resolution::Promoted(Promotion::IntToLong)
		));
	}

	#[test]
	fn missing_reader_field_needs_default() {
		let w = SchemaMut::from_str(r#"{"type":"record","name":"R","fields":[{"name":"a","type":"int"}]}"#).unwrap();
		let r = SchemaMut::from_str(
			r#"{"type":"record","name":"R","fields":[{"name":"a","type":"int"},{"name":"b","type":"int","default":0}]}"#,
		)
		.unwrap();
		match resolve(&w, &r).unwrap() {
			Resolution::Record(rr) => assert_eq!(rr.reader_only_defaults.len(), 1),
			_ => panic!("expected record resolution"),
		}
	}

	#[test]
	fn reader_field_without_default_is_incompatible() {
		let w = SchemaMut::from_str(r#"{"type":"record","name":"R","fields":[{"name":"a","type":"int"}]}"#).unwrap();
		let r = SchemaMut::from_str(
			r#"{"type":"record","name":"R","fields":[{"name":"a","type":"int"},{"name":"b","type":"int"}]}"#,
		)
		.unwrap();
		assert!(resolve(&w, &r).is_err());
	}

	#[test]
	fn extra_writer_field_is_dropped() {
		let w = SchemaMut::from_str(
			r#"{"type":"record","name":"R","fields":[{"name":"a","type":"int"},{"name":"b","type":"int"}]}"#,
		)
		.unwrap();
		let r = SchemaMut::from_str(r#"{"type":"record","name":"R","fields":[{"name":"a","type":"int"}]}"#).unwrap();
		match resolve(&w, &r).unwrap() {
			Resolution::Record(rr) => {
				assert!(matches!(rr.writer_fields[1].target, WriterFieldTarget::Drop));
			}
			_ => panic!("expected record resolution"),
		}
	}

	#[test]
	fn enum_falls_back_to_reader_default() {
		let w = SchemaMut::from_str(r#"{"type":"enum","name":"E","symbols":["A","B"]}"#).unwrap();
		let r = SchemaMut::from_str(r#"{"type":"enum","name":"E","symbols":["A"],"default":"A"}"#).unwrap();
		match resolve(&w, &r).unwrap() {
			Resolution::Enum(er) => assert_eq!(er.writer_symbol_to_reader, vec![Some(0), None]),
			_ => panic!("expected enum resolution"),
		}
	}
}
