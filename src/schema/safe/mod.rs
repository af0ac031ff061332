//! The editable, arena-based representation of an Avro schema
//!
//! Because of how referencing via
//! [Names](https://avro.apache.org/docs/current/specification/#names) works
//! in Avro, the most natural representation of a schema is not a tree but a
//! possibly-cyclic directed graph. We represent that as a flat `Vec` of
//! [`SchemaNode`]s (the arena), with edges between nodes expressed as
//! [`SchemaKey`] (a plain index). This is also what gives a [`Schema`]
//! (spec §3.3) its lifecycle: nodes are pushed once during parsing/building
//! and never moved afterwards, so a `SchemaKey` stays valid for the life of
//! the arena and a [`Reference`](RegularType) never needs to own what it
//! points to.

pub(crate) mod canonical_form;
pub(crate) mod check_cycles;
mod parsing;

use super::name::Name;

pub use check_cycles::UnconditionalCycle;
pub(crate) use parsing::NameCache;

/// An editable representation of an Avro schema
///
/// [`SchemaKey`]s index into this arena. The first node (index `0`) is
/// always the root of the schema.
#[derive(Clone, Debug, Default)]
pub struct SchemaMut {
	nodes: Vec<SchemaNode>,
}

impl SchemaMut {
	/// Obtain the underlying graph storage
	pub fn nodes(&self) -> &[SchemaNode] {
		&self.nodes
	}

	/// Obtain the underlying graph storage mutably
	pub fn nodes_mut(&mut self) -> &mut Vec<SchemaNode> {
		&mut self.nodes
	}

	/// Initialize a [`SchemaMut`] from a set of nodes. The first node (index
	/// `0`) is the root.
	pub fn from_nodes(nodes: Vec<SchemaNode>) -> Self {
		Self { nodes }
	}

	/// The root node of the schema (index `0`)
	///
	/// # Panics
	/// If the arena is empty.
	pub fn root(&self) -> &SchemaNode {
		self.nodes
			.first()
			.expect("Schema should have at least one node (the root)")
	}

	/// Try to get the node at the given [`SchemaKey`]
	pub fn get(&self, key: SchemaKey) -> Option<&SchemaNode> {
		self.nodes.get(key.idx)
	}

	/// Turn this [`SchemaMut`] into an immutable, shareable
	/// [`Schema`](crate::Schema)
	pub fn freeze(self) -> crate::Result<super::Schema> {
		self.try_into()
	}
}

impl std::ops::Index<SchemaKey> for SchemaMut {
	type Output = SchemaNode;
	fn index(&self, key: SchemaKey) -> &Self::Output {
		&self.nodes[key.idx]
	}
}

impl std::str::FromStr for SchemaMut {
	type Err = crate::Error;
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		parsing::parse(s)
	}
}

impl SchemaMut {
	/// Parse a document against a [`NameCache`] shared across several calls,
	/// so a named type this document references can have been defined by an
	/// earlier call instead of this one (spec §6.3 `parse_files`).
	pub(crate) fn from_str_with_cache(s: &str, cache: &mut NameCache) -> crate::Result<Self> {
		parsing::parse_with_cache(s, cache)
	}
}

/// The location of a node in a [`SchemaMut`]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SchemaKey {
	pub(crate) idx: usize,
}
impl SchemaKey {
	/// Construct a `SchemaKey` from a raw arena index
	pub const fn from_idx(idx: usize) -> Self {
		Self { idx }
	}
	/// The raw arena index this key refers to
	pub const fn idx(self) -> usize {
		self.idx
	}
	/// The root of any [`SchemaMut`] is always at index `0`
	pub const fn root() -> Self {
		Self { idx: 0 }
	}
}
impl std::fmt::Debug for SchemaKey {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		std::fmt::Debug::fmt(&self.idx, f)
	}
}

/// A node of an avro schema, stored in a [`SchemaMut`]
#[derive(Clone, Debug)]
pub struct SchemaNode {
	/// The underlying Avro type of this node
	pub type_: RegularType,
	/// Logical type this node is annotated with, if any and if valid (spec
	/// §4.2 step 7: a logical type whose constraints are violated is
	/// dropped silently, its attributes surviving only in `properties`)
	pub logical_type: Option<LogicalType>,
	/// Doc string, if any (not semantically meaningful, carried for
	/// round-tripping JSON schema text)
	pub doc: Option<String>,
	/// Free-form JSON properties that aren't one of the reserved keywords
	/// this crate understands
	pub properties: Vec<(String, serde_json::Value)>,
}

impl From<RegularType> for SchemaNode {
	fn from(type_: RegularType) -> Self {
		Self {
			type_,
			logical_type: None,
			doc: None,
			properties: Vec::new(),
		}
	}
}

/// The underlying (non-logical) Avro type of a [`SchemaNode`]
#[derive(Clone, Debug)]
pub enum RegularType {
	/// `null`
	Null,
	/// `boolean`
	Boolean,
	/// `int`
	Int,
	/// `long`
	Long,
	/// `float`
	Float,
	/// `double`
	Double,
	/// `bytes`
	Bytes,
	/// `string`
	String,
	/// `array`
	Array(Array),
	/// `map`
	Map(Map),
	/// `union`
	Union(Union),
	/// `record` (or `error`, see [`Record::is_error`])
	Record(Record),
	/// `enum`
	Enum(Enum),
	/// `fixed`
	Fixed(Fixed),
}

impl RegularType {
	/// The union key (spec GLOSSARY) that identifies this type as a
	/// variant of a union: the primitive type name, or the fully qualified
	/// name for named types.
	pub(crate) fn union_key(&self) -> &str {
		match self {
			RegularType::Null => "null",
			RegularType::Boolean => "boolean",
			RegularType::Int => "int",
			RegularType::Long => "long",
			RegularType::Float => "float",
			RegularType::Double => "double",
			RegularType::Bytes => "bytes",
			RegularType::String => "string",
			RegularType::Array(_) => "array",
			RegularType::Map(_) => "map",
			RegularType::Union(_) => "union",
			RegularType::Record(r) => r.name.fully_qualified_name(),
			RegularType::Enum(e) => e.name.fully_qualified_name(),
			RegularType::Fixed(f) => f.name.fully_qualified_name(),
		}
	}

	/// If this is a named type, its [`Name`]
	pub fn name(&self) -> Option<&Name> {
		match self {
			RegularType::Record(r) => Some(&r.name),
			RegularType::Enum(e) => Some(&e.name),
			RegularType::Fixed(f) => Some(&f.name),
			_ => None,
		}
	}
}

/// Component of [`RegularType::Array`]
#[derive(Clone, Debug)]
pub struct Array {
	/// The schema of every item in the array
	pub items: SchemaKey,
}

/// Component of [`RegularType::Map`]
///
/// Avro map keys are always strings.
#[derive(Clone, Debug)]
pub struct Map {
	/// The schema of every value in the map
	pub values: SchemaKey,
}

/// Component of [`RegularType::Union`]
#[derive(Clone, Debug)]
pub struct Union {
	/// The schema of every variant of the union, in declared order
	pub variants: Vec<SchemaKey>,
}

/// Component of [`RegularType::Record`]
#[derive(Clone, Debug)]
pub struct Record {
	/// The fully qualified name of the record
	pub name: Name,
	/// Alternate fully qualified names this record may also be matched
	/// against during schema resolution (spec §4.6)
	pub aliases: Vec<String>,
	/// The fields of the record, in declared order
	pub fields: Vec<RecordField>,
	/// Whether this is an `error` record (Avro protocol error types). Codec
	/// behavior is identical to a plain record (spec §9).
	pub is_error: bool,
}

/// Component of [`Record`]
#[derive(Clone, Debug)]
pub struct RecordField {
	/// The field's name
	pub name: String,
	/// Alternate names this field may also be matched against when
	/// resolving a writer field by its reader-side renamed counterpart
	/// (spec §4.6, "Field rename")
	pub aliases: Vec<String>,
	/// The schema of this field's value
	pub type_: SchemaKey,
	/// The field's default value, as parsed JSON, if any. Validated against
	/// `type_` at parse time (spec §4.3).
	pub default: Option<serde_json::Value>,
	/// Doc string for the field, if any
	pub doc: Option<String>,
	/// Free-form JSON properties on the field that aren't one of the
	/// reserved keywords this crate understands
	pub properties: Vec<(String, serde_json::Value)>,
}

/// Component of [`RegularType::Enum`]
#[derive(Clone, Debug)]
pub struct Enum {
	/// The fully qualified name of the enum
	pub name: Name,
	/// Alternate fully qualified names (spec §4.6)
	pub aliases: Vec<String>,
	/// The symbols of the enum, in declared order
	pub symbols: Vec<String>,
	/// The default symbol, used when resolving against a writer schema that
	/// wrote a symbol this reader doesn't declare (spec §4.6)
	pub default: Option<String>,
}

/// Component of [`RegularType::Fixed`]
#[derive(Clone, Debug)]
pub struct Fixed {
	/// The fully qualified name of the fixed type
	pub name: Name,
	/// Alternate fully qualified names (spec §4.6)
	pub aliases: Vec<String>,
	/// The size, in bytes, of values of this type
	pub size: usize,
}

/// A logical type overlaid on a [`SchemaNode`]'s base [`RegularType`]
/// (spec §3.1)
#[derive(Clone, Debug)]
pub enum LogicalType {
	/// `decimal`, annotating `bytes` or `fixed`
	Decimal(Decimal),
	/// `uuid`, annotating `string`
	Uuid,
	/// `date`, annotating `int`
	Date,
	/// `time-millis`, annotating `int`
	TimeMillis,
	/// `time-micros`, annotating `long`
	TimeMicros,
	/// `timestamp-millis`, annotating `long`
	TimestampMillis,
	/// `timestamp-micros`, annotating `long`
	TimestampMicros,
	/// `local-timestamp-millis`, annotating `long`
	LocalTimestampMillis,
	/// `local-timestamp-micros`, annotating `long`
	LocalTimestampMicros,
	/// `duration`, annotating a `fixed` of size 12
	Duration,
	/// A logical type this crate doesn't know about
	Unknown(UnknownLogicalType),
}

impl LogicalType {
	/// The name of the logical type as it appears in schema JSON
	pub fn as_str(&self) -> &str {
		match self {
			LogicalType::Decimal(_) => "decimal",
			LogicalType::Uuid => "uuid",
			LogicalType::Date => "date",
			LogicalType::TimeMillis => "time-millis",
			LogicalType::TimeMicros => "time-micros",
			LogicalType::TimestampMillis => "timestamp-millis",
			LogicalType::TimestampMicros => "timestamp-micros",
			LogicalType::LocalTimestampMillis => "local-timestamp-millis",
			LogicalType::LocalTimestampMicros => "local-timestamp-micros",
			LogicalType::Duration => "duration",
			LogicalType::Unknown(u) => &u.logical_type_name,
		}
	}
}

/// Component of [`LogicalType::Decimal`]
#[derive(Clone, Debug)]
pub struct Decimal {
	/// Number of significant digits, > 0
	pub precision: usize,
	/// Number of digits to the right of the decimal point, >= 0, defaults
	/// to 0
	pub scale: u32,
}

/// A logical type name this crate doesn't recognize
#[derive(Clone, Debug)]
pub struct UnknownLogicalType {
	/// The name as it appeared in the schema JSON
	pub logical_type_name: String,
}
impl UnknownLogicalType {
	/// Build from the logical type's name
	pub fn new(logical_type_name: impl Into<String>) -> Self {
		Self {
			logical_type_name: logical_type_name.into(),
		}
	}
}

macro_rules! impl_froms {
	($($variant:ident)*) => {
		$(
			impl From<$variant> for RegularType {
				fn from(v: $variant) -> Self {
					RegularType::$variant(v)
				}
			}
			impl From<$variant> for SchemaNode {
				fn from(v: $variant) -> Self {
					RegularType::$variant(v).into()
				}
			}
		)*
	};
}
impl_froms! { Array Map Union Record Enum Fixed }
