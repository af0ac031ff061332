//! The generic ("any") Avro value, used for schemaless-shaped decode/encode
//!
//! This is the "untyped receiver" design note from spec §9: a generic
//! decode target that carries no static type information of its own, and
//! the generic source that [`Type Converter Hooks`](crate::codec::converter)
//! operate on.

use std::collections::BTreeMap;

/// A decoded (or to-be-encoded) Avro value with no attached schema
///
/// Records decode to [`Value::Map`] (field name → value); unions decode to
/// [`Value::Union`], tagged by their union key (spec GLOSSARY); `null`
/// decodes to [`Value::Null`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	/// `null`
	Null,
	/// `boolean`
	Boolean(bool),
	/// `int` (32-bit) or a promotable source for `long`/`float`/`double`
	Int(i32),
	/// `long`
	Long(i64),
	/// `float`
	Float(f32),
	/// `double`
	Double(f64),
	/// `bytes`, `fixed`, or a base representation for logical types
	/// (`decimal`, `duration`)
	Bytes(Vec<u8>),
	/// `string`, or a base representation for `uuid`
	String(String),
	/// `array`
	Array(Vec<Value>),
	/// `map`, and the generic decode of `record` (field name → value, in
	/// declared field order)
	Map(Vec<(String, Value)>),
	/// `enum`, decoded to its symbol name
	Enum(String),
	/// A decoded union: the selected branch's union key, plus its value
	Union(Box<UnionValue>),
}

/// Component of [`Value::Union`]
#[derive(Debug, Clone, PartialEq)]
pub struct UnionValue {
	/// The union key (spec GLOSSARY) of the branch that was selected
	pub key: String,
	/// The value carried by that branch
	pub value: Value,
}

impl Value {
	/// Build a [`Value::Union`] from a key and inner value
	pub fn union(key: impl Into<String>, value: Value) -> Value {
		Value::Union(Box::new(UnionValue {
			key: key.into(),
			value,
		}))
	}

	/// `true` if this is [`Value::Null`]
	pub fn is_null(&self) -> bool {
		matches!(self, Value::Null)
	}

	/// View a [`Value::Map`] as a lookup table, for convenience when reading
	/// decoded records
	pub fn as_map(&self) -> Option<&[(String, Value)]> {
		match self {
			Value::Map(fields) => Some(fields),
			_ => None,
		}
	}

	/// Look up a field of a decoded record ([`Value::Map`]) by name
	pub fn field(&self, name: &str) -> Option<&Value> {
		self.as_map()?.iter().find(|(k, _)| k == name).map(|(_, v)| v)
	}
}

impl From<BTreeMap<String, Value>> for Value {
	fn from(map: BTreeMap<String, Value>) -> Self {
		Value::Map(map.into_iter().collect())
	}
}

impl From<()> for Value {
	fn from((): ()) -> Self {
		Value::Null
	}
}
macro_rules! impl_from {
	($($ty:ty => $variant:ident $(via $conv:expr)?;)*) => {
		$(
			impl From<$ty> for Value {
				fn from(v: $ty) -> Self {
					$(let v = ($conv)(v);)?
					Value::$variant(v.into())
				}
			}
		)*
	};
}
impl_from! {
	bool => Boolean;
	i32 => Int;
	i64 => Long;
	f32 => Float;
	f64 => Double;
	Vec<u8> => Bytes;
	String => String;
	Vec<Value> => Array;
}
impl From<&str> for Value {
	fn from(v: &str) -> Self {
		Value::String(v.to_owned())
	}
}
impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(v: Option<T>) -> Self {
		match v {
			None => Value::Null,
			Some(v) => v.into(),
		}
	}
}
