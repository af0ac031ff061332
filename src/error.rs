//! The crate-wide error type
//!
//! Every fallible operation in this crate returns [`Result<T>`], whose error
//! variant is one of the kinds enumerated here. See spec §7 for the intent
//! behind each kind.

/// Convenience alias used throughout this crate
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Any error that this crate may produce
#[derive(thiserror::Error, Debug)]
pub enum Error {
	/// The schema's JSON source was malformed, referenced an unknown
	/// primitive/logical type name, contained an invalid identifier, a
	/// duplicate full name, an unresolvable reference, a malformed union, or
	/// a default value that didn't match its field's schema.
	#[error("Failed to parse schema: {0}")]
	SchemaParse(String),

	/// Resolution between a writer schema and a reader schema failed (spec
	/// §4.6): the two schemas are not compatible.
	#[error("Writer and reader schemas are incompatible: {0}")]
	SchemaIncompatible(String),

	/// A varint was too long, an integer value didn't fit in its target
	/// range, or a recursion/nesting depth limit was exceeded.
	#[error("Overflow: {0}")]
	Overflow(String),

	/// A `bytes`/`string` length exceeded the configured maximum
	/// (`Config::max_byte_slice_size`).
	#[error("Size limit exceeded: requested {requested} bytes, limit is {limit}")]
	SizeLimit {
		/// The size that was requested
		requested: u64,
		/// The configured limit that was exceeded
		limit: u64,
	},

	/// A value did not match the shape its schema required (e.g. encoding a
	/// float where an int was expected, or a record missing a required
	/// field).
	#[error("Type mismatch: {0}")]
	TypeMismatch(String),

	/// A union branch could not be unambiguously selected for a value at
	/// encode time (spec §4.7).
	#[error("Ambiguous union branch: {0}")]
	UnionAmbiguous(String),

	/// An enum symbol was not declared by the schema (encode), or was
	/// dropped by the writer and has no resolvable default (decode after
	/// resolution).
	#[error("Unknown enum symbol: {0}")]
	UnknownEnumSymbol(String),

	/// The underlying byte source/sink failed.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// A user-supplied [`TypeConverter`](crate::codec::converter::TypeConverter)
	/// hook returned an error.
	#[error("Type converter hook failed: {0}")]
	UserHook(String),
}

impl Error {
	pub(crate) fn schema_parse(msg: impl std::fmt::Display) -> Self {
		Error::SchemaParse(msg.to_string())
	}
	pub(crate) fn schema_incompatible(msg: impl std::fmt::Display) -> Self {
		Error::SchemaIncompatible(msg.to_string())
	}
	pub(crate) fn overflow(msg: impl std::fmt::Display) -> Self {
		Error::Overflow(msg.to_string())
	}
	pub(crate) fn type_mismatch(msg: impl std::fmt::Display) -> Self {
		Error::TypeMismatch(msg.to_string())
	}
	pub(crate) fn union_ambiguous(msg: impl std::fmt::Display) -> Self {
		Error::UnionAmbiguous(msg.to_string())
	}
	pub(crate) fn unknown_enum_symbol(msg: impl std::fmt::Display) -> Self {
		Error::UnknownEnumSymbol(msg.to_string())
	}
}

impl serde::de::Error for Error {
	fn custom<T: std::fmt::Display>(msg: T) -> Self {
		Error::schema_parse(msg)
	}
}
