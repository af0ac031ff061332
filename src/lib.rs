//! # Getting started
//!
//! ```
//! let schema = avro_core::Schema::parse_str(
//! 	r#"{"type":"record","name":"Test","fields":[{"name":"field","type":"string"}]}"#,
//! )
//! .expect("failed to parse schema");
//!
//! let value = avro_core::Value::Map(vec![("field".into(), "foo".into())]);
//!
//! let datum = avro_core::marshal(&schema, &value).expect("failed to encode");
//! assert_eq!(datum, &[6, 102, 111, 111]);
//!
//! assert_eq!(avro_core::unmarshal(&schema, &datum).expect("failed to decode"), value);
//! ```
//!
//! # Schema resolution
//!
//! A datum written per one schema (the writer) can be read back shaped like
//! a different, compatible schema (the reader):
//!
//! ```
//! use avro_core::codec::{CodecCache, Decoder};
//!
//! let writer = avro_core::Schema::parse_str(r#""int""#).unwrap();
//! let reader = avro_core::Schema::parse_str(r#""long""#).unwrap();
//!
//! let datum = avro_core::marshal(&writer, &avro_core::Value::Int(3)).unwrap();
//!
//! let cache = CodecCache::new();
//! let mut decoder = Decoder::for_writer_reader(writer, reader, datum.as_slice(), &cache).unwrap();
//! assert_eq!(decoder.decode().unwrap(), avro_core::Value::Long(3));
//! ```

#![deny(unsafe_code)]

pub mod codec;
pub mod config;
pub mod error;
pub mod object_container_file;
pub mod schema;
pub mod single_object_encoding;
pub mod value;

pub use config::Config;
pub use error::{Error, Result};
pub use schema::Schema;
pub use value::Value;

pub use codec::{marshal, unmarshal, CodecCache, Decoder, Encoder};

/// Parse a JSON schema document (spec §6.3, `parse_schema`).
///
/// See [`Schema::parse_str`] for the underlying implementation; this is
/// simply the free-function form some callers find more idiomatic at an
/// import site.
pub fn parse_schema(text: &str) -> Result<Schema> {
	Schema::parse_str(text)
}

/// Parse several JSON schema documents, in order, resolving references
/// across them as they're encountered (spec §6.3, `parse_files`).
///
/// Every file is parsed into a shared cache of named schemas, so a later
/// file may reference a named type an earlier one defined. The last file's
/// schema is returned.
pub fn parse_files(paths: &[impl AsRef<std::path::Path>]) -> Result<Schema> {
	let mut cache = schema::safe::NameCache::new();
	let mut last = None;
	for path in paths {
		let text = std::fs::read_to_string(path)
			.map_err(|e| Error::schema_parse(format_args!("failed to read {:?}: {e}", path.as_ref())))?;
		let parsed = schema::safe::SchemaMut::from_str_with_cache(&text, &mut cache)?;
		last = Some(Schema::from_parsed(parsed, &text)?);
	}
	last.ok_or_else(|| Error::schema_parse("parse_files called with no paths"))
}
