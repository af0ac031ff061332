//! Encoder/decoder dispatch, and the public [`Encoder`]/[`Decoder`] wrappers
//! around them (spec §4.5, §6.3)

pub mod converter;
mod decode;
mod encode;
mod read;
mod write;

use crate::schema::resolution::{self, Resolution};
use crate::schema::safe::SchemaKey;
use crate::{Config, Schema, Value};
use converter::ConverterRegistry;
use hashbrown::HashMap;
use std::sync::{Arc, RwLock};

/// Memoizes [`resolution::resolve`] by the pair of the writer's and reader's
/// cache fingerprints (spec §4.5, "memoize"; spec GLOSSARY, "cache
/// fingerprint"), so that repeatedly building a [`Decoder`] for the same
/// writer/reader pair doesn't repeat the O(schema size) resolution walk.
///
/// Shared, read-mostly state (spec §5): concurrent first-time compilations
/// may race, but each produces an equivalent [`Resolution`], so the last
/// writer simply wins.
#[derive(Default)]
pub struct CodecCache {
	resolutions: RwLock<HashMap<([u8; 32], [u8; 32]), Arc<Resolution>>>,
}

impl CodecCache {
	/// An empty cache.
	pub fn new() -> Self {
		Self::default()
	}

	fn resolve(&self, writer: &Schema, reader: &Schema) -> crate::Result<Arc<Resolution>> {
		let key = (writer.cache_fingerprint(), reader.cache_fingerprint());
		if let Some(resolution) = self.resolutions.read().unwrap().get(&key) {
			tracing::trace!("codec cache hit");
			return Ok(Arc::clone(resolution));
		}
		tracing::debug!("codec cache miss, resolving writer schema against reader schema");
		let resolution = Arc::new(resolution::resolve(writer.as_schema_mut(), reader.as_schema_mut())?);
		self.resolutions.write().unwrap().insert(key, Arc::clone(&resolution));
		Ok(resolution)
	}
}

/// Encodes [`Value`]s against a fixed schema, onto a byte sink (spec §6.3,
/// `new_encoder`).
pub struct Encoder<W> {
	schema: Schema,
	sink: W,
	config: Config,
	converters: ConverterRegistry,
}

impl<W: std::io::Write> Encoder<W> {
	/// Build an encoder writing datums shaped like `schema` to `sink`, with
	/// the default configuration and converter registry.
	pub fn new(schema: Schema, sink: W) -> Self {
		Self::with_config(schema, sink, Config::new(), ConverterRegistry::with_defaults())
	}

	/// Build an encoder with an explicit [`Config`] and [`ConverterRegistry`].
	pub fn with_config(schema: Schema, sink: W, config: Config, converters: ConverterRegistry) -> Self {
		Self {
			schema,
			sink,
			config,
			converters,
		}
	}

	/// Encode one datum, writing its binary form to the sink.
	pub fn encode(&mut self, value: &Value) -> crate::Result<()> {
		encode::encode(
			self.schema.as_schema_mut(),
			SchemaKey::root(),
			value,
			&mut self.sink,
			&self.config,
			&self.converters,
		)
	}

	/// Give back the underlying sink.
	pub fn into_inner(self) -> W {
		self.sink
	}
}

/// Decodes [`Value`]s from a byte source, either against a single schema
/// (spec §6.3, `new_decoder`) or resolving a writer schema against a
/// different reader schema (`new_decoder_for_writer_reader`, spec §4.6).
pub struct Decoder<R> {
	writer: Schema,
	resolution: Option<(Schema, Arc<Resolution>)>,
	source: R,
	config: Config,
	converters: ConverterRegistry,
}

impl<R: std::io::Read> Decoder<R> {
	/// Build a decoder reading datums shaped like `schema` from `source`; no
	/// resolution is performed.
	pub fn new(schema: Schema, source: R) -> Self {
		Self::with_config(schema, source, Config::new(), ConverterRegistry::with_defaults())
	}

	/// Build a decoder with an explicit [`Config`] and [`ConverterRegistry`].
	pub fn with_config(schema: Schema, source: R, config: Config, converters: ConverterRegistry) -> Self {
		Self {
			writer: schema,
			resolution: None,
			source,
			config,
			converters,
		}
	}

	/// Build a decoder that reads data written per `writer`, producing
	/// values shaped like `reader` (spec §4.6).
	pub fn for_writer_reader(writer: Schema, reader: Schema, source: R, cache: &CodecCache) -> crate::Result<Self> {
		let resolution = cache.resolve(&writer, &reader)?;
		Ok(Self {
			writer,
			resolution: Some((reader, resolution)),
			source,
			config: Config::new(),
			converters: ConverterRegistry::with_defaults(),
		})
	}

	/// Decode one datum from the source.
	pub fn decode(&mut self) -> crate::Result<Value> {
		match &self.resolution {
			None => decode::decode_any(
				self.writer.as_schema_mut(),
				SchemaKey::root(),
				&mut self.source,
				&self.config,
				&self.converters,
			),
			Some((reader, resolution)) => decode::decode_resolved(
				self.writer.as_schema_mut(),
				SchemaKey::root(),
				reader.as_schema_mut(),
				resolution,
				&mut self.source,
				&self.config,
				&self.converters,
			),
		}
	}

	/// Give back the underlying source.
	pub fn into_inner(self) -> R {
		self.source
	}
}

/// Encode `value` against `schema` into a newly allocated `Vec` (spec §6.3,
/// `marshal`).
pub fn marshal(schema: &Schema, value: &Value) -> crate::Result<Vec<u8>> {
	let mut out = Vec::new();
	encode::encode(
		schema.as_schema_mut(),
		SchemaKey::root(),
		value,
		&mut out,
		&Config::new(),
		&ConverterRegistry::with_defaults(),
	)?;
	Ok(out)
}

/// Encode `value` against `schema`, appending its binary form to `out`, with
/// the default configuration and converter registry.
///
/// Unlike [`marshal`], this doesn't allocate a fresh buffer -- used by
/// [`crate::single_object_encoding`] to write a datum after an
/// already-written header.
pub(crate) fn encode_into<W: std::io::Write>(schema: &Schema, value: &Value, out: &mut W) -> crate::Result<()> {
	encode::encode(
		schema.as_schema_mut(),
		SchemaKey::root(),
		value,
		out,
		&Config::new(),
		&ConverterRegistry::with_defaults(),
	)
}

/// Decode one datum of `bytes` against `schema` (spec §6.3, `unmarshal`).
pub fn unmarshal(schema: &Schema, bytes: &[u8]) -> crate::Result<Value> {
	let mut cursor = std::io::Cursor::new(bytes);
	decode::decode_any(
		schema.as_schema_mut(),
		SchemaKey::root(),
		&mut cursor,
		&Config::new(),
		&ConverterRegistry::with_defaults(),
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn marshal_unmarshal_round_trips_a_record() {
		let schema =
			Schema::parse_str(r#"{"type":"record","name":"R","fields":[{"name":"a","type":"long"}]}"#).unwrap();
		let value = Value::Map(vec![("a".into(), Value::Long(27))]);
		let bytes = marshal(&schema, &value).unwrap();
		assert_eq!(bytes, vec![54]);
		assert_eq!(unmarshal(&schema, &bytes).unwrap(), value);
	}

	#[test]
	fn decoder_for_writer_reader_resolves_once_and_reuses_cache() {
		let writer = Schema::parse_str(r#""int""#).unwrap();
		let reader = Schema::parse_str(r#""long""#).unwrap();
		let cache = CodecCache::new();
		let bytes = marshal(&writer, &Value::Int(3)).unwrap();
		let mut decoder = Decoder::for_writer_reader(writer.clone(), reader.clone(), bytes.as_slice(), &cache).unwrap();
		assert_eq!(decoder.decode().unwrap(), Value::Long(3));
		// second resolve for the same pair should reuse the cached entry
		let resolved_again = cache.resolve(&writer, &reader).unwrap();
		assert!(matches!(*resolved_again, Resolution::Promoted(_)));
	}

	#[test]
	fn encoder_round_trips_through_a_vec_sink() {
		let schema = Schema::parse_str(r#""string""#).unwrap();
		let mut encoder = Encoder::new(schema.clone(), Vec::new());
		encoder.encode(&Value::String("foo".into())).unwrap();
		let bytes = encoder.into_inner();
		let mut decoder = Decoder::new(schema, bytes.as_slice());
		assert_eq!(decoder.decode().unwrap(), Value::String("foo".into()));
	}
}
