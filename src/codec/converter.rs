//! Type Converter Hooks: pluggable translation between a logical type's wire
//! representation and a richer application-level value (spec §6.2)
//!
//! The codec always reads/writes the *base* Avro representation (a
//! `decimal` is still `bytes` or `fixed` on the wire, a `uuid` is still a
//! `string`). A registered hook runs on top of that, translating to and
//! from whatever shape is more convenient for the caller -- by default this
//! crate registers one for `decimal` (backed by [`rust_decimal`]), since
//! that's the one logical type whose base representation is genuinely
//! unusable without decoding it.

use crate::schema::safe::LogicalType;
use crate::{Error, Value};
use hashbrown::HashMap;
use std::sync::Arc;

/// The underlying (non-logical) type a hook is registered against
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum RegularTypeTag {
	Null,
	Boolean,
	Int,
	Long,
	Float,
	Double,
	Bytes,
	String,
	Array,
	Map,
	Union,
	Record,
	Enum,
	Fixed,
}

/// A pluggable translation between a logical type's base representation and
/// an application-level one.
pub trait TypeConverter: Send + Sync {
	/// Translate a just-decoded base value into the application
	/// representation.
	fn decode(&self, base: Value, logical_type: Option<&LogicalType>) -> crate::Result<Value>;
	/// Translate an application-level value into the base representation
	/// to be encoded.
	fn encode(&self, value: &Value, logical_type: Option<&LogicalType>) -> crate::Result<Value>;
}

/// A table of [`TypeConverter`] hooks, keyed by the underlying type and
/// (optionally) the specific logical type name overlaid on it.
#[derive(Clone, Default)]
pub struct ConverterRegistry {
	hooks: HashMap<(RegularTypeTag, Option<String>), Arc<dyn TypeConverter>>,
}

impl ConverterRegistry {
	/// An empty registry, with no conversions applied at all (every value
	/// passes through as its base representation).
	pub fn empty() -> Self {
		Self { hooks: HashMap::new() }
	}

	/// The default registry this crate ships: a [`DecimalConverter`] for
	/// `decimal`-on-`bytes` and `decimal`-on-`fixed`.
	pub fn with_defaults() -> Self {
		let mut registry = Self::empty();
		let decimal = Arc::new(DecimalConverter);
		registry.register(RegularTypeTag::Bytes, Some("decimal"), decimal.clone());
		registry.register(RegularTypeTag::Fixed, Some("decimal"), decimal);
		registry
	}

	/// Register `hook` for `tag`/`logical_type`, replacing any previous
	/// registration for that pair.
	pub fn register(&mut self, tag: RegularTypeTag, logical_type: Option<&str>, hook: Arc<dyn TypeConverter>) {
		self.hooks.insert((tag, logical_type.map(str::to_owned)), hook);
	}

	/// Look up the hook registered for `tag`/`logical_type`, if any.
	pub fn get(&self, tag: RegularTypeTag, logical_type: Option<&str>) -> Option<&Arc<dyn TypeConverter>> {
		self.hooks.get(&(tag, logical_type.map(str::to_owned)))
	}
}

/// The built-in `decimal` converter: translates the two's-complement
/// big-endian unscaled integer Avro writes on the wire to and from a
/// [`rust_decimal::Decimal`], surfaced as [`Value::String`] of its decimal
/// text form.
pub struct DecimalConverter;

impl TypeConverter for DecimalConverter {
	fn decode(&self, base: Value, logical_type: Option<&LogicalType>) -> crate::Result<Value> {
		let LogicalType::Decimal(decimal) = logical_type.ok_or_else(|| Error::UserHook("decimal converter requires a decimal logical type".into()))? else {
			return Err(Error::UserHook("decimal converter invoked for a non-decimal logical type".into()));
		};
		let bytes = match base {
			Value::Bytes(b) => b,
			other => return Err(Error::UserHook(format!("decimal converter expects bytes, got {other:?}"))),
		};
		let unscaled = twos_complement_to_i128(&bytes)?;
		let value = rust_decimal::Decimal::try_from_i128_with_scale(unscaled, decimal.scale)
			.map_err(|e| Error::UserHook(format!("decimal out of range: {e}")))?;
		Ok(Value::String(value.to_string()))
	}

	fn encode(&self, value: &Value, logical_type: Option<&LogicalType>) -> crate::Result<Value> {
		let LogicalType::Decimal(decimal) = logical_type.ok_or_else(|| Error::UserHook("decimal converter requires a decimal logical type".into()))? else {
			return Err(Error::UserHook("decimal converter invoked for a non-decimal logical type".into()));
		};
		let parsed: rust_decimal::Decimal = match value {
			Value::String(s) => s
				.parse()
				.map_err(|e| Error::UserHook(format!("invalid decimal text {s:?}: {e}")))?,
			// A caller that only has a floating-point magnitude on hand (no
			// exact decimal text) can hand one over directly.
			Value::Double(d) => num_traits::FromPrimitive::from_f64(*d)
				.ok_or_else(|| Error::UserHook(format!("{d} has no exact decimal representation")))?,
			other => return Err(Error::UserHook(format!("decimal converter expects a string or double, got {other:?}"))),
		};
		let rescaled = parsed
			.round_dp_with_strategy(decimal.scale, rust_decimal::RoundingStrategy::MidpointAwayFromZero);
		let unscaled = rescaled.mantissa();
		Ok(Value::Bytes(i128_to_twos_complement(unscaled)))
	}
}

fn twos_complement_to_i128(bytes: &[u8]) -> crate::Result<i128> {
	if bytes.is_empty() || bytes.len() > 16 {
		return Err(Error::UserHook("decimal unscaled value has an unsupported byte length".into()));
	}
	let negative = bytes[0] & 0x80 != 0;
	let mut buf = [if negative { 0xff } else { 0x00 }; 16];
	buf[16 - bytes.len()..].copy_from_slice(bytes);
	Ok(i128::from_be_bytes(buf))
}

fn i128_to_twos_complement(value: i128) -> Vec<u8> {
	let full = value.to_be_bytes();
	let is_negative = value < 0;
	let mut start = 0;
	while start < 15 {
		let byte = full[start];
		let next_byte = full[start + 1];
		let sign_extends = if is_negative {
			byte == 0xff && (next_byte & 0x80) != 0
		} else {
			byte == 0x00 && (next_byte & 0x80) == 0
		};
		if sign_extends {
			start += 1;
		} else {
			break;
		}
	}
	full[start..].to_vec()
}
