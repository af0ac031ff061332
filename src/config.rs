//! Crate-wide and per-call configuration (spec §6.4)

use std::sync::atomic::{AtomicBool, Ordering};

/// Default value for [`Config::max_byte_slice_size`]: 1 MiB.
pub const DEFAULT_MAX_BYTE_SLICE_SIZE: i64 = 1024 * 1024;

/// Per-call configuration for parsing/encoding/decoding
///
/// Unlike [`skip_name_validation`](skip_name_validation), these options are
/// not process-wide: build one `Config` per [`Schema`](crate::Schema)/
/// [`Encoder`](crate::codec::Encoder)/[`Decoder`](crate::codec::Decoder) as
/// needed, or share a single instance across many.
#[derive(Debug, Clone, serde_derive::Serialize, serde_derive::Deserialize)]
#[serde(default)]
pub struct Config {
	/// Maximum length (in bytes) accepted for a single `bytes`/`string`
	/// value.
	///
	/// `-1` disables the limit. Default is 1 MiB.
	///
	/// The reader enforces this *before* attempting to allocate the buffer
	/// (spec §4.1), so a hostile length prefix can't be used to force a
	/// large allocation.
	pub max_byte_slice_size: i64,
	/// When decoding a union into the generic "any" value and no registered
	/// host type matches any candidate branch, return an error instead of
	/// falling back to the generic tagged-map representation.
	pub union_resolution_error: bool,
	/// When resolving a union against another union, resolve the branches
	/// that do have a match and skip (rather than fail) on branches that
	/// don't, as long as at least the branches actually read from the wire
	/// resolve.
	pub partial_union_type_resolution: bool,
	/// Writer-side only: preferred number of items per array/map block.
	///
	/// This is a hint; the writer is always free to flush a smaller block
	/// (notably the final one).
	pub block_length_hint: i64,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			max_byte_slice_size: DEFAULT_MAX_BYTE_SLICE_SIZE,
			union_resolution_error: false,
			partial_union_type_resolution: false,
			block_length_hint: 100,
		}
	}
}

impl Config {
	/// Build a `Config` with every option at its default value
	pub fn new() -> Self {
		Self::default()
	}

	/// `None` if [`max_byte_slice_size`](Self::max_byte_slice_size) is `-1`
	/// (unlimited), otherwise the limit as a `u64`
	pub(crate) fn max_byte_slice_size_checked(&self) -> Option<u64> {
		if self.max_byte_slice_size < 0 {
			None
		} else {
			Some(self.max_byte_slice_size as u64)
		}
	}
}

/// Process-wide toggle: accept identifiers that don't conform to Avro's
/// `[A-Za-z_][A-Za-z0-9_]*` naming rule (spec §3.2.2)
///
/// This exists, instead of being part of [`Config`], because it affects
/// whether a given schema document can be parsed _at all_ — once a
/// non-conforming schema has been accepted somewhere in a process, every
/// consumer of that schema in that process needs to agree that it's valid,
/// which makes it a poor fit for a per-call setting.
static SKIP_NAME_VALIDATION: AtomicBool = AtomicBool::new(false);

/// Accept legacy, non-conforming identifiers for the remainder of the
/// process's lifetime (or until [`set_skip_name_validation(false)`](set_skip_name_validation)
/// is called).
pub fn set_skip_name_validation(skip: bool) {
	SKIP_NAME_VALIDATION.store(skip, Ordering::Relaxed);
}

/// Whether [`set_skip_name_validation`] is currently in effect
pub fn skip_name_validation() -> bool {
	SKIP_NAME_VALIDATION.load(Ordering::Relaxed)
}
