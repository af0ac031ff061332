//! Fully-qualified naming for named Avro schemas (spec §3.2.1/§3.2.2)

/// The name (and namespace) of a named schema (`record`, `enum`, `fixed`)
///
/// Holds both the "name" and the "namespace" as a single fully qualified
/// string, splitting lazily on demand.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Name {
	fully_qualified_name: String,
	namespace_delimiter_idx: Option<usize>,
}

impl std::fmt::Debug for Name {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		std::fmt::Debug::fmt(&self.fully_qualified_name, f)
	}
}

impl std::fmt::Display for Name {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.fully_qualified_name)
	}
}

impl Name {
	/// The rightmost component of the fully qualified name
	///
	/// e.g. in `a.b.c` it's `c`
	pub fn name(&self) -> &str {
		match self.namespace_delimiter_idx {
			None => &self.fully_qualified_name,
			Some(delimiter_idx) => &self.fully_qualified_name[delimiter_idx + 1..],
		}
	}

	/// The namespace component of the fully qualified name
	///
	/// e.g. in `a.b.c` it's `a.b`
	pub fn namespace(&self) -> Option<&str> {
		self.namespace_delimiter_idx
			.map(|idx| &self.fully_qualified_name[..idx])
	}

	/// The fully qualified name
	///
	/// e.g. in `a.b.c` it's `a.b.c`
	pub fn fully_qualified_name(&self) -> &str {
		&self.fully_qualified_name
	}

	/// Build a [`Name`] from a fully qualified name
	pub fn from_fully_qualified_name(fully_qualified_name: impl Into<String>) -> Self {
		let fully_qualified_name = fully_qualified_name.into();
		Name {
			namespace_delimiter_idx: fully_qualified_name.rfind('.'),
			fully_qualified_name,
		}
	}

	/// Build a [`Name`] from a `name` and an optional enclosing `namespace`,
	/// following Avro's resolution rule: an explicit namespace on the name
	/// itself (`name` contains a `.`) takes priority, then the `namespace`
	/// argument, then no namespace at all.
	pub(crate) fn resolve(name: &str, namespace: Option<&str>) -> Self {
		if let Some((namespace, name)) = name.rsplit_once('.') {
			Name {
				fully_qualified_name: format!("{namespace}.{name}"),
				namespace_delimiter_idx: Some(namespace.len()),
			}
		} else {
			match namespace {
				Some(namespace) if !namespace.is_empty() => Name {
					fully_qualified_name: format!("{namespace}.{name}"),
					namespace_delimiter_idx: Some(namespace.len()),
				},
				_ => Name {
					fully_qualified_name: name.to_owned(),
					namespace_delimiter_idx: None,
				},
			}
		}
	}

	/// Validate that every `.`-separated segment of the fully qualified name
	/// matches `[A-Za-z_][A-Za-z0-9_]*` (spec §3.2.2)
	pub(crate) fn validate_identifier(full_name: &str) -> crate::Result<()> {
		if crate::config::skip_name_validation() {
			return Ok(());
		}
		if full_name.is_empty() {
			return Err(crate::Error::schema_parse("Empty name"));
		}
		for segment in full_name.split('.') {
			let mut chars = segment.chars();
			let valid = match chars.next() {
				Some(c) if c == '_' || c.is_ascii_alphabetic() => {
					chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
				}
				_ => false,
			};
			if !valid {
				return Err(crate::Error::schema_parse(format_args!(
					"Invalid name segment {segment:?} in {full_name:?}: must match [A-Za-z_][A-Za-z0-9_]*"
				)));
			}
		}
		Ok(())
	}
}
