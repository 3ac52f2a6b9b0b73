//! Record identity and attributes
//!
//! The engine treats rows as opaque: it only reads the primary key and the
//! handful of attributes it has to write (reorder column, foreign keys).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Attribute map of a single row
pub type Attributes = serde_json::Map<String, Value>;

/// Primitive primary key of a record
///
/// # Examples
///
/// ```
/// use reinhardt_tables::RecordKey;
///
/// let key = RecordKey::from(7);
/// assert_eq!(key.to_string(), "7");
///
/// let slug = RecordKey::from("draft-post");
/// assert_eq!(slug.to_string(), "draft-post");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordKey {
	/// Integer key
	Int(i64),
	/// String key (UUIDs, slugs, ...)
	Str(String),
}

impl RecordKey {
	/// Convert the key into a JSON value
	pub fn to_value(&self) -> Value {
		match self {
			RecordKey::Int(i) => Value::from(*i),
			RecordKey::Str(s) => Value::from(s.as_str()),
		}
	}

	/// Parse a key from a JSON value, returning `None` for non-primitive values
	pub fn from_value(value: &Value) -> Option<Self> {
		match value {
			Value::Number(n) => n.as_i64().map(RecordKey::Int),
			Value::String(s) => Some(RecordKey::Str(s.clone())),
			_ => None,
		}
	}
}

impl fmt::Display for RecordKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			RecordKey::Int(i) => write!(f, "{}", i),
			RecordKey::Str(s) => f.write_str(s),
		}
	}
}

impl From<i64> for RecordKey {
	fn from(value: i64) -> Self {
		RecordKey::Int(value)
	}
}

impl From<i32> for RecordKey {
	fn from(value: i32) -> Self {
		RecordKey::Int(i64::from(value))
	}
}

impl From<&str> for RecordKey {
	fn from(value: &str) -> Self {
		RecordKey::Str(value.to_string())
	}
}

impl From<String> for RecordKey {
	fn from(value: String) -> Self {
		RecordKey::Str(value)
	}
}

/// A row identified by its primary key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
	key: RecordKey,
	attributes: Attributes,
}

impl Record {
	/// Create a record without attributes
	pub fn new(key: impl Into<RecordKey>) -> Self {
		Self {
			key: key.into(),
			attributes: Attributes::new(),
		}
	}

	/// Builder-style attribute setter
	pub fn attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		self.attributes.insert(name.into(), value.into());
		self
	}

	/// Primary key
	pub fn key(&self) -> &RecordKey {
		&self.key
	}

	/// Read a single attribute
	///
	/// A dotted name such as `pivot.sort` falls back to walking nested
	/// objects when no attribute carries the full name.
	pub fn get(&self, name: &str) -> Option<&Value> {
		if let Some(value) = self.attributes.get(name) {
			return Some(value);
		}
		let (head, rest) = name.split_once('.')?;
		rest.split('.')
			.try_fold(self.attributes.get(head)?, |value, segment| value.get(segment))
	}

	/// Overwrite a single attribute
	pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
		self.attributes.insert(name.into(), value.into());
	}

	/// Merge attributes into the record, replacing existing values
	pub fn merge(&mut self, attributes: Attributes) {
		for (name, value) in attributes {
			self.attributes.insert(name, value);
		}
	}

	/// All attributes
	pub fn attributes(&self) -> &Attributes {
		&self.attributes
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	#[case(json!(3), Some(RecordKey::Int(3)))]
	#[case(json!("abc"), Some(RecordKey::Str("abc".into())))]
	#[case(json!(1.5), None)]
	#[case(json!(null), None)]
	fn test_key_from_value(#[case] value: Value, #[case] expected: Option<RecordKey>) {
		assert_eq!(RecordKey::from_value(&value), expected);
	}

	#[rstest]
	fn test_key_deserializes_untagged() {
		let keys: Vec<RecordKey> = serde_json::from_value(json!([1, "two"])).unwrap();
		assert_eq!(keys, vec![RecordKey::Int(1), RecordKey::Str("two".into())]);
	}

	#[rstest]
	fn test_record_merge_overwrites() {
		let mut record = Record::new(1).attribute("sort", 3).attribute("title", "A");
		let mut attrs = Attributes::new();
		attrs.insert("sort".into(), json!(1));
		record.merge(attrs);

		assert_eq!(record.get("sort"), Some(&json!(1)));
		assert_eq!(record.get("title"), Some(&json!("A")));
	}

	#[rstest]
	fn test_dotted_get_reads_nested_objects() {
		let record = Record::new(1)
			.attribute("pivot", json!({ "sort": 2 }))
			.attribute("author.name", "flat");

		assert_eq!(record.get("pivot.sort"), Some(&json!(2)));
		assert_eq!(record.get("author.name"), Some(&json!("flat")));
		assert_eq!(record.get("pivot.missing"), None);
		assert_eq!(record.get("missing.sort"), None);
	}
}
