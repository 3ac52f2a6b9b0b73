//! Form capability
//!
//! A [`Form`] holds nested field state: one group per owner (a filter, an
//! action) and one JSON value per field inside the group. Schemas only
//! carry field names and defaults; widgets and validation belong to the
//! rendering layer.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Field name to value
pub type GroupState = BTreeMap<String, Value>;

/// Group name to group state
pub type FormData = BTreeMap<String, GroupState>;

/// A field declared by a form schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
	/// Field name, unique within its group
	pub name: String,
	/// Value the field takes when the form is filled without data
	pub default: Value,
}

impl FieldSchema {
	/// Field with an explicit default
	pub fn new(name: impl Into<String>, default: impl Into<Value>) -> Self {
		Self {
			name: name.into(),
			default: default.into(),
		}
	}

	/// Scalar field defaulting to `null`
	pub fn scalar(name: impl Into<String>) -> Self {
		Self::new(name, Value::Null)
	}

	/// Multi-value field defaulting to `[]`
	pub fn multiple(name: impl Into<String>) -> Self {
		Self::new(name, Value::Array(Vec::new()))
	}

	/// Boolean field defaulting to `false`
	pub fn toggle(name: impl Into<String>) -> Self {
		Self::new(name, Value::Bool(false))
	}
}

/// The blank value for a field, derived from its current state
///
/// Arrays blank to `[]`, booleans to `false`, everything else to `null`.
/// Array-valued filters rely on this: blanking them to `null` would break
/// the `IN (...)` predicate they build.
///
/// # Examples
///
/// ```
/// use reinhardt_tables::form::blank_value;
/// use serde_json::json;
///
/// assert_eq!(blank_value(&json!(["active"])), json!([]));
/// assert_eq!(blank_value(&json!(true)), json!(false));
/// assert_eq!(blank_value(&json!("draft")), json!(null));
/// ```
pub fn blank_value(state: &Value) -> Value {
	match state {
		Value::Array(_) => Value::Array(Vec::new()),
		Value::Bool(_) => Value::Bool(false),
		_ => Value::Null,
	}
}

/// Grouped field state backed by a schema
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Form {
	schema: Vec<(String, Vec<FieldSchema>)>,
	state: FormData,
}

impl Form {
	/// Create an empty form
	pub fn new() -> Self {
		Self::default()
	}

	/// Declare a group of fields; the group starts at its defaults
	pub fn with_group(mut self, name: impl Into<String>, fields: Vec<FieldSchema>) -> Self {
		let name = name.into();
		self.state.insert(name.clone(), defaults_of(&fields));
		self.schema.push((name, fields));
		self
	}

	/// Hydrate the form
	///
	/// Fields present in `data` take the given value, every other declared
	/// field takes its default. `None` fills the whole form from defaults.
	pub fn fill(&mut self, data: Option<&FormData>) {
		let mut state = FormData::new();
		for (group, fields) in &self.schema {
			let mut group_state = defaults_of(fields);
			if let Some(given) = data.and_then(|d| d.get(group)) {
				for (field, value) in given {
					group_state.insert(field.clone(), value.clone());
				}
			}
			state.insert(group.clone(), group_state);
		}
		self.state = state;
	}

	/// Reset every field to its default
	pub fn fill_defaults(&mut self) {
		self.fill(None);
	}

	/// Declared field names of a group, in schema order
	pub fn field_names(&self, group: &str) -> Option<Vec<&str>> {
		self.schema
			.iter()
			.find(|(name, _)| name == group)
			.map(|(_, fields)| fields.iter().map(|f| f.name.as_str()).collect())
	}

	/// The full state, keyed by group
	pub fn raw_state(&self) -> &FormData {
		&self.state
	}

	/// State of one group
	pub fn group_state(&self, group: &str) -> Option<&GroupState> {
		self.state.get(group)
	}

	/// Overlay `values` on a group's state; returns `false` for undeclared groups
	pub fn set_group(&mut self, group: &str, values: GroupState) -> bool {
		let Some(state) = self.state.get_mut(group) else {
			return false;
		};
		for (field, value) in values {
			state.insert(field, value);
		}
		true
	}

	/// Set one field; returns `false` for undeclared groups
	pub fn set_field(&mut self, group: &str, field: &str, value: Value) -> bool {
		match self.state.get_mut(group) {
			Some(state) => {
				state.insert(field.to_string(), value);
				true
			}
			None => false,
		}
	}

	/// Blank one field according to its current state type
	pub fn blank_field(&mut self, group: &str, field: &str) -> bool {
		let Some(state) = self.state.get_mut(group) else {
			return false;
		};
		let current = state.get(field).cloned().unwrap_or(Value::Null);
		state.insert(field.to_string(), blank_value(&current));
		true
	}
}

fn defaults_of(fields: &[FieldSchema]) -> GroupState {
	fields
		.iter()
		.map(|f| (f.name.clone(), f.default.clone()))
		.collect()
}
