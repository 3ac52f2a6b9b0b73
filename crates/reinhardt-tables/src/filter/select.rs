//! Select filter for attributes with predefined values

use super::TableFilter;
use crate::form::{FieldSchema, GroupState};
use crate::query::{ConditionGroup, Predicate};
use serde_json::Value;

/// Filter matching an attribute against one or several chosen options
///
/// Single mode stores its state in a `value` field and adds `attribute =
/// value`; multiple mode stores a `values` array and adds `attribute IN
/// (values)`. Blank state adds nothing.
///
/// # Examples
///
/// ```
/// use reinhardt_tables::filter::{SelectFilter, TableFilter};
///
/// let filter = SelectFilter::new("status")
///     .option("active", "Active")
///     .option("inactive", "Inactive")
///     .multiple(true);
///
/// assert_eq!(filter.options().len(), 2);
/// assert_eq!(filter.form_schema()[0].name, "values");
/// ```
#[derive(Debug, Clone)]
pub struct SelectFilter {
	name: String,
	label: String,
	attribute: String,
	options: Vec<(String, String)>, // (value, label)
	multiple: bool,
	column_span: u16,
}

impl SelectFilter {
	/// Create a single-value select filter on the attribute of the same name
	pub fn new(name: impl Into<String>) -> Self {
		let name = name.into();
		Self {
			label: name.clone(),
			attribute: name.clone(),
			name,
			options: Vec::new(),
			multiple: false,
			column_span: 1,
		}
	}

	/// Filter on a different attribute than the filter name
	pub fn attribute(mut self, attribute: impl Into<String>) -> Self {
		self.attribute = attribute.into();
		self
	}

	/// Set the form label
	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = label.into();
		self
	}

	/// Add an option
	pub fn option(mut self, value: impl Into<String>, label: impl Into<String>) -> Self {
		self.options.push((value.into(), label.into()));
		self
	}

	/// Allow selecting several options
	pub fn multiple(mut self, multiple: bool) -> Self {
		self.multiple = multiple;
		self
	}

	/// Columns the filter spans in the filters form
	pub fn with_column_span(mut self, span: u16) -> Self {
		self.column_span = span;
		self
	}

	/// Declared options as `(value, label)` pairs
	pub fn options(&self) -> &[(String, String)] {
		&self.options
	}

	pub fn is_multiple(&self) -> bool {
		self.multiple
	}
}

impl TableFilter for SelectFilter {
	fn name(&self) -> &str {
		&self.name
	}

	fn label(&self) -> &str {
		&self.label
	}

	fn form_schema(&self) -> Vec<FieldSchema> {
		if self.multiple {
			vec![FieldSchema::multiple("values")]
		} else {
			vec![FieldSchema::scalar("value")]
		}
	}

	fn column_span(&self) -> u16 {
		self.column_span
	}

	fn apply(&self, group: &mut ConditionGroup, state: &GroupState) {
		if self.multiple {
			let values = state
				.get("values")
				.and_then(Value::as_array)
				.filter(|values| !values.is_empty());
			if let Some(values) = values {
				group.predicate(Predicate::is_in(&self.attribute, values.clone()));
			}
			return;
		}

		match state.get("value") {
			None | Some(Value::Null) => {}
			Some(Value::String(s)) if s.is_empty() => {}
			Some(value) => {
				group.predicate(Predicate::equals(&self.attribute, value.clone()));
			}
		}
	}
}
