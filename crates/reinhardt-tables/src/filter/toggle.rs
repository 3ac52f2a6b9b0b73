//! Boolean toggle filter

use super::TableFilter;
use crate::form::{FieldSchema, GroupState};
use crate::query::{Condition, ConditionGroup};
use serde_json::Value;

/// Filter that adds a fixed condition while switched on
///
/// # Examples
///
/// ```
/// use reinhardt_tables::filter::{TableFilter, ToggleFilter};
/// use reinhardt_tables::query::Predicate;
///
/// let filter = ToggleFilter::new("featured", Predicate::equals("is_featured", true))
///     .with_label("Featured only");
///
/// assert_eq!(filter.label(), "Featured only");
/// assert_eq!(filter.form_schema()[0].name, "is_active");
/// ```
#[derive(Debug, Clone)]
pub struct ToggleFilter {
	name: String,
	label: String,
	condition: Condition,
	default: bool,
}

impl ToggleFilter {
	/// Create a toggle filter applying `condition` when on
	pub fn new(name: impl Into<String>, condition: impl Into<Condition>) -> Self {
		let name = name.into();
		Self {
			label: name.clone(),
			name,
			condition: condition.into(),
			default: false,
		}
	}

	/// Set the form label
	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = label.into();
		self
	}

	/// Start switched on
	pub fn default_on(mut self, on: bool) -> Self {
		self.default = on;
		self
	}
}

impl TableFilter for ToggleFilter {
	fn name(&self) -> &str {
		&self.name
	}

	fn label(&self) -> &str {
		&self.label
	}

	fn form_schema(&self) -> Vec<FieldSchema> {
		vec![FieldSchema::new("is_active", self.default)]
	}

	fn apply(&self, group: &mut ConditionGroup, state: &GroupState) {
		if state.get("is_active").and_then(Value::as_bool) == Some(true) {
			group.add(self.condition.clone());
		}
	}
}
