//! Table filters
//!
//! A filter owns a form sub-schema and turns the state of that sub-form into
//! query adjustments. Application happens in two phases:
//!
//! 1. [`TableFilter::apply_to_base_query`] runs for every filter first and may
//!    change the shape of the query (joins, global scopes).
//! 2. [`TableFilter::apply`] adds row predicates. The predicates of all
//!    filters are collected into one AND group.

mod callback;
mod select;
mod toggle;

pub use callback::CallbackFilter;
pub use select::SelectFilter;
pub use toggle::ToggleFilter;

use crate::form::{FieldSchema, GroupState, blank_value};
use crate::query::{ConditionGroup, QueryPlan};
use std::fmt::Debug;

/// Trait for table filters
///
/// # Examples
///
/// ```
/// use reinhardt_tables::filter::TableFilter;
/// use reinhardt_tables::form::{FieldSchema, GroupState};
/// use reinhardt_tables::query::{ConditionGroup, Predicate};
///
/// #[derive(Debug)]
/// struct MinViewsFilter;
///
/// impl TableFilter for MinViewsFilter {
///     fn name(&self) -> &str {
///         "min_views"
///     }
///
///     fn form_schema(&self) -> Vec<FieldSchema> {
///         vec![FieldSchema::scalar("value")]
///     }
///
///     fn apply(&self, group: &mut ConditionGroup, state: &GroupState) {
///         if let Some(min) = state.get("value").and_then(|v| v.as_i64()) {
///             group.predicate(Predicate::new(
///                 "views",
///                 reinhardt_tables::query::Operator::Gte,
///                 min,
///             ));
///         }
///     }
/// }
/// ```
pub trait TableFilter: Debug + Send + Sync {
	/// Unique name; also the key of the filter's state group
	fn name(&self) -> &str;

	/// Label displayed in the filters form
	fn label(&self) -> &str {
		self.name()
	}

	/// Fields of the filter's sub-form
	fn form_schema(&self) -> Vec<FieldSchema>;

	/// Columns the filter group spans in the filters form
	fn column_span(&self) -> u16 {
		1
	}

	/// Columns of the filter group's own grid
	fn columns(&self) -> u16 {
		1
	}

	/// Adjust the query shape; runs for every filter whatever its state
	fn apply_to_base_query(&self, _query: &mut QueryPlan, _state: &GroupState) {}

	/// Add row predicates for the current state
	fn apply(&self, group: &mut ConditionGroup, state: &GroupState);

	/// Whether the state differs from a blank form
	fn is_active(&self, state: &GroupState) -> bool {
		state.values().any(|value| *value != blank_value(value))
	}
}
