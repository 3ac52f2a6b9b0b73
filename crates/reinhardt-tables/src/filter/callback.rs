//! Closure-backed filter for custom query logic

use super::TableFilter;
use crate::form::{FieldSchema, GroupState};
use crate::query::{ConditionGroup, QueryPlan};
use std::fmt;
use std::sync::Arc;

type BaseQueryFn = Arc<dyn Fn(&mut QueryPlan, &GroupState) + Send + Sync>;
type ApplyFn = Arc<dyn Fn(&mut ConditionGroup, &GroupState) + Send + Sync>;

/// Filter whose query adjustments are supplied as closures
///
/// Use it for filters that need a join or global scope
/// ([`CallbackFilter::base_query`]) in addition to row predicates
/// ([`CallbackFilter::query`]).
///
/// # Examples
///
/// ```
/// use reinhardt_tables::filter::CallbackFilter;
/// use reinhardt_tables::form::FieldSchema;
/// use reinhardt_tables::query::Predicate;
///
/// let filter = CallbackFilter::new("author", vec![FieldSchema::scalar("name")])
///     .base_query(|query, _state| {
///         query.join("authors", "posts.author_id", "authors.id");
///     })
///     .query(|group, state| {
///         if let Some(name) = state.get("name").and_then(|v| v.as_str()) {
///             group.predicate(Predicate::equals("authors.name", name));
///         }
///     });
/// ```
#[derive(Clone)]
pub struct CallbackFilter {
	name: String,
	schema: Vec<FieldSchema>,
	column_span: u16,
	columns: u16,
	base_query: Option<BaseQueryFn>,
	query: Option<ApplyFn>,
}

impl CallbackFilter {
	/// Create a filter with the given sub-form schema and no query logic
	pub fn new(name: impl Into<String>, schema: Vec<FieldSchema>) -> Self {
		Self {
			name: name.into(),
			schema,
			column_span: 1,
			columns: 1,
			base_query: None,
			query: None,
		}
	}

	/// Query-shape adjustment, run for every request
	pub fn base_query<F>(mut self, f: F) -> Self
	where
		F: Fn(&mut QueryPlan, &GroupState) + Send + Sync + 'static,
	{
		self.base_query = Some(Arc::new(f));
		self
	}

	/// Row predicates
	pub fn query<F>(mut self, f: F) -> Self
	where
		F: Fn(&mut ConditionGroup, &GroupState) + Send + Sync + 'static,
	{
		self.query = Some(Arc::new(f));
		self
	}

	/// Layout hints for the filters form
	pub fn layout(mut self, column_span: u16, columns: u16) -> Self {
		self.column_span = column_span;
		self.columns = columns;
		self
	}
}

impl fmt::Debug for CallbackFilter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CallbackFilter")
			.field("name", &self.name)
			.field("schema", &self.schema)
			.field("column_span", &self.column_span)
			.field("columns", &self.columns)
			.field("has_base_query", &self.base_query.is_some())
			.finish_non_exhaustive()
	}
}

impl TableFilter for CallbackFilter {
	fn name(&self) -> &str {
		&self.name
	}

	fn form_schema(&self) -> Vec<FieldSchema> {
		self.schema.clone()
	}

	fn column_span(&self) -> u16 {
		self.column_span
	}

	fn columns(&self) -> u16 {
		self.columns
	}

	fn apply_to_base_query(&self, query: &mut QueryPlan, state: &GroupState) {
		if let Some(f) = &self.base_query {
			f(query, state);
		}
	}

	fn apply(&self, group: &mut ConditionGroup, state: &GroupState) {
		if let Some(f) = &self.query {
			f(group, state);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::query::Predicate;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_closures_receive_state() {
		let filter = CallbackFilter::new("author", vec![FieldSchema::scalar("name")])
			.base_query(|query, _| {
				query.join("authors", "posts.author_id", "authors.id");
			})
			.query(|group, state| {
				if let Some(name) = state.get("name").and_then(|v| v.as_str()) {
					group.predicate(Predicate::equals("authors.name", name));
				}
			});

		let state = GroupState::from([("name".to_string(), json!("kent"))]);
		let mut plan = QueryPlan::new("posts");
		let mut group = ConditionGroup::default();

		filter.apply_to_base_query(&mut plan, &state);
		filter.apply(&mut group, &state);

		assert_eq!(plan.scopes().len(), 1);
		assert_eq!(group.conditions().len(), 1);
	}

	#[rstest]
	fn test_without_closures_is_inert() {
		let filter = CallbackFilter::new("noop", vec![]).layout(2, 3);
		let mut plan = QueryPlan::new("posts");
		let mut group = ConditionGroup::default();

		filter.apply_to_base_query(&mut plan, &GroupState::new());
		filter.apply(&mut group, &GroupState::new());

		assert!(plan.scopes().is_empty());
		assert!(group.is_empty());
		assert_eq!(filter.column_span(), 2);
		assert_eq!(filter.columns(), 3);
	}
}
