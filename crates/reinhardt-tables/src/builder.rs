//! Query construction from table state
//!
//! Every record fetch starts from the definition's base query and applies,
//! in this order:
//!
//! 1. filter base-query adjustments
//! 2. filter row predicates, as one AND group
//! 3. global search and per-column searches
//! 4. sort (reorder column while reordering, else explicit, else default)
//! 5. offset/limit
//!
//! The same state and definition always produce the same plan.

use crate::definition::TableDefinition;
use crate::query::{QueryPlan, SortDirection};
use crate::settings::TableSettings;
use crate::state::{FilterState, Pagination, SearchState, SortState, TableState};

/// Builds the [`QueryPlan`] for the current state of a table
///
/// # Examples
///
/// ```
/// use reinhardt_tables::builder::TableQueryBuilder;
/// use reinhardt_tables::query::SortDirection;
/// use reinhardt_tables::state::TableState;
/// use reinhardt_tables::{Column, TableDefinition, TableSettings};
///
/// let definition = TableDefinition::builder("posts")
///     .column(Column::new("title").sortable(true).searchable(true))
///     .default_sort("title", SortDirection::Asc)
///     .build()
///     .unwrap();
/// let state = TableState {
///     search: "rust".into(),
///     ..TableState::default()
/// };
///
/// let plan = TableQueryBuilder::for_state(&definition, &state, &TableSettings::default());
///
/// assert_eq!(plan.conditions().len(), 1);
/// assert_eq!(plan.order()[0].column, "title");
/// assert_eq!(plan.limit(), Some(10));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TableQueryBuilder<'a> {
	definition: &'a TableDefinition,
	settings: &'a TableSettings,
	filters: &'a FilterState,
	search: &'a SearchState,
	sort: &'a SortState,
	pagination: &'a Pagination,
	reordering: bool,
}

impl<'a> TableQueryBuilder<'a> {
	pub fn new(
		definition: &'a TableDefinition,
		settings: &'a TableSettings,
		filters: &'a FilterState,
		search: &'a SearchState,
		sort: &'a SortState,
		pagination: &'a Pagination,
	) -> Self {
		Self {
			definition,
			settings,
			filters,
			search,
			sort,
			pagination,
			reordering: false,
		}
	}

	/// Reorder mode; ignored for tables without a reorder column
	pub fn reordering(mut self, reordering: bool) -> Self {
		self.reordering = reordering && self.definition.is_reorderable();
		self
	}

	/// Filtered, searched and sorted plan without offset/limit
	///
	/// Used for counting and for expanding select-all.
	pub fn build_unpaginated(&self) -> QueryPlan {
		let mut query = self.definition.base_query().clone();

		self.filters
			.apply_filters_to_query(self.definition, &mut query);
		self.search.apply_to_query(self.definition, &mut query);

		match (self.reordering, self.definition.reorder_column()) {
			(true, Some(column)) => {
				let column = self.definition.relationship().qualify(column);
				query.order_by(column, SortDirection::Asc);
			}
			_ => {
				if let Some((column, direction)) = self.sort.sort() {
					query.order_by(column, direction);
				}
			}
		}
		query
	}

	/// The plan for the current page
	pub fn build(&self) -> QueryPlan {
		let mut query = self.build_unpaginated();
		if self.paginates() {
			self.pagination.apply_to_query(&mut query);
		}
		query
	}

	/// Whether offset/limit apply
	pub fn paginates(&self) -> bool {
		self.definition.is_paginated()
			&& (!self.reordering || self.settings.paginate_while_reordering)
	}

	/// Build the plan straight from a snapshot
	pub fn for_state(
		definition: &TableDefinition,
		state: &TableState,
		settings: &TableSettings,
	) -> QueryPlan {
		let mut filters = FilterState::new(definition);
		filters.fill(state.filters.as_ref());
		let search = SearchState::new(state.search.clone(), state.column_search.clone());
		let mut sort = SortState::from_definition(definition);
		sort.restore(state.sort.clone());
		let pagination = Pagination::restore(definition, state.page, state.records_per_page);

		TableQueryBuilder::new(definition, settings, &filters, &search, &sort, &pagination)
			.reordering(state.reordering)
			.build()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::column::Column;
	use crate::definition::RelationshipDescriptor;
	use crate::filter::{CallbackFilter, SelectFilter};
	use crate::form::{FieldSchema, FormData, GroupState};
	use crate::query::{Condition, Predicate, Scope};
	use crate::state::SortSelection;
	use rstest::{fixture, rstest};
	use serde_json::json;

	#[fixture]
	fn definition() -> TableDefinition {
		TableDefinition::builder("posts")
			.column(Column::new("title").sortable(true).searchable(true))
			.column(Column::new("position"))
			.filter(SelectFilter::new("status").multiple(true))
			.filter(
				CallbackFilter::new("tagged", vec![FieldSchema::toggle("is_active")]).base_query(
					|query, _| {
						query.join("post_tags", "posts.id", "post_tags.post_id");
					},
				),
			)
			.default_sort("title", SortDirection::Desc)
			.reorderable("position")
			.page_options(vec![5, 10])
			.build()
			.unwrap()
	}

	fn filtered_state() -> TableState {
		TableState {
			filters: Some(FormData::from([(
				"status".to_string(),
				GroupState::from([("values".to_string(), json!(["active"]))]),
			)])),
			search: "rust".into(),
			page: 2,
			..TableState::default()
		}
	}

	#[rstest]
	fn test_pipeline_order(definition: TableDefinition) {
		let plan =
			TableQueryBuilder::for_state(&definition, &filtered_state(), &TableSettings::default());

		assert!(matches!(plan.scopes(), [Scope::Join { table, .. }] if table == "post_tags"));
		assert_eq!(
			plan.conditions(),
			&[
				Condition::and(vec![Predicate::is_in("status", vec![json!("active")]).into()]),
				Condition::or(vec![Predicate::contains("title", "rust").into()]),
			]
		);
		assert_eq!(plan.order()[0].column, "title");
		assert_eq!(plan.order()[0].direction, SortDirection::Desc);
		assert_eq!(plan.limit(), Some(5));
		assert_eq!(plan.offset(), Some(5));
	}

	#[rstest]
	fn test_deterministic(definition: TableDefinition) {
		let state = filtered_state();
		let settings = TableSettings::default();

		assert_eq!(
			TableQueryBuilder::for_state(&definition, &state, &settings),
			TableQueryBuilder::for_state(&definition, &state, &settings)
		);
	}

	#[rstest]
	fn test_explicit_sort_wins_over_default(definition: TableDefinition) {
		let state = TableState {
			sort: SortSelection::Cleared,
			..TableState::default()
		};

		let plan = TableQueryBuilder::for_state(&definition, &state, &TableSettings::default());

		assert!(plan.order().is_empty());
	}

	#[rstest]
	fn test_reordering_sorts_by_position_without_pagination(definition: TableDefinition) {
		let state = TableState {
			reordering: true,
			..filtered_state()
		};

		let plan = TableQueryBuilder::for_state(&definition, &state, &TableSettings::default());

		assert_eq!(plan.order().len(), 1);
		assert_eq!(plan.order()[0].column, "position");
		assert_eq!(plan.order()[0].direction, SortDirection::Asc);
		assert_eq!(plan.limit(), None);
	}

	#[rstest]
	fn test_paginate_while_reordering_setting(definition: TableDefinition) {
		let state = TableState {
			reordering: true,
			..TableState::default()
		};
		let settings = TableSettings {
			paginate_while_reordering: true,
			..TableSettings::default()
		};

		let plan = TableQueryBuilder::for_state(&definition, &state, &settings);

		assert_eq!(plan.limit(), Some(5));
	}

	#[rstest]
	fn test_unpaginated_table() {
		let definition = TableDefinition::builder("posts")
			.paginated(false)
			.build()
			.unwrap();

		let plan = TableQueryBuilder::for_state(
			&definition,
			&TableState::default(),
			&TableSettings::default(),
		);

		assert_eq!(plan.limit(), None);
		assert_eq!(plan.offset(), None);
	}

	#[rstest]
	fn test_reordering_ignored_when_not_reorderable() {
		let definition = TableDefinition::builder("posts")
			.column(Column::new("title").sortable(true))
			.default_sort("title", SortDirection::Asc)
			.build()
			.unwrap();
		let state = TableState {
			reordering: true,
			..TableState::default()
		};

		let plan = TableQueryBuilder::for_state(&definition, &state, &TableSettings::default());

		assert_eq!(plan.order()[0].column, "title");
		assert_eq!(plan.limit(), Some(10));
	}

	#[rstest]
	fn test_pivot_reordering_orders_by_accessor_column() {
		let definition = TableDefinition::builder("post_tags")
			.column(Column::new("name"))
			.relationship(RelationshipDescriptor::BelongsToMany {
				pivot_accessor: "pivot".into(),
				pivot_columns: vec!["sort".into()],
			})
			.reorderable("sort")
			.build()
			.unwrap();
		let state = TableState {
			reordering: true,
			..TableState::default()
		};

		let plan = TableQueryBuilder::for_state(&definition, &state, &TableSettings::default());

		assert_eq!(plan.order().len(), 1);
		assert_eq!(plan.order()[0].column, "pivot.sort");
		assert_eq!(plan.order()[0].direction, SortDirection::Asc);
	}
}
