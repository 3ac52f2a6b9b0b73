//! Global and per-column search

use crate::definition::TableDefinition;
use crate::error::{Result, TableError};
use crate::query::{Condition, Predicate, QueryPlan};
use std::collections::BTreeMap;

/// Search text state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchState {
	search: String,
	column_search: BTreeMap<String, String>,
}

impl SearchState {
	pub fn new(search: String, column_search: BTreeMap<String, String>) -> Self {
		Self {
			search,
			column_search,
		}
	}

	pub fn search(&self) -> &str {
		&self.search
	}

	pub fn column_search(&self) -> &BTreeMap<String, String> {
		&self.column_search
	}

	pub fn set_search(&mut self, search: impl Into<String>) {
		self.search = search.into();
	}

	/// Set the search text of one column; blank text removes it
	pub fn set_column_search(
		&mut self,
		definition: &TableDefinition,
		column: &str,
		search: impl Into<String>,
	) -> Result<()> {
		if !definition.column(column)?.is_individually_searchable() {
			return Err(TableError::ColumnCapability {
				column: column.to_string(),
				capability: "individually searchable",
			});
		}

		let search = search.into();
		if search.trim().is_empty() {
			self.column_search.remove(column);
		} else {
			self.column_search.insert(column.to_string(), search);
		}
		Ok(())
	}

	/// Add search conditions to the query
	///
	/// The global search text matches when any searchable column contains
	/// it. Column searches must all match. Blank text adds nothing.
	pub fn apply_to_query(&self, definition: &TableDefinition, query: &mut QueryPlan) {
		let search = self.search.trim();
		if !search.is_empty() {
			let any: Vec<Condition> = definition
				.columns()
				.iter()
				.filter(|column| column.is_searchable())
				.map(|column| Predicate::contains(column.name(), search).into())
				.collect();
			if !any.is_empty() {
				query.where_condition(Condition::or(any));
			}
		}

		for (column, search) in &self.column_search {
			let search = search.trim();
			let searchable = definition
				.column(column)
				.is_ok_and(|c| c.is_individually_searchable());
			if search.is_empty() || !searchable {
				continue;
			}
			query.where_condition(Predicate::contains(column.as_str(), search).into());
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::column::Column;
	use rstest::{fixture, rstest};

	#[fixture]
	fn definition() -> TableDefinition {
		TableDefinition::builder("posts")
			.column(Column::new("title").searchable(true).individually_searchable(true))
			.column(Column::new("body").searchable(true))
			.column(Column::new("status"))
			.build()
			.unwrap()
	}

	#[rstest]
	fn test_global_search_ors_searchable_columns(definition: TableDefinition) {
		let mut search = SearchState::default();
		search.set_search("  rust ");
		let mut query = QueryPlan::new("posts");

		search.apply_to_query(&definition, &mut query);

		assert_eq!(
			query.conditions(),
			&[Condition::or(vec![
				Predicate::contains("title", "rust").into(),
				Predicate::contains("body", "rust").into(),
			])]
		);
	}

	#[rstest]
	fn test_column_search_ands(definition: TableDefinition) {
		let mut search = SearchState::default();
		search.set_column_search(&definition, "title", "async").unwrap();
		let mut query = QueryPlan::new("posts");

		search.apply_to_query(&definition, &mut query);

		assert_eq!(
			query.conditions(),
			&[Condition::Single(Predicate::contains("title", "async"))]
		);
	}

	#[rstest]
	#[case("")]
	#[case("   ")]
	fn test_blank_search_is_ignored(definition: TableDefinition, #[case] text: &str) {
		let mut search = SearchState::default();
		search.set_search(text);
		search.set_column_search(&definition, "title", text).unwrap();
		let mut query = QueryPlan::new("posts");

		search.apply_to_query(&definition, &mut query);

		assert!(query.conditions().is_empty());
		assert!(search.column_search().is_empty());
	}

	#[rstest]
	fn test_column_search_requires_capability(definition: TableDefinition) {
		let mut search = SearchState::default();

		assert!(matches!(
			search.set_column_search(&definition, "body", "x"),
			Err(TableError::ColumnCapability { .. })
		));
		assert!(matches!(
			search.set_column_search(&definition, "nope", "x"),
			Err(TableError::UnknownColumn(_))
		));
	}
}
