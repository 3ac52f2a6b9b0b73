//! Table definitions
//!
//! A [`TableDefinition`] describes one table: its columns, filters, actions,
//! base query and behavioural flags. It is built once by the hosting page,
//! shared behind an `Arc`, and never mutated by the engine. The builder turns
//! the declared objects into name-keyed registries so every name the client
//! sends is resolved explicitly.

use crate::action::{Action, ActionScope};
use crate::column::Column;
use crate::error::{Result, TableError};
use crate::filter::TableFilter;
use crate::form::Form;
use crate::query::{QueryPlan, SortDirection};
use crate::session::SessionKeys;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Page size options used when none are configured
pub const DEFAULT_PAGE_OPTIONS: [u64; 3] = [10, 25, 50];

/// How the table's rows relate to an owner record
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RelationshipDescriptor {
	/// Rows are read straight from their own table
	#[default]
	None,
	/// To-many relationship; each row holds the inverse to-one relationship
	HasMany { inverse: String },
	/// Many-to-many relationship through a pivot table
	BelongsToMany {
		pivot_accessor: String,
		pivot_columns: Vec<String>,
	},
}

impl RelationshipDescriptor {
	/// Whether `column` lives on the pivot table
	pub fn pivot_contains(&self, column: &str) -> bool {
		match self {
			RelationshipDescriptor::BelongsToMany { pivot_columns, .. } => {
				pivot_columns.iter().any(|c| c == column)
			}
			_ => false,
		}
	}

	/// Name of the inverse relationship held by the rows of a to-many table
	pub fn inverse(&self) -> Option<&str> {
		match self {
			RelationshipDescriptor::HasMany { inverse } => Some(inverse),
			_ => None,
		}
	}

	/// Column reference for `column`, prefixed with the pivot accessor when
	/// the column lives on the pivot table
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_tables::RelationshipDescriptor;
	///
	/// let tags = RelationshipDescriptor::BelongsToMany {
	///     pivot_accessor: "pivot".into(),
	///     pivot_columns: vec!["sort".into()],
	/// };
	///
	/// assert_eq!(tags.qualify("sort"), "pivot.sort");
	/// assert_eq!(tags.qualify("name"), "name");
	/// ```
	pub fn qualify(&self, column: &str) -> String {
		match self {
			RelationshipDescriptor::BelongsToMany { pivot_accessor, .. }
				if self.pivot_contains(column) =>
			{
				format!("{}.{}", pivot_accessor, column)
			}
			_ => column.to_string(),
		}
	}
}

/// Immutable description of a table
#[derive(Debug, Clone)]
pub struct TableDefinition {
	name: String,
	base_query: QueryPlan,
	columns: Vec<Column>,
	column_index: HashMap<String, usize>,
	filters: Vec<Arc<dyn TableFilter>>,
	filter_index: HashMap<String, usize>,
	record_actions: HashMap<String, Arc<Action>>,
	bulk_actions: HashMap<String, Arc<Action>>,
	default_sort: Option<(String, SortDirection)>,
	paginated: bool,
	page_options: Vec<u64>,
	default_records_per_page: u64,
	reorder_column: Option<String>,
	relationship: RelationshipDescriptor,
	filters_form_columns: u16,
	session_keys: SessionKeys,
}

impl TableDefinition {
	/// Start building a definition
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_tables::{Column, TableDefinition};
	/// use reinhardt_tables::filter::SelectFilter;
	/// use reinhardt_tables::query::SortDirection;
	///
	/// let definition = TableDefinition::builder("posts")
	///     .column(Column::new("title").sortable(true).searchable(true))
	///     .filter(SelectFilter::new("status").multiple(true))
	///     .default_sort("title", SortDirection::Asc)
	///     .build()
	///     .unwrap();
	///
	/// assert!(definition.filter("status").is_ok());
	/// assert!(definition.filter("author").is_err());
	/// ```
	pub fn builder(name: impl Into<String>) -> TableDefinitionBuilder {
		TableDefinitionBuilder::new(name)
	}

	/// Table identity, used for session keys
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Seed of every query built for the table
	pub fn base_query(&self) -> &QueryPlan {
		&self.base_query
	}

	pub fn columns(&self) -> &[Column] {
		&self.columns
	}

	pub fn column(&self, name: &str) -> Result<&Column> {
		self.column_index
			.get(name)
			.map(|&i| &self.columns[i])
			.ok_or_else(|| TableError::UnknownColumn(name.to_string()))
	}

	/// Filters in declaration order
	pub fn filters(&self) -> &[Arc<dyn TableFilter>] {
		&self.filters
	}

	pub fn filter(&self, name: &str) -> Result<&Arc<dyn TableFilter>> {
		self.filter_index
			.get(name)
			.map(|&i| &self.filters[i])
			.ok_or_else(|| TableError::UnknownFilter(name.to_string()))
	}

	pub fn record_action(&self, name: &str) -> Result<&Arc<Action>> {
		self.record_actions
			.get(name)
			.ok_or_else(|| TableError::UnknownAction(name.to_string()))
	}

	pub fn bulk_action(&self, name: &str) -> Result<&Arc<Action>> {
		self.bulk_actions
			.get(name)
			.ok_or_else(|| TableError::UnknownAction(name.to_string()))
	}

	pub fn default_sort(&self) -> Option<(&str, SortDirection)> {
		self.default_sort
			.as_ref()
			.map(|(column, direction)| (column.as_str(), *direction))
	}

	pub fn is_paginated(&self) -> bool {
		self.paginated
	}

	pub fn page_options(&self) -> &[u64] {
		&self.page_options
	}

	pub fn default_records_per_page(&self) -> u64 {
		self.default_records_per_page
	}

	pub fn reorder_column(&self) -> Option<&str> {
		self.reorder_column.as_deref()
	}

	pub fn is_reorderable(&self) -> bool {
		self.reorder_column.is_some()
	}

	pub fn relationship(&self) -> &RelationshipDescriptor {
		&self.relationship
	}

	/// Grid columns of the filters form
	pub fn filters_form_columns(&self) -> u16 {
		self.filters_form_columns
	}

	pub fn session_keys(&self) -> &SessionKeys {
		&self.session_keys
	}

	/// Filters form with one group per filter, filled from defaults
	pub fn filters_form(&self) -> Form {
		self.filters
			.iter()
			.fold(Form::new(), |form, filter| {
				form.with_group(filter.name(), filter.form_schema())
			})
	}
}

/// Builder for [`TableDefinition`]
#[derive(Debug)]
pub struct TableDefinitionBuilder {
	name: String,
	base_query: Option<QueryPlan>,
	columns: Vec<Column>,
	filters: Vec<Arc<dyn TableFilter>>,
	actions: Vec<Action>,
	default_sort: Option<(String, SortDirection)>,
	paginated: bool,
	page_options: Vec<u64>,
	default_records_per_page: Option<u64>,
	reorder_column: Option<String>,
	relationship: RelationshipDescriptor,
	filters_form_columns: u16,
}

impl TableDefinitionBuilder {
	fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			base_query: None,
			columns: Vec::new(),
			filters: Vec::new(),
			actions: Vec::new(),
			default_sort: None,
			paginated: true,
			page_options: DEFAULT_PAGE_OPTIONS.to_vec(),
			default_records_per_page: None,
			reorder_column: None,
			relationship: RelationshipDescriptor::None,
			filters_form_columns: 1,
		}
	}

	pub fn column(mut self, column: Column) -> Self {
		self.columns.push(column);
		self
	}

	pub fn filter(mut self, filter: impl TableFilter + 'static) -> Self {
		self.filters.push(Arc::new(filter));
		self
	}

	/// Register an action; its scope decides the registry
	pub fn action(mut self, action: Action) -> Self {
		self.actions.push(action);
		self
	}

	/// Base query; defaults to every row of a table named after the definition
	pub fn query(mut self, query: QueryPlan) -> Self {
		self.base_query = Some(query);
		self
	}

	pub fn default_sort(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
		self.default_sort = Some((column.into(), direction));
		self
	}

	pub fn paginated(mut self, paginated: bool) -> Self {
		self.paginated = paginated;
		self
	}

	pub fn page_options(mut self, options: Vec<u64>) -> Self {
		self.page_options = options;
		self
	}

	/// Initial page size; defaults to the first page option
	pub fn default_records_per_page(mut self, records_per_page: u64) -> Self {
		self.default_records_per_page = Some(records_per_page);
		self
	}

	/// Column holding the manual sort position
	pub fn reorderable(mut self, column: impl Into<String>) -> Self {
		self.reorder_column = Some(column.into());
		self
	}

	pub fn relationship(mut self, relationship: RelationshipDescriptor) -> Self {
		self.relationship = relationship;
		self
	}

	pub fn filters_form_columns(mut self, columns: u16) -> Self {
		self.filters_form_columns = columns;
		self
	}

	/// Validate the declarations and build the registries
	pub fn build(self) -> Result<TableDefinition> {
		let column_index = index_unique(
			self.columns.iter().map(Column::name),
			"column",
		)?;
		let filter_index = index_unique(self.filters.iter().map(|f| f.name()), "filter")?;

		let mut record_actions = HashMap::new();
		let mut bulk_actions = HashMap::new();
		for action in self.actions {
			let registry = match action.scope() {
				ActionScope::Record => &mut record_actions,
				ActionScope::Bulk => &mut bulk_actions,
			};
			let name = action.name().to_string();
			if registry.insert(name.clone(), Arc::new(action)).is_some() {
				return Err(TableError::Configuration(format!(
					"duplicate action name [{}]",
					name
				)));
			}
		}

		if self.paginated && self.page_options.is_empty() {
			return Err(TableError::Configuration(
				"paginated tables need at least one page size option".into(),
			));
		}
		let default_records_per_page = match self.default_records_per_page {
			Some(size) if self.paginated && !self.page_options.contains(&size) => {
				return Err(TableError::Configuration(format!(
					"default page size {} is not one of the page options",
					size
				)));
			}
			Some(size) => size,
			None => self
				.page_options
				.first()
				.copied()
				.unwrap_or(DEFAULT_PAGE_OPTIONS[0]),
		};

		Ok(TableDefinition {
			base_query: self
				.base_query
				.unwrap_or_else(|| QueryPlan::new(self.name.clone())),
			session_keys: SessionKeys::for_table(&self.name),
			name: self.name,
			columns: self.columns,
			column_index,
			filters: self.filters,
			filter_index,
			record_actions,
			bulk_actions,
			default_sort: self.default_sort,
			paginated: self.paginated,
			page_options: self.page_options,
			default_records_per_page,
			reorder_column: self.reorder_column,
			relationship: self.relationship,
			filters_form_columns: self.filters_form_columns,
		})
	}
}

fn index_unique<'a>(
	names: impl Iterator<Item = &'a str>,
	kind: &str,
) -> Result<HashMap<String, usize>> {
	let mut index = HashMap::new();
	for (position, name) in names.enumerate() {
		if index.insert(name.to_string(), position).is_some() {
			return Err(TableError::Configuration(format!(
				"duplicate {} name [{}]",
				kind, name
			)));
		}
	}
	Ok(index)
}
