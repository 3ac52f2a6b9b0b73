//! Table controller
//!
//! Composes the state components and exposes the operations a client can
//! call. Each operation mutates the owning component, runs the follow-up
//! effects (session write, selection reset, page reset) and leaves the
//! record set to be recomputed by [`TableController::records`].

use crate::action::{
	ActionDispatcher, ActionInvocation, ActionOutcome, ActionScope, ExecutionScope, Notification,
};
use crate::builder::TableQueryBuilder;
use crate::definition::TableDefinition;
use crate::error::{Result, TableError};
use crate::form::{FormData, GroupState};
use crate::query::{QueryPlan, SortDirection};
use crate::record::{Record, RecordKey};
use crate::records::{RecordRepository, Relationship};
use crate::reorder::ReorderEngine;
use crate::session::{SessionStore, load_typed, save_typed};
use crate::settings::TableSettings;
use crate::state::{
	ColumnToggleState, FilterState, PageMeta, Pagination, SearchState, Selection, SelectionState,
	SortState, TableState, ensure_sortable,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// One page of records with its pagination metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TablePage {
	pub records: Vec<Record>,
	pub meta: PageMeta,
}

/// Collects the capabilities and the incoming state of a controller
pub struct TableControllerBuilder {
	definition: Arc<TableDefinition>,
	records: Arc<dyn RecordRepository>,
	relationship: Option<Arc<dyn Relationship>>,
	session: Option<Arc<dyn SessionStore>>,
	settings: TableSettings,
	state: TableState,
}

impl TableControllerBuilder {
	pub fn relationship(mut self, relationship: Arc<dyn Relationship>) -> Self {
		self.relationship = Some(relationship);
		self
	}

	pub fn session(mut self, session: Arc<dyn SessionStore>) -> Self {
		self.session = Some(session);
		self
	}

	pub fn settings(mut self, settings: TableSettings) -> Self {
		self.settings = settings;
		self
	}

	/// State handed in by the client, usually the previous snapshot
	pub fn state(mut self, state: TableState) -> Self {
		self.state = state;
		self
	}

	/// Hydrate every component
	///
	/// Persisted session values win over the incoming state. A session that
	/// cannot be read is logged and ignored.
	pub async fn mount(self) -> Result<TableController> {
		let Self {
			definition,
			records,
			relationship,
			session,
			settings,
			state,
		} = self;
		let keys = definition.session_keys();
		let store = session.as_deref();

		let mut filters = FilterState::new(&definition);
		let persisted_filters: Option<FormData> = load_persisted(
			store,
			settings.persist_filters_in_session,
			&definition,
			&keys.filters,
		)
		.await;
		filters.restore(state.filters, persisted_filters);

		let search_text = load_persisted(
			store,
			settings.persist_search_in_session,
			&definition,
			&keys.search,
		)
		.await
		.unwrap_or(state.search);
		let column_search = load_persisted(
			store,
			settings.persist_column_search_in_session,
			&definition,
			&keys.column_search,
		)
		.await
		.unwrap_or(state.column_search);
		let search = SearchState::new(search_text, column_search);

		let mut toggles = ColumnToggleState::new(&definition);
		if let Some(toggled) = state.toggled_columns {
			toggles.restore(toggled);
		}
		let persisted_toggles: Option<BTreeMap<String, bool>> = load_persisted(
			store,
			settings.persist_toggled_columns_in_session,
			&definition,
			&keys.toggled_columns,
		)
		.await;
		if let Some(toggled) = persisted_toggles {
			toggles.restore(toggled);
		}

		let mut sort = SortState::from_definition(&definition);
		sort.restore(state.sort);

		let pagination = Pagination::restore(
			&definition,
			state.page,
			state.records_per_page.or(settings.default_records_per_page),
		);

		tracing::debug!(
			table = %definition.name(),
			active_filters = ?filters.active_filters(&definition),
			page = pagination.page(),
			"Table mounted"
		);

		Ok(TableController {
			reordering: state.reordering && definition.is_reorderable(),
			selection: SelectionState::new(state.selection),
			definition,
			records,
			relationship,
			session,
			settings,
			filters,
			sort,
			search,
			pagination,
			toggles,
			dispatcher: ActionDispatcher::new(),
			notifications: Vec::new(),
		})
	}
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Request-scoped table engine
///
/// ```mermaid
/// graph LR
///     Client -->|apply_filter / remove_filter| FilterState
///     Client -->|toggle_sort / set_sort| SortState
///     Client -->|set_search| SearchState
///     Client -->|select / select_all| SelectionState
///     Client -->|set_page| Pagination
///     Client -->|reorder| ReorderEngine
///     Client -->|mount / confirm / execute| ActionDispatcher
///     FilterState -->|clears| SelectionState
///     FilterState -->|resets| Pagination
///     FilterState --> Session[(SessionStore)]
///     SearchState --> Session
///     FilterState & SearchState & SortState & Pagination --> TableQueryBuilder
///     TableQueryBuilder --> QueryPlan --> RecordRepository
///     ActionDispatcher --> RecordRepository
///     ReorderEngine --> RecordRepository
///     ReorderEngine --> Relationship
/// ```
///
/// # Examples
///
/// ```
/// use reinhardt_tables::filter::SelectFilter;
/// use reinhardt_tables::records::InMemoryRecords;
/// use reinhardt_tables::{Record, RecordKey, TableController, TableDefinition};
/// use serde_json::json;
/// use std::sync::Arc;
///
/// # async fn example() -> reinhardt_tables::Result<()> {
/// let definition = TableDefinition::builder("posts")
///     .filter(SelectFilter::new("status"))
///     .build()?;
/// let records = InMemoryRecords::from_records([
///     Record::new(1).attribute("status", "active"),
///     Record::new(2).attribute("status", "draft"),
/// ]);
///
/// let mut table = TableController::builder(Arc::new(definition), Arc::new(records))
///     .mount()
///     .await?;
///
/// table.select(RecordKey::from(2));
/// table
///     .apply_filter("status", [("value".to_string(), json!("active"))].into())
///     .await?;
///
/// assert!(table.selection().is_empty());
/// assert_eq!(table.records().await?.records.len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct TableController {
	definition: Arc<TableDefinition>,
	records: Arc<dyn RecordRepository>,
	relationship: Option<Arc<dyn Relationship>>,
	session: Option<Arc<dyn SessionStore>>,
	settings: TableSettings,
	filters: FilterState,
	sort: SortState,
	search: SearchState,
	selection: SelectionState,
	pagination: Pagination,
	toggles: ColumnToggleState,
	reordering: bool,
	dispatcher: ActionDispatcher,
	notifications: Vec<Notification>,
}

impl TableController {
	pub fn builder(
		definition: Arc<TableDefinition>,
		records: Arc<dyn RecordRepository>,
	) -> TableControllerBuilder {
		TableControllerBuilder {
			definition,
			records,
			relationship: None,
			session: None,
			settings: TableSettings::default(),
			state: TableState::default(),
		}
	}

	pub fn definition(&self) -> &TableDefinition {
		&self.definition
	}

	pub fn settings(&self) -> &TableSettings {
		&self.settings
	}

	pub fn filters(&self) -> &FilterState {
		&self.filters
	}

	pub fn sort(&self) -> &SortState {
		&self.sort
	}

	pub fn search(&self) -> &SearchState {
		&self.search
	}

	pub fn selection(&self) -> &SelectionState {
		&self.selection
	}

	pub fn pagination(&self) -> &Pagination {
		&self.pagination
	}

	pub fn column_toggles(&self) -> &ColumnToggleState {
		&self.toggles
	}

	pub fn dispatcher(&self) -> &ActionDispatcher {
		&self.dispatcher
	}

	/// Whether reorder mode is on; always `false` for tables without a
	/// reorder column
	pub fn is_reordering(&self) -> bool {
		self.reordering && self.definition.is_reorderable()
	}

	// Filters

	pub async fn apply_filter(&mut self, name: &str, values: GroupState) -> Result<()> {
		self.filters.apply_filter(&self.definition, name, values)?;
		tracing::debug!(table = %self.definition.name(), filter = %name, "Filter applied");
		self.filters_changed().await
	}

	/// Blank one field of a filter, or all of its fields when `field` is
	/// `None` or not declared by the filter
	pub async fn remove_filter(&mut self, name: &str, field: Option<&str>) -> Result<()> {
		self.filters.remove_filter(&self.definition, name, field)?;
		tracing::debug!(
			table = %self.definition.name(),
			filter = %name,
			field = ?field,
			"Filter removed"
		);
		self.filters_changed().await
	}

	pub async fn remove_all_filters(&mut self) -> Result<()> {
		self.filters.remove_all_filters(&self.definition);
		tracing::debug!(table = %self.definition.name(), "All filters removed");
		self.filters_changed().await
	}

	/// Back to the filters' schema defaults
	pub async fn reset_filters(&mut self) -> Result<()> {
		self.filters.reset_to_defaults();
		tracing::debug!(table = %self.definition.name(), "Filters reset");
		self.filters_changed().await
	}

	async fn filters_changed(&mut self) -> Result<()> {
		self.selection.deselect_all();
		self.pagination.reset_page();
		self.persist(
			self.settings.persist_filters_in_session,
			&self.definition.session_keys().filters,
			self.filters.raw_state(),
		)
		.await
	}

	// Sorting

	pub fn toggle_sort(&mut self, column: &str) -> Result<()> {
		ensure_sortable(&self.definition, column)?;
		self.sort.toggle_sort(column);
		self.pagination.reset_page();
		tracing::debug!(table = %self.definition.name(), sort = ?self.sort.sort(), "Sort toggled");
		Ok(())
	}

	pub fn set_sort(&mut self, column: &str, direction: SortDirection) -> Result<()> {
		ensure_sortable(&self.definition, column)?;
		self.sort.set_sort(column, direction);
		self.pagination.reset_page();
		Ok(())
	}

	/// Switch sorting off, default sort included
	pub fn clear_sort(&mut self) {
		self.sort.clear_sort();
		self.pagination.reset_page();
	}

	// Reordering

	/// Flip reorder mode and return the new state
	pub fn toggle_reordering(&mut self) -> bool {
		if self.definition.is_reorderable() {
			self.reordering = !self.reordering;
		}
		tracing::debug!(
			table = %self.definition.name(),
			reordering = self.is_reordering(),
			"Reordering toggled"
		);
		self.is_reordering()
	}

	/// Give the keys 1-based positions in the given order
	pub async fn reorder(&mut self, ordered_keys: &[RecordKey]) -> Result<usize> {
		ReorderEngine::new(
			&self.definition,
			self.records.as_ref(),
			self.relationship.as_deref(),
		)
		.reorder(ordered_keys)
		.await
	}

	// Selection

	pub fn select(&mut self, key: RecordKey) {
		self.selection.select(key);
	}

	pub fn deselect(&mut self, key: &RecordKey) {
		self.selection.deselect(key);
	}

	pub fn select_page(&mut self, keys: impl IntoIterator<Item = RecordKey>) {
		self.selection.select_page(keys);
	}

	pub fn select_all(&mut self) {
		self.selection.select_all();
	}

	pub fn deselect_all(&mut self) {
		self.selection.deselect_all();
	}

	pub fn is_selected(&self, key: &RecordKey) -> bool {
		self.selection.is_selected(key)
	}

	/// Expand the selection into records against the current filters
	pub async fn selected_records(&self) -> Result<Vec<Record>> {
		self.selection
			.resolve(self.records.as_ref(), &self.query_builder().build_unpaginated())
			.await
	}

	// Actions

	/// Mount a record action (`Some(key)`) or a bulk action (`None`)
	pub fn mount_action(
		&mut self,
		name: &str,
		record: Option<RecordKey>,
	) -> Result<&ActionInvocation> {
		self.dispatcher.mount(&self.definition, name, record)
	}

	pub fn confirm_action(&mut self) -> Result<()> {
		self.dispatcher.confirm()
	}

	/// Discard the mounted action without a notification
	pub fn cancel_action(&mut self) -> bool {
		self.dispatcher.cancel().is_some()
	}

	pub fn set_action_form_state(&mut self, data: GroupState) -> Result<()> {
		self.dispatcher.set_form_state(data)
	}

	/// Execute the mounted action
	///
	/// The outcome's notification is also queued for
	/// [`TableController::take_notifications`]. A successful bulk action
	/// clears the selection unless the action opted out.
	pub async fn execute_action(&mut self) -> Result<ActionOutcome> {
		let (deselect, failure) = match self.dispatcher.mounted() {
			Some(invocation) => (
				invocation.scope() == ActionScope::Bulk
					&& invocation.action().deselects_records_after_completion(),
				Some(invocation.action().failure_notification()),
			),
			None => (false, None),
		};
		let query = self.query_builder().build_unpaginated();

		let result = self
			.dispatcher
			.execute(ExecutionScope {
				definition: &self.definition,
				records: self.records.as_ref(),
				relationship: self.relationship.as_deref(),
				selection: &self.selection,
				query: &query,
			})
			.await;

		match result {
			Ok(outcome) => {
				if outcome.is_success() && deselect {
					self.selection.deselect_all();
				}
				self.notifications.push(outcome.notification.clone());
				Ok(outcome)
			}
			Err(error) => {
				if let (TableError::ActionProcedure { message, .. }, Some(failure)) =
					(&error, failure)
				{
					self.notifications.push(failure.with_body(message.clone()));
				}
				Err(error)
			}
		}
	}

	/// Drain queued notifications
	pub fn take_notifications(&mut self) -> Vec<Notification> {
		std::mem::take(&mut self.notifications)
	}

	// Pagination

	pub fn set_page(&mut self, page: u64) -> Result<()> {
		self.pagination.set_page(page)
	}

	pub fn set_records_per_page(&mut self, records_per_page: u64) -> Result<()> {
		self.pagination
			.set_records_per_page(&self.definition, records_per_page)
	}

	// Search

	/// Change the global search; keeps the selection and the current page
	pub async fn set_search(&mut self, search: impl Into<String>) -> Result<()> {
		self.search.set_search(search);
		self.persist(
			self.settings.persist_search_in_session,
			&self.definition.session_keys().search,
			&self.search.search(),
		)
		.await
	}

	pub async fn set_column_search(
		&mut self,
		column: &str,
		search: impl Into<String>,
	) -> Result<()> {
		self.search
			.set_column_search(&self.definition, column, search)?;
		self.persist(
			self.settings.persist_column_search_in_session,
			&self.definition.session_keys().column_search,
			self.search.column_search(),
		)
		.await
	}

	// Columns

	/// Flip a toggleable column and return its new visibility
	pub async fn toggle_column(&mut self, column: &str) -> Result<bool> {
		let visible = self.toggles.toggle_column(&self.definition, column)?;
		self.persist(
			self.settings.persist_toggled_columns_in_session,
			&self.definition.session_keys().toggled_columns,
			self.toggles.state(),
		)
		.await?;
		Ok(visible)
	}

	// Records

	fn query_builder(&self) -> TableQueryBuilder<'_> {
		TableQueryBuilder::new(
			&self.definition,
			&self.settings,
			&self.filters,
			&self.search,
			&self.sort,
			&self.pagination,
		)
		.reordering(self.reordering)
	}

	/// Plan for the current page
	pub fn query(&self) -> QueryPlan {
		self.query_builder().build()
	}

	/// Fetch the current page
	pub async fn records(&self) -> Result<TablePage> {
		let builder = self.query_builder();
		let plan = builder.build();
		let records = self.records.fetch(&plan).await?;
		let total = self.records.count(&plan).await?;

		let meta = if builder.paginates() {
			self.pagination.meta(total)
		} else {
			PageMeta {
				page: 1,
				records_per_page: total,
				total,
				last_page: 1,
			}
		};
		Ok(TablePage { records, meta })
	}

	/// Serializable snapshot of the current state
	pub fn snapshot(&self) -> TableState {
		TableState {
			filters: Some(self.filters.raw_state().clone()),
			sort: self.sort.selection().clone(),
			search: self.search.search().to_string(),
			column_search: self.search.column_search().clone(),
			selection: self.selection.selected().clone(),
			page: self.pagination.page(),
			records_per_page: Some(self.pagination.records_per_page()),
			reordering: self.reordering,
			toggled_columns: Some(self.toggles.state().clone()),
		}
	}

	/// Current selection
	pub fn selected(&self) -> &Selection {
		self.selection.selected()
	}

	async fn persist<T>(&self, enabled: bool, key: &str, value: &T) -> Result<()>
	where
		T: Serialize + Sync + ?Sized,
	{
		if !enabled {
			return Ok(());
		}
		let Some(session) = &self.session else {
			return Ok(());
		};
		if let Err(error) = save_typed(session.as_ref(), key, value).await {
			tracing::warn!(
				table = %self.definition.name(),
				key = %key,
				error = %error,
				"Failed to persist table state"
			);
			return Err(error.into());
		}
		Ok(())
	}
}

async fn load_persisted<T>(
	store: Option<&dyn SessionStore>,
	enabled: bool,
	definition: &TableDefinition,
	key: &str,
) -> Option<T>
where
	T: DeserializeOwned,
{
	if !enabled {
		return None;
	}
	match load_typed(store?, key).await {
		Ok(value) => value,
		Err(error) => {
			tracing::warn!(
				table = %definition.name(),
				key = %key,
				error = %error,
				"Ignoring unreadable session state"
			);
			None
		}
	}
}
