//! Mutable table state
//!
//! Each component owns one concern. [`TableState`] is the serializable
//! snapshot of all of them, handed in on mount and read back after every
//! request.

mod filters;
mod pagination;
mod search;
mod selection;
mod sort;
mod toggle;

pub use filters::FilterState;
pub use pagination::{PageMeta, Pagination};
pub use search::SearchState;
pub use selection::{Selection, SelectionState};
pub use sort::{SortSelection, SortState};
pub use toggle::ColumnToggleState;

pub(crate) use sort::ensure_sortable;

use crate::form::FormData;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Request/session scoped snapshot of a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableState {
	/// Filter name → field name → value; `None` fills defaults
	pub filters: Option<FormData>,
	pub sort: SortSelection,
	pub search: String,
	pub column_search: BTreeMap<String, String>,
	pub selection: Selection,
	pub page: u64,
	/// `None` uses the definition's default page size
	pub records_per_page: Option<u64>,
	pub reordering: bool,
	/// `None` uses each column's default visibility
	pub toggled_columns: Option<BTreeMap<String, bool>>,
}

impl Default for TableState {
	fn default() -> Self {
		Self {
			filters: None,
			sort: SortSelection::Unset,
			search: String::new(),
			column_search: BTreeMap::new(),
			selection: Selection::default(),
			page: 1,
			records_per_page: None,
			reordering: false,
			toggled_columns: None,
		}
	}
}
