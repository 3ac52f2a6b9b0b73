//! Sort state

use crate::definition::TableDefinition;
use crate::error::{Result, TableError};
use crate::query::SortDirection;
use serde::{Deserialize, Serialize};

/// What the user chose for sorting
///
/// `Unset` lets the definition's default sort apply. `Cleared` means the
/// user switched sorting off, so the default does not apply either.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SortSelection {
	#[default]
	Unset,
	Cleared,
	Column {
		column: String,
		direction: SortDirection,
	},
}

/// Column/direction tracking with default resolution
///
/// # Examples
///
/// ```
/// use reinhardt_tables::query::SortDirection;
/// use reinhardt_tables::state::SortState;
///
/// let mut sort = SortState::new(Some(("created_at".into(), SortDirection::Desc)));
/// assert_eq!(sort.sort(), Some(("created_at", SortDirection::Desc)));
///
/// sort.toggle_sort("title");
/// assert_eq!(sort.sort(), Some(("title", SortDirection::Asc)));
/// sort.toggle_sort("title");
/// assert_eq!(sort.sort(), Some(("title", SortDirection::Desc)));
/// sort.toggle_sort("title");
/// assert_eq!(sort.sort(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SortState {
	default: Option<(String, SortDirection)>,
	selection: SortSelection,
}

impl SortState {
	pub fn new(default: Option<(String, SortDirection)>) -> Self {
		Self {
			default,
			selection: SortSelection::Unset,
		}
	}

	/// Resolve the default sort from the definition
	pub fn from_definition(definition: &TableDefinition) -> Self {
		Self::new(
			definition
				.default_sort()
				.map(|(column, direction)| (column.to_string(), direction)),
		)
	}

	/// Replace the user selection (used when restoring a snapshot)
	pub fn restore(&mut self, selection: SortSelection) {
		self.selection = selection;
	}

	pub fn selection(&self) -> &SortSelection {
		&self.selection
	}

	/// Effective sort: explicit selection, else default, else none
	pub fn sort(&self) -> Option<(&str, SortDirection)> {
		match &self.selection {
			SortSelection::Unset => self
				.default
				.as_ref()
				.map(|(column, direction)| (column.as_str(), *direction)),
			SortSelection::Cleared => None,
			SortSelection::Column { column, direction } => Some((column.as_str(), *direction)),
		}
	}

	pub fn set_sort(&mut self, column: impl Into<String>, direction: SortDirection) {
		self.selection = SortSelection::Column {
			column: column.into(),
			direction,
		};
	}

	/// Switch sorting off, default included
	pub fn clear_sort(&mut self) {
		self.selection = SortSelection::Cleared;
	}

	/// Go back to the default sort
	pub fn reset(&mut self) {
		self.selection = SortSelection::Unset;
	}

	/// Cycle the column: none → ascending → descending → none
	///
	/// A column other than the active one always starts ascending.
	pub fn toggle_sort(&mut self, column: &str) {
		let next = match self.sort() {
			Some((active, SortDirection::Asc)) if active == column => Some(SortDirection::Desc),
			Some((active, SortDirection::Desc)) if active == column => None,
			_ => Some(SortDirection::Asc),
		};
		match next {
			Some(direction) => self.set_sort(column, direction),
			None => self.clear_sort(),
		}
	}
}

/// Check that `column` is declared and sortable
pub(crate) fn ensure_sortable(definition: &TableDefinition, column: &str) -> Result<()> {
	if definition.column(column)?.is_sortable() {
		Ok(())
	} else {
		Err(TableError::ColumnCapability {
			column: column.to_string(),
			capability: "sortable",
		})
	}
}
