//! Column visibility toggles

use crate::column::Column;
use crate::definition::TableDefinition;
use crate::error::{Result, TableError};
use std::collections::BTreeMap;

/// Visibility of toggleable columns
///
/// Columns that are not toggleable are always visible and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnToggleState {
	toggled: BTreeMap<String, bool>,
}

impl ColumnToggleState {
	/// Toggleable columns start visible unless hidden by default
	pub fn new(definition: &TableDefinition) -> Self {
		let toggled = definition
			.columns()
			.iter()
			.filter(|column| column.is_toggleable())
			.map(|column| (column.name().to_string(), !column.is_hidden_by_default()))
			.collect();
		Self { toggled }
	}

	/// Overlay stored visibility; unknown or non-toggleable names are dropped
	pub fn restore(&mut self, stored: BTreeMap<String, bool>) {
		for (column, visible) in stored {
			if let Some(current) = self.toggled.get_mut(&column) {
				*current = visible;
			}
		}
	}

	/// Flip a column's visibility and return the new value
	pub fn toggle_column(&mut self, definition: &TableDefinition, column: &str) -> Result<bool> {
		definition.column(column)?;
		let visible = self
			.toggled
			.get_mut(column)
			.ok_or_else(|| TableError::ColumnCapability {
				column: column.to_string(),
				capability: "toggleable",
			})?;
		*visible = !*visible;
		Ok(*visible)
	}

	pub fn is_visible(&self, column: &str) -> bool {
		self.toggled.get(column).copied().unwrap_or(true)
	}

	/// Visible columns in definition order
	pub fn visible_columns<'a>(&self, definition: &'a TableDefinition) -> Vec<&'a Column> {
		definition
			.columns()
			.iter()
			.filter(|column| self.is_visible(column.name()))
			.collect()
	}

	pub fn state(&self) -> &BTreeMap<String, bool> {
		&self.toggled
	}
}
