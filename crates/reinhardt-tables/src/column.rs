//! Column definitions
//!
//! The engine does not render cells, so a column is reduced to the flags that
//! change query construction and state: sorting, searching and visibility
//! toggling.

use serde::{Deserialize, Serialize};

/// A table column
///
/// # Example
///
/// ```rust
/// use reinhardt_tables::Column;
///
/// let title = Column::new("title")
///     .label("Post title")
///     .sortable(true)
///     .searchable(true);
///
/// assert_eq!(title.name(), "title");
/// assert!(title.is_sortable());
/// assert!(!title.is_toggleable());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
	name: String,
	label: String,
	sortable: bool,
	searchable: bool,
	individually_searchable: bool,
	toggleable: bool,
	hidden_by_default: bool,
}

impl Column {
	/// Creates a column whose label defaults to its name
	pub fn new(name: impl Into<String>) -> Self {
		let name = name.into();
		Self {
			label: name.clone(),
			name,
			sortable: false,
			searchable: false,
			individually_searchable: false,
			toggleable: false,
			hidden_by_default: false,
		}
	}

	/// Sets the header label
	pub fn label(mut self, label: impl Into<String>) -> Self {
		self.label = label.into();
		self
	}

	/// Sets whether this column can be sorted
	pub fn sortable(mut self, sortable: bool) -> Self {
		self.sortable = sortable;
		self
	}

	/// Sets whether the global search looks into this column
	pub fn searchable(mut self, searchable: bool) -> Self {
		self.searchable = searchable;
		self
	}

	/// Sets whether this column has its own search input
	pub fn individually_searchable(mut self, searchable: bool) -> Self {
		self.individually_searchable = searchable;
		self
	}

	/// Sets whether the user can hide this column, and whether it starts hidden
	pub fn toggleable(mut self, toggleable: bool, hidden_by_default: bool) -> Self {
		self.toggleable = toggleable;
		self.hidden_by_default = toggleable && hidden_by_default;
		self
	}

	/// Returns the name of this column
	///
	/// This is the attribute used for sorting and searching.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Returns the header text for this column
	pub fn header(&self) -> &str {
		&self.label
	}

	pub fn is_sortable(&self) -> bool {
		self.sortable
	}

	pub fn is_searchable(&self) -> bool {
		self.searchable
	}

	pub fn is_individually_searchable(&self) -> bool {
		self.individually_searchable
	}

	pub fn is_toggleable(&self) -> bool {
		self.toggleable
	}

	pub fn is_hidden_by_default(&self) -> bool {
		self.hidden_by_default
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_column_creation() {
		let column = Column::new("email");
		assert_eq!(column.name(), "email");
		assert_eq!(column.header(), "email");
		assert!(!column.is_sortable());
		assert!(!column.is_searchable());
		assert!(!column.is_toggleable());
	}

	#[rstest]
	fn test_column_builder() {
		let column = Column::new("email")
			.label("E-mail")
			.sortable(true)
			.searchable(true)
			.individually_searchable(true)
			.toggleable(true, true);

		assert_eq!(column.header(), "E-mail");
		assert!(column.is_sortable());
		assert!(column.is_searchable());
		assert!(column.is_individually_searchable());
		assert!(column.is_toggleable());
		assert!(column.is_hidden_by_default());
	}

	#[rstest]
	fn test_hidden_requires_toggleable() {
		let column = Column::new("email").toggleable(false, true);
		assert!(!column.is_hidden_by_default());
	}
}
