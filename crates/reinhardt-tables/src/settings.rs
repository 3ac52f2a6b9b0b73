//! Table engine settings
//!
//! Settings control which parts of the table state survive across requests
//! and a few behavioural switches. They are usually loaded from the
//! `[tables]` section of the project's TOML settings.

use crate::error::{Result, TableError};
use serde::{Deserialize, Serialize};

/// Behavioural switches for a table controller
///
/// # Examples
///
/// ```
/// use reinhardt_tables::TableSettings;
///
/// let settings = TableSettings::from_toml_str(
///     r#"
///     persist_filters_in_session = true
///     "#,
/// )
/// .unwrap();
///
/// assert!(settings.persist_filters_in_session);
/// assert!(!settings.persist_search_in_session);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSettings {
	/// Write filter state to the session after every filter change
	pub persist_filters_in_session: bool,
	/// Write the global search query to the session
	pub persist_search_in_session: bool,
	/// Write per-column search queries to the session
	pub persist_column_search_in_session: bool,
	/// Write column visibility toggles to the session
	pub persist_toggled_columns_in_session: bool,
	/// Page size used instead of the table's own default, when it is one of
	/// the table's page options
	pub default_records_per_page: Option<u64>,
	/// Keep offset/limit pagination while reorder mode is active
	pub paginate_while_reordering: bool,
}

impl Default for TableSettings {
	fn default() -> Self {
		Self {
			persist_filters_in_session: false,
			persist_search_in_session: false,
			persist_column_search_in_session: false,
			persist_toggled_columns_in_session: true,
			default_records_per_page: None,
			paginate_while_reordering: false,
		}
	}
}

impl TableSettings {
	/// Parse settings from a TOML document
	///
	/// Missing keys fall back to [`TableSettings::default`].
	pub fn from_toml_str(source: &str) -> Result<Self> {
		toml::from_str(source).map_err(|e| TableError::Settings(e.to_string()))
	}

	/// Enable filter persistence
	pub fn with_persisted_filters(mut self) -> Self {
		self.persist_filters_in_session = true;
		self
	}

	/// Enable search and column search persistence
	pub fn with_persisted_search(mut self) -> Self {
		self.persist_search_in_session = true;
		self.persist_column_search_in_session = true;
		self
	}
}
