//! Page tracking

use crate::definition::TableDefinition;
use crate::error::{Result, TableError};
use crate::query::QueryPlan;
use serde::{Deserialize, Serialize};

/// Current page and page size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
	page: u64,
	records_per_page: u64,
}

/// Pagination metadata of a fetched page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
	pub page: u64,
	pub records_per_page: u64,
	pub total: u64,
	pub last_page: u64,
}

impl Pagination {
	/// First page at the definition's default size
	pub fn new(definition: &TableDefinition) -> Self {
		Self {
			page: 1,
			records_per_page: definition.default_records_per_page(),
		}
	}

	/// Restore a stored page and size
	///
	/// A size outside the page options falls back to the default and page `0`
	/// becomes page 1, so stale snapshots never fail a mount.
	pub fn restore(definition: &TableDefinition, page: u64, records_per_page: Option<u64>) -> Self {
		let records_per_page = records_per_page
			.filter(|size| definition.page_options().contains(size))
			.unwrap_or(definition.default_records_per_page());
		Self {
			page: page.max(1),
			records_per_page,
		}
	}

	pub fn page(&self) -> u64 {
		self.page
	}

	pub fn records_per_page(&self) -> u64 {
		self.records_per_page
	}

	/// Pages are 1-based
	pub fn set_page(&mut self, page: u64) -> Result<()> {
		if page == 0 {
			return Err(TableError::InvalidPage(page));
		}
		self.page = page;
		Ok(())
	}

	/// Change the page size and go back to page 1
	pub fn set_records_per_page(
		&mut self,
		definition: &TableDefinition,
		records_per_page: u64,
	) -> Result<()> {
		if !definition.page_options().contains(&records_per_page) {
			return Err(TableError::InvalidRecordsPerPage(records_per_page));
		}
		self.records_per_page = records_per_page;
		self.page = 1;
		Ok(())
	}

	pub fn reset_page(&mut self) {
		self.page = 1;
	}

	pub fn apply_to_query(&self, query: &mut QueryPlan) {
		query.paginate(
			self.records_per_page,
			(self.page - 1).saturating_mul(self.records_per_page),
		);
	}

	/// Metadata for `total` matching records
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_tables::TableDefinition;
	/// use reinhardt_tables::state::Pagination;
	///
	/// let definition = TableDefinition::builder("posts").build().unwrap();
	/// let meta = Pagination::new(&definition).meta(21);
	///
	/// assert_eq!(meta.last_page, 3);
	/// ```
	pub fn meta(&self, total: u64) -> PageMeta {
		PageMeta {
			page: self.page,
			records_per_page: self.records_per_page,
			total,
			last_page: total.div_ceil(self.records_per_page.max(1)).max(1),
		}
	}
}
