//! Manual record ordering
//!
//! Writes 1-based positions into the reorder column, either on the record
//! rows themselves or, for many-to-many tables whose pivot carries the
//! column, on the pivot rows.

use crate::definition::TableDefinition;
use crate::error::{Result, TableError};
use crate::record::{Attributes, RecordKey};
use crate::records::{RecordRepository, Relationship};
use serde_json::Value;

/// Where positions are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderMode {
	/// Record rows
	Direct,
	/// Pivot rows of a many-to-many relationship
	Pivot,
}

/// Applies a new order to records
pub struct ReorderEngine<'a> {
	definition: &'a TableDefinition,
	records: &'a dyn RecordRepository,
	relationship: Option<&'a dyn Relationship>,
}

impl<'a> ReorderEngine<'a> {
	pub fn new(
		definition: &'a TableDefinition,
		records: &'a dyn RecordRepository,
		relationship: Option<&'a dyn Relationship>,
	) -> Self {
		Self {
			definition,
			records,
			relationship,
		}
	}

	/// `None` when the table is not reorderable
	pub fn mode(&self) -> Option<ReorderMode> {
		let column = self.definition.reorder_column()?;
		Some(if self.definition.relationship().pivot_contains(column) {
			ReorderMode::Pivot
		} else {
			ReorderMode::Direct
		})
	}

	/// Give `ordered_keys[i]` position `i + 1`
	///
	/// Returns the number of updated rows; without a reorder column nothing
	/// happens and `0` is returned. Updates are not rolled back if a later
	/// key is missing.
	pub async fn reorder(&self, ordered_keys: &[RecordKey]) -> Result<usize> {
		let Some(column) = self.definition.reorder_column() else {
			tracing::debug!(table = %self.definition.name(), "Reorder ignored, table is not reorderable");
			return Ok(0);
		};
		let relationship = match self.mode() {
			Some(ReorderMode::Pivot) => Some(self.relationship.ok_or_else(|| {
				TableError::Configuration(format!(
					"table [{}] reorders pivot rows but has no relationship",
					self.definition.name()
				))
			})?),
			_ => None,
		};

		for (index, key) in ordered_keys.iter().enumerate() {
			let mut attributes = Attributes::new();
			attributes.insert(column.to_string(), Value::from(index as u64 + 1));

			match relationship {
				Some(relationship) => relationship.update_pivot(key, attributes).await?,
				None => self.records.update(key, attributes).await?,
			}
		}

		tracing::info!(
			table = %self.definition.name(),
			column = %column,
			mode = ?self.mode(),
			records = ordered_keys.len(),
			"Records reordered"
		);
		Ok(ordered_keys.len())
	}
}
