//! Record storage capabilities
//!
//! The engine never talks to a database directly. It reads and writes rows
//! through a [`RecordRepository`] and, for related tables, a
//! [`Relationship`].

pub mod memory;

pub use memory::{InMemoryRecords, InMemoryRelationship};

use crate::error::Result;
use crate::query::QueryPlan;
use crate::record::{Attributes, Record, RecordKey};
use async_trait::async_trait;
use serde_json::Value;

/// Access to the rows of the table
#[async_trait]
pub trait RecordRepository: Send + Sync {
	/// Rows matching the plan, in plan order, honoring offset and limit
	async fn fetch(&self, plan: &QueryPlan) -> Result<Vec<Record>>;

	/// Number of rows matching the plan, ignoring offset and limit
	async fn count(&self, plan: &QueryPlan) -> Result<u64>;

	/// Look up one row by key
	async fn find(&self, key: &RecordKey) -> Result<Option<Record>>;

	/// Merge attributes into a stored row
	///
	/// Fails with [`TableError::RecordNotFound`](crate::TableError::RecordNotFound)
	/// when no row has the key.
	async fn update(&self, key: &RecordKey, attributes: Attributes) -> Result<()>;

	/// Persist a whole row, inserting it if missing
	async fn save(&self, record: &Record) -> Result<()>;
}

/// Relationship between the table's rows and an owner record
#[async_trait]
pub trait Relationship: Send + Sync {
	/// Merge attributes into the pivot row of a related record
	async fn update_pivot(&self, key: &RecordKey, attributes: Attributes) -> Result<()>;

	/// The to-one relationship named `inverse` on `record`, pointing back at
	/// the owner
	async fn inverse_for(&self, inverse: &str, record: &Record) -> Result<InverseRelationship>;
}

/// A to-one relationship held by a record through a foreign key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InverseRelationship {
	name: String,
	foreign_key: String,
}

impl InverseRelationship {
	pub fn new(name: impl Into<String>, foreign_key: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			foreign_key: foreign_key.into(),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn foreign_key(&self) -> &str {
		&self.foreign_key
	}

	/// Detach the record from its owner by nulling the foreign key
	///
	/// The record is changed in memory only; persisting it is up to the
	/// caller.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_tables::records::InverseRelationship;
	/// use reinhardt_tables::Record;
	/// use serde_json::json;
	///
	/// let mut comment = Record::new(1).attribute("post_id", 10);
	/// InverseRelationship::new("post", "post_id").dissociate(&mut comment);
	///
	/// assert_eq!(comment.get("post_id"), Some(&json!(null)));
	/// ```
	pub fn dissociate(&self, record: &mut Record) {
		record.set(self.foreign_key.clone(), Value::Null);
	}
}
