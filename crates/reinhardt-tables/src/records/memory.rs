//! In-memory record storage

use super::{InverseRelationship, RecordRepository, Relationship};
use crate::error::{Result, TableError};
use crate::query::QueryPlan;
use crate::record::{Attributes, Record, RecordKey};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Record repository holding rows in a map keyed by primary key
///
/// Plans are evaluated with [`QueryPlan::apply_to`]; rows start out in key
/// order before the plan's ordering is applied. Clones share the same rows.
///
/// ```
/// use reinhardt_tables::records::{InMemoryRecords, RecordRepository};
/// use reinhardt_tables::query::QueryPlan;
/// use reinhardt_tables::Record;
///
/// # async fn example() -> reinhardt_tables::Result<()> {
/// let records = InMemoryRecords::from_records(vec![
///     Record::new(1).attribute("title", "First"),
///     Record::new(2).attribute("title", "Second"),
/// ]);
///
/// assert_eq!(records.count(&QueryPlan::new("posts")).await?, 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecords {
	rows: Arc<RwLock<BTreeMap<RecordKey, Record>>>,
}

impl InMemoryRecords {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
		let rows = records
			.into_iter()
			.map(|record| (record.key().clone(), record))
			.collect();
		Self {
			rows: Arc::new(RwLock::new(rows)),
		}
	}

	pub fn insert(&self, record: Record) {
		self.rows.write().insert(record.key().clone(), record);
	}

	/// Snapshot of one row, bypassing the async interface
	pub fn get(&self, key: &RecordKey) -> Option<Record> {
		self.rows.read().get(key).cloned()
	}

	pub fn len(&self) -> usize {
		self.rows.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.read().is_empty()
	}

	fn snapshot(&self) -> Vec<Record> {
		self.rows.read().values().cloned().collect()
	}
}

#[async_trait]
impl RecordRepository for InMemoryRecords {
	async fn fetch(&self, plan: &QueryPlan) -> Result<Vec<Record>> {
		Ok(plan.apply_to(self.snapshot()))
	}

	async fn count(&self, plan: &QueryPlan) -> Result<u64> {
		let count = self
			.rows
			.read()
			.values()
			.filter(|record| plan.matches(record))
			.count();
		Ok(count as u64)
	}

	async fn find(&self, key: &RecordKey) -> Result<Option<Record>> {
		Ok(self.get(key))
	}

	async fn update(&self, key: &RecordKey, attributes: Attributes) -> Result<()> {
		let mut rows = self.rows.write();
		let record = rows
			.get_mut(key)
			.ok_or_else(|| TableError::RecordNotFound(key.clone()))?;
		record.merge(attributes);
		Ok(())
	}

	async fn save(&self, record: &Record) -> Result<()> {
		self.insert(record.clone());
		Ok(())
	}
}

/// Relationship keeping pivot rows in memory
///
/// Pivot rows are keyed by the related record's key.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRelationship {
	pivots: Arc<RwLock<BTreeMap<RecordKey, Attributes>>>,
	inverse: Option<InverseRelationship>,
}

impl InMemoryRelationship {
	pub fn new() -> Self {
		Self::default()
	}

	/// Inverse relationship handed out by [`Relationship::inverse_for`]
	pub fn with_inverse(mut self, inverse: InverseRelationship) -> Self {
		self.inverse = Some(inverse);
		self
	}

	/// Attach a related record with its pivot attributes
	pub fn attach(&self, key: impl Into<RecordKey>, pivot: Attributes) {
		self.pivots.write().insert(key.into(), pivot);
	}

	/// Snapshot of one pivot row
	pub fn get(&self, key: &RecordKey) -> Option<Attributes> {
		self.pivots.read().get(key).cloned()
	}
}

#[async_trait]
impl Relationship for InMemoryRelationship {
	async fn update_pivot(&self, key: &RecordKey, attributes: Attributes) -> Result<()> {
		let mut pivots = self.pivots.write();
		let pivot = pivots
			.get_mut(key)
			.ok_or_else(|| TableError::RecordNotFound(key.clone()))?;
		for (name, value) in attributes {
			pivot.insert(name, value);
		}
		Ok(())
	}

	async fn inverse_for(&self, inverse: &str, record: &Record) -> Result<InverseRelationship> {
		self.inverse
			.as_ref()
			.filter(|candidate| candidate.name() == inverse)
			.cloned()
			.ok_or_else(|| {
				TableError::Repository(format!(
					"record [{}] has no inverse relationship [{}]",
					record.key(),
					inverse
				))
			})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::query::{Predicate, SortDirection};
	use rstest::{fixture, rstest};
	use serde_json::json;

	#[fixture]
	fn records() -> InMemoryRecords {
		InMemoryRecords::from_records(vec![
			Record::new(1).attribute("status", "active").attribute("sort", 3),
			Record::new(2).attribute("status", "inactive").attribute("sort", 1),
			Record::new(3).attribute("status", "active").attribute("sort", 2),
		])
	}

	#[rstest]
	#[tokio::test]
	async fn test_fetch_applies_plan(records: InMemoryRecords) {
		let mut plan = QueryPlan::new("posts");
		plan.where_condition(Predicate::equals("status", "active").into())
			.order_by("sort", SortDirection::Desc);

		let keys: Vec<_> = records
			.fetch(&plan)
			.await
			.unwrap()
			.into_iter()
			.map(|r| r.key().clone())
			.collect();

		assert_eq!(keys, vec![RecordKey::from(1), RecordKey::from(3)]);
	}

	#[rstest]
	#[tokio::test]
	async fn test_count_ignores_pagination(records: InMemoryRecords) {
		let mut plan = QueryPlan::new("posts");
		plan.paginate(1, 0);

		assert_eq!(records.count(&plan).await.unwrap(), 3);
		assert_eq!(records.fetch(&plan).await.unwrap().len(), 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_update_merges_attributes(records: InMemoryRecords) {
		let mut attributes = Attributes::new();
		attributes.insert("sort".into(), json!(9));

		records.update(&RecordKey::from(2), attributes).await.unwrap();

		let row = records.get(&RecordKey::from(2)).unwrap();
		assert_eq!(row.get("sort"), Some(&json!(9)));
		assert_eq!(row.get("status"), Some(&json!("inactive")));
	}

	#[rstest]
	#[tokio::test]
	async fn test_update_missing_row(records: InMemoryRecords) {
		let result = records.update(&RecordKey::from(99), Attributes::new()).await;
		assert!(matches!(result, Err(TableError::RecordNotFound(_))));
	}

	#[rstest]
	#[tokio::test]
	async fn test_relationship_pivot_update() {
		let relationship = InMemoryRelationship::new();
		relationship.attach(1, Attributes::new());

		let mut attributes = Attributes::new();
		attributes.insert("position".into(), json!(4));
		relationship
			.update_pivot(&RecordKey::from(1), attributes)
			.await
			.unwrap();

		let pivot = relationship.get(&RecordKey::from(1)).unwrap();
		assert_eq!(pivot.get("position"), Some(&json!(4)));
	}

	#[rstest]
	#[tokio::test]
	async fn test_inverse_missing_is_repository_error() {
		let relationship = InMemoryRelationship::new();
		let result = relationship.inverse_for("post", &Record::new(1)).await;
		assert!(matches!(result, Err(TableError::Repository(_))));
	}

	#[rstest]
	#[tokio::test]
	async fn test_inverse_resolved_by_name() {
		let relationship =
			InMemoryRelationship::new().with_inverse(InverseRelationship::new("post", "post_id"));

		let found = relationship.inverse_for("post", &Record::new(1)).await.unwrap();
		let other = relationship.inverse_for("author", &Record::new(1)).await;

		assert_eq!(found.foreign_key(), "post_id");
		assert!(matches!(other, Err(TableError::Repository(message)) if message.contains("author")));
	}
}
