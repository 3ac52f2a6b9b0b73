//! Common test fixtures for reinhardt-tables tests

#![allow(dead_code)]

use async_trait::async_trait;
use reinhardt_tables::action::{Action, DissociateBulkAction, FnProcedure};
use reinhardt_tables::filter::{SelectFilter, ToggleFilter};
use reinhardt_tables::form::GroupState;
use reinhardt_tables::query::{Predicate, SortDirection};
use reinhardt_tables::records::{InMemoryRecords, InverseRelationship, Relationship};
use reinhardt_tables::session::{SessionError, SessionStore};
use reinhardt_tables::{
	Attributes, Column, Record, RecordKey, RelationshipDescriptor, Result, TableDefinition,
	TableError,
};
use rstest::*;
use serde_json::{Value, json};
use std::collections::HashSet;

/// Build a filter state group from field/value pairs
pub fn group(pairs: &[(&str, Value)]) -> GroupState {
	pairs
		.iter()
		.map(|(field, value)| (field.to_string(), value.clone()))
		.collect()
}

pub fn keys(keys: &[i64]) -> Vec<RecordKey> {
	keys.iter().map(|k| RecordKey::from(*k)).collect()
}

/// Posts table: searchable title, status filter, featured toggle,
/// publish bulk action
#[fixture]
pub fn posts_definition() -> TableDefinition {
	TableDefinition::builder("posts")
		.column(
			Column::new("title")
				.sortable(true)
				.searchable(true)
				.individually_searchable(true),
		)
		.column(Column::new("status").sortable(true))
		.column(Column::new("views").toggleable(true, true))
		.filter(
			SelectFilter::new("status")
				.option("active", "Active")
				.option("draft", "Draft")
				.multiple(true),
		)
		.filter(ToggleFilter::new("featured", Predicate::equals("featured", true)))
		.action(Action::bulk(
			"publish",
			FnProcedure::new(|record: &mut Record, _: &GroupState| {
				record.set("status", "active");
				Ok(())
			}),
		))
		.default_sort("title", SortDirection::Asc)
		.page_options(vec![2, 5])
		.build()
		.unwrap()
}

/// Twelve posts, alternating between active and draft
#[fixture]
pub fn posts() -> InMemoryRecords {
	InMemoryRecords::from_records((1..=12).map(|i: i64| {
		Record::new(i)
			.attribute("title", format!("Post {:02}", i))
			.attribute("status", if i % 2 == 1 { "active" } else { "draft" })
			.attribute("featured", i % 3 == 0)
	}))
}

/// Comments of a post, dissociable in bulk
#[fixture]
pub fn comments_definition() -> TableDefinition {
	TableDefinition::builder("comments")
		.column(Column::new("body"))
		.relationship(RelationshipDescriptor::HasMany {
			inverse: "post".into(),
		})
		.action(DissociateBulkAction::make())
		.build()
		.unwrap()
}

#[fixture]
pub fn comments() -> InMemoryRecords {
	InMemoryRecords::from_records((1..=3).map(|i: i64| {
		Record::new(i)
			.attribute("body", format!("Comment {}", i))
			.attribute("post_id", 10)
	}))
}

/// Relationship whose inverse lookup fails for selected records
#[derive(Debug, Default)]
pub struct FlakyRelationship {
	broken: HashSet<RecordKey>,
}

impl FlakyRelationship {
	pub fn broken_for(keys: &[i64]) -> Self {
		Self {
			broken: keys.iter().map(|k| RecordKey::from(*k)).collect(),
		}
	}
}

#[async_trait]
impl Relationship for FlakyRelationship {
	async fn update_pivot(&self, key: &RecordKey, _attributes: Attributes) -> Result<()> {
		Err(TableError::RecordNotFound(key.clone()))
	}

	async fn inverse_for(&self, inverse: &str, record: &Record) -> Result<InverseRelationship> {
		if self.broken.contains(record.key()) {
			return Err(TableError::Repository(format!(
				"inverse relationship of [{}] could not be loaded",
				record.key()
			)));
		}
		Ok(InverseRelationship::new(inverse, "post_id"))
	}
}

/// Session store that accepts reads and rejects writes
#[derive(Debug, Default)]
pub struct ReadOnlySessionStore;

#[async_trait]
impl SessionStore for ReadOnlySessionStore {
	async fn load(&self, _key: &str) -> std::result::Result<Option<Value>, SessionError> {
		Ok(None)
	}

	async fn save(&self, _key: &str, _value: Value) -> std::result::Result<(), SessionError> {
		Err(SessionError::StorageError("session is read-only".into()))
	}

	async fn delete(&self, _key: &str) -> std::result::Result<(), SessionError> {
		Err(SessionError::StorageError("session is read-only".into()))
	}

	async fn exists(&self, _key: &str) -> std::result::Result<bool, SessionError> {
		Ok(false)
	}
}

pub fn active() -> GroupState {
	group(&[("values", json!(["active"]))])
}
