//! Action confirmation and execution through the table controller

mod fixtures;

use fixtures::*;
use reinhardt_tables::action::{
	Action, ActionStatus, DISSOCIATE, DispatcherState, FnProcedure, NotificationLevel,
};
use reinhardt_tables::form::GroupState;
use reinhardt_tables::records::{InMemoryRecords, InMemoryRelationship, InverseRelationship};
use reinhardt_tables::{Column, Record, RecordKey, TableController, TableDefinition, TableError};
use rstest::*;
use serde_json::{Value, json};
use std::sync::Arc;

async fn mount_comments(
	definition: TableDefinition,
	records: InMemoryRecords,
	relationship: Arc<dyn reinhardt_tables::records::Relationship>,
) -> TableController {
	TableController::builder(Arc::new(definition), Arc::new(records))
		.relationship(relationship)
		.mount()
		.await
		.unwrap()
}

fn post_id(records: &InMemoryRecords, key: i64) -> Value {
	records
		.get(&RecordKey::from(key))
		.unwrap()
		.get("post_id")
		.cloned()
		.unwrap_or(Value::Null)
}

#[rstest]
#[tokio::test]
async fn test_bulk_dissociate_stops_at_first_failure(
	comments_definition: TableDefinition,
	comments: InMemoryRecords,
) {
	// Arrange
	let records = comments.clone();
	let mut table = mount_comments(
		comments_definition,
		comments,
		Arc::new(FlakyRelationship::broken_for(&[2])),
	)
	.await;
	table.select_page(keys(&[1, 2, 3]));

	// Act
	let invocation = table.mount_action(DISSOCIATE, None).unwrap();
	assert!(invocation.is_confirmation_pending());
	table.confirm_action().unwrap();
	let outcome = table.execute_action().await.unwrap();

	// Assert
	assert_eq!(outcome.status, ActionStatus::Failed);
	let report = outcome.report.unwrap();
	assert_eq!(report.succeeded, keys(&[1]));
	assert_eq!(
		report.failed.as_ref().and_then(|f| f.record.clone()),
		Some(RecordKey::from(2))
	);
	assert_eq!(report.skipped, keys(&[3]));

	assert_eq!(post_id(&records, 1), Value::Null);
	assert_eq!(post_id(&records, 2), json!(10));
	assert_eq!(post_id(&records, 3), json!(10));

	assert_eq!(outcome.notification.level, NotificationLevel::Danger);
	assert!(outcome.notification.body.unwrap().contains("Record [2]"));
	for key in keys(&[1, 2, 3]) {
		assert!(table.is_selected(&key));
	}
}

#[rstest]
#[tokio::test]
async fn test_bulk_dissociate_success(
	comments_definition: TableDefinition,
	comments: InMemoryRecords,
) {
	let records = comments.clone();
	let relationship =
		InMemoryRelationship::new().with_inverse(InverseRelationship::new("post", "post_id"));
	let mut table = mount_comments(comments_definition, comments, Arc::new(relationship)).await;
	table.select_all();

	table.mount_action(DISSOCIATE, None).unwrap();
	table.confirm_action().unwrap();
	let outcome = table.execute_action().await.unwrap();

	assert!(outcome.is_success());
	assert_eq!(outcome.notification.title, "Dissociated");
	for key in 1..=3 {
		assert_eq!(post_id(&records, key), Value::Null);
	}
	assert!(table.selection().is_empty());
	assert_eq!(table.take_notifications(), vec![outcome.notification]);
}

#[rstest]
#[tokio::test]
async fn test_confirmation_required_before_execution(
	comments_definition: TableDefinition,
	comments: InMemoryRecords,
) {
	let records = comments.clone();
	let mut table = mount_comments(
		comments_definition,
		comments,
		Arc::new(FlakyRelationship::default()),
	)
	.await;
	table.select(RecordKey::from(1));
	table.mount_action(DISSOCIATE, None).unwrap();

	let result = table.execute_action().await;

	assert!(matches!(result, Err(TableError::InvalidActionState(_))));
	assert_eq!(table.dispatcher().state(), DispatcherState::ConfirmationPending);
	assert_eq!(post_id(&records, 1), json!(10));
}

#[rstest]
#[tokio::test]
async fn test_cancel_is_silent(comments_definition: TableDefinition, comments: InMemoryRecords) {
	let records = comments.clone();
	let mut table = mount_comments(
		comments_definition,
		comments,
		Arc::new(FlakyRelationship::default()),
	)
	.await;
	table.select(RecordKey::from(1));
	table.mount_action(DISSOCIATE, None).unwrap();

	assert!(table.cancel_action());

	assert_eq!(table.dispatcher().state(), DispatcherState::Idle);
	assert!(table.take_notifications().is_empty());
	assert!(table.is_selected(&RecordKey::from(1)));
	assert_eq!(post_id(&records, 1), json!(10));
	assert!(!table.cancel_action());
}

#[rstest]
#[tokio::test]
async fn test_bulk_action_requires_selection(
	comments_definition: TableDefinition,
	comments: InMemoryRecords,
) {
	let mut table = mount_comments(
		comments_definition,
		comments,
		Arc::new(FlakyRelationship::default()),
	)
	.await;
	table.mount_action(DISSOCIATE, None).unwrap();
	table.confirm_action().unwrap();

	let result = table.execute_action().await;

	assert!(matches!(result, Err(TableError::InvalidActionState(_))));
	assert!(table.take_notifications().is_empty());
}

#[fixture]
fn archive_definition() -> TableDefinition {
	TableDefinition::builder("posts")
		.column(Column::new("title"))
		.action(
			Action::record(
				"archive",
				FnProcedure::new(|record: &mut Record, data: &GroupState| {
					if record.get("locked") == Some(&json!(true)) {
						return Err(TableError::Repository("record is locked".into()));
					}
					record.set("archived_reason", data.get("reason").cloned().unwrap_or_default());
					Ok(())
				}),
			)
			.label("Archive")
			.default_data(group(&[("reason", json!("stale"))])),
		)
		.build()
		.unwrap()
}

#[rstest]
#[tokio::test]
async fn test_record_action_uses_form_state(archive_definition: TableDefinition) {
	let records = InMemoryRecords::from_records([Record::new(1).attribute("title", "Draft")]);
	let mut table = TableController::builder(Arc::new(archive_definition), Arc::new(records.clone()))
		.mount()
		.await
		.unwrap();

	let invocation = table.mount_action("archive", Some(RecordKey::from(1))).unwrap();
	assert_eq!(invocation.data()["reason"], json!("stale"));
	table
		.set_action_form_state(group(&[("reason", json!("duplicate"))]))
		.unwrap();
	let outcome = table.execute_action().await.unwrap();

	assert!(outcome.is_success());
	assert!(outcome.report.is_none());
	assert_eq!(outcome.notification.title, "Archive completed");
	assert_eq!(
		records.get(&RecordKey::from(1)).unwrap().get("archived_reason"),
		Some(&json!("duplicate"))
	);
}

#[rstest]
#[tokio::test]
async fn test_record_action_failure_notifies(archive_definition: TableDefinition) {
	let records = InMemoryRecords::from_records([Record::new(1).attribute("locked", true)]);
	let mut table = TableController::builder(Arc::new(archive_definition), Arc::new(records))
		.mount()
		.await
		.unwrap();

	table.mount_action("archive", Some(RecordKey::from(1))).unwrap();
	let result = table.execute_action().await;

	assert!(matches!(result, Err(TableError::ActionProcedure { .. })));
	let notifications = table.take_notifications();
	assert_eq!(notifications.len(), 1);
	assert_eq!(notifications[0].level, NotificationLevel::Danger);
	assert_eq!(notifications[0].title, "Archive failed");
	assert!(notifications[0].body.as_deref().unwrap().contains("locked"));
}

#[rstest]
#[tokio::test]
async fn test_unknown_action_is_rejected(archive_definition: TableDefinition) {
	let mut table =
		TableController::builder(Arc::new(archive_definition), Arc::new(InMemoryRecords::new()))
			.mount()
			.await
			.unwrap();

	assert!(matches!(
		table.mount_action("archive", None),
		Err(TableError::UnknownAction(_))
	));
}
