//! Action mounting and execution

use super::{Action, ActionContext, ActionScope, Granularity, Notification};
use crate::definition::TableDefinition;
use crate::error::{Result, TableError};
use crate::form::GroupState;
use crate::query::QueryPlan;
use crate::record::RecordKey;
use crate::records::{RecordRepository, Relationship};
use crate::state::SelectionState;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Where the dispatcher stands between requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatcherState {
	Idle,
	Mounted,
	ConfirmationPending,
}

/// A mounted action awaiting execution
#[derive(Debug, Clone)]
pub struct ActionInvocation {
	action: Arc<Action>,
	record: Option<RecordKey>,
	data: GroupState,
	confirmation_pending: bool,
}

impl ActionInvocation {
	pub fn action(&self) -> &Action {
		&self.action
	}

	pub fn scope(&self) -> ActionScope {
		self.action.scope()
	}

	/// Target record of a record action
	pub fn record(&self) -> Option<&RecordKey> {
		self.record.as_ref()
	}

	/// Form state captured at mount time, possibly overridden since
	pub fn data(&self) -> &GroupState {
		&self.data
	}

	pub fn is_confirmation_pending(&self) -> bool {
		self.confirmation_pending
	}
}

/// Outcome status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionStatus {
	Succeeded,
	Failed,
}

/// The record a bulk action stopped at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkFailure {
	/// `None` for batch actions, which fail as a whole
	pub record: Option<RecordKey>,
	pub message: String,
}

/// Per-record result of a bulk action
///
/// Bulk actions are fail-fast and never roll back: `succeeded` records keep
/// their changes, `skipped` records were never attempted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkReport {
	pub succeeded: Vec<RecordKey>,
	pub failed: Option<BulkFailure>,
	pub skipped: Vec<RecordKey>,
}

/// Result of an executed action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
	pub action: String,
	pub status: ActionStatus,
	pub notification: Notification,
	/// Present for bulk actions
	pub report: Option<BulkReport>,
}

impl ActionOutcome {
	pub fn is_success(&self) -> bool {
		self.status == ActionStatus::Succeeded
	}
}

/// What an execution may read and write
pub struct ExecutionScope<'a> {
	pub definition: &'a TableDefinition,
	pub records: &'a dyn RecordRepository,
	pub relationship: Option<&'a dyn Relationship>,
	pub selection: &'a SelectionState,
	/// Current filtered query, used to expand select-all
	pub query: &'a QueryPlan,
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Mounts, confirms and executes actions
///
/// At most one invocation is mounted at a time. Mounting replaces it,
/// cancelling discards it, executing consumes it.
///
/// ```mermaid
/// stateDiagram-v2
///     [*] --> Idle
///     Idle --> Mounted: mount
///     Idle --> ConfirmationPending: mount (requires confirmation)
///     ConfirmationPending --> Mounted: confirm
///     ConfirmationPending --> Idle: cancel
///     Mounted --> Idle: cancel
///     Mounted --> Executing: execute
///     Executing --> Idle: succeeded / failed
/// ```
#[derive(Debug, Default)]
pub struct ActionDispatcher {
	mounted: Option<ActionInvocation>,
}

impl ActionDispatcher {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn state(&self) -> DispatcherState {
		match &self.mounted {
			None => DispatcherState::Idle,
			Some(invocation) if invocation.confirmation_pending => {
				DispatcherState::ConfirmationPending
			}
			Some(_) => DispatcherState::Mounted,
		}
	}

	pub fn mounted(&self) -> Option<&ActionInvocation> {
		self.mounted.as_ref()
	}

	/// Mount an action
	///
	/// With a record key the record registry is searched, without one the
	/// bulk registry.
	pub fn mount(
		&mut self,
		definition: &TableDefinition,
		name: &str,
		record: Option<RecordKey>,
	) -> Result<&ActionInvocation> {
		let action = match record {
			Some(_) => definition.record_action(name)?,
			None => definition.bulk_action(name)?,
		};
		let invocation = ActionInvocation {
			action: Arc::clone(action),
			data: action.get_default_data().clone(),
			confirmation_pending: action.is_confirmation_required(),
			record,
		};

		tracing::debug!(
			table = %definition.name(),
			action = %name,
			record = ?invocation.record,
			confirmation_pending = invocation.confirmation_pending,
			"Action mounted"
		);
		Ok(self.mounted.insert(invocation))
	}

	pub fn confirm(&mut self) -> Result<()> {
		match &mut self.mounted {
			Some(invocation) if invocation.confirmation_pending => {
				invocation.confirmation_pending = false;
				Ok(())
			}
			Some(invocation) => Err(TableError::InvalidActionState(format!(
				"action [{}] is not awaiting confirmation",
				invocation.action.name()
			))),
			None => Err(no_action_mounted()),
		}
	}

	/// Discard the mounted invocation, if any
	pub fn cancel(&mut self) -> Option<ActionInvocation> {
		let cancelled = self.mounted.take();
		if let Some(invocation) = &cancelled {
			tracing::debug!(action = %invocation.action.name(), "Action cancelled");
		}
		cancelled
	}

	/// Overlay caller-supplied form data on the captured state
	pub fn set_form_state(&mut self, data: GroupState) -> Result<()> {
		let invocation = self.mounted.as_mut().ok_or_else(no_action_mounted)?;
		invocation.data.extend(data);
		Ok(())
	}

	/// Run the mounted action
	///
	/// Record actions surface procedure errors as
	/// [`TableError::ActionProcedure`]. Bulk actions report failures in the
	/// returned [`BulkReport`] instead.
	pub async fn execute(&mut self, scope: ExecutionScope<'_>) -> Result<ActionOutcome> {
		let invocation = match self.mounted.take() {
			None => return Err(no_action_mounted()),
			Some(invocation) if invocation.confirmation_pending => {
				let name = invocation.action.name().to_string();
				self.mounted = Some(invocation);
				return Err(TableError::InvalidActionState(format!(
					"action [{}] awaits confirmation",
					name
				)));
			}
			Some(invocation) => invocation,
		};

		match invocation.record.clone() {
			Some(key) => run_record_action(&invocation, key, &scope).await,
			None => run_bulk_action(&invocation, &scope).await,
		}
	}
}

fn no_action_mounted() -> TableError {
	TableError::InvalidActionState("no action is mounted".into())
}

async fn run_record_action(
	invocation: &ActionInvocation,
	key: RecordKey,
	scope: &ExecutionScope<'_>,
) -> Result<ActionOutcome> {
	let action = &invocation.action;
	let mut record = scope
		.records
		.find(&key)
		.await?
		.ok_or_else(|| TableError::RecordNotFound(key.clone()))?;
	let context = context_for(invocation, scope);

	match action
		.procedure()
		.run(std::slice::from_mut(&mut record), &context)
		.await
	{
		Ok(()) => {
			tracing::info!(action = %action.name(), record = %key, "Action executed");
			Ok(ActionOutcome {
				action: action.name().to_string(),
				status: ActionStatus::Succeeded,
				notification: action.success_notification(),
				report: None,
			})
		}
		Err(error) => {
			tracing::warn!(action = %action.name(), record = %key, error = %error, "Action failed");
			Err(TableError::ActionProcedure {
				action: action.name().to_string(),
				message: error.to_string(),
			})
		}
	}
}

async fn run_bulk_action(
	invocation: &ActionInvocation,
	scope: &ExecutionScope<'_>,
) -> Result<ActionOutcome> {
	let action = &invocation.action;
	let mut targets = scope.selection.resolve(scope.records, scope.query).await?;
	if targets.is_empty() {
		return Err(TableError::InvalidActionState(format!(
			"bulk action [{}] has no selected records",
			action.name()
		)));
	}
	let context = context_for(invocation, scope);

	let report = match action.get_granularity() {
		Granularity::PerRecord => {
			let mut report = BulkReport::default();
			let mut remaining = targets.into_iter();
			for mut record in remaining.by_ref() {
				let key = record.key().clone();
				match action
					.procedure()
					.run(std::slice::from_mut(&mut record), &context)
					.await
				{
					Ok(()) => report.succeeded.push(key),
					Err(error) => {
						report.failed = Some(BulkFailure {
							record: Some(key),
							message: error.to_string(),
						});
						break;
					}
				}
			}
			report.skipped = remaining.map(|record| record.key().clone()).collect();
			report
		}
		Granularity::Batch => {
			let keys: Vec<RecordKey> = targets.iter().map(|r| r.key().clone()).collect();
			match action.procedure().run(&mut targets, &context).await {
				Ok(()) => BulkReport {
					succeeded: keys,
					..BulkReport::default()
				},
				Err(error) => BulkReport {
					failed: Some(BulkFailure {
						record: None,
						message: error.to_string(),
					}),
					..BulkReport::default()
				},
			}
		}
	};

	Ok(bulk_outcome(action, report))
}

fn bulk_outcome(action: &Action, report: BulkReport) -> ActionOutcome {
	match &report.failed {
		None => {
			tracing::info!(
				action = %action.name(),
				records = report.succeeded.len(),
				"Bulk action executed"
			);
			ActionOutcome {
				action: action.name().to_string(),
				status: ActionStatus::Succeeded,
				notification: action.success_notification(),
				report: Some(report),
			}
		}
		Some(failure) => {
			let body = match &failure.record {
				Some(key) => format!("Record [{}]: {}", key, failure.message),
				None => failure.message.clone(),
			};
			tracing::warn!(
				action = %action.name(),
				succeeded = report.succeeded.len(),
				skipped = report.skipped.len(),
				failed = ?failure.record,
				"Bulk action stopped at failure"
			);
			ActionOutcome {
				action: action.name().to_string(),
				status: ActionStatus::Failed,
				notification: action.failure_notification().with_body(body),
				report: Some(report),
			}
		}
	}
}

fn context_for<'a>(
	invocation: &'a ActionInvocation,
	scope: &'a ExecutionScope<'_>,
) -> ActionContext<'a> {
	ActionContext {
		action: invocation.action.name(),
		definition: scope.definition,
		records: scope.records,
		relationship: scope.relationship,
		data: &invocation.data,
	}
}
