//! Record and bulk actions
//!
//! An [`Action`] pairs a name and confirmation/notification settings with an
//! [`ActionProcedure`] that performs the side effect. Record actions target
//! one row; bulk actions target the current selection.

mod dispatcher;
mod dissociate;
mod notification;

pub use dispatcher::{
	ActionDispatcher, ActionInvocation, ActionOutcome, ActionStatus, BulkFailure, BulkReport,
	DispatcherState, ExecutionScope,
};
pub use dissociate::{DISSOCIATE, DissociateAction, DissociateBulkAction, DissociateProcedure};
pub use notification::{Notification, NotificationLevel};

use crate::definition::TableDefinition;
use crate::error::Result;
use crate::form::GroupState;
use crate::record::Record;
use crate::records::{RecordRepository, Relationship};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// What an action targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionScope {
	/// A single record identified by key
	Record,
	/// The current selection
	Bulk,
}

/// How a bulk action hands records to its procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Granularity {
	/// One procedure call per record, stopping at the first failure
	#[default]
	PerRecord,
	/// One procedure call for the whole selection
	Batch,
}

/// Everything a procedure may touch besides its records
pub struct ActionContext<'a> {
	/// Name of the running action
	pub action: &'a str,
	pub definition: &'a TableDefinition,
	pub records: &'a dyn RecordRepository,
	pub relationship: Option<&'a dyn Relationship>,
	/// Form state captured at mount time
	pub data: &'a GroupState,
}

/// Side effect of an action
#[async_trait]
pub trait ActionProcedure: Send + Sync {
	/// Run against the target records
	///
	/// Record actions and per-record bulk actions receive exactly one record.
	async fn run(&self, records: &mut [Record], context: &ActionContext<'_>) -> Result<()>;
}

/// Procedure built from a synchronous per-record closure
///
/// Each record is passed to the closure and then saved through the record
/// repository.
///
/// # Examples
///
/// ```
/// use reinhardt_tables::action::{Action, FnProcedure};
///
/// let publish = Action::bulk(
///     "publish",
///     FnProcedure::new(|record, _data| {
///         record.set("status", "published");
///         Ok(())
///     }),
/// );
/// assert_eq!(publish.name(), "publish");
/// ```
pub struct FnProcedure<F> {
	f: F,
}

impl<F> FnProcedure<F>
where
	F: Fn(&mut Record, &GroupState) -> Result<()> + Send + Sync,
{
	pub fn new(f: F) -> Self {
		Self { f }
	}
}

#[async_trait]
impl<F> ActionProcedure for FnProcedure<F>
where
	F: Fn(&mut Record, &GroupState) -> Result<()> + Send + Sync,
{
	async fn run(&self, records: &mut [Record], context: &ActionContext<'_>) -> Result<()> {
		for record in records.iter_mut() {
			(self.f)(record, context.data)?;
			context.records.save(record).await?;
		}
		Ok(())
	}
}

/// A table action definition
#[derive(Clone)]
pub struct Action {
	name: String,
	label: String,
	scope: ActionScope,
	granularity: Granularity,
	requires_confirmation: bool,
	default_data: GroupState,
	procedure: Arc<dyn ActionProcedure>,
	success_title: Option<String>,
	failure_title: Option<String>,
	deselect_records_after_completion: bool,
}

impl Action {
	/// Create an action with an explicit scope
	pub fn new(
		name: impl Into<String>,
		scope: ActionScope,
		procedure: Arc<dyn ActionProcedure>,
	) -> Self {
		let name = name.into();
		Self {
			label: name.clone(),
			name,
			scope,
			granularity: Granularity::PerRecord,
			requires_confirmation: false,
			default_data: GroupState::new(),
			procedure,
			success_title: None,
			failure_title: None,
			deselect_records_after_completion: true,
		}
	}

	/// Create a record action
	pub fn record(name: impl Into<String>, procedure: impl ActionProcedure + 'static) -> Self {
		Self::new(name, ActionScope::Record, Arc::new(procedure))
	}

	/// Create a bulk action
	pub fn bulk(name: impl Into<String>, procedure: impl ActionProcedure + 'static) -> Self {
		Self::new(name, ActionScope::Bulk, Arc::new(procedure))
	}

	pub fn label(mut self, label: impl Into<String>) -> Self {
		self.label = label.into();
		self
	}

	pub fn granularity(mut self, granularity: Granularity) -> Self {
		self.granularity = granularity;
		self
	}

	/// Require an explicit confirm step between mount and execute
	pub fn requires_confirmation(mut self, required: bool) -> Self {
		self.requires_confirmation = required;
		self
	}

	/// Form state loaded when the action is mounted
	pub fn default_data(mut self, data: GroupState) -> Self {
		self.default_data = data;
		self
	}

	pub fn success_notification_title(mut self, title: impl Into<String>) -> Self {
		self.success_title = Some(title.into());
		self
	}

	pub fn failure_notification_title(mut self, title: impl Into<String>) -> Self {
		self.failure_title = Some(title.into());
		self
	}

	/// Clear the selection after a successful bulk run (default: on)
	pub fn deselect_records_after_completion(mut self, deselect: bool) -> Self {
		self.deselect_records_after_completion = deselect;
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn get_label(&self) -> &str {
		&self.label
	}

	pub fn scope(&self) -> ActionScope {
		self.scope
	}

	pub fn get_granularity(&self) -> Granularity {
		self.granularity
	}

	pub fn is_confirmation_required(&self) -> bool {
		self.requires_confirmation
	}

	pub fn get_default_data(&self) -> &GroupState {
		&self.default_data
	}

	pub fn procedure(&self) -> &Arc<dyn ActionProcedure> {
		&self.procedure
	}

	pub fn deselects_records_after_completion(&self) -> bool {
		self.deselect_records_after_completion
	}

	pub(crate) fn success_notification(&self) -> Notification {
		Notification::success(
			self.success_title
				.clone()
				.unwrap_or_else(|| format!("{} completed", self.label)),
		)
	}

	pub(crate) fn failure_notification(&self) -> Notification {
		Notification::danger(
			self.failure_title
				.clone()
				.unwrap_or_else(|| format!("{} failed", self.label)),
		)
	}
}

impl fmt::Debug for Action {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Action")
			.field("name", &self.name)
			.field("label", &self.label)
			.field("scope", &self.scope)
			.field("granularity", &self.granularity)
			.field("requires_confirmation", &self.requires_confirmation)
			.field("default_data", &self.default_data)
			.finish_non_exhaustive()
	}
}
