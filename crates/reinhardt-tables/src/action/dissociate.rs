//! Built-in dissociate actions for to-many relationship tables

use super::{Action, ActionContext, ActionProcedure};
use crate::error::{Result, TableError};
use crate::record::Record;
use async_trait::async_trait;

/// Detaches records from the owner by clearing their inverse foreign key
///
/// For every record: look up the inverse relationship, dissociate, save.
/// Stops at the first record that fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DissociateProcedure;

#[async_trait]
impl ActionProcedure for DissociateProcedure {
	async fn run(&self, records: &mut [Record], context: &ActionContext<'_>) -> Result<()> {
		let relationship = context.relationship.ok_or_else(|| {
			TableError::Configuration(format!(
				"table [{}] has no relationship to dissociate from",
				context.definition.name()
			))
		})?;
		let inverse_name = context.definition.relationship().inverse().ok_or_else(|| {
			TableError::Configuration(format!(
				"table [{}] does not declare an inverse relationship",
				context.definition.name()
			))
		})?;

		for record in records.iter_mut() {
			let inverse = relationship.inverse_for(inverse_name, record).await?;
			inverse.dissociate(record);
			context.records.save(record).await?;
			tracing::debug!(
				record = %record.key(),
				relationship = %inverse.name(),
				"Record dissociated"
			);
		}
		Ok(())
	}
}

/// Action name shared by the record and bulk variants
pub const DISSOCIATE: &str = "dissociate";

/// Record action detaching one record
///
/// # Examples
///
/// ```
/// use reinhardt_tables::action::{ActionScope, DissociateAction, DissociateBulkAction};
///
/// let single = DissociateAction::make();
/// let bulk = DissociateBulkAction::make();
///
/// assert_eq!(single.scope(), ActionScope::Record);
/// assert_eq!(bulk.name(), "dissociate");
/// assert!(bulk.is_confirmation_required());
/// ```
pub struct DissociateAction;

impl DissociateAction {
	pub fn make() -> Action {
		configure(Action::record(DISSOCIATE, DissociateProcedure))
	}
}

/// Bulk action detaching the selected records
pub struct DissociateBulkAction;

impl DissociateBulkAction {
	pub fn make() -> Action {
		configure(Action::bulk(DISSOCIATE, DissociateProcedure))
	}
}

fn configure(action: Action) -> Action {
	action
		.label("Dissociate")
		.requires_confirmation(true)
		.success_notification_title("Dissociated")
}
