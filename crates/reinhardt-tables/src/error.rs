//! Error types for table state operations

use crate::record::RecordKey;
use thiserror::Error;

/// Errors raised while mutating or querying table state
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum TableError {
	/// The table definition is inconsistent (duplicate names, empty page options, ...)
	#[error("Invalid table configuration: {0}")]
	Configuration(String),

	/// A filter name did not resolve against the definition's registry
	#[error("Filter [{0}] is not defined on this table")]
	UnknownFilter(String),

	/// An action name did not resolve against the definition's registry
	#[error("Action [{0}] is not defined on this table")]
	UnknownAction(String),

	/// A column name did not resolve against the definition
	#[error("Column [{0}] is not defined on this table")]
	UnknownColumn(String),

	/// The column exists but does not support the requested operation
	#[error("Column [{column}] is not {capability}")]
	ColumnCapability {
		/// Column name
		column: String,
		/// Missing capability ("sortable", "searchable", "toggleable")
		capability: &'static str,
	},

	/// The record repository has no record for the given key
	#[error("Record [{0}] not found")]
	RecordNotFound(RecordKey),

	/// An action dispatcher transition was requested from the wrong state
	#[error("Invalid action state: {0}")]
	InvalidActionState(String),

	/// Requested page number is not valid
	#[error("Page {0} is out of range")]
	InvalidPage(u64),

	/// Requested page size is not one of the configured options
	#[error("{0} records per page is not an allowed option")]
	InvalidRecordsPerPage(u64),

	/// The side-effect procedure of an action failed
	#[error("Action [{action}] failed: {message}")]
	ActionProcedure {
		/// Name of the failing action
		action: String,
		/// Failure description reported by the procedure
		message: String,
	},

	/// Reading or writing the session store failed
	#[error("Session error: {0}")]
	Session(String),

	/// The record repository or relationship capability reported a failure
	#[error("Repository error: {0}")]
	Repository(String),

	/// Settings could not be parsed
	#[error("Settings error: {0}")]
	Settings(String),

	/// JSON (de)serialization of state failed
	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

/// Result type for table operations
pub type Result<T> = std::result::Result<T, TableError>;
