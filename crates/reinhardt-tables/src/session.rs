//! Session persistence for table state
//!
//! Filter values, search text, column searches and column toggles survive
//! across requests by being written to a [`SessionStore`] under keys derived
//! from the table name.
//!
//! ## Example
//!
//! ```rust
//! use reinhardt_tables::session::{InMemorySessionStore, SessionKeys, SessionStore};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = InMemorySessionStore::new();
//! let keys = SessionKeys::for_table("posts");
//!
//! store.save(&keys.filters, json!({"status": {"values": ["active"]}})).await?;
//!
//! assert!(store.exists("tables.posts_filters").await?);
//! # Ok(())
//! # }
//! ```

use crate::error::TableError;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Session store errors
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SessionError {
	#[error("Storage error: {0}")]
	StorageError(String),
	#[error("Serialization error: {0}")]
	SerializationError(String),
}

impl From<SessionError> for TableError {
	fn from(error: SessionError) -> Self {
		TableError::Session(error.to_string())
	}
}

/// Key/value session store
///
/// Values are plain JSON so the trait stays object safe and can be shared as
/// `Arc<dyn SessionStore>`. Use [`load_typed`] / [`save_typed`] for typed
/// access.
#[async_trait]
pub trait SessionStore: Send + Sync {
	/// Load the value stored under `key`
	async fn load(&self, key: &str) -> Result<Option<Value>, SessionError>;

	/// Store `value` under `key`, replacing any previous value
	async fn save(&self, key: &str, value: Value) -> Result<(), SessionError>;

	/// Remove `key`
	async fn delete(&self, key: &str) -> Result<(), SessionError>;

	/// Check if `key` holds a value
	async fn exists(&self, key: &str) -> Result<bool, SessionError>;
}

/// Load and deserialize a value
pub async fn load_typed<T>(store: &dyn SessionStore, key: &str) -> Result<Option<T>, SessionError>
where
	T: DeserializeOwned,
{
	match store.load(key).await? {
		Some(value) => serde_json::from_value(value)
			.map(Some)
			.map_err(|e| SessionError::SerializationError(e.to_string())),
		None => Ok(None),
	}
}

/// Serialize and store a value
pub async fn save_typed<T>(
	store: &dyn SessionStore,
	key: &str,
	value: &T,
) -> Result<(), SessionError>
where
	T: Serialize + Sync + ?Sized,
{
	let value =
		serde_json::to_value(value).map_err(|e| SessionError::SerializationError(e.to_string()))?;
	store.save(key, value).await
}

/// In-memory session store
///
/// Clones share the same storage. Data is lost when the process exits.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
	entries: Arc<RwLock<HashMap<String, Value>>>,
}

impl InMemorySessionStore {
	/// Create an empty store
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of stored keys
	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.read().is_empty()
	}
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
	async fn load(&self, key: &str) -> Result<Option<Value>, SessionError> {
		Ok(self.entries.read().get(key).cloned())
	}

	async fn save(&self, key: &str, value: Value) -> Result<(), SessionError> {
		self.entries.write().insert(key.to_string(), value);
		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<(), SessionError> {
		self.entries.write().remove(key);
		Ok(())
	}

	async fn exists(&self, key: &str) -> Result<bool, SessionError> {
		Ok(self.entries.read().contains_key(key))
	}
}

/// Session keys of one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKeys {
	pub filters: String,
	pub search: String,
	pub column_search: String,
	pub toggled_columns: String,
}

impl SessionKeys {
	/// Derive the keys from the table name
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_tables::session::SessionKeys;
	///
	/// let keys = SessionKeys::for_table("ListPosts");
	/// assert_eq!(keys.filters, "tables.ListPosts_filters");
	/// assert_eq!(keys.toggled_columns, "tables.ListPosts_toggled_columns");
	/// ```
	pub fn for_table(name: &str) -> Self {
		Self {
			filters: format!("tables.{}_filters", name),
			search: format!("tables.{}_search", name),
			column_search: format!("tables.{}_column_search", name),
			toggled_columns: format!("tables.{}_toggled_columns", name),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;
	use std::collections::BTreeMap;

	#[rstest]
	#[tokio::test]
	async fn test_save_load_delete() {
		let store = InMemorySessionStore::new();

		store.save("k", json!("v")).await.unwrap();
		assert!(store.exists("k").await.unwrap());
		assert_eq!(store.load("k").await.unwrap(), Some(json!("v")));

		store.delete("k").await.unwrap();
		assert!(!store.exists("k").await.unwrap());
		assert!(store.is_empty());
	}

	#[rstest]
	#[tokio::test]
	async fn test_clones_share_storage() {
		let store = InMemorySessionStore::new();
		let clone = store.clone();

		clone.save("k", json!(1)).await.unwrap();

		assert_eq!(store.len(), 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_typed_helpers() {
		let store = InMemorySessionStore::new();
		let searches = BTreeMap::from([("title".to_string(), "rust".to_string())]);

		save_typed(&store, "searches", &searches).await.unwrap();
		let loaded: Option<BTreeMap<String, String>> =
			load_typed(&store, "searches").await.unwrap();

		assert_eq!(loaded, Some(searches));
	}

	#[rstest]
	#[tokio::test]
	async fn test_typed_load_reports_shape_mismatch() {
		let store = InMemorySessionStore::new();
		store.save("searches", json!(42)).await.unwrap();

		let result: Result<Option<BTreeMap<String, String>>, _> =
			load_typed(&store, "searches").await;

		assert!(matches!(result, Err(SessionError::SerializationError(_))));
	}

	#[rstest]
	fn test_session_error_converts_to_table_error() {
		let err: TableError = SessionError::StorageError("down".into()).into();
		assert!(matches!(err, TableError::Session(message) if message == "Storage error: down"));
	}
}
