//! Selection tracking across pages

use crate::error::Result;
use crate::query::QueryPlan;
use crate::record::{Record, RecordKey};
use crate::records::RecordRepository;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Selected records
///
/// `AllMatchingQuery` stands for every record of the current filtered query
/// and is only expanded to concrete keys when an action needs them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
	Enumerated(BTreeSet<RecordKey>),
	AllMatchingQuery { except: BTreeSet<RecordKey> },
}

impl Default for Selection {
	fn default() -> Self {
		Selection::Enumerated(BTreeSet::new())
	}
}

/// Selection keyed by primary key
///
/// Keys survive re-sorting and paging. Filter changes clear the selection,
/// search changes do not.
///
/// # Examples
///
/// ```
/// use reinhardt_tables::state::SelectionState;
/// use reinhardt_tables::RecordKey;
///
/// let mut selection = SelectionState::default();
/// selection.select_page([RecordKey::from(1), RecordKey::from(2)]);
/// selection.deselect(&RecordKey::from(1));
///
/// assert!(!selection.is_selected(&RecordKey::from(1)));
/// assert!(selection.is_selected(&RecordKey::from(2)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionState {
	selection: Selection,
}

impl SelectionState {
	pub fn new(selection: Selection) -> Self {
		Self { selection }
	}

	pub fn select(&mut self, key: RecordKey) {
		match &mut self.selection {
			Selection::Enumerated(keys) => {
				keys.insert(key);
			}
			Selection::AllMatchingQuery { except } => {
				except.remove(&key);
			}
		}
	}

	/// Deselect one key; under select-all the key becomes an exclusion
	pub fn deselect(&mut self, key: &RecordKey) {
		match &mut self.selection {
			Selection::Enumerated(keys) => {
				keys.remove(key);
			}
			Selection::AllMatchingQuery { except } => {
				except.insert(key.clone());
			}
		}
	}

	/// Select every key of a page
	pub fn select_page(&mut self, keys: impl IntoIterator<Item = RecordKey>) {
		for key in keys {
			self.select(key);
		}
	}

	/// Select every record matching the current query
	pub fn select_all(&mut self) {
		self.selection = Selection::AllMatchingQuery {
			except: BTreeSet::new(),
		};
	}

	pub fn deselect_all(&mut self) {
		self.selection = Selection::default();
	}

	pub fn is_selected(&self, key: &RecordKey) -> bool {
		match &self.selection {
			Selection::Enumerated(keys) => keys.contains(key),
			Selection::AllMatchingQuery { except } => !except.contains(key),
		}
	}

	pub fn selected(&self) -> &Selection {
		&self.selection
	}

	/// Whether nothing can be selected
	///
	/// Select-all counts as non-empty even if the query matches nothing.
	pub fn is_empty(&self) -> bool {
		matches!(&self.selection, Selection::Enumerated(keys) if keys.is_empty())
	}

	/// Expand the selection into records
	///
	/// Enumerated keys are looked up one by one in key order; keys whose
	/// record disappeared are skipped. Select-all fetches the unpaginated
	/// `query` and drops the exclusions, keeping the query's order.
	pub async fn resolve(
		&self,
		records: &dyn RecordRepository,
		query: &QueryPlan,
	) -> Result<Vec<Record>> {
		match &self.selection {
			Selection::Enumerated(keys) => {
				let mut resolved = Vec::with_capacity(keys.len());
				for key in keys {
					match records.find(key).await? {
						Some(record) => resolved.push(record),
						None => tracing::debug!(record = %key, "Selected record no longer exists"),
					}
				}
				Ok(resolved)
			}
			Selection::AllMatchingQuery { except } => {
				let matched = records.fetch(&query.without_pagination()).await?;
				Ok(matched
					.into_iter()
					.filter(|record| !except.contains(record.key()))
					.collect())
			}
		}
	}
}
