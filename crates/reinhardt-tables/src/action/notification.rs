//! Notifications emitted after action execution

use serde::{Deserialize, Serialize};

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
	Success,
	Danger,
}

/// A one-time message for the rendering layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
	pub level: NotificationLevel,
	pub title: String,
	pub body: Option<String>,
}

impl Notification {
	/// Create a notification
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_tables::action::{Notification, NotificationLevel};
	///
	/// let note = Notification::new(NotificationLevel::Success, "Dissociated");
	/// assert_eq!(note.level, NotificationLevel::Success);
	/// assert!(note.body.is_none());
	/// ```
	pub fn new(level: NotificationLevel, title: impl Into<String>) -> Self {
		Self {
			level,
			title: title.into(),
			body: None,
		}
	}

	/// Create a success notification
	pub fn success(title: impl Into<String>) -> Self {
		Self::new(NotificationLevel::Success, title)
	}

	/// Create a failure notification
	pub fn danger(title: impl Into<String>) -> Self {
		Self::new(NotificationLevel::Danger, title)
	}

	/// Attach a body
	pub fn with_body(mut self, body: impl Into<String>) -> Self {
		self.body = Some(body.into());
		self
	}

	pub fn is_success(&self) -> bool {
		self.level == NotificationLevel::Success
	}
}
