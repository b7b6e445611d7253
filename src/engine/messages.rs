//! User-visible errors and warnings.

use log::warn;

use super::types::TransformerWarning;
use crate::error::ApiError;

/// Severity of a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageLevel {
	Error,
	Warning,
}

/// One banner shown to the user until dismissed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserMessage {
	pub id: u64,
	pub level: MessageLevel,
	pub text: String,
}

/// Active messages, oldest first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserMessages {
	active: Vec<UserMessage>,
	next_id: u64,
}

impl UserMessages {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, level: MessageLevel, text: impl Into<String>) -> u64 {
		let id = self.next_id;
		self.next_id += 1;
		self.active.push(UserMessage {
			id,
			level,
			text: text.into(),
		});
		id
	}

	pub fn error(&mut self, text: impl Into<String>) -> u64 {
		self.push(MessageLevel::Error, text)
	}

	pub fn warning(&mut self, text: impl Into<String>) -> u64 {
		self.push(MessageLevel::Warning, text)
	}

	/// Turn a failed backend call into an error banner.
	pub fn report(&mut self, context: &str, err: &ApiError) -> u64 {
		warn!("trace-graph: {context}: {err}");
		self.error(format!("{context}: {err}"))
	}

	/// Add a backend startup diagnostic.
	pub fn push_transformer_warning(&mut self, warning: &TransformerWarning) -> u64 {
		let (level, text) = unpack_warning(warning);
		self.push(level, text)
	}

	pub fn dismiss(&mut self, id: u64) -> bool {
		let before = self.active.len();
		self.active.retain(|m| m.id != id);
		self.active.len() != before
	}

	pub fn active(&self) -> &[UserMessage] {
		&self.active
	}

	pub fn clear(&mut self) {
		self.active.clear();
	}
}

/// Level and text for a backend startup diagnostic.
pub fn unpack_warning(warning: &TransformerWarning) -> (MessageLevel, String) {
	match warning.reason.value.as_str() {
		"FAILURE" => (
			MessageLevel::Error,
			format!(
				"The program contains a rule that will cause false behaviour! Remove/Rephrase the following rule: {}",
				warning.ast
			),
		),
		"relaxer" => (MessageLevel::Warning, warning.message.clone()),
		_ => (
			MessageLevel::Warning,
			format!(
				"The program contains a rule that is not supported! The graph shown might be faulty! {}",
				warning.ast
			),
		),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::engine::types::WarningReason;

	fn warning(reason: &str) -> TransformerWarning {
		TransformerWarning {
			ast: "a :- b.".into(),
			reason: WarningReason {
				value: reason.into(),
			},
			message: "relaxed".into(),
		}
	}

	#[test]
	fn failure_is_an_error() {
		let (level, text) = unpack_warning(&warning("FAILURE"));
		assert_eq!(level, MessageLevel::Error);
		assert!(text.ends_with("following rule: a :- b."));
	}

	#[test]
	fn relaxer_passes_message_through() {
		assert_eq!(
			unpack_warning(&warning("relaxer")),
			(MessageLevel::Warning, "relaxed".to_string())
		);
	}

	#[test]
	fn other_reasons_warn_about_support() {
		let (level, text) = unpack_warning(&warning("NOT_SUPPORTED"));
		assert_eq!(level, MessageLevel::Warning);
		assert!(text.contains("not supported"));
	}

	#[test]
	fn dismiss_removes_by_id() {
		let mut m = UserMessages::new();
		let a = m.report("Failed to load edges", &ApiError::Transport("offline".into()));
		let b = m.warning("w");
		assert!(m.dismiss(a));
		assert!(!m.dismiss(a));
		assert_eq!(m.active().len(), 1);
		assert_eq!(m.active()[0].id, b);
		assert_eq!(m.active().len(), 1);
	}
}
