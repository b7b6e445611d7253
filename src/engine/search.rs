//! Search box state: input, buffered suggestions and the suggestion cursor.
//!
//! Every keystroke issues a new query; only the newest one may land. While it
//! is in flight the previous suggestion list stays visible.

use log::debug;

use super::types::SearchSuggestion;
use crate::api::RequestId;

/// What a key press in the suggestion list asks for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection {
	/// Highlight this suggestion.
	Highlight(SearchSuggestion),
	/// Replace the input with this text and query again.
	Complete(String),
}

/// Search input plus the latest accepted suggestions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchModel {
	input: String,
	suggestions: Vec<SearchSuggestion>,
	in_flight: Option<RequestId>,
	cursor: usize,
}

impl SearchModel {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn input(&self) -> &str {
		&self.input
	}

	/// Record new input. Returns the request it obsoletes, if any.
	///
	/// `request` is the id of the query the caller is about to send for the
	/// new input, or `None` when the input is empty and nothing is sent.
	pub fn set_input(&mut self, text: &str, request: Option<RequestId>) -> Option<RequestId> {
		self.input = text.to_string();
		self.cursor = 0;
		if text.is_empty() {
			self.suggestions.clear();
		}
		std::mem::replace(&mut self.in_flight, request)
	}

	pub fn in_flight(&self) -> Option<RequestId> {
		self.in_flight
	}

	/// Take suggestions for `id`. Stale responses return `false`.
	pub fn accept(&mut self, id: RequestId, suggestions: Vec<SearchSuggestion>) -> bool {
		if self.in_flight != Some(id) {
			debug!("trace-graph: ignoring stale query response {id}");
			return false;
		}
		self.in_flight = None;
		self.suggestions = suggestions;
		self.cursor = 0;
		true
	}

	/// The query `id` failed; the buffered suggestions stay.
	pub fn fail(&mut self, id: RequestId) -> bool {
		if self.in_flight == Some(id) {
			self.in_flight = None;
			return true;
		}
		false
	}

	pub fn suggestions(&self) -> &[SearchSuggestion] {
		&self.suggestions
	}

	/// The suggestion whose text equals the input, unless it is hidden.
	pub fn exact_match(&self) -> Option<&SearchSuggestion> {
		self.suggestions
			.iter()
			.find(|s| s.repr == self.input)
			.filter(|s| !s.hide_in_suggestions)
	}

	/// Visible suggestions when nothing matches exactly.
	pub fn partial_matches(&self) -> Vec<&SearchSuggestion> {
		if self.suggestions.iter().any(|s| s.repr == self.input) {
			return Vec::new();
		}
		self.suggestions
			.iter()
			.filter(|s| !s.hide_in_suggestions)
			.collect()
	}

	pub fn show_suggestions(&self) -> bool {
		!self.partial_matches().is_empty()
	}

	pub fn is_autocomplete_visible(&self) -> bool {
		self.partial_matches().iter().any(|s| s.is_autocomplete)
	}

	/// The backend is waiting for more input before it can answer.
	pub fn awaiting_input(&self) -> bool {
		!self.input.is_empty()
			&& self.exact_match().is_none()
			&& self.suggestions.iter().any(|s| s.awaiting_input)
	}

	/// Whether nothing is left to highlight for the current input.
	pub fn is_exhausted(&self) -> bool {
		self.input.is_empty() || self.suggestions.iter().all(|s| s.hide_in_suggestions)
	}

	/// Caret position for the input box.
	pub fn caret(&self) -> usize {
		self.exact_match()
			.map_or(self.input.chars().count(), |m| m.repr.chars().count())
	}

	pub fn cursor(&self) -> usize {
		self.cursor
	}

	/// Move the suggestion cursor, clamped to the visible list.
	pub fn move_cursor(&mut self, direction: isize) {
		let len = self.partial_matches().len();
		if len == 0 {
			self.cursor = 0;
			return;
		}
		let next = self.cursor as isize + direction;
		self.cursor = next.clamp(0, len as isize - 1) as usize;
	}

	/// Act on the suggestion under the cursor.
	pub fn select(&mut self) -> Option<Selection> {
		let chosen = self.partial_matches().get(self.cursor).map(|s| (*s).clone())?;
		self.input = chosen.repr.clone();
		self.cursor = 0;
		if chosen.is_autocomplete {
			Some(Selection::Complete(chosen.repr))
		} else {
			Some(Selection::Highlight(chosen))
		}
	}

	pub fn reset(&mut self) -> Option<RequestId> {
		self.input.clear();
		self.suggestions.clear();
		self.cursor = 0;
		self.in_flight.take()
	}
}
