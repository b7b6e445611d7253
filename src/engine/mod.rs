//! The coordination engine.
//!
//! [`Engine`] ties the graph model, the highlight store, the overflow tracker
//! and the search box together. It performs no I/O: commands queue
//! [`Ticket`]s, the host executes them and hands the results back through
//! [`Engine::complete`], and the host's frame loop calls [`Engine::tick`]
//! with the current time so timed transitions and request timeouts can fire.

use std::collections::HashMap;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::api::{ApiRequest, ReorderAck, RequestId, Ticket};
use crate::config::EngineConfig;
use crate::error::{ApiError, EngineError};

pub mod arena;
pub mod color;
pub mod graph;
pub mod highlight;
pub mod messages;
pub mod overflow;
pub mod recursion;
pub mod search;
pub mod theme;
pub mod timers;
pub mod types;

use graph::GraphModel;
use highlight::{Explanation, HighlightStore, SearchResult, Toggled};
use messages::UserMessages;
use overflow::{OverflowButtonState, OverflowTracker, VerticalMeasure};
use recursion::{BatchDirection, toggle_all_the_way};
use search::{SearchModel, Selection};
use timers::Millis;
use types::{ClingraphNode, Edge, Node, NodeId, Reason, SearchSuggestion, SymbolId, Transformation, TransformerWarning};

/// Detail modal for one symbol.
#[derive(Clone, Debug, PartialEq)]
pub struct ModalState {
	/// Symbol the modal shows.
	pub source_id: SymbolId,
	/// Node the symbol was opened from.
	pub node_id: NodeId,
	/// Backend content once loaded.
	pub content: Option<Value>,
}

#[derive(Clone, Debug)]
struct Pending {
	request: ApiRequest,
	generation: u64,
	edge_generation: u64,
	issued_at: Millis,
}

/// Engine state shared by the view.
#[derive(Debug)]
pub struct Engine {
	config: EngineConfig,
	next_request: RequestId,
	pending: HashMap<RequestId, Pending>,
	outbox: Vec<Ticket>,
	aborted: Vec<RequestId>,
	graph: GraphModel,
	highlights: HighlightStore,
	overflow: OverflowTracker,
	search: SearchModel,
	messages: UserMessages,
	modal: Option<ModalState>,
	revision: u64,
}

impl Engine {
	/// Build an idle engine; nothing is requested until [`Engine::start`].
	pub fn new(config: EngineConfig) -> Self {
		let palette = config.highlight_palette();
		if palette.is_empty() {
			warn!("trace-graph: highlight palette is empty, highlights will be transparent");
		}
		let highlights = HighlightStore::new(palette, config.highlight_timings());
		let overflow = OverflowTracker::new(
			config.overflow_thresholds(),
			config.resize_debounce_ms,
			config.content_debounce_ms,
		);
		Self {
			config,
			next_request: 0,
			pending: HashMap::new(),
			outbox: Vec::new(),
			aborted: Vec::new(),
			graph: GraphModel::new(),
			highlights,
			overflow,
			search: SearchModel::new(),
			messages: UserMessages::new(),
			modal: None,
			revision: 0,
		}
	}

	fn issue(&mut self, request: ApiRequest, now: Millis) -> RequestId {
		let id = self.next_request;
		self.next_request += 1;
		debug!("trace-graph: request {id} ({})", request.label());
		self.pending.insert(
			id,
			Pending {
				request: request.clone(),
				generation: self.graph.generation(),
				edge_generation: self.graph.edge_generation(),
				issued_at: now,
			},
		);
		self.outbox.push(Ticket { id, request });
		id
	}

	fn issue_all(&mut self, requests: Vec<ApiRequest>, now: Millis) {
		for request in requests {
			self.issue(request, now);
		}
	}

	fn abort(&mut self, id: RequestId) {
		if self.pending.remove(&id).is_some() {
			debug!("trace-graph: aborting request {id}");
			self.aborted.push(id);
		}
	}

	/// Requests the host should send now.
	pub fn take_tickets(&mut self) -> Vec<Ticket> {
		std::mem::take(&mut self.outbox)
	}

	/// Requests the host should cancel; their answers will be ignored anyway.
	pub fn take_aborted(&mut self) -> Vec<RequestId> {
		std::mem::take(&mut self.aborted)
	}

	/// Number of requests still waiting for an answer.
	pub fn pending_requests(&self) -> usize {
		self.pending.len()
	}

	fn touch(&mut self) {
		self.revision += 1;
	}

	/// Bumped on every state change the view may need to repaint for.
	pub fn revision(&self) -> u64 {
		self.revision
	}

	/// Fetch startup warnings and load the graph.
	pub fn start(&mut self, now: Millis) {
		self.issue(ApiRequest::Warnings, now);
		let requests = self.graph.start_full_reload();
		self.issue_all(requests, now);
		self.touch();
	}

	/// Drop all highlights and reload everything.
	pub fn refresh(&mut self, now: Millis) {
		self.highlights.clear();
		let requests = self.graph.start_full_reload();
		self.issue_all(requests, now);
		self.touch();
	}

	/// Fire due timers and time out stale requests. Returns whether anything
	/// visible changed.
	pub fn tick(&mut self, now: Millis) -> bool {
		let timeout = self.config.request_timeout_ms;
		let mut expired: Vec<RequestId> = self
			.pending
			.iter()
			.filter(|(_, p)| now - p.issued_at >= timeout)
			.map(|(id, _)| *id)
			.collect();
		expired.sort_unstable();
		let timed_out = !expired.is_empty();
		for id in expired {
			if let Some(pending) = self.pending.remove(&id) {
				warn!("trace-graph: request {id} ({}) timed out", pending.request.label());
				if pending.request.is_abortable() {
					self.aborted.push(id);
				}
				self.route(id, pending, Err(ApiError::Timeout(timeout)), now);
			}
		}
		let faded = self.highlights.tick(now);
		if timed_out || faded {
			self.touch();
		}
		timed_out || faded
	}

	/// Whether the view should remeasure node sizes now.
	pub fn poll_measurement(&mut self, now: Millis) -> bool {
		self.overflow.poll(now)
	}

	/// Answer for ticket `id`. Unknown ids (aborted, timed out) are ignored.
	pub fn complete(&mut self, id: RequestId, result: Result<Value, ApiError>, now: Millis) {
		let Some(pending) = self.pending.remove(&id) else {
			debug!("trace-graph: ignoring answer for request {id}");
			return;
		};
		debug!("trace-graph: request {id} ({}) completed", pending.request.label());
		self.route(id, pending, result, now);
		self.touch();
	}

	fn route(&mut self, id: RequestId, pending: Pending, result: Result<Value, ApiError>, now: Millis) {
		let Pending {
			request,
			generation,
			edge_generation,
			..
		} = pending;
		match request {
			ApiRequest::CurrentSort => match decode::<String>(result) {
				Ok(hash) => {
					let next = self.graph.on_current_sort(generation, hash);
					self.issue_all(next, now);
				}
				Err(e) => {
					if self.graph.fail_transformations(generation) {
						self.messages.report("Failed to get current sort", &e);
					}
				}
			},
			ApiRequest::Transformations => match decode::<Vec<Transformation>>(result) {
				Ok(list) => {
					let next = self.graph.on_transformations(generation, list);
					self.issue_all(next, now);
				}
				Err(e) => {
					if self.graph.fail_transformations(generation) {
						self.messages.report("Failed to get transformations", &e);
					}
				}
			},
			ApiRequest::Children {
				transformation_hash, ..
			} => {
				let next = match decode::<Vec<Node>>(result) {
					Ok(nodes) => self.graph.on_children(generation, &transformation_hash, nodes),
					Err(e) => {
						self.messages.report("Failed to load nodes", &e);
						self.graph.fail_children(generation, &transformation_hash)
					}
				};
				self.after_node_change(now);
				self.issue_all(next, now);
			}
			ApiRequest::ClingraphChildren { .. } => {
				let next = match decode::<Vec<ClingraphNode>>(result) {
					Ok(nodes) => self.graph.on_clingraph(generation, nodes),
					Err(e) => {
						self.messages.report("Failed to load clingraph nodes", &e);
						self.graph.fail_clingraph(generation)
					}
				};
				self.after_node_change(now);
				self.issue_all(next, now);
			}
			ApiRequest::Edges { shown_recursion, .. } => match decode::<Vec<Edge>>(result) {
				Ok(edges) => {
					if self.graph.on_edges(edge_generation, &shown_recursion, edges) {
						self.overflow.content_changed(now);
					}
				}
				Err(e) => {
					if self.graph.fail_edges(edge_generation, &shown_recursion) {
						self.messages.report("Failed to load edges", &e);
					}
				}
			},
			ApiRequest::Reorder {
				old_index, new_index, ..
			} => match decode::<ReorderAck>(result) {
				Ok(ack) => {
					let next = self.graph.on_reorder_ack(old_index, new_index, ack);
					self.issue_all(next, now);
				}
				Err(e) => {
					self.graph.fail_reorder(old_index, new_index);
					self.messages.report("Failed to reorder transformations", &e);
				}
			},
			ApiRequest::Reason { source_id, node_id } => match decode::<Reason>(result) {
				Ok(reason) => self.apply_reason(source_id, &node_id, reason, now),
				Err(e) => {
					self.messages.report("Failed to load explanation", &e);
				}
			},
			ApiRequest::Ground { source_id, node_id } => match result {
				Ok(content) => {
					if let Some(modal) = self
						.modal
						.as_mut()
						.filter(|m| m.source_id == source_id && m.node_id == node_id)
					{
						modal.content = Some(content);
					}
				}
				Err(e) => {
					self.messages.report("Failed to load symbol details", &e);
				}
			},
			ApiRequest::Query { .. } => match decode::<Vec<SearchSuggestion>>(result) {
				Ok(suggestions) => {
					if self.search.accept(id, suggestions) {
						self.sync_search_highlight(now);
					}
				}
				Err(ApiError::Aborted) => {
					self.search.fail(id);
				}
				Err(e) => {
					if self.search.fail(id) {
						self.messages.report("Search failed", &e);
					}
				}
			},
			ApiRequest::Warnings => match decode::<Vec<TransformerWarning>>(result) {
				Ok(warnings) => {
					for w in &warnings {
						self.messages.push_transformer_warning(w);
					}
				}
				Err(e) => {
					self.messages.report("Failed to get warnings", &e);
				}
			},
		}
	}

	fn after_node_change(&mut self, now: Millis) {
		let graph = &self.graph;
		self.overflow.retain_nodes(|id| {
			graph.arena().contains(id) || graph.clingraph().iter().any(|c| c.uuid == id)
		});
		self.overflow.content_changed(now);
	}

	fn apply_reason(&mut self, source: SymbolId, node: &str, reason: Reason, now: Millis) {
		let Some(transformation) = self.graph.arena().transformation_of(node).cloned() else {
			debug!("trace-graph: explanation for vanished node {node} ignored");
			return;
		};
		let explanation = Explanation::new(source, transformation, reason.rule, reason.symbols);
		self.highlights.toggle_explanation(explanation, now);
		self.overflow.content_changed(now);
	}

	/// A symbol was clicked inside `node`.
	///
	/// Symbols the backend cannot explain are ignored. Returns whether an
	/// explanation was requested.
	pub fn click_symbol(&mut self, symbol: &str, node: &str, now: Millis) -> bool {
		let explainable = self
			.graph
			.arena()
			.get(node)
			.is_some_and(|e| e.node.atoms.iter().chain(e.node.diff.iter()).any(|s| s.uuid == symbol && s.has_reason));
		if !explainable {
			return false;
		}
		self.issue(
			ApiRequest::Reason {
				source_id: symbol.to_string(),
				node_id: node.to_string(),
			},
			now,
		);
		true
	}

	/// Pin or unpin a symbol from the detail modal.
	pub fn toggle_modal_highlight(&mut self, symbol: &str, repr: &str, now: Millis) -> Toggled {
		let toggled = self.highlights.toggle_modal_highlight(symbol, repr, now);
		self.overflow.content_changed(now);
		self.touch();
		toggled
	}

	/// The search input changed.
	pub fn search_input(&mut self, text: &str, now: Millis) {
		let request = if text.is_empty() {
			None
		} else {
			Some(self.issue(ApiRequest::Query { text: text.to_string() }, now))
		};
		if let Some(obsolete) = self.search.set_input(text, request) {
			self.abort(obsolete);
		}
		if request.is_none() {
			self.highlights.remove_search_highlights();
		}
		self.touch();
	}

	fn sync_search_highlight(&mut self, now: Millis) {
		if let Some(exact) = self.search.exact_match() {
			let result = SearchResult::from(exact);
			self.highlights.add_search_highlight(result, now);
			self.overflow.content_changed(now);
		} else if self.search.is_exhausted() {
			self.highlights.remove_search_highlights();
		}
	}

	/// Move the suggestion cursor.
	pub fn search_move_cursor(&mut self, direction: isize) {
		self.search.move_cursor(direction);
		self.touch();
	}

	/// Accept the suggestion under the cursor.
	pub fn search_select(&mut self, now: Millis) {
		match self.search.select() {
			Some(Selection::Highlight(suggestion)) => {
				self.highlights.add_search_highlight(SearchResult::from(&suggestion), now);
				self.overflow.content_changed(now);
			}
			Some(Selection::Complete(text)) => self.search_input(&text, now),
			None => {}
		}
		self.touch();
	}

	/// Step through the ambiguous matches of the active search result.
	pub fn rotate_search(&mut self, direction: isize, now: Millis) -> Option<usize> {
		let repr = self.highlights.search_highlight()?.repr.clone()?;
		let selected = self.highlights.rotate_search_selection(&repr, direction, now);
		self.touch();
		selected
	}

	/// Empty the search box and drop its highlight.
	pub fn clear_search(&mut self) {
		if let Some(id) = self.search.reset() {
			self.abort(id);
		}
		self.highlights.remove_search_highlights();
		self.touch();
	}

	pub fn open_modal(&mut self, source_id: &str, node_id: &str, now: Millis) {
		self.modal = Some(ModalState {
			source_id: source_id.to_string(),
			node_id: node_id.to_string(),
			content: None,
		});
		self.issue(
			ApiRequest::Ground {
				source_id: source_id.to_string(),
				node_id: node_id.to_string(),
			},
			now,
		);
		self.touch();
	}

	/// Close the modal and drop the highlights pinned from it.
	pub fn close_modal(&mut self) {
		self.modal = None;
		self.highlights.clear_modal_highlights();
		self.touch();
	}

	/// Expand or collapse a super-node's sub-nodes.
	pub fn toggle_recursion(&mut self, node: &str, now: Millis) {
		let requests = self.graph.toggle_recursion(node);
		self.issue_all(requests, now);
		self.touch();
	}

	/// Move a transformation. Rejected moves become an error message too.
	pub fn reorder(&mut self, old_index: usize, new_index: usize, now: Millis) -> Result<(), EngineError> {
		match self.graph.request_reorder(old_index, new_index) {
			Ok(Some(request)) => {
				self.issue(request, now);
				Ok(())
			}
			Ok(None) => Ok(()),
			Err(e) => {
				warn!("trace-graph: {e}");
				self.messages.error(e.to_string());
				self.touch();
				Err(e)
			}
		}
	}

	pub fn observe_resize(&mut self, now: Millis) {
		self.overflow.observe_resize(now);
	}

	pub fn content_changed(&mut self, now: Millis) {
		self.overflow.content_changed(now);
	}

	/// Feed a width measurement for a node or clingraph box.
	pub fn apply_width(&mut self, node: &str, measured: f64, available: f64) -> bool {
		let flipped = self.overflow.apply_width(node, measured, available);
		if flipped {
			self.touch();
		}
		flipped
	}

	/// Feed a height measurement for a node.
	pub fn apply_height(&mut self, node: &str, measure: VerticalMeasure) -> bool {
		let changed = self.overflow.apply_height(node, measure);
		if changed {
			self.touch();
		}
		changed
	}

	/// Overflow button state of a row.
	pub fn row_button(&self, transformation: &str) -> OverflowButtonState {
		let nodes = self.graph.visible_nodes(transformation);
		self.overflow.row_button(&nodes)
	}

	/// The row's overflow button was clicked.
	pub fn toggle_row_overflow(&mut self, transformation: &str, now: Millis) -> BatchDirection {
		let visible = self.graph.visible_nodes(transformation);
		let all = self.graph.row_subtree(transformation);
		let direction = toggle_all_the_way(&mut self.overflow, &visible, &all, now);
		self.touch();
		direction
	}

	pub fn dismiss_message(&mut self, id: u64) {
		if self.messages.dismiss(id) {
			self.touch();
		}
	}

	pub fn config(&self) -> &EngineConfig {
		&self.config
	}

	pub fn graph(&self) -> &GraphModel {
		&self.graph
	}

	pub fn highlights(&self) -> &HighlightStore {
		&self.highlights
	}

	pub fn overflow(&self) -> &OverflowTracker {
		&self.overflow
	}

	pub fn search(&self) -> &SearchModel {
		&self.search
	}

	pub fn messages(&self) -> &UserMessages {
		&self.messages
	}

	pub fn modal(&self) -> Option<&ModalState> {
		self.modal.as_ref()
	}
}

fn decode<T: DeserializeOwned>(result: Result<Value, ApiError>) -> Result<T, ApiError> {
	Ok(serde_json::from_value(result?)?)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::engine::messages::MessageLevel;
	use serde_json::json;

	fn engine() -> Engine {
		Engine::new(EngineConfig::default())
	}

	fn answer(engine: &mut Engine, now: Millis, mut respond: impl FnMut(&ApiRequest) -> Result<Value, ApiError>) {
		loop {
			let tickets = engine.take_tickets();
			if tickets.is_empty() {
				break;
			}
			for t in tickets {
				let result = respond(&t.request);
				engine.complete(t.id, result, now);
			}
		}
	}

	fn backend(request: &ApiRequest) -> Result<Value, ApiError> {
		Ok(match request {
			ApiRequest::Warnings => json!([]),
			ApiRequest::CurrentSort => json!("sort0"),
			ApiRequest::Transformations => json!([
				{"id": 0, "hash": "t0", "rules": {"str_": ["a(1)."], "hash": ["r0"]},
				 "adjacent_sort_indices": {"lower_bound": 0, "upper_bound": 1}},
				{"id": 1, "hash": "t1", "rules": {"str_": ["b(X) :- a(X)."], "hash": ["r1"]},
				 "adjacent_sort_indices": {"lower_bound": 0, "upper_bound": 1}},
			]),
			ApiRequest::Children { transformation_hash, .. } if transformation_hash == "t0" => json!([
				{"uuid": "n0", "atoms": [
					{"uuid": "s_a", "has_reason": false,
					 "symbol": {"_type": "Function", "name": "a", "positive": true, "arguments": [{"_type": "Number", "number": 1}]}}
				], "diff": [], "recursive": false}
			]),
			ApiRequest::Children { .. } => json!([
				{"uuid": "n1", "atoms": [
					{"uuid": "s_b", "has_reason": true,
					 "symbol": {"_type": "Function", "name": "b", "positive": true, "arguments": [{"_type": "Number", "number": 1}]}}
				], "diff": [], "recursive": false}
			]),
			ApiRequest::ClingraphChildren { .. } => json!([]),
			ApiRequest::Edges { .. } => json!([{"src": "n0", "tgt": "n1", "transformation": "t1", "style": "solid"}]),
			ApiRequest::Reason { .. } => json!({"symbols": [{"src": "s_b", "tgt": "s_a"}], "rule": "r1"}),
			ApiRequest::Reorder { .. } => json!({"hash": "sort1"}),
			ApiRequest::Ground { .. } => json!({"rows": []}),
			ApiRequest::Query { text } => json!([{"repr": text, "includes": ["s_a"], "isAutocomplete": false}]),
		})
	}

	fn started() -> Engine {
		let mut e = engine();
		e.start(0.0);
		answer(&mut e, 0.0, backend);
		e
	}

	#[test]
	fn startup_loads_everything() {
		let e = started();
		assert_eq!(e.graph().phase(), graph::Phase::Idle);
		assert_eq!(e.graph().transformations().len(), 2);
		assert_eq!(e.graph().edges().len(), 1);
		assert_eq!(e.pending_requests(), 0);
		assert!(e.messages().active().is_empty());
	}

	#[test]
	fn clicking_twice_toggles_the_explanation() {
		let mut e = started();
		assert!(e.click_symbol("s_b", "n1", 10.0));
		answer(&mut e, 10.0, backend);
		assert!(e.highlights().is_highlighted("s_a"));
		assert_eq!(e.highlights().rule_dots_for("t1", "r1").count(), 1);

		assert!(e.click_symbol("s_b", "n1", 20.0));
		answer(&mut e, 20.0, backend);
		e.tick(20.0 + e.config().rule_dot_fade_ms);
		assert!(e.highlights().rule_dots().is_empty());
		assert!(e.highlights().rule_backgrounds().is_empty());
	}

	#[test]
	fn symbols_without_reason_are_not_clickable() {
		let mut e = started();
		assert!(!e.click_symbol("s_a", "n0", 10.0));
		assert!(e.take_tickets().is_empty());
	}

	#[test]
	fn exact_search_match_highlights_once() {
		let mut e = started();
		let search_ms = e.config().search_highlight_ms;
		e.search_input("a(1)", 0.0);
		answer(&mut e, 0.0, backend);
		e.search_input("a(1)", 5.0);
		answer(&mut e, 5.0, backend);
		let hits: Vec<_> = e.highlights().all_highlights_for("s_a").collect();
		assert_eq!(hits.len(), 1);
		assert!(hits[0].recent);
		e.tick(5.0 + search_ms);
		assert!(!e.highlights().is_pulsating("s_a"));
		assert!(e.highlights().is_highlighted("s_a"));
	}

	#[test]
	fn newer_query_aborts_older_one() {
		let mut e = started();
		e.search_input("a", 0.0);
		let first = e.take_tickets();
		e.search_input("a(", 1.0);
		assert_eq!(e.take_aborted(), vec![first[0].id]);
		e.complete(first[0].id, backend(&first[0].request), 2.0);
		assert!(e.search().suggestions().is_empty());
	}

	#[test]
	fn requests_time_out() {
		let mut e = engine();
		e.start(0.0);
		let tickets = e.take_tickets();
		let timeout = e.config().request_timeout_ms;
		assert!(e.tick(timeout));
		assert_eq!(e.pending_requests(), 0);
		assert_eq!(e.graph().phase(), graph::Phase::Idle);
		assert!(e.messages().active().iter().any(|m| m.text.contains("timed out")));
		// A late answer is ignored.
		let t = &tickets[1];
		e.complete(t.id, backend(&t.request), timeout + 1.0);
		assert_eq!(e.graph().current_sort(), None);
	}

	#[test]
	fn reorder_moves_rows_after_ack() {
		let mut e = started();
		e.reorder(0, 1, 30.0).unwrap();
		assert_eq!(e.graph().position_of("t0"), Some(0));
		let tickets = e.take_tickets();
		assert_eq!(tickets.len(), 1);
		e.complete(tickets[0].id, backend(&tickets[0].request), 31.0);
		assert_eq!(e.graph().position_of("t0"), Some(1));
		assert_eq!(e.graph().current_sort(), Some("sort1"));
		assert_eq!(e.graph().arena().row("t0"), ["n0".to_string()]);
	}

	#[test]
	fn row_overflow_pins_collapsed_sub_nodes() {
		let mut e = engine();
		e.start(0.0);
		answer(&mut e, 0.0, |request| match request {
			ApiRequest::Children { transformation_hash, .. } if transformation_hash == "t0" => Ok(json!([
				{"uuid": "n0", "atoms": [], "diff": [], "recursive": [
					{"uuid": "sub", "atoms": [], "diff": [], "recursive": false}
				]}
			])),
			other => backend(other),
		});
		assert!(!e.graph().recursion().is_shown("n0"));
		let tall = overflow::VerticalMeasure {
			content_height: 400.0,
			lowest_highlight: None,
		};
		e.apply_height("n0", tall);
		e.apply_height("sub", tall);

		assert_eq!(e.toggle_row_overflow("t0", 10.0), BatchDirection::ExpandAll);
		assert!(e.overflow().is_expand_all_the_way("n0"));
		assert!(e.overflow().is_expand_all_the_way("sub"));

		e.apply_height("n0", tall);
		assert_eq!(e.toggle_row_overflow("t0", 20.0), BatchDirection::CollapseAll);
		assert!(!e.overflow().is_expand_all_the_way("sub"));
	}

	#[test]
	fn failed_reorder_reports_and_keeps_order() {
		let mut e = started();
		e.reorder(0, 1, 30.0).unwrap();
		let tickets = e.take_tickets();
		e.complete(
			tickets[0].id,
			Err(ApiError::Status {
				status: 409,
				status_text: "CONFLICT".into(),
			}),
			31.0,
		);
		assert_eq!(e.graph().position_of("t0"), Some(0));
		let msg = &e.messages().active()[0];
		assert_eq!(msg.level, MessageLevel::Error);
		assert_eq!(msg.text, "Failed to reorder transformations: 409 CONFLICT");
	}

	#[test]
	fn edge_failure_keeps_last_good_edges() {
		let mut e = started();
		e.toggle_recursion("n0", 40.0);
		let tickets = e.take_tickets();
		e.complete(tickets[0].id, Err(ApiError::Transport("offline".into())), 41.0);
		assert_eq!(e.graph().edges().len(), 1);
		assert!(!e.graph().recursion().is_shown("n0"));
	}

	#[test]
	fn modal_content_and_pins() {
		let mut e = started();
		e.open_modal("s_b", "n1", 50.0);
		answer(&mut e, 50.0, backend);
		assert_eq!(e.modal().and_then(|m| m.content.clone()), Some(json!({"rows": []})));
		e.toggle_modal_highlight("s_a", "a(1)", 51.0);
		assert!(e.highlights().is_highlighted("s_a"));
		e.close_modal();
		assert!(!e.highlights().is_highlighted("s_a"));
	}
}
