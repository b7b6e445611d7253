//! Which recursive super-nodes currently show their sub-nodes.
//!
//! Expanding or collapsing a super-node changes which anchors exist, so the
//! edge list must be refetched. A toggle is therefore only *staged*; the view
//! keeps rendering the applied set until the edge reload carrying the staged
//! set succeeds.

use std::collections::BTreeSet;

use super::overflow::OverflowTracker;
use super::timers::Millis;
use super::types::NodeId;

/// Applied and staged recursion sets.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecursionVisibility {
	applied: BTreeSet<NodeId>,
	staged: Option<BTreeSet<NodeId>>,
}

impl RecursionVisibility {
	pub fn new() -> Self {
		Self::default()
	}

	/// Flip `node` in the staged set and return the set to send with the
	/// edge reload.
	pub fn toggle(&mut self, node: &str) -> BTreeSet<NodeId> {
		let mut next = self.requested();
		if !next.remove(node) {
			next.insert(node.to_string());
		}
		self.staged = Some(next.clone());
		next
	}

	/// The set the next edge reload should carry.
	pub fn requested(&self) -> BTreeSet<NodeId> {
		self.staged.clone().unwrap_or_else(|| self.applied.clone())
	}

	/// An edge reload carrying `sent` succeeded.
	pub fn commit(&mut self, sent: &BTreeSet<NodeId>) {
		if self.staged.as_ref() == Some(sent) {
			self.staged = None;
		}
		self.applied = sent.clone();
	}

	/// An edge reload carrying `sent` failed; drop the matching staged change.
	pub fn discard(&mut self, sent: &BTreeSet<NodeId>) -> bool {
		if self.staged.as_ref() == Some(sent) {
			self.staged = None;
			return true;
		}
		false
	}

	pub fn is_pending(&self) -> bool {
		self.staged.is_some()
	}

	/// Whether the view should render `node`'s sub-nodes.
	pub fn is_shown(&self, node: &str) -> bool {
		self.applied.contains(node)
	}

	pub fn applied(&self) -> &BTreeSet<NodeId> {
		&self.applied
	}

	/// Forget nodes that vanished in a reload.
	pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
		self.applied.retain(|id| keep(id));
		if let Some(staged) = self.staged.as_mut() {
			staged.retain(|id| keep(id));
		}
	}

	pub fn clear(&mut self) {
		self.applied.clear();
		self.staged = None;
	}
}

/// What the row overflow button does when clicked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchDirection {
	ExpandAll,
	CollapseAll,
}

/// Decide the batch direction for a row.
///
/// Any expandable node, or a mix of pinned and unpinned nodes, means expand.
pub fn batch_direction(tracker: &OverflowTracker, nodes: &[NodeId]) -> BatchDirection {
	let any_expandable = nodes
		.iter()
		.any(|n| tracker.vertical_state(n).is_expandable_v);
	let pinned = nodes
		.iter()
		.filter(|n| tracker.is_expand_all_the_way(n))
		.count();
	let mixed = pinned > 0 && pinned < nodes.len();
	if any_expandable || mixed {
		BatchDirection::ExpandAll
	} else {
		BatchDirection::CollapseAll
	}
}

/// Expand or collapse every node of a row (sub-nodes included) at once.
///
/// The direction is decided over the `visible` nodes; the pin is applied to
/// `all` of them, so collapsed sub-nodes open up in the same state later.
pub fn toggle_all_the_way(
	tracker: &mut OverflowTracker,
	visible: &[NodeId],
	all: &[NodeId],
	now: Millis,
) -> BatchDirection {
	let direction = batch_direction(tracker, visible);
	let expand = direction == BatchDirection::ExpandAll;
	for node in all {
		tracker.set_expand_all_the_way(node, expand, now);
	}
	direction
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::engine::overflow::{OverflowThresholds, VerticalMeasure};

	fn set(ids: &[&str]) -> BTreeSet<NodeId> {
		ids.iter().map(|s| s.to_string()).collect()
	}

	#[test]
	fn toggle_is_staged_until_commit() {
		let mut r = RecursionVisibility::new();
		let sent = r.toggle("n1");
		assert_eq!(sent, set(&["n1"]));
		assert!(!r.is_shown("n1"));
		assert!(r.is_pending());
		r.commit(&sent);
		assert!(r.is_shown("n1"));
		assert!(!r.is_pending());
	}

	#[test]
	fn failed_reload_discards_staged_change() {
		let mut r = RecursionVisibility::new();
		let first = r.toggle("n1");
		r.commit(&first);
		let second = r.toggle("n1");
		assert!(second.is_empty());
		assert!(r.discard(&second));
		assert!(r.is_shown("n1"));
		assert_eq!(r.requested(), set(&["n1"]));
	}

	#[test]
	fn toggles_stack_on_staged_set() {
		let mut r = RecursionVisibility::new();
		let a = r.toggle("a");
		let ab = r.toggle("b");
		assert_eq!(ab, set(&["a", "b"]));
		// The superseded reload answering late does not clear the newer stage.
		assert!(!r.discard(&a));
		assert!(r.is_pending());
	}

	fn tall() -> VerticalMeasure {
		VerticalMeasure {
			content_height: 400.0,
			lowest_highlight: None,
		}
	}

	#[test]
	fn batch_expands_then_collapses() {
		let mut tracker = OverflowTracker::new(OverflowThresholds::default(), 150.0, 50.0);
		let nodes = vec!["a".to_string(), "b".to_string()];
		for n in &nodes {
			tracker.apply_height(n, tall());
		}
		assert_eq!(toggle_all_the_way(&mut tracker, &nodes, &nodes, 0.0), BatchDirection::ExpandAll);
		for n in &nodes {
			tracker.apply_height(n, tall());
			assert!(tracker.is_expand_all_the_way(n));
		}
		assert_eq!(toggle_all_the_way(&mut tracker, &nodes, &nodes, 1.0), BatchDirection::CollapseAll);
		assert!(nodes.iter().all(|n| !tracker.is_expand_all_the_way(n)));
	}

	#[test]
	fn batch_pins_hidden_sub_nodes() {
		let mut tracker = OverflowTracker::new(OverflowThresholds::default(), 150.0, 50.0);
		let visible = vec!["a".to_string()];
		let all = vec!["a".to_string(), "a.sub".to_string()];
		tracker.apply_height("a", tall());
		assert_eq!(toggle_all_the_way(&mut tracker, &visible, &all, 0.0), BatchDirection::ExpandAll);
		assert!(tracker.is_expand_all_the_way("a.sub"));
		tracker.apply_height("a", tall());
		assert_eq!(toggle_all_the_way(&mut tracker, &visible, &all, 1.0), BatchDirection::CollapseAll);
		assert!(!tracker.is_expand_all_the_way("a.sub"));
	}

	#[test]
	fn mixed_pins_normalize_to_expand() {
		let mut tracker = OverflowTracker::new(OverflowThresholds::default(), 150.0, 50.0);
		let nodes = vec!["a".to_string(), "b".to_string()];
		tracker.set_expand_all_the_way("a", true, 0.0);
		assert_eq!(batch_direction(&tracker, &nodes), BatchDirection::ExpandAll);
	}
}
