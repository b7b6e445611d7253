//! Overflow decisions for nodes and boxes.
//!
//! Horizontal: a node whose content does not fit the width it is given
//! switches to a compact ("mini") rendering. The width at which that happened
//! is remembered as a breakpoint so the node only recovers once the viewport
//! has grown back past it, which keeps a resize drag from flickering.
//!
//! Vertical: a node's height is clamped to a standard height. It grows only
//! when pinned open, or just far enough to show the lowest highlighted symbol.

use std::collections::{HashMap, HashSet};

use super::timers::{Debouncer, Millis};
use super::types::NodeId;

/// Pixel thresholds for both overflow directions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverflowThresholds {
	/// Extra room content must have before it counts as fitting.
	pub mini_margin: f64,
	/// How far below the breakpoint the width may be to count as recovered.
	pub recovery_threshold: f64,
	/// Default visible height of a node.
	pub standard_height: f64,
}

impl Default for OverflowThresholds {
	fn default() -> Self {
		Self {
			mini_margin: 48.0,
			recovery_threshold: 16.0,
			standard_height: 160.0,
		}
	}
}

/// Horizontal overflow state of one node.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MiniState {
	pub show_mini: bool,
	/// Available width recorded when the node went mini.
	pub breakpoint: Option<f64>,
}

/// Next horizontal state for a node measuring `measured` px in `available` px.
pub fn should_show_mini(
	measured: f64,
	available: f64,
	previous: MiniState,
	thresholds: &OverflowThresholds,
) -> MiniState {
	if let Some(breakpoint) = previous.breakpoint {
		if available >= breakpoint - thresholds.recovery_threshold {
			return MiniState::default();
		}
	}
	if !previous.show_mini && measured + thresholds.mini_margin > available {
		return MiniState {
			show_mini: true,
			breakpoint: Some(available),
		};
	}
	previous
}

/// Heights measured from a node's rendered content.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VerticalMeasure {
	/// Full scroll height of the content.
	pub content_height: f64,
	/// Bottom edge of the lowest highlighted symbol, relative to the node top.
	pub lowest_highlight: Option<f64>,
}

/// Vertical overflow state of one node.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VerticalState {
	pub visible_height: f64,
	pub is_expandable_v: bool,
	pub is_collapsible_v: bool,
	pub is_expand_v_all_the_way: bool,
}

/// Visible height and expand/collapse flags for one node.
pub fn vertical_layout(
	measure: VerticalMeasure,
	expand_all_the_way: bool,
	thresholds: &OverflowThresholds,
) -> VerticalState {
	let content = measure.content_height;
	let standard = thresholds.standard_height;
	let visible = if expand_all_the_way {
		content
	} else {
		match measure.lowest_highlight {
			Some(bottom) if bottom > standard => bottom.min(content),
			_ => standard.min(content),
		}
	};
	VerticalState {
		visible_height: visible,
		is_expandable_v: content > visible,
		is_collapsible_v: expand_all_the_way && content > standard,
		is_expand_v_all_the_way: expand_all_the_way,
	}
}

/// Aggregate shown on a transformation row's overflow button.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OverflowButtonState {
	pub is_expandable_v: bool,
	pub is_collapsible_v: bool,
	pub all_nodes_show_mini: bool,
}

impl OverflowButtonState {
	pub fn is_visible(&self) -> bool {
		!self.all_nodes_show_mini && (self.is_expandable_v || self.is_collapsible_v)
	}
}

/// Per-node overflow bookkeeping plus the debounced measurement triggers.
#[derive(Clone, Debug, PartialEq)]
pub struct OverflowTracker {
	thresholds: OverflowThresholds,
	mini: HashMap<NodeId, MiniState>,
	vertical: HashMap<NodeId, VerticalState>,
	pinned: HashSet<NodeId>,
	resize: Debouncer,
	content: Debouncer,
}

impl OverflowTracker {
	pub fn new(thresholds: OverflowThresholds, resize_debounce: Millis, content_debounce: Millis) -> Self {
		Self {
			thresholds,
			mini: HashMap::new(),
			vertical: HashMap::new(),
			pinned: HashSet::new(),
			resize: Debouncer::new(resize_debounce),
			content: Debouncer::new(content_debounce),
		}
	}

	pub fn thresholds(&self) -> &OverflowThresholds {
		&self.thresholds
	}

	/// The viewport changed size.
	pub fn observe_resize(&mut self, now: Millis) {
		self.resize.trigger(now);
	}

	/// Some node's content or highlight set changed.
	pub fn content_changed(&mut self, now: Millis) {
		self.content.trigger(now);
	}

	/// Whether a measurement pass is due. Both triggers are consumed.
	pub fn poll(&mut self, now: Millis) -> bool {
		let resized = self.resize.poll(now);
		let changed = self.content.poll(now);
		resized || changed
	}

	pub fn is_measurement_pending(&self) -> bool {
		self.resize.is_armed() || self.content.is_armed()
	}

	/// Feed a width measurement. Returns whether the mini state flipped.
	pub fn apply_width(&mut self, node: &str, measured: f64, available: f64) -> bool {
		let previous = self.mini_state(node);
		let next = should_show_mini(measured, available, previous, &self.thresholds);
		self.mini.insert(node.to_string(), next);
		next.show_mini != previous.show_mini
	}

	/// Feed a height measurement. Returns whether the vertical state changed.
	pub fn apply_height(&mut self, node: &str, measure: VerticalMeasure) -> bool {
		let pinned = self.pinned.contains(node);
		let next = vertical_layout(measure, pinned, &self.thresholds);
		self.vertical.insert(node.to_string(), next) != Some(next)
	}

	pub fn mini_state(&self, node: &str) -> MiniState {
		self.mini.get(node).copied().unwrap_or_default()
	}

	pub fn show_mini(&self, node: &str) -> bool {
		self.mini_state(node).show_mini
	}

	pub fn vertical_state(&self, node: &str) -> VerticalState {
		self.vertical.get(node).copied().unwrap_or(VerticalState {
			visible_height: self.thresholds.standard_height,
			is_expand_v_all_the_way: self.pinned.contains(node),
			..VerticalState::default()
		})
	}

	pub fn is_expand_all_the_way(&self, node: &str) -> bool {
		self.pinned.contains(node)
	}

	/// Pin or unpin a node open; the next height measurement applies it.
	pub fn set_expand_all_the_way(&mut self, node: &str, expand: bool, now: Millis) {
		let changed = if expand {
			self.pinned.insert(node.to_string())
		} else {
			self.pinned.remove(node)
		};
		if changed {
			if let Some(state) = self.vertical.get_mut(node) {
				state.is_expand_v_all_the_way = expand;
			}
			self.content.trigger(now);
		}
	}

	/// Button state for a row made of `nodes`.
	pub fn row_button<'a>(&self, nodes: impl IntoIterator<Item = &'a NodeId>) -> OverflowButtonState {
		let mut state = OverflowButtonState {
			all_nodes_show_mini: true,
			..OverflowButtonState::default()
		};
		let mut any = false;
		for node in nodes {
			any = true;
			let v = self.vertical_state(node);
			state.is_expandable_v |= v.is_expandable_v;
			state.is_collapsible_v |= v.is_collapsible_v;
			state.all_nodes_show_mini &= self.show_mini(node);
		}
		if !any {
			state.all_nodes_show_mini = false;
		}
		state
	}

	/// Drop state for nodes that no longer exist.
	pub fn retain_nodes(&mut self, mut keep: impl FnMut(&str) -> bool) {
		self.mini.retain(|id, _| keep(id));
		self.vertical.retain(|id, _| keep(id));
		self.pinned.retain(|id| keep(id));
	}

	pub fn clear(&mut self) {
		self.mini.clear();
		self.vertical.clear();
		self.pinned.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	fn t() -> OverflowThresholds {
		OverflowThresholds::default()
	}

	#[test]
	fn goes_mini_and_records_breakpoint() {
		let s = should_show_mini(400.0, 420.0, MiniState::default(), &t());
		assert_eq!(
			s,
			MiniState {
				show_mini: true,
				breakpoint: Some(420.0)
			}
		);
	}

	#[test]
	fn fitting_content_stays_full() {
		let s = should_show_mini(100.0, 400.0, MiniState::default(), &t());
		assert_eq!(s, MiniState::default());
	}

	#[test]
	fn recovers_only_near_breakpoint() {
		let mini = should_show_mini(400.0, 420.0, MiniState::default(), &t());
		let still = should_show_mini(400.0, 403.0, mini, &t());
		assert!(still.show_mini);
		let back = should_show_mini(400.0, 404.0, mini, &t());
		assert_eq!(back, MiniState::default());
	}

	#[test]
	fn vertical_clamps_to_standard_height() {
		let m = VerticalMeasure {
			content_height: 400.0,
			lowest_highlight: None,
		};
		let v = vertical_layout(m, false, &t());
		assert_eq!(v.visible_height, 160.0);
		assert!(v.is_expandable_v);
		assert!(!v.is_collapsible_v);
	}

	#[test]
	fn vertical_reveals_lowest_highlight_only() {
		let m = VerticalMeasure {
			content_height: 400.0,
			lowest_highlight: Some(250.0),
		};
		let v = vertical_layout(m, false, &t());
		assert_eq!(v.visible_height, 250.0);
		assert!(v.is_expandable_v);

		let short = VerticalMeasure {
			content_height: 100.0,
			lowest_highlight: Some(90.0),
		};
		let v = vertical_layout(short, false, &t());
		assert_eq!(v.visible_height, 100.0);
		assert!(!v.is_expandable_v);
	}

	#[test]
	fn pinned_node_shows_everything_and_can_collapse() {
		let m = VerticalMeasure {
			content_height: 400.0,
			lowest_highlight: None,
		};
		let v = vertical_layout(m, true, &t());
		assert_eq!(v.visible_height, 400.0);
		assert!(!v.is_expandable_v);
		assert!(v.is_collapsible_v);
	}

	#[test]
	fn debounce_coalesces_resize_bursts() {
		let mut tracker = OverflowTracker::new(t(), 150.0, 50.0);
		tracker.observe_resize(0.0);
		tracker.observe_resize(100.0);
		assert!(!tracker.poll(200.0));
		assert!(tracker.poll(250.0));
		assert!(!tracker.poll(400.0));
	}

	#[test]
	fn row_button_aggregates_nodes() {
		let mut tracker = OverflowTracker::new(t(), 150.0, 50.0);
		let tall = VerticalMeasure {
			content_height: 300.0,
			lowest_highlight: None,
		};
		tracker.apply_height("a", tall);
		tracker.apply_height("b", VerticalMeasure {
			content_height: 20.0,
			lowest_highlight: None,
		});
		let nodes = vec!["a".to_string(), "b".to_string()];
		let button = tracker.row_button(&nodes);
		assert!(button.is_expandable_v);
		assert!(!button.all_nodes_show_mini);
		assert!(button.is_visible());

		tracker.apply_width("a", 500.0, 100.0);
		tracker.apply_width("b", 500.0, 100.0);
		assert!(!tracker.row_button(&nodes).is_visible());
	}

	#[test]
	fn pinning_applies_on_next_measurement() {
		let mut tracker = OverflowTracker::new(t(), 150.0, 50.0);
		let tall = VerticalMeasure {
			content_height: 300.0,
			lowest_highlight: None,
		};
		tracker.apply_height("a", tall);
		tracker.set_expand_all_the_way("a", true, 0.0);
		assert!(tracker.vertical_state("a").is_expand_v_all_the_way);
		assert!(tracker.poll(50.0));
		assert!(tracker.apply_height("a", tall));
		assert_eq!(tracker.vertical_state("a").visible_height, 300.0);
	}

	proptest! {
		#[test]
		fn prop_mini_holds_until_recovered(
			measured in 0.0f64..800.0,
			widths in proptest::collection::vec(0.0f64..1000.0, 1..40),
		) {
			let th = t();
			let mut state = MiniState::default();
			for w in widths {
				let next = should_show_mini(measured, w, state, &th);
				if let (true, Some(bp)) = (state.show_mini, state.breakpoint) {
					if w < bp - th.recovery_threshold {
						prop_assert!(next.show_mini);
						prop_assert_eq!(next.breakpoint, Some(bp));
					} else {
						prop_assert_eq!(next, MiniState::default());
					}
				}
				state = next;
			}
		}
	}
}
