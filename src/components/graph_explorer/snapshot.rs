//! Plain data the view renders from, taken from the engine in one borrow.

use crate::api::clingraph_image_path;
use crate::engine::Engine;
use crate::engine::highlight::gradient_css;
use crate::engine::messages::MessageLevel;
use crate::engine::overflow::OverflowButtonState;
use crate::engine::theme::{HOVER_DARKEN_FACTOR, HOVER_LIGHTEN_FACTOR};
use crate::engine::types::NodeId;

#[derive(Clone, Debug, PartialEq)]
pub struct SymbolView {
	pub uuid: String,
	pub label: String,
	pub background: String,
	pub hover_fill: String,
	pub hover_border: String,
	pub pulsing: bool,
	pub has_reason: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeView {
	pub uuid: NodeId,
	pub mini: bool,
	pub loading: bool,
	pub height: f64,
	pub pinned: bool,
	pub recursive: bool,
	pub expanded: bool,
	pub space: f64,
	pub symbols: Vec<SymbolView>,
	pub subnodes: Vec<NodeView>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RuleView {
	pub source: String,
	pub background: String,
	/// `(css color, shown)`; hidden dots are fading out.
	pub dots: Vec<(String, bool)>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RowView {
	pub position: usize,
	pub hash: String,
	pub shade: String,
	pub rules: Vec<RuleView>,
	pub nodes: Vec<NodeView>,
	pub button: OverflowButtonState,
	pub can_move_up: bool,
	pub can_move_down: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClingraphView {
	pub uuid: NodeId,
	pub src: String,
	pub mini: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MessageView {
	pub id: u64,
	pub is_error: bool,
	pub text: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SuggestionView {
	pub repr: String,
	pub active: bool,
	pub is_autocomplete: bool,
}

/// Everything below the search box.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphView {
	pub loading: bool,
	pub rows: Vec<RowView>,
	pub clingraph: Vec<ClingraphView>,
	pub edge_count: usize,
	pub messages: Vec<MessageView>,
	pub suggestions: Vec<SuggestionView>,
	pub awaiting_input: bool,
	/// `(selected, total)` of the active search result.
	pub search_position: Option<(usize, usize)>,
	pub modal: Option<(String, String, Option<String>)>,
	pub scroll_target: Option<String>,
}

fn symbol_view(engine: &Engine, uuid: &str, label: String, has_reason: bool) -> SymbolView {
	let highlights = engine.highlights();
	let hover = highlights.hover_color_for(uuid);
	SymbolView {
		uuid: uuid.to_string(),
		label,
		background: gradient_css(&highlights.background_gradient_for(uuid)),
		hover_fill: hover.lighten(HOVER_LIGHTEN_FACTOR).to_css(),
		hover_border: hover.darken(HOVER_DARKEN_FACTOR).to_css(),
		pulsing: highlights.is_pulsating(uuid),
		has_reason,
	}
}

fn node_view(engine: &Engine, id: &str) -> Option<NodeView> {
	let graph = engine.graph();
	let entry = graph.arena().get(id)?;
	let overflow = engine.overflow();
	let vertical = overflow.vertical_state(id);
	let expanded = graph.recursion().is_shown(id);
	let symbols = entry
		.node
		.content(entry.node.diff.is_empty())
		.iter()
		.map(|s| symbol_view(engine, &s.uuid, s.symbol.to_string(), s.has_reason))
		.collect();
	let subnodes = if expanded {
		entry.children.iter().filter_map(|c| node_view(engine, c)).collect()
	} else {
		Vec::new()
	};
	Some(NodeView {
		uuid: id.to_string(),
		mini: overflow.show_mini(id),
		loading: entry.loading,
		height: vertical.visible_height,
		pinned: vertical.is_expand_v_all_the_way,
		recursive: !entry.children.is_empty(),
		expanded,
		space: entry.node.space_multiplier,
		symbols,
		subnodes,
	})
}

/// Snapshot the engine for painting.
pub fn graph_view(engine: &Engine) -> GraphView {
	let graph = engine.graph();
	let highlights = engine.highlights();
	let palette = &engine.config().palette;

	let rows = graph
		.transformations()
		.iter()
		.enumerate()
		.map(|(position, t)| {
			let targets = graph.drop_targets(position);
			let allows = |p: Option<usize>| {
				p.zip(targets.clone())
					.is_some_and(|(p, range)| range.contains(&p))
			};
			let rules = t
				.rules
				.iter()
				.map(|(hash, source)| RuleView {
					source: source.clone(),
					background: highlights
						.rule_background_for(&t.hash, hash)
						.map_or_else(|| "transparent".to_string(), |b| b.color.to_css()),
					dots: highlights
						.rule_dots_for(&t.hash, hash)
						.map(|d| (d.color.to_css(), d.shown))
						.collect(),
				})
				.collect();
			RowView {
				position,
				hash: t.hash.clone(),
				shade: palette.row_shade(position).to_css(),
				rules,
				nodes: graph
					.arena()
					.row(&t.hash)
					.iter()
					.filter_map(|id| node_view(engine, id))
					.collect(),
				button: engine.row_button(&t.hash),
				can_move_up: allows(position.checked_sub(1)),
				can_move_down: allows(Some(position + 1).filter(|p| *p < graph.transformations().len())),
			}
		})
		.collect();

	let clingraph = graph
		.clingraph()
		.iter()
		.map(|c| ClingraphView {
			uuid: c.uuid.clone(),
			src: engine.config().url(&clingraph_image_path(&c.uuid)),
			mini: engine.overflow().show_mini(&c.uuid),
		})
		.collect();

	let search = engine.search();
	let suggestions = search
		.partial_matches()
		.iter()
		.enumerate()
		.map(|(i, s)| SuggestionView {
			repr: s.repr.clone(),
			active: i == search.cursor(),
			is_autocomplete: s.is_autocomplete,
		})
		.collect();

	GraphView {
		loading: graph.is_loading(),
		rows,
		clingraph,
		edge_count: graph.edges().len(),
		messages: engine
			.messages()
			.active()
			.iter()
			.map(|m| MessageView {
				id: m.id,
				is_error: m.level == MessageLevel::Error,
				text: m.text.clone(),
			})
			.collect(),
		suggestions,
		awaiting_input: search.awaiting_input(),
		search_position: highlights
			.search_highlight()
			.map(|h| (h.selected, h.includes_len())),
		modal: engine.modal().map(|m| {
			(
				m.source_id.clone(),
				m.node_id.clone(),
				m.content.as_ref().and_then(|c| serde_json::to_string_pretty(c).ok()),
			)
		}),
		scroll_target: highlights.scroll_target().cloned(),
	}
}

/// The scroll target to act on for this render, if it is a new one.
///
/// `last` follows `target`, so a symbol scrolls once per stretch as target.
pub fn fresh_scroll_target(last: &mut Option<NodeId>, target: Option<NodeId>) -> Option<NodeId> {
	if *last == target {
		return None;
	}
	*last = target.clone();
	target
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::EngineConfig;

	#[test]
	fn empty_engine_renders_nothing() {
		let view = graph_view(&Engine::new(EngineConfig::default()));
		assert!(view.rows.is_empty());
		assert!(!view.loading);
		assert!(view.search_position.is_none());
	}

	#[test]
	fn scroll_target_fires_once_per_stretch() {
		let mut last = None;
		assert_eq!(fresh_scroll_target(&mut last, Some("s".into())), Some("s".to_string()));
		assert_eq!(fresh_scroll_target(&mut last, Some("s".into())), None);
		assert_eq!(fresh_scroll_target(&mut last, None), None);
		assert_eq!(fresh_scroll_target(&mut last, Some("s".into())), Some("s".to_string()));
	}

	#[test]
	fn loading_engine_reports_it() {
		let mut engine = Engine::new(EngineConfig::default());
		engine.start(0.0);
		assert!(graph_view(&engine).loading);
	}
}
