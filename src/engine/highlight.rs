//! Highlight bookkeeping for search hits, explanation chains, and rule markers.
//!
//! Three symbol collections (explanation, search, modal) and two rule marker
//! collections (dots and background glows) live side by side. A symbol can be
//! highlighted by several of them at once; its background is then a gradient
//! over the distinct colors involved.
//!
//! All timed transitions go through one [`TimerTable`] keyed by the entity
//! that owns them:
//!
//! - `recent` flags decay after a fixed delay (pulse / auto-scroll trigger),
//! - a rule's background glow disappears after a fixed delay, while the
//!   symbol highlights that caused it stay,
//! - a removed rule dot first turns `shown = false` (exit transition) and is
//!   purged after a shorter fade delay.
//!
//! Every mutation recomputes the global hover color: the color the next
//! highlight would receive, used to preview clicks on unhighlighted symbols.

use log::debug;

use super::color::{ColorUse, next_color};
use super::theme::Color;
use super::timers::{Millis, TimerTable};
use super::types::{Arrow, RuleHash, SearchSuggestion, SymbolId, TransformationHash};

/// Where a symbol highlight came from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum HighlightOrigin {
	/// Explanation chain started by clicking this symbol.
	Symbol(SymbolId),
	/// Search result.
	Query,
	/// Pinned from the detail modal.
	Modal,
}

impl HighlightOrigin {
	pub fn key(&self) -> &str {
		match self {
			HighlightOrigin::Symbol(id) => id,
			HighlightOrigin::Query => "query",
			HighlightOrigin::Modal => "modal",
		}
	}
}

/// A colored mark on one symbol.
#[derive(Clone, Debug, PartialEq)]
pub struct SymbolHighlight {
	pub symbol_uuid: SymbolId,
	pub origin: HighlightOrigin,
	pub color: Color,
	/// Short-lived flag for one-time effects (pulse, scroll into view).
	pub recent: bool,
	pub transformation_hash: Option<TransformationHash>,
	/// Query text for search highlights.
	pub repr: Option<String>,
	/// Ambiguous matches of a search result; `selected` indexes into it.
	pub includes: Vec<SymbolId>,
	pub selected: usize,
	pub is_autocomplete: bool,
}

impl SymbolHighlight {
	fn explanation(symbol: &str, source: &str, color: Color, transformation: &str) -> Self {
		Self {
			symbol_uuid: symbol.to_string(),
			origin: HighlightOrigin::Symbol(source.to_string()),
			color,
			recent: true,
			transformation_hash: Some(transformation.to_string()),
			repr: None,
			includes: vec![symbol.to_string()],
			selected: 0,
			is_autocomplete: false,
		}
	}

	/// Number of ambiguous matches the selection can cycle through.
	pub fn includes_len(&self) -> usize {
		self.includes.len()
	}
}

impl ColorUse for SymbolHighlight {
	fn origin_key(&self) -> &str {
		self.origin.key()
	}

	fn color(&self) -> Color {
		self.color
	}
}

/// A marker on a rule header, owned by the explanation that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct RuleHighlight {
	/// Source symbol of the owning explanation.
	pub source: SymbolId,
	pub rule_hash: RuleHash,
	pub transformation_hash: TransformationHash,
	pub color: Color,
	/// `false` while fading out before removal.
	pub shown: bool,
}

impl ColorUse for RuleHighlight {
	fn origin_key(&self) -> &str {
		&self.source
	}

	fn color(&self) -> Color {
		self.color
	}
}

/// One explanation request result, compared structurally when toggling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Explanation {
	pub source: SymbolId,
	pub transformation_hash: TransformationHash,
	pub rule_hash: RuleHash,
	arrows: Vec<Arrow>,
}

impl Explanation {
	pub fn new(
		source: impl Into<SymbolId>,
		transformation_hash: impl Into<TransformationHash>,
		rule_hash: impl Into<RuleHash>,
		mut arrows: Vec<Arrow>,
	) -> Self {
		arrows.sort();
		arrows.dedup();
		Self {
			source: source.into(),
			transformation_hash: transformation_hash.into(),
			rule_hash: rule_hash.into(),
			arrows,
		}
	}

	pub fn arrows(&self) -> &[Arrow] {
		&self.arrows
	}

	/// Source first, then every other arrow endpoint once.
	fn endpoints(&self) -> Vec<&str> {
		let mut out: Vec<&str> = vec![&self.source];
		for arrow in &self.arrows {
			for id in [arrow.src.as_str(), arrow.tgt.as_str()] {
				if !out.contains(&id) {
					out.push(id);
				}
			}
		}
		out
	}
}

/// A search hit to highlight.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchResult {
	pub repr: String,
	pub includes: Vec<SymbolId>,
	pub selected: usize,
	pub is_autocomplete: bool,
}

impl From<&SearchSuggestion> for SearchResult {
	fn from(s: &SearchSuggestion) -> Self {
		Self {
			repr: s.repr.clone(),
			includes: s.includes.clone(),
			selected: 0,
			is_autocomplete: s.is_autocomplete,
		}
	}
}

/// One slice of a composite background.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
	pub color: Color,
	pub start: f64,
	pub end: f64,
}

/// CSS for a list of stops; hard edges between colors.
pub fn gradient_css(stops: &[GradientStop]) -> String {
	if stops.is_empty() {
		return "transparent".to_string();
	}
	let parts: Vec<String> = stops
		.iter()
		.map(|s| {
			let c = s.color.to_css();
			format!("{c} {}%, {c} {}%", s.start * 100.0, s.end * 100.0)
		})
		.collect();
	format!("linear-gradient(-45deg, {})", parts.join(", "))
}

/// Delays for the timed transitions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HighlightTimings {
	pub search_recent: Millis,
	pub explanation_recent: Millis,
	pub rule_background: Millis,
	pub rule_fade: Millis,
}

impl Default for HighlightTimings {
	fn default() -> Self {
		Self {
			search_recent: 3000.0,
			explanation_recent: 3000.0,
			rule_background: 3000.0,
			rule_fade: 500.0,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum TimerKey {
	SearchRecent,
	ModalRecent(SymbolId),
	ExplanationRecent(SymbolId),
	RuleBackground(SymbolId),
	RuleDotPurge(SymbolId),
}

/// Outcome of a toggle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Toggled {
	Added,
	Removed,
}

/// Store state from just before `by` replaced an explanation of the same
/// source.
#[derive(Clone, Debug)]
struct Replacement {
	by: Explanation,
	before: HighlightStore,
}

/// All active highlights plus their pending transitions.
#[derive(Clone, Debug)]
pub struct HighlightStore {
	palette: Vec<Color>,
	timings: HighlightTimings,
	explanations: Vec<Explanation>,
	reason: Vec<SymbolHighlight>,
	search: Vec<SymbolHighlight>,
	modal: Vec<SymbolHighlight>,
	rule_dots: Vec<RuleHighlight>,
	/// Most recent first; only the first `shown` entry per rule glows.
	rule_backgrounds: Vec<RuleHighlight>,
	timers: TimerTable<TimerKey>,
	hover_color: Color,
	/// Dropped by every mutation other than `tick` and the matching toggle.
	undo: Option<Box<Replacement>>,
}

// The undo record is not observable state.
impl PartialEq for HighlightStore {
	fn eq(&self, other: &Self) -> bool {
		self.palette == other.palette
			&& self.timings == other.timings
			&& self.explanations == other.explanations
			&& self.reason == other.reason
			&& self.search == other.search
			&& self.modal == other.modal
			&& self.rule_dots == other.rule_dots
			&& self.rule_backgrounds == other.rule_backgrounds
			&& self.timers == other.timers
			&& self.hover_color == other.hover_color
	}
}

impl HighlightStore {
	pub fn new(palette: Vec<Color>, timings: HighlightTimings) -> Self {
		let mut store = Self {
			palette,
			timings,
			explanations: Vec::new(),
			reason: Vec::new(),
			search: Vec::new(),
			modal: Vec::new(),
			rule_dots: Vec::new(),
			rule_backgrounds: Vec::new(),
			timers: TimerTable::default(),
			hover_color: Color::TRANSPARENT,
			undo: None,
		};
		store.refresh_hover_color();
		store
	}

	pub fn palette(&self) -> &[Color] {
		&self.palette
	}

	fn active_uses(&self, with_search: bool) -> Vec<&dyn ColorUse> {
		let mut uses: Vec<&dyn ColorUse> = Vec::new();
		uses.extend(self.reason.iter().map(|h| h as &dyn ColorUse));
		if with_search {
			uses.extend(self.search.iter().map(|h| h as &dyn ColorUse));
		}
		uses.extend(self.modal.iter().map(|h| h as &dyn ColorUse));
		uses.extend(
			self.rule_dots
				.iter()
				.filter(|h| h.shown)
				.map(|h| h as &dyn ColorUse),
		);
		uses
	}

	fn allocate(&self, with_search: bool) -> Color {
		let uses = self.active_uses(with_search);
		next_color(uses.iter().copied(), &self.palette)
	}

	fn refresh_hover_color(&mut self) {
		self.hover_color = self.allocate(true);
	}

	/// Color the next highlight would get.
	pub fn hover_color(&self) -> Color {
		self.hover_color
	}

	/// Hover preview for `symbol`: its own explanation color if it already
	/// started one, otherwise the global next color.
	pub fn hover_color_for(&self, symbol: &str) -> Color {
		self.explanations
			.iter()
			.find(|e| e.source == symbol)
			.and_then(|e| {
				self.reason
					.iter()
					.find(|h| h.origin.key() == e.source)
					.map(|h| h.color)
			})
			.unwrap_or(self.hover_color)
	}

	pub fn has_explanation(&self, source: &str) -> bool {
		self.explanations.iter().any(|e| e.source == source)
	}

	pub fn explanations(&self) -> &[Explanation] {
		&self.explanations
	}

	/// Highlight an explanation chain and mark its rule.
	///
	/// An existing explanation from the same source is replaced.
	pub fn add_explanation(&mut self, explanation: Explanation, now: Millis) {
		self.undo = None;
		self.insert_explanation(explanation, now);
	}

	fn insert_explanation(&mut self, explanation: Explanation, now: Millis) {
		if self.has_explanation(&explanation.source) {
			self.detach_explanation(&explanation.source, now);
		}
		let color = self.allocate(true);
		let source = explanation.source.clone();
		let transformation = explanation.transformation_hash.clone();
		debug!(
			"trace-graph: explanation for {source} via rule {} ({} arrows)",
			explanation.rule_hash,
			explanation.arrows.len()
		);

		for id in explanation.endpoints() {
			self.reason.push(SymbolHighlight::explanation(
				id,
				&source,
				color,
				&transformation,
			));
		}
		self.timers.schedule(
			TimerKey::ExplanationRecent(source.clone()),
			now,
			self.timings.explanation_recent,
		);

		self.timers.cancel(&TimerKey::RuleDotPurge(source.clone()));
		self.rule_dots.retain(|d| d.source != source);
		let marker = RuleHighlight {
			source: source.clone(),
			rule_hash: explanation.rule_hash.clone(),
			transformation_hash: transformation,
			color,
			shown: true,
		};
		self.rule_dots.push(marker.clone());

		for other in self.rule_backgrounds.iter_mut() {
			if other.rule_hash == marker.rule_hash
				&& other.transformation_hash == marker.transformation_hash
			{
				other.shown = false;
			}
		}
		self.rule_backgrounds.insert(0, marker);
		self.timers.schedule(
			TimerKey::RuleBackground(source),
			now,
			self.timings.rule_background,
		);

		self.explanations.push(explanation);
		self.refresh_hover_color();
	}

	/// Drop an explanation's symbol highlights and fade out its rule dot.
	pub fn remove_explanation(&mut self, source: &str, now: Millis) -> bool {
		self.undo = None;
		self.drop_explanation(source, now)
	}

	fn drop_explanation(&mut self, source: &str, now: Millis) -> bool {
		let removed = self.detach_explanation(source, now);
		if removed {
			self.refresh_hover_color();
		}
		removed
	}

	fn detach_explanation(&mut self, source: &str, now: Millis) -> bool {
		let before = self.explanations.len();
		self.explanations.retain(|e| e.source != source);
		if self.explanations.len() == before {
			return false;
		}
		self.reason.retain(|h| h.origin.key() != source);
		self.timers
			.cancel(&TimerKey::ExplanationRecent(source.to_string()));

		let mut fading = false;
		for dot in self.rule_dots.iter_mut().filter(|d| d.source == source) {
			dot.shown = false;
			fading = true;
		}
		if fading {
			self.timers.schedule(
				TimerKey::RuleDotPurge(source.to_string()),
				now,
				self.timings.rule_fade,
			);
		}

		let vacated: Vec<(TransformationHash, RuleHash)> = self
			.rule_backgrounds
			.iter()
			.filter(|b| b.source == source && b.shown)
			.map(|b| (b.transformation_hash.clone(), b.rule_hash.clone()))
			.collect();
		self.rule_backgrounds.retain(|b| b.source != source);
		self.timers
			.cancel(&TimerKey::RuleBackground(source.to_string()));
		// The newest remaining glow on a vacated rule becomes fresh again.
		for (transformation, rule) in vacated {
			if let Some(next) = self
				.rule_backgrounds
				.iter_mut()
				.find(|b| b.transformation_hash == transformation && b.rule_hash == rule)
			{
				next.shown = true;
			}
		}
		true
	}

	/// Add the explanation, or remove it if exactly this one is active.
	///
	/// Toggling off an explanation that replaced another one of the same
	/// source brings the replaced one back, provided nothing else changed in
	/// between.
	pub fn toggle_explanation(&mut self, explanation: Explanation, now: Millis) -> Toggled {
		if self.explanations.contains(&explanation) {
			match self.undo.take() {
				Some(replacement) if replacement.by == explanation => self.restore(*replacement, now),
				_ => {
					self.drop_explanation(&explanation.source, now);
				}
			}
			Toggled::Removed
		} else {
			let before = self
				.has_explanation(&explanation.source)
				.then(|| self.clone());
			self.insert_explanation(explanation.clone(), now);
			self.undo = before.map(|before| {
				Box::new(Replacement {
					by: explanation,
					before,
				})
			});
			Toggled::Added
		}
	}

	fn restore(&mut self, replacement: Replacement, now: Millis) {
		let Replacement { by, before } = replacement;
		debug!("trace-graph: restoring explanation replaced by {}", by.source);
		let dot = self
			.rule_dots
			.iter()
			.find(|d| d.source == by.source && d.shown)
			.cloned();
		*self = before;
		if let Some(dot) = dot {
			self.rule_dots.push(RuleHighlight { shown: false, ..dot });
			self.timers.schedule(
				TimerKey::RuleDotPurge(by.source),
				now,
				self.timings.rule_fade,
			);
		}
	}

	/// Highlight a search result. Repeating the same query keeps its entry.
	pub fn add_search_highlight(&mut self, result: SearchResult, now: Millis) -> bool {
		self.undo = None;
		let Some(symbol) = result.includes.get(result.selected).cloned() else {
			return false;
		};
		if let Some(existing) = self
			.search
			.iter_mut()
			.find(|h| h.repr.as_deref() == Some(result.repr.as_str()))
		{
			existing.symbol_uuid = symbol;
			existing.includes = result.includes;
			existing.selected = result.selected;
			existing.is_autocomplete = result.is_autocomplete;
			existing.recent = true;
		} else {
			// The search entry is replaced, so its own color does not count.
			let color = self.allocate(false);
			self.search = vec![SymbolHighlight {
				symbol_uuid: symbol,
				origin: HighlightOrigin::Query,
				color,
				recent: true,
				transformation_hash: None,
				repr: Some(result.repr),
				includes: result.includes,
				selected: result.selected,
				is_autocomplete: result.is_autocomplete,
			}];
		}
		self.timers
			.schedule(TimerKey::SearchRecent, now, self.timings.search_recent);
		self.refresh_hover_color();
		true
	}

	/// Step the shown disambiguation of a search result by `direction`.
	///
	/// Wraps around; the view disables the buttons at the ends.
	pub fn rotate_search_selection(
		&mut self,
		repr: &str,
		direction: isize,
		now: Millis,
	) -> Option<usize> {
		self.undo = None;
		let entry = self
			.search
			.iter_mut()
			.find(|h| h.repr.as_deref() == Some(repr))?;
		let len = entry.includes.len();
		if len == 0 {
			return None;
		}
		let next = (entry.selected as isize + direction).rem_euclid(len as isize) as usize;
		entry.selected = next;
		entry.symbol_uuid = entry.includes[next].clone();
		entry.recent = true;
		self.timers
			.schedule(TimerKey::SearchRecent, now, self.timings.search_recent);
		Some(next)
	}

	pub fn remove_search_highlights(&mut self) {
		self.undo = None;
		self.search.clear();
		self.timers.cancel(&TimerKey::SearchRecent);
		self.refresh_hover_color();
	}

	pub fn search_highlight(&self) -> Option<&SymbolHighlight> {
		self.search.first()
	}

	/// Pin or unpin a symbol from the detail modal.
	pub fn toggle_modal_highlight(&mut self, symbol: &str, repr: &str, now: Millis) -> Toggled {
		self.undo = None;
		let key = TimerKey::ModalRecent(symbol.to_string());
		if self.modal.iter().any(|h| h.symbol_uuid == symbol) {
			self.modal.retain(|h| h.symbol_uuid != symbol);
			self.timers.cancel(&key);
			self.refresh_hover_color();
			return Toggled::Removed;
		}
		let color = self.allocate(true);
		self.modal.push(SymbolHighlight {
			symbol_uuid: symbol.to_string(),
			origin: HighlightOrigin::Modal,
			color,
			recent: true,
			transformation_hash: None,
			repr: Some(repr.to_string()),
			includes: vec![symbol.to_string()],
			selected: 0,
			is_autocomplete: false,
		});
		self.timers.schedule(key, now, self.timings.search_recent);
		self.refresh_hover_color();
		Toggled::Added
	}

	pub fn clear_modal_highlights(&mut self) {
		self.undo = None;
		self.modal.clear();
		self.timers
			.cancel_where(|k| matches!(k, TimerKey::ModalRecent(_)));
		self.refresh_hover_color();
	}

	/// Reset every collection and cancel all pending transitions.
	pub fn clear(&mut self) {
		self.undo = None;
		self.explanations.clear();
		self.reason.clear();
		self.search.clear();
		self.modal.clear();
		self.rule_dots.clear();
		self.rule_backgrounds.clear();
		self.timers.clear();
		self.refresh_hover_color();
	}

	pub fn has_pending_transitions(&self) -> bool {
		!self.timers.is_empty()
	}

	/// Apply every transition due at `now`. Returns whether anything changed.
	pub fn tick(&mut self, now: Millis) -> bool {
		let due = self.timers.drain_due(now);
		if due.is_empty() {
			return false;
		}
		for key in due {
			match key {
				TimerKey::SearchRecent => {
					for h in &mut self.search {
						h.recent = false;
					}
				}
				TimerKey::ModalRecent(symbol) => {
					for h in self.modal.iter_mut().filter(|h| h.symbol_uuid == symbol) {
						h.recent = false;
					}
				}
				TimerKey::ExplanationRecent(source) => {
					for h in self.reason.iter_mut().filter(|h| h.origin.key() == source) {
						h.recent = false;
					}
				}
				TimerKey::RuleBackground(source) => {
					self.rule_backgrounds.retain(|b| b.source != source);
				}
				TimerKey::RuleDotPurge(source) => {
					self.rule_dots.retain(|d| d.source != source || d.shown);
				}
			}
		}
		self.refresh_hover_color();
		true
	}

	/// Every symbol highlight touching `symbol`, in discovery order.
	pub fn all_highlights_for<'a>(&'a self, symbol: &'a str) -> impl Iterator<Item = &'a SymbolHighlight> {
		self.reason
			.iter()
			.chain(self.search.iter())
			.chain(self.modal.iter())
			.filter(move |h| h.symbol_uuid == symbol)
	}

	pub fn is_highlighted(&self, symbol: &str) -> bool {
		self.all_highlights_for(symbol).next().is_some()
	}

	/// Whether `symbol` should play its one-time pulse.
	pub fn is_pulsating(&self, symbol: &str) -> bool {
		self.all_highlights_for(symbol).any(|h| h.recent)
	}

	/// Symbol the view should scroll to, if a search hit just landed.
	pub fn scroll_target(&self) -> Option<&SymbolId> {
		self.search
			.iter()
			.chain(self.modal.iter())
			.find(|h| h.recent)
			.map(|h| &h.symbol_uuid)
	}

	/// Even partition of `[0, 1]` over the distinct colors on `symbol`,
	/// newest highlight first.
	pub fn background_gradient_for(&self, symbol: &str) -> Vec<GradientStop> {
		let found: Vec<Color> = self.all_highlights_for(symbol).map(|h| h.color).collect();
		let mut distinct: Vec<Color> = Vec::with_capacity(found.len());
		for color in found.into_iter().rev() {
			if !distinct.contains(&color) {
				distinct.push(color);
			}
		}
		let n = distinct.len() as f64;
		distinct
			.into_iter()
			.enumerate()
			.map(|(i, color)| GradientStop {
				color,
				start: i as f64 / n,
				end: (i + 1) as f64 / n,
			})
			.collect()
	}

	/// Dots on a rule header, including ones still fading out.
	pub fn rule_dots_for<'a>(
		&'a self,
		transformation: &'a str,
		rule: &'a str,
	) -> impl Iterator<Item = &'a RuleHighlight> {
		self.rule_dots
			.iter()
			.filter(move |d| d.transformation_hash == transformation && d.rule_hash == rule)
	}

	/// The fresh background glow on a rule header, if any.
	pub fn rule_background_for(&self, transformation: &str, rule: &str) -> Option<&RuleHighlight> {
		self.rule_backgrounds.iter().find(|b| {
			b.shown && b.transformation_hash == transformation && b.rule_hash == rule
		})
	}

	pub fn rule_dots(&self) -> &[RuleHighlight] {
		&self.rule_dots
	}

	pub fn rule_backgrounds(&self) -> &[RuleHighlight] {
		&self.rule_backgrounds
	}

	pub fn reason_highlights(&self) -> &[SymbolHighlight] {
		&self.reason
	}

	pub fn modal_highlights(&self) -> &[SymbolHighlight] {
		&self.modal
	}
}
