//! Engine configuration.
//!
//! Read once at startup from a `<script id="engine-config">` JSON element.
//! Every field has a default, so a partial (or missing) config still works.

use serde::{Deserialize, Serialize};

use crate::engine::highlight::HighlightTimings;
use crate::engine::overflow::OverflowThresholds;
use crate::engine::theme::{Color, ColorPalette};
use crate::engine::timers::Millis;

/// All tunables of the engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
	/// Base URL of the backend, without a trailing slash.
	pub backend_url: String,
	/// Theme colors and the highlight palette.
	pub palette: ColorPalette,
	/// How long a search hit pulses.
	pub search_highlight_ms: Millis,
	/// How long a rule header glows after an explanation.
	pub rule_background_ms: Millis,
	/// Exit transition of a removed rule dot.
	pub rule_dot_fade_ms: Millis,
	/// How long explanation highlights pulse.
	pub explanation_recent_ms: Millis,
	/// Quiet window before a resize triggers remeasurement.
	pub resize_debounce_ms: Millis,
	/// Quiet window before a content change triggers remeasurement.
	pub content_debounce_ms: Millis,
	/// Backend calls older than this fail with a timeout.
	pub request_timeout_ms: Millis,
	/// Extra width content needs before it counts as fitting.
	pub mini_margin_px: f64,
	/// Recovery slack below the recorded mini breakpoint.
	pub mini_recovery_px: f64,
	/// Default visible height of a node.
	pub standard_node_height_px: f64,
}

impl Default for EngineConfig {
	fn default() -> Self {
		let timings = HighlightTimings::default();
		let thresholds = OverflowThresholds::default();
		Self {
			backend_url: "http://localhost:5050".to_string(),
			palette: ColorPalette::default(),
			search_highlight_ms: timings.search_recent,
			rule_background_ms: timings.rule_background,
			rule_dot_fade_ms: timings.rule_fade,
			explanation_recent_ms: timings.explanation_recent,
			resize_debounce_ms: 150.0,
			content_debounce_ms: 50.0,
			request_timeout_ms: 30_000.0,
			mini_margin_px: thresholds.mini_margin,
			mini_recovery_px: thresholds.recovery_threshold,
			standard_node_height_px: thresholds.standard_height,
		}
	}
}

impl EngineConfig {
	/// Parse a JSON config, filling gaps with defaults.
	pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
		let mut config: Self = serde_json::from_str(text)?;
		config.backend_url = config.backend_url.trim_end_matches('/').to_string();
		Ok(config)
	}

	/// Delays for the highlight store.
	pub fn highlight_timings(&self) -> HighlightTimings {
		HighlightTimings {
			search_recent: self.search_highlight_ms,
			explanation_recent: self.explanation_recent_ms,
			rule_background: self.rule_background_ms,
			rule_fade: self.rule_dot_fade_ms,
		}
	}

	/// Pixel thresholds for the overflow tracker.
	pub fn overflow_thresholds(&self) -> OverflowThresholds {
		OverflowThresholds {
			mini_margin: self.mini_margin_px,
			recovery_threshold: self.mini_recovery_px,
			standard_height: self.standard_node_height_px,
		}
	}

	/// Colors handed out to highlights.
	pub fn highlight_palette(&self) -> Vec<Color> {
		self.palette.explanation_highlights.clone()
	}

	/// Absolute URL for a backend path starting with `/`.
	pub fn url(&self, path: &str) -> String {
		format!("{}{}", self.backend_url, path)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_config_keeps_defaults() {
		let config =
			EngineConfig::from_json(r#"{"backendUrl":"http://example.org/","requestTimeoutMs":500}"#).unwrap();
		assert_eq!(config.backend_url, "http://example.org");
		assert_eq!(config.request_timeout_ms, 500.0);
		assert_eq!(config.resize_debounce_ms, 150.0);
		assert_eq!(config.url("/graph/current"), "http://example.org/graph/current");
	}

	#[test]
	fn empty_palette_is_accepted() {
		let config = EngineConfig::from_json(r#"{"palette":{"explanationHighlights":[]}}"#).unwrap();
		assert!(config.highlight_palette().is_empty());
	}

	#[test]
	fn thresholds_map_through() {
		let config = EngineConfig::default();
		assert_eq!(config.overflow_thresholds(), OverflowThresholds::default());
		assert_eq!(config.highlight_timings(), HighlightTimings::default());
	}
}
