//! trace-graph: highlight and layout coordination for a logic-program
//! derivation graph explorer.
//!
//! The [`engine`] module holds the target-independent core: color allocation,
//! highlight bookkeeping, overflow decisions, recursion visibility and the
//! reload state machine. [`components`] hosts it in a Leptos CSR app.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod api;
pub mod components;
pub mod config;
pub mod engine;
pub mod error;

pub use components::graph_explorer::GraphExplorer;
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{ApiError, EngineError};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("trace-graph: logging initialized");
}

/// Load the engine config from a script element with id="engine-config".
/// Falls back to defaults when the element is missing or malformed.
fn load_config() -> EngineConfig {
	let text = (|| {
		let window: Window = web_sys::window()?;
		let document = window.document()?;
		let element = document.get_element_by_id("engine-config")?;
		let script: HtmlScriptElement = element.dyn_into().ok()?;
		script.text().ok()
	})();
	let Some(json_text) = text else {
		info!("trace-graph: no engine config found, using defaults");
		return EngineConfig::default();
	};

	match EngineConfig::from_json(&json_text) {
		Ok(config) => {
			info!("trace-graph: backend at {}", config.backend_url);
			config
		}
		Err(e) => {
			warn!("trace-graph: failed to parse engine config: {}", e);
			EngineConfig::default()
		}
	}
}

/// Main application component.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let config = load_config();

	view! {
		<Html attr:lang="en" attr:dir="ltr" />
		<Title text="Derivation Graph" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<GraphExplorer config=config />
	}
}
