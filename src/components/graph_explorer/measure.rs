//! DOM measurements fed back into the overflow tracker.

use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlImageElement};

use super::driver::Driver;
use crate::engine::Engine;
use crate::engine::overflow::VerticalMeasure;

/// DOM id of a rendered node.
pub fn node_dom_id(uuid: &str) -> String {
	format!("node-{uuid}")
}

/// DOM id of a rendered symbol.
pub fn symbol_dom_id(uuid: &str) -> String {
	format!("symbol-{uuid}")
}

/// DOM id of a clingraph image.
pub fn clingraph_dom_id(uuid: &str) -> String {
	format!("clingraph-{uuid}")
}

struct Target {
	node: String,
	space: f64,
	highlighted: Vec<String>,
}

fn targets(engine: &Engine) -> Vec<Target> {
	let graph = engine.graph();
	let highlights = engine.highlights();
	graph
		.transformations()
		.iter()
		.flat_map(|t| graph.visible_nodes(&t.hash))
		.filter_map(|id| {
			let entry = graph.arena().get(&id)?;
			let highlighted = entry
				.node
				.atoms
				.iter()
				.chain(entry.node.diff.iter())
				.filter(|s| highlights.is_highlighted(&s.uuid))
				.map(|s| s.uuid.clone())
				.collect();
			Some(Target {
				space: entry.node.space_multiplier,
				node: id,
				highlighted,
			})
		})
		.collect()
}

fn available_width(el: &Element, space: f64) -> f64 {
	el.parent_element()
		.map_or(0.0, |p| p.client_width() as f64 * space)
}

fn lowest_highlight(document: &Document, top: f64, symbols: &[String]) -> Option<f64> {
	symbols
		.iter()
		.filter_map(|s| document.get_element_by_id(&symbol_dom_id(s)))
		.map(|el| el.get_bounding_client_rect().bottom() - top)
		.fold(None, |acc: Option<f64>, b| Some(acc.map_or(b, |a| a.max(b))))
}

/// Measure every rendered node and clingraph box, then apply the results.
pub fn measure_all(driver: Driver) {
	let Some(document) = web_sys::window().and_then(|w| w.document()) else {
		return;
	};
	let Some((nodes, clingraph)) = driver.with(|e| {
		let clingraph: Vec<String> = e.graph().clingraph().iter().map(|c| c.uuid.clone()).collect();
		(targets(e), clingraph)
	}) else {
		return;
	};

	let mut widths = Vec::new();
	let mut heights = Vec::new();
	for target in nodes {
		let Some(el) = document.get_element_by_id(&node_dom_id(&target.node)) else {
			continue;
		};
		let top = el.get_bounding_client_rect().top();
		widths.push((
			target.node.clone(),
			el.scroll_width() as f64,
			available_width(&el, target.space),
		));
		heights.push((
			target.node,
			VerticalMeasure {
				content_height: el.scroll_height() as f64,
				lowest_highlight: lowest_highlight(&document, top, &target.highlighted),
			},
		));
	}
	for uuid in clingraph {
		let Some(img) = document
			.get_element_by_id(&clingraph_dom_id(&uuid))
			.and_then(|el| el.dyn_into::<HtmlImageElement>().ok())
		else {
			continue;
		};
		let available = available_width(&img, 1.0);
		widths.push((uuid, img.natural_width() as f64, available));
	}

	driver.update(|e, _| {
		for (id, measured, available) in widths {
			e.apply_width(&id, measured, available);
		}
		for (id, measure) in heights {
			e.apply_height(&id, measure);
		}
	});
}
