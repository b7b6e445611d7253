//! Leptos component hosting the engine.
//!
//! A `requestAnimationFrame` loop ticks the engine each frame and triggers a
//! measurement pass whenever the overflow tracker's debounce window elapses.
//! Every engine mutation bumps a revision signal; the graph body re-renders
//! from a fresh snapshot when it changes.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen::prelude::*;
use web_sys::{Event, KeyboardEvent, MouseEvent, Window};

use super::driver::{Driver, now};
use super::measure::{clingraph_dom_id, measure_all, node_dom_id, symbol_dom_id};
use super::snapshot::{GraphView, NodeView, RowView, SymbolView, fresh_scroll_target, graph_view};
use crate::config::EngineConfig;
use crate::engine::Engine;

/// Derivation graph explorer bound to the backend named in `config`.
#[component]
pub fn GraphExplorer(config: EngineConfig) -> impl IntoView {
	let driver = Driver::new(Engine::new(config));
	let scrolled = StoredValue::new_local(None::<String>);
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (animate_init, resize_cb_init) = (animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let Some(window): Option<Window> = web_sys::window() else {
			return;
		};
		driver.update(|e, now| e.start(now));

		*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
			driver.update(|e, now| e.observe_resize(now));
		}));
		if let Some(ref cb) = *resize_cb_init.borrow() {
			let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}

		let animate_inner = animate_init.clone();
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			let t = now();
			let remeasure = driver
				.engine
				.try_update_value(|e| {
					e.tick(t);
					e.poll_measurement(t)
				})
				.unwrap_or(false);
			driver.flush();
			if remeasure {
				measure_all(driver);
			}
			if let Some(ref cb) = *animate_inner.borrow() {
				if let Some(win) = web_sys::window() {
					let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
				}
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let on_input = move |ev: Event| {
		let text = event_target_value(&ev);
		driver.update(|e, now| e.search_input(&text, now));
	};
	let on_keydown = move |ev: KeyboardEvent| match ev.key().as_str() {
		"ArrowUp" => {
			ev.prevent_default();
			driver.update(|e, _| e.search_move_cursor(-1));
		}
		"ArrowDown" => {
			ev.prevent_default();
			driver.update(|e, _| e.search_move_cursor(1));
		}
		"Enter" | "Tab" => {
			ev.prevent_default();
			driver.update(|e, now| e.search_select(now));
		}
		"Escape" => {
			driver.update(|e, _| e.clear_search());
		}
		_ => {}
	};
	let input_value = move || {
		driver.revision.track();
		driver.with(|e| e.search().input().to_string()).unwrap_or_default()
	};

	let body = move || {
		driver.revision.track();
		driver.with(graph_view).map(|view| render_graph(driver, scrolled, view))
	};

	view! {
		<div class="graph-explorer">
			<div class="search">
				<input
					type="text"
					placeholder="Search symbols"
					prop:value=input_value
					on:input=on_input
					on:keydown=on_keydown
				/>
				<button on:click=move |_| { driver.update(|e, now| { e.rotate_search(-1, now); }); }>"‹"</button>
				<button on:click=move |_| { driver.update(|e, now| { e.rotate_search(1, now); }); }>"›"</button>
				<button on:click=move |_| driver.update(|e, now| e.refresh(now)).unwrap_or_default()>"Reload"</button>
			</div>
			{body}
		</div>
	}
}

fn render_graph(driver: Driver, scrolled: StoredValue<Option<String>, LocalStorage>, view: GraphView) -> impl IntoView {
	let GraphView {
		loading,
		rows,
		clingraph,
		edge_count,
		messages,
		suggestions,
		awaiting_input,
		search_position,
		modal,
		scroll_target,
	} = view;

	let fresh = scrolled
		.try_update_value(|last| fresh_scroll_target(last, scroll_target))
		.flatten();
	if let Some(target) = fresh {
		if let Some(el) = web_sys::window()
			.and_then(|w| w.document())
			.and_then(|d| d.get_element_by_id(&symbol_dom_id(&target)))
		{
			el.scroll_into_view();
		}
	}

	view! {
		<ul class="messages">
			{messages
				.into_iter()
				.map(|m| {
					let id = m.id;
					view! {
						<li class:error=m.is_error class:warning=!m.is_error>
							{m.text}
							<button on:click=move |_| driver.update(|e, _| e.dismiss_message(id)).unwrap_or_default()>"×"</button>
						</li>
					}
				})
				.collect_view()}
		</ul>
		<ul class="suggestions" class:awaiting=awaiting_input>
			{suggestions
				.into_iter()
				.map(|s| view! { <li class:active=s.active class:autocomplete=s.is_autocomplete>{s.repr}</li> })
				.collect_view()}
		</ul>
		{search_position.map(|(selected, total)| view! { <span class="search-position">{format!("{} / {}", selected + 1, total)}</span> })}
		<div class="graph" class:loading=loading data-edges=edge_count.to_string()>
			{rows.into_iter().map(|row| render_row(driver, row)).collect_view()}
			<div class="clingraph-row">
				{clingraph
					.into_iter()
					.map(|c| {
						let uuid = c.uuid.clone();
						view! {
							<img
								id=clingraph_dom_id(&c.uuid)
								src=c.src
								class:mini=c.mini
								on:load=move |_| driver.update(|e, now| e.content_changed(now)).unwrap_or_default()
								alt=uuid
							/>
						}
					})
					.collect_view()}
			</div>
		</div>
		{modal.map(|(source, node, content)| {
			let repr = source.clone();
			let pin_source = source.clone();
			view! {
				<div class="modal">
					<pre>{content.unwrap_or_else(|| "…".to_string())}</pre>
					<button on:click=move |_| {
						driver.update(|e, now| { e.toggle_modal_highlight(&pin_source, &repr, now); });
					}>"Pin"</button>
					<button on:click=move |_| driver.update(|e, _| e.close_modal()).unwrap_or_default()>"Close"</button>
					<span class="modal-node">{node}</span>
				</div>
			}
		})}
	}
}

fn render_row(driver: Driver, row: RowView) -> impl IntoView {
	let RowView {
		position,
		hash,
		shade,
		rules,
		nodes,
		button,
		can_move_up,
		can_move_down,
	} = row;
	let toggle_hash = hash.clone();
	view! {
		<section class="row" data-hash=hash style=format!("background: {shade}")>
			<header>
				<button
					disabled=!can_move_up
					on:click=move |_| {
						let _ = driver.update(|e, now| e.reorder(position, position.saturating_sub(1), now));
					}
				>"↑"</button>
				<button
					disabled=!can_move_down
					on:click=move |_| {
						let _ = driver.update(|e, now| e.reorder(position, position + 1, now));
					}
				>"↓"</button>
				{rules
					.into_iter()
					.map(|r| view! {
						<div class="rule" style=format!("background: {}", r.background)>
							{r.dots
								.into_iter()
								.map(|(color, shown)| view! { <span class="rule-dot" class:fading=!shown style=format!("background: {color}")></span> })
								.collect_view()}
							<code>{r.source}</code>
						</div>
					})
					.collect_view()}
			</header>
			<div class="nodes">
				{nodes.into_iter().map(|n| render_node(driver, n)).collect_view()}
			</div>
			{button.is_visible().then(|| view! {
				<button
					class="overflow-button"
					on:click=move |_| {
						driver.update(|e, now| { e.toggle_row_overflow(&toggle_hash, now); });
					}
				>{if button.is_expandable_v { "expand" } else { "collapse" }}</button>
			})}
		</section>
	}
}

fn render_node(driver: Driver, node: NodeView) -> AnyView {
	let NodeView {
		uuid,
		mini,
		loading,
		height,
		pinned,
		recursive,
		expanded,
		space,
		symbols,
		subnodes,
	} = node;
	let style = if pinned {
		format!("flex: {space}")
	} else {
		format!("flex: {space}; max-height: {height}px")
	};
	let click_node = uuid.clone();
	let recursion_node = uuid.clone();
	view! {
		<div id=node_dom_id(&uuid) class="node" class:mini=mini class:loading=loading style=style>
			{if mini {
				view! { <span class="mini-dot"></span> }.into_any()
			} else {
				symbols
					.into_iter()
					.map(|s| render_symbol(driver, &click_node, s))
					.collect_view()
					.into_any()
			}}
			{recursive.then(|| view! {
				<button on:click=move |_| {
					driver.update(|e, now| e.toggle_recursion(&recursion_node, now));
				}>{if expanded { "−" } else { "+" }}</button>
			})}
			<div class="subnodes">
				{subnodes.into_iter().map(|n| render_node(driver, n)).collect_view()}
			</div>
		</div>
	}
	.into_any()
}

fn render_symbol(driver: Driver, node: &str, symbol: SymbolView) -> impl IntoView {
	let SymbolView {
		uuid,
		label,
		background,
		hover_fill,
		hover_border,
		pulsing,
		has_reason,
	} = symbol;
	let (click_symbol, click_node) = (uuid.clone(), node.to_string());
	let (modal_symbol, modal_node) = (uuid.clone(), node.to_string());
	view! {
		<span
			id=symbol_dom_id(&uuid)
			class="symbol"
			class:pulsing=pulsing
			class:explainable=has_reason
			style=format!("background: {background}; --hover-fill: {hover_fill}; --hover-border: {hover_border}")
			on:click=move |_: MouseEvent| {
				driver.update(|e, now| e.click_symbol(&click_symbol, &click_node, now));
			}
			on:dblclick=move |_: MouseEvent| {
				driver.update(|e, now| e.open_modal(&modal_symbol, &modal_node, now));
			}
		>
			{label}
		</span>
	}
}
