//! Executes engine tickets and keeps the view's revision signal in sync.

use std::collections::HashMap;

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::warn;
use web_sys::AbortController;

use crate::api::{RequestId, Ticket, http};
use crate::engine::Engine;
use crate::engine::timers::Millis;

/// Host clock in milliseconds.
pub fn now() -> Millis {
	js_sys::Date::now()
}

/// Copyable handle to the engine plus the in-flight abort controllers.
#[derive(Clone, Copy)]
pub struct Driver {
	pub engine: StoredValue<Engine, LocalStorage>,
	pub revision: RwSignal<u64>,
	aborts: StoredValue<HashMap<RequestId, AbortController>, LocalStorage>,
}

impl Driver {
	pub fn new(engine: Engine) -> Self {
		Self {
			engine: StoredValue::new_local(engine),
			revision: RwSignal::new(0),
			aborts: StoredValue::new_local(HashMap::new()),
		}
	}

	/// Read engine state.
	pub fn with<T>(&self, f: impl FnOnce(&Engine) -> T) -> Option<T> {
		self.engine.try_with_value(f)
	}

	/// Mutate the engine, then send whatever it queued.
	pub fn update<T>(&self, f: impl FnOnce(&mut Engine, Millis) -> T) -> Option<T> {
		let now = now();
		let out = self.engine.try_update_value(|e| f(e, now));
		self.flush();
		out
	}

	/// Send queued tickets, cancel aborted ones, publish the new revision.
	pub fn flush(&self) {
		let Some((tickets, aborted, revision)) = self
			.engine
			.try_update_value(|e| (e.take_tickets(), e.take_aborted(), e.revision()))
		else {
			return;
		};
		for id in aborted {
			self.aborts.update_value(|m| {
				if let Some(controller) = m.remove(&id) {
					controller.abort();
				}
			});
		}
		for ticket in tickets {
			self.send(ticket);
		}
		if self.revision.get_untracked() != revision {
			self.revision.set(revision);
		}
	}

	fn send(&self, ticket: Ticket) {
		let Some(base) = self.with(|e| e.config().backend_url.clone()) else {
			return;
		};
		let signal = if ticket.request.is_abortable() {
			match AbortController::new() {
				Ok(controller) => {
					let signal = controller.signal();
					self.aborts.update_value(|m| {
						m.insert(ticket.id, controller);
					});
					Some(signal)
				}
				Err(e) => {
					warn!("trace-graph: no AbortController: {e:?}");
					None
				}
			}
		} else {
			None
		};
		let driver = *self;
		spawn_local(async move {
			let result = http::execute(&base, &ticket.request, signal.as_ref()).await;
			driver.aborts.update_value(|m| {
				m.remove(&ticket.id);
			});
			driver.update(|e, now| e.complete(ticket.id, result, now));
		});
	}
}
