//! Keyed cancellation-token table for timed transitions.
//!
//! Every timed effect in the engine (a `recent` flag decaying, a rule glow
//! fading, a debounced recalculation) is registered here under the key of the
//! entity it belongs to. Scheduling a key that already has a pending entry
//! cancels the old one first, so a stale timer can never overwrite newer
//! state. Nothing fires on its own: the host calls [`TimerTable::drain_due`]
//! from its frame loop with the current time.

use std::collections::HashMap;
use std::hash::Hash;

/// Milliseconds on the host clock (`performance.now()` / `Date.now()`).
pub type Millis = f64;

/// Identity of one scheduled entry; a replaced entry's token is never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(u64);

#[derive(Clone, Debug, PartialEq)]
struct Pending {
	token: TimerToken,
	deadline: Millis,
}

/// Pending deadlines keyed by entity.
#[derive(Clone, Debug)]
pub struct TimerTable<K> {
	pending: HashMap<K, Pending>,
	next_token: u64,
}

impl<K> Default for TimerTable<K> {
	fn default() -> Self {
		Self {
			pending: HashMap::new(),
			next_token: 0,
		}
	}
}

// Token counters differ between otherwise identical tables.
impl<K: Eq + Hash> PartialEq for TimerTable<K> {
	fn eq(&self, other: &Self) -> bool {
		self.pending.len() == other.pending.len()
			&& self.pending.iter().all(|(k, p)| {
				other
					.pending
					.get(k)
					.is_some_and(|o| o.deadline == p.deadline)
			})
	}
}

impl<K: Clone + Eq + Hash> TimerTable<K> {
	/// Schedule `key` to fire at `now + delay`, replacing any pending entry.
	pub fn schedule(&mut self, key: K, now: Millis, delay: Millis) -> TimerToken {
		let token = TimerToken(self.next_token);
		self.next_token += 1;
		self.pending.insert(
			key,
			Pending {
				token,
				deadline: now + delay.max(0.0),
			},
		);
		token
	}

	/// Cancel the pending entry for `key`. Returns whether one existed.
	pub fn cancel(&mut self, key: &K) -> bool {
		self.pending.remove(key).is_some()
	}

	/// Cancel every pending entry matching `pred`.
	pub fn cancel_where(&mut self, mut pred: impl FnMut(&K) -> bool) {
		self.pending.retain(|k, _| !pred(k));
	}

	pub fn clear(&mut self) {
		self.pending.clear();
	}

	pub fn is_pending(&self, key: &K) -> bool {
		self.pending.contains_key(key)
	}

	pub fn token(&self, key: &K) -> Option<TimerToken> {
		self.pending.get(key).map(|p| p.token)
	}

	pub fn deadline(&self, key: &K) -> Option<Millis> {
		self.pending.get(key).map(|p| p.deadline)
	}

	pub fn is_empty(&self) -> bool {
		self.pending.is_empty()
	}

	/// Remove and return every key whose deadline is `<= now`, earliest first.
	pub fn drain_due(&mut self, now: Millis) -> Vec<K> {
		let mut due: Vec<(Millis, TimerToken, K)> = self
			.pending
			.iter()
			.filter(|(_, p)| p.deadline <= now)
			.map(|(k, p)| (p.deadline, p.token, k.clone()))
			.collect();
		if due.is_empty() {
			return Vec::new();
		}
		due.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
		for (_, _, key) in &due {
			self.pending.remove(key);
		}
		due.into_iter().map(|(_, _, k)| k).collect()
	}
}

/// Coalesces bursts of triggers into one firing after a quiet window.
#[derive(Clone, Debug, PartialEq)]
pub struct Debouncer {
	window: Millis,
	deadline: Option<Millis>,
}

impl Debouncer {
	pub fn new(window: Millis) -> Self {
		Self {
			window,
			deadline: None,
		}
	}

	/// Register a trigger; pushes the firing time back by one window.
	pub fn trigger(&mut self, now: Millis) {
		self.deadline = Some(now + self.window);
	}

	pub fn is_armed(&self) -> bool {
		self.deadline.is_some()
	}

	/// Returns `true` exactly once per burst, when the window has elapsed.
	pub fn poll(&mut self, now: Millis) -> bool {
		match self.deadline {
			Some(deadline) if deadline <= now => {
				self.deadline = None;
				true
			}
			_ => false,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rescheduling_replaces_the_pending_entry() {
		let mut timers = TimerTable::default();
		let first = timers.schedule("glow", 0.0, 100.0);
		let second = timers.schedule("glow", 50.0, 100.0);
		assert_ne!(first, second);
		assert_eq!(timers.token(&"glow"), Some(second));
		assert!(timers.drain_due(120.0).is_empty());
		assert_eq!(timers.drain_due(150.0), vec!["glow"]);
		assert!(timers.is_empty());
	}

	#[test]
	fn drains_in_deadline_order() {
		let mut timers = TimerTable::default();
		timers.schedule("late", 0.0, 30.0);
		timers.schedule("early", 0.0, 10.0);
		timers.schedule("future", 0.0, 99.0);
		assert_eq!(timers.drain_due(50.0), vec!["early", "late"]);
		assert!(timers.is_pending(&"future"));
	}

	#[test]
	fn cancelled_entries_never_fire() {
		let mut timers = TimerTable::default();
		timers.schedule(1, 0.0, 10.0);
		timers.schedule(2, 0.0, 10.0);
		assert!(timers.cancel(&1));
		timers.cancel_where(|k| *k == 2);
		assert!(timers.drain_due(100.0).is_empty());
	}

	#[test]
	fn debouncer_fires_once_after_quiet_window() {
		let mut debounce = Debouncer::new(150.0);
		debounce.trigger(0.0);
		debounce.trigger(100.0);
		assert!(!debounce.poll(200.0));
		assert!(debounce.poll(250.0));
		assert!(!debounce.poll(400.0));
	}
}
