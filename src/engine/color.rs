//! Least-used color allocation across simultaneously active highlights.

use std::collections::{HashMap, HashSet};

use log::warn;

use super::theme::Color;

/// Anything that occupies a palette color on behalf of some origin.
///
/// Two highlights with the same origin key and color count once, so a batch
/// of symbols highlighted by one explanation weighs as much as one search hit.
pub trait ColorUse {
	/// Provenance key (source symbol uuid, `"query"`, or `"modal"`).
	fn origin_key(&self) -> &str;
	fn color(&self) -> Color;
}

/// Pick the palette color with the fewest distinct `(origin, color)` uses.
///
/// Ties go to the earliest palette entry. An empty palette is a configuration
/// error and yields [`Color::TRANSPARENT`].
pub fn next_color<'a, I, U>(active: I, palette: &[Color]) -> Color
where
	I: IntoIterator<Item = &'a U>,
	U: ColorUse + ?Sized + 'a,
{
	if palette.is_empty() {
		warn!("trace-graph: highlight palette is empty, falling back to transparent");
		return Color::TRANSPARENT;
	}

	let mut counts: HashMap<Color, usize> = palette.iter().map(|c| (*c, 0)).collect();
	let mut seen: HashSet<(&str, Color)> = HashSet::new();
	for item in active {
		let key = (item.origin_key(), item.color());
		if seen.insert(key) {
			if let Some(count) = counts.get_mut(&key.1) {
				*count += 1;
			}
		}
	}

	let mut best = palette[0];
	let mut least = usize::MAX;
	for color in palette {
		let count = counts.get(color).copied().unwrap_or(0);
		if count < least {
			least = count;
			best = *color;
		}
	}
	best
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	struct Use(String, Color);

	impl ColorUse for Use {
		fn origin_key(&self) -> &str {
			&self.0
		}
		fn color(&self) -> Color {
			self.1
		}
	}

	fn palette() -> Vec<Color> {
		vec![Color::rgb(1, 0, 0), Color::rgb(0, 1, 0), Color::rgb(0, 0, 1)]
	}

	#[test]
	fn first_color_when_nothing_is_active() {
		let active: Vec<Use> = Vec::new();
		assert_eq!(next_color(&active, &palette()), palette()[0]);
	}

	#[test]
	fn duplicate_origin_color_pairs_count_once() {
		let p = palette();
		let active = vec![
			Use("a".into(), p[0]),
			Use("a".into(), p[0]),
			Use("a".into(), p[0]),
			Use("b".into(), p[1]),
			Use("c".into(), p[1]),
		];
		// p[0] used once (deduplicated), p[1] twice, p[2] never.
		assert_eq!(next_color(&active, &p), p[2]);
		let active = &active[..4];
		// p[0] once, p[1] once, p[2] zero.
		assert_eq!(next_color(active, &p), p[2]);
	}

	#[test]
	fn ties_break_by_palette_order() {
		let p = palette();
		let active = vec![Use("a".into(), p[0]), Use("b".into(), p[1]), Use("c".into(), p[2])];
		assert_eq!(next_color(&active, &p), p[0]);
	}

	#[test]
	fn foreign_colors_are_ignored() {
		let p = palette();
		let active = vec![Use("a".into(), Color::rgb(9, 9, 9)), Use("b".into(), p[0])];
		assert_eq!(next_color(&active, &p), p[1]);
	}

	#[test]
	fn empty_palette_degrades_to_transparent() {
		let active: Vec<Use> = Vec::new();
		assert_eq!(next_color(&active, &[]), Color::TRANSPARENT);
	}

	proptest! {
		/// Each assignment picks a color whose usage equals the current minimum,
		/// so usage never spreads by more than one across the palette.
		#[test]
		fn prop_allocation_is_fair(additions in 1usize..60, size in 1usize..8) {
			let p: Vec<Color> = (0..size).map(|i| Color::rgb(i as u8, 0, 0)).collect();
			let mut active: Vec<Use> = Vec::new();
			let usage = |active: &[Use], c: Color| active.iter().filter(|u| u.1 == c).count();
			for i in 0..additions {
				let color = next_color(&active, &p);
				let min = p.iter().map(|c| usage(&active, *c)).min().unwrap();
				prop_assert_eq!(usage(&active, color), min);
				active.push(Use(format!("origin-{i}"), color));
				let max = p.iter().map(|c| usage(&active, *c)).max().unwrap();
				let min = p.iter().map(|c| usage(&active, *c)).min().unwrap();
				prop_assert!(max - min <= 1);
			}
		}
	}
}
