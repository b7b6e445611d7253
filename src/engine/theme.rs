//! Colors and the shared color palette.
//!
//! The palette is process-wide configuration: it is loaded once with the
//! engine config and read-only afterwards. Highlight colors are always drawn
//! from [`ColorPalette::explanation_highlights`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: f64,
}

/// Darkening applied to the hover color for the symbol border.
pub const HOVER_DARKEN_FACTOR: f64 = 0.08;
/// Lightening applied to the hover color for the symbol fill.
pub const HOVER_LIGHTEN_FACTOR: f64 = 0.15;

impl Color {
	/// Sentinel returned when no palette color is available.
	pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0.0);

	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	/// Lighten the color by a factor (0.0 = unchanged, 1.0 = white)
	pub fn lighten(self, factor: f64) -> Self {
		let f = factor.clamp(0.0, 1.0);
		Self {
			r: (self.r as f64 + (255.0 - self.r as f64) * f) as u8,
			g: (self.g as f64 + (255.0 - self.g as f64) * f) as u8,
			b: (self.b as f64 + (255.0 - self.b as f64) * f) as u8,
			a: self.a,
		}
	}

	/// Darken the color by a factor (0.0 = unchanged, 1.0 = black)
	pub fn darken(self, factor: f64) -> Self {
		let f = 1.0 - factor.clamp(0.0, 1.0);
		Self {
			r: (self.r as f64 * f) as u8,
			g: (self.g as f64 * f) as u8,
			b: (self.b as f64 * f) as u8,
			a: self.a,
		}
	}

	pub fn is_transparent(self) -> bool {
		self.a <= 0.001
	}

	pub fn to_css(self) -> String {
		if self.is_transparent() {
			"transparent".to_string()
		} else if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

// Palette entries are compared as configured; alpha is never NaN.
impl Eq for Color {}

impl std::hash::Hash for Color {
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		(self.r, self.g, self.b, self.a.to_bits()).hash(state);
	}
}

impl fmt::Display for Color {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_css())
	}
}

/// Failure to parse a `#rrggbb` / `#rrggbbaa` color string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid color literal {0:?}, expected #rrggbb or #rrggbbaa")]
pub struct ParseColorError(pub String);

impl FromStr for Color {
	type Err = ParseColorError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.eq_ignore_ascii_case("transparent") {
			return Ok(Color::TRANSPARENT);
		}
		let err = || ParseColorError(s.to_string());
		let hex = s.strip_prefix('#').ok_or_else(err)?;
		if !hex.is_ascii() || (hex.len() != 6 && hex.len() != 8) {
			return Err(err());
		}
		let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
		let (r, g, b) = (byte(0)?, byte(2)?, byte(4)?);
		let a = if hex.len() == 8 {
			byte(6)? as f64 / 255.0
		} else {
			1.0
		};
		Ok(Color::rgba(r, g, b, a))
	}
}

impl Serialize for Color {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&self.to_css())
	}
}

impl<'de> Deserialize<'de> for Color {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let raw = String::deserialize(deserializer)?;
		raw.parse().map_err(serde::de::Error::custom)
	}
}

/// Theme colors shared by every view plus the highlight palette.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColorPalette {
	pub primary: Color,
	pub light: Color,
	pub dark: Color,
	pub warn: Color,
	pub error: Color,
	pub info_background: Color,
	/// Alternating row backgrounds, indexed by transformation position.
	pub row_shading: Vec<Color>,
	/// Ordered highlight palette consumed by the color allocator.
	pub explanation_highlights: Vec<Color>,
}

impl ColorPalette {
	/// Row background for the transformation at `position`.
	pub fn row_shade(&self, position: usize) -> Color {
		if self.row_shading.is_empty() {
			return Color::TRANSPARENT;
		}
		self.row_shading[(position + 1) % self.row_shading.len()]
	}
}

impl Default for ColorPalette {
	fn default() -> Self {
		Self {
			primary: Color::rgb(135, 155, 199),
			light: Color::rgb(255, 255, 255),
			dark: Color::rgb(68, 68, 68),
			warn: Color::rgb(255, 249, 199),
			error: Color::rgb(225, 114, 114),
			info_background: Color::rgb(181, 213, 255),
			row_shading: vec![Color::rgb(142, 170, 226), Color::rgb(186, 201, 232)],
			explanation_highlights: vec![
				Color::rgb(210, 137, 173), // Orchid
				Color::rgb(137, 180, 210), // Sky
				Color::rgb(165, 210, 137), // Pistachio
				Color::rgb(232, 194, 120), // Marigold
				Color::rgb(170, 150, 218), // Lavender
				Color::rgb(120, 200, 190), // Seafoam
			],
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_hex_literals() {
		assert_eq!("#ff8000".parse::<Color>(), Ok(Color::rgb(255, 128, 0)));
		let translucent: Color = "#00000080".parse().unwrap();
		assert!((translucent.a - 128.0 / 255.0).abs() < 1e-9);
		assert!("ff8000".parse::<Color>().is_err());
		assert!("#ff80".parse::<Color>().is_err());
	}

	#[test]
	fn transparent_renders_as_keyword() {
		assert_eq!(Color::TRANSPARENT.to_css(), "transparent");
		assert_eq!(Color::rgb(1, 2, 3).to_css(), "#010203");
	}

	#[test]
	fn palette_deserializes_with_defaults() {
		let palette: ColorPalette =
			serde_json::from_str(r##"{"explanationHighlights": ["#112233"]}"##).unwrap();
		assert_eq!(palette.explanation_highlights, vec![Color::rgb(17, 34, 51)]);
		assert_eq!(palette.dark, ColorPalette::default().dark);
	}
}
