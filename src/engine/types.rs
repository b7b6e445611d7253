//! Graph data structures as delivered by the backend.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Stable UUID of a symbol occurrence.
pub type SymbolId = String;
/// UUID of a node (or recursive sub-node).
pub type NodeId = String;
/// Content-derived, position-independent transformation hash.
pub type TransformationHash = String;
/// Hash of a single rule inside a transformation.
pub type RuleHash = String;

/// Structural representation of a ground term.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum Symbol {
	Function {
		name: String,
		#[serde(default)]
		arguments: Vec<Symbol>,
		#[serde(default = "default_true")]
		positive: bool,
	},
	Number {
		number: i64,
	},
	String {
		string: String,
	},
	Infimum,
	Supremum,
}

fn default_true() -> bool {
	true
}

impl fmt::Display for Symbol {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Symbol::Function {
				name,
				arguments,
				positive,
			} => {
				if !positive {
					f.write_str("-")?;
				}
				f.write_str(name)?;
				if !arguments.is_empty() {
					f.write_str("(")?;
					for (i, arg) in arguments.iter().enumerate() {
						if i > 0 {
							f.write_str(",")?;
						}
						write!(f, "{arg}")?;
					}
					f.write_str(")")?;
				}
				Ok(())
			}
			Symbol::Number { number } => write!(f, "{number}"),
			Symbol::String { string } => write!(f, "\"{string}\""),
			Symbol::Infimum => f.write_str("#inf"),
			Symbol::Supremum => f.write_str("#sup"),
		}
	}
}

/// A symbol occurrence inside a node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolIdentifier {
	pub uuid: SymbolId,
	pub symbol: Symbol,
	/// Whether `/graph/reason` can explain this symbol.
	#[serde(default)]
	pub has_reason: bool,
}

/// A set of symbols derived at one step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
	pub uuid: NodeId,
	#[serde(default)]
	pub atoms: Vec<SymbolIdentifier>,
	#[serde(default)]
	pub diff: Vec<SymbolIdentifier>,
	/// Sub-nodes of a fixpoint loop. The backend sends `false` for none.
	#[serde(default, deserialize_with = "list_or_false")]
	pub recursive: Vec<Node>,
	/// Share of the row width this node occupies, in `0.0..=1.0`.
	#[serde(default = "default_space")]
	pub space_multiplier: f64,
}

fn default_space() -> f64 {
	1.0
}

fn list_or_false<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
	D: Deserializer<'de>,
	T: Deserialize<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum ListOrFlag<T> {
		List(Vec<T>),
		Flag(bool),
	}
	Ok(match ListOrFlag::deserialize(deserializer)? {
		ListOrFlag::List(items) => items,
		ListOrFlag::Flag(_) => Vec::new(),
	})
}

impl Node {
	pub fn is_recursive(&self) -> bool {
		!self.recursive.is_empty()
	}

	/// Symbols to display: the diff only, or every atom.
	pub fn content(&self, show_all: bool) -> &[SymbolIdentifier] {
		if show_all { &self.atoms } else { &self.diff }
	}
}

/// Legal reorder range of a transformation (inclusive positions).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortIndices {
	pub lower_bound: usize,
	pub upper_bound: usize,
}

impl SortIndices {
	pub fn contains(&self, position: usize) -> bool {
		self.lower_bound <= position && position <= self.upper_bound
	}

	/// A transformation pinned to one position cannot be dragged at all.
	pub fn is_fixed(&self) -> bool {
		self.lower_bound == self.upper_bound
	}
}

/// Rule sources with their parallel hashes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleContainer {
	#[serde(default, rename = "str_")]
	pub sources: Vec<String>,
	#[serde(default)]
	pub hash: Vec<RuleHash>,
}

impl RuleContainer {
	/// Iterate `(rule hash, rule source)` pairs in display order.
	pub fn iter(&self) -> impl Iterator<Item = (&RuleHash, &String)> {
		self.hash.iter().zip(self.sources.iter())
	}
}

/// One rule-application step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transformation {
	/// Current position in the sort; reassigned on reorder.
	pub id: usize,
	pub hash: TransformationHash,
	#[serde(default)]
	pub rules: RuleContainer,
	#[serde(default)]
	pub adjacent_sort_indices: Option<SortIndices>,
}

/// Which anchor sides a recursion edge connects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecursionAnchor {
	In,
	Out,
}

/// Anchor side on a rendered element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnchorSide {
	Top,
	Bottom,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeStyle {
	#[default]
	Solid,
	Dashed,
}

/// A directed edge between two rendered anchors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
	#[serde(alias = "source")]
	pub src: String,
	#[serde(alias = "target")]
	pub tgt: String,
	/// Hash of the row the edge is drawn within.
	#[serde(default, alias = "transformation_hash")]
	pub transformation: String,
	#[serde(default, rename = "recursion", alias = "recursion_anchor_keyword")]
	pub recursion_anchor: Option<RecursionAnchor>,
	#[serde(default)]
	pub style: EdgeStyle,
}

impl Edge {
	/// `(from side, to side)` for this edge.
	pub fn anchors(&self) -> (AnchorSide, AnchorSide) {
		match self.recursion_anchor {
			Some(RecursionAnchor::In) => (AnchorSide::Top, AnchorSide::Top),
			Some(RecursionAnchor::Out) => (AnchorSide::Bottom, AnchorSide::Bottom),
			None => (AnchorSide::Bottom, AnchorSide::Top),
		}
	}
}

/// A node of the auxiliary clingraph row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClingraphNode {
	pub uuid: NodeId,
}

/// One explanation arrow: `tgt` is a reason for `src`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Arrow {
	pub src: SymbolId,
	pub tgt: SymbolId,
}

/// Response of `/graph/reason`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reason {
	#[serde(default)]
	pub symbols: Vec<Arrow>,
	pub rule: RuleHash,
}

/// A ranked entry returned by `/query`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSuggestion {
	pub repr: String,
	#[serde(default)]
	pub includes: Vec<SymbolId>,
	#[serde(default)]
	pub is_autocomplete: bool,
	#[serde(default)]
	pub awaiting_input: bool,
	#[serde(default)]
	pub hide_in_suggestions: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningReason {
	pub value: String,
}

/// A startup diagnostic from `/control/warnings`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformerWarning {
	#[serde(default)]
	pub ast: String,
	pub reason: WarningReason,
	#[serde(default)]
	pub message: String,
}
