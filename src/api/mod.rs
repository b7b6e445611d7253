//! Backend contract: which calls exist, where they go, what they carry.
//!
//! The engine only ever produces [`Ticket`]s and consumes JSON payloads; the
//! transport in [`http`] is what actually talks to the network.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::engine::types::{NodeId, SymbolId, TransformationHash};

pub mod http;

/// Identifier of one issued request, unique per engine.
pub type RequestId = u64;

/// HTTP method of a call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
	/// `GET`
	Get,
	/// `POST`
	Post,
}

/// Every backend call the engine makes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiRequest {
	/// Hash of the current sort.
	CurrentSort,
	/// Transformation list in the current sort.
	Transformations,
	/// Move a transformation; the server answers with the new sort hash.
	Reorder {
		/// Sort the move applies to.
		current_sort: String,
		/// Position before the move.
		old_index: usize,
		/// Position after the move.
		new_index: usize,
	},
	/// Nodes of one transformation.
	Children {
		/// Row to fetch.
		transformation_hash: TransformationHash,
		/// Sort the row belongs to.
		current_sort: String,
	},
	/// Nodes of the clingraph row.
	ClingraphChildren {
		/// Sort the row belongs to.
		current_sort: String,
	},
	/// Edges for the current layout.
	Edges {
		/// Sort the edges belong to.
		current_sort: String,
		/// Super-nodes whose sub-nodes are rendered.
		shown_recursion: BTreeSet<NodeId>,
		/// Whether a clingraph row is present.
		using_clingraph: bool,
	},
	/// Explanation arrows for one symbol in one node.
	Reason {
		/// Clicked symbol.
		source_id: SymbolId,
		/// Node the symbol was clicked in.
		node_id: NodeId,
	},
	/// Detail modal content for one symbol.
	Ground {
		/// Symbol the modal is for.
		source_id: SymbolId,
		/// Node the symbol lives in.
		node_id: NodeId,
	},
	/// Search suggestions for the current input.
	Query {
		/// Raw user input; the transport encodes it.
		text: String,
	},
	/// Startup diagnostics.
	Warnings,
}

impl ApiRequest {
	/// HTTP method of the call.
	pub fn method(&self) -> Method {
		match self {
			ApiRequest::CurrentSort
			| ApiRequest::Transformations
			| ApiRequest::Query { .. }
			| ApiRequest::Warnings => Method::Get,
			_ => Method::Post,
		}
	}

	/// Path below the backend URL.
	pub fn path(&self) -> &'static str {
		match self {
			ApiRequest::CurrentSort => "/graph/current",
			ApiRequest::Transformations | ApiRequest::Reorder { .. } => "/graph/sorts",
			ApiRequest::Children { .. } => "/graph/children",
			ApiRequest::ClingraphChildren { .. } => "/clingraph/children",
			ApiRequest::Edges { .. } => "/graph/edges",
			ApiRequest::Reason { .. } => "/graph/reason",
			ApiRequest::Ground { .. } => "/graph/ground",
			ApiRequest::Query { .. } => "/query",
			ApiRequest::Warnings => "/control/warnings",
		}
	}

	/// Query string pairs, left for the transport to encode.
	pub fn query(&self) -> Vec<(&'static str, &str)> {
		match self {
			ApiRequest::Query { text } => vec![("q", text.as_str())],
			_ => Vec::new(),
		}
	}

	/// JSON body of a `POST`.
	pub fn body(&self) -> Option<Value> {
		let body = match self {
			ApiRequest::Reorder {
				current_sort,
				old_index,
				new_index,
			} => json!({
				"current_sort": current_sort,
				"moved_transformation": { "old_index": old_index, "new_index": new_index },
			}),
			ApiRequest::Children {
				transformation_hash,
				current_sort,
			} => json!({ "transformationHash": transformation_hash, "currentSort": current_sort }),
			ApiRequest::ClingraphChildren { current_sort } => json!({ "currentSort": current_sort }),
			ApiRequest::Edges {
				current_sort,
				shown_recursion,
				using_clingraph,
			} => json!({
				"currentSort": current_sort,
				"shownRecursion": shown_recursion,
				"usingClingraph": using_clingraph,
			}),
			ApiRequest::Reason { source_id, node_id } | ApiRequest::Ground { source_id, node_id } => {
				json!({ "sourceid": source_id, "nodeid": node_id })
			}
			_ => return None,
		};
		Some(body)
	}

	/// Whether a newer request of the same kind makes this one obsolete.
	pub fn is_abortable(&self) -> bool {
		matches!(self, ApiRequest::Query { .. })
	}

	/// Short name for log lines.
	pub fn label(&self) -> &'static str {
		match self {
			ApiRequest::CurrentSort => "current sort",
			ApiRequest::Transformations => "transformations",
			ApiRequest::Reorder { .. } => "reorder",
			ApiRequest::Children { .. } => "children",
			ApiRequest::ClingraphChildren { .. } => "clingraph children",
			ApiRequest::Edges { .. } => "edges",
			ApiRequest::Reason { .. } => "reason",
			ApiRequest::Ground { .. } => "ground",
			ApiRequest::Query { .. } => "query",
			ApiRequest::Warnings => "warnings",
		}
	}
}

/// A request the host must execute and answer with [`crate::Engine::complete`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ticket {
	/// Correlates the answer with the request.
	pub id: RequestId,
	/// What to send.
	pub request: ApiRequest,
}

/// Answer to a reorder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderAck {
	/// Hash of the sort after the move.
	pub hash: String,
}

/// Static asset URL of a clingraph graphic.
pub fn clingraph_image_path(uuid: &str) -> String {
	format!("/clingraph/{uuid}.svg")
}
