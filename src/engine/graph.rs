//! Transformations, nodes and edges, and the reload sequence that keeps them
//! consistent.
//!
//! A reload walks through fixed phases:
//!
//! ```text
//! Idle -> LoadingTransformations -> LoadingNodes (rows + clingraph) -> LoadingEdges -> Idle
//! ```
//!
//! Each node-level reload bumps `generation`, each edge request bumps
//! `edge_generation`; responses tagged with an older value are dropped. The
//! model itself never talks to the backend, it hands out [`ApiRequest`]s and
//! is fed the answers.

use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use log::{debug, info};

use super::arena::NodeArena;
use super::recursion::RecursionVisibility;
use super::types::{ClingraphNode, Edge, Node, NodeId, Transformation, TransformationHash};
use crate::api::{ApiRequest, ReorderAck};
use crate::error::EngineError;

/// Where the reload sequence currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
	Idle,
	LoadingTransformations,
	LoadingNodes,
	LoadingEdges,
}

/// Graph data plus reload bookkeeping.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphModel {
	phase: Phase,
	generation: u64,
	edge_generation: u64,
	current_sort: Option<String>,
	transformations: Vec<Transformation>,
	arena: NodeArena,
	clingraph: Vec<ClingraphNode>,
	edges: Vec<Edge>,
	recursion: RecursionVisibility,
	awaiting_sort: bool,
	awaiting_transformations: bool,
	awaiting_rows: BTreeSet<TransformationHash>,
	awaiting_clingraph: bool,
	pending_reorder: Option<(usize, usize)>,
}

impl Default for GraphModel {
	fn default() -> Self {
		Self::new()
	}
}

impl GraphModel {
	pub fn new() -> Self {
		Self {
			phase: Phase::Idle,
			generation: 0,
			edge_generation: 0,
			current_sort: None,
			transformations: Vec::new(),
			arena: NodeArena::new(),
			clingraph: Vec::new(),
			edges: Vec::new(),
			recursion: RecursionVisibility::new(),
			awaiting_sort: false,
			awaiting_transformations: false,
			awaiting_rows: BTreeSet::new(),
			awaiting_clingraph: false,
			pending_reorder: None,
		}
	}

	/// Start over: refetch the sort, the transformations and everything below.
	///
	/// Transformation order and clingraph graphics are cleared; nodes stay
	/// visible but flagged as loading.
	pub fn start_full_reload(&mut self) -> Vec<ApiRequest> {
		self.generation += 1;
		self.edge_generation += 1;
		info!("trace-graph: full reload (generation {})", self.generation);
		self.transformations.clear();
		self.clingraph.clear();
		self.arena.mark_loading();
		self.awaiting_sort = true;
		self.awaiting_transformations = true;
		self.awaiting_rows.clear();
		self.awaiting_clingraph = false;
		self.pending_reorder = None;
		self.phase = Phase::LoadingTransformations;
		vec![ApiRequest::CurrentSort, ApiRequest::Transformations]
	}

	pub fn on_current_sort(&mut self, generation: u64, hash: String) -> Vec<ApiRequest> {
		if !self.is_current(generation) || !self.awaiting_sort {
			return Vec::new();
		}
		self.current_sort = Some(hash);
		self.awaiting_sort = false;
		self.maybe_request_nodes()
	}

	pub fn on_transformations(&mut self, generation: u64, list: Vec<Transformation>) -> Vec<ApiRequest> {
		if !self.is_current(generation) || !self.awaiting_transformations {
			return Vec::new();
		}
		let hashes: Vec<TransformationHash> = list.iter().map(|t| t.hash.clone()).collect();
		self.arena.retain_rows(&hashes);
		self.transformations = list;
		self.awaiting_transformations = false;
		self.maybe_request_nodes()
	}

	/// The sort or transformation fetch failed; stop where we are.
	pub fn fail_transformations(&mut self, generation: u64) -> bool {
		if !self.is_current(generation) || self.phase != Phase::LoadingTransformations {
			return false;
		}
		self.awaiting_sort = false;
		self.awaiting_transformations = false;
		self.phase = Phase::Idle;
		true
	}

	fn maybe_request_nodes(&mut self) -> Vec<ApiRequest> {
		if self.awaiting_sort || self.awaiting_transformations {
			return Vec::new();
		}
		self.phase = Phase::LoadingNodes;
		let sort = self.current_sort.clone().unwrap_or_default();
		self.awaiting_rows = self.transformations.iter().map(|t| t.hash.clone()).collect();
		self.awaiting_clingraph = true;
		let mut requests: Vec<ApiRequest> = self
			.transformations
			.iter()
			.map(|t| ApiRequest::Children {
				transformation_hash: t.hash.clone(),
				current_sort: sort.clone(),
			})
			.collect();
		requests.push(ApiRequest::ClingraphChildren { current_sort: sort });
		requests
	}

	pub fn on_children(&mut self, generation: u64, transformation: &str, nodes: Vec<Node>) -> Vec<ApiRequest> {
		if !self.is_current(generation) || !self.awaiting_rows.remove(transformation) {
			return Vec::new();
		}
		debug!("trace-graph: {} nodes for {transformation}", nodes.len());
		self.arena.replace_row(transformation, nodes);
		let arena = &self.arena;
		self.recursion.retain(|id| arena.contains(id));
		self.maybe_request_edges()
	}

	/// One row failed to load; the others still proceed to edges.
	pub fn fail_children(&mut self, generation: u64, transformation: &str) -> Vec<ApiRequest> {
		if !self.is_current(generation) || !self.awaiting_rows.remove(transformation) {
			return Vec::new();
		}
		self.maybe_request_edges()
	}

	pub fn on_clingraph(&mut self, generation: u64, nodes: Vec<ClingraphNode>) -> Vec<ApiRequest> {
		if !self.is_current(generation) || !self.awaiting_clingraph {
			return Vec::new();
		}
		self.clingraph = nodes;
		self.awaiting_clingraph = false;
		self.maybe_request_edges()
	}

	pub fn fail_clingraph(&mut self, generation: u64) -> Vec<ApiRequest> {
		if !self.is_current(generation) || !self.awaiting_clingraph {
			return Vec::new();
		}
		self.awaiting_clingraph = false;
		self.maybe_request_edges()
	}

	fn maybe_request_edges(&mut self) -> Vec<ApiRequest> {
		if self.phase != Phase::LoadingNodes || !self.awaiting_rows.is_empty() || self.awaiting_clingraph {
			return Vec::new();
		}
		vec![self.request_edges()]
	}

	fn request_edges(&mut self) -> ApiRequest {
		self.phase = Phase::LoadingEdges;
		self.edge_generation += 1;
		ApiRequest::Edges {
			current_sort: self.current_sort.clone().unwrap_or_default(),
			shown_recursion: self.recursion.requested(),
			using_clingraph: !self.clingraph.is_empty(),
		}
	}

	/// Edges for `sent` arrived. Applies the recursion set they were built for.
	pub fn on_edges(&mut self, edge_generation: u64, sent: &BTreeSet<NodeId>, edges: Vec<Edge>) -> bool {
		if edge_generation != self.edge_generation || self.phase != Phase::LoadingEdges {
			debug!("trace-graph: dropping stale edges (generation {edge_generation})");
			return false;
		}
		self.edges = edges;
		self.recursion.commit(sent);
		self.phase = Phase::Idle;
		true
	}

	pub fn fail_edges(&mut self, edge_generation: u64, sent: &BTreeSet<NodeId>) -> bool {
		if edge_generation != self.edge_generation || self.phase != Phase::LoadingEdges {
			return false;
		}
		self.recursion.discard(sent);
		self.phase = Phase::Idle;
		true
	}

	/// Expand or collapse a super-node's sub-nodes.
	///
	/// While nodes are still loading the change rides along with the edge
	/// request that follows them.
	pub fn toggle_recursion(&mut self, node: &str) -> Vec<ApiRequest> {
		self.recursion.toggle(node);
		match self.phase {
			Phase::Idle | Phase::LoadingEdges => vec![self.request_edges()],
			Phase::LoadingTransformations | Phase::LoadingNodes => Vec::new(),
		}
	}

	/// Positions the transformation at `index` may be dropped at.
	///
	/// A transformation without known sort indices stays where it is.
	pub fn drop_targets(&self, index: usize) -> Option<RangeInclusive<usize>> {
		let t = self.transformations.get(index)?;
		Some(match t.adjacent_sort_indices {
			Some(range) => range.lower_bound..=range.upper_bound,
			None => index..=index,
		})
	}

	/// Validate a move and produce the request for it.
	pub fn request_reorder(&mut self, old_index: usize, new_index: usize) -> Result<Option<ApiRequest>, EngineError> {
		let t = self
			.transformations
			.get(old_index)
			.ok_or(EngineError::UnknownTransformation(old_index))?;
		if new_index >= self.transformations.len() {
			return Err(EngineError::UnknownTransformation(new_index));
		}
		if old_index == new_index {
			return Ok(None);
		}
		let range = self.drop_targets(old_index).unwrap_or(old_index..=old_index);
		if !range.contains(&new_index) {
			return Err(EngineError::ReorderOutOfRange {
				hash: t.hash.clone(),
				target: new_index,
				lower: *range.start(),
				upper: *range.end(),
			});
		}
		if self.pending_reorder.is_some() {
			return Err(EngineError::ReorderInFlight);
		}
		self.pending_reorder = Some((old_index, new_index));
		Ok(Some(ApiRequest::Reorder {
			current_sort: self.current_sort.clone().unwrap_or_default(),
			old_index,
			new_index,
		}))
	}

	/// The server accepted a move: commit it and reload below the sort.
	pub fn on_reorder_ack(&mut self, old_index: usize, new_index: usize, ack: ReorderAck) -> Vec<ApiRequest> {
		if self.pending_reorder != Some((old_index, new_index)) {
			return Vec::new();
		}
		self.pending_reorder = None;
		self.commit_reorder(old_index, new_index);
		self.current_sort = Some(ack.hash);

		self.generation += 1;
		self.edge_generation += 1;
		self.clingraph.clear();
		self.arena.mark_loading();
		self.awaiting_sort = false;
		self.awaiting_transformations = true;
		self.awaiting_rows.clear();
		self.awaiting_clingraph = false;
		self.phase = Phase::LoadingTransformations;
		vec![ApiRequest::Transformations]
	}

	/// The server refused a move. Nothing was committed locally.
	pub fn fail_reorder(&mut self, old_index: usize, new_index: usize) -> bool {
		if self.pending_reorder == Some((old_index, new_index)) {
			self.pending_reorder = None;
			return true;
		}
		false
	}

	fn commit_reorder(&mut self, old_index: usize, new_index: usize) {
		if old_index >= self.transformations.len() || new_index >= self.transformations.len() {
			return;
		}
		let moved = self.transformations.remove(old_index);
		self.transformations.insert(new_index, moved);
		for (position, t) in self.transformations.iter_mut().enumerate() {
			t.id = position;
		}
	}

	pub fn is_reorder_pending(&self) -> bool {
		self.pending_reorder.is_some()
	}

	fn is_current(&self, generation: u64) -> bool {
		if generation != self.generation {
			debug!("trace-graph: dropping response of generation {generation}");
			return false;
		}
		true
	}

	pub fn phase(&self) -> Phase {
		self.phase
	}

	pub fn is_loading(&self) -> bool {
		self.phase != Phase::Idle
	}

	pub fn generation(&self) -> u64 {
		self.generation
	}

	pub fn edge_generation(&self) -> u64 {
		self.edge_generation
	}

	pub fn current_sort(&self) -> Option<&str> {
		self.current_sort.as_deref()
	}

	pub fn transformations(&self) -> &[Transformation] {
		&self.transformations
	}

	pub fn position_of(&self, hash: &str) -> Option<usize> {
		self.transformations.iter().position(|t| t.hash == hash)
	}

	pub fn arena(&self) -> &NodeArena {
		&self.arena
	}

	pub fn clingraph(&self) -> &[ClingraphNode] {
		&self.clingraph
	}

	pub fn edges(&self) -> &[Edge] {
		&self.edges
	}

	pub fn recursion(&self) -> &RecursionVisibility {
		&self.recursion
	}

	/// Row nodes including sub-nodes of expanded super-nodes.
	pub fn visible_nodes(&self, transformation: &str) -> Vec<NodeId> {
		self.arena.visible_nodes(transformation, &self.recursion)
	}

	/// All nodes of a row, collapsed sub-nodes included.
	pub fn row_subtree(&self, transformation: &str) -> Vec<NodeId> {
		self.arena.subtree(transformation)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::engine::types::{RuleContainer, SortIndices};

	fn transformation(id: usize, hash: &str, range: (usize, usize)) -> Transformation {
		Transformation {
			id,
			hash: hash.into(),
			rules: RuleContainer::default(),
			adjacent_sort_indices: Some(SortIndices {
				lower_bound: range.0,
				upper_bound: range.1,
			}),
		}
	}

	fn node(id: &str) -> Node {
		Node {
			uuid: id.into(),
			atoms: Vec::new(),
			diff: Vec::new(),
			recursive: Vec::new(),
			space_multiplier: 1.0,
		}
	}

	/// Drive a full reload with three rows up to the edge request.
	fn loaded() -> GraphModel {
		loaded_with(Vec::new())
	}

	fn loaded_with(clingraph: Vec<ClingraphNode>) -> GraphModel {
		let mut g = GraphModel::new();
		g.start_full_reload();
		let generation = g.generation();
		assert!(g.on_current_sort(generation, "s0".into()).is_empty());
		let reqs = g.on_transformations(
			generation,
			vec![transformation(0, "h0", (0, 2)), transformation(1, "h1", (0, 2)), transformation(2, "h2", (2, 2))],
		);
		assert_eq!(reqs.len(), 4);
		g.on_children(generation, "h0", vec![node("a")]);
		g.on_children(generation, "h1", vec![node("b")]);
		g.on_children(generation, "h2", vec![node("c")]);
		let edges = g.on_clingraph(generation, clingraph);
		assert_eq!(edges.len(), 1);
		assert_eq!(g.phase(), Phase::LoadingEdges);
		let sent = BTreeSet::new();
		assert!(g.on_edges(g.edge_generation(), &sent, Vec::new()));
		g
	}

	#[test]
	fn full_reload_walks_the_phases() {
		let g = loaded();
		assert_eq!(g.phase(), Phase::Idle);
		assert_eq!(g.current_sort(), Some("s0"));
		assert_eq!(g.arena().row("h1"), ["b".to_string()]);
	}

	#[test]
	fn edges_wait_for_every_row_and_clingraph() {
		let mut g = GraphModel::new();
		g.start_full_reload();
		let generation = g.generation();
		g.on_transformations(generation, vec![transformation(0, "h0", (0, 0))]);
		g.on_current_sort(generation, "s".into());
		assert!(g.on_clingraph(generation, vec![ClingraphNode { uuid: "cg".into() }]).is_empty());
		let reqs = g.on_children(generation, "h0", vec![node("a")]);
		match reqs.as_slice() {
			[ApiRequest::Edges { using_clingraph, .. }] => assert!(*using_clingraph),
			other => panic!("unexpected requests {other:?}"),
		}
	}

	#[test]
	fn stale_generation_is_ignored() {
		let mut g = GraphModel::new();
		g.start_full_reload();
		let old = g.generation();
		g.start_full_reload();
		assert!(g.on_current_sort(old, "stale".into()).is_empty());
		assert_eq!(g.current_sort(), None);
	}

	#[test]
	fn reload_keeps_nodes_flagged_loading() {
		let mut g = loaded();
		g.start_full_reload();
		assert!(g.transformations().is_empty());
		assert!(g.arena().get("a").unwrap().loading);
	}

	#[test]
	fn reorder_outside_range_is_rejected() {
		let mut g = loaded();
		assert_eq!(g.drop_targets(2), Some(2..=2));
		let err = g.request_reorder(2, 0).unwrap_err();
		assert!(matches!(err, EngineError::ReorderOutOfRange { lower: 2, upper: 2, .. }));
		assert!(matches!(g.request_reorder(7, 0), Err(EngineError::UnknownTransformation(7))));
		assert_eq!(g.request_reorder(1, 1), Ok(None));
	}

	#[test]
	fn reorder_commits_only_on_ack() {
		let mut g = loaded();
		let req = g.request_reorder(0, 1).unwrap();
		assert!(matches!(req, Some(ApiRequest::Reorder { old_index: 0, new_index: 1, .. })));
		assert_eq!(g.request_reorder(1, 0), Err(EngineError::ReorderInFlight));
		assert_eq!(g.position_of("h0"), Some(0));

		let reqs = g.on_reorder_ack(0, 1, ReorderAck { hash: "s1".into() });
		assert_eq!(reqs, vec![ApiRequest::Transformations]);
		assert_eq!(g.position_of("h0"), Some(1));
		assert_eq!(g.transformations()[1].id, 1);
		assert_eq!(g.transformations()[0].hash, "h1");
		assert_eq!(g.transformations()[0].id, 0);
		assert_eq!(g.arena().row("h0"), ["a".to_string()]);
		assert_eq!(g.current_sort(), Some("s1"));
	}

	#[test]
	fn reorder_ack_clears_clingraph() {
		let mut g = loaded_with(vec![ClingraphNode { uuid: "cg".into() }]);
		assert_eq!(g.clingraph().len(), 1);
		g.request_reorder(0, 1).unwrap();
		assert_eq!(g.clingraph().len(), 1);
		g.on_reorder_ack(0, 1, ReorderAck { hash: "s1".into() });
		assert_eq!(g.phase(), Phase::LoadingTransformations);
		assert!(g.clingraph().is_empty());
	}

	#[test]
	fn failed_reorder_keeps_order() {
		let mut g = loaded();
		g.request_reorder(0, 1).unwrap();
		assert!(g.fail_reorder(0, 1));
		assert_eq!(g.position_of("h0"), Some(0));
		assert!(!g.is_reorder_pending());
	}

	#[test]
	fn recursion_toggle_applies_after_edges() {
		let mut g = loaded();
		let reqs = g.toggle_recursion("a");
		let sent = match reqs.as_slice() {
			[ApiRequest::Edges { shown_recursion, .. }] => shown_recursion.clone(),
			other => panic!("unexpected requests {other:?}"),
		};
		assert!(!g.recursion().is_shown("a"));
		assert!(g.on_edges(g.edge_generation(), &sent, Vec::new()));
		assert!(g.recursion().is_shown("a"));
	}

	#[test]
	fn failed_edge_reload_discards_recursion_change() {
		let mut g = loaded();
		let reqs = g.toggle_recursion("a");
		let Some(ApiRequest::Edges { shown_recursion, .. }) = reqs.first() else {
			panic!("expected an edge request");
		};
		assert!(g.fail_edges(g.edge_generation(), shown_recursion));
		assert!(!g.recursion().is_shown("a"));
		assert!(!g.recursion().is_pending());
		assert_eq!(g.phase(), Phase::Idle);
	}

	#[test]
	fn toggle_during_node_load_rides_along() {
		let mut g = GraphModel::new();
		g.start_full_reload();
		assert!(g.toggle_recursion("a").is_empty());
		let generation = g.generation();
		g.on_current_sort(generation, "s".into());
		g.on_transformations(generation, Vec::new());
		let reqs = g.on_clingraph(generation, Vec::new());
		match reqs.as_slice() {
			[ApiRequest::Edges { shown_recursion, .. }] => assert!(shown_recursion.contains("a")),
			other => panic!("unexpected requests {other:?}"),
		}
	}
}
