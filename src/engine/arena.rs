//! Flat node storage.
//!
//! Nodes arrive as trees (a super-node owns its recursive sub-nodes). They are
//! flattened into one map keyed by UUID; rows and parent/child links are kept
//! as id lists so any node can be found and updated without walking a tree.

use std::collections::HashMap;

use super::recursion::RecursionVisibility;
use super::types::{Node, NodeId, TransformationHash};

/// A node plus its position in the graph.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeEntry {
	/// Node data; `recursive` is always empty here, see `children`.
	pub node: Node,
	pub transformation: TransformationHash,
	pub parent: Option<NodeId>,
	pub children: Vec<NodeId>,
	/// Kept from a previous load while a reload is in flight.
	pub loading: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeArena {
	nodes: HashMap<NodeId, NodeEntry>,
	rows: HashMap<TransformationHash, Vec<NodeId>>,
}

impl NodeArena {
	pub fn new() -> Self {
		Self::default()
	}

	/// Replace the nodes of one row.
	pub fn replace_row(&mut self, transformation: &str, nodes: Vec<Node>) {
		self.remove_row(transformation);
		let mut top = Vec::with_capacity(nodes.len());
		for node in nodes {
			top.push(node.uuid.clone());
			self.insert_tree(transformation, None, node);
		}
		self.rows.insert(transformation.to_string(), top);
	}

	fn insert_tree(&mut self, transformation: &str, parent: Option<&NodeId>, mut node: Node) {
		let id = node.uuid.clone();
		let subs = std::mem::take(&mut node.recursive);
		let children = subs.iter().map(|s| s.uuid.clone()).collect();
		self.nodes.insert(
			id.clone(),
			NodeEntry {
				node,
				transformation: transformation.to_string(),
				parent: parent.cloned(),
				children,
				loading: false,
			},
		);
		for sub in subs {
			self.insert_tree(transformation, Some(&id), sub);
		}
	}

	pub fn remove_row(&mut self, transformation: &str) {
		if let Some(ids) = self.rows.remove(transformation) {
			let mut stack = ids;
			while let Some(id) = stack.pop() {
				if let Some(entry) = self.nodes.remove(&id) {
					stack.extend(entry.children);
				}
			}
		}
	}

	/// Drop rows whose transformation is not in `keep`.
	pub fn retain_rows(&mut self, keep: &[TransformationHash]) {
		let stale: Vec<TransformationHash> = self
			.rows
			.keys()
			.filter(|h| !keep.contains(h))
			.cloned()
			.collect();
		for hash in stale {
			self.remove_row(&hash);
		}
	}

	pub fn mark_loading(&mut self) {
		for entry in self.nodes.values_mut() {
			entry.loading = true;
		}
	}

	pub fn get(&self, id: &str) -> Option<&NodeEntry> {
		self.nodes.get(id)
	}

	pub fn contains(&self, id: &str) -> bool {
		self.nodes.contains_key(id)
	}

	/// Top-level nodes of a row, in server order.
	pub fn row(&self, transformation: &str) -> &[NodeId] {
		self.rows.get(transformation).map(Vec::as_slice).unwrap_or(&[])
	}

	pub fn has_row(&self, transformation: &str) -> bool {
		self.rows.contains_key(transformation)
	}

	/// Row nodes plus the sub-nodes of expanded super-nodes.
	pub fn visible_nodes(&self, transformation: &str, recursion: &RecursionVisibility) -> Vec<NodeId> {
		let mut out = Vec::new();
		for id in self.row(transformation) {
			out.push(id.clone());
			if recursion.is_shown(id) {
				if let Some(entry) = self.nodes.get(id) {
					out.extend(entry.children.iter().cloned());
				}
			}
		}
		out
	}

	/// Every node of a row with all its sub-nodes, expanded or not.
	pub fn subtree(&self, transformation: &str) -> Vec<NodeId> {
		let mut out = Vec::new();
		let mut stack: Vec<&NodeId> = self.row(transformation).iter().rev().collect();
		while let Some(id) = stack.pop() {
			out.push(id.clone());
			if let Some(entry) = self.nodes.get(id) {
				stack.extend(entry.children.iter().rev());
			}
		}
		out
	}

	/// Transformation the node (or its super-node) belongs to.
	pub fn transformation_of(&self, id: &str) -> Option<&TransformationHash> {
		self.nodes.get(id).map(|e| &e.transformation)
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn clear(&mut self) {
		self.nodes.clear();
		self.rows.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn node(id: &str, recursive: Vec<Node>) -> Node {
		Node {
			uuid: id.into(),
			atoms: Vec::new(),
			diff: Vec::new(),
			recursive,
			space_multiplier: 1.0,
		}
	}

	#[test]
	fn flattens_recursive_nodes() {
		let mut arena = NodeArena::new();
		arena.replace_row("t1", vec![node("a", vec![node("a1", vec![]), node("a2", vec![])]), node("b", vec![])]);
		assert_eq!(arena.len(), 4);
		assert_eq!(arena.row("t1"), ["a".to_string(), "b".to_string()]);
		let sub = arena.get("a2").unwrap();
		assert_eq!(sub.parent.as_deref(), Some("a"));
		assert_eq!(arena.transformation_of("a2").map(String::as_str), Some("t1"));
		assert!(arena.get("a").unwrap().node.recursive.is_empty());
	}

	#[test]
	fn replacing_a_row_drops_old_subtrees() {
		let mut arena = NodeArena::new();
		arena.replace_row("t1", vec![node("a", vec![node("a1", vec![])])]);
		arena.replace_row("t1", vec![node("c", vec![])]);
		assert!(!arena.contains("a1"));
		assert_eq!(arena.len(), 1);
	}

	#[test]
	fn visible_nodes_follow_recursion() {
		let mut arena = NodeArena::new();
		arena.replace_row("t1", vec![node("a", vec![node("a1", vec![])]), node("b", vec![])]);
		let mut rec = RecursionVisibility::new();
		assert_eq!(arena.visible_nodes("t1", &rec).len(), 2);
		let sent = rec.toggle("a");
		rec.commit(&sent);
		assert_eq!(arena.visible_nodes("t1", &rec), ["a", "a1", "b"].map(String::from));
	}

	#[test]
	fn subtree_ignores_recursion() {
		let mut arena = NodeArena::new();
		arena.replace_row("t1", vec![node("a", vec![node("a1", vec![node("a11", vec![])])]), node("b", vec![])]);
		assert_eq!(arena.subtree("t1"), ["a", "a1", "a11", "b"].map(String::from));
		assert!(arena.subtree("missing").is_empty());
	}

	#[test]
	fn stale_rows_are_retained_out() {
		let mut arena = NodeArena::new();
		arena.replace_row("t1", vec![node("a", vec![])]);
		arena.replace_row("t2", vec![node("b", vec![])]);
		arena.retain_rows(&["t2".to_string()]);
		assert!(!arena.has_row("t1"));
		assert!(arena.contains("b"));
	}
}
