//! Named Directed Graph
//!
//! Arena-backed adjacency structure used as the substrate for the bank
//! network. Nodes live in a `Vec` in creation order and are addressed by
//! [`NodeId`]; a name index gives O(1) lookup. Neighbor lists hold ids, not
//! references, so cycles and self-links need no special handling.
//!
//! Duplicate edges are allowed. Self-links are allowed at this layer; the
//! bank network avoids them when it draws random links.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// Position of a node in its graph's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("node '{0}' already exists")]
pub struct DuplicateNode(pub String);

#[derive(Debug, Error, PartialEq)]
#[error("no node with index {0}")]
pub struct UnknownNode(pub usize);

#[derive(Clone, Debug)]
pub struct Node<T> {
    name: String,
    neighbours: Vec<NodeId>,
    pub data: T,
}

impl<T> Node<T> {
    fn new(name: String, data: T) -> Self {
        Self {
            name,
            neighbours: Vec::new(),
            data,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn neighbours(&self) -> &[NodeId] {
        &self.neighbours
    }

    pub fn degree(&self) -> usize {
        self.neighbours.len()
    }
}

#[derive(Clone, Debug)]
pub struct Graph<T> {
    nodes: Vec<Node<T>>,
    index: HashMap<String, NodeId>,
}

impl<T> Default for Graph<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Graph<T> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Adds a node with an explicit payload. Names must be unique.
    pub fn insert(&mut self, name: impl Into<String>, data: T) -> Result<NodeId, DuplicateNode> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(DuplicateNode(name));
        }
        Ok(self.push(name, data))
    }

    fn push(&mut self, name: String, data: T) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.index.insert(name.clone(), id);
        self.nodes.push(Node::new(name, data));
        id
    }

    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node<T>> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node<T>> {
        self.nodes.get_mut(id.0)
    }

    /// Nodes in creation order.
    pub fn nodes(&self) -> &[Node<T>] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node<T>> {
        self.nodes.iter_mut()
    }

    pub fn neighbours(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|n| n.neighbours.as_slice())
            .unwrap_or(&[])
    }

    /// Appends `to` to `from`'s neighbor list after checking both ids.
    pub fn try_add_link(&mut self, from: NodeId, to: NodeId) -> Result<(), UnknownNode> {
        for id in [from, to] {
            if id.0 >= self.nodes.len() {
                return Err(UnknownNode(id.0));
            }
        }
        self.add_link(from, to);
        Ok(())
    }

    /// Unchecked link for ids already known to belong to this graph.
    pub(crate) fn add_link(&mut self, from: NodeId, to: NodeId) {
        self.nodes[from.0].neighbours.push(to);
    }

    /// Total number of directed edges.
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(Node::degree).sum()
    }

    /// Every directed edge as `(from, to)`, grouped by source in creation order.
    pub fn edges(&self) -> Vec<(NodeId, NodeId)> {
        self.nodes
            .iter()
            .enumerate()
            .flat_map(|(i, n)| n.neighbours.iter().map(move |&to| (NodeId(i), to)))
            .collect()
    }

    pub fn clear_links(&mut self) {
        for node in &mut self.nodes {
            node.neighbours.clear();
        }
    }
}

impl<T: Default> Graph<T> {
    /// Returns the node called `name`, creating it with a default payload if absent.
    pub fn get_or_create(&mut self, name: &str) -> NodeId {
        match self.index.get(name) {
            Some(&id) => id,
            None => self.push(name.to_string(), T::default()),
        }
    }

    pub fn add_two_way_link(&mut self, a: &str, b: &str) -> (NodeId, NodeId) {
        let a = self.get_or_create(a);
        let b = self.get_or_create(b);
        self.add_link(a, b);
        self.add_link(b, a);
        (a, b)
    }

    pub fn add_one_way_link(&mut self, a: &str, b: &str) -> (NodeId, NodeId) {
        let a = self.get_or_create(a);
        let b = self.get_or_create(b);
        self.add_link(a, b);
        (a, b)
    }
}

impl<T> fmt::Display for Graph<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in &self.nodes {
            write!(f, "{}:", node.name)?;
            for (i, id) in node.neighbours.iter().enumerate() {
                let sep = if i == 0 { " " } else { ", " };
                write!(f, "{}{}", sep, self.nodes[id.0].name)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_reuses_existing() {
        let mut graph: Graph<()> = Graph::new();
        let a = graph.get_or_create("A");
        let b = graph.get_or_create("B");
        assert_eq!(graph.get_or_create("A"), a);
        assert_ne!(a, b);
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.nodes()[1].name(), "B");
    }

    #[test]
    fn test_insert_rejects_duplicate_name() {
        let mut graph = Graph::new();
        graph.insert("A", 1u32).unwrap();
        assert_eq!(graph.insert("A", 2), Err(DuplicateNode("A".to_string())));
        assert_eq!(graph.node(NodeId(0)).unwrap().data, 1);
    }

    #[test]
    fn test_two_way_link_creates_missing_nodes() {
        let mut graph: Graph<()> = Graph::new();
        let (a, b) = graph.add_two_way_link("A", "B");
        assert_eq!(graph.neighbours(a), &[b]);
        assert_eq!(graph.neighbours(b), &[a]);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_links_are_not_deduplicated() {
        let mut graph: Graph<()> = Graph::new();
        graph.add_one_way_link("A", "B");
        graph.add_one_way_link("A", "B");
        graph.add_one_way_link("A", "A");
        let a = graph.get("A").unwrap();
        let b = graph.get("B").unwrap();
        assert_eq!(graph.neighbours(a), &[b, b, a]);
        assert!(graph.neighbours(b).is_empty());
    }

    #[test]
    fn test_try_add_link_rejects_foreign_ids() {
        let mut graph: Graph<()> = Graph::new();
        let a = graph.get_or_create("A");
        let b = graph.get_or_create("B");

        assert_eq!(graph.try_add_link(a, NodeId(7)), Err(UnknownNode(7)));
        assert_eq!(graph.try_add_link(NodeId(5), b), Err(UnknownNode(5)));
        assert_eq!(graph.edge_count(), 0);

        assert_eq!(graph.try_add_link(a, b), Ok(()));
        assert_eq!(graph.neighbours(a), &[b]);
        assert_eq!(graph.to_string(), "A: B\nB:\n");
    }

    #[test]
    fn test_each_node_owns_its_neighbour_list() {
        let mut graph: Graph<()> = Graph::new();
        graph.add_one_way_link("A", "B");
        graph.get_or_create("C");
        let c = graph.get("C").unwrap();
        assert!(graph.neighbours(c).is_empty());
    }

    #[test]
    fn test_clear_links_keeps_nodes() {
        let mut graph: Graph<()> = Graph::new();
        graph.add_two_way_link("A", "B");
        graph.clear_links();
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.get("B"), Some(NodeId(1)));
    }

    #[test]
    fn test_display_lists_neighbours() {
        let mut graph: Graph<()> = Graph::new();
        graph.add_two_way_link("A", "B");
        graph.add_one_way_link("A", "C");
        assert_eq!(graph.to_string(), "A: B, C\nB: A\nC:\n");
    }
}
