//! The processing graph: nodes and the edges between their connectors.

use indexmap::IndexMap;
use thiserror::Error;

use crate::geometry::Point;
use crate::node::{Node, NodeId};

/// Error type for graph mutations.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    /// The referenced node does not exist.
    #[error("unknown node")]
    UnknownNode,
    /// The source node exposes no output connector.
    #[error("node has no output connector")]
    NoOutput,
    /// The target input connector does not exist.
    #[error("input connector {0} does not exist")]
    NoSuchInput(usize),
    /// The target input connector is already fed by another node.
    #[error("input connector {0} is already connected")]
    InputOccupied(usize),
    /// A node cannot feed itself.
    #[error("cannot connect a node to itself")]
    SelfConnection,
}

/// A directed edge: `source`'s output feeds `target`'s input `input`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub input: usize,
}

/// Node store with stable stacking order.
///
/// Insertion order is the z-order: later nodes stack above earlier ones,
/// so hit tests walk the store in reverse.
#[derive(Debug, Default)]
pub struct Graph {
    nodes: IndexMap<NodeId, Node>,
    next_id: u32,
}

impl Graph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node; returns its identifier.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = NodeId::new(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, node);
        id
    }

    /// Remove a node, detaching every edge that referenced it.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        let node = self.nodes.shift_remove(&id)?;
        for other in self.nodes.values_mut() {
            other.disconnect_source(id);
        }
        Some(node)
    }

    /// Look up a node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate nodes in stacking order (bottom first).
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    /// Topmost node under a point, if any.
    #[must_use]
    pub fn node_at(&self, p: Point) -> Option<NodeId> {
        self.nodes
            .iter()
            .rev()
            .find(|(_, node)| node.contains(p))
            .map(|(id, _)| *id)
    }

    /// Move a node to a new position.
    pub fn move_node(&mut self, id: NodeId, position: Point) -> Result<(), GraphError> {
        let node = self.nodes.get_mut(&id).ok_or(GraphError::UnknownNode)?;
        node.set_position(position);
        Ok(())
    }

    /// Connect `source`'s output to `target`'s input `input`.
    pub fn connect(
        &mut self,
        source: NodeId,
        target: NodeId,
        input: usize,
    ) -> Result<(), GraphError> {
        if source == target {
            return Err(GraphError::SelfConnection);
        }
        {
            let source_node = self.nodes.get(&source).ok_or(GraphError::UnknownNode)?;
            if !source_node.has_output() {
                return Err(GraphError::NoOutput);
            }
        }
        let target_node = self.nodes.get_mut(&target).ok_or(GraphError::UnknownNode)?;
        if input >= target_node.num_inputs() {
            return Err(GraphError::NoSuchInput(input));
        }
        if target_node.input_source(input).is_some() {
            return Err(GraphError::InputOccupied(input));
        }
        target_node.connect_input(input, source);
        Ok(())
    }

    /// Detach `target`'s input `input`; returns the node that fed it.
    pub fn disconnect(
        &mut self,
        target: NodeId,
        input: usize,
    ) -> Result<Option<NodeId>, GraphError> {
        let target_node = self.nodes.get_mut(&target).ok_or(GraphError::UnknownNode)?;
        if input >= target_node.num_inputs() {
            return Err(GraphError::NoSuchInput(input));
        }
        Ok(target_node.disconnect_input(input))
    }

    /// Snapshot of all edges.
    #[must_use]
    pub fn edges(&self) -> Vec<Edge> {
        let mut edges = Vec::new();
        for (target, node) in &self.nodes {
            for input in 0..node.num_inputs() {
                if let Some(source) = node.input_source(input) {
                    edges.push(Edge {
                        source,
                        target: *target,
                        input,
                    });
                }
            }
        }
        edges
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.nodes
            .values()
            .map(|node| (0..node.num_inputs()).filter(|i| node.input_source(*i).is_some()).count())
            .sum()
    }
}
