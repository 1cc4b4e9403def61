//! Graph nodes and connector geometry.
//!
//! A node is a rectangular body with input connectors stacked down its
//! left edge and at most one output connector on its right edge. Input
//! `i` is centred at `(x, y + OFFSET·(i+1))`, the output at
//! `(x + width, y + OFFSET)`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geometry::{Point, Rect};

/// Vertical spacing between stacked connectors.
pub const CONNECTOR_OFFSET: i32 = 15;
/// Diameter of a connector handle.
pub const CONNECTOR_SIZE: i32 = 10;

const CONNECTOR_HALF: i32 = CONNECTOR_SIZE / 2;

/// Default node body width.
const MIN_WIDTH: i32 = 90;
/// Minimum node body height; grows with the input count.
const MIN_HEIGHT: i32 = 45;

/// Identifier of a node within a [`crate::graph::Graph`].
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw numeric identifier.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

/// One operator node on the canvas.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    name: String,
    position: Point,
    width: i32,
    height: i32,
    /// One slot per input connector; `Some` holds the feeding node.
    incoming: Vec<Option<NodeId>>,
    has_output: bool,
}

impl Node {
    /// Create a node with the given connector arity.
    pub fn new(
        name: impl Into<String>,
        position: Point,
        num_inputs: usize,
        has_output: bool,
    ) -> Self {
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let height = MIN_HEIGHT.max(CONNECTOR_OFFSET * (num_inputs as i32 + 1));
        Self {
            name: name.into(),
            position,
            width: MIN_WIDTH,
            height,
            incoming: vec![None; num_inputs],
            has_output,
        }
    }

    /// The operator name shown on the node.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Top-left corner of the node body.
    #[must_use]
    pub const fn position(&self) -> Point {
        self.position
    }

    pub(crate) const fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    /// Whether the node exposes an output connector.
    #[must_use]
    pub const fn has_output(&self) -> bool {
        self.has_output
    }

    /// Number of input connectors.
    #[must_use]
    pub fn num_inputs(&self) -> usize {
        self.incoming.len()
    }

    /// The node feeding input `index`, if connected.
    #[must_use]
    pub fn input_source(&self, index: usize) -> Option<NodeId> {
        self.incoming.get(index).copied().flatten()
    }

    /// Index of the first unconnected input connector.
    #[must_use]
    pub fn first_free_input(&self) -> Option<usize> {
        self.incoming.iter().position(Option::is_none)
    }

    pub(crate) fn connect_input(&mut self, index: usize, source: NodeId) {
        self.incoming[index] = Some(source);
    }

    pub(crate) fn disconnect_input(&mut self, index: usize) -> Option<NodeId> {
        self.incoming.get_mut(index).and_then(Option::take)
    }

    /// Clear every input slot fed by `source`.
    pub(crate) fn disconnect_source(&mut self, source: NodeId) {
        for slot in &mut self.incoming {
            if *slot == Some(source) {
                *slot = None;
            }
        }
    }

    /// The node body footprint.
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        Rect::new(self.position.x, self.position.y, self.width, self.height)
    }

    /// Absolute centre of input connector `index`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn input_position(&self, index: usize) -> Point {
        Point::new(
            self.position.x,
            self.position.y + CONNECTOR_OFFSET * (index as i32 + 1),
        )
    }

    /// Absolute centre of the output connector.
    #[must_use]
    pub const fn output_position(&self) -> Point {
        Point::new(
            self.position.x + self.width,
            self.position.y + CONNECTOR_OFFSET,
        )
    }

    /// Hit-test the input connectors.
    ///
    /// Returns the input index under the point, if any.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_possible_wrap)]
    pub fn input_index_at(&self, p: Point) -> Option<usize> {
        let dx = p.x - self.position.x;
        let dy = p.y - self.position.y;
        if dx.abs() > CONNECTOR_HALF || dy <= 0 {
            return None;
        }
        // Nearest connector slot for this vertical offset.
        let slot = (dy + CONNECTOR_OFFSET / 2) / CONNECTOR_OFFSET;
        if slot < 1 || slot > self.incoming.len() as i32 {
            return None;
        }
        let center = slot * CONNECTOR_OFFSET;
        ((dy - center).abs() <= CONNECTOR_HALF).then_some((slot - 1) as usize)
    }

    /// Whether the point is over the output connector.
    #[must_use]
    pub fn is_over_output(&self, p: Point) -> bool {
        if !self.has_output {
            return false;
        }
        let dx = p.x - self.position.x;
        let dy = p.y - self.position.y;
        (dx - self.width).abs() <= CONNECTOR_HALF && (dy - CONNECTOR_OFFSET).abs() <= CONNECTOR_HALF
    }

    /// Whether the point is over the node body or its connector overhang.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        self.bounds().expand(CONNECTOR_HALF).contains(p)
    }
}
