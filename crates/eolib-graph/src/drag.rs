//! In-flight drag gestures.
//!
//! A gesture is classified at press time as either moving a node body or
//! drawing a connection from a connector. While it is in flight only the
//! current pointer position changes; the graph is committed on release.

use crate::geometry::{Point, Rect};
use crate::graph::Graph;
use crate::node::NodeId;

/// Margin the Move redraw box grows by, covering rendering overdraw.
pub const MOVE_BOX_MARGIN: i32 = 8;
/// Margin the Connect redraw box grows by on each side.
pub const CONNECT_BOX_MARGIN: i32 = 5;

/// The connector end a Connect gesture started from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Connector {
    /// The node's output connector.
    Output,
    /// The node's input connector with this index.
    Input(usize),
}

/// An in-flight pointer gesture.
///
/// Exactly one variant is live per gesture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DragAction {
    /// Moving a node body.
    Move {
        /// The dragged node.
        node: NodeId,
        /// Offset between the press point and the node origin.
        grab_offset: Point,
        /// Current pointer position.
        current: Point,
    },
    /// Drawing a new connection from a connector.
    Connect {
        /// The node the gesture started on.
        source: NodeId,
        /// Which of its connectors was grabbed.
        connector: Connector,
        /// Current endpoint position.
        current: Point,
    },
}

impl DragAction {
    /// Update the current pointer position.
    pub fn update(&mut self, position: Point) {
        match self {
            Self::Move { current, .. } | Self::Connect { current, .. } => *current = position,
        }
    }

    /// The current pointer position.
    #[must_use]
    pub const fn current(&self) -> Point {
        match self {
            Self::Move { current, .. } | Self::Connect { current, .. } => *current,
        }
    }

    /// The region the canvas must repaint for the gesture's current state.
    ///
    /// Move: the dragged node's footprint translated by the net drag
    /// delta. Connect: the box spanning the source connector and the
    /// pointer. `None` if the referenced node no longer exists.
    #[must_use]
    pub fn bounding_box(&self, graph: &Graph) -> Option<Rect> {
        match self {
            Self::Move {
                node,
                grab_offset,
                current,
            } => {
                let node = graph.node(*node)?;
                let proposed = *current - *grab_offset;
                let bounds = node.bounds();
                Some(
                    Rect::new(proposed.x, proposed.y, bounds.width, bounds.height)
                        .expand(MOVE_BOX_MARGIN),
                )
            }
            Self::Connect {
                source,
                connector,
                current,
            } => {
                let node = graph.node(*source)?;
                let anchor = match connector {
                    Connector::Output => node.output_position(),
                    Connector::Input(index) => node.input_position(*index),
                };
                Some(Rect::from_points(anchor, *current).expand(CONNECT_BOX_MARGIN))
            }
        }
    }
}
