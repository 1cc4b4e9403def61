//! Processing-graph model and canvas interaction for eolib.
//!
//! This crate provides a pure state machine for managing the graph-editor
//! canvas: the node/edge model, connector geometry and the drag/connect
//! gesture controller. No I/O and no rendering happen here; a canvas
//! widget feeds pointer events in and applies the returned mutations.
//!
//! # Design
//!
//! - Pure synchronous state machine (no async, no IO, no tracing)
//! - Gestures never mutate the graph while in flight; commits happen on
//!   release only, so intermediate states are never observed
//! - Committed mutations are returned as [`GraphEvent`] values instead of
//!   being fanned out to a mutable listener set

pub mod controller;
pub mod drag;
pub mod geometry;
pub mod graph;
pub mod node;

pub use controller::{CanvasController, GraphEvent};
pub use drag::{CONNECT_BOX_MARGIN, Connector, DragAction, MOVE_BOX_MARGIN};
pub use geometry::{GRID_STEP, Point, Rect};
pub use graph::{Edge, Graph, GraphError};
pub use node::{CONNECTOR_OFFSET, CONNECTOR_SIZE, Node, NodeId};
