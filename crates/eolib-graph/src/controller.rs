//! Canvas interaction controller.
//!
//! Interprets raw pointer events as gestures: `Idle → {Moving |
//! Connecting} → Idle`. A press over a node body starts a move, a press
//! over a connector starts a connection, and release commits the result
//! to the graph. Committed mutations are returned as [`GraphEvent`]
//! values for the caller to apply to its own views.

use crate::drag::{Connector, DragAction};
use crate::geometry::{Point, Rect};
use crate::graph::Graph;
use crate::node::NodeId;

/// A mutation a gesture committed to the graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphEvent {
    /// A node was moved to a new (grid-snapped) position.
    NodeMoved { node: NodeId, position: Point },
    /// An edge was created.
    EdgeCreated {
        source: NodeId,
        target: NodeId,
        input: usize,
    },
    /// An edge was removed.
    EdgeRemoved {
        source: NodeId,
        target: NodeId,
        input: usize,
    },
}

/// Drag/connect controller for the graph canvas.
#[derive(Debug, Default)]
pub struct CanvasController {
    graph: Graph,
    drag: Option<DragAction>,
}

impl CanvasController {
    /// Create a controller over an existing graph.
    #[must_use]
    pub fn new(graph: Graph) -> Self {
        Self { graph, drag: None }
    }

    /// The underlying graph.
    #[must_use]
    pub const fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Mutable access to the graph for model edits outside gestures.
    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    /// Consume the controller, returning the graph.
    #[must_use]
    pub fn into_graph(self) -> Graph {
        self.graph
    }

    /// Whether no gesture is in flight.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.drag.is_none()
    }

    /// The in-flight gesture, if any.
    #[must_use]
    pub const fn drag(&self) -> Option<&DragAction> {
        self.drag.as_ref()
    }

    /// Classify a press into a gesture.
    ///
    /// The topmost node under the pointer wins. Pressing a *connected*
    /// input detaches that edge and continues the gesture from its
    /// original source, so the user can re-route a connection in one
    /// motion; the detachment is reported immediately.
    pub fn press(&mut self, position: Point) -> Vec<GraphEvent> {
        let mut events = Vec::new();

        let Some(id) = self.graph.node_at(position) else {
            self.drag = None;
            return events;
        };
        let Some(node) = self.graph.node(id) else {
            self.drag = None;
            return events;
        };

        if let Some(input) = node.input_index_at(position) {
            if let Some(source) = node.input_source(input) {
                let _ = self.graph.disconnect(id, input);
                events.push(GraphEvent::EdgeRemoved {
                    source,
                    target: id,
                    input,
                });
                self.drag = Some(DragAction::Connect {
                    source,
                    connector: Connector::Output,
                    current: position,
                });
            } else {
                self.drag = Some(DragAction::Connect {
                    source: id,
                    connector: Connector::Input(input),
                    current: position,
                });
            }
        } else if node.is_over_output(position) {
            self.drag = Some(DragAction::Connect {
                source: id,
                connector: Connector::Output,
                current: position,
            });
        } else {
            self.drag = Some(DragAction::Move {
                node: id,
                grab_offset: position - node.position(),
                current: position,
            });
        }

        events
    }

    /// Track pointer motion.
    ///
    /// Only the gesture state changes; the graph is untouched. Returns
    /// the union of the redraw boxes before and after the motion.
    pub fn drag_to(&mut self, position: Point) -> Option<Rect> {
        let drag = self.drag.as_mut()?;
        let before = drag.bounding_box(&self.graph);
        drag.update(position);
        let after = drag.bounding_box(&self.graph);
        match (before, after) {
            (Some(a), Some(b)) => Some(a.union(b)),
            (a, b) => a.or(b),
        }
    }

    /// Commit the gesture at the release point.
    ///
    /// Move commits the node at `pointer − grab offset` snapped to the
    /// grid. Connect commits an edge when released over a compatible
    /// connector on a different node, and is discarded otherwise.
    pub fn release(&mut self, position: Point) -> Vec<GraphEvent> {
        let Some(mut drag) = self.drag.take() else {
            return Vec::new();
        };
        drag.update(position);

        match drag {
            DragAction::Move {
                node,
                grab_offset,
                current,
            } => {
                let target = (current - grab_offset).snapped();
                match self.graph.move_node(node, target) {
                    Ok(()) => vec![GraphEvent::NodeMoved {
                        node,
                        position: target,
                    }],
                    Err(_) => Vec::new(),
                }
            }
            DragAction::Connect {
                source,
                connector,
                current,
            } => self.commit_connection(source, connector, current),
        }
    }

    /// Discard the in-flight gesture without touching the graph.
    pub fn cancel(&mut self) {
        self.drag = None;
    }

    fn commit_connection(
        &mut self,
        source: NodeId,
        connector: Connector,
        current: Point,
    ) -> Vec<GraphEvent> {
        let Some(target) = self.graph.node_at(current).filter(|id| *id != source) else {
            return Vec::new();
        };
        let Some(target_node) = self.graph.node(target) else {
            return Vec::new();
        };

        let created = match connector {
            Connector::Output => {
                // An output binds to the target's next free input, provided
                // the pointer released over an input connector at all.
                if target_node.input_index_at(current).is_none() {
                    return Vec::new();
                }
                let Some(input) = target_node.first_free_input() else {
                    return Vec::new();
                };
                self.graph
                    .connect(source, target, input)
                    .map(|()| GraphEvent::EdgeCreated {
                        source,
                        target,
                        input,
                    })
            }
            Connector::Input(input) => {
                // An input binds only to a node that exposes an output;
                // the edge then runs target → source.
                if !target_node.is_over_output(current) {
                    return Vec::new();
                }
                self.graph
                    .connect(target, source, input)
                    .map(|()| GraphEvent::EdgeCreated {
                        source: target,
                        target: source,
                        input,
                    })
            }
        };

        created.map_or_else(|_| Vec::new(), |event| vec![event])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;

    fn controller_with_pair() -> (CanvasController, NodeId, NodeId) {
        let mut graph = Graph::new();
        let source = graph.add_node(Node::new("Read", Point::new(0, 0), 0, true));
        let target = graph.add_node(Node::new("Write", Point::new(300, 0), 2, false));
        (CanvasController::new(graph), source, target)
    }

    #[test]
    fn test_move_gesture_commits_snapped_position() {
        let mut graph = Graph::new();
        let id = graph.add_node(Node::new("Read", Point::new(10, 10), 0, true));
        let mut controller = CanvasController::new(graph);

        // Press inside the body at (15, 12): offset (5, 2) from the origin.
        assert!(controller.press(Point::new(15, 12)).is_empty());
        controller.drag_to(Point::new(30, 20));
        let events = controller.release(Point::new(50, 40));

        // (50-5, 40-2) = (45, 38), snapped to the 15-unit grid.
        assert_eq!(
            events,
            vec![GraphEvent::NodeMoved {
                node: id,
                position: Point::new(45, 45),
            }]
        );
        assert_eq!(
            controller.graph().node(id).unwrap().position(),
            Point::new(45, 45)
        );
    }

    #[test]
    fn test_graph_untouched_while_dragging() {
        let mut graph = Graph::new();
        let id = graph.add_node(Node::new("Read", Point::new(10, 10), 0, true));
        let mut controller = CanvasController::new(graph);

        controller.press(Point::new(15, 12));
        controller.drag_to(Point::new(200, 200));

        assert_eq!(
            controller.graph().node(id).unwrap().position(),
            Point::new(10, 10)
        );
    }

    #[test]
    fn test_output_drag_connects_to_first_free_input() {
        let (mut controller, source, target) = controller_with_pair();
        let output = controller.graph().node(source).unwrap().output_position();
        let input_1 = controller.graph().node(target).unwrap().input_position(1);

        controller.press(output);
        // Released over input 1, but input 0 is the first free slot.
        let events = controller.release(input_1);

        assert_eq!(
            events,
            vec![GraphEvent::EdgeCreated {
                source,
                target,
                input: 0,
            }]
        );
        assert_eq!(controller.graph().edge_count(), 1);
    }

    #[test]
    fn test_input_drag_connects_to_target_output() {
        let (mut controller, source, target) = controller_with_pair();
        let input_1 = controller.graph().node(target).unwrap().input_position(1);
        let output = controller.graph().node(source).unwrap().output_position();

        controller.press(input_1);
        let events = controller.release(output);

        assert_eq!(
            events,
            vec![GraphEvent::EdgeCreated {
                source,
                target,
                input: 1,
            }]
        );
    }

    #[test]
    fn test_release_over_empty_space_changes_nothing() {
        let (mut controller, source, _target) = controller_with_pair();
        let output = controller.graph().node(source).unwrap().output_position();

        controller.press(output);
        controller.drag_to(Point::new(150, 150));
        let events = controller.release(Point::new(150, 150));

        assert!(events.is_empty());
        assert_eq!(controller.graph().edge_count(), 0);
    }

    #[test]
    fn test_release_over_node_body_is_not_a_connector() {
        let (mut controller, source, target) = controller_with_pair();
        let output = controller.graph().node(source).unwrap().output_position();
        let body = controller.graph().node(target).unwrap().position() + Point::new(45, 5);

        controller.press(output);
        let events = controller.release(body);

        assert!(events.is_empty());
        assert_eq!(controller.graph().edge_count(), 0);
    }

    #[test]
    fn test_press_on_connected_input_detaches_and_redrags() {
        let (mut controller, source, target) = controller_with_pair();
        controller.graph_mut().connect(source, target, 0).unwrap();
        let input_0 = controller.graph().node(target).unwrap().input_position(0);

        let events = controller.press(input_0);

        assert_eq!(
            events,
            vec![GraphEvent::EdgeRemoved {
                source,
                target,
                input: 0,
            }]
        );
        assert_eq!(controller.graph().edge_count(), 0);
        // The gesture continues from the original source's output.
        match controller.drag() {
            Some(DragAction::Connect {
                source: drag_source,
                connector: Connector::Output,
                ..
            }) => assert_eq!(*drag_source, source),
            other => panic!("expected re-drag from source, got {other:?}"),
        }

        // Dropping it over empty space leaves the edge removed.
        let events = controller.release(Point::new(150, 150));
        assert!(events.is_empty());
        assert_eq!(controller.graph().edge_count(), 0);
    }

    #[test]
    fn test_press_over_empty_canvas_stays_idle() {
        let (mut controller, _, _) = controller_with_pair();

        let events = controller.press(Point::new(150, 150));

        assert!(events.is_empty());
        assert!(controller.is_idle());
        assert!(controller.release(Point::new(150, 150)).is_empty());
    }

    #[test]
    fn test_topmost_node_wins_the_press() {
        let mut graph = Graph::new();
        let below = graph.add_node(Node::new("Below", Point::new(0, 0), 0, true));
        let above = graph.add_node(Node::new("Above", Point::new(30, 10), 0, true));
        let mut controller = CanvasController::new(graph);

        controller.press(Point::new(40, 20));
        let events = controller.release(Point::new(40, 20));

        match events.as_slice() {
            [GraphEvent::NodeMoved { node, .. }] => assert_eq!(*node, above),
            other => panic!("expected a move of the top node, got {other:?}"),
        }
        // The lower node never moved.
        assert_eq!(
            controller.graph().node(below).unwrap().position(),
            Point::new(0, 0)
        );
    }

    #[test]
    fn test_cancel_discards_gesture() {
        let mut graph = Graph::new();
        let id = graph.add_node(Node::new("Read", Point::new(10, 10), 0, true));
        let mut controller = CanvasController::new(graph);

        controller.press(Point::new(15, 12));
        controller.drag_to(Point::new(100, 100));
        controller.cancel();

        assert!(controller.is_idle());
        assert_eq!(
            controller.graph().node(id).unwrap().position(),
            Point::new(10, 10)
        );
    }
}
