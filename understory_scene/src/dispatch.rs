// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Three-phase event propagation: capture → target → bubble.
//!
//! [`propagation_path`] computes the ordered dispatch sequence for a target from a
//! snapshot of its ancestors. [`Scene::fire`] walks that sequence and stops as soon
//! as a listener stops the event.
//!
//! ## Order
//!
//! For a target `T` with ancestors `A1` (parent) … `An` (root):
//!
//! 1. Capture listeners of `An` … `A1`, then those of `T`.
//! 2. Regular listeners of `T`.
//! 3. If the event bubbles: regular listeners of `A1` … `An`.
//!
//! The sequence is computed once, before any listener runs. Restructuring the
//! tree from inside a listener does not change which nodes the ongoing dispatch
//! visits; stale entries are skipped.
//!
//! ```
//! use understory_scene::{Phase, propagation_path};
//! use understory_scene_tree::{LocalNode, NodeKind, Tree};
//!
//! let mut tree = Tree::new();
//! let root = tree.root();
//! let panel = tree.insert(Some(root), NodeKind::Container, LocalNode::default());
//! let button = tree.insert(Some(panel), NodeKind::Leaf, LocalNode::default());
//!
//! let path = propagation_path(&tree, button, true);
//! let order: Vec<_> = path.iter().map(|d| (d.phase, d.node)).collect();
//! assert_eq!(order, vec![
//!     (Phase::Capture, root), (Phase::Capture, panel), (Phase::Capture, button),
//!     (Phase::Target, button),
//!     (Phase::Bubble, panel), (Phase::Bubble, root),
//! ]);
//! ```

use smallvec::SmallVec;
use understory_scene_tree::{NodeId, Tree};

use crate::event::{Event, EventKind};
use crate::scene::Scene;

/// Propagation phase of a dispatch entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Capture listeners, root toward target (target included).
    Capture,
    /// Regular listeners of the target.
    Target,
    /// Regular listeners, parent toward root.
    Bubble,
}

/// One step of a dispatch sequence.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Dispatch {
    /// Phase of this step.
    pub phase: Phase,
    /// Node whose listeners are notified.
    pub node: NodeId,
}

impl Dispatch {
    /// A capture-phase step.
    pub const fn capture(node: NodeId) -> Self {
        Self {
            phase: Phase::Capture,
            node,
        }
    }

    /// The target-phase step.
    pub const fn target(node: NodeId) -> Self {
        Self {
            phase: Phase::Target,
            node,
        }
    }

    /// A bubble-phase step.
    pub const fn bubble(node: NodeId) -> Self {
        Self {
            phase: Phase::Bubble,
            node,
        }
    }

    /// True if this step notifies capture listeners.
    pub fn uses_capture_listeners(&self) -> bool {
        self.phase == Phase::Capture
    }
}

/// Ordered dispatch sequence for one event.
pub type Propagation = SmallVec<[Dispatch; 16]>;

/// Build the capture → target → bubble sequence for `target`.
///
/// Bubble entries are omitted when `bubbles` is `false`.
pub fn propagation_path(tree: &Tree, target: NodeId, bubbles: bool) -> Propagation {
    let ancestors = tree.ancestors(target);
    let mut seq = Propagation::with_capacity(ancestors.len() * 2 + 2);
    seq.extend(ancestors.iter().rev().copied().map(Dispatch::capture));
    seq.push(Dispatch::capture(target));
    seq.push(Dispatch::target(target));
    if bubbles {
        seq.extend(ancestors.iter().copied().map(Dispatch::bubble));
    }
    seq
}

impl Scene {
    /// Fire `event` at `target`, running capture, target and bubble phases.
    ///
    /// Sets the event's target, then notifies listeners in [`propagation_path`] order
    /// until the event is stopped. Returns `true` if the event was cancelled.
    ///
    /// # Panics
    ///
    /// Panics if `target` is stale.
    pub fn fire(&mut self, target: NodeId, event: &mut Event) -> bool {
        assert!(
            self.tree.is_alive(target),
            "cannot fire an event at a stale NodeId"
        );
        event.target = Some(target);
        let seq = propagation_path(&self.tree, target, event.bubbles());
        log::trace!(
            "fire {:?} at {target:?} through {} steps",
            event.kind(),
            seq.len()
        );
        for d in &seq {
            if !self.tree.is_alive(d.node) {
                continue;
            }
            self.notify(d.node, event, d.uses_capture_listeners());
            if event.is_stopped() {
                log::trace!("{:?} stopped at {:?} ({:?})", event.kind(), d.node, d.phase);
                break;
            }
        }
        event.is_cancelled()
    }

    /// Notify the listeners of one node.
    ///
    /// Stamps `node` as the event's listener actor, then calls each listener of the
    /// chosen list, in registration order, from a snapshot taken on entry. A listener
    /// returning `true` marks the event handled; for touch-down events that also
    /// registers a touch focus for the listener. Stopping does not skip the node's
    /// remaining listeners. Returns `true` if the event was cancelled.
    ///
    /// # Panics
    ///
    /// Panics if the event has no target.
    pub fn notify(&mut self, node: NodeId, event: &mut Event, capture: bool) -> bool {
        assert!(
            event.target.is_some(),
            "the event target must be set before notifying listeners"
        );
        let listeners = self.listener_snapshot(node, capture);
        if listeners.is_empty() {
            return event.is_cancelled();
        }
        event.listener_actor = Some(node);
        event.capture = capture;
        for l in listeners {
            if !l.handle(self, event) {
                continue;
            }
            event.handle();
            if event.kind() == EventKind::TouchDown
                && let (Some(target), Some(pointer), Some(button)) =
                    (event.target, event.pointer, event.button)
            {
                self.add_touch_focus(l, node, target, pointer, button);
            }
        }
        event.is_cancelled()
    }
}
