// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Touch focus: per-pointer capture of drag and release events.
//!
//! A listener that handles a touch-down is registered as a touch focus for that
//! pointer and button. Until the pointer goes up, drags of that pointer are sent
//! straight to the registered listener instead of being hit tested, and the
//! matching release is delivered to it exactly once.
//!
//! Cancelling touch focus removes records and sends each removed listener a
//! synthetic touch-up at [`CANCEL_COORDINATE`] on both axes.

use alloc::vec::Vec;
use core::fmt;

use kurbo::Point;
use smallvec::SmallVec;
use understory_scene_tree::{NodeId, Tree};

use crate::event::{Button, CANCEL_COORDINATE, Event, EventKind, Pointer};
use crate::listener::{ListenerRef, same_listener};
use crate::scene::Scene;

/// A listener that captured a pointer on touch-down.
#[derive(Clone)]
pub struct TouchFocus {
    /// The listener receiving drags and the release.
    pub listener: ListenerRef,
    /// The node the listener was registered on.
    pub listener_actor: NodeId,
    /// The node the touch-down was fired at.
    pub target: NodeId,
    /// Pointer index.
    pub pointer: Pointer,
    /// Button pressed on touch-down.
    pub button: Button,
    serial: u64,
}

impl TouchFocus {
    fn same_registration(
        &self,
        listener: &ListenerRef,
        listener_actor: NodeId,
        pointer: Pointer,
        button: Button,
    ) -> bool {
        same_listener(&self.listener, listener)
            && self.listener_actor == listener_actor
            && self.pointer == pointer
            && self.button == button
    }
}

impl fmt::Debug for TouchFocus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TouchFocus")
            .field("listener_actor", &self.listener_actor)
            .field("target", &self.target)
            .field("pointer", &self.pointer)
            .field("button", &self.button)
            .finish_non_exhaustive()
    }
}

/// Ordered set of touch focuses.
#[derive(Clone, Debug, Default)]
pub(crate) struct TouchFocusRegistry {
    focuses: Vec<TouchFocus>,
    next_serial: u64,
}

type Snapshot = SmallVec<[TouchFocus; 4]>;

impl TouchFocusRegistry {
    fn register(
        &mut self,
        listener: ListenerRef,
        listener_actor: NodeId,
        target: NodeId,
        pointer: Pointer,
        button: Button,
    ) -> bool {
        if self
            .focuses
            .iter()
            .any(|f| f.same_registration(&listener, listener_actor, pointer, button))
        {
            return false;
        }
        let serial = self.next_serial;
        self.next_serial += 1;
        self.focuses.push(TouchFocus {
            listener,
            listener_actor,
            target,
            pointer,
            button,
            serial,
        });
        true
    }

    fn contains(&self, focus: &TouchFocus) -> bool {
        self.focuses.iter().any(|f| f.serial == focus.serial)
    }

    /// Remove `focus` if it is still registered.
    fn take(&mut self, focus: &TouchFocus) -> bool {
        match self.focuses.iter().position(|f| f.serial == focus.serial) {
            Some(pos) => {
                self.focuses.remove(pos);
                true
            }
            None => false,
        }
    }

    fn snapshot(&self) -> Snapshot {
        self.focuses.iter().cloned().collect()
    }

    /// Drop records whose listener actor no longer exists, without notifying them.
    pub(crate) fn forget_stale(&mut self, tree: &Tree) -> usize {
        let before = self.focuses.len();
        self.focuses.retain(|f| tree.is_alive(f.listener_actor));
        before - self.focuses.len()
    }

    pub(crate) fn as_slice(&self) -> &[TouchFocus] {
        &self.focuses
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.focuses.is_empty()
    }
}

impl Scene {
    /// Register a touch focus. Returns `false` if the same listener, actor, pointer
    /// and button are already registered.
    ///
    /// Called automatically when a listener handles a touch-down.
    pub fn add_touch_focus(
        &mut self,
        listener: ListenerRef,
        listener_actor: NodeId,
        target: NodeId,
        pointer: Pointer,
        button: Button,
    ) -> bool {
        self.touch_focus
            .register(listener, listener_actor, target, pointer, button)
    }

    /// Remove a touch focus without notifying its listener. Returns `true` if it was registered.
    pub fn remove_touch_focus(
        &mut self,
        listener: &ListenerRef,
        listener_actor: NodeId,
        target: NodeId,
        pointer: Pointer,
        button: Button,
    ) -> bool {
        let before = self.touch_focus.focuses.len();
        self.touch_focus.focuses.retain(|f| {
            !(f.target == target && f.same_registration(listener, listener_actor, pointer, button))
        });
        self.touch_focus.focuses.len() != before
    }

    /// Registered touch focuses, oldest first.
    pub fn touch_focuses(&self) -> &[TouchFocus] {
        self.touch_focus.as_slice()
    }

    /// Deliver a drag of `pointer` to every touch focus of that pointer.
    ///
    /// Each matching record present when the call starts is notified once, unless
    /// an earlier listener removed it. Returns `true` if any listener handled the drag.
    pub fn dispatch_touch_dragged(&mut self, pointer: Pointer, stage: Point) -> bool {
        let mut event = Event::new(EventKind::TouchDragged)
            .with_stage(stage)
            .with_pointer(pointer);
        for focus in self.touch_focus.snapshot() {
            if focus.pointer != pointer || !self.touch_focus.contains(&focus) {
                continue;
            }
            self.deliver(&focus, &mut event);
        }
        event.is_handled()
    }

    /// Deliver a release of `pointer`/`button` to its touch focuses and remove them.
    ///
    /// A record is removed right before its listener is notified, so each one sees
    /// at most one release. Returns `true` if any listener handled the release.
    pub fn dispatch_touch_up(&mut self, pointer: Pointer, button: Button, stage: Point) -> bool {
        let mut event = Event::new(EventKind::TouchUp)
            .with_stage(stage)
            .with_pointer(pointer)
            .with_button(button);
        for focus in self.touch_focus.snapshot() {
            if focus.pointer != pointer || focus.button != button {
                continue;
            }
            if !self.touch_focus.take(&focus) {
                continue;
            }
            self.deliver(&focus, &mut event);
        }
        event.is_handled()
    }

    /// Cancel every touch focus.
    ///
    /// Each removed listener receives a touch-up for which
    /// [`Event::is_touch_focus_cancel`] is true.
    pub fn cancel_touch_focus(&mut self) {
        self.cancel_touch_focus_where(|_, _| true);
    }

    /// Cancel every touch focus except those of `listener` on `listener_actor`.
    ///
    /// Used by a widget that claims a gesture, such as a scroll pane starting to pan.
    pub fn cancel_touch_focus_except(&mut self, listener: &ListenerRef, listener_actor: NodeId) {
        self.cancel_touch_focus_where(|_, f| {
            !(f.listener_actor == listener_actor && same_listener(&f.listener, listener))
        });
    }

    /// Cancel the touch focuses whose listener actor is `node` or one of its descendants.
    pub fn cancel_touch_focus_for(&mut self, node: NodeId) {
        self.cancel_touch_focus_where(|tree, f| tree.is_descendant_of(f.listener_actor, node));
    }

    fn cancel_touch_focus_where(&mut self, mut cancel: impl FnMut(&Tree, &TouchFocus) -> bool) {
        if self.touch_focus.is_empty() {
            return;
        }
        let mut event = Event::new(EventKind::TouchUp)
            .with_stage(Point::new(CANCEL_COORDINATE, CANCEL_COORDINATE));
        for focus in self.touch_focus.snapshot() {
            if !cancel(&self.tree, &focus) || !self.touch_focus.take(&focus) {
                continue;
            }
            log::debug!(
                "cancel touch focus of {:?} for pointer {}",
                focus.listener_actor,
                focus.pointer
            );
            event.pointer = Some(focus.pointer);
            event.button = Some(focus.button);
            self.deliver(&focus, &mut event);
        }
    }

    fn deliver(&mut self, focus: &TouchFocus, event: &mut Event) {
        event.target = Some(focus.target);
        event.listener_actor = Some(focus.listener_actor);
        event.capture = false;
        if focus.listener.handle(self, event) {
            event.handle();
        }
    }
}
