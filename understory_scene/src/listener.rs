// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Listeners, actions, and their per-node registration.
//!
//! Listeners are shared handles ([`ListenerRef`]) compared by identity, so the
//! same listener can be registered on several nodes and later removed or
//! excluded from a touch-focus cancel by handle.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;

use smallvec::SmallVec;
use understory_scene_tree::NodeId;

use crate::event::Event;
use crate::scene::Scene;

/// Receives events delivered to a node.
pub trait Listener {
    /// Handle `event`. Returning `true` marks the event handled.
    ///
    /// The scene is passed mutably: listeners may restructure the tree,
    /// register or remove listeners, move focus, or fire further events.
    fn handle(&self, scene: &mut Scene, event: &mut Event) -> bool;
}

impl<F> Listener for F
where
    F: Fn(&mut Scene, &mut Event) -> bool,
{
    fn handle(&self, scene: &mut Scene, event: &mut Event) -> bool {
        self(scene, event)
    }
}

/// Shared handle to a listener.
pub type ListenerRef = Rc<dyn Listener>;

/// Wrap a closure or listener value into a [`ListenerRef`].
pub fn listener(l: impl Listener + 'static) -> ListenerRef {
    Rc::new(l)
}

pub(crate) fn same_listener(a: &ListenerRef, b: &ListenerRef) -> bool {
    core::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// Per-frame behavior attached to a node, advanced by [`Scene::act`].
pub trait Action {
    /// Advance by `delta` seconds. Return `true` once finished; the action is then dropped.
    fn act(&mut self, delta: f64, actor: NodeId, scene: &mut Scene) -> bool;
}

impl<F> Action for F
where
    F: FnMut(f64, NodeId, &mut Scene) -> bool,
{
    fn act(&mut self, delta: f64, actor: NodeId, scene: &mut Scene) -> bool {
        self(delta, actor, scene)
    }
}

pub(crate) type Listeners = SmallVec<[ListenerRef; 4]>;

#[derive(Default)]
pub(crate) struct Handlers {
    pub(crate) listeners: Vec<ListenerRef>,
    pub(crate) capture_listeners: Vec<ListenerRef>,
    pub(crate) actions: Vec<Box<dyn Action>>,
}

impl Handlers {
    fn list_mut(&mut self, capture: bool) -> &mut Vec<ListenerRef> {
        if capture {
            &mut self.capture_listeners
        } else {
            &mut self.listeners
        }
    }

    fn is_empty(&self) -> bool {
        self.listeners.is_empty() && self.capture_listeners.is_empty() && self.actions.is_empty()
    }
}

impl Scene {
    /// Register a regular listener on `node`; notified in the target and bubble phases.
    ///
    /// Returns `false` if `node` is stale or the listener is already registered there.
    pub fn add_listener(&mut self, node: NodeId, listener: ListenerRef) -> bool {
        self.register_listener(node, listener, false)
    }

    /// Register a capture listener on `node`; notified in the capture phase.
    ///
    /// Returns `false` if `node` is stale or the listener is already registered there.
    pub fn add_capture_listener(&mut self, node: NodeId, listener: ListenerRef) -> bool {
        self.register_listener(node, listener, true)
    }

    /// Remove a regular listener. Returns `true` if it was registered.
    pub fn remove_listener(&mut self, node: NodeId, listener: &ListenerRef) -> bool {
        self.unregister_listener(node, listener, false)
    }

    /// Remove a capture listener. Returns `true` if it was registered.
    pub fn remove_capture_listener(&mut self, node: NodeId, listener: &ListenerRef) -> bool {
        self.unregister_listener(node, listener, true)
    }

    /// Regular listeners of `node`, in registration order.
    pub fn listeners(&self, node: NodeId) -> &[ListenerRef] {
        self.handlers
            .get(&node)
            .map_or(&[][..], |h| h.listeners.as_slice())
    }

    /// Capture listeners of `node`, in registration order.
    pub fn capture_listeners(&self, node: NodeId) -> &[ListenerRef] {
        self.handlers
            .get(&node)
            .map_or(&[][..], |h| h.capture_listeners.as_slice())
    }

    /// Remove every regular and capture listener from `node`.
    pub fn clear_listeners(&mut self, node: NodeId) {
        if let Some(h) = self.handlers.get_mut(&node) {
            h.listeners.clear();
            h.capture_listeners.clear();
            if h.is_empty() {
                self.handlers.remove(&node);
            }
        }
    }

    /// Attach an action to `node`. Ignored for stale ids.
    ///
    /// Actions run in attachment order on every [`Scene::act`] while the node is in the scene.
    pub fn add_action(&mut self, node: NodeId, action: impl Action + 'static) {
        if !self.tree.is_alive(node) {
            return;
        }
        self.handlers
            .entry(node)
            .or_default()
            .actions
            .push(Box::new(action));
    }

    /// Returns true if `node` has unfinished actions.
    pub fn has_actions(&self, node: NodeId) -> bool {
        self.handlers
            .get(&node)
            .is_some_and(|h| !h.actions.is_empty())
    }

    /// Drop every action attached to `node`.
    ///
    /// Called from one of `node`'s own actions, this also drops the actions
    /// running in the current [`Scene::act`].
    pub fn clear_actions(&mut self, node: NodeId) {
        if let Some((acting, cleared)) = &mut self.acting
            && *acting == node
        {
            *cleared = true;
        }
        if let Some(h) = self.handlers.get_mut(&node) {
            h.actions.clear();
            if h.is_empty() {
                self.handlers.remove(&node);
            }
        }
    }

    /// Snapshot of the listeners to notify on `node`. Owned, so registration
    /// changes made by listeners take effect from the next dispatch.
    pub(crate) fn listener_snapshot(&self, node: NodeId, capture: bool) -> Listeners {
        let list = if capture {
            self.capture_listeners(node)
        } else {
            self.listeners(node)
        };
        list.iter().cloned().collect()
    }

    fn register_listener(&mut self, node: NodeId, listener: ListenerRef, capture: bool) -> bool {
        if !self.tree.is_alive(node) {
            return false;
        }
        let list = self.handlers.entry(node).or_default().list_mut(capture);
        if list.iter().any(|l| same_listener(l, &listener)) {
            return false;
        }
        list.push(listener);
        true
    }

    fn unregister_listener(&mut self, node: NodeId, listener: &ListenerRef, capture: bool) -> bool {
        let Some(h) = self.handlers.get_mut(&node) else {
            return false;
        };
        let list = h.list_mut(capture);
        let Some(pos) = list.iter().position(|l| same_listener(l, listener)) else {
            return false;
        };
        list.remove(pos);
        if h.is_empty() {
            self.handlers.remove(&node);
        }
        true
    }
}
