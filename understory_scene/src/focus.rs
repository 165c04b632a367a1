// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Keyboard and scroll focus negotiation.
//!
//! Changing focus is a two-step handshake with the nodes involved:
//!
//! 1. The current owner receives a focus event with `focused == false` and
//!    `related` set to the new owner. Cancelling it keeps focus where it is.
//! 2. Focus is committed, then the new owner receives a focus event with
//!    `focused == true` and `related` set to the old owner. Cancelling it reverts
//!    focus to the old owner, once, and the change reports failure.
//!
//! Focus events bubble, so a container can veto focus moves anywhere in its subtree.

use understory_scene_tree::NodeId;

use crate::event::{Event, EventKind};
use crate::scene::Scene;

/// Which focus slot a focus event or operation refers to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FocusKind {
    /// Receives key events.
    Keyboard,
    /// Receives scroll events.
    Scroll,
}

impl Scene {
    /// Current keyboard focus.
    pub fn keyboard_focus(&self) -> Option<NodeId> {
        self.keyboard_focus
    }

    /// Current scroll focus.
    pub fn scroll_focus(&self) -> Option<NodeId> {
        self.scroll_focus
    }

    /// Current owner of `kind`.
    pub fn focus(&self, kind: FocusKind) -> Option<NodeId> {
        match kind {
            FocusKind::Keyboard => self.keyboard_focus,
            FocusKind::Scroll => self.scroll_focus,
        }
    }

    /// Move keyboard focus to `node`, or clear it with `None`.
    ///
    /// Returns `true` if focus now rests on `node`. Returns `true` immediately when
    /// `node` already has focus, without notifying anyone.
    ///
    /// # Panics
    ///
    /// Panics if `node` is a stale id.
    pub fn set_keyboard_focus(&mut self, node: Option<NodeId>) -> bool {
        self.set_focus(FocusKind::Keyboard, node)
    }

    /// Move scroll focus to `node`, or clear it with `None`.
    ///
    /// Same handshake and result as [`Scene::set_keyboard_focus`].
    pub fn set_scroll_focus(&mut self, node: Option<NodeId>) -> bool {
        self.set_focus(FocusKind::Scroll, node)
    }

    /// Move the `kind` focus to `node`; see [`Scene::set_keyboard_focus`].
    pub fn set_focus(&mut self, kind: FocusKind, node: Option<NodeId>) -> bool {
        self.negotiate_focus(kind, node, true)
    }

    /// Clear touch, scroll and keyboard focus held by `node` or any of its descendants.
    pub fn unfocus(&mut self, node: NodeId) {
        self.cancel_touch_focus_for(node);
        for kind in [FocusKind::Scroll, FocusKind::Keyboard] {
            let Some(owner) = self.focus(kind) else {
                continue;
            };
            if !self.tree.is_alive(owner) {
                *self.focus_slot(kind) = None;
            } else if self.tree.is_descendant_of(owner, node) {
                self.set_focus(kind, None);
            }
        }
    }

    /// Clear scroll, keyboard and touch focus everywhere.
    pub fn unfocus_all(&mut self) {
        self.set_scroll_focus(None);
        self.set_keyboard_focus(None);
        self.cancel_touch_focus();
    }

    fn focus_slot(&mut self, kind: FocusKind) -> &mut Option<NodeId> {
        match kind {
            FocusKind::Keyboard => &mut self.keyboard_focus,
            FocusKind::Scroll => &mut self.scroll_focus,
        }
    }

    fn negotiate_focus(&mut self, kind: FocusKind, node: Option<NodeId>, may_revert: bool) -> bool {
        let old = self.focus(kind);
        if old == node {
            return true;
        }
        if let Some(n) = node {
            assert!(self.tree.is_alive(n), "cannot focus a stale NodeId");
        }

        if let Some(owner) = old.filter(|&o| self.tree.is_alive(o)) {
            let mut lost = Event::new(EventKind::Focus(kind))
                .with_focused(false)
                .with_related(node);
            if self.fire(owner, &mut lost) {
                log::debug!("{kind:?} focus kept by {owner:?}: losing veto");
                return false;
            }
        }

        if node.is_some_and(|n| !self.tree.is_alive(n)) {
            log::debug!("{kind:?} focus target {node:?} destroyed during the handshake");
            if self.focus(kind).is_some_and(|o| !self.tree.is_alive(o)) {
                *self.focus_slot(kind) = None;
            }
            return false;
        }

        *self.focus_slot(kind) = node;
        log::debug!("{kind:?} focus {old:?} -> {node:?}");
        let Some(owner) = node else {
            return true;
        };
        let mut gained = Event::new(EventKind::Focus(kind))
            .with_focused(true)
            .with_related(old);
        if !self.fire(owner, &mut gained) {
            return true;
        }
        log::debug!("{kind:?} focus refused by {owner:?}");
        if may_revert {
            let old = old.filter(|&o| self.tree.is_alive(o));
            self.negotiate_focus(kind, old, false);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::listener;
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;
    use understory_scene_tree::{LocalNode, NodeKind};

    type Seen = Rc<RefCell<Vec<(NodeId, bool, Option<NodeId>)>>>;

    fn two_fields() -> (Scene, NodeId, NodeId) {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene
            .tree_mut()
            .insert(Some(root), NodeKind::Leaf, LocalNode::default());
        let b = scene
            .tree_mut()
            .insert(Some(root), NodeKind::Leaf, LocalNode::default());
        (scene, a, b)
    }

    fn watch(scene: &mut Scene, node: NodeId, seen: &Seen) {
        let seen = seen.clone();
        scene.add_listener(
            node,
            listener(move |_: &mut Scene, e: &mut Event| {
                if e.target() == e.listener_actor() {
                    seen.borrow_mut()
                        .push((e.listener_actor().unwrap(), e.is_focused(), e.related()));
                }
                false
            }),
        );
    }

    fn veto(scene: &mut Scene, node: NodeId, when_focused: bool) {
        scene.add_listener(
            node,
            listener(move |_: &mut Scene, e: &mut Event| {
                if e.is_focused() == when_focused {
                    e.cancel();
                }
                false
            }),
        );
    }

    #[test]
    fn transfer_notifies_loser_then_winner() {
        let (mut scene, a, b) = two_fields();
        let seen = Seen::default();
        watch(&mut scene, a, &seen);
        watch(&mut scene, b, &seen);
        assert!(scene.set_keyboard_focus(Some(a)));
        assert!(scene.set_keyboard_focus(Some(b)));
        assert_eq!(scene.keyboard_focus(), Some(b));
        assert_eq!(
            seen.borrow().as_slice(),
            [(a, true, None), (a, false, Some(b)), (b, true, Some(a))]
        );
    }

    #[test]
    fn same_owner_is_a_silent_success() {
        let (mut scene, a, _) = two_fields();
        let seen = Seen::default();
        assert!(scene.set_keyboard_focus(Some(a)));
        watch(&mut scene, a, &seen);
        assert!(scene.set_keyboard_focus(Some(a)));
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn loser_can_keep_focus() {
        let (mut scene, a, b) = two_fields();
        assert!(scene.set_keyboard_focus(Some(a)));
        veto(&mut scene, a, false);
        let seen = Seen::default();
        watch(&mut scene, b, &seen);
        assert!(!scene.set_keyboard_focus(Some(b)));
        assert_eq!(scene.keyboard_focus(), Some(a));
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn refused_focus_reverts_to_the_old_owner() {
        let (mut scene, a, b) = two_fields();
        assert!(scene.set_keyboard_focus(Some(a)));
        veto(&mut scene, b, true);
        let seen = Seen::default();
        watch(&mut scene, a, &seen);
        assert!(!scene.set_keyboard_focus(Some(b)));
        assert_eq!(scene.keyboard_focus(), Some(a));
        // a lost focus, then got it back from b.
        assert_eq!(
            seen.borrow().as_slice(),
            [(a, false, Some(b)), (a, true, Some(b))]
        );
    }

    #[test]
    fn revert_happens_at_most_once() {
        let (mut scene, a, b) = two_fields();
        assert!(scene.set_keyboard_focus(Some(a)));
        // Neither node accepts focus: b refuses, then a refuses to take it back.
        veto(&mut scene, b, true);
        veto(&mut scene, a, true);
        assert!(!scene.set_keyboard_focus(Some(b)));
        assert_eq!(scene.keyboard_focus(), Some(a));
    }

    #[test]
    fn ancestor_can_veto_through_bubbling() {
        let (mut scene, a, _) = two_fields();
        let root = scene.root();
        veto(&mut scene, root, true);
        assert!(!scene.set_scroll_focus(Some(a)));
        assert_eq!(scene.scroll_focus(), None);
    }

    #[test]
    fn keyboard_and_scroll_are_independent() {
        let (mut scene, a, b) = two_fields();
        assert!(scene.set_keyboard_focus(Some(a)));
        assert!(scene.set_scroll_focus(Some(b)));
        assert_eq!(scene.focus(FocusKind::Keyboard), Some(a));
        assert_eq!(scene.focus(FocusKind::Scroll), Some(b));
        scene.unfocus_all();
        assert_eq!(scene.keyboard_focus(), None);
        assert_eq!(scene.scroll_focus(), None);
    }

    #[test]
    fn unfocus_clears_descendant_owners_only() {
        let mut scene = Scene::new();
        let root = scene.root();
        let panel = scene
            .tree_mut()
            .insert(Some(root), NodeKind::Container, LocalNode::default());
        let field = scene
            .tree_mut()
            .insert(Some(panel), NodeKind::Leaf, LocalNode::default());
        let other = scene
            .tree_mut()
            .insert(Some(root), NodeKind::Leaf, LocalNode::default());
        scene.set_keyboard_focus(Some(field));
        scene.set_scroll_focus(Some(other));
        scene.unfocus(panel);
        assert_eq!(scene.keyboard_focus(), None);
        assert_eq!(scene.scroll_focus(), Some(other));
    }

    #[test]
    fn target_destroyed_by_the_loser_keeps_the_old_owner() {
        let (mut scene, a, b) = two_fields();
        assert!(scene.set_keyboard_focus(Some(a)));
        scene.add_listener(
            a,
            listener(move |s: &mut Scene, e: &mut Event| {
                if !e.is_focused() {
                    s.destroy(b);
                }
                false
            }),
        );
        assert!(!scene.set_keyboard_focus(Some(b)));
        assert!(!scene.tree().is_alive(b));
        assert_eq!(scene.keyboard_focus(), Some(a));
    }

    #[test]
    fn target_and_loser_destroyed_during_the_handshake_clear_focus() {
        let mut scene = Scene::new();
        let root = scene.root();
        let panel = scene
            .tree_mut()
            .insert(Some(root), NodeKind::Container, LocalNode::default());
        let a = scene
            .tree_mut()
            .insert(Some(panel), NodeKind::Leaf, LocalNode::default());
        let b = scene
            .tree_mut()
            .insert(Some(panel), NodeKind::Leaf, LocalNode::default());
        assert!(scene.set_scroll_focus(Some(a)));
        scene.add_listener(
            a,
            listener(move |s: &mut Scene, e: &mut Event| {
                if !e.is_focused() {
                    s.tree_mut().destroy(panel);
                }
                false
            }),
        );
        assert!(!scene.set_scroll_focus(Some(b)));
        assert_eq!(scene.scroll_focus(), None);
    }

    #[test]
    #[should_panic(expected = "stale NodeId")]
    fn focusing_a_stale_node_panics() {
        let (mut scene, a, _) = two_fields();
        scene.destroy(a);
        scene.set_keyboard_focus(Some(a));
    }
}
