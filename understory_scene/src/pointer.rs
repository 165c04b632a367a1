// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-pointer tracking and enter/exit synthesis.
//!
//! Each pointer slot remembers whether it is down, its last screen position and
//! the node it was last over. The mouse has a separate slot. Once per frame,
//! [`Scene::act`] hit tests every tracked position again and fires `Exit` at the
//! node the pointer left and `Enter` at the node it reached. Released pointers
//! exit whatever they were over.

use alloc::vec;
use alloc::vec::Vec;

use kurbo::Point;
use understory_scene_tree::{NodeId, Tree};

use crate::event::{Event, EventKind, Pointer};
use crate::scene::Scene;

#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct PointerSlot {
    pub(crate) touched: bool,
    pub(crate) screen: Point,
    pub(crate) over: Option<NodeId>,
}

#[derive(Clone, Debug)]
pub(crate) struct PointerTable {
    slots: Vec<PointerSlot>,
    pub(crate) mouse: PointerSlot,
}

impl PointerTable {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            slots: vec![PointerSlot::default(); capacity],
            mouse: PointerSlot::default(),
        }
    }

    /// `None` for pointers past the tracked capacity.
    pub(crate) fn slot_mut(&mut self, pointer: Pointer) -> Option<&mut PointerSlot> {
        self.slots.get_mut(pointer)
    }

    pub(crate) fn slot(&self, pointer: Pointer) -> Option<&PointerSlot> {
        self.slots.get(pointer)
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn forget_stale(&mut self, tree: &Tree) {
        for slot in self.slots.iter_mut().chain(core::iter::once(&mut self.mouse)) {
            if slot.over.is_some_and(|n| !tree.is_alive(n)) {
                slot.over = None;
            }
        }
    }
}

impl Scene {
    /// Whether `pointer` is currently down. Untracked pointers report `false`.
    pub fn is_touched(&self, pointer: Pointer) -> bool {
        self.pointers.slot(pointer).is_some_and(|s| s.touched)
    }

    /// The node `pointer` was over at the last [`Scene::act`].
    pub fn pointer_over(&self, pointer: Pointer) -> Option<NodeId> {
        self.pointers.slot(pointer).and_then(|s| s.over)
    }

    /// The node the mouse was over at the last [`Scene::act`].
    pub fn mouse_over(&self) -> Option<NodeId> {
        self.pointers.mouse.over
    }

    pub(crate) fn update_pointer_over(&mut self) {
        for pointer in 0..self.pointers.capacity() {
            let Some(slot) = self.pointers.slot(pointer).copied() else {
                continue;
            };
            let over_last = slot.over.filter(|&n| self.tree.is_alive(n));
            let over = if slot.touched {
                self.fire_enter_and_exit(over_last, slot.screen, Some(pointer))
            } else {
                if let Some(last) = over_last {
                    let stage = self.viewport.unproject(slot.screen);
                    let mut exit = Event::new(EventKind::Exit)
                        .with_stage(stage)
                        .with_pointer(pointer)
                        .with_related(Some(last));
                    self.fire(last, &mut exit);
                }
                None
            };
            if let Some(slot) = self.pointers.slot_mut(pointer) {
                slot.over = over;
            }
        }

        if self.config.track_mouse {
            let mouse = self.pointers.mouse;
            let over_last = mouse.over.filter(|&n| self.tree.is_alive(n));
            self.pointers.mouse.over = self.fire_enter_and_exit(over_last, mouse.screen, None);
        }
    }

    fn fire_enter_and_exit(
        &mut self,
        over_last: Option<NodeId>,
        screen: Point,
        pointer: Option<Pointer>,
    ) -> Option<NodeId> {
        let stage = self.viewport.unproject(screen);
        let over = self.tree.hit_scene(stage, true);
        if over == over_last {
            return over_last;
        }
        let event = |kind, related| {
            let ev = Event::new(kind).with_stage(stage).with_related(related);
            match pointer {
                Some(p) => ev.with_pointer(p),
                None => ev,
            }
        };
        if let Some(last) = over_last {
            log::trace!("pointer {pointer:?} exits {last:?}");
            self.fire(last, &mut event(EventKind::Exit, over));
        }
        let over = over.filter(|&n| self.tree.is_alive(n))?;
        log::trace!("pointer {pointer:?} enters {over:?}");
        self.fire(over, &mut event(EventKind::Enter, over_last));
        Some(over)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::listener;
    use crate::scene::SceneConfig;
    use alloc::rc::Rc;
    use core::cell::RefCell;
    use kurbo::Size;
    use understory_scene_tree::{LocalNode, NodeKind, Touchable};

    type Seen = Rc<RefCell<Vec<(EventKind, NodeId, Option<NodeId>, Option<Pointer>)>>>;

    fn hover_scene(config: SceneConfig) -> (Scene, NodeId, NodeId, Seen) {
        let mut scene = Scene::with_config(config);
        let root = scene.root();
        scene.tree_mut().set_touchable(root, Touchable::ChildrenOnly);
        let left = scene.tree_mut().insert(
            Some(root),
            NodeKind::Leaf,
            LocalNode::with_bounds(Point::ZERO, Size::new(50.0, 50.0)),
        );
        let right = scene.tree_mut().insert(
            Some(root),
            NodeKind::Leaf,
            LocalNode::with_bounds(Point::new(50.0, 0.0), Size::new(50.0, 50.0)),
        );
        let seen = Seen::default();
        for node in [left, right] {
            let seen = seen.clone();
            scene.add_listener(
                node,
                listener(move |_: &mut Scene, e: &mut Event| {
                    if matches!(e.kind(), EventKind::Enter | EventKind::Exit) {
                        seen.borrow_mut().push((
                            e.kind(),
                            e.target().unwrap(),
                            e.related(),
                            e.pointer(),
                        ));
                    }
                    false
                }),
            );
        }
        (scene, left, right, seen)
    }

    #[test]
    fn dragging_across_nodes_exits_then_enters() {
        let (mut scene, left, right, seen) = hover_scene(SceneConfig {
            track_mouse: false,
            ..SceneConfig::default()
        });
        scene.touch_down(Point::new(10.0, 10.0), 1, 0);
        scene.act(0.0);
        assert_eq!(scene.pointer_over(1), Some(left));
        scene.act(0.0);
        scene.touch_dragged(Point::new(60.0, 10.0), 1);
        scene.act(0.0);
        assert_eq!(scene.pointer_over(1), Some(right));
        assert_eq!(
            seen.borrow().as_slice(),
            [
                (EventKind::Enter, left, None, Some(1)),
                (EventKind::Exit, left, Some(right), Some(1)),
                (EventKind::Enter, right, Some(left), Some(1)),
            ]
        );
    }

    #[test]
    fn release_exits_the_last_node() {
        let (mut scene, left, _, seen) = hover_scene(SceneConfig {
            track_mouse: false,
            ..SceneConfig::default()
        });
        scene.touch_down(Point::new(10.0, 10.0), 0, 0);
        scene.act(0.0);
        scene.touch_up(Point::new(10.0, 10.0), 0, 0);
        assert!(!scene.is_touched(0));
        scene.act(0.0);
        assert_eq!(scene.pointer_over(0), None);
        assert_eq!(
            seen.borrow().last(),
            Some(&(EventKind::Exit, left, Some(left), Some(0)))
        );
        scene.act(0.0);
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn mouse_hover_uses_its_own_slot() {
        let (mut scene, _, right, seen) = hover_scene(SceneConfig::default());
        scene.mouse_moved(Point::new(70.0, 20.0));
        scene.act(0.0);
        assert_eq!(scene.mouse_over(), Some(right));
        scene.mouse_moved(Point::new(200.0, 20.0));
        scene.act(0.0);
        assert_eq!(scene.mouse_over(), None);
        assert_eq!(
            seen.borrow().as_slice(),
            [
                (EventKind::Enter, right, None, None),
                (EventKind::Exit, right, None, None),
            ]
        );
        assert_eq!(scene.pointer_over(0), None);
    }

    #[test]
    fn untracked_pointers_still_dispatch() {
        let (mut scene, left, _, _) = hover_scene(SceneConfig {
            max_pointers: 2,
            track_mouse: false,
            ..SceneConfig::default()
        });
        let downs = Rc::new(RefCell::new(0));
        let count = downs.clone();
        scene.add_listener(
            left,
            listener(move |_: &mut Scene, e: &mut Event| {
                if e.kind() == EventKind::TouchDown {
                    *count.borrow_mut() += 1;
                }
                true
            }),
        );
        assert!(scene.touch_down(Point::new(10.0, 10.0), 5, 0));
        assert_eq!(*downs.borrow(), 1);
        assert!(!scene.is_touched(5));
        scene.act(0.0);
        assert_eq!(scene.pointer_over(5), None);
        // Touch focus still works for the untracked pointer.
        assert!(scene.touch_up(Point::new(10.0, 10.0), 5, 0));
        assert!(scene.touch_focuses().is_empty());
    }
}
