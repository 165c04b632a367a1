// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The scene: a tree plus listeners, focus state, and input entry points.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;
use kurbo::{Point, Vec2};
use understory_scene_tree::{NodeId, Touchable, Tree};

use crate::event::{Button, Event, EventKind, Pointer};
use crate::listener::Handlers;
use crate::pointer::PointerTable;
use crate::touch_focus::TouchFocusRegistry;
use crate::viewport::{AffineViewport, Viewport};

/// Tunables for a [`Scene`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneConfig {
    /// Number of pointer slots tracked for enter/exit. Higher pointer indices
    /// still dispatch touch events but never produce enter/exit.
    pub max_pointers: usize,
    /// Synthesize enter/exit for the mouse from [`Scene::mouse_moved`] positions.
    pub track_mouse: bool,
    /// Upper bound for the `delta` passed to actions, in seconds.
    pub max_frame_delta: Option<f64>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            max_pointers: 20,
            track_mouse: true,
            max_frame_delta: Some(1.0 / 30.0),
        }
    }
}

/// A retained 2D scene that routes input to listeners on its nodes.
///
/// The scene owns a [`Tree`] and keeps all per-node interaction state
/// (listeners, actions) keyed by [`NodeId`]. Hosts feed raw input through the
/// entry points ([`Scene::touch_down`], [`Scene::mouse_moved`], [`Scene::key_down`], …)
/// and call [`Scene::act`] once per frame.
///
/// Structural changes that should drop interaction state go through the scene
/// ([`Scene::remove`], [`Scene::destroy`], [`Scene::clear`]); direct edits through
/// [`Scene::tree_mut`] send no focus events, and [`Scene::act`] later drops the
/// state of nodes destroyed that way.
pub struct Scene {
    pub(crate) tree: Tree,
    pub(crate) handlers: HashMap<NodeId, Handlers>,
    pub(crate) viewport: Box<dyn Viewport>,
    pub(crate) config: SceneConfig,
    pub(crate) pointers: PointerTable,
    pub(crate) touch_focus: TouchFocusRegistry,
    pub(crate) keyboard_focus: Option<NodeId>,
    pub(crate) scroll_focus: Option<NodeId>,
    /// Node whose actions are running, and whether they were cleared meanwhile.
    pub(crate) acting: Option<(NodeId, bool)>,
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("tree", &self.tree)
            .field("nodes_with_handlers", &self.handlers.len())
            .field("config", &self.config)
            .field("touch_focus", &self.touch_focus.as_slice())
            .field("keyboard_focus", &self.keyboard_focus)
            .field("scroll_focus", &self.scroll_focus)
            .finish_non_exhaustive()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// An empty scene with an identity viewport and default configuration.
    pub fn new() -> Self {
        Self::with_config(SceneConfig::default())
    }

    /// An empty scene with an identity viewport.
    pub fn with_config(config: SceneConfig) -> Self {
        Self::with_viewport(AffineViewport::default(), config)
    }

    /// An empty scene mapping host input through `viewport`.
    pub fn with_viewport(viewport: impl Viewport + 'static, config: SceneConfig) -> Self {
        Self {
            tree: Tree::new(),
            handlers: HashMap::new(),
            viewport: Box::new(viewport),
            config,
            pointers: PointerTable::new(config.max_pointers),
            touch_focus: TouchFocusRegistry::default(),
            keyboard_focus: None,
            scroll_focus: None,
            acting: None,
        }
    }

    /// The root container.
    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    /// The node tree.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Mutable access to the node tree.
    ///
    /// Edits made here bypass the scene: removing a node does not clear its focus,
    /// and destroying one leaves its listeners, actions and touch focuses in place
    /// until the next [`Scene::act`] drops them. Prefer [`Scene::remove`] and
    /// [`Scene::destroy`].
    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    /// Configuration in use.
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Replace the viewport.
    pub fn set_viewport(&mut self, viewport: impl Viewport + 'static) {
        self.viewport = Box::new(viewport);
    }

    /// Screen → stage through the viewport.
    pub fn screen_to_stage(&self, screen: Point) -> Point {
        self.viewport.unproject(screen)
    }

    /// Stage → screen through the viewport.
    pub fn stage_to_screen(&self, stage: Point) -> Point {
        self.viewport.project(stage)
    }

    /// Front-most node under a stage point; see [`Tree::hit_scene`].
    pub fn hit(&self, stage: Point, touchable: bool) -> Option<NodeId> {
        self.tree.hit_scene(stage, touchable)
    }

    /// Append `node` to the root container.
    pub fn add(&mut self, node: NodeId) {
        let root = self.tree.root();
        self.tree.add_child(root, node);
    }

    /// Detach `node` from its parent after clearing any focus held in its subtree.
    ///
    /// The node stays alive and can be added back later. Returns `true` if it had a parent.
    pub fn remove(&mut self, node: NodeId) -> bool {
        if !self.tree.is_alive(node) {
            return false;
        }
        self.unfocus(node);
        self.tree.remove(node)
    }

    /// Destroy `node` and its subtree, dropping their focus, listeners and actions.
    ///
    /// Returns the freed ids.
    ///
    /// # Panics
    ///
    /// Panics if `node` is the root.
    pub fn destroy(&mut self, node: NodeId) -> Vec<NodeId> {
        assert!(node != self.tree.root(), "the root container cannot be destroyed");
        if !self.tree.is_alive(node) {
            return Vec::new();
        }
        self.unfocus(node);
        let freed = self.tree.destroy(node);
        for id in &freed {
            self.handlers.remove(id);
        }
        self.forget_stale_focus();
        self.pointers.forget_stale(&self.tree);
        freed
    }

    /// Clear keyboard and scroll focus held by nodes that no longer exist.
    fn forget_stale_focus(&mut self) {
        let tree = &self.tree;
        for slot in [&mut self.keyboard_focus, &mut self.scroll_focus] {
            if slot.is_some_and(|n| !tree.is_alive(n)) {
                *slot = None;
            }
        }
    }

    /// Drop interaction state left behind by nodes destroyed through
    /// [`Scene::tree_mut`]. Stale touch focuses are dropped without a cancel event.
    fn purge_stale(&mut self) {
        let tree = &self.tree;
        self.handlers.retain(|id, _| tree.is_alive(*id));
        let dropped = self.touch_focus.forget_stale(tree);
        if dropped > 0 {
            log::debug!("dropped {dropped} touch focuses of destroyed nodes");
        }
        self.forget_stale_focus();
        self.pointers.forget_stale(&self.tree);
    }

    /// Drop all focus and destroy every child of the root.
    pub fn clear(&mut self) {
        self.unfocus_all();
        let children: Vec<_> = self.tree.children_of(self.tree.root()).to_vec();
        for child in children {
            self.destroy(child);
        }
    }

    /// Advance one frame.
    ///
    /// Drops state left by nodes destroyed through [`Scene::tree_mut`], refreshes
    /// enter/exit for every tracked pointer and the mouse, then runs the
    /// actions of every node in the scene in paint order. `delta` is clamped to
    /// [`SceneConfig::max_frame_delta`].
    pub fn act(&mut self, delta: f64) {
        let delta = match self.config.max_frame_delta {
            Some(max) => delta.min(max),
            None => delta,
        };
        self.purge_stale();
        self.update_pointer_over();
        self.run_actions(delta);
    }

    fn run_actions(&mut self, delta: f64) {
        for node in self.tree.subtree(self.tree.root()) {
            let Some(h) = self.handlers.get_mut(&node) else {
                continue;
            };
            if h.actions.is_empty() {
                continue;
            }
            let mut running = core::mem::take(&mut h.actions);
            let outer = self.acting.replace((node, false));
            let cleared = |scene: &Self| scene.acting.is_some_and(|(_, cleared)| cleared);
            running.retain_mut(|action| !cleared(self) && !action.act(delta, node, self));
            let cleared = cleared(self);
            self.acting = outer;
            if cleared || !self.tree.is_alive(node) {
                continue;
            }
            let h = self.handlers.entry(node).or_default();
            let added = core::mem::replace(&mut h.actions, running);
            h.actions.extend(added);
        }
    }

    /// A pointer went down at `screen`.
    ///
    /// Fires a touch-down at the hit node, or at the root when nothing is hit and the
    /// root itself is touchable. Returns `true` if the event was handled. Points outside
    /// the viewport are ignored.
    pub fn touch_down(&mut self, screen: Point, pointer: Pointer, button: Button) -> bool {
        if !self.viewport.contains(screen) {
            return false;
        }
        match self.pointers.slot_mut(pointer) {
            Some(slot) => {
                slot.touched = true;
                slot.screen = screen;
            }
            None => log::debug!(
                "pointer {pointer} is past the {} tracked slots; no enter/exit for it",
                self.pointers.capacity()
            ),
        }
        let stage = self.viewport.unproject(screen);
        let mut event = Event::new(EventKind::TouchDown)
            .with_stage(stage)
            .with_pointer(pointer)
            .with_button(button);
        let target = self.tree.hit_scene(stage, true).or_else(|| {
            let root = self.tree.root();
            self.tree
                .local(root)
                .is_some_and(|l| l.touchable == Touchable::Enabled)
                .then_some(root)
        });
        if let Some(target) = target {
            self.fire(target, &mut event);
        }
        event.is_handled()
    }

    /// A pointer moved to `screen` while down. Delivered to the touch focuses of `pointer`.
    pub fn touch_dragged(&mut self, screen: Point, pointer: Pointer) -> bool {
        if let Some(slot) = self.pointers.slot_mut(pointer) {
            slot.screen = screen;
        }
        self.pointers.mouse.screen = screen;
        if self.touch_focus.is_empty() {
            return false;
        }
        let stage = self.viewport.unproject(screen);
        self.dispatch_touch_dragged(pointer, stage)
    }

    /// A pointer went up at `screen`. Delivered to, and clears, the matching touch focuses.
    pub fn touch_up(&mut self, screen: Point, pointer: Pointer, button: Button) -> bool {
        if let Some(slot) = self.pointers.slot_mut(pointer) {
            slot.touched = false;
            slot.screen = screen;
        }
        if self.touch_focus.is_empty() {
            return false;
        }
        let stage = self.viewport.unproject(screen);
        self.dispatch_touch_up(pointer, button, stage)
    }

    /// The mouse moved to `screen` with no button down.
    ///
    /// Fires at the front-most touchable node under the mouse, or the root.
    pub fn mouse_moved(&mut self, screen: Point) -> bool {
        if !self.viewport.contains(screen) {
            return false;
        }
        self.pointers.mouse.screen = screen;
        let stage = self.viewport.unproject(screen);
        let mut event = Event::new(EventKind::MouseMoved).with_stage(stage);
        let target = self
            .tree
            .hit_scene(stage, true)
            .unwrap_or_else(|| self.tree.root());
        self.fire(target, &mut event);
        event.is_handled()
    }

    /// The mouse wheel scrolled by `amount`. Fires at the scroll focus, or the root.
    pub fn scrolled(&mut self, amount: Vec2) -> bool {
        let stage = self.viewport.unproject(self.pointers.mouse.screen);
        let mut event = Event::new(EventKind::Scrolled)
            .with_stage(stage)
            .with_scroll(amount);
        let target = self.live_or_root(self.scroll_focus);
        self.fire(target, &mut event);
        event.is_handled()
    }

    /// A key was pressed. Fires at the keyboard focus, or the root.
    pub fn key_down(&mut self, key_code: u32) -> bool {
        self.key_event(Event::new(EventKind::KeyDown).with_key_code(key_code))
    }

    /// A key was released. Fires at the keyboard focus, or the root.
    pub fn key_up(&mut self, key_code: u32) -> bool {
        self.key_event(Event::new(EventKind::KeyUp).with_key_code(key_code))
    }

    /// A character was typed. Fires at the keyboard focus, or the root.
    pub fn key_typed(&mut self, character: char) -> bool {
        self.key_event(Event::new(EventKind::KeyTyped).with_character(character))
    }

    fn key_event(&mut self, mut event: Event) -> bool {
        let target = self.live_or_root(self.keyboard_focus);
        self.fire(target, &mut event);
        event.is_handled()
    }

    fn live_or_root(&self, node: Option<NodeId>) -> NodeId {
        node.filter(|&n| self.tree.is_alive(n))
            .unwrap_or_else(|| self.tree.root())
    }
}
