// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core tree implementation: structure, membership, coordinates, and hit testing.

use alloc::{boxed::Box, vec, vec::Vec};
use kurbo::{Affine, Point, Size, Vec2};
use smallvec::SmallVec;

use crate::transform::in_bounds;
use crate::types::{HitTest, LocalNode, NodeId, NodeKind, Touchable};

/// Ancestor chain of a node, nearest parent first.
pub type Ancestors = SmallVec<[NodeId; 8]>;

/// Retained scene tree.
///
/// The tree always owns a root [container](NodeKind::Container). Nodes can be
/// created detached and attached later; a node is *staged* while the root is
/// one of its ascendants. Every structural operation keeps the parent's child
/// list and the child's parent link in agreement.
///
/// Changes take effect immediately: there is no commit step, so a hit test
/// issued right after a mutation observes it.
///
/// ## Example
///
/// ```rust
/// use kurbo::{Point, Size};
/// use understory_scene_tree::{LocalNode, NodeKind, Tree};
///
/// let mut tree = Tree::new();
/// let panel = tree.insert(
///     Some(tree.root()),
///     NodeKind::Container,
///     LocalNode::with_bounds(Point::new(10.0, 10.0), Size::new(100.0, 100.0)),
/// );
/// let button = tree.insert(
///     Some(panel),
///     NodeKind::Leaf,
///     LocalNode::with_bounds(Point::new(5.0, 5.0), Size::new(20.0, 10.0)),
/// );
///
/// assert_eq!(tree.hit_scene(Point::new(16.0, 16.0), true), Some(button));
/// assert_eq!(tree.hit_scene(Point::new(50.0, 50.0), true), Some(panel));
/// // The root has zero size, so nothing is hit outside the panel.
/// assert_eq!(tree.hit_scene(Point::new(500.0, 500.0), true), None);
/// ```
pub struct Tree {
    /// slots
    nodes: Vec<Option<Node>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    root: NodeId,
}

impl core::fmt::Debug for Tree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        let free = self.free_list.len();
        f.debug_struct("Tree")
            .field("root", &self.root)
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &free)
            .finish_non_exhaustive()
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

struct Node {
    generation: u32,
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    local: LocalNode,
    hit_test: Option<Box<dyn HitTest>>,
    staged: bool,
}

impl Node {
    fn new(generation: u32, kind: NodeKind, local: LocalNode) -> Self {
        Self {
            generation,
            kind,
            parent: None,
            children: Vec::new(),
            local,
            hit_test: None,
            staged: false,
        }
    }
}

/// Where a child lands in its new parent's child list.
#[derive(Copy, Clone, Debug)]
enum Slot {
    End,
    At(usize),
    Before(NodeId),
    After(NodeId),
}

impl Tree {
    /// Create a tree holding only its root container.
    ///
    /// The root has zero size and is touchable, so with no children it is never
    /// hit; give it a size to make it a catch-all target.
    pub fn new() -> Self {
        let mut root_node = Node::new(1, NodeKind::Container, LocalNode::default());
        root_node.staged = true;
        Self {
            nodes: vec![Some(root_node)],
            generations: vec![1],
            free_list: Vec::new(),
            root: NodeId::new(0, 1),
        }
    }

    /// The root container. It is always alive and always staged.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Insert a new node, as the last child of `parent` or detached if `None`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is stale or a leaf.
    pub fn insert(&mut self, parent: Option<NodeId>, kind: NodeKind, local: LocalNode) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, kind, local));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation, kind, local)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        let id = NodeId::new(idx, generation);
        if let Some(p) = parent {
            self.add_child(p, id);
        }
        id
    }

    /// Append `child` to `parent`'s children, moving it from any previous parent.
    ///
    /// Adding a node to the parent it already has leaves its position unchanged.
    ///
    /// # Panics
    ///
    /// Panics if either id is stale, `parent` is a leaf, `child` is the root,
    /// or `child` is `parent` or one of its ascendants.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.attach(parent, child, Slot::End);
    }

    /// Insert `child` at `index` in `parent`'s children (clamped to the end).
    ///
    /// # Panics
    ///
    /// Same conditions as [`Tree::add_child`].
    pub fn add_child_at(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.attach(parent, child, Slot::At(index));
    }

    /// Insert `child` directly behind `before` (a current child of `parent`).
    ///
    /// # Panics
    ///
    /// Same conditions as [`Tree::add_child`], and if `before` is not a child of `parent`.
    pub fn add_child_before(&mut self, parent: NodeId, before: NodeId, child: NodeId) {
        self.attach(parent, child, Slot::Before(before));
    }

    /// Insert `child` directly in front of `after` (a current child of `parent`).
    ///
    /// # Panics
    ///
    /// Same conditions as [`Tree::add_child`], and if `after` is not a child of `parent`.
    pub fn add_child_after(&mut self, parent: NodeId, after: NodeId, child: NodeId) {
        self.attach(parent, child, Slot::After(after));
    }

    /// Detach `child` from `parent`.
    ///
    /// The child and its subtree stay alive but are no longer staged. Returns
    /// `false` if `child` is not currently a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if !self.is_alive(parent) || self.parent_of(child) != Some(parent) {
            return false;
        }
        self.unlink_parent(child, parent);
        self.set_staged_recursive(child, false);
        true
    }

    /// Detach `id` from whatever parent it has. Returns `false` if it had none.
    pub fn remove(&mut self, id: NodeId) -> bool {
        match self.parent_of(id) {
            Some(parent) => self.remove_child(parent, id),
            None => false,
        }
    }

    /// Move `id` under `new_parent` (appended), or detach it when `None`.
    ///
    /// # Panics
    ///
    /// Same conditions as [`Tree::add_child`] when `new_parent` is `Some`.
    pub fn reparent(&mut self, id: NodeId, new_parent: Option<NodeId>) {
        match new_parent {
            Some(p) => self.add_child(p, id),
            None => {
                self.remove(id);
            }
        }
    }

    /// Detach and free `id` and its whole subtree.
    ///
    /// Returns the freed ids in pre-order; all of them are stale afterwards.
    ///
    /// # Panics
    ///
    /// Panics if `id` is the root.
    pub fn destroy(&mut self, id: NodeId) -> Vec<NodeId> {
        assert!(id != self.root, "the root container cannot be destroyed");
        if !self.is_alive(id) {
            return Vec::new();
        }
        self.remove(id);
        let freed = self.subtree(id);
        for &n in &freed {
            self.nodes[n.idx()] = None;
            self.free_list.push(n.idx());
        }
        freed
    }

    /// Returns true if `id` refers to a live node.
    ///
    /// A `NodeId` is considered live if its slot exists and its generation matches
    /// the current generation stored in that slot.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node_opt(id).is_some()
    }

    /// Returns true if the root is an ascendant of (or is) `id`.
    pub fn is_staged(&self, id: NodeId) -> bool {
        self.node_opt(id).is_some_and(|n| n.staged)
    }

    /// Returns the kind of a live node.
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.node_opt(id).map(|n| n.kind)
    }

    /// Returns the parent of a node if live, or `None` for detached nodes, the root, or stale ids.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id).and_then(|n| n.parent)
    }

    /// Get the children of a node in paint order, or an empty slice if the node is stale.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.node_opt(id).map_or(&[], |n| &n.children)
    }

    /// Returns the local placement of a live node.
    pub fn local(&self, id: NodeId) -> Option<&LocalNode> {
        self.node_opt(id).map(|n| &n.local)
    }

    /// Replace the local placement of a live node.
    pub fn set_local(&mut self, id: NodeId, local: LocalNode) {
        if let Some(n) = self.node_opt_mut(id) {
            n.local = local;
        }
    }

    /// Update the position.
    pub fn set_position(&mut self, id: NodeId, position: Point) {
        if let Some(n) = self.node_opt_mut(id) {
            n.local.position = position;
        }
    }

    /// Update the size.
    pub fn set_size(&mut self, id: NodeId, size: Size) {
        if let Some(n) = self.node_opt_mut(id) {
            n.local.size = size;
        }
    }

    /// Update the scale/rotation pivot.
    pub fn set_origin(&mut self, id: NodeId, origin: Point) {
        if let Some(n) = self.node_opt_mut(id) {
            n.local.origin = origin;
        }
    }

    /// Update the scale.
    pub fn set_scale(&mut self, id: NodeId, scale: Vec2) {
        if let Some(n) = self.node_opt_mut(id) {
            n.local.scale = scale;
        }
    }

    /// Update the rotation, in degrees.
    pub fn set_rotation(&mut self, id: NodeId, degrees: f64) {
        if let Some(n) = self.node_opt_mut(id) {
            n.local.rotation = degrees;
        }
    }

    /// Add `degrees` to the current rotation.
    pub fn rotate_by(&mut self, id: NodeId, degrees: f64) {
        if let Some(n) = self.node_opt_mut(id) {
            n.local.rotation += degrees;
        }
    }

    /// Update visibility.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        if let Some(n) = self.node_opt_mut(id) {
            n.local.visible = visible;
        }
    }

    /// Update touchability.
    pub fn set_touchable(&mut self, id: NodeId, touchable: Touchable) {
        if let Some(n) = self.node_opt_mut(id) {
            n.local.touchable = touchable;
        }
    }

    /// Install (or clear) a custom hit area for a node.
    pub fn set_hit_test(&mut self, id: NodeId, hit_test: Option<Box<dyn HitTest>>) {
        if let Some(n) = self.node_opt_mut(id) {
            n.hit_test = hit_test;
        }
    }

    /// Collect the ancestors of `id`, from its parent up to its top-most ascendant.
    pub fn ancestors(&self, id: NodeId) -> Ancestors {
        let mut out = Ancestors::new();
        let mut current = self.parent_of(id);
        while let Some(p) = current {
            out.push(p);
            current = self.parent_of(p);
        }
        out
    }

    /// Returns true if `id` is `ascendant` or lies somewhere below it.
    pub fn is_descendant_of(&self, id: NodeId, ascendant: NodeId) -> bool {
        let mut current = Some(id).filter(|&n| self.is_alive(n));
        while let Some(n) = current {
            if n == ascendant {
                return true;
            }
            current = self.parent_of(n);
        }
        false
    }

    /// Returns true if `id` is `descendant` or one of its ascendants.
    pub fn is_ascendant_of(&self, id: NodeId, descendant: NodeId) -> bool {
        self.is_descendant_of(descendant, id)
    }

    /// Collect `id` and all of its descendants in pre-order (paint order).
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.is_alive(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            out.push(n);
            // Reverse so that children are visited in the order they are stored.
            stack.extend(self.node(n).children.iter().rev().copied());
        }
        out
    }

    /// Index of `id` in its parent's children, or `None` for unparented or stale ids.
    pub fn z_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent_of(id)?;
        self.node(parent).children.iter().position(|&c| c == id)
    }

    /// Move `id` to `index` among its siblings; indices past the end move it to the front.
    pub fn set_z_index(&mut self, id: NodeId, index: usize) {
        let Some(parent) = self.parent_of(id) else {
            return;
        };
        let children = &mut self.node_mut(parent).children;
        let Some(current) = children.iter().position(|&c| c == id) else {
            return;
        };
        let index = index.min(children.len() - 1);
        if index == current {
            return;
        }
        children.remove(current);
        children.insert(index, id);
    }

    /// Move `id` in front of all its siblings.
    pub fn to_front(&mut self, id: NodeId) {
        self.set_z_index(id, usize::MAX);
    }

    /// Move `id` behind all its siblings.
    pub fn to_back(&mut self, id: NodeId) {
        self.set_z_index(id, 0);
    }

    /// Map a point from `id`'s local space into its parent's space.
    pub fn local_to_parent(&self, id: NodeId, local: Point) -> Option<Point> {
        self.local(id).map(|l| l.local_to_parent(local))
    }

    /// Map a point from `id`'s parent space into its local space.
    pub fn parent_to_local(&self, id: NodeId, parent: Point) -> Option<Point> {
        self.local(id).map(|l| l.parent_to_local(parent))
    }

    /// Map a point from `id`'s local space into the space of `ascendant`.
    ///
    /// The forward transform of every node from `id` up to (but excluding)
    /// `ascendant` is applied. With `None`, or an `ascendant` that is not
    /// actually above `id`, all transforms up to and including the top-most
    /// ascendant are applied, which for a staged node is scene space.
    pub fn local_to_ascendant(
        &self,
        id: NodeId,
        ascendant: Option<NodeId>,
        local: Point,
    ) -> Option<Point> {
        let mut point = local;
        let mut current = Some(id);
        while let Some(n) = current {
            let node = self.node_opt(n)?;
            point = node.local.local_to_parent(point);
            current = node.parent;
            if current == ascendant {
                break;
            }
        }
        Some(point)
    }

    /// Map a point from `id`'s local space into scene space.
    pub fn local_to_scene(&self, id: NodeId, local: Point) -> Option<Point> {
        self.local_to_ascendant(id, None, local)
    }

    /// Map a scene-space point into `id`'s local space.
    pub fn scene_to_local(&self, id: NodeId, scene: Point) -> Option<Point> {
        let node = self.node_opt(id)?;
        let mut point = scene;
        for &a in self.ancestors(id).iter().rev() {
            point = self.node(a).local.parent_to_local(point);
        }
        Some(node.local.parent_to_local(point))
    }

    /// The composed local → scene transform of `id`.
    pub fn scene_transform(&self, id: NodeId) -> Option<Affine> {
        let mut affine = self.local(id)?.transform();
        for &a in &self.ancestors(id) {
            affine = self.node(a).local.transform() * affine;
        }
        Some(affine)
    }

    /// Return the front-most node under `local` (given in `id`'s local space).
    ///
    /// Children are tested from last to first, each with the point mapped into
    /// its own local space, before `id` itself. Invisible nodes are skipped
    /// together with their subtrees. When `touchable` is true, a
    /// [`Touchable::Disabled`] node rejects its whole subtree and a
    /// [`Touchable::ChildrenOnly`] node is never returned itself. First match
    /// wins.
    pub fn hit(&self, id: NodeId, local: Point, touchable: bool) -> Option<NodeId> {
        let node = self.node_opt(id)?;
        if !node.local.visible {
            return None;
        }
        if touchable && node.local.touchable == Touchable::Disabled {
            return None;
        }
        for &child in node.children.iter().rev() {
            let child_node = self.node(child);
            if !child_node.local.visible {
                continue;
            }
            let child_point = child_node.local.parent_to_local(local);
            if let Some(hit) = self.hit(child, child_point, touchable) {
                return Some(hit);
            }
        }
        if touchable && node.local.touchable != Touchable::Enabled {
            return None;
        }
        let inside = match &node.hit_test {
            Some(custom) => custom.contains(local, node.local.size),
            None => in_bounds(local, node.local.size),
        };
        inside.then_some(id)
    }

    /// Hit test a scene-space point against the whole staged tree.
    pub fn hit_scene(&self, scene: Point, touchable: bool) -> Option<NodeId> {
        let local = self.node(self.root).local.parent_to_local(scene);
        self.hit(self.root, local, touchable)
    }
}

impl Tree {
    // --- internals ---

    fn node(&self, id: NodeId) -> &Node {
        self.node_opt(id).expect("dangling NodeId")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.node_opt_mut(id).expect("dangling NodeId")
    }

    fn node_opt(&self, id: NodeId) -> Option<&Node> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }

    fn node_opt_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, slot: Slot) {
        assert!(self.is_alive(parent), "parent is a stale NodeId");
        assert!(self.is_alive(child), "child is a stale NodeId");
        assert!(
            self.node(parent).kind == NodeKind::Container,
            "only containers can have children"
        );
        assert!(child != self.root, "the root container cannot become a child");
        assert!(
            !self.is_descendant_of(parent, child),
            "a node cannot be added below itself"
        );

        if let Some(old) = self.node(child).parent {
            if old == parent && matches!(slot, Slot::End) {
                return;
            }
            self.unlink_parent(child, old);
        }

        let siblings = &self.node(parent).children;
        let index = match slot {
            Slot::End => siblings.len(),
            Slot::At(i) => i.min(siblings.len()),
            Slot::Before(before) => siblings
                .iter()
                .position(|&c| c == before)
                .expect("`before` must be a child of `parent`"),
            Slot::After(after) => {
                siblings
                    .iter()
                    .position(|&c| c == after)
                    .expect("`after` must be a child of `parent`")
                    + 1
            }
        };
        self.node_mut(parent).children.insert(index, child);
        self.node_mut(child).parent = Some(parent);
        let staged = self.node(parent).staged;
        self.set_staged_recursive(child, staged);
    }

    fn unlink_parent(&mut self, id: NodeId, parent: NodeId) {
        let p = self.node_mut(parent);
        p.children.retain(|c| *c != id);
        self.node_mut(id).parent = None;
    }

    fn set_staged_recursive(&mut self, id: NodeId, staged: bool) {
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            let node = self.node_mut(n);
            if node.staged == staged && n != id {
                // Subtrees below an unchanged node already agree.
                continue;
            }
            node.staged = staged;
            stack.extend(node.children.iter().copied());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn bounds(x: f64, y: f64, w: f64, h: f64) -> LocalNode {
        LocalNode::with_bounds(Point::new(x, y), Size::new(w, h))
    }

    /// Root → Panel → Button, all translation-only.
    fn three_level() -> (Tree, NodeId, NodeId) {
        let mut tree = Tree::new();
        let root = tree.root();
        let panel = tree.insert(Some(root), NodeKind::Container, bounds(10.0, 10.0, 100.0, 100.0));
        let button = tree.insert(Some(panel), NodeKind::Leaf, bounds(20.0, 20.0, 30.0, 10.0));
        (tree, panel, button)
    }

    #[test]
    fn insert_links_both_sides() {
        let (tree, panel, button) = three_level();
        assert_eq!(tree.parent_of(button), Some(panel));
        assert_eq!(tree.children_of(panel), &[button]);
        assert_eq!(tree.parent_of(panel), Some(tree.root()));
        assert!(tree.is_staged(button));
    }

    #[test]
    fn detached_insert_is_not_staged_until_added() {
        let mut tree = Tree::new();
        let group = tree.insert(None, NodeKind::Container, LocalNode::default());
        let leaf = tree.insert(Some(group), NodeKind::Leaf, LocalNode::default());
        assert!(!tree.is_staged(group));
        assert!(!tree.is_staged(leaf));

        tree.add_child(tree.root(), group);
        assert!(tree.is_staged(group));
        assert!(tree.is_staged(leaf), "staging must propagate to the subtree");

        assert!(tree.remove(group));
        assert!(!tree.is_staged(leaf), "unstaging must propagate to the subtree");
        assert_eq!(tree.parent_of(leaf), Some(group), "subtree structure survives removal");
        assert!(tree.children_of(tree.root()).is_empty());
    }

    #[test]
    fn add_child_moves_between_parents() {
        let mut tree = Tree::new();
        let root = tree.root();
        let a = tree.insert(Some(root), NodeKind::Container, LocalNode::default());
        let b = tree.insert(Some(root), NodeKind::Container, LocalNode::default());
        let leaf = tree.insert(Some(a), NodeKind::Leaf, LocalNode::default());

        tree.add_child(b, leaf);
        assert!(tree.children_of(a).is_empty());
        assert_eq!(tree.children_of(b), &[leaf]);
        assert_eq!(tree.parent_of(leaf), Some(b));
    }

    #[test]
    fn re_adding_to_same_parent_keeps_position() {
        let mut tree = Tree::new();
        let root = tree.root();
        let a = tree.insert(Some(root), NodeKind::Leaf, LocalNode::default());
        let b = tree.insert(Some(root), NodeKind::Leaf, LocalNode::default());
        tree.add_child(root, a);
        assert_eq!(tree.children_of(root), &[a, b]);
    }

    #[test]
    fn positional_inserts() {
        let mut tree = Tree::new();
        let root = tree.root();
        let a = tree.insert(Some(root), NodeKind::Leaf, LocalNode::default());
        let b = tree.insert(Some(root), NodeKind::Leaf, LocalNode::default());
        let c = tree.insert(None, NodeKind::Leaf, LocalNode::default());
        let d = tree.insert(None, NodeKind::Leaf, LocalNode::default());
        let e = tree.insert(None, NodeKind::Leaf, LocalNode::default());

        tree.add_child_before(root, b, c);
        assert_eq!(tree.children_of(root), &[a, c, b]);
        tree.add_child_after(root, a, d);
        assert_eq!(tree.children_of(root), &[a, d, c, b]);
        tree.add_child_at(root, 99, e);
        assert_eq!(tree.children_of(root), &[a, d, c, b, e]);
        // Moving within the same parent.
        tree.add_child_at(root, 0, b);
        assert_eq!(tree.children_of(root), &[b, a, d, c, e]);
    }

    #[test]
    #[should_panic(expected = "only containers can have children")]
    fn leaf_cannot_hold_children() {
        let (mut tree, _panel, button) = three_level();
        let _ = tree.insert(Some(button), NodeKind::Leaf, LocalNode::default());
    }

    #[test]
    #[should_panic(expected = "a node cannot be added below itself")]
    fn cycles_are_rejected() {
        let mut tree = Tree::new();
        let a = tree.insert(Some(tree.root()), NodeKind::Container, LocalNode::default());
        let b = tree.insert(Some(a), NodeKind::Container, LocalNode::default());
        tree.add_child(b, a);
    }

    #[test]
    fn descendant_and_ascendant_queries() {
        let (tree, panel, button) = three_level();
        let root = tree.root();
        assert!(tree.is_descendant_of(button, root));
        assert!(tree.is_descendant_of(button, button));
        assert!(!tree.is_descendant_of(panel, button));
        assert!(tree.is_ascendant_of(root, button));
        assert!(!tree.is_ascendant_of(button, panel));
        assert_eq!(tree.ancestors(button).as_slice(), &[panel, root]);
    }

    #[test]
    fn destroy_frees_subtree_and_reuses_slots() {
        let (mut tree, panel, button) = three_level();
        let freed = tree.destroy(panel);
        assert_eq!(freed, vec![panel, button]);
        assert!(!tree.is_alive(panel));
        assert!(!tree.is_alive(button));
        assert!(tree.children_of(tree.root()).is_empty());

        let fresh = tree.insert(Some(tree.root()), NodeKind::Leaf, LocalNode::default());
        assert!(tree.is_alive(fresh));
        assert!(fresh != panel && fresh != button, "stale ids never alias new nodes");
        assert!(tree.parent_of(button).is_none());
    }

    #[test]
    fn z_order_operations() {
        let mut tree = Tree::new();
        let root = tree.root();
        let a = tree.insert(Some(root), NodeKind::Leaf, LocalNode::default());
        let b = tree.insert(Some(root), NodeKind::Leaf, LocalNode::default());
        let c = tree.insert(Some(root), NodeKind::Leaf, LocalNode::default());
        assert_eq!(tree.z_index(b), Some(1));
        tree.to_front(a);
        assert_eq!(tree.children_of(root), &[b, c, a]);
        tree.to_back(c);
        assert_eq!(tree.children_of(root), &[c, b, a]);
        tree.set_z_index(a, 1);
        assert_eq!(tree.children_of(root), &[c, a, b]);
        assert_eq!(tree.z_index(root), None);
    }

    #[test]
    fn hit_prefers_front_most_child() {
        let mut tree = Tree::new();
        let root = tree.root();
        let back = tree.insert(Some(root), NodeKind::Leaf, bounds(0.0, 0.0, 50.0, 50.0));
        let front = tree.insert(Some(root), NodeKind::Leaf, bounds(25.0, 25.0, 50.0, 50.0));
        assert_eq!(tree.hit_scene(Point::new(30.0, 30.0), true), Some(front));
        assert_eq!(tree.hit_scene(Point::new(10.0, 10.0), true), Some(back));
        assert_eq!(
            tree.hit_scene(Point::new(30.0, 30.0), true),
            Some(front),
            "hit testing is idempotent"
        );
        tree.to_front(back);
        assert_eq!(tree.hit_scene(Point::new(30.0, 30.0), true), Some(back));
    }

    #[test]
    fn hit_descends_through_nested_transforms() {
        let mut tree = Tree::new();
        let panel = tree.insert(
            Some(tree.root()),
            NodeKind::Container,
            LocalNode {
                position: Point::new(100.0, 100.0),
                size: Size::new(100.0, 100.0),
                rotation: 90.0,
                ..LocalNode::default()
            },
        );
        let button = tree.insert(
            Some(panel),
            NodeKind::Leaf,
            LocalNode {
                position: Point::new(10.0, 0.0),
                size: Size::new(20.0, 10.0),
                scale: Vec2::new(2.0, 2.0),
                ..LocalNode::default()
            },
        );
        // Button local (5, 5) → panel (20, 10) → scene (90, 120) after the 90° turn.
        let scene = tree.local_to_scene(button, Point::new(5.0, 5.0)).unwrap();
        assert!((scene - Point::new(90.0, 120.0)).hypot2() < 1e-18);
        assert_eq!(tree.hit_scene(scene, true), Some(button));
        let back = tree.scene_to_local(button, scene).unwrap();
        assert!((back - Point::new(5.0, 5.0)).hypot2() < 1e-18);
        let affine = tree.scene_transform(button).unwrap();
        assert!((affine * Point::new(5.0, 5.0) - scene).hypot2() < 1e-18);
    }

    #[test]
    fn local_to_ascendant_stops_below_ascendant() {
        let (tree, panel, button) = three_level();
        let in_panel = tree
            .local_to_ascendant(button, Some(panel), Point::new(1.0, 1.0))
            .unwrap();
        assert_eq!(in_panel, Point::new(21.0, 21.0));
        let in_scene = tree.local_to_scene(button, Point::new(1.0, 1.0)).unwrap();
        assert_eq!(in_scene, Point::new(31.0, 31.0));
    }

    #[test]
    fn invisible_subtrees_are_skipped() {
        let (mut tree, panel, button) = three_level();
        let p = Point::new(35.0, 35.0);
        assert_eq!(tree.hit_scene(p, true), Some(button));
        tree.set_visible(panel, false);
        assert_eq!(tree.hit_scene(p, true), None);
        assert_eq!(tree.hit_scene(p, false), None, "visibility applies regardless of touchability");
        tree.set_visible(panel, true);
        tree.set_visible(button, false);
        assert_eq!(tree.hit_scene(p, true), Some(panel));
    }

    #[test]
    fn touchability_modes() {
        let (mut tree, panel, button) = three_level();
        let on_button = Point::new(35.0, 35.0);
        let on_panel = Point::new(80.0, 80.0);

        tree.set_touchable(panel, Touchable::ChildrenOnly);
        assert_eq!(tree.hit_scene(on_button, true), Some(button));
        assert_eq!(tree.hit_scene(on_panel, true), None);
        assert_eq!(tree.hit_scene(on_panel, false), Some(panel));

        tree.set_touchable(panel, Touchable::Disabled);
        assert_eq!(tree.hit_scene(on_button, true), None);
        assert_eq!(tree.hit_scene(on_button, false), Some(button));

        tree.set_touchable(panel, Touchable::Enabled);
        tree.set_touchable(button, Touchable::Disabled);
        assert_eq!(tree.hit_scene(on_button, true), Some(panel));
    }

    #[test]
    fn custom_hit_test_replaces_bounds() {
        let (mut tree, _panel, button) = three_level();
        // Only the left half of the button is interactive.
        tree.set_hit_test(
            button,
            Some(Box::new(|p: Point, size: Size| {
                p.x >= 0.0 && p.x < size.width / 2.0 && p.y >= 0.0 && p.y < size.height
            })),
        );
        let left = Point::new(32.0, 35.0);
        let right = Point::new(55.0, 35.0);
        assert_eq!(tree.hit_scene(left, true), Some(button));
        assert_ne!(tree.hit_scene(right, true), Some(button));
    }

    #[test]
    fn subtree_is_pre_order() {
        let mut tree = Tree::new();
        let root = tree.root();
        let a = tree.insert(Some(root), NodeKind::Container, LocalNode::default());
        let a1 = tree.insert(Some(a), NodeKind::Leaf, LocalNode::default());
        let b = tree.insert(Some(root), NodeKind::Leaf, LocalNode::default());
        assert_eq!(tree.subtree(root), vec![root, a, a1, b]);
    }
}
