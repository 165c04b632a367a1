// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the scene tree: node identifiers, kinds, touchability, and local placement.

use kurbo::{Point, Size, Vec2};

/// Identifier for a node in the tree (generational).
///
/// A `NodeId` stays valid until the node is [destroyed](crate::Tree::destroy).
/// Slots are reused afterwards, but with a bumped generation, so a stale id
/// never aliases a newer node.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Whether a node is a leaf or a container of other nodes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A node that never has children.
    Leaf,
    /// A node owning an ordered sequence of children.
    ///
    /// Child order is paint order; the last child is front-most and is hit tested first.
    Container,
}

/// How a node participates in touch hit testing.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Touchable {
    /// The node and its descendants can be hit.
    #[default]
    Enabled,
    /// Neither the node nor any descendant can be hit.
    Disabled,
    /// Descendants can be hit, but the node itself is never a hit target.
    ChildrenOnly,
}

/// Local placement and interaction state of a node.
///
/// All values are expressed in the parent's coordinate space except `origin`,
/// which is in the node's own local space and is the pivot for scale and
/// rotation.
#[derive(Clone, Debug, PartialEq)]
pub struct LocalNode {
    /// Position of the node's local `(0, 0)` in parent space (before scale and rotation).
    pub position: Point,
    /// Size of the node's default hit area, `[0, width) × [0, height)` in local space.
    pub size: Size,
    /// Pivot for scale and rotation, in local space.
    pub origin: Point,
    /// Non-uniform scale around `origin`.
    pub scale: Vec2,
    /// Counter-clockwise rotation around `origin`, in degrees.
    pub rotation: f64,
    /// Invisible nodes and their subtrees are skipped by hit testing.
    pub visible: bool,
    /// Touch participation; see [`Touchable`].
    pub touchable: Touchable,
}

impl Default for LocalNode {
    fn default() -> Self {
        Self {
            position: Point::ZERO,
            size: Size::ZERO,
            origin: Point::ZERO,
            scale: Vec2::new(1.0, 1.0),
            rotation: 0.0,
            visible: true,
            touchable: Touchable::Enabled,
        }
    }
}

impl LocalNode {
    /// A node at `position` with the given `size` and otherwise default placement.
    pub fn with_bounds(position: Point, size: Size) -> Self {
        Self {
            position,
            size,
            ..Self::default()
        }
    }
}

/// Custom hit area for a node.
///
/// Widgets whose interactive shape is not their bounding rectangle install one
/// of these with [`Tree::set_hit_test`](crate::Tree::set_hit_test). Visibility
/// and touchability are still enforced by the tree before this is consulted.
pub trait HitTest {
    /// Returns `true` if `local` (in the node's local space) is inside the hit area.
    fn contains(&self, local: Point, size: Size) -> bool;
}

impl<F> HitTest for F
where
    F: Fn(Point, Size) -> bool,
{
    fn contains(&self, local: Point, size: Size) -> bool {
        self(local, size)
    }
}
