// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Scene Tree: a retained-mode 2D node tree with local transforms and hit testing.
//!
//! - Represents a hierarchy of leaves and containers, each placed with a position, size,
//!   origin, scale, and rotation relative to its parent.
//! - Converts points between a node's local space, its parent's space, any ascendant's space,
//!   and scene space.
//! - Finds the front-most visible, touchable node under a point.
//!
//! It is the structural half of an interactive scene. Event propagation, touch focus, and
//! keyboard/scroll focus live in `understory_scene`, which stores its per-node state keyed by
//! [`NodeId`].
//!
//! ## Ownership
//!
//! The [`Tree`] owns every node in a generational arena. Containers own their children; a
//! node refers to its parent only through a [`NodeId`], never by owning it. Structural
//! operations ([`Tree::add_child`], [`Tree::remove_child`], [`Tree::reparent`]) update both
//! sides of the parent/child relation before returning.
//!
//! ## Coordinate spaces
//!
//! Each node maps local → parent by translating to its origin, scaling, rotating
//! (counter-clockwise, degrees), translating back, and offsetting by its position. See
//! [`LocalNode::local_to_parent`] and [`LocalNode::parent_to_local`]; the two are exact
//! inverses up to floating-point rounding. The root's own placement maps root-local space
//! to scene space.
//!
//! ## Hit testing
//!
//! [`Tree::hit`] walks children front to back (last child first), skipping invisible
//! subtrees, and honors [`Touchable`] when asked to. Widgets with non-rectangular shapes can
//! install a [`HitTest`].
//!
//! ## API overview
//!
//! - [`Tree`]: arena, structure, coordinates, and hit testing.
//! - [`LocalNode`]: per-node placement, visibility, and touchability.
//! - [`NodeKind`]: leaf or container.
//! - [`Touchable`]: `Enabled`, `Disabled`, or `ChildrenOnly`.
//! - [`NodeId`]: generational handle of a node.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod transform;
mod tree;
mod types;

pub use tree::{Ancestors, Tree};
pub use types::{HitTest, LocalNode, NodeId, NodeKind, Touchable};
