// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Scene: event propagation and focus for an interactive 2D scene.
//!
//! A [`Scene`] wraps an [`understory_scene_tree::Tree`] and turns raw host input
//! (touches, mouse moves, scrolling, keys) into events delivered to listeners
//! registered on nodes.
//!
//! - Events travel capture → target → bubble along a snapshot of the target's
//!   ancestors; any listener can stop or cancel them.
//! - A listener that handles a touch-down becomes that pointer's *touch focus* and
//!   receives its drags and release directly until the pointer goes up or the
//!   focus is cancelled.
//! - Keyboard and scroll focus move through a two-step handshake that either
//!   side can veto.
//! - Once per frame, [`Scene::act`] synthesizes enter/exit for every tracked
//!   pointer and runs per-node [`Action`]s.
//!
//! ## Minimal example
//!
//! ```
//! use kurbo::{Point, Size};
//! use understory_scene::{Event, EventKind, Scene, listener};
//! use understory_scene_tree::{LocalNode, NodeKind};
//!
//! let mut scene = Scene::new();
//! let root = scene.root();
//! let button = scene.tree_mut().insert(
//!     Some(root),
//!     NodeKind::Leaf,
//!     LocalNode::with_bounds(Point::new(10.0, 10.0), Size::new(80.0, 30.0)),
//! );
//!
//! scene.add_listener(
//!     button,
//!     listener(|_: &mut Scene, e: &mut Event| e.kind() == EventKind::TouchDown),
//! );
//!
//! // The button handles the press and captures pointer 0 until release.
//! assert!(scene.touch_down(Point::new(20.0, 20.0), 0, 0));
//! assert_eq!(scene.touch_focuses().len(), 1);
//! scene.touch_up(Point::new(200.0, 200.0), 0, 0);
//! assert!(scene.touch_focuses().is_empty());
//! ```
//!
//! ## Re-entrancy
//!
//! Listeners and actions receive `&mut Scene`. They may add or remove nodes and
//! listeners, move focus, and fire further events. Every dispatch iterates owned
//! snapshots (ancestor path, listener lists, touch-focus records), so such changes
//! take effect from the next dispatch. Stale nodes in a snapshot are skipped.
//!
//! ## API overview
//!
//! - [`Scene`]: the tree, per-node listeners and actions, focus state, input entry points.
//! - [`Event`] and [`EventKind`]: the value passed through a dispatch.
//! - [`Listener`], [`ListenerRef`], [`Action`]: per-node behavior.
//! - [`Dispatch`], [`Phase`], [`propagation_path`]: the capture → target → bubble sequence.
//! - [`TouchFocus`]: a pointer captured by a listener.
//! - [`FocusKind`]: keyboard or scroll focus.
//! - [`Viewport`] and [`AffineViewport`]: screen ↔ stage mapping.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod dispatch;
mod event;
mod focus;
mod listener;
mod pointer;
mod scene;
mod touch_focus;
mod viewport;

pub use dispatch::{Dispatch, Phase, Propagation, propagation_path};
pub use event::{Button, CANCEL_COORDINATE, Event, EventKind, Pointer};
pub use focus::FocusKind;
pub use listener::{Action, Listener, ListenerRef, listener};
pub use scene::{Scene, SceneConfig};
pub use touch_focus::TouchFocus;
pub use viewport::{AffineViewport, Viewport};
