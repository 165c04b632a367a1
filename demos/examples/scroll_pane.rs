// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A scroll pane that steals a drag from the button under the finger.
//!
//! The pane listens in the capture phase, so it sees every touch-down inside it
//! before the button does. Once a drag travels far enough, the pane cancels every
//! other touch focus; the button gets a synthetic release it can tell apart from a
//! real one and does not fire its click.
//!
//! Also shows keyboard focus negotiation and hover enter/exit from `Scene::act`.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p understory_demos --example scroll_pane`

use std::cell::Cell;
use std::rc::{Rc, Weak};

use kurbo::{Point, Size, Vec2};
use understory_scene::{Event, EventKind, FocusKind, Listener, ListenerRef, Scene, listener};
use understory_scene_tree::{LocalNode, NodeId, NodeKind};

const DRAG_SLOP: f64 = 8.0;

fn build(scene: &mut Scene) -> (NodeId, NodeId, NodeId) {
    let root = scene.root();
    let pane = scene.tree_mut().insert(
        Some(root),
        NodeKind::Container,
        LocalNode::with_bounds(Point::new(20.0, 20.0), Size::new(200.0, 300.0)),
    );
    let content = scene.tree_mut().insert(
        Some(pane),
        NodeKind::Container,
        LocalNode::with_bounds(Point::ZERO, Size::new(200.0, 900.0)),
    );
    let button = scene.tree_mut().insert(
        Some(content),
        NodeKind::Leaf,
        LocalNode::with_bounds(Point::new(20.0, 40.0), Size::new(160.0, 40.0)),
    );
    (pane, content, button)
}

fn button_listener(clicks: Rc<Cell<u32>>) -> ListenerRef {
    listener(move |_: &mut Scene, e: &mut Event| match e.kind() {
        EventKind::TouchDown => true,
        EventKind::TouchUp if e.is_touch_focus_cancel() => {
            log::info!("button: press cancelled");
            false
        }
        EventKind::TouchUp => {
            clicks.set(clicks.get() + 1);
            log::info!("button: click #{}", clicks.get());
            true
        }
        EventKind::Enter => {
            log::info!("button: hovered");
            false
        }
        EventKind::Exit => {
            log::info!("button: left");
            false
        }
        _ => false,
    })
}

/// Scroll pane behavior, registered as a capture listener on the pane.
///
/// Claims the gesture once the pointer has moved past [`DRAG_SLOP`].
struct PaneListener {
    me: Weak<PaneListener>,
    content: NodeId,
    start: Cell<Option<Point>>,
    panning: Cell<bool>,
}

impl PaneListener {
    fn new(content: NodeId) -> Rc<Self> {
        Rc::new_cyclic(|me| Self {
            me: me.clone(),
            content,
            start: Cell::new(None),
            panning: Cell::new(false),
        })
    }
}

impl Listener for PaneListener {
    fn handle(&self, scene: &mut Scene, e: &mut Event) -> bool {
        match e.kind() {
            EventKind::TouchDown => {
                self.start.set(Some(e.stage()));
                self.panning.set(false);
                true
            }
            EventKind::TouchDragged => {
                let (Some(from), Some(actor)) = (self.start.get(), e.listener_actor()) else {
                    return false;
                };
                let delta = e.stage() - from;
                if !self.panning.get() && delta.length() > DRAG_SLOP {
                    self.panning.set(true);
                    if let Some(me) = self.me.upgrade() {
                        log::info!("pane: claiming the gesture");
                        let me: ListenerRef = me;
                        scene.cancel_touch_focus_except(&me, actor);
                    }
                }
                if self.panning.get() {
                    let y = delta.y.min(0.0);
                    scene.tree_mut().set_position(self.content, Point::new(0.0, y));
                }
                true
            }
            EventKind::TouchUp => {
                self.start.set(None);
                self.panning.set(false);
                true
            }
            _ => false,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut scene = Scene::new();
    let (pane, content, button) = build(&mut scene);

    let clicks = Rc::new(Cell::new(0));
    scene.add_listener(button, button_listener(clicks.clone()));
    scene.add_capture_listener(pane, PaneListener::new(content));

    // A tap: down and up without moving. The button clicks.
    scene.touch_down(Point::new(60.0, 80.0), 0, 0);
    scene.act(1.0 / 60.0);
    scene.touch_up(Point::new(60.0, 80.0), 0, 0);
    scene.act(1.0 / 60.0);
    assert_eq!(clicks.get(), 1);

    // A drag: the pane takes over and the button never clicks.
    scene.touch_down(Point::new(60.0, 80.0), 0, 0);
    for step in 1..=5 {
        scene.touch_dragged(Point::new(60.0, 80.0 - 10.0 * f64::from(step)), 0);
        scene.act(1.0 / 60.0);
    }
    scene.touch_up(Point::new(60.0, 30.0), 0, 0);
    scene.act(1.0 / 60.0);
    assert_eq!(clicks.get(), 1);
    log::info!(
        "content scrolled to {:?}",
        scene.tree().local(content).map(|l| l.position)
    );

    // Keyboard focus: the pane refuses to let focus leave while it is scrolled.
    scene.add_listener(
        pane,
        listener(move |scene: &mut Scene, e: &mut Event| {
            let scrolled = scene
                .tree()
                .local(content)
                .is_some_and(|l| l.position.y != 0.0);
            if e.kind() == EventKind::Focus(FocusKind::Keyboard) && !e.is_focused() && scrolled {
                log::info!("pane: keeping keyboard focus");
                e.cancel();
            }
            false
        }),
    );
    assert!(scene.set_keyboard_focus(Some(pane)));
    assert!(!scene.set_keyboard_focus(Some(button)));
    scene.tree_mut().set_position(content, Point::ZERO);
    assert!(scene.set_keyboard_focus(Some(button)));
    scene.scrolled(Vec2::new(0.0, -1.0));
}
