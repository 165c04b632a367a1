// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The event value passed through a dispatch.
//!
//! An [`Event`] is created right before a dispatch call, populated with its
//! kind and payload, passed by `&mut` through [`Scene::fire`](crate::Scene::fire)
//! (or the touch-focus and focus helpers), and read by the caller afterwards.
//! Nothing in the scene keeps an event past the call that created it.
//!
//! Three outcome flags are tracked independently:
//!
//! - *handled*: some listener processed the event. Propagation continues.
//! - *stopped*: no further listeners are notified in this dispatch.
//! - *cancelled*: the transition the event announces is vetoed. Cancelling also
//!   stops and handles the event.

use kurbo::{Point, Vec2};
use understory_scene_tree::{NodeId, Tree};

use crate::focus::FocusKind;

/// Index of a touch pointer (finger or mouse pointer slot).
pub type Pointer = usize;

/// Mouse button identifier.
pub type Button = u8;

/// Stage coordinate used on both axes by synthetic touch-up events that cancel touch focus.
///
/// No real pointer ever reports this position, so listeners can tell a cancel
/// from a release with [`Event::is_touch_focus_cancel`].
pub const CANCEL_COORDINATE: f64 = -2_147_483_648.0;

/// What an [`Event`] announces.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A pointer went down.
    TouchDown,
    /// A pointer went up, or touch focus was cancelled.
    TouchUp,
    /// A pointer moved while down.
    TouchDragged,
    /// The mouse moved with no button down.
    MouseMoved,
    /// A pointer started hovering a node.
    Enter,
    /// A pointer stopped hovering a node.
    Exit,
    /// The mouse wheel or a trackpad scrolled.
    Scrolled,
    /// A key was pressed.
    KeyDown,
    /// A key was released.
    KeyUp,
    /// A character was typed.
    KeyTyped,
    /// Keyboard or scroll focus was gained or lost.
    Focus(FocusKind),
    /// A collaborator-defined notification.
    Custom(u32),
}

/// A single notification travelling through the scene.
#[derive(Clone, Debug)]
pub struct Event {
    pub(crate) kind: EventKind,
    pub(crate) target: Option<NodeId>,
    pub(crate) listener_actor: Option<NodeId>,
    related: Option<NodeId>,
    stage: Point,
    pub(crate) pointer: Option<Pointer>,
    pub(crate) button: Option<Button>,
    key_code: Option<u32>,
    character: Option<char>,
    scroll: Vec2,
    focused: bool,
    pub(crate) capture: bool,
    bubbles: bool,
    handled: bool,
    stopped: bool,
    cancelled: bool,
}

impl Event {
    /// Create an event of the given kind at the stage origin that bubbles.
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            target: None,
            listener_actor: None,
            related: None,
            stage: Point::ZERO,
            pointer: None,
            button: None,
            key_code: None,
            character: None,
            scroll: Vec2::ZERO,
            focused: false,
            capture: false,
            bubbles: true,
            handled: false,
            stopped: false,
            cancelled: false,
        }
    }

    /// Set the stage-space position.
    pub fn with_stage(mut self, stage: Point) -> Self {
        self.stage = stage;
        self
    }

    /// Set the pointer index.
    pub fn with_pointer(mut self, pointer: Pointer) -> Self {
        self.pointer = Some(pointer);
        self
    }

    /// Set the button.
    pub fn with_button(mut self, button: Button) -> Self {
        self.button = Some(button);
        self
    }

    /// Set the related node: the other side of an enter/exit or focus transfer.
    pub fn with_related(mut self, related: Option<NodeId>) -> Self {
        self.related = related;
        self
    }

    /// Set the key code.
    pub fn with_key_code(mut self, key_code: u32) -> Self {
        self.key_code = Some(key_code);
        self
    }

    /// Set the typed character.
    pub fn with_character(mut self, character: char) -> Self {
        self.character = Some(character);
        self
    }

    /// Set the scroll amount.
    pub fn with_scroll(mut self, amount: Vec2) -> Self {
        self.scroll = amount;
        self
    }

    /// For focus events: `true` when focus is gained, `false` when it is lost.
    pub fn with_focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    /// Whether the event continues to ancestors after the target phase. Defaults to `true`.
    pub fn with_bubbles(mut self, bubbles: bool) -> Self {
        self.bubbles = bubbles;
        self
    }

    /// The event kind.
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// The node the event was fired at.
    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    /// The node whose listeners are currently being notified.
    pub fn listener_actor(&self) -> Option<NodeId> {
        self.listener_actor
    }

    /// The other node involved in an enter/exit or focus transfer, if any.
    pub fn related(&self) -> Option<NodeId> {
        self.related
    }

    /// Position in stage coordinates.
    pub fn stage(&self) -> Point {
        self.stage
    }

    /// Pointer index, for pointer events.
    pub fn pointer(&self) -> Option<Pointer> {
        self.pointer
    }

    /// Button, for touch down/up events.
    pub fn button(&self) -> Option<Button> {
        self.button
    }

    /// Key code, for key down/up events.
    pub fn key_code(&self) -> Option<u32> {
        self.key_code
    }

    /// Typed character, for key typed events.
    pub fn character(&self) -> Option<char> {
        self.character
    }

    /// Scroll amount, for scroll events.
    pub fn scroll(&self) -> Vec2 {
        self.scroll
    }

    /// For focus events, whether focus is being gained.
    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// True while capture listeners are being notified.
    pub fn is_capture(&self) -> bool {
        self.capture
    }

    /// Whether the event bubbles to ancestors.
    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    /// True if any listener handled the event.
    pub fn is_handled(&self) -> bool {
        self.handled
    }

    /// True if propagation was stopped.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// True if the event was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Mark the event handled. Propagation continues.
    pub fn handle(&mut self) {
        self.handled = true;
    }

    /// Stop propagation: no further listeners are notified by the current dispatch.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// Veto the announced transition. Also stops and handles the event.
    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.stopped = true;
        self.handled = true;
    }

    /// True for the synthetic touch-up sent when touch focus is cancelled.
    pub fn is_touch_focus_cancel(&self) -> bool {
        self.stage.x == CANCEL_COORDINATE && self.stage.y == CANCEL_COORDINATE
    }

    /// The stage position mapped into the local space of the current listener actor.
    pub fn local_position(&self, tree: &Tree) -> Option<Point> {
        tree.scene_to_local(self.listener_actor?, self.stage)
    }
}
