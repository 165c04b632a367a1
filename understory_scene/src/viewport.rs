// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Screen ↔ stage mapping.

use kurbo::{Affine, Point, Rect};

/// Maps screen coordinates reported by the host into stage coordinates and back.
pub trait Viewport {
    /// Screen → stage.
    fn unproject(&self, screen: Point) -> Point;

    /// Stage → screen.
    fn project(&self, stage: Point) -> Point;

    /// Whether a screen point lies inside the viewport. Touch-downs and mouse moves
    /// outside it are ignored. Defaults to `true`.
    fn contains(&self, screen: Point) -> bool {
        let _ = screen;
        true
    }
}

/// A viewport whose stage → screen mapping is an affine transform.
///
/// An optional screen-space rectangle restricts where input is accepted;
/// its right and bottom edges are exclusive.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AffineViewport {
    stage_to_screen: Affine,
    screen_to_stage: Affine,
    bounds: Option<Rect>,
}

impl Default for AffineViewport {
    fn default() -> Self {
        Self::new(Affine::IDENTITY)
    }
}

impl AffineViewport {
    /// A viewport mapping stage to screen with `stage_to_screen`.
    ///
    /// The transform must be invertible.
    pub fn new(stage_to_screen: Affine) -> Self {
        Self {
            stage_to_screen,
            screen_to_stage: stage_to_screen.inverse(),
            bounds: None,
        }
    }

    /// A y-down screen of `height` over a y-up stage with the same scale.
    pub fn flipped_y(height: f64) -> Self {
        Self::new(Affine::new([1.0, 0.0, 0.0, -1.0, 0.0, height]))
    }

    /// Accept input only inside `bounds` (screen space).
    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Stage → screen transform.
    pub fn transform(&self) -> Affine {
        self.stage_to_screen
    }

    /// Screen-space input bounds, if any.
    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }
}

impl Viewport for AffineViewport {
    fn unproject(&self, screen: Point) -> Point {
        self.screen_to_stage * screen
    }

    fn project(&self, stage: Point) -> Point {
        self.stage_to_screen * stage
    }

    fn contains(&self, screen: Point) -> bool {
        self.bounds.is_none_or(|b| b.contains(screen))
    }
}
