// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Local ↔ parent coordinate conversion for a single node.
//!
//! The forward transform is: translate by `-origin`, scale, rotate, translate
//! back by `origin`, then offset by `position`. The inverse undoes those steps
//! in reverse order. Both directions special-case the identity rotation so that
//! the common pure-translation case stays exact.

use kurbo::{Affine, Point, Size, Vec2};

use crate::types::LocalNode;

impl LocalNode {
    /// Map a point from this node's local space into its parent's space.
    pub fn local_to_parent(&self, local: Point) -> Point {
        let LocalNode {
            position,
            origin,
            scale,
            rotation,
            ..
        } = *self;
        if rotation == 0.0 {
            if scale.x == 1.0 && scale.y == 1.0 {
                return Point::new(local.x + position.x, local.y + position.y);
            }
            return Point::new(
                (local.x - origin.x) * scale.x + origin.x + position.x,
                (local.y - origin.y) * scale.y + origin.y + position.y,
            );
        }
        let (cos, sin) = cos_sin(rotation);
        let tox = (local.x - origin.x) * scale.x;
        let toy = (local.y - origin.y) * scale.y;
        Point::new(
            tox * cos - toy * sin + origin.x + position.x,
            tox * sin + toy * cos + origin.y + position.y,
        )
    }

    /// Map a point from the parent's space into this node's local space.
    ///
    /// This is the exact inverse of [`LocalNode::local_to_parent`]. A zero scale
    /// component yields non-finite coordinates, which never hit anything.
    pub fn parent_to_local(&self, parent: Point) -> Point {
        let LocalNode {
            position,
            origin,
            scale,
            rotation,
            ..
        } = *self;
        if rotation == 0.0 {
            if scale.x == 1.0 && scale.y == 1.0 {
                return Point::new(parent.x - position.x, parent.y - position.y);
            }
            return Point::new(
                (parent.x - position.x - origin.x) / scale.x + origin.x,
                (parent.y - position.y - origin.y) / scale.y + origin.y,
            );
        }
        let (cos, sin) = cos_sin(rotation);
        let tox = parent.x - position.x - origin.x;
        let toy = parent.y - position.y - origin.y;
        Point::new(
            (tox * cos + toy * sin) / scale.x + origin.x,
            (-tox * sin + toy * cos) / scale.y + origin.y,
        )
    }

    /// The local → parent transform as an [`Affine`], for renderers.
    ///
    /// Agrees with [`LocalNode::local_to_parent`] up to floating-point rounding.
    pub fn transform(&self) -> Affine {
        let pivot = self.origin.to_vec2();
        Affine::translate(self.position.to_vec2() + pivot)
            * Affine::rotate(self.rotation.to_radians())
            * Affine::scale_non_uniform(self.scale.x, self.scale.y)
            * Affine::translate(-pivot)
    }

    /// Default hit area: `[0, width) × [0, height)` in local space.
    pub fn contains_local(&self, local: Point) -> bool {
        in_bounds(local, self.size)
    }
}

pub(crate) fn in_bounds(local: Point, size: Size) -> bool {
    local.x >= 0.0 && local.x < size.width && local.y >= 0.0 && local.y < size.height
}

fn cos_sin(degrees: f64) -> (f64, f64) {
    let v = Vec2::from_angle(degrees.to_radians());
    (v.x, v.y)
}
