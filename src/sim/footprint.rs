//! Shadow footprint geometry
//!
//! A footprint is a rectangle lying on the ground plane (XZ), anchored at the
//! caster's ground position and stretching `length` units away from the light:
//! - local z runs from the anchor (0) to the far edge (`length`)
//! - local x runs across the shadow, `±width/2`

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::consts::{SHADOW_MARGIN, SHADOW_VERTICAL_TOLERANCE};
use crate::ground_xz;

/// An oriented shadow rectangle on the ground plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowFootprint {
    /// Ground-plane position of the caster (x, z)
    pub anchor: Vec2,
    /// World height of the ground plane under the caster
    pub ground_y: f32,
    /// Yaw (radians) of the direction the shadow points away from the light
    pub yaw: f32,
    /// Extent along the shadow direction
    pub length: f32,
    /// Extent across the shadow direction
    pub width: f32,
}

impl ShadowFootprint {
    pub fn new(anchor: Vec2, ground_y: f32, yaw: f32, length: f32, width: f32) -> Self {
        Self {
            anchor,
            ground_y,
            yaw,
            length,
            width,
        }
    }

    /// Unit vector along the shadow (local +z)
    #[inline]
    pub fn forward(&self) -> Vec2 {
        Vec2::new(self.yaw.sin(), self.yaw.cos())
    }

    /// Unit vector across the shadow (local +x)
    #[inline]
    pub fn right(&self) -> Vec2 {
        Vec2::new(self.yaw.cos(), -self.yaw.sin())
    }

    /// Center of the rectangle on the ground plane
    pub fn center(&self) -> Vec2 {
        self.anchor + self.forward() * (self.length / 2.0)
    }

    /// Ground point expressed in footprint space (x = lateral, y = along the shadow)
    pub fn to_local(&self, point: Vec2) -> Vec2 {
        let offset = point - self.anchor;
        Vec2::new(offset.dot(self.right()), offset.dot(self.forward()))
    }

    /// Rectangle corners, counter-clockwise starting at the anchor's left side
    pub fn corners(&self) -> [Vec2; 4] {
        let half_w = self.right() * (self.width / 2.0);
        let far = self.forward() * self.length;
        [
            self.anchor - half_w,
            self.anchor + half_w,
            self.anchor + far + half_w,
            self.anchor + far - half_w,
        ]
    }

    /// Check if a world point lies on this shadow
    ///
    /// The rectangle is grown by `SHADOW_MARGIN` on every side, and the point may
    /// hover up to `SHADOW_VERTICAL_TOLERANCE` above or below the ground.
    pub fn contains_point(&self, point: Vec3) -> bool {
        if (point.y - self.ground_y).abs() > SHADOW_VERTICAL_TOLERANCE {
            return false;
        }
        let local = self.to_local(ground_xz(point));
        local.y >= -SHADOW_MARGIN
            && local.y <= self.length + SHADOW_MARGIN
            && local.x.abs() <= self.width / 2.0 + SHADOW_MARGIN
    }

    /// Protection factor in [0, 1] for a world point
    ///
    /// 1.0 on the center of the rectangle, falling linearly to 0.0 at whichever
    /// edge (lateral or longitudinal) is relatively closer. Points off the shadow
    /// get 0.0.
    pub fn strength(&self, point: Vec3) -> f32 {
        if !self.contains_point(point) {
            return 0.0;
        }
        let half_w = self.width / 2.0;
        let half_l = self.length / 2.0;
        if half_w <= 0.0 || half_l <= 0.0 {
            return 0.0;
        }
        let local = self.to_local(ground_xz(point));
        let across = local.x.abs() / half_w;
        let along = (local.y - half_l).abs() / half_l;
        (1.0 - across.max(along)).clamp(0.0, 1.0)
    }

    /// Separating-axis overlap test against another footprint
    pub fn overlaps(&self, other: &ShadowFootprint) -> bool {
        let between = other.center() - self.center();
        let axes = [self.right(), self.forward(), other.right(), other.forward()];

        axes.iter().all(|&axis| {
            let reach_a = self.projected_radius(axis);
            let reach_b = other.projected_radius(axis);
            between.dot(axis).abs() <= reach_a + reach_b
        })
    }

    /// Half-extent of the rectangle projected onto a unit axis
    fn projected_radius(&self, axis: Vec2) -> f32 {
        self.right().dot(axis).abs() * (self.width / 2.0)
            + self.forward().dot(axis).abs() * (self.length / 2.0)
    }
}
