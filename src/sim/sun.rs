//! Sun position driven by a drag gesture
//!
//! The sun travels on a vertical circle of fixed radius around `center`; its
//! angle (degrees) is 0 straight overhead and swings sideways along x.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::caster::CasterRegistry;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SunState {
    pub center: Vec3,
    pub radius: f32,
    pub min_angle: f32,
    pub max_angle: f32,
    /// Exponential follow rate toward the target angle (1/s)
    pub follow_rate: f32,
    current_angle: f32,
    target_angle: f32,
    position: Vec3,
}

impl SunState {
    pub fn new(
        center: Vec3,
        radius: f32,
        min_angle: f32,
        max_angle: f32,
        follow_rate: f32,
    ) -> Self {
        let start = 0.0_f32.clamp(min_angle, max_angle);
        Self {
            center,
            radius,
            min_angle,
            max_angle,
            follow_rate,
            current_angle: start,
            target_angle: start,
            position: Self::position_for(center, radius, start),
        }
    }

    fn position_for(center: Vec3, radius: f32, angle_deg: f32) -> Vec3 {
        let rad = angle_deg.to_radians();
        center + Vec3::new(rad.sin() * radius, rad.cos() * radius, 0.0)
    }

    /// Map a normalized drag position (0 = left edge, 1 = right edge) onto the angle range
    pub fn set_target_angle(&mut self, normalized: f32) {
        let t = if normalized.is_finite() {
            normalized.clamp(0.0, 1.0)
        } else {
            0.5
        };
        self.target_angle = self.min_angle + (self.max_angle - self.min_angle) * t;
    }

    pub fn current_angle(&self) -> f32 {
        self.current_angle
    }

    pub fn target_angle(&self) -> f32 {
        self.target_angle
    }

    /// World position of the light
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Ease the angle toward its target, then re-aim every shadow
    ///
    /// Returns true if the angle changed this tick.
    pub fn tick(&mut self, dt: f32, casters: &mut CasterRegistry, turn_rate: f32) -> bool {
        let previous = self.current_angle;
        let step = (self.follow_rate * dt).clamp(0.0, 1.0);
        self.current_angle += (self.target_angle - self.current_angle) * step;
        self.current_angle = self.current_angle.clamp(self.min_angle, self.max_angle);
        self.position = Self::position_for(self.center, self.radius, self.current_angle);

        casters.update_all(self.position, dt, turn_rate);

        self.current_angle != previous
    }
}
