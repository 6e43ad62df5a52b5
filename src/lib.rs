//! Last Drop - shadow survival simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (shadow geometry, path following, water state)
//! - `tuning`: Data-driven game balance
//! - `level`: Level authoring data and validation
//! - `progress`: Level completion records and star ratings

pub mod level;
pub mod progress;
pub mod sim;
pub mod tuning;

pub use level::{LevelConfig, LevelError};
pub use progress::ProgressTracker;
pub use tuning::{ShadowRequirement, Tuning};

use glam::{Vec2, Vec3};

/// Game configuration constants
pub mod consts {
    /// Water is a percentage
    pub const MAX_WATER: f32 = 100.0;

    /// Extra reach added on every side of a shadow footprint for containment
    pub const SHADOW_MARGIN: f32 = 0.15;
    /// Height band above/below the ground plane that still counts as "on" a shadow
    pub const SHADOW_VERTICAL_TOLERANCE: f32 = 1.0;

    /// Seconds between shelter rewards while hiding under a rewarding obstacle
    pub const SHELTER_INTERVAL: f32 = 3.0;
    /// Fraction of `shelter_reward` granted each interval
    pub const SHELTER_REWARD_FRACTION: f32 = 0.1;

    /// Countdown step durations (seconds)
    pub const COUNTDOWN_STEP: f32 = 1.0;
    pub const COUNTDOWN_GO: f32 = 0.5;

    /// Star rating thresholds
    pub const STAR_FAST_TIME: f32 = 25.0;
    pub const STAR_WATER_LEFT: f32 = 50.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Project a world position onto the ground plane (x, z)
#[inline]
pub fn ground_xz(pos: Vec3) -> Vec2 {
    Vec2::new(pos.x, pos.z)
}

/// Yaw (radians) that faces along a ground-plane direction, or None for a zero vector
#[inline]
pub fn yaw_of(dir: Vec2) -> Option<f32> {
    if dir.length_squared() <= f32::EPSILON {
        return None;
    }
    Some(dir.x.atan2(dir.y))
}

/// Rotate `current` toward `target` by `factor` of the shortest arc (factor clamped to [0, 1])
#[inline]
pub fn yaw_towards(current: f32, target: f32, factor: f32) -> f32 {
    let delta = normalize_angle(target - current);
    normalize_angle(current + delta * factor.clamp(0.0, 1.0))
}

/// Step a point toward a target by at most `max_step`, never overshooting
#[inline]
pub fn move_towards(current: Vec3, target: Vec3, max_step: f32) -> Vec3 {
    let to_target = target - current;
    let dist = to_target.length();
    if dist <= max_step || dist <= f32::EPSILON {
        target
    } else {
        current + to_target / dist * max_step
    }
}
