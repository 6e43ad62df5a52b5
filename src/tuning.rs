//! Data-driven game balance
//!
//! Loaded as part of a level file; any field left out falls back to the default.

use serde::{Deserialize, Serialize};

use crate::level::LevelError;

/// What happens when the drop reaches a shadow waypoint while in sunlight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowRequirement {
    /// Log it and keep going
    #[default]
    Warn,
    /// Stay at the waypoint until a shadow covers the drop
    Hold,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Water ===
    /// Water lost per second in shadow before protection
    pub water_decay_rate: f32,
    /// Water lost per second in direct sunlight
    pub sunlight_decay_rate: f32,
    /// Largest fraction of decay a shadow can cancel
    pub protection_cap: f32,

    // === Flow ===
    /// Seconds available to finish the level
    pub level_time: f32,
    /// Show the 3-2-1-GO countdown instead of a flat delay
    pub show_countdown: bool,
    /// Flat pre-game delay when the countdown is off
    pub start_delay: f32,
    /// Count the pre-game countdown toward the completion time
    pub count_countdown_time: bool,

    // === Sun ===
    pub sun_radius: f32,
    pub sun_min_angle: f32,
    pub sun_max_angle: f32,
    /// How quickly the sun chases the drag target (1/s)
    pub sun_follow_rate: f32,
    /// How quickly shadows turn toward the new light direction (1/s)
    pub shadow_turn_rate: f32,

    // === Drop ===
    pub move_speed: f32,
    /// How quickly the drop turns to face its heading (1/s)
    pub rotation_speed: f32,
    pub arrival_threshold: f32,
    pub shadow_requirement: ShadowRequirement,
    pub pickup_radius: f32,
    /// Periodically pull in pickups near the drop at a reduced value
    pub vacuum_enabled: bool,
    /// Seconds of play between vacuum passes
    pub vacuum_interval: f32,
    pub vacuum_radius: f32,
    /// Fraction of a pickup's amount granted by the vacuum
    pub vacuum_fraction: f32,
    /// Distance to the legacy end point that counts as a win
    pub end_point_radius: f32,

    // === Combo ===
    pub combo_window: f32,
    pub shadow_jump_bonus: f32,
    pub shadow_jump_step_bonus: f32,
    pub merge_bonus: f32,
    pub merge_step_bonus: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            water_decay_rate: 2.0,
            sunlight_decay_rate: 10.0,
            protection_cap: 0.9,

            level_time: 40.0,
            show_countdown: true,
            start_delay: 3.0,
            count_countdown_time: true,

            sun_radius: 10.0,
            sun_min_angle: -60.0,
            sun_max_angle: 60.0,
            sun_follow_rate: 5.0,
            shadow_turn_rate: 8.0,

            move_speed: 3.0,
            rotation_speed: 8.0,
            arrival_threshold: 0.3,
            shadow_requirement: ShadowRequirement::Warn,
            pickup_radius: 0.8,
            vacuum_enabled: true,
            vacuum_interval: 2.0,
            vacuum_radius: 2.0,
            vacuum_fraction: 0.5,
            end_point_radius: 1.0,

            combo_window: 5.0,
            shadow_jump_bonus: 10.0,
            shadow_jump_step_bonus: 2.0,
            merge_bonus: 25.0,
            merge_step_bonus: 3.0,
        }
    }
}

impl Tuning {
    /// Reject values that would break the simulation's invariants
    pub fn validate(&self) -> Result<(), LevelError> {
        let non_negative = [
            ("water_decay_rate", self.water_decay_rate),
            ("sunlight_decay_rate", self.sunlight_decay_rate),
            ("start_delay", self.start_delay),
            ("sun_follow_rate", self.sun_follow_rate),
            ("shadow_turn_rate", self.shadow_turn_rate),
            ("move_speed", self.move_speed),
            ("rotation_speed", self.rotation_speed),
            ("pickup_radius", self.pickup_radius),
            ("vacuum_radius", self.vacuum_radius),
            ("end_point_radius", self.end_point_radius),
            ("shadow_jump_bonus", self.shadow_jump_bonus),
            ("shadow_jump_step_bonus", self.shadow_jump_step_bonus),
            ("merge_bonus", self.merge_bonus),
            ("merge_step_bonus", self.merge_step_bonus),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(LevelError::InvalidTuning(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }

        let positive = [
            ("level_time", self.level_time),
            ("combo_window", self.combo_window),
            ("arrival_threshold", self.arrival_threshold),
            ("vacuum_interval", self.vacuum_interval),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(LevelError::InvalidTuning(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }

        let fractions = [
            ("protection_cap", self.protection_cap),
            ("vacuum_fraction", self.vacuum_fraction),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(LevelError::InvalidTuning(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }

        if !(self.sun_min_angle <= self.sun_max_angle) || !(self.sun_radius > 0.0) {
            return Err(LevelError::InvalidSunRange {
                min: self.sun_min_angle,
                max: self.sun_max_angle,
            });
        }

        Ok(())
    }
}
