//! Level authoring data
//!
//! A level is plain JSON: sun placement, tuning overrides, obstacles, the
//! waypoint path and pickups. `LevelConfig::build` validates everything up
//! front and produces a ready-to-tick `SimulationContext`.

use std::fmt;

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::sim::caster::{CasterMotion, CasterPulse};
use crate::sim::path::{Waypoint, WaypointPath};
use crate::sim::pickup::WaterPickup;
use crate::sim::state::SimulationContext;
use crate::sim::sun::SunState;
use crate::tuning::Tuning;

/// Invalid authoring data, reported when a level is built
#[derive(Debug, Clone, PartialEq)]
pub enum LevelError {
    EmptyPath,
    InvalidWaypoint { index: usize, reason: String },
    InvalidObstacle { index: usize, reason: String },
    InvalidSunRange { min: f32, max: f32 },
    InvalidTuning(String),
    Parse(String),
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelError::EmptyPath => write!(f, "waypoint path is empty"),
            LevelError::InvalidWaypoint { index, reason } => {
                write!(f, "waypoint {index}: {reason}")
            }
            LevelError::InvalidObstacle { index, reason } => {
                write!(f, "obstacle {index}: {reason}")
            }
            LevelError::InvalidSunRange { min, max } => {
                write!(f, "invalid sun range [{min}, {max}]")
            }
            LevelError::InvalidTuning(reason) => write!(f, "invalid tuning: {reason}"),
            LevelError::Parse(reason) => write!(f, "level parse error: {reason}"),
        }
    }
}

impl std::error::Error for LevelError {}

impl From<serde_json::Error> for LevelError {
    fn from(err: serde_json::Error) -> Self {
        LevelError::Parse(err.to_string())
    }
}

/// Looping movement for an obstacle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionConfig {
    /// Loop points; left empty, four seeded points are generated around the obstacle
    #[serde(default)]
    pub waypoints: Vec<Vec3>,
    #[serde(default = "default_motion_speed")]
    pub speed: f32,
    #[serde(default = "default_motion_wait")]
    pub wait_time: f32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_motion_speed() -> f32 {
    2.0
}

fn default_motion_wait() -> f32 {
    2.0
}

fn default_enabled() -> bool {
    true
}

/// Breathing shadow size for an obstacle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PulseConfig {
    #[serde(default = "default_pulse_min")]
    pub min_scale: f32,
    #[serde(default = "default_pulse_max")]
    pub max_scale: f32,
    #[serde(default = "default_pulse_speed")]
    pub speed: f32,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            min_scale: default_pulse_min(),
            max_scale: default_pulse_max(),
            speed: default_pulse_speed(),
        }
    }
}

fn default_pulse_min() -> f32 {
    0.8
}

fn default_pulse_max() -> f32 {
    1.2
}

fn default_pulse_speed() -> f32 {
    2.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObstacleConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub position: Vec3,
    #[serde(default)]
    pub ground_y: f32,
    pub shadow_length: f32,
    pub shadow_width: f32,
    #[serde(default)]
    pub motion: Option<MotionConfig>,
    /// Water granted periodically while the drop hides in this shadow
    #[serde(default)]
    pub shelter_reward: Option<f32>,
    #[serde(default)]
    pub pulse: Option<PulseConfig>,
}

impl ObstacleConfig {
    fn validate(&self, index: usize) -> Result<(), LevelError> {
        let invalid = |reason: String| LevelError::InvalidObstacle { index, reason };

        if !self.position.is_finite() || !self.ground_y.is_finite() {
            return Err(invalid("position is not finite".into()));
        }
        if !(self.shadow_length > 0.0) || !self.shadow_length.is_finite() {
            return Err(invalid(format!(
                "shadow length must be positive, got {}",
                self.shadow_length
            )));
        }
        if !(self.shadow_width > 0.0) || !self.shadow_width.is_finite() {
            return Err(invalid(format!(
                "shadow width must be positive, got {}",
                self.shadow_width
            )));
        }
        if let Some(reward) = self.shelter_reward {
            if !reward.is_finite() || reward < 0.0 {
                return Err(invalid(format!(
                    "shelter reward must be non-negative, got {reward}"
                )));
            }
        }
        if let Some(pulse) = &self.pulse {
            if !(pulse.min_scale > 0.0) || !pulse.max_scale.is_finite() {
                return Err(invalid(format!(
                    "pulse scale must be positive and finite, got {}..{}",
                    pulse.min_scale, pulse.max_scale
                )));
            }
            if pulse.max_scale < pulse.min_scale {
                return Err(invalid(format!(
                    "pulse max scale {} is below min scale {}",
                    pulse.max_scale, pulse.min_scale
                )));
            }
            if !pulse.speed.is_finite() || pulse.speed < 0.0 {
                return Err(invalid(format!(
                    "pulse speed must be non-negative, got {}",
                    pulse.speed
                )));
            }
        }
        if let Some(motion) = &self.motion {
            if !(motion.speed > 0.0) || !motion.speed.is_finite() {
                return Err(invalid(format!(
                    "motion speed must be positive, got {}",
                    motion.speed
                )));
            }
            if !motion.wait_time.is_finite() || motion.wait_time < 0.0 {
                return Err(invalid(format!(
                    "motion wait time must be non-negative, got {}",
                    motion.wait_time
                )));
            }
            if motion.waypoints.iter().any(|p| !p.is_finite()) {
                return Err(invalid("motion waypoint is not finite".into()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelConfig {
    #[serde(default = "default_level")]
    pub level: u32,
    /// Seed for generated obstacle motion
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub sun_center: Vec3,
    #[serde(default)]
    pub tuning: Tuning,
    #[serde(default)]
    pub obstacles: Vec<ObstacleConfig>,
    pub waypoints: Vec<Waypoint>,
    #[serde(default)]
    pub pickups: Vec<WaterPickup>,
    /// Fixed goal that also wins when reached
    #[serde(default)]
    pub end_point: Option<Vec3>,
}

fn default_level() -> u32 {
    1
}

impl LevelConfig {
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, LevelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Small built-in level: an S-shaped path past three obstacles
    pub fn demo() -> Self {
        let wp = |x: f32, z: f32| Waypoint::at(Vec3::new(x, 0.0, z));
        Self {
            level: 1,
            seed: 0x5eed,
            sun_center: Vec3::ZERO,
            tuning: Tuning::default(),
            obstacles: vec![
                ObstacleConfig {
                    name: Some("Rock".into()),
                    position: Vec3::new(2.0, 1.0, -4.0),
                    ground_y: 0.0,
                    shadow_length: 4.0,
                    shadow_width: 1.5,
                    motion: None,
                    shelter_reward: None,
                    pulse: Some(PulseConfig::default()),
                },
                ObstacleConfig {
                    name: Some("Cloud".into()),
                    position: Vec3::new(-2.0, 1.0, 0.0),
                    ground_y: 0.0,
                    shadow_length: 3.0,
                    shadow_width: 2.0,
                    motion: Some(MotionConfig {
                        waypoints: Vec::new(),
                        speed: default_motion_speed(),
                        wait_time: default_motion_wait(),
                        enabled: true,
                    }),
                    shelter_reward: None,
                    pulse: None,
                },
                ObstacleConfig {
                    name: Some("Tree".into()),
                    position: Vec3::new(1.5, 1.0, 4.0),
                    ground_y: 0.0,
                    shadow_length: 5.0,
                    shadow_width: 2.0,
                    motion: None,
                    shelter_reward: Some(15.0),
                    pulse: None,
                },
            ],
            waypoints: vec![
                wp(0.0, -6.0),
                wp(1.0, -2.0).with_wait(0.5),
                wp(-1.0, 2.0).in_shadow(),
                wp(0.0, 6.0),
            ],
            pickups: vec![
                WaterPickup::new(Vec3::new(0.5, 0.0, -4.0), 20.0),
                WaterPickup::new(Vec3::new(-0.5, 0.0, 4.0), 20.0),
            ],
            end_point: None,
        }
    }

    /// Validate and construct the simulation for this level
    pub fn build(&self) -> Result<SimulationContext, LevelError> {
        self.tuning.validate()?;
        if !self.sun_center.is_finite() {
            return Err(LevelError::InvalidSunRange {
                min: self.tuning.sun_min_angle,
                max: self.tuning.sun_max_angle,
            });
        }
        for (index, obstacle) in self.obstacles.iter().enumerate() {
            obstacle.validate(index)?;
        }
        let path = WaypointPath::new(self.waypoints.clone())?;

        let mut ctx = SimulationContext::new(self.level, self.tuning.clone(), path);
        ctx.seed = self.seed;
        ctx.sun = SunState::new(
            self.sun_center,
            self.tuning.sun_radius,
            self.tuning.sun_min_angle,
            self.tuning.sun_max_angle,
            self.tuning.sun_follow_rate,
        );
        ctx.pickups = self.pickups.clone();
        ctx.end_point = self.end_point;

        let mut rng = Pcg32::seed_from_u64(self.seed);
        for obstacle in &self.obstacles {
            let caster = ctx.casters.spawn(
                obstacle.position,
                obstacle.shadow_length,
                obstacle.shadow_width,
            );
            if let Some(name) = &obstacle.name {
                caster.name = name.clone();
            }
            caster.ground_y = obstacle.ground_y;
            caster.shelter_reward = obstacle.shelter_reward;
            caster.pulse = obstacle
                .pulse
                .map(|p| CasterPulse::new(p.min_scale, p.max_scale, p.speed));
            caster.motion = obstacle
                .motion
                .as_ref()
                .filter(|m| m.enabled)
                .map(|m| {
                    if m.waypoints.is_empty() {
                        CasterMotion::around(obstacle.position, &mut rng, m.speed, m.wait_time)
                    } else {
                        CasterMotion::new(m.waypoints.clone(), m.speed, m.wait_time)
                    }
                });
        }

        log::info!(
            "Built level {}: {} obstacles, {} waypoints, {} pickups",
            self.level,
            ctx.casters.len(),
            ctx.path.len(),
            ctx.pickups.len()
        );
        Ok(ctx)
    }
}
