//! Authored waypoint paths
//!
//! Order is traversal order. Paths are validated once when built and never
//! change afterwards.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::level::LevelError;

/// A checkpoint along the drop's route
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub position: Vec3,
    /// Authoring flag kept in level files; the drop visits every waypoint in
    /// order whatever its value
    #[serde(default = "default_required")]
    pub required: bool,
    /// Pause on arrival (seconds)
    #[serde(default)]
    pub wait_time: f32,
    /// The drop is expected to be shaded when it arrives here
    #[serde(default)]
    pub must_be_in_shadow: bool,
}

fn default_required() -> bool {
    true
}

impl Waypoint {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            required: true,
            wait_time: 0.0,
            must_be_in_shadow: false,
        }
    }

    pub fn with_wait(mut self, seconds: f32) -> Self {
        self.wait_time = seconds;
        self
    }

    pub fn in_shadow(mut self) -> Self {
        self.must_be_in_shadow = true;
        self
    }
}

/// Validated, immutable sequence of waypoints (never empty)
#[derive(Debug, Clone, Serialize)]
pub struct WaypointPath {
    waypoints: Vec<Waypoint>,
}

impl WaypointPath {
    pub fn new(waypoints: Vec<Waypoint>) -> Result<Self, LevelError> {
        if waypoints.is_empty() {
            return Err(LevelError::EmptyPath);
        }
        for (index, wp) in waypoints.iter().enumerate() {
            if !wp.position.is_finite() {
                return Err(LevelError::InvalidWaypoint {
                    index,
                    reason: "position is not finite".into(),
                });
            }
            if !wp.wait_time.is_finite() || wp.wait_time < 0.0 {
                return Err(LevelError::InvalidWaypoint {
                    index,
                    reason: format!("wait time {} must be a non-negative number", wp.wait_time),
                });
            }
        }
        Ok(Self { waypoints })
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Always false for a constructed path; present for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Waypoint> {
        self.waypoints.get(index)
    }

    pub fn first(&self) -> &Waypoint {
        &self.waypoints[0]
    }

    pub fn last_index(&self) -> usize {
        self.waypoints.len() - 1
    }

    pub fn iter(&self) -> impl Iterator<Item = &Waypoint> {
        self.waypoints.iter()
    }

    /// Total polyline length from the first to the last waypoint
    pub fn total_length(&self) -> f32 {
        self.waypoints
            .windows(2)
            .map(|w| w[0].position.distance(w[1].position))
            .sum()
    }
}
