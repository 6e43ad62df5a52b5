//! Simulation context
//!
//! Owns every piece of mutable level state. Restarting a level means building
//! a fresh context from the same `LevelConfig`.

use glam::Vec3;

use super::caster::CasterRegistry;
use super::combo::ComboState;
use super::events::GameEvent;
use super::follower::PathFollower;
use super::path::WaypointPath;
use super::pickup::WaterPickup;
use super::sun::SunState;
use super::survival::{GamePhase, SurvivalState};
use crate::tuning::Tuning;

#[derive(Debug, Clone)]
pub struct SimulationContext {
    /// Level number (1-based)
    pub level: u32,
    /// Seed the level was built from
    pub seed: u64,
    pub tuning: Tuning,
    pub sun: SunState,
    pub casters: CasterRegistry,
    pub path: WaypointPath,
    pub follower: PathFollower,
    pub survival: SurvivalState,
    pub combo: ComboState,
    pub pickups: Vec<WaterPickup>,
    /// Optional fixed goal; reaching it wins even mid-path
    pub end_point: Option<Vec3>,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Simulation clock in seconds (includes the countdown)
    pub clock: f32,
    /// Events produced since the host last drained them
    pub events: Vec<GameEvent>,
    pub(crate) last_progress: Option<usize>,
    pub(crate) last_sun_angle: Option<f32>,
    /// Seconds of play since the last nearby-water vacuum
    pub(crate) vacuum_timer: f32,
}

impl SimulationContext {
    /// Bare context with no obstacles or pickups, sun centered at the origin
    pub fn new(level: u32, tuning: Tuning, path: WaypointPath) -> Self {
        let sun = SunState::new(
            Vec3::ZERO,
            tuning.sun_radius,
            tuning.sun_min_angle,
            tuning.sun_max_angle,
            tuning.sun_follow_rate,
        );
        let follower = PathFollower::new(&path, &tuning);
        let survival = SurvivalState::new(&tuning);
        let combo = ComboState::new(&tuning);
        Self {
            level,
            seed: 0,
            tuning,
            sun,
            casters: CasterRegistry::new(),
            path,
            follower,
            survival,
            combo,
            pickups: Vec::new(),
            end_point: None,
            time_ticks: 0,
            clock: 0.0,
            events: Vec::new(),
            last_progress: None,
            last_sun_angle: None,
            vacuum_timer: 0.0,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.survival.phase()
    }

    pub fn is_over(&self) -> bool {
        self.survival.is_over()
    }

    /// Take every pending event, oldest first
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// (waypoint index, path length) for progress bars
    pub fn path_progress(&self) -> (usize, usize) {
        (
            self.follower.current_waypoint_index(&self.path),
            self.path.len(),
        )
    }

    /// Whether the drop stands within reach of the legacy end point
    pub fn at_end_point(&self) -> bool {
        self.end_point.is_some_and(|end| {
            self.follower.position.distance(end) < self.tuning.end_point_radius
        })
    }
}
