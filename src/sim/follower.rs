//! The drop walking its waypoint path
//!
//! States: `Idle -> Moving(0) -> Waiting(0) -> Moving(1) -> ... -> Arrived`.
//! With `ShadowRequirement::Hold`, an unshaded arrival at a shadow waypoint
//! parks in `Holding(i)` until a shadow covers the drop.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::caster::{CasterId, CasterRegistry};
use super::path::WaypointPath;
use crate::tuning::{ShadowRequirement, Tuning};
use crate::{ground_xz, move_towards, yaw_of, yaw_towards};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FollowerState {
    /// Placed on the first waypoint, not yet started
    Idle,
    /// Travelling toward waypoint `index`
    Moving { index: usize },
    /// Arrived unshaded at a shadow waypoint, waiting for cover
    Holding { index: usize },
    /// Pausing at waypoint `index`
    Waiting { index: usize, remaining: f32 },
    /// Finished the path
    Arrived,
}

/// Shadow cover observed at the drop's position this tick
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ShadowSample {
    pub in_shadow: bool,
    pub shadow: Option<CasterId>,
    pub strength: f32,
}

/// Path milestones produced while advancing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowerEvent {
    WaypointReached { index: usize },
    ShadowConstraintMissed { index: usize },
    Arrived,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathFollower {
    pub position: Vec3,
    /// Facing yaw (radians)
    pub heading: f32,
    pub state: FollowerState,
    pub move_speed: f32,
    pub rotation_speed: f32,
    pub arrival_threshold: f32,
    pub requirement: ShadowRequirement,
    sample: ShadowSample,
    previous_shadow: Option<CasterId>,
}

impl PathFollower {
    pub fn new(path: &WaypointPath, tuning: &Tuning) -> Self {
        Self {
            position: path.first().position,
            heading: 0.0,
            state: FollowerState::Idle,
            move_speed: tuning.move_speed,
            rotation_speed: tuning.rotation_speed,
            arrival_threshold: tuning.arrival_threshold,
            requirement: tuning.shadow_requirement,
            sample: ShadowSample::default(),
            previous_shadow: None,
        }
    }

    /// Leave `Idle` and head for the first waypoint
    pub fn start(&mut self) {
        if self.state == FollowerState::Idle {
            self.state = FollowerState::Moving { index: 0 };
        }
    }

    pub fn is_arrived(&self) -> bool {
        self.state == FollowerState::Arrived
    }

    pub fn is_moving(&self) -> bool {
        matches!(self.state, FollowerState::Moving { .. })
    }

    /// Index of the waypoint currently targeted; equals the path length once arrived
    pub fn current_waypoint_index(&self, path: &WaypointPath) -> usize {
        match self.state {
            FollowerState::Idle => 0,
            FollowerState::Moving { index }
            | FollowerState::Holding { index }
            | FollowerState::Waiting { index, .. } => index,
            FollowerState::Arrived => path.len(),
        }
    }

    pub fn sample(&self) -> ShadowSample {
        self.sample
    }

    pub fn in_shadow(&self) -> bool {
        self.sample.in_shadow
    }

    pub fn current_shadow(&self) -> Option<CasterId> {
        self.sample.shadow
    }

    /// True when the drop went straight from one shadow into a different one this tick
    pub fn shadow_jumped(&self) -> bool {
        match (self.previous_shadow, self.sample.shadow) {
            (Some(prev), Some(now)) => prev != now && self.sample.in_shadow,
            _ => false,
        }
    }

    /// Re-test shadow cover against every caster
    pub fn poll_shadow(&mut self, casters: &CasterRegistry) {
        self.previous_shadow = self.sample.shadow;
        let shadow = casters.shadow_at(self.position);
        self.sample = ShadowSample {
            in_shadow: shadow.is_some(),
            shadow,
            strength: shadow.map_or(0.0, |id| casters.shadow_strength(id, self.position)),
        };
    }

    /// One simulation step: move, sample shadow, then resolve waypoint transitions
    ///
    /// A `frozen` follower (pre-game) keeps sampling shadow but does not move.
    pub fn tick(
        &mut self,
        path: &WaypointPath,
        casters: &CasterRegistry,
        dt: f32,
        frozen: bool,
    ) -> Vec<FollowerEvent> {
        if !frozen {
            self.integrate(path, dt);
        }
        self.poll_shadow(casters);

        let mut events = Vec::new();
        if !frozen {
            self.advance(path, dt, &mut events);
        }
        events
    }

    fn integrate(&mut self, path: &WaypointPath, dt: f32) {
        let FollowerState::Moving { index } = self.state else {
            return;
        };
        let Some(wp) = path.get(index) else {
            return;
        };

        let direction = wp.position - self.position;
        if let Some(target_yaw) = yaw_of(ground_xz(direction)) {
            self.heading = yaw_towards(self.heading, target_yaw, self.rotation_speed * dt);
        }
        self.position = move_towards(self.position, wp.position, self.move_speed * dt);
    }

    fn advance(&mut self, path: &WaypointPath, dt: f32, events: &mut Vec<FollowerEvent>) {
        match self.state {
            FollowerState::Idle | FollowerState::Arrived => {}
            FollowerState::Moving { index } => {
                let Some(wp) = path.get(index) else {
                    return;
                };
                if self.position.distance(wp.position) < self.arrival_threshold {
                    self.arrive(path, index, events);
                }
            }
            FollowerState::Holding { index } => {
                if self.sample.in_shadow {
                    log::debug!("Waypoint {} now shaded, continuing", index);
                    self.begin_wait(path, index, events);
                }
            }
            FollowerState::Waiting { index, remaining } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    self.finish_wait(path, index, events);
                } else {
                    self.state = FollowerState::Waiting { index, remaining };
                }
            }
        }
    }

    fn arrive(&mut self, path: &WaypointPath, index: usize, events: &mut Vec<FollowerEvent>) {
        log::debug!("Reached waypoint {}", index);
        events.push(FollowerEvent::WaypointReached { index });

        let needs_shadow = path.get(index).is_some_and(|wp| wp.must_be_in_shadow);
        if needs_shadow && !self.sample.in_shadow {
            log::warn!(
                "Waypoint {} should be reached in shadow but the drop is in sunlight",
                index
            );
            events.push(FollowerEvent::ShadowConstraintMissed { index });
            if self.requirement == ShadowRequirement::Hold {
                self.state = FollowerState::Holding { index };
                return;
            }
        }
        self.begin_wait(path, index, events);
    }

    fn begin_wait(&mut self, path: &WaypointPath, index: usize, events: &mut Vec<FollowerEvent>) {
        let wait = path.get(index).map_or(0.0, |wp| wp.wait_time);
        if wait > 0.0 {
            self.state = FollowerState::Waiting {
                index,
                remaining: wait,
            };
        } else {
            self.finish_wait(path, index, events);
        }
    }

    fn finish_wait(&mut self, path: &WaypointPath, index: usize, events: &mut Vec<FollowerEvent>) {
        if index >= path.last_index() {
            log::info!("Path complete");
            self.state = FollowerState::Arrived;
            events.push(FollowerEvent::Arrived);
        } else {
            self.state = FollowerState::Moving { index: index + 1 };
        }
    }
}
