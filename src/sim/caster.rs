//! Shadow casters and the caster registry
//!
//! Every obstacle projects one footprint away from the light. Two footprints
//! that touch fuse permanently: both stop turning, stop moving, and become a
//! single protected zone.

use glam::{Vec2, Vec3};
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::footprint::ShadowFootprint;
use crate::consts::{SHELTER_INTERVAL, SHELTER_REWARD_FRACTION};
use crate::{ground_xz, yaw_of, yaw_towards};

/// Stable handle for a caster inside a `CasterRegistry`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CasterId(pub u32);

/// Result of a successful merge between two casters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MergeEvent {
    pub a: CasterId,
    pub b: CasterId,
    /// Midpoint of the two footprint anchors
    pub point: Vec2,
}

/// Looping movement for dynamic obstacles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CasterMotion {
    pub waypoints: Vec<Vec3>,
    /// Units per second
    pub speed: f32,
    /// Pause at each waypoint (seconds)
    pub wait_time: f32,
    index: usize,
    leg_start: Option<Vec3>,
    leg_elapsed: f32,
    wait_remaining: f32,
}

impl CasterMotion {
    pub fn new(waypoints: Vec<Vec3>, speed: f32, wait_time: f32) -> Self {
        Self {
            waypoints,
            speed,
            wait_time,
            index: 0,
            leg_start: None,
            leg_elapsed: 0.0,
            wait_remaining: 0.0,
        }
    }

    /// Four seeded points around `center`, one per quadrant, 2-4 units out
    pub fn around(center: Vec3, rng: &mut Pcg32, speed: f32, wait_time: f32) -> Self {
        let waypoints = (0..4)
            .map(|i| {
                let angle = (i as f32 * 90.0).to_radians();
                let dx = angle.cos() * rng.random_range(2.0..4.0);
                let dz = angle.sin() * rng.random_range(2.0..4.0);
                center + Vec3::new(dx, 0.0, dz)
            })
            .collect();
        Self::new(waypoints, speed, wait_time)
    }

    pub fn is_waiting(&self) -> bool {
        self.wait_remaining > 0.0
    }

    /// Advance along the loop and return the new position
    pub fn step(&mut self, position: Vec3, dt: f32) -> Vec3 {
        if self.waypoints.len() < 2 || self.speed <= 0.0 {
            return position;
        }

        if self.wait_remaining > 0.0 {
            self.wait_remaining = (self.wait_remaining - dt).max(0.0);
            return position;
        }

        let start = *self.leg_start.get_or_insert(position);
        let target = self.waypoints[self.index];
        let duration = start.distance(target) / self.speed;

        self.leg_elapsed += dt;
        let t = if duration <= f32::EPSILON {
            1.0
        } else {
            (self.leg_elapsed / duration).min(1.0)
        };

        if t >= 1.0 {
            self.index = (self.index + 1) % self.waypoints.len();
            self.leg_start = Some(target);
            self.leg_elapsed = 0.0;
            self.wait_remaining = self.wait_time.max(0.0);
            return target;
        }

        // Ease in/out
        let eased = t * t * (3.0 - 2.0 * t);
        start.lerp(target, eased)
    }
}

/// Breathing size change for pulsing obstacles
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CasterPulse {
    pub min_scale: f32,
    pub max_scale: f32,
    /// Radians of the pulse wave per second
    pub speed: f32,
    elapsed: f32,
}

impl CasterPulse {
    pub fn new(min_scale: f32, max_scale: f32, speed: f32) -> Self {
        Self {
            min_scale,
            max_scale,
            speed,
            elapsed: 0.0,
        }
    }

    /// Current footprint scale, halfway between the bounds at t = 0
    pub fn scale(&self) -> f32 {
        let t = ((self.elapsed * self.speed).sin() + 1.0) * 0.5;
        self.min_scale + (self.max_scale - self.min_scale) * t
    }

    pub fn step(&mut self, dt: f32) {
        self.elapsed += dt;
    }
}

/// An obstacle that projects a shadow footprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShadowCaster {
    pub id: CasterId,
    pub name: String,
    /// World position of the obstacle
    pub position: Vec3,
    /// Height of the ground the shadow lies on
    pub ground_y: f32,
    pub shadow_length: f32,
    pub shadow_width: f32,
    /// Optional looping movement (stops once merged)
    pub motion: Option<CasterMotion>,
    /// Water granted periodically while the drop hides here
    pub shelter_reward: Option<f32>,
    /// Optional size pulse applied to the footprint (frozen once merged)
    pub pulse: Option<CasterPulse>,
    footprint: Option<ShadowFootprint>,
    last_light: Option<Vec3>,
    last_position: Option<Vec3>,
    last_scale: f32,
    merged_with: Option<CasterId>,
    merge_point: Option<Vec2>,
    shelter_timer: f32,
}

impl ShadowCaster {
    pub fn new(id: CasterId, position: Vec3, shadow_length: f32, shadow_width: f32) -> Self {
        Self {
            id,
            name: format!("Caster_{}", id.0),
            position,
            ground_y: 0.0,
            shadow_length,
            shadow_width,
            motion: None,
            shelter_reward: None,
            pulse: None,
            footprint: None,
            last_light: None,
            last_position: None,
            last_scale: 1.0,
            merged_with: None,
            merge_point: None,
            shelter_timer: 0.0,
        }
    }

    pub fn footprint(&self) -> Option<&ShadowFootprint> {
        self.footprint.as_ref()
    }

    pub fn is_merged(&self) -> bool {
        self.merged_with.is_some()
    }

    pub fn merge_partner(&self) -> Option<CasterId> {
        self.merged_with
    }

    pub fn merge_point(&self) -> Option<Vec2> {
        self.merge_point
    }

    /// Footprint size multiplier from the pulse, 1.0 for steady casters
    pub fn scale(&self) -> f32 {
        self.pulse.as_ref().map_or(1.0, CasterPulse::scale)
    }

    /// Move the obstacle along its motion loop and advance its pulse
    /// (both frozen once merged)
    pub fn step_motion(&mut self, dt: f32) {
        if self.is_merged() {
            return;
        }
        if let Some(motion) = self.motion.as_mut() {
            self.position = motion.step(self.position, dt);
        }
        if let Some(pulse) = self.pulse.as_mut() {
            pulse.step(dt);
        }
    }

    /// Turn the footprint to point away from the light
    ///
    /// The first call snaps into place; later calls ease toward the target yaw
    /// by `turn_rate * dt` of the remaining arc. Returns true if anything moved.
    pub fn update_orientation(&mut self, light: Vec3, dt: f32, turn_rate: f32) -> bool {
        if self.is_merged() {
            return false;
        }
        let scale = self.scale();
        if self.last_light == Some(light)
            && self.last_position == Some(self.position)
            && self.last_scale == scale
        {
            return false;
        }

        let anchor = ground_xz(self.position);
        let away = anchor - ground_xz(light);
        let length = self.shadow_length * scale;
        let width = self.shadow_width * scale;

        match self.footprint.as_mut() {
            Some(fp) => {
                if let Some(target) = yaw_of(away) {
                    fp.yaw = yaw_towards(fp.yaw, target, dt * turn_rate);
                }
                fp.anchor = anchor;
                fp.ground_y = self.ground_y;
                fp.length = length;
                fp.width = width;
            }
            None => {
                let yaw = yaw_of(away).unwrap_or(0.0);
                self.footprint = Some(ShadowFootprint::new(
                    anchor,
                    self.ground_y,
                    yaw,
                    length,
                    width,
                ));
            }
        }

        self.last_light = Some(light);
        self.last_position = Some(self.position);
        self.last_scale = scale;
        true
    }

    /// First unmerged candidate whose footprint overlaps ours
    pub fn find_merge_partner<'a, I>(&self, candidates: I) -> Option<CasterId>
    where
        I: IntoIterator<Item = &'a ShadowCaster>,
    {
        if self.is_merged() {
            return None;
        }
        let fp = self.footprint.as_ref()?;
        candidates
            .into_iter()
            .filter(|c| c.id != self.id && !c.is_merged())
            .find(|c| c.footprint.as_ref().is_some_and(|other| fp.overlaps(other)))
            .map(|c| c.id)
    }

    fn mark_merged(&mut self, partner: CasterId, point: Vec2) {
        self.merged_with = Some(partner);
        self.merge_point = Some(point);
    }

    pub fn is_point_in_shadow(&self, point: Vec3) -> bool {
        self.footprint
            .as_ref()
            .is_some_and(|fp| fp.contains_point(point))
    }

    pub fn shadow_strength(&self, point: Vec3) -> f32 {
        self.footprint.as_ref().map_or(0.0, |fp| fp.strength(point))
    }

    /// Tick the shelter reward timer; returns water to grant when it fires
    pub fn shelter_tick(&mut self, dt: f32, sheltering: bool) -> Option<f32> {
        let reward = self.shelter_reward?;
        if !sheltering {
            self.shelter_timer = 0.0;
            return None;
        }
        self.shelter_timer += dt;
        if self.shelter_timer >= SHELTER_INTERVAL {
            self.shelter_timer -= SHELTER_INTERVAL;
            Some(reward * SHELTER_REWARD_FRACTION)
        } else {
            None
        }
    }
}

/// Arena of casters indexed by stable ids (always sorted by id)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CasterRegistry {
    casters: Vec<ShadowCaster>,
    next_id: u32,
}

impl CasterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a caster and return it for further configuration
    pub fn spawn(
        &mut self,
        position: Vec3,
        shadow_length: f32,
        shadow_width: f32,
    ) -> &mut ShadowCaster {
        let id = CasterId(self.next_id);
        self.next_id += 1;
        self.casters
            .push(ShadowCaster::new(id, position, shadow_length, shadow_width));
        let last = self.casters.len() - 1;
        &mut self.casters[last]
    }

    fn index_of(&self, id: CasterId) -> Option<usize> {
        self.casters.binary_search_by_key(&id, |c| c.id).ok()
    }

    pub fn get(&self, id: CasterId) -> Option<&ShadowCaster> {
        self.index_of(id).map(|i| &self.casters[i])
    }

    pub fn get_mut(&mut self, id: CasterId) -> Option<&mut ShadowCaster> {
        self.index_of(id).map(move |i| &mut self.casters[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ShadowCaster> {
        self.casters.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ShadowCaster> {
        self.casters.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.casters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.casters.is_empty()
    }

    pub fn merged_count(&self) -> usize {
        self.casters.iter().filter(|c| c.is_merged()).count()
    }

    /// Move dynamic obstacles, then turn every footprint toward the light
    pub fn update_all(&mut self, light: Vec3, dt: f32, turn_rate: f32) {
        for caster in &mut self.casters {
            caster.step_motion(dt);
            caster.update_orientation(light, dt, turn_rate);
        }
    }

    /// Merge check for one caster against every other registered caster
    ///
    /// Already-merged casters are ignored, so repeated calls are no-ops.
    pub fn check_for_merge(&mut self, id: CasterId) -> Option<MergeEvent> {
        let i = self.index_of(id)?;
        let partner = self.casters[i].find_merge_partner(self.casters.iter())?;
        let j = self.index_of(partner)?;

        let a_anchor = self.casters[i].footprint.as_ref()?.anchor;
        let b_anchor = self.casters[j].footprint.as_ref()?.anchor;
        let point = a_anchor.lerp(b_anchor, 0.5);

        self.casters[i].mark_merged(partner, point);
        self.casters[j].mark_merged(id, point);

        log::info!(
            "Shadows merged: {} + {} at ({:.2}, {:.2})",
            self.casters[i].name,
            self.casters[j].name,
            point.x,
            point.y
        );

        Some(MergeEvent {
            a: id,
            b: partner,
            point,
        })
    }

    /// Run the merge check for every caster in id order
    pub fn resolve_merges(&mut self) -> Vec<MergeEvent> {
        let ids: Vec<CasterId> = self.casters.iter().map(|c| c.id).collect();
        ids.into_iter()
            .filter_map(|id| self.check_for_merge(id))
            .collect()
    }

    /// Caster whose shadow covers `point`; nearest anchor wins, ties go to the lower id
    pub fn shadow_at(&self, point: Vec3) -> Option<CasterId> {
        let ground = ground_xz(point);
        self.casters
            .iter()
            .filter(|c| c.is_point_in_shadow(point))
            .map(|c| (c.id, ground.distance_squared(ground_xz(c.position))))
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
            .map(|(id, _)| id)
    }

    pub fn is_point_in_shadow(&self, id: CasterId, point: Vec3) -> bool {
        self.get(id).is_some_and(|c| c.is_point_in_shadow(point))
    }

    pub fn shadow_strength(&self, id: CasterId, point: Vec3) -> f32 {
        self.get(id).map_or(0.0, |c| c.shadow_strength(point))
    }

    /// Advance every shelter timer for a drop at `position`
    ///
    /// Each caster whose shadow contains the drop runs its own timer, so
    /// overlapping rewarding shadows all pay out. Returns (caster, water)
    /// for each timer that fired.
    pub fn shelter_rewards(&mut self, dt: f32, position: Vec3) -> Vec<(CasterId, f32)> {
        self.casters
            .iter_mut()
            .filter_map(|c| {
                let inside = c.is_point_in_shadow(position);
                c.shelter_tick(dt, inside).map(|w| (c.id, w))
            })
            .collect()
    }
}
