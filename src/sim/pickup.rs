//! Water pickups scattered along the level

use glam::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaterPickup {
    pub position: Vec3,
    pub amount: f32,
    #[serde(default)]
    pub collected: bool,
}

impl WaterPickup {
    pub fn new(position: Vec3, amount: f32) -> Self {
        Self {
            position,
            amount,
            collected: false,
        }
    }
}

/// Mark every uncollected pickup within `radius` of `position` as taken
///
/// Returns (position, amount) for each pickup collected this call.
pub fn collect_nearby(
    pickups: &mut [WaterPickup],
    position: Vec3,
    radius: f32,
) -> Vec<(Vec3, f32)> {
    pickups
        .iter_mut()
        .filter(|p| !p.collected && p.position.distance(position) <= radius)
        .map(|p| {
            p.collected = true;
            (p.position, p.amount)
        })
        .collect()
}
