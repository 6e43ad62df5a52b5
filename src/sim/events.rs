//! Events the simulation emits for the host
//!
//! The core never calls audio, particles or UI directly. Each tick appends
//! events to `SimulationContext::events`; the host drains them and forwards
//! them to whatever plays effects or draws the HUD.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::caster::CasterId;
use super::survival::LoseReason;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    // === Flow ===
    /// Countdown step ("3", "2", "1", "GO!")
    Countdown { label: String },
    GameStarted,
    Win { position: Vec3, time_used: f32, water: f32 },
    Lose { reason: LoseReason },

    // === Effects ===
    /// Drop stepped out of shadow into sunlight
    Evaporate { position: Vec3 },
    ShadowMerge { position: Vec3, a: CasterId, b: CasterId },
    WaterCollect { position: Vec3, amount: f32 },
    ShadowJumpCombo { count: u32 },
    ShadowMergeCombo { count: u32 },
    ComboReset { count: u32 },
    WaypointReached { index: usize },
    ShadowConstraintMissed { index: usize },

    // === Presentation ===
    WaterPercentChanged { fraction: f32 },
    TimeChanged { seconds: f32 },
    SunAngleChanged { degrees: f32 },
    PathProgressChanged { index: usize, total: usize },
}

/// Host-side receiver; every method defaults to doing nothing
pub trait EventSink {
    fn on_countdown(&mut self, _label: &str) {}
    fn on_game_started(&mut self) {}
    fn on_win(&mut self, _position: Vec3, _time_used: f32, _water: f32) {}
    fn on_lose(&mut self, _reason: LoseReason) {}
    fn on_evaporate(&mut self, _position: Vec3) {}
    fn on_shadow_merge(&mut self, _position: Vec3) {}
    fn on_water_collect(&mut self, _position: Vec3, _amount: f32) {}
    fn on_shadow_jump_combo(&mut self, _count: u32) {}
    fn on_shadow_merge_combo(&mut self, _count: u32) {}
    fn on_combo_reset(&mut self, _count: u32) {}
    fn on_waypoint_reached(&mut self, _index: usize) {}
    fn on_shadow_constraint_missed(&mut self, _index: usize) {}
    fn on_water_percent_changed(&mut self, _fraction: f32) {}
    fn on_time_changed(&mut self, _seconds: f32) {}
    fn on_sun_angle_changed(&mut self, _degrees: f32) {}
    fn on_path_progress_changed(&mut self, _index: usize, _total: usize) {}
}

impl GameEvent {
    /// Route this event to the matching sink method
    pub fn dispatch(&self, sink: &mut dyn EventSink) {
        match self {
            GameEvent::Countdown { label } => sink.on_countdown(label),
            GameEvent::GameStarted => sink.on_game_started(),
            GameEvent::Win {
                position,
                time_used,
                water,
            } => sink.on_win(*position, *time_used, *water),
            GameEvent::Lose { reason } => sink.on_lose(*reason),
            GameEvent::Evaporate { position } => sink.on_evaporate(*position),
            GameEvent::ShadowMerge { position, .. } => sink.on_shadow_merge(*position),
            GameEvent::WaterCollect { position, amount } => {
                sink.on_water_collect(*position, *amount)
            }
            GameEvent::ShadowJumpCombo { count } => sink.on_shadow_jump_combo(*count),
            GameEvent::ShadowMergeCombo { count } => sink.on_shadow_merge_combo(*count),
            GameEvent::ComboReset { count } => sink.on_combo_reset(*count),
            GameEvent::WaypointReached { index } => sink.on_waypoint_reached(*index),
            GameEvent::ShadowConstraintMissed { index } => sink.on_shadow_constraint_missed(*index),
            GameEvent::WaterPercentChanged { fraction } => sink.on_water_percent_changed(*fraction),
            GameEvent::TimeChanged { seconds } => sink.on_time_changed(*seconds),
            GameEvent::SunAngleChanged { degrees } => sink.on_sun_angle_changed(*degrees),
            GameEvent::PathProgressChanged { index, total } => {
                sink.on_path_progress_changed(*index, *total)
            }
        }
    }
}

/// Forward a batch of events in order
pub fn dispatch_all<'a, I>(events: I, sink: &mut dyn EventSink)
where
    I: IntoIterator<Item = &'a GameEvent>,
{
    for event in events {
        event.dispatch(sink);
    }
}
