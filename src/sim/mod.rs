//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Host-supplied timestep only
//! - Seeded RNG only (level build)
//! - Stable iteration order (by caster ID)
//! - Fixed update order: sun, shadows, follower, combo, survival
//! - No rendering or platform dependencies

pub mod caster;
pub mod combo;
pub mod events;
pub mod follower;
pub mod footprint;
pub mod path;
pub mod pickup;
pub mod state;
pub mod sun;
pub mod survival;
pub mod tick;

pub use caster::{CasterId, CasterMotion, CasterPulse, CasterRegistry, MergeEvent, ShadowCaster};
pub use combo::{ComboBonus, ComboState, ComboTier};
pub use events::{EventSink, GameEvent};
pub use follower::{FollowerEvent, FollowerState, PathFollower, ShadowSample};
pub use footprint::ShadowFootprint;
pub use path::{Waypoint, WaypointPath};
pub use pickup::WaterPickup;
pub use state::SimulationContext;
pub use sun::SunState;
pub use survival::{CountdownTimer, GamePhase, LoseReason, SurvivalState};
pub use tick::{TickInput, tick};
