//! Simulation tick
//!
//! Advances the whole level by one host-supplied timestep. Update order is
//! fixed: sun, shadows, follower, combo, survival. Events are appended to
//! `ctx.events` in that same order.

use glam::Vec3;

use super::events::GameEvent;
use super::follower::FollowerEvent;
use super::pickup::collect_nearby;
use super::state::SimulationContext;

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Normalized horizontal drag position (0 = left, 1 = right), if dragging
    pub sun_drag: Option<f32>,
}

/// Sun angle change below this is not reported to the HUD
const SUN_ANGLE_EPSILON: f32 = 0.01;

/// Advance the simulation by `dt` seconds
pub fn tick(ctx: &mut SimulationContext, input: &TickInput, dt: f32) {
    if ctx.survival.is_over() || !(dt > 0.0) {
        return;
    }

    ctx.time_ticks += 1;
    ctx.clock += dt;

    // Sun and shadows
    if let Some(drag) = input.sun_drag {
        ctx.sun.set_target_angle(drag);
    }
    let moved = ctx.sun.tick(dt, &mut ctx.casters, ctx.tuning.shadow_turn_rate);
    if moved || ctx.last_sun_angle.is_none() {
        report_sun_angle(ctx);
    }

    let merges = ctx.casters.resolve_merges();
    for merge in &merges {
        let ground_y = ctx.casters.get(merge.a).map_or(0.0, |c| c.ground_y);
        ctx.events.push(GameEvent::ShadowMerge {
            position: Vec3::new(merge.point.x, ground_y, merge.point.y),
            a: merge.a,
            b: merge.b,
        });
    }

    // Countdown gates everything below
    ctx.survival.tick_countdown(dt, &mut ctx.events);
    if ctx.survival.is_started() {
        ctx.follower.start();
    }
    let playing = ctx.survival.is_active();

    // Follower
    let follower_events = ctx.follower.tick(&ctx.path, &ctx.casters, dt, !playing);
    for event in follower_events {
        match event {
            FollowerEvent::WaypointReached { index } => {
                ctx.events.push(GameEvent::WaypointReached { index })
            }
            FollowerEvent::ShadowConstraintMissed { index } => {
                ctx.events.push(GameEvent::ShadowConstraintMissed { index })
            }
            FollowerEvent::Arrived => {}
        }
    }
    report_progress(ctx);

    if !playing {
        return;
    }

    let position = ctx.follower.position;
    for (at, amount) in collect_nearby(&mut ctx.pickups, position, ctx.tuning.pickup_radius) {
        log::debug!("Picked up {:.0} water", amount);
        ctx.survival.add_water(amount, at, &mut ctx.events);
    }
    vacuum_pickups(ctx, position, dt);

    // Combo
    for _ in &merges {
        let bonus = ctx.combo.on_shadow_merge(ctx.clock);
        ctx.survival.add_water(bonus.amount, position, &mut ctx.events);
        ctx.events.push(GameEvent::ShadowMergeCombo { count: bonus.count });
    }
    if ctx.follower.shadow_jumped() {
        let bonus = ctx.combo.on_shadow_jump(ctx.clock);
        ctx.survival.add_water(bonus.amount, position, &mut ctx.events);
        ctx.events.push(GameEvent::ShadowJumpCombo { count: bonus.count });
    }
    if let Some(lost) = ctx.combo.tick(ctx.clock) {
        ctx.events.push(GameEvent::ComboReset { count: lost });
    }

    for (_, amount) in ctx.casters.shelter_rewards(dt, position) {
        ctx.survival.add_water(amount, position, &mut ctx.events);
    }

    // Survival
    let reached_goal = ctx.follower.is_arrived() || ctx.at_end_point();
    let sample = ctx.follower.sample();
    ctx.survival.tick(dt, &sample, position, reached_goal, &mut ctx.events);
}

/// Every `vacuum_interval` seconds, pull in pickups near the drop at a reduced value
fn vacuum_pickups(ctx: &mut SimulationContext, position: Vec3, dt: f32) {
    if !ctx.tuning.vacuum_enabled {
        return;
    }
    ctx.vacuum_timer += dt;
    if ctx.vacuum_timer < ctx.tuning.vacuum_interval {
        return;
    }
    ctx.vacuum_timer -= ctx.tuning.vacuum_interval;

    let nearby = collect_nearby(&mut ctx.pickups, position, ctx.tuning.vacuum_radius);
    for (at, amount) in nearby {
        let amount = amount * ctx.tuning.vacuum_fraction;
        log::debug!("Vacuumed {:.0} water", amount);
        ctx.survival.add_water(amount, at, &mut ctx.events);
    }
}

fn report_sun_angle(ctx: &mut SimulationContext) {
    let angle = ctx.sun.current_angle();
    let changed = ctx
        .last_sun_angle
        .is_none_or(|last| (last - angle).abs() > SUN_ANGLE_EPSILON);
    if changed {
        ctx.last_sun_angle = Some(angle);
        ctx.events.push(GameEvent::SunAngleChanged { degrees: angle });
    }
}

fn report_progress(ctx: &mut SimulationContext) {
    let (index, total) = ctx.path_progress();
    if ctx.last_progress != Some(index) {
        ctx.last_progress = Some(index);
        ctx.events.push(GameEvent::PathProgressChanged { index, total });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::caster::CasterId;
    use crate::sim::path::{Waypoint, WaypointPath};
    use crate::sim::pickup::WaterPickup;
    use crate::sim::survival::{GamePhase, LoseReason};
    use crate::tuning::Tuning;

    const DT: f32 = 0.05;

    fn quick_tuning() -> Tuning {
        Tuning {
            show_countdown: false,
            start_delay: 0.0,
            ..Tuning::default()
        }
    }

    fn line_path(points: &[(f32, f32)]) -> WaypointPath {
        WaypointPath::new(
            points
                .iter()
                .map(|&(x, z)| Waypoint::at(Vec3::new(x, 0.0, z)))
                .collect(),
        )
        .unwrap()
    }

    fn count(ctx: &SimulationContext, pred: impl Fn(&GameEvent) -> bool) -> usize {
        ctx.events.iter().filter(|e| pred(e)).count()
    }

    #[test]
    fn test_countdown_freezes_everything() {
        let path = line_path(&[(0.0, 0.0), (0.0, 10.0)]);
        let mut ctx = SimulationContext::new(1, Tuning::default(), path);
        for _ in 0..20 {
            tick(&mut ctx, &TickInput::default(), DT);
        }
        assert_eq!(ctx.phase(), GamePhase::Countdown);
        assert_eq!(ctx.follower.position, Vec3::ZERO);
        assert_eq!(ctx.survival.water(), 100.0);
        assert_eq!(ctx.survival.time_remaining(), 40.0);
    }

    #[test]
    fn test_reaching_last_waypoint_wins_once() {
        let path = line_path(&[(0.0, 0.0), (0.0, 1.5)]);
        let mut ctx = SimulationContext::new(1, quick_tuning(), path);
        for _ in 0..200 {
            tick(&mut ctx, &TickInput::default(), DT);
        }
        assert_eq!(ctx.phase(), GamePhase::Won);
        assert_eq!(count(&ctx, |e| matches!(e, GameEvent::Win { .. })), 1);
        assert_eq!(count(&ctx, |e| matches!(e, GameEvent::Lose { .. })), 0);

        // Terminal: further ticks change nothing
        let ticks = ctx.time_ticks;
        let water = ctx.survival.water();
        tick(&mut ctx, &TickInput::default(), DT);
        assert_eq!(ctx.time_ticks, ticks);
        assert_eq!(ctx.survival.water(), water);
    }

    #[test]
    fn test_sunlit_long_path_runs_dry() {
        let path = line_path(&[(0.0, 0.0), (0.0, 100.0)]);
        let mut ctx = SimulationContext::new(1, quick_tuning(), path);
        for _ in 0..400 {
            tick(&mut ctx, &TickInput::default(), DT);
        }
        assert_eq!(ctx.phase(), GamePhase::Lost(LoseReason::NoWater));
    }

    #[test]
    fn test_shadow_jump_awards_combo() {
        // Two shadows side by side along x whose margins touch; the drop walks
        // from one into the other without passing through sunlight
        let path = line_path(&[(0.0, 1.5), (2.0, 1.5), (2.0, 2.0)]);
        let mut ctx = SimulationContext::new(1, quick_tuning(), path);
        ctx.casters.spawn(Vec3::new(0.0, 0.0, 0.0), 3.0, 1.8);
        ctx.casters.spawn(Vec3::new(2.0, 0.0, 0.0), 3.0, 1.8);
        // Light far to the south so both shadows point along +z without touching
        ctx.sun.center = Vec3::new(0.0, 0.0, -1000.0);

        let mut jumps = 0;
        for _ in 0..60 {
            tick(&mut ctx, &TickInput::default(), DT);
            jumps += ctx
                .drain_events()
                .iter()
                .filter(|e| matches!(e, GameEvent::ShadowJumpCombo { .. }))
                .count();
        }
        assert_eq!(ctx.casters.merged_count(), 0);
        assert_eq!(jumps, 1);
    }

    #[test]
    fn test_merge_fires_single_event() {
        let path = line_path(&[(0.0, 0.0), (0.0, 50.0)]);
        let mut ctx = SimulationContext::new(1, quick_tuning(), path);
        ctx.casters.spawn(Vec3::new(5.0, 0.0, 0.0), 5.0, 1.0);
        ctx.casters.spawn(Vec3::new(5.8, 0.0, 0.0), 5.0, 1.0);

        for _ in 0..20 {
            tick(&mut ctx, &TickInput::default(), DT);
        }
        assert_eq!(count(&ctx, |e| matches!(e, GameEvent::ShadowMerge { .. })), 1);
        assert_eq!(count(&ctx, |e| matches!(e, GameEvent::ShadowMergeCombo { .. })), 1);
        assert!(ctx.casters.iter().all(|c| c.is_merged()));
        assert_eq!(ctx.combo.count(), 2);
    }

    #[test]
    fn test_pickup_adds_water() {
        let path = line_path(&[(0.0, 0.0), (0.0, 3.0), (0.0, 30.0)]);
        let mut ctx = SimulationContext::new(1, quick_tuning(), path);
        ctx.pickups.push(WaterPickup::new(Vec3::new(0.0, 0.0, 3.0), 20.0));

        let mut collected = 0.0;
        for _ in 0..40 {
            tick(&mut ctx, &TickInput::default(), DT);
            for e in ctx.drain_events() {
                if let GameEvent::WaterCollect { amount, .. } = e {
                    collected += amount;
                }
            }
        }
        assert_eq!(collected, 20.0);
        assert!(ctx.pickups[0].collected);
    }

    fn water_collected(ctx: &SimulationContext, expected: f32) -> usize {
        count(ctx, |e| {
            matches!(e, GameEvent::WaterCollect { amount, .. } if (amount - expected).abs() < 1e-4)
        })
    }

    #[test]
    fn test_vacuum_pulls_nearby_water() {
        // The drop waits at the origin; neither pickup is within regular reach
        let path = WaypointPath::new(vec![
            Waypoint::at(Vec3::ZERO).with_wait(5.0),
            Waypoint::at(Vec3::new(0.0, 0.0, 0.1)),
        ])
        .unwrap();
        let mut ctx = SimulationContext::new(1, quick_tuning(), path);
        ctx.pickups.push(WaterPickup::new(Vec3::new(1.5, 0.0, 0.0), 20.0));
        ctx.pickups.push(WaterPickup::new(Vec3::new(3.0, 0.0, 0.0), 20.0));

        for _ in 0..30 {
            tick(&mut ctx, &TickInput::default(), DT);
        }
        assert!(!ctx.pickups[0].collected);

        for _ in 0..20 {
            tick(&mut ctx, &TickInput::default(), DT);
        }
        assert!(ctx.pickups[0].collected);
        assert!(!ctx.pickups[1].collected);
        assert_eq!(water_collected(&ctx, 10.0), 1);
    }

    #[test]
    fn test_vacuum_can_be_disabled() {
        let path = WaypointPath::new(vec![
            Waypoint::at(Vec3::ZERO).with_wait(5.0),
            Waypoint::at(Vec3::new(0.0, 0.0, 0.1)),
        ])
        .unwrap();
        let tuning = Tuning {
            vacuum_enabled: false,
            ..quick_tuning()
        };
        let mut ctx = SimulationContext::new(1, tuning, path);
        ctx.pickups.push(WaterPickup::new(Vec3::new(1.5, 0.0, 0.0), 20.0));
        for _ in 0..60 {
            tick(&mut ctx, &TickInput::default(), DT);
        }
        assert!(!ctx.pickups[0].collected);
    }

    #[test]
    fn test_end_point_wins_mid_path() {
        let path = line_path(&[(0.0, 0.0), (0.0, 10.0)]);
        let mut ctx = SimulationContext::new(1, quick_tuning(), path);
        ctx.end_point = Some(Vec3::new(0.0, 0.0, 2.0));
        for _ in 0..100 {
            tick(&mut ctx, &TickInput::default(), DT);
        }
        assert_eq!(ctx.phase(), GamePhase::Won);
        assert!(!ctx.follower.is_arrived());
        assert!(ctx.follower.position.z < 2.0);
        assert_eq!(count(&ctx, |e| matches!(e, GameEvent::Win { .. })), 1);
    }

    #[test]
    fn test_shelter_rewards_waiting_drop() {
        // The drop waits inside two fused shadows. The nearer caster gives
        // nothing, the farther one still pays out every interval.
        let path = WaypointPath::new(vec![
            Waypoint::at(Vec3::new(0.0, 0.0, 1.5)).with_wait(10.0),
            Waypoint::at(Vec3::new(0.0, 0.0, 1.6)),
        ])
        .unwrap();
        let mut ctx = SimulationContext::new(1, quick_tuning(), path);
        ctx.casters.spawn(Vec3::new(0.0, 0.0, 1.0), 4.0, 1.0);
        ctx.casters.spawn(Vec3::ZERO, 4.0, 1.0).shelter_reward = Some(15.0);
        ctx.sun.center = Vec3::new(0.0, 0.0, -1000.0);

        for _ in 0..140 {
            tick(&mut ctx, &TickInput::default(), DT);
        }
        assert_eq!(ctx.follower.current_shadow(), Some(CasterId(0)));
        assert_eq!(ctx.casters.merged_count(), 2);
        assert!(!ctx.is_over());
        // 15 * 0.1 at roughly 3 s and 6 s
        assert_eq!(water_collected(&ctx, 1.5), 2);
    }

    #[test]
    fn test_time_used_includes_countdown() {
        let path = line_path(&[(0.0, 0.0), (0.0, 3.0)]);
        let mut ctx = SimulationContext::new(1, Tuning::default(), path);
        for _ in 0..200 {
            tick(&mut ctx, &TickInput::default(), DT);
        }
        assert_eq!(ctx.phase(), GamePhase::Won);
        // 3.5 s countdown plus roughly one second of walking
        assert!(ctx.clock > 4.0);
        assert!((ctx.survival.time_used() - ctx.clock).abs() < 1e-3);
    }

    #[test]
    fn test_sun_drag_reports_angle() {
        let path = line_path(&[(0.0, 0.0), (0.0, 30.0)]);
        let mut ctx = SimulationContext::new(1, quick_tuning(), path);
        let input = TickInput { sun_drag: Some(1.0) };
        for _ in 0..10 {
            tick(&mut ctx, &input, DT);
        }
        assert!(ctx.sun.current_angle() > 30.0);
        assert!(count(&ctx, |e| matches!(e, GameEvent::SunAngleChanged { .. })) > 1);
    }

    #[test]
    fn test_still_sun_reports_angle_once() {
        let path = line_path(&[(0.0, 0.0), (0.0, 30.0)]);
        let mut ctx = SimulationContext::new(1, quick_tuning(), path);
        for _ in 0..10 {
            tick(&mut ctx, &TickInput::default(), DT);
        }
        assert_eq!(count(&ctx, |e| matches!(e, GameEvent::SunAngleChanged { .. })), 1);
    }

    #[test]
    fn test_progress_events_follow_waypoints() {
        let path = line_path(&[(0.0, 0.0), (0.0, 0.6), (0.0, 1.2)]);
        let mut ctx = SimulationContext::new(1, quick_tuning(), path);
        for _ in 0..60 {
            tick(&mut ctx, &TickInput::default(), DT);
        }
        let progress: Vec<usize> = ctx
            .events
            .iter()
            .filter_map(|e| match e {
                GameEvent::PathProgressChanged { index, total } => {
                    assert_eq!(*total, 3);
                    Some(*index)
                }
                _ => None,
            })
            .collect();
        // Waypoint 0 is the spawn point and is passed on the first tick
        assert_eq!(progress, vec![1, 2, 3]);
    }

    #[test]
    fn test_determinism() {
        let build = || {
            let path = line_path(&[(0.0, 0.0), (1.0, 4.0), (0.0, 8.0)]);
            let mut ctx = SimulationContext::new(1, quick_tuning(), path);
            ctx.casters.spawn(Vec3::new(1.0, 0.0, 1.0), 4.0, 1.0);
            ctx.casters.spawn(Vec3::new(-1.0, 0.0, 5.0), 4.0, 1.0);
            ctx
        };
        let mut a = build();
        let mut b = build();
        for i in 0..200 {
            let input = TickInput {
                sun_drag: Some((i as f32 * 0.01).sin() * 0.5 + 0.5),
            };
            tick(&mut a, &input, DT);
            tick(&mut b, &input, DT);
        }
        assert_eq!(a.time_ticks, b.time_ticks);
        assert_eq!(a.survival.water(), b.survival.water());
        assert_eq!(a.follower.position, b.follower.position);
        assert_eq!(a.events, b.events);
    }
}
