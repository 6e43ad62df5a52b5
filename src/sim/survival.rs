//! Water and timer state, plus the win/lose decision
//!
//! Water only drains (fast in sunlight, slowly in shade) and the clock only
//! counts down. The single way back up is `add_water`. Running out of either
//! ends the level; finishing the path wins it. Both outcomes are terminal.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::events::GameEvent;
use super::follower::ShadowSample;
use crate::consts::{COUNTDOWN_GO, COUNTDOWN_STEP, MAX_WATER};
use crate::tuning::Tuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoseReason {
    NoWater,
    TimeOut,
}

impl LoseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoseReason::NoWater => "no_water",
            LoseReason::TimeOut => "time_out",
        }
    }
}

/// Current phase of a level run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Pre-game countdown; nothing drains, the drop stays put
    Countdown,
    /// Active gameplay
    Playing,
    Won,
    Lost(LoseReason),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CountdownStep {
    label: Option<String>,
    duration: f32,
}

/// Pre-game sequence, advanced once per tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountdownTimer {
    steps: Vec<CountdownStep>,
    index: usize,
    remaining: f32,
    announced: bool,
}

impl CountdownTimer {
    /// "3", "2", "1" for a second each, then "GO!" for half a second
    pub fn labelled() -> Self {
        let mut steps: Vec<CountdownStep> = (1..=3)
            .rev()
            .map(|i| CountdownStep {
                label: Some(i.to_string()),
                duration: COUNTDOWN_STEP,
            })
            .collect();
        steps.push(CountdownStep {
            label: Some("GO!".to_string()),
            duration: COUNTDOWN_GO,
        });
        Self::from_steps(steps)
    }

    /// Silent wait
    pub fn delay(seconds: f32) -> Self {
        Self::from_steps(vec![CountdownStep {
            label: None,
            duration: seconds.max(0.0),
        }])
    }

    fn from_steps(steps: Vec<CountdownStep>) -> Self {
        Self {
            steps,
            index: 0,
            remaining: 0.0,
            announced: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.index >= self.steps.len()
    }

    /// Advance by `dt`; returns true once the sequence has completed
    pub fn tick(&mut self, dt: f32, events: &mut Vec<GameEvent>) -> bool {
        if self.is_finished() {
            return true;
        }
        self.announce(events);
        self.remaining -= dt;
        if self.remaining > 0.0 {
            return false;
        }

        self.index += 1;
        self.announced = false;
        if self.is_finished() {
            return true;
        }
        self.announce(events);
        false
    }

    fn announce(&mut self, events: &mut Vec<GameEvent>) {
        if self.announced {
            return;
        }
        let step = &self.steps[self.index];
        if let Some(label) = &step.label {
            log::debug!("Countdown: {}", label);
            events.push(GameEvent::Countdown {
                label: label.clone(),
            });
        }
        self.remaining = step.duration;
        self.announced = true;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurvivalState {
    water: f32,
    time_remaining: f32,
    level_time: f32,
    phase: GamePhase,
    countdown: CountdownTimer,
    pub water_decay_rate: f32,
    pub sunlight_decay_rate: f32,
    pub protection_cap: f32,
    /// Include the pre-game countdown in `time_used`
    pub count_countdown_time: bool,
    countdown_elapsed: f32,
    was_in_shadow: bool,
}

impl SurvivalState {
    pub fn new(tuning: &Tuning) -> Self {
        let countdown = if tuning.show_countdown {
            CountdownTimer::labelled()
        } else {
            CountdownTimer::delay(tuning.start_delay)
        };
        Self {
            water: MAX_WATER,
            time_remaining: tuning.level_time,
            level_time: tuning.level_time,
            phase: GamePhase::Countdown,
            countdown,
            water_decay_rate: tuning.water_decay_rate,
            sunlight_decay_rate: tuning.sunlight_decay_rate,
            protection_cap: tuning.protection_cap,
            count_countdown_time: tuning.count_countdown_time,
            countdown_elapsed: 0.0,
            was_in_shadow: false,
        }
    }

    pub fn water(&self) -> f32 {
        self.water
    }

    pub fn water_fraction(&self) -> f32 {
        self.water / MAX_WATER
    }

    pub fn time_remaining(&self) -> f32 {
        self.time_remaining
    }

    /// Seconds elapsed on the level, counted from level start
    ///
    /// With `count_countdown_time` off, only playing time is counted.
    pub fn time_used(&self) -> f32 {
        let played = self.level_time - self.time_remaining;
        if self.count_countdown_time {
            played + self.countdown_elapsed
        } else {
            played
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Ticking drains water and time
    pub fn is_active(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    /// The countdown has finished (the run may already be over)
    pub fn is_started(&self) -> bool {
        self.phase != GamePhase::Countdown
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, GamePhase::Won | GamePhase::Lost(_))
    }

    /// Water lost per second for the given shadow cover
    pub fn decay_rate(&self, sample: &ShadowSample) -> f32 {
        if sample.in_shadow {
            let protection = (sample.strength * self.protection_cap).clamp(0.0, 1.0);
            self.water_decay_rate * (1.0 - protection)
        } else {
            self.sunlight_decay_rate
        }
    }

    /// Run the pre-game countdown; returns true on the tick play begins
    pub fn tick_countdown(&mut self, dt: f32, events: &mut Vec<GameEvent>) -> bool {
        if self.phase != GamePhase::Countdown {
            return false;
        }
        if self.countdown.tick(dt, events) {
            log::info!("Level started: {:.0}s on the clock", self.time_remaining);
            self.phase = GamePhase::Playing;
            events.push(GameEvent::GameStarted);
            return true;
        }
        // The tick that ends the countdown is already spent on play
        self.countdown_elapsed += dt;
        false
    }

    /// One playing tick: drain, detect evaporation, then decide win/lose
    ///
    /// Does nothing unless the phase is `Playing`.
    pub fn tick(
        &mut self,
        dt: f32,
        sample: &ShadowSample,
        position: Vec3,
        reached_goal: bool,
        events: &mut Vec<GameEvent>,
    ) {
        if !self.is_active() {
            return;
        }

        self.time_remaining = (self.time_remaining - dt).max(0.0);

        let decay = self.decay_rate(sample);
        self.water = (self.water - decay * dt).clamp(0.0, MAX_WATER);

        if self.was_in_shadow && !sample.in_shadow {
            log::debug!("Left shadow, evaporating at {:.0}%", self.water);
            events.push(GameEvent::Evaporate { position });
        }
        self.was_in_shadow = sample.in_shadow;

        events.push(GameEvent::WaterPercentChanged {
            fraction: self.water_fraction(),
        });
        events.push(GameEvent::TimeChanged {
            seconds: self.time_remaining,
        });

        if reached_goal {
            self.win(position, events);
        } else if self.water <= 0.0 {
            self.lose(LoseReason::NoWater, events);
        } else if self.time_remaining <= 0.0 {
            self.lose(LoseReason::TimeOut, events);
        }
    }

    /// End the run as a win (ignored once the run is over)
    pub fn win(&mut self, position: Vec3, events: &mut Vec<GameEvent>) {
        if self.is_over() {
            return;
        }
        self.phase = GamePhase::Won;
        log::info!(
            "Level won in {:.1}s with {:.0}% water",
            self.time_used(),
            self.water
        );
        events.push(GameEvent::Win {
            position,
            time_used: self.time_used(),
            water: self.water,
        });
    }

    fn lose(&mut self, reason: LoseReason, events: &mut Vec<GameEvent>) {
        if self.is_over() {
            return;
        }
        self.phase = GamePhase::Lost(reason);
        log::info!("Level lost: {}", reason.as_str());
        events.push(GameEvent::Lose { reason });
    }

    /// Top up water (capped at 100); ignored once the run is over
    pub fn add_water(&mut self, amount: f32, position: Vec3, events: &mut Vec<GameEvent>) {
        if self.is_over() {
            return;
        }
        let amount = if amount.is_finite() { amount.max(0.0) } else { 0.0 };
        self.water = (self.water + amount).min(MAX_WATER);
        log::debug!("Water +{:.1}, now {:.0}%", amount, self.water);
        events.push(GameEvent::WaterCollect { position, amount });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn playing(tuning: &Tuning) -> SurvivalState {
        let mut s = SurvivalState::new(tuning);
        let mut events = Vec::new();
        while !s.tick_countdown(0.5, &mut events) {}
        s
    }

    fn sun() -> ShadowSample {
        ShadowSample::default()
    }

    fn shade(strength: f32) -> ShadowSample {
        ShadowSample {
            in_shadow: true,
            shadow: None,
            strength,
        }
    }

    #[test]
    fn test_countdown_sequence() {
        let mut s = SurvivalState::new(&Tuning::default());
        let mut events = Vec::new();
        let mut ticks = 0;
        while !s.tick_countdown(0.1, &mut events) {
            // Nothing drains during the countdown
            s.tick(0.1, &sun(), Vec3::ZERO, false, &mut events);
            ticks += 1;
        }
        assert!(s.is_active());
        assert_eq!(s.water(), 100.0);
        // 3.5 seconds at 0.1 s per tick
        assert!((34..=40).contains(&ticks));

        let labels: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                GameEvent::Countdown { label } => Some(label.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(labels, vec!["3", "2", "1", "GO!"]);
        assert_eq!(events.last(), Some(&GameEvent::GameStarted));
    }

    #[test]
    fn test_time_used_counts_countdown() {
        let mut s = SurvivalState::new(&Tuning::default());
        let mut events = Vec::new();
        let mut clock = 0.0;
        loop {
            clock += 0.5;
            if s.tick_countdown(0.5, &mut events) {
                break;
            }
        }
        s.tick(0.5, &sun(), Vec3::ZERO, false, &mut events);
        s.tick(1.0, &sun(), Vec3::ZERO, false, &mut events);
        clock += 1.0;
        assert!((s.time_used() - clock).abs() < 1e-4);

        s.win(Vec3::ZERO, &mut events);
        let reported = events.iter().find_map(|e| match e {
            GameEvent::Win { time_used, .. } => Some(*time_used),
            _ => None,
        });
        assert_eq!(reported, Some(s.time_used()));
    }

    #[test]
    fn test_time_used_play_only() {
        let tuning = Tuning {
            count_countdown_time: false,
            ..Tuning::default()
        };
        let mut s = playing(&tuning);
        let mut events = Vec::new();
        s.tick(2.0, &sun(), Vec3::ZERO, false, &mut events);
        assert!((s.time_used() - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_flat_delay() {
        let tuning = Tuning {
            show_countdown: false,
            start_delay: 1.0,
            ..Tuning::default()
        };
        let mut s = SurvivalState::new(&tuning);
        let mut events = Vec::new();
        assert!(!s.tick_countdown(0.6, &mut events));
        assert!(s.tick_countdown(0.6, &mut events));
        assert!(events.iter().all(|e| !matches!(e, GameEvent::Countdown { .. })));
    }

    #[test]
    fn test_sunlight_decay() {
        let mut s = playing(&Tuning::default());
        let mut events = Vec::new();
        s.tick(1.0, &sun(), Vec3::ZERO, false, &mut events);
        assert!((s.water() - 90.0).abs() < 1e-4);
        assert!((s.time_remaining() - 39.0).abs() < 1e-4);
    }

    #[test]
    fn test_full_shadow_decay() {
        let mut s = playing(&Tuning::default());
        let mut events = Vec::new();
        s.tick(1.0, &shade(1.0), Vec3::ZERO, false, &mut events);
        // 2 * (1 - 0.9) = 0.2 per second
        assert!((s.water() - 99.8).abs() < 1e-4);
    }

    #[test]
    fn test_protection_never_total() {
        let s = playing(&Tuning::default());
        let full = s.decay_rate(&shade(1.0));
        assert!(full > 0.0);
        assert!(full < s.sunlight_decay_rate);
        assert!(s.decay_rate(&shade(0.0)) > s.decay_rate(&shade(0.5)));
        assert!(s.decay_rate(&shade(0.5)) > full);
    }

    #[test]
    fn test_evaporate_on_leaving_shadow_only() {
        let mut s = playing(&Tuning::default());
        let mut events = Vec::new();
        s.tick(0.1, &sun(), Vec3::ZERO, false, &mut events);
        s.tick(0.1, &shade(1.0), Vec3::ZERO, false, &mut events);
        s.tick(0.1, &shade(1.0), Vec3::ZERO, false, &mut events);
        s.tick(0.1, &sun(), Vec3::ZERO, false, &mut events);
        s.tick(0.1, &sun(), Vec3::ZERO, false, &mut events);
        let evaporations = events
            .iter()
            .filter(|e| matches!(e, GameEvent::Evaporate { .. }))
            .count();
        assert_eq!(evaporations, 1);
    }

    #[test]
    fn test_lose_no_water() {
        let mut s = playing(&Tuning::default());
        let mut events = Vec::new();
        for _ in 0..11 {
            s.tick(1.0, &sun(), Vec3::ZERO, false, &mut events);
        }
        assert_eq!(s.phase(), GamePhase::Lost(LoseReason::NoWater));
        assert!(s.time_remaining() > 0.0);
        assert_eq!(s.water(), 0.0);
    }

    #[test]
    fn test_lose_time_out() {
        let tuning = Tuning {
            level_time: 5.0,
            ..Tuning::default()
        };
        let mut s = playing(&tuning);
        let mut events = Vec::new();
        for _ in 0..6 {
            s.tick(1.0, &shade(1.0), Vec3::ZERO, false, &mut events);
        }
        assert_eq!(s.phase(), GamePhase::Lost(LoseReason::TimeOut));
        assert!(s.water() > 0.0);
        assert_eq!(LoseReason::TimeOut.as_str(), "time_out");
    }

    #[test]
    fn test_win_is_terminal_and_exclusive() {
        let mut s = playing(&Tuning::default());
        let mut events = Vec::new();
        s.tick(0.1, &sun(), Vec3::ZERO, true, &mut events);
        assert_eq!(s.phase(), GamePhase::Won);

        let water = s.water();
        for _ in 0..100 {
            s.tick(1.0, &sun(), Vec3::ZERO, false, &mut events);
        }
        assert_eq!(s.water(), water);

        let wins = events.iter().filter(|e| matches!(e, GameEvent::Win { .. })).count();
        let losses = events.iter().filter(|e| matches!(e, GameEvent::Lose { .. })).count();
        assert_eq!(wins, 1);
        assert_eq!(losses, 0);
    }

    #[test]
    fn test_add_water_caps() {
        let mut s = playing(&Tuning::default());
        let mut events = Vec::new();
        s.tick(3.0, &sun(), Vec3::ZERO, false, &mut events);
        s.add_water(20.0, Vec3::ZERO, &mut events);
        assert!((s.water() - 90.0).abs() < 1e-4);
        s.add_water(50.0, Vec3::ZERO, &mut events);
        assert_eq!(s.water(), 100.0);
        assert!(events.iter().any(|e| matches!(e, GameEvent::WaterCollect { .. })));
    }

    proptest! {
        #[test]
        fn water_only_drains_and_stays_clamped(
            steps in prop::collection::vec((0.0f32..0.5, any::<bool>(), 0.0f32..=1.0), 1..80)
        ) {
            let mut s = playing(&Tuning::default());
            let mut events = Vec::new();
            for (dt, in_shadow, strength) in steps {
                let before = s.water();
                let sample = ShadowSample { in_shadow, shadow: None, strength };
                s.tick(dt, &sample, Vec3::ZERO, false, &mut events);
                prop_assert!(s.water() <= before);
                prop_assert!((0.0..=MAX_WATER).contains(&s.water()));
            }
        }

        #[test]
        fn shade_always_beats_sunlight(a in 0.0f32..=1.0, b in 0.0f32..=1.0) {
            let s = SurvivalState::new(&Tuning::default());
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(s.decay_rate(&shade(lo)) < s.sunlight_decay_rate);
            prop_assert!(s.decay_rate(&shade(hi)) <= s.decay_rate(&shade(lo)));
        }
    }
}
