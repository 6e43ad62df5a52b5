//! Rolling combo for quick shadow hops and merges
//!
//! Each qualifying event bumps the count and yields a water bonus that grows
//! with the count. The combo drops back to zero when nothing qualifies for
//! `window` seconds.

use serde::{Deserialize, Serialize};

use crate::tuning::Tuning;

/// Presentation grade of the current combo
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComboTier {
    None,
    Combo,
    Great,
    Amazing,
}

impl ComboTier {
    pub fn for_count(count: u32) -> Self {
        match count {
            0 => ComboTier::None,
            1..=2 => ComboTier::Combo,
            3..=4 => ComboTier::Great,
            _ => ComboTier::Amazing,
        }
    }

    /// Banner text shown for a combo of `count`
    pub fn banner(&self, count: u32) -> String {
        match self {
            ComboTier::None => String::new(),
            ComboTier::Combo => format!("COMBO x{count}!"),
            ComboTier::Great => format!("GREAT x{count}!"),
            ComboTier::Amazing => format!("AMAZING x{count}!"),
        }
    }
}

/// Water to grant after a combo step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComboBonus {
    /// Combo count after the step
    pub count: u32,
    pub amount: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComboState {
    count: u32,
    last_timestamp: f32,
    pub window: f32,
    pub jump_bonus: f32,
    pub jump_step_bonus: f32,
    pub merge_bonus: f32,
    pub merge_step_bonus: f32,
}

impl ComboState {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            count: 0,
            last_timestamp: 0.0,
            window: tuning.combo_window,
            jump_bonus: tuning.shadow_jump_bonus,
            jump_step_bonus: tuning.shadow_jump_step_bonus,
            merge_bonus: tuning.merge_bonus,
            merge_step_bonus: tuning.merge_step_bonus,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn last_timestamp(&self) -> f32 {
        self.last_timestamp
    }

    /// Drop went directly from one shadow into another
    pub fn on_shadow_jump(&mut self, now: f32) -> ComboBonus {
        self.count += 1;
        self.last_timestamp = now;
        let amount = self.jump_bonus + self.count as f32 * self.jump_step_bonus;
        log::debug!("Shadow jump combo x{}: +{:.0} water", self.count, amount);
        ComboBonus {
            count: self.count,
            amount,
        }
    }

    /// Two shadows fused; worth two steps
    pub fn on_shadow_merge(&mut self, now: f32) -> ComboBonus {
        self.count += 2;
        self.last_timestamp = now;
        let amount = self.merge_bonus + self.count as f32 * self.merge_step_bonus;
        log::debug!("Shadow merge combo x{}: +{:.0} water", self.count, amount);
        ComboBonus {
            count: self.count,
            amount,
        }
    }

    /// Expire a stale combo; returns the count that was lost
    pub fn tick(&mut self, now: f32) -> Option<u32> {
        if self.count > 0 && now - self.last_timestamp > self.window {
            let lost = self.count;
            self.count = 0;
            log::debug!("Combo reset after x{}", lost);
            return Some(lost);
        }
        None
    }

    pub fn multiplier(&self) -> f32 {
        1.0 + self.count as f32 * 0.1
    }

    pub fn tier(&self) -> ComboTier {
        ComboTier::for_count(self.count)
    }
}
