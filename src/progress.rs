//! Level completion records
//!
//! Tracks best time and best star rating per level. Persisted as JSON by
//! the host; the tracker itself never touches the filesystem.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::consts::{STAR_FAST_TIME, STAR_WATER_LEFT};
use crate::level::LevelError;

/// Best result recorded for one level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelRecord {
    /// Fastest completion (seconds since level start)
    pub best_time: f32,
    /// Highest star rating achieved (1-3)
    pub stars: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressTracker {
    /// Highest level unlocked (1-based)
    pub current_level: u32,
    /// Sum of best stars over all levels
    pub total_stars: u32,
    pub levels: BTreeMap<u32, LevelRecord>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            current_level: 1,
            total_stars: 0,
            levels: BTreeMap::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, LevelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Stars for a finished run: one for finishing, one for speed, one for water left
    pub fn calculate_stars(time_used: f32, water_remaining: f32) -> u8 {
        let mut stars = 1;
        if time_used < STAR_FAST_TIME {
            stars += 1;
        }
        if water_remaining > STAR_WATER_LEFT {
            stars += 1;
        }
        stars.clamp(1, 3)
    }

    /// Record a win and return the stars earned by this run
    ///
    /// Best time and best stars only ever improve; `total_stars` grows by the
    /// improvement alone. Finishing a level unlocks the next one.
    pub fn record_level_completion(
        &mut self,
        level: u32,
        time_used: f32,
        water_remaining: f32,
    ) -> u8 {
        let stars = Self::calculate_stars(time_used, water_remaining);

        let record = self.levels.entry(level).or_insert(LevelRecord {
            best_time: f32::MAX,
            stars: 0,
        });
        if time_used < record.best_time {
            record.best_time = time_used;
        }
        if stars > record.stars {
            self.total_stars += u32::from(stars - record.stars);
            record.stars = stars;
        }

        self.current_level = self.current_level.max(level.saturating_add(1));

        log::info!(
            "Level {} complete: {} stars in {:.1}s (total {} stars)",
            level,
            stars,
            time_used,
            self.total_stars
        );
        stars
    }

    pub fn best_time(&self, level: u32) -> Option<f32> {
        self.levels.get(&level).map(|r| r.best_time)
    }

    pub fn stars(&self, level: u32) -> u8 {
        self.levels.get(&level).map_or(0, |r| r.stars)
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_rating() {
        assert_eq!(ProgressTracker::calculate_stars(30.0, 40.0), 1);
        assert_eq!(ProgressTracker::calculate_stars(20.0, 40.0), 2);
        assert_eq!(ProgressTracker::calculate_stars(30.0, 60.0), 2);
        assert_eq!(ProgressTracker::calculate_stars(20.0, 60.0), 3);
        // Thresholds are strict
        assert_eq!(ProgressTracker::calculate_stars(25.0, 50.0), 1);
    }

    #[test]
    fn test_only_improvements_count() {
        let mut p = ProgressTracker::new();
        assert!(p.is_empty());

        assert_eq!(p.record_level_completion(1, 30.0, 60.0), 2);
        assert_eq!(p.total_stars, 2);
        assert_eq!(p.best_time(1), Some(30.0));

        // Worse run keeps the old records
        assert_eq!(p.record_level_completion(1, 35.0, 10.0), 1);
        assert_eq!(p.total_stars, 2);
        assert_eq!(p.stars(1), 2);
        assert_eq!(p.best_time(1), Some(30.0));

        // Better run adds only the difference
        assert_eq!(p.record_level_completion(1, 20.0, 70.0), 3);
        assert_eq!(p.total_stars, 3);
        assert_eq!(p.best_time(1), Some(20.0));
    }

    #[test]
    fn test_unlocks_next_level() {
        let mut p = ProgressTracker::new();
        p.record_level_completion(1, 30.0, 30.0);
        assert_eq!(p.current_level, 2);
        // Replaying an earlier level never locks anything
        p.record_level_completion(3, 30.0, 30.0);
        p.record_level_completion(1, 30.0, 30.0);
        assert_eq!(p.current_level, 4);
        assert_eq!(p.total_stars, 2);
    }

    #[test]
    fn test_json_round_trip() {
        let mut p = ProgressTracker::new();
        p.record_level_completion(2, 22.5, 80.0);
        let back = ProgressTracker::from_json(&p.to_json().unwrap()).unwrap();
        assert_eq!(back, p);
        assert!(ProgressTracker::from_json("[]").is_err());
    }
}
