//! Last Drop headless runner
//!
//! Loads a level (or the built-in demo), sweeps the sun back and forth, and
//! logs every simulation event until the level is won or lost.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;

    use anyhow::Context;
    use clap::Parser;
    use glam::Vec3;

    use last_drop::LevelConfig;
    use last_drop::ProgressTracker;
    use last_drop::sim::survival::LoseReason;
    use last_drop::sim::{EventSink, GamePhase, SimulationContext, TickInput, tick};

    /// Headless simulation of a Last Drop level
    #[derive(Parser, Debug)]
    #[command(version, about)]
    struct Args {
        /// Level JSON file (defaults to the built-in demo level)
        level: Option<PathBuf>,

        /// Fixed timestep in seconds
        #[arg(long, default_value_t = 1.0 / 60.0)]
        dt: f32,

        /// Seconds for one full left-right-left sun sweep (0 keeps the sun still)
        #[arg(long, default_value_t = 8.0)]
        sweep: f32,

        /// Stop after this many simulated seconds
        #[arg(long, default_value_t = 120.0)]
        max_seconds: f32,

        /// Progress file to update on a win
        #[arg(long)]
        progress: Option<PathBuf>,

        /// Also log per-tick HUD updates (water, time, sun angle)
        #[arg(long)]
        verbose_hud: bool,
    }

    /// Writes gameplay events to the log
    struct LogSink {
        verbose_hud: bool,
    }

    impl EventSink for LogSink {
        fn on_countdown(&mut self, label: &str) {
            log::info!("{label}");
        }

        fn on_game_started(&mut self) {
            log::info!("Go!");
        }

        fn on_win(&mut self, position: Vec3, time_used: f32, water: f32) {
            log::info!(
                "WIN at ({:.1}, {:.1}) after {:.1}s, {:.0}% water left",
                position.x,
                position.z,
                time_used,
                water
            );
        }

        fn on_lose(&mut self, reason: LoseReason) {
            log::info!("LOSE: {}", reason.as_str());
        }

        fn on_evaporate(&mut self, position: Vec3) {
            log::info!("Evaporating at ({:.1}, {:.1})", position.x, position.z);
        }

        fn on_shadow_merge(&mut self, position: Vec3) {
            log::info!("Shadows merged at ({:.1}, {:.1})", position.x, position.z);
        }

        fn on_water_collect(&mut self, _position: Vec3, amount: f32) {
            log::info!("+{amount:.1} water");
        }

        fn on_shadow_jump_combo(&mut self, count: u32) {
            log::info!("Shadow jump combo x{count}");
        }

        fn on_shadow_merge_combo(&mut self, count: u32) {
            log::info!("Shadow merge combo x{count}");
        }

        fn on_combo_reset(&mut self, count: u32) {
            log::debug!("Combo x{count} expired");
        }

        fn on_waypoint_reached(&mut self, index: usize) {
            log::info!("Waypoint {index}");
        }

        fn on_shadow_constraint_missed(&mut self, index: usize) {
            log::warn!("Waypoint {index} reached in sunlight");
        }

        fn on_water_percent_changed(&mut self, fraction: f32) {
            if self.verbose_hud {
                log::trace!("Water {:.0}%", fraction * 100.0);
            }
        }

        fn on_time_changed(&mut self, seconds: f32) {
            if self.verbose_hud {
                log::trace!("Time {seconds:.1}s");
            }
        }

        fn on_sun_angle_changed(&mut self, degrees: f32) {
            if self.verbose_hud {
                log::trace!("Sun {degrees:.1}°");
            }
        }

        fn on_path_progress_changed(&mut self, index: usize, total: usize) {
            log::debug!("Progress {index}/{total}");
        }
    }

    /// Triangle wave over [0, 1]; 0.5 (sun overhead) when sweeping is off
    fn sweep_position(clock: f32, period: f32) -> f32 {
        if period <= 0.0 {
            return 0.5;
        }
        let phase = (clock / period).fract();
        if phase < 0.5 { phase * 2.0 } else { 2.0 - phase * 2.0 }
    }

    fn load_level(path: Option<&PathBuf>) -> anyhow::Result<LevelConfig> {
        match path {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("reading level {}", path.display()))?;
                Ok(LevelConfig::from_json(&json)?)
            }
            None => Ok(LevelConfig::demo()),
        }
    }

    fn load_progress(path: &PathBuf) -> anyhow::Result<ProgressTracker> {
        if !path.exists() {
            return Ok(ProgressTracker::new());
        }
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading progress {}", path.display()))?;
        Ok(ProgressTracker::from_json(&json)?)
    }

    fn run_level(ctx: &mut SimulationContext, args: &Args) {
        let mut sink = LogSink {
            verbose_hud: args.verbose_hud,
        };
        let max_ticks = (args.max_seconds / args.dt).ceil() as u64;

        while !ctx.is_over() && ctx.time_ticks < max_ticks {
            let input = TickInput {
                sun_drag: Some(sweep_position(ctx.clock, args.sweep)),
            };
            tick(ctx, &input, args.dt);
            for event in ctx.drain_events() {
                event.dispatch(&mut sink);
            }
        }
    }

    pub fn run() -> anyhow::Result<()> {
        env_logger::init();
        let args = Args::parse();
        anyhow::ensure!(args.dt > 0.0, "--dt must be positive");

        let config = load_level(args.level.as_ref())?;
        let mut ctx = config.build()?;
        log::info!("Last Drop level {} (seed {})", ctx.level, ctx.seed);

        run_level(&mut ctx, &args);

        match ctx.phase() {
            GamePhase::Won => {
                let time_used = ctx.survival.time_used();
                let water = ctx.survival.water();
                println!("won in {time_used:.1}s with {water:.0}% water");

                if let Some(path) = &args.progress {
                    let mut progress = load_progress(path)?;
                    let stars = progress.record_level_completion(ctx.level, time_used, water);
                    std::fs::write(path, progress.to_json()?)
                        .with_context(|| format!("writing progress {}", path.display()))?;
                    println!("{stars} stars, {} total", progress.total_stars);
                }
            }
            GamePhase::Lost(reason) => println!("lost: {}", reason.as_str()),
            phase => println!("stopped after {:.1}s in phase {phase:?}", ctx.clock),
        }
        Ok(())
    }

}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    native::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The simulation is a library on the web; hosts drive `sim::tick` directly.
}
