pub mod aim;
pub mod collision;
pub mod config;
pub mod level;
pub mod physics;
pub mod scoring;

use minigolf_core::SimListener;

use aim::Shot;
use config::PhysicsConfig;
use level::{Level, LevelError, all_levels, is_level_unlocked, validate_levels};
use physics::{BallSimulation, HoleTarget};
use scoring::{HoleResult, Scorecard};

/// A play session over a list of levels.
///
/// Owns the one `BallSimulation`, tracks which level is loaded and records
/// each finished hole into a `Scorecard` exactly once.
pub struct MiniGolf<L = ()> {
    levels: Vec<Level>,
    level_index: usize,
    base_config: PhysicsConfig,
    difficulty_tuning: bool,
    sim: BallSimulation<L>,
    scorecard: Scorecard,
    hole_recorded: bool,
}

impl<L: SimListener> MiniGolf<L> {
    /// Session over the built-in levels, starting on the first.
    pub fn new(config: PhysicsConfig, listener: L) -> Self {
        let levels = all_levels();
        let sim = BallSimulation::for_level(config.clone(), &levels[0], listener);
        Self {
            levels,
            level_index: 0,
            base_config: config,
            difficulty_tuning: false,
            sim,
            scorecard: Scorecard::new(),
            hole_recorded: false,
        }
    }

    /// Session over custom levels, starting on the first.
    pub fn with_levels(
        levels: Vec<Level>,
        config: PhysicsConfig,
        listener: L,
    ) -> Result<Self, LevelError> {
        validate_levels(&levels)?;
        let sim = BallSimulation::for_level(config.clone(), &levels[0], listener);
        Ok(Self {
            levels,
            level_index: 0,
            base_config: config,
            difficulty_tuning: false,
            sim,
            scorecard: Scorecard::new(),
            hole_recorded: false,
        })
    }

    /// Apply each level's difficulty tier (friction, cup size, shot power).
    /// Reloads the current level.
    pub fn with_difficulty_tuning(mut self, enabled: bool) -> Self {
        self.difficulty_tuning = enabled;
        self.load_level(self.level_index);
        self
    }

    pub fn with_scorecard(mut self, scorecard: Scorecard) -> Self {
        self.scorecard = scorecard;
        self
    }

    pub fn sim(&self) -> &BallSimulation<L> {
        &self.sim
    }

    pub fn sim_mut(&mut self) -> &mut BallSimulation<L> {
        &mut self.sim
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn level(&self) -> &Level {
        &self.levels[self.level_index]
    }

    /// Current level index (0-based).
    pub fn level_index(&self) -> usize {
        self.level_index
    }

    pub fn total_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn scorecard(&self) -> &Scorecard {
        &self.scorecard
    }

    /// Whether the level at `index` is open given the bests recorded so far.
    pub fn is_unlocked(&self, index: usize) -> bool {
        self.levels
            .get(index)
            .is_some_and(|l| is_level_unlocked(&self.levels, l.id, self.scorecard.bests()))
    }

    /// Load the level at `index`. Returns false (and changes nothing) when
    /// out of range.
    pub fn load_level(&mut self, index: usize) -> bool {
        let Some(level) = self.levels.get(index) else {
            tracing::warn!(index, total = self.levels.len(), "level index out of range");
            return false;
        };

        let config = if self.difficulty_tuning {
            self.base_config.for_difficulty(&level.difficulty.settings())
        } else {
            self.base_config.clone()
        };
        self.sim.set_config(config);
        self.sim.load_level(level);
        if self.difficulty_tuning {
            let cup = level.difficulty.settings().hole_radius;
            self.sim.set_hole(HoleTarget::new(level.hole_target().position, cup));
        }

        self.level_index = index;
        self.hole_recorded = false;
        true
    }

    /// Advance to the next level. Returns false on the last one.
    pub fn next_level(&mut self) -> bool {
        self.load_level(self.level_index + 1)
    }

    /// Start the current level over.
    pub fn replay(&mut self) {
        self.load_level(self.level_index);
    }

    /// Ball back to the tee, stroke count cleared.
    pub fn reset(&mut self) {
        self.sim.reset_to_start();
        self.hole_recorded = false;
    }

    /// Take a shot. Returns whether the simulation accepted it.
    pub fn shoot(&mut self, shot: &Shot) -> bool {
        let shot = if self.difficulty_tuning {
            shot.scaled(self.level().difficulty.settings().power_multiplier)
        } else {
            *shot
        };
        let before = self.sim.strokes();
        self.sim.apply_shot(shot.direction(), shot.power());
        self.sim.strokes() != before
    }

    /// Advance one frame. Returns the result on the frame the hole is finished.
    pub fn update(&mut self, dt: f32) -> Option<HoleResult> {
        self.sim.update(dt);
        if !self.sim.is_sunk() || self.hole_recorded {
            return None;
        }
        self.hole_recorded = true;
        let level = &self.levels[self.level_index];
        Some(self.scorecard.record(level.id, level.par, self.sim.strokes()))
    }
}

impl Default for MiniGolf {
    fn default() -> Self {
        Self::new(PhysicsConfig::default(), ())
    }
}

#[cfg(test)]
mod tests {
    use minigolf_core::{EventLog, SimEvent, Vec3};

    use super::*;
    use crate::scoring::ScoreLabel;

    const DT: f32 = 1.0 / 60.0;

    fn play_until_settled<L: SimListener>(game: &mut MiniGolf<L>) -> Option<HoleResult> {
        let mut result = None;
        for _ in 0..2000 {
            if let Some(r) = game.update(DT) {
                result = Some(r);
            }
            if !matches!(game.sim().state(), physics::SimState::Rolling) {
                break;
            }
        }
        result
    }

    /// A putt along +X that comes to rest on the Warm Up cup.
    fn warm_up_putt() -> Shot {
        Shot::new(Vec3::X, 9.0).unwrap()
    }

    #[test]
    fn starts_on_first_level() {
        let game = MiniGolf::default();
        assert_eq!(game.level_index(), 0);
        assert_eq!(game.total_levels(), 10);
        assert_eq!(game.level().name, "Warm Up");
        assert_eq!(game.sim().position(), game.level().start_position());
    }

    #[test]
    fn hole_is_recorded_once() {
        let mut game = MiniGolf::new(PhysicsConfig::default(), EventLog::new());
        assert!(game.shoot(&warm_up_putt()));

        let result = play_until_settled(&mut game).expect("putt should drop");
        assert_eq!(result.strokes, 1);
        assert_eq!(result.label, ScoreLabel::HoleInOne);
        assert!(result.new_best);

        for _ in 0..10 {
            assert!(game.update(DT).is_none());
        }
        assert_eq!(game.scorecard().holes_played(), 1);
        assert_eq!(game.sim().listener().holes_sunk(), 1);
    }

    #[test]
    fn shoot_rejected_while_rolling() {
        let mut game = MiniGolf::default();
        let shot = Shot::new(Vec3::X, 5.0).unwrap();
        assert!(game.shoot(&shot));
        game.update(DT);
        assert!(!game.shoot(&shot));
        assert_eq!(game.sim().strokes(), 1);
    }

    #[test]
    fn next_level_advances_and_stops_at_end() {
        let mut game = MiniGolf::default();
        for expected in 1..10 {
            assert!(game.next_level());
            assert_eq!(game.level_index(), expected);
        }
        assert!(!game.next_level());
        assert_eq!(game.level_index(), 9);
    }

    #[test]
    fn load_level_out_of_range_changes_nothing() {
        let mut game = MiniGolf::default();
        game.shoot(&Shot::new(Vec3::Z, 2.0).unwrap());
        assert!(!game.load_level(42));
        assert_eq!(game.level_index(), 0);
        assert_eq!(game.sim().strokes(), 1);
    }

    #[test]
    fn replay_allows_recording_again() {
        let mut game = MiniGolf::default();
        game.shoot(&warm_up_putt());
        assert!(play_until_settled(&mut game).is_some());

        game.replay();
        assert_eq!(game.sim().strokes(), 0);
        game.shoot(&warm_up_putt());
        let second = play_until_settled(&mut game).unwrap();
        assert!(!second.new_best);
        assert_eq!(game.scorecard().holes_played(), 2);
        assert_eq!(game.scorecard().total_strokes(), 2);
    }

    #[test]
    fn finishing_unlocks_next_level() {
        let mut game = MiniGolf::default();
        assert!(game.is_unlocked(0));
        assert!(!game.is_unlocked(1));

        game.shoot(&warm_up_putt());
        play_until_settled(&mut game).unwrap();
        assert!(game.is_unlocked(1));
        assert!(!game.is_unlocked(99));
    }

    #[test]
    fn reset_clears_strokes_and_events_continue() {
        let mut game = MiniGolf::new(PhysicsConfig::default(), EventLog::new());
        game.shoot(&Shot::new(Vec3::Z, 3.0).unwrap());
        game.update(DT);
        game.reset();
        assert_eq!(game.sim().strokes(), 0);
        assert!(game.sim().is_idle());

        game.shoot(&Shot::new(Vec3::Z, 3.0).unwrap());
        let strokes: Vec<_> = game
            .sim()
            .listener()
            .events()
            .iter()
            .filter_map(|e| match e {
                SimEvent::StrokeTaken { count } => Some(*count),
                _ => None,
            })
            .collect();
        assert_eq!(strokes, vec![1, 1]);
    }

    #[test]
    fn difficulty_tuning_applies_tier() {
        let mut game = MiniGolf::default().with_difficulty_tuning(true);
        // Warm Up is Easy
        assert_eq!(game.sim().config().friction, 1.2);

        assert!(game.load_level(9));
        // Master's Challenge is Expert
        assert_eq!(game.sim().config().friction, 2.0);
        assert_eq!(game.sim().hole().radius, 0.22);

        game.shoot(&Shot::new(Vec3::Z, 10.0).unwrap());
        let speed = game.sim().speed();
        assert!((speed - 13.0).abs() < 1e-4, "power multiplier not applied: {speed}");
    }

    #[test]
    fn custom_levels_are_validated() {
        assert_eq!(
            MiniGolf::with_levels(Vec::new(), PhysicsConfig::default(), ()).err(),
            Some(LevelError::Empty)
        );

        let levels = vec![all_levels().remove(2)];
        let game = MiniGolf::with_levels(levels, PhysicsConfig::default(), ()).unwrap();
        assert_eq!(game.level().name, "The Alley");
        assert_eq!(game.total_levels(), 1);
    }
}
