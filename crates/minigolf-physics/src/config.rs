use std::fmt;

use serde::{Deserialize, Serialize};

use crate::level::DifficultySettings;

/// Tunable constants for the ball simulation.
///
/// Ball radius, friction and restitution default to the browser game's
/// values (0.12, 1.5, 0.55). `max_shot_speed` matches the drag-aim module's
/// fallback power cap of 18; the page itself aims with a cap of 30, see
/// [`crate::aim::AimConfig::browser`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Ball radius in world units.
    pub ball_radius: f32,
    /// Height of the ground plane. The ball centre rests at `ground_y + ball_radius`.
    pub ground_y: f32,
    /// Exponential decay rate of ball speed, per second.
    pub friction: f32,
    /// Fraction of normal speed kept after a wall bounce (0..=1).
    pub restitution: f32,
    /// Hard cap on the speed a single shot can impart.
    pub max_shot_speed: f32,
    /// Balls faster than this roll over the hole instead of dropping (lip-out).
    pub capture_speed: f32,
    /// Below this speed a roll ends and the ball is ready for the next shot.
    pub min_speed: f32,
    /// Wall approach speed below which the ball settles against the wall
    /// instead of bouncing.
    pub bounce_threshold: f32,
    /// Largest time step a single `update` integrates (seconds).
    pub max_step: f32,
    /// Collision passes per tick; extra passes settle balls wedged in corners.
    pub resolve_iterations: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            ball_radius: 0.12,
            ground_y: 0.0,
            friction: 1.5,
            restitution: 0.55,
            max_shot_speed: 18.0,
            capture_speed: 4.0,
            min_speed: 0.05,
            bounce_threshold: 0.05,
            max_step: 0.05,
            resolve_iterations: 4,
        }
    }
}

/// Why a physics configuration was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Parse(String),
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(m) => write!(f, "failed to parse physics config: {m}"),
            Self::Invalid { field, reason } => write!(f, "{field} {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl PhysicsConfig {
    /// Resting height of the ball centre.
    pub fn rest_height(&self) -> f32 {
        self.ground_y + self.ball_radius
    }

    /// Check every field is usable by the simulation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn check(ok: bool, field: &'static str, reason: &'static str) -> Result<(), ConfigError> {
            if ok {
                Ok(())
            } else {
                tracing::error!(field, reason, "invalid physics config");
                Err(ConfigError::Invalid { field, reason })
            }
        }

        check(
            self.ball_radius.is_finite() && self.ball_radius > 0.0,
            "ball_radius",
            "must be > 0",
        )?;
        check(self.ground_y.is_finite(), "ground_y", "must be finite")?;
        check(
            self.friction.is_finite() && self.friction >= 0.0,
            "friction",
            "must be >= 0",
        )?;
        check(
            (0.0..=1.0).contains(&self.restitution),
            "restitution",
            "must be within 0..=1",
        )?;
        check(
            self.max_shot_speed.is_finite() && self.max_shot_speed > 0.0,
            "max_shot_speed",
            "must be > 0",
        )?;
        check(
            self.capture_speed.is_finite() && self.capture_speed >= 0.0,
            "capture_speed",
            "must be >= 0",
        )?;
        check(
            self.min_speed.is_finite() && self.min_speed >= 0.0,
            "min_speed",
            "must be >= 0",
        )?;
        check(
            self.bounce_threshold.is_finite() && self.bounce_threshold >= 0.0,
            "bounce_threshold",
            "must be >= 0",
        )?;
        check(
            self.max_step.is_finite() && self.max_step > 0.0,
            "max_step",
            "must be > 0",
        )?;
        check(
            self.resolve_iterations > 0,
            "resolve_iterations",
            "must be > 0",
        )?;

        if self.min_speed >= self.capture_speed {
            tracing::warn!(
                min_speed = self.min_speed,
                capture_speed = self.capture_speed,
                "min_speed >= capture_speed: only balls still rolling at the stop threshold can sink"
            );
        }
        Ok(())
    }

    /// Parse a TOML document and validate it. Missing keys take defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config =
            toml::from_str::<Self>(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from `MINIGOLF_PHYSICS_CONFIG` or `config/physics.toml`,
    /// falling back to defaults.
    pub fn load() -> Self {
        let candidates = std::env::var("MINIGOLF_PHYSICS_CONFIG")
            .ok()
            .filter(|p| !p.is_empty())
            .into_iter()
            .chain(std::iter::once("config/physics.toml".to_string()));

        for path in candidates {
            let Ok(contents) = std::fs::read_to_string(&path) else {
                continue;
            };
            match Self::from_toml_str(&contents) {
                Ok(cfg) => {
                    tracing::info!(%path, "Loaded physics configuration");
                    return cfg;
                },
                Err(e) => tracing::warn!(%path, "{e}, ignoring"),
            }
        }

        tracing::info!("No physics config found, using defaults");
        Self::default()
    }

    /// A copy with a difficulty tier's friction applied.
    pub fn for_difficulty(&self, settings: &DifficultySettings) -> Self {
        Self {
            friction: settings.friction,
            ..self.clone()
        }
    }
}
