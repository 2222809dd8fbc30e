//! Turning a pointer drag into a validated shot.

use std::fmt;

use serde::{Deserialize, Serialize};

use minigolf_core::Vec3;

/// Drag-to-shoot tuning.
///
/// `Default` holds the aim module's own fallbacks (scale 3.6, cap 18), which
/// line up with `PhysicsConfig::max_shot_speed`. The browser page overrides
/// them; use [`AimConfig::browser`] for those values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AimConfig {
    /// Shot power per world unit of drag.
    pub power_scale: f32,
    /// Power cap applied before the simulation's own clamp.
    pub max_power: f32,
    /// Drag length beyond which extra distance adds nothing.
    pub max_drag: f32,
    /// Drags shorter than this are treated as a cancelled aim.
    pub min_drag: f32,
}

impl Default for AimConfig {
    fn default() -> Self {
        Self {
            power_scale: 3.6,
            max_power: 18.0,
            max_drag: 10.0,
            min_drag: 0.02,
        }
    }
}

impl AimConfig {
    /// Values the browser page passes to its aim controls: scale 4, cap 30.
    ///
    /// Shots above the simulation's `max_shot_speed` are still clamped by
    /// `apply_shot`, so the top of this range only moves the power meter.
    pub fn browser() -> Self {
        Self {
            power_scale: 4.0,
            max_power: 30.0,
            ..Self::default()
        }
    }
}

/// A shot that satisfies `BallSimulation::apply_shot`'s preconditions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Shot {
    direction: Vec3,
    power: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShotError {
    ZeroDirection,
    NonFinitePower(f32),
    NegativePower(f32),
}

impl fmt::Display for ShotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroDirection => write!(f, "aim direction has no length on the ground plane"),
            Self::NonFinitePower(p) => write!(f, "shot power {p} is not finite"),
            Self::NegativePower(p) => write!(f, "shot power {p} is negative"),
        }
    }
}

impl std::error::Error for ShotError {}

impl Shot {
    /// Validate and normalise a shot. `direction` is projected onto the ground plane.
    pub fn new(direction: Vec3, power: f32) -> Result<Self, ShotError> {
        if !power.is_finite() {
            return Err(ShotError::NonFinitePower(power));
        }
        if power < 0.0 {
            return Err(ShotError::NegativePower(power));
        }
        let direction = direction
            .try_normalize_xz()
            .ok_or(ShotError::ZeroDirection)?;
        Ok(Self { direction, power })
    }

    /// Shot along `angle` radians on the ground plane (0 = +X).
    pub fn from_angle(angle: f32, power: f32) -> Result<Self, ShotError> {
        if !angle.is_finite() {
            return Err(ShotError::ZeroDirection);
        }
        Self::new(Vec3::from_angle(angle), power)
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn power(&self) -> f32 {
        self.power
    }

    /// The same shot with power scaled, e.g. by a difficulty multiplier.
    pub fn scaled(self, factor: f32) -> Self {
        let power = self.power * factor;
        Self {
            power: if power.is_finite() && power > 0.0 { power } else { 0.0 },
            ..self
        }
    }
}

/// Power for a drag of length `distance`.
fn drag_power(distance: f32, aim: &AimConfig) -> f32 {
    (distance.min(aim.max_drag) * aim.power_scale).min(aim.max_power)
}

/// Shot for a drag from the ball to `pointer` on the ground plane.
///
/// Returns `None` when the drag is too short to count or not finite.
pub fn shot_from_drag(ball: Vec3, pointer: Vec3, aim: &AimConfig) -> Option<Shot> {
    let drag = (pointer - ball).flatten();
    let distance = drag.length_xz();
    if !distance.is_finite() || distance < aim.min_drag {
        tracing::debug!(distance, "aim cancelled");
        return None;
    }
    Shot::new(drag, drag_power(distance, aim)).ok()
}

/// Power meter fill (0..=1) while the pointer is held at `pointer`.
pub fn aim_preview(ball: Vec3, pointer: Vec3, aim: &AimConfig) -> f32 {
    let distance = (pointer - ball).length_xz();
    if !distance.is_finite() || aim.max_power <= 0.0 {
        return 0.0;
    }
    (drag_power(distance, aim) / aim.max_power).clamp(0.0, 1.0)
}
