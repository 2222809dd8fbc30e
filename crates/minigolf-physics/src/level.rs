use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use minigolf_core::Vec3;

use crate::collision::Collider;
use crate::physics::HoleTarget;

/// A wall as level data describes it: centre, full width/depth, height.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WallSpec {
    pub x: f32,
    pub z: f32,
    pub w: f32,
    pub d: f32,
    pub h: f32,
}

impl WallSpec {
    pub fn collider(&self) -> Collider {
        Collider::new(self.x, self.z, self.w, self.d, self.h)
    }
}

/// Hole placement and capture radius.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct HoleSpec {
    pub pos: [f32; 3],
    pub radius: f32,
}

/// A level that only opens once `level_id` was finished in `max_strokes` or fewer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UnlockRequirement {
    pub level_id: u32,
    pub max_strokes: u32,
}

/// Difficulty tier printed on each level.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
    Expert,
}

/// Gameplay adjustments for a difficulty tier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DifficultySettings {
    pub friction: f32,
    pub hole_radius: f32,
    pub power_multiplier: f32,
    pub aim_assist: bool,
}

impl Difficulty {
    pub fn settings(self) -> DifficultySettings {
        match self {
            Self::Easy => DifficultySettings {
                friction: 1.2,
                hole_radius: 0.25,
                power_multiplier: 1.0,
                aim_assist: true,
            },
            Self::Medium => DifficultySettings {
                friction: 1.5,
                hole_radius: 0.25,
                power_multiplier: 1.1,
                aim_assist: false,
            },
            Self::Hard => DifficultySettings {
                friction: 1.8,
                hole_radius: 0.23,
                power_multiplier: 1.2,
                aim_assist: false,
            },
            Self::Expert => DifficultySettings {
                friction: 2.0,
                hole_radius: 0.22,
                power_multiplier: 1.3,
                aim_assist: false,
            },
        }
    }
}

/// Grouping used by level-select menus.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LevelCategory {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl LevelCategory {
    pub const ALL: [Self; 4] = [
        Self::Beginner,
        Self::Intermediate,
        Self::Advanced,
        Self::Expert,
    ];

    /// Level ids in this category.
    pub fn level_ids(self) -> &'static [u32] {
        match self {
            Self::Beginner => &[1, 2, 3],
            Self::Intermediate => &[4, 5, 6],
            Self::Advanced => &[7, 8],
            Self::Expert => &[9, 10],
        }
    }

    pub fn of(level_id: u32) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.level_ids().contains(&level_id))
    }
}

/// One hole of the course, as plain data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub par: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub start: [f32; 3],
    pub hole: HoleSpec,
    pub walls: Vec<WallSpec>,
    #[serde(default)]
    pub tips: String,
    #[serde(default)]
    pub unlock_requirement: Option<UnlockRequirement>,
}

impl Level {
    pub fn start_position(&self) -> Vec3 {
        Vec3::from(self.start)
    }

    pub fn hole_target(&self) -> HoleTarget {
        HoleTarget::new(Vec3::from(self.hole.pos), self.hole.radius)
    }

    pub fn colliders(&self) -> Vec<Collider> {
        self.walls.iter().map(WallSpec::collider).collect()
    }

    /// Check the geometry is usable by the simulation.
    pub fn validate(&self) -> Result<(), LevelError> {
        let invalid = |reason: &'static str| LevelError::Invalid {
            id: self.id,
            reason,
        };

        if self.par == 0 {
            return Err(invalid("par must be > 0"));
        }
        if !self.start.iter().all(|v| v.is_finite()) {
            return Err(invalid("start must be finite"));
        }
        if !self.hole.pos.iter().all(|v| v.is_finite()) {
            return Err(invalid("hole position must be finite"));
        }
        if !(self.hole.radius.is_finite() && self.hole.radius > 0.0) {
            return Err(invalid("hole radius must be > 0"));
        }
        for wall in &self.walls {
            let dims = [wall.x, wall.z, wall.w, wall.d, wall.h];
            if !dims.iter().all(|v| v.is_finite()) {
                return Err(invalid("wall values must be finite"));
            }
            if wall.w <= 0.0 || wall.d <= 0.0 {
                return Err(invalid("wall width and depth must be > 0"));
            }
        }
        Ok(())
    }
}

/// Why level data was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum LevelError {
    Parse(String),
    Invalid { id: u32, reason: &'static str },
    DuplicateId(u32),
    Empty,
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(m) => write!(f, "failed to parse level data: {m}"),
            Self::Invalid { id, reason } => write!(f, "level {id}: {reason}"),
            Self::DuplicateId(id) => write!(f, "level id {id} appears more than once"),
            Self::Empty => write!(f, "level list is empty"),
        }
    }
}

impl std::error::Error for LevelError {}

/// Parse a JSON array of levels and validate every entry.
pub fn load_levels_json(contents: &str) -> Result<Vec<Level>, LevelError> {
    let levels: Vec<Level> =
        serde_json::from_str(contents).map_err(|e| LevelError::Parse(e.to_string()))?;
    validate_levels(&levels)?;
    Ok(levels)
}

/// Validate every level and require unique ids.
pub fn validate_levels(levels: &[Level]) -> Result<(), LevelError> {
    if levels.is_empty() {
        return Err(LevelError::Empty);
    }
    let mut seen = HashSet::new();
    for level in levels {
        level.validate()?;
        if !seen.insert(level.id) {
            return Err(LevelError::DuplicateId(level.id));
        }
    }
    Ok(())
}

pub fn level_by_id(levels: &[Level], id: u32) -> Option<&Level> {
    levels.iter().find(|l| l.id == id)
}

/// The level after `current_id` in play order.
pub fn next_level(levels: &[Level], current_id: u32) -> Option<&Level> {
    let idx = levels.iter().position(|l| l.id == current_id)?;
    levels.get(idx + 1)
}

/// The level before `current_id` in play order.
pub fn previous_level(levels: &[Level], current_id: u32) -> Option<&Level> {
    let idx = levels.iter().position(|l| l.id == current_id)?;
    idx.checked_sub(1).and_then(|i| levels.get(i))
}

/// Whether `level_id` is open given best strokes per level in `progress`.
///
/// Unknown levels and levels without a requirement are always open.
pub fn is_level_unlocked(levels: &[Level], level_id: u32, progress: &HashMap<u32, u32>) -> bool {
    let Some(req) = level_by_id(levels, level_id).and_then(|l| l.unlock_requirement) else {
        return true;
    };
    progress
        .get(&req.level_id)
        .is_some_and(|&best| best <= req.max_strokes)
}

pub fn unlocked_levels<'a>(levels: &'a [Level], progress: &HashMap<u32, u32>) -> Vec<&'a Level> {
    levels
        .iter()
        .filter(|l| is_level_unlocked(levels, l.id, progress))
        .collect()
}

fn wall(x: f32, z: f32, w: f32, d: f32) -> WallSpec {
    WallSpec { x, z, w, d, h: 0.5 }
}

fn hole(x: f32, z: f32, radius: f32) -> HoleSpec {
    HoleSpec {
        pos: [x, 0.0, z],
        radius,
    }
}

fn unlock(level_id: u32, max_strokes: u32) -> Option<UnlockRequirement> {
    Some(UnlockRequirement {
        level_id,
        max_strokes,
    })
}

/// The ten built-in holes in play order.
pub fn all_levels() -> Vec<Level> {
    vec![
        Level {
            id: 1,
            name: "Warm Up".to_string(),
            description: "A straight shot to get you started".to_string(),
            par: 2,
            difficulty: Difficulty::Easy,
            start: [0.0, 0.12, 0.0],
            hole: hole(6.0, 0.0, 0.25),
            walls: vec![wall(0.0, -2.5, 12.0, 0.4), wall(0.0, 2.5, 12.0, 0.4)],
            tips: "Aim straight ahead with medium power for an easy par.".to_string(),
            unlock_requirement: None,
        },
        Level {
            id: 2,
            name: "Corner Shot".to_string(),
            description: "Navigate the diagonal to reach the opposite corner".to_string(),
            par: 3,
            difficulty: Difficulty::Easy,
            start: [-5.0, 0.12, -3.0],
            hole: hole(5.0, 3.0, 0.25),
            walls: vec![
                wall(0.0, -4.5, 12.0, 0.4),
                wall(0.0, 4.5, 12.0, 0.4),
                wall(-6.0, 0.0, 0.4, 10.0),
                wall(6.0, 0.0, 0.4, 10.0),
            ],
            tips: "Try a direct diagonal shot, or bank off the walls for better angle control."
                .to_string(),
            unlock_requirement: unlock(1, 4),
        },
        Level {
            id: 3,
            name: "The Alley".to_string(),
            description: "Straight down the narrow lane like bowling".to_string(),
            par: 3,
            difficulty: Difficulty::Medium,
            start: [0.0, 0.12, -5.0],
            hole: hole(0.0, 5.0, 0.25),
            walls: vec![
                wall(-3.5, 0.0, 0.4, 12.0),
                wall(3.5, 0.0, 0.4, 12.0),
                wall(0.0, -6.0, 8.0, 0.4),
                wall(0.0, 6.0, 8.0, 0.4),
            ],
            tips: "Keep it straight! Too much power and you'll bounce off the end wall."
                .to_string(),
            unlock_requirement: unlock(2, 5),
        },
        Level {
            id: 4,
            name: "The Arena".to_string(),
            description: "Wide open space with the hole across the field".to_string(),
            par: 4,
            difficulty: Difficulty::Medium,
            start: [-6.0, 0.12, 0.0],
            hole: hole(6.0, 0.0, 0.25),
            walls: vec![
                wall(0.0, -3.5, 14.0, 0.4),
                wall(0.0, 3.5, 14.0, 0.4),
                wall(-7.0, 0.0, 0.4, 7.0),
                wall(7.0, 0.0, 0.4, 7.0),
            ],
            tips: "Plenty of room to maneuver. Go for power or play it safe with positioning shots."
                .to_string(),
            unlock_requirement: unlock(3, 6),
        },
        Level {
            id: 5,
            name: "Long Diagonal".to_string(),
            description: "The longest shot yet - corner to corner precision".to_string(),
            par: 5,
            difficulty: Difficulty::Hard,
            start: [-5.0, 0.12, -5.0],
            hole: hole(5.0, 5.0, 0.25),
            walls: vec![
                wall(0.0, -6.0, 14.0, 0.4),
                wall(0.0, 6.0, 14.0, 0.4),
                wall(-6.0, 0.0, 0.4, 12.0),
                wall(6.0, 0.0, 0.4, 12.0),
            ],
            tips: "Maximum distance shot. Use wall bounces strategically to set up the perfect approach."
                .to_string(),
            unlock_requirement: unlock(4, 7),
        },
        Level {
            id: 6,
            name: "The Maze Entry".to_string(),
            description: "Navigate through the narrow entrance".to_string(),
            par: 4,
            difficulty: Difficulty::Medium,
            start: [-6.0, 0.12, 0.0],
            hole: hole(6.0, -3.0, 0.25),
            walls: vec![
                wall(0.0, -4.0, 14.0, 0.4),
                wall(0.0, 4.0, 14.0, 0.4),
                wall(-7.0, 0.0, 0.4, 8.0),
                wall(7.0, 0.0, 0.4, 8.0),
                wall(2.0, 1.0, 0.4, 4.0),
                wall(-2.0, -1.0, 0.4, 4.0),
            ],
            tips: "Thread the needle between obstacles. Angles are your friend here.".to_string(),
            unlock_requirement: unlock(5, 8),
        },
        Level {
            id: 7,
            name: "S-Curve".to_string(),
            description: "Follow the winding path to victory".to_string(),
            par: 5,
            difficulty: Difficulty::Hard,
            start: [-7.0, 0.12, -2.0],
            hole: hole(7.0, 2.0, 0.25),
            walls: vec![
                wall(0.0, -3.5, 16.0, 0.4),
                wall(0.0, 3.5, 16.0, 0.4),
                wall(-8.0, 0.0, 0.4, 7.0),
                wall(8.0, 0.0, 0.4, 7.0),
                wall(-3.0, 0.5, 0.4, 5.0),
                wall(0.0, -1.5, 0.4, 3.0),
                wall(3.0, 0.5, 0.4, 5.0),
            ],
            tips: "Patience is key. Multiple precise shots will beat one powerful miss."
                .to_string(),
            unlock_requirement: unlock(6, 7),
        },
        Level {
            id: 8,
            name: "The Gauntlet".to_string(),
            description: "Dodge multiple obstacles in this challenging course".to_string(),
            par: 6,
            difficulty: Difficulty::Hard,
            start: [0.0, 0.12, -6.0],
            hole: hole(0.0, 6.0, 0.25),
            walls: vec![
                wall(-4.0, 0.0, 0.4, 14.0),
                wall(4.0, 0.0, 0.4, 14.0),
                wall(0.0, -7.0, 8.0, 0.4),
                wall(0.0, 7.0, 8.0, 0.4),
                wall(-2.0, -3.0, 0.4, 2.0),
                wall(2.0, -1.0, 0.4, 2.0),
                wall(-2.0, 1.0, 0.4, 2.0),
                wall(2.0, 3.0, 0.4, 2.0),
            ],
            tips: "Zigzag through the obstacles. Use the walls to help guide your shots."
                .to_string(),
            unlock_requirement: unlock(7, 9),
        },
        Level {
            id: 9,
            name: "The Cross".to_string(),
            description: "Navigate the crossroads to reach your destination".to_string(),
            par: 4,
            difficulty: Difficulty::Expert,
            start: [-6.0, 0.12, -6.0],
            hole: hole(6.0, 6.0, 0.25),
            walls: vec![
                wall(0.0, -7.0, 14.0, 0.4),
                wall(0.0, 7.0, 14.0, 0.4),
                wall(-7.0, 0.0, 0.4, 14.0),
                wall(7.0, 0.0, 0.4, 14.0),
                wall(0.0, 0.0, 8.0, 0.4),
                wall(0.0, 0.0, 0.4, 8.0),
            ],
            tips: "The cross divides the course into four quadrants. Plan your route carefully!"
                .to_string(),
            unlock_requirement: unlock(8, 10),
        },
        Level {
            id: 10,
            name: "Master's Challenge".to_string(),
            description: "The ultimate test of precision and skill".to_string(),
            par: 7,
            difficulty: Difficulty::Expert,
            start: [0.0, 0.12, -8.0],
            // Slightly smaller cup than the other holes
            hole: hole(0.0, 8.0, 0.22),
            walls: vec![
                wall(-5.0, 0.0, 0.4, 18.0),
                wall(5.0, 0.0, 0.4, 18.0),
                wall(0.0, -9.0, 10.0, 0.4),
                wall(0.0, 9.0, 10.0, 0.4),
                wall(-3.0, -5.0, 0.4, 4.0),
                wall(3.0, -5.0, 0.4, 4.0),
                wall(0.0, -3.0, 4.0, 0.4),
                wall(-2.0, -1.0, 0.4, 2.0),
                wall(2.0, -1.0, 0.4, 2.0),
                wall(0.0, 1.0, 6.0, 0.4),
                wall(-3.0, 3.0, 0.4, 4.0),
                wall(3.0, 3.0, 0.4, 4.0),
                wall(0.0, 5.0, 4.0, 0.4),
            ],
            tips: "The master's course requires perfect execution. Every shot counts!".to_string(),
            unlock_requirement: unlock(9, 8),
        },
    ]
}
