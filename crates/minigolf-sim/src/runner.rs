use std::fmt;

use serde::Serialize;

use minigolf_core::{EventLog, SimEvent, Vec3};
use minigolf_physics::MiniGolf;
use minigolf_physics::aim::{Shot, ShotError};
use minigolf_physics::config::PhysicsConfig;
use minigolf_physics::level::{Level, LevelError, all_levels, load_levels_json};
use minigolf_physics::physics::{BallSnapshot, SimState};
use minigolf_physics::scoring::HoleResult;

/// Command-line options for a headless run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunArgs {
    /// Level id to play.
    pub level: u32,
    /// `(angle radians, power)` pairs, taken in order.
    pub shots: Vec<(f32, f32)>,
    pub dt: f32,
    /// Tick budget per shot before the roll is abandoned.
    pub max_ticks: u32,
    pub levels_path: Option<String>,
    pub difficulty: bool,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            level: 1,
            shots: Vec::new(),
            dt: 1.0 / 60.0,
            max_ticks: 3000,
            levels_path: None,
            difficulty: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunError {
    BadArg { arg: String, reason: &'static str },
    Levels(LevelError),
    UnknownLevel(u32),
    Io(String),
    Shot { index: usize, error: ShotError },
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadArg { arg, reason } => write!(f, "bad argument '{arg}': {reason}"),
            Self::Levels(e) => write!(f, "{e}"),
            Self::UnknownLevel(id) => write!(f, "no level with id {id}"),
            Self::Io(m) => write!(f, "failed to read levels: {m}"),
            Self::Shot { index, error } => write!(f, "shot {index}: {error}"),
        }
    }
}

impl std::error::Error for RunError {}

impl From<LevelError> for RunError {
    fn from(e: LevelError) -> Self {
        Self::Levels(e)
    }
}

fn bad(arg: &str, reason: &'static str) -> RunError {
    RunError::BadArg {
        arg: arg.to_string(),
        reason,
    }
}

fn parse_shot(text: &str) -> Option<(f32, f32)> {
    let (angle, power) = text.split_once(':')?;
    Some((angle.trim().parse().ok()?, power.trim().parse().ok()?))
}

/// Parse `--key=value` arguments. Unknown flags are rejected.
pub fn parse_args<I>(args: I) -> Result<RunArgs, RunError>
where
    I: IntoIterator<Item = String>,
{
    let mut out = RunArgs::default();
    for arg in args {
        if arg == "--difficulty" {
            out.difficulty = true;
            continue;
        }
        let Some((key, value)) = arg.split_once('=') else {
            return Err(bad(&arg, "expected --key=value"));
        };
        match key {
            "--level" => {
                out.level = value.parse().map_err(|_| bad(&arg, "not a level id"))?;
            },
            "--shots" => {
                out.shots = value
                    .split(',')
                    .filter(|s| !s.trim().is_empty())
                    .map(|s| parse_shot(s).ok_or_else(|| bad(&arg, "expected angle:power")))
                    .collect::<Result<_, _>>()?;
            },
            "--dt" => {
                out.dt = value
                    .parse::<f32>()
                    .ok()
                    .filter(|dt| dt.is_finite() && *dt > 0.0)
                    .ok_or_else(|| bad(&arg, "must be a positive number"))?;
            },
            "--max-ticks" => {
                out.max_ticks = value.parse().map_err(|_| bad(&arg, "not a tick count"))?;
            },
            "--levels" => out.levels_path = Some(value.to_string()),
            _ => return Err(bad(&arg, "unknown flag")),
        }
    }
    Ok(out)
}

/// How one shot played out.
#[derive(Debug, Clone, Serialize)]
pub struct ShotOutcome {
    pub angle: f32,
    pub power: f32,
    pub accepted: bool,
    pub ticks: u32,
    pub end: BallSnapshot,
}

/// Everything the binary prints.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub level_id: u32,
    pub level_name: String,
    pub par: u32,
    pub shots: Vec<ShotOutcome>,
    pub result: Option<HoleResult>,
    pub final_state: BallSnapshot,
    pub events: Vec<SimEvent>,
}

/// Read levels from `path`, or the built-in set.
pub fn levels_from(path: Option<&str>) -> Result<Vec<Level>, RunError> {
    match path {
        Some(path) => {
            let contents =
                std::fs::read_to_string(path).map_err(|e| RunError::Io(format!("{path}: {e}")))?;
            Ok(load_levels_json(&contents)?)
        },
        None => Ok(all_levels()),
    }
}

/// Play the requested level with the given shots and report what happened.
pub fn run(
    args: &RunArgs,
    config: PhysicsConfig,
    levels: Vec<Level>,
) -> Result<RunSummary, RunError> {
    let index = levels
        .iter()
        .position(|l| l.id == args.level)
        .ok_or(RunError::UnknownLevel(args.level))?;

    let shots = args
        .shots
        .iter()
        .enumerate()
        .map(|(index, &(angle, power))| {
            Shot::from_angle(angle, power).map_err(|error| RunError::Shot { index, error })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut game = MiniGolf::with_levels(levels, config, EventLog::new())?
        .with_difficulty_tuning(args.difficulty);
    game.load_level(index);

    let level = game.level();
    tracing::info!(level = level.id, name = %level.name, shots = shots.len(), "starting run");
    let (level_id, level_name, par) = (level.id, level.name.clone(), level.par);

    let mut outcomes = Vec::with_capacity(shots.len());
    let mut result = None;
    for (shot, &(angle, power)) in shots.iter().zip(&args.shots) {
        if game.sim().is_sunk() {
            break;
        }
        let accepted = game.shoot(shot);
        let mut ticks = 0;
        while accepted && game.sim().state() == SimState::Rolling && ticks < args.max_ticks {
            if let Some(r) = game.update(args.dt) {
                result = Some(r);
            }
            ticks += 1;
        }
        if game.sim().state() == SimState::Rolling {
            tracing::warn!(ticks, "tick budget spent with ball still rolling");
        }
        outcomes.push(ShotOutcome {
            angle,
            power,
            accepted,
            ticks,
            end: game.sim().snapshot(),
        });
        // A roll cut short by the budget leaves the ball moving; stop it so the
        // next shot is accepted.
        if game.sim().state() == SimState::Rolling {
            let at = game.sim().position();
            game.sim_mut().teleport(Vec3::new(at.x, 0.0, at.z));
        }
    }

    Ok(RunSummary {
        level_id,
        level_name,
        par,
        shots: outcomes,
        result,
        final_state: game.sim().snapshot(),
        events: game.sim().listener().events().to_vec(),
    })
}
