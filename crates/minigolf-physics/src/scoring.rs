use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// How a finished hole compares to par.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreLabel {
    HoleInOne,
    UnderPar(u32),
    Par,
    OverPar(u32),
}

impl ScoreLabel {
    /// Classify a hole.
    ///
    /// A single stroke is always a hole in one, even on a par 1.
    pub fn new(strokes: u32, par: u32) -> Self {
        if strokes == 1 {
            Self::HoleInOne
        } else if strokes < par {
            Self::UnderPar(par - strokes)
        } else if strokes == par {
            Self::Par
        } else {
            Self::OverPar(strokes - par)
        }
    }
}

impl fmt::Display for ScoreLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HoleInOne => write!(f, "Hole in one!"),
            Self::UnderPar(n) => write!(f, "{n} under par"),
            Self::Par => write!(f, "Par"),
            Self::OverPar(n) => write!(f, "{n} over par"),
        }
    }
}

/// Outcome of one completed hole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoleResult {
    pub level_id: u32,
    pub strokes: u32,
    pub par: u32,
    pub label: ScoreLabel,
    /// Fewer strokes than any earlier finish of this level (or the first finish).
    pub new_best: bool,
}

impl HoleResult {
    /// Strokes relative to par; negative is under.
    pub fn to_par(&self) -> i64 {
        i64::from(self.strokes) - i64::from(self.par)
    }
}

/// Running totals for a play session. Lives in memory only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scorecard {
    bests: HashMap<u32, u32>,
    results: Vec<HoleResult>,
    total_strokes: u32,
}

impl Scorecard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with previously known bests, e.g. from an external save.
    pub fn with_bests(bests: HashMap<u32, u32>) -> Self {
        Self {
            bests,
            ..Self::default()
        }
    }

    /// Record a finished hole and report how it went.
    pub fn record(&mut self, level_id: u32, par: u32, strokes: u32) -> HoleResult {
        let new_best = self.bests.get(&level_id).is_none_or(|&prev| strokes < prev);
        if new_best {
            self.bests.insert(level_id, strokes);
        }
        self.total_strokes += strokes;

        let result = HoleResult {
            level_id,
            strokes,
            par,
            label: ScoreLabel::new(strokes, par),
            new_best,
        };
        self.results.push(result);
        tracing::info!(
            level = level_id,
            strokes,
            par,
            new_best,
            "{}",
            result.label
        );
        result
    }

    pub fn best(&self, level_id: u32) -> Option<u32> {
        self.bests.get(&level_id).copied()
    }

    /// Best strokes per level id, the shape unlock checks expect.
    pub fn bests(&self) -> &HashMap<u32, u32> {
        &self.bests
    }

    pub fn results(&self) -> &[HoleResult] {
        &self.results
    }

    pub fn total_strokes(&self) -> u32 {
        self.total_strokes
    }

    pub fn holes_played(&self) -> usize {
        self.results.len()
    }

    /// Sum of strokes relative to par over every recorded hole.
    pub fn total_to_par(&self) -> i64 {
        self.results.iter().map(HoleResult::to_par).sum()
    }
}
