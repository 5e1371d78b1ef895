//! Move-evaluation oracle: the engine the line search consults.
//!
//! Scores are always reported from White's point of view, whatever side is
//! to move in the analysed position.

pub mod material;
pub mod uci;

use std::sync::mpsc::Sender;

use serde::{Deserialize, Serialize};

pub use material::MaterialOracle;
pub use uci::UciOracle;

/// Centipawn value standing in for a forced mate when scores are compared
/// numerically or subtracted.
pub const MATE_SCORE: i32 = 30_000;

const MATE_BAND: i32 = MATE_SCORE - 1_000;
// Longer announced mates are ranked as mate in this many.
const MAX_MATE_DISTANCE: i32 = 999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Score {
    /// Centipawns, positive favours White.
    Cp(i32),
    /// Mate in n moves: positive means White mates, negative means Black mates.
    Mate(i32),
}

impl Default for Score {
    fn default() -> Self { Score::Cp(0) }
}

impl Score {
    pub fn is_mate(&self) -> bool { matches!(self, Score::Mate(_)) }

    /// Flattens the score onto one numeric axis (White's view). Faster mates
    /// lie further from zero; any mate outranks any centipawn score.
    pub fn as_cp(&self) -> i32 {
        match *self {
            Score::Cp(cp) => cp.clamp(-MATE_BAND, MATE_BAND),
            Score::Mate(n) if n > 0 => MATE_SCORE - n.min(MAX_MATE_DISTANCE),
            Score::Mate(n) if n < 0 => -MATE_SCORE - n.max(-MAX_MATE_DISTANCE),
            Score::Mate(_) => 0,
        }
    }

    /// Converts a side-to-move relative engine score to White's view.
    pub fn from_side_to_move(score: Score, white_to_move: bool) -> Score {
        if white_to_move { return score; }
        match score {
            Score::Cp(cp) => Score::Cp(-cp),
            Score::Mate(n) => Score::Mate(-n),
        }
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Score::Cp(cp) => write!(f, "{:+.2}", cp as f64 / 100.0),
            Score::Mate(n) if n < 0 => write!(f, "-M{}", -n),
            Score::Mate(n) => write!(f, "M{n}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub fen: String,
    pub depth: u32,
    pub multi_pv: usize,
    pub threads: usize,
    /// UCI moves the search is restricted to; empty means all legal moves.
    pub restrict_to: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// UCI move text.
    #[serde(rename = "move")]
    pub mv: String,
    pub score: Score,
    /// Depth this candidate's score was settled at.
    pub depth: u32,
}

impl Candidate {
    /// Mates count as resolved at any depth.
    pub fn is_resolved(&self, depth: u32) -> bool { self.score.is_mate() || self.depth >= depth }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Analysis {
    pub candidates: Vec<Candidate>,
    pub final_depth: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("failed to start engine `{path}`: {source}")]
    Spawn { path: String, source: std::io::Error },
    #[error("engine I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("engine exited before answering")]
    Exited,
    #[error("engine returned no candidates for {fen}")]
    Empty { fen: String },
    #[error("engine rejected position {fen}: {reason}")]
    BadPosition { fen: String, reason: String },
}

/// An external move evaluator. One query is in flight at a time; interim
/// snapshots go to `updates` if the caller subscribed.
pub trait Oracle {
    fn analyze(&mut self, request: &AnalysisRequest, updates: Option<&Sender<Analysis>>) -> Result<Analysis, OracleError>;
}

impl<O: Oracle + ?Sized> Oracle for Box<O> {
    fn analyze(&mut self, request: &AnalysisRequest, updates: Option<&Sender<Analysis>>) -> Result<Analysis, OracleError> {
        (**self).analyze(request, updates)
    }
}
