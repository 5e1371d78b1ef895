use cozy_chess::Color;
use serde::{Deserialize, Serialize};

use crate::board::Position;
use crate::oracle::{Candidate, Score};

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

fn default_threads() -> usize { 1 }
fn default_search_depth() -> u32 { 18 }
fn default_true() -> bool { true }

/// What to explore. Fixed for the length of a run; the baseline fields are
/// filled in once by seeding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchConfig {
    pub root_position: String,
    /// Number of initiator moves per line.
    pub max_ply: usize,
    /// Forced initiator move per depth; `None` (or empty text) asks the oracle.
    #[serde(default)]
    pub initiator_forced_moves: Vec<Option<String>>,
    /// Responder branching per depth; depths past the end use `default_fanout`.
    #[serde(default)]
    pub responder_fanout: Vec<usize>,
    pub default_fanout: usize,
    #[serde(default = "default_threads")]
    pub threads: usize,
    /// Oracle depth for every query.
    #[serde(default = "default_search_depth")]
    pub search_depth: u32,
    /// White initiates when true, Black otherwise.
    #[serde(default = "default_true")]
    pub initiator_is_first_side: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_score: Option<Score>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub baseline_top_moves: Vec<Candidate>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            root_position: START_FEN.to_string(),
            max_ply: 3,
            initiator_forced_moves: Vec::new(),
            responder_fanout: Vec::new(),
            default_fanout: 2,
            threads: default_threads(),
            search_depth: default_search_depth(),
            initiator_is_first_side: true,
            baseline_score: None,
            baseline_top_moves: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid search configuration: {}", reasons.join("; "))]
pub struct ConfigError {
    pub reasons: Vec<String>,
}

impl SearchConfig {
    pub fn fanout_at(&self, depth: usize) -> usize {
        self.responder_fanout.get(depth).copied().unwrap_or(self.default_fanout)
    }

    pub fn forced_at(&self, depth: usize) -> Option<&str> {
        self.initiator_forced_moves
            .get(depth)
            .and_then(|m| m.as_deref())
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }

    pub fn initiator(&self) -> Color {
        if self.initiator_is_first_side { Color::White } else { Color::Black }
    }

    /// Half-move count at which a line is complete.
    pub fn full_length(&self) -> usize { self.max_ply * 2 + 1 }

    /// Checks everything that can be checked without the oracle and returns
    /// the parsed root. All problems are reported together.
    pub fn validate(&self) -> Result<Position, ConfigError> {
        let mut reasons = Vec::new();
        if self.max_ply == 0 { reasons.push("maxPly must be at least 1".to_string()); }
        if self.default_fanout == 0 { reasons.push("defaultFanout must be at least 1".to_string()); }
        for (depth, &f) in self.responder_fanout.iter().enumerate() {
            if f == 0 { reasons.push(format!("responderFanout[{depth}] must be at least 1")); }
        }
        if self.threads == 0 { reasons.push("threads must be at least 1".to_string()); }
        if self.search_depth == 0 { reasons.push("searchDepth must be at least 1".to_string()); }
        for depth in 0..self.initiator_forced_moves.len() {
            if let Some(text) = self.forced_at(depth) {
                if !looks_like_move(text) { reasons.push(format!("forced move `{text}` at depth {depth} is not a move")); }
            }
        }
        let root = match Position::from_fen(&self.root_position) {
            Ok(root) => Some(root),
            Err(e) => { reasons.push(format!("rootPosition: {e}")); None }
        };
        if let Some(root) = &root {
            if root.side_to_move() != self.initiator() {
                reasons.push(format!("root position has {:?} to move but the initiator is {:?}", root.side_to_move(), self.initiator()));
            } else if !root.has_legal_moves() {
                reasons.push("root position has no legal moves".to_string());
            } else if let Some(first) = self.forced_at(0) {
                if let Err(e) = root.parse_move(first) { reasons.push(format!("forced move at depth 0: {e}")); }
            }
        }
        match root {
            Some(root) if reasons.is_empty() => Ok(root),
            _ => Err(ConfigError { reasons }),
        }
    }
}

/// Shape check for move text that cannot be resolved until its position is known.
pub fn looks_like_move(text: &str) -> bool {
    let t = text.trim_end_matches(|c| matches!(c, '+' | '#' | '!' | '?'));
    if matches!(t, "O-O" | "O-O-O" | "0-0" | "0-0-0") { return true; }
    if t.len() < 2 || !t.chars().all(|c| "PNBRQKabcdefgh12345678x=-nbrq".contains(c)) { return false; }
    let t = match t.split_once('=') { Some((body, _)) => body, None => t };
    let t = t.trim_end_matches(|c| "NBRQnbrq".contains(c));
    let b = t.as_bytes();
    b.len() >= 2 && (b'a'..=b'h').contains(&b[b.len() - 2]) && (b'1'..=b'8').contains(&b[b.len() - 1])
}
