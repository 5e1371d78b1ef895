use crate::oracle::Score;

/// One explored variation from the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub id: u64,
    /// Half-moves from the root in long notation (`Pe2e4`, `Ng8f6`).
    pub moves: Vec<String>,
    /// FEN after `moves`; `None` only for imported lines that failed to replay.
    pub position: Option<String>,
    pub score: Score,
    pub delta: i32,
    pub is_done: bool,
    /// Reached the full length. Implies `is_done`.
    pub is_full: bool,
    pub is_mate: bool,
    pub is_stalemate: bool,
    pub is_transposition: bool,
    /// Ranked replies the oracle offered when this line branched (UCI).
    pub top_replies_seen: Vec<String>,
    /// Initiator alternatives passed over for the last move (UCI).
    pub top_alternatives_seen: Vec<String>,
}

impl Line {
    pub fn new(id: u64, moves: Vec<String>, position: String, score: Score, delta: i32) -> Self {
        Self {
            id,
            moves,
            position: Some(position),
            score,
            delta,
            is_done: false,
            is_full: false,
            is_mate: false,
            is_stalemate: false,
            is_transposition: false,
            top_replies_seen: Vec::new(),
            top_alternatives_seen: Vec::new(),
        }
    }

    pub fn half_moves(&self) -> usize { self.moves.len() }

    /// Even length: the initiator moves next.
    pub fn initiator_to_move(&self) -> bool { self.moves.len() % 2 == 0 }

    /// Number of completed initiator/responder rounds.
    pub fn depth(&self) -> usize { self.moves.len() / 2 }
}
