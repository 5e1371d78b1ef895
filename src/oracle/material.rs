use std::sync::mpsc::Sender;

use cozy_chess::{Board, Color, Piece};

use crate::board::Position;
use crate::fish::compare;
use crate::oracle::{Analysis, AnalysisRequest, Candidate, Oracle, OracleError, Score};

const PAWN: i32 = 100;
const KNIGHT: i32 = 320;
const BISHOP: i32 = 330;
const ROOK: i32 = 500;
const QUEEN: i32 = 900;

fn count_piece(board: &Board, color: Color, piece: Piece) -> i32 {
    let bb = board.colors(color) & board.pieces(piece);
    bb.into_iter().count() as i32
}

// Positive means White has more material.
pub fn material_eval_cp(board: &Board) -> i32 {
    let w = Color::White;
    let b = Color::Black;
    (count_piece(board, w, Piece::Pawn) - count_piece(board, b, Piece::Pawn)) * PAWN +
    (count_piece(board, w, Piece::Knight) - count_piece(board, b, Piece::Knight)) * KNIGHT +
    (count_piece(board, w, Piece::Bishop) - count_piece(board, b, Piece::Bishop)) * BISHOP +
    (count_piece(board, w, Piece::Rook) - count_piece(board, b, Piece::Rook)) * ROOK +
    (count_piece(board, w, Piece::Queen) - count_piece(board, b, Piece::Queen)) * QUEEN
}

/// Offline oracle: one-ply material balance with mate and stalemate
/// detection. Ties keep UCI order so runs are reproducible.
#[derive(Debug, Default, Clone)]
pub struct MaterialOracle {
    pub queries: u64,
}

impl MaterialOracle {
    pub fn new() -> Self { Self::default() }

    fn score_move(child: &Position, mover: Color) -> Score {
        if child.is_checkmate() {
            return Score::Mate(if mover == Color::White { 1 } else { -1 });
        }
        if child.is_stalemate() { return Score::Cp(0); }
        Score::Cp(material_eval_cp(child.board()))
    }
}

impl Oracle for MaterialOracle {
    fn analyze(&mut self, request: &AnalysisRequest, updates: Option<&Sender<Analysis>>) -> Result<Analysis, OracleError> {
        self.queries += 1;
        let pos = Position::from_fen(&request.fen)
            .map_err(|e| OracleError::BadPosition { fen: request.fen.clone(), reason: e.to_string() })?;
        let mover = pos.side_to_move();
        let mut candidates = Vec::new();
        for mv in pos.legal_moves() {
            let uci = pos.uci(mv);
            if !request.restrict_to.is_empty() && !request.restrict_to.contains(&uci) { continue; }
            let child = pos.play(mv).map_err(|e| OracleError::BadPosition { fen: request.fen.clone(), reason: e.to_string() })?;
            candidates.push(Candidate { mv: uci, score: Self::score_move(&child, mover), depth: request.depth });
        }
        candidates.sort_by(|a, b| a.mv.cmp(&b.mv));
        compare::rank(&mut candidates, mover);
        candidates.truncate(request.multi_pv.max(1));
        let analysis = Analysis { candidates, final_depth: request.depth };
        if let Some(tx) = updates {
            let _ = tx.send(analysis.clone());
        }
        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn material_startpos_is_zero() {
        assert_eq!(material_eval_cp(&Board::default()), 0);
    }

    #[test]
    fn prefers_winning_queen_capture_for_side_to_move() {
        // Black to move can take the white queen on e2.
        let fen = "k7/8/8/8/8/8/3qQ3/7K b - - 0 1";
        let mut oracle = MaterialOracle::new();
        let req = AnalysisRequest { fen: fen.into(), depth: 4, multi_pv: 3, threads: 1, restrict_to: vec![] };
        let res = oracle.analyze(&req, None).unwrap();
        assert_eq!(res.candidates[0].mv, "d2e2");
        assert_eq!(res.candidates.len(), 3);
        assert!(res.candidates.iter().all(|c| c.depth == 4));
    }

    #[test]
    fn honors_restriction() {
        let mut oracle = MaterialOracle::new();
        let req = AnalysisRequest {
            fen: Position::startpos().fen(), depth: 1, multi_pv: 5, threads: 1,
            restrict_to: vec!["e2e4".into()],
        };
        let res = oracle.analyze(&req, None).unwrap();
        assert_eq!(res.candidates.len(), 1);
        assert_eq!(res.candidates[0].mv, "e2e4");
    }
}
