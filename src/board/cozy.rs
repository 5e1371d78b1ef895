use cozy_chess::{Board as CozyBoard, Color, File, GameStatus, Move, Piece, Square};

use crate::board::san;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("invalid FEN `{fen}`: {reason}")]
    InvalidFen { fen: String, reason: String },
    #[error("`{text}` is not a move")]
    Unparsable { text: String },
    #[error("`{text}` is not legal in {fen}")]
    Illegal { text: String, fen: String },
    #[error("`{text}` is ambiguous in {fen}")]
    Ambiguous { text: String, fen: String },
}

/// Board position as the line search sees it: a cozy-chess board plus the
/// move-text conventions used in stored lines and oracle requests.
#[derive(Clone, Debug)]
pub struct Position {
    board: CozyBoard,
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool { self.fen() == other.fen() }
}

impl Eq for Position {}

impl Position {
    pub fn startpos() -> Self {
        Self { board: CozyBoard::default() }
    }

    pub fn from_fen(fen: &str) -> Result<Self, CodecError> {
        CozyBoard::from_fen(fen.trim(), false)
            .map(|b| Self { board: b })
            .map_err(|e| CodecError::InvalidFen { fen: fen.to_string(), reason: format!("{e:?}") })
    }

    pub fn board(&self) -> &CozyBoard { &self.board }

    pub fn fen(&self) -> String { self.board.to_string() }

    pub fn side_to_move(&self) -> Color { self.board.side_to_move() }

    pub fn fullmove_number(&self) -> u16 { self.board.fullmove_number() }

    /// Zobrist key; equal keys mean the same position regardless of move order.
    pub fn key(&self) -> u64 { self.board.hash() }

    pub fn legal_moves(&self) -> Vec<Move> {
        let mut out = Vec::new();
        self.board.generate_moves(|moves| { out.extend(moves); false });
        out
    }

    pub fn has_legal_moves(&self) -> bool {
        let mut any = false;
        self.board.generate_moves(|moves| { any = !moves.is_empty(); any });
        any
    }

    pub fn is_checkmate(&self) -> bool { self.board.status() == GameStatus::Won }

    pub fn is_stalemate(&self) -> bool {
        !self.has_legal_moves() && self.board.checkers().is_empty()
    }

    pub fn in_check(&self) -> bool { !self.board.checkers().is_empty() }

    /// Resolves move text against this position. Accepts the stored long
    /// notation (`Ng1f3`), UCI (`g1f3`, `e1g1`, `e1h1`) and SAN (`Nf3`, `O-O`).
    pub fn parse_move(&self, text: &str) -> Result<Move, CodecError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(CodecError::Unparsable { text: text.to_string() });
        }
        if let Some(mv) = self.parse_coordinate(trimmed)? {
            return Ok(mv);
        }
        san::resolve(self, trimmed)
    }

    // `Pe2e4` / `e2e4` style; Ok(None) means "not coordinate text, try SAN".
    fn parse_coordinate(&self, text: &str) -> Result<Option<Move>, CodecError> {
        let body = match text.chars().next() {
            Some(c) if "PNBRQK".contains(c) && text.len() >= 5 && text.as_bytes()[1].is_ascii_lowercase() && text.as_bytes()[2].is_ascii_digit() => &text[1..],
            _ => text,
        };
        if !(4..=5).contains(&body.len()) || !body.is_ascii() { return Ok(None); }
        let (Ok(from), Ok(to)) = (body[0..2].parse::<Square>(), body[2..4].parse::<Square>()) else { return Ok(None) };
        let promotion = match body.get(4..5) {
            None => None,
            Some(p) => Some(san::piece_from_char(p.chars().next().unwrap_or(' ')).ok_or_else(|| CodecError::Unparsable { text: text.to_string() })?),
        };
        let mv = Move { from, to, promotion };
        if self.board.is_legal(mv) { return Ok(Some(mv)); }
        // Standard castling notation; cozy-chess encodes castling as king-takes-rook.
        if self.board.piece_on(from) == Some(Piece::King) && from.file() == File::E && from.rank() == to.rank() {
            let rook_file = match to.file() { File::G => Some(File::H), File::C => Some(File::A), _ => None };
            if let Some(rf) = rook_file {
                let castle = Move { from, to: Square::new(rf, from.rank()), promotion: None };
                if self.board.is_legal(castle) { return Ok(Some(castle)); }
            }
        }
        Err(CodecError::Illegal { text: text.to_string(), fen: self.fen() })
    }

    fn is_castle(&self, mv: Move) -> bool {
        self.board.piece_on(mv.from) == Some(Piece::King) && self.board.color_on(mv.to) == Some(self.side_to_move())
    }

    // Destination as a player would name it: the king's target square when castling.
    fn visible_to(&self, mv: Move) -> Square {
        if self.is_castle(mv) {
            let file = if mv.to.file() as u8 > mv.from.file() as u8 { File::G } else { File::C };
            Square::new(file, mv.from.rank())
        } else {
            mv.to
        }
    }

    /// Standard UCI text (castling as the king's two-square move).
    pub fn uci(&self, mv: Move) -> String {
        let mut s = format!("{}{}", mv.from, self.visible_to(mv));
        if let Some(p) = mv.promotion { s.push(san::piece_letter(p).to_ascii_lowercase()); }
        s
    }

    /// Stored line notation: piece letter + from + to (+ promotion piece).
    pub fn long_notation(&self, mv: Move) -> String {
        let piece = self.board.piece_on(mv.from).map(san::piece_letter).unwrap_or('?');
        format!("{piece}{}", self.uci(mv))
    }

    pub fn san(&self, mv: Move) -> String { san::format(self, mv) }

    pub fn play(&self, mv: Move) -> Result<Position, CodecError> {
        let mut board = self.board.clone();
        board.try_play(mv).map_err(|_| CodecError::Illegal { text: format!("{mv}"), fen: self.fen() })?;
        Ok(Self { board })
    }

    pub fn apply(&self, text: &str) -> Result<Position, CodecError> {
        let mv = self.parse_move(text)?;
        self.play(mv)
    }

    pub fn replay(root_fen: &str, moves: &[String]) -> Result<Position, CodecError> {
        let mut pos = Self::from_fen(root_fen)?;
        for m in moves { pos = pos.apply(m)?; }
        Ok(pos)
    }
}
