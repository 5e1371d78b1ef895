use cozy_chess::{Move, Piece, Square};

use crate::board::cozy::{CodecError, Position};

pub fn piece_letter(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'P',
        Piece::Knight => 'N',
        Piece::Bishop => 'B',
        Piece::Rook => 'R',
        Piece::Queen => 'Q',
        Piece::King => 'K',
    }
}

pub fn piece_from_char(c: char) -> Option<Piece> {
    match c.to_ascii_uppercase() {
        'P' => Some(Piece::Pawn),
        'N' => Some(Piece::Knight),
        'B' => Some(Piece::Bishop),
        'R' => Some(Piece::Rook),
        'Q' => Some(Piece::Queen),
        'K' => Some(Piece::King),
        _ => None,
    }
}

fn is_castle(pos: &Position, mv: Move) -> bool {
    let b = pos.board();
    b.piece_on(mv.from) == Some(Piece::King) && b.color_on(mv.to) == Some(b.side_to_move())
}

fn is_kingside(mv: Move) -> bool { mv.to.file() as u8 > mv.from.file() as u8 }

fn file_char(sq: Square) -> char { sq.to_string().chars().next().unwrap_or('?') }

fn rank_char(sq: Square) -> char { sq.to_string().chars().nth(1).unwrap_or('?') }

/// Finds the legal move named by SAN text (`Nf3`, `exd5`, `O-O`, `e8=Q+`).
pub fn resolve(pos: &Position, text: &str) -> Result<Move, CodecError> {
    let unparsable = || CodecError::Unparsable { text: text.to_string() };
    let clean: String = text
        .trim_end_matches(|c| matches!(c, '+' | '#' | '!' | '?'))
        .replace('0', "O");

    if clean == "O-O" || clean == "O-O-O" {
        let kingside = clean == "O-O";
        return pos
            .legal_moves()
            .into_iter()
            .find(|&m| is_castle(pos, m) && is_kingside(m) == kingside)
            .ok_or_else(|| CodecError::Illegal { text: text.to_string(), fen: pos.fen() });
    }

    let (body, promotion) = match clean.split_once('=') {
        Some((body, promo)) => (body.to_string(), Some(promo.chars().next().and_then(piece_from_char).ok_or_else(unparsable)?)),
        None => match clean.chars().last() {
            Some(c) if clean.len() > 2 && "NBRQ".contains(c) => (clean[..clean.len() - 1].to_string(), piece_from_char(c)),
            _ => (clean.clone(), None),
        },
    };
    let (piece, rest) = match body.chars().next() {
        Some(c) if "NBRQK".contains(c) => (piece_from_char(c).ok_or_else(unparsable)?, &body[1..]),
        Some(_) => (Piece::Pawn, &body[..]),
        None => return Err(unparsable()),
    };
    let rest: String = rest.chars().filter(|&c| c != 'x' && c != '-').collect();
    if rest.len() < 2 || !rest.is_ascii() { return Err(unparsable()); }
    let (hint, dest) = rest.split_at(rest.len() - 2);
    let to: Square = dest.parse().map_err(|_| unparsable())?;
    if hint.len() > 2 || !hint.chars().all(|c| ('a'..='h').contains(&c) || ('1'..='8').contains(&c)) {
        return Err(unparsable());
    }

    let matches: Vec<Move> = pos
        .legal_moves()
        .into_iter()
        .filter(|&m| {
            !is_castle(pos, m)
                && m.to == to
                && m.promotion == promotion
                && pos.board().piece_on(m.from) == Some(piece)
                && hint.chars().all(|c| c == file_char(m.from) || c == rank_char(m.from))
        })
        .collect();
    match matches.as_slice() {
        [mv] => Ok(*mv),
        [] => Err(CodecError::Illegal { text: text.to_string(), fen: pos.fen() }),
        _ => Err(CodecError::Ambiguous { text: text.to_string(), fen: pos.fen() }),
    }
}

/// Labels a legal move in SAN.
pub fn format(pos: &Position, mv: Move) -> String {
    let board = pos.board();
    let check_suffix = |out: &mut String| {
        if let Ok(child) = pos.play(mv) {
            if child.is_checkmate() { out.push('#') } else if child.in_check() { out.push('+') }
        }
    };
    if is_castle(pos, mv) {
        let mut out = if is_kingside(mv) { "O-O".to_string() } else { "O-O-O".to_string() };
        check_suffix(&mut out);
        return out;
    }
    let Some(piece) = board.piece_on(mv.from) else { return pos.uci(mv) };
    let capture = board.color_on(mv.to) == Some(!board.side_to_move())
        || (piece == Piece::Pawn && mv.from.file() != mv.to.file());

    let mut out = String::new();
    if piece == Piece::Pawn {
        if capture { out.push(file_char(mv.from)); }
    } else {
        out.push(piece_letter(piece));
        let rivals: Vec<Square> = pos
            .legal_moves()
            .into_iter()
            .filter(|&m| m.to == mv.to && m.from != mv.from && board.piece_on(m.from) == Some(piece) && !is_castle(pos, m))
            .map(|m| m.from)
            .collect();
        if !rivals.is_empty() {
            let same_file = rivals.iter().any(|s| s.file() == mv.from.file());
            let same_rank = rivals.iter().any(|s| s.rank() == mv.from.rank());
            if !same_file {
                out.push(file_char(mv.from));
            } else if !same_rank {
                out.push(rank_char(mv.from));
            } else {
                out.push(file_char(mv.from));
                out.push(rank_char(mv.from));
            }
        }
    }
    if capture { out.push('x'); }
    out.push_str(&mv.to.to_string());
    if let Some(p) = mv.promotion {
        out.push('=');
        out.push(piece_letter(p));
    }
    check_suffix(&mut out);
    out
}
