use cozy_chess::Color;
use linefish::board::{CodecError, Position};

fn moves(list: &[&str]) -> Vec<String> { list.iter().map(|s| s.to_string()).collect() }

#[test]
fn replay_accepts_mixed_notations() {
    let start = Position::startpos().fen();
    let pos = Position::replay(&start, &moves(&["e2e4", "e5", "Ng1f3"])).expect("legal move sequence");
    assert_eq!(pos.side_to_move(), Color::Black, "expected black to move after 3 plies");
    assert_eq!(pos.fullmove_number(), 2);
}

#[test]
fn stored_notation_carries_the_piece() {
    let pos = Position::startpos();
    let mv = pos.parse_move("Nc3").unwrap();
    assert_eq!(pos.long_notation(mv), "Nb1c3");
    assert_eq!(pos.uci(mv), "b1c3");
    assert_eq!(pos.san(mv), "Nc3");
}

#[test]
fn promotions_keep_the_piece_letter() {
    let pos = Position::from_fen("8/4P1k1/8/8/8/8/8/4K3 w - - 0 1").unwrap();
    let mv = pos.parse_move("e8=N").unwrap();
    assert_eq!(pos.uci(mv), "e7e8n");
    assert_eq!(pos.long_notation(mv), "Pe7e8n");
    assert_eq!(pos.parse_move("e7e8n").unwrap(), mv);
    assert_eq!(pos.san(mv), "e8=N+");
}

#[test]
fn checkmate_and_stalemate_are_told_apart() {
    let mate = Position::from_fen("R5k1/5ppp/8/8/8/8/8/6K1 b - - 1 1").unwrap();
    assert!(mate.is_checkmate() && !mate.is_stalemate() && !mate.has_legal_moves());
    let stale = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
    assert!(stale.is_stalemate() && !stale.is_checkmate());
    assert!(Position::startpos().has_legal_moves());
}

#[test]
fn rejects_bad_text_with_specific_errors() {
    let pos = Position::startpos();
    assert!(matches!(pos.parse_move(""), Err(CodecError::Unparsable { .. })));
    assert!(matches!(pos.parse_move("e2e5"), Err(CodecError::Illegal { .. })));
    assert!(matches!(pos.parse_move("Qh5"), Err(CodecError::Illegal { .. })));
    assert!(matches!(Position::from_fen("8/8/8 w"), Err(CodecError::InvalidFen { .. })));
}

#[test]
fn transposed_move_orders_share_a_key() {
    let start = Position::startpos().fen();
    let a = Position::replay(&start, &moves(&["Nf3", "Nf6", "Nc3", "Nc6"])).unwrap();
    let b = Position::replay(&start, &moves(&["Nc3", "Nc6", "Nf3", "Nf6"])).unwrap();
    assert_eq!(a.key(), b.key());
    assert_ne!(a.key(), Position::startpos().key());
}
