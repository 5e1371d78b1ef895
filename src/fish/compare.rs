//! Ordering of oracle candidates by how good they are for one side.
//!
//! Orientation comes only from the colour passed in, which callers take from
//! the side to move in the analysed position.

use std::cmp::Ordering;

use cozy_chess::Color;

use crate::oracle::{Candidate, Score};

/// `Greater` means `a` is better than `b` for `perspective`.
///
/// A mate for `perspective` beats every non-mate, a shorter such mate beats a
/// longer one, and being mated is worse than any non-mate (a longer defence
/// being the lesser evil). Non-mates compare by centipawns.
pub fn compare(a: &Score, b: &Score, perspective: Color) -> Ordering {
    let ord = a.as_cp().cmp(&b.as_cp());
    match perspective {
        Color::White => ord,
        Color::Black => ord.reverse(),
    }
}

/// Sorts best-first for `side_to_move`. Equal scores keep their incoming order.
pub fn rank(candidates: &mut [Candidate], side_to_move: Color) {
    candidates.sort_by(|a, b| compare(&b.score, &a.score, side_to_move));
}

pub fn delta(score: Score, baseline: Option<Score>) -> i32 {
    score.as_cp() - baseline.map(|b| b.as_cp()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(mv: &str, score: Score) -> Candidate { Candidate { mv: mv.into(), score, depth: 10 } }

    #[test]
    fn mates_sort_before_non_mates_for_the_mating_side() {
        let mut c = vec![cand("a", Score::Cp(800)), cand("b", Score::Mate(5)), cand("c", Score::Mate(2)), cand("d", Score::Mate(-1))];
        rank(&mut c, Color::White);
        let order: Vec<_> = c.iter().map(|x| x.mv.as_str()).collect();
        assert_eq!(order, ["c", "b", "a", "d"]);
        rank(&mut c, Color::Black);
        let order: Vec<_> = c.iter().map(|x| x.mv.as_str()).collect();
        assert_eq!(order, ["d", "a", "b", "c"]);
    }

    #[test]
    fn delta_defaults_baseline_to_zero() {
        assert_eq!(delta(Score::Cp(35), None), 35);
        assert_eq!(delta(Score::Cp(35), Some(Score::Cp(50))), -15);
    }
}
