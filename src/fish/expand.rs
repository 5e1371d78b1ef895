//! The two expansion rules. Each computes its result from copies and only
//! touches the state once the oracle has answered, so a failed call leaves
//! the queue exactly as it was.

use cozy_chess::Move;
use log::{debug, warn};

use crate::board::Position;
use crate::fish::compare;
use crate::fish::config::SearchConfig;
use crate::fish::line::Line;
use crate::fish::scheduler::Fisher;
use crate::fish::state::SearchState;
use crate::fish::{FishError, INITIATOR_MULTI_PV, RESPONDER_MIN_MULTI_PV};
use crate::oracle::{Candidate, Oracle, OracleError, Score};

pub(crate) fn position_of(line: &Line) -> Result<Position, FishError> {
    let fen = line.position.as_deref().ok_or(FishError::UnknownPosition { id: line.id })?;
    Ok(Position::from_fen(fen)?)
}

/// Records how `pos` ends the line, if it does, and marks it seen.
fn settle(state: &mut SearchState, line: &mut Line, pos: &Position) -> bool {
    line.is_transposition = !state.seen.insert(pos.key());
    line.is_mate = pos.is_checkmate();
    line.is_stalemate = pos.is_stalemate();
    line.is_full = line.moves.len() >= state.config.full_length();
    line.is_done = line.is_full || line.is_mate || line.is_stalemate || line.is_transposition;
    line.is_done
}

// A line whose side to move has nothing to play.
fn close_dead_end(state: &mut SearchState, pos: &Position) -> Option<Line> {
    let mut line = state.wip.pop_front()?;
    line.is_mate = pos.is_checkmate();
    line.is_stalemate = !line.is_mate;
    line.is_done = true;
    state.done.push(line.clone());
    Some(line)
}

fn same_move(pos: &Position, text: &str, mv: Move) -> bool {
    pos.parse_move(text).map(|m| m == mv).unwrap_or(false)
}

/// Picks and plays the initiator's move on a copy of `line`: the forced move
/// for this depth if there is one, else the best of `ranked`.
pub(crate) fn play_initiator<O: Oracle>(
    fisher: &mut Fisher<O>,
    config: &SearchConfig,
    line: &Line,
    pos: &Position,
    ranked: Vec<Candidate>,
) -> Result<(Line, Position), FishError> {
    let depth = line.depth();
    let (mv, score): (Move, Score) = match config.forced_at(depth) {
        Some(text) => {
            let forced = pos
                .parse_move(text)
                .map_err(|source| FishError::ForcedMove { depth, text: text.to_string(), source })?;
            match ranked.iter().find(|c| same_move(pos, &c.mv, forced)) {
                Some(c) => (forced, c.score),
                None => {
                    let uci = pos.uci(forced);
                    debug!("forced {uci} not among top candidates, scoring it alone");
                    let restricted = fisher.consult(config, Some(line.moves.as_slice()), pos, 1, vec![uci.clone()])?;
                    let mut answers = restricted.candidates;
                    compare::rank(&mut answers, pos.side_to_move());
                    let top = answers.into_iter().next().ok_or_else(|| OracleError::Empty { fen: pos.fen() })?;
                    if same_move(pos, &top.mv, forced) {
                        (forced, top.score)
                    } else {
                        warn!("oracle answered {} when restricted to forced {uci} in {}; playing its move", top.mv, pos.fen());
                        (pos.parse_move(&top.mv)?, top.score)
                    }
                }
            }
        }
        None => {
            let top = ranked.first().ok_or_else(|| OracleError::Empty { fen: pos.fen() })?;
            (pos.parse_move(&top.mv)?, top.score)
        }
    };

    let next_pos = pos.play(mv)?;
    let mut next = line.clone();
    next.moves.push(pos.long_notation(mv));
    next.position = Some(next_pos.fen());
    next.score = score;
    next.delta = compare::delta(score, config.baseline_score);
    next.top_alternatives_seen = ranked.iter().filter(|c| !same_move(pos, &c.mv, mv)).map(|c| c.mv.clone()).collect();
    Ok((next, next_pos))
}

/// Files an initiator result: done if it ended, otherwise back at the head
/// of the queue (`from_queue`) or appended (a fresh seed).
pub(crate) fn commit_initiator(state: &mut SearchState, mut line: Line, pos: &Position, from_queue: bool) -> Line {
    let terminal = settle(state, &mut line, pos);
    if from_queue {
        state.wip.pop_front();
    }
    if terminal {
        state.done.push(line.clone());
    } else if from_queue {
        state.wip.push_front(line.clone());
    } else {
        state.wip.push_back(line.clone());
    }
    line
}

/// Even-length head: extend it by exactly one initiator move.
pub(crate) fn initiator_step<O: Oracle>(fisher: &mut Fisher<O>, state: &mut SearchState) -> Result<Option<Line>, FishError> {
    let Some(line) = state.wip.front().cloned() else { return Ok(None) };
    let pos = position_of(&line)?;
    if !pos.has_legal_moves() {
        return Ok(close_dead_end(state, &pos));
    }
    let analysis = fisher.consult(&state.config, Some(line.moves.as_slice()), &pos, INITIATOR_MULTI_PV, Vec::new())?;
    let mut ranked = analysis.candidates;
    compare::rank(&mut ranked, pos.side_to_move());
    let (next, next_pos) = play_initiator(fisher, &state.config, &line, &pos, ranked)?;
    Ok(Some(commit_initiator(state, next, &next_pos, true)))
}

/// Odd-length head: branch into the responder's top resolved replies and
/// retire the parent.
pub(crate) fn responder_step<O: Oracle>(fisher: &mut Fisher<O>, state: &mut SearchState) -> Result<Option<Line>, FishError> {
    let Some(line) = state.wip.front().cloned() else { return Ok(None) };
    let pos = position_of(&line)?;
    if !pos.has_legal_moves() {
        return Ok(close_dead_end(state, &pos));
    }
    let fanout = state.config.fanout_at(line.depth());
    let analysis = fisher.consult(&state.config, Some(line.moves.as_slice()), &pos, fanout.max(RESPONDER_MIN_MULTI_PV), Vec::new())?;
    let mut ranked = analysis.candidates;
    compare::rank(&mut ranked, pos.side_to_move());

    let mut children = Vec::with_capacity(fanout);
    for reply in ranked.iter().filter(|c| c.is_resolved(state.config.search_depth)).take(fanout) {
        let mv = pos.parse_move(&reply.mv)?;
        let child_pos = pos.play(mv)?;
        let mut moves = line.moves.clone();
        moves.push(pos.long_notation(mv));
        let delta = compare::delta(reply.score, state.config.baseline_score);
        children.push((Line::new(0, moves, child_pos.fen(), reply.score, delta), child_pos));
    }
    if children.is_empty() {
        warn!("line {} has no resolved replies at depth {}", line.id, state.config.search_depth);
    }

    let mut parent = line;
    parent.is_done = true;
    parent.top_replies_seen = ranked.iter().map(|c| c.mv.clone()).collect();
    state.wip.pop_front();
    state.done.push(parent.clone());
    for (mut child, child_pos) in children {
        child.id = state.next_id();
        if settle(state, &mut child, &child_pos) {
            state.done.push(child);
        } else {
            state.wip.push_back(child);
        }
    }
    Ok(Some(parent))
}
