//! JSON export and import of a [`SearchState`].
//!
//! Lines are stored streamlined (moves, score, delta and terminal flags);
//! positions are rebuilt on import by replaying the moves from the root.

use std::collections::HashSet;

use cozy_chess::Color;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::board::{CodecError, Position};
use crate::fish::combinatorics;
use crate::fish::config::SearchConfig;
use crate::fish::line::Line;
use crate::fish::state::SearchState;
use crate::oracle::Score;

pub const FORMAT_VERSION: u32 = 1;
pub const DOCUMENT_TYPE: &str = "line-fisher-state";

fn is_false(b: &bool) -> bool { !*b }

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRecord {
    pub id: u64,
    pub moves: Vec<String>,
    #[serde(default)]
    pub score: Score,
    #[serde(default)]
    pub delta: i32,
    #[serde(default, skip_serializing_if = "is_false")]
    pub full: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub mate: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub stalemate: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub transposition: bool,
}

impl From<&Line> for LineRecord {
    fn from(l: &Line) -> Self {
        Self {
            id: l.id,
            moves: l.moves.clone(),
            score: l.score,
            delta: l.delta,
            full: l.is_full,
            mate: l.is_mate,
            stalemate: l.is_stalemate,
            transposition: l.is_transposition,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub wip: usize,
    pub done: usize,
    pub full: usize,
    pub total_nodes: u64,
    pub total_lines: u64,
    /// Finished variations in numbered SAN, with their scores.
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub version: u32,
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub config: SearchConfig,
    pub wip: Vec<LineRecord>,
    pub done: Vec<LineRecord>,
    pub summary: Summary,
}

/// Result of [`import`]. A document with any problem is rejected whole.
#[derive(Debug, Clone)]
pub enum ImportedState {
    Valid(Box<SearchState>),
    Invalid(Vec<String>),
}

impl ImportedState {
    pub fn into_result(self) -> Result<SearchState, Vec<String>> {
        match self {
            ImportedState::Valid(state) => Ok(*state),
            ImportedState::Invalid(reasons) => Err(reasons),
        }
    }
}

/// Numbered SAN for `moves` played from `root`, e.g. `1. e4 e5 2. Nf3` or
/// `12... Kh8 13. Qh5`.
pub fn san_text(root: &Position, moves: &[String]) -> Result<String, CodecError> {
    let mut pos = root.clone();
    let mut out = String::new();
    for (i, text) in moves.iter().enumerate() {
        let mv = pos.parse_move(text)?;
        if pos.side_to_move() == Color::White {
            out.push_str(&format!("{}. ", pos.fullmove_number()));
        } else if i == 0 {
            out.push_str(&format!("{}... ", pos.fullmove_number()));
        }
        out.push_str(&pos.san(mv));
        out.push(' ');
        pos = pos.play(mv)?;
    }
    Ok(out.trim_end().to_string())
}

fn summary(state: &SearchState) -> Summary {
    let root = Position::from_fen(&state.config.root_position).ok();
    let lines = state
        .done
        .iter()
        .filter(|l| l.is_full || l.is_mate || l.is_stalemate || l.is_transposition)
        .map(|l| {
            let text = root
                .as_ref()
                .and_then(|r| san_text(r, &l.moves).ok())
                .unwrap_or_else(|| l.moves.join(" "));
            format!("{text} ({})", l.score)
        })
        .collect();
    Summary {
        wip: state.wip.len(),
        done: state.done.len(),
        full: state.full_count(),
        total_nodes: combinatorics::total_nodes(&state.config),
        total_lines: combinatorics::total_lines(&state.config),
        lines,
    }
}

pub fn document(state: &SearchState) -> Document {
    Document {
        version: FORMAT_VERSION,
        timestamp: chrono::Utc::now().to_rfc3339(),
        kind: DOCUMENT_TYPE.to_string(),
        config: state.config.clone(),
        wip: state.wip.iter().map(LineRecord::from).collect(),
        done: state.done.iter().map(LineRecord::from).collect(),
        summary: summary(state),
    }
}

/// Pretty-printed JSON for `state`.
pub fn export(state: &SearchState) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&document(state))
}

fn field<T: for<'de> Deserialize<'de>>(doc: &Value, name: &str, reasons: &mut Vec<String>) -> Option<T> {
    match doc.get(name) {
        None | Some(Value::Null) => {
            reasons.push(format!("missing `{name}`"));
            None
        }
        Some(v) => match serde_json::from_value(v.clone()) {
            Ok(t) => Some(t),
            Err(e) => {
                reasons.push(format!("`{name}` is malformed: {e}"));
                None
            }
        },
    }
}

fn rebuild(record: LineRecord, root: &str, queued: bool, reasons: &mut Vec<String>) -> Line {
    let position = match Position::replay(root, &record.moves) {
        Ok(pos) => Some(pos.fen()),
        Err(e) if queued => {
            reasons.push(format!("queued line {} cannot be replayed: {e}", record.id));
            None
        }
        Err(_) => None,
    };
    Line {
        id: record.id,
        moves: record.moves,
        position,
        score: record.score,
        delta: record.delta,
        is_done: !queued,
        is_full: record.full,
        is_mate: record.mate,
        is_stalemate: record.stalemate,
        is_transposition: record.transposition,
        top_replies_seen: Vec::new(),
        top_alternatives_seen: Vec::new(),
    }
}

// Every prefix of a line was reached once, so all of them count as seen.
fn mark_seen(root: &Position, moves: &[String], seen: &mut HashSet<u64>) {
    let mut pos = root.clone();
    for text in moves {
        match pos.apply(text) {
            Ok(next) => pos = next,
            Err(_) => return,
        }
        seen.insert(pos.key());
    }
}

/// Parses and validates an exported document, collecting every problem.
/// An imported state is always paused.
pub fn import(json: &str) -> ImportedState {
    let doc: Value = match serde_json::from_str(json) {
        Ok(v) => v,
        Err(e) => return ImportedState::Invalid(vec![format!("not JSON: {e}")]),
    };
    let mut reasons = Vec::new();
    if !doc.is_object() {
        return ImportedState::Invalid(vec!["document is not an object".to_string()]);
    }
    match doc.get("type").and_then(Value::as_str) {
        Some(DOCUMENT_TYPE) => {}
        Some(other) => reasons.push(format!("unexpected type `{other}`")),
        None => reasons.push("missing `type`".to_string()),
    }
    if let Some(v) = doc.get("version").and_then(Value::as_u64) {
        if v != u64::from(FORMAT_VERSION) { reasons.push(format!("unsupported version {v}")); }
    }
    let config: Option<SearchConfig> = field(&doc, "config", &mut reasons);
    let wip: Option<Vec<LineRecord>> = field(&doc, "wip", &mut reasons);
    let done: Option<Vec<LineRecord>> = field(&doc, "done", &mut reasons);

    let (Some(config), Some(wip), Some(done)) = (config, wip, done) else {
        return ImportedState::Invalid(reasons);
    };
    if let Err(e) = config.validate() {
        reasons.extend(e.reasons);
    }
    if Position::from_fen(&config.root_position).is_err() {
        return ImportedState::Invalid(reasons);
    }

    let full_length = config.full_length();
    for r in &wip {
        if r.moves.is_empty() || r.moves.len() >= full_length {
            reasons.push(format!("queued line {} has {} half-moves, expected 1 to {}", r.id, r.moves.len(), full_length - 1));
        }
    }

    let root = config.root_position.clone();
    let mut state = SearchState::new(config);
    state.wip = wip.into_iter().map(|r| rebuild(r, &root, true, &mut reasons)).collect();
    state.done = done.into_iter().map(|r| rebuild(r, &root, false, &mut reasons)).collect();
    state.line_counter = state.wip.iter().chain(state.done.iter()).map(|l| l.id).max().unwrap_or(0);
    state.is_running = false;

    let mut seen = HashSet::new();
    if let Ok(root) = Position::from_fen(&root) {
        seen.insert(root.key());
        for line in state.wip.iter().chain(state.done.iter()) {
            mark_seen(&root, &line.moves, &mut seen);
        }
    }
    state.seen = seen;

    if let Err(e) = state.check_invariants() {
        reasons.push(e);
    }
    if reasons.is_empty() {
        ImportedState::Valid(Box::new(state))
    } else {
        ImportedState::Invalid(reasons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn san_text_numbers_from_the_root() {
        let root = Position::startpos();
        let moves: Vec<String> = ["Pe2e4", "Pe7e5", "Ng1f3"].iter().map(|s| s.to_string()).collect();
        assert_eq!(san_text(&root, &moves).unwrap(), "1. e4 e5 2. Nf3");

        let black = Position::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1").unwrap();
        let moves: Vec<String> = ["Pe7e5", "Ng1f3"].iter().map(|s| s.to_string()).collect();
        assert_eq!(san_text(&black, &moves).unwrap(), "1... e5 2. Nf3");
    }

    #[test]
    fn flags_are_omitted_when_false() {
        let record = LineRecord { id: 4, moves: vec!["Pe2e4".into()], score: Score::Cp(20), delta: 0, full: true, mate: false, stalemate: false, transposition: false };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["full"], Value::Bool(true));
        assert!(json.get("mate").is_none());
        assert_eq!(json["score"]["cp"], 20);
    }

    #[test]
    fn rejects_garbage() {
        let ImportedState::Invalid(reasons) = import("{not json") else { panic!("accepted garbage") };
        assert_eq!(reasons.len(), 1);
        let ImportedState::Invalid(reasons) = import(r#"{"type":"something-else"}"#) else { panic!() };
        assert_eq!(reasons.len(), 4, "{reasons:?}");
    }
}
