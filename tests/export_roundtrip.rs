mod common;

use common::{config, ScriptedOracle};
use linefish::fish::export::{self, ImportedState};
use linefish::fish::{Fisher, Line, RunOutcome, SearchState};
use linefish::oracle::Score;
use pretty_assertions::assert_eq;
use serde_json::Value;

fn finished_state() -> SearchState {
    let mut fisher = Fisher::new(ScriptedOracle::new());
    let mut state = fisher.seed(config(1, 2)).unwrap();
    fisher.run(&mut state, |_| {}).unwrap();
    state
}

fn stopped_state(after: usize) -> (Fisher<ScriptedOracle>, SearchState) {
    let mut fisher = Fisher::new(ScriptedOracle::new());
    let mut state = fisher.seed(config(2, 2)).unwrap();
    for _ in 0..after {
        fisher.step(&mut state).unwrap();
    }
    (fisher, state)
}

// What survives the trip: annotations are display-only and not exported.
type Shape = (u64, Vec<String>, Option<String>, Score, i32, bool, bool, bool);

fn shape<'a>(lines: impl IntoIterator<Item = &'a Line>) -> Vec<Shape> {
    lines
        .into_iter()
        .map(|l| (l.id, l.moves.clone(), l.position.clone(), l.score, l.delta, l.is_done, l.is_full, l.is_transposition))
        .collect()
}

#[test]
fn finished_run_survives_export_and_import() {
    let mut state = finished_state();
    state.done[2].score = Score::Mate(-3);
    state.done[2].delta = -31_000;
    let json = export::export(&state).unwrap();
    let restored = export::import(&json).into_result().unwrap();

    assert_eq!(restored.config, state.config);
    assert_eq!(shape(&restored.done), shape(&state.done));
    assert_eq!((restored.done[2].score, restored.done[2].delta), (Score::Mate(-3), -31_000));
    assert!(restored.done[..2].iter().all(|l| matches!(l.score, Score::Cp(_))));
    assert!(restored.wip.is_empty());
    assert_eq!(restored.line_counter, state.line_counter);
    assert!(!restored.is_running);
    assert_eq!(restored.seen, state.seen);
}

#[test]
fn document_carries_header_and_summary() {
    let state = finished_state();
    let doc: Value = serde_json::from_str(&export::export(&state).unwrap()).unwrap();
    assert_eq!(doc["version"], 1);
    assert_eq!(doc["type"], "line-fisher-state");
    assert!(chrono::DateTime::parse_from_rfc3339(doc["timestamp"].as_str().unwrap()).is_ok());
    assert_eq!(doc["summary"]["done"], 3);
    assert_eq!(doc["summary"]["full"], 2);
    assert_eq!(doc["summary"]["totalNodes"], 3);
    assert_eq!(doc["summary"]["totalLines"], 2);
    let lines = doc["summary"]["lines"].as_array().unwrap();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].as_str().unwrap().starts_with("1. a3 a5 2. "), "{}", lines[0]);
    assert_eq!(doc["config"]["maxPly"], 1);
    assert!(doc["done"][0].get("full").is_none());
}

#[test]
fn paused_run_resumes_after_import() {
    let (mut fisher, state) = stopped_state(2);
    let restored = export::import(&export::export(&state).unwrap()).into_result().unwrap();
    assert_eq!(shape(&restored.wip), shape(&state.wip));

    let mut resumed = restored;
    assert_eq!(fisher.run(&mut resumed, |_| {}).unwrap(), RunOutcome::Finished);

    let mut original = state;
    fisher.run(&mut original, |_| {}).unwrap();
    assert_eq!(shape(&resumed.done), shape(&original.done));
    assert!(resumed.done.iter().all(|l| l.id <= resumed.line_counter));
}

#[test]
fn missing_sections_are_all_reported() {
    let state = finished_state();
    let mut doc: Value = serde_json::from_str(&export::export(&state).unwrap()).unwrap();
    let obj = doc.as_object_mut().unwrap();
    obj.remove("type");
    obj.remove("config");
    obj.remove("wip");
    let ImportedState::Invalid(reasons) = export::import(&doc.to_string()) else { panic!("accepted a broken document") };
    assert_eq!(reasons.len(), 3, "{reasons:?}");
    assert!(reasons.iter().any(|r| r.contains("config")));
}

#[test]
fn unreplayable_queued_line_rejects_the_import() {
    let (_, state) = stopped_state(2);
    let mut doc: Value = serde_json::from_str(&export::export(&state).unwrap()).unwrap();
    doc["wip"][0]["moves"][1] = Value::String("Ke1e5".into());
    let ImportedState::Invalid(reasons) = export::import(&doc.to_string()) else { panic!("accepted an unplayable queue") };
    assert!(reasons.iter().any(|r| r.contains("cannot be replayed")), "{reasons:?}");
}

#[test]
fn unreplayable_done_line_keeps_an_unknown_position() {
    let state = finished_state();
    let mut doc: Value = serde_json::from_str(&export::export(&state).unwrap()).unwrap();
    doc["done"][1]["moves"][0] = Value::String("Pe2e5".into());
    let restored = export::import(&doc.to_string()).into_result().unwrap();
    assert_eq!(restored.done[1].position, None);
    assert!(restored.done[0].position.is_some());
}

#[test]
fn bad_root_and_config_values_are_reasons() {
    let state = finished_state();
    let mut doc: Value = serde_json::from_str(&export::export(&state).unwrap()).unwrap();
    doc["config"]["rootPosition"] = Value::String("8/8/8 w".into());
    doc["config"]["defaultFanout"] = Value::from(0);
    let ImportedState::Invalid(reasons) = export::import(&doc.to_string()) else { panic!() };
    assert!(reasons.iter().any(|r| r.contains("rootPosition")), "{reasons:?}");
    assert!(reasons.iter().any(|r| r.contains("defaultFanout")), "{reasons:?}");
}

#[test]
fn queued_line_of_impossible_length_rejects_the_import() {
    let (_, state) = stopped_state(2);
    assert!(state.wip.iter().any(|l| l.moves.len() == 3));
    let mut doc: Value = serde_json::from_str(&export::export(&state).unwrap()).unwrap();
    doc["config"]["maxPly"] = Value::from(1);
    let ImportedState::Invalid(reasons) = export::import(&doc.to_string()) else { panic!("accepted an overlong queued line") };
    assert!(reasons.iter().any(|r| r.contains("has 3 half-moves")), "{reasons:?}");

    let mut doc: Value = serde_json::from_str(&export::export(&state).unwrap()).unwrap();
    doc["wip"][0]["moves"] = Value::Array(Vec::new());
    let ImportedState::Invalid(reasons) = export::import(&doc.to_string()) else { panic!("accepted an empty queued line") };
    assert!(reasons.iter().any(|r| r.contains("has 0 half-moves")), "{reasons:?}");
}
