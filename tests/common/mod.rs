#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use linefish::cache::{CacheEntry, LineCache};
use linefish::fish::SearchConfig;
use linefish::oracle::{Analysis, AnalysisRequest, Candidate, MaterialOracle, Oracle, OracleError, Score};

/// MaterialOracle wrapper that records every request and can misbehave on cue.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    inner: MaterialOracle,
    pub requests: Vec<AnalysisRequest>,
    /// Index of a call (0-based, counting all calls so far) that fails once.
    pub fail_at: Option<usize>,
    /// Move to answer with whenever the search is restricted.
    pub restricted_answer: Option<String>,
    /// Depth reported for unrestricted answers instead of the requested one.
    pub report_depth: Option<u32>,
}

impl ScriptedOracle {
    pub fn new() -> Self { Self::default() }

    pub fn restricted_requests(&self) -> Vec<&AnalysisRequest> {
        self.requests.iter().filter(|r| !r.restrict_to.is_empty()).collect()
    }
}

impl Oracle for ScriptedOracle {
    fn analyze(&mut self, request: &AnalysisRequest, updates: Option<&Sender<Analysis>>) -> Result<Analysis, OracleError> {
        let index = self.requests.len();
        self.requests.push(request.clone());
        if self.fail_at == Some(index) {
            self.fail_at = None;
            return Err(OracleError::Exited);
        }
        if !request.restrict_to.is_empty() {
            if let Some(mv) = &self.restricted_answer {
                let candidates = vec![Candidate { mv: mv.clone(), score: Score::Cp(-15), depth: request.depth }];
                return Ok(Analysis { candidates, final_depth: request.depth });
            }
        }
        let mut analysis = self.inner.analyze(request, updates)?;
        if let Some(depth) = self.report_depth {
            analysis.candidates.iter_mut().for_each(|c| c.depth = depth);
            analysis.final_depth = depth;
        }
        Ok(analysis)
    }
}

/// In-process cache keyed by FEN. Clones share the store.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    pub store: Arc<Mutex<HashMap<String, Vec<Candidate>>>>,
    pub puts: Arc<Mutex<Vec<CacheEntry>>>,
}

impl MemoryCache {
    pub fn insert(&self, fen: &str, candidates: Vec<Candidate>) {
        self.store.lock().unwrap().insert(fen.to_string(), candidates);
    }

    pub fn put_count(&self) -> usize { self.puts.lock().unwrap().len() }
}

impl LineCache for MemoryCache {
    fn get(&self, fen: &str, _search_line_count: usize, _max_depth: u32) -> Option<Vec<Candidate>> {
        self.store.lock().unwrap().get(fen).cloned()
    }

    fn put(&self, entry: CacheEntry) {
        self.store.lock().unwrap().insert(entry.position.clone(), entry.best_moves.clone());
        self.puts.lock().unwrap().push(entry);
    }
}

pub fn config(max_ply: usize, fanout: usize) -> SearchConfig {
    SearchConfig { max_ply, default_fanout: fanout, search_depth: 8, ..SearchConfig::default() }
}

pub fn cand(mv: &str, cp: i32, depth: u32) -> Candidate {
    Candidate { mv: mv.to_string(), score: Score::Cp(cp), depth }
}
