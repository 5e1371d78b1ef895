use std::collections::{HashSet, VecDeque};

use crate::fish::combinatorics;
use crate::fish::config::SearchConfig;
use crate::fish::line::Line;

/// Everything a run owns. Every line ever created sits in exactly one of
/// `wip` or `done`.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    pub is_running: bool,
    pub line_counter: u64,
    pub wip: VecDeque<Line>,
    pub done: Vec<Line>,
    pub config: SearchConfig,
    /// Position keys already reached by some line.
    pub seen: HashSet<u64>,
}

/// Snapshot handed to progress callbacks after every step.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub wip: usize,
    pub done: usize,
    pub full: usize,
    pub total_nodes: u64,
    pub total_lines: u64,
    pub percent: f64,
    pub current: Option<Line>,
}

impl SearchState {
    pub fn new(config: SearchConfig) -> Self {
        Self { config, ..Self::default() }
    }

    pub fn next_id(&mut self) -> u64 {
        self.line_counter += 1;
        self.line_counter
    }

    pub fn full_count(&self) -> usize { self.done.iter().filter(|l| l.is_full).count() }

    pub fn line_count(&self) -> usize { self.wip.len() + self.done.len() }

    pub fn is_finished(&self) -> bool { self.wip.is_empty() }

    pub fn progress(&self, current: Option<&Line>) -> Progress {
        let total_nodes = combinatorics::total_nodes(&self.config);
        let percent = if total_nodes == 0 { 100.0 } else { (self.done.len() as f64 / total_nodes as f64 * 100.0).min(100.0) };
        Progress {
            wip: self.wip.len(),
            done: self.done.len(),
            full: self.full_count(),
            total_nodes,
            total_lines: combinatorics::total_lines(&self.config),
            percent,
            current: current.cloned(),
        }
    }

    /// Structural invariants; returns the first violation found.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut ids = HashSet::new();
        for line in self.wip.iter().chain(self.done.iter()) {
            if !ids.insert(line.id) { return Err(format!("line {} appears twice", line.id)); }
            if line.is_full && !line.is_done { return Err(format!("line {} is full but not done", line.id)); }
            if line.id > self.line_counter { return Err(format!("line {} is ahead of the counter", line.id)); }
        }
        if let Some(l) = self.wip.iter().find(|l| l.is_done) { return Err(format!("done line {} still queued", l.id)); }
        if let Some(l) = self.done.iter().find(|l| !l.is_done) { return Err(format!("line {} in done without is_done", l.id)); }
        Ok(())
    }
}
