use std::sync::mpsc::{self, Receiver, Sender};

use log::{debug, info, warn};

use crate::board::Position;
use crate::cache::{CacheEntry, LineCache};
use crate::fish::config::SearchConfig;
use crate::fish::control::{CancelToken, RunControl};
use crate::fish::expand;
use crate::fish::line::Line;
use crate::fish::state::{Progress, SearchState};
use crate::fish::{compare, FishError, INITIATOR_MULTI_PV};
use crate::oracle::{Analysis, AnalysisRequest, Oracle, OracleError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The queue drained.
    Finished,
    /// A stop request was honoured; the state can be resumed with `run`.
    Stopped,
}

/// Drives a [`SearchState`] with one oracle. The state lives outside so the
/// caller can export, import or inspect it between runs.
pub struct Fisher<O: Oracle> {
    oracle: O,
    cache: Option<Box<dyn LineCache>>,
    token: CancelToken,
    control: Box<dyn RunControl>,
    ticker: Option<Sender<Analysis>>,
}

impl<O: Oracle> Fisher<O> {
    pub fn new(oracle: O) -> Self {
        let token = CancelToken::new();
        Self { oracle, cache: None, control: Box::new(token.clone()), token, ticker: None }
    }

    pub fn with_cache(mut self, cache: Box<dyn LineCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Replaces the per-iteration check (e.g. with a `StepGate` built on
    /// [`Fisher::stop_handle`]).
    pub fn with_control(mut self, control: Box<dyn RunControl>) -> Self {
        self.control = control;
        self
    }

    pub fn oracle(&self) -> &O { &self.oracle }

    pub fn oracle_mut(&mut self) -> &mut O { &mut self.oracle }

    pub fn into_oracle(self) -> O { self.oracle }

    pub fn stop_handle(&self) -> CancelToken { self.token.clone() }

    /// Requests a stop. The next iteration boundary of the current run, or of
    /// the next `run` if none is in progress, returns [`RunOutcome::Stopped`].
    /// A request is consumed by the run that honours it.
    pub fn stop(&self) { self.token.cancel(); }

    /// Interim oracle rankings, for a live ticker. Replaces any earlier
    /// subscription; dropping the receiver is fine.
    pub fn subscribe(&mut self) -> Receiver<Analysis> {
        let (tx, rx) = mpsc::channel();
        self.ticker = Some(tx);
        rx
    }

    /// Validates `config`, scores the root and plays the initiator's first
    /// move. The returned state holds exactly one line.
    pub fn seed(&mut self, mut config: SearchConfig) -> Result<SearchState, FishError> {
        let root = config.validate()?;
        config.baseline_score = None;
        config.baseline_top_moves.clear();

        let analysis = self.consult(&config, Some(&[][..]), &root, INITIATOR_MULTI_PV, Vec::new())?;
        let mut ranked = analysis.candidates;
        compare::rank(&mut ranked, root.side_to_move());
        config.baseline_score = ranked.first().map(|c| c.score);
        config.baseline_top_moves = ranked.clone();

        let mut state = SearchState::new(config);
        state.seen.insert(root.key());
        let empty = Line::new(0, Vec::new(), root.fen(), Default::default(), 0);
        let (mut first, pos) = expand::play_initiator(self, &state.config, &empty, &root, ranked)?;
        first.id = state.next_id();
        expand::commit_initiator(&mut state, first, &pos, false);
        info!(
            "seeded line fishing from {} (max ply {}, fan-out {:?}/{}), first move {}",
            state.config.root_position,
            state.config.max_ply,
            state.config.responder_fanout,
            state.config.default_fanout,
            state.wip.front().or(state.done.last()).map(|l| l.moves.join(" ")).unwrap_or_default()
        );
        Ok(state)
    }

    /// Throws away all lines and seeds again from the same configuration.
    /// On error `state` is left as it was.
    pub fn reset(&mut self, state: &mut SearchState) -> Result<(), FishError> {
        let fresh = self.seed(state.config.clone())?;
        *state = fresh;
        Ok(())
    }

    /// Expands the head of the queue once. Returns the line that was worked
    /// on, as it stands afterwards. On error the state is untouched.
    pub fn step(&mut self, state: &mut SearchState) -> Result<Option<Line>, FishError> {
        let Some(head) = state.wip.front() else { return Ok(None) };
        debug!("step line {} [{}]", head.id, head.moves.join(" "));
        if head.initiator_to_move() {
            expand::initiator_step(self, state)
        } else {
            expand::responder_step(self, state)
        }
    }

    /// Runs until the queue is empty or a stop is requested. A stop requested
    /// before the call is honoured before the first step.
    pub fn run<F: FnMut(&Progress)>(&mut self, state: &mut SearchState, mut on_progress: F) -> Result<RunOutcome, FishError> {
        state.is_running = true;
        loop {
            if !self.control.proceed() {
                self.token.reset();
                state.is_running = false;
                info!("line fishing stopped: {} queued, {} done", state.wip.len(), state.done.len());
                return Ok(RunOutcome::Stopped);
            }
            if state.wip.is_empty() {
                state.is_running = false;
                info!("line fishing finished: {} lines, {} full", state.done.len(), state.full_count());
                return Ok(RunOutcome::Finished);
            }
            let current = match self.step(state) {
                Ok(line) => line,
                Err(e) => {
                    state.is_running = false;
                    return Err(e);
                }
            };
            on_progress(&state.progress(current.as_ref()));
        }
    }

    /// One ranking for `pos`, from the cache when possible. Restricted
    /// searches always go to the oracle and are never published.
    pub(crate) fn consult(
        &mut self,
        config: &SearchConfig,
        moves_from_root: Option<&[String]>,
        pos: &Position,
        multi_pv: usize,
        restrict_to: Vec<String>,
    ) -> Result<Analysis, FishError> {
        let request = AnalysisRequest {
            fen: pos.fen(),
            depth: config.search_depth,
            multi_pv,
            threads: config.threads,
            restrict_to,
        };
        let cacheable = request.restrict_to.is_empty();
        if cacheable {
            if let Some(hit) = self.cache.as_ref().and_then(|c| c.get(&request.fen, multi_pv, request.depth)) {
                if hit.iter().all(|c| pos.parse_move(&c.mv).is_ok()) {
                    let mut candidates = hit;
                    candidates.truncate(multi_pv);
                    return Ok(Analysis { candidates, final_depth: request.depth });
                }
                warn!("ignoring cached ranking for {} with illegal moves", request.fen);
            }
        }

        let analysis = self.oracle.analyze(&request, self.ticker.as_ref())?;
        if analysis.candidates.is_empty() {
            return Err(OracleError::Empty { fen: request.fen }.into());
        }
        if cacheable {
            if let Some(cache) = &self.cache {
                cache.put(CacheEntry {
                    root: config.root_position.clone(),
                    moves: moves_from_root.map(|m| m.to_vec()),
                    position: request.fen.clone(),
                    best_moves: analysis.candidates.clone(),
                    search_line_count: multi_pv,
                    max_depth: request.depth,
                });
            }
        }
        Ok(analysis)
    }
}
