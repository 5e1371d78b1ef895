//! Line fishing: expand an opening line into a bounded tree of variations.
//!
//! The initiator plays one move per turn (forced or the oracle's best); the
//! responder branches into its top replies. Lines are queued FIFO and
//! expanded one oracle call at a time.

pub mod combinatorics;
pub mod compare;
pub mod config;
pub mod control;
pub mod export;
pub mod line;
pub mod scheduler;
pub mod state;

mod expand;

use crate::board::CodecError;
use crate::oracle::OracleError;

pub use config::{ConfigError, SearchConfig};
pub use control::{CancelToken, RunControl};
pub use export::{export, import, ImportedState};
pub use line::Line;
pub use scheduler::{Fisher, RunOutcome};
pub use state::{Progress, SearchState};

/// Candidates requested for an initiator move. More than one so a forced
/// move that ranks near the top needs no second query.
pub const INITIATOR_MULTI_PV: usize = 3;

/// Floor on replies requested for a responder step; the surplus over the
/// fan-out is only recorded for display.
pub const RESPONDER_MIN_MULTI_PV: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum FishError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Oracle(#[from] OracleError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("forced move `{text}` at depth {depth} cannot be played: {source}")]
    ForcedMove {
        depth: usize,
        text: String,
        #[source]
        source: CodecError,
    },
    #[error("line {id} has no known position")]
    UnknownPosition { id: u64 },
}
