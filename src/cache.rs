//! Client for the remote line cache (`/api/line`).
//!
//! The cache is never a source of truth: every failure reads as a miss and
//! writes are fire-and-forget.

use std::thread;
use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::oracle::{Candidate, Score};

/// A freshly computed ranking to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub root: String,
    /// Moves from `root` to `position`, when known.
    pub moves: Option<Vec<String>>,
    pub position: String,
    pub best_moves: Vec<Candidate>,
    pub search_line_count: usize,
    pub max_depth: u32,
}

pub trait LineCache: Send {
    /// Previously computed ranking for `fen`, possibly shorter or longer than
    /// `search_line_count`.
    fn get(&self, fen: &str, search_line_count: usize, max_depth: u32) -> Option<Vec<Candidate>>;

    /// Best effort; must not block the search or report failure.
    fn put(&self, entry: CacheEntry);
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("bad cache URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMove {
    #[serde(rename = "move")]
    mv: String,
    #[serde(default)]
    score: i32,
    #[serde(default)]
    mate_in: Option<i32>,
    #[serde(default)]
    draw: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireLine {
    root: String,
    #[serde(default)]
    moves: Option<Vec<String>>,
    position: String,
    best_moves: Vec<WireMove>,
    search_line_count: usize,
    max_depth: u32,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    ok: bool,
    #[serde(default)]
    data: Option<WireLine>,
}

impl WireMove {
    fn into_candidate(self, depth: u32) -> Candidate {
        let score = match (self.mate_in, self.draw) {
            (Some(n), _) if n != 0 => Score::Mate(n),
            (_, true) => Score::Cp(0),
            _ => Score::Cp(self.score),
        };
        Candidate { mv: self.mv, score, depth }
    }

    fn from_candidate(c: &Candidate) -> Self {
        match c.score {
            Score::Cp(cp) => Self { mv: c.mv.clone(), score: cp, mate_in: None, draw: false },
            Score::Mate(n) => Self { mv: c.mv.clone(), score: c.score.as_cp(), mate_in: Some(n), draw: false },
        }
    }
}

impl From<&CacheEntry> for WireLine {
    fn from(e: &CacheEntry) -> Self {
        Self {
            root: e.root.clone(),
            moves: e.moves.clone(),
            position: e.position.clone(),
            best_moves: e.best_moves.iter().map(WireMove::from_candidate).collect(),
            search_line_count: e.search_line_count,
            max_depth: e.max_depth,
        }
    }
}

/// HTTP implementation over a blocking reqwest client.
#[derive(Debug, Clone)]
pub struct HttpLineCache {
    endpoint: Url,
    client: reqwest::blocking::Client,
    writes: bool,
}

impl HttpLineCache {
    pub fn new(base_url: &str) -> Result<Self, CacheError> {
        let base = Url::parse(base_url)?;
        let endpoint = base.join("api/line")?;
        let client = reqwest::blocking::Client::builder().timeout(Duration::from_secs(5)).build()?;
        Ok(Self { endpoint, client, writes: true })
    }

    /// Read-only mode: lookups still happen, publications are skipped.
    pub fn read_only(mut self) -> Self {
        self.writes = false;
        self
    }

    fn fetch(&self, fen: &str, search_line_count: usize, max_depth: u32) -> Result<Option<WireLine>, CacheError> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("fen", fen)
            .append_pair("searchLineCount", &search_line_count.to_string())
            .append_pair("maxDepth", &max_depth.to_string());
        let response = self.client.get(url).send()?;
        if !response.status().is_success() {
            debug!("line cache miss ({}) for {fen}", response.status());
            return Ok(None);
        }
        let body: WireResponse = response.json()?;
        Ok(if body.ok { body.data } else { None })
    }
}

impl LineCache for HttpLineCache {
    fn get(&self, fen: &str, search_line_count: usize, max_depth: u32) -> Option<Vec<Candidate>> {
        match self.fetch(fen, search_line_count, max_depth) {
            Ok(Some(line)) if !line.best_moves.is_empty() => {
                debug!("line cache hit for {fen}: {} moves", line.best_moves.len());
                Some(line.best_moves.into_iter().map(|m| m.into_candidate(max_depth)).collect())
            }
            Ok(_) => None,
            Err(e) => {
                warn!("line cache lookup failed: {e}");
                None
            }
        }
    }

    fn put(&self, entry: CacheEntry) {
        if !self.writes { return; }
        let body = WireLine::from(&entry);
        let client = self.client.clone();
        let url = self.endpoint.clone();
        thread::spawn(move || match client.put(url).json(&body).send() {
            Ok(r) if r.status().is_success() => debug!("published {} to line cache", body.position),
            Ok(r) => warn!("line cache rejected {}: {}", body.position, r.status()),
            Err(e) => warn!("line cache publish failed: {e}"),
        });
    }
}
