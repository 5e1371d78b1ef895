//! Upper bounds on the size of a run, for progress reporting.
//!
//! Initiator plies never branch; the responder ply at depth `d` multiplies
//! the line count by `fanout_at(d)`. A line record exists per line per depth
//! level, so nodes count records and lines count complete leaves.

use crate::fish::config::SearchConfig;

/// Line records at each depth level `0..=max_ply`.
pub fn lines_per_depth(config: &SearchConfig) -> Vec<u64> {
    let mut out = Vec::with_capacity(config.max_ply + 1);
    let mut width = 1u64;
    out.push(width);
    for depth in 0..config.max_ply {
        width = width.saturating_mul(config.fanout_at(depth) as u64);
        out.push(width);
    }
    out
}

/// Most line records a run can create (every one ends up in `done`).
pub fn total_nodes(config: &SearchConfig) -> u64 {
    lines_per_depth(config).into_iter().fold(0u64, |acc, n| acc.saturating_add(n))
}

/// Most full-length lines a run can produce.
pub fn total_lines(config: &SearchConfig) -> u64 {
    lines_per_depth(config).last().copied().unwrap_or(1)
}

/// Half-moves the oracle may be asked about: one initiator move per record
/// plus one responder reply per branch.
pub fn total_half_moves(config: &SearchConfig) -> u64 {
    let per_depth = lines_per_depth(config);
    let initiator: u64 = per_depth.iter().fold(0u64, |acc, &n| acc.saturating_add(n));
    let responder: u64 = per_depth.iter().skip(1).fold(0u64, |acc, &n| acc.saturating_add(n));
    initiator.saturating_add(responder)
}
