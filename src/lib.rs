// Opening line fishing over a UCI engine or the built-in material oracle
pub mod board;
pub mod cache;
pub mod fish;
pub mod oracle;

pub use board::Position;
pub use fish::{Fisher, SearchConfig, SearchState};
