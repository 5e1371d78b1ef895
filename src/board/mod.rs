pub mod cozy;
pub mod san;

pub use cozy::{CodecError, Position};
