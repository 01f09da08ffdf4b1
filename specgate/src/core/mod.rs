//! Pure, deterministic gate logic.

pub mod audit;
pub mod freshness;
pub mod gate;
pub mod reqid;
pub mod types;
