//! Positions - weighted-average-cost replay of the ledger.

mod positions_calculator;
mod positions_model;
mod positions_service;


pub use positions_calculator::{replay, ReplayOutcome, ReplayState};
pub use positions_model::{Position, PositionKey, RealizedGain};
pub use positions_service::{PositionService, PositionServiceTrait};
