//! Round mechanics: bets, side bets, the round state machine and resolution

pub mod bet_engine;
pub mod resolver;
pub mod round;
pub mod side_bets;
pub mod types;

pub use bet_engine::BetEngine;
pub use resolver::{HandSettlement, OutcomeResolver};
pub use round::{RoundAction, RoundState};
pub use side_bets::{FixedOracle, RandomOracle, ScriptedOracle, SideBetOracle, SideBetSettlement, SideBetTable};
pub use types::*;
