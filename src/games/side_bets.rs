//! Side-bet resolution
//!
//! Each side bet is settled by a single trial against a fixed win
//! probability. The source of that trial is injectable so tests and replays
//! can be deterministic.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

use crate::config::SideBetConfig;
use crate::games::types::{Chips, SideBet, SideBets};

/// Source of side-bet trial outcomes
pub trait SideBetOracle {
    /// Returns `true` when `bet` wins a trial with `win_probability`
    fn trial(&mut self, bet: SideBet, win_probability: f64) -> bool;
}

/// Pseudo-random oracle backed by a seedable RNG
pub struct RandomOracle {
    rng: StdRng,
}

impl RandomOracle {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible oracle for replays
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomOracle {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl SideBetOracle for RandomOracle {
    fn trial(&mut self, _bet: SideBet, win_probability: f64) -> bool {
        self.rng.gen_bool(win_probability.clamp(0.0, 1.0))
    }
}

/// Oracle that always returns the same answer
#[derive(Debug, Clone, Copy)]
pub struct FixedOracle(pub bool);

impl SideBetOracle for FixedOracle {
    fn trial(&mut self, _bet: SideBet, _win_probability: f64) -> bool {
        self.0
    }
}

/// Oracle that replays a queue of answers, losing once exhausted
#[derive(Debug, Clone, Default)]
pub struct ScriptedOracle {
    answers: VecDeque<bool>,
}

impl ScriptedOracle {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl SideBetOracle for ScriptedOracle {
    fn trial(&mut self, _bet: SideBet, _win_probability: f64) -> bool {
        self.answers.pop_front().unwrap_or(false)
    }
}

impl<O: SideBetOracle + ?Sized> SideBetOracle for Box<O> {
    fn trial(&mut self, bet: SideBet, win_probability: f64) -> bool {
        (**self).trial(bet, win_probability)
    }
}

/// Aggregate result of settling a round's side bets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SideBetSettlement {
    /// Credited to the balance (stake times multiplier per winning bet)
    pub winnings: Chips,
    /// Debited from the balance (stakes of losing bets)
    pub losses: Chips,
}

impl SideBetSettlement {
    pub fn net(&self) -> Chips {
        self.winnings - self.losses
    }
}

/// Settles side bets against the configured payout table
#[derive(Debug, Clone)]
pub struct SideBetTable {
    config: SideBetConfig,
}

impl SideBetTable {
    pub fn new(config: SideBetConfig) -> Self {
        Self { config }
    }

    pub fn multiplier(&self, bet: SideBet) -> Chips {
        self.config.multiplier(bet)
    }

    pub fn win_probability(&self) -> f64 {
        self.config.win_probability
    }

    /// Run one trial per side bet with a positive stake
    pub fn settle<O: SideBetOracle + ?Sized>(
        &self,
        side_bets: &SideBets,
        oracle: &mut O,
    ) -> SideBetSettlement {
        let mut settlement = SideBetSettlement::default();

        for (&bet, &stake) in side_bets.iter().filter(|(_, stake)| **stake > 0) {
            if oracle.trial(bet, self.config.win_probability) {
                let won = stake * self.multiplier(bet);
                tracing::debug!("{} won: +₹{}", bet, won);
                settlement.winnings += won;
            } else {
                tracing::debug!("{} lost: -₹{}", bet, stake);
                settlement.losses += stake;
            }
        }

        settlement
    }
}

impl Default for SideBetTable {
    fn default() -> Self {
        Self::new(SideBetConfig::default())
    }
}
