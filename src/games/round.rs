//! Round state machine
//!
//! Every round action is looked up in an explicit `(state, action)` table
//! before anything is mutated. Unlisted pairs are rejected.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{LedgerError, LedgerResult};

/// Where an open round stands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RoundState {
    BetPlaced,
    Doubled,
    SplitFirstHand,
    SplitSecondHand,
    Resolved,
    CashedOut,
}

/// Operator actions on an open round
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RoundAction {
    Resolve,
    Split,
    Double,
    CashOut,
}

impl RoundState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RoundState::Resolved | RoundState::CashedOut)
    }

    /// Next state for `action`, or `None` when the table has no entry
    pub fn next(self, action: RoundAction) -> Option<RoundState> {
        use RoundAction::*;
        use RoundState::*;

        match (self, action) {
            (BetPlaced, Resolve) => Some(Resolved),
            (BetPlaced, Split) => Some(SplitFirstHand),
            (BetPlaced, Double) => Some(Doubled),
            (BetPlaced, CashOut) => Some(CashedOut),
            (Doubled, Resolve) => Some(Resolved),
            (Doubled, CashOut) => Some(CashedOut),
            (SplitFirstHand, Resolve) => Some(SplitSecondHand),
            (SplitSecondHand, Resolve) => Some(Resolved),
            _ => None,
        }
    }

    /// Like [`RoundState::next`] but as a ledger error
    pub fn transition(self, action: RoundAction) -> LedgerResult<RoundState> {
        self.next(action).ok_or_else(|| {
            LedgerError::invalid_state(format!("cannot {} a round in state {}", action, self))
        })
    }

    /// Actions the table allows from this state
    pub fn allowed_actions(self) -> Vec<RoundAction> {
        [
            RoundAction::Resolve,
            RoundAction::Split,
            RoundAction::Double,
            RoundAction::CashOut,
        ]
        .into_iter()
        .filter(|action| self.next(*action).is_some())
        .collect()
    }
}

impl fmt::Display for RoundState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundState::BetPlaced => write!(f, "bet placed"),
            RoundState::Doubled => write!(f, "doubled"),
            RoundState::SplitFirstHand => write!(f, "split (hand 1/2)"),
            RoundState::SplitSecondHand => write!(f, "split (hand 2/2)"),
            RoundState::Resolved => write!(f, "resolved"),
            RoundState::CashedOut => write!(f, "cashed out"),
        }
    }
}

impl fmt::Display for RoundAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundAction::Resolve => write!(f, "resolve"),
            RoundAction::Split => write!(f, "split"),
            RoundAction::Double => write!(f, "double"),
            RoundAction::CashOut => write!(f, "cash out"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_round() {
        assert_eq!(RoundState::BetPlaced.next(RoundAction::Resolve), Some(RoundState::Resolved));
        assert!(RoundState::Resolved.is_terminal());
    }

    #[test]
    fn test_split_takes_two_resolutions() {
        let state = RoundState::BetPlaced.transition(RoundAction::Split).unwrap();
        let state = state.transition(RoundAction::Resolve).unwrap();
        assert_eq!(state, RoundState::SplitSecondHand);
        assert!(!state.is_terminal());
        let state = state.transition(RoundAction::Resolve).unwrap();
        assert_eq!(state, RoundState::Resolved);
    }

    #[test]
    fn test_rejected_transitions() {
        assert!(RoundState::Doubled.next(RoundAction::Split).is_none());
        assert!(RoundState::Doubled.next(RoundAction::Double).is_none());
        assert!(RoundState::SplitFirstHand.next(RoundAction::CashOut).is_none());
        assert!(matches!(
            RoundState::Resolved.transition(RoundAction::Resolve),
            Err(LedgerError::InvalidState(_))
        ));
        assert!(RoundState::CashedOut.allowed_actions().is_empty());
    }

    #[test]
    fn test_allowed_actions() {
        assert_eq!(RoundState::BetPlaced.allowed_actions().len(), 4);
        assert_eq!(
            RoundState::Doubled.allowed_actions(),
            vec![RoundAction::Resolve, RoundAction::CashOut]
        );
    }
}
