use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::LedgerError;
use crate::games::round::RoundState;

/// Monetary amount in whole currency units
pub type Chips = i64;

/// Largest stake accepted for a main bet or a single side bet.
///
/// Keeps every payout (doubled stakes, blackjack at 5/2, side-bet multiples up
/// to [`MAX_SIDE_BET_MULTIPLIER`]) well inside `i64`.
pub const MAX_STAKE: Chips = 1_000_000_000_000;

/// Largest balance a session may start with or be reset to
pub const MAX_BALANCE: Chips = 1_000_000_000_000_000;

/// Largest configurable side-bet payout multiplier
pub const MAX_SIDE_BET_MULTIPLIER: Chips = 1_000;

/// Side-bet stakes keyed by bet type
pub type SideBets = BTreeMap<SideBet, Chips>;

/// Outcome stored on a game record
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Lose,
    Tie,
    Blackjack,
    CashOut,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Win => write!(f, "win"),
            Outcome::Lose => write!(f, "lose"),
            Outcome::Tie => write!(f, "tie"),
            Outcome::Blackjack => write!(f, "blackjack"),
            Outcome::CashOut => write!(f, "cashout"),
        }
    }
}

/// Result the operator declares for a hand
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HandResult {
    Win,
    Lose,
    Tie,
    Blackjack,
}

impl HandResult {
    /// Amount credited back to the balance for a stake already debited.
    ///
    /// Win pays 2x, a tie returns the stake, blackjack pays floor(2.5x).
    pub fn payout(self, amount: Chips) -> Chips {
        match self {
            HandResult::Win => amount * 2,
            HandResult::Lose => 0,
            HandResult::Tie => amount,
            HandResult::Blackjack => amount * 5 / 2,
        }
    }

    /// Net balance change of the hand: payout minus stake
    pub fn net(self, amount: Chips) -> Chips {
        self.payout(amount) - amount
    }
}

impl From<HandResult> for Outcome {
    fn from(result: HandResult) -> Self {
        match result {
            HandResult::Win => Outcome::Win,
            HandResult::Lose => Outcome::Lose,
            HandResult::Tie => Outcome::Tie,
            HandResult::Blackjack => Outcome::Blackjack,
        }
    }
}

impl fmt::Display for HandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Outcome::from(*self).fmt(f)
    }
}

/// Auxiliary wagers resolved independently of the main hand
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SideBet {
    PerfectPair,
    TwentyOnePlusThree,
    DealerBust,
}

impl SideBet {
    pub const ALL: [SideBet; 3] = [
        SideBet::PerfectPair,
        SideBet::TwentyOnePlusThree,
        SideBet::DealerBust,
    ];

    /// Display name used by the casino table
    pub fn label(self) -> &'static str {
        match self {
            SideBet::PerfectPair => "Perfect Pair",
            SideBet::TwentyOnePlusThree => "21 + 3",
            SideBet::DealerBust => "Dealer Bust",
        }
    }
}

impl fmt::Display for SideBet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SideBet {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();

        match key.as_str() {
            "perfectpair" | "pp" => Ok(SideBet::PerfectPair),
            "21+3" | "twentyoneplusthree" | "tpt" => Ok(SideBet::TwentyOnePlusThree),
            "dealerbust" | "db" => Ok(SideBet::DealerBust),
            _ => Err(LedgerError::UnknownSideBet(s.to_string())),
        }
    }
}

/// One resolved round (or split hand) as stored in the game log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameRecord {
    pub outcome: Outcome,
    /// Stake of the hand, or the original bet for a cash-out
    pub amount: Chips,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub side_bets: SideBets,
    #[serde(default)]
    pub side_bet_winnings: Chips,
    #[serde(default)]
    pub is_split: bool,
    #[serde(default)]
    pub is_double: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_amount: Option<Chips>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lost_amount: Option<Chips>,
}

impl GameRecord {
    /// Record for a played hand
    pub fn hand(
        result: HandResult,
        amount: Chips,
        side_bets: SideBets,
        side_bet_winnings: Chips,
        is_split: bool,
        is_double: bool,
    ) -> Self {
        Self {
            outcome: result.into(),
            amount,
            timestamp: Utc::now(),
            side_bets,
            side_bet_winnings,
            is_split,
            is_double,
            refund_amount: None,
            lost_amount: None,
        }
    }

    /// Record for a partial cash-out of `bet`
    pub fn cash_out(bet: Chips, refund: Chips, is_double: bool) -> Self {
        Self {
            outcome: Outcome::CashOut,
            amount: bet,
            timestamp: Utc::now(),
            side_bets: SideBets::new(),
            side_bet_winnings: 0,
            is_split: false,
            is_double,
            refund_amount: Some(refund),
            lost_amount: Some(bet - refund),
        }
    }

    /// Signed balance change attributed to this record on the chart.
    ///
    /// Cash-outs count the refund minus the forfeited part; side-bet winnings
    /// are added on top of the main result.
    pub fn delta(&self) -> Chips {
        let main = match self.outcome {
            Outcome::Win => self.amount,
            Outcome::Lose => -self.amount,
            Outcome::Tie => 0,
            Outcome::Blackjack => HandResult::Blackjack.net(self.amount),
            Outcome::CashOut => {
                self.refund_amount.unwrap_or(self.amount) - self.lost_amount.unwrap_or(0)
            }
        };
        main + self.side_bet_winnings
    }
}

/// An open round: the stake on the table and where the round stands
#[derive(Debug)]
pub struct BetContext {
    /// Session the round was placed in
    pub(crate) session_id: Uuid,
    pub(crate) main_amount: Chips,
    pub(crate) side_bets: SideBets,
    pub(crate) is_split: bool,
    pub(crate) is_double: bool,
    pub(crate) hands_completed: u8,
    pub(crate) state: RoundState,
    /// Side bets are settled once per round, on the first resolved hand
    pub(crate) side_bets_settled: bool,
    /// Split hands already resolved but not yet appended to the log
    pub(crate) pending_hands: Vec<GameRecord>,
}

impl BetContext {
    pub(crate) fn new(session_id: Uuid, main_amount: Chips, side_bets: SideBets) -> Self {
        Self {
            session_id,
            main_amount,
            side_bets,
            is_split: false,
            is_double: false,
            hands_completed: 0,
            state: RoundState::BetPlaced,
            side_bets_settled: false,
            pending_hands: Vec::new(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Stake of the current hand (doubled after a double down)
    pub fn main_amount(&self) -> Chips {
        self.main_amount
    }

    pub fn side_bets(&self) -> &SideBets {
        &self.side_bets
    }

    pub fn side_bet_total(&self) -> Chips {
        self.side_bets.values().sum()
    }

    pub fn is_split(&self) -> bool {
        self.is_split
    }

    pub fn is_double(&self) -> bool {
        self.is_double
    }

    pub fn hands_completed(&self) -> u8 {
        self.hands_completed
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }
}
