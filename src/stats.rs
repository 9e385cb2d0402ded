//! Session statistics
//!
//! Pure computations over a game log. Nothing here touches the session or any
//! rendering concern.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::games::types::{Chips, GameRecord, HandResult, Outcome};

/// Trend of the most recent round
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Form {
    Winning,
    Losing,
    Push,
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Form::Winning => write!(f, "🟢 Winning"),
            Form::Losing => write!(f, "🔴 Losing"),
            Form::Push => write!(f, "🟡 Push"),
        }
    }
}

/// Session rating derived from the win rate
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Performance {
    Tough,
    Decent,
    Good,
    Excellent,
    Exceptional,
}

impl Performance {
    pub fn from_win_rate(win_rate: f64) -> Self {
        if win_rate >= 70.0 {
            Performance::Exceptional
        } else if win_rate >= 60.0 {
            Performance::Excellent
        } else if win_rate >= 50.0 {
            Performance::Good
        } else if win_rate >= 40.0 {
            Performance::Decent
        } else {
            Performance::Tough
        }
    }

    pub fn summary(self) -> &'static str {
        match self {
            Performance::Exceptional => {
                "🔥 EXCEPTIONAL SESSION! Outstanding performance! You're dominating the tables!"
            }
            Performance::Excellent => "✨ EXCELLENT SESSION! Great job! You're playing like a pro!",
            Performance::Good => "📈 GOOD SESSION! Solid performance! You're beating the house!",
            Performance::Decent => {
                "⚖️ DECENT SESSION! Close to break-even with room for improvement!"
            }
            Performance::Tough => {
                "💪 TOUGH SESSION! Every player faces challenges - learn and improve!"
            }
        }
    }
}

/// Summary statistics of a game log
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Stats {
    pub total_games: usize,
    pub wins: usize,
    pub losses: usize,
    pub ties: usize,
    pub blackjacks: usize,
    pub cashouts: usize,
    pub splits: usize,
    pub doubles: usize,
    /// Percentage of records that are plain wins
    pub win_rate: f64,
    pub total_bet: Chips,
    pub total_won: Chips,
    pub total_lost: Chips,
    pub total_side_bet_winnings: Chips,
    pub total_cashout_refunds: Chips,
    pub total_cashout_losses: Chips,
    pub net_profit: Chips,
    pub average_bet: f64,
    /// Net profit as a percentage of total stakes
    pub roi: f64,
    pub biggest_win: Chips,
    pub biggest_loss: Chips,
    pub max_win_streak: usize,
    pub max_loss_streak: usize,
    pub current_form: Option<Form>,
    pub performance: Option<Performance>,
}

/// Computes [`Stats`] from an ordered game log
pub struct StatisticsAggregator;

impl StatisticsAggregator {
    pub fn compute(log: &[GameRecord]) -> Stats {
        let mut stats = Stats {
            total_games: log.len(),
            ..Default::default()
        };

        let mut win_streak = 0;
        let mut loss_streak = 0;

        for record in log {
            stats.total_bet += record.amount;
            stats.total_side_bet_winnings += record.side_bet_winnings;
            if record.is_split {
                stats.splits += 1;
            }
            if record.is_double {
                stats.doubles += 1;
            }

            match record.outcome {
                Outcome::Win => {
                    stats.wins += 1;
                    stats.total_won += HandResult::Win.net(record.amount);
                    stats.biggest_win = stats.biggest_win.max(record.amount);
                    win_streak += 1;
                    loss_streak = 0;
                    stats.max_win_streak = stats.max_win_streak.max(win_streak);
                }
                Outcome::Lose => {
                    stats.losses += 1;
                    stats.total_lost += record.amount;
                    stats.biggest_loss = stats.biggest_loss.max(record.amount);
                    loss_streak += 1;
                    win_streak = 0;
                    stats.max_loss_streak = stats.max_loss_streak.max(loss_streak);
                }
                Outcome::Tie => stats.ties += 1,
                Outcome::Blackjack => {
                    stats.blackjacks += 1;
                    stats.total_won += HandResult::Blackjack.net(record.amount);
                }
                Outcome::CashOut => {
                    stats.cashouts += 1;
                    stats.total_cashout_refunds += record.refund_amount.unwrap_or(0);
                    stats.total_cashout_losses += record.lost_amount.unwrap_or(0);
                }
            }
        }

        stats.net_profit = stats.total_won - stats.total_lost + stats.total_side_bet_winnings
            + stats.total_cashout_refunds
            - stats.total_cashout_losses;

        if stats.total_games > 0 {
            stats.win_rate = stats.wins as f64 / stats.total_games as f64 * 100.0;
            stats.average_bet = stats.total_bet as f64 / stats.total_games as f64;
            stats.performance = Some(Performance::from_win_rate(stats.win_rate));
        }
        if stats.total_bet > 0 {
            stats.roi = stats.net_profit as f64 / stats.total_bet as f64 * 100.0;
        }

        stats.current_form = log.last().map(|record| match record.outcome {
            Outcome::Win | Outcome::Blackjack => Form::Winning,
            Outcome::Lose => Form::Losing,
            Outcome::Tie | Outcome::CashOut => Form::Push,
        });

        stats
    }
}
