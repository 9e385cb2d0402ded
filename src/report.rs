//! End-of-session report

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use uuid::Uuid;

use crate::format::{chips, signed_chips};
use crate::games::types::{Chips, GameRecord};
use crate::stats::Stats;

/// Everything the host needs to present a finished session.
///
/// Chart bytes are not part of the JSON form; hosts write them out on their
/// own using `chart_mime` to pick a format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub session_id: Option<Uuid>,
    pub stats: Stats,
    pub duration: String,
    pub starting_balance: Chips,
    pub final_balance: Chips,
    pub games: Vec<GameRecord>,
    #[serde(skip)]
    pub chart: Option<Vec<u8>>,
    pub chart_mime: Option<String>,
    pub completed_at: DateTime<Utc>,
}

impl Report {
    pub fn has_chart(&self) -> bool {
        self.chart.is_some()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Plain-text summary used when no chart is available, or alongside it
    pub fn render_text(&self, currency: &str) -> String {
        let stats = &self.stats;
        let mut out = String::new();

        // Writing into a String cannot fail
        let _ = writeln!(out, "🎰 SESSION COMPLETE");
        let _ = writeln!(out, "⏱️ Duration: {}", self.duration);
        let _ = writeln!(
            out,
            "💰 Balance: {} -> {} ({})",
            chips(currency, self.starting_balance),
            chips(currency, self.final_balance),
            signed_chips(currency, self.final_balance - self.starting_balance)
        );
        let _ = writeln!(
            out,
            "🎮 Games: {} | W: {} | L: {} | T: {} | BJ: {} | Cash-outs: {}",
            stats.total_games, stats.wins, stats.losses, stats.ties, stats.blackjacks, stats.cashouts
        );
        let _ = writeln!(
            out,
            "📊 Win Rate: {:.1}% | Final P&L: {} | ROI: {:.1}%",
            stats.win_rate,
            signed_chips(currency, stats.net_profit),
            stats.roi
        );
        let _ = writeln!(
            out,
            "🎯 Total Bet: {} | Avg Bet: {}{:.0}",
            chips(currency, stats.total_bet),
            currency,
            stats.average_bet
        );
        let _ = writeln!(
            out,
            "🏆 Biggest Win: {} | 💸 Biggest Loss: {}",
            chips(currency, stats.biggest_win),
            chips(currency, stats.biggest_loss)
        );
        let _ = writeln!(
            out,
            "🔥 Best Streak: {} | ❄️ Worst Streak: {}",
            stats.max_win_streak, stats.max_loss_streak
        );
        if stats.splits > 0 || stats.doubles > 0 {
            let _ = writeln!(out, "✂️ Split hands: {} | ⏫ Doubles: {}", stats.splits, stats.doubles);
        }
        if stats.total_side_bet_winnings > 0 {
            let _ = writeln!(
                out,
                "🎲 Side bet winnings: {}",
                chips(currency, stats.total_side_bet_winnings)
            );
        }
        if stats.cashouts > 0 {
            let _ = writeln!(
                out,
                "🏧 Cash-outs: {} refunded, {} forfeited",
                chips(currency, stats.total_cashout_refunds),
                chips(currency, stats.total_cashout_losses)
            );
        }
        if let Some(form) = stats.current_form {
            let _ = writeln!(out, "Current form: {}", form);
        }
        if let Some(performance) = stats.performance {
            let _ = writeln!(out, "{}", performance.summary());
        }
        if !self.has_chart() {
            let _ = writeln!(out, "(chart unavailable)");
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::types::{HandResult, SideBets};
    use crate::stats::StatisticsAggregator;

    fn report(chart: Option<Vec<u8>>) -> Report {
        let games = vec![
            GameRecord::hand(HandResult::Win, 100, SideBets::new(), 0, false, false),
            GameRecord::hand(HandResult::Lose, 50, SideBets::new(), 0, false, false),
            GameRecord::hand(HandResult::Tie, 20, SideBets::new(), 0, false, false),
            GameRecord::hand(HandResult::Blackjack, 100, SideBets::new(), 0, false, false),
        ];
        Report {
            session_id: Some(Uuid::new_v4()),
            stats: StatisticsAggregator::compute(&games),
            duration: "3 minutes".to_string(),
            starting_balance: 1000,
            final_balance: 1200,
            games,
            chart_mime: chart.as_ref().map(|_| "image/svg+xml".to_string()),
            chart,
            completed_at: Utc::now(),
        }
    }

    #[test]
    fn test_render_text() {
        let text = report(None).render_text("₹");

        assert!(text.contains("₹1,000 -> ₹1,200 (+₹200)"));
        assert!(text.contains("Games: 4 | W: 1 | L: 1 | T: 1 | BJ: 1"));
        assert!(text.contains("Win Rate: 25.0%"));
        assert!(text.contains("Final P&L: +₹200"));
        assert!(text.contains("TOUGH SESSION"));
        assert!(text.contains("(chart unavailable)"));
    }

    #[test]
    fn test_json_omits_chart_bytes() {
        let report = report(Some(b"<svg/>".to_vec()));
        let json = report.to_json().unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value.get("chart").is_none());
        assert_eq!(value["chart_mime"], "image/svg+xml");
        assert_eq!(value["stats"]["net_profit"], 200);
        assert_eq!(value["games"].as_array().map(Vec::len), Some(4));

        let parsed: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.chart, None);
        assert_eq!(parsed.stats, report.stats);
    }
}
