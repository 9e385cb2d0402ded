//! Casino facade
//!
//! Wires the session manager, bet engine, resolver, statistics and chart
//! renderer together. Hosts talk to a [`Casino`] and keep the open round's
//! [`BetContext`] themselves.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::chart::{ChartRenderer, SvgChartRenderer};
use crate::config::LedgerConfig;
use crate::errors::{ChartError, LedgerError, LedgerResult};
use crate::games::bet_engine::BetEngine;
use crate::games::resolver::OutcomeResolver;
use crate::games::side_bets::{RandomOracle, SideBetOracle, SideBetTable};
use crate::games::types::{BetContext, Chips, GameRecord, HandResult, SideBet, SideBets};
use crate::report::Report;
use crate::session::{SessionManager, SessionView};
use crate::stats::{StatisticsAggregator, Stats};

/// Outcome of a resolve or cash-out as seen by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundUpdate {
    pub record: GameRecord,
    /// Amount credited for the main hand (the refund for a cash-out)
    pub payout: Chips,
    /// Net balance change from side bets
    pub side_bet_net: Chips,
    pub round_complete: bool,
    pub session: SessionView,
}

/// One casino table: a session plus the machinery that plays rounds on it
pub struct Casino<O = RandomOracle> {
    config: LedgerConfig,
    manager: SessionManager,
    engine: BetEngine,
    resolver: OutcomeResolver<O>,
    renderer: Box<dyn ChartRenderer>,
}

impl Casino<RandomOracle> {
    /// Casino with entropy-seeded side-bet trials
    pub fn with_config(config: LedgerConfig) -> LedgerResult<Self> {
        Self::new(config, RandomOracle::from_entropy())
    }
}

impl<O: SideBetOracle> Casino<O> {
    pub fn new(config: LedgerConfig, oracle: O) -> LedgerResult<Self> {
        config.validate()?;

        let renderer = SvgChartRenderer::new(config.chart.clone(), config.display.currency_symbol.clone());
        let table = SideBetTable::new(config.side_bets.clone());

        Ok(Self {
            config,
            manager: SessionManager::new(),
            engine: BetEngine::new(),
            resolver: OutcomeResolver::new(table, oracle),
            renderer: Box::new(renderer),
        })
    }

    /// Replace the chart renderer
    pub fn with_renderer(mut self, renderer: Box<dyn ChartRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn currency(&self) -> &str {
        &self.config.display.currency_symbol
    }

    pub fn session(&self) -> &SessionManager {
        &self.manager
    }

    pub fn renderer(&self) -> &dyn ChartRenderer {
        self.renderer.as_ref()
    }

    pub fn start_session(&mut self, balance: Chips) -> LedgerResult<SessionView> {
        self.manager.start_session(balance)?;
        Ok(self.manager.view())
    }

    pub fn place_bet(&mut self, main_amount: Chips, side_bets: SideBets) -> LedgerResult<BetContext> {
        self.engine.place_bet(&mut self.manager, main_amount, side_bets)
    }

    /// Place a bet whose side bets are given by name (`"pp"`, `"21+3"`, ...).
    ///
    /// Repeated names add up.
    pub fn place_bet_named<I, S>(&mut self, main_amount: Chips, side_bets: I) -> LedgerResult<BetContext>
    where
        I: IntoIterator<Item = (S, Chips)>,
        S: AsRef<str>,
    {
        let mut parsed = SideBets::new();
        for (name, stake) in side_bets {
            let bet: SideBet = name.as_ref().parse()?;
            let entry = parsed.entry(bet).or_insert(0);
            *entry = entry
                .checked_add(stake)
                .ok_or_else(|| LedgerError::invalid_amount(format!("{} stake is too large", bet)))?;
        }
        self.place_bet(main_amount, parsed)
    }

    pub fn split(&mut self, ctx: &mut BetContext) -> LedgerResult<SessionView> {
        self.engine.split(&mut self.manager, ctx)?;
        Ok(self.manager.view())
    }

    pub fn double(&mut self, ctx: &mut BetContext) -> LedgerResult<SessionView> {
        self.engine.double(&mut self.manager, ctx)?;
        Ok(self.manager.view())
    }

    pub fn resolve(&mut self, ctx: &mut BetContext, result: HandResult) -> LedgerResult<RoundUpdate> {
        let settlement = self.resolver.resolve(&mut self.manager, ctx, result)?;
        Ok(RoundUpdate {
            record: settlement.record,
            payout: settlement.payout,
            side_bet_net: settlement.side_bet_net,
            round_complete: settlement.round_complete,
            session: self.manager.view(),
        })
    }

    pub fn cash_out(&mut self, ctx: &mut BetContext, amount: Chips) -> LedgerResult<RoundUpdate> {
        let record = self.resolver.cash_out(&mut self.manager, ctx, amount)?;
        Ok(RoundUpdate {
            payout: amount,
            side_bet_net: 0,
            round_complete: true,
            record,
            session: self.manager.view(),
        })
    }

    /// Give up on a round whose context was lost.
    ///
    /// The stakes already debited stay forfeited and nothing is logged. Returns
    /// false when no round was open.
    pub fn abandon_round(&mut self) -> bool {
        if !self.manager.has_open_round() {
            return false;
        }
        self.manager.set_round_open(false);
        tracing::warn!("⚠️ Open round abandoned, its stake is forfeited");
        true
    }

    /// Operator override of the balance, returning the previous balance
    pub fn reset_balance(&mut self, amount: Chips) -> LedgerResult<Chips> {
        self.manager.reset_balance(amount)
    }

    pub fn balance(&self) -> Chips {
        self.manager.balance()
    }

    pub fn view(&self) -> SessionView {
        self.manager.view()
    }

    /// Statistics of the running session so far
    pub fn current_stats(&self) -> Stats {
        StatisticsAggregator::compute(self.manager.game_log())
    }

    /// Every record across all sessions
    pub fn history(&self) -> &[GameRecord] {
        self.manager.history()
    }

    /// Close the session and return its report.
    ///
    /// The report, chart included, is assembled before any session state is
    /// cleared. A chart failure only drops the chart.
    pub fn end_session(&mut self) -> LedgerResult<Report> {
        self.manager.ensure_reportable()?;

        let log = self.manager.game_log();
        let starting_balance = self.manager.starting_balance();
        let stats = StatisticsAggregator::compute(log);

        let chart = match self.renderer.render(log, starting_balance) {
            Ok(bytes) => Some(bytes),
            Err(ChartError::Disabled) => {
                tracing::debug!("Charts disabled, text report only");
                None
            }
            Err(e) => {
                tracing::warn!("⚠️ Chart rendering failed, falling back to text report: {}", e);
                None
            }
        };

        let report = Report {
            session_id: self.manager.session().id,
            stats,
            duration: self.manager.duration(),
            starting_balance,
            final_balance: self.manager.balance(),
            games: log.to_vec(),
            chart_mime: chart.as_ref().map(|_| self.renderer.content_type().to_string()),
            chart,
            completed_at: Utc::now(),
        };

        self.manager.close_session()?;
        tracing::info!(
            "📊 Report ready: {} games, net {}, win rate {:.1}%",
            report.stats.total_games,
            report.stats.net_profit,
            report.stats.win_rate
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChartConfig;
    use crate::games::side_bets::FixedOracle;
    use crate::games::types::{Outcome, MAX_BALANCE};

    struct FailingRenderer;

    impl ChartRenderer for FailingRenderer {
        fn render(&self, _log: &[GameRecord], _starting_balance: Chips) -> Result<Vec<u8>, ChartError> {
            Err(ChartError::WriteFailed("backend unavailable".to_string()))
        }

        fn content_type(&self) -> &'static str {
            "image/png"
        }

        fn extension(&self) -> &'static str {
            "png"
        }
    }

    fn casino() -> Casino<FixedOracle> {
        Casino::new(LedgerConfig::default(), FixedOracle(false)).unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = LedgerConfig::default();
        config.side_bets.win_probability = 2.0;
        assert!(matches!(
            Casino::new(config, FixedOracle(false)),
            Err(LedgerError::Configuration(_))
        ));
    }

    #[test]
    fn test_round_trip_through_facade() {
        let mut casino = casino();
        let view = casino.start_session(1000).unwrap();
        assert_eq!(view.balance, 1000);

        let mut ctx = casino.place_bet(100, SideBets::new()).unwrap();
        let update = casino.resolve(&mut ctx, HandResult::Win).unwrap();

        assert_eq!(update.session.balance, 1100);
        assert_eq!(update.record.outcome, Outcome::Win);
        assert!(update.round_complete);
        assert_eq!(casino.current_stats().wins, 1);
    }

    #[test]
    fn test_named_side_bets() {
        let mut casino = casino();
        casino.start_session(1000).unwrap();

        let ctx = casino.place_bet_named(100, [("pp", 10), ("21+3", 5), ("pp", 5)]).unwrap();
        assert_eq!(ctx.side_bets().get(&SideBet::PerfectPair), Some(&15));
        assert_eq!(ctx.side_bet_total(), 20);

        assert!(matches!(
            casino.place_bet_named(100, [("insurance", 10)]),
            Err(LedgerError::UnknownSideBet(_))
        ));
        assert_eq!(casino.balance(), 900);
    }

    #[test]
    fn test_end_session_with_chart() {
        let mut casino = casino();
        casino.start_session(1000).unwrap();
        let mut ctx = casino.place_bet(100, SideBets::new()).unwrap();
        casino.resolve(&mut ctx, HandResult::Lose).unwrap();

        let report = casino.end_session().unwrap();

        assert!(report.has_chart());
        assert_eq!(report.chart_mime.as_deref(), Some("image/svg+xml"));
        assert_eq!(report.final_balance, 900);
        assert_eq!(report.games.len(), 1);
        assert!(!casino.view().active);
        assert!(casino.session().game_log().is_empty());
        assert_eq!(casino.history().len(), 1);
    }

    #[test]
    fn test_chart_failure_falls_back_to_text() {
        let mut casino = casino().with_renderer(Box::new(FailingRenderer));
        casino.start_session(1000).unwrap();
        let mut ctx = casino.place_bet(100, SideBets::new()).unwrap();
        casino.resolve(&mut ctx, HandResult::Tie).unwrap();

        let report = casino.end_session().unwrap();

        assert_eq!(report.chart, None);
        assert_eq!(report.chart_mime, None);
        assert_eq!(report.stats.ties, 1);
        assert!(!casino.view().active);
    }

    #[test]
    fn test_disabled_chart() {
        let config = LedgerConfig {
            chart: ChartConfig {
                enabled: false,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut casino = Casino::new(config, FixedOracle(false)).unwrap();
        casino.start_session(500).unwrap();
        let mut ctx = casino.place_bet(50, SideBets::new()).unwrap();
        casino.cash_out(&mut ctx, 20).unwrap();

        let report = casino.end_session().unwrap();
        assert!(!report.has_chart());
        assert_eq!(report.final_balance, 470);
    }

    #[test]
    fn test_end_session_preconditions() {
        let mut casino = casino();
        assert!(matches!(casino.end_session(), Err(LedgerError::InvalidState(_))));

        casino.start_session(1000).unwrap();
        assert!(matches!(casino.end_session(), Err(LedgerError::EmptyLog)));
        assert!(casino.view().active);
    }

    #[test]
    fn test_named_stakes_that_overflow_are_rejected() {
        let mut casino = casino();
        casino.start_session(1000).unwrap();

        assert!(matches!(
            casino.place_bet_named(100, [("pp", Chips::MAX), ("pp", 1)]),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(matches!(
            casino.place_bet_named(100, [("pp", Chips::MAX)]),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert_eq!(casino.balance(), 1000);
        assert!(!casino.session().has_open_round());
    }

    #[test]
    fn test_oversized_session_rejected() {
        let mut casino = casino();
        assert!(matches!(
            casino.start_session(Chips::MAX),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(!casino.view().active);

        casino.start_session(MAX_BALANCE).unwrap();
        assert!(matches!(
            casino.place_bet(Chips::MAX, SideBets::new()),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert_eq!(casino.balance(), MAX_BALANCE);
    }

    #[test]
    fn test_end_session_waits_for_open_round() {
        let mut casino = casino();
        casino.start_session(1000).unwrap();
        let mut ctx = casino.place_bet(100, SideBets::new()).unwrap();

        assert!(matches!(casino.end_session(), Err(LedgerError::InvalidState(_))));
        assert!(casino.view().active);

        casino.split(&mut ctx).unwrap();
        casino.resolve(&mut ctx, HandResult::Win).unwrap();
        assert!(matches!(casino.end_session(), Err(LedgerError::InvalidState(_))));
        assert!(casino.session().game_log().is_empty());

        casino.resolve(&mut ctx, HandResult::Lose).unwrap();
        let report = casino.end_session().unwrap();
        assert_eq!(report.games.len(), 2);
        assert!(report.games.iter().all(|game| game.is_split));
        assert_eq!(report.final_balance, 1000);
    }

    #[test]
    fn test_context_stays_with_its_table() {
        let mut first = casino();
        first.start_session(1000).unwrap();
        let mut ctx = first.place_bet(1000, SideBets::new()).unwrap();

        let mut second = casino();
        second.start_session(100).unwrap();
        assert!(matches!(
            second.resolve(&mut ctx, HandResult::Win),
            Err(LedgerError::InvalidState(_))
        ));
        assert_eq!(second.balance(), 100);
        assert!(second.session().game_log().is_empty());

        first.resolve(&mut ctx, HandResult::Win).unwrap();
        assert_eq!(first.balance(), 2000);
    }

    #[test]
    fn test_abandon_round() {
        let mut casino = casino();
        casino.start_session(1000).unwrap();
        assert!(!casino.abandon_round());

        let mut ctx = casino.place_bet(100, SideBets::new()).unwrap();
        casino.split(&mut ctx).unwrap();
        casino.resolve(&mut ctx, HandResult::Win).unwrap();
        drop(ctx);

        assert!(casino.abandon_round());
        assert!(matches!(casino.end_session(), Err(LedgerError::EmptyLog)));

        let mut ctx = casino.place_bet(100, SideBets::new()).unwrap();
        casino.resolve(&mut ctx, HandResult::Tie).unwrap();
        let report = casino.end_session().unwrap();
        assert_eq!(report.games.len(), 1);
        assert_eq!(report.final_balance, 1000);
    }
}
