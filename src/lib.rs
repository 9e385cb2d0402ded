//! Casino Session Ledger
//!
//! In-process accounting for a live blackjack table: sessions, bets with side
//! bets, split and double-down rounds, partial cash-outs, session statistics
//! and a two-panel session chart. Game logic stays with the operator, who
//! declares each hand's result; the ledger keeps the money straight.

pub mod casino;
pub mod chart;
pub mod config;
pub mod errors;
pub mod format;
pub mod games;
pub mod host;
pub mod report;
pub mod session;
pub mod stats;

pub use casino::{Casino, RoundUpdate};
pub use chart::{ChartRenderer, SvgChartRenderer};
pub use config::{ConfigBuilder, ConfigLoader, LedgerConfig};
pub use errors::{ChartError, CommandError, ConfigurationError, LedgerError, LedgerResult};
pub use games::{BetContext, Chips, GameRecord, HandResult, Outcome, SideBet, SideBets};
pub use host::{Command, CommandHost, Reply};
pub use report::Report;
pub use session::{Session, SessionManager, SessionView};
pub use stats::{StatisticsAggregator, Stats};
