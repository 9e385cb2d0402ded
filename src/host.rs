//! Text command host
//!
//! Parses operator commands such as `start 1,000`, `bet 100 pp=20` or
//! `cashout 60`, keeps the open round, and answers every command with a text
//! reply. Errors become replies too; nothing a command does is fatal.

use std::fmt::Write;
use std::str::FromStr;

use crate::casino::{Casino, RoundUpdate};
use crate::errors::{CommandError, CommandResult, LedgerError};
use crate::format::{chips, parse_chips, signed_chips};
use crate::games::side_bets::{RandomOracle, SideBetOracle};
use crate::games::types::{BetContext, Chips, HandResult, Outcome};
use crate::report::Report;

pub const HELP: &str = "\
Commands:
  start <balance>             start a session
  bet <amount> [pp=N] [21+3=N] [db=N]
                              place a bet with optional side bets
  win | lose | tie | blackjack
                              resolve the current hand
  split                       split the hand (stakes the bet again)
  double                      double down (stakes the bet again)
  cashout <amount>            take back part of the bet and forfeit the rest
  balance                     show the session balance
  resetbalance <amount>       override the balance
  stats                       statistics of the running session
  history                     games recorded across all sessions
  end                         end the session and print the report
  help                        this list";

/// A parsed operator command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start(Chips),
    Bet {
        main: Chips,
        side_bets: Vec<(String, Chips)>,
    },
    Resolve(HandResult),
    Split,
    Double,
    CashOut(Chips),
    Balance,
    ResetBalance(Chips),
    Stats,
    History,
    End,
    Help,
}

fn amount_arg(command: &'static str, arg: Option<&str>) -> CommandResult<Chips> {
    let raw = arg.ok_or(CommandError::MissingArgument {
        command,
        argument: "an amount",
    })?;
    parse_chips(raw).ok_or_else(|| CommandError::InvalidNumber(raw.to_string()))
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let name = words.next().unwrap_or_default().trim_start_matches('&').to_lowercase();

        let command = match name.as_str() {
            "start" => Command::Start(amount_arg("start", words.next())?),
            "bet" => {
                let main = amount_arg("bet", words.next())?;
                let side_bets = words
                    .map(|word| -> CommandResult<(String, Chips)> {
                        let (bet, stake) = word
                            .split_once('=')
                            .ok_or_else(|| CommandError::MalformedSideBet(word.to_string()))?;
                        let stake = parse_chips(stake).ok_or_else(|| CommandError::InvalidNumber(stake.to_string()))?;
                        Ok((bet.to_string(), stake))
                    })
                    .collect::<CommandResult<Vec<_>>>()?;
                Command::Bet { main, side_bets }
            }
            "win" => Command::Resolve(HandResult::Win),
            "lose" | "loss" => Command::Resolve(HandResult::Lose),
            "tie" | "push" => Command::Resolve(HandResult::Tie),
            "blackjack" | "bj" => Command::Resolve(HandResult::Blackjack),
            "split" => Command::Split,
            "double" => Command::Double,
            "cashout" => Command::CashOut(amount_arg("cashout", words.next())?),
            "balance" | "view" => Command::Balance,
            "resetbalance" => Command::ResetBalance(amount_arg("resetbalance", words.next())?),
            "stats" => Command::Stats,
            "history" => Command::History,
            "end" => Command::End,
            "help" => Command::Help,
            _ => return Err(CommandError::Unknown(name.clone())),
        };
        Ok(command)
    }
}

/// Answer to one command
#[derive(Debug, Clone)]
pub struct Reply {
    pub text: String,
    pub is_error: bool,
    /// Set when the command ended a session
    pub report: Option<Report>,
}

impl Reply {
    fn ok(text: String) -> Self {
        Self {
            text,
            is_error: false,
            report: None,
        }
    }

    fn error(err: &CommandError) -> Self {
        Self {
            text: format!("❌ {}", err),
            is_error: true,
            report: None,
        }
    }
}

/// Drives a [`Casino`] from text commands
pub struct CommandHost<O = RandomOracle> {
    casino: Casino<O>,
    round: Option<BetContext>,
}

impl<O: SideBetOracle> CommandHost<O> {
    pub fn new(casino: Casino<O>) -> Self {
        Self { casino, round: None }
    }

    pub fn casino(&self) -> &Casino<O> {
        &self.casino
    }

    /// The round waiting for a result, if any
    pub fn open_round(&self) -> Option<&BetContext> {
        self.round.as_ref()
    }

    /// Parse and run one line. Blank lines and `#` comments yield nothing.
    pub fn execute_line(&mut self, line: &str) -> Option<Reply> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let reply = match line.parse::<Command>() {
            Ok(command) => self.execute(command),
            Err(e) => Reply::error(&e),
        };
        Some(reply)
    }

    pub fn execute(&mut self, command: Command) -> Reply {
        tracing::debug!("Executing {:?}", command);
        match self.dispatch(command) {
            Ok(reply) => reply,
            Err(e) => {
                tracing::debug!("Command rejected: {}", e);
                Reply::error(&e)
            }
        }
    }

    fn dispatch(&mut self, command: Command) -> CommandResult<Reply> {
        let currency = self.casino.currency().to_string();

        let text = match command {
            Command::Start(balance) => {
                let view = self.casino.start_session(balance)?;
                self.round = None;
                format!("🎰 Session started with {}", chips(&currency, view.balance))
            }
            Command::Bet { main, side_bets } => {
                if self.round.is_some() {
                    return Err(LedgerError::invalid_state("finish the current round first").into());
                }
                let ctx = self.casino.place_bet_named(main, side_bets)?;
                let mut text = format!("🃏 Bet {} placed", chips(&currency, ctx.main_amount()));
                if !ctx.side_bets().is_empty() {
                    let parts: Vec<String> = ctx
                        .side_bets()
                        .iter()
                        .map(|(bet, stake)| format!("{} {}", bet, chips(&currency, *stake)))
                        .collect();
                    let _ = write!(text, " with side bets: {}", parts.join(", "));
                }
                let _ = write!(text, " | Balance: {}", chips(&currency, self.casino.balance()));
                self.round = Some(ctx);
                text
            }
            Command::Resolve(result) => {
                let update = self.with_round(|casino, ctx| casino.resolve(ctx, result))?;
                describe_update(&update, &currency)
            }
            Command::Split => {
                let view = self.with_round(|casino, ctx| casino.split(ctx))?;
                format!("✂️ Hand split | Balance: {} | Resolve hand 1", chips(&currency, view.balance))
            }
            Command::Double => {
                let view = self.with_round(|casino, ctx| casino.double(ctx))?;
                let stake = self.round.as_ref().map(BetContext::main_amount).unwrap_or_default();
                format!(
                    "⏫ Doubled down, stake now {} | Balance: {}",
                    chips(&currency, stake),
                    chips(&currency, view.balance)
                )
            }
            Command::CashOut(amount) => {
                let update = self.with_round(|casino, ctx| casino.cash_out(ctx, amount))?;
                describe_update(&update, &currency)
            }
            Command::Balance => {
                let view = self.casino.view();
                if view.active {
                    format!(
                        "💰 Balance: {} | Started: {} | Games: {} | Duration: {}",
                        chips(&currency, view.balance),
                        chips(&currency, view.starting_balance),
                        view.games_played,
                        view.duration
                    )
                } else {
                    "💤 No active session".to_string()
                }
            }
            Command::ResetBalance(amount) => {
                let old = self.casino.reset_balance(amount)?;
                format!(
                    "💰 Balance reset from {} to {}",
                    chips(&currency, old),
                    chips(&currency, amount)
                )
            }
            Command::Stats => {
                let stats = self.casino.current_stats();
                format!(
                    "📊 Games: {} | W: {} | L: {} | T: {} | BJ: {} | Win Rate: {:.1}% | Final P&L: {}",
                    stats.total_games,
                    stats.wins,
                    stats.losses,
                    stats.ties,
                    stats.blackjacks,
                    stats.win_rate,
                    signed_chips(&currency, stats.net_profit)
                )
            }
            Command::History => {
                let history = self.casino.history();
                let net: Chips = history.iter().map(|record| record.delta()).sum();
                format!(
                    "📜 {} games recorded across all sessions, net {}",
                    history.len(),
                    signed_chips(&currency, net)
                )
            }
            Command::End => {
                if self.round.is_some() {
                    return Err(
                        LedgerError::invalid_state("finish the current round before ending the session").into(),
                    );
                }
                let report = self.casino.end_session()?;
                return Ok(Reply {
                    text: report.render_text(&currency),
                    is_error: false,
                    report: Some(report),
                });
            }
            Command::Help => HELP.to_string(),
        };

        Ok(Reply::ok(text))
    }

    /// Run `op` on the open round, closing the round once it is finished
    fn with_round<T, F>(&mut self, op: F) -> CommandResult<T>
    where
        F: FnOnce(&mut Casino<O>, &mut BetContext) -> Result<T, LedgerError>,
    {
        let ctx = self
            .round
            .as_mut()
            .ok_or_else(|| LedgerError::invalid_state("no open round, place a bet first"))?;

        let value = op(&mut self.casino, ctx)?;
        if ctx.is_finished() {
            self.round = None;
        }
        Ok(value)
    }
}

fn describe_update(update: &RoundUpdate, currency: &str) -> String {
    let record = &update.record;
    let mut text = match record.outcome {
        Outcome::Win => format!("✅ Win! Paid {}", chips(currency, update.payout)),
        Outcome::Blackjack => format!("🂡 Blackjack! Paid {}", chips(currency, update.payout)),
        Outcome::Tie => format!("🤝 Push, {} returned", chips(currency, update.payout)),
        Outcome::Lose => format!("💸 Lost {}", chips(currency, record.amount)),
        Outcome::CashOut => format!(
            "🏧 Cashed out {} of {} ({} forfeited)",
            chips(currency, record.refund_amount.unwrap_or(0)),
            chips(currency, record.amount),
            chips(currency, record.lost_amount.unwrap_or(0))
        ),
    };

    if !record.side_bets.is_empty() {
        let _ = write!(text, " | Side bets: {}", signed_chips(currency, update.side_bet_net));
    }
    let _ = write!(text, " | Balance: {}", chips(currency, update.session.balance));
    if !update.round_complete {
        text.push_str(" | Resolve hand 2");
    }
    text
}
