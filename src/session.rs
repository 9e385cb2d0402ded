//! Session management
//!
//! A [`SessionManager`] owns the one betting session of a casino table: its
//! balance, start time and game log, plus the all-time history that outlives
//! individual sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{LedgerError, LedgerResult};
use crate::games::types::{Chips, GameRecord, MAX_BALANCE};

/// State of the tracked betting session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    pub id: Option<Uuid>,
    pub balance: Chips,
    pub starting_balance: Chips,
    pub active: bool,
    pub start_time: Option<DateTime<Utc>>,
    pub game_log: Vec<GameRecord>,
}

/// Read-only snapshot handed back to the host after each operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub balance: Chips,
    pub starting_balance: Chips,
    pub active: bool,
    pub games_played: usize,
    pub duration: String,
}

/// Owns the session and the all-time game history
#[derive(Debug, Default)]
pub struct SessionManager {
    session: Session,
    history: Vec<GameRecord>,
    /// Set while a placed round has not reached a terminal state
    round_open: bool,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session with `balance` as both current and starting balance
    pub fn start_session(&mut self, balance: Chips) -> LedgerResult<&Session> {
        self.start_session_at(balance, Utc::now())
    }

    pub fn start_session_at(&mut self, balance: Chips, now: DateTime<Utc>) -> LedgerResult<&Session> {
        if self.session.active {
            return Err(LedgerError::invalid_state(
                "a session is already active, end the current session first",
            ));
        }
        if balance <= 0 {
            return Err(LedgerError::invalid_amount("balance must be a positive number"));
        }
        check_balance_limit(balance)?;

        let id = Uuid::new_v4();
        self.session = Session {
            id: Some(id),
            balance,
            starting_balance: balance,
            active: true,
            start_time: Some(now),
            game_log: Vec::new(),
        };
        self.round_open = false;

        tracing::info!("🎰 Session {} started with balance ₹{}", id, balance);
        Ok(&self.session)
    }

    /// Clear the session after its report has been assembled.
    ///
    /// Fails without touching anything when no session is active or when
    /// nothing was played.
    pub(crate) fn close_session(&mut self) -> LedgerResult<()> {
        self.ensure_reportable()?;

        if let Some(id) = self.session.id {
            tracing::info!(
                "🛑 Session {} ended after {} games, balance ₹{}",
                id,
                self.session.game_log.len(),
                self.session.balance
            );
        }

        self.session.active = false;
        self.session.start_time = None;
        self.session.game_log.clear();
        Ok(())
    }

    /// Checks the preconditions of ending the session
    pub fn ensure_reportable(&self) -> LedgerResult<()> {
        self.ensure_active()?;
        if self.round_open {
            return Err(LedgerError::invalid_state(
                "a round is still open, resolve or cash it out first",
            ));
        }
        if self.session.game_log.is_empty() {
            return Err(LedgerError::EmptyLog);
        }
        Ok(())
    }

    pub fn ensure_active(&self) -> LedgerResult<()> {
        if self.session.active {
            Ok(())
        } else {
            Err(LedgerError::invalid_state("no active session, start a session first"))
        }
    }

    /// Fails unless `session_id` is the active session.
    ///
    /// Round contexts carry the id of the session they were placed in, so a
    /// stale context cannot pay into a later session.
    pub fn ensure_current(&self, session_id: Uuid) -> LedgerResult<()> {
        self.ensure_active()?;
        if self.session.id != Some(session_id) {
            return Err(LedgerError::invalid_state(
                "this round belongs to a session that has ended",
            ));
        }
        Ok(())
    }

    /// Fails with `InvalidState` while another round is open
    pub fn ensure_no_open_round(&self) -> LedgerResult<()> {
        if self.round_open {
            return Err(LedgerError::invalid_state("finish the current round first"));
        }
        Ok(())
    }

    pub fn has_open_round(&self) -> bool {
        self.round_open
    }

    pub(crate) fn set_round_open(&mut self, open: bool) {
        self.round_open = open;
    }

    /// Fails with `InsufficientBalance` unless `required` is covered
    pub fn ensure_funds(&self, required: Chips) -> LedgerResult<()> {
        if required > self.session.balance {
            return Err(LedgerError::InsufficientBalance {
                required,
                available: self.session.balance,
            });
        }
        Ok(())
    }

    pub(crate) fn debit(&mut self, amount: Chips) {
        self.session.balance = self.session.balance.saturating_sub(amount);
    }

    pub(crate) fn credit(&mut self, amount: Chips) {
        self.session.balance = self.session.balance.saturating_add(amount);
    }

    /// Append a finished record to the session log and the all-time history
    pub(crate) fn record(&mut self, record: GameRecord) {
        tracing::debug!(
            "Recorded {} of ₹{} (side bets +₹{})",
            record.outcome,
            record.amount,
            record.side_bet_winnings
        );
        self.history.push(record.clone());
        self.session.game_log.push(record);
    }

    /// Operator override of the balance; the game log is left alone
    pub fn reset_balance(&mut self, amount: Chips) -> LedgerResult<Chips> {
        if amount < 0 {
            return Err(LedgerError::invalid_amount("balance amount must be positive"));
        }
        check_balance_limit(amount)?;
        let old = self.session.balance;
        self.session.balance = amount;
        tracing::info!("💰 Balance reset from ₹{} to ₹{}", old, amount);
        Ok(old)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn balance(&self) -> Chips {
        self.session.balance
    }

    pub fn starting_balance(&self) -> Chips {
        self.session.starting_balance
    }

    pub fn is_active(&self) -> bool {
        self.session.active
    }

    pub fn game_log(&self) -> &[GameRecord] {
        &self.session.game_log
    }

    /// Every record ever appended, across all sessions
    pub fn history(&self) -> &[GameRecord] {
        &self.history
    }

    /// Elapsed session time in whole minutes, e.g. `"12 minutes"`
    pub fn duration(&self) -> String {
        self.duration_at(Utc::now())
    }

    pub fn duration_at(&self, now: DateTime<Utc>) -> String {
        match (self.session.active, self.session.start_time) {
            (true, Some(start)) => {
                let minutes = (now - start).num_minutes().max(0);
                format!("{} minutes", minutes)
            }
            _ => "0 minutes".to_string(),
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            balance: self.session.balance,
            starting_balance: self.session.starting_balance,
            active: self.session.active,
            games_played: self.session.game_log.len(),
            duration: self.duration(),
        }
    }
}

fn check_balance_limit(balance: Chips) -> LedgerResult<()> {
    if balance > MAX_BALANCE {
        return Err(LedgerError::invalid_amount(format!(
            "balance exceeds the table limit of ₹{}",
            MAX_BALANCE
        )));
    }
    Ok(())
}
