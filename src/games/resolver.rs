//! Outcome resolution
//!
//! Turns a declared hand result into balance mutations and game records.
//! Split rounds hold the first hand's record on the context and append both
//! hands, in order, when the second hand resolves.

use crate::errors::{LedgerError, LedgerResult};
use crate::games::round::{RoundAction, RoundState};
use crate::games::side_bets::{SideBetOracle, SideBetTable};
use crate::games::types::{BetContext, Chips, GameRecord, HandResult, SideBets};
use crate::session::SessionManager;

/// Result of resolving one hand
#[derive(Debug, Clone, PartialEq)]
pub struct HandSettlement {
    /// Record of the hand just resolved
    pub record: GameRecord,
    /// Amount credited for the main hand
    pub payout: Chips,
    /// Net balance change from side bets (winnings minus lost stakes)
    pub side_bet_net: Chips,
    /// False while the second hand of a split is still open
    pub round_complete: bool,
}

/// Resolves hands and cash-outs against the session
pub struct OutcomeResolver<O> {
    table: SideBetTable,
    oracle: O,
}

impl<O: SideBetOracle> OutcomeResolver<O> {
    pub fn new(table: SideBetTable, oracle: O) -> Self {
        Self { table, oracle }
    }

    pub fn table(&self) -> &SideBetTable {
        &self.table
    }

    pub fn oracle_mut(&mut self) -> &mut O {
        &mut self.oracle
    }

    /// Resolve the current hand of `ctx` as `result`
    pub fn resolve(
        &mut self,
        manager: &mut SessionManager,
        ctx: &mut BetContext,
        result: HandResult,
    ) -> LedgerResult<HandSettlement> {
        manager.ensure_current(ctx.session_id)?;
        let next = ctx.state.transition(RoundAction::Resolve)?;

        // Side bets belong to the round, not the hand
        let (side_bets, side_bet_winnings, side_bet_net) = if ctx.side_bets_settled {
            (SideBets::new(), 0, 0)
        } else {
            let settlement = self.table.settle(&ctx.side_bets, &mut self.oracle);
            manager.credit(settlement.winnings);
            manager.debit(settlement.losses);
            ctx.side_bets_settled = true;
            (ctx.side_bets.clone(), settlement.winnings, settlement.net())
        };

        let payout = result.payout(ctx.main_amount);
        manager.credit(payout);

        let record = GameRecord::hand(
            result,
            ctx.main_amount,
            side_bets,
            side_bet_winnings,
            ctx.is_split,
            ctx.is_double,
        );

        ctx.state = next;
        let round_complete = next.is_terminal();
        if round_complete {
            manager.set_round_open(false);
        }

        if ctx.is_split {
            ctx.hands_completed += 1;
            ctx.pending_hands.push(record.clone());
            if round_complete {
                for hand in ctx.pending_hands.drain(..) {
                    manager.record(hand);
                }
            } else {
                tracing::debug!("Split hand 1 resolved as {}, awaiting hand 2", result);
            }
        } else {
            manager.record(record.clone());
        }

        Ok(HandSettlement {
            record,
            payout,
            side_bet_net,
            round_complete,
        })
    }

    /// Cash out `requested` from the stake, forfeiting the rest
    pub fn cash_out(
        &mut self,
        manager: &mut SessionManager,
        ctx: &mut BetContext,
        requested: Chips,
    ) -> LedgerResult<GameRecord> {
        manager.ensure_current(ctx.session_id)?;
        let next = ctx.state.transition(RoundAction::CashOut)?;

        if requested <= 0 {
            return Err(LedgerError::invalid_amount("cash-out amount must be a positive number"));
        }
        if requested > ctx.main_amount {
            return Err(LedgerError::ExceedsBet {
                requested,
                bet: ctx.main_amount,
            });
        }

        manager.credit(requested);
        let record = GameRecord::cash_out(ctx.main_amount, requested, ctx.is_double);
        manager.record(record.clone());
        ctx.state = next;
        manager.set_round_open(false);

        tracing::debug!(
            "Cash out: ₹{} refunded, ₹{} lost",
            requested,
            ctx.main_amount - requested
        );
        Ok(record)
    }
}

impl<O> OutcomeResolver<O> {
    /// True when `ctx` is waiting on the second hand of a split
    pub fn awaiting_second_hand(ctx: &BetContext) -> bool {
        ctx.state == RoundState::SplitSecondHand
    }
}
