use crate::errors::{LedgerError, LedgerResult};
use crate::games::round::RoundAction;
use crate::games::types::{BetContext, Chips, SideBets, MAX_STAKE};
use crate::session::SessionManager;

/// Places stakes on the table.
///
/// Only the main stake leaves the balance here; side-bet stakes are checked
/// for cover but settled by the resolver.
#[derive(Debug, Default, Clone, Copy)]
pub struct BetEngine;

impl BetEngine {
    pub fn new() -> Self {
        Self
    }

    /// Validate and place a round's stake, debiting `main_amount`
    pub fn place_bet(
        &self,
        manager: &mut SessionManager,
        main_amount: Chips,
        side_bets: SideBets,
    ) -> LedgerResult<BetContext> {
        manager.ensure_active()?;
        manager.ensure_no_open_round()?;
        let session_id = manager
            .session()
            .id
            .ok_or_else(|| LedgerError::invalid_state("active session has no id"))?;

        if main_amount <= 0 {
            return Err(LedgerError::invalid_amount(
                "main bet amount must be a positive number",
            ));
        }
        if main_amount > MAX_STAKE {
            return Err(LedgerError::invalid_amount(format!(
                "main bet exceeds the table limit of ₹{}",
                MAX_STAKE
            )));
        }
        if let Some((bet, stake)) = side_bets.iter().find(|(_, stake)| **stake < 0) {
            return Err(LedgerError::invalid_amount(format!(
                "{} side bet cannot be negative (₹{})",
                bet, stake
            )));
        }
        if let Some((bet, _)) = side_bets.iter().find(|(_, stake)| **stake > MAX_STAKE) {
            return Err(LedgerError::invalid_amount(format!(
                "{} side bet exceeds the table limit of ₹{}",
                bet, MAX_STAKE
            )));
        }

        let side_bets: SideBets = side_bets.into_iter().filter(|(_, stake)| *stake > 0).collect();
        let total = side_bets
            .values()
            .try_fold(main_amount, |acc, stake| acc.checked_add(*stake))
            .ok_or_else(|| LedgerError::invalid_amount("total stake is too large"))?;
        manager.ensure_funds(total)?;

        manager.debit(main_amount);
        manager.set_round_open(true);
        tracing::debug!(
            "Bet placed: ₹{} main, ₹{} on side bets",
            main_amount,
            total - main_amount
        );

        Ok(BetContext::new(session_id, main_amount, side_bets))
    }

    /// Split into two hands, staking `main_amount` again for the second hand
    pub fn split(&self, manager: &mut SessionManager, ctx: &mut BetContext) -> LedgerResult<()> {
        manager.ensure_current(ctx.session_id)?;
        let next = ctx.state.transition(RoundAction::Split)?;
        manager.ensure_funds(ctx.main_amount)?;

        manager.debit(ctx.main_amount);
        ctx.is_split = true;
        ctx.hands_completed = 0;
        ctx.state = next;

        tracing::debug!("Split: ₹{} per hand", ctx.main_amount);
        Ok(())
    }

    /// Double down, staking `main_amount` again and doubling the hand's stake
    pub fn double(&self, manager: &mut SessionManager, ctx: &mut BetContext) -> LedgerResult<()> {
        manager.ensure_current(ctx.session_id)?;
        let next = ctx.state.transition(RoundAction::Double)?;
        manager.ensure_funds(ctx.main_amount)?;

        manager.debit(ctx.main_amount);
        ctx.main_amount *= 2;
        ctx.is_double = true;
        ctx.state = next;

        tracing::debug!("Double down: stake now ₹{}", ctx.main_amount);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::round::RoundState;
    use crate::games::types::{SideBet, MAX_BALANCE};

    fn active_manager(balance: Chips) -> SessionManager {
        let mut manager = SessionManager::new();
        manager.start_session(balance).unwrap();
        manager
    }

    #[test]
    fn test_place_bet_debits_main_stake_only() {
        let mut manager = active_manager(1000);
        let side_bets = SideBets::from([(SideBet::PerfectPair, 20), (SideBet::DealerBust, 10)]);

        let ctx = BetEngine.place_bet(&mut manager, 100, side_bets).unwrap();

        assert_eq!(manager.balance(), 900);
        assert_eq!(ctx.main_amount(), 100);
        assert_eq!(ctx.side_bet_total(), 30);
        assert!(!ctx.is_split());
        assert!(!ctx.is_double());
        assert_eq!(ctx.state(), RoundState::BetPlaced);
    }

    #[test]
    fn test_place_bet_validation() {
        let mut manager = active_manager(100);

        assert!(matches!(
            BetEngine.place_bet(&mut manager, 0, SideBets::new()),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(matches!(
            BetEngine.place_bet(&mut manager, 10, SideBets::from([(SideBet::PerfectPair, -1)])),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(matches!(
            BetEngine.place_bet(&mut manager, 90, SideBets::from([(SideBet::PerfectPair, 11)])),
            Err(LedgerError::InsufficientBalance { required: 101, available: 100 })
        ));
        assert_eq!(manager.balance(), 100);
    }

    #[test]
    fn test_place_bet_requires_session() {
        let mut manager = SessionManager::new();
        assert!(matches!(
            BetEngine.place_bet(&mut manager, 10, SideBets::new()),
            Err(LedgerError::InvalidState(_))
        ));
    }

    #[test]
    fn test_zero_side_bets_dropped() {
        let mut manager = active_manager(1000);
        let ctx = BetEngine
            .place_bet(&mut manager, 100, SideBets::from([(SideBet::DealerBust, 0)]))
            .unwrap();
        assert!(ctx.side_bets().is_empty());
    }

    #[test]
    fn test_split() {
        let mut manager = active_manager(1000);
        let mut ctx = BetEngine.place_bet(&mut manager, 100, SideBets::new()).unwrap();

        BetEngine.split(&mut manager, &mut ctx).unwrap();

        assert_eq!(manager.balance(), 800);
        assert!(ctx.is_split());
        assert_eq!(ctx.hands_completed(), 0);
        assert_eq!(ctx.main_amount(), 100);
        assert_eq!(ctx.state(), RoundState::SplitFirstHand);
    }

    #[test]
    fn test_split_insufficient_balance() {
        let mut manager = active_manager(150);
        let mut ctx = BetEngine.place_bet(&mut manager, 100, SideBets::new()).unwrap();

        assert!(matches!(
            BetEngine.split(&mut manager, &mut ctx),
            Err(LedgerError::InsufficientBalance { .. })
        ));
        assert_eq!(manager.balance(), 50);
        assert_eq!(ctx.state(), RoundState::BetPlaced);
    }

    #[test]
    fn test_double() {
        let mut manager = active_manager(1000);
        let mut ctx = BetEngine.place_bet(&mut manager, 100, SideBets::new()).unwrap();

        BetEngine.double(&mut manager, &mut ctx).unwrap();

        assert_eq!(manager.balance(), 800);
        assert_eq!(ctx.main_amount(), 200);
        assert!(ctx.is_double());

        // A doubled hand cannot be doubled or split again
        assert!(matches!(
            BetEngine.double(&mut manager, &mut ctx),
            Err(LedgerError::InvalidState(_))
        ));
        assert!(matches!(
            BetEngine.split(&mut manager, &mut ctx),
            Err(LedgerError::InvalidState(_))
        ));
        assert_eq!(manager.balance(), 800);
    }

    #[test]
    fn test_double_insufficient_balance() {
        let mut manager = active_manager(150);
        let mut ctx = BetEngine.place_bet(&mut manager, 100, SideBets::new()).unwrap();

        assert!(matches!(
            BetEngine.double(&mut manager, &mut ctx),
            Err(LedgerError::InsufficientBalance { required: 100, available: 50 })
        ));
        assert_eq!(manager.balance(), 50);
        assert_eq!(ctx.main_amount(), 100);
        assert!(!ctx.is_double());
        assert_eq!(ctx.state(), RoundState::BetPlaced);
    }

    #[test]
    fn test_stake_limits() {
        let mut manager = active_manager(MAX_BALANCE);

        for main in [Chips::MAX, MAX_STAKE + 1] {
            assert!(matches!(
                BetEngine.place_bet(&mut manager, main, SideBets::new()),
                Err(LedgerError::InvalidAmount(_))
            ));
        }
        assert!(matches!(
            BetEngine.place_bet(&mut manager, 10, SideBets::from([(SideBet::PerfectPair, Chips::MAX)])),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert_eq!(manager.balance(), MAX_BALANCE);
        assert!(!manager.has_open_round());

        let ctx = BetEngine
            .place_bet(&mut manager, MAX_STAKE, SideBets::from([(SideBet::DealerBust, MAX_STAKE)]))
            .unwrap();
        assert_eq!(ctx.side_bet_total(), MAX_STAKE);
        assert_eq!(manager.balance(), MAX_BALANCE - MAX_STAKE);
    }

    #[test]
    fn test_one_open_round_per_session() {
        let mut manager = active_manager(1000);
        let ctx = BetEngine.place_bet(&mut manager, 100, SideBets::new()).unwrap();
        assert_eq!(ctx.session_id(), manager.session().id.unwrap());
        assert!(manager.has_open_round());

        assert!(matches!(
            BetEngine.place_bet(&mut manager, 50, SideBets::new()),
            Err(LedgerError::InvalidState(_))
        ));
        assert_eq!(manager.balance(), 900);
    }

    #[test]
    fn test_context_from_another_session_rejected() {
        let mut first = active_manager(1000);
        let mut second = active_manager(1000);
        let mut ctx = BetEngine.place_bet(&mut first, 100, SideBets::new()).unwrap();

        assert!(matches!(
            BetEngine.split(&mut second, &mut ctx),
            Err(LedgerError::InvalidState(_))
        ));
        assert!(matches!(
            BetEngine.double(&mut second, &mut ctx),
            Err(LedgerError::InvalidState(_))
        ));
        assert_eq!(second.balance(), 1000);
        assert_eq!(ctx.state(), RoundState::BetPlaced);
    }
}
