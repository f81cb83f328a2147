use crate::domain::money::{Amount, Balance};
use crate::domain::payment::{Decision, Reason};
use crate::domain::risk::RiskSignal;
use rust_decimal::Decimal;

/// Disputes at or above this count route the payment to review.
pub const DISPUTE_LIMIT: u32 = 2;

/// Deterministic threshold rules mapping `(amount, balance, risk)` to a decision.
#[derive(Debug, Clone, Copy)]
pub struct RuleEvaluator {
    daily_threshold: Decimal,
}

impl RuleEvaluator {
    pub fn new(daily_threshold: Decimal) -> Self {
        Self { daily_threshold }
    }

    pub fn decide(&self, amount: Amount, balance: Balance, risk: RiskSignal) -> (Decision, Vec<Reason>) {
        if !balance.covers(amount) {
            return (Decision::Block, vec![Reason::InsufficientFunds]);
        }

        let mut reasons = Vec::new();
        if amount.value() > self.daily_threshold {
            reasons.push(Reason::AmountAboveDailyThreshold);
        }
        if risk.recent_disputes >= DISPUTE_LIMIT {
            reasons.push(Reason::RecentDisputes);
        } else if risk.device_change {
            reasons.push(Reason::RiskSignals);
        }

        if reasons.is_empty() {
            (Decision::Allow, reasons)
        } else {
            (Decision::Review, reasons)
        }
    }
}

impl Default for RuleEvaluator {
    fn default() -> Self {
        Self::new(Decimal::ONE_THOUSAND)
    }
}
