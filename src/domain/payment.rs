use crate::domain::money::Amount;
use crate::error::{DecisionError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated payment request.
///
/// Identifier fields are trimmed and the currency is normalized to upper case
/// before validation. Instances can only be built through [`PaymentRequest::new`],
/// so every request reaching the pipeline already satisfies its invariants.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    customer_id: String,
    amount: Amount,
    currency: String,
    payee_id: String,
    idempotency_key: String,
}

impl PaymentRequest {
    pub fn new(
        customer_id: &str,
        amount: Decimal,
        currency: &str,
        payee_id: &str,
        idempotency_key: &str,
    ) -> Result<Self> {
        let customer_id = non_empty("customer_id", customer_id)?;
        let payee_id = non_empty("payee_id", payee_id)?;
        let idempotency_key = non_empty("idempotency_key", idempotency_key)?;
        let currency = currency_code(currency)?;
        let amount = Amount::new(amount)?;

        Ok(Self {
            customer_id,
            amount,
            currency,
            payee_id,
            idempotency_key,
        })
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn payee_id(&self) -> &str {
        &self.payee_id
    }

    pub fn idempotency_key(&self) -> &str {
        &self.idempotency_key
    }
}

fn non_empty(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DecisionError::InvalidRequest(format!(
            "{field} must be non-empty"
        )));
    }
    Ok(trimmed.to_string())
}

fn currency_code(value: &str) -> Result<String> {
    let code = value.trim().to_uppercase();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(code)
    } else {
        Err(DecisionError::InvalidRequest(format!(
            "currency must be 3 uppercase letters, got '{}'",
            value.trim()
        )))
    }
}

/// Terminal outcome of evaluating a payment request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allow,
    Review,
    Block,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Decision::Allow => "allow",
            Decision::Review => "review",
            Decision::Block => "block",
        };
        f.write_str(s)
    }
}

/// Why a decision was not a plain `allow`. Order in a response is significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    InsufficientFunds,
    AmountAboveDailyThreshold,
    RecentDisputes,
    RiskSignals,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Reason::InsufficientFunds => "insufficient_funds",
            Reason::AmountAboveDailyThreshold => "amount_above_daily_threshold",
            Reason::RecentDisputes => "recent_disputes",
            Reason::RiskSignals => "risk_signals",
        };
        f.write_str(s)
    }
}

/// One entry of the orchestration audit trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStep {
    pub step: String,
    pub detail: String,
}

impl AgentStep {
    pub fn new(step: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            detail: detail.into(),
        }
    }
}

/// The response returned to the caller and cached for idempotent replays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionResponse {
    pub decision: Decision,
    pub reasons: Vec<Reason>,
    pub agent_trace: Vec<AgentStep>,
    pub request_id: String,
}
