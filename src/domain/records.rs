//! Persisted record types.

use crate::domain::money::Balance;
use crate::domain::payment::{DecisionResponse, Reason};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A customer's balance row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceRecord {
    pub customer_id: String,
    pub amount: Balance,
    pub updated_at: DateTime<Utc>,
}

impl BalanceRecord {
    pub fn new(customer_id: impl Into<String>, amount: Balance) -> Self {
        Self {
            customer_id: customer_id.into(),
            amount,
            updated_at: Utc::now(),
        }
    }
}

/// A previously computed response, unique per `(idempotency_key, customer_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdempotencyRecord {
    pub idempotency_key: String,
    pub customer_id: String,
    pub request_hash: String,
    pub response: DecisionResponse,
    pub created_at: DateTime<Utc>,
}

/// A manual-review case. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub id: String,
    pub customer_id: String,
    pub payee_id: String,
    pub reasons: Vec<Reason>,
    pub created_at: DateTime<Utc>,
}

impl Case {
    pub fn open(customer_id: &str, payee_id: &str, reasons: Vec<Reason>) -> Self {
        Self {
            id: format!("case_{}", Uuid::new_v4().simple()),
            customer_id: customer_id.to_string(),
            payee_id: payee_id.to_string(),
            reasons,
            created_at: Utc::now(),
        }
    }
}
