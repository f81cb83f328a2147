use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Risk signals for a single request. Not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RiskSignal {
    pub recent_disputes: u32,
    pub device_change: bool,
}

impl RiskSignal {
    /// Value used when the signal source cannot be reached.
    pub const FALLBACK: Self = Self {
        recent_disputes: 0,
        device_change: false,
    };
}

impl fmt::Display for RiskSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "recent_disputes={}, device_change={}",
            self.recent_disputes, self.device_change
        )
    }
}

/// Pluggable source of risk signals (a risk service, a model, a fixture).
#[async_trait]
pub trait RiskSignalSource: Send + Sync {
    async fn signals(&self, customer_id: &str, payee_id: &str) -> Result<RiskSignal>;
}

/// Treats payees whose id starts with a known prefix as clean and everything
/// else as risky.
#[derive(Debug, Clone)]
pub struct PayeePrefixRiskSource {
    safe_prefix: String,
}

impl PayeePrefixRiskSource {
    pub fn new(safe_prefix: impl Into<String>) -> Self {
        Self {
            safe_prefix: safe_prefix.into().to_lowercase(),
        }
    }
}

impl Default for PayeePrefixRiskSource {
    fn default() -> Self {
        Self::new("safe")
    }
}

#[async_trait]
impl RiskSignalSource for PayeePrefixRiskSource {
    async fn signals(&self, _customer_id: &str, payee_id: &str) -> Result<RiskSignal> {
        if payee_id.to_lowercase().starts_with(&self.safe_prefix) {
            Ok(RiskSignal {
                recent_disputes: 0,
                device_change: false,
            })
        } else {
            Ok(RiskSignal {
                recent_disputes: 2,
                device_change: true,
            })
        }
    }
}
