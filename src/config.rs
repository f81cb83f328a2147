use crate::error::{DecisionError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Tunables for the decision pipeline.
///
/// Every field has a default, so a config file only needs to list the values it
/// overrides.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    /// Token bucket capacity per customer.
    pub burst: u32,
    /// Tokens added per second per customer.
    pub refill_per_sec: f64,
    /// Amounts strictly above this are routed to review.
    pub daily_threshold: Decimal,
    /// Balance given to a customer on first reference.
    pub starting_balance: Decimal,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub safe_payee_prefix: String,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            burst: 5,
            refill_per_sec: 5.0,
            daily_threshold: dec!(1000),
            starting_balance: dec!(300),
            max_retries: 2,
            retry_base_delay_ms: 10,
            safe_payee_prefix: "safe".to_string(),
        }
    }
}

impl DecisionConfig {
    /// Loads a JSON config file, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                serde_json::from_str(&raw)?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.burst == 0 {
            return Err(DecisionError::Config("burst must be at least 1".into()));
        }
        if !self.refill_per_sec.is_finite() || self.refill_per_sec <= 0.0 {
            return Err(DecisionError::Config(
                "refill_per_sec must be a positive number".into(),
            ));
        }
        if self.daily_threshold.is_sign_negative() {
            return Err(DecisionError::Config(
                "daily_threshold must not be negative".into(),
            ));
        }
        if self.starting_balance.is_sign_negative() {
            return Err(DecisionError::Config(
                "starting_balance must not be negative".into(),
            ));
        }
        Ok(())
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}
