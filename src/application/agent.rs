//! Tool-call orchestration with an auditable step trace.
//!
//! Every signal read goes through [`call_with_retry`], which never returns an
//! error: a tool that keeps failing yields its fallback value, and the trace
//! records each retry and the final fallback in the order they happened.

use crate::application::ledger::BalanceLedger;
use crate::domain::money::Balance;
use crate::domain::payment::{AgentStep, Decision};
use crate::domain::risk::{RiskSignal, RiskSignalSource};
use crate::error::Result;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Bounded retry with linear backoff (`attempt * base_delay`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(10),
        }
    }
}

/// Runs `operation` up to `max_retries + 1` times, appending a
/// `tool:<name>:retry` step before each retry and a `tool:<name>:fallback`
/// step if every attempt failed.
pub async fn call_with_retry<T, F, Fut>(
    trace: &mut Vec<AgentStep>,
    name: &str,
    policy: RetryPolicy,
    fallback: T,
    mut operation: F,
) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt: u32 = 0;
    loop {
        match operation().await {
            Ok(value) => return value,
            Err(e) => {
                attempt += 1;
                if attempt > policy.max_retries {
                    warn!(tool = name, attempts = attempt, error = %e, "tool_fallback");
                    trace.push(AgentStep::new(
                        format!("tool:{name}:fallback"),
                        "using fallback",
                    ));
                    return fallback;
                }
                warn!(tool = name, attempt, error = %e, "tool_retry");
                trace.push(AgentStep::new(
                    format!("tool:{name}:retry"),
                    format!("attempt={attempt}, error={}", e.kind()),
                ));
                tokio::time::sleep(policy.base_delay * attempt).await;
            }
        }
    }
}

/// Per-request orchestrator. Owns the trace for exactly one decision.
pub struct ToolOrchestrator {
    policy: RetryPolicy,
    trace: Vec<AgentStep>,
}

impl ToolOrchestrator {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            trace: Vec::new(),
        }
    }

    pub fn plan(&mut self) {
        self.trace
            .push(AgentStep::new("plan", "Check balance, risk, and limits"));
    }

    /// Reads the customer's current balance. Falls back to zero, which can only
    /// ever lead to a `block`.
    pub async fn get_balance(&mut self, ledger: &BalanceLedger, customer_id: &str) -> Balance {
        let balance = call_with_retry(
            &mut self.trace,
            "getBalance",
            self.policy,
            Balance::ZERO,
            move || async move { ledger.get_or_create(customer_id).await.map(|r| r.amount) },
        )
        .await;
        self.trace.push(AgentStep::new(
            "tool:getBalance",
            format!("balance={balance}"),
        ));
        balance
    }

    pub async fn get_risk_signals(
        &mut self,
        source: &dyn RiskSignalSource,
        customer_id: &str,
        payee_id: &str,
    ) -> RiskSignal {
        let risk = call_with_retry(
            &mut self.trace,
            "getRiskSignals",
            self.policy,
            RiskSignal::FALLBACK,
            move || source.signals(customer_id, payee_id),
        )
        .await;
        self.trace
            .push(AgentStep::new("tool:getRiskSignals", risk.to_string()));
        risk
    }

    pub fn recommend_note(&mut self, note: impl Into<String>) {
        self.trace.push(AgentStep::new("tool:recommend", note));
    }

    /// Appends the standard note for a final decision.
    pub fn recommend(&mut self, decision: Decision) {
        let note = match decision {
            Decision::Allow => "allow",
            Decision::Review => "route to manual review",
            Decision::Block => "block due to rule violation",
        };
        self.recommend_note(note);
    }

    pub fn into_trace(self) -> Vec<AgentStep> {
        self.trace
    }
}
