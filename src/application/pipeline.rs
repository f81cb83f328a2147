use crate::application::agent::{RetryPolicy, ToolOrchestrator};
use crate::application::idempotency::{IdempotencyCache, request_hash};
use crate::application::ledger::BalanceLedger;
use crate::application::metrics::{DecisionMetrics, MetricsSnapshot};
use crate::application::rate_limiter::RateLimiter;
use crate::config::DecisionConfig;
use crate::domain::money::Balance;
use crate::domain::payment::{Decision, DecisionResponse, PaymentRequest, Reason};
use crate::domain::ports::{BalanceStoreBox, CaseStoreBox, IdempotencyStoreBox};
use crate::domain::records::Case;
use crate::domain::risk::{PayeePrefixRiskSource, RiskSignalSource};
use crate::domain::rules::RuleEvaluator;
use crate::error::{DecisionError, Result};
use crate::telemetry::mask_customer;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// The end-to-end decision path for one payment request.
///
/// `DecisionPipeline` is shared by every in-flight request. Per-request state
/// (the agent trace) lives on the stack of [`decide`](Self::decide); the shared
/// parts (rate buckets, ledger locks) are keyed per customer.
pub struct DecisionPipeline {
    limiter: RateLimiter,
    cache: IdempotencyCache,
    ledger: BalanceLedger,
    cases: CaseStoreBox,
    risk: Box<dyn RiskSignalSource>,
    rules: RuleEvaluator,
    retry: RetryPolicy,
    metrics: DecisionMetrics,
}

impl DecisionPipeline {
    /// Creates a pipeline over the given stores, using the payee-prefix risk
    /// source from `config`.
    pub fn new(
        config: &DecisionConfig,
        balance_store: BalanceStoreBox,
        idempotency_store: IdempotencyStoreBox,
        case_store: CaseStoreBox,
    ) -> Self {
        Self {
            limiter: RateLimiter::new(config.burst, config.refill_per_sec),
            cache: IdempotencyCache::new(idempotency_store),
            ledger: BalanceLedger::new(balance_store, Balance::new(config.starting_balance)),
            cases: case_store,
            risk: Box::new(PayeePrefixRiskSource::new(config.safe_payee_prefix.clone())),
            rules: RuleEvaluator::new(config.daily_threshold),
            retry: RetryPolicy {
                max_retries: config.max_retries,
                base_delay: config.retry_base_delay(),
            },
            metrics: DecisionMetrics::new(),
        }
    }

    /// Replaces the risk signal source.
    pub fn with_risk_source(mut self, risk: Box<dyn RiskSignalSource>) -> Self {
        self.risk = risk;
        self
    }

    /// Decides a request under a freshly generated request id.
    pub async fn decide(&self, request: &PaymentRequest) -> Result<DecisionResponse> {
        let request_id = format!("req_{}", &Uuid::new_v4().simple().to_string()[..8]);
        self.decide_with_request_id(request, request_id).await
    }

    /// Decides a request.
    ///
    /// Order: admission, idempotency lookup, signal gathering, rules, then
    /// reservation (allow) or case creation (review), and finally caching the
    /// response. A cached response is returned unchanged, including its original
    /// request id.
    pub async fn decide_with_request_id(
        &self,
        request: &PaymentRequest,
        request_id: String,
    ) -> Result<DecisionResponse> {
        let started = Instant::now();
        let customer_id = request.customer_id();
        let masked = mask_customer(customer_id);

        if let Err(e) = self.limiter.admit(customer_id) {
            warn!(%request_id, customer = %masked, "admission_denied");
            return Err(e);
        }

        let hash = request_hash(request);
        if let Some(cached) = self
            .cache
            .lookup(request.idempotency_key(), customer_id, &hash)
            .await?
        {
            info!(
                %request_id,
                original_request_id = %cached.request_id,
                decision = %cached.decision,
                customer = %masked,
                "decision_cached"
            );
            self.metrics.record(cached.decision, started.elapsed());
            return Ok(cached);
        }

        let mut agent = ToolOrchestrator::new(self.retry);
        agent.plan();
        let balance = agent.get_balance(&self.ledger, customer_id).await;
        let risk = agent
            .get_risk_signals(self.risk.as_ref(), customer_id, request.payee_id())
            .await;

        let (mut decision, mut reasons) = self.rules.decide(request.amount(), balance, risk);

        match decision {
            Decision::Allow => match self.ledger.reserve(customer_id, request.amount()).await {
                Ok(_) => {}
                Err(DecisionError::InsufficientFunds { available, requested }) => {
                    warn!(
                        %request_id,
                        customer = %masked,
                        %available,
                        %requested,
                        "reservation_failed"
                    );
                    decision = Decision::Block;
                    reasons = vec![Reason::InsufficientFunds];
                }
                Err(e) => return Err(e),
            },
            Decision::Review => {
                let case = Case::open(customer_id, request.payee_id(), reasons.clone());
                let case_id = case.id.clone();
                self.cases.insert(case).await?;
                info!(%request_id, %case_id, customer = %masked, "case_created");
            }
            Decision::Block => {}
        }
        agent.recommend(decision);

        let response = DecisionResponse {
            decision,
            reasons,
            agent_trace: agent.into_trace(),
            request_id,
        };

        if let Err(e) = self
            .cache
            .store(request.idempotency_key(), customer_id, &hash, &response)
            .await
        {
            warn!(request_id = %response.request_id, error = %e, "failed to cache decision");
        }

        info!(
            request_id = %response.request_id,
            decision = %response.decision,
            reasons = ?response.reasons,
            customer = %masked,
            "decision"
        );
        self.metrics.record(response.decision, started.elapsed());
        Ok(response)
    }

    /// Current balance for a customer, creating it if needed.
    pub async fn balance(&self, customer_id: &str) -> Result<Balance> {
        Ok(self.ledger.get_or_create(customer_id).await?.amount)
    }

    /// Review cases opened for a customer.
    pub async fn cases_for(&self, customer_id: &str) -> Result<Vec<Case>> {
        self.cases.list_for_customer(customer_id).await
    }

    /// Counters and latency percentile over answered requests.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
