use super::records::{BalanceRecord, Case, IdempotencyRecord};
use crate::error::Result;
use async_trait::async_trait;

/// Balance persistence. `insert` must fail with `DecisionError::DuplicateKey`
/// when a row for the customer already exists.
#[async_trait]
pub trait BalanceStore: Send + Sync {
    async fn get(&self, customer_id: &str) -> Result<Option<BalanceRecord>>;
    async fn insert(&self, record: BalanceRecord) -> Result<()>;
    async fn upsert(&self, record: BalanceRecord) -> Result<()>;
}

/// Idempotency persistence, unique on `(idempotency_key, customer_id)`.
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    async fn get(&self, idempotency_key: &str, customer_id: &str)
    -> Result<Option<IdempotencyRecord>>;
    async fn insert(&self, record: IdempotencyRecord) -> Result<()>;
}

/// Review case persistence, unique on the case id.
#[async_trait]
pub trait CaseStore: Send + Sync {
    async fn insert(&self, case: Case) -> Result<()>;
    async fn get(&self, case_id: &str) -> Result<Option<Case>>;
    async fn list_for_customer(&self, customer_id: &str) -> Result<Vec<Case>>;
}

pub type BalanceStoreBox = Box<dyn BalanceStore>;
pub type IdempotencyStoreBox = Box<dyn IdempotencyStore>;
pub type CaseStoreBox = Box<dyn CaseStore>;
