use crate::domain::payment::{DecisionResponse, PaymentRequest};
use crate::domain::ports::IdempotencyStoreBox;
use crate::domain::records::IdempotencyRecord;
use crate::error::{DecisionError, Result};
use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::debug;

/// SHA-256 over the canonical JSON form of the fields that define a payment.
///
/// Keys are emitted in sorted order with compact separators and the amount is
/// normalized, so `250` and `250.00` hash the same.
pub fn request_hash(request: &PaymentRequest) -> String {
    let canonical = serde_json::json!({
        "amount": request.amount().value().normalize().to_string(),
        "currency": request.currency(),
        "customerId": request.customer_id(),
        "payeeId": request.payee_id(),
    });
    let mut hasher = Sha256::new();
    hasher.update(canonical.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// Replays previously computed responses for retried requests.
pub struct IdempotencyCache {
    store: IdempotencyStoreBox,
}

impl IdempotencyCache {
    pub fn new(store: IdempotencyStoreBox) -> Self {
        Self { store }
    }

    /// Returns the stored response for `(key, customer)` when the payload hash
    /// matches. A record with a different hash is an `IdempotencyConflict`.
    pub async fn lookup(
        &self,
        idempotency_key: &str,
        customer_id: &str,
        request_hash: &str,
    ) -> Result<Option<DecisionResponse>> {
        match self.store.get(idempotency_key, customer_id).await? {
            Some(record) if record.request_hash == request_hash => Ok(Some(record.response)),
            Some(_) => Err(DecisionError::IdempotencyConflict {
                key: idempotency_key.to_string(),
            }),
            None => Ok(None),
        }
    }

    /// Records a response. Losing a concurrent insert race counts as success.
    pub async fn store(
        &self,
        idempotency_key: &str,
        customer_id: &str,
        request_hash: &str,
        response: &DecisionResponse,
    ) -> Result<()> {
        let record = IdempotencyRecord {
            idempotency_key: idempotency_key.to_string(),
            customer_id: customer_id.to_string(),
            request_hash: request_hash.to_string(),
            response: response.clone(),
            created_at: Utc::now(),
        };
        match self.store.insert(record).await {
            Ok(()) => Ok(()),
            Err(DecisionError::DuplicateKey(key)) => {
                debug!(%key, "idempotency record already stored");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
