use crate::domain::payment::PaymentRequest;
use crate::error::{DecisionError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

/// One CSV row before validation.
#[derive(Debug, Deserialize)]
struct RequestRow {
    customer_id: String,
    amount: Decimal,
    currency: String,
    payee_id: String,
    idempotency_key: String,
}

impl RequestRow {
    fn validate(self) -> Result<PaymentRequest> {
        PaymentRequest::new(
            &self.customer_id,
            self.amount,
            &self.currency,
            &self.payee_id,
            &self.idempotency_key,
        )
    }
}

/// Reads payment requests from a CSV source.
///
/// Expected header: `customer_id, amount, currency, payee_id, idempotency_key`.
/// Rows that fail to parse or validate are yielded as errors so the caller can
/// report them and keep going.
pub struct RequestReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> RequestReader<R> {
    /// Creates a new `RequestReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and validates requests.
    pub fn requests(self) -> impl Iterator<Item = Result<PaymentRequest>> {
        self.reader
            .into_deserialize::<RequestRow>()
            .map(|result| result.map_err(DecisionError::from).and_then(RequestRow::validate))
    }
}
