//! Domain layer: value objects, persisted records, decision rules and the
//! ports the application layer depends on.

pub mod money;
pub mod payment;
pub mod ports;
pub mod records;
pub mod risk;
pub mod rules;
