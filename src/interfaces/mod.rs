//! Input/output adapters used by the command-line driver.

pub mod csv;
pub mod jsonl;
