//! Errors surfaced to callers.
//!
//! Only malformed queries are errors. Malformed document entries are skipped
//! by the extractor and descriptions without a monetary rule simply yield no
//! discount, so neither has a variant here. Storage and config failures travel
//! as `anyhow::Error`.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("amountToPay must be greater than zero, got {0}")]
    NonPositiveAmount(f64),

    #[error("amountToPay must be a finite number")]
    NonFiniteAmount,

    #[error("bankName must not be empty")]
    EmptyBankName,
}
