//! Surplus module - monthly and accumulated surplus over the ledger.

mod surplus_service;

pub use surplus_service::{MonthlySurplus, SurplusService, SurplusServiceTrait};
