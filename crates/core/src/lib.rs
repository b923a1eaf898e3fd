//! Ledgerly Core - Domain entities, services, and traits.
//!
//! This crate contains the business logic for Ledgerly: recurring
//! materialization, surplus accounting, savings goal allocation, budgets and
//! investments. It is database-agnostic and defines traits that are
//! implemented by the `storage-sqlite` crate.

pub mod budget;
pub mod constants;
pub mod errors;
pub mod goals;
pub mod investments;
pub mod ledger;
pub mod recurring;
pub mod surplus;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
