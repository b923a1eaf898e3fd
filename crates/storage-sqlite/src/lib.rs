//! SQLite storage implementation for Ledgerly.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the repository traits defined in `ledgerly-core` and contains:
//! - Database connection pooling and the single writer actor
//! - Diesel migrations
//! - Repository implementations for ledger entries, recurring templates,
//!   savings goals, budgets and investments
//! - Database-specific model types (with Diesel derives)
//!
//! # Architecture
//!
//! This crate is the only place in the application where Diesel dependencies exist.
//! `core` and the server are database-agnostic and work with traits.
//!
//! ```text
//! core (domain)          server (HTTP)
//!       │                      │
//!       └──────────┬───────────┘
//!                  │
//!                  ▼
//!          storage-sqlite (this crate)
//!                  │
//!                  ▼
//!              SQLite DB
//! ```
//!
//! Amounts are stored as decimal TEXT. Every write runs on the writer actor
//! inside one `IMMEDIATE` transaction, so a multi-row operation either lands
//! completely or not at all.

pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

// Repository implementations
pub mod budget;
pub mod goals;
pub mod investments;
pub mod ledger;
pub mod recurring;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, get_db_path, init, open, run_migrations, spawn_writer,
    DbConnection, DbPool, WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

pub use budget::BudgetRepository;
pub use goals::GoalRepository;
pub use investments::InvestmentRepository;
pub use ledger::LedgerRepository;
pub use recurring::RecurringRepository;

// Re-export from ledgerly-core for convenience
pub use ledgerly_core::errors::{DatabaseError, Error, Result};
