//! Ledger module - income and expense records, services, and traits.

mod ledger_model;
mod ledger_service;
mod ledger_traits;


pub use ledger_model::{
    DateRange, EntryFingerprint, EntryKind, Expense, ExpenseOutcome, ExpenseUpdate, ImportRow,
    ImportSummary, Income, IncomeUpdate, LedgerMutation, LedgerSummary, LinkedEntries, NewExpense,
    NewIncome, TemplateEntryStats,
};
pub use ledger_service::LedgerService;
pub use ledger_traits::{CategoryClassifier, LedgerRepositoryTrait, LedgerServiceTrait};
