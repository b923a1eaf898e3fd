//! SQLite storage implementation for recurring income and expense templates.

mod model;
mod repository;

pub use model::{RecurringExpenseDB, RecurringIncomeDB};
pub use repository::RecurringRepository;
