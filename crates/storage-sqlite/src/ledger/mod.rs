//! SQLite storage implementation for incomes and expenses.

mod model;
mod repository;

pub use model::{ExpenseDB, IncomeDB};
pub use repository::LedgerRepository;
pub(crate) use repository::{apply_mutation, insert_expense_row, insert_income_row};
