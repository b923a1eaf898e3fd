//! SQLite storage implementation for budgets and their category shares.

mod model;
mod repository;

pub use model::{BudgetCategoryDB, BudgetDB};
pub use repository::BudgetRepository;
