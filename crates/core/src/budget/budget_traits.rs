use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::budget::budget_model::{Budget, BudgetStatus, BudgetWarning, NewBudget};
use crate::errors::Result;
use crate::ledger::Expense;

/// Trait for budget repository operations
#[async_trait]
pub trait BudgetRepositoryTrait: Send + Sync {
    fn list_budgets(&self, user_id: &str) -> Result<Vec<Budget>>;

    /// Budgets active on `date` that carry `category`.
    fn active_budgets_for_category(
        &self,
        user_id: &str,
        category: &str,
        date: NaiveDate,
    ) -> Result<Vec<Budget>>;

    async fn insert_budget(&self, budget: Budget) -> Result<Budget>;
    async fn delete_budget(&self, user_id: &str, budget_id: &str) -> Result<usize>;
}

/// Outbound channel for budget alerts.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, user_id: &str, subject: &str, body: &str) -> Result<()>;
}

/// Trait for budget service operations
#[async_trait]
pub trait BudgetServiceTrait: Send + Sync {
    fn get_budgets(&self, user_id: &str) -> Result<Vec<BudgetStatus>>;
    async fn create_budget(&self, user_id: &str, new_budget: NewBudget) -> Result<Budget>;
    async fn delete_budget(&self, user_id: &str, budget_id: &str) -> Result<()>;

    /// Warnings raised by `expense`, which must already be stored.
    async fn evaluate_budget_warnings(
        &self,
        user_id: &str,
        expense: &Expense,
    ) -> Result<Vec<BudgetWarning>>;

    /// Same evaluation for stored `(date, amount)` spends in `category`.
    /// A budget only reacts to the spends dated inside its window.
    async fn evaluate_category(
        &self,
        user_id: &str,
        category: &str,
        spends: &[(NaiveDate, Decimal)],
    ) -> Result<Vec<BudgetWarning>>;
}
