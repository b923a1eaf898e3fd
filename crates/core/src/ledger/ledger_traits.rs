use std::collections::HashSet;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::errors::Result;
use crate::ledger::ledger_model::{
    DateRange, EntryFingerprint, EntryKind, Expense, ExpenseOutcome, ExpenseUpdate, ImportRow,
    ImportSummary, Income, IncomeUpdate, LedgerMutation, LedgerSummary, LinkedEntries, NewExpense,
    NewIncome, TemplateEntryStats,
};

/// Trait for ledger repository operations
#[async_trait]
pub trait LedgerRepositoryTrait: Send + Sync {
    fn get_income(&self, user_id: &str, income_id: &str) -> Result<Income>;
    fn get_expense(&self, user_id: &str, expense_id: &str) -> Result<Expense>;
    fn list_incomes(&self, user_id: &str, range: Option<DateRange>) -> Result<Vec<Income>>;
    fn list_expenses(&self, user_id: &str, range: Option<DateRange>) -> Result<Vec<Expense>>;

    fn sum_incomes(&self, user_id: &str, range: Option<DateRange>) -> Result<Decimal>;
    fn sum_expenses(
        &self,
        user_id: &str,
        range: Option<DateRange>,
        category: Option<&str>,
    ) -> Result<Decimal>;

    /// Date of the user's earliest income, if any.
    fn first_income_date(&self, user_id: &str) -> Result<Option<NaiveDate>>;

    /// Fingerprints of every template-generated entry the user owns.
    fn recurring_fingerprints(&self, user_id: &str) -> Result<HashSet<EntryFingerprint>>;

    fn template_entry_stats(&self, kind: EntryKind, recurring_id: &str)
        -> Result<TemplateEntryStats>;

    fn linked_entries(&self, investment_id: &str) -> Result<LinkedEntries>;

    async fn create_income(&self, new_income: NewIncome) -> Result<Income>;
    async fn create_expense(&self, new_expense: NewExpense) -> Result<Expense>;
    async fn update_income(
        &self,
        user_id: &str,
        income_id: &str,
        update: IncomeUpdate,
    ) -> Result<Income>;
    async fn update_expense(
        &self,
        user_id: &str,
        expense_id: &str,
        update: ExpenseUpdate,
    ) -> Result<Expense>;
    async fn delete_incomes(&self, user_id: &str, ids: Vec<String>) -> Result<usize>;
    async fn delete_expenses(&self, user_id: &str, ids: Vec<String>) -> Result<usize>;

    /// Applies every mutation in one transaction. Returns the number of rows touched.
    async fn apply_mutations(&self, mutations: Vec<LedgerMutation>) -> Result<usize>;
}

/// Assigns a category to an entry whose category was left blank.
pub trait CategoryClassifier: Send + Sync {
    fn classify(&self, text: &str, kind: EntryKind) -> String;
}

/// Trait for ledger service operations
#[async_trait]
pub trait LedgerServiceTrait: Send + Sync {
    fn get_incomes(&self, user_id: &str, range: Option<DateRange>) -> Result<Vec<Income>>;
    fn get_expenses(&self, user_id: &str, range: Option<DateRange>) -> Result<Vec<Expense>>;
    fn summary(&self, user_id: &str) -> Result<LedgerSummary>;

    async fn add_income(&self, user_id: &str, new_income: NewIncome) -> Result<Income>;
    async fn update_income(
        &self,
        user_id: &str,
        income_id: &str,
        update: IncomeUpdate,
    ) -> Result<Income>;
    async fn delete_incomes(&self, user_id: &str, ids: Vec<String>) -> Result<usize>;

    async fn add_expense(&self, user_id: &str, new_expense: NewExpense) -> Result<ExpenseOutcome>;
    async fn update_expense(
        &self,
        user_id: &str,
        expense_id: &str,
        update: ExpenseUpdate,
    ) -> Result<ExpenseOutcome>;
    async fn delete_expenses(&self, user_id: &str, ids: Vec<String>) -> Result<usize>;

    async fn import_entries(&self, user_id: &str, rows: Vec<ImportRow>) -> Result<ImportSummary>;
}
