//! Ledger domain models.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::budget::BudgetWarning;
use crate::recurring::RecurringTemplate;

/// Which side of the ledger an entry or template belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Income,
    Expense,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Income => "income",
            EntryKind::Expense => "expense",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain model representing an income record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Income {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub category: String,
    pub source: String,
    pub recurring_id: Option<String>,
    pub investment_id: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Input model for creating a new income record
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewIncome {
    pub id: Option<String>,
    #[serde(default)]
    pub user_id: String,
    pub date: NaiveDate,
    pub amount: Decimal,
    #[serde(default)]
    pub category: String,
    pub source: String,
    #[serde(default)]
    pub recurring_id: Option<String>,
    #[serde(default)]
    pub investment_id: Option<String>,
}

/// Domain model representing an expense record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub category: String,
    pub name: String,
    pub recurring_id: Option<String>,
    pub investment_id: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Input model for creating a new expense record
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
    pub id: Option<String>,
    #[serde(default)]
    pub user_id: String,
    pub date: NaiveDate,
    pub amount: Decimal,
    #[serde(default)]
    pub category: String,
    pub name: String,
    #[serde(default)]
    pub recurring_id: Option<String>,
    #[serde(default)]
    pub investment_id: Option<String>,
}

/// Fields a correction flow may change on an income record.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IncomeUpdate {
    pub date: NaiveDate,
    pub amount: Decimal,
    pub category: String,
    pub source: String,
}

/// Fields a correction flow may change on an expense record.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseUpdate {
    pub date: NaiveDate,
    pub amount: Decimal,
    pub category: String,
    pub name: String,
}

/// A single write against the ledger. Investment synchronisation and bulk
/// import produce lists of these which the store applies in one transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum LedgerMutation {
    CreateIncome(NewIncome),
    UpdateIncome { id: String, update: IncomeUpdate },
    DeleteIncome { id: String },
    CreateExpense(NewExpense),
    UpdateExpense { id: String, update: ExpenseUpdate },
    DeleteExpense { id: String },
}

/// Identity of an entry generated from a recurring template. Two entries with
/// the same fingerprint are the same occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryFingerprint {
    pub kind: EntryKind,
    pub recurring_id: String,
    pub label: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub category: String,
}

impl EntryFingerprint {
    pub fn of_income(income: &NewIncome) -> Option<Self> {
        income.recurring_id.as_ref().map(|rid| Self {
            kind: EntryKind::Income,
            recurring_id: rid.clone(),
            label: income.source.clone(),
            amount: income.amount.normalize(),
            date: income.date,
            category: income.category.clone(),
        })
    }

    pub fn of_expense(expense: &NewExpense) -> Option<Self> {
        expense.recurring_id.as_ref().map(|rid| Self {
            kind: EntryKind::Expense,
            recurring_id: rid.clone(),
            label: expense.name.clone(),
            amount: expense.amount.normalize(),
            date: expense.date,
            category: expense.category.clone(),
        })
    }
}

/// Inclusive date range filter for ledger queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Count and sum of the ledger entries generated by one template.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TemplateEntryStats {
    pub count: usize,
    pub total: Decimal,
}

/// The ledger rows owned by one investment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkedEntries {
    pub expense: Option<Expense>,
    pub income: Option<Income>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSummary {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub balance: Decimal,
    pub due_recurring_expenses: Vec<RecurringTemplate>,
}

/// Result of recording an expense: the stored row plus any budget signals it raised.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseOutcome {
    pub expense: Expense,
    pub warnings: Vec<BudgetWarning>,
}

/// One row handed to the bulk import. Fields are optional because rows come
/// from loosely validated sources; invalid rows are skipped and counted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImportRow {
    pub kind: EntryKind,
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub label: String,
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub imported_incomes: usize,
    pub imported_expenses: usize,
    pub skipped: usize,
    pub categories: Vec<String>,
    pub warnings: Vec<BudgetWarning>,
}
