//! Database models for ledger entries.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ledgerly_core::errors::{Error, Result};
use ledgerly_core::ledger::{Expense, ExpenseUpdate, Income, IncomeUpdate, NewExpense, NewIncome};

use crate::utils::{decimal_to_text, parse_decimal};

/// Database model for incomes
#[derive(
    Queryable, Identifiable, Insertable, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone,
)]
#[diesel(table_name = crate::schema::incomes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct IncomeDB {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub amount: String,
    pub category: String,
    pub source: String,
    pub recurring_id: Option<String>,
    pub investment_id: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::incomes)]
pub struct IncomeChangesetDB {
    pub date: NaiveDate,
    pub amount: String,
    pub category: String,
    pub source: String,
}

/// Database model for expenses
#[derive(
    Queryable, Identifiable, Insertable, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone,
)]
#[diesel(table_name = crate::schema::expenses)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct ExpenseDB {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub amount: String,
    pub category: String,
    pub name: String,
    pub recurring_id: Option<String>,
    pub investment_id: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::expenses)]
pub struct ExpenseChangesetDB {
    pub date: NaiveDate,
    pub amount: String,
    pub category: String,
    pub name: String,
}

impl IncomeDB {
    pub fn from_new(new_income: NewIncome, created_at: NaiveDateTime) -> Self {
        Self {
            id: new_income
                .id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            user_id: new_income.user_id,
            date: new_income.date,
            amount: decimal_to_text(new_income.amount),
            category: new_income.category,
            source: new_income.source,
            recurring_id: new_income.recurring_id,
            investment_id: new_income.investment_id,
            created_at,
        }
    }
}

impl ExpenseDB {
    pub fn from_new(new_expense: NewExpense, created_at: NaiveDateTime) -> Self {
        Self {
            id: new_expense
                .id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            user_id: new_expense.user_id,
            date: new_expense.date,
            amount: decimal_to_text(new_expense.amount),
            category: new_expense.category,
            name: new_expense.name,
            recurring_id: new_expense.recurring_id,
            investment_id: new_expense.investment_id,
            created_at,
        }
    }
}

impl From<IncomeUpdate> for IncomeChangesetDB {
    fn from(update: IncomeUpdate) -> Self {
        Self {
            date: update.date,
            amount: decimal_to_text(update.amount),
            category: update.category,
            source: update.source,
        }
    }
}

impl From<ExpenseUpdate> for ExpenseChangesetDB {
    fn from(update: ExpenseUpdate) -> Self {
        Self {
            date: update.date,
            amount: decimal_to_text(update.amount),
            category: update.category,
            name: update.name,
        }
    }
}

impl TryFrom<IncomeDB> for Income {
    type Error = Error;

    fn try_from(db: IncomeDB) -> Result<Self> {
        Ok(Self {
            amount: parse_decimal(&db.amount, "income amount")?,
            id: db.id,
            user_id: db.user_id,
            date: db.date,
            category: db.category,
            source: db.source,
            recurring_id: db.recurring_id,
            investment_id: db.investment_id,
            created_at: db.created_at,
        })
    }
}

impl TryFrom<ExpenseDB> for Expense {
    type Error = Error;

    fn try_from(db: ExpenseDB) -> Result<Self> {
        Ok(Self {
            amount: parse_decimal(&db.amount, "expense amount")?,
            id: db.id,
            user_id: db.user_id,
            date: db.date,
            category: db.category,
            name: db.name,
            recurring_id: db.recurring_id,
            investment_id: db.investment_id,
            created_at: db.created_at,
        })
    }
}
