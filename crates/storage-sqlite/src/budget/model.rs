//! Database models for budgets.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use ledgerly_core::budget::{Budget, BudgetCategory};
use ledgerly_core::errors::{Error, Result};

use crate::utils::{decimal_to_text, parse_decimal};

/// Database model for budgets
#[derive(
    Queryable, Identifiable, Insertable, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone,
)]
#[diesel(table_name = crate::schema::budgets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct BudgetDB {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub total_amount: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: NaiveDateTime,
}

/// Database model for one category share of a budget
#[derive(
    Queryable,
    Identifiable,
    Insertable,
    Associations,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(belongs_to(BudgetDB, foreign_key = budget_id))]
#[diesel(table_name = crate::schema::budget_categories)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct BudgetCategoryDB {
    pub id: String,
    pub budget_id: String,
    pub category: String,
    pub percentage: String,
}

impl BudgetDB {
    /// Rebuilds the domain budget from its row and category rows.
    pub fn into_domain(self, categories: Vec<BudgetCategoryDB>) -> Result<Budget> {
        Ok(Budget {
            total_amount: parse_decimal(&self.total_amount, "budget total amount")?,
            categories: categories
                .into_iter()
                .map(BudgetCategory::try_from)
                .collect::<Result<Vec<_>>>()?,
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            start_date: self.start_date,
            end_date: self.end_date,
            created_at: self.created_at,
        })
    }
}

impl From<&Budget> for BudgetDB {
    fn from(budget: &Budget) -> Self {
        Self {
            id: budget.id.clone(),
            user_id: budget.user_id.clone(),
            name: budget.name.clone(),
            total_amount: decimal_to_text(budget.total_amount),
            start_date: budget.start_date,
            end_date: budget.end_date,
            created_at: budget.created_at,
        }
    }
}

impl TryFrom<BudgetCategoryDB> for BudgetCategory {
    type Error = Error;

    fn try_from(db: BudgetCategoryDB) -> Result<Self> {
        Ok(Self {
            percentage: parse_decimal(&db.percentage, "budget category percentage")?,
            id: db.id,
            budget_id: db.budget_id,
            category: db.category,
        })
    }
}

impl From<&BudgetCategory> for BudgetCategoryDB {
    fn from(category: &BudgetCategory) -> Self {
        Self {
            id: category.id.clone(),
            budget_id: category.budget_id.clone(),
            category: category.category.clone(),
            percentage: decimal_to_text(category.percentage),
        }
    }
}
