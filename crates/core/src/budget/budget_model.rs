//! Budget domain models.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::utils::decimal_utils::round_money;

/// Domain model representing a budget
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub total_amount: Decimal,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub categories: Vec<BudgetCategory>,
    pub created_at: NaiveDateTime,
}

impl Budget {
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    pub fn category(&self, name: &str) -> Option<&BudgetCategory> {
        self.categories.iter().find(|c| c.category == name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BudgetCategory {
    pub id: String,
    pub budget_id: String,
    pub category: String,
    /// Share of the budget total, in percent.
    pub percentage: Decimal,
}

impl BudgetCategory {
    pub fn limit_amount(&self, total_amount: Decimal) -> Decimal {
        round_money(total_amount * self.percentage / Decimal::ONE_HUNDRED)
    }
}

/// Input model for creating a new budget
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewBudget {
    pub id: Option<String>,
    pub name: String,
    pub total_amount: Decimal,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub categories: Vec<NewBudgetCategory>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewBudgetCategory {
    pub category: String,
    pub percentage: Decimal,
}

/// Spend against one category of a budget.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpending {
    pub category: String,
    pub limit: Decimal,
    pub spent: Decimal,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BudgetStatus {
    pub budget: Budget,
    pub categories: Vec<CategorySpending>,
    pub total_spent: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BudgetWarningKind {
    CategoryLimitExceeded,
    TotalLimitExceeded,
    LimitCrossingNotified,
    NotificationFailed,
}

impl BudgetWarningKind {
    pub fn level(&self) -> WarningLevel {
        match self {
            BudgetWarningKind::CategoryLimitExceeded => WarningLevel::Warning,
            BudgetWarningKind::TotalLimitExceeded => WarningLevel::Error,
            BudgetWarningKind::LimitCrossingNotified | BudgetWarningKind::NotificationFailed => {
                WarningLevel::Info
            }
        }
    }
}

/// A user-facing budget signal raised by recording an expense.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BudgetWarning {
    pub level: WarningLevel,
    pub kind: BudgetWarningKind,
    pub budget_id: String,
    pub budget_name: String,
    pub message: String,
}

impl BudgetWarning {
    pub fn new(kind: BudgetWarningKind, budget: &Budget, message: String) -> Self {
        Self {
            level: kind.level(),
            kind,
            budget_id: budget.id.clone(),
            budget_name: budget.name.clone(),
            message,
        }
    }
}
