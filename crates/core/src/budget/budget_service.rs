use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use log::{info, warn};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::errors::{Error, Result, ValidationError};
use crate::ledger::{DateRange, Expense, LedgerRepositoryTrait};
use crate::utils::decimal_utils::round_money;
use crate::utils::Clock;

use super::budget_model::{
    Budget, BudgetCategory, BudgetStatus, BudgetWarning, BudgetWarningKind, CategorySpending,
    NewBudget,
};
use super::budget_traits::{BudgetRepositoryTrait, BudgetServiceTrait, NotificationSink};

pub struct BudgetService {
    budget_repository: Arc<dyn BudgetRepositoryTrait>,
    ledger_repository: Arc<dyn LedgerRepositoryTrait>,
    notifier: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
}

impl BudgetService {
    pub fn new(
        budget_repository: Arc<dyn BudgetRepositoryTrait>,
        ledger_repository: Arc<dyn LedgerRepositoryTrait>,
        notifier: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            budget_repository,
            ledger_repository,
            notifier,
            clock,
        }
    }

    fn validate(new_budget: &NewBudget) -> Result<()> {
        if new_budget.name.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "name".to_string(),
            )));
        }
        if new_budget.total_amount <= Decimal::ZERO {
            return Err(Error::invalid_input("Budget total must be greater than zero"));
        }
        if new_budget.end_date < new_budget.start_date {
            return Err(Error::invalid_input("End date cannot be before start date"));
        }

        let mut seen = HashSet::new();
        let mut allotted = Decimal::ZERO;
        for category in &new_budget.categories {
            let name = category.category.trim();
            if name.is_empty() {
                return Err(Error::Validation(ValidationError::MissingField(
                    "category".to_string(),
                )));
            }
            if category.percentage <= Decimal::ZERO || category.percentage > Decimal::ONE_HUNDRED
            {
                return Err(Error::invalid_input(format!(
                    "Percentage for '{}' must be within (0, 100]",
                    name
                )));
            }
            if !seen.insert(name.to_string()) {
                return Err(Error::invalid_input(format!(
                    "Category '{}' appears more than once",
                    name
                )));
            }
            allotted += category.percentage;
        }
        if allotted > Decimal::ONE_HUNDRED {
            return Err(Error::invalid_input(format!(
                "Category percentages add up to {}%",
                allotted
            )));
        }
        Ok(())
    }

    fn category_spent(&self, user_id: &str, budget: &Budget, category: &str) -> Result<Decimal> {
        self.ledger_repository.sum_expenses(
            user_id,
            Some(DateRange::new(budget.start_date, budget.end_date)),
            Some(category),
        )
    }

    fn status_of(&self, user_id: &str, budget: Budget) -> Result<BudgetStatus> {
        let mut categories = Vec::with_capacity(budget.categories.len());
        for category in &budget.categories {
            categories.push(CategorySpending {
                category: category.category.clone(),
                limit: category.limit_amount(budget.total_amount),
                spent: self.category_spent(user_id, &budget, &category.category)?,
            });
        }
        let total_spent: Decimal = categories.iter().map(|c| c.spent).sum();
        Ok(BudgetStatus {
            budget,
            categories,
            total_spent,
        })
    }

    async fn alert_crossing(
        &self,
        user_id: &str,
        budget: &Budget,
        category: &str,
        amount: Decimal,
        previous_total: Decimal,
        total_spent: Decimal,
    ) -> BudgetWarning {
        let subject = format!("Budget '{}' Exceeded", budget.name);
        let body = format!(
            "Your budget \"{}\" has now exceeded its spending limit.\n\n\
             Budget Limit: {}\nPrevious Total: {}\nNew Expense: {} (Category: {})\nCurrent Total: {}",
            budget.name, budget.total_amount, previous_total, amount, category, total_spent
        );

        match self.notifier.notify(user_id, &subject, &body).await {
            Ok(()) => {
                info!("Sent budget alert for budget {} to user {}", budget.id, user_id);
                BudgetWarning::new(
                    BudgetWarningKind::LimitCrossingNotified,
                    budget,
                    format!("Budget '{}' exceeded; an alert was sent.", budget.name),
                )
            }
            Err(e) => {
                warn!(
                    "Failed to send budget alert for budget {} to user {}: {}",
                    budget.id, user_id, e
                );
                BudgetWarning::new(
                    BudgetWarningKind::NotificationFailed,
                    budget,
                    format!("Budget '{}' exceeded; failed to send the alert.", budget.name),
                )
            }
        }
    }
}

#[async_trait]
impl BudgetServiceTrait for BudgetService {
    fn get_budgets(&self, user_id: &str) -> Result<Vec<BudgetStatus>> {
        self.budget_repository
            .list_budgets(user_id)?
            .into_iter()
            .map(|budget| self.status_of(user_id, budget))
            .collect()
    }

    async fn create_budget(&self, user_id: &str, new_budget: NewBudget) -> Result<Budget> {
        Self::validate(&new_budget)?;
        let id = new_budget.id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let categories = new_budget
            .categories
            .into_iter()
            .map(|c| BudgetCategory {
                id: Uuid::new_v4().to_string(),
                budget_id: id.clone(),
                category: c.category.trim().to_string(),
                percentage: c.percentage,
            })
            .collect();
        let budget = Budget {
            id,
            user_id: user_id.to_string(),
            name: new_budget.name.trim().to_string(),
            total_amount: round_money(new_budget.total_amount),
            start_date: new_budget.start_date,
            end_date: new_budget.end_date,
            categories,
            created_at: self.clock.now().naive_utc(),
        };
        self.budget_repository.insert_budget(budget).await
    }

    async fn delete_budget(&self, user_id: &str, budget_id: &str) -> Result<()> {
        let deleted = self
            .budget_repository
            .delete_budget(user_id, budget_id)
            .await?;
        if deleted == 0 {
            return Err(Error::NotFound(format!("Budget {} not found", budget_id)));
        }
        Ok(())
    }

    async fn evaluate_budget_warnings(
        &self,
        user_id: &str,
        expense: &Expense,
    ) -> Result<Vec<BudgetWarning>> {
        self.evaluate_category(user_id, &expense.category, &[(expense.date, expense.amount)])
            .await
    }

    async fn evaluate_category(
        &self,
        user_id: &str,
        category: &str,
        spends: &[(NaiveDate, Decimal)],
    ) -> Result<Vec<BudgetWarning>> {
        let today = self.clock.today();
        let budgets = self
            .budget_repository
            .active_budgets_for_category(user_id, category, today)?;

        let mut warnings = Vec::new();
        for budget in budgets {
            let Some(budget_category) = budget.category(category) else {
                continue;
            };
            let amount: Decimal = spends
                .iter()
                .filter(|(date, _)| budget.is_active_on(*date))
                .map(|(_, amount)| *amount)
                .sum();
            if amount.is_zero() {
                continue;
            }

            let spent = self.category_spent(user_id, &budget, category)?;
            let limit = budget_category.limit_amount(budget.total_amount);
            if spent > limit {
                warnings.push(BudgetWarning::new(
                    BudgetWarningKind::CategoryLimitExceeded,
                    &budget,
                    format!(
                        "You have exceeded the limit for category '{}' in budget '{}'. Spent: {}, Limit: {}",
                        category, budget.name, spent, limit
                    ),
                ));
            }

            let mut total_spent = Decimal::ZERO;
            for c in &budget.categories {
                total_spent += self.category_spent(user_id, &budget, &c.category)?;
            }
            let total_limit = budget.total_amount;
            if total_spent > total_limit {
                warnings.push(BudgetWarning::new(
                    BudgetWarningKind::TotalLimitExceeded,
                    &budget,
                    format!(
                        "Your total spending ({}) exceeded the budget '{}' limit ({})!",
                        total_spent, budget.name, total_limit
                    ),
                ));
            }

            let previous_total = (total_spent - amount).max(Decimal::ZERO);
            if previous_total <= total_limit && total_spent > total_limit {
                let warning = self
                    .alert_crossing(user_id, &budget, category, amount, previous_total, total_spent)
                    .await;
                warnings.push(warning);
            }
        }
        Ok(warnings)
    }
}
