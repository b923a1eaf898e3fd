use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use log::{debug, warn};
use rust_decimal::Decimal;

use crate::budget::{BudgetServiceTrait, BudgetWarning};
use crate::errors::{Error, Result, ValidationError};
use crate::recurring::{RecurringRepositoryTrait, RecurringStatus};
use crate::surplus::SurplusServiceTrait;
use crate::utils::decimal_utils::round_money;
use crate::utils::time_utils::month_label;
use crate::utils::Clock;

use super::ledger_model::{
    DateRange, EntryKind, Expense, ExpenseOutcome, ExpenseUpdate, ImportRow, ImportSummary, Income,
    IncomeUpdate, LedgerMutation, LedgerSummary, NewExpense, NewIncome,
};
use super::ledger_traits::{CategoryClassifier, LedgerRepositoryTrait, LedgerServiceTrait};

pub struct LedgerService {
    ledger_repository: Arc<dyn LedgerRepositoryTrait>,
    recurring_repository: Arc<dyn RecurringRepositoryTrait>,
    surplus_service: Arc<dyn SurplusServiceTrait>,
    budget_service: Arc<dyn BudgetServiceTrait>,
    classifier: Arc<dyn CategoryClassifier>,
    clock: Arc<dyn Clock>,
}

impl LedgerService {
    pub fn new(
        ledger_repository: Arc<dyn LedgerRepositoryTrait>,
        recurring_repository: Arc<dyn RecurringRepositoryTrait>,
        surplus_service: Arc<dyn SurplusServiceTrait>,
        budget_service: Arc<dyn BudgetServiceTrait>,
        classifier: Arc<dyn CategoryClassifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ledger_repository,
            recurring_repository,
            surplus_service,
            budget_service,
            classifier,
            clock,
        }
    }

    fn validate_entry(label: &str, amount: Decimal) -> Result<()> {
        if label.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "name".to_string(),
            )));
        }
        if amount <= Decimal::ZERO {
            return Err(Error::invalid_input("Amount must be greater than zero"));
        }
        Ok(())
    }

    fn resolve_category(&self, category: &str, label: &str, kind: EntryKind) -> String {
        let trimmed = category.trim();
        if trimmed.is_empty() {
            self.classifier.classify(label, kind)
        } else {
            trimmed.to_string()
        }
    }

    /// Fails with `InsufficientFunds` when the month of `date` cannot absorb `amount`.
    fn ensure_affordable(
        &self,
        user_id: &str,
        date: NaiveDate,
        amount: Decimal,
        credit: Decimal,
    ) -> Result<()> {
        let surplus = self
            .surplus_service
            .monthly_surplus(user_id, date.year(), date.month())?;
        let available = surplus + credit;
        if available < amount {
            return Err(Error::Validation(ValidationError::InsufficientFunds {
                period: month_label(date.year(), date.month()),
                available,
                requested: amount,
            }));
        }
        Ok(())
    }

    async fn warnings_for(&self, user_id: &str, expense: &Expense) -> Vec<BudgetWarning> {
        match self
            .budget_service
            .evaluate_budget_warnings(user_id, expense)
            .await
        {
            Ok(warnings) => warnings,
            Err(e) => {
                warn!(
                    "Budget evaluation failed for expense {} of user {}: {}",
                    expense.id, user_id, e
                );
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl LedgerServiceTrait for LedgerService {
    fn get_incomes(&self, user_id: &str, range: Option<DateRange>) -> Result<Vec<Income>> {
        self.ledger_repository.list_incomes(user_id, range)
    }

    fn get_expenses(&self, user_id: &str, range: Option<DateRange>) -> Result<Vec<Expense>> {
        self.ledger_repository.list_expenses(user_id, range)
    }

    fn summary(&self, user_id: &str) -> Result<LedgerSummary> {
        let total_income = self.ledger_repository.sum_incomes(user_id, None)?;
        let total_expense = self.ledger_repository.sum_expenses(user_id, None, None)?;
        let today = self.clock.today();

        let mut due_recurring_expenses: Vec<_> = self
            .recurring_repository
            .list_templates(user_id, Some(EntryKind::Expense))?
            .into_iter()
            .filter(|t| t.status != RecurringStatus::Inactive && t.next_due_date <= today)
            .collect();
        due_recurring_expenses.sort_by(|a, b| {
            a.next_due_date
                .cmp(&b.next_due_date)
                .then_with(|| a.id.cmp(&b.id))
        });

        Ok(LedgerSummary {
            total_income,
            total_expense,
            balance: total_income - total_expense,
            due_recurring_expenses,
        })
    }

    async fn add_income(&self, user_id: &str, new_income: NewIncome) -> Result<Income> {
        Self::validate_entry(&new_income.source, new_income.amount)?;
        let category =
            self.resolve_category(&new_income.category, &new_income.source, EntryKind::Income);
        let income = NewIncome {
            user_id: user_id.to_string(),
            amount: round_money(new_income.amount),
            category,
            source: new_income.source.trim().to_string(),
            ..new_income
        };
        self.ledger_repository.create_income(income).await
    }

    async fn update_income(
        &self,
        user_id: &str,
        income_id: &str,
        update: IncomeUpdate,
    ) -> Result<Income> {
        Self::validate_entry(&update.source, update.amount)?;
        // Existence and ownership check before touching the row.
        self.ledger_repository.get_income(user_id, income_id)?;
        let category = self.resolve_category(&update.category, &update.source, EntryKind::Income);
        let update = IncomeUpdate {
            amount: round_money(update.amount),
            category,
            ..update
        };
        self.ledger_repository
            .update_income(user_id, income_id, update)
            .await
    }

    async fn delete_incomes(&self, user_id: &str, ids: Vec<String>) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.ledger_repository.delete_incomes(user_id, ids).await
    }

    async fn add_expense(&self, user_id: &str, new_expense: NewExpense) -> Result<ExpenseOutcome> {
        Self::validate_entry(&new_expense.name, new_expense.amount)?;
        let amount = round_money(new_expense.amount);
        self.ensure_affordable(user_id, new_expense.date, amount, Decimal::ZERO)?;

        let category =
            self.resolve_category(&new_expense.category, &new_expense.name, EntryKind::Expense);
        let expense = self
            .ledger_repository
            .create_expense(NewExpense {
                user_id: user_id.to_string(),
                amount,
                category,
                name: new_expense.name.trim().to_string(),
                ..new_expense
            })
            .await?;

        let warnings = self.warnings_for(user_id, &expense).await;
        Ok(ExpenseOutcome { expense, warnings })
    }

    async fn update_expense(
        &self,
        user_id: &str,
        expense_id: &str,
        update: ExpenseUpdate,
    ) -> Result<ExpenseOutcome> {
        Self::validate_entry(&update.name, update.amount)?;
        let existing = self.ledger_repository.get_expense(user_id, expense_id)?;
        let amount = round_money(update.amount);

        // The old amount only frees room in its own month.
        let same_month = existing.date.year() == update.date.year()
            && existing.date.month() == update.date.month();
        let credit = if same_month {
            existing.amount
        } else {
            Decimal::ZERO
        };
        self.ensure_affordable(user_id, update.date, amount, credit)?;

        let category = self.resolve_category(&update.category, &update.name, EntryKind::Expense);
        let expense = self
            .ledger_repository
            .update_expense(
                user_id,
                expense_id,
                ExpenseUpdate {
                    amount,
                    category,
                    ..update
                },
            )
            .await?;

        let warnings = self.warnings_for(user_id, &expense).await;
        Ok(ExpenseOutcome { expense, warnings })
    }

    async fn delete_expenses(&self, user_id: &str, ids: Vec<String>) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.ledger_repository.delete_expenses(user_id, ids).await
    }

    async fn import_entries(&self, user_id: &str, mut rows: Vec<ImportRow>) -> Result<ImportSummary> {
        // Incomes first, so an expense may draw on income anywhere in the same batch.
        rows.sort_by_key(|row| row.kind != EntryKind::Income);

        let mut summary = ImportSummary::default();
        let mut mutations = Vec::new();
        let mut categories = BTreeSet::new();
        // Per-month running adjustment from rows accepted earlier in this import.
        let mut month_delta: HashMap<(i32, u32), Decimal> = HashMap::new();
        let mut spent_by_category: HashMap<String, Vec<(NaiveDate, Decimal)>> = HashMap::new();

        for row in rows {
            let (date, amount) = match (row.date, row.amount) {
                (Some(date), Some(amount)) if amount > Decimal::ZERO => (date, round_money(amount)),
                _ => {
                    summary.skipped += 1;
                    continue;
                }
            };
            let label = row.label.trim().to_string();
            if label.is_empty() {
                summary.skipped += 1;
                continue;
            }
            let category = self.resolve_category(
                row.category.as_deref().unwrap_or_default(),
                &label,
                row.kind,
            );
            let key = (date.year(), date.month());

            match row.kind {
                EntryKind::Income => {
                    *month_delta.entry(key).or_default() += amount;
                    mutations.push(LedgerMutation::CreateIncome(NewIncome {
                        id: None,
                        user_id: user_id.to_string(),
                        date,
                        amount,
                        category: category.clone(),
                        source: label,
                        recurring_id: None,
                        investment_id: None,
                    }));
                    summary.imported_incomes += 1;
                }
                EntryKind::Expense => {
                    let surplus = self
                        .surplus_service
                        .monthly_surplus(user_id, key.0, key.1)?;
                    let delta = month_delta.get(&key).copied().unwrap_or_default();
                    if surplus + delta < amount {
                        debug!(
                            "Skipping imported expense '{}' ({}): month {} cannot absorb it",
                            label,
                            amount,
                            month_label(key.0, key.1)
                        );
                        summary.skipped += 1;
                        continue;
                    }
                    *month_delta.entry(key).or_default() -= amount;
                    spent_by_category
                        .entry(category.clone())
                        .or_default()
                        .push((date, amount));
                    mutations.push(LedgerMutation::CreateExpense(NewExpense {
                        id: None,
                        user_id: user_id.to_string(),
                        date,
                        amount,
                        category: category.clone(),
                        name: label,
                        recurring_id: None,
                        investment_id: None,
                    }));
                    summary.imported_expenses += 1;
                }
            }
            categories.insert(category);
        }

        if !mutations.is_empty() {
            self.ledger_repository.apply_mutations(mutations).await?;
        }

        for (category, spends) in spent_by_category {
            match self
                .budget_service
                .evaluate_category(user_id, &category, &spends)
                .await
            {
                Ok(warnings) => {
                    for warning in warnings {
                        if !summary.warnings.iter().any(|w| w.message == warning.message) {
                            summary.warnings.push(warning);
                        }
                    }
                }
                Err(e) => warn!(
                    "Budget evaluation failed for imported category {} of user {}: {}",
                    category, user_id, e
                ),
            }
        }

        summary.categories = categories.into_iter().collect();
        Ok(summary)
    }
}
