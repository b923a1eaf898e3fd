use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::errors::{Error, Result, ValidationError};
use crate::ledger::{CategoryClassifier, EntryKind, LedgerRepositoryTrait};
use crate::utils::decimal_utils::round_money;
use crate::utils::{Clock, UserLocks};

use super::materializer::{MaterializationInput, Materializer};
use super::recurring_model::{
    MaterializationReport, NewRecurringTemplate, RecurringStatus, RecurringTemplate,
    RecurringTemplateUpdate,
};
use super::recurring_traits::{RecurringRepositoryTrait, RecurringServiceTrait};

pub struct RecurringService {
    recurring_repository: Arc<dyn RecurringRepositoryTrait>,
    ledger_repository: Arc<dyn LedgerRepositoryTrait>,
    classifier: Arc<dyn CategoryClassifier>,
    clock: Arc<dyn Clock>,
    locks: Arc<UserLocks>,
}

impl RecurringService {
    pub fn new(
        recurring_repository: Arc<dyn RecurringRepositoryTrait>,
        ledger_repository: Arc<dyn LedgerRepositoryTrait>,
        classifier: Arc<dyn CategoryClassifier>,
        clock: Arc<dyn Clock>,
        locks: Arc<UserLocks>,
    ) -> Self {
        Self {
            recurring_repository,
            ledger_repository,
            classifier,
            clock,
            locks,
        }
    }

    fn validate_schedule(
        label: &str,
        amount: Decimal,
        start_date: chrono::NaiveDate,
        end_date: Option<chrono::NaiveDate>,
    ) -> Result<()> {
        if label.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "label".to_string(),
            )));
        }
        if amount <= Decimal::ZERO {
            return Err(Error::invalid_input("Amount must be greater than zero"));
        }
        if end_date.is_some_and(|end| end < start_date) {
            return Err(Error::invalid_input("End date cannot be before start date"));
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

    fn get_owned_template(
        &self,
        user_id: &str,
        kind: EntryKind,
        template_id: &str,
    ) -> Result<RecurringTemplate> {
        let template = self
            .recurring_repository
            .get_template(user_id, template_id)?;
        if template.kind != kind {
            return Err(Error::NotFound(format!(
                "Recurring {} {} not found",
                kind, template_id
            )));
        }
        Ok(template)
    }

    /// Rejects an income edit that would leave lifetime income below lifetime expense.
    fn guard_income_edit(
        &self,
        user_id: &str,
        template: &RecurringTemplate,
        new_amount: Decimal,
    ) -> Result<()> {
        let stats = self
            .ledger_repository
            .template_entry_stats(EntryKind::Income, &template.id)?;
        let total_income = self.ledger_repository.sum_incomes(user_id, None)?;
        let total_expense = self.ledger_repository.sum_expenses(user_id, None, None)?;

        let projected = total_income - stats.total + Decimal::from(stats.count) * new_amount;
        if projected < total_expense {
            return Err(Error::ConstraintViolation(format!(
                "Editing recurring income {} would drop lifetime income to {} below expenses of {}",
                template.id, projected, total_expense
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RecurringServiceTrait for RecurringService {
    fn get_templates(
        &self,
        user_id: &str,
        kind: Option<EntryKind>,
    ) -> Result<Vec<RecurringTemplate>> {
        self.recurring_repository.list_templates(user_id, kind)
    }

    async fn create_template(
        &self,
        user_id: &str,
        kind: EntryKind,
        new_template: NewRecurringTemplate,
    ) -> Result<RecurringTemplate> {
        Self::validate_schedule(
            &new_template.label,
            new_template.amount,
            new_template.start_date,
            new_template.end_date,
        )?;
        let label = new_template.label.trim().to_string();
        let template = RecurringTemplate {
            id: new_template
                .id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            user_id: user_id.to_string(),
            kind,
            category: self.resolve_category(&new_template.category, &label, kind),
            label,
            amount: round_money(new_template.amount),
            frequency: new_template.frequency,
            start_date: new_template.start_date,
            end_date: new_template.end_date,
            next_due_date: new_template.start_date,
            status: RecurringStatus::Active,
            created_at: self.clock.now().naive_utc(),
        };

        let _guard = self.locks.acquire(user_id).await;
        self.recurring_repository.insert_template(template).await
    }

    async fn update_template(
        &self,
        user_id: &str,
        kind: EntryKind,
        template_id: &str,
        update: RecurringTemplateUpdate,
    ) -> Result<RecurringTemplate> {
        Self::validate_schedule(
            &update.label,
            update.amount,
            update.start_date,
            update.end_date,
        )?;

        let _guard = self.locks.acquire(user_id).await;
        let before = self.get_owned_template(user_id, kind, template_id)?;
        let update = RecurringTemplateUpdate {
            amount: round_money(update.amount),
            category: self.resolve_category(&update.category, &update.label, kind),
            label: update.label.trim().to_string(),
            ..update
        };

        if kind == EntryKind::Income {
            self.guard_income_edit(user_id, &before, update.amount)?;
        }

        let reset = before.requires_reset(&update);
        let mut after = RecurringTemplate {
            label: update.label,
            amount: update.amount,
            category: update.category,
            frequency: update.frequency,
            start_date: update.start_date,
            end_date: update.end_date,
            ..before
        };
        if reset {
            after.next_due_date = after.start_date;
        }
        after.status = if after.is_past_end() {
            RecurringStatus::Inactive
        } else {
            RecurringStatus::Active
        };

        if reset {
            info!(
                "Recurring {} {} rescheduled; regenerating its entries from {}",
                kind, template_id, after.start_date
            );
        }
        self.recurring_repository.save_template(after, reset).await
    }

    async fn delete_template(
        &self,
        user_id: &str,
        kind: EntryKind,
        template_id: &str,
    ) -> Result<()> {
        let _guard = self.locks.acquire(user_id).await;
        self.get_owned_template(user_id, kind, template_id)?;
        self.recurring_repository
            .delete_template(user_id, template_id)
            .await?;
        Ok(())
    }

    async fn materialize(&self, user_id: &str) -> Result<MaterializationReport> {
        let _guard = self.locks.acquire(user_id).await;

        let templates = self.recurring_repository.list_templates(user_id, None)?;
        if templates.is_empty() {
            return Ok(MaterializationReport::default());
        }
        let input = MaterializationInput {
            templates,
            total_income: self.ledger_repository.sum_incomes(user_id, None)?,
            total_expense: self.ledger_repository.sum_expenses(user_id, None, None)?,
            existing: self.ledger_repository.recurring_fingerprints(user_id)?,
        };

        let plan = Materializer::new(self.clock.today()).run(input);
        let report = plan.report.clone();
        if plan.is_empty() {
            debug!("Nothing to materialize for user {}", user_id);
            return Ok(report);
        }

        self.recurring_repository.apply_materialization(plan).await?;
        info!(
            "Materialized {} incomes and {} expenses for user {}",
            report.incomes_created, report.expenses_created, user_id
        );
        Ok(report)
    }
}
