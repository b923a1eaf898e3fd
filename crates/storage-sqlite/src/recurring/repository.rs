use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::SqliteConnection;
use log::debug;

use ledgerly_core::errors::{Error, Result};
use ledgerly_core::ledger::EntryKind;
use ledgerly_core::recurring::{
    MaterializationPlan, RecurringRepositoryTrait, RecurringTemplate, TemplateChange,
};

use super::model::{RecurringExpenseDB, RecurringIncomeDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::ledger::{insert_expense_row, insert_income_row};
use crate::schema::{expenses, incomes, recurring_expenses, recurring_incomes};

pub struct RecurringRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl RecurringRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        RecurringRepository { pool, writer }
    }

    fn load_kind(
        conn: &mut SqliteConnection,
        user_id: &str,
        kind: EntryKind,
    ) -> Result<Vec<RecurringTemplate>> {
        match kind {
            EntryKind::Income => recurring_incomes::table
                .filter(recurring_incomes::user_id.eq(user_id))
                .load::<RecurringIncomeDB>(conn)
                .map_err(StorageError::from)?
                .into_iter()
                .map(RecurringTemplate::try_from)
                .collect(),
            EntryKind::Expense => recurring_expenses::table
                .filter(recurring_expenses::user_id.eq(user_id))
                .load::<RecurringExpenseDB>(conn)
                .map_err(StorageError::from)?
                .into_iter()
                .map(RecurringTemplate::try_from)
                .collect(),
        }
    }
}

fn purge_generated(conn: &mut SqliteConnection, kind: EntryKind, template_id: &str) -> Result<usize> {
    let purged = match kind {
        EntryKind::Income => {
            diesel::delete(incomes::table.filter(incomes::recurring_id.eq(template_id)))
                .execute(conn)
        }
        EntryKind::Expense => {
            diesel::delete(expenses::table.filter(expenses::recurring_id.eq(template_id)))
                .execute(conn)
        }
    }
    .map_err(StorageError::from)?;
    Ok(purged)
}

fn apply_change(conn: &mut SqliteConnection, change: &TemplateChange) -> Result<usize> {
    let status = change.status.as_str();
    let updated = match change.kind {
        EntryKind::Income => diesel::update(recurring_incomes::table.find(&change.id))
            .set((
                recurring_incomes::next_due_date.eq(change.next_due_date),
                recurring_incomes::status.eq(status),
            ))
            .execute(conn),
        EntryKind::Expense => diesel::update(recurring_expenses::table.find(&change.id))
            .set((
                recurring_expenses::next_due_date.eq(change.next_due_date),
                recurring_expenses::status.eq(status),
            ))
            .execute(conn),
    }
    .map_err(StorageError::from)?;
    Ok(updated)
}

#[async_trait]
impl RecurringRepositoryTrait for RecurringRepository {
    fn get_template(&self, user_id: &str, template_id: &str) -> Result<RecurringTemplate> {
        let mut conn = get_connection(&self.pool)?;
        let income = recurring_incomes::table
            .filter(recurring_incomes::id.eq(template_id))
            .filter(recurring_incomes::user_id.eq(user_id))
            .first::<RecurringIncomeDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        if let Some(row) = income {
            return RecurringTemplate::try_from(row);
        }

        recurring_expenses::table
            .filter(recurring_expenses::id.eq(template_id))
            .filter(recurring_expenses::user_id.eq(user_id))
            .first::<RecurringExpenseDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .ok_or_else(|| {
                Error::NotFound(format!("Recurring template {} not found", template_id))
            })
            .and_then(RecurringTemplate::try_from)
    }

    fn list_templates(
        &self,
        user_id: &str,
        kind: Option<EntryKind>,
    ) -> Result<Vec<RecurringTemplate>> {
        let mut conn = get_connection(&self.pool)?;
        let mut templates = Vec::new();
        for k in [EntryKind::Income, EntryKind::Expense] {
            if kind.map_or(true, |wanted| wanted == k) {
                templates.extend(Self::load_kind(&mut conn, user_id, k)?);
            }
        }
        templates.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(templates)
    }

    async fn insert_template(&self, template: RecurringTemplate) -> Result<RecurringTemplate> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<RecurringTemplate> {
                match template.kind {
                    EntryKind::Income => diesel::insert_into(recurring_incomes::table)
                        .values(RecurringIncomeDB::from(template.clone()))
                        .execute(conn),
                    EntryKind::Expense => diesel::insert_into(recurring_expenses::table)
                        .values(RecurringExpenseDB::from(template.clone()))
                        .execute(conn),
                }
                .map_err(StorageError::from)?;
                Ok(template)
            })
            .await
    }

    async fn save_template(
        &self,
        template: RecurringTemplate,
        purge: bool,
    ) -> Result<RecurringTemplate> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<RecurringTemplate> {
                if purge {
                    let purged = purge_generated(conn, template.kind, &template.id)?;
                    debug!(
                        "Removed {} entries generated by template {}",
                        purged, template.id
                    );
                }
                let updated = match template.kind {
                    EntryKind::Income => {
                        let row = RecurringIncomeDB::from(template.clone());
                        diesel::update(recurring_incomes::table.find(&template.id))
                            .set(&row)
                            .execute(conn)
                    }
                    EntryKind::Expense => {
                        let row = RecurringExpenseDB::from(template.clone());
                        diesel::update(recurring_expenses::table.find(&template.id))
                            .set(&row)
                            .execute(conn)
                    }
                }
                .map_err(StorageError::from)?;
                if updated == 0 {
                    return Err(Error::NotFound(format!(
                        "Recurring template {} not found",
                        template.id
                    )));
                }
                Ok(template)
            })
            .await
    }

    async fn delete_template(&self, user_id: &str, template_id: &str) -> Result<usize> {
        let user_id = user_id.to_string();
        let template_id = template_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let incomes_deleted = diesel::delete(
                    recurring_incomes::table
                        .filter(recurring_incomes::id.eq(&template_id))
                        .filter(recurring_incomes::user_id.eq(&user_id)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                if incomes_deleted > 0 {
                    purge_generated(conn, EntryKind::Income, &template_id)?;
                }

                let expenses_deleted = diesel::delete(
                    recurring_expenses::table
                        .filter(recurring_expenses::id.eq(&template_id))
                        .filter(recurring_expenses::user_id.eq(&user_id)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                if expenses_deleted > 0 {
                    purge_generated(conn, EntryKind::Expense, &template_id)?;
                }
                Ok(incomes_deleted + expenses_deleted)
            })
            .await
    }

    async fn apply_materialization(&self, plan: MaterializationPlan) -> Result<()> {
        if plan.is_empty() {
            return Ok(());
        }
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                let mut skipped = 0;
                for income in plan.new_incomes {
                    if insert_income_row(conn, income)?.is_none() {
                        skipped += 1;
                    }
                }
                for expense in plan.new_expenses {
                    if insert_expense_row(conn, expense)?.is_none() {
                        skipped += 1;
                    }
                }
                for change in &plan.template_changes {
                    apply_change(conn, change)?;
                }
                if skipped > 0 {
                    debug!("Store skipped {} already recorded occurrences", skipped);
                }
                Ok(())
            })
            .await
    }
}
