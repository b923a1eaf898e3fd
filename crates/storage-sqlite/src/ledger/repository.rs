use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::SqliteConnection;
use log::debug;
use rust_decimal::Decimal;

use ledgerly_core::errors::{Error, Result};
use ledgerly_core::ledger::{
    DateRange, EntryFingerprint, EntryKind, Expense, ExpenseUpdate, Income, IncomeUpdate,
    LedgerMutation, LedgerRepositoryTrait, LinkedEntries, NewExpense, NewIncome,
    TemplateEntryStats,
};

use super::model::{ExpenseChangesetDB, ExpenseDB, IncomeChangesetDB, IncomeDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{expenses, incomes};
use crate::utils::{chunk_for_sqlite, parse_decimal, sum_decimals};

pub struct LedgerRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl LedgerRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        LedgerRepository { pool, writer }
    }
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Inserts an income row. An entry generated from a template is skipped when
/// an identical occurrence is already stored, and `None` is returned.
pub(crate) fn insert_income_row(
    conn: &mut SqliteConnection,
    new_income: NewIncome,
) -> Result<Option<Income>> {
    let row = IncomeDB::from_new(new_income, now());
    if let Some(recurring_id) = &row.recurring_id {
        let same_day = incomes::table
            .filter(incomes::recurring_id.eq(recurring_id))
            .filter(incomes::date.eq(row.date))
            .filter(incomes::source.eq(&row.source))
            .filter(incomes::category.eq(&row.category))
            .select(incomes::amount)
            .load::<String>(conn)
            .map_err(StorageError::from)?;
        let amount = parse_decimal(&row.amount, "income amount")?;
        for existing in &same_day {
            if parse_decimal(existing, "income amount")? == amount {
                debug!(
                    "Skipping duplicate occurrence of template {} on {}",
                    recurring_id, row.date
                );
                return Ok(None);
            }
        }
    }

    diesel::insert_into(incomes::table)
        .values(&row)
        .execute(conn)
        .map_err(StorageError::from)?;
    Income::try_from(row).map(Some)
}

/// Expense counterpart of [`insert_income_row`].
pub(crate) fn insert_expense_row(
    conn: &mut SqliteConnection,
    new_expense: NewExpense,
) -> Result<Option<Expense>> {
    let row = ExpenseDB::from_new(new_expense, now());
    if let Some(recurring_id) = &row.recurring_id {
        let same_day = expenses::table
            .filter(expenses::recurring_id.eq(recurring_id))
            .filter(expenses::date.eq(row.date))
            .filter(expenses::name.eq(&row.name))
            .filter(expenses::category.eq(&row.category))
            .select(expenses::amount)
            .load::<String>(conn)
            .map_err(StorageError::from)?;
        let amount = parse_decimal(&row.amount, "expense amount")?;
        for existing in &same_day {
            if parse_decimal(existing, "expense amount")? == amount {
                debug!(
                    "Skipping duplicate occurrence of template {} on {}",
                    recurring_id, row.date
                );
                return Ok(None);
            }
        }
    }

    diesel::insert_into(expenses::table)
        .values(&row)
        .execute(conn)
        .map_err(StorageError::from)?;
    Expense::try_from(row).map(Some)
}

/// Applies one ledger mutation on `conn`. Returns the number of rows touched.
pub(crate) fn apply_mutation(conn: &mut SqliteConnection, mutation: LedgerMutation) -> Result<usize> {
    let touched = match mutation {
        LedgerMutation::CreateIncome(new_income) => {
            usize::from(insert_income_row(conn, new_income)?.is_some())
        }
        LedgerMutation::CreateExpense(new_expense) => {
            usize::from(insert_expense_row(conn, new_expense)?.is_some())
        }
        LedgerMutation::UpdateIncome { id, update } => {
            diesel::update(incomes::table.find(id))
                .set(IncomeChangesetDB::from(update))
                .execute(conn)
                .map_err(StorageError::from)?
        }
        LedgerMutation::UpdateExpense { id, update } => {
            diesel::update(expenses::table.find(id))
                .set(ExpenseChangesetDB::from(update))
                .execute(conn)
                .map_err(StorageError::from)?
        }
        LedgerMutation::DeleteIncome { id } => diesel::delete(incomes::table.find(id))
            .execute(conn)
            .map_err(StorageError::from)?,
        LedgerMutation::DeleteExpense { id } => diesel::delete(expenses::table.find(id))
            .execute(conn)
            .map_err(StorageError::from)?,
    };
    Ok(touched)
}

#[async_trait]
impl LedgerRepositoryTrait for LedgerRepository {
    fn get_income(&self, user_id: &str, income_id: &str) -> Result<Income> {
        let mut conn = get_connection(&self.pool)?;
        incomes::table
            .filter(incomes::id.eq(income_id))
            .filter(incomes::user_id.eq(user_id))
            .first::<IncomeDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .ok_or_else(|| Error::NotFound(format!("Income {} not found", income_id)))
            .and_then(Income::try_from)
    }

    fn get_expense(&self, user_id: &str, expense_id: &str) -> Result<Expense> {
        let mut conn = get_connection(&self.pool)?;
        expenses::table
            .filter(expenses::id.eq(expense_id))
            .filter(expenses::user_id.eq(user_id))
            .first::<ExpenseDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .ok_or_else(|| Error::NotFound(format!("Expense {} not found", expense_id)))
            .and_then(Expense::try_from)
    }

    fn list_incomes(&self, user_id: &str, range: Option<DateRange>) -> Result<Vec<Income>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = incomes::table
            .filter(incomes::user_id.eq(user_id))
            .into_boxed();
        if let Some(range) = range {
            query = query.filter(incomes::date.between(range.start, range.end));
        }
        query
            .order((incomes::date.asc(), incomes::created_at.asc()))
            .load::<IncomeDB>(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(Income::try_from)
            .collect()
    }

    fn list_expenses(&self, user_id: &str, range: Option<DateRange>) -> Result<Vec<Expense>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = expenses::table
            .filter(expenses::user_id.eq(user_id))
            .into_boxed();
        if let Some(range) = range {
            query = query.filter(expenses::date.between(range.start, range.end));
        }
        query
            .order((expenses::date.asc(), expenses::created_at.asc()))
            .load::<ExpenseDB>(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(Expense::try_from)
            .collect()
    }

    fn sum_incomes(&self, user_id: &str, range: Option<DateRange>) -> Result<Decimal> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = incomes::table
            .filter(incomes::user_id.eq(user_id))
            .select(incomes::amount)
            .into_boxed();
        if let Some(range) = range {
            query = query.filter(incomes::date.between(range.start, range.end));
        }
        let amounts = query.load::<String>(&mut conn).map_err(StorageError::from)?;
        sum_decimals(&amounts, "income amount")
    }

    fn sum_expenses(
        &self,
        user_id: &str,
        range: Option<DateRange>,
        category: Option<&str>,
    ) -> Result<Decimal> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = expenses::table
            .filter(expenses::user_id.eq(user_id))
            .select(expenses::amount)
            .into_boxed();
        if let Some(range) = range {
            query = query.filter(expenses::date.between(range.start, range.end));
        }
        if let Some(category) = category {
            query = query.filter(expenses::category.eq(category.to_string()));
        }
        let amounts = query.load::<String>(&mut conn).map_err(StorageError::from)?;
        sum_decimals(&amounts, "expense amount")
    }

    fn first_income_date(&self, user_id: &str) -> Result<Option<NaiveDate>> {
        let mut conn = get_connection(&self.pool)?;
        Ok(incomes::table
            .filter(incomes::user_id.eq(user_id))
            .select(diesel::dsl::min(incomes::date))
            .first::<Option<NaiveDate>>(&mut conn)
            .map_err(StorageError::from)?)
    }

    fn recurring_fingerprints(&self, user_id: &str) -> Result<HashSet<EntryFingerprint>> {
        let mut conn = get_connection(&self.pool)?;
        let mut fingerprints = HashSet::new();

        let generated_incomes = incomes::table
            .filter(incomes::user_id.eq(user_id))
            .filter(incomes::recurring_id.is_not_null())
            .load::<IncomeDB>(&mut conn)
            .map_err(StorageError::from)?;
        for row in generated_incomes {
            if let Some(recurring_id) = row.recurring_id {
                fingerprints.insert(EntryFingerprint {
                    kind: EntryKind::Income,
                    recurring_id,
                    label: row.source,
                    amount: parse_decimal(&row.amount, "income amount")?.normalize(),
                    date: row.date,
                    category: row.category,
                });
            }
        }

        let generated_expenses = expenses::table
            .filter(expenses::user_id.eq(user_id))
            .filter(expenses::recurring_id.is_not_null())
            .load::<ExpenseDB>(&mut conn)
            .map_err(StorageError::from)?;
        for row in generated_expenses {
            if let Some(recurring_id) = row.recurring_id {
                fingerprints.insert(EntryFingerprint {
                    kind: EntryKind::Expense,
                    recurring_id,
                    label: row.name,
                    amount: parse_decimal(&row.amount, "expense amount")?.normalize(),
                    date: row.date,
                    category: row.category,
                });
            }
        }
        Ok(fingerprints)
    }

    fn template_entry_stats(
        &self,
        kind: EntryKind,
        recurring_id: &str,
    ) -> Result<TemplateEntryStats> {
        let mut conn = get_connection(&self.pool)?;
        let amounts = match kind {
            EntryKind::Income => incomes::table
                .filter(incomes::recurring_id.eq(recurring_id))
                .select(incomes::amount)
                .load::<String>(&mut conn),
            EntryKind::Expense => expenses::table
                .filter(expenses::recurring_id.eq(recurring_id))
                .select(expenses::amount)
                .load::<String>(&mut conn),
        }
        .map_err(StorageError::from)?;
        Ok(TemplateEntryStats {
            count: amounts.len(),
            total: sum_decimals(&amounts, "amount")?,
        })
    }

    fn linked_entries(&self, investment_id: &str) -> Result<LinkedEntries> {
        let mut conn = get_connection(&self.pool)?;
        let expense = expenses::table
            .filter(expenses::investment_id.eq(investment_id))
            .first::<ExpenseDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .map(Expense::try_from)
            .transpose()?;
        let income = incomes::table
            .filter(incomes::investment_id.eq(investment_id))
            .first::<IncomeDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .map(Income::try_from)
            .transpose()?;
        Ok(LinkedEntries { expense, income })
    }

    async fn create_income(&self, new_income: NewIncome) -> Result<Income> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Income> {
                insert_income_row(conn, new_income)?.ok_or_else(|| {
                    Error::ConstraintViolation("This occurrence is already recorded".to_string())
                })
            })
            .await
    }

    async fn create_expense(&self, new_expense: NewExpense) -> Result<Expense> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Expense> {
                insert_expense_row(conn, new_expense)?.ok_or_else(|| {
                    Error::ConstraintViolation("This occurrence is already recorded".to_string())
                })
            })
            .await
    }

    async fn update_income(
        &self,
        user_id: &str,
        income_id: &str,
        update: IncomeUpdate,
    ) -> Result<Income> {
        let user_id = user_id.to_string();
        let income_id = income_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Income> {
                let updated = diesel::update(
                    incomes::table
                        .filter(incomes::id.eq(&income_id))
                        .filter(incomes::user_id.eq(&user_id)),
                )
                .set(IncomeChangesetDB::from(update))
                .execute(conn)
                .map_err(StorageError::from)?;
                if updated == 0 {
                    return Err(Error::NotFound(format!("Income {} not found", income_id)));
                }
                let row = incomes::table
                    .find(&income_id)
                    .first::<IncomeDB>(conn)
                    .map_err(StorageError::from)?;
                Income::try_from(row)
            })
            .await
    }

    async fn update_expense(
        &self,
        user_id: &str,
        expense_id: &str,
        update: ExpenseUpdate,
    ) -> Result<Expense> {
        let user_id = user_id.to_string();
        let expense_id = expense_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Expense> {
                let updated = diesel::update(
                    expenses::table
                        .filter(expenses::id.eq(&expense_id))
                        .filter(expenses::user_id.eq(&user_id)),
                )
                .set(ExpenseChangesetDB::from(update))
                .execute(conn)
                .map_err(StorageError::from)?;
                if updated == 0 {
                    return Err(Error::NotFound(format!("Expense {} not found", expense_id)));
                }
                let row = expenses::table
                    .find(&expense_id)
                    .first::<ExpenseDB>(conn)
                    .map_err(StorageError::from)?;
                Expense::try_from(row)
            })
            .await
    }

    async fn delete_incomes(&self, user_id: &str, ids: Vec<String>) -> Result<usize> {
        let user_id = user_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let mut deleted = 0;
                for chunk in chunk_for_sqlite(&ids) {
                    deleted += diesel::delete(
                        incomes::table
                            .filter(incomes::user_id.eq(&user_id))
                            .filter(incomes::id.eq_any(chunk)),
                    )
                    .execute(conn)
                    .map_err(StorageError::from)?;
                }
                Ok(deleted)
            })
            .await
    }

    async fn delete_expenses(&self, user_id: &str, ids: Vec<String>) -> Result<usize> {
        let user_id = user_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let mut deleted = 0;
                for chunk in chunk_for_sqlite(&ids) {
                    deleted += diesel::delete(
                        expenses::table
                            .filter(expenses::user_id.eq(&user_id))
                            .filter(expenses::id.eq_any(chunk)),
                    )
                    .execute(conn)
                    .map_err(StorageError::from)?;
                }
                Ok(deleted)
            })
            .await
    }

    async fn apply_mutations(&self, mutations: Vec<LedgerMutation>) -> Result<usize> {
        if mutations.is_empty() {
            return Ok(0);
        }
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let mut touched = 0;
                for mutation in mutations {
                    touched += apply_mutation(conn, mutation)?;
                }
                Ok(touched)
            })
            .await
    }
}
