//! Database models for recurring templates.
//!
//! Income and expense templates share one domain type but live in separate
//! tables so each ledger table can reference its own templates.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;

use ledgerly_core::errors::{Error, Result};
use ledgerly_core::ledger::EntryKind;
use ledgerly_core::recurring::{Frequency, RecurringStatus, RecurringTemplate};

use crate::utils::{decimal_to_text, parse_decimal};

/// Database model for recurring income templates
#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::recurring_incomes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct RecurringIncomeDB {
    pub id: String,
    pub user_id: String,
    pub label: String,
    pub amount: String,
    pub category: String,
    pub frequency: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub next_due_date: NaiveDate,
    pub status: String,
    pub created_at: NaiveDateTime,
}

/// Database model for recurring expense templates
#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::recurring_expenses)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct RecurringExpenseDB {
    pub id: String,
    pub user_id: String,
    pub label: String,
    pub amount: String,
    pub category: String,
    pub frequency: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub next_due_date: NaiveDate,
    pub status: String,
    pub created_at: NaiveDateTime,
}

/// Both template tables convert the same way; only the kind differs.
macro_rules! template_row_conversions {
    ($row:ty, $kind:expr) => {
        impl TryFrom<$row> for RecurringTemplate {
            type Error = Error;

            fn try_from(db: $row) -> Result<Self> {
                Ok(RecurringTemplate {
                    amount: parse_decimal(&db.amount, "template amount")?,
                    frequency: Frequency::from_str(&db.frequency)?,
                    status: RecurringStatus::from_str(&db.status)?,
                    id: db.id,
                    user_id: db.user_id,
                    kind: $kind,
                    label: db.label,
                    category: db.category,
                    start_date: db.start_date,
                    end_date: db.end_date,
                    next_due_date: db.next_due_date,
                    created_at: db.created_at,
                })
            }
        }

        impl From<RecurringTemplate> for $row {
            fn from(t: RecurringTemplate) -> Self {
                Self {
                    id: t.id,
                    user_id: t.user_id,
                    label: t.label,
                    amount: decimal_to_text(t.amount),
                    category: t.category,
                    frequency: t.frequency.as_str().to_string(),
                    start_date: t.start_date,
                    end_date: t.end_date,
                    next_due_date: t.next_due_date,
                    status: t.status.as_str().to_string(),
                    created_at: t.created_at,
                }
            }
        }
    };
}

template_row_conversions!(RecurringIncomeDB, EntryKind::Income);
template_row_conversions!(RecurringExpenseDB, EntryKind::Expense);
