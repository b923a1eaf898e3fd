//! Database models for investments.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use ledgerly_core::errors::{Error, Result};
use ledgerly_core::investments::{Investment, InvestmentStatus};
use ledgerly_core::recurring::Frequency;

use crate::utils::{decimal_to_text, parse_decimal, parse_optional_decimal};

/// Database model for investments
#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::investments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentDB {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub investment_type: String,
    pub amount: String,
    pub expected_return: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub frequency: Option<String>,
    pub status: String,
    pub last_updated: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl TryFrom<InvestmentDB> for Investment {
    type Error = Error;

    fn try_from(db: InvestmentDB) -> Result<Self> {
        Ok(Self {
            amount: parse_decimal(&db.amount, "investment amount")?,
            expected_return: parse_optional_decimal(
                db.expected_return.as_deref(),
                "investment expected return",
            )?,
            frequency: db.frequency.as_deref().map(Frequency::from_str).transpose()?,
            status: InvestmentStatus::from_str(&db.status)?,
            id: db.id,
            user_id: db.user_id,
            name: db.name,
            investment_type: db.investment_type,
            start_date: db.start_date,
            end_date: db.end_date,
            last_updated: db.last_updated,
            created_at: db.created_at,
        })
    }
}

impl From<Investment> for InvestmentDB {
    fn from(investment: Investment) -> Self {
        Self {
            id: investment.id,
            user_id: investment.user_id,
            name: investment.name,
            investment_type: investment.investment_type,
            amount: decimal_to_text(investment.amount),
            expected_return: investment.expected_return.map(decimal_to_text),
            start_date: investment.start_date,
            end_date: investment.end_date,
            frequency: investment.frequency.map(|f| f.as_str().to_string()),
            status: investment.status.as_str().to_string(),
            last_updated: investment.last_updated,
            created_at: investment.created_at,
        }
    }
}
