//! Database models for savings goals and the surplus tracker.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use ledgerly_core::errors::{Error, Result};
use ledgerly_core::goals::{GoalPriority, SavingsGoal, SurplusTracker};

use crate::utils::{decimal_to_text, parse_decimal};

/// Database model for savings goals
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
#[diesel(table_name = crate::schema::savings_goals)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
#[serde(rename_all = "camelCase")]
pub struct SavingsGoalDB {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub target_amount: String,
    pub current_amount: String,
    pub deadline: Option<NaiveDate>,
    pub priority: String,
    pub created_at: NaiveDateTime,
}

/// Database model for the per-user surplus tracker
#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone, PartialEq,
)]
#[diesel(table_name = crate::schema::surplus_trackers)]
#[diesel(primary_key(user_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SurplusTrackerDB {
    pub user_id: String,
    pub last_surplus: String,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<SavingsGoalDB> for SavingsGoal {
    type Error = Error;

    fn try_from(db: SavingsGoalDB) -> Result<Self> {
        Ok(Self {
            target_amount: parse_decimal(&db.target_amount, "goal target amount")?,
            current_amount: parse_decimal(&db.current_amount, "goal current amount")?,
            priority: GoalPriority::from_str(&db.priority)?,
            id: db.id,
            user_id: db.user_id,
            name: db.name,
            deadline: db.deadline,
            created_at: db.created_at,
        })
    }
}

impl From<SavingsGoal> for SavingsGoalDB {
    fn from(goal: SavingsGoal) -> Self {
        Self {
            id: goal.id,
            user_id: goal.user_id,
            name: goal.name,
            target_amount: decimal_to_text(goal.target_amount),
            current_amount: decimal_to_text(goal.current_amount),
            deadline: goal.deadline,
            priority: goal.priority.as_str().to_string(),
            created_at: goal.created_at,
        }
    }
}

impl TryFrom<SurplusTrackerDB> for SurplusTracker {
    type Error = Error;

    fn try_from(db: SurplusTrackerDB) -> Result<Self> {
        Ok(Self {
            last_surplus: parse_decimal(&db.last_surplus, "surplus tracker")?,
            user_id: db.user_id,
            updated_at: db.updated_at,
        })
    }
}
