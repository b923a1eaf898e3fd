use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::SqliteConnection;
use rust_decimal::Decimal;

use ledgerly_core::errors::{Error, Result};
use ledgerly_core::goals::{AllocationResult, GoalRepositoryTrait, SavingsGoal, SurplusTracker};

use super::model::{SavingsGoalDB, SurplusTrackerDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{savings_goals, surplus_trackers};
use crate::utils::{chunk_for_sqlite, decimal_to_text, parse_decimal};

pub struct GoalRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl GoalRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        GoalRepository { pool, writer }
    }
}

fn tracker_balance(conn: &mut SqliteConnection, user_id: &str) -> Result<Decimal> {
    let stored = surplus_trackers::table
        .find(user_id)
        .select(surplus_trackers::last_surplus)
        .first::<String>(conn)
        .optional()
        .map_err(StorageError::from)?;
    match stored {
        Some(text) => parse_decimal(&text, "surplus tracker"),
        None => Ok(Decimal::ZERO),
    }
}

fn upsert_tracker(conn: &mut SqliteConnection, user_id: &str, balance: Decimal) -> Result<()> {
    let row = SurplusTrackerDB {
        user_id: user_id.to_string(),
        last_surplus: decimal_to_text(balance),
        updated_at: Utc::now().naive_utc(),
    };
    diesel::insert_into(surplus_trackers::table)
        .values(&row)
        .on_conflict(surplus_trackers::user_id)
        .do_update()
        .set((
            surplus_trackers::last_surplus.eq(&row.last_surplus),
            surplus_trackers::updated_at.eq(row.updated_at),
        ))
        .execute(conn)
        .map_err(StorageError::from)?;
    Ok(())
}

#[async_trait]
impl GoalRepositoryTrait for GoalRepository {
    fn get_goal(&self, user_id: &str, goal_id: &str) -> Result<SavingsGoal> {
        let mut conn = get_connection(&self.pool)?;
        savings_goals::table
            .filter(savings_goals::id.eq(goal_id))
            .filter(savings_goals::user_id.eq(user_id))
            .first::<SavingsGoalDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .ok_or_else(|| Error::NotFound(format!("Savings goal {} not found", goal_id)))
            .and_then(SavingsGoal::try_from)
    }

    fn load_goals(&self, user_id: &str) -> Result<Vec<SavingsGoal>> {
        let mut conn = get_connection(&self.pool)?;
        savings_goals::table
            .filter(savings_goals::user_id.eq(user_id))
            .order((savings_goals::created_at.asc(), savings_goals::id.asc()))
            .load::<SavingsGoalDB>(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(SavingsGoal::try_from)
            .collect()
    }

    fn get_tracker(&self, user_id: &str) -> Result<Option<SurplusTracker>> {
        let mut conn = get_connection(&self.pool)?;
        surplus_trackers::table
            .find(user_id)
            .first::<SurplusTrackerDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .map(SurplusTracker::try_from)
            .transpose()
    }

    async fn insert_goal(&self, goal: SavingsGoal) -> Result<SavingsGoal> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<SavingsGoal> {
                let result_db = diesel::insert_into(savings_goals::table)
                    .values(SavingsGoalDB::from(goal))
                    .returning(SavingsGoalDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                SavingsGoal::try_from(result_db)
            })
            .await
    }

    async fn update_goal(&self, goal: SavingsGoal) -> Result<SavingsGoal> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<SavingsGoal> {
                let goal_db = SavingsGoalDB::from(goal);
                let updated = diesel::update(
                    savings_goals::table
                        .filter(savings_goals::id.eq(&goal_db.id))
                        .filter(savings_goals::user_id.eq(&goal_db.user_id)),
                )
                .set(&goal_db)
                .execute(conn)
                .map_err(StorageError::from)?;
                if updated == 0 {
                    return Err(Error::NotFound(format!(
                        "Savings goal {} not found",
                        goal_db.id
                    )));
                }
                SavingsGoal::try_from(goal_db)
            })
            .await
    }

    async fn save_allocation(&self, user_id: &str, allocation: AllocationResult) -> Result<()> {
        let user_id = user_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                let goal_ids = savings_goals::table
                    .filter(savings_goals::user_id.eq(&user_id))
                    .select(savings_goals::id)
                    .load::<String>(conn)
                    .map_err(StorageError::from)?;
                for goal_id in goal_ids {
                    let amount = allocation.amount_for(&goal_id);
                    diesel::update(savings_goals::table.find(&goal_id))
                        .set(savings_goals::current_amount.eq(decimal_to_text(amount)))
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                upsert_tracker(conn, &user_id, allocation.leftover)
            })
            .await
    }

    async fn delete_goals_with_refund(
        &self,
        user_id: &str,
        goal_ids: Vec<String>,
        refund: Decimal,
    ) -> Result<usize> {
        let user_id = user_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let balance = tracker_balance(conn, &user_id)?;
                upsert_tracker(conn, &user_id, balance + refund)?;

                let mut deleted = 0;
                for chunk in chunk_for_sqlite(&goal_ids) {
                    deleted += diesel::delete(
                        savings_goals::table
                            .filter(savings_goals::user_id.eq(&user_id))
                            .filter(savings_goals::id.eq_any(chunk)),
                    )
                    .execute(conn)
                    .map_err(StorageError::from)?;
                }
                Ok(deleted)
            })
            .await
    }
}
