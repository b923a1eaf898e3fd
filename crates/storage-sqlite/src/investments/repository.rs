use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::SqliteConnection;
use log::debug;
use rust_decimal::Decimal;

use ledgerly_core::errors::{Error, Result};
use ledgerly_core::investments::{Investment, InvestmentRepositoryTrait};
use ledgerly_core::ledger::LedgerMutation;

use super::model::InvestmentDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::ledger::apply_mutation;
use crate::schema::{expenses, incomes, investments};
use crate::utils::decimal_to_text;

pub struct InvestmentRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl InvestmentRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        InvestmentRepository { pool, writer }
    }
}

#[async_trait]
impl InvestmentRepositoryTrait for InvestmentRepository {
    fn get_investment(&self, user_id: &str, investment_id: &str) -> Result<Investment> {
        let mut conn = get_connection(&self.pool)?;
        investments::table
            .filter(investments::id.eq(investment_id))
            .filter(investments::user_id.eq(user_id))
            .first::<InvestmentDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .ok_or_else(|| Error::NotFound(format!("Investment {} not found", investment_id)))
            .and_then(Investment::try_from)
    }

    fn list_investments(&self, user_id: &str) -> Result<Vec<Investment>> {
        let mut conn = get_connection(&self.pool)?;
        investments::table
            .filter(investments::user_id.eq(user_id))
            .order((investments::created_at.desc(), investments::id.asc()))
            .load::<InvestmentDB>(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(Investment::try_from)
            .collect()
    }

    async fn save_investment(
        &self,
        investment: Investment,
        mutations: Vec<LedgerMutation>,
    ) -> Result<Investment> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Investment> {
                let row = InvestmentDB::from(investment);
                let saved = diesel::insert_into(investments::table)
                    .values(&row)
                    .on_conflict(investments::id)
                    .do_update()
                    .set(&row)
                    .returning(InvestmentDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;

                let mut touched = 0;
                for mutation in mutations {
                    touched += apply_mutation(conn, mutation)?;
                }
                debug!("Investment {} saved, {} ledger rows touched", saved.id, touched);
                Investment::try_from(saved)
            })
            .await
    }

    async fn delete_investment(&self, user_id: &str, investment_id: &str) -> Result<usize> {
        let user_id = user_id.to_string();
        let investment_id = investment_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let deleted = diesel::delete(
                    investments::table
                        .filter(investments::id.eq(&investment_id))
                        .filter(investments::user_id.eq(&user_id)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                if deleted == 0 {
                    return Ok(0);
                }
                diesel::delete(incomes::table.filter(incomes::investment_id.eq(&investment_id)))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                diesel::delete(expenses::table.filter(expenses::investment_id.eq(&investment_id)))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(deleted)
            })
            .await
    }

    async fn update_expected_return(
        &self,
        investment_id: &str,
        expected_return: Decimal,
        last_updated: NaiveDateTime,
    ) -> Result<()> {
        let investment_id = investment_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                let updated = diesel::update(investments::table.find(&investment_id))
                    .set((
                        investments::expected_return.eq(Some(decimal_to_text(expected_return))),
                        investments::last_updated.eq(Some(last_updated)),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if updated == 0 {
                    return Err(Error::NotFound(format!(
                        "Investment {} not found",
                        investment_id
                    )));
                }
                Ok(())
            })
            .await
    }
}
