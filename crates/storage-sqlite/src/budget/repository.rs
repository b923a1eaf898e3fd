use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::SqliteConnection;

use ledgerly_core::budget::{Budget, BudgetRepositoryTrait};
use ledgerly_core::errors::Result;

use super::model::{BudgetCategoryDB, BudgetDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{budget_categories, budgets};

pub struct BudgetRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl BudgetRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        BudgetRepository { pool, writer }
    }

    /// Attaches category rows to their budgets, keeping the budget order.
    fn with_categories(conn: &mut SqliteConnection, rows: Vec<BudgetDB>) -> Result<Vec<Budget>> {
        let categories = BudgetCategoryDB::belonging_to(&rows)
            .select(BudgetCategoryDB::as_select())
            .order(budget_categories::category.asc())
            .load::<BudgetCategoryDB>(conn)
            .map_err(StorageError::from)?
            .grouped_by(&rows);

        rows.into_iter()
            .zip(categories)
            .map(|(budget, categories)| budget.into_domain(categories))
            .collect()
    }
}

#[async_trait]
impl BudgetRepositoryTrait for BudgetRepository {
    fn list_budgets(&self, user_id: &str) -> Result<Vec<Budget>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = budgets::table
            .filter(budgets::user_id.eq(user_id))
            .order((budgets::start_date.desc(), budgets::created_at.desc()))
            .load::<BudgetDB>(&mut conn)
            .map_err(StorageError::from)?;
        Self::with_categories(&mut conn, rows)
    }

    fn active_budgets_for_category(
        &self,
        user_id: &str,
        category: &str,
        date: NaiveDate,
    ) -> Result<Vec<Budget>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = budgets::table
            .inner_join(budget_categories::table)
            .filter(budgets::user_id.eq(user_id))
            .filter(budgets::start_date.le(date))
            .filter(budgets::end_date.ge(date))
            .filter(budget_categories::category.eq(category))
            .select(BudgetDB::as_select())
            .distinct()
            .order(budgets::created_at.asc())
            .load::<BudgetDB>(&mut conn)
            .map_err(StorageError::from)?;
        Self::with_categories(&mut conn, rows)
    }

    async fn insert_budget(&self, budget: Budget) -> Result<Budget> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Budget> {
                diesel::insert_into(budgets::table)
                    .values(BudgetDB::from(&budget))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                let category_rows: Vec<BudgetCategoryDB> =
                    budget.categories.iter().map(BudgetCategoryDB::from).collect();
                diesel::insert_into(budget_categories::table)
                    .values(&category_rows)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(budget)
            })
            .await
    }

    async fn delete_budget(&self, user_id: &str, budget_id: &str) -> Result<usize> {
        let user_id = user_id.to_string();
        let budget_id = budget_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let owned = budgets::table
                    .filter(budgets::id.eq(&budget_id))
                    .filter(budgets::user_id.eq(&user_id))
                    .count()
                    .get_result::<i64>(conn)
                    .map_err(StorageError::from)?;
                if owned == 0 {
                    return Ok(0);
                }
                diesel::delete(
                    budget_categories::table.filter(budget_categories::budget_id.eq(&budget_id)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                let deleted = diesel::delete(budgets::table.find(&budget_id))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(deleted)
            })
            .await
    }
}
