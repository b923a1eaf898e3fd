use async_trait::async_trait;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::errors::Result;
use crate::investments::investments_model::{
    Investment, InvestmentUpdate, InvestmentValuation, NewInvestment,
};
use crate::ledger::LedgerMutation;

/// Trait for investment repository operations
#[async_trait]
pub trait InvestmentRepositoryTrait: Send + Sync {
    fn get_investment(&self, user_id: &str, investment_id: &str) -> Result<Investment>;
    fn list_investments(&self, user_id: &str) -> Result<Vec<Investment>>;

    /// Inserts or replaces the investment and applies `mutations` in the same transaction.
    async fn save_investment(
        &self,
        investment: Investment,
        mutations: Vec<LedgerMutation>,
    ) -> Result<Investment>;

    /// Deletes the investment together with its linked ledger rows.
    async fn delete_investment(&self, user_id: &str, investment_id: &str) -> Result<usize>;

    async fn update_expected_return(
        &self,
        investment_id: &str,
        expected_return: Decimal,
        last_updated: NaiveDateTime,
    ) -> Result<()>;
}

/// Source of expected annual returns per investment type.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Annual return in percent, or `None` when the type has no quote.
    async fn expected_annual_return(&self, investment_type: &str) -> Result<Option<Decimal>>;
}

/// Trait for investment service operations
#[async_trait]
pub trait InvestmentServiceTrait: Send + Sync {
    fn get_investments(&self, user_id: &str) -> Result<Vec<InvestmentValuation>>;
    async fn create_investment(
        &self,
        user_id: &str,
        new_investment: NewInvestment,
    ) -> Result<Investment>;
    async fn update_investment(
        &self,
        user_id: &str,
        investment_id: &str,
        update: InvestmentUpdate,
    ) -> Result<Investment>;
    async fn delete_investment(&self, user_id: &str, investment_id: &str) -> Result<()>;

    /// Refreshes the expected return when it is older than the refresh
    /// interval. Returns whether a new value was stored.
    async fn refresh_if_stale(&self, user_id: &str, investment_id: &str) -> Result<bool>;
}
