use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use log::{error, info, warn};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::constants::RATE_REFRESH_INTERVAL_SECONDS;
use crate::errors::{Error, Result, ValidationError};
use crate::ledger::LedgerRepositoryTrait;
use crate::utils::decimal_utils::round_money;
use crate::utils::Clock;

use super::investments_model::{Investment, InvestmentUpdate, InvestmentValuation, NewInvestment};
use super::investments_traits::{InvestmentRepositoryTrait, InvestmentServiceTrait, RateProvider};
use super::sync::plan_investment_sync;
use super::valuation::estimated_value;

pub struct InvestmentService {
    investment_repository: Arc<dyn InvestmentRepositoryTrait>,
    ledger_repository: Arc<dyn LedgerRepositoryTrait>,
    rate_provider: Arc<dyn RateProvider>,
    clock: Arc<dyn Clock>,
}

impl InvestmentService {
    pub fn new(
        investment_repository: Arc<dyn InvestmentRepositoryTrait>,
        ledger_repository: Arc<dyn LedgerRepositoryTrait>,
        rate_provider: Arc<dyn RateProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            investment_repository,
            ledger_repository,
            rate_provider,
            clock,
        }
    }

    fn validate(investment: &InvestmentUpdate) -> Result<()> {
        if investment.name.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "name".to_string(),
            )));
        }
        if investment.amount <= Decimal::ZERO {
            return Err(Error::invalid_input("Amount must be greater than zero"));
        }
        if let (Some(start), Some(end)) = (investment.start_date, investment.end_date) {
            if end < start {
                return Err(Error::invalid_input("End date cannot be before start date"));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl InvestmentServiceTrait for InvestmentService {
    fn get_investments(&self, user_id: &str) -> Result<Vec<InvestmentValuation>> {
        Ok(self
            .investment_repository
            .list_investments(user_id)?
            .into_iter()
            .map(|investment| InvestmentValuation {
                estimated_value: estimated_value(&investment),
                investment,
            })
            .collect())
    }

    async fn create_investment(
        &self,
        user_id: &str,
        new_investment: NewInvestment,
    ) -> Result<Investment> {
        let fields = InvestmentUpdate {
            name: new_investment.name.trim().to_string(),
            investment_type: new_investment.investment_type.trim().to_string(),
            amount: round_money(new_investment.amount),
            expected_return: new_investment.expected_return,
            start_date: new_investment.start_date,
            end_date: new_investment.end_date,
            frequency: new_investment.frequency,
            status: new_investment.status,
        };
        Self::validate(&fields)?;

        let now = self.clock.now().naive_utc();
        let investment = Investment {
            id: new_investment
                .id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            user_id: user_id.to_string(),
            name: fields.name,
            investment_type: fields.investment_type,
            amount: fields.amount,
            expected_return: fields.expected_return,
            start_date: fields.start_date,
            end_date: fields.end_date,
            frequency: fields.frequency,
            status: fields.status,
            last_updated: fields.expected_return.map(|_| now),
            created_at: now,
        };
        let mutations =
            plan_investment_sync(None, &investment, &Default::default(), self.clock.today());
        self.investment_repository
            .save_investment(investment, mutations)
            .await
    }

    async fn update_investment(
        &self,
        user_id: &str,
        investment_id: &str,
        update: InvestmentUpdate,
    ) -> Result<Investment> {
        let update = InvestmentUpdate {
            name: update.name.trim().to_string(),
            amount: round_money(update.amount),
            ..update
        };
        Self::validate(&update)?;

        let before = self
            .investment_repository
            .get_investment(user_id, investment_id)?;
        let last_updated = if update.expected_return != before.expected_return {
            Some(self.clock.now().naive_utc())
        } else {
            before.last_updated
        };
        let after = Investment {
            name: update.name,
            investment_type: update.investment_type.trim().to_string(),
            amount: update.amount,
            expected_return: update.expected_return,
            start_date: update.start_date,
            end_date: update.end_date,
            frequency: update.frequency,
            status: update.status,
            last_updated,
            ..before.clone()
        };

        let linked = self.ledger_repository.linked_entries(investment_id)?;
        let mutations = plan_investment_sync(Some(&before), &after, &linked, self.clock.today());
        self.investment_repository
            .save_investment(after, mutations)
            .await
    }

    async fn delete_investment(&self, user_id: &str, investment_id: &str) -> Result<()> {
        let deleted = self
            .investment_repository
            .delete_investment(user_id, investment_id)
            .await?;
        if deleted == 0 {
            return Err(Error::NotFound(format!(
                "Investment {} not found",
                investment_id
            )));
        }
        Ok(())
    }

    async fn refresh_if_stale(&self, user_id: &str, investment_id: &str) -> Result<bool> {
        let investment = self
            .investment_repository
            .get_investment(user_id, investment_id)?;
        if investment.is_completed() {
            return Ok(false);
        }

        let now = self.clock.now().naive_utc();
        let fresh = investment
            .last_updated
            .is_some_and(|at| now - at <= Duration::seconds(RATE_REFRESH_INTERVAL_SECONDS));
        if fresh {
            return Ok(false);
        }

        match self
            .rate_provider
            .expected_annual_return(&investment.investment_type)
            .await
        {
            Ok(Some(rate)) => {
                self.investment_repository
                    .update_expected_return(investment_id, rate, now)
                    .await?;
                info!(
                    "Refreshed expected return for {} ({}) to {}%",
                    investment.name, investment.investment_type, rate
                );
                Ok(true)
            }
            Ok(None) => {
                warn!(
                    "No expected return available for {} ({})",
                    investment.name, investment.investment_type
                );
                Ok(false)
            }
            Err(e) => {
                error!(
                    "Expected return refresh failed for {}: {}",
                    investment.name, e
                );
                Ok(false)
            }
        }
    }
}
