use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, Months, NaiveDate};
use log::{debug, info};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::constants::MAX_DISPLAY_YEARS;
use crate::errors::{Error, Result, ValidationError};
use crate::surplus::SurplusServiceTrait;
use crate::utils::decimal_utils::{percent_of, round_money};
use crate::utils::{Clock, UserLocks};

use super::allocation::{allocate, reallocation_candidates, rollover_candidates};
use super::goals_model::{
    GoalDeletion, GoalFilter, GoalOutlook, GoalsOverview, NewSavingsGoal, OutlookDeadline,
    OutlookProbability, RolloverBalances, SavingsGoal, SavingsGoalUpdate,
};
use super::goals_traits::{GoalProbabilityPredictor, GoalRepositoryTrait, GoalServiceTrait};

const NOT_APPLICABLE: &str = "--";
const DEADLINE_PASSED: &str = "Deadline passed, please extend the deadline";
const DEADLINE_THIS_MONTH: &str = "Unable to meet deadline this month";
const BEYOND_DISPLAY_HORIZON: &str = "More than 30 years";

pub struct GoalService {
    goal_repository: Arc<dyn GoalRepositoryTrait>,
    surplus_service: Arc<dyn SurplusServiceTrait>,
    predictor: Arc<dyn GoalProbabilityPredictor>,
    clock: Arc<dyn Clock>,
    locks: Arc<UserLocks>,
}

impl GoalService {
    pub fn new(
        goal_repository: Arc<dyn GoalRepositoryTrait>,
        surplus_service: Arc<dyn SurplusServiceTrait>,
        predictor: Arc<dyn GoalProbabilityPredictor>,
        clock: Arc<dyn Clock>,
        locks: Arc<UserLocks>,
    ) -> Self {
        Self {
            goal_repository,
            surplus_service,
            predictor,
            clock,
            locks,
        }
    }

    fn validate_goal(name: &str, target_amount: Decimal) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "name".to_string(),
            )));
        }
        if target_amount <= Decimal::ZERO {
            return Err(Error::invalid_input("Target amount must be greater than zero"));
        }
        Ok(())
    }

    fn current_month_surplus(&self, user_id: &str, today: NaiveDate) -> Result<Decimal> {
        self.surplus_service
            .monthly_surplus(user_id, today.year(), today.month())
    }

    /// Rollover body; the caller holds the user's lock.
    async fn rollover_locked(&self, user_id: &str) -> Result<RolloverBalances> {
        let today = self.clock.today();
        let accumulated = self.surplus_service.accumulated_surplus(user_id, today)?;
        let goals = self.goal_repository.load_goals(user_id)?;

        let result = allocate(&rollover_candidates(&goals, today), accumulated);
        let balances = RolloverBalances {
            accumulated_balance: accumulated,
            allocated_balance: result.allocated(),
            unallocated_balance: result.leftover,
            current_balance: self.current_month_surplus(user_id, today)?,
        };
        self.goal_repository.save_allocation(user_id, result).await?;

        debug!(
            "Rollover for user {}: accumulated {}, allocated {}, unallocated {}",
            user_id,
            balances.accumulated_balance,
            balances.allocated_balance,
            balances.unallocated_balance
        );
        Ok(balances)
    }

    /// Reallocation body; the caller holds the user's lock.
    async fn reallocate_locked(&self, user_id: &str) -> Result<RolloverBalances> {
        let today = self.clock.today();
        let goals = self.goal_repository.load_goals(user_id)?;
        let tracked = self
            .goal_repository
            .get_tracker(user_id)?
            .map(|t| t.last_surplus)
            .unwrap_or(Decimal::ZERO);
        let pool = tracked + goals.iter().map(|g| g.current_amount).sum::<Decimal>();

        let result = allocate(&reallocation_candidates(&goals), pool);
        let balances = RolloverBalances {
            accumulated_balance: pool,
            allocated_balance: result.allocated(),
            unallocated_balance: result.leftover,
            current_balance: self.current_month_surplus(user_id, today)?,
        };
        self.goal_repository.save_allocation(user_id, result).await?;
        Ok(balances)
    }

    fn format_suggestion(suggested: Option<NaiveDate>, today: NaiveDate) -> OutlookDeadline {
        match suggested {
            None => OutlookDeadline::Note(NOT_APPLICABLE.to_string()),
            Some(date) => {
                let horizon = today.checked_add_months(Months::new(MAX_DISPLAY_YEARS * 12));
                if horizon.is_some_and(|h| date > h) {
                    OutlookDeadline::Note(BEYOND_DISPLAY_HORIZON.to_string())
                } else {
                    OutlookDeadline::Date(date)
                }
            }
        }
    }
}

#[async_trait]
impl GoalServiceTrait for GoalService {
    fn get_goals(&self, user_id: &str) -> Result<Vec<SavingsGoal>> {
        self.goal_repository.load_goals(user_id)
    }

    async fn create_goal(&self, user_id: &str, new_goal: NewSavingsGoal) -> Result<SavingsGoal> {
        Self::validate_goal(&new_goal.name, new_goal.target_amount)?;
        let goal = SavingsGoal {
            id: new_goal.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            user_id: user_id.to_string(),
            name: new_goal.name.trim().to_string(),
            target_amount: round_money(new_goal.target_amount),
            current_amount: Decimal::ZERO,
            deadline: new_goal.deadline,
            priority: new_goal.priority,
            created_at: self.clock.now().naive_utc(),
        };

        let _guard = self.locks.acquire(user_id).await;
        let created = self.goal_repository.insert_goal(goal).await?;
        self.reallocate_locked(user_id).await?;
        info!("Created savings goal {} for user {}", created.id, user_id);
        self.goal_repository.get_goal(user_id, &created.id)
    }

    async fn update_goal(
        &self,
        user_id: &str,
        goal_id: &str,
        update: SavingsGoalUpdate,
    ) -> Result<SavingsGoal> {
        Self::validate_goal(&update.name, update.target_amount)?;

        let _guard = self.locks.acquire(user_id).await;
        let existing = self.goal_repository.get_goal(user_id, goal_id)?;
        let goal = SavingsGoal {
            name: update.name.trim().to_string(),
            target_amount: round_money(update.target_amount),
            deadline: update.deadline,
            priority: update.priority,
            ..existing
        };
        self.goal_repository.update_goal(goal).await?;
        self.reallocate_locked(user_id).await?;
        self.goal_repository.get_goal(user_id, goal_id)
    }

    async fn rollover(&self, user_id: &str) -> Result<RolloverBalances> {
        let _guard = self.locks.acquire(user_id).await;
        self.rollover_locked(user_id).await
    }

    async fn reallocate_on_new_goal(&self, user_id: &str) -> Result<RolloverBalances> {
        let _guard = self.locks.acquire(user_id).await;
        self.reallocate_locked(user_id).await
    }

    async fn delete_goals_with_refund(
        &self,
        user_id: &str,
        goal_ids: Vec<String>,
    ) -> Result<GoalDeletion> {
        let _guard = self.locks.acquire(user_id).await;
        let wanted: HashSet<&str> = goal_ids.iter().map(String::as_str).collect();
        let selected: Vec<SavingsGoal> = self
            .goal_repository
            .load_goals(user_id)?
            .into_iter()
            .filter(|g| wanted.contains(g.id.as_str()))
            .collect();
        if selected.is_empty() {
            return Ok(GoalDeletion::default());
        }

        let refund: Decimal = selected.iter().map(|g| g.current_amount).sum();
        let ids = selected.into_iter().map(|g| g.id).collect();
        let deleted = self
            .goal_repository
            .delete_goals_with_refund(user_id, ids, refund)
            .await?;
        info!(
            "Deleted {} goals for user {}, refunded {} to the tracker",
            deleted, user_id, refund
        );
        Ok(GoalDeletion {
            deleted,
            refunded: refund,
        })
    }

    async fn goals_overview(&self, user_id: &str, filter: GoalFilter) -> Result<GoalsOverview> {
        let _guard = self.locks.acquire(user_id).await;
        let balances = self.rollover_locked(user_id).await?;

        let mut goals: Vec<SavingsGoal> = self
            .goal_repository
            .load_goals(user_id)?
            .into_iter()
            .filter(|g| filter.accepts(g))
            .collect();
        goals.sort_by(|a, b| {
            let key = |g: &SavingsGoal| g.deadline.unwrap_or(NaiveDate::MAX);
            key(a).cmp(&key(b)).then_with(|| a.id.cmp(&b.id))
        });

        let total_target: Decimal = goals.iter().map(|g| g.target_amount).sum();
        let total_current: Decimal = goals.iter().map(|g| g.current_amount).sum();
        Ok(GoalsOverview {
            balances,
            overall_progress: percent_of(total_current, total_target),
            goals,
            total_target,
            total_current,
        })
    }

    fn goal_outlook(&self, user_id: &str, goal_id: &str) -> Result<GoalOutlook> {
        let goal = self.goal_repository.get_goal(user_id, goal_id)?;
        let today = self.clock.today();
        let outlook = |probability, suggested_deadline| GoalOutlook {
            goal_id: goal.id.clone(),
            probability,
            suggested_deadline,
        };

        if goal.is_completed() {
            return Ok(outlook(
                OutlookProbability::Note(NOT_APPLICABLE.to_string()),
                OutlookDeadline::Note(NOT_APPLICABLE.to_string()),
            ));
        }

        if let Some(deadline) = goal.deadline {
            if deadline < today {
                return Ok(outlook(
                    OutlookProbability::Note(DEADLINE_PASSED.to_string()),
                    Self::format_suggestion(Some(deadline), today),
                ));
            }
            if deadline.year() == today.year() && deadline.month() == today.month() {
                let prediction = self.predictor.predict(&goal, today)?;
                return Ok(outlook(
                    OutlookProbability::Note(DEADLINE_THIS_MONTH.to_string()),
                    Self::format_suggestion(prediction.suggested_deadline, today),
                ));
            }
        }

        let prediction = self.predictor.predict(&goal, today)?;
        let probability = prediction
            .probability
            .map(|p| round_money(p.min(Decimal::ONE_HUNDRED)))
            .unwrap_or(Decimal::ZERO);
        Ok(outlook(
            OutlookProbability::Percent(probability),
            Self::format_suggestion(prediction.suggested_deadline, today),
        ))
    }
}
