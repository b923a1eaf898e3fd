use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::errors::Result;
use crate::goals::goals_model::{
    AllocationResult, GoalDeletion, GoalFilter, GoalOutlook, GoalPrediction, GoalsOverview,
    NewSavingsGoal, RolloverBalances, SavingsGoal, SavingsGoalUpdate, SurplusTracker,
};

/// Trait for savings goal repository operations
#[async_trait]
pub trait GoalRepositoryTrait: Send + Sync {
    fn get_goal(&self, user_id: &str, goal_id: &str) -> Result<SavingsGoal>;
    fn load_goals(&self, user_id: &str) -> Result<Vec<SavingsGoal>>;
    fn get_tracker(&self, user_id: &str) -> Result<Option<SurplusTracker>>;

    async fn insert_goal(&self, goal: SavingsGoal) -> Result<SavingsGoal>;
    async fn update_goal(&self, goal: SavingsGoal) -> Result<SavingsGoal>;

    /// Sets every goal of the user to its allocated amount (zero when absent)
    /// and stores the leftover on the tracker, in one transaction.
    async fn save_allocation(&self, user_id: &str, allocation: AllocationResult) -> Result<()>;

    /// Deletes the goals and credits `refund` to the tracker, in one transaction.
    async fn delete_goals_with_refund(
        &self,
        user_id: &str,
        goal_ids: Vec<String>,
        refund: Decimal,
    ) -> Result<usize>;
}

/// Estimates how likely a goal is to be met on time.
pub trait GoalProbabilityPredictor: Send + Sync {
    fn predict(&self, goal: &SavingsGoal, today: NaiveDate) -> Result<GoalPrediction>;
}

/// Trait for savings goal service operations
#[async_trait]
pub trait GoalServiceTrait: Send + Sync {
    fn get_goals(&self, user_id: &str) -> Result<Vec<SavingsGoal>>;
    async fn create_goal(&self, user_id: &str, new_goal: NewSavingsGoal) -> Result<SavingsGoal>;
    async fn update_goal(
        &self,
        user_id: &str,
        goal_id: &str,
        update: SavingsGoalUpdate,
    ) -> Result<SavingsGoal>;

    /// Redistributes the accumulated surplus of past months over the goals.
    async fn rollover(&self, user_id: &str) -> Result<RolloverBalances>;

    /// Redistributes the current pool (tracker plus goal balances).
    async fn reallocate_on_new_goal(&self, user_id: &str) -> Result<RolloverBalances>;

    async fn delete_goals_with_refund(
        &self,
        user_id: &str,
        goal_ids: Vec<String>,
    ) -> Result<GoalDeletion>;

    async fn goals_overview(&self, user_id: &str, filter: GoalFilter) -> Result<GoalsOverview>;

    fn goal_outlook(&self, user_id: &str, goal_id: &str) -> Result<GoalOutlook>;
}
