//! Savings goal domain models.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GoalPriority {
    High,
    Medium,
    Low,
}

impl GoalPriority {
    /// Sort rank; lower is funded first.
    pub fn rank(&self) -> u8 {
        match self {
            GoalPriority::High => 0,
            GoalPriority::Medium => 1,
            GoalPriority::Low => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GoalPriority::High => "High",
            GoalPriority::Medium => "Medium",
            GoalPriority::Low => "Low",
        }
    }
}

impl FromStr for GoalPriority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "High" => Ok(GoalPriority::High),
            "Medium" => Ok(GoalPriority::Medium),
            "Low" => Ok(GoalPriority::Low),
            other => Err(Error::invalid_input(format!("Unknown priority '{}'", other))),
        }
    }
}

/// Domain model representing a savings goal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavingsGoal {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    pub deadline: Option<NaiveDate>,
    pub priority: GoalPriority,
    pub created_at: NaiveDateTime,
}

impl SavingsGoal {
    pub fn is_completed(&self) -> bool {
        self.current_amount >= self.target_amount
    }

    pub fn remaining(&self) -> Decimal {
        (self.target_amount - self.current_amount).max(Decimal::ZERO)
    }
}

/// Input model for creating a new savings goal
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewSavingsGoal {
    pub id: Option<String>,
    pub name: String,
    pub target_amount: Decimal,
    pub deadline: Option<NaiveDate>,
    #[serde(default = "default_priority")]
    pub priority: GoalPriority,
}

fn default_priority() -> GoalPriority {
    GoalPriority::Medium
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavingsGoalUpdate {
    pub name: String,
    pub target_amount: Decimal,
    pub deadline: Option<NaiveDate>,
    pub priority: GoalPriority,
}

/// Per-user store of unallocated past surplus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SurplusTracker {
    pub user_id: String,
    pub last_surplus: Decimal,
    pub updated_at: NaiveDateTime,
}

/// New `current_amount` per goal plus what is left for the tracker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationResult {
    pub allocations: Vec<(String, Decimal)>,
    pub leftover: Decimal,
}

impl AllocationResult {
    pub fn allocated(&self) -> Decimal {
        self.allocations.iter().map(|(_, amount)| *amount).sum()
    }

    pub fn amount_for(&self, goal_id: &str) -> Decimal {
        self.allocations
            .iter()
            .find(|(id, _)| id == goal_id)
            .map(|(_, amount)| *amount)
            .unwrap_or(Decimal::ZERO)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RolloverBalances {
    /// Sum of past months' surplus.
    pub accumulated_balance: Decimal,
    pub allocated_balance: Decimal,
    /// Held by the tracker.
    pub unallocated_balance: Decimal,
    /// In-progress surplus of the current month.
    pub current_balance: Decimal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalDeletion {
    pub deleted: usize,
    pub refunded: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl GoalFilter {
    pub fn accepts(&self, goal: &SavingsGoal) -> bool {
        match self {
            GoalFilter::All => true,
            GoalFilter::Active => !goal.is_completed(),
            GoalFilter::Completed => goal.is_completed(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalsOverview {
    pub balances: RolloverBalances,
    pub goals: Vec<SavingsGoal>,
    pub total_target: Decimal,
    pub total_current: Decimal,
    pub overall_progress: Decimal,
}

/// What a [`GoalProbabilityPredictor`](super::GoalProbabilityPredictor) returns.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GoalPrediction {
    pub probability: Option<Decimal>,
    pub suggested_deadline: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutlookProbability {
    Percent(Decimal),
    Note(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutlookDeadline {
    Date(NaiveDate),
    Note(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalOutlook {
    pub goal_id: String,
    pub probability: OutlookProbability,
    pub suggested_deadline: OutlookDeadline,
}
