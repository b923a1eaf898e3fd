//! Deterministic implementations of the core's outbound seams: category
//! classification, budget alerts, expected returns and goal predictions.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use ledgerly_core::budget::NotificationSink;
use ledgerly_core::constants::{
    DEFAULT_EXPENSE_CATEGORY, DEFAULT_INCOME_CATEGORY, MAX_DISPLAY_YEARS,
};
use ledgerly_core::errors::Result;
use ledgerly_core::goals::{GoalPrediction, GoalProbabilityPredictor, SavingsGoal};
use ledgerly_core::investments::RateProvider;
use ledgerly_core::ledger::{CategoryClassifier, EntryKind};
use ledgerly_core::surplus::SurplusServiceTrait;
use ledgerly_core::utils::decimal_utils::percent_of;
use ledgerly_core::utils::time_utils::add_months;

const EXPENSE_RULES: &[(&str, &[&str])] = &[
    ("Food", &["grocery", "groceries", "restaurant", "cafe", "coffee", "food", "pizza"]),
    ("Housing", &["rent", "mortgage", "maintenance"]),
    ("Transportation", &["uber", "taxi", "fuel", "petrol", "bus", "train", "parking"]),
    ("Utilities", &["electric", "electricity", "water", "internet", "phone", "gas bill"]),
    ("Entertainment", &["netflix", "spotify", "movie", "cinema", "concert", "game"]),
    ("Healthcare", &["pharmacy", "doctor", "hospital", "clinic", "medicine"]),
    ("Shopping", &["amazon", "clothes", "shoes", "mall"]),
    ("Education", &["tuition", "course", "books", "school"]),
];

const INCOME_RULES: &[(&str, &[&str])] = &[
    ("Salary", &["salary", "payroll", "wage", "paycheck"]),
    ("Freelance", &["freelance", "invoice", "client", "contract"]),
    ("Investment", &["dividend", "interest", "maturity", "capital gain"]),
    ("Rental Income", &["tenant", "rental"]),
    ("Gift", &["gift", "bonus"]),
];

/// Case-insensitive keyword matcher; the first rule with a hit wins.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordClassifier;

impl CategoryClassifier for KeywordClassifier {
    fn classify(&self, text: &str, kind: EntryKind) -> String {
        let (rules, fallback) = match kind {
            EntryKind::Income => (INCOME_RULES, DEFAULT_INCOME_CATEGORY),
            EntryKind::Expense => (EXPENSE_RULES, DEFAULT_EXPENSE_CATEGORY),
        };
        let text = text.to_lowercase();
        rules
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
            .map(|(category, _)| category.to_string())
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// Records budget alerts in the structured log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingNotificationSink;

#[async_trait]
impl NotificationSink for LoggingNotificationSink {
    async fn notify(&self, user_id: &str, subject: &str, body: &str) -> Result<()> {
        tracing::warn!(user_id, subject, body, "budget alert");
        Ok(())
    }
}

/// Expected annual returns from a `type=percent,...` list such as
/// `fd=6.5,bond=7,stock=11`. Type names are matched case-insensitively.
#[derive(Debug, Default, Clone)]
pub struct ConfiguredRateProvider {
    rates: HashMap<String, Decimal>,
}

impl ConfiguredRateProvider {
    pub fn from_pairs(pairs: &str) -> Self {
        let mut rates = HashMap::new();
        for pair in pairs.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match pair.split_once('=') {
                Some((kind, rate)) => match Decimal::from_str(rate.trim()) {
                    Ok(rate) => {
                        rates.insert(kind.trim().to_lowercase(), rate);
                    }
                    Err(e) => tracing::warn!("Ignoring expected return '{}': {}", pair, e),
                },
                None => tracing::warn!("Ignoring expected return '{}': missing '='", pair),
            }
        }
        Self { rates }
    }
}

#[async_trait]
impl RateProvider for ConfiguredRateProvider {
    async fn expected_annual_return(&self, investment_type: &str) -> Result<Option<Decimal>> {
        Ok(self.rates.get(&investment_type.to_lowercase()).copied())
    }
}

/// Projects the user's average monthly surplus forward at a constant pace.
pub struct LinearPacePredictor {
    surplus_service: Arc<dyn SurplusServiceTrait>,
}

impl LinearPacePredictor {
    pub fn new(surplus_service: Arc<dyn SurplusServiceTrait>) -> Self {
        Self { surplus_service }
    }

    fn average_monthly_surplus(&self, user_id: &str, today: NaiveDate) -> Result<Decimal> {
        let history = self.surplus_service.surplus_history(user_id, today)?;
        if history.is_empty() {
            return Ok(Decimal::ZERO);
        }
        let total: Decimal = history.iter().map(|m| m.surplus).sum();
        Ok(total / Decimal::from(history.len()))
    }
}

fn months_until(today: NaiveDate, deadline: NaiveDate) -> i64 {
    let months = i64::from(deadline.year() - today.year()) * 12
        + i64::from(deadline.month())
        - i64::from(today.month());
    months.max(1)
}

impl GoalProbabilityPredictor for LinearPacePredictor {
    fn predict(&self, goal: &SavingsGoal, today: NaiveDate) -> Result<GoalPrediction> {
        let remaining = goal.target_amount - goal.current_amount;
        if remaining <= Decimal::ZERO {
            return Ok(GoalPrediction {
                probability: Some(Decimal::ONE_HUNDRED),
                suggested_deadline: Some(today),
            });
        }

        let pace = self.average_monthly_surplus(&goal.user_id, today)?;
        if pace <= Decimal::ZERO {
            return Ok(GoalPrediction {
                probability: Some(Decimal::ZERO),
                suggested_deadline: None,
            });
        }

        // One month past the display horizon is enough to render "beyond".
        let horizon = MAX_DISPLAY_YEARS * 12 + 1;
        let months_needed = (remaining / pace)
            .ceil()
            .to_u32()
            .map_or(horizon, |m| m.min(horizon));
        let suggested_deadline = add_months(today, months_needed);

        let probability = match goal.deadline {
            Some(deadline) => {
                let reachable = pace * Decimal::from(months_until(today, deadline));
                percent_of(reachable, remaining).min(Decimal::ONE_HUNDRED)
            }
            None => Decimal::ONE_HUNDRED,
        };

        Ok(GoalPrediction {
            probability: Some(probability),
            suggested_deadline,
        })
    }
}
