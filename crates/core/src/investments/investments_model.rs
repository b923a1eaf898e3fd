//! Investment domain models.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::{Error, Result};
use crate::recurring::Frequency;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InvestmentStatus {
    #[default]
    Active,
    Completed,
}

impl InvestmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvestmentStatus::Active => "Active",
            InvestmentStatus::Completed => "Completed",
        }
    }
}

impl FromStr for InvestmentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Active" => Ok(InvestmentStatus::Active),
            "Completed" => Ok(InvestmentStatus::Completed),
            other => Err(Error::invalid_input(format!(
                "Unknown investment status '{}'",
                other
            ))),
        }
    }
}

/// Domain model representing an investment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Investment {
    pub id: String,
    pub user_id: String,
    pub name: String,
    /// Free-form type such as `fd`, `rd`, `bond`, `stock`.
    pub investment_type: String,
    pub amount: Decimal,
    /// Annual return in percent.
    pub expected_return: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Compounding frequency override.
    pub frequency: Option<Frequency>,
    pub status: InvestmentStatus,
    pub last_updated: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl Investment {
    pub fn is_completed(&self) -> bool {
        self.status == InvestmentStatus::Completed
    }

    pub fn expense_name(&self) -> String {
        format!("Investment in {}", self.name)
    }

    pub fn maturity_source(&self) -> String {
        format!("Investment Maturity - {}", self.name)
    }
}

/// Input model for creating a new investment
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewInvestment {
    pub id: Option<String>,
    pub name: String,
    pub investment_type: String,
    pub amount: Decimal,
    pub expected_return: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub frequency: Option<Frequency>,
    #[serde(default)]
    pub status: InvestmentStatus,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentUpdate {
    pub name: String,
    pub investment_type: String,
    pub amount: Decimal,
    pub expected_return: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub frequency: Option<Frequency>,
    pub status: InvestmentStatus,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentValuation {
    pub investment: Investment,
    pub estimated_value: Decimal,
}
