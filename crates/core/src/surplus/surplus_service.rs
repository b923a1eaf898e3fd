use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::errors::Result;
use crate::ledger::{DateRange, LedgerRepositoryTrait};
use crate::utils::time_utils::{first_day_of_month, month_bounds, months_before};

/// Surplus of one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySurplus {
    pub year: i32,
    pub month: u32,
    pub surplus: Decimal,
}

pub trait SurplusServiceTrait: Send + Sync {
    /// `max(income - expense, 0)` over the calendar month.
    fn monthly_surplus(&self, user_id: &str, year: i32, month: u32) -> Result<Decimal>;

    /// Per-month surplus from the month of the first income up to, but not
    /// including, the month of `until`.
    fn surplus_history(&self, user_id: &str, until: NaiveDate) -> Result<Vec<MonthlySurplus>>;

    /// Sum of [`surplus_history`](Self::surplus_history).
    fn accumulated_surplus(&self, user_id: &str, until: NaiveDate) -> Result<Decimal> {
        Ok(self
            .surplus_history(user_id, until)?
            .iter()
            .map(|m| m.surplus)
            .sum())
    }
}

pub struct SurplusService {
    ledger_repository: Arc<dyn LedgerRepositoryTrait>,
}

impl SurplusService {
    pub fn new(ledger_repository: Arc<dyn LedgerRepositoryTrait>) -> Self {
        Self { ledger_repository }
    }
}

impl SurplusServiceTrait for SurplusService {
    fn monthly_surplus(&self, user_id: &str, year: i32, month: u32) -> Result<Decimal> {
        let (start, end) = month_bounds(year, month)?;
        let range = Some(DateRange::new(start, end));
        let income = self.ledger_repository.sum_incomes(user_id, range)?;
        let expense = self.ledger_repository.sum_expenses(user_id, range, None)?;
        Ok((income - expense).max(Decimal::ZERO))
    }

    fn surplus_history(&self, user_id: &str, until: NaiveDate) -> Result<Vec<MonthlySurplus>> {
        let first = match self.ledger_repository.first_income_date(user_id)? {
            Some(date) => date,
            None => return Ok(Vec::new()),
        };
        let months = months_before(first, until);
        let (Some(_), Some(last_end)) = (months.first(), first_day_of_month(until).pred_opt())
        else {
            return Ok(Vec::new());
        };

        // One pass over the window instead of two queries per month.
        let range = Some(DateRange::new(first_day_of_month(first), last_end));
        let mut net: BTreeMap<(i32, u32), Decimal> = months
            .iter()
            .map(|&key| (key, Decimal::ZERO))
            .collect();
        for income in self.ledger_repository.list_incomes(user_id, range)? {
            if let Some(v) = net.get_mut(&(income.date.year(), income.date.month())) {
                *v += income.amount;
            }
        }
        for expense in self.ledger_repository.list_expenses(user_id, range)? {
            if let Some(v) = net.get_mut(&(expense.date.year(), expense.date.month())) {
                *v -= expense.amount;
            }
        }

        Ok(net
            .into_iter()
            .map(|((year, month), value)| MonthlySurplus {
                year,
                month,
                surplus: value.max(Decimal::ZERO),
            })
            .collect())
    }
}
