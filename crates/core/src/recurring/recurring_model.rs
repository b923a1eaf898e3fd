//! Recurring template domain models.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{Error, Result};
use crate::ledger::{EntryKind, NewExpense, NewIncome};
use crate::utils::time_utils::add_months;

/// How often a template comes due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frequency {
    Monthly,
    Quarterly,
    Biannual,
    Yearly,
}

impl Frequency {
    pub fn months(&self) -> u32 {
        match self {
            Frequency::Monthly => 1,
            Frequency::Quarterly => 3,
            Frequency::Biannual => 6,
            Frequency::Yearly => 12,
        }
    }

    pub fn periods_per_year(&self) -> u32 {
        12 / self.months()
    }

    /// Next occurrence after `date`, clamped to the end of a shorter month.
    /// `None` only when the result falls outside the representable range.
    pub fn advance(&self, date: NaiveDate) -> Option<NaiveDate> {
        add_months(date, self.months())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Monthly => "Monthly",
            Frequency::Quarterly => "Quarterly",
            Frequency::Biannual => "Biannual",
            Frequency::Yearly => "Yearly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Monthly" => Ok(Frequency::Monthly),
            "Quarterly" => Ok(Frequency::Quarterly),
            "Biannual" => Ok(Frequency::Biannual),
            "Yearly" => Ok(Frequency::Yearly),
            other => Err(Error::invalid_input(format!("Unknown frequency '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurringStatus {
    Active,
    Pending,
    Inactive,
}

impl RecurringStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurringStatus::Active => "active",
            RecurringStatus::Pending => "pending",
            RecurringStatus::Inactive => "inactive",
        }
    }
}

impl FromStr for RecurringStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "active" => Ok(RecurringStatus::Active),
            "pending" => Ok(RecurringStatus::Pending),
            "inactive" => Ok(RecurringStatus::Inactive),
            other => Err(Error::invalid_input(format!(
                "Unknown recurring status '{}'",
                other
            ))),
        }
    }
}

/// A rule that generates ledger entries on a schedule. `label` is the income
/// source or the expense name, depending on `kind`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecurringTemplate {
    pub id: String,
    pub user_id: String,
    pub kind: EntryKind,
    pub label: String,
    pub amount: Decimal,
    pub category: String,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub next_due_date: NaiveDate,
    pub status: RecurringStatus,
    pub created_at: NaiveDateTime,
}

impl RecurringTemplate {
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.next_due_date <= today
    }

    /// True when the next occurrence lies beyond the end date.
    pub fn is_past_end(&self) -> bool {
        self.is_past_end_at(self.next_due_date)
    }

    pub fn is_past_end_at(&self, date: NaiveDate) -> bool {
        self.end_date.is_some_and(|end| date > end)
    }

    /// Ledger entry for the current occurrence.
    pub fn occurrence_income(&self) -> NewIncome {
        NewIncome {
            id: None,
            user_id: self.user_id.clone(),
            date: self.next_due_date,
            amount: self.amount,
            category: self.category.clone(),
            source: self.label.clone(),
            recurring_id: Some(self.id.clone()),
            investment_id: None,
        }
    }

    pub fn occurrence_expense(&self) -> NewExpense {
        NewExpense {
            id: None,
            user_id: self.user_id.clone(),
            date: self.next_due_date,
            amount: self.amount,
            category: self.category.clone(),
            name: self.label.clone(),
            recurring_id: Some(self.id.clone()),
            investment_id: None,
        }
    }

    /// Whether applying `update` touches a field that invalidates the
    /// entries generated so far.
    pub fn requires_reset(&self, update: &RecurringTemplateUpdate) -> bool {
        self.label != update.label.trim()
            || self.amount != update.amount
            || self.category != update.category.trim()
            || self.frequency != update.frequency
            || self.start_date != update.start_date
            || self.end_date != update.end_date
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewRecurringTemplate {
    pub id: Option<String>,
    #[serde(default)]
    pub user_id: String,
    pub label: String,
    pub amount: Decimal,
    #[serde(default)]
    pub category: String,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

/// Full replacement of a template's editable fields.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecurringTemplateUpdate {
    pub label: String,
    pub amount: Decimal,
    #[serde(default)]
    pub category: String,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

/// New scheduling state for one template.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateChange {
    pub id: String,
    pub kind: EntryKind,
    pub next_due_date: NaiveDate,
    pub status: RecurringStatus,
}

/// Everything a materialization run wants written. Applied atomically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterializationPlan {
    pub new_incomes: Vec<NewIncome>,
    pub new_expenses: Vec<NewExpense>,
    pub template_changes: Vec<TemplateChange>,
    pub report: MaterializationReport,
}

impl MaterializationPlan {
    pub fn is_empty(&self) -> bool {
        self.new_incomes.is_empty()
            && self.new_expenses.is_empty()
            && self.template_changes.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterializationReport {
    pub incomes_created: usize,
    pub expenses_created: usize,
    pub duplicates_skipped: usize,
    pub occurrences_advanced: usize,
    /// Expense templates left waiting for income.
    pub pending_templates: Vec<String>,
    /// Templates that reached their end date during the run.
    pub deactivated_templates: Vec<String>,
    pub passes: usize,
    /// Set when the pass limit stopped the run before it settled.
    pub truncated: bool,
}
