//! Keeps the ledger rows mirroring an investment in line with it.

use chrono::NaiveDate;

use crate::constants::INVESTMENT_EXPENSE_CATEGORY;
use crate::ledger::{ExpenseUpdate, IncomeUpdate, LedgerMutation, LinkedEntries, NewExpense, NewIncome};

use super::investments_model::Investment;
use super::valuation::{estimated_value, maturity_income_category};

/// Mutations that bring `linked` in line with `current`.
///
/// `previous` is the investment as stored before this change, `None` on
/// creation. The principal is always mirrored as one expense. A completed
/// investment with an end date also gets one maturity income; reopening it
/// removes that income.
pub fn plan_investment_sync(
    previous: Option<&Investment>,
    current: &Investment,
    linked: &LinkedEntries,
    today: NaiveDate,
) -> Vec<LedgerMutation> {
    let mut mutations = Vec::new();
    let renamed = previous.is_some_and(|p| p.name != current.name);
    let expense_date = current.start_date.unwrap_or(today);

    match &linked.expense {
        None => mutations.push(LedgerMutation::CreateExpense(NewExpense {
            id: None,
            user_id: current.user_id.clone(),
            date: expense_date,
            amount: current.amount,
            category: INVESTMENT_EXPENSE_CATEGORY.to_string(),
            name: current.expense_name(),
            recurring_id: None,
            investment_id: Some(current.id.clone()),
        })),
        Some(expense) => {
            if expense.amount != current.amount || expense.date != expense_date || renamed {
                mutations.push(LedgerMutation::UpdateExpense {
                    id: expense.id.clone(),
                    update: ExpenseUpdate {
                        date: expense_date,
                        amount: current.amount,
                        category: expense.category.clone(),
                        name: if renamed {
                            current.expense_name()
                        } else {
                            expense.name.clone()
                        },
                    },
                });
            }
        }
    }

    match (current.is_completed(), current.end_date, &linked.income) {
        (true, Some(end_date), None) => {
            mutations.push(LedgerMutation::CreateIncome(NewIncome {
                id: None,
                user_id: current.user_id.clone(),
                date: end_date,
                amount: estimated_value(current),
                category: maturity_income_category(&current.investment_type).to_string(),
                source: current.maturity_source(),
                recurring_id: None,
                investment_id: Some(current.id.clone()),
            }));
        }
        (true, Some(end_date), Some(income)) => {
            let value = estimated_value(current);
            let source = current.maturity_source();
            if income.amount != value || income.date != end_date || income.source != source {
                mutations.push(LedgerMutation::UpdateIncome {
                    id: income.id.clone(),
                    update: IncomeUpdate {
                        date: end_date,
                        amount: value,
                        category: income.category.clone(),
                        source,
                    },
                });
            }
        }
        (false, _, Some(income)) => {
            mutations.push(LedgerMutation::DeleteIncome {
                id: income.id.clone(),
            });
        }
        _ => {}
    }

    mutations
}
