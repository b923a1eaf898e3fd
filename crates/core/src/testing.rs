//! In-memory repositories and collaborators shared by the unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::budget::{Budget, BudgetRepositoryTrait, NotificationSink};
use crate::errors::{Error, Result};
use crate::goals::{
    AllocationResult, GoalPrediction, GoalProbabilityPredictor, GoalRepositoryTrait, SavingsGoal,
    SurplusTracker,
};
use crate::investments::{Investment, InvestmentRepositoryTrait, RateProvider};
use crate::ledger::{
    CategoryClassifier, DateRange, EntryFingerprint, EntryKind, Expense, ExpenseUpdate, Income,
    IncomeUpdate, LedgerMutation, LedgerRepositoryTrait, LinkedEntries, NewExpense, NewIncome,
    TemplateEntryStats,
};
use crate::recurring::{MaterializationPlan, RecurringRepositoryTrait, RecurringTemplate};

fn stamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn in_range(range: &Option<DateRange>, date: NaiveDate) -> bool {
    range.map_or(true, |r| r.contains(date))
}

#[derive(Default)]
pub struct InMemoryLedger {
    incomes: RwLock<Vec<Income>>,
    expenses: RwLock<Vec<Expense>>,
    next_id: Mutex<u64>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self, prefix: &str) -> String {
        let mut id = self.next_id.lock().unwrap();
        *id += 1;
        format!("{}-{}", prefix, id)
    }

    pub fn push_income(&self, user_id: &str, date: NaiveDate, amount: Decimal) -> Income {
        self.insert_income(NewIncome {
            id: None,
            user_id: user_id.to_string(),
            date,
            amount,
            category: "Salary".to_string(),
            source: "Employer".to_string(),
            recurring_id: None,
            investment_id: None,
        })
    }

    pub fn push_expense(
        &self,
        user_id: &str,
        date: NaiveDate,
        amount: Decimal,
        category: &str,
    ) -> Expense {
        self.insert_expense(NewExpense {
            id: None,
            user_id: user_id.to_string(),
            date,
            amount,
            category: category.to_string(),
            name: format!("{} spend", category),
            recurring_id: None,
            investment_id: None,
        })
    }

    pub fn incomes(&self) -> Vec<Income> {
        self.incomes.read().unwrap().clone()
    }

    pub fn expenses(&self) -> Vec<Expense> {
        self.expenses.read().unwrap().clone()
    }

    pub fn insert_income(&self, new_income: NewIncome) -> Income {
        let income = Income {
            id: new_income.id.unwrap_or_else(|| self.next_id("inc")),
            user_id: new_income.user_id,
            date: new_income.date,
            amount: new_income.amount,
            category: new_income.category,
            source: new_income.source,
            recurring_id: new_income.recurring_id,
            investment_id: new_income.investment_id,
            created_at: stamp(),
        };
        self.incomes.write().unwrap().push(income.clone());
        income
    }

    pub fn insert_expense(&self, new_expense: NewExpense) -> Expense {
        let expense = Expense {
            id: new_expense.id.unwrap_or_else(|| self.next_id("exp")),
            user_id: new_expense.user_id,
            date: new_expense.date,
            amount: new_expense.amount,
            category: new_expense.category,
            name: new_expense.name,
            recurring_id: new_expense.recurring_id,
            investment_id: new_expense.investment_id,
            created_at: stamp(),
        };
        self.expenses.write().unwrap().push(expense.clone());
        expense
    }

    pub fn purge_template_entries(&self, recurring_id: &str) {
        let owned = |rid: &Option<String>| rid.as_deref() == Some(recurring_id);
        self.incomes
            .write()
            .unwrap()
            .retain(|i| !owned(&i.recurring_id));
        self.expenses
            .write()
            .unwrap()
            .retain(|e| !owned(&e.recurring_id));
    }

    pub fn purge_investment_entries(&self, investment_id: &str) {
        let owned = |iid: &Option<String>| iid.as_deref() == Some(investment_id);
        self.incomes
            .write()
            .unwrap()
            .retain(|i| !owned(&i.investment_id));
        self.expenses
            .write()
            .unwrap()
            .retain(|e| !owned(&e.investment_id));
    }

    fn apply(&self, mutation: LedgerMutation) -> Result<()> {
        match mutation {
            LedgerMutation::CreateIncome(new_income) => {
                self.insert_income(new_income);
            }
            LedgerMutation::CreateExpense(new_expense) => {
                self.insert_expense(new_expense);
            }
            LedgerMutation::UpdateIncome { id, update } => {
                let mut incomes = self.incomes.write().unwrap();
                let income = incomes
                    .iter_mut()
                    .find(|i| i.id == id)
                    .ok_or_else(|| Error::NotFound(id.clone()))?;
                income.date = update.date;
                income.amount = update.amount;
                income.category = update.category;
                income.source = update.source;
            }
            LedgerMutation::UpdateExpense { id, update } => {
                let mut expenses = self.expenses.write().unwrap();
                let expense = expenses
                    .iter_mut()
                    .find(|e| e.id == id)
                    .ok_or_else(|| Error::NotFound(id.clone()))?;
                expense.date = update.date;
                expense.amount = update.amount;
                expense.category = update.category;
                expense.name = update.name;
            }
            LedgerMutation::DeleteIncome { id } => {
                self.incomes.write().unwrap().retain(|i| i.id != id);
            }
            LedgerMutation::DeleteExpense { id } => {
                self.expenses.write().unwrap().retain(|e| e.id != id);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerRepositoryTrait for InMemoryLedger {
    fn get_income(&self, user_id: &str, income_id: &str) -> Result<Income> {
        self.incomes
            .read()
            .unwrap()
            .iter()
            .find(|i| i.id == income_id && i.user_id == user_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Income {} not found", income_id)))
    }

    fn get_expense(&self, user_id: &str, expense_id: &str) -> Result<Expense> {
        self.expenses
            .read()
            .unwrap()
            .iter()
            .find(|e| e.id == expense_id && e.user_id == user_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Expense {} not found", expense_id)))
    }

    fn list_incomes(&self, user_id: &str, range: Option<DateRange>) -> Result<Vec<Income>> {
        Ok(self
            .incomes
            .read()
            .unwrap()
            .iter()
            .filter(|i| i.user_id == user_id && in_range(&range, i.date))
            .cloned()
            .collect())
    }

    fn list_expenses(&self, user_id: &str, range: Option<DateRange>) -> Result<Vec<Expense>> {
        Ok(self
            .expenses
            .read()
            .unwrap()
            .iter()
            .filter(|e| e.user_id == user_id && in_range(&range, e.date))
            .cloned()
            .collect())
    }

    fn sum_incomes(&self, user_id: &str, range: Option<DateRange>) -> Result<Decimal> {
        Ok(self
            .list_incomes(user_id, range)?
            .iter()
            .map(|i| i.amount)
            .sum())
    }

    fn sum_expenses(
        &self,
        user_id: &str,
        range: Option<DateRange>,
        category: Option<&str>,
    ) -> Result<Decimal> {
        Ok(self
            .list_expenses(user_id, range)?
            .iter()
            .filter(|e| category.map_or(true, |c| e.category == c))
            .map(|e| e.amount)
            .sum())
    }

    fn first_income_date(&self, user_id: &str) -> Result<Option<NaiveDate>> {
        Ok(self
            .list_incomes(user_id, None)?
            .iter()
            .map(|i| i.date)
            .min())
    }

    fn recurring_fingerprints(&self, user_id: &str) -> Result<HashSet<EntryFingerprint>> {
        let mut set = HashSet::new();
        for income in self.list_incomes(user_id, None)? {
            if let Some(rid) = income.recurring_id {
                set.insert(EntryFingerprint {
                    kind: EntryKind::Income,
                    recurring_id: rid,
                    label: income.source,
                    amount: income.amount.normalize(),
                    date: income.date,
                    category: income.category,
                });
            }
        }
        for expense in self.list_expenses(user_id, None)? {
            if let Some(rid) = expense.recurring_id {
                set.insert(EntryFingerprint {
                    kind: EntryKind::Expense,
                    recurring_id: rid,
                    label: expense.name,
                    amount: expense.amount.normalize(),
                    date: expense.date,
                    category: expense.category,
                });
            }
        }
        Ok(set)
    }

    fn template_entry_stats(
        &self,
        kind: EntryKind,
        recurring_id: &str,
    ) -> Result<TemplateEntryStats> {
        let amounts: Vec<Decimal> = match kind {
            EntryKind::Income => self
                .incomes
                .read()
                .unwrap()
                .iter()
                .filter(|i| i.recurring_id.as_deref() == Some(recurring_id))
                .map(|i| i.amount)
                .collect(),
            EntryKind::Expense => self
                .expenses
                .read()
                .unwrap()
                .iter()
                .filter(|e| e.recurring_id.as_deref() == Some(recurring_id))
                .map(|e| e.amount)
                .collect(),
        };
        Ok(TemplateEntryStats {
            count: amounts.len(),
            total: amounts.iter().sum(),
        })
    }

    fn linked_entries(&self, investment_id: &str) -> Result<LinkedEntries> {
        Ok(LinkedEntries {
            expense: self
                .expenses
                .read()
                .unwrap()
                .iter()
                .find(|e| e.investment_id.as_deref() == Some(investment_id))
                .cloned(),
            income: self
                .incomes
                .read()
                .unwrap()
                .iter()
                .find(|i| i.investment_id.as_deref() == Some(investment_id))
                .cloned(),
        })
    }

    async fn create_income(&self, new_income: NewIncome) -> Result<Income> {
        Ok(self.insert_income(new_income))
    }

    async fn create_expense(&self, new_expense: NewExpense) -> Result<Expense> {
        Ok(self.insert_expense(new_expense))
    }

    async fn update_income(
        &self,
        user_id: &str,
        income_id: &str,
        update: IncomeUpdate,
    ) -> Result<Income> {
        self.get_income(user_id, income_id)?;
        self.apply(LedgerMutation::UpdateIncome {
            id: income_id.to_string(),
            update,
        })?;
        self.get_income(user_id, income_id)
    }

    async fn update_expense(
        &self,
        user_id: &str,
        expense_id: &str,
        update: ExpenseUpdate,
    ) -> Result<Expense> {
        self.get_expense(user_id, expense_id)?;
        self.apply(LedgerMutation::UpdateExpense {
            id: expense_id.to_string(),
            update,
        })?;
        self.get_expense(user_id, expense_id)
    }

    async fn delete_incomes(&self, user_id: &str, ids: Vec<String>) -> Result<usize> {
        let mut incomes = self.incomes.write().unwrap();
        let before = incomes.len();
        incomes.retain(|i| !(i.user_id == user_id && ids.contains(&i.id)));
        Ok(before - incomes.len())
    }

    async fn delete_expenses(&self, user_id: &str, ids: Vec<String>) -> Result<usize> {
        let mut expenses = self.expenses.write().unwrap();
        let before = expenses.len();
        expenses.retain(|e| !(e.user_id == user_id && ids.contains(&e.id)));
        Ok(before - expenses.len())
    }

    async fn apply_mutations(&self, mutations: Vec<LedgerMutation>) -> Result<usize> {
        let count = mutations.len();
        for mutation in mutations {
            self.apply(mutation)?;
        }
        Ok(count)
    }
}

pub struct InMemoryRecurring {
    templates: RwLock<Vec<RecurringTemplate>>,
    ledger: Arc<InMemoryLedger>,
}

impl InMemoryRecurring {
    pub fn new(ledger: Arc<InMemoryLedger>) -> Self {
        Self {
            templates: RwLock::new(Vec::new()),
            ledger,
        }
    }

    pub fn template(&self, id: &str) -> RecurringTemplate {
        self.templates
            .read()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .unwrap()
    }
}

#[async_trait]
impl RecurringRepositoryTrait for InMemoryRecurring {
    fn get_template(&self, user_id: &str, template_id: &str) -> Result<RecurringTemplate> {
        self.templates
            .read()
            .unwrap()
            .iter()
            .find(|t| t.id == template_id && t.user_id == user_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Recurring template {} not found", template_id)))
    }

    fn list_templates(
        &self,
        user_id: &str,
        kind: Option<EntryKind>,
    ) -> Result<Vec<RecurringTemplate>> {
        Ok(self
            .templates
            .read()
            .unwrap()
            .iter()
            .filter(|t| t.user_id == user_id && kind.map_or(true, |k| t.kind == k))
            .cloned()
            .collect())
    }

    async fn insert_template(&self, template: RecurringTemplate) -> Result<RecurringTemplate> {
        self.templates.write().unwrap().push(template.clone());
        Ok(template)
    }

    async fn save_template(
        &self,
        template: RecurringTemplate,
        purge_generated: bool,
    ) -> Result<RecurringTemplate> {
        if purge_generated {
            self.ledger.purge_template_entries(&template.id);
        }
        let mut templates = self.templates.write().unwrap();
        let slot = templates
            .iter_mut()
            .find(|t| t.id == template.id)
            .ok_or_else(|| Error::NotFound(template.id.clone()))?;
        *slot = template.clone();
        Ok(template)
    }

    async fn delete_template(&self, user_id: &str, template_id: &str) -> Result<usize> {
        self.ledger.purge_template_entries(template_id);
        let mut templates = self.templates.write().unwrap();
        let before = templates.len();
        templates.retain(|t| !(t.id == template_id && t.user_id == user_id));
        Ok(before - templates.len())
    }

    async fn apply_materialization(&self, plan: MaterializationPlan) -> Result<()> {
        for income in plan.new_incomes {
            self.ledger.insert_income(income);
        }
        for expense in plan.new_expenses {
            self.ledger.insert_expense(expense);
        }
        let mut templates = self.templates.write().unwrap();
        for change in plan.template_changes {
            if let Some(t) = templates.iter_mut().find(|t| t.id == change.id) {
                t.next_due_date = change.next_due_date;
                t.status = change.status;
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryGoals {
    goals: RwLock<Vec<SavingsGoal>>,
    trackers: RwLock<HashMap<String, SurplusTracker>>,
}

impl InMemoryGoals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_goal(&self, goal: SavingsGoal) {
        self.goals.write().unwrap().push(goal);
    }

    pub fn seed_tracker(&self, user_id: &str, last_surplus: Decimal) {
        self.trackers.write().unwrap().insert(
            user_id.to_string(),
            SurplusTracker {
                user_id: user_id.to_string(),
                last_surplus,
                updated_at: stamp(),
            },
        );
    }

    pub fn tracker_balance(&self, user_id: &str) -> Decimal {
        self.trackers
            .read()
            .unwrap()
            .get(user_id)
            .map(|t| t.last_surplus)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn current_of(&self, goal_id: &str) -> Decimal {
        self.goals
            .read()
            .unwrap()
            .iter()
            .find(|g| g.id == goal_id)
            .map(|g| g.current_amount)
            .unwrap()
    }
}

#[async_trait]
impl GoalRepositoryTrait for InMemoryGoals {
    fn get_goal(&self, user_id: &str, goal_id: &str) -> Result<SavingsGoal> {
        self.goals
            .read()
            .unwrap()
            .iter()
            .find(|g| g.id == goal_id && g.user_id == user_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Savings goal {} not found", goal_id)))
    }

    fn load_goals(&self, user_id: &str) -> Result<Vec<SavingsGoal>> {
        Ok(self
            .goals
            .read()
            .unwrap()
            .iter()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect())
    }

    fn get_tracker(&self, user_id: &str) -> Result<Option<SurplusTracker>> {
        Ok(self.trackers.read().unwrap().get(user_id).cloned())
    }

    async fn insert_goal(&self, goal: SavingsGoal) -> Result<SavingsGoal> {
        self.goals.write().unwrap().push(goal.clone());
        Ok(goal)
    }

    async fn update_goal(&self, goal: SavingsGoal) -> Result<SavingsGoal> {
        let mut goals = self.goals.write().unwrap();
        let slot = goals
            .iter_mut()
            .find(|g| g.id == goal.id)
            .ok_or_else(|| Error::NotFound(goal.id.clone()))?;
        *slot = goal.clone();
        Ok(goal)
    }

    async fn save_allocation(&self, user_id: &str, allocation: AllocationResult) -> Result<()> {
        for goal in self
            .goals
            .write()
            .unwrap()
            .iter_mut()
            .filter(|g| g.user_id == user_id)
        {
            goal.current_amount = allocation.amount_for(&goal.id);
        }
        self.seed_tracker(user_id, allocation.leftover);
        Ok(())
    }

    async fn delete_goals_with_refund(
        &self,
        user_id: &str,
        goal_ids: Vec<String>,
        refund: Decimal,
    ) -> Result<usize> {
        let balance = self.tracker_balance(user_id);
        self.seed_tracker(user_id, balance + refund);
        let mut goals = self.goals.write().unwrap();
        let before = goals.len();
        goals.retain(|g| !(g.user_id == user_id && goal_ids.contains(&g.id)));
        Ok(before - goals.len())
    }
}

#[derive(Default)]
pub struct InMemoryBudgets {
    budgets: RwLock<Vec<Budget>>,
}

impl InMemoryBudgets {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BudgetRepositoryTrait for InMemoryBudgets {
    fn list_budgets(&self, user_id: &str) -> Result<Vec<Budget>> {
        Ok(self
            .budgets
            .read()
            .unwrap()
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect())
    }

    fn active_budgets_for_category(
        &self,
        user_id: &str,
        category: &str,
        date: NaiveDate,
    ) -> Result<Vec<Budget>> {
        Ok(self
            .list_budgets(user_id)?
            .into_iter()
            .filter(|b| b.is_active_on(date) && b.category(category).is_some())
            .collect())
    }

    async fn insert_budget(&self, budget: Budget) -> Result<Budget> {
        self.budgets.write().unwrap().push(budget.clone());
        Ok(budget)
    }

    async fn delete_budget(&self, user_id: &str, budget_id: &str) -> Result<usize> {
        let mut budgets = self.budgets.write().unwrap();
        let before = budgets.len();
        budgets.retain(|b| !(b.id == budget_id && b.user_id == user_id));
        Ok(before - budgets.len())
    }
}

/// Records every alert; fails on demand.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: RwLock<Vec<(String, String)>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            sent: RwLock::new(Vec::new()),
            fail: true,
        }
    }
}

#[async_trait]
impl NotificationSink for RecordingNotifier {
    async fn notify(&self, user_id: &str, subject: &str, _body: &str) -> Result<()> {
        if self.fail {
            return Err(Error::Notification("smtp unreachable".to_string()));
        }
        self.sent
            .write()
            .unwrap()
            .push((user_id.to_string(), subject.to_string()));
        Ok(())
    }
}

/// Classifies everything into one fixed category per kind.
pub struct FixedClassifier;

impl CategoryClassifier for FixedClassifier {
    fn classify(&self, _text: &str, kind: EntryKind) -> String {
        match kind {
            EntryKind::Income => "Other Income".to_string(),
            EntryKind::Expense => "Miscellaneous".to_string(),
        }
    }
}

pub struct FixedPredictor(pub GoalPrediction);

impl GoalProbabilityPredictor for FixedPredictor {
    fn predict(&self, _goal: &SavingsGoal, _today: NaiveDate) -> Result<GoalPrediction> {
        Ok(self.0)
    }
}

pub struct InMemoryInvestments {
    investments: RwLock<Vec<Investment>>,
    ledger: Arc<InMemoryLedger>,
}

impl InMemoryInvestments {
    pub fn new(ledger: Arc<InMemoryLedger>) -> Self {
        Self {
            investments: RwLock::new(Vec::new()),
            ledger,
        }
    }
}

#[async_trait]
impl InvestmentRepositoryTrait for InMemoryInvestments {
    fn get_investment(&self, user_id: &str, investment_id: &str) -> Result<Investment> {
        self.investments
            .read()
            .unwrap()
            .iter()
            .find(|i| i.id == investment_id && i.user_id == user_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Investment {} not found", investment_id)))
    }

    fn list_investments(&self, user_id: &str) -> Result<Vec<Investment>> {
        Ok(self
            .investments
            .read()
            .unwrap()
            .iter()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn save_investment(
        &self,
        investment: Investment,
        mutations: Vec<LedgerMutation>,
    ) -> Result<Investment> {
        {
            let mut investments = self.investments.write().unwrap();
            investments.retain(|i| i.id != investment.id);
            investments.push(investment.clone());
        }
        self.ledger.apply_mutations(mutations).await?;
        Ok(investment)
    }

    async fn delete_investment(&self, user_id: &str, investment_id: &str) -> Result<usize> {
        let removed = {
            let mut investments = self.investments.write().unwrap();
            let before = investments.len();
            investments.retain(|i| !(i.id == investment_id && i.user_id == user_id));
            before - investments.len()
        };
        if removed > 0 {
            self.ledger.purge_investment_entries(investment_id);
        }
        Ok(removed)
    }

    async fn update_expected_return(
        &self,
        investment_id: &str,
        expected_return: Decimal,
        last_updated: NaiveDateTime,
    ) -> Result<()> {
        let mut investments = self.investments.write().unwrap();
        let investment = investments
            .iter_mut()
            .find(|i| i.id == investment_id)
            .ok_or_else(|| Error::NotFound(investment_id.to_string()))?;
        investment.expected_return = Some(expected_return);
        investment.last_updated = Some(last_updated);
        Ok(())
    }
}

/// Returns a fixed rate, nothing, or an error.
pub struct StaticRateProvider(pub std::result::Result<Option<Decimal>, String>);

#[async_trait]
impl RateProvider for StaticRateProvider {
    async fn expected_annual_return(&self, _investment_type: &str) -> Result<Option<Decimal>> {
        self.0.clone().map_err(Error::RateProvider)
    }
}
