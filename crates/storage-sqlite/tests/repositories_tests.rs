//! Repository tests against a real SQLite file.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal_macros::dec;
use tempfile::{tempdir, TempDir};

use ledgerly_core::budget::{Budget, BudgetCategory, BudgetRepositoryTrait};
use ledgerly_core::errors::Error;
use ledgerly_core::goals::{AllocationResult, GoalPriority, GoalRepositoryTrait, SavingsGoal};
use ledgerly_core::investments::{Investment, InvestmentRepositoryTrait, InvestmentStatus};
use ledgerly_core::ledger::{
    DateRange, EntryKind, LedgerMutation, LedgerRepositoryTrait, NewExpense, NewIncome,
};
use ledgerly_core::recurring::{
    Frequency, MaterializationPlan, RecurringRepositoryTrait, RecurringStatus, RecurringTemplate,
    TemplateChange,
};
use ledgerly_storage_sqlite::{
    open, BudgetRepository, DbPool, GoalRepository, InvestmentRepository, LedgerRepository,
    RecurringRepository, WriteHandle,
};

const USER: &str = "user-1";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Opens a fresh database; the returned dir must outlive the pool.
fn setup() -> (Arc<DbPool>, WriteHandle, TempDir) {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("test.db");
    let (pool, writer) = open(&db_path.to_string_lossy()).expect("Failed to open database");
    (pool, writer, temp_dir)
}

fn salary_template(id: &str) -> RecurringTemplate {
    RecurringTemplate {
        id: id.to_string(),
        user_id: USER.to_string(),
        kind: EntryKind::Income,
        label: "Salary".to_string(),
        amount: dec!(1000),
        category: "Salary".to_string(),
        frequency: Frequency::Monthly,
        start_date: date(2026, 1, 1),
        end_date: None,
        next_due_date: date(2026, 1, 1),
        status: RecurringStatus::Active,
        created_at: Utc::now().naive_utc(),
    }
}

fn salary_income(template_id: &str, on: NaiveDate) -> NewIncome {
    NewIncome {
        id: None,
        user_id: USER.to_string(),
        date: on,
        amount: dec!(1000.00),
        category: "Salary".to_string(),
        source: "Salary".to_string(),
        recurring_id: Some(template_id.to_string()),
        investment_id: None,
    }
}

fn goal(id: &str, deadline: Option<NaiveDate>) -> SavingsGoal {
    SavingsGoal {
        id: id.to_string(),
        user_id: USER.to_string(),
        name: format!("Goal {}", id),
        target_amount: dec!(2000),
        current_amount: dec!(0),
        deadline,
        priority: GoalPriority::Medium,
        created_at: Utc::now().naive_utc(),
    }
}

#[tokio::test]
async fn test_materialization_skips_stored_occurrences() {
    let (pool, writer, _dir) = setup();
    let recurring = RecurringRepository::new(Arc::clone(&pool), writer.clone());
    let ledger = LedgerRepository::new(Arc::clone(&pool), writer);

    recurring.insert_template(salary_template("t1")).await.unwrap();

    let plan = MaterializationPlan {
        new_incomes: vec![
            salary_income("t1", date(2026, 1, 1)),
            salary_income("t1", date(2026, 1, 1)),
            salary_income("t1", date(2026, 2, 1)),
        ],
        template_changes: vec![TemplateChange {
            id: "t1".to_string(),
            kind: EntryKind::Income,
            next_due_date: date(2026, 3, 1),
            status: RecurringStatus::Active,
        }],
        ..Default::default()
    };
    recurring.apply_materialization(plan.clone()).await.unwrap();
    recurring.apply_materialization(plan).await.unwrap();

    let incomes = ledger.list_incomes(USER, None).unwrap();
    assert_eq!(incomes.len(), 2);
    assert_eq!(ledger.sum_incomes(USER, None).unwrap(), dec!(2000));
    assert_eq!(ledger.recurring_fingerprints(USER).unwrap().len(), 2);

    let stored = recurring.get_template(USER, "t1").unwrap();
    assert_eq!(stored.next_due_date, date(2026, 3, 1));
    assert_eq!(stored.status, RecurringStatus::Active);
}

#[tokio::test]
async fn test_template_purge_and_delete_remove_generated_entries() {
    let (pool, writer, _dir) = setup();
    let recurring = RecurringRepository::new(Arc::clone(&pool), writer.clone());
    let ledger = LedgerRepository::new(Arc::clone(&pool), writer);

    recurring.insert_template(salary_template("t1")).await.unwrap();
    ledger
        .create_income(salary_income("t1", date(2026, 1, 1)))
        .await
        .unwrap();

    let mut edited = recurring.get_template(USER, "t1").unwrap();
    edited.amount = dec!(1200);
    recurring.save_template(edited, true).await.unwrap();
    assert!(ledger.list_incomes(USER, None).unwrap().is_empty());
    assert_eq!(recurring.get_template(USER, "t1").unwrap().amount, dec!(1200));

    ledger
        .create_income(salary_income("t1", date(2026, 2, 1)))
        .await
        .unwrap();
    assert_eq!(recurring.delete_template("someone-else", "t1").await.unwrap(), 0);
    assert_eq!(recurring.delete_template(USER, "t1").await.unwrap(), 1);
    assert!(ledger.list_incomes(USER, None).unwrap().is_empty());
    assert!(matches!(
        recurring.get_template(USER, "t1"),
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn test_list_templates_filters_by_kind() {
    let (pool, writer, _dir) = setup();
    let recurring = RecurringRepository::new(pool, writer);

    recurring.insert_template(salary_template("t1")).await.unwrap();
    let mut rent = salary_template("t2");
    rent.kind = EntryKind::Expense;
    rent.label = "Rent".to_string();
    rent.end_date = Some(date(2026, 12, 31));
    recurring.insert_template(rent).await.unwrap();

    assert_eq!(recurring.list_templates(USER, None).unwrap().len(), 2);
    let expenses = recurring
        .list_templates(USER, Some(EntryKind::Expense))
        .unwrap();
    assert_eq!(expenses.len(), 1);
    assert_eq!(expenses[0].label, "Rent");
    assert_eq!(expenses[0].end_date, Some(date(2026, 12, 31)));
}

#[tokio::test]
async fn test_ledger_range_and_category_sums() {
    let (pool, writer, _dir) = setup();
    let ledger = LedgerRepository::new(pool, writer);

    for (day, amount, category) in [(5, dec!(40.50), "Food"), (20, dec!(60), "Rent")] {
        ledger
            .create_expense(NewExpense {
                id: None,
                user_id: USER.to_string(),
                date: date(2026, 3, day),
                amount,
                category: category.to_string(),
                name: category.to_string(),
                recurring_id: None,
                investment_id: None,
            })
            .await
            .unwrap();
    }

    let march = DateRange::new(date(2026, 3, 1), date(2026, 3, 31));
    assert_eq!(ledger.sum_expenses(USER, Some(march), None).unwrap(), dec!(100.50));
    assert_eq!(
        ledger.sum_expenses(USER, Some(march), Some("Food")).unwrap(),
        dec!(40.50)
    );
    let early = DateRange::new(date(2026, 3, 1), date(2026, 3, 10));
    assert_eq!(ledger.list_expenses(USER, Some(early)).unwrap().len(), 1);
    assert_eq!(ledger.first_income_date(USER).unwrap(), None);
}

#[tokio::test]
async fn test_goal_allocation_and_refund_move_the_tracker() {
    let (pool, writer, _dir) = setup();
    let goals = GoalRepository::new(pool, writer);

    goals.insert_goal(goal("g1", Some(date(2026, 6, 1)))).await.unwrap();
    goals.insert_goal(goal("g2", None)).await.unwrap();
    assert!(goals.get_tracker(USER).unwrap().is_none());

    let allocation = AllocationResult {
        allocations: vec![("g1".to_string(), dec!(1500))],
        leftover: dec!(250),
    };
    goals.save_allocation(USER, allocation).await.unwrap();

    assert_eq!(goals.get_goal(USER, "g1").unwrap().current_amount, dec!(1500));
    assert_eq!(goals.get_goal(USER, "g2").unwrap().current_amount, dec!(0));
    assert_eq!(
        goals.get_tracker(USER).unwrap().unwrap().last_surplus,
        dec!(250)
    );

    let deleted = goals
        .delete_goals_with_refund(USER, vec!["g1".to_string()], dec!(1500))
        .await
        .unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(
        goals.get_tracker(USER).unwrap().unwrap().last_surplus,
        dec!(1750)
    );
    assert_eq!(goals.load_goals(USER).unwrap().len(), 1);
}

#[tokio::test]
async fn test_goal_update_clears_deadline() {
    let (pool, writer, _dir) = setup();
    let goals = GoalRepository::new(pool, writer);

    goals.insert_goal(goal("g1", Some(date(2026, 6, 1)))).await.unwrap();
    let mut edited = goals.get_goal(USER, "g1").unwrap();
    edited.deadline = None;
    edited.priority = GoalPriority::High;
    goals.update_goal(edited).await.unwrap();

    let stored = goals.get_goal(USER, "g1").unwrap();
    assert_eq!(stored.deadline, None);
    assert_eq!(stored.priority, GoalPriority::High);

    let mut foreign = goal("g1", None);
    foreign.user_id = "someone-else".to_string();
    assert!(matches!(
        goals.update_goal(foreign).await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn test_active_budgets_for_category() {
    let (pool, writer, _dir) = setup();
    let budgets = BudgetRepository::new(pool, writer);

    let budget = Budget {
        id: "b1".to_string(),
        user_id: USER.to_string(),
        name: "March".to_string(),
        total_amount: dec!(1000),
        start_date: date(2026, 3, 1),
        end_date: date(2026, 3, 31),
        categories: vec![
            BudgetCategory {
                id: "c1".to_string(),
                budget_id: "b1".to_string(),
                category: "Food".to_string(),
                percentage: dec!(30),
            },
            BudgetCategory {
                id: "c2".to_string(),
                budget_id: "b1".to_string(),
                category: "Rent".to_string(),
                percentage: dec!(50),
            },
        ],
        created_at: Utc::now().naive_utc(),
    };
    budgets.insert_budget(budget).await.unwrap();

    let active = budgets
        .active_budgets_for_category(USER, "Food", date(2026, 3, 15))
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].categories.len(), 2);
    assert_eq!(active[0].category("Food").unwrap().percentage, dec!(30));

    assert!(budgets
        .active_budgets_for_category(USER, "Food", date(2026, 4, 1))
        .unwrap()
        .is_empty());
    assert!(budgets
        .active_budgets_for_category(USER, "Travel", date(2026, 3, 15))
        .unwrap()
        .is_empty());

    assert_eq!(budgets.delete_budget("someone-else", "b1").await.unwrap(), 0);
    assert_eq!(budgets.delete_budget(USER, "b1").await.unwrap(), 1);
    assert!(budgets.list_budgets(USER).unwrap().is_empty());
}

#[tokio::test]
async fn test_investment_save_and_delete_keep_ledger_in_step() {
    let (pool, writer, _dir) = setup();
    let investments = InvestmentRepository::new(Arc::clone(&pool), writer.clone());
    let ledger = LedgerRepository::new(Arc::clone(&pool), writer);

    let investment = Investment {
        id: "i1".to_string(),
        user_id: USER.to_string(),
        name: "Index Fund".to_string(),
        investment_type: "stock".to_string(),
        amount: dec!(500),
        expected_return: None,
        start_date: Some(date(2026, 3, 1)),
        end_date: None,
        frequency: None,
        status: InvestmentStatus::Active,
        last_updated: None,
        created_at: Utc::now().naive_utc(),
    };
    let principal = NewExpense {
        id: None,
        user_id: USER.to_string(),
        date: date(2026, 3, 1),
        amount: dec!(500),
        category: "Investment".to_string(),
        name: "Investment in Index Fund".to_string(),
        recurring_id: None,
        investment_id: Some("i1".to_string()),
    };
    investments
        .save_investment(investment.clone(), vec![LedgerMutation::CreateExpense(principal)])
        .await
        .unwrap();
    assert!(ledger.linked_entries("i1").unwrap().expense.is_some());

    investments
        .update_expected_return("i1", dec!(7.5), Utc::now().naive_utc())
        .await
        .unwrap();
    let stored = investments.get_investment(USER, "i1").unwrap();
    assert_eq!(stored.expected_return, Some(dec!(7.5)));
    assert!(stored.last_updated.is_some());

    let mut completed = stored.clone();
    completed.status = InvestmentStatus::Completed;
    investments.save_investment(completed, vec![]).await.unwrap();
    assert_eq!(investments.list_investments(USER).unwrap().len(), 1);
    assert_eq!(
        investments.get_investment(USER, "i1").unwrap().status,
        InvestmentStatus::Completed
    );

    assert_eq!(investments.delete_investment(USER, "i1").await.unwrap(), 1);
    assert!(ledger.list_expenses(USER, None).unwrap().is_empty());
    assert!(matches!(
        investments.update_expected_return("i1", dec!(1), Utc::now().naive_utc()).await,
        Err(Error::NotFound(_))
    ));
}
