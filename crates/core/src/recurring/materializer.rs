//! Fixed-point engine that turns due recurring templates into ledger entries.
//!
//! The engine is pure: it reads a snapshot of the user's templates, lifetime
//! totals and already generated entries, and returns a [`MaterializationPlan`]
//! for the store to apply in one transaction. Each pass runs three phases in
//! order:
//!
//! 1. incomes: every due active income template records its occurrence and advances;
//! 2. expenses: every due, non-inactive expense template records its occurrence
//!    when lifetime income covers it, otherwise it is parked as pending;
//! 3. pending: parked expense templates are checked again against the totals
//!    left after phase 2.
//!
//! Passes repeat until one changes nothing. A change is an advanced due date or
//! a status transition, so every non-final pass moves at least one template
//! forward and the loop terminates once all templates are beyond `today`.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::Decimal;

use crate::constants::MAX_MATERIALIZATION_PASSES;
use crate::ledger::{EntryFingerprint, EntryKind};

use super::recurring_model::{
    MaterializationPlan, RecurringStatus, RecurringTemplate, TemplateChange,
};

/// Snapshot the engine runs against.
#[derive(Debug, Clone, Default)]
pub struct MaterializationInput {
    pub templates: Vec<RecurringTemplate>,
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub existing: HashSet<EntryFingerprint>,
}

pub struct Materializer {
    today: NaiveDate,
    max_passes: usize,
}

struct EngineState {
    templates: Vec<RecurringTemplate>,
    total_income: Decimal,
    total_expense: Decimal,
    existing: HashSet<EntryFingerprint>,
    plan: MaterializationPlan,
}

impl Materializer {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            max_passes: MAX_MATERIALIZATION_PASSES,
        }
    }

    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes.max(1);
        self
    }

    pub fn run(&self, input: MaterializationInput) -> MaterializationPlan {
        let original: HashMap<String, (NaiveDate, RecurringStatus)> = input
            .templates
            .iter()
            .map(|t| (t.id.clone(), (t.next_due_date, t.status)))
            .collect();

        let mut state = EngineState {
            templates: input.templates,
            total_income: input.total_income,
            total_expense: input.total_expense,
            existing: input.existing,
            plan: MaterializationPlan::default(),
        };

        let mut passes = 0;
        let mut settled = false;
        while passes < self.max_passes {
            passes += 1;
            if !self.run_pass(&mut state) {
                settled = true;
                break;
            }
        }
        if !settled {
            warn!(
                "Materialization stopped after {} passes without settling",
                passes
            );
        }

        let mut plan = state.plan;
        for template in &state.templates {
            let Some(&(due, status)) = original.get(&template.id) else {
                continue;
            };
            if due != template.next_due_date || status != template.status {
                plan.template_changes.push(TemplateChange {
                    id: template.id.clone(),
                    kind: template.kind,
                    next_due_date: template.next_due_date,
                    status: template.status,
                });
                if template.status == RecurringStatus::Inactive
                    && status != RecurringStatus::Inactive
                {
                    plan.report.deactivated_templates.push(template.id.clone());
                }
            }
            if template.status == RecurringStatus::Pending {
                plan.report.pending_templates.push(template.id.clone());
            }
        }
        plan.report.passes = passes;
        plan.report.truncated = !settled;

        debug!(
            "Materialization settled in {} passes: {} incomes, {} expenses, {} pending",
            passes,
            plan.report.incomes_created,
            plan.report.expenses_created,
            plan.report.pending_templates.len()
        );
        plan
    }

    fn run_pass(&self, state: &mut EngineState) -> bool {
        let mut changed = false;

        for idx in self.due(state, |t| {
            t.kind == EntryKind::Income && t.status == RecurringStatus::Active
        }) {
            changed |= self.settle_income(state, idx);
        }

        for idx in self.due(state, |t| {
            t.kind == EntryKind::Expense && t.status != RecurringStatus::Inactive
        }) {
            changed |= self.settle_expense(state, idx);
        }

        for idx in self.due(state, |t| {
            t.kind == EntryKind::Expense && t.status == RecurringStatus::Pending
        }) {
            changed |= self.settle_expense(state, idx);
        }

        changed
    }

    /// Indices of due templates matching `filter`, oldest occurrence first.
    fn due<F>(&self, state: &EngineState, filter: F) -> Vec<usize>
    where
        F: Fn(&RecurringTemplate) -> bool,
    {
        let mut indices: Vec<usize> = state
            .templates
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_due(self.today) && filter(t))
            .map(|(i, _)| i)
            .collect();
        indices.sort_by(|&a, &b| {
            let (ta, tb) = (&state.templates[a], &state.templates[b]);
            ta.next_due_date
                .cmp(&tb.next_due_date)
                .then_with(|| ta.created_at.cmp(&tb.created_at))
                .then_with(|| ta.id.cmp(&tb.id))
        });
        indices
    }

    fn settle_income(&self, state: &mut EngineState, idx: usize) -> bool {
        if state.templates[idx].is_past_end() {
            state.templates[idx].status = RecurringStatus::Inactive;
            return true;
        }
        state.record_occurrence(idx);
        state.advance(idx);
        true
    }

    fn settle_expense(&self, state: &mut EngineState, idx: usize) -> bool {
        let template = &state.templates[idx];
        if template.is_past_end() {
            state.templates[idx].status = RecurringStatus::Inactive;
            return true;
        }

        if state.total_expense + template.amount <= state.total_income {
            state.record_occurrence(idx);
            state.advance(idx);
            return true;
        }

        if template.status == RecurringStatus::Pending {
            false
        } else {
            state.templates[idx].status = RecurringStatus::Pending;
            true
        }
    }
}

impl EngineState {
    /// Plans the ledger entry for the template's current occurrence unless an
    /// identical one already exists. Totals only move for new entries.
    fn record_occurrence(&mut self, idx: usize) {
        let template = &self.templates[idx];
        match template.kind {
            EntryKind::Income => {
                let entry = template.occurrence_income();
                let fingerprint = EntryFingerprint::of_income(&entry);
                if fingerprint.is_some_and(|f| !self.existing.insert(f)) {
                    self.plan.report.duplicates_skipped += 1;
                    return;
                }
                self.total_income += entry.amount;
                self.plan.report.incomes_created += 1;
                self.plan.new_incomes.push(entry);
            }
            EntryKind::Expense => {
                let entry = template.occurrence_expense();
                let fingerprint = EntryFingerprint::of_expense(&entry);
                if fingerprint.is_some_and(|f| !self.existing.insert(f)) {
                    self.plan.report.duplicates_skipped += 1;
                    return;
                }
                self.total_expense += entry.amount;
                self.plan.report.expenses_created += 1;
                self.plan.new_expenses.push(entry);
            }
        }
    }

    /// Moves the template to its next occurrence and recomputes its status.
    fn advance(&mut self, idx: usize) {
        let template = &mut self.templates[idx];
        self.plan.report.occurrences_advanced += 1;
        match template.frequency.advance(template.next_due_date) {
            Some(next) => {
                template.next_due_date = next;
                template.status = if template.is_past_end() {
                    RecurringStatus::Inactive
                } else {
                    RecurringStatus::Active
                };
            }
            None => template.status = RecurringStatus::Inactive,
        }
    }
}
