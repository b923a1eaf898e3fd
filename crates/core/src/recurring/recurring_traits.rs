use async_trait::async_trait;

use crate::errors::Result;
use crate::ledger::EntryKind;
use crate::recurring::recurring_model::{
    MaterializationPlan, MaterializationReport, NewRecurringTemplate, RecurringTemplate,
    RecurringTemplateUpdate,
};

/// Trait for recurring template repository operations
#[async_trait]
pub trait RecurringRepositoryTrait: Send + Sync {
    fn get_template(&self, user_id: &str, template_id: &str) -> Result<RecurringTemplate>;
    fn list_templates(
        &self,
        user_id: &str,
        kind: Option<EntryKind>,
    ) -> Result<Vec<RecurringTemplate>>;

    async fn insert_template(&self, template: RecurringTemplate) -> Result<RecurringTemplate>;

    /// Replaces the stored template. With `purge_generated` the template's
    /// generated ledger entries are deleted in the same transaction.
    async fn save_template(
        &self,
        template: RecurringTemplate,
        purge_generated: bool,
    ) -> Result<RecurringTemplate>;

    /// Deletes the template and every entry it generated.
    async fn delete_template(&self, user_id: &str, template_id: &str) -> Result<usize>;

    /// Writes the plan's new entries and template changes in one transaction.
    async fn apply_materialization(&self, plan: MaterializationPlan) -> Result<()>;
}

/// Trait for recurring template service operations
#[async_trait]
pub trait RecurringServiceTrait: Send + Sync {
    fn get_templates(&self, user_id: &str, kind: Option<EntryKind>)
        -> Result<Vec<RecurringTemplate>>;

    async fn create_template(
        &self,
        user_id: &str,
        kind: EntryKind,
        new_template: NewRecurringTemplate,
    ) -> Result<RecurringTemplate>;

    async fn update_template(
        &self,
        user_id: &str,
        kind: EntryKind,
        template_id: &str,
        update: RecurringTemplateUpdate,
    ) -> Result<RecurringTemplate>;

    async fn delete_template(&self, user_id: &str, kind: EntryKind, template_id: &str)
        -> Result<()>;

    /// Generates every due occurrence for the user and persists the result.
    async fn materialize(&self, user_id: &str) -> Result<MaterializationReport>;
}
