//! Label Synchronization Functionality
//!
//! Applies a computed diff to a repository under a sync policy

use crate::config::{Label, SyncPolicy};
use crate::diff::{summarize, LabelDiff};
use crate::error::Result;
use crate::github::LabelService;

/// Types of label mutations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOperation {
    /// Create a label
    Create { label: Label },

    /// Update the label named `name` to match `label`
    Update { name: String, label: Label },

    /// Delete a label
    Delete { name: String },
}

impl SyncOperation {
    /// Label name the operation targets
    pub fn name(&self) -> &str {
        match self {
            SyncOperation::Create { label } => &label.name,
            SyncOperation::Update { name, .. } | SyncOperation::Delete { name } => name,
        }
    }

    /// Verb used in progress and failure messages
    pub fn verb(&self) -> &'static str {
        match self {
            SyncOperation::Create { .. } => "create",
            SyncOperation::Update { .. } => "update",
            SyncOperation::Delete { .. } => "delete",
        }
    }
}

/// A mutation that failed while applying
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    pub operation: SyncOperation,
    pub reason: String,
}

/// Synchronization result
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncResult {
    /// Operations that succeeded, in execution order
    pub operations: Vec<SyncOperation>,

    /// Number of labels created
    pub created: u32,

    /// Number of labels updated
    pub updated: u32,

    /// Number of labels deleted
    pub deleted: u32,

    /// Operations that encountered errors
    pub failures: Vec<SyncFailure>,
}

impl SyncResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful operation and update statistics
    pub fn add_operation(&mut self, operation: SyncOperation) {
        match &operation {
            SyncOperation::Create { .. } => self.created += 1,
            SyncOperation::Update { .. } => self.updated += 1,
            SyncOperation::Delete { .. } => self.deleted += 1,
        }
        self.operations.push(operation);
    }

    /// Record a failed operation
    pub fn add_failure(&mut self, operation: SyncOperation, reason: String) -> &SyncFailure {
        self.failures.push(SyncFailure { operation, reason });
        &self.failures[self.failures.len() - 1]
    }

    /// Whether any label was changed
    pub fn has_changes(&self) -> bool {
        self.created > 0 || self.updated > 0 || self.deleted > 0
    }
}

/// Terminal state of one reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Nothing the policy would act on
    AlreadyInSync,

    /// Dry run; `pending` operations would have been applied
    DryRun { pending: usize },

    /// The operator declined the confirmation prompt
    Cancelled,

    /// Operations were applied (individual failures are in the result)
    Completed(SyncResult),
}

/// Result of a single mutation, reported as soon as it finishes
#[derive(Debug, Clone, Copy)]
pub enum Progress<'a> {
    Applied(&'a SyncOperation),
    Failed(&'a SyncFailure),
}

/// Confirmation step before any mutation is issued
pub trait Confirmer {
    /// Ask the operator; `Ok(true)` only for an explicit yes
    fn confirm(&self, prompt: &str) -> Result<bool>;
}

/// Confirmer that always answers with a fixed value
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl Confirmer for FixedAnswer {
    fn confirm(&self, _prompt: &str) -> Result<bool> {
        Ok(self.0)
    }
}

/// Derive the mutations the policy allows, in diff order
pub fn plan_operations(diffs: &[LabelDiff], policy: &SyncPolicy) -> Vec<SyncOperation> {
    diffs
        .iter()
        .filter_map(|diff| match diff {
            LabelDiff::Create { desired } => Some(SyncOperation::Create {
                label: desired.clone(),
            }),
            LabelDiff::Update { desired, .. } if policy.force_update => {
                Some(SyncOperation::Update {
                    name: diff.name().to_string(),
                    label: desired.clone(),
                })
            }
            LabelDiff::Extra { observed } if policy.delete_unmanaged => {
                Some(SyncOperation::Delete {
                    name: observed.name.clone(),
                })
            }
            LabelDiff::Update { .. } | LabelDiff::Extra { .. } | LabelDiff::Match { .. } => None,
        })
        .collect()
}

/// Label Synchronization Engine
///
/// Applies diff records to a repository through a [`LabelService`]
pub struct LabelSyncer<'a, S> {
    service: &'a S,
    policy: SyncPolicy,
}

impl<'a, S: LabelService> LabelSyncer<'a, S> {
    /// Create a new label synchronization engine
    pub fn new(service: &'a S, policy: SyncPolicy) -> Self {
        Self { service, policy }
    }

    /// Apply the diff
    ///
    /// Mutations are issued one at a time in diff order. A failed mutation is
    /// recorded and the remaining ones are still attempted.
    ///
    /// # Errors
    /// Only if the confirmation prompt itself fails
    pub async fn apply<C: Confirmer>(
        &self,
        diffs: &[LabelDiff],
        confirmer: &C,
    ) -> Result<SyncOutcome> {
        self.apply_with_progress(diffs, confirmer, |_| {}).await
    }

    /// Apply the diff, handing each mutation's result to `progress` in
    /// execution order
    pub async fn apply_with_progress<C, F>(
        &self,
        diffs: &[LabelDiff],
        confirmer: &C,
        mut progress: F,
    ) -> Result<SyncOutcome>
    where
        C: Confirmer,
        F: FnMut(Progress<'_>),
    {
        let pending = summarize(diffs).actionable(&self.policy);

        if pending == 0 {
            tracing::debug!("No actionable label changes");
            return Ok(SyncOutcome::AlreadyInSync);
        }

        if self.policy.dry_run {
            tracing::debug!(pending, "Dry run, skipping mutations");
            return Ok(SyncOutcome::DryRun { pending });
        }

        if !self.policy.assume_yes && !confirmer.confirm("Apply changes?")? {
            return Ok(SyncOutcome::Cancelled);
        }

        let mut result = SyncResult::new();
        for operation in plan_operations(diffs, &self.policy) {
            match self.execute_operation(&operation).await {
                Ok(()) => {
                    tracing::info!(label = %operation.name(), action = operation.verb(), "Applied");
                    progress(Progress::Applied(&operation));
                    result.add_operation(operation);
                }
                Err(e) => {
                    tracing::warn!(label = %operation.name(), action = operation.verb(), error = %e, "Failed");
                    // Continue even if error occurs
                    let failure = result.add_failure(operation, e.to_string());
                    progress(Progress::Failed(failure));
                }
            }
        }

        Ok(SyncOutcome::Completed(result))
    }

    async fn execute_operation(&self, operation: &SyncOperation) -> Result<()> {
        match operation {
            SyncOperation::Create { label } => {
                self.service.create_label(label).await?;
            }
            SyncOperation::Update { name, label } => {
                self.service.update_label(name, label).await?;
            }
            SyncOperation::Delete { name } => {
                self.service.delete_label(name).await?;
            }
        }

        Ok(())
    }
}
