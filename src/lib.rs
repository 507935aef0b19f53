//! # gh-label-sync
//!
//! Bulk GitHub label management: keep a repository's labels in line with a
//! YAML, JSON or CSV definition file, or clone them from another repository
//!
//! ## Features
//! - Diff preview of creates, updates, matches and unmanaged labels
//! - Opt-in updates (`force_update`) and deletions (`delete_unmanaged`)
//! - Dry-run mode and confirmation before any change
//! - Per-label failure reporting without aborting the batch

pub mod config;
pub mod diff;
pub mod error;
pub mod github;
pub mod render;
pub mod sync;

pub use config::{Label, Repository, SyncPolicy};
pub use diff::{compute_diff, DiffKind, LabelDiff};
pub use error::{Error, Result};
pub use github::{GitHubClient, LabelService};
pub use sync::{Confirmer, LabelSyncer, SyncOutcome, SyncResult};

/// Reconcile a repository against a desired label set
///
/// Lists the repository's labels, computes the diff and applies it under
/// `policy`. Returns the diff together with the outcome so callers can
/// render both.
///
/// # Examples
///
/// ```rust,no_run
/// use gh_label_sync::{
///     config::load_labels_from_file, github::DEFAULT_API_URL, sync::FixedAnswer,
///     GitHubClient, Repository, SyncPolicy,
/// };
///
/// #[tokio::main]
/// async fn main() -> gh_label_sync::Result<()> {
///     let client = GitHubClient::new(
///         "your_github_token",
///         DEFAULT_API_URL,
///         Repository::new("owner", "repo"),
///     )?;
///     let desired = load_labels_from_file("labels.yml")?;
///     let policy = SyncPolicy {
///         force_update: true,
///         ..SyncPolicy::default()
///     };
///
///     let (_diffs, outcome) =
///         gh_label_sync::sync_repository_labels(&client, &desired, policy, &FixedAnswer(true))
///             .await?;
///
///     println!("Sync finished: {:?}", outcome);
///     Ok(())
/// }
/// ```
pub async fn sync_repository_labels<S, C>(
    service: &S,
    desired: &[Label],
    policy: SyncPolicy,
    confirmer: &C,
) -> Result<(Vec<LabelDiff>, SyncOutcome)>
where
    S: LabelService,
    C: Confirmer,
{
    let observed = service.list_labels().await?;
    let diffs = compute_diff(desired, &observed);
    let outcome = LabelSyncer::new(service, policy)
        .apply(&diffs, confirmer)
        .await?;
    Ok((diffs, outcome))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::sync::FixedAnswer;

    /// Repository holding labels in memory
    struct MemoryRepo {
        labels: RefCell<Vec<Label>>,
    }

    impl LabelService for MemoryRepo {
        async fn list_labels(&self) -> Result<Vec<Label>> {
            Ok(self.labels.borrow().clone())
        }

        async fn create_label(&self, label: &Label) -> Result<Label> {
            self.labels.borrow_mut().push(label.clone());
            Ok(label.clone())
        }

        async fn update_label(&self, name: &str, label: &Label) -> Result<Label> {
            let mut labels = self.labels.borrow_mut();
            let current = labels
                .iter_mut()
                .find(|l| l.name == name)
                .ok_or_else(|| Error::generic("Not Found"))?;
            *current = label.clone();
            Ok(label.clone())
        }

        async fn delete_label(&self, name: &str) -> Result<()> {
            self.labels.borrow_mut().retain(|l| l.name != name);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_sync_repository_labels_converges() {
        let repo = MemoryRepo {
            labels: RefCell::new(vec![
                Label::new("bug", "ff0000"),
                Label::new("stale", "cccccc"),
            ]),
        };
        let desired = vec![Label::new("bug", "d73a4a"), Label::new("docs", "0075ca")];
        let policy = SyncPolicy {
            force_update: true,
            delete_unmanaged: true,
            ..SyncPolicy::default()
        };

        let (diffs, outcome) =
            sync_repository_labels(&repo, &desired, policy, &FixedAnswer(true))
                .await
                .unwrap();
        assert_eq!(diffs.len(), 3);
        match outcome {
            SyncOutcome::Completed(result) => {
                assert_eq!((result.created, result.updated, result.deleted), (1, 1, 1));
            }
            other => panic!("unexpected outcome {other:?}"),
        }

        // A second pass finds nothing to do
        let (_, outcome) = sync_repository_labels(&repo, &desired, policy, &FixedAnswer(true))
            .await
            .unwrap();
        assert_eq!(outcome, SyncOutcome::AlreadyInSync);
    }

    #[tokio::test]
    async fn test_sync_repository_labels_declined() {
        let repo = MemoryRepo {
            labels: RefCell::new(Vec::new()),
        };
        let desired = vec![Label::new("bug", "d73a4a")];

        let (_, outcome) =
            sync_repository_labels(&repo, &desired, SyncPolicy::default(), &FixedAnswer(false))
                .await
                .unwrap();
        assert_eq!(outcome, SyncOutcome::Cancelled);
        assert!(repo.labels.borrow().is_empty());
    }
}
