//! Toggle settlement policies.
//!
//! A toggle has a local half (flip the display state) and a remote half
//! (write the edge). The policy decides how the two halves are sequenced
//! and what a remote failure means for the local state; callers never see
//! the difference.

use async_trait::async_trait;
use serde_json::json;

use crate::backend::{RecordId, RecordStore, UserId, fields};
use crate::error::Result;
use crate::post::{EdgeKind, EdgeWrite, PendingToggle, Post};

/// Strategy seam for like/save toggles.
#[async_trait]
pub trait TogglePolicy: Send + Sync {
    /// Runs the full toggle of `kind` on `post` for `viewer`.
    async fn toggle(
        &self,
        records: &dyn RecordStore,
        viewer: &UserId,
        post: &mut Post,
        kind: EdgeKind,
    ) -> Result<()>;
}

/// Issues the remote half of a toggle: insert or delete of the
/// `(post_id, user_id)` edge.
pub(crate) async fn settle_edge(
    records: &dyn RecordStore,
    write: EdgeWrite,
    kind: EdgeKind,
    post_id: &RecordId,
    viewer: &UserId,
) -> Result<()> {
    let table = kind.table();
    let keys = fields([("post_id", json!(post_id)), ("user_id", json!(viewer))]);
    match write {
        EdgeWrite::Insert => records.insert(table, keys).await.map(|_| ()),
        EdgeWrite::Delete => records.delete(table, keys).await,
    }
}

/// The default policy: apply locally first, then confirm remotely.
///
/// The local mutation is applied unconditionally and is NOT rolled back
/// when the remote write fails: failures are recorded for diagnostics
/// only, and the displayed state can drift from the authoritative one
/// until the next full feed load.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptimisticToggle;

#[async_trait]
impl TogglePolicy for OptimisticToggle {
    async fn toggle(
        &self,
        records: &dyn RecordStore,
        viewer: &UserId,
        post: &mut Post,
        kind: EdgeKind,
    ) -> Result<()> {
        match post.begin_toggle(kind) {
            PendingToggle::LocalOnly { .. } => Ok(()),
            PendingToggle::Remote {
                kind,
                write,
                post_id,
            } => {
                if let Err(err) = settle_edge(records, write, kind, &post_id, viewer).await {
                    tracing::warn!(
                        error = %err,
                        post_id = %post_id,
                        edge = %kind,
                        "edge write failed, local state not reverted"
                    );
                }
                Ok(())
            }
        }
    }
}

/// Alternative policy: await remote confirmation before flipping the
/// local state. A remote failure leaves the display untouched and
/// surfaces the error.
#[derive(Debug, Clone, Copy, Default)]
pub struct PessimisticToggle;

#[async_trait]
impl TogglePolicy for PessimisticToggle {
    async fn toggle(
        &self,
        records: &dyn RecordStore,
        viewer: &UserId,
        post: &mut Post,
        kind: EdgeKind,
    ) -> Result<()> {
        let Some(post_id) = post.record_id().cloned() else {
            // Seed posts have no remote half to confirm.
            post.begin_toggle(kind);
            return Ok(());
        };
        let write = post.next_write(kind);
        settle_edge(records, write, kind, &post_id, viewer).await?;
        post.begin_toggle(kind);
        Ok(())
    }
}
