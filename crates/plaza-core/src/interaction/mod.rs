//! Per-post interaction engine: like/save toggles and comments.

pub mod policy;

pub use policy::{OptimisticToggle, PessimisticToggle, TogglePolicy};

use serde_json::json;
use std::sync::Arc;

use crate::backend::{RecordStore, Table, fields};
use crate::error::Result;
use crate::post::{EdgeKind, Post};
use crate::session::SessionStore;

/// Per-post comment input state.
///
/// `visible` mirrors the "show comments" affordance: flipped on after a
/// successful submission. Comments are write-only from the core's
/// perspective; there is no list to refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentBox {
    pub draft: String,
    pub visible: bool,
}

/// Mutation engine for the interactions a viewer performs on one post.
///
/// Toggles run through a substitutable [`TogglePolicy`]; the default is
/// [`OptimisticToggle`]. Every operation is a no-op for anonymous viewers;
/// gating the affordances is the rendering layer's job, enforcing it is
/// ours.
pub struct InteractionController {
    records: Arc<dyn RecordStore>,
    session: Arc<SessionStore>,
    policy: Arc<dyn TogglePolicy>,
}

impl InteractionController {
    /// Creates a controller with the default optimistic policy.
    pub fn new(records: Arc<dyn RecordStore>, session: Arc<SessionStore>) -> Self {
        Self::with_policy(records, session, Arc::new(OptimisticToggle))
    }

    /// Creates a controller with an explicit settlement policy.
    pub fn with_policy(
        records: Arc<dyn RecordStore>,
        session: Arc<SessionStore>,
        policy: Arc<dyn TogglePolicy>,
    ) -> Self {
        Self {
            records,
            session,
            policy,
        }
    }

    /// Toggles the viewer's like on `post`.
    pub async fn toggle_like(&self, post: &mut Post) -> Result<()> {
        self.toggle(post, EdgeKind::Like).await
    }

    /// Toggles the viewer's save on `post`. Saves carry no visible count.
    pub async fn toggle_save(&self, post: &mut Post) -> Result<()> {
        self.toggle(post, EdgeKind::Save).await
    }

    async fn toggle(&self, post: &mut Post, kind: EdgeKind) -> Result<()> {
        let Some(viewer) = self.session.user_id().await else {
            return Ok(());
        };
        self.policy
            .toggle(self.records.as_ref(), &viewer, post, kind)
            .await
    }

    /// Submits the comment drafted in `input` against `post`.
    ///
    /// No-ops (returning `Ok(false)`) when the trimmed draft is empty, the
    /// viewer is anonymous, or the post is a seed placeholder with no
    /// backend id. A rejected insert is recorded for diagnostics and also
    /// returns `Ok(false)`, leaving the draft intact for retry. On success
    /// the draft is cleared and `input.visible` flips on.
    pub async fn submit_comment(&self, post: &Post, input: &mut CommentBox) -> Result<bool> {
        let content = input.draft.trim().to_string();
        if content.is_empty() {
            return Ok(false);
        }
        let Some(viewer) = self.session.user_id().await else {
            return Ok(false);
        };
        let Some(post_id) = post.record_id() else {
            tracing::debug!("comment on a seed post dropped");
            return Ok(false);
        };

        match self
            .records
            .insert(
                Table::Comments,
                fields([
                    ("post_id", json!(post_id)),
                    ("user_id", json!(viewer)),
                    ("content", json!(content)),
                ]),
            )
            .await
        {
            Ok(_) => {
                input.draft.clear();
                input.visible = true;
                Ok(true)
            }
            Err(err) => {
                tracing::warn!(error = %err, post_id = %post_id, "comment insert failed");
                Ok(false)
            }
        }
    }
}
