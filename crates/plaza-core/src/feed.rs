//! Feed assembly: seed placeholders merged with live records.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::backend::{Record, RecordId, RecordStore, Select, UserId};
use crate::error::Result;
use crate::post::{Post, PostCard, seed_posts};

/// One row of the feed view, as the backend returns it.
#[derive(Debug, Deserialize)]
struct FeedRow {
    id: RecordId,
    author_username: String,
    image_url: String,
    caption: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    like_count: u64,
    #[serde(default)]
    viewer_has_liked: bool,
    #[serde(default)]
    viewer_has_saved: bool,
}

impl FeedRow {
    fn decode(record: Record) -> serde_json::Result<Self> {
        serde_json::from_value(Value::Object(record))
    }

    fn into_post(self) -> Post {
        Post::Live {
            id: self.id,
            created_at: self.created_at,
            card: PostCard {
                author_username: self.author_username,
                image_url: self.image_url,
                caption: self.caption,
                like_count: self.like_count,
                viewer_has_liked: self.viewer_has_liked,
                viewer_has_saved: self.viewer_has_saved,
            },
        }
    }
}

/// Assembles the ordered feed a viewer sees.
///
/// The seed sequence comes first and is never evicted; live rows follow in
/// the backend's newest-first order. With no intervening writes, two loads
/// for the same viewer yield identical sequences.
pub struct FeedAssembler {
    records: Arc<dyn RecordStore>,
}

impl FeedAssembler {
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self { records }
    }

    /// Loads the feed for `viewer`.
    ///
    /// Anonymous viewers (`None`) see every per-viewer flag as `false`.
    /// A failed fetch degrades to the seed sequence alone; the error is
    /// recorded for diagnostics and never surfaced to the caller.
    pub async fn load(&self, viewer: Option<&UserId>) -> Vec<Post> {
        let mut feed = seed_posts();
        match self.fetch_live(viewer).await {
            Ok(live) => feed.extend(live),
            Err(err) => {
                tracing::warn!(error = %err, "feed fetch failed, showing seed content only");
            }
        }
        feed
    }

    /// The single backend query behind [`load`](Self::load).
    async fn fetch_live(&self, viewer: Option<&UserId>) -> Result<Vec<Post>> {
        let rows = self.records.select(Select::feed_view(viewer)).await?;
        let mut posts = Vec::with_capacity(rows.len());
        for row in rows {
            match FeedRow::decode(row) {
                Ok(decoded) => posts.push(decoded.into_post()),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping undecodable feed row");
                }
            }
        }
        Ok(posts)
    }
}
