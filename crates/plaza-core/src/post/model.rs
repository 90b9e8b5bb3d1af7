//! Post domain model.
//!
//! A feed entry is either a seed placeholder or a live, backend-authoritative
//! record. The two are displayed uniformly but only live posts have an id
//! the backend recognizes, so interaction plumbing dispatches on the variant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use crate::backend::{RecordId, Table};

/// The display state every feed entry carries.
///
/// `viewer_has_liked`/`viewer_has_saved` are meaningful only relative to
/// the viewer the entry was loaded for; an identity change makes them
/// stale until the next load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostCard {
    pub author_username: String,
    pub image_url: String,
    pub caption: String,
    pub like_count: u64,
    pub viewer_has_liked: bool,
    pub viewer_has_saved: bool,
}

/// One feed entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Post {
    /// Built-in placeholder, never persisted. Interactions mutate local
    /// display state only.
    Seed(PostCard),
    /// Backend-authoritative record.
    Live {
        id: RecordId,
        created_at: DateTime<Utc>,
        card: PostCard,
    },
}

/// The two interaction edges a viewer can toggle on a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum EdgeKind {
    Like,
    Save,
}

impl EdgeKind {
    /// The record table holding this edge.
    pub fn table(self) -> Table {
        match self {
            Self::Like => Table::Likes,
            Self::Save => Table::SavedPosts,
        }
    }
}

/// The remote half of a toggle: which write settles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeWrite {
    Insert,
    Delete,
}

/// State tag for a toggle whose local half has been applied and whose
/// remote half is still outstanding.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingToggle {
    /// Seed post: nothing to settle remotely.
    LocalOnly { kind: EdgeKind },
    /// Live post: the edge write that must reach the backend.
    Remote {
        kind: EdgeKind,
        write: EdgeWrite,
        post_id: RecordId,
    },
}

impl Post {
    pub fn card(&self) -> &PostCard {
        match self {
            Self::Seed(card) => card,
            Self::Live { card, .. } => card,
        }
    }

    pub fn card_mut(&mut self) -> &mut PostCard {
        match self {
            Self::Seed(card) => card,
            Self::Live { card, .. } => card,
        }
    }

    pub fn is_seed(&self) -> bool {
        matches!(self, Self::Seed(_))
    }

    /// The backend id, present only for live posts.
    pub fn record_id(&self) -> Option<&RecordId> {
        match self {
            Self::Seed(_) => None,
            Self::Live { id, .. } => Some(id),
        }
    }

    /// The remote write the next toggle of `kind` would need, given the
    /// current flag. An absent edge is inserted, a present one deleted.
    pub fn next_write(&self, kind: EdgeKind) -> EdgeWrite {
        let flagged = match kind {
            EdgeKind::Like => self.card().viewer_has_liked,
            EdgeKind::Save => self.card().viewer_has_saved,
        };
        if flagged {
            EdgeWrite::Delete
        } else {
            EdgeWrite::Insert
        }
    }

    /// The local half of a toggle. Flips the flag (and for likes moves the
    /// count, saturating at zero) immediately, before any network call is
    /// issued, and returns the state tag describing the outstanding remote
    /// half. Calling this twice is a predictable flip-flop, never a race.
    pub fn begin_toggle(&mut self, kind: EdgeKind) -> PendingToggle {
        let write = self.next_write(kind);
        let card = self.card_mut();
        match (kind, write) {
            (EdgeKind::Like, EdgeWrite::Insert) => {
                card.like_count += 1;
                card.viewer_has_liked = true;
            }
            (EdgeKind::Like, EdgeWrite::Delete) => {
                card.like_count = card.like_count.saturating_sub(1);
                card.viewer_has_liked = false;
            }
            (EdgeKind::Save, EdgeWrite::Insert) => card.viewer_has_saved = true,
            (EdgeKind::Save, EdgeWrite::Delete) => card.viewer_has_saved = false,
        }
        match self.record_id() {
            Some(id) => PendingToggle::Remote {
                kind,
                write,
                post_id: id.clone(),
            },
            None => PendingToggle::LocalOnly { kind },
        }
    }
}
