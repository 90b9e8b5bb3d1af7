//! Client composition root.

use std::sync::Arc;

use crate::backend::{AuthProvider, ObjectStore, RecordStore};
use crate::composer::PostComposer;
use crate::error::Result;
use crate::feed::FeedAssembler;
use crate::interaction::{InteractionController, TogglePolicy};
use crate::post::Post;
use crate::session::SessionStore;

/// Bundles one session store with the components that depend on it, over a
/// single backend triple.
///
/// Construction wires everything; `initialize` must still be called once
/// before the feed or any mutation is used.
pub struct PlazaClient {
    session: Arc<SessionStore>,
    feed: FeedAssembler,
    composer: PostComposer,
    interactions: InteractionController,
}

impl PlazaClient {
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        storage: Arc<dyn ObjectStore>,
        records: Arc<dyn RecordStore>,
    ) -> Self {
        let session = Arc::new(SessionStore::new(auth));
        Self {
            feed: FeedAssembler::new(records.clone()),
            composer: PostComposer::new(storage, records.clone(), session.clone()),
            interactions: InteractionController::new(records, session.clone()),
            session,
        }
    }

    /// Like [`new`](Self::new), with an explicit toggle policy.
    pub fn with_policy(
        auth: Arc<dyn AuthProvider>,
        storage: Arc<dyn ObjectStore>,
        records: Arc<dyn RecordStore>,
        policy: Arc<dyn TogglePolicy>,
    ) -> Self {
        let session = Arc::new(SessionStore::new(auth));
        Self {
            feed: FeedAssembler::new(records.clone()),
            composer: PostComposer::new(storage, records.clone(), session.clone()),
            interactions: InteractionController::with_policy(records, session.clone(), policy),
            session,
        }
    }

    /// Resolves the session's startup state. Call once.
    pub async fn initialize(&self) -> Result<()> {
        self.session.initialize().await
    }

    /// Loads the feed for the current session identity.
    pub async fn load_feed(&self) -> Vec<Post> {
        let viewer = self.session.user_id().await;
        self.feed.load(viewer.as_ref()).await
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn feed(&self) -> &FeedAssembler {
        &self.feed
    }

    pub fn composer(&self) -> &PostComposer {
        &self.composer
    }

    pub fn interactions(&self) -> &InteractionController {
        &self.interactions
    }
}
